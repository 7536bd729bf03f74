//! The authoritative instrument set of a session.

use std::collections::HashSet;

use crate::error::ConfigError;
use crate::types::instrument::SubscriptionRequest;
use crate::ws::batcher::{self, SubscriptionBatches};

/// Tracked `(instrument, feed type)` pairs in insertion order.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionSet {
    requests: Vec<SubscriptionRequest>,
    index: HashSet<SubscriptionRequest>,
}

impl SubscriptionSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Union `requests` into the set, returning the ones not already tracked.
    pub fn insert(&mut self, requests: impl IntoIterator<Item = SubscriptionRequest>) -> Vec<SubscriptionRequest> {
        let mut added = Vec::new();
        for req in requests {
            if self.index.insert(req.clone()) {
                self.requests.push(req.clone());
                added.push(req);
            }
        }
        added
    }

    /// Remove `requests` from the set, returning the ones that were tracked.
    pub fn remove(&mut self, requests: &[SubscriptionRequest]) -> Vec<SubscriptionRequest> {
        let removed: Vec<_> = requests.iter().filter(|r| self.index.remove(r)).cloned().collect();
        if !removed.is_empty() {
            let index = &self.index;
            self.requests.retain(|r| index.contains(r));
        }
        removed
    }

    /// Whether `request` is tracked.
    pub fn contains(&self, request: &SubscriptionRequest) -> bool {
        self.index.contains(request)
    }

    /// Number of tracked pairs.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Tracked pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &SubscriptionRequest> {
        self.requests.iter()
    }

    /// Batch the whole set for (re)subscription.
    pub fn batches(&self, batch_size: usize) -> Result<SubscriptionBatches, ConfigError> {
        batcher::batch(&self.requests, batch_size)
    }
}
