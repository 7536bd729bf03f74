//! Instrument batching.
//!
//! Turns a caller's instrument list into protocol-compliant subscription
//! batches: feed types are defaulted and checked against the selected feed,
//! duplicates are dropped, and each feed type's instruments are split into
//! chunks no larger than the feed's per-message limit.

use std::collections::{BTreeMap, HashSet};

use crate::error::ConfigError;
use crate::types::enums::{FeedProtocol, FeedType};
use crate::types::instrument::{InstrumentKey, InstrumentSpec, SubscriptionRequest};

/// Instruments grouped by feed type, each group split into ordered batches.
///
/// Iterates in request-code order (Ticker, Quote, Depth, Full, FullDepth).
pub type SubscriptionBatches = BTreeMap<FeedType, Vec<Vec<InstrumentKey>>>;

/// Validate a caller's instrument list and resolve each entry's feed type.
///
/// - Entries without a feed type get [`FeedProtocol::default_feed_type`].
/// - The full-depth feeds stream a single packet kind, so any explicit feed
///   type is replaced with [`FeedType::FullDepth`].
/// - A list mixing entries with and without a feed type is rejected.
/// - Duplicates are removed, keeping the first occurrence.
pub fn normalize(specs: &[InstrumentSpec], protocol: FeedProtocol) -> Result<Vec<SubscriptionRequest>, ConfigError> {
    let typed = specs.iter().filter(|s| s.feed_type.is_some()).count();
    if typed != 0 && typed != specs.len() {
        return Err(ConfigError::InvalidRequestShape);
    }

    let mut seen = HashSet::with_capacity(specs.len());
    let mut requests = Vec::with_capacity(specs.len());

    for spec in specs {
        let feed_type = if protocol.is_full_depth() {
            FeedType::FullDepth
        } else {
            spec.feed_type.unwrap_or_else(|| protocol.default_feed_type())
        };
        if !protocol.allows(feed_type) {
            return Err(ConfigError::UnsupportedFeedTypeForVersion { feed_type, protocol });
        }

        let req = SubscriptionRequest::new(spec.key.clone(), feed_type);
        if seen.insert(req.clone()) {
            requests.push(req);
        }
    }

    Ok(requests)
}

/// Group resolved requests by feed type and split into batches of at most
/// `batch_size`, preserving input order within each feed type.
pub fn batch(requests: &[SubscriptionRequest], batch_size: usize) -> Result<SubscriptionBatches, ConfigError> {
    if batch_size == 0 {
        return Err(ConfigError::InvalidBatchSize);
    }

    let mut by_type: BTreeMap<FeedType, Vec<InstrumentKey>> = BTreeMap::new();
    for req in requests {
        by_type.entry(req.feed_type).or_default().push(req.key.clone());
    }

    Ok(by_type
        .into_iter()
        .map(|(feed_type, keys)| {
            let chunks = keys.chunks(batch_size).map(<[InstrumentKey]>::to_vec).collect();
            (feed_type, chunks)
        })
        .collect())
}

/// [`normalize`] followed by [`batch`].
pub fn validate_and_batch(
    specs: &[InstrumentSpec],
    protocol: FeedProtocol,
    batch_size: usize,
) -> Result<SubscriptionBatches, ConfigError> {
    batch(&normalize(specs, protocol)?, batch_size)
}
