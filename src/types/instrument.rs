//! Instrument identity and subscription inputs.

use std::fmt;

use serde::Serialize;

use crate::error::ConfigError;
use crate::types::enums::{ExchangeSegment, FeedType};

/// Identifies a tradable instrument on the feed.
///
/// Serializes to the `{"ExchangeSegment": .., "SecurityId": ..}` shape used
/// in JSON subscription messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstrumentKey {
    /// Exchange segment.
    pub exchange_segment: ExchangeSegment,
    /// Exchange standard security ID.
    pub security_id: String,
}

impl InstrumentKey {
    /// Create a new instrument key.
    pub fn new(exchange_segment: ExchangeSegment, security_id: impl Into<String>) -> Self {
        Self {
            exchange_segment,
            security_id: security_id.into(),
        }
    }
}

impl fmt::Display for InstrumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.exchange_segment, self.security_id)
    }
}

/// An instrument paired with the feed type to stream for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionRequest {
    /// The instrument.
    pub key: InstrumentKey,
    /// Packet richness.
    pub feed_type: FeedType,
}

impl SubscriptionRequest {
    /// Create a new subscription request.
    pub fn new(key: InstrumentKey, feed_type: FeedType) -> Self {
        Self { key, feed_type }
    }
}

/// Caller input describing one instrument to (un)subscribe.
///
/// Mirrors the `(segment, id)` / `(segment, id, feed type)` tuples the feed
/// accepts: a missing feed type is filled in by the batcher. A list must be
/// all of one shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstrumentSpec {
    /// The instrument.
    pub key: InstrumentKey,
    /// Explicit feed type, if given.
    pub feed_type: Option<FeedType>,
}

impl InstrumentSpec {
    /// An instrument with the protocol's default feed type.
    pub fn new(exchange_segment: ExchangeSegment, security_id: impl Into<String>) -> Self {
        Self {
            key: InstrumentKey::new(exchange_segment, security_id),
            feed_type: None,
        }
    }

    /// An instrument with an explicit feed type.
    pub fn with_feed_type(
        exchange_segment: ExchangeSegment,
        security_id: impl Into<String>,
        feed_type: FeedType,
    ) -> Self {
        Self {
            key: InstrumentKey::new(exchange_segment, security_id),
            feed_type: Some(feed_type),
        }
    }
}

impl From<SubscriptionRequest> for InstrumentSpec {
    fn from(req: SubscriptionRequest) -> Self {
        Self {
            key: req.key,
            feed_type: Some(req.feed_type),
        }
    }
}

impl<S: Into<String>> From<(ExchangeSegment, S)> for InstrumentSpec {
    fn from((segment, id): (ExchangeSegment, S)) -> Self {
        Self::new(segment, id)
    }
}

impl<S: Into<String>> From<(ExchangeSegment, S, FeedType)> for InstrumentSpec {
    fn from((segment, id, feed_type): (ExchangeSegment, S, FeedType)) -> Self {
        Self::with_feed_type(segment, id, feed_type)
    }
}

/// Raw `(segment code, security id)`, e.g. `(1, "1333")`.
impl TryFrom<(u8, &str)> for InstrumentSpec {
    type Error = ConfigError;

    fn try_from((segment, id): (u8, &str)) -> Result<Self, Self::Error> {
        Ok(Self::new(ExchangeSegment::try_from(segment)?, id))
    }
}

/// Raw `(segment code, security id, request code)`, e.g. `(1, "1333", 15)`.
impl TryFrom<(u8, &str, u8)> for InstrumentSpec {
    type Error = ConfigError;

    fn try_from((segment, id, code): (u8, &str, u8)) -> Result<Self, Self::Error> {
        Ok(Self::with_feed_type(
            ExchangeSegment::try_from(segment)?,
            id,
            FeedType::try_from(code)?,
        ))
    }
}
