//! Error types for the `dhan-feed` crate.
//!
//! All fallible operations in this crate return [`Result<T>`], which is an
//! alias for `std::result::Result<T, DhanError>`.
//!
//! [`DhanError`] covers:
//! - **Protocol errors**: A single undecodable frame; the stream continues
//! - **Authentication errors**: Rejected credentials (codes 807–809) or a
//!   failed v1 auth send
//! - **Capacity errors**: Connection limit / data plan (codes 805–806)
//! - **Configuration errors**: Invalid instrument lists or feed selection,
//!   raised before any network I/O
//! - **Transport errors**: WebSocket failures, timeouts, closed sockets
//! - **JSON / URL errors**: Request encoding and endpoint construction

use std::time::Duration;

use crate::types::enums::{DisconnectReason, FeedProtocol, FeedType};

/// A frame the codec could not decode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The frame was empty.
    #[error("empty packet")]
    Empty,

    /// The leading response code is not one the feed defines.
    #[error("unknown packet type: {0}")]
    UnknownPacketType(u8),

    /// The frame is shorter than the layout of its packet type.
    #[error("{packet} packet too short: need {need} bytes, have {have}")]
    Truncated {
        /// Packet kind being decoded.
        packet: &'static str,
        /// Bytes the layout requires.
        need: usize,
        /// Bytes available.
        have: usize,
    },

    /// A declared message length disagrees with the frame.
    #[error("declared message length {declared} does not fit {available} available bytes")]
    LengthMismatch {
        /// Length from the message header.
        declared: i32,
        /// Bytes left in the frame.
        available: usize,
    },
}

/// An instrument list or feed selection the protocol cannot express.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Some instruments carry a feed type and some do not.
    #[error("all instruments must have the same shape: either all (segment, id) or all (segment, id, feed type)")]
    InvalidRequestShape,

    /// The feed type is not available on the selected protocol.
    #[error("{feed_type} packets are not available on the {protocol} feed")]
    UnsupportedFeedTypeForVersion {
        /// Requested feed type.
        feed_type: FeedType,
        /// Selected protocol.
        protocol: FeedProtocol,
    },

    /// Protocol version selector other than `v1` / `v2`.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(String),

    /// Full-depth level other than 20 / 200.
    #[error("depth level must be either 20 or 200, got {0}")]
    UnsupportedDepthLevel(u16),

    /// Numeric exchange segment code with no known segment.
    #[error("unknown exchange segment code: {0}")]
    UnknownExchangeSegment(u8),

    /// Numeric request code that is not a subscribe code.
    #[error("unknown feed request code: {0}")]
    UnknownFeedType(u8),

    /// A batch size of zero.
    #[error("batch size must be at least 1")]
    InvalidBatchSize,

    /// More instruments than a binary subscription frame has slots for.
    #[error("{count} instruments exceed the {capacity} slots of a subscription packet")]
    BatchTooLarge {
        /// Instruments in the batch.
        count: usize,
        /// Slots in the frame.
        capacity: usize,
    },

    /// A connection would track more instruments than the server allows.
    #[error("{count} instruments exceed the per-connection limit of {limit}")]
    TooManyInstruments {
        /// Instruments that would be tracked.
        count: usize,
        /// Per-connection limit.
        limit: usize,
    },
}

/// Why a session's credentials were not accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    /// The server disconnected with an authentication reason code.
    #[error("{0}")]
    Rejected(DisconnectReason),

    /// The v1 auth frame could not be sent.
    #[error("auth packet could not be sent: {0}")]
    SendFailed(String),
}

/// All possible errors produced by the `dhan-feed` client.
#[derive(Debug, thiserror::Error)]
pub enum DhanError {
    /// A frame could not be decoded. The session keeps streaming.
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The credentials were rejected. The session is failed.
    #[error("Authentication error: {0}")]
    Authentication(AuthFailure),

    /// The account hit a connection or data-plan limit. The session is failed.
    #[error("Capacity error: {0}")]
    Capacity(DisconnectReason),

    /// The server disconnected with a reason code this crate does not know.
    #[error("Server disconnect: {0}")]
    ServerDisconnect(DisconnectReason),

    /// Invalid instrument list or feed selection.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// A WebSocket-level error.
    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),

    /// The socket closed underneath an operation.
    #[error("WebSocket connection closed")]
    ConnectionClosed,

    /// An operation did not complete in time.
    #[error("Timed out after {after:?} while {during}")]
    Timeout {
        /// Configured limit.
        after: Duration,
        /// What was in progress.
        during: &'static str,
    },

    /// Failed to serialize a JSON request.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// An error building or parsing a URL.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// The caller provided an invalid argument or called out of order.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl DhanError {
    /// Map a server disconnect reason onto the error taxonomy.
    pub fn from_disconnect(reason: DisconnectReason) -> Self {
        if reason.is_auth_failure() {
            Self::Authentication(AuthFailure::Rejected(reason))
        } else if reason.is_capacity() {
            Self::Capacity(reason)
        } else {
            Self::ServerDisconnect(reason)
        }
    }

    /// Whether this error ends the session.
    ///
    /// Protocol errors affect one frame; configuration and argument errors
    /// are raised before anything is sent.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            Self::Protocol(_) | Self::Configuration(_) | Self::InvalidArgument(_) | Self::Json(_) | Self::Url(_)
        )
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for DhanError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(err))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DhanError>;
