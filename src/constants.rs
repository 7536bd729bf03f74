//! Constants for the DhanHQ live market feed.
//!
//! Contains WebSocket endpoints, binary frame sizes, and per-message
//! subscription limits. These are used internally by
//! [`FeedSession`](crate::ws::session::FeedSession) and the codec, but are
//! also exported for advanced usage.

// ---------------------------------------------------------------------------
// WebSocket URLs
// ---------------------------------------------------------------------------

/// WebSocket endpoint for the live market feed (binary, v1 and v2).
pub const WS_MARKET_FEED_URL: &str = "wss://api-feed.dhan.co";

/// WebSocket endpoint for 20-level full market depth (binary).
pub const WS_DEPTH_20_URL: &str = "wss://depth-api-feed.dhan.co/twentydepth";

/// WebSocket endpoint for 200-level full market depth (binary).
pub const WS_DEPTH_200_URL: &str = "wss://full-depth-api.dhan.co/twohundreddepth";

/// `authType` query value (and v1 auth frame marker) for access-token auth.
pub const AUTH_TYPE: &str = "2";

// ---------------------------------------------------------------------------
// Binary frame layout
// ---------------------------------------------------------------------------

/// Request header sent ahead of every v1 binary request (`<bH30s50s>`).
pub const REQUEST_HEADER_LEN: usize = 83;

/// Client ID field width inside the request header.
pub const CLIENT_ID_LEN: usize = 30;

/// Reserved zero block inside the request header.
pub const HEADER_RESERVED_LEN: usize = 50;

/// Access token field width inside the v1 auth frame.
pub const ACCESS_TOKEN_LEN: usize = 500;

/// Auth-type marker appended to the v1 auth frame.
pub const AUTH_TYPE_MARKER: &[u8; 2] = b"2P";

/// One instrument slot in a v1 subscription frame: segment byte + 20-byte id.
pub const INSTRUMENT_SLOT_LEN: usize = 21;

/// Security ID field width inside an instrument slot.
pub const SECURITY_ID_LEN: usize = 20;

/// Response header on every standard feed packet (`<BHBI>`).
pub const RESPONSE_HEADER_LEN: usize = 8;

/// Response header on every full-depth message (`<hBBiI>`).
pub const DEPTH_HEADER_LEN: usize = 12;

/// One full-depth row (`<dII>`).
pub const DEPTH_ROW_LEN: usize = 16;

/// Rows carried by a 20-level depth message.
pub const DEPTH_20_ROWS: usize = 20;

/// Upper bound on rows read from a 200-level depth message.
pub const DEPTH_200_MAX_ROWS: usize = 200;

// ---------------------------------------------------------------------------
// Subscription limits
// ---------------------------------------------------------------------------

/// WebSocket subscription constraints.
pub mod limits {
    /// Maximum instruments per subscribe message on the v1/v2 feed.
    pub const FEED_BATCH_SIZE: usize = 100;
    /// Maximum instruments per subscribe message on the 20-depth feed.
    pub const DEPTH_20_BATCH_SIZE: usize = 50;
    /// The 200-depth feed takes exactly one instrument per message.
    pub const DEPTH_200_BATCH_SIZE: usize = 1;
    /// Fixed slot count of a v1 binary subscription frame.
    pub const FEED_PACKET_SLOTS: usize = 100;
    /// Fixed slot count of a full-depth binary subscription frame.
    pub const DEPTH_PACKET_SLOTS: usize = 50;
    /// Maximum instruments tracked by a single connection.
    pub const MAX_INSTRUMENTS_PER_CONNECTION: usize = 5000;
}
