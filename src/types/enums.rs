//! Shared enum types for the live market feed wire protocol.
//!
//! Exchange segment variants use `SCREAMING_SNAKE_CASE` to match the string
//! values the feed expects in JSON subscription messages, so we suppress the
//! Rust naming convention lint.
#![allow(non_camel_case_types)]

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{WS_DEPTH_20_URL, WS_DEPTH_200_URL, WS_MARKET_FEED_URL, limits};
use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Exchange Segment
// ---------------------------------------------------------------------------

/// Exchange and segment identifier used across all DhanHQ APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExchangeSegment {
    /// Index value (segment code 0).
    IDX_I,
    /// NSE Equity Cash (segment code 1).
    NSE_EQ,
    /// NSE Futures & Options (segment code 2).
    NSE_FNO,
    /// NSE Currency (segment code 3).
    NSE_CURRENCY,
    /// BSE Equity Cash (segment code 4).
    BSE_EQ,
    /// MCX Commodity (segment code 5).
    MCX_COMM,
    /// BSE Currency (segment code 7).
    BSE_CURRENCY,
    /// BSE Futures & Options (segment code 8).
    BSE_FNO,
}

impl ExchangeSegment {
    /// Returns the numeric segment code used in binary WebSocket packets.
    pub fn segment_code(self) -> u8 {
        match self {
            Self::IDX_I => 0,
            Self::NSE_EQ => 1,
            Self::NSE_FNO => 2,
            Self::NSE_CURRENCY => 3,
            Self::BSE_EQ => 4,
            Self::MCX_COMM => 5,
            Self::BSE_CURRENCY => 7,
            Self::BSE_FNO => 8,
        }
    }

    /// Construct from a numeric segment code (as found in binary feed packets).
    pub fn from_segment_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::IDX_I),
            1 => Some(Self::NSE_EQ),
            2 => Some(Self::NSE_FNO),
            3 => Some(Self::NSE_CURRENCY),
            4 => Some(Self::BSE_EQ),
            5 => Some(Self::MCX_COMM),
            7 => Some(Self::BSE_CURRENCY),
            8 => Some(Self::BSE_FNO),
            _ => None,
        }
    }

    /// The string form used in JSON subscription messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IDX_I => "IDX_I",
            Self::NSE_EQ => "NSE_EQ",
            Self::NSE_FNO => "NSE_FNO",
            Self::NSE_CURRENCY => "NSE_CURRENCY",
            Self::BSE_EQ => "BSE_EQ",
            Self::MCX_COMM => "MCX_COMM",
            Self::BSE_CURRENCY => "BSE_CURRENCY",
            Self::BSE_FNO => "BSE_FNO",
        }
    }
}

impl TryFrom<u8> for ExchangeSegment {
    type Error = ConfigError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_segment_code(code).ok_or(ConfigError::UnknownExchangeSegment(code))
    }
}

impl fmt::Display for ExchangeSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Feed Type
// ---------------------------------------------------------------------------

/// Packet richness requested for an instrument.
///
/// Ordered by request code so batches come out in a stable order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeedType {
    /// LTP + last trade time.
    Ticker,
    /// LTP, OHLC, volume, buy/sell quantities.
    Quote,
    /// 5-level market depth (v1 only).
    Depth,
    /// Quote + OI + 5-level depth (v2 only).
    Full,
    /// 20/200-level order book on the full-depth feeds.
    FullDepth,
}

impl FeedType {
    /// Request code that subscribes to this feed type.
    pub fn subscribe_code(self) -> FeedRequestCode {
        match self {
            Self::Ticker => FeedRequestCode::SubscribeTicker,
            Self::Quote => FeedRequestCode::SubscribeQuote,
            Self::Depth => FeedRequestCode::SubscribeDepth,
            Self::Full => FeedRequestCode::SubscribeFull,
            Self::FullDepth => FeedRequestCode::SubscribeFullMarketDepth,
        }
    }

    /// The "subscribe + 1" request code used by JSON framing to unsubscribe.
    pub fn unsubscribe_code(self) -> FeedRequestCode {
        match self {
            Self::Ticker => FeedRequestCode::UnsubscribeTicker,
            Self::Quote => FeedRequestCode::UnsubscribeQuote,
            Self::Depth => FeedRequestCode::UnsubscribeDepth,
            Self::Full => FeedRequestCode::UnsubscribeFull,
            Self::FullDepth => FeedRequestCode::UnsubscribeFullMarketDepth,
        }
    }

    /// Parse a feed type from its subscribe request code (15, 17, 19, 21, 23).
    pub fn from_request_code(code: u8) -> Option<Self> {
        match code {
            15 => Some(Self::Ticker),
            17 => Some(Self::Quote),
            19 => Some(Self::Depth),
            21 => Some(Self::Full),
            23 => Some(Self::FullDepth),
            _ => None,
        }
    }
}

impl TryFrom<u8> for FeedType {
    type Error = ConfigError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_request_code(code).ok_or(ConfigError::UnknownFeedType(code))
    }
}

impl fmt::Display for FeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ticker => "Ticker",
            Self::Quote => "Quote",
            Self::Depth => "Depth",
            Self::Full => "Full",
            Self::FullDepth => "FullDepth",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Feed Request Code (WebSocket market feed)
// ---------------------------------------------------------------------------

/// Request codes sent over the market feed WebSocket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FeedRequestCode {
    /// Connect (v1 auth frame).
    Connect = 11,
    /// Disconnect from feed.
    Disconnect = 12,
    /// Subscribe to Ticker packets.
    SubscribeTicker = 15,
    /// Unsubscribe from Ticker packets.
    UnsubscribeTicker = 16,
    /// Subscribe to Quote packets.
    SubscribeQuote = 17,
    /// Unsubscribe from Quote packets.
    UnsubscribeQuote = 18,
    /// Subscribe to 5-level Depth packets.
    SubscribeDepth = 19,
    /// Unsubscribe from 5-level Depth packets.
    UnsubscribeDepth = 20,
    /// Subscribe to Full packets.
    SubscribeFull = 21,
    /// Unsubscribe from Full packets.
    UnsubscribeFull = 22,
    /// Subscribe to Full Market Depth.
    SubscribeFullMarketDepth = 23,
    /// Unsubscribe from Full Market Depth.
    UnsubscribeFullMarketDepth = 24,
}

impl FeedRequestCode {
    /// The wire byte.
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl Serialize for FeedRequestCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

// ---------------------------------------------------------------------------
// Feed Response Code (WebSocket market feed)
// ---------------------------------------------------------------------------

/// Response codes received in binary market feed packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FeedResponseCode {
    /// Ticker packet (LTP + LTT).
    Ticker = 2,
    /// 5-level market depth packet.
    MarketDepth = 3,
    /// Quote packet (LTP, qty, ATP, volume, OHLC, etc.).
    Quote = 4,
    /// Open Interest packet.
    OI = 5,
    /// Previous close packet.
    PrevClose = 6,
    /// Market status packet.
    MarketStatus = 7,
    /// Full packet (quote + depth + OI).
    Full = 8,
    /// Feed disconnect packet.
    Disconnect = 50,
}

impl FeedResponseCode {
    /// Parse a response code from the first byte of a binary packet header.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            2 => Some(Self::Ticker),
            3 => Some(Self::MarketDepth),
            4 => Some(Self::Quote),
            5 => Some(Self::OI),
            6 => Some(Self::PrevClose),
            7 => Some(Self::MarketStatus),
            8 => Some(Self::Full),
            50 => Some(Self::Disconnect),
            _ => None,
        }
    }

    /// Minimum packet length in bytes, header included.
    pub fn packet_len(self) -> usize {
        match self {
            Self::Ticker => 16,
            Self::MarketDepth => 112,
            Self::Quote => 50,
            Self::OI => 12,
            Self::PrevClose => 16,
            Self::MarketStatus => 8,
            Self::Full => 162,
            Self::Disconnect => 10,
        }
    }
}

/// Message codes carried in the full-depth (20/200) header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DepthResponseCode {
    /// Bid side of the book.
    Bid = 41,
    /// Server-initiated disconnect.
    Disconnect = 50,
    /// Ask side of the book.
    Ask = 51,
}

impl DepthResponseCode {
    /// Parse the message code byte of a full-depth header.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            41 => Some(Self::Bid),
            50 => Some(Self::Disconnect),
            51 => Some(Self::Ask),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Feed Protocol
// ---------------------------------------------------------------------------

/// Which feed a session speaks: the standard feed in its two protocol
/// versions, or one of the full-depth feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FeedProtocol {
    /// Binary auth frame, binary subscription frames.
    V1,
    /// URL-embedded credentials, JSON subscription messages.
    #[default]
    V2,
    /// 20-level full market depth.
    Depth20,
    /// 200-level full market depth.
    Depth200,
}

impl FeedProtocol {
    /// Parse a version selector (`"v1"` or `"v2"`).
    pub fn from_version(version: &str) -> Result<Self, ConfigError> {
        match version {
            "v1" => Ok(Self::V1),
            "v2" => Ok(Self::V2),
            other => Err(ConfigError::UnsupportedVersion(other.to_owned())),
        }
    }

    /// Select a full-depth feed by level count (20 or 200).
    pub fn full_depth(levels: u16) -> Result<Self, ConfigError> {
        match levels {
            20 => Ok(Self::Depth20),
            200 => Ok(Self::Depth200),
            other => Err(ConfigError::UnsupportedDepthLevel(other)),
        }
    }

    /// Default endpoint for this feed.
    pub fn default_url(self) -> &'static str {
        match self {
            Self::V1 | Self::V2 => WS_MARKET_FEED_URL,
            Self::Depth20 => WS_DEPTH_20_URL,
            Self::Depth200 => WS_DEPTH_200_URL,
        }
    }

    /// Whether this is one of the 20/200-level feeds.
    pub fn is_full_depth(self) -> bool {
        matches!(self, Self::Depth20 | Self::Depth200)
    }

    /// Maximum instruments per subscription message.
    pub fn batch_size(self) -> usize {
        match self {
            Self::V1 | Self::V2 => limits::FEED_BATCH_SIZE,
            Self::Depth20 => limits::DEPTH_20_BATCH_SIZE,
            Self::Depth200 => limits::DEPTH_200_BATCH_SIZE,
        }
    }

    /// Slot count a binary subscription frame is padded to.
    pub fn packet_slots(self) -> usize {
        if self.is_full_depth() {
            limits::DEPTH_PACKET_SLOTS
        } else {
            limits::FEED_PACKET_SLOTS
        }
    }

    /// Feed type assumed when an instrument is given without one.
    pub fn default_feed_type(self) -> FeedType {
        if self.is_full_depth() {
            FeedType::FullDepth
        } else {
            FeedType::Ticker
        }
    }

    /// Whether `feed_type` may be subscribed on this feed.
    pub fn allows(self, feed_type: FeedType) -> bool {
        match self {
            Self::V1 => matches!(feed_type, FeedType::Ticker | FeedType::Quote | FeedType::Depth),
            Self::V2 => matches!(feed_type, FeedType::Ticker | FeedType::Quote | FeedType::Full),
            Self::Depth20 | Self::Depth200 => feed_type == FeedType::FullDepth,
        }
    }

    /// Request code that unsubscribes `feed_type`.
    ///
    /// v1 binary framing reuses the subscribe code; every JSON-framed feed
    /// uses the subscribe code plus one.
    pub fn unsubscribe_code(self, feed_type: FeedType) -> FeedRequestCode {
        match self {
            Self::V1 => feed_type.subscribe_code(),
            Self::V2 | Self::Depth20 | Self::Depth200 => feed_type.unsubscribe_code(),
        }
    }
}

impl fmt::Display for FeedProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
            Self::Depth20 => "depth-20",
            Self::Depth200 => "depth-200",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Disconnect Reason
// ---------------------------------------------------------------------------

/// Server-initiated disconnect codes carried by response code 50.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisconnectReason {
    /// 805: too many active WebSocket connections.
    ConnectionLimitExceeded,
    /// 806: the account is not subscribed to the Data APIs.
    DataApiNotSubscribed,
    /// 807: the access token has expired.
    AccessTokenExpired,
    /// 808: the client ID is invalid.
    InvalidClientId,
    /// 809: authentication failed.
    AuthenticationFailed,
    /// Any code not listed above.
    Other(u16),
}

impl DisconnectReason {
    /// Map a wire reason code.
    pub fn from_code(code: u16) -> Self {
        match code {
            805 => Self::ConnectionLimitExceeded,
            806 => Self::DataApiNotSubscribed,
            807 => Self::AccessTokenExpired,
            808 => Self::InvalidClientId,
            809 => Self::AuthenticationFailed,
            other => Self::Other(other),
        }
    }

    /// The wire reason code.
    pub fn code(self) -> u16 {
        match self {
            Self::ConnectionLimitExceeded => 805,
            Self::DataApiNotSubscribed => 806,
            Self::AccessTokenExpired => 807,
            Self::InvalidClientId => 808,
            Self::AuthenticationFailed => 809,
            Self::Other(code) => code,
        }
    }

    /// 807, 808 and 809 reject the credentials.
    pub fn is_auth_failure(self) -> bool {
        matches!(
            self,
            Self::AccessTokenExpired | Self::InvalidClientId | Self::AuthenticationFailed
        )
    }

    /// 805 and 806 are account capacity limits.
    pub fn is_capacity(self) -> bool {
        matches!(self, Self::ConnectionLimitExceeded | Self::DataApiNotSubscribed)
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionLimitExceeded => f.write_str("No. of active websocket connections exceeded"),
            Self::DataApiNotSubscribed => f.write_str("Subscribe to Data APIs to continue"),
            Self::AccessTokenExpired => f.write_str("Access Token is expired"),
            Self::InvalidClientId => f.write_str("Invalid Client ID"),
            Self::AuthenticationFailed => f.write_str("Authentication Failed"),
            Self::Other(code) => write!(f, "Disconnected with code {code}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Market Status
// ---------------------------------------------------------------------------

/// State reported by a market status packet (response code 7).
///
/// The packet carries no discriminating field, so only `Open` is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarketStatus {
    /// Markets are open.
    Open,
}

impl fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("Markets Open"),
        }
    }
}
