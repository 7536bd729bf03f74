//! Decoded market feed records.
//!
//! Every binary packet decodes into one [`TickRecord`]. Records are handed
//! to the caller and never retained by the session.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::types::enums::{DisconnectReason, ExchangeSegment, FeedResponseCode, MarketStatus};

// ---------------------------------------------------------------------------
// Scalar wrappers
// ---------------------------------------------------------------------------

/// A price from the feed.
///
/// Standard packets carry `f32`, full-depth rows carry `f64`; both widen
/// losslessly into this type. `Display` always renders two decimals.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Price(pub f64);

impl Price {
    /// The raw value.
    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<f32> for Price {
    fn from(v: f32) -> Self {
        Self(f64::from(v))
    }
}

impl From<f64> for Price {
    fn from(v: f64) -> Self {
        Self(v)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Epoch seconds as sent by the exchange, interpreted as UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(pub u32);

impl Timestamp {
    /// Seconds since the Unix epoch.
    pub fn epoch_secs(self) -> u32 {
        self.0
    }

    /// Wall-clock time in UTC.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(i64::from(self.0), 0)
    }
}

/// Renders the UTC time of day as `HH:MM:SS`.
impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%H:%M:%S")),
            None => write!(f, "{}", self.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Standard feed
// ---------------------------------------------------------------------------

/// Header parsed from the first 8 bytes of every binary market feed packet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacketHeader {
    /// The response code identifying the packet type.
    pub response_code: FeedResponseCode,
    /// Message length as declared by the server.
    pub message_length: u16,
    /// Exchange segment the data belongs to.
    pub exchange_segment: Option<ExchangeSegment>,
    /// Raw exchange segment byte (always available even if enum variant unknown).
    pub exchange_segment_raw: u8,
    /// Security ID of the instrument.
    pub security_id: u32,
}

/// A single level of 5-level market depth (bid and ask side).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DepthLevel {
    /// Bid (buy) quantity.
    pub bid_qty: u32,
    /// Ask (sell) quantity.
    pub ask_qty: u32,
    /// Number of bid orders.
    pub bid_orders: u16,
    /// Number of ask orders.
    pub ask_orders: u16,
    /// Bid price.
    pub bid_price: Price,
    /// Ask price.
    pub ask_price: Price,
}

/// Ticker data (LTP + LTT). Response code 2.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ticker {
    pub header: PacketHeader,
    /// Last traded price.
    pub ltp: Price,
    /// Last trade time.
    pub ltt: Timestamp,
}

/// 5-level market depth. Response code 3.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketDepth {
    pub header: PacketHeader,
    /// Last traded price.
    pub ltp: Price,
    pub depth: [DepthLevel; 5],
}

/// Quote data with OHLC, volume, etc. Response code 4.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub header: PacketHeader,
    /// Last traded price.
    pub ltp: Price,
    /// Last traded quantity.
    pub ltq: u16,
    /// Last trade time.
    pub ltt: Timestamp,
    /// Average trade price.
    pub avg_price: Price,
    /// Total traded volume for the day.
    pub volume: u32,
    /// Total sell quantity pending.
    pub total_sell_qty: u32,
    /// Total buy quantity pending.
    pub total_buy_qty: u32,
    /// Day open price.
    pub open: Price,
    /// Day close price (only after market close).
    pub close: Price,
    /// Day high price.
    pub high: Price,
    /// Day low price.
    pub low: Price,
}

/// Open interest. Response code 5.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenInterest {
    pub header: PacketHeader,
    pub oi: u32,
}

/// Previous session close. Response code 6.
/// Sent once when an instrument is first subscribed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrevClose {
    pub header: PacketHeader,
    /// Previous day closing price.
    pub prev_close: Price,
    /// Previous day open interest.
    pub prev_oi: u32,
}

/// Full data packet including quote + OI + market depth. Response code 8.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FullPacket {
    pub header: PacketHeader,
    pub ltp: Price,
    pub ltq: u16,
    pub ltt: Timestamp,
    pub avg_price: Price,
    pub volume: u32,
    pub total_sell_qty: u32,
    pub total_buy_qty: u32,
    /// Open interest.
    pub oi: u32,
    /// Day high OI (NSE_FNO only).
    pub oi_day_high: u32,
    /// Day low OI (NSE_FNO only).
    pub oi_day_low: u32,
    pub open: Price,
    pub close: Price,
    pub high: Price,
    pub low: Price,
    /// 5 levels of market depth (stack-allocated, no heap alloc).
    pub depth: [DepthLevel; 5],
}

/// A decoded market feed event.
#[derive(Debug, Clone, PartialEq)]
pub enum TickRecord {
    Ticker(Ticker),
    MarketDepth(MarketDepth),
    Quote(Quote),
    OpenInterest(OpenInterest),
    PrevClose(PrevClose),
    /// Market status packet. Response code 7.
    Status {
        header: PacketHeader,
        status: MarketStatus,
    },
    Full(FullPacket),
    /// Server-initiated disconnect. Response code 50.
    Disconnect {
        header: PacketHeader,
        reason: DisconnectReason,
    },
    /// Paired bid/ask book from a 20- or 200-level feed.
    FullDepth(DepthSnapshot),
}

impl TickRecord {
    /// Exchange segment of the instrument this record is about.
    pub fn exchange_segment_raw(&self) -> u8 {
        match self {
            Self::FullDepth(s) => s.exchange_segment_raw,
            other => other.header().map_or(0, |h| h.exchange_segment_raw),
        }
    }

    /// Security ID of the instrument this record is about.
    pub fn security_id(&self) -> u32 {
        match self {
            Self::FullDepth(s) => s.security_id,
            other => other.header().map_or(0, |h| h.security_id),
        }
    }

    /// The standard packet header, for records decoded from the standard feed.
    pub fn header(&self) -> Option<&PacketHeader> {
        match self {
            Self::Ticker(t) => Some(&t.header),
            Self::MarketDepth(d) => Some(&d.header),
            Self::Quote(q) => Some(&q.header),
            Self::OpenInterest(o) => Some(&o.header),
            Self::PrevClose(p) => Some(&p.header),
            Self::Status { header, .. } => Some(header),
            Self::Full(f) => Some(&f.header),
            Self::Disconnect { header, .. } => Some(header),
            Self::FullDepth(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Full-depth feed (20 / 200 levels)
// ---------------------------------------------------------------------------

/// Which side of the book a full-depth message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthSide {
    /// Message code 41.
    Bid,
    /// Message code 51.
    Ask,
}

impl DepthSide {
    /// The side that completes a pair with this one.
    pub fn opposite(self) -> Self {
        match self {
            Self::Bid => Self::Ask,
            Self::Ask => Self::Bid,
        }
    }
}

/// One price level of a full-depth book.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DepthRow {
    pub price: Price,
    pub quantity: u32,
    pub orders: u32,
}

/// Header of a full-depth message (`<hBBiI>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthHeader {
    /// Declared message length in bytes, header included.
    pub message_length: i16,
    /// Raw message code (41 bid, 51 ask, 50 disconnect).
    pub message_code: u8,
    pub exchange_segment_raw: u8,
    pub security_id: u32,
    /// Row count (meaningful on the 200-level feed).
    pub row_count: u32,
}

/// One side of a full-depth book, as decoded from a single message.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthBook {
    pub header: DepthHeader,
    pub side: DepthSide,
    pub rows: Vec<DepthRow>,
}

/// A combined bid/ask view for one instrument.
///
/// Bids are sorted by price descending, asks ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthSnapshot {
    pub exchange_segment: Option<ExchangeSegment>,
    pub exchange_segment_raw: u8,
    pub security_id: u32,
    pub bids: Vec<DepthRow>,
    pub asks: Vec<DepthRow>,
}

impl DepthSnapshot {
    /// Bid/ask pairs level by level, up to the shorter side.
    pub fn levels(&self) -> impl Iterator<Item = (&DepthRow, &DepthRow)> {
        self.bids.iter().zip(self.asks.iter())
    }
}

/// One line per paired level, e.g.
/// `bid : {price:101.50, quantity:10, no_of_orders:2} | ask : {...}`.
impl fmt::Display for DepthSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (bid, ask)) in self.levels().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(
                f,
                "bid : {{price:{}, quantity:{}, no_of_orders:{}}} | ask : {{price:{}, quantity:{}, no_of_orders:{}}}",
                bid.price, bid.quantity, bid.orders, ask.price, ask.quantity, ask.orders,
            )?;
        }
        Ok(())
    }
}
