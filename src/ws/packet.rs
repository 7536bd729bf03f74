//! Standard market feed packet decoder.
//!
//! Every packet starts with an 8-byte header (`<BHBI>`: response code,
//! message length, exchange segment, security id) followed by a fixed body
//! per response code. All fields are little-endian; the layout is read with
//! native `from_le_bytes()` after a single up-front length check.

use crate::constants::RESPONSE_HEADER_LEN;
use crate::error::ProtocolError;
use crate::types::enums::{DisconnectReason, ExchangeSegment, FeedResponseCode, MarketStatus};
use crate::types::tick::{
    DepthLevel, FullPacket, MarketDepth, OpenInterest, PacketHeader, PrevClose, Quote, TickRecord, Ticker,
    Timestamp,
};

// ---------------------------------------------------------------------------
// Little-endian readers
// ---------------------------------------------------------------------------

// Callers check the packet length before reading, so indexing is in bounds.

#[inline(always)]
pub(crate) fn read_u8(data: &[u8], offset: &mut usize) -> u8 {
    let v = data[*offset];
    *offset += 1;
    v
}

#[inline(always)]
pub(crate) fn read_u16_le(data: &[u8], offset: &mut usize) -> u16 {
    let o = *offset;
    *offset += 2;
    u16::from_le_bytes([data[o], data[o + 1]])
}

#[inline(always)]
pub(crate) fn read_i16_le(data: &[u8], offset: &mut usize) -> i16 {
    let o = *offset;
    *offset += 2;
    i16::from_le_bytes([data[o], data[o + 1]])
}

#[inline(always)]
pub(crate) fn read_u32_le(data: &[u8], offset: &mut usize) -> u32 {
    let o = *offset;
    *offset += 4;
    u32::from_le_bytes([data[o], data[o + 1], data[o + 2], data[o + 3]])
}

#[inline(always)]
pub(crate) fn read_f32_le(data: &[u8], offset: &mut usize) -> f32 {
    f32::from_bits(read_u32_le(data, offset))
}

#[inline(always)]
pub(crate) fn read_f64_le(data: &[u8], offset: &mut usize) -> f64 {
    let lo = u64::from(read_u32_le(data, offset));
    let hi = u64::from(read_u32_le(data, offset));
    f64::from_bits(lo | (hi << 32))
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Decode one binary packet from the standard feed.
///
/// Trailing bytes beyond the packet's layout are ignored. Unknown response
/// codes fail with [`ProtocolError::UnknownPacketType`] so the caller can
/// skip the frame and keep reading.
pub fn decode_packet(data: &[u8]) -> Result<TickRecord, ProtocolError> {
    let Some(&code) = data.first() else {
        return Err(ProtocolError::Empty);
    };
    let response_code = FeedResponseCode::from_byte(code).ok_or(ProtocolError::UnknownPacketType(code))?;

    let need = response_code.packet_len();
    if data.len() < need {
        return Err(ProtocolError::Truncated {
            packet: packet_name(response_code),
            need,
            have: data.len(),
        });
    }

    let header = parse_header(data, response_code);
    let mut off = RESPONSE_HEADER_LEN;

    let record = match response_code {
        FeedResponseCode::Ticker => TickRecord::Ticker(Ticker {
            header,
            ltp: read_f32_le(data, &mut off).into(),
            ltt: Timestamp(read_u32_le(data, &mut off)),
        }),

        FeedResponseCode::MarketDepth => {
            let ltp = read_f32_le(data, &mut off).into();
            let depth = read_depth_levels(data, &mut off);
            TickRecord::MarketDepth(MarketDepth { header, ltp, depth })
        }

        FeedResponseCode::Quote => TickRecord::Quote(Quote {
            header,
            ltp: read_f32_le(data, &mut off).into(),
            ltq: read_u16_le(data, &mut off),
            ltt: Timestamp(read_u32_le(data, &mut off)),
            avg_price: read_f32_le(data, &mut off).into(),
            volume: read_u32_le(data, &mut off),
            total_sell_qty: read_u32_le(data, &mut off),
            total_buy_qty: read_u32_le(data, &mut off),
            open: read_f32_le(data, &mut off).into(),
            close: read_f32_le(data, &mut off).into(),
            high: read_f32_le(data, &mut off).into(),
            low: read_f32_le(data, &mut off).into(),
        }),

        FeedResponseCode::OI => TickRecord::OpenInterest(OpenInterest {
            header,
            oi: read_u32_le(data, &mut off),
        }),

        FeedResponseCode::PrevClose => TickRecord::PrevClose(PrevClose {
            header,
            prev_close: read_f32_le(data, &mut off).into(),
            prev_oi: read_u32_le(data, &mut off),
        }),

        FeedResponseCode::MarketStatus => TickRecord::Status {
            header,
            status: MarketStatus::Open,
        },

        FeedResponseCode::Full => TickRecord::Full(FullPacket {
            header,
            ltp: read_f32_le(data, &mut off).into(),
            ltq: read_u16_le(data, &mut off),
            ltt: Timestamp(read_u32_le(data, &mut off)),
            avg_price: read_f32_le(data, &mut off).into(),
            volume: read_u32_le(data, &mut off),
            total_sell_qty: read_u32_le(data, &mut off),
            total_buy_qty: read_u32_le(data, &mut off),
            oi: read_u32_le(data, &mut off),
            oi_day_high: read_u32_le(data, &mut off),
            oi_day_low: read_u32_le(data, &mut off),
            open: read_f32_le(data, &mut off).into(),
            close: read_f32_le(data, &mut off).into(),
            high: read_f32_le(data, &mut off).into(),
            low: read_f32_le(data, &mut off).into(),
            depth: read_depth_levels(data, &mut off),
        }),

        FeedResponseCode::Disconnect => TickRecord::Disconnect {
            header,
            reason: DisconnectReason::from_code(read_u16_le(data, &mut off)),
        },
    };

    Ok(record)
}

/// Parse the 8-byte packet header. The length has already been checked.
fn parse_header(data: &[u8], response_code: FeedResponseCode) -> PacketHeader {
    let mut off = 1usize;
    let message_length = read_u16_le(data, &mut off);
    let exchange_segment_raw = read_u8(data, &mut off);
    let security_id = read_u32_le(data, &mut off);

    PacketHeader {
        response_code,
        message_length,
        exchange_segment: ExchangeSegment::from_segment_code(exchange_segment_raw),
        exchange_segment_raw,
        security_id,
    }
}

/// 5 depth levels × 20 bytes each.
fn read_depth_levels(data: &[u8], off: &mut usize) -> [DepthLevel; 5] {
    let mut depth = [DepthLevel::default(); 5];
    for level in &mut depth {
        level.bid_qty = read_u32_le(data, off);
        level.ask_qty = read_u32_le(data, off);
        level.bid_orders = read_u16_le(data, off);
        level.ask_orders = read_u16_le(data, off);
        level.bid_price = read_f32_le(data, off).into();
        level.ask_price = read_f32_le(data, off).into();
    }
    depth
}

fn packet_name(code: FeedResponseCode) -> &'static str {
    match code {
        FeedResponseCode::Ticker => "ticker",
        FeedResponseCode::MarketDepth => "market depth",
        FeedResponseCode::Quote => "quote",
        FeedResponseCode::OI => "OI",
        FeedResponseCode::PrevClose => "prev close",
        FeedResponseCode::MarketStatus => "market status",
        FeedResponseCode::Full => "full",
        FeedResponseCode::Disconnect => "disconnect",
    }
}
