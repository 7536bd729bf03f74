//! 20- and 200-level full market depth.
//!
//! The full-depth feeds send each side of the book as its own message: a
//! 12-byte header (`<hBBiI>`: message length, message code, exchange
//! segment, security id, row count) followed by `<dII>` rows (price f64,
//! quantity u32, orders u32). Several messages may share one WebSocket
//! frame.
//!
//! [`DepthAggregator`] joins the bid (code 41) and ask (code 51) halves of
//! an instrument into a single [`DepthSnapshot`].

use std::collections::HashMap;

use crate::constants::{DEPTH_20_ROWS, DEPTH_200_MAX_ROWS, DEPTH_HEADER_LEN, DEPTH_ROW_LEN};
use crate::error::ProtocolError;
use crate::types::enums::{DepthResponseCode, DisconnectReason, ExchangeSegment, FeedProtocol};
use crate::types::tick::{DepthBook, DepthHeader, DepthRow, DepthSide, DepthSnapshot};
use crate::ws::packet::{read_f64_le, read_i16_le, read_u8, read_u16_le, read_u32_le};

/// One message out of a full-depth frame.
#[derive(Debug, Clone, PartialEq)]
pub enum DepthMessage {
    /// One side of an instrument's book.
    Book(DepthBook),
    /// Server-initiated disconnect.
    Disconnect {
        header: DepthHeader,
        reason: DisconnectReason,
    },
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Decode every message in a full-depth frame, in order.
///
/// `protocol` selects the row bound: 20 rows for [`FeedProtocol::Depth20`],
/// the header's row count (capped at 200) for [`FeedProtocol::Depth200`].
/// Rows are always bounded by the declared message length. Fails if any
/// message in the frame is malformed; see [`decode_depth_messages`] to keep
/// the messages before it.
pub fn decode_depth_frame(data: &[u8], protocol: FeedProtocol) -> Result<Vec<DepthMessage>, ProtocolError> {
    match decode_depth_messages(data, protocol) {
        (messages, None) => Ok(messages),
        (_, Some(err)) => Err(err),
    }
}

/// Decode messages from the start of a full-depth frame until the end or
/// the first malformed message.
///
/// Returns the messages decoded so far together with the error that
/// stopped decoding, if any. Nothing after a malformed message is read.
pub fn decode_depth_messages(data: &[u8], protocol: FeedProtocol) -> (Vec<DepthMessage>, Option<ProtocolError>) {
    let mut messages = Vec::new();
    let mut rest = data;

    while !rest.is_empty() {
        match decode_depth_message(rest, protocol) {
            Ok((message, consumed)) => {
                messages.push(message);
                rest = &rest[consumed..];
            }
            Err(e) => return (messages, Some(e)),
        }
    }

    (messages, None)
}

/// Decode the message at the start of `data`, returning it and its length.
fn decode_depth_message(data: &[u8], protocol: FeedProtocol) -> Result<(DepthMessage, usize), ProtocolError> {
    let header = parse_depth_header(data)?;

    let declared = i32::from(header.message_length);
    let len = usize::try_from(declared).unwrap_or(0);
    if len < DEPTH_HEADER_LEN || len > data.len() {
        return Err(ProtocolError::LengthMismatch {
            declared,
            available: data.len(),
        });
    }
    let body = &data[DEPTH_HEADER_LEN..len];

    let code = DepthResponseCode::from_byte(header.message_code)
        .ok_or(ProtocolError::UnknownPacketType(header.message_code))?;

    let message = match code {
        DepthResponseCode::Bid | DepthResponseCode::Ask => {
            let side = if code == DepthResponseCode::Bid {
                DepthSide::Bid
            } else {
                DepthSide::Ask
            };
            let max_rows = match protocol {
                FeedProtocol::Depth200 => (header.row_count as usize).min(DEPTH_200_MAX_ROWS),
                _ => DEPTH_20_ROWS,
            };
            let rows = read_rows(body, max_rows);
            DepthMessage::Book(DepthBook { header, side, rows })
        }
        DepthResponseCode::Disconnect => {
            if body.len() < 2 {
                return Err(ProtocolError::Truncated {
                    packet: "depth disconnect",
                    need: DEPTH_HEADER_LEN + 2,
                    have: len,
                });
            }
            let mut off = 0;
            let reason = DisconnectReason::from_code(read_u16_le(body, &mut off));
            DepthMessage::Disconnect { header, reason }
        }
    };

    Ok((message, len))
}

fn parse_depth_header(data: &[u8]) -> Result<DepthHeader, ProtocolError> {
    if data.len() < DEPTH_HEADER_LEN {
        return Err(ProtocolError::Truncated {
            packet: "depth header",
            need: DEPTH_HEADER_LEN,
            have: data.len(),
        });
    }
    let mut off = 0usize;
    Ok(DepthHeader {
        message_length: read_i16_le(data, &mut off),
        message_code: read_u8(data, &mut off),
        exchange_segment_raw: read_u8(data, &mut off),
        // Signed on the wire; security ids are never negative.
        security_id: read_u32_le(data, &mut off),
        row_count: read_u32_le(data, &mut off),
    })
}

/// Read up to `max_rows` complete rows; a trailing partial row is dropped.
fn read_rows(body: &[u8], max_rows: usize) -> Vec<DepthRow> {
    let count = (body.len() / DEPTH_ROW_LEN).min(max_rows);
    let mut rows = Vec::with_capacity(count);
    let mut off = 0usize;
    for _ in 0..count {
        rows.push(DepthRow {
            price: read_f64_le(body, &mut off).into(),
            quantity: read_u32_le(body, &mut off),
            orders: read_u32_le(body, &mut off),
        });
    }
    rows
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Streaming join of bid and ask books keyed by `(segment, security id)`.
///
/// Holds at most one pending side per instrument; a side waits only until
/// its pair arrives or the aggregator is cleared.
#[derive(Debug, Default)]
pub struct DepthAggregator {
    pending: HashMap<(u8, u32), DepthBook>,
}

impl DepthAggregator {
    /// Create an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer one side of a book.
    ///
    /// Returns the combined snapshot once both sides of an instrument are
    /// present, clearing them. A repeated side replaces the pending one.
    pub fn push(&mut self, book: DepthBook) -> Option<DepthSnapshot> {
        let key = (book.header.exchange_segment_raw, book.header.security_id);

        match self.pending.remove(&key) {
            Some(waiting) if waiting.side == book.side.opposite() => {
                let (bid, ask) = match book.side {
                    DepthSide::Bid => (book, waiting),
                    DepthSide::Ask => (waiting, book),
                };
                Some(combine(bid, ask))
            }
            _ => {
                self.pending.insert(key, book);
                None
            }
        }
    }

    /// Number of instruments waiting for their other side.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drop every pending side.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

fn combine(bid: DepthBook, ask: DepthBook) -> DepthSnapshot {
    let mut bids = bid.rows;
    let mut asks = ask.rows;
    bids.sort_by(|a, b| b.price.value().total_cmp(&a.price.value()));
    asks.sort_by(|a, b| a.price.value().total_cmp(&b.price.value()));

    let segment = bid.header.exchange_segment_raw;
    DepthSnapshot {
        exchange_segment: ExchangeSegment::from_segment_code(segment),
        exchange_segment_raw: segment,
        security_id: bid.header.security_id,
        bids,
        asks,
    }
}
