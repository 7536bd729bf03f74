//! Request encoders for the feed's outbound frames.
//!
//! v1 talks binary: an 83-byte request header (`<bH30s50s>`: request code,
//! message length, zero-padded client id, 50 reserved zero bytes) ahead of
//! every auth and subscription frame. v2 and the full-depth feeds take JSON
//! subscription messages instead.

use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;

use crate::constants::{
    ACCESS_TOKEN_LEN, AUTH_TYPE_MARKER, CLIENT_ID_LEN, HEADER_RESERVED_LEN, INSTRUMENT_SLOT_LEN,
    REQUEST_HEADER_LEN, SECURITY_ID_LEN,
};
use crate::error::{ConfigError, Result};
use crate::types::enums::{ExchangeSegment, FeedProtocol, FeedRequestCode, FeedType};
use crate::types::instrument::InstrumentKey;
use crate::ws::transport::Frame;

/// Whether a subscription frame adds or removes instruments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionAction {
    Subscribe,
    Unsubscribe,
}

// ---------------------------------------------------------------------------
// JSON request types
// ---------------------------------------------------------------------------

/// JSON subscribe/unsubscribe request sent over the WebSocket.
#[derive(Debug, Serialize)]
#[allow(non_snake_case)]
struct FeedSubscribeRequest<'a> {
    RequestCode: FeedRequestCode,
    InstrumentCount: usize,
    InstrumentList: &'a [InstrumentKey],
}

/// Single-instrument request used by the 200-level depth feed.
#[derive(Debug, Serialize)]
#[allow(non_snake_case)]
struct SingleInstrumentRequest<'a> {
    RequestCode: FeedRequestCode,
    ExchangeSegment: ExchangeSegment,
    SecurityId: &'a str,
}

/// JSON disconnect request.
#[derive(Debug, Serialize)]
#[allow(non_snake_case)]
struct FeedDisconnectRequest {
    RequestCode: FeedRequestCode,
}

/// `{"RequestCode": .., "InstrumentCount": .., "InstrumentList": [..]}`.
pub fn subscription_message(code: FeedRequestCode, instruments: &[InstrumentKey]) -> Result<String> {
    let req = FeedSubscribeRequest {
        RequestCode: code,
        InstrumentCount: instruments.len(),
        InstrumentList: instruments,
    };
    Ok(serde_json::to_string(&req)?)
}

/// `{"RequestCode": .., "ExchangeSegment": .., "SecurityId": ..}`.
pub fn single_instrument_message(code: FeedRequestCode, instrument: &InstrumentKey) -> Result<String> {
    let req = SingleInstrumentRequest {
        RequestCode: code,
        ExchangeSegment: instrument.exchange_segment,
        SecurityId: &instrument.security_id,
    };
    Ok(serde_json::to_string(&req)?)
}

/// `{"RequestCode": 12}`.
pub fn disconnect_message() -> Result<String> {
    let req = FeedDisconnectRequest {
        RequestCode: FeedRequestCode::Disconnect,
    };
    Ok(serde_json::to_string(&req)?)
}

// ---------------------------------------------------------------------------
// Binary frames
// ---------------------------------------------------------------------------

/// Copy `data` into a fixed-width field, truncating or zero-padding.
fn put_padded(buf: &mut BytesMut, data: &[u8], width: usize) {
    let n = data.len().min(width);
    buf.put_slice(&data[..n]);
    buf.put_bytes(0, width - n);
}

fn put_header(buf: &mut BytesMut, code: FeedRequestCode, message_length: u16, client_id: &str) {
    buf.put_u8(code.code());
    buf.put_u16_le(message_length);
    put_padded(buf, client_id.as_bytes(), CLIENT_ID_LEN);
    buf.put_bytes(0, HEADER_RESERVED_LEN);
}

/// The 83-byte request header on its own.
///
/// Sent after the JSON disconnect request when closing a v2 / full-depth
/// session, with `message_length` 83.
pub fn encode_header(code: FeedRequestCode, message_length: u16, client_id: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(REQUEST_HEADER_LEN);
    put_header(&mut buf, code, message_length, client_id);
    buf.freeze()
}

/// v1 auth frame: header (code 11) + 500-byte zero-padded token + `"2P"`.
pub fn encode_auth_packet(client_id: &str, access_token: &str) -> Bytes {
    let total = REQUEST_HEADER_LEN + ACCESS_TOKEN_LEN + AUTH_TYPE_MARKER.len();
    let mut buf = BytesMut::with_capacity(total);
    put_header(&mut buf, FeedRequestCode::Connect, total as u16, client_id);
    put_padded(&mut buf, access_token.as_bytes(), ACCESS_TOKEN_LEN);
    buf.put_slice(AUTH_TYPE_MARKER);
    buf.freeze()
}

/// v1 subscription frame.
///
/// Header + u32 instrument count + one 21-byte slot per instrument
/// (segment code, zero-padded security id), padded with empty slots up to
/// `capacity`. The declared message length counts only the filled slots, as
/// the server expects.
pub fn encode_subscription_packet(
    client_id: &str,
    instruments: &[InstrumentKey],
    code: FeedRequestCode,
    capacity: usize,
) -> std::result::Result<Bytes, ConfigError> {
    let count = instruments.len();
    if count > capacity {
        return Err(ConfigError::BatchTooLarge { count, capacity });
    }

    let message_length = REQUEST_HEADER_LEN + 4 + count * INSTRUMENT_SLOT_LEN;
    let mut buf = BytesMut::with_capacity(REQUEST_HEADER_LEN + 4 + capacity * INSTRUMENT_SLOT_LEN);
    put_header(&mut buf, code, message_length as u16, client_id);
    buf.put_u32_le(count as u32);

    for inst in instruments {
        buf.put_u8(inst.exchange_segment.segment_code());
        put_padded(&mut buf, inst.security_id.as_bytes(), SECURITY_ID_LEN);
    }
    buf.put_bytes(0, (capacity - count) * INSTRUMENT_SLOT_LEN);

    Ok(buf.freeze())
}

// ---------------------------------------------------------------------------
// Per-protocol framing
// ---------------------------------------------------------------------------

/// Request code for `action` on `feed_type` under `protocol`.
pub fn request_code(protocol: FeedProtocol, feed_type: FeedType, action: SubscriptionAction) -> FeedRequestCode {
    match action {
        SubscriptionAction::Subscribe => feed_type.subscribe_code(),
        SubscriptionAction::Unsubscribe => protocol.unsubscribe_code(feed_type),
    }
}

/// Encode one subscription batch the way `protocol` frames it.
pub fn encode_subscription(
    protocol: FeedProtocol,
    client_id: &str,
    feed_type: FeedType,
    batch: &[InstrumentKey],
    action: SubscriptionAction,
) -> Result<Frame> {
    let code = request_code(protocol, feed_type, action);

    let frame = match protocol {
        FeedProtocol::V1 => Frame::Binary(encode_subscription_packet(
            client_id,
            batch,
            code,
            protocol.packet_slots(),
        )?),
        FeedProtocol::V2 | FeedProtocol::Depth20 => Frame::Text(subscription_message(code, batch)?),
        FeedProtocol::Depth200 => match batch {
            [instrument] => Frame::Text(single_instrument_message(code, instrument)?),
            [] => return Err(ConfigError::InvalidBatchSize.into()),
            _ => {
                return Err(ConfigError::BatchTooLarge {
                    count: batch.len(),
                    capacity: 1,
                }
                .into());
            }
        },
    };

    Ok(frame)
}
