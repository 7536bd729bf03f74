//! Shared helpers: a scripted in-memory transport and packet fixtures.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::sync::mpsc;
use url::Url;

use dhan_feed::config::{FeedConfig, FeedConfigBuilder};
use dhan_feed::types::enums::FeedProtocol;
use dhan_feed::types::instrument::InstrumentSpec;
use dhan_feed::ws::transport::{Connector, FeedTransport, Frame};
use dhan_feed::{DhanError, Result};

pub const CLIENT_ID: &str = "1000000001";
pub const ACCESS_TOKEN: &str = "test-access-token";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn config(protocol: FeedProtocol, instruments: Vec<InstrumentSpec>) -> FeedConfig {
    FeedConfigBuilder::new(CLIENT_ID, ACCESS_TOKEN)
        .protocol(protocol)
        .instruments(instruments)
        .build()
}

// ===================================================================
// Mock transport
// ===================================================================

#[derive(Default)]
struct Shared {
    sent: Mutex<Vec<Frame>>,
    urls: Mutex<Vec<String>>,
    fail_sends: AtomicBool,
    closed: AtomicBool,
}

/// Server side of a mock connection: scripts inbound frames and records
/// what the client sent.
pub struct MockServer {
    shared: Arc<Shared>,
    inbound: Option<mpsc::UnboundedSender<Result<Frame>>>,
}

pub struct MockConnector {
    shared: Arc<Shared>,
    inbound: Mutex<Option<mpsc::UnboundedReceiver<Result<Frame>>>>,
    delay: Option<Duration>,
}

pub struct MockTransport {
    shared: Arc<Shared>,
    inbound: mpsc::UnboundedReceiver<Result<Frame>>,
}

/// A connector whose single connection is driven by the returned server.
pub fn mock() -> (MockConnector, MockServer) {
    mock_with_delay(None)
}

/// Like [`mock`], but `connect` sleeps for `delay` first.
pub fn mock_with_delay(delay: Option<Duration>) -> (MockConnector, MockServer) {
    let shared = Arc::new(Shared::default());
    let (tx, rx) = mpsc::unbounded_channel();
    (
        MockConnector {
            shared: Arc::clone(&shared),
            inbound: Mutex::new(Some(rx)),
            delay,
        },
        MockServer {
            shared,
            inbound: Some(tx),
        },
    )
}

impl Connector for MockConnector {
    type Transport = MockTransport;

    async fn connect(&self, url: &Url) -> Result<MockTransport> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.shared.urls.lock().unwrap().push(url.to_string());
        let inbound = self
            .inbound
            .lock()
            .unwrap()
            .take()
            .ok_or(DhanError::ConnectionClosed)?;
        Ok(MockTransport {
            shared: Arc::clone(&self.shared),
            inbound,
        })
    }
}

impl FeedTransport for MockTransport {
    async fn send(&mut self, frame: Frame) -> Result<()> {
        if self.shared.fail_sends.load(Ordering::SeqCst) {
            return Err(DhanError::ConnectionClosed);
        }
        self.shared.sent.lock().unwrap().push(frame);
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<Frame>> {
        self.inbound.recv().await
    }

    async fn close(&mut self) -> Result<()> {
        self.shared.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl MockServer {
    pub fn push(&self, frame: Frame) {
        if let Some(tx) = &self.inbound {
            let _ = tx.send(Ok(frame));
        }
    }

    pub fn push_binary(&self, data: Bytes) {
        self.push(Frame::Binary(data));
    }

    pub fn push_error(&self, err: DhanError) {
        if let Some(tx) = &self.inbound {
            let _ = tx.send(Err(err));
        }
    }

    /// End the inbound stream, as a dropped socket would.
    pub fn hang_up(&mut self) {
        self.inbound = None;
    }

    pub fn fail_sends(&self, fail: bool) {
        self.shared.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Frame> {
        self.shared.sent.lock().unwrap().clone()
    }

    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.sent()
            .into_iter()
            .filter_map(|f| match f {
                Frame::Text(text) => Some(serde_json::from_str(&text).expect("sent text is JSON")),
                _ => None,
            })
            .collect()
    }

    pub fn sent_binary(&self) -> Vec<Bytes> {
        self.sent()
            .into_iter()
            .filter_map(|f| match f {
                Frame::Binary(data) => Some(data),
                _ => None,
            })
            .collect()
    }

    pub fn urls(&self) -> Vec<String> {
        self.shared.urls.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }
}

// ===================================================================
// Standard feed fixtures
// ===================================================================

fn header(code: u8, len: usize, segment: u8, security_id: u32) -> BytesMut {
    let mut buf = BytesMut::with_capacity(len);
    buf.put_u8(code);
    buf.put_u16_le(len as u16);
    buf.put_u8(segment);
    buf.put_u32_le(security_id);
    buf
}

/// `(bid_qty, ask_qty, bid_orders, ask_orders, bid_price, ask_price)`.
pub type Level = (u32, u32, u16, u16, f32, f32);

fn put_levels(buf: &mut BytesMut, levels: &[Level; 5]) {
    for &(bid_qty, ask_qty, bid_orders, ask_orders, bid_price, ask_price) in levels {
        buf.put_u32_le(bid_qty);
        buf.put_u32_le(ask_qty);
        buf.put_u16_le(bid_orders);
        buf.put_u16_le(ask_orders);
        buf.put_f32_le(bid_price);
        buf.put_f32_le(ask_price);
    }
}

pub fn sample_levels() -> [Level; 5] {
    [
        (100, 200, 3, 4, 1500.0, 1500.5),
        (110, 210, 5, 6, 1499.5, 1501.0),
        (120, 220, 7, 8, 1499.0, 1501.5),
        (130, 230, 9, 10, 1498.5, 1502.0),
        (140, 240, 11, 12, 1498.0, 1502.5),
    ]
}

pub fn ticker_packet(segment: u8, security_id: u32, ltp: f32, ltt: u32) -> Bytes {
    let mut buf = header(2, 16, segment, security_id);
    buf.put_f32_le(ltp);
    buf.put_u32_le(ltt);
    buf.freeze()
}

pub fn market_depth_packet(segment: u8, security_id: u32, ltp: f32, levels: &[Level; 5]) -> Bytes {
    let mut buf = header(3, 112, segment, security_id);
    buf.put_f32_le(ltp);
    put_levels(&mut buf, levels);
    buf.freeze()
}

pub fn quote_packet(segment: u8, security_id: u32) -> Bytes {
    let mut buf = header(4, 50, segment, security_id);
    buf.put_f32_le(1500.5); // ltp
    buf.put_u16_le(25); // ltq
    buf.put_u32_le(1_700_000_000); // ltt
    buf.put_f32_le(1498.25); // avg price
    buf.put_u32_le(1_000_000); // volume
    buf.put_u32_le(40_000); // total sell
    buf.put_u32_le(60_000); // total buy
    buf.put_f32_le(1490.0); // open
    buf.put_f32_le(1485.0); // close
    buf.put_f32_le(1510.0); // high
    buf.put_f32_le(1480.0); // low
    buf.freeze()
}

pub fn oi_packet(segment: u8, security_id: u32, oi: u32) -> Bytes {
    let mut buf = header(5, 12, segment, security_id);
    buf.put_u32_le(oi);
    buf.freeze()
}

pub fn prev_close_packet(segment: u8, security_id: u32, prev_close: f32, prev_oi: u32) -> Bytes {
    let mut buf = header(6, 16, segment, security_id);
    buf.put_f32_le(prev_close);
    buf.put_u32_le(prev_oi);
    buf.freeze()
}

pub fn status_packet() -> Bytes {
    header(7, 8, 0, 0).freeze()
}

pub fn full_packet(segment: u8, security_id: u32, levels: &[Level; 5]) -> Bytes {
    let mut buf = header(8, 162, segment, security_id);
    buf.put_f32_le(245.75); // ltp
    buf.put_u16_le(50); // ltq
    buf.put_u32_le(1_700_000_000); // ltt
    buf.put_f32_le(244.5); // avg price
    buf.put_u32_le(750_000); // volume
    buf.put_u32_le(12_000); // total sell
    buf.put_u32_le(15_000); // total buy
    buf.put_u32_le(90_000); // oi
    buf.put_u32_le(95_000); // oi day high
    buf.put_u32_le(85_000); // oi day low
    buf.put_f32_le(240.0); // open
    buf.put_f32_le(238.0); // close
    buf.put_f32_le(250.0); // high
    buf.put_f32_le(236.5); // low
    put_levels(&mut buf, levels);
    buf.freeze()
}

pub fn disconnect_packet(reason: u16) -> Bytes {
    let mut buf = header(50, 10, 1, 0);
    buf.put_u16_le(reason);
    buf.freeze()
}

// ===================================================================
// Full-depth fixtures
// ===================================================================

/// One full-depth message: 12-byte header + `(price, quantity, orders)` rows.
pub fn depth_message(code: u8, segment: u8, security_id: u32, rows: &[(f64, u32, u32)]) -> BytesMut {
    let len = 12 + rows.len() * 16;
    let mut buf = BytesMut::with_capacity(len);
    buf.put_i16_le(len as i16);
    buf.put_u8(code);
    buf.put_u8(segment);
    buf.put_i32_le(security_id as i32);
    buf.put_u32_le(rows.len() as u32);
    for &(price, quantity, orders) in rows {
        buf.put_f64_le(price);
        buf.put_u32_le(quantity);
        buf.put_u32_le(orders);
    }
    buf
}

pub fn depth_disconnect(reason: u16) -> BytesMut {
    let mut buf = BytesMut::with_capacity(14);
    buf.put_i16_le(14);
    buf.put_u8(50);
    buf.put_u8(1);
    buf.put_i32_le(0);
    buf.put_u32_le(0);
    buf.put_u16_le(reason);
    buf
}

/// Concatenate messages into one WebSocket frame.
pub fn frame_of(messages: &[BytesMut]) -> Bytes {
    let mut buf = BytesMut::new();
    for m in messages {
        buf.extend_from_slice(m);
    }
    buf.freeze()
}
