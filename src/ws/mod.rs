//! WebSocket market feed.
//!
//! DhanHQ streams market data over three endpoints:
//!
//! - `wss://api-feed.dhan.co`: the live market feed, v1 (binary auth and
//!   subscription frames) or v2 (credentials in the URL, JSON
//!   subscriptions)
//! - `wss://depth-api-feed.dhan.co/twentydepth`: 20-level full depth
//! - `wss://full-depth-api.dhan.co/twohundreddepth`: 200-level full depth
//!
//! All three answer with fixed-layout little-endian binary packets.
//!
//! ## Modules
//!
//! - [`packet`]: Decoder for the standard feed's packets
//! - [`full_depth`]: Decoder and bid/ask aggregator for the depth feeds
//! - [`wire`]: Encoders for auth, subscription and disconnect requests
//! - [`batcher`]: Instrument validation and batching
//! - [`subscriptions`]: The tracked subscription set
//! - [`transport`]: Socket boundary and the `tokio-tungstenite` backend
//! - [`session`]: Connection state machine
//! - [`runner`]: Background task driving a session
//!
//! ## Limits
//!
//! - Up to 5,000 instruments per connection
//! - Up to 100 instruments per subscribe/unsubscribe message (50 on the
//!   20-depth feed, 1 on the 200-depth feed)

pub mod batcher;
pub mod full_depth;
pub mod packet;
pub mod runner;
pub mod session;
pub mod subscriptions;
pub mod transport;
pub mod wire;
