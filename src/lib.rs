//! # dhan-feed
//!
//! An async client for the [DhanHQ](https://dhanhq.co/docs/v2/) live market
//! feed: connection and authentication, batched instrument subscriptions,
//! and decoding of the feed's binary packets into typed ticks, including the
//! 20- and 200-level full market depth feeds.
//!
//! ## Quick Start
//!
//! ```no_run
//! use dhan_feed::{FeedConfigBuilder, FeedSession};
//! use dhan_feed::types::{ExchangeSegment, FeedType, InstrumentSpec};
//!
//! #[tokio::main]
//! async fn main() -> dhan_feed::Result<()> {
//!     let config = FeedConfigBuilder::new("your-client-id", "your-access-token")
//!         .instrument(InstrumentSpec::with_feed_type(ExchangeSegment::NSE_EQ, "1333", FeedType::Ticker))
//!         .build();
//!
//!     let mut session = FeedSession::new(config)?;
//!     session.run().await?;
//!
//!     while let Some(tick) = session.next_tick().await? {
//!         println!("{tick:?}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Organization
//!
//! - [`config`]: Credentials and session configuration
//! - [`types`]: Enums, instrument identities, decoded ticks
//! - [`ws`]: Codec, batching and the session itself
//! - [`error`]: Error taxonomy

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
pub mod ws;

/// Re-export the configuration types at crate root for convenience.
pub use config::{Credentials, FeedConfig, FeedConfigBuilder};
/// Re-export the error type and Result alias.
pub use error::{DhanError, Result};
/// Re-export the session and its background handle.
pub use ws::runner::FeedHandle;
pub use ws::session::{AuthState, FeedSession, SessionState};
