//! Typed values for the live market feed.
//!
//! ## Organization
//!
//! - [`enums`]: Exchange segments, feed types, request/response codes,
//!   protocol selection, disconnect reasons
//! - [`instrument`]: Instrument keys and subscription inputs
//! - [`tick`]: Decoded packets and full-depth books
//!
//! All three are re-exported at the module root.

pub mod enums;
pub mod instrument;
pub mod tick;

pub use enums::*;
pub use instrument::*;
pub use tick::*;
