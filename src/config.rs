//! Feed session configuration.
//!
//! [`FeedConfig`] bundles credentials, feed selection, the initial
//! instrument list, and connection tuning. Build one with
//! [`FeedConfigBuilder`]:
//!
//! ```no_run
//! use dhan_feed::config::FeedConfigBuilder;
//! use dhan_feed::types::{ExchangeSegment, FeedProtocol, FeedType, InstrumentSpec};
//!
//! let config = FeedConfigBuilder::new("1000000001", "your-access-token")
//!     .protocol(FeedProtocol::V2)
//!     .instrument(InstrumentSpec::with_feed_type(ExchangeSegment::NSE_EQ, "1333", FeedType::Quote))
//!     .build();
//! ```

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::constants::AUTH_TYPE;
use crate::error::{DhanError, Result};
use crate::types::enums::FeedProtocol;
use crate::types::instrument::InstrumentSpec;

/// Environment variable holding the Dhan client ID.
pub const ENV_CLIENT_ID: &str = "DHAN_CLIENT_ID";

/// Environment variable holding the access token.
pub const ENV_ACCESS_TOKEN: &str = "DHAN_ACCESS_TOKEN";

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Client ID and access token, supplied by the caller's auth flow.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// The Dhan client ID (user-specific identification).
    pub client_id: String,
    /// JWT access token.
    pub access_token: String,
}

impl Credentials {
    /// Create credentials.
    pub fn new(client_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            access_token: access_token.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for a [`FeedSession`](crate::ws::session::FeedSession).
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Credentials for the feed.
    pub credentials: Credentials,
    /// Feed and protocol version.
    pub protocol: FeedProtocol,
    /// Instruments subscribed when the session starts.
    pub instruments: Vec<InstrumentSpec>,
    /// Endpoint override; `None` uses the protocol's default URL.
    pub endpoint: Option<String>,
    /// Limit on opening the socket and sending the v1 auth frame.
    pub connect_timeout: Duration,
    /// Capacity of the tick channel returned by `FeedSession::spawn`.
    pub event_channel_capacity: usize,
}

impl FeedConfig {
    /// The URL to connect to, with credentials embedded for the feeds that
    /// authenticate on connect.
    ///
    /// - v1: bare endpoint (auth travels in a binary frame)
    /// - v2: `?version=2&token=..&clientId=..&authType=2`
    /// - full depth: `?token=..&clientId=..&authType=2`
    pub fn connect_url(&self) -> Result<Url> {
        let base = self.endpoint.as_deref().unwrap_or(self.protocol.default_url());
        let creds = &self.credentials;

        let url = match self.protocol {
            FeedProtocol::V1 => Url::parse(base)?,
            FeedProtocol::V2 => Url::parse_with_params(
                base,
                &[
                    ("version", "2"),
                    ("token", creds.access_token.as_str()),
                    ("clientId", creds.client_id.as_str()),
                    ("authType", AUTH_TYPE),
                ],
            )?,
            FeedProtocol::Depth20 | FeedProtocol::Depth200 => Url::parse_with_params(
                base,
                &[
                    ("token", creds.access_token.as_str()),
                    ("clientId", creds.client_id.as_str()),
                    ("authType", AUTH_TYPE),
                ],
            )?,
        };
        Ok(url)
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`FeedConfig`].
///
/// Defaults: v2 protocol, no instruments, default endpoint, 10 s connect
/// timeout, 4,096-event channel.
#[derive(Debug, Clone)]
pub struct FeedConfigBuilder {
    config: FeedConfig,
}

impl FeedConfigBuilder {
    /// Create a new builder with the given credentials.
    pub fn new(client_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            config: FeedConfig {
                credentials: Credentials::new(client_id, access_token),
                protocol: FeedProtocol::default(),
                instruments: Vec::new(),
                endpoint: None,
                connect_timeout: Duration::from_secs(10),
                event_channel_capacity: 4096,
            },
        }
    }

    /// Create a builder from `DHAN_CLIENT_ID` / `DHAN_ACCESS_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| DhanError::InvalidArgument(format!("{name} is not set")))
        };
        Ok(Self::new(read(ENV_CLIENT_ID)?, read(ENV_ACCESS_TOKEN)?))
    }

    /// Select the feed. Default: [`FeedProtocol::V2`].
    pub fn protocol(mut self, protocol: FeedProtocol) -> Self {
        self.config.protocol = protocol;
        self
    }

    /// Add one instrument to the initial subscription list.
    pub fn instrument(mut self, spec: impl Into<InstrumentSpec>) -> Self {
        self.config.instruments.push(spec.into());
        self
    }

    /// Add instruments to the initial subscription list.
    pub fn instruments<I>(mut self, specs: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<InstrumentSpec>,
    {
        self.config.instruments.extend(specs.into_iter().map(Into::into));
        self
    }

    /// Connect to `endpoint` instead of the protocol's default URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = Some(endpoint.into());
        self
    }

    /// Set the connect (and v1 auth) timeout. Default: 10 s.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the tick channel capacity used by `spawn`. Default: 4,096.
    pub fn event_channel_capacity(mut self, cap: usize) -> Self {
        self.config.event_channel_capacity = cap.max(1);
        self
    }

    /// Build the [`FeedConfig`].
    pub fn build(self) -> FeedConfig {
        self.config
    }
}
