//! Feed session: connection, authentication, subscription and streaming.
//!
//! A [`FeedSession`] owns one socket and walks it through
//!
//! ```text
//! Disconnected → Connecting → Authenticating (v1) → Subscribing → Streaming
//!                                                        ↓            ↓
//!                                                     Failed     Disconnected
//! ```
//!
//! Every read and write goes through `&mut self`, so a session has exactly
//! one reader and one writer. Use [`FeedSession::spawn`] to drive it from a
//! background task instead.
//!
//! # Example
//!
//! ```no_run
//! use dhan_feed::config::FeedConfigBuilder;
//! use dhan_feed::types::{ExchangeSegment, FeedType, InstrumentSpec};
//! use dhan_feed::ws::session::FeedSession;
//!
//! # #[tokio::main]
//! # async fn main() -> dhan_feed::Result<()> {
//! let config = FeedConfigBuilder::new("client-id", "access-token")
//!     .instrument(InstrumentSpec::with_feed_type(ExchangeSegment::NSE_EQ, "1333", FeedType::Quote))
//!     .build();
//!
//! let mut session = FeedSession::new(config)?;
//! session.run().await?;
//!
//! while let Some(tick) = session.next_tick().await? {
//!     println!("{tick:?}");
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::fmt;

use futures_util::Stream;

use crate::config::FeedConfig;
use crate::constants::REQUEST_HEADER_LEN;
use crate::constants::limits::MAX_INSTRUMENTS_PER_CONNECTION;
use crate::error::{AuthFailure, ConfigError, DhanError, ProtocolError, Result};
use crate::types::enums::{DisconnectReason, FeedProtocol, FeedRequestCode};
use crate::types::instrument::{InstrumentSpec, SubscriptionRequest};
use crate::types::tick::TickRecord;
use crate::ws::batcher;
use crate::ws::full_depth::{DepthAggregator, DepthMessage, decode_depth_messages};
use crate::ws::packet::decode_packet;
use crate::ws::subscriptions::SubscriptionSet;
use crate::ws::transport::{Connector, FeedTransport, Frame, WsConnector};
use crate::ws::wire::{self, SubscriptionAction};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No socket. Initial state, and the state after a clean close.
    Disconnected,
    /// Opening the socket.
    Connecting,
    /// Sending the v1 auth frame.
    Authenticating,
    /// Connected; initial subscriptions not yet sent.
    Subscribing,
    /// Receiving ticks.
    Streaming,
    /// Terminated by the server or a transport error. Not reusable.
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Authenticating => "authenticating",
            Self::Subscribing => "subscribing",
            Self::Streaming => "streaming",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Whether the server has accepted the session's credentials.
///
/// The feed never acknowledges auth; a session counts as authenticated once
/// its credentials have been presented, until the server says otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthState {
    Unauthenticated,
    Authenticated,
    Failed,
}

/// A market-feed connection.
///
/// Generic over the [`Connector`] so the protocol logic can be exercised
/// without a network; production code uses the default [`WsConnector`].
pub struct FeedSession<C: Connector = WsConnector> {
    config: FeedConfig,
    connector: C,
    transport: Option<C::Transport>,
    state: SessionState,
    auth: AuthState,
    subscriptions: SubscriptionSet,
    aggregator: DepthAggregator,
    pending: VecDeque<TickRecord>,
    /// Decode error from the tail of a frame whose earlier ticks are queued.
    frame_error: Option<ProtocolError>,
    terminal: Option<DhanError>,
}

impl FeedSession<WsConnector> {
    /// Create a session over `tokio-tungstenite`.
    ///
    /// The instrument list is validated here; nothing is sent until
    /// [`run`](Self::run) or [`connect`](Self::connect).
    pub fn new(config: FeedConfig) -> Result<Self> {
        Self::with_connector(config, WsConnector)
    }
}

impl<C: Connector> FeedSession<C> {
    /// Create a session that opens its socket through `connector`.
    pub fn with_connector(config: FeedConfig, connector: C) -> Result<Self> {
        let requests = batcher::normalize(&config.instruments, config.protocol)?;
        let mut subscriptions = SubscriptionSet::new();
        check_capacity(&subscriptions, &requests)?;
        subscriptions.insert(requests);

        Ok(Self {
            config,
            connector,
            transport: None,
            state: SessionState::Disconnected,
            auth: AuthState::Unauthenticated,
            subscriptions,
            aggregator: DepthAggregator::new(),
            pending: VecDeque::new(),
            frame_error: None,
            terminal: None,
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn auth_state(&self) -> AuthState {
        self.auth
    }

    pub fn protocol(&self) -> FeedProtocol {
        self.config.protocol
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// The tracked subscription set.
    pub fn subscriptions(&self) -> &SubscriptionSet {
        &self.subscriptions
    }

    /// Whether a socket is currently held.
    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Open the socket and authenticate.
    ///
    /// v2 and the depth feeds authenticate through the URL. v1 sends the
    /// binary auth frame; both steps share the configured connect timeout.
    /// On success the session is `Subscribing`.
    pub async fn connect(&mut self) -> Result<()> {
        match self.state {
            SessionState::Failed => {
                return Err(DhanError::InvalidArgument(
                    "session has failed; create a new session".into(),
                ));
            }
            _ if self.transport.is_some() => {
                return Err(DhanError::InvalidArgument("session is already connected".into()));
            }
            _ => {}
        }

        let url = self.config.connect_url()?;
        let timeout = self.config.connect_timeout;
        self.state = SessionState::Connecting;
        tracing::info!(protocol = %self.config.protocol, "Connecting to market feed");

        let transport = match tokio::time::timeout(timeout, self.open(&url)).await {
            Ok(Ok(transport)) => transport,
            Ok(Err(e)) => {
                if self.state != SessionState::Failed {
                    self.state = SessionState::Disconnected;
                }
                return Err(e);
            }
            Err(_) => {
                self.state = SessionState::Disconnected;
                return Err(DhanError::Timeout {
                    after: timeout,
                    during: "connecting",
                });
            }
        };

        self.transport = Some(transport);
        self.auth = AuthState::Authenticated;
        self.state = SessionState::Subscribing;
        tracing::info!(protocol = %self.config.protocol, "Market feed connected");
        Ok(())
    }

    async fn open(&mut self, url: &url::Url) -> Result<C::Transport> {
        let mut transport = self.connector.connect(url).await?;

        if self.config.protocol == FeedProtocol::V1 {
            self.state = SessionState::Authenticating;
            let creds = &self.config.credentials;
            let packet = wire::encode_auth_packet(&creds.client_id, &creds.access_token);
            if let Err(e) = transport.send(Frame::Binary(packet)).await {
                tracing::error!(error = %e, "Failed to send auth packet");
                self.state = SessionState::Failed;
                self.auth = AuthState::Failed;
                return Err(DhanError::Authentication(AuthFailure::SendFailed(e.to_string())));
            }
        }

        Ok(transport)
    }

    /// Send the tracked instruments, one frame per batch, then start
    /// streaming.
    pub async fn subscribe_instruments(&mut self) -> Result<()> {
        if self.transport.is_none() {
            return Err(DhanError::InvalidArgument("session is not connected".into()));
        }

        self.state = SessionState::Subscribing;
        let requests: Vec<SubscriptionRequest> = self.subscriptions.iter().cloned().collect();
        self.send_requests(&requests, SubscriptionAction::Subscribe).await?;
        self.state = SessionState::Streaming;

        tracing::info!(
            protocol = %self.config.protocol,
            instruments = self.subscriptions.len(),
            "Subscribed to market feed"
        );
        Ok(())
    }

    /// Connect, authenticate and subscribe.
    pub async fn run(&mut self) -> Result<()> {
        self.connect().await?;
        self.subscribe_instruments().await
    }

    /// Close the feed.
    ///
    /// v2 and the depth feeds are told to disconnect first; v1 just closes.
    /// The socket is released and the session is `Disconnected` even if a
    /// send fails; the first error is returned.
    pub async fn disconnect(&mut self) -> Result<()> {
        let farewell = match self.config.protocol {
            FeedProtocol::V1 => Vec::new(),
            _ => vec![
                Frame::Text(wire::disconnect_message()?),
                Frame::Binary(wire::encode_header(
                    FeedRequestCode::Disconnect,
                    REQUEST_HEADER_LEN as u16,
                    &self.config.credentials.client_id,
                )),
            ],
        };

        let Some(mut transport) = self.transport.take() else {
            if self.state != SessionState::Failed {
                self.state = SessionState::Disconnected;
            }
            return Ok(());
        };

        let mut first_err = None;
        for frame in farewell {
            if let Err(e) = transport.send(frame).await {
                first_err = Some(e);
                break;
            }
        }
        if let Err(e) = transport.close().await {
            first_err.get_or_insert(e);
        }

        self.state = SessionState::Disconnected;
        self.pending.clear();
        self.frame_error = None;
        self.aggregator.clear();
        tracing::info!(protocol = %self.config.protocol, "Market feed disconnected");

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    // -----------------------------------------------------------------------
    // Incremental subscription
    // -----------------------------------------------------------------------

    /// Add instruments. While streaming, only those not already tracked are
    /// sent, and they are tracked once sent. Returns how many were added.
    pub async fn subscribe_symbols(&mut self, specs: &[InstrumentSpec]) -> Result<usize> {
        let requests = batcher::normalize(specs, self.config.protocol)?;
        check_capacity(&self.subscriptions, &requests)?;

        if self.state != SessionState::Streaming {
            return Ok(self.subscriptions.insert(requests).len());
        }

        let new: Vec<SubscriptionRequest> = requests
            .into_iter()
            .filter(|req| !self.subscriptions.contains(req))
            .collect();
        if !new.is_empty() {
            self.send_requests(&new, SubscriptionAction::Subscribe).await?;
        }
        Ok(self.subscriptions.insert(new).len())
    }

    /// Remove instruments. While streaming, unsubscribe frames are sent for
    /// those that were tracked. Returns how many were removed.
    pub async fn unsubscribe_symbols(&mut self, specs: &[InstrumentSpec]) -> Result<usize> {
        let requests = batcher::normalize(specs, self.config.protocol)?;
        let removed = self.subscriptions.remove(&requests);

        if self.state == SessionState::Streaming && !removed.is_empty() {
            self.send_requests(&removed, SubscriptionAction::Unsubscribe).await?;
        }
        Ok(removed.len())
    }

    async fn send_requests(&mut self, requests: &[SubscriptionRequest], action: SubscriptionAction) -> Result<()> {
        let protocol = self.config.protocol;
        let batches = batcher::batch(requests, protocol.batch_size())?;

        for (feed_type, chunks) in &batches {
            for chunk in chunks {
                let frame = wire::encode_subscription(
                    protocol,
                    &self.config.credentials.client_id,
                    *feed_type,
                    chunk,
                    action,
                )?;
                tracing::debug!(
                    protocol = %protocol,
                    count = chunk.len(),
                    request_code = wire::request_code(protocol, *feed_type, action).code(),
                    action = ?action,
                    "Sending subscription batch"
                );
                self.send(frame).await?;
            }
        }
        Ok(())
    }

    async fn send(&mut self, frame: Frame) -> Result<()> {
        let transport = self.transport.as_mut().ok_or(DhanError::ConnectionClosed)?;
        if let Err(e) = transport.send(frame).await {
            tracing::error!(error = %e, "Failed to send frame");
            self.fail();
            return Err(e);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Receiving
    // -----------------------------------------------------------------------

    /// Wait for the next decoded tick.
    ///
    /// - `Ok(Some(tick))`: a tick.
    /// - `Err(e)` with `!e.is_terminal()`: one frame could not be decoded;
    ///   keep reading.
    /// - `Err(e)` with `e.is_terminal()`: the session has failed. Returned
    ///   once; later calls yield `Ok(None)`.
    /// - `Ok(None)`: the socket is closed.
    ///
    /// Cancel-safe: the only await point is the transport receive.
    pub async fn next_tick(&mut self) -> Result<Option<TickRecord>> {
        loop {
            if let Some(tick) = self.pending.pop_front() {
                return Ok(Some(tick));
            }
            if let Some(err) = self.frame_error.take() {
                return Err(err.into());
            }
            if let Some(err) = self.terminal.take() {
                return Err(err);
            }
            let Some(transport) = self.transport.as_mut() else {
                return Ok(None);
            };

            let received = transport.recv().await;
            match received {
                Some(Ok(Frame::Binary(data))) => {
                    if let Err(e) = self.handle_binary(&data) {
                        tracing::warn!(error = %e, len = data.len(), "Failed to decode packet");
                        return Err(e.into());
                    }
                }
                Some(Ok(Frame::Text(text))) => {
                    tracing::debug!("Received text: {text}");
                }
                Some(Ok(Frame::Close)) | None => {
                    tracing::info!(protocol = %self.config.protocol, "Market feed closed by server");
                    self.transport = None;
                    self.state = SessionState::Disconnected;
                    self.aggregator.clear();
                    return Ok(None);
                }
                Some(Err(e)) => {
                    tracing::error!(error = %e, "WebSocket error");
                    self.fail();
                    return Err(e);
                }
            }
        }
    }

    fn handle_binary(&mut self, data: &[u8]) -> std::result::Result<(), ProtocolError> {
        if self.config.protocol.is_full_depth() {
            let (messages, error) = decode_depth_messages(data, self.config.protocol);
            for message in messages {
                match message {
                    DepthMessage::Book(book) => {
                        if let Some(snapshot) = self.aggregator.push(book) {
                            self.pending.push_back(TickRecord::FullDepth(snapshot));
                        }
                    }
                    DepthMessage::Disconnect { reason, .. } => {
                        self.server_disconnect(reason);
                        return Ok(());
                    }
                }
            }
            if let Some(e) = error {
                if self.pending.is_empty() {
                    return Err(e);
                }
                tracing::warn!(error = %e, len = data.len(), "Dropped malformed tail of depth frame");
                self.frame_error = Some(e);
            }
            return Ok(());
        }

        match decode_packet(data)? {
            TickRecord::Disconnect { reason, .. } => self.server_disconnect(reason),
            tick => self.pending.push_back(tick),
        }
        Ok(())
    }

    fn server_disconnect(&mut self, reason: DisconnectReason) {
        tracing::error!(reason = reason.code(), "Server disconnected: {reason}");
        if reason.is_auth_failure() {
            self.auth = AuthState::Failed;
        }
        self.fail();
        self.terminal = Some(DhanError::from_disconnect(reason));
    }

    /// Drop the socket and mark the session failed.
    fn fail(&mut self) {
        self.transport = None;
        self.state = SessionState::Failed;
        self.aggregator.clear();
    }

    /// Adapt the session into a stream of ticks.
    ///
    /// Yields per-frame protocol errors and the terminal error as `Err`
    /// items, then ends.
    pub fn into_stream(self) -> impl Stream<Item = Result<TickRecord>> {
        futures_util::stream::unfold(self, |mut session| async move {
            match session.next_tick().await {
                Ok(Some(tick)) => Some((Ok(tick), session)),
                Ok(None) => None,
                Err(e) => Some((Err(e), session)),
            }
        })
    }
}

fn check_capacity(set: &SubscriptionSet, requests: &[SubscriptionRequest]) -> std::result::Result<(), ConfigError> {
    let new = requests.iter().filter(|r| !set.contains(r)).count();
    let count = set.len() + new;
    if count > MAX_INSTRUMENTS_PER_CONNECTION {
        return Err(ConfigError::TooManyInstruments {
            count,
            limit: MAX_INSTRUMENTS_PER_CONNECTION,
        });
    }
    Ok(())
}

impl<C: Connector> fmt::Debug for FeedSession<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedSession")
            .field("protocol", &self.config.protocol)
            .field("state", &self.state)
            .field("auth", &self.auth)
            .field("subscriptions", &self.subscriptions.len())
            .field("connected", &self.transport.is_some())
            .finish()
    }
}
