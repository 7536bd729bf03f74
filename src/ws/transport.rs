//! WebSocket transport boundary.
//!
//! The session speaks to the server only through [`Connector`] and
//! [`FeedTransport`], so the protocol logic can run over any bidirectional
//! frame stream. [`WsConnector`] is the production implementation on top of
//! `tokio-tungstenite`.

use std::future::Future;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::error::Error as WsError;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use crate::error::{DhanError, Result};

/// A data frame on the feed socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Binary packet.
    Binary(Bytes),
    /// JSON request or server text.
    Text(String),
    /// Close handshake.
    Close,
}

/// An open, bidirectional feed socket.
///
/// Implementations own the socket exclusively; the session never shares it.
pub trait FeedTransport: Send {
    /// Send one frame. Completes before the next send may start.
    fn send(&mut self, frame: Frame) -> impl Future<Output = Result<()>> + Send;

    /// Wait for the next data frame. `None` once the socket has ended.
    ///
    /// Must be cancel-safe: dropping the future loses no frame.
    fn recv(&mut self) -> impl Future<Output = Option<Result<Frame>>> + Send;

    /// Close the socket.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Opens feed sockets.
pub trait Connector: Send + Sync {
    /// The socket type produced.
    type Transport: FeedTransport;

    /// Open a socket to `url`.
    fn connect(&self, url: &Url) -> impl Future<Output = Result<Self::Transport>> + Send;
}

// ---------------------------------------------------------------------------
// tokio-tungstenite implementation
// ---------------------------------------------------------------------------

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// [`Connector`] backed by `tokio-tungstenite` (rustls, webpki roots).
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    type Transport = WsTransport;

    async fn connect(&self, url: &Url) -> Result<WsTransport> {
        let (ws, resp) = connect_async(url.as_str()).await?;
        tracing::debug!(status = %resp.status(), "WebSocket handshake complete");
        Ok(WsTransport { ws })
    }
}

/// A live `tokio-tungstenite` socket.
///
/// Ping/pong is answered by tungstenite itself and never surfaces as a frame.
pub struct WsTransport {
    ws: WsStream,
}

impl FeedTransport for WsTransport {
    async fn send(&mut self, frame: Frame) -> Result<()> {
        let msg = match frame {
            Frame::Binary(data) => Message::Binary(data),
            Frame::Text(text) => Message::Text(text.into()),
            Frame::Close => Message::Close(None),
        };
        self.ws.send(msg).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<Frame>> {
        loop {
            match self.ws.next().await? {
                Ok(Message::Binary(data)) => return Some(Ok(Frame::Binary(data))),
                Ok(Message::Text(text)) => return Some(Ok(Frame::Text(text.as_str().to_owned()))),
                Ok(Message::Close(_)) => return Some(Ok(Frame::Close)),
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => continue,
                Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => return None,
                Err(e) => return Some(Err(DhanError::from(e))),
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self.ws.close(None).await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
