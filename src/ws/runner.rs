//! Background driver for a [`FeedSession`].
//!
//! [`FeedSession::spawn`] moves a session onto its own Tokio task. The task
//! is the only reader and the only writer of the socket: it waits on the
//! next frame and on a command queue at the same time, and a command's
//! frames are fully written before the next receive starts.
//!
//! ```no_run
//! use dhan_feed::config::FeedConfigBuilder;
//! use dhan_feed::types::{ExchangeSegment, InstrumentSpec};
//! use dhan_feed::ws::session::FeedSession;
//!
//! # #[tokio::main]
//! # async fn main() -> dhan_feed::Result<()> {
//! let config = FeedConfigBuilder::from_env()?
//!     .instrument((ExchangeSegment::NSE_EQ, "1333"))
//!     .build();
//!
//! let (handle, mut ticks) = FeedSession::new(config)?.spawn();
//!
//! handle.subscribe(vec![InstrumentSpec::new(ExchangeSegment::NSE_EQ, "11536")]).await?;
//!
//! while let Some(tick) = ticks.recv().await {
//!     match tick {
//!         Ok(tick) => println!("{tick:?}"),
//!         Err(e) if e.is_terminal() => break,
//!         Err(e) => eprintln!("bad frame: {e}"),
//!     }
//! }
//! handle.disconnect().await?;
//! # Ok(())
//! # }
//! ```

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{DhanError, Result};
use crate::types::instrument::InstrumentSpec;
use crate::types::tick::TickRecord;
use crate::ws::session::{FeedSession, SessionState};
use crate::ws::transport::Connector;

const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// A request from a [`FeedHandle`] to its session task.
#[derive(Debug)]
enum Command {
    Subscribe {
        specs: Vec<InstrumentSpec>,
        reply: oneshot::Sender<Result<usize>>,
    },
    Unsubscribe {
        specs: Vec<InstrumentSpec>,
        reply: oneshot::Sender<Result<usize>>,
    },
    Disconnect {
        reply: oneshot::Sender<Result<()>>,
    },
}

enum Step {
    Command(Option<Command>),
    Tick(Result<Option<TickRecord>>),
}

/// Control handle for a spawned session.
///
/// Dropping the handle aborts the session task.
#[derive(Debug)]
pub struct FeedHandle {
    commands: mpsc::Sender<Command>,
    task: JoinHandle<()>,
}

impl FeedHandle {
    /// Add instruments to the running session. Returns how many were new.
    pub async fn subscribe(&self, specs: Vec<InstrumentSpec>) -> Result<usize> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::Subscribe { specs, reply }, rx).await
    }

    /// Remove instruments from the running session. Returns how many were
    /// tracked.
    pub async fn unsubscribe(&self, specs: Vec<InstrumentSpec>) -> Result<usize> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::Unsubscribe { specs, reply }, rx).await
    }

    /// Close the feed and stop the task.
    pub async fn disconnect(self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::Disconnect { reply }, rx).await
    }

    /// Whether the session task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    async fn request<T>(&self, command: Command, rx: oneshot::Receiver<Result<T>>) -> Result<T> {
        self.commands
            .send(command)
            .await
            .map_err(|_| DhanError::ConnectionClosed)?;
        rx.await.map_err(|_| DhanError::ConnectionClosed)?
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl<C> FeedSession<C>
where
    C: Connector + 'static,
    C::Transport: 'static,
{
    /// Run the session on a background task.
    ///
    /// A session that is not yet connected is started with
    /// [`run`](Self::run) first; one that is connected but not yet
    /// subscribed sends its initial subscriptions. Ticks and errors arrive on the returned
    /// receiver, bounded by `event_channel_capacity`; a terminal error is
    /// the last item before the channel closes.
    pub fn spawn(self) -> (FeedHandle, mpsc::Receiver<Result<TickRecord>>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (tick_tx, tick_rx) = mpsc::channel(self.config().event_channel_capacity.max(1));

        let task = tokio::spawn(drive(self, cmd_rx, tick_tx));
        tracing::debug!("Feed session task spawned");

        (FeedHandle { commands: cmd_tx, task }, tick_rx)
    }
}

async fn drive<C: Connector>(
    mut session: FeedSession<C>,
    mut commands: mpsc::Receiver<Command>,
    ticks: mpsc::Sender<Result<TickRecord>>,
) {
    let started = match session.state() {
        SessionState::Streaming => Ok(()),
        SessionState::Subscribing if session.is_connected() => session.subscribe_instruments().await,
        _ => session.run().await,
    };
    if let Err(e) = started {
        tracing::error!(error = %e, "Failed to start market feed");
        let _ = ticks.send(Err(e)).await;
        return;
    }

    loop {
        let step = tokio::select! {
            cmd = commands.recv() => Step::Command(cmd),
            tick = session.next_tick() => Step::Tick(tick),
        };

        match step {
            Step::Command(Some(Command::Subscribe { specs, reply })) => {
                let _ = reply.send(session.subscribe_symbols(&specs).await);
            }
            Step::Command(Some(Command::Unsubscribe { specs, reply })) => {
                let _ = reply.send(session.unsubscribe_symbols(&specs).await);
            }
            Step::Command(Some(Command::Disconnect { reply })) => {
                let _ = reply.send(session.disconnect().await);
                break;
            }
            Step::Command(None) => {
                let _ = session.disconnect().await;
                break;
            }
            Step::Tick(Ok(Some(tick))) => {
                if ticks.send(Ok(tick)).await.is_err() {
                    tracing::debug!("Tick receiver dropped; disconnecting");
                    let _ = session.disconnect().await;
                    break;
                }
            }
            Step::Tick(Ok(None)) => break,
            Step::Tick(Err(e)) => {
                let terminal = e.is_terminal();
                if ticks.send(Err(e)).await.is_err() || terminal {
                    if !terminal {
                        let _ = session.disconnect().await;
                    }
                    break;
                }
            }
        }
    }

    tracing::debug!(state = %session.state(), "Feed session task finished");
}
