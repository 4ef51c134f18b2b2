//! One connected chat client.
//!
//! Each accepted connection gets its own `Session` that:
//! - Spawns a writer task draining the session's outbox to the socket
//! - Joins the registry (or tells the client the server is full)
//! - Reads lines, classifies them, and routes them through the registry
//! - Leaves the registry and flushes its outbox on every exit path
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations use `?`, pattern matching, or `unwrap_or`
//! - Connection errors are logged and result in graceful disconnect

use std::net::SocketAddr;
use std::sync::Arc;

use futures::SinkExt;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tokio_util::codec::{FramedWrite, LinesCodec, LinesCodecError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use chatty_core::SessionId;
use chatty_protocol::{Command, ServerLine};

use super::lines::{Inbound, LineReader};
use crate::config::ServerConfig;
use crate::registry::{
    render, DepartureReason, DirectOutcome, Membership, OutboundLine, Peer, RegistryError,
    RegistryHandle,
};

/// What the read loop does after handling one line.
enum Next {
    Continue,
    Quit,
}

/// Server side of one client connection.
pub struct Session {
    /// Internal identity, independent of the nickname
    id: SessionId,

    /// Remote address, for logging
    peer_addr: SocketAddr,

    /// Bounded line reader over the read half
    reader: LineReader<OwnedReadHalf>,

    /// Write half, handed to the writer task on `run`
    writer: Option<OwnedWriteHalf>,

    /// Handle to the nickname registry
    registry: RegistryHandle,

    /// Shared server settings
    config: Arc<ServerConfig>,

    /// Server-wide shutdown signal
    shutdown: CancellationToken,
}

impl Session {
    /// Creates a session for an accepted connection.
    ///
    /// # Arguments
    ///
    /// * `id` - Unique identity for this connection
    /// * `stream` - The accepted TCP stream
    /// * `peer_addr` - Remote address of the client
    /// * `registry` - Handle to the nickname registry
    /// * `config` - Server settings
    /// * `shutdown` - Token cancelled when the server stops
    pub fn new(
        id: SessionId,
        stream: TcpStream,
        peer_addr: SocketAddr,
        registry: RegistryHandle,
        config: Arc<ServerConfig>,
        shutdown: CancellationToken,
    ) -> Self {
        let (read_half, write_half) = stream.into_split();

        Self {
            id,
            peer_addr,
            reader: LineReader::new(read_half, config.max_line_length),
            writer: Some(write_half),
            registry,
            config,
            shutdown,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Runs the session until the client quits, disconnects, or the
    /// server shuts down.
    ///
    /// Returns why the session ended, or `None` if it never joined.
    pub async fn run(mut self) -> Option<DepartureReason> {
        let write_half = self.writer.take()?;
        let (outbox, outbox_rx) = mpsc::channel(self.config.outbox_capacity);
        let me = Peer::new(self.id, outbox);
        let write_failed = CancellationToken::new();

        let writer = tokio::spawn(write_lines(
            self.id,
            write_half,
            outbox_rx,
            self.config.write_timeout,
            write_failed.clone(),
        ));

        let membership = match self.registry.join(me.clone()).await {
            Ok(membership) => membership,
            Err(RegistryError::RegistryFull { max }) => {
                info!(session = %self.id, peer = %self.peer_addr, max, "Server full, refusing client");
                me.deliver(&render(&ServerLine::ServerFull { max }));
                drop(me);
                self.finish_writer(writer).await;
                return None;
            }
            Err(e) => {
                warn!(session = %self.id, error = %e, "Failed to join registry");
                drop(me);
                self.finish_writer(writer).await;
                return None;
            }
        };

        info!(
            session = %self.id,
            peer = %self.peer_addr,
            nickname = %membership.initial_nickname(),
            "Client connected"
        );

        let reason = self.read_loop(&me, &write_failed).await;

        if reason == DepartureReason::Quit {
            me.deliver(&render(&ServerLine::Farewell));
        }

        self.depart(membership, reason).await;
        drop(me);
        self.finish_writer(writer).await;

        info!(session = %self.id, peer = %self.peer_addr, %reason, "Client disconnected");
        Some(reason)
    }

    /// Reads and dispatches lines until the session has to end.
    async fn read_loop(&mut self, me: &Peer, write_failed: &CancellationToken) -> DepartureReason {
        loop {
            let inbound = tokio::select! {
                _ = self.shutdown.cancelled() => {
                    debug!(session = %self.id, "Shutdown requested");
                    return DepartureReason::ServerShutdown;
                }

                _ = write_failed.cancelled() => {
                    return DepartureReason::WriteFailed;
                }

                result = self.reader.next_line() => result,
            };

            match inbound {
                Ok(Some(Inbound::Line(line))) => match self.handle_line(&line, me).await {
                    Ok(Next::Continue) => {}
                    Ok(Next::Quit) => return DepartureReason::Quit,
                    Err(RegistryError::ChannelClosed) => {
                        debug!(session = %self.id, "Registry closed");
                        return DepartureReason::ServerShutdown;
                    }
                    Err(e) => {
                        warn!(session = %self.id, error = %e, "Registry rejected request");
                        return DepartureReason::Disconnected;
                    }
                },
                Ok(Some(Inbound::TooLong)) => {
                    debug!(
                        session = %self.id,
                        max = self.config.max_line_length,
                        "Discarded overlong line"
                    );
                    me.deliver(&render(&ServerLine::LineTooLong {
                        max: self.config.max_line_length,
                    }));
                }
                Ok(None) => {
                    debug!(session = %self.id, "Client sent EOF");
                    return DepartureReason::Disconnected;
                }
                Err(e) => {
                    debug!(session = %self.id, error = %e, "Read failed");
                    return DepartureReason::Disconnected;
                }
            }
        }
    }

    /// Classifies one line and acts on it.
    async fn handle_line(&self, line: &str, me: &Peer) -> Result<Next, RegistryError> {
        let Some(command) = Command::parse(line) else {
            return Ok(Next::Continue);
        };

        match command {
            Command::Quit => return Ok(Next::Quit),

            Command::Rename(name) => {
                let previous = self.registry.rename(self.id, name.clone()).await?;
                info!(session = %self.id, from = %previous, to = %name, "Nickname changed");
            }

            Command::DirectMessage { target, message } => {
                match self
                    .registry
                    .direct_message(self.id, target.clone(), message)
                    .await?
                {
                    DirectOutcome::Delivered(delivery) => {
                        debug!(
                            session = %self.id,
                            target = %target,
                            delivered = delivery.delivered,
                            dropped = delivery.dropped,
                            "Direct message routed"
                        );
                    }
                    DirectOutcome::NotFound => {
                        debug!(session = %self.id, target = %target, "Direct message target not found");
                    }
                }
            }

            Command::Broadcast(text) => {
                let delivery = self.registry.chat(self.id, text).await?;
                debug!(
                    session = %self.id,
                    delivered = delivery.delivered,
                    dropped = delivery.dropped,
                    "Chat line relayed"
                );
            }

            Command::Invalid(err) => {
                debug!(session = %self.id, error = %err, "Rejected command");
                me.deliver(&render(&ServerLine::Rejected(err)));
            }
        }

        Ok(Next::Continue)
    }

    /// Leaves the registry, announcing the departure if `reason` calls for it.
    async fn depart(&self, membership: Membership, reason: DepartureReason) {
        match membership.leave(reason).await {
            Ok(Some(name)) => {
                debug!(session = %self.id, nickname = %name, %reason, "Left registry");
            }
            Ok(None) => {
                debug!(session = %self.id, "Session was not registered");
            }
            Err(e) => {
                debug!(session = %self.id, error = %e, "Could not leave registry");
            }
        }
    }

    /// Waits for the writer to drain the outbox, up to the flush timeout.
    ///
    /// The writer only finishes once every outbox sender is gone, so the
    /// caller must have dropped its own `Peer` and left the registry.
    async fn finish_writer(&self, mut writer: JoinHandle<Result<(), SessionError>>) {
        match timeout(self.config.flush_timeout, &mut writer).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => {
                warn!(session = %self.id, error = %e, "Write to client failed");
            }
            Ok(Err(e)) => {
                warn!(session = %self.id, error = %e, "Writer task failed");
            }
            Err(_) => {
                debug!(session = %self.id, "Outbox not drained in time, closing");
                writer.abort();
            }
        }
    }
}

// ============================================================================
// Writer Task
// ============================================================================

/// Drains a session's outbox to the socket, one line per write.
///
/// Finishes when every outbox sender is gone, then shuts the write side
/// down. A failed or timed-out write cancels `failed` so the read loop
/// ends the session.
async fn write_lines(
    session: SessionId,
    write_half: OwnedWriteHalf,
    mut outbox: mpsc::Receiver<OutboundLine>,
    write_timeout: Duration,
    failed: CancellationToken,
) -> Result<(), SessionError> {
    let mut sink = FramedWrite::new(write_half, LinesCodec::new());

    while let Some(line) = outbox.recv().await {
        let result = match timeout(write_timeout, sink.send(line)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(SessionError::Codec(e)),
            Err(_) => Err(SessionError::WriteTimeout),
        };

        if let Err(e) = result {
            debug!(session = %session, error = %e, "Writer stopping");
            failed.cancel();
            return Err(e);
        }
    }

    sink.into_inner().shutdown().await?;
    Ok(())
}

/// Errors that can occur while serving one client.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Write timeout")]
    WriteTimeout,

    #[error("Codec error: {0}")]
    Codec(#[from] LinesCodecError),
}
