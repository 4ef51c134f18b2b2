//! TCP listener for the chat server.
//!
//! The server:
//! - Listens on a TCP port for client connections
//! - Spawns a `Session` for each client
//! - Supports graceful shutdown via CancellationToken
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   ChatServer    │
//! │                 │
//! │   TcpListener   │
//! └───────┬─────────┘
//!         │ accept()
//!         ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │     Session     │────▶│  RegistryHandle │
//! │   (per client)  │     │                 │
//! └─────────────────┘     └─────────────────┘
//!         ▲                        │
//!         │ outbox                 │ fan-out
//!         └────────────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations use `?`, pattern matching, or `unwrap_or`
//! - Accept errors are logged and allow continued operation

mod lines;
mod session;

pub use lines::{Inbound, LineReader};
pub use session::{Session, SessionError};

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

use chatty_core::SessionId;

use crate::config::ServerConfig;
use crate::registry::RegistryHandle;

/// TCP server for the chat relay.
///
/// Accepts connections and hands each one to its own [`Session`].
pub struct ChatServer {
    /// Bound listener
    listener: TcpListener,

    /// Shared server settings
    config: Arc<ServerConfig>,

    /// Handle to the nickname registry
    registry: RegistryHandle,

    /// Cancellation token for graceful shutdown
    cancel_token: CancellationToken,

    /// Connection counter for generating session IDs
    connection_counter: AtomicU64,

    /// Running session tasks, awaited on shutdown
    sessions: TaskTracker,
}

impl ChatServer {
    /// Binds the listener.
    ///
    /// # Arguments
    ///
    /// * `config` - Server settings, including the bind address
    /// * `registry` - Handle to the nickname registry
    /// * `cancel_token` - Token for graceful shutdown
    ///
    /// # Errors
    ///
    /// - `ServerError::Bind` if the address is invalid or already in use
    pub async fn bind(
        config: ServerConfig,
        registry: RegistryHandle,
        cancel_token: CancellationToken,
    ) -> Result<Self, ServerError> {
        let listener =
            TcpListener::bind(config.bind_addr)
                .await
                .map_err(|source| ServerError::Bind {
                    addr: config.bind_addr,
                    source,
                })?;

        Ok(Self {
            listener,
            config: Arc::new(config),
            registry,
            cancel_token,
            connection_counter: AtomicU64::new(0),
            sessions: TaskTracker::new(),
        })
    }

    /// Returns the address the listener is bound to.
    ///
    /// # Errors
    ///
    /// - `ServerError::LocalAddr` if the socket address cannot be read
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener.local_addr().map_err(ServerError::LocalAddr)
    }

    /// Runs the server.
    ///
    /// Accepts connections until the cancellation token is triggered, then
    /// waits for every session to tear down. This method does not return
    /// until shutdown.
    pub async fn run(self) {
        info!(
            addr = %self.local_addr().unwrap_or(self.config.bind_addr),
            max_clients = self.config.max_clients,
            "Chat server listening"
        );

        // Accept connections until cancelled
        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("Server shutdown requested");
                    break;
                }

                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            let conn_num = self.connection_counter.fetch_add(1, Ordering::Relaxed);
                            self.handle_connection(stream, peer_addr, SessionId::new(conn_num));
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                            // Continue accepting other connections
                        }
                    }
                }
            }
        }

        drop(self.listener);
        self.sessions.close();
        self.sessions.wait().await;
        info!("Server cleanup complete");
    }

    /// Handles a new client connection by spawning a session task.
    fn handle_connection(&self, stream: TcpStream, peer_addr: SocketAddr, id: SessionId) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!(session = %id, error = %e, "Failed to set TCP_NODELAY");
        }

        let session = Session::new(
            id,
            stream,
            peer_addr,
            self.registry.clone(),
            Arc::clone(&self.config),
            self.cancel_token.child_token(),
        );

        self.sessions.spawn(async move {
            let reason = session.run().await;
            debug!(session = %id, reason = ?reason, "Session task finished");
        });
    }
}

/// Errors that can occur in server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read listener address: {0}")]
    LocalAddr(#[source] io::Error),
}
