//! Registry actor commands, errors, and departure reasons.
//!
//! This module defines the message types for communicating with the `RegistryActor`:
//! - `RegistryCommand`: Commands sent to the actor
//! - `RegistryError`: Errors that can occur during registry operations
//! - `DepartureReason`: Why a session left, which decides whether others are told
//!
//! All types are designed for async message passing and follow the panic-free policy.

use chatty_core::{Nickname, SessionId};
use thiserror::Error;
use tokio::sync::oneshot;

use super::peer::{Delivery, DirectOutcome, Peer};

// ============================================================================
// Registry Commands
// ============================================================================

/// Commands sent to the registry actor.
///
/// Request-style commands carry a oneshot sender for the reply. The actor
/// ignores send failures on it: the requester may have gone away.
#[derive(Debug)]
pub enum RegistryCommand {
    /// Register a newly connected session under the default nickname and
    /// announce it to everyone else.
    ///
    /// # Errors
    /// - `RegistryError::SessionAlreadyExists` if the session is already registered
    /// - `RegistryError::RegistryFull` if at maximum capacity
    Join {
        peer: Peer,
        respond_to: oneshot::Sender<Result<Nickname, RegistryError>>,
    },

    /// Unregister a session and, depending on `reason`, announce its departure.
    ///
    /// Unknown sessions are a no-op. `respond_to` is `None` for the
    /// fire-and-forget variant posted from `Membership::drop`.
    Leave {
        session_id: SessionId,
        reason: DepartureReason,
        respond_to: Option<oneshot::Sender<Option<Nickname>>>,
    },

    /// Move a session to a new nickname and confirm it to that session.
    ///
    /// Replies with the previous nickname.
    ///
    /// # Errors
    /// - `RegistryError::SessionNotFound` if the session isn't registered
    Rename {
        session_id: SessionId,
        name: Nickname,
        respond_to: oneshot::Sender<Result<Nickname, RegistryError>>,
    },

    /// Relay a chat line to every session except the sender.
    ///
    /// # Errors
    /// - `RegistryError::SessionNotFound` if the sender isn't registered
    Chat {
        session_id: SessionId,
        text: String,
        respond_to: oneshot::Sender<Result<Delivery, RegistryError>>,
    },

    /// Deliver a direct message to every session registered under `target`.
    ///
    /// # Errors
    /// - `RegistryError::SessionNotFound` if the sender isn't registered
    DirectMessage {
        session_id: SessionId,
        target: Nickname,
        text: String,
        respond_to: oneshot::Sender<Result<DirectOutcome, RegistryError>>,
    },

    /// Sessions currently registered under a nickname.
    Lookup {
        name: Nickname,
        respond_to: oneshot::Sender<Vec<SessionId>>,
    },

    /// Every nickname in use with its sessions, sorted by nickname.
    Snapshot {
        respond_to: oneshot::Sender<Vec<(Nickname, Vec<SessionId>)>>,
    },

    /// Number of registered sessions.
    SessionCount { respond_to: oneshot::Sender<usize> },
}

// ============================================================================
// Registry Errors
// ============================================================================

/// Errors that can occur during registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The registry has reached its maximum session capacity.
    #[error("registry is full (max: {max} sessions)")]
    RegistryFull {
        /// Maximum number of sessions allowed
        max: usize,
    },

    /// The requested session was not found.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// A session with this ID already exists.
    #[error("session already exists: {0}")]
    SessionAlreadyExists(SessionId),

    /// The response channel was closed before receiving a response.
    ///
    /// This typically indicates the actor was shut down.
    #[error("response channel closed")]
    ChannelClosed,
}

// ============================================================================
// Departure Reasons
// ============================================================================

/// Why a session left the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepartureReason {
    /// Client sent `/quit`.
    Quit,

    /// Client closed the connection or a read failed.
    Disconnected,

    /// Writing to the client failed or timed out.
    WriteFailed,

    /// The server is shutting down.
    ServerShutdown,
}

impl DepartureReason {
    /// Whether the remaining sessions are told that this one left.
    ///
    /// Abrupt disconnects are announced like `/quit` so nobody keeps
    /// addressing a ghost; a server shutdown is not announced.
    #[must_use]
    pub fn announces(self) -> bool {
        !matches!(self, Self::ServerShutdown)
    }
}

impl std::fmt::Display for DepartureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Quit => write!(f, "quit"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::WriteFailed => write!(f, "write failed"),
            Self::ServerShutdown => write!(f, "server shutdown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_error_display() {
        let err = RegistryError::RegistryFull { max: 100 };
        assert_eq!(err.to_string(), "registry is full (max: 100 sessions)");

        let err = RegistryError::SessionNotFound(SessionId::new(4));
        assert_eq!(err.to_string(), "session not found: session-4");

        let err = RegistryError::SessionAlreadyExists(SessionId::new(5));
        assert_eq!(err.to_string(), "session already exists: session-5");

        let err = RegistryError::ChannelClosed;
        assert_eq!(err.to_string(), "response channel closed");
    }

    #[test]
    fn test_departure_reason_announces() {
        assert!(DepartureReason::Quit.announces());
        assert!(DepartureReason::Disconnected.announces());
        assert!(DepartureReason::WriteFailed.announces());
        assert!(!DepartureReason::ServerShutdown.announces());
    }

    #[test]
    fn test_departure_reason_display() {
        assert_eq!(DepartureReason::Quit.to_string(), "quit");
        assert_eq!(DepartureReason::Disconnected.to_string(), "disconnected");
        assert_eq!(DepartureReason::WriteFailed.to_string(), "write failed");
        assert_eq!(DepartureReason::ServerShutdown.to_string(), "server shutdown");
    }

    #[tokio::test]
    async fn test_command_channel_closed_error() {
        let (tx, rx) = oneshot::channel::<Result<Nickname, RegistryError>>();

        drop(tx);

        assert!(rx.await.is_err());
    }
}
