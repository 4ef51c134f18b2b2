//! Client interface for interacting with the RegistryActor.
//!
//! The `RegistryHandle` provides a cheap-to-clone interface for sending
//! commands to the registry actor. `join` hands back a [`Membership`] guard
//! that takes the session out of the registry on every exit path.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations use `?`, pattern matching, or `unwrap_or`
//! - Channel errors are mapped to `RegistryError::ChannelClosed`

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use chatty_core::{Nickname, SessionId};

use super::commands::{DepartureReason, RegistryCommand, RegistryError};
use super::peer::{Delivery, DirectOutcome, Peer};

// ============================================================================
// Registry Handle
// ============================================================================

/// Handle for interacting with the registry actor.
///
/// This is a cheap-to-clone handle that can be shared across tasks.
/// All methods are async and communicate with the actor via channels.
#[derive(Clone)]
pub struct RegistryHandle {
    /// Command sender to the actor
    sender: mpsc::Sender<RegistryCommand>,
}

impl RegistryHandle {
    /// Create a new registry handle.
    pub fn new(sender: mpsc::Sender<RegistryCommand>) -> Self {
        Self { sender }
    }

    /// Sends a request and waits for the actor's reply.
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> RegistryCommand,
    ) -> Result<T, RegistryError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(build(tx))
            .await
            .map_err(|_| RegistryError::ChannelClosed)?;

        rx.await.map_err(|_| RegistryError::ChannelClosed)
    }

    /// Register a newly connected session under the default nickname.
    ///
    /// Everyone else is told that the session joined. The returned
    /// [`Membership`] must be kept for as long as the session is connected.
    ///
    /// # Errors
    ///
    /// - `RegistryError::SessionAlreadyExists` if the session is already registered
    /// - `RegistryError::RegistryFull` if the registry is at maximum capacity
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn join(&self, peer: Peer) -> Result<Membership, RegistryError> {
        let session_id = peer.id();
        let nickname = self
            .request(|respond_to| RegistryCommand::Join { peer, respond_to })
            .await??;

        Ok(Membership {
            session_id,
            nickname,
            registry: self.clone(),
            left: false,
        })
    }

    /// Unregister a session, announcing the departure if `reason` calls for it.
    ///
    /// Returns the nickname the session held, or `None` if it was not registered.
    ///
    /// # Errors
    ///
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn leave(
        &self,
        session_id: SessionId,
        reason: DepartureReason,
    ) -> Result<Option<Nickname>, RegistryError> {
        self.request(|tx| RegistryCommand::Leave {
            session_id,
            reason,
            respond_to: Some(tx),
        })
        .await
    }

    /// Move a session to `name`. The session receives a confirmation line.
    ///
    /// Returns the previous nickname.
    ///
    /// # Errors
    ///
    /// - `RegistryError::SessionNotFound` if the session isn't registered
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn rename(
        &self,
        session_id: SessionId,
        name: Nickname,
    ) -> Result<Nickname, RegistryError> {
        self.request(|respond_to| RegistryCommand::Rename {
            session_id,
            name,
            respond_to,
        })
        .await?
    }

    /// Relay a chat line from `session_id` to everyone else.
    ///
    /// # Errors
    ///
    /// - `RegistryError::SessionNotFound` if the sender isn't registered
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn chat(&self, session_id: SessionId, text: String) -> Result<Delivery, RegistryError> {
        self.request(|respond_to| RegistryCommand::Chat {
            session_id,
            text,
            respond_to,
        })
        .await?
    }

    /// Deliver a direct message to every session named `target`.
    ///
    /// # Errors
    ///
    /// - `RegistryError::SessionNotFound` if the sender isn't registered
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn direct_message(
        &self,
        session_id: SessionId,
        target: Nickname,
        text: String,
    ) -> Result<DirectOutcome, RegistryError> {
        self.request(|respond_to| RegistryCommand::DirectMessage {
            session_id,
            target,
            text,
            respond_to,
        })
        .await?
    }

    /// Sessions currently registered under `name`.
    ///
    /// Returns an empty vector if nobody holds the name or if
    /// communication with the actor fails.
    pub async fn lookup(&self, name: Nickname) -> Vec<SessionId> {
        self.request(|respond_to| RegistryCommand::Lookup { name, respond_to })
            .await
            .unwrap_or_default()
    }

    /// Every nickname in use with its sessions, sorted by nickname.
    ///
    /// Returns an empty vector if communication with the actor fails.
    pub async fn snapshot(&self) -> Vec<(Nickname, Vec<SessionId>)> {
        self.request(|respond_to| RegistryCommand::Snapshot { respond_to })
            .await
            .unwrap_or_default()
    }

    /// Number of registered sessions, or 0 if the actor is gone.
    pub async fn session_count(&self) -> usize {
        self.request(|respond_to| RegistryCommand::SessionCount { respond_to })
            .await
            .unwrap_or_default()
    }

    /// Check if the actor is still running.
    ///
    /// Returns `true` if the command channel is still open.
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }
}

// ============================================================================
// Membership Guard
// ============================================================================

/// Proof that a session is registered.
///
/// Call [`Membership::leave`] on teardown. If the guard is dropped without
/// it (early return, panic in the session task) a fire-and-forget leave is
/// posted instead, treated as a disconnect. If the command channel is full
/// the leave is sent from a spawned task so it is never lost.
pub struct Membership {
    session_id: SessionId,
    nickname: Nickname,
    registry: RegistryHandle,
    left: bool,
}

impl Membership {
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Nickname assigned on join.
    pub fn initial_nickname(&self) -> &Nickname {
        &self.nickname
    }

    /// Leaves the registry for `reason`.
    ///
    /// # Errors
    ///
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn leave(mut self, reason: DepartureReason) -> Result<Option<Nickname>, RegistryError> {
        let result = self.registry.leave(self.session_id, reason).await;
        self.left = true;
        result
    }
}

impl Drop for Membership {
    fn drop(&mut self) {
        if self.left {
            return;
        }

        debug!(session = %self.session_id, "Membership dropped without leave");
        let command = RegistryCommand::Leave {
            session_id: self.session_id,
            reason: DepartureReason::Disconnected,
            respond_to: None,
        };

        match self.registry.sender.try_send(command) {
            Ok(()) | Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(command)) => match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    let sender = self.registry.sender.clone();
                    runtime.spawn(async move {
                        let _ = sender.send(command).await;
                    });
                }
                Err(_) => {
                    warn!(
                        session = %self.session_id,
                        "Registry busy and no runtime available, leave lost"
                    );
                }
            },
        }
    }
}
