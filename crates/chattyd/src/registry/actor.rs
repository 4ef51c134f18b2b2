//! Registry actor - owns the nickname registry and processes commands.
//!
//! The RegistryActor is the single owner of shared chat state. It receives
//! commands via an mpsc channel and applies them one at a time, so joins,
//! renames, departures and fan-outs never interleave.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Reply channel send failures are ignored (the requester went away)
//! - Delivery failures are counted and logged, never propagated

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use chatty_core::{Nickname, SessionId};
use chatty_protocol::ServerLine;

use super::commands::{DepartureReason, RegistryCommand, RegistryError};
use super::names::NameRegistry;
use super::peer::{Delivery, DirectOutcome, Peer};
use super::route;

/// Default maximum number of sessions the registry holds.
pub const MAX_SESSIONS: usize = 100;

/// The registry actor - owns all nickname state.
///
/// Implements the actor pattern: receives commands via mpsc channel and
/// processes them sequentially. Every outbound line it produces goes
/// through a session's bounded outbox with `try_send`, so one stalled
/// client can never hold the actor up.
pub struct RegistryActor {
    /// Command receiver
    receiver: mpsc::Receiver<RegistryCommand>,

    /// Nickname → sessions, plus the session → nickname index
    names: NameRegistry,

    /// Capacity limit enforced on join
    max_sessions: usize,
}

impl RegistryActor {
    /// Creates a new registry actor.
    ///
    /// # Arguments
    ///
    /// * `receiver` - Channel for receiving commands
    /// * `max_sessions` - Maximum number of concurrently registered sessions
    pub fn new(receiver: mpsc::Receiver<RegistryCommand>, max_sessions: usize) -> Self {
        Self {
            receiver,
            names: NameRegistry::new(),
            max_sessions,
        }
    }

    /// Runs the actor event loop.
    ///
    /// Processes commands until the channel closes (all senders dropped).
    /// This is the main entry point - call this in a spawned task.
    pub async fn run(mut self) {
        info!(max_sessions = self.max_sessions, "Registry actor starting");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!(sessions = self.names.len(), "Registry actor stopped");
    }

    /// Dispatches a command to the appropriate handler.
    fn handle_command(&mut self, cmd: RegistryCommand) {
        match cmd {
            RegistryCommand::Join { peer, respond_to } => {
                let result = self.handle_join(peer);
                let _ = respond_to.send(result);
            }
            RegistryCommand::Leave {
                session_id,
                reason,
                respond_to,
            } => {
                let result = self.handle_leave(session_id, reason);
                if let Some(respond_to) = respond_to {
                    let _ = respond_to.send(result);
                }
            }
            RegistryCommand::Rename {
                session_id,
                name,
                respond_to,
            } => {
                let result = self.handle_rename(session_id, name);
                let _ = respond_to.send(result);
            }
            RegistryCommand::Chat {
                session_id,
                text,
                respond_to,
            } => {
                let result = self.handle_chat(session_id, text);
                let _ = respond_to.send(result);
            }
            RegistryCommand::DirectMessage {
                session_id,
                target,
                text,
                respond_to,
            } => {
                let result = self.handle_direct_message(session_id, target, text);
                let _ = respond_to.send(result);
            }
            RegistryCommand::Lookup { name, respond_to } => {
                let ids = self
                    .names
                    .lookup(name.as_str())
                    .iter()
                    .map(Peer::id)
                    .collect();
                let _ = respond_to.send(ids);
            }
            RegistryCommand::Snapshot { respond_to } => {
                let snapshot = self
                    .names
                    .snapshot_all()
                    .into_iter()
                    .map(|(name, peers)| (name, peers.iter().map(Peer::id).collect()))
                    .collect();
                let _ = respond_to.send(snapshot);
            }
            RegistryCommand::SessionCount { respond_to } => {
                let _ = respond_to.send(self.names.len());
            }
        }
    }

    // ========================================================================
    // Command Handlers
    // ========================================================================

    fn handle_join(&mut self, peer: Peer) -> Result<Nickname, RegistryError> {
        let session_id = peer.id();

        if self.names.contains(session_id) {
            debug!(session = %session_id, "Session already registered, rejecting join");
            return Err(RegistryError::SessionAlreadyExists(session_id));
        }

        if self.names.len() >= self.max_sessions {
            warn!(
                session = %session_id,
                current = self.names.len(),
                max = self.max_sessions,
                "Registry is full, rejecting join"
            );
            return Err(RegistryError::RegistryFull {
                max: self.max_sessions,
            });
        }

        let name = Nickname::anonymous();
        self.names.register(name.clone(), peer);

        let delivery = route::broadcast(&self.names, session_id, &ServerLine::Joined(name.clone()));

        info!(
            session = %session_id,
            nickname = %name,
            total_sessions = self.names.len(),
            notified = delivery.delivered,
            "Session joined"
        );

        Ok(name)
    }

    fn handle_leave(&mut self, session_id: SessionId, reason: DepartureReason) -> Option<Nickname> {
        let Some((name, _peer)) = self.names.unregister_session(session_id) else {
            debug!(session = %session_id, %reason, "Leave for unknown session ignored");
            return None;
        };

        let notified = if reason.announces() {
            route::broadcast(&self.names, session_id, &ServerLine::Left(name.clone())).delivered
        } else {
            0
        };

        info!(
            session = %session_id,
            nickname = %name,
            %reason,
            total_sessions = self.names.len(),
            notified,
            "Session left"
        );

        Some(name)
    }

    fn handle_rename(
        &mut self,
        session_id: SessionId,
        name: Nickname,
    ) -> Result<Nickname, RegistryError> {
        let new_name = name.clone();
        let old_name = route::rename(&mut self.names, session_id, name)
            .ok_or(RegistryError::SessionNotFound(session_id))?;

        info!(
            session = %session_id,
            from = %old_name,
            to = %new_name,
            "Session renamed"
        );

        Ok(old_name)
    }

    fn handle_chat(&self, session_id: SessionId, text: String) -> Result<Delivery, RegistryError> {
        let delivery = route::chat(&self.names, session_id, text)
            .ok_or(RegistryError::SessionNotFound(session_id))?;

        debug!(
            session = %session_id,
            delivered = delivery.delivered,
            dropped = delivery.dropped,
            "Chat line relayed"
        );

        Ok(delivery)
    }

    fn handle_direct_message(
        &self,
        session_id: SessionId,
        target: Nickname,
        text: String,
    ) -> Result<DirectOutcome, RegistryError> {
        let outcome = route::direct_message(&self.names, session_id, &target, text)
            .ok_or(RegistryError::SessionNotFound(session_id))?;

        match outcome {
            DirectOutcome::Delivered(delivery) => debug!(
                session = %session_id,
                target = %target,
                delivered = delivery.delivered,
                dropped = delivery.dropped,
                "Direct message delivered"
            ),
            DirectOutcome::NotFound => debug!(
                session = %session_id,
                target = %target,
                "Direct message target not found"
            ),
        }

        Ok(outcome)
    }

    /// Returns the number of registered sessions (for testing).
    #[cfg(test)]
    pub fn session_count(&self) -> usize {
        self.names.len()
    }
}
