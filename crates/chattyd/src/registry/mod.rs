//! Nickname registry using Actor pattern.
//!
//! The registry is the only state shared between sessions. It receives
//! commands via a tokio mpsc channel, owns the nickname → sessions map,
//! and performs all fan-out (chat, direct messages, join/leave notices)
//! by pushing rendered lines onto each session's outbox.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │    Session      │────▶│  RegistryActor  │────▶│ Session outboxes│
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//!         │                       │                       │
//!         │   RegistryCommand     │   route::*            │  try_send
//!         │   (mpsc channel)      │                       │
//!         ▼                       ▼                       ▼
//!    Join/Rename/Chat       NameRegistry            writer task per
//!    DM/Leave               (name → peers)          connection
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All operations in this module follow the panic-free policy:
//! - No `.unwrap()` or `.expect()` in production code
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

use tokio::sync::mpsc;

mod actor;
mod commands;
mod handle;
mod names;
mod peer;
pub mod route;

pub use actor::{RegistryActor, MAX_SESSIONS};
pub use commands::{DepartureReason, RegistryCommand, RegistryError};
pub use handle::{Membership, RegistryHandle};
pub use names::NameRegistry;
pub use peer::{render, Delivery, DirectOutcome, Outbox, OutboundLine, Peer};

/// Channel buffer size for registry commands
const COMMAND_BUFFER: usize = 256;

/// Spawn the registry actor and return a handle for interaction.
///
/// The actor stops once every handle (and every `Membership`) is dropped.
///
/// # Example
///
/// ```no_run
/// use chattyd::registry::{spawn_registry, MAX_SESSIONS};
///
/// #[tokio::main]
/// async fn main() {
///     let handle = spawn_registry(MAX_SESSIONS);
///     let online = handle.session_count().await;
/// }
/// ```
pub fn spawn_registry(max_sessions: usize) -> RegistryHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);

    let actor = RegistryActor::new(cmd_rx, max_sessions);
    tokio::spawn(actor.run());

    RegistryHandle::new(cmd_tx)
}
