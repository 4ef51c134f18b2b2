//! Message routing over the name registry.
//!
//! These functions decide who receives a line and push it onto the
//! recipients' outboxes. They run inside the registry actor, so the
//! registry they see cannot change underneath them: a broadcast reaches
//! each registered session at most once, and sessions that join or leave
//! concurrently are simply ordered before or after it.

use chatty_core::{Nickname, SessionId};
use chatty_protocol::ServerLine;

use super::names::NameRegistry;
use super::peer::{render, Delivery, DirectOutcome};

/// Sends `line` to every registered session except `origin`.
pub fn broadcast(registry: &NameRegistry, origin: SessionId, line: &ServerLine) -> Delivery {
    let rendered = render(line);
    let mut delivery = Delivery::default();

    for peer in registry.peers().filter(|p| p.id() != origin) {
        delivery.record(peer.deliver(&rendered));
    }

    delivery
}

/// Sends a chat line from `origin`, attributed to its current name.
///
/// Returns `None` if `origin` is not registered.
pub fn chat(registry: &NameRegistry, origin: SessionId, text: String) -> Option<Delivery> {
    let from = registry.name_of(origin)?.clone();
    Some(broadcast(registry, origin, &ServerLine::Chat { from, text }))
}

/// Sends a direct message to every session registered under `target`.
///
/// If nobody holds `target`, the sender alone receives a not-found notice.
/// Returns `None` if `origin` is not registered.
pub fn direct_message(
    registry: &NameRegistry,
    origin: SessionId,
    target: &Nickname,
    text: String,
) -> Option<DirectOutcome> {
    let sender = registry.peer(origin)?;
    let from = registry.name_of(origin)?.clone();

    let recipients = registry.lookup(target.as_str());
    if recipients.is_empty() {
        sender.deliver(&render(&ServerLine::NotFound(target.clone())));
        return Some(DirectOutcome::NotFound);
    }

    let rendered = render(&ServerLine::Direct { from, text });
    let mut delivery = Delivery::default();
    for peer in recipients {
        delivery.record(peer.deliver(&rendered));
    }

    Some(DirectOutcome::Delivered(delivery))
}

/// Moves `session_id` to `new_name` and confirms the change to it.
///
/// Returns the previous name, or `None` if the session is not registered.
pub fn rename(
    registry: &mut NameRegistry,
    session_id: SessionId,
    new_name: Nickname,
) -> Option<Nickname> {
    let (old_name, peer) = registry.unregister_session(session_id)?;

    peer.deliver(&render(&ServerLine::Renamed(new_name.clone())));
    registry.register(new_name, peer);

    Some(old_name)
}
