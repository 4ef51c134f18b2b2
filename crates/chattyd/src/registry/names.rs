//! Nickname → sessions mapping.
//!
//! `NameRegistry` is a plain, single-owner data structure. It is only ever
//! touched from inside the registry actor task, which is what makes every
//! operation atomic with respect to every other one.
//!
//! # Invariants
//!
//! - A session appears under at most one name at a time.
//! - A name entry exists only while its session list is non-empty.
//! - `names` (session → nickname index) mirrors `by_name` exactly.

use std::collections::HashMap;

use chatty_core::{Nickname, SessionId};

use super::peer::Peer;

#[derive(Debug, Default)]
pub struct NameRegistry {
    /// Primary storage: nickname → sessions in registration order.
    by_name: HashMap<Nickname, Vec<Peer>>,

    /// Index for session → nickname lookups.
    names: HashMap<SessionId, Nickname>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `peer` under `name`, creating the entry if absent.
    ///
    /// If the session is already registered (under any name) it is moved,
    /// so a session can never be listed twice. Returns the name it was
    /// previously registered under, if any.
    pub fn register(&mut self, name: Nickname, peer: Peer) -> Option<Nickname> {
        let previous = self
            .unregister_session(peer.id())
            .map(|(old_name, _)| old_name);

        self.names.insert(peer.id(), name.clone());
        self.by_name.entry(name).or_default().push(peer);

        previous
    }

    /// Removes `session_id` from `name`'s list, dropping the entry once empty.
    ///
    /// A session that is not listed under `name` is a no-op and yields `None`.
    pub fn unregister(&mut self, name: &str, session_id: SessionId) -> Option<Peer> {
        let peers = self.by_name.get_mut(name)?;
        let position = peers.iter().position(|p| p.id() == session_id)?;
        let peer = peers.remove(position);

        if peers.is_empty() {
            self.by_name.remove(name);
        }
        self.names.remove(&session_id);

        Some(peer)
    }

    /// Removes a session wherever it is registered.
    pub fn unregister_session(&mut self, session_id: SessionId) -> Option<(Nickname, Peer)> {
        let name = self.names.get(&session_id)?.clone();
        let peer = self.unregister(name.as_str(), session_id)?;
        Some((name, peer))
    }

    /// Sessions currently using `name`, in registration order.
    ///
    /// Empty if nobody holds the name.
    pub fn lookup(&self, name: &str) -> &[Peer] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Point-in-time copy of every entry, sorted by name.
    pub fn snapshot_all(&self) -> Vec<(Nickname, Vec<Peer>)> {
        let mut entries: Vec<_> = self
            .by_name
            .iter()
            .map(|(name, peers)| (name.clone(), peers.clone()))
            .collect();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        entries
    }

    /// Iterates every registered session exactly once.
    pub fn peers(&self) -> impl Iterator<Item = &Peer> {
        self.by_name.values().flatten()
    }

    pub fn name_of(&self, session_id: SessionId) -> Option<&Nickname> {
        self.names.get(&session_id)
    }

    pub fn peer(&self, session_id: SessionId) -> Option<&Peer> {
        let name = self.names.get(&session_id)?;
        self.lookup(name.as_str())
            .iter()
            .find(|p| p.id() == session_id)
    }

    pub fn contains(&self, session_id: SessionId) -> bool {
        self.names.contains_key(&session_id)
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Number of distinct names in use.
    pub fn name_count(&self) -> usize {
        self.by_name.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn peer(id: u64) -> Peer {
        let (tx, _rx) = mpsc::channel(1);
        Peer::new(SessionId::new(id), tx)
    }

    fn nick(name: &str) -> Nickname {
        Nickname::new(name).unwrap()
    }

    fn ids(peers: &[Peer]) -> Vec<u64> {
        peers.iter().map(|p| p.id().get()).collect()
    }

    /// Checks every structural invariant of the registry.
    fn assert_consistent(registry: &NameRegistry) {
        let mut seen = std::collections::HashSet::new();
        for (name, peers) in &registry.by_name {
            assert!(!peers.is_empty(), "empty entry for {name}");
            for p in peers {
                assert!(seen.insert(p.id()), "{} listed twice", p.id());
                assert_eq!(registry.names.get(&p.id()), Some(name));
            }
        }
        assert_eq!(seen.len(), registry.names.len());
    }

    #[test]
    fn test_register_creates_entry() {
        let mut registry = NameRegistry::new();

        assert_eq!(registry.register(nick("alice"), peer(1)), None);

        assert_eq!(ids(registry.lookup("alice")), vec![1]);
        assert_eq!(registry.name_of(SessionId::new(1)), Some(&nick("alice")));
        assert_eq!(registry.len(), 1);
        assert_consistent(&registry);
    }

    #[test]
    fn test_duplicate_names_share_an_entry() {
        let mut registry = NameRegistry::new();
        registry.register(Nickname::anonymous(), peer(1));
        registry.register(Nickname::anonymous(), peer(2));

        assert_eq!(ids(registry.lookup("Anonymous")), vec![1, 2]);
        assert_eq!(registry.name_count(), 1);
        assert_eq!(registry.len(), 2);
        assert_consistent(&registry);
    }

    #[test]
    fn test_register_moves_existing_session() {
        let mut registry = NameRegistry::new();
        registry.register(Nickname::anonymous(), peer(1));

        let previous = registry.register(nick("alice"), peer(1));

        assert_eq!(previous, Some(Nickname::anonymous()));
        assert!(registry.lookup("Anonymous").is_empty());
        assert_eq!(ids(registry.lookup("alice")), vec![1]);
        assert_eq!(registry.name_count(), 1);
        assert_consistent(&registry);
    }

    #[test]
    fn test_unregister_removes_empty_entry() {
        let mut registry = NameRegistry::new();
        registry.register(nick("alice"), peer(1));

        let removed = registry.unregister("alice", SessionId::new(1));

        assert_eq!(removed.map(|p| p.id()), Some(SessionId::new(1)));
        assert!(registry.is_empty());
        assert_eq!(registry.name_count(), 0);
        assert_consistent(&registry);
    }

    #[test]
    fn test_unregister_keeps_other_holders() {
        let mut registry = NameRegistry::new();
        registry.register(nick("bob"), peer(1));
        registry.register(nick("bob"), peer(2));

        registry.unregister("bob", SessionId::new(1));

        assert_eq!(ids(registry.lookup("bob")), vec![2]);
        assert_consistent(&registry);
    }

    #[test]
    fn test_unregister_absent_is_noop() {
        let mut registry = NameRegistry::new();
        registry.register(nick("alice"), peer(1));

        assert!(registry.unregister("bob", SessionId::new(1)).is_none());
        assert!(registry.unregister("alice", SessionId::new(2)).is_none());
        assert!(registry.unregister_session(SessionId::new(9)).is_none());

        assert_eq!(registry.len(), 1);
        assert_consistent(&registry);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let mut registry = NameRegistry::new();
        registry.register(nick("Alice"), peer(1));

        assert!(registry.lookup("alice").is_empty());
        assert_eq!(registry.lookup("Alice").len(), 1);
    }

    #[test]
    fn test_snapshot_all_is_sorted_copy() {
        let mut registry = NameRegistry::new();
        registry.register(nick("carol"), peer(3));
        registry.register(nick("alice"), peer(1));
        registry.register(nick("alice"), peer(2));

        let snapshot = registry.snapshot_all();
        registry.unregister_session(SessionId::new(1));

        let names: Vec<_> = snapshot.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["alice", "carol"]);
        assert_eq!(snapshot[0].1.len(), 2, "snapshot unaffected by later changes");
    }

    #[test]
    fn test_peers_visits_each_session_once() {
        let mut registry = NameRegistry::new();
        registry.register(nick("a"), peer(1));
        registry.register(nick("a"), peer(2));
        registry.register(nick("b"), peer(3));

        let mut visited: Vec<u64> = registry.peers().map(|p| p.id().get()).collect();
        visited.sort_unstable();
        assert_eq!(visited, vec![1, 2, 3]);
    }

    #[test]
    fn test_invariants_hold_over_operation_sequence() {
        let mut registry = NameRegistry::new();
        let names = ["Anonymous", "alice", "bob", "carol"];

        // Deterministic pseudo-random walk over register/rename/unregister.
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        for _ in 0..2_000 {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;

            let id = state % 12;
            let name = names[(state >> 8) as usize % names.len()];
            match (state >> 16) % 3 {
                0 | 1 => {
                    registry.register(nick(name), peer(id));
                }
                _ => {
                    registry.unregister_session(SessionId::new(id));
                }
            }
            assert_consistent(&registry);
        }
    }

    #[test]
    fn test_peer_lookup_by_session() {
        let mut registry = NameRegistry::new();
        registry.register(nick("alice"), peer(1));

        assert!(registry.peer(SessionId::new(1)).is_some());
        assert!(registry.peer(SessionId::new(2)).is_none());
        assert!(registry.contains(SessionId::new(1)));
    }
}
