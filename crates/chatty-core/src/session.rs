//! Session identity and display names.

use std::borrow::Borrow;
use std::fmt;

use crate::{DomainError, DomainResult};

// ============================================================================
// Type-Safe Identifiers
// ============================================================================

/// Unique identifier for one connected client.
///
/// Assigned by the listener from a monotonically increasing counter.
/// Identity is independent of the display name: two sessions may share a
/// nickname but never a `SessionId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

impl From<u64> for SessionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

// ============================================================================
// Nicknames
// ============================================================================

/// Name every session carries until it renames itself.
pub const DEFAULT_NICKNAME: &str = "Anonymous";

/// Display name chosen by a client.
///
/// Case-sensitive and non-unique. A valid nickname is a single
/// non-empty word: it contains no whitespace and no control characters,
/// which keeps every server line unambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Nickname(String);

impl Nickname {
    /// Validates and wraps a nickname.
    ///
    /// # Errors
    ///
    /// - `DomainError::EmptyNickname` if `name` is empty
    /// - `DomainError::InvalidNickname` if it contains whitespace or control characters
    pub fn new(name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(DomainError::EmptyNickname);
        }
        if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(DomainError::InvalidNickname { value: name });
        }
        Ok(Self(name))
    }

    /// The sentinel name given to freshly connected sessions.
    pub fn anonymous() -> Self {
        Self(DEFAULT_NICKNAME.to_string())
    }

    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.0 == DEFAULT_NICKNAME
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Nickname {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl fmt::Display for Nickname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Nickname {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Nickname {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Nickname {
    type Error = DomainError;

    fn try_from(s: &str) -> DomainResult<Self> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_display() {
        assert_eq!(SessionId::new(7).to_string(), "session-7");
        assert_eq!(SessionId::from(3).get(), 3);
    }

    #[test]
    fn test_session_id_ordering() {
        assert!(SessionId::new(1) < SessionId::new(2));
        assert_ne!(SessionId::new(1), SessionId::new(2));
    }

    #[test]
    fn test_default_nickname() {
        let nick = Nickname::default();
        assert_eq!(nick.as_str(), "Anonymous");
        assert!(nick.is_anonymous());
    }

    #[test]
    fn test_nickname_is_case_sensitive() {
        let lower = Nickname::new("alice").unwrap();
        let upper = Nickname::new("Alice").unwrap();
        assert_ne!(lower, upper);
        assert!(!lower.is_anonymous());
    }

    #[test]
    fn test_nickname_rejects_empty() {
        assert_eq!(Nickname::new(""), Err(DomainError::EmptyNickname));
    }

    #[test]
    fn test_nickname_rejects_whitespace_and_control() {
        assert!(matches!(
            Nickname::new("two words"),
            Err(DomainError::InvalidNickname { .. })
        ));
        assert!(matches!(
            Nickname::new("tab\there"),
            Err(DomainError::InvalidNickname { .. })
        ));
        assert!(matches!(
            Nickname::new("bell\u{7}"),
            Err(DomainError::InvalidNickname { .. })
        ));
    }

    #[test]
    fn test_nickname_allows_unicode_and_punctuation() {
        assert!(Nickname::new("zoë").is_ok());
        assert!(Nickname::new("[bot]-1").is_ok());
    }

    #[test]
    fn test_error_display() {
        let err = DomainError::InvalidNickname {
            value: "a b".to_string(),
        };
        assert!(err.to_string().contains("\"a b\""));
        assert_eq!(
            DomainError::EmptyNickname.to_string(),
            "Nickname must not be empty"
        );
    }
}
