//! chatty Core - Shared types for the chat relay
//!
//! This crate provides the domain value types shared between
//! the server (chattyd), the line protocol, and the client.
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod error;
pub mod session;

// Re-exports for convenience
pub use error::{DomainError, DomainResult};
pub use session::{Nickname, SessionId, DEFAULT_NICKNAME};
