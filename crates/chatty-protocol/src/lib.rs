//! chatty Protocol - Line protocol for chat clients
//!
//! This crate provides the two halves of the wire protocol:
//! - `command` - classification of one client input line into a [`Command`]
//! - `message` - the lines the server sends back, as a typed [`ServerLine`]
//!
//! Both halves are pure: no I/O, no shared state.

pub mod command;
pub mod message;

pub use command::{Command, CommandError};
pub use message::{ServerLine, FAREWELL};
