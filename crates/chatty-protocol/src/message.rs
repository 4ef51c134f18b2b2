//! Server-to-client lines.
//!
//! Every line the server writes is one `ServerLine`; its `Display` output is
//! the exact text sent, without the trailing newline.

use std::fmt;

use chatty_core::Nickname;

use crate::command::CommandError;

/// Last line sent to a client that quits.
pub const FAREWELL: &str = "Goodbyeee!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerLine {
    /// Relayed chat: `<name>: <message>`
    Chat { from: Nickname, text: String },

    /// Direct message: `[DM from <name>]: <message>`
    Direct { from: Nickname, text: String },

    /// `User <name> has joined the chat.`
    Joined(Nickname),

    /// `<name> has left the chat.`
    Left(Nickname),

    /// Rename confirmation sent to the renamed session only.
    Renamed(Nickname),

    /// Direct message target has no sessions.
    NotFound(Nickname),

    /// Malformed command, reported to its sender.
    Rejected(CommandError),

    /// Inbound line exceeded the configured limit and was discarded.
    LineTooLong { max: usize },

    /// Connection refused because the registry is at capacity.
    ServerFull { max: usize },

    Farewell,
}

impl fmt::Display for ServerLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chat { from, text } => write!(f, "{from}: {text}"),
            Self::Direct { from, text } => write!(f, "[DM from {from}]: {text}"),
            Self::Joined(name) => write!(f, "User {name} has joined the chat."),
            Self::Left(name) => write!(f, "{name} has left the chat."),
            Self::Renamed(name) => write!(f, "Your nickname is now {name}"),
            Self::NotFound(name) => write!(f, "User {name} not found."),
            Self::Rejected(err) => write!(f, "{err}"),
            Self::LineTooLong { max } => write!(f, "Message too long (max {max} bytes)."),
            Self::ServerFull { max } => write!(f, "Server is full (max {max} clients)."),
            Self::Farewell => f.write_str(FAREWELL),
        }
    }
}
