//! Client command parsing.
//!
//! One trimmed input line maps to exactly one [`Command`]. Prefixes are
//! checked in a fixed order (quit, nick, dm) and a keyword only matches as a
//! whole word, so `/nickname` or `/quitter` are ordinary chat text.
//! Unknown slash-commands are relayed as chat.

use chatty_core::{DomainError, Nickname};
use thiserror::Error;

const QUIT: &str = "/quit";
const NICK: &str = "/nick";
const DM: &str = "/dm";

/// A classified client input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Leave the chat. Anything after `/quit ` is ignored.
    Quit,

    /// Change display name. Only the first word after `/nick` is used.
    Rename(Nickname),

    /// Private message to every session currently using `target`.
    DirectMessage { target: Nickname, message: String },

    /// Ordinary chat line relayed to everyone else.
    Broadcast(String),

    /// Malformed command; the error text goes back to the sender only.
    Invalid(CommandError),
}

/// Usage errors reported to the sender of a malformed command.
///
/// The `Display` output is the exact line sent back over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Usage: /nick <name>")]
    NickUsage,

    #[error("Usage: /dm <nickname> <message>")]
    DirectMessageUsage,

    #[error("{0}")]
    InvalidNickname(DomainError),
}

impl Command {
    /// Classifies one line of client input.
    ///
    /// Surrounding whitespace is trimmed first. Returns `None` for a line that
    /// is empty after trimming, which callers ignore.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        if keyword_args(line, QUIT).is_some() {
            return Some(Self::Quit);
        }

        if let Some(args) = keyword_args(line, NICK) {
            return Some(parse_nick(args));
        }

        if let Some(args) = keyword_args(line, DM) {
            return Some(parse_dm(args));
        }

        Some(Self::Broadcast(line.to_string()))
    }

    /// Returns true for `/quit` lines. Used by the client to stop relaying input.
    #[must_use]
    pub fn is_quit(&self) -> bool {
        matches!(self, Self::Quit)
    }
}

/// Returns the argument text if `line` is `keyword` alone or `keyword`
/// followed by whitespace.
fn keyword_args<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    if rest.is_empty() {
        return Some(rest);
    }
    if rest.starts_with(char::is_whitespace) {
        return Some(rest.trim_start());
    }
    None
}

fn parse_nick(args: &str) -> Command {
    let Some(name) = args.split_whitespace().next() else {
        return Command::Invalid(CommandError::NickUsage);
    };

    match Nickname::new(name) {
        Ok(nick) => Command::Rename(nick),
        Err(e) => Command::Invalid(CommandError::InvalidNickname(e)),
    }
}

fn parse_dm(args: &str) -> Command {
    let Some((target, message)) = args.split_once(char::is_whitespace) else {
        return Command::Invalid(CommandError::DirectMessageUsage);
    };

    let message = message.trim_start();
    if message.is_empty() {
        return Command::Invalid(CommandError::DirectMessageUsage);
    }

    match Nickname::new(target) {
        Ok(target) => Command::DirectMessage {
            target,
            message: message.to_string(),
        },
        Err(e) => Command::Invalid(CommandError::InvalidNickname(e)),
    }
}
