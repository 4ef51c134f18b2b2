//! Error types for the chat client.
//!
//! All error types use `thiserror` for derive macros and provide clear,
//! user-friendly error messages.
//!
//! **Panic-Free Policy:** This module follows the project's panic-free guidelines.
//! No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, or `todo!()`.

use std::io;
use std::time::Duration;

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

// ============================================================================
// Client Error Type
// ============================================================================

/// Chat client errors.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The server could not be reached.
    ///
    /// Common causes: the server is not running, the port is wrong,
    /// or the hostname does not resolve.
    #[error("Error connecting to server {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The connection was not established in time.
    #[error("Timed out connecting to server {addr} after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    /// Reading input, writing output, or talking to the server failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The server sent a line that could not be decoded.
    #[error("Invalid line from server: {0}")]
    Codec(#[from] LinesCodecError),
}

/// Convenience type alias for Results with ClientError.
pub type Result<T> = std::result::Result<T, ClientError>;
