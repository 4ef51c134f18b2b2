//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::registry::MAX_SESSIONS;

/// Longest accepted inbound line, in bytes, excluding the newline.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 4096;

/// Lines buffered per client before further lines to it are dropped.
pub const DEFAULT_OUTBOX_CAPACITY: usize = 256;

/// Time allowed for a single line to reach the client's socket.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Time allowed to drain a client's outbox when its session ends.
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Runtime settings for [`ChatServer`](crate::server::ChatServer).
///
/// # Example
///
/// ```rust
/// use chattyd::config::ServerConfig;
///
/// let config = ServerConfig {
///     max_clients: 10,
///     ..ServerConfig::with_port(4000)
/// };
/// assert_eq!(config.bind_addr.port(), 4000);
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the listener binds to.
    pub bind_addr: SocketAddr,

    /// Maximum number of concurrently registered clients.
    pub max_clients: usize,

    /// Longest accepted inbound line, in bytes.
    pub max_line_length: usize,

    /// Per-client outbound queue length.
    pub outbox_capacity: usize,

    /// Per-line socket write timeout.
    pub write_timeout: Duration,

    /// Outbox drain allowance at teardown.
    pub flush_timeout: Duration,
}

impl ServerConfig {
    /// Default settings listening on `bind_addr`.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            max_clients: MAX_SESSIONS,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
        }
    }

    /// Default settings listening on every IPv4 interface at `port`.
    pub fn with_port(port: u16) -> Self {
        Self::new(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
    }
}
