//! Client configuration.

use std::time::Duration;

/// Time allowed for the TCP connection to be established.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Time to keep printing server lines after `/quit` before giving up.
pub const DEFAULT_QUIT_GRACE: Duration = Duration::from_secs(2);

/// Settings for [`ChatClient`](crate::ChatClient).
///
/// # Example
///
/// ```rust
/// use chatty_client::ClientConfig;
///
/// let config = ClientConfig {
///     timestamps: true,
///     ..ClientConfig::new("localhost", 4000)
/// };
/// assert_eq!(config.address(), "localhost:4000");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server hostname or IP address.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// Connection establishment timeout.
    pub connect_timeout: Duration,

    /// Prefix each printed line with the local time (`HH:MM:SS`).
    pub timestamps: bool,

    /// How long to wait for the server to close after `/quit`.
    pub quit_grace: Duration,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            timestamps: false,
            quit_grace: DEFAULT_QUIT_GRACE,
        }
    }

    /// `host:port`, for connecting and for messages.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("example.org", 6000);
        assert_eq!(config.host, "example.org");
        assert_eq!(config.port, 6000);
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(config.quit_grace, DEFAULT_QUIT_GRACE);
        assert!(!config.timestamps);
    }

    #[test]
    fn test_address() {
        assert_eq!(ClientConfig::new("127.0.0.1", 80).address(), "127.0.0.1:80");
    }
}
