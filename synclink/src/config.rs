//! Session configuration.

use std::time::Duration;

/// Default time allowed for the TCP handshake.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings shared by [`Session::connect`] and [`Session::accept`].
///
/// [`Session::connect`]: crate::Session::connect
/// [`Session::accept`]: crate::Session::accept
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Human-readable name of the remote process, used in every error.
    pub peer: String,
    /// Time allowed for the TCP handshake when connecting.
    pub connect_timeout: Duration,
    /// Disable Nagle's algorithm. Messages are small and flushed one at a
    /// time, so this is on by default.
    pub nodelay: bool,
}

impl SessionConfig {
    /// Creates a configuration for talking to `peer`.
    pub fn new(peer: impl Into<String>) -> Self {
        Self {
            peer: peer.into(),
            ..Self::default()
        }
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Enables or disables `TCP_NODELAY`.
    #[must_use]
    pub const fn nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            peer: "peer".to_owned(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            nodelay: true,
        }
    }
}
