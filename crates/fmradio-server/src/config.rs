//! ServerBuilder -- fluent builder for constructing [`RadioServer`] instances.
//!
//! ```no_run
//! use std::time::Duration;
//! use fmradio_server::ServerBuilder;
//!
//! # async fn example() -> fmradio_core::Result<()> {
//! let server = ServerBuilder::new()
//!     .port(9502)
//!     .max_clients(4)
//!     .poll_timeout(Duration::from_millis(2))
//!     .bind()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use fmradio_core::{Error, Result};

use crate::server::RadioServer;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 9502;

/// Default number of simultaneously connected clients.
pub const DEFAULT_MAX_CLIENTS: usize = 10;

/// Default bound on one readiness wait of the server loop.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(1);

/// Resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on (default `0.0.0.0`).
    pub bind_addr: IpAddr,
    /// Port to listen on (default 9502). Port 0 picks a free port.
    pub port: u16,
    /// Connections beyond this many are closed on accept (default 10).
    pub max_clients: usize,
    /// Upper bound on how long one loop iteration waits for socket
    /// readiness before running the session tick.
    pub poll_timeout: Duration,
}

impl ServerConfig {
    /// The socket address the server listens on.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.max_clients == 0 {
            return Err(Error::InvalidParameter(
                "max_clients must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            max_clients: DEFAULT_MAX_CLIENTS,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

/// Fluent builder for [`RadioServer`].
#[derive(Debug, Clone, Default)]
pub struct ServerBuilder {
    config: ServerConfig,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the listening port (default: 9502).
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the listening address (default: all interfaces).
    pub fn bind_addr(mut self, addr: IpAddr) -> Self {
        self.config.bind_addr = addr;
        self
    }

    /// Set the maximum number of concurrent clients (default: 10).
    pub fn max_clients(mut self, n: usize) -> Self {
        self.config.max_clients = n;
        self
    }

    /// Set the readiness-wait bound of the server loop (default: 1ms).
    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.config.poll_timeout = timeout;
        self
    }

    /// The configuration assembled so far.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind the listening socket.
    pub async fn bind(self) -> Result<RadioServer> {
        RadioServer::bind(self.config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 9502);
        assert_eq!(config.max_clients, 10);
        assert_eq!(config.poll_timeout, Duration::from_millis(1));
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:9502");
    }

    #[test]
    fn builder_overrides() {
        let builder = ServerBuilder::new()
            .port(0)
            .bind_addr(IpAddr::V4(Ipv4Addr::LOCALHOST))
            .max_clients(2)
            .poll_timeout(Duration::from_millis(5));
        let config = builder.config();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:0");
        assert_eq!(config.max_clients, 2);
        assert_eq!(config.poll_timeout, Duration::from_millis(5));
    }

    #[test]
    fn zero_clients_rejected() {
        let config = ServerConfig {
            max_clients: 0,
            ..ServerConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidParameter(_))));
    }
}
