//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::server::error::Error;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The address to bind to.
    pub addr: SocketAddr,
    /// The maximum number of concurrent connections.
    pub max_connections: usize,
    /// Size of each read from the socket.
    pub read_buffer_size: usize,
    /// Largest request (head plus body) that will be buffered.
    pub max_request_size: usize,
    /// How long shutdown waits for in-flight connections.
    pub shutdown_timeout: Duration,
}

impl ServerConfig {
    /// Default configuration listening on `addr`, e.g. `"0.0.0.0:9999"` or
    /// `":9999"` for every interface.
    pub fn with_addr(addr: &str) -> Result<Self, Error> {
        let addr = match addr.strip_prefix(':') {
            Some(port) => port
                .parse::<u16>()
                .map(|port| SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
                .map_err(|_| Error::InvalidAddress(addr.to_string()))?,
            None => addr
                .parse()
                .map_err(|_| Error::InvalidAddress(addr.to_string()))?,
        };
        Ok(Self { addr, ..Self::default() })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            max_connections: 1024,
            read_buffer_size: 8192,
            max_request_size: 1024 * 1024,
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}
