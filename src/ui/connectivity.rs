//! Network availability check used before user refreshes.

use crate::error::{NewsError, Result};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use url::Url;

/// Synchronous connectivity check.
pub trait ConnectivityProbe: Send + Sync {
    /// Whether the network looks reachable right now.
    fn has_connectivity(&self) -> bool;
}

/// Probe that resolves a host and opens a TCP connection to it.
///
/// Blocks the calling thread for up to the timeout per resolved address.
#[derive(Debug, Clone)]
pub struct SocketConnectivityProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl SocketConnectivityProbe {
    /// Probe `host:port` with a 3 second timeout.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        SocketConnectivityProbe {
            host: host.into(),
            port,
            timeout: Duration::from_secs(3),
        }
    }

    /// Probe the host serving `base_url`.
    pub fn for_base_url(base_url: &str) -> Result<Self> {
        let url = Url::parse(base_url)
            .map_err(|e| NewsError::Config(format!("invalid base URL {}: {}", base_url, e)))?;
        let host = url
            .host_str()
            .ok_or_else(|| NewsError::Config(format!("base URL has no host: {}", base_url)))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| NewsError::Config(format!("base URL has no port: {}", base_url)))?;
        Ok(Self::new(host, port))
    }

    /// Override the per-address timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl ConnectivityProbe for SocketConnectivityProbe {
    fn has_connectivity(&self) -> bool {
        let addrs = match (self.host.as_str(), self.port).to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(error) => {
                tracing::debug!(host = %self.host, %error, "connectivity probe: resolution failed");
                return false;
            }
        };
        addrs
            .into_iter()
            .any(|addr| TcpStream::connect_timeout(&addr, self.timeout).is_ok())
    }
}

/// Probe with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct StaticConnectivity(pub bool);

impl ConnectivityProbe for StaticConnectivity {
    fn has_connectivity(&self) -> bool {
        self.0
    }
}
