use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// One comma-separated segment of a target, before host lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointToken {
    host: String,
    port: u16,
}

impl EndpointToken {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Hostname or IP literal, without brackets.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The endpoint itself when the host is an IP literal, which needs no
    /// lookup.
    pub fn literal(&self) -> Option<ResolvedEndpoint> {
        let ip = self.host.parse::<IpAddr>().ok()?;
        Some(ResolvedEndpoint::new(ip, self.port))
    }
}

/// A literal address a transport can connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedEndpoint {
    ip: IpAddr,
    port: u16,
}

impl ResolvedEndpoint {
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self { ip, port }
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl From<SocketAddr> for ResolvedEndpoint {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip(), addr.port())
    }
}

impl From<ResolvedEndpoint> for SocketAddr {
    fn from(endpoint: ResolvedEndpoint) -> Self {
        endpoint.socket_addr()
    }
}

impl fmt::Display for ResolvedEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.socket_addr(), f)
    }
}
