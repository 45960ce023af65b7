//! Types for discovered endpoints and discovery session state

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

/// A network endpoint believed to host a target device.
///
/// Candidates live only for the duration of one discovery session and are
/// deduplicated by IP — re-discovery of the same address keeps the most
/// recent name, port, and hostname.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredEndpoint {
    /// Instance or product name as advertised/probed
    pub name: String,

    /// Address the endpoint was seen at
    pub ip: IpAddr,

    /// HTTP port
    pub port: u16,

    /// mDNS hostname, when known
    pub hostname: Option<String>,
}

impl DiscoveredEndpoint {
    pub fn new(name: String, ip: IpAddr, port: u16, hostname: Option<String>) -> Self {
        Self {
            name,
            ip,
            port,
            hostname,
        }
    }

    /// Returns the socket address for probing/connecting
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

/// Event pushed by an advertisement listener.
#[derive(Debug, Clone)]
pub enum AdvertEvent {
    /// A service instance was seen but not yet resolved to an address
    Found(String),

    /// A service instance resolved to a concrete endpoint
    Resolved(DiscoveredEndpoint),

    /// A previously seen service instance disappeared
    Lost(String),
}

/// Phase of a discovery session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryPhase {
    /// No session active
    Idle,

    /// A session is accumulating endpoints
    Scanning,

    /// The session finished; results remain readable until cleared
    Stopped,
}

/// Observable snapshot of the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: DiscoveryPhase,
    pub status_message: String,
}

impl SessionSnapshot {
    pub fn idle() -> Self {
        Self {
            phase: DiscoveryPhase::Idle,
            status_message: String::new(),
        }
    }
}
