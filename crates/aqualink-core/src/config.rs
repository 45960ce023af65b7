//! Configuration for device discovery and connection.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Marker that must appear (case-insensitive) in the `device` field of an
/// identity payload for a candidate to be accepted.
pub const PRODUCT_MARKER: &str = "AquaLuminus";

/// Address a factory-fresh unit uses while acting as its own access point.
///
/// Unconditionally excluded from every discovered and connected set: a
/// device answering here is in setup mode, not on the home network.
pub const SETUP_MODE_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 4, 1));

/// mDNS service type advertised by configured devices.
pub const DEVICE_SERVICE_TYPE: &str = "_aqualuminus._tcp.local.";

/// An inclusive range of host octets within the local /24.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRange {
    pub start: u8,
    pub end: u8,
}

impl HostRange {
    pub fn new(start: u8, end: u8) -> Self {
        Self { start, end }
    }

    /// Number of addresses covered
    pub fn len(&self) -> usize {
        (self.end as usize).saturating_sub(self.start as usize) + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

/// Configuration for the discovery cascade and device connections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// mDNS service type to browse for
    #[serde(default = "default_service_type")]
    pub service_type: String,

    /// Product marker matched against the identity payload
    #[serde(default = "default_marker")]
    pub marker: String,

    /// HTTP port devices listen on
    #[serde(default = "default_device_port")]
    pub device_port: u16,

    /// Interval between polls of the accumulating advertisement results (ms)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Number of polls before the advertisement listener is stopped
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    /// Identity probe timeout (ms)
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,

    /// Timeout for commands against a registered device (ms)
    #[serde(default = "default_command_timeout")]
    pub command_timeout_ms: u64,

    /// Fast reachability pre-check timeout during subnet scanning (ms)
    #[serde(default = "default_reach_timeout")]
    pub reach_timeout_ms: u64,

    /// Delay between consecutive scan candidates (ms), to avoid flooding
    /// the network
    #[serde(default = "default_candidate_delay")]
    pub candidate_delay_ms: u64,

    /// Host ranges scanned within the local /24, in priority order.
    /// Deliberately not the full subnet to bound scan cost.
    #[serde(default = "default_subnet_ranges")]
    pub subnet_ranges: Vec<HostRange>,

    /// Conventional first-DHCP-lease addresses tried as a last resort
    #[serde(default = "default_fixed_candidates")]
    pub fixed_candidates: Vec<IpAddr>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            service_type: default_service_type(),
            marker: default_marker(),
            device_port: default_device_port(),
            poll_interval_ms: default_poll_interval(),
            max_poll_attempts: default_max_poll_attempts(),
            probe_timeout_ms: default_probe_timeout(),
            command_timeout_ms: default_command_timeout(),
            reach_timeout_ms: default_reach_timeout(),
            candidate_delay_ms: default_candidate_delay(),
            subnet_ranges: default_subnet_ranges(),
            fixed_candidates: default_fixed_candidates(),
        }
    }
}

impl DiscoveryConfig {
    /// Returns the poll interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Returns the identity probe timeout as a Duration
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Returns the device command timeout as a Duration
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// Returns the reachability pre-check timeout as a Duration
    pub fn reach_timeout(&self) -> Duration {
        Duration::from_millis(self.reach_timeout_ms)
    }

    /// Returns the inter-candidate delay as a Duration
    pub fn candidate_delay(&self) -> Duration {
        Duration::from_millis(self.candidate_delay_ms)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.device_port == 0 {
            return Err("device_port cannot be 0".to_string());
        }

        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms cannot be 0".to_string());
        }

        if self.max_poll_attempts == 0 {
            return Err("max_poll_attempts cannot be 0".to_string());
        }

        if self.probe_timeout_ms == 0 {
            return Err("probe_timeout_ms cannot be 0".to_string());
        }

        if self.marker.trim().is_empty() {
            return Err("marker cannot be empty".to_string());
        }

        if self.service_type.is_empty() {
            return Err("service_type cannot be empty".to_string());
        }

        for range in &self.subnet_ranges {
            if range.is_empty() {
                return Err(format!(
                    "subnet range {}-{} is inverted",
                    range.start, range.end
                ));
            }
        }

        Ok(())
    }
}

// Default configuration values

fn default_service_type() -> String {
    DEVICE_SERVICE_TYPE.to_string()
}

fn default_marker() -> String {
    PRODUCT_MARKER.to_string()
}

fn default_device_port() -> u16 {
    80
}

fn default_poll_interval() -> u64 {
    1000 // Poll advertisement results once a second
}

fn default_max_poll_attempts() -> u32 {
    10
}

fn default_probe_timeout() -> u64 {
    2000
}

fn default_command_timeout() -> u64 {
    5000
}

fn default_reach_timeout() -> u64 {
    500
}

fn default_candidate_delay() -> u64 {
    30
}

fn default_subnet_ranges() -> Vec<HostRange> {
    vec![
        // Routers commonly hand IoT gear leases in the low 100s
        HostRange::new(100, 130),
        HostRange::new(2, 40),
        HostRange::new(200, 254),
    ]
}

fn default_fixed_candidates() -> Vec<IpAddr> {
    vec![
        IpAddr::V4(Ipv4Addr::new(192, 168, 1, 100)),
        IpAddr::V4(Ipv4Addr::new(192, 168, 0, 100)),
        IpAddr::V4(Ipv4Addr::new(192, 168, 1, 2)),
        IpAddr::V4(Ipv4Addr::new(192, 168, 0, 2)),
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)),
    ]
}
