//! Core types for the AquaLink device control system.
//!
//! This module defines the fundamental types shared across the system:
//! device identifiers, identity payloads, connection records, and status
//! tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Unique identifier for a device.
///
/// Assigned by the device itself and reported in its `/api/info` payload.
/// This is the registry key everywhere — never the IP address, which the
/// router may reassign at any time.
pub type DeviceId = String;

/// Identity payload returned by a device's `GET /api/info` endpoint.
///
/// Wire format is fixed for interoperability with deployed firmware; field
/// names on the wire are camelCase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Product name, e.g. "AquaLuminus-X". A candidate is only accepted
    /// when this contains the product marker (case-insensitive).
    pub device: String,

    /// Firmware version string
    pub version: String,

    /// IP address as the device sees it
    pub ip: String,

    /// Hardware MAC address
    pub mac: String,

    /// mDNS hostname, when the firmware has one configured
    #[serde(default)]
    pub hostname: Option<String>,

    /// Stable identifier assigned by the device
    #[serde(rename = "deviceId")]
    pub device_id: DeviceId,

    /// WiFi signal strength in dBm, reported by newer firmware only
    #[serde(default)]
    pub rssi: Option<i32>,
}

/// Connection status of a registered device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    /// Device is connected and responding
    Online,

    /// Device stopped responding to commands or status calls
    Offline,

    /// Connection attempt in progress
    Connecting,

    /// Device answered but with an error
    Error,
}

impl DeviceStatus {
    /// Returns a human-readable description
    pub fn description(&self) -> &str {
        match self {
            DeviceStatus::Online => "Connected and responding",
            DeviceStatus::Offline => "Not responding",
            DeviceStatus::Connecting => "Connection in progress",
            DeviceStatus::Error => "Responding with errors",
        }
    }

    /// Returns true if the device is usable for commands
    pub fn is_online(&self) -> bool {
        matches!(self, DeviceStatus::Online)
    }
}

/// A device registered in the connection registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedDevice {
    /// Stable identifier assigned by the device
    pub device_id: DeviceId,

    /// Product name as reported by the device
    pub name: String,

    /// Address the device was reached at
    pub ip: IpAddr,

    /// Hardware MAC address
    pub mac: String,

    /// Firmware version string
    pub firmware_version: String,

    /// mDNS hostname, if any
    pub hostname: Option<String>,

    /// Current connection status
    pub status: DeviceStatus,

    /// When this device was first registered
    pub connected_at: DateTime<Utc>,

    /// Last successful exchange with the device
    pub last_seen: DateTime<Utc>,
}

impl ConnectedDevice {
    /// Builds a registry entry from a confirmed identity probe.
    ///
    /// `ip` is the address the probe actually answered on, which is
    /// authoritative over whatever address the firmware reports about
    /// itself.
    pub fn from_identity(identity: &DeviceIdentity, ip: IpAddr) -> Self {
        let now = Utc::now();
        Self {
            device_id: identity.device_id.clone(),
            name: identity.device.clone(),
            ip,
            mac: identity.mac.clone(),
            firmware_version: identity.version.clone(),
            hostname: identity.hostname.clone(),
            status: DeviceStatus::Online,
            connected_at: now,
            last_seen: now,
        }
    }

    /// Updates the last seen timestamp
    pub fn mark_seen(&mut self) {
        self.last_seen = Utc::now();
        self.status = DeviceStatus::Online;
    }
}
