//! Error types for the connection registry

use aqualink_client::ProbeError;
use aqualink_core::DeviceId;
use std::net::SocketAddr;
use thiserror::Error;

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, ConnectError>;

/// Errors that can occur while connecting or disconnecting devices
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The candidate did not pass the identity probe
    #[error("candidate {addr} failed the identity probe: {source}")]
    ProbeRejected {
        addr: SocketAddr,
        #[source]
        source: ProbeError,
    },

    /// The setup-mode address can never be connected
    #[error("the setup-mode address is excluded from connections")]
    SetupModeAddress,

    /// No candidate out of a batch could be connected
    #[error("no candidate could be connected")]
    NoCandidateConnected,

    /// The device is not registered
    #[error("device {device_id} is not registered")]
    UnknownDevice { device_id: DeviceId },
}
