//! Error types for device HTTP access

use aqualink_core::DeviceId;
use std::net::SocketAddr;
use thiserror::Error;

/// Why a candidate failed the identity probe.
///
/// These are normal, frequent outcomes while scanning a subnet and are
/// consumed by the discovery cascade — they never propagate past it.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The request did not complete within the probe timeout
    #[error("probe of {addr} timed out")]
    Timeout { addr: SocketAddr },

    /// The candidate refused or dropped the connection
    #[error("could not reach {addr}: {reason}")]
    Unreachable { addr: SocketAddr, reason: String },

    /// The candidate answered, but not with an HTTP success status
    #[error("{addr} answered with HTTP {status}")]
    BadStatus { addr: SocketAddr, status: u16 },

    /// The response body was not a parseable identity payload
    #[error("identity payload from {addr} did not parse: {reason}")]
    InvalidPayload { addr: SocketAddr, reason: String },

    /// The candidate is a real HTTP server but not one of ours
    #[error("device '{device}' at {addr} does not match the product marker")]
    MarkerMismatch { addr: SocketAddr, device: String },
}

/// Errors from commands issued against a registered device.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A previously reachable device stopped responding
    #[error("device {device_id} stopped responding: {reason}")]
    ConnectionLost { device_id: DeviceId, reason: String },

    /// The device answered but rejected the command
    #[error("device {device_id} rejected the command: {message}")]
    Rejected { device_id: DeviceId, message: String },

    /// The device answered with a body that did not parse
    #[error("response from device {device_id} did not parse: {reason}")]
    InvalidResponse { device_id: DeviceId, reason: String },
}
