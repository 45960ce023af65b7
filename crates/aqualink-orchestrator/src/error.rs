//! Error types crossing the orchestrator boundary

use thiserror::Error;

/// The only error kinds callers of the orchestrator ever see.
///
/// Everything lower-level (probe failures, refused connections, malformed
/// payloads) is consumed by the cascade and surfaces, at most, as one of
/// these plus the session's status text.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// Every strategy and candidate was exhausted without a connection
    #[error("no devices found")]
    NoDevicesFound,

    /// Environment-level failure, e.g. the host has no network
    #[error("network unreachable: {0}")]
    Unreachable(String),
}
