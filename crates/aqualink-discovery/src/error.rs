//! Error types for the discovery engine

use thiserror::Error;

/// Result type alias for discovery operations
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Errors that can occur while running discovery
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// mDNS daemon failed to initialize
    #[error("failed to initialize mDNS daemon: {0}")]
    MdnsInitFailed(String),

    /// The advertisement listener could not be registered
    #[error("failed to start listening for '{service_type}': {reason}")]
    StartFailed {
        service_type: String,
        reason: String,
    },

    /// The advertisement listener is already running
    #[error("advertisement listener is already running")]
    AlreadyStarted,

    /// Invalid discovery configuration
    #[error("invalid discovery configuration: {0}")]
    InvalidConfig(String),

    /// Internal error
    #[error("internal discovery error: {0}")]
    Internal(String),
}
