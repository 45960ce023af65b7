//! # AquaLink Core
//!
//! Core types, configuration, and well-known constants for the AquaLink
//! device control system.
//!
//! This crate provides the foundational building blocks shared by the
//! discovery, client, and registry crates:
//!
//! - **Types**: `DeviceId`, `DeviceStatus`, `ConnectedDevice`, and
//!   `DeviceIdentity` (the parsed `/api/info` payload).
//! - **Configuration**: `DiscoveryConfig` with serde-backed defaults for
//!   every tunable (timeouts, scan ranges, poll budgets, fallback
//!   candidates), loadable from YAML.
//! - **Constants**: the product marker used for identity matching, the
//!   device's setup-mode soft-AP address (excluded from every candidate
//!   set), and the advertised mDNS service type.
//!
//! ## Example
//!
//! ```
//! use aqualink_core::config::DiscoveryConfig;
//!
//! let config = DiscoveryConfig::default();
//! assert!(config.validate().is_ok());
//! ```

pub mod config;
pub mod types;

// Re-export commonly used types for convenience
pub use config::{DiscoveryConfig, HostRange, DEVICE_SERVICE_TYPE, PRODUCT_MARKER, SETUP_MODE_ADDR};
pub use types::{ConnectedDevice, DeviceId, DeviceIdentity, DeviceStatus};
