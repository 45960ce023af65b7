//! # aqualink-client
//!
//! HTTP access to AquaLuminus devices: the identity probe used during
//! discovery, and the per-device command binding stored in the connection
//! registry.
//!
//! Devices expose a small fixed HTTP surface:
//!
//! | Method | Path          | Purpose                          |
//! |--------|---------------|----------------------------------|
//! | GET    | `/api/info`   | Identity (product, id, mac, ...) |
//! | GET    | `/api/status` | Current light state              |
//! | POST   | `/api/on`     | Turn the UV light on             |
//! | POST   | `/api/off`    | Turn the UV light off            |
//! | POST   | `/api/toggle` | Toggle the UV light              |
//!
//! The probe treats every failure (timeout, refused connection, wrong
//! payload, marker mismatch) as an ordinary negative result — during a
//! subnet scan most candidates are expected to fail.

pub mod device;
pub mod error;
pub mod probe;

pub use device::{DeviceClient, StatusResponse};
pub use error::{CommandError, ProbeError};
pub use probe::IdentityProbe;
