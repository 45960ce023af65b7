//! Cascading device discovery for AquaLuminus units on the local network.
//!
//! No single discovery mechanism is trustworthy on an unmanaged home LAN, so
//! discovery runs as a tier cascade that stops at the first strategy to
//! produce results:
//!
//! 1. **Advertisement listening** — browse for the device's mDNS service
//!    type and collect resolved endpoints for a bounded polling window.
//! 2. **Subnet scan** — derive the local /24 and probe a prioritized,
//!    bounded set of host ranges, cheap reachability check first.
//! 3. **Fixed candidates** — probe a short list of conventional
//!    first-DHCP-lease addresses directly.
//!
//! All tiers feed one [`DiscoverySession`], which owns the deduplicated
//! endpoint set (keyed by IP), the Idle/Scanning/Stopped state machine, and
//! the watch-channel observables consumed by UI subscribers. Late listener
//! callbacks arriving after a session stops are discarded via an epoch
//! guard.
//!
//! The advertisement listener is abstracted behind [`AdvertSource`] so the
//! engine is portable and testable; [`MdnsAdvertSource`] is the production
//! implementation.

pub mod engine;
pub mod error;
pub mod mdns;
pub mod net;
mod scan;
pub mod session;
pub mod types;

pub use engine::DiscoveryEngine;
pub use error::{DiscoveryError, Result};
pub use mdns::{AdvertSource, MdnsAdvertSource};
pub use session::DiscoverySession;
pub use types::{AdvertEvent, DiscoveredEndpoint, DiscoveryPhase, SessionSnapshot};
