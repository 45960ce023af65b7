//! # aqualink-orchestrator
//!
//! The public-facing API of the discovery/connection core: composes the
//! discovery engine, identity probe, and connection registry into the
//! high-level operations a client shell calls, and exposes the observable
//! state collaborators subscribe to.
//!
//! All collaborators are injected at construction time by a composition
//! root — there are no process-wide singletons. Low-level network faults
//! never cross this boundary: callers see either `NoDevicesFound` or
//! `Unreachable`, plus the human-readable session status text.

pub mod error;
pub mod orchestrator;

pub use error::OrchestrationError;
pub use orchestrator::ConnectionOrchestrator;
