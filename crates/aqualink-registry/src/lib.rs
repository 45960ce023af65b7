//! # aqualink-registry
//!
//! The authoritative set of currently-connected devices and their HTTP
//! client bindings.
//!
//! The registry is the exclusive owner of all mutation to that set. Entries
//! are keyed by the device's own stable identifier — never by IP, which the
//! router may reassign at any time. The device map and the client-binding
//! map always mutate together inside one short lock scope, so concurrent
//! readers never observe a half-updated entry; the identity probe's network
//! I/O happens strictly before the lock is taken.

pub mod error;
pub mod registry;

pub use error::{ConnectError, Result};
pub use registry::ConnectionRegistry;
