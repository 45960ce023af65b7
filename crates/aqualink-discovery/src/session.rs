//! Discovery session state: the deduplicated endpoint set, the
//! Idle/Scanning/Stopped machine, and the observables UI code subscribes to.

use crate::types::{DiscoveredEndpoint, DiscoveryPhase, SessionSnapshot};
use aqualink_core::SETUP_MODE_ADDR;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{debug, info};

/// Shared state of one discovery session.
///
/// There is exactly one writer role (the engine and its listener pump) but
/// many concurrent readers: UI observers and the orchestrator's poll loop.
/// The endpoint set is a concurrent map keyed by IP; every mutation
/// republishes the observable snapshot so subscribers always see the latest
/// value, never a replay of history.
///
/// Listener callbacks can arrive after the session that started them has
/// stopped. Each mutation carries the epoch captured when its listener
/// started; stopping or clearing the session bumps the epoch, so stale
/// callbacks are discarded on arrival instead of mutating a newer session.
pub struct DiscoverySession {
    endpoints: DashMap<IpAddr, DiscoveredEndpoint>,
    phase: Mutex<DiscoveryPhase>,
    epoch: AtomicU64,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    discovered_tx: watch::Sender<Vec<DiscoveredEndpoint>>,
    scanning_tx: watch::Sender<bool>,
}

impl DiscoverySession {
    pub fn new() -> Self {
        let (snapshot_tx, _) = watch::channel(SessionSnapshot::idle());
        let (discovered_tx, _) = watch::channel(Vec::new());
        let (scanning_tx, _) = watch::channel(false);

        Self {
            endpoints: DashMap::new(),
            phase: Mutex::new(DiscoveryPhase::Idle),
            epoch: AtomicU64::new(0),
            snapshot_tx,
            discovered_tx,
            scanning_tx,
        }
    }

    /// Starts a session.
    ///
    /// Returns the epoch mutations from this session must carry, or `None`
    /// if a session is already `Scanning` — starting twice is a no-op, with
    /// no listener duplication and no state reset.
    pub fn begin(&self) -> Option<u64> {
        let mut phase = self.phase.lock();
        if *phase == DiscoveryPhase::Scanning {
            debug!("Discovery session already scanning; start ignored");
            return None;
        }

        *phase = DiscoveryPhase::Scanning;
        self.endpoints.clear();
        drop(phase);

        self.publish_endpoints();
        let _ = self.scanning_tx.send(true);
        let _ = self.snapshot_tx.send(SessionSnapshot {
            phase: DiscoveryPhase::Scanning,
            status_message: "Scanning for devices...".to_string(),
        });

        info!("Discovery session started");
        Some(self.epoch.load(Ordering::SeqCst))
    }

    /// Epoch of the session currently accepting mutations
    pub fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Records a discovered endpoint.
    ///
    /// Deduplicates by IP, keeping the most recent name/port/hostname. The
    /// setup-mode address is never recorded, regardless of which strategy
    /// surfaced it. Returns false when the event was discarded.
    pub fn insert(&self, epoch: u64, endpoint: DiscoveredEndpoint) -> bool {
        if epoch != self.current_epoch() {
            debug!(ip = %endpoint.ip, "Stale discovery event ignored");
            return false;
        }

        if endpoint.ip == SETUP_MODE_ADDR {
            debug!("Setup-mode address excluded from discovery results");
            return false;
        }

        debug!(ip = %endpoint.ip, name = %endpoint.name, "Endpoint discovered");
        self.endpoints.insert(endpoint.ip, endpoint);
        self.publish_endpoints();
        true
    }

    /// Removes an endpoint by advertised instance name (lost-service events)
    pub fn remove_by_name(&self, epoch: u64, name: &str) {
        if epoch != self.current_epoch() {
            debug!(name, "Stale lost-service event ignored");
            return;
        }

        let ip = self
            .endpoints
            .iter()
            .find(|entry| entry.value().name == name)
            .map(|entry| *entry.key());

        if let Some(ip) = ip {
            self.endpoints.remove(&ip);
            self.publish_endpoints();
            debug!(name, %ip, "Endpoint lost");
        }
    }

    /// Ends the session with the standard result-count message.
    ///
    /// `Scanning -> Stopped`; bumps the epoch so in-flight callbacks from
    /// this session are discarded on arrival. No-op unless scanning.
    pub fn stop(&self) {
        let found = self.endpoints.len();
        let message = if found == 0 {
            "No devices found".to_string()
        } else {
            format!("{found} device(s) found")
        };
        self.stop_with_message(&message);
    }

    /// Ends the session with an explicit message (e.g. listener start failure)
    pub fn stop_with_message(&self, message: &str) {
        let mut phase = self.phase.lock();
        if *phase != DiscoveryPhase::Scanning {
            return;
        }

        *phase = DiscoveryPhase::Stopped;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        drop(phase);

        let _ = self.scanning_tx.send(false);
        let _ = self.snapshot_tx.send(SessionSnapshot {
            phase: DiscoveryPhase::Stopped,
            status_message: message.to_string(),
        });

        info!(found = self.endpoints.len(), message, "Discovery session stopped");
    }

    /// `Stopped -> Idle`: discards results and resets the status message.
    ///
    /// Also usable from `Scanning` as an abort (stops first).
    pub fn clear(&self) {
        self.stop();

        let mut phase = self.phase.lock();
        *phase = DiscoveryPhase::Idle;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.endpoints.clear();
        drop(phase);

        self.publish_endpoints();
        let _ = self.scanning_tx.send(false);
        let _ = self.snapshot_tx.send(SessionSnapshot::idle());
    }

    /// Current phase
    pub fn phase(&self) -> DiscoveryPhase {
        *self.phase.lock()
    }

    pub fn is_scanning(&self) -> bool {
        self.phase() == DiscoveryPhase::Scanning
    }

    /// Number of endpoints discovered so far
    pub fn count(&self) -> usize {
        self.endpoints.len()
    }

    /// Snapshot of the discovered endpoints, ordered by address for
    /// deterministic candidate iteration
    pub fn endpoints(&self) -> Vec<DiscoveredEndpoint> {
        let mut endpoints: Vec<_> = self
            .endpoints
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        endpoints.sort_by_key(|e| e.ip);
        endpoints
    }

    /// Observable session snapshot (phase + status text)
    pub fn subscribe_snapshot(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Observable discovered-endpoint list
    pub fn subscribe_discovered(&self) -> watch::Receiver<Vec<DiscoveredEndpoint>> {
        self.discovered_tx.subscribe()
    }

    /// Observable "a scan is running" flag
    pub fn subscribe_scanning(&self) -> watch::Receiver<bool> {
        self.scanning_tx.subscribe()
    }

    fn publish_endpoints(&self) {
        let _ = self.discovered_tx.send(self.endpoints());
    }
}

impl Default for DiscoverySession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn endpoint(ip: [u8; 4], name: &str, port: u16) -> DiscoveredEndpoint {
        DiscoveredEndpoint::new(
            name.to_string(),
            IpAddr::V4(Ipv4Addr::new(ip[0], ip[1], ip[2], ip[3])),
            port,
            None,
        )
    }

    #[test]
    fn test_dedup_keeps_latest() {
        let session = DiscoverySession::new();
        let epoch = session.begin().unwrap();

        assert!(session.insert(epoch, endpoint([192, 168, 1, 50], "old-name", 80)));
        assert!(session.insert(epoch, endpoint([192, 168, 1, 50], "new-name", 8080)));
        assert!(session.insert(epoch, endpoint([192, 168, 1, 51], "other", 80)));

        let endpoints = session.endpoints();
        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints[0].name, "new-name");
        assert_eq!(endpoints[0].port, 8080);
    }

    #[test]
    fn test_setup_mode_address_excluded() {
        let session = DiscoverySession::new();
        let epoch = session.begin().unwrap();

        assert!(!session.insert(epoch, endpoint([192, 168, 4, 1], "imposter", 80)));
        assert_eq!(session.count(), 0);
    }

    #[test]
    fn test_begin_is_idempotent_while_scanning() {
        let session = DiscoverySession::new();
        let epoch = session.begin().unwrap();
        session.insert(epoch, endpoint([192, 168, 1, 50], "a", 80));

        // Second start: no-op, no state reset
        assert!(session.begin().is_none());
        assert_eq!(session.count(), 1);
        assert!(session.is_scanning());
    }

    #[test]
    fn test_stale_events_discarded_after_stop() {
        let session = DiscoverySession::new();
        let epoch = session.begin().unwrap();
        session.insert(epoch, endpoint([192, 168, 1, 50], "a", 80));
        session.stop();

        // A resolve callback that was in flight when the session stopped
        assert!(!session.insert(epoch, endpoint([192, 168, 1, 60], "late", 80)));
        assert_eq!(session.count(), 1);
        assert_eq!(session.phase(), DiscoveryPhase::Stopped);
    }

    #[test]
    fn test_status_message_at_stop() {
        let session = DiscoverySession::new();
        let epoch = session.begin().unwrap();
        session.insert(epoch, endpoint([192, 168, 1, 50], "a", 80));
        session.insert(epoch, endpoint([192, 168, 1, 51], "b", 80));
        session.stop();

        let snapshot = session.subscribe_snapshot().borrow().clone();
        assert_eq!(snapshot.phase, DiscoveryPhase::Stopped);
        assert_eq!(snapshot.status_message, "2 device(s) found");

        let empty = DiscoverySession::new();
        empty.begin().unwrap();
        empty.stop();
        let snapshot = empty.subscribe_snapshot().borrow().clone();
        assert_eq!(snapshot.status_message, "No devices found");
    }

    #[test]
    fn test_clear_returns_to_idle() {
        let session = DiscoverySession::new();
        let epoch = session.begin().unwrap();
        session.insert(epoch, endpoint([192, 168, 1, 50], "a", 80));
        session.stop();
        session.clear();

        assert_eq!(session.phase(), DiscoveryPhase::Idle);
        assert_eq!(session.count(), 0);
        assert_eq!(
            session.subscribe_snapshot().borrow().clone(),
            SessionSnapshot::idle()
        );

        // A fresh session starts cleanly afterwards
        assert!(session.begin().is_some());
    }

    #[test]
    fn test_lost_service_removed_by_name() {
        let session = DiscoverySession::new();
        let epoch = session.begin().unwrap();
        session.insert(epoch, endpoint([192, 168, 1, 50], "aqua-1", 80));
        session.insert(epoch, endpoint([192, 168, 1, 51], "aqua-2", 80));

        session.remove_by_name(epoch, "aqua-1");
        let endpoints = session.endpoints();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].name, "aqua-2");
    }

    #[test]
    fn test_watch_subscribers_see_latest() {
        let session = DiscoverySession::new();
        let scanning = session.subscribe_scanning();
        let discovered = session.subscribe_discovered();

        let epoch = session.begin().unwrap();
        assert!(*scanning.borrow());

        session.insert(epoch, endpoint([192, 168, 1, 50], "a", 80));
        assert_eq!(discovered.borrow().len(), 1);

        session.stop();
        assert!(!*scanning.borrow());
    }
}
