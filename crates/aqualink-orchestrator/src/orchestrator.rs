//! Connection orchestration over the discovery engine and registry.

use crate::error::OrchestrationError;
use aqualink_core::{ConnectedDevice, DiscoveryConfig, SETUP_MODE_ADDR};
use aqualink_discovery::{net, DiscoveredEndpoint, DiscoveryEngine, DiscoverySession, SessionSnapshot};
use aqualink_registry::ConnectionRegistry;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// High-level operations over the discovery/connection core.
///
/// One instance per composition root; collaborators are injected, never
/// fetched from global state.
pub struct ConnectionOrchestrator {
    config: DiscoveryConfig,
    engine: Arc<DiscoveryEngine>,
    session: Arc<DiscoverySession>,
    registry: Arc<ConnectionRegistry>,
}

impl ConnectionOrchestrator {
    pub fn new(
        config: DiscoveryConfig,
        engine: Arc<DiscoveryEngine>,
        session: Arc<DiscoverySession>,
        registry: Arc<ConnectionRegistry>,
    ) -> Self {
        Self {
            config,
            engine,
            session,
            registry,
        }
    }

    /// Runs the full discovery cascade and returns whatever it found.
    ///
    /// An empty list is a normal outcome here, not an error — callers that
    /// need a failure on empty use [`connect_after_setup`] or
    /// [`force_discovery`] instead.
    ///
    /// [`connect_after_setup`]: Self::connect_after_setup
    /// [`force_discovery`]: Self::force_discovery
    pub async fn discover(&self) -> Vec<DiscoveredEndpoint> {
        self.session.clear();
        self.engine.run_cascade().await
    }

    /// Post-setup flow: clear prior discovery state, run the full cascade,
    /// and connect everything that was found.
    pub async fn connect_after_setup(&self) -> Result<(), OrchestrationError> {
        info!("Connecting after device setup");
        self.session.clear();

        let endpoints = self.engine.run_cascade().await;
        if endpoints.is_empty() {
            return Err(self.classify_empty_result());
        }

        match self.registry.connect_all(&endpoints).await {
            Ok(ids) => {
                info!(connected = ids.len(), "Setup connection complete");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Discovered endpoints, but none connected");
                Err(OrchestrationError::NoDevicesFound)
            }
        }
    }

    /// Explicit re-discovery: restart advertisement listening for a bounded
    /// window, then connect whatever accumulated plus a fallback pass over
    /// the conventional candidate addresses.
    ///
    /// Unlike [`discover`], finding nothing here is an explicit
    /// `NoDevicesFound` failure.
    ///
    /// [`discover`]: Self::discover
    pub async fn force_discovery(&self) -> Result<(), OrchestrationError> {
        info!("Forcing device re-discovery");
        self.session.clear();

        if let Err(e) = self.engine.advert_session().await {
            warn!(error = %e, "Advertisement discovery could not start");
        }

        let mut connected = 0usize;

        let endpoints = self.session.endpoints();
        if !endpoints.is_empty() {
            if let Ok(ids) = self.registry.connect_all(&endpoints).await {
                connected += ids.len();
            }
        }

        // Fallback auto-connect pass over the conventional addresses
        for &ip in &self.config.fixed_candidates {
            if ip == SETUP_MODE_ADDR {
                continue;
            }
            match self.registry.connect(ip, self.config.device_port).await {
                Ok(device) => {
                    debug!(device_id = %device.device_id, %ip, "Fallback connect succeeded");
                    connected += 1;
                }
                Err(e) => debug!(%ip, error = %e, "Fallback candidate rejected"),
            }
            tokio::time::sleep(self.config.candidate_delay()).await;
        }

        if connected == 0 {
            return Err(OrchestrationError::NoDevicesFound);
        }
        info!(connected, "Forced discovery complete");
        Ok(())
    }

    /// Disconnects one device. Unknown ids are logged and ignored — there
    /// is nothing for a caller to recover from.
    pub fn disconnect(&self, device_id: &str) {
        if let Err(e) = self.registry.disconnect(device_id) {
            debug!(device_id, error = %e, "Disconnect ignored");
        }
    }

    /// Disconnects every registered device.
    pub fn disconnect_all_devices(&self) {
        self.registry.disconnect_all();
    }

    /// True when the host sits on a private network a device could share.
    ///
    /// Diagnostic only: used by callers to explain failures to the user,
    /// not part of the discovery protocol.
    pub fn is_on_same_network(&self) -> bool {
        net::on_private_network()
    }

    /// Best-effort name of the current network environment (the local
    /// hostname; a platform shell may substitute the SSID).
    pub fn current_network_name(&self) -> Option<String> {
        hostname::get()
            .ok()
            .map(|name| name.to_string_lossy().into_owned())
    }

    /// Observable discovered-endpoint list
    pub fn subscribe_discovered(&self) -> watch::Receiver<Vec<DiscoveredEndpoint>> {
        self.session.subscribe_discovered()
    }

    /// Observable "discovery in progress" flag
    pub fn subscribe_scanning(&self) -> watch::Receiver<bool> {
        self.session.subscribe_scanning()
    }

    /// Observable session snapshot (phase + human-readable status text)
    pub fn subscribe_session(&self) -> watch::Receiver<SessionSnapshot> {
        self.session.subscribe_snapshot()
    }

    /// Observable connected-device list
    pub fn subscribe_devices(&self) -> watch::Receiver<Vec<ConnectedDevice>> {
        self.registry.subscribe_devices()
    }

    /// Observable aggregate connection flag
    pub fn subscribe_connected(&self) -> watch::Receiver<bool> {
        self.registry.subscribe_connected()
    }

    /// Snapshot of currently connected devices
    pub fn connected_devices(&self) -> Vec<ConnectedDevice> {
        self.registry.devices()
    }

    fn classify_empty_result(&self) -> OrchestrationError {
        if net::local_ipv4().is_none() {
            OrchestrationError::Unreachable("no local network address".to_string())
        } else {
            OrchestrationError::NoDevicesFound
        }
    }
}
