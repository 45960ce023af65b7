//! Connection registry implementation.

use crate::error::{ConnectError, Result};
use aqualink_client::{DeviceClient, IdentityProbe};
use aqualink_core::{
    ConnectedDevice, DeviceId, DeviceStatus, DiscoveryConfig, SETUP_MODE_ADDR,
};
use aqualink_discovery::DiscoveredEndpoint;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

/// Both maps live under one lock: removing a device must drop its client
/// binding in the same atomic step.
#[derive(Default)]
struct RegistryInner {
    devices: HashMap<DeviceId, ConnectedDevice>,
    clients: HashMap<DeviceId, DeviceClient>,
}

/// Owns the connected-device set and the per-device HTTP bindings.
pub struct ConnectionRegistry {
    probe: Arc<IdentityProbe>,
    command_timeout: Duration,
    inner: RwLock<RegistryInner>,
    devices_tx: watch::Sender<Vec<ConnectedDevice>>,
    connected_tx: watch::Sender<bool>,
}

impl ConnectionRegistry {
    pub fn new(probe: Arc<IdentityProbe>, config: &DiscoveryConfig) -> Self {
        let (devices_tx, _) = watch::channel(Vec::new());
        let (connected_tx, _) = watch::channel(false);

        Self {
            probe,
            command_timeout: config.command_timeout(),
            inner: RwLock::new(RegistryInner::default()),
            devices_tx,
            connected_tx,
        }
    }

    /// Probes `ip:port` and, on a confirmed identity, registers the device
    /// as `Online` together with its client binding.
    ///
    /// Upserts by `device_id`: a device re-discovered on a new address
    /// replaces its prior entry. On probe failure nothing is mutated.
    pub async fn connect(&self, ip: IpAddr, port: u16) -> Result<ConnectedDevice> {
        if ip == SETUP_MODE_ADDR {
            return Err(ConnectError::SetupModeAddress);
        }

        let identity = self.probe.probe(ip, port).await.map_err(|source| {
            ConnectError::ProbeRejected {
                addr: SocketAddr::new(ip, port),
                source,
            }
        })?;

        let device = ConnectedDevice::from_identity(&identity, ip);
        let client = DeviceClient::new(
            identity.device_id.clone(),
            ip,
            port,
            self.command_timeout,
        );

        {
            let mut inner = self.inner.write();
            inner.devices.insert(device.device_id.clone(), device.clone());
            inner.clients.insert(device.device_id.clone(), client);
        }
        self.publish();

        info!(
            device_id = %device.device_id,
            %ip,
            total_devices = self.device_count(),
            "Device connected"
        );
        Ok(device)
    }

    /// Attempts `connect` for every candidate, tolerating individual
    /// failures.
    ///
    /// Succeeds — possibly with partial coverage — when at least one
    /// candidate connects; fails only when none did.
    pub async fn connect_all(&self, candidates: &[DiscoveredEndpoint]) -> Result<Vec<DeviceId>> {
        let mut connected = Vec::new();

        for candidate in candidates {
            match self.connect(candidate.ip, candidate.port).await {
                Ok(device) => connected.push(device.device_id),
                Err(e) => debug!(ip = %candidate.ip, error = %e, "Candidate failed to connect"),
            }
        }

        if connected.is_empty() {
            return Err(ConnectError::NoCandidateConnected);
        }
        Ok(connected)
    }

    /// Removes the device entry and its client binding in one atomic step.
    pub fn disconnect(&self, device_id: &str) -> Result<()> {
        let removed = {
            let mut inner = self.inner.write();
            let device = inner.devices.remove(device_id);
            inner.clients.remove(device_id);
            device
        };

        if removed.is_none() {
            return Err(ConnectError::UnknownDevice {
                device_id: device_id.to_string(),
            });
        }

        self.publish();
        info!(
            device_id,
            remaining_devices = self.device_count(),
            "Device disconnected"
        );
        Ok(())
    }

    /// Clears both maps atomically.
    pub fn disconnect_all(&self) {
        {
            let mut inner = self.inner.write();
            inner.devices.clear();
            inner.clients.clear();
        }
        self.publish();
        info!("All devices disconnected");
    }

    /// Client binding for issuing commands, if the device is registered
    pub fn client(&self, device_id: &str) -> Option<DeviceClient> {
        self.inner.read().clients.get(device_id).cloned()
    }

    /// Registered device info, if any
    pub fn get(&self, device_id: &str) -> Option<ConnectedDevice> {
        self.inner.read().devices.get(device_id).cloned()
    }

    /// Snapshot of registered devices, ordered by id
    pub fn devices(&self) -> Vec<ConnectedDevice> {
        let inner = self.inner.read();
        let mut devices: Vec<_> = inner.devices.values().cloned().collect();
        devices.sort_by(|a, b| a.device_id.cmp(&b.device_id));
        devices
    }

    pub fn device_count(&self) -> usize {
        self.inner.read().devices.len()
    }

    /// True iff at least one device is registered
    pub fn is_connected(&self) -> bool {
        !self.inner.read().devices.is_empty()
    }

    /// Updates a device's status (e.g. when a command times out).
    ///
    /// `Online` also refreshes the last-seen timestamp. Returns false for
    /// an unregistered device.
    pub fn set_status(&self, device_id: &str, status: DeviceStatus) -> bool {
        let updated = {
            let mut inner = self.inner.write();
            match inner.devices.get_mut(device_id) {
                Some(device) => {
                    if status == DeviceStatus::Online {
                        device.mark_seen();
                    } else {
                        device.status = status;
                    }
                    true
                }
                None => false,
            }
        };

        if updated {
            self.publish();
        }
        updated
    }

    /// Observable connected-device list
    pub fn subscribe_devices(&self) -> watch::Receiver<Vec<ConnectedDevice>> {
        self.devices_tx.subscribe()
    }

    /// Observable aggregate connection flag
    pub fn subscribe_connected(&self) -> watch::Receiver<bool> {
        self.connected_tx.subscribe()
    }

    fn publish(&self) {
        let _ = self.devices_tx.send(self.devices());
        let _ = self.connected_tx.send(self.is_connected());
    }
}
