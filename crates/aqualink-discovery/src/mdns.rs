//! Advertisement listening: the abstract event source and its mDNS
//! implementation.

use crate::error::{DiscoveryError, Result};
use crate::types::{AdvertEvent, DiscoveredEndpoint};
use async_channel::Receiver;
use mdns_sd::{ServiceDaemon, ServiceEvent as MdnsEvent, ServiceInfo};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Buffer for converted advertisement events
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A source of service-advertisement events.
///
/// Deliberately decoupled from any concrete discovery protocol so the
/// engine stays portable and tier-1 behavior is testable without multicast
/// traffic. Events arrive on a concurrency context independent of the
/// caller that started the listener.
pub trait AdvertSource: Send + Sync {
    /// Registers the listener and returns the event stream.
    ///
    /// Must be called from within an async runtime. Fails if the listener
    /// is already running or could not be registered.
    fn start(&self) -> Result<Receiver<AdvertEvent>>;

    /// Unregisters the listener. Idempotent. After this returns, the event
    /// stream closes; events already in flight are the session's epoch
    /// guard's problem, not the source's.
    fn stop(&self);
}

/// mDNS-backed advertisement source browsing for the device service type.
pub struct MdnsAdvertSource {
    service_type: String,
    daemon: ServiceDaemon,
    running: Arc<AtomicBool>,
}

impl MdnsAdvertSource {
    pub fn new(service_type: &str) -> Result<Self> {
        let daemon = ServiceDaemon::new().map_err(|e| {
            DiscoveryError::MdnsInitFailed(format!("failed to create mDNS daemon: {e}"))
        })?;

        Ok(Self {
            service_type: service_type.to_string(),
            daemon,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Converts a resolved mDNS service into a candidate endpoint.
    ///
    /// Returns `None` when the announcement carried no usable address.
    fn convert_service_info(info: &ServiceInfo) -> Option<DiscoveredEndpoint> {
        // Prefer IPv4; devices announce dual-stack but serve HTTP on v4
        let ip = info
            .get_addresses()
            .iter()
            .find(|addr| addr.is_ipv4())
            .or_else(|| info.get_addresses().iter().next())
            .copied()?;

        let hostname = info.get_hostname().trim_end_matches('.');
        let hostname = (!hostname.is_empty()).then(|| hostname.to_string());

        Some(DiscoveredEndpoint::new(
            info.get_fullname().to_string(),
            ip,
            info.get_port(),
            hostname,
        ))
    }
}

impl AdvertSource for MdnsAdvertSource {
    fn start(&self) -> Result<Receiver<AdvertEvent>> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(DiscoveryError::AlreadyStarted);
        }

        let browse_rx = self.daemon.browse(&self.service_type).map_err(|e| {
            self.running.store(false, Ordering::SeqCst);
            DiscoveryError::StartFailed {
                service_type: self.service_type.clone(),
                reason: e.to_string(),
            }
        })?;

        let (event_tx, event_rx) = async_channel::bounded(EVENT_CHANNEL_CAPACITY);
        let running = Arc::clone(&self.running);
        let service_type = self.service_type.clone();

        tokio::spawn(async move {
            while running.load(Ordering::SeqCst) {
                let event = match browse_rx.recv_async().await {
                    Ok(event) => event,
                    Err(_) => break, // browse stopped, channel closed
                };

                let converted = match event {
                    MdnsEvent::ServiceResolved(info) => {
                        debug!(
                            service = info.get_fullname(),
                            hostname = info.get_hostname(),
                            port = info.get_port(),
                            "Service resolved"
                        );
                        Self::convert_service_info(&info).map(AdvertEvent::Resolved)
                    }
                    MdnsEvent::ServiceFound(_, fullname) => Some(AdvertEvent::Found(fullname)),
                    MdnsEvent::ServiceRemoved(_, fullname) => Some(AdvertEvent::Lost(fullname)),
                    MdnsEvent::SearchStarted(ty) => {
                        debug!(ty, "Search started");
                        None
                    }
                    _ => None,
                };

                if let Some(event) = converted {
                    if event_tx.send(event).await.is_err() {
                        break; // nobody listening anymore
                    }
                }
            }
            debug!(service_type, "Advertisement listener task stopped");
        });

        Ok(event_rx)
    }

    fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        if let Err(e) = self.daemon.stop_browse(&self.service_type) {
            warn!(error = %e, "Failed to stop mDNS browse");
        }
    }
}

impl Drop for MdnsAdvertSource {
    fn drop(&mut self) {
        if self.running.load(Ordering::SeqCst) {
            warn!("Advertisement source dropped while still running");
        }
        let _ = self.daemon.shutdown();
    }
}
