//! The discovery cascade: advertisement listening, subnet scan, fixed
//! candidates — in strict priority order, stopping at the first tier that
//! yields results.

use crate::error::{DiscoveryError, Result};
use crate::mdns::AdvertSource;
use crate::session::DiscoverySession;
use crate::types::{AdvertEvent, DiscoveredEndpoint};
use crate::{net, scan};
use aqualink_client::IdentityProbe;
use aqualink_core::DiscoveryConfig;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs the three-tier discovery cascade against one [`DiscoverySession`].
///
/// Collaborators are injected at construction; the engine owns no global
/// state and can be instantiated freely (one per composition root).
pub struct DiscoveryEngine {
    config: DiscoveryConfig,
    probe: Arc<IdentityProbe>,
    source: Arc<dyn AdvertSource>,
    session: Arc<DiscoverySession>,
}

impl DiscoveryEngine {
    pub fn new(
        config: DiscoveryConfig,
        probe: Arc<IdentityProbe>,
        source: Arc<dyn AdvertSource>,
        session: Arc<DiscoverySession>,
    ) -> Result<Self> {
        config.validate().map_err(DiscoveryError::InvalidConfig)?;

        Ok(Self {
            config,
            probe,
            source,
            session,
        })
    }

    pub fn session(&self) -> Arc<DiscoverySession> {
        Arc::clone(&self.session)
    }

    /// Runs the full cascade.
    ///
    /// Starting while a session is already scanning is a no-op that returns
    /// the endpoints accumulated so far. An empty result is a normal
    /// outcome, not an error; the session ends `Stopped` with the standard
    /// result-count message either way.
    pub async fn run_cascade(&self) -> Vec<DiscoveredEndpoint> {
        let Some(epoch) = self.session.begin() else {
            return self.session.endpoints();
        };

        // Tier 1: advertisement listening. A listener that cannot start is
        // an empty tier here, not a terminal failure — the active tiers
        // below don't need it.
        match self.advert_window(epoch).await {
            Ok(found) if found > 0 => {
                info!(found, "Devices found via advertisement");
                self.session.stop();
                return self.session.endpoints();
            }
            Ok(_) => debug!("No advertisements seen, falling back to subnet scan"),
            Err(e) => warn!(error = %e, "Advertisement listening unavailable, falling back"),
        }

        // Tier 2: subnet brute-force scan
        if self.session.count() == 0 {
            if let Some(local) = net::local_ipv4() {
                let found =
                    scan::scan_subnet(&self.probe, &self.session, epoch, &self.config, local).await;
                if found > 0 {
                    info!(found, "Devices found via subnet scan");
                }
            } else {
                debug!("No local IPv4 address, skipping subnet scan");
            }
        }

        // Tier 3: fixed candidate addresses
        if self.session.count() == 0 {
            let found =
                scan::probe_fixed_candidates(&self.probe, &self.session, epoch, &self.config).await;
            if found > 0 {
                info!(found, "Devices found via fixed candidates");
            }
        }

        self.session.stop();
        self.session.endpoints()
    }

    /// Runs advertisement listening as a standalone session (the explicit
    /// re-discovery path).
    ///
    /// Unlike the cascade, a listener that cannot start terminates the
    /// session here — there is no fallback tier in this mode. Returns the
    /// number of endpoints accumulated during the window.
    pub async fn advert_session(&self) -> Result<usize> {
        let Some(epoch) = self.session.begin() else {
            return Ok(self.session.count());
        };

        match self.advert_window(epoch).await {
            Ok(found) => {
                self.session.stop();
                Ok(found)
            }
            Err(e) => {
                self.session.stop_with_message("Discovery failed to start");
                Err(e)
            }
        }
    }

    /// One bounded advertisement-listening window.
    ///
    /// Starts the listener, pumps its events into the session, polls the
    /// accumulating result set at a fixed interval up to the configured
    /// attempt budget, then stops the listener regardless of outcome.
    async fn advert_window(&self, epoch: u64) -> Result<usize> {
        let events = self.source.start()?;

        let session = Arc::clone(&self.session);
        let pump = tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                match event {
                    AdvertEvent::Resolved(endpoint) => {
                        session.insert(epoch, endpoint);
                    }
                    AdvertEvent::Lost(name) => session.remove_by_name(epoch, &name),
                    AdvertEvent::Found(name) => {
                        debug!(service = %name, "Service found, awaiting resolution");
                    }
                }
            }
        });

        for _ in 0..self.config.max_poll_attempts {
            tokio::time::sleep(self.config.poll_interval()).await;
            if self.session.count() > 0 {
                break;
            }
        }

        self.source.stop();
        pump.abort();

        Ok(self.session.count())
    }
}
