//! Bounded identity probe against a candidate address.

use crate::error::ProbeError;
use aqualink_core::{DeviceIdentity, DiscoveryConfig};
use reqwest::Client;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing::{debug, trace};

/// Confirms that a candidate address hosts a genuine device and extracts
/// its identity.
///
/// One probe is one bounded `GET /api/info`. Acceptance requires an HTTP
/// success status, a parseable identity payload, and a product name that
/// contains the configured marker, case-insensitively.
#[derive(Debug, Clone)]
pub struct IdentityProbe {
    http: Client,
    timeout: Duration,
    marker_lower: String,
}

impl IdentityProbe {
    pub fn new(config: &DiscoveryConfig) -> Self {
        Self {
            http: Client::new(),
            timeout: config.probe_timeout(),
            marker_lower: config.marker.to_lowercase(),
        }
    }

    /// Probes `ip:port` once.
    ///
    /// Never blocks longer than the configured probe timeout.
    pub async fn probe(&self, ip: IpAddr, port: u16) -> Result<DeviceIdentity, ProbeError> {
        let addr = SocketAddr::new(ip, port);
        let url = format!("http://{addr}/api/info");
        trace!(%addr, "Probing candidate");

        let response = self
            .http
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| classify_request_error(addr, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::BadStatus {
                addr,
                status: status.as_u16(),
            });
        }

        let identity: DeviceIdentity =
            response
                .json()
                .await
                .map_err(|e| ProbeError::InvalidPayload {
                    addr,
                    reason: e.to_string(),
                })?;

        if !identity.device.to_lowercase().contains(&self.marker_lower) {
            return Err(ProbeError::MarkerMismatch {
                addr,
                device: identity.device,
            });
        }

        debug!(
            %addr,
            device_id = %identity.device_id,
            device = %identity.device,
            "Identity confirmed"
        );
        Ok(identity)
    }
}

fn classify_request_error(addr: SocketAddr, error: &reqwest::Error) -> ProbeError {
    if error.is_timeout() {
        ProbeError::Timeout { addr }
    } else {
        ProbeError::Unreachable {
            addr,
            reason: error.to_string(),
        }
    }
}
