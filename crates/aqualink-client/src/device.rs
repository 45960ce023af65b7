//! Per-device HTTP command binding.

use crate::error::CommandError;
use aqualink_core::DeviceId;
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing::debug;

/// Light state reported by `/api/status` and returned by every command.
///
/// Wire shape is fixed for interoperability with deployed firmware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub success: bool,

    #[serde(rename = "uvLightOn")]
    pub uv_light_on: bool,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    /// Device-side milliseconds since boot or epoch, firmware-dependent
    pub timestamp: u64,

    #[serde(default)]
    pub device: Option<String>,
}

/// Transport handle for issuing commands to one registered device.
///
/// Stored in the connection registry keyed by `DeviceId`; collaborators
/// fetch it via the registry rather than holding addresses themselves.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    device_id: DeviceId,
    base_url: String,
    http: Client,
    timeout: Duration,
}

impl DeviceClient {
    pub fn new(device_id: DeviceId, ip: IpAddr, port: u16, timeout: Duration) -> Self {
        let addr = SocketAddr::new(ip, port);
        Self {
            device_id,
            base_url: format!("http://{addr}"),
            http: Client::new(),
            timeout,
        }
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Reads the current light state
    pub async fn status(&self) -> Result<StatusResponse, CommandError> {
        self.execute(Method::GET, "/api/status").await
    }

    /// Turns the UV light on
    pub async fn turn_on(&self) -> Result<StatusResponse, CommandError> {
        self.execute(Method::POST, "/api/on").await
    }

    /// Turns the UV light off
    pub async fn turn_off(&self) -> Result<StatusResponse, CommandError> {
        self.execute(Method::POST, "/api/off").await
    }

    /// Toggles the UV light
    pub async fn toggle(&self) -> Result<StatusResponse, CommandError> {
        self.execute(Method::POST, "/api/toggle").await
    }

    async fn execute(&self, method: Method, api_path: &str) -> Result<StatusResponse, CommandError> {
        let url = format!("{}{}", self.base_url, api_path);

        let response = self
            .http
            .request(method, &url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| CommandError::ConnectionLost {
                device_id: self.device_id.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CommandError::Rejected {
                device_id: self.device_id.clone(),
                message: format!("HTTP {status}"),
            });
        }

        let body: StatusResponse =
            response
                .json()
                .await
                .map_err(|e| CommandError::InvalidResponse {
                    device_id: self.device_id.clone(),
                    reason: e.to_string(),
                })?;

        if !body.success {
            return Err(CommandError::Rejected {
                device_id: self.device_id.clone(),
                message: body
                    .message
                    .unwrap_or_else(|| "device reported failure".to_string()),
            });
        }

        debug!(
            device_id = %self.device_id,
            path = api_path,
            uv_light_on = body.uv_light_on,
            "Command completed"
        );
        Ok(body)
    }
}
