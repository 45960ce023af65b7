//! End-to-end flows over the composed discovery/connection core, with a
//! canned advertisement source and wiremock standing in for device HTTP.

use aqualink_client::IdentityProbe;
use aqualink_core::{DeviceStatus, DiscoveryConfig};
use aqualink_discovery::{
    AdvertEvent, AdvertSource, DiscoveredEndpoint, DiscoveryEngine, DiscoveryError,
    DiscoveryPhase, DiscoverySession,
};
use aqualink_orchestrator::{ConnectionOrchestrator, OrchestrationError};
use aqualink_registry::ConnectionRegistry;
use async_channel::Receiver;
use parking_lot::Mutex;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Advertisement source fed from a canned event list.
struct CannedAdvertSource {
    events: Mutex<Vec<AdvertEvent>>,
}

impl CannedAdvertSource {
    fn new(events: Vec<AdvertEvent>) -> Self {
        Self {
            events: Mutex::new(events),
        }
    }
}

impl AdvertSource for CannedAdvertSource {
    fn start(&self) -> Result<Receiver<AdvertEvent>, DiscoveryError> {
        let (tx, rx) = async_channel::bounded(32);
        for event in self.events.lock().drain(..) {
            let _ = tx.try_send(event);
        }
        Ok(rx)
    }

    fn stop(&self) {}
}

fn fast_config(port: u16) -> DiscoveryConfig {
    DiscoveryConfig {
        device_port: port,
        poll_interval_ms: 10,
        max_poll_attempts: 3,
        probe_timeout_ms: 500,
        candidate_delay_ms: 1,
        subnet_ranges: vec![],
        fixed_candidates: vec![],
        ..Default::default()
    }
}

fn compose(
    config: DiscoveryConfig,
    events: Vec<AdvertEvent>,
) -> (ConnectionOrchestrator, Arc<ConnectionRegistry>) {
    let probe = Arc::new(IdentityProbe::new(&config));
    let session = Arc::new(DiscoverySession::new());
    let source: Arc<dyn AdvertSource> = Arc::new(CannedAdvertSource::new(events));
    let engine = Arc::new(
        DiscoveryEngine::new(
            config.clone(),
            Arc::clone(&probe),
            source,
            Arc::clone(&session),
        )
        .unwrap(),
    );
    let registry = Arc::new(ConnectionRegistry::new(Arc::clone(&probe), &config));
    let orchestrator =
        ConnectionOrchestrator::new(config, engine, session, Arc::clone(&registry));
    (orchestrator, registry)
}

async fn mock_device() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "device": "AquaLuminus-X",
            "version": "1.0",
            "ip": "192.168.1.50",
            "mac": "AA:BB:CC:00:11:22",
            "hostname": "aqua.local",
            "deviceId": "abc123"
        })))
        .mount(&server)
        .await;
    server
}

fn resolved(addr: SocketAddr) -> AdvertEvent {
    AdvertEvent::Resolved(DiscoveredEndpoint::new(
        "AquaLuminus-X._aqualuminus._tcp.local.".to_string(),
        addr.ip(),
        addr.port(),
        Some("aqua.local".to_string()),
    ))
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connect_after_setup_end_to_end() {
    let server = mock_device().await;
    let addr = *server.address();

    let (orchestrator, registry) = compose(fast_config(addr.port()), vec![resolved(addr)]);

    orchestrator.connect_after_setup().await.unwrap();

    let devices = orchestrator.connected_devices();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].device_id, "abc123");
    assert_eq!(devices[0].ip, addr.ip());
    assert_eq!(devices[0].status, DeviceStatus::Online);
    assert!(registry.client("abc123").is_some());
    assert!(*orchestrator.subscribe_connected().borrow());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_command_surface_through_registry_binding() {
    let server = mock_device().await;
    Mock::given(method("POST"))
        .and(path("/api/toggle"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "uvLightOn": true,
            "timestamp": 1722800000000u64
        })))
        .mount(&server)
        .await;

    let addr = *server.address();
    let (orchestrator, registry) = compose(fast_config(addr.port()), vec![resolved(addr)]);
    orchestrator.connect_after_setup().await.unwrap();

    let client = registry.client("abc123").unwrap();
    let status = client.toggle().await.unwrap();
    assert!(status.uv_light_on);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_result_asymmetry() {
    // Same empty world for both paths
    let (orchestrator, _registry) = compose(fast_config(80), vec![]);

    // The general discovery operation: success with an empty list
    let endpoints = orchestrator.discover().await;
    assert!(endpoints.is_empty());
    let snapshot = orchestrator.subscribe_session().borrow().clone();
    assert_eq!(snapshot.phase, DiscoveryPhase::Stopped);
    assert_eq!(snapshot.status_message, "No devices found");

    // Forced discovery: an explicit failure for the equivalent situation
    let err = orchestrator.force_discovery().await.unwrap_err();
    assert!(matches!(err, OrchestrationError::NoDevicesFound));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_force_discovery_connects_via_fallback_candidates() {
    let server = mock_device().await;
    let addr = *server.address();

    // Nothing advertises; only the fallback candidate list knows the device
    let mut config = fast_config(addr.port());
    config.fixed_candidates = vec![addr.ip()];
    let (orchestrator, registry) = compose(config, vec![]);

    orchestrator.force_discovery().await.unwrap();
    assert_eq!(registry.device_count(), 1);
    assert!(registry.client("abc123").is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_disconnect_flow() {
    let server = mock_device().await;
    let addr = *server.address();

    let (orchestrator, registry) = compose(fast_config(addr.port()), vec![resolved(addr)]);
    orchestrator.connect_after_setup().await.unwrap();
    assert!(*orchestrator.subscribe_connected().borrow());

    orchestrator.disconnect("abc123");
    assert!(registry.client("abc123").is_none());
    assert!(!*orchestrator.subscribe_connected().borrow());

    // Disconnecting an unknown id is silently ignored
    orchestrator.disconnect("abc123");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connect_after_setup_fails_when_probe_rejects_everything() {
    // An advertised endpoint that answers HTTP but is not our product
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "device": "SmartPlug-3000",
            "version": "2.2",
            "ip": "192.168.1.9",
            "mac": "11:22:33:44:55:66",
            "deviceId": "nope"
        })))
        .mount(&server)
        .await;

    let addr = *server.address();
    let (orchestrator, registry) = compose(fast_config(addr.port()), vec![resolved(addr)]);

    // The endpoint is discovered (tier 1 resolved it), but connect_all
    // rejects it at identity-probe time
    let err = orchestrator.connect_after_setup().await.unwrap_err();
    assert!(matches!(
        err,
        OrchestrationError::NoDevicesFound | OrchestrationError::Unreachable(_)
    ));
    assert_eq!(registry.device_count(), 0);
}
