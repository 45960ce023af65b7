//! Active scanning tiers: subnet brute-force and fixed-candidate probing.

use crate::session::DiscoverySession;
use crate::types::DiscoveredEndpoint;
use aqualink_client::IdentityProbe;
use aqualink_core::{DiscoveryConfig, HostRange, SETUP_MODE_ADDR};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, trace};

/// Scans prioritized host ranges within the local /24.
///
/// Candidates are probed strictly sequentially in declared order, with an
/// inter-candidate delay to bound simultaneous socket usage, and a cheap
/// TCP reachability check ahead of the more expensive identity probe.
/// Returns the number of devices confirmed by this tier.
pub(crate) async fn scan_subnet(
    probe: &IdentityProbe,
    session: &DiscoverySession,
    epoch: u64,
    config: &DiscoveryConfig,
    local: Ipv4Addr,
) -> usize {
    let candidates = subnet_candidates(local, &config.subnet_ranges);
    debug!(
        subnet = %Ipv4Addr::new(local.octets()[0], local.octets()[1], local.octets()[2], 0),
        candidates = candidates.len(),
        "Scanning subnet"
    );

    let mut found = 0;
    for candidate in candidates {
        let ip = IpAddr::V4(candidate);
        let addr = SocketAddr::new(ip, config.device_port);

        if is_reachable(addr, config.reach_timeout()).await
            && probe_candidate(probe, session, epoch, ip, config.device_port).await
        {
            found += 1;
        }

        tokio::time::sleep(config.candidate_delay()).await;
    }

    found
}

/// Probes the conventional first-DHCP-lease addresses directly.
///
/// Last-resort tier: no reachability pre-check, the identity probe's own
/// timeout bounds each attempt.
pub(crate) async fn probe_fixed_candidates(
    probe: &IdentityProbe,
    session: &DiscoverySession,
    epoch: u64,
    config: &DiscoveryConfig,
) -> usize {
    debug!(
        candidates = config.fixed_candidates.len(),
        "Probing fixed candidate addresses"
    );

    let mut found = 0;
    for &ip in &config.fixed_candidates {
        if ip == SETUP_MODE_ADDR {
            continue;
        }

        if probe_candidate(probe, session, epoch, ip, config.device_port).await {
            found += 1;
        }

        tokio::time::sleep(config.candidate_delay()).await;
    }

    found
}

/// Identity-probes one candidate and records a hit in the session.
async fn probe_candidate(
    probe: &IdentityProbe,
    session: &DiscoverySession,
    epoch: u64,
    ip: IpAddr,
    port: u16,
) -> bool {
    match probe.probe(ip, port).await {
        Ok(identity) => session.insert(
            epoch,
            DiscoveredEndpoint::new(identity.device, ip, port, identity.hostname),
        ),
        Err(e) => {
            trace!(%ip, error = %e, "Candidate rejected");
            false
        }
    }
}

/// Enumerates candidate addresses for the local /24, in range order.
///
/// The host's own address and the setup-mode address never appear.
fn subnet_candidates(local: Ipv4Addr, ranges: &[HostRange]) -> Vec<Ipv4Addr> {
    let [a, b, c, _] = local.octets();

    let mut candidates = Vec::new();
    for range in ranges {
        for host in range.start..=range.end {
            let candidate = Ipv4Addr::new(a, b, c, host);
            if candidate == local || IpAddr::V4(candidate) == SETUP_MODE_ADDR {
                continue;
            }
            candidates.push(candidate);
        }
    }
    candidates
}

/// Fast TCP reachability check with a short timeout.
async fn is_reachable(addr: SocketAddr, timeout: Duration) -> bool {
    matches!(
        tokio::time::timeout(timeout, TcpStream::connect(addr)).await,
        Ok(Ok(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_subnet_candidates_ordered_by_range() {
        let local = Ipv4Addr::new(192, 168, 1, 77);
        let ranges = [HostRange::new(100, 102), HostRange::new(2, 3)];

        let candidates = subnet_candidates(local, &ranges);
        let expected: Vec<Ipv4Addr> = ["192.168.1.100", "192.168.1.101", "192.168.1.102", "192.168.1.2", "192.168.1.3"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        assert_eq!(candidates, expected);
    }

    #[test]
    fn test_subnet_candidates_skip_self_and_setup_addr() {
        let local = Ipv4Addr::new(192, 168, 1, 101);
        let candidates = subnet_candidates(local, &[HostRange::new(100, 102)]);
        assert!(!candidates.contains(&local));
        assert_eq!(candidates.len(), 2);

        // A host that happens to sit on the 192.168.4.x subnet must not
        // surface the setup-mode address
        let local = Ipv4Addr::new(192, 168, 4, 77);
        let candidates = subnet_candidates(local, &[HostRange::new(1, 2)]);
        assert_eq!(candidates, vec![Ipv4Addr::new(192, 168, 4, 2)]);
    }

    #[tokio::test]
    async fn test_is_reachable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let open = listener.local_addr().unwrap();
        assert!(is_reachable(open, Duration::from_millis(500)).await);

        let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = closed.local_addr().unwrap();
        drop(closed);
        assert!(!is_reachable(addr, Duration::from_millis(500)).await);
    }

    #[tokio::test]
    async fn test_fixed_candidates_confirm_device() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "device": "AquaLuminus-X",
                "version": "1.0",
                "ip": "192.168.1.50",
                "mac": "AA:BB:CC:00:11:22",
                "deviceId": "abc123"
            })))
            .mount(&server)
            .await;

        let addr = *server.address();
        let config = DiscoveryConfig {
            device_port: addr.port(),
            fixed_candidates: vec![addr.ip()],
            probe_timeout_ms: 500,
            candidate_delay_ms: 1,
            ..Default::default()
        };

        let session = DiscoverySession::new();
        let epoch = session.begin().unwrap();
        let probe = IdentityProbe::new(&config);

        let found = probe_fixed_candidates(&probe, &session, epoch, &config).await;
        assert_eq!(found, 1);
        assert_eq!(session.endpoints()[0].name, "AquaLuminus-X");
    }

    #[tokio::test]
    async fn test_subnet_scan_finds_local_device() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "device": "AquaLuminus-X",
                "version": "1.0",
                "ip": "127.0.0.1",
                "mac": "AA:BB:CC:00:11:22",
                "deviceId": "abc123"
            })))
            .mount(&server)
            .await;

        let addr = *server.address();
        let config = DiscoveryConfig {
            device_port: addr.port(),
            subnet_ranges: vec![HostRange::new(1, 1)],
            probe_timeout_ms: 500,
            reach_timeout_ms: 200,
            candidate_delay_ms: 1,
            ..Default::default()
        };

        let session = DiscoverySession::new();
        let epoch = session.begin().unwrap();
        let probe = IdentityProbe::new(&config);

        // Pretend the host's own address is elsewhere on the loopback /24
        let found = scan_subnet(
            &probe,
            &session,
            epoch,
            &config,
            Ipv4Addr::new(127, 0, 0, 5),
        )
        .await;
        assert_eq!(found, 1);
        assert_eq!(session.endpoints()[0].ip.to_string(), "127.0.0.1");
    }
}
