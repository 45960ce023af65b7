//! Local network environment queries.

use std::net::{Ipv4Addr, SocketAddr, UdpSocket};

/// Best-effort lookup of the local IPv4 address on the default route.
///
/// Connecting a UDP socket picks the outbound interface without sending a
/// single packet; the "destination" is never contacted. Returns `None` when
/// the host has no usable route (no network).
pub fn local_ipv4() -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind(("0.0.0.0", 0)).ok()?;
    socket.connect(("8.8.8.8", 80)).ok()?;

    match socket.local_addr().ok()? {
        SocketAddr::V4(addr) if !addr.ip().is_loopback() && !addr.ip().is_unspecified() => {
            Some(*addr.ip())
        }
        _ => None,
    }
}

/// True when the host sits on a private (RFC 1918) network, i.e. the kind
/// of LAN a device could also be on.
pub fn on_private_network() -> bool {
    local_ipv4().is_some_and(|ip| ip.is_private())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_ipv4_never_loopback() {
        // Environment-dependent: may be None on an isolated host, but a
        // returned address is never loopback or unspecified.
        if let Some(ip) = local_ipv4() {
            assert!(!ip.is_loopback());
            assert!(!ip.is_unspecified());
        }
    }
}
