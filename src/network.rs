//! Local address lookup
//!
//! Connecting a UDP socket sends nothing, but makes the kernel pick the
//! outbound interface, whose address is then readable from the socket.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

/// Any non-local IPv4 target works; nothing is sent to it.
const ROUTE_PROBE: &str = "10.255.255.255:1";

/// Address of the interface used for outbound traffic, or loopback if there is none
pub fn local_ip() -> IpAddr {
    route_ip().unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

fn route_ip() -> Option<IpAddr> {
    let sock = UdpSocket::bind("0.0.0.0:0").ok()?;
    sock.connect(ROUTE_PROBE).ok()?;
    let ip = sock.local_addr().ok()?.ip();
    if ip.is_unspecified() {
        None
    } else {
        Some(ip)
    }
}

/// `https://<ip>:<port>`, with IPv6 addresses bracketed
pub fn dashboard_url(ip: IpAddr, port: u16) -> String {
    format!("https://{}", SocketAddr::new(ip, port))
}

/// Poll until a non-loopback local address shows up or `max_wait` passes
///
/// Returns whether the network came up in time.
pub async fn wait_for_network(max_wait: Duration, poll_interval: Duration) -> bool {
    let deadline = Instant::now() + max_wait;
    loop {
        if !local_ip().is_loopback() {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        tokio::time::sleep(poll_interval.min(deadline - now)).await;
    }
}
