//! Server discovery via UDP broadcast
//!
//! One round sends a single `DISCOVER_VIDEO_SERVER_REQUEST` datagram to the
//! subnet broadcast address and collects answers on the same socket until a
//! read times out. Servers answer with `url` or `url|name`.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};
use url::Url;

use crate::models::DiscoveredServer;
use crate::network::Ipv4Interface;

/// Request payload servers listen for
pub const DISCOVERY_REQUEST: &str = "DISCOVER_VIDEO_SERVER_REQUEST";

/// Port servers listen on
pub const DISCOVERY_PORT: u16 = 8394;

/// How long to wait for each further response
pub const DISCOVERY_WAIT: Duration = Duration::from_millis(750);

/// Discovery error types
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("No IPv4 network interface available for discovery")]
    NoInterface,

    #[error("No server found")]
    NoServerFound,

    #[error("Server selection cancelled")]
    Cancelled,

    #[error("Discovery socket error: {0}")]
    Io(#[from] std::io::Error),
}

/// UDP broadcast discovery client
#[derive(Debug, Clone)]
pub struct DiscoveryClient {
    port: u16,
    wait: Duration,
    round_limit: Option<Duration>,
}

impl DiscoveryClient {
    /// Create a client with the default port and per-read timeout
    pub fn new() -> Self {
        Self {
            port: DISCOVERY_PORT,
            wait: DISCOVERY_WAIT,
            round_limit: None,
        }
    }

    /// Use a different discovery port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Per-read timeout; each response received restarts it
    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    /// Cap on the total length of a round, however many servers keep answering
    pub fn with_round_limit(mut self, limit: Option<Duration>) -> Self {
        self.round_limit = limit;
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Broadcast target for an interface
    pub fn broadcast_target(&self, interface: &Ipv4Interface) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(interface.broadcast()), self.port)
    }

    /// Run a discovery round on the interface's subnet
    pub async fn discover(&self, interface: &Ipv4Interface) -> Result<Vec<DiscoveredServer>, DiscoveryError> {
        self.discover_at(self.broadcast_target(interface)).await
    }

    /// Run a discovery round against an explicit target address.
    ///
    /// Opens exactly one socket and never retries; callers retry whole rounds.
    pub async fn discover_at(&self, target: SocketAddr) -> Result<Vec<DiscoveredServer>, DiscoveryError> {
        let socket = UdpSocket::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0)).await?;
        socket.set_broadcast(true)?;

        debug!(%target, "Sending discovery broadcast");
        socket.send_to(DISCOVERY_REQUEST.as_bytes(), target).await?;

        let started = Instant::now();
        let mut servers: Vec<DiscoveredServer> = Vec::new();
        let mut buf = [0u8; 1024];

        loop {
            // The round cap also bounds the read in flight
            let wait = match self.round_limit {
                Some(limit) => {
                    let left = limit.saturating_sub(started.elapsed());
                    if left.is_zero() {
                        debug!(?limit, "Discovery round limit reached");
                        break;
                    }
                    self.wait.min(left)
                }
                None => self.wait,
            };

            match timeout(wait, socket.recv_from(&mut buf)).await {
                Err(_) => break,
                Ok(Err(e)) => {
                    warn!(error = %e, "Discovery receive failed, ending round");
                    break;
                }
                Ok(Ok((len, from))) => {
                    let payload = String::from_utf8_lossy(&buf[..len]);
                    debug!(%from, payload = %payload, "Discovery response");

                    match parse_response(&payload, from.ip()) {
                        Some(server) if !servers.iter().any(|s| s.url == server.url) => {
                            servers.push(server)
                        }
                        Some(_) => {}
                        None => debug!(%from, "Ignoring malformed discovery response"),
                    }
                }
            }
        }

        info!(count = servers.len(), "Discovery round finished");
        Ok(servers)
    }
}

impl Default for DiscoveryClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a `url[|name]` response from `source`.
///
/// The URL host is replaced with the source address, since servers may
/// advertise a hostname the client cannot resolve. A trailing ".local" is
/// dropped from the name. Returns `None` if the URL does not parse.
pub fn parse_response(payload: &str, source: IpAddr) -> Option<DiscoveredServer> {
    let payload = payload.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    let mut parts = payload.split('|');

    let mut url = Url::parse(parts.next()?.trim()).ok()?;
    if !url.has_host() {
        return None;
    }
    url.set_ip_host(source).ok()?;

    let name = parts
        .next()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| n.strip_suffix(".local").unwrap_or(n).to_string());

    Some(DiscoveredServer {
        address: source,
        name,
        url: url.as_str().trim_end_matches('/').to_string(),
    })
}
