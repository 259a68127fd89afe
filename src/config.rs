//! Configuration management for homevideo
//!
//! Handles config file loading and streaming preferences.
//! Config is stored at ~/.config/homevideo/config.toml

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::network::LocalNetwork;
use crate::select::StreamingPreference;
use crate::server::discovery::{DiscoveryClient, DISCOVERY_PORT};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// UDP port servers listen on for discovery
    pub discovery_port: u16,
    /// Per-read discovery timeout in milliseconds
    pub discovery_wait_ms: u64,
    /// Cap on a whole discovery round in milliseconds (0 = no cap)
    pub discovery_round_ms: u64,
    /// HTTP request timeout in seconds
    pub http_timeout_secs: u64,
    /// Netmask of the local network, used for the broadcast address
    pub netmask: Ipv4Addr,
    /// Network identifier; defaults to the local subnet
    pub network_name: Option<String>,
    /// Stream the highest quality regardless of bandwidth
    pub stream_highest_quality: bool,
    /// Prefer H.264 containers that play everywhere
    pub stream_h264: bool,
    /// Display width used to pick a streaming resolution
    pub display_width: u32,
    /// Directory for the server record and cached catalog
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discovery_port: DISCOVERY_PORT,
            discovery_wait_ms: 750,
            discovery_round_ms: 5_000,
            http_timeout_secs: 30,
            netmask: Ipv4Addr::new(255, 255, 255, 0),
            network_name: None,
            stream_highest_quality: false,
            stream_h264: false,
            display_width: 1920,
            data_dir: None,
        }
    }
}

impl Config {
    /// Get config file path (~/.config/homevideo/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("homevideo").join("config.toml"))
    }

    /// Load config from the default file, or return default if not found
    pub fn load() -> Self {
        Self::path().map(|p| Self::load_from(&p)).unwrap_or_default()
    }

    /// Load config from a specific file, or return default if unreadable
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save config to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    pub fn discovery_client(&self) -> DiscoveryClient {
        let round = (self.discovery_round_ms > 0).then(|| Duration::from_millis(self.discovery_round_ms));
        DiscoveryClient::new()
            .with_port(self.discovery_port)
            .with_wait(Duration::from_millis(self.discovery_wait_ms))
            .with_round_limit(round)
    }

    pub fn network(&self) -> LocalNetwork {
        LocalNetwork::new(self.netmask, self.network_name.clone())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Streaming preference from the configured settings
    pub fn streaming_preference(&self) -> StreamingPreference {
        StreamingPreference::from_settings(self.stream_highest_quality, self.stream_h264, self.display_width)
    }
}
