//! Catalog synchronization against the bound video server
//!
//! `VideoServer` first tries the last known server. If none is bound on the
//! current network, or the request fails, it discovers servers on the local
//! network, binds one and tries again. Catalog requests are conditional on the
//! stored ETag so an unchanged catalog costs a 304.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT_CHARSET, ETAG, IF_NONE_MATCH};
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::discovery::{DiscoveryClient, DiscoveryError};
use super::selection::{select_server, ServerChoice};
use crate::models::{DiscoveredServer, ServerRecord, UpdateInfo};
use crate::network::NetworkMonitor;
use crate::store::{ClientStore, StoreError};

/// Default HTTP request timeout
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Sync error types
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server returned HTTP {0}")]
    Status(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No server bound")]
    Unbound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of one sync attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// No network connection; nothing was attempted
    Offline,
    /// The server's catalog matches the stored ETag
    NotModified { name: Option<String> },
    /// A new catalog body was delivered; its ETag is not yet stored
    Updated {
        name: Option<String>,
        #[serde(skip)]
        body: Vec<u8>,
        etag: Option<String>,
    },
    /// Several servers answered discovery; bind one with [`VideoServer::choose`]
    NeedsChoice { servers: Vec<DiscoveredServer> },
}

impl SyncOutcome {
    /// True when the cached catalog is still current
    pub fn cache_hit(&self) -> bool {
        matches!(self, SyncOutcome::NotModified { .. })
    }
}

/// Result of discovering and binding a server
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BindOutcome {
    Bound { record: ServerRecord },
    Ambiguous { servers: Vec<DiscoveredServer> },
}

/// Client for the bound video server.
///
/// Methods take `&mut self`, so discovery and sync on one instance are
/// always serialized and the record only changes between requests.
pub struct VideoServer {
    record: ServerRecord,
    store: Arc<dyn ClientStore>,
    monitor: Arc<dyn NetworkMonitor>,
    discovery: DiscoveryClient,
    client: reqwest::Client,
}

impl VideoServer {
    /// Create a client, loading the last binding from `store`
    pub fn new(store: Arc<dyn ClientStore>, monitor: Arc<dyn NetworkMonitor>, discovery: DiscoveryClient) -> Self {
        Self::with_timeout(store, monitor, discovery, HTTP_TIMEOUT)
    }

    pub fn with_timeout(
        store: Arc<dyn ClientStore>,
        monitor: Arc<dyn NetworkMonitor>,
        discovery: DiscoveryClient,
        timeout: Duration,
    ) -> Self {
        let record = store.load_record().unwrap_or_else(|e| {
            warn!(error = %e, "Could not load server record, starting unbound");
            ServerRecord::default()
        });

        Self {
            record,
            store,
            monitor,
            discovery,
            client: reqwest::Client::builder()
                .timeout(timeout)
                .connect_timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn record(&self) -> &ServerRecord {
        &self.record
    }

    pub fn is_connected(&self) -> bool {
        self.monitor.is_connected()
    }

    /// True if the record does not point at a server on the current network
    pub fn is_stale(&self) -> bool {
        !self.record.is_bound_to(self.monitor.network_name().as_deref())
    }

    /// Run one discovery round on the current network
    pub async fn discover(&self) -> Result<Vec<DiscoveredServer>, DiscoveryError> {
        let interface = self.monitor.interface().ok_or(DiscoveryError::NoInterface)?;
        self.discovery.discover(&interface).await
    }

    /// Discover servers and bind one if it is the only answer
    pub async fn discover_and_bind(&mut self) -> Result<BindOutcome, SyncError> {
        let servers = self.discover().await?;

        match select_server(servers)? {
            ServerChoice::Single(server) => {
                let record = self.bind(&server)?.clone();
                Ok(BindOutcome::Bound { record })
            }
            ServerChoice::Ambiguous(servers) => {
                info!(count = servers.len(), "Multiple servers found, waiting for a choice");
                Ok(BindOutcome::Ambiguous { servers })
            }
        }
    }

    /// Bind to `server` on the current network, clearing the cached ETag
    pub fn bind(&mut self, server: &DiscoveredServer) -> Result<&ServerRecord, StoreError> {
        self.record = ServerRecord::bind(self.monitor.network_name(), server, self.record.update_version);
        self.store.save_record(&self.record)?;
        info!(server = %server, url = %server.url, "Bound to server");
        Ok(&self.record)
    }

    /// Bind the server picked by the user and sync with it right away
    pub async fn choose(&mut self, server: &DiscoveredServer) -> Result<SyncOutcome, SyncError> {
        self.bind(server)?;
        self.fetch_titles().await
    }

    /// Forget the bound server
    pub fn forget(&mut self) -> Result<(), StoreError> {
        self.record = ServerRecord::default();
        self.store.clear()
    }

    /// Store the ETag of a catalog body. Call only after that body has been
    /// saved.
    pub fn commit_etag(&mut self, etag: Option<String>) -> Result<(), StoreError> {
        self.record.etag = etag;
        self.store.save_record(&self.record)
    }

    /// Drop the stored ETag so the next sync fetches the full catalog
    pub fn invalidate_etag(&mut self) -> Result<(), StoreError> {
        if self.record.etag.take().is_some() {
            self.store.save_record(&self.record)?;
        }
        Ok(())
    }

    /// Bring the catalog up to date.
    ///
    /// Offline is a silent no-op. A stale or missing binding triggers
    /// discovery first; a failed request triggers one rediscovery and retry.
    pub async fn sync(&mut self) -> Result<SyncOutcome, SyncError> {
        if !self.monitor.is_connected() {
            debug!("No network connection, skipping sync");
            return Ok(SyncOutcome::Offline);
        }

        if self.is_stale() {
            info!("No server bound on this network, discovering");
            return self.rediscover().await;
        }

        match self.fetch_titles().await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                warn!(error = %e, server = %self.record, "Catalog request failed, rediscovering");
                self.rediscover().await
            }
        }
    }

    async fn rediscover(&mut self) -> Result<SyncOutcome, SyncError> {
        match self.discover_and_bind().await? {
            BindOutcome::Bound { .. } => self.fetch_titles().await,
            BindOutcome::Ambiguous { servers } => Ok(SyncOutcome::NeedsChoice { servers }),
        }
    }

    /// Conditional GET of the catalog from the bound server.
    ///
    /// A new body comes back with its ETag, which is not stored here; see
    /// [`VideoServer::commit_etag`].
    pub async fn fetch_titles(&mut self) -> Result<SyncOutcome, SyncError> {
        let url = self.record.titles_url().ok_or(SyncError::Unbound)?;
        let name = self.record.name.clone();

        let mut request = self.client.get(&url).header(ACCEPT_CHARSET, "UTF-8");
        if let Some(etag) = &self.record.etag {
            request = request.header(IF_NONE_MATCH, etag.as_str());
        }

        let response = request.send().await?;

        match response.status() {
            StatusCode::OK => {
                let etag = response
                    .headers()
                    .get(ETAG)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let body = response.bytes().await?;

                if body.is_empty() {
                    debug!(%url, "Empty catalog response, keeping cached catalog");
                    return Ok(SyncOutcome::NotModified { name });
                }

                info!(%url, bytes = body.len(), etag = ?etag, "Catalog received");

                Ok(SyncOutcome::Updated {
                    name,
                    body: body.to_vec(),
                    etag,
                })
            }
            StatusCode::NOT_MODIFIED => {
                debug!(%url, "Catalog not modified");
                Ok(SyncOutcome::NotModified { name })
            }
            status => Err(SyncError::Status(status.as_u16())),
        }
    }

    /// Ask the server whether a newer client build is published.
    ///
    /// Reports an update once: the announced version is remembered and not
    /// reported again.
    pub async fn check_update(&mut self, package: &str, current_version: u32) -> Result<Option<UpdateInfo>, SyncError> {
        let url = self.record.update_url().ok_or(SyncError::Unbound)?;

        let response = self.client.get(&url).header(ACCEPT_CHARSET, "UTF-8").send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let update: UpdateInfo = serde_json::from_str(&body)
            .map_err(|e| SyncError::InvalidResponse(format!("JSON parse error: {}", e)))?;

        if update.package_name != package
            || update.version_code <= current_version
            || update.version_code <= self.record.update_version
        {
            debug!(version = update.version_code, "No new client update");
            return Ok(None);
        }

        self.record.update_version = update.version_code;
        self.store.save_record(&self.record)?;
        info!(version = %update.version_name, "Client update available");

        Ok(Some(update))
    }

    /// URL of a file published by the bound server, e.g. an update package
    pub fn app_url(&self, filename: &str) -> Option<String> {
        self.record.app_url(filename)
    }
}
