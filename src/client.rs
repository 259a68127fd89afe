//! Client facade
//!
//! Owns the server connection and the in-memory library, applies sync
//! results to the library, and runs syncs as background tasks whose results
//! come back over a channel.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{oneshot, Mutex, MutexGuard};
use tracing::{info, warn};

use crate::catalog::{Catalog, Library};
use crate::models::DiscoveredServer;
use crate::network::NetworkMonitor;
use crate::server::{BindOutcome, DiscoveryClient, SyncError, SyncOutcome, VideoServer};
use crate::store::ClientStore;

/// What a sync did to the library
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CatalogUpdate {
    /// No network connection
    Offline,
    /// The cached catalog is current
    Unchanged { server: Option<String> },
    /// A new catalog replaced the library
    Replaced { server: Option<String>, titles: usize },
    /// The server sent a catalog that did not parse; the previous one is kept
    Rejected { server: Option<String>, error: String },
    /// Several servers answered; pick one with [`HomeVideo::choose_server`]
    NeedsChoice { servers: Vec<DiscoveredServer> },
}

/// Server connection plus the last-known-good catalog
pub struct HomeVideo {
    server: VideoServer,
    library: Library,
    store: Arc<dyn ClientStore>,
}

impl HomeVideo {
    pub fn new(store: Arc<dyn ClientStore>, monitor: Arc<dyn NetworkMonitor>, discovery: DiscoveryClient) -> Self {
        let server = VideoServer::new(store.clone(), monitor, discovery);
        Self::from_parts(server, store)
    }

    pub fn from_parts(server: VideoServer, store: Arc<dyn ClientStore>) -> Self {
        Self {
            server,
            library: Library::new(),
            store,
        }
    }

    /// Load the catalog saved by the last successful sync. Returns true if one
    /// was loaded.
    pub fn load_cached(&mut self) -> bool {
        let raw = match self.store.load_catalog() {
            Ok(Some(raw)) => raw,
            Ok(None) => return false,
            Err(e) => {
                warn!(error = %e, "Could not read cached catalog");
                return false;
            }
        };

        let name = self.server.record().name.clone();
        self.library.ingest(name, &raw).is_ok()
    }

    /// Sync with the server and apply the result to the library
    pub async fn sync_catalog(&mut self) -> Result<CatalogUpdate, SyncError> {
        // Without a catalog in memory a 304 would leave us with nothing
        if self.library.catalog().is_none() {
            self.server.invalidate_etag()?;
        }

        let outcome = self.server.sync().await?;
        self.apply(outcome)
    }

    /// Discover servers, binding automatically when only one answers
    pub async fn discover_and_bind(&mut self) -> Result<BindOutcome, SyncError> {
        self.server.discover_and_bind().await
    }

    /// Bind the chosen server and sync with it
    pub async fn choose_server(&mut self, server: &DiscoveredServer) -> Result<CatalogUpdate, SyncError> {
        let outcome = self.server.choose(server).await?;
        self.apply(outcome)
    }

    fn apply(&mut self, outcome: SyncOutcome) -> Result<CatalogUpdate, SyncError> {
        match outcome {
            SyncOutcome::Offline => Ok(CatalogUpdate::Offline),
            SyncOutcome::NotModified { name } => Ok(CatalogUpdate::Unchanged { server: name }),
            SyncOutcome::NeedsChoice { servers } => Ok(CatalogUpdate::NeedsChoice { servers }),
            SyncOutcome::Updated { name, body, etag } => match self.library.ingest(name.clone(), &body) {
                Ok(catalog) => {
                    let titles = catalog.len();
                    self.store.save_catalog(&body)?;
                    self.server.commit_etag(etag)?;
                    info!(titles, "Library replaced");
                    Ok(CatalogUpdate::Replaced { server: name, titles })
                }
                Err(e) => {
                    self.server.invalidate_etag()?;
                    Ok(CatalogUpdate::Rejected {
                        server: name,
                        error: e.to_string(),
                    })
                }
            },
        }
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.library.catalog()
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut Library {
        &mut self.library
    }

    pub fn server(&self) -> &VideoServer {
        &self.server
    }

    pub fn server_mut(&mut self) -> &mut VideoServer {
        &mut self.server
    }
}

/// Shared handle that runs client work as background tasks.
///
/// Tasks take the client lock for their whole duration, so a sync never
/// overlaps a discovery round on the same client.
#[derive(Clone)]
pub struct ClientHandle {
    inner: Arc<Mutex<HomeVideo>>,
}

impl ClientHandle {
    pub fn new(client: HomeVideo) -> Self {
        Self {
            inner: Arc::new(Mutex::new(client)),
        }
    }

    /// Start a sync; the result arrives on the returned channel
    pub fn spawn_sync(&self) -> oneshot::Receiver<Result<CatalogUpdate, SyncError>> {
        let inner = self.inner.clone();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let result = inner.lock().await.sync_catalog().await;
            let _ = tx.send(result);
        });

        rx
    }

    /// Start a discovery round; the result arrives on the returned channel
    pub fn spawn_discovery(&self) -> oneshot::Receiver<Result<BindOutcome, SyncError>> {
        let inner = self.inner.clone();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let result = inner.lock().await.discover_and_bind().await;
            let _ = tx.send(result);
        });

        rx
    }

    pub async fn lock(&self) -> MutexGuard<'_, HomeVideo> {
        self.inner.lock().await
    }
}
