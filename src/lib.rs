//! homevideo - client for a home video server
//!
//! Finds a video server on the local network, keeps a local copy of its
//! catalog fresh, and picks which encoded file of each video to stream,
//! download or cast.
//!
//! # Modules
//!
//! - `models` - Titles, videos, containers, server records
//! - `select` - Container ranking and selection
//! - `catalog` - Catalog parsing and the in-memory library
//! - `server` - Discovery, server selection and catalog sync
//! - `store` - Persisted server record and cached catalog
//! - `network` - Local network facts used for discovery
//! - `client` - Facade tying the above together
//! - `config` - Configuration file
//! - `cli` - Command line arguments and output

pub mod catalog;
pub mod cli;
pub mod client;
pub mod config;
pub mod format;
pub mod models;
pub mod network;
pub mod select;
pub mod server;
pub mod store;

// Re-export commonly used types
pub use models::{
    Container, DiscoveredServer, Episode, Info, Season, ServerRecord, Subtitle, Title, UpdateInfo, Video,
};

pub use catalog::{Catalog, CatalogError, Library};
pub use client::{CatalogUpdate, ClientHandle, HomeVideo};
pub use select::{
    resolve_cast_container, resolve_download_container, resolve_streaming_container, StreamingPreference,
};
pub use server::{BindOutcome, DiscoveryClient, DiscoveryError, SyncError, SyncOutcome, VideoServer};
pub use store::{ClientStore, FileStore, MemoryStore, StoreError};
