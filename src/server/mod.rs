//! Video server connection
//!
//! - Discovery: UDP broadcast to find servers on the local network
//! - Selection: what to do with zero, one or several answers
//! - Sync: bound server, conditional catalog requests, rediscovery

pub mod discovery;
pub mod selection;
pub mod sync;

pub use discovery::{DiscoveryClient, DiscoveryError};
pub use selection::{resolve_choice, select_server, IndexChooser, ServerChoice, ServerChooser};
pub use sync::{BindOutcome, SyncError, SyncOutcome, VideoServer};
