//! Catalog ingestion
//!
//! Turns the raw `/api/v1/titles` payload into ranked titles and keeps the
//! last catalog that parsed successfully.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::Title;

/// Catalog ingestion errors
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Malformed catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A parsed catalog with every title's videos and containers ranked
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Catalog {
    pub titles: Vec<Title>,
}

impl Catalog {
    /// Parse and rank a raw catalog payload
    pub fn parse(raw: &[u8]) -> Result<Self, CatalogError> {
        let mut titles: Vec<Title> = serde_json::from_slice(raw)?;

        for title in &mut titles {
            title.rank_videos();
            for video in &mut title.videos {
                let before = video.containers.len();
                video.containers.retain(|c| c.width > 0);
                if video.containers.len() != before {
                    warn!(
                        title = %title.id,
                        dropped = before - video.containers.len(),
                        "Ignoring containers without a width"
                    );
                }
                video.rank_containers();
            }
        }

        debug!(titles = titles.len(), "Parsed catalog");
        Ok(Self { titles })
    }

    pub fn title(&self, id: &str) -> Option<&Title> {
        self.titles.iter().find(|t| t.id == id)
    }

    pub fn title_mut(&mut self, id: &str) -> Option<&mut Title> {
        self.titles.iter_mut().find(|t| t.id == id)
    }

    /// Titles ordered by sorting title, case-insensitively
    pub fn sorted(&self) -> Vec<&Title> {
        let mut titles: Vec<&Title> = self.titles.iter().collect();
        titles.sort_by_key(|t| t.sorting_title().to_lowercase());
        titles
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

/// In-memory catalog that only changes when a new payload parses
#[derive(Debug, Default)]
pub struct Library {
    server_name: Option<String>,
    catalog: Option<Catalog>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the catalog with `raw`. On a parse failure the previous catalog
    /// is kept and the error returned.
    pub fn ingest(&mut self, server_name: Option<String>, raw: &[u8]) -> Result<&Catalog, CatalogError> {
        match Catalog::parse(raw) {
            Ok(catalog) => {
                self.server_name = server_name;
                let catalog = self.catalog.insert(catalog);
                Ok(&*catalog)
            }
            Err(e) => {
                warn!(error = %e, "Keeping previous catalog");
                Err(e)
            }
        }
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_ref()
    }

    pub fn server_name(&self) -> Option<&str> {
        self.server_name.as_deref()
    }

    /// Record that the download collaborator finished a video
    pub fn mark_downloaded(&mut self, title_id: &str, season: Option<u32>, episode: Option<u32>) -> bool {
        let video = self
            .catalog
            .as_mut()
            .and_then(|c| c.title_mut(title_id))
            .and_then(|t| t.video_for_mut(season, episode));

        match video {
            Some(video) => {
                video.downloaded = true;
                true
            }
            None => false,
        }
    }
}
