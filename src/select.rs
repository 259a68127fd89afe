//! Variant selection
//!
//! Picks which encoded container of a video to use for streaming, downloading
//! or casting. Containers are ranked once after the catalog is parsed; every
//! selection function assumes ranked order and never re-sorts.
//!
//! Nothing here fails: when no container qualifies the result is `None`, which
//! callers surface as "cannot stream/download/cast this video".

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::{Container, Video};

/// Bitrate separating streams safe for constrained bandwidth from large ones
pub const HIGH_QUALITY_BITRATE: u64 = 10_000_000;

/// Effectively unbounded ceiling used when the highest quality is requested
pub const UNPLAYABLE_BITRATE: u64 = 50_000_000;

/// Sort containers best first: widest, then MP4 over Matroska over anything
/// else, then largest file. The sort is stable, so equal keys keep their order.
pub fn rank_containers(containers: &mut [Container]) {
    containers.sort_by(|a, b| match b.width.cmp(&a.width) {
        Ordering::Equal => match b.format_rank().cmp(&a.format_rank()) {
            Ordering::Equal => b.size.cmp(&a.size),
            other => other,
        },
        other => other,
    });
}

/// Best container for streaming by quality flags.
///
/// `highest_quality` lifts the bitrate ceiling to [`UNPLAYABLE_BITRATE`].
/// With `compatible`, fully compatible containers are tried first, then any
/// H.264 container, before falling back to anything under the ceiling.
pub fn streaming(containers: &[Container], highest_quality: bool, compatible: bool) -> Option<&Container> {
    let ceiling = if highest_quality {
        UNPLAYABLE_BITRATE
    } else {
        HIGH_QUALITY_BITRATE
    };
    let within = |c: &&Container| c.bitrate <= ceiling;

    if compatible {
        if let Some(c) = containers.iter().filter(within).find(|c| c.is_compatible()) {
            return Some(c);
        }
        if let Some(c) = containers.iter().filter(within).find(|c| c.has_h264()) {
            return Some(c);
        }
    }

    containers.iter().find(within)
}

/// Best container for a display `width` pixels wide.
///
/// Among compatible containers (or all, if none are), skips anything above
/// [`HIGH_QUALITY_BITRATE`], then keeps stepping down while the next container
/// is still at least `width` wide. The result is the narrowest container that
/// still fills the display, or the widest one when none does. When every
/// candidate is above the ceiling, the last (least demanding) one is used.
/// `None` only for an empty list.
pub fn streaming_for_width(containers: &[Container], width: u32) -> Option<&Container> {
    let compatible: Vec<&Container> = containers.iter().filter(|c| c.is_compatible()).collect();
    let candidates: Vec<&Container> = if compatible.is_empty() {
        containers.iter().collect()
    } else {
        compatible
    };

    let last = candidates.len().checked_sub(1)?;
    let mut i = candidates
        .iter()
        .position(|c| c.bitrate <= HIGH_QUALITY_BITRATE)
        .unwrap_or(last);

    while i + 1 < candidates.len() && candidates[i + 1].width >= width {
        i += 1;
    }

    Some(candidates[i])
}

/// Smallest H.264 container under the downloadable size ceiling.
///
/// Starts at the first downloadable container in ranked order and moves on
/// while the next one is downloadable, H.264 and smaller.
pub fn download(containers: &[Container]) -> Option<&Container> {
    let mut i = containers.iter().position(Container::can_download)?;

    while let Some(next) = containers.get(i + 1) {
        if next.can_download() && next.has_h264() && next.size < containers[i].size {
            i += 1;
        } else {
            break;
        }
    }

    Some(&containers[i])
}

/// Best container for casting
pub fn casting(containers: &[Container]) -> Option<&Container> {
    containers
        .iter()
        .find(|c| c.is_compatible() && c.bitrate <= HIGH_QUALITY_BITRATE)
        .or_else(|| {
            containers
                .iter()
                .find(|c| c.can_cast() && c.bitrate <= HIGH_QUALITY_BITRATE)
        })
        .or_else(|| {
            containers
                .iter()
                .find(|c| c.can_cast() && c.bitrate <= UNPLAYABLE_BITRATE)
        })
}

// =============================================================================
// Consumer Interface
// =============================================================================

/// How the caller wants to stream a video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "mode")]
pub enum StreamingPreference {
    /// Select by quality flags
    Quality { highest: bool, compatible: bool },
    /// Select for a display of this width
    Width { width: u32 },
    /// No network: only a downloaded copy can be played
    Offline,
}

impl StreamingPreference {
    /// Preference from user settings: any quality flag wins over display width
    pub fn from_settings(highest: bool, compatible: bool, width: u32) -> Self {
        if highest || compatible {
            StreamingPreference::Quality {
                highest,
                compatible,
            }
        } else {
            StreamingPreference::Width { width }
        }
    }
}

/// Container to play for `video` under `preference`
pub fn resolve_streaming_container(video: &Video, preference: StreamingPreference) -> Option<&Container> {
    match preference {
        StreamingPreference::Quality {
            highest,
            compatible,
        } => video.streaming(highest, compatible),
        StreamingPreference::Width { width } => video.streaming_for_width(width),
        StreamingPreference::Offline if video.downloaded => video.download(),
        StreamingPreference::Offline => None,
    }
}

pub fn resolve_download_container(video: &Video) -> Option<&Container> {
    video.download()
}

pub fn resolve_cast_container(video: &Video) -> Option<&Container> {
    video.casting()
}

// =============================================================================
// Tests
// =============================================================================
