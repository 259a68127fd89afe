//! Data structures and types for homevideo
//!
//! Contains all shared models used across the client organized by domain:
//! - **Catalog**: titles, videos and their encoded containers
//! - **Metadata**: descriptive info, seasons and episodes
//! - **Server**: discovery results and the persisted server binding
//! - **Update**: client update metadata published by the server
//!
//! Catalog JSON uses kebab-case field names, mapped with serde renames.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::net::IpAddr;

use crate::format;
use crate::select;

/// Mimetype of the only container format every player and cast receiver accepts
pub const MP4_MIMETYPE: &str = "video/mp4";

/// Largest file that can be downloaded (practical FAT32 limit)
pub const DOWNLOADABLE_SIZE: u64 = 4_187_593_114;

// =============================================================================
// Catalog Models
// =============================================================================

/// One encoded media file for a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Container {
    pub filename: String,
    #[serde(default)]
    pub filetype: Option<String>,
    #[serde(default)]
    pub mimetype: Option<String>,
    /// Comma separated language tags
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub bitrate: u64,
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    /// Human label for the resolution (e.g. "1080p")
    #[serde(default)]
    pub dimension: Option<String>,
    /// Video codec description
    #[serde(default)]
    pub video: Option<String>,
    /// Audio codec description
    #[serde(default)]
    pub audio: Option<String>,
    /// Last modification time, milliseconds since the epoch
    #[serde(default)]
    pub modified: i64,
    pub url: String,
}

impl Container {
    /// True if the video stream is H.264 (hardware decodable)
    pub fn has_h264(&self) -> bool {
        self.video.as_deref().is_some_and(|v| v.contains("H.264"))
    }

    /// True if a cast receiver can play it (H.264 video, AAC audio)
    pub fn can_cast(&self) -> bool {
        self.has_h264() && self.audio.as_deref().is_some_and(|a| a.contains("AAC"))
    }

    /// Castable and wrapped in MP4
    pub fn is_compatible(&self) -> bool {
        self.can_cast() && self.mimetype.as_deref() == Some(MP4_MIMETYPE)
    }

    /// True if the file fits under the downloadable size ceiling
    pub fn can_download(&self) -> bool {
        self.size < DOWNLOADABLE_SIZE
    }

    /// Container format preference used when ranking (higher is better)
    pub fn format_rank(&self) -> u8 {
        match self.mimetype.as_deref() {
            Some(MP4_MIMETYPE) => 2,
            Some(m) if m.contains("matroska") => 1,
            _ => 0,
        }
    }

    /// Formatted file size
    pub fn file_size(&self) -> String {
        format::size_of(self.size)
    }

    /// Formatted bitrate
    pub fn bitrate_label(&self) -> String {
        format::bitrate_of(self.bitrate)
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}x{}, {}, {}]",
            self.filename,
            self.width,
            self.height,
            self.bitrate_label(),
            self.file_size()
        )
    }
}

/// External subtitle file for a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Subtitle {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    pub url: String,
    #[serde(default)]
    pub mimetype: Option<String>,
}

/// One playable unit: a movie, a part of a movie, or an episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Video {
    pub title: String,
    /// Duration in seconds
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub season: Option<u32>,
    #[serde(default)]
    pub episode: Option<u32>,
    #[serde(default)]
    pub episode_title: Option<String>,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub thumb: Option<String>,
    #[serde(default)]
    pub containers: Vec<Container>,
    #[serde(default)]
    pub subtitles: Vec<Subtitle>,
    /// Set once the download collaborator has stored this video locally
    #[serde(skip)]
    pub downloaded: bool,
}

impl Video {
    /// Re-order containers into ranked order (see [`select::rank_containers`])
    pub fn rank_containers(&mut self) {
        select::rank_containers(&mut self.containers);
    }

    /// Best container for streaming by quality flags
    pub fn streaming(&self, highest_quality: bool, compatible: bool) -> Option<&Container> {
        select::streaming(&self.containers, highest_quality, compatible)
    }

    /// Best container for streaming to a display of the given width
    pub fn streaming_for_width(&self, width: u32) -> Option<&Container> {
        select::streaming_for_width(&self.containers, width)
    }

    /// Smallest suitable container for downloading
    pub fn download(&self) -> Option<&Container> {
        select::download(&self.containers)
    }

    /// Best container for casting
    pub fn casting(&self) -> Option<&Container> {
        select::casting(&self.containers)
    }

    pub fn can_download(&self) -> bool {
        self.download().is_some()
    }

    pub fn can_cast(&self) -> bool {
        self.casting().is_some()
    }

    /// Whether streaming is appropriate under the bandwidth-restricted default
    pub fn should_stream(&self, stream_high_quality: bool) -> bool {
        stream_high_quality
            || self
                .streaming(false, false)
                .is_some_and(|c| c.bitrate < select::HIGH_QUALITY_BITRATE)
    }

    /// Formatted size of the download container, if any
    pub fn download_size(&self) -> Option<String> {
        self.download().map(Container::file_size)
    }

    /// Formatted duration (h:mm:ss)
    pub fn duration_label(&self) -> String {
        format::duration_of(self.duration)
    }

    /// Sorted, de-duplicated languages across all containers
    pub fn languages(&self) -> Vec<String> {
        let langs: BTreeSet<String> = self
            .containers
            .iter()
            .filter_map(|c| c.language.as_deref())
            .flat_map(|l| l.split(','))
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        langs.into_iter().collect()
    }

    /// Distinct resolution labels in ranked order
    pub fn qualities(&self) -> Vec<String> {
        distinct(self.containers.iter().filter_map(|c| c.dimension.clone()))
    }

    /// Distinct video codecs in ranked order
    pub fn video_codecs(&self) -> Vec<String> {
        distinct(self.containers.iter().filter_map(|c| c.video.clone()))
    }

    /// Distinct audio codecs in ranked order
    pub fn audio_codecs(&self) -> Vec<String> {
        distinct(self.containers.iter().filter_map(|c| c.audio.clone()))
    }

    /// Most recent modification time of any container
    pub fn last_modified(&self) -> Option<i64> {
        self.containers.iter().map(|c| c.modified).max()
    }

    /// Earliest modification time of any container (when the video was added)
    pub fn modified(&self) -> Option<i64> {
        self.containers.iter().map(|c| c.modified).min()
    }
}

impl fmt::Display for Video {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.title, self.duration_label())
    }
}

fn distinct(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Groups the videos of a movie (possibly in parts) or a TV show
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Title {
    pub id: String,
    pub title: String,
    /// Sort key, e.g. "Matrix, The"
    #[serde(default)]
    pub sorting: Option<String>,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub thumb: Option<String>,
    #[serde(default)]
    pub info: Option<Info>,
    #[serde(default)]
    pub videos: Vec<Video>,
}

impl Title {
    /// Display title, preferring the metadata title
    pub fn display_title(&self) -> &str {
        self.info
            .as_ref()
            .and_then(|i| i.title.as_deref())
            .unwrap_or(&self.title)
    }

    pub fn sorting_title(&self) -> &str {
        self.sorting.as_deref().unwrap_or(&self.title)
    }

    /// Stable sort of videos by (season, episode), absent values first
    pub fn rank_videos(&mut self) {
        // Option<u32> orders None before Some, which is the required order
        self.videos.sort_by_key(|v| (v.season, v.episode));
    }

    /// The video when this title has exactly one
    pub fn single_video(&self) -> Option<&Video> {
        match self.videos.as_slice() {
            [video] => Some(video),
            _ => None,
        }
    }

    pub fn first_video(&self) -> Option<&Video> {
        self.videos.first()
    }

    /// Look up a video by its (season, episode) key
    pub fn video_for(&self, season: Option<u32>, episode: Option<u32>) -> Option<&Video> {
        self.videos
            .iter()
            .find(|v| v.season == season && v.episode == episode)
    }

    pub fn video_for_mut(&mut self, season: Option<u32>, episode: Option<u32>) -> Option<&mut Video> {
        self.videos
            .iter_mut()
            .find(|v| v.season == season && v.episode == episode)
    }

    /// Earliest time any of the videos was added
    pub fn modified(&self) -> Option<i64> {
        self.videos.iter().filter_map(Video::modified).min()
    }

    pub fn has_seasons(&self) -> bool {
        self.videos.iter().any(|v| v.season.is_some())
    }

    /// True for a movie split into multiple parts
    pub fn has_parts(&self) -> bool {
        self.videos.len() > 1 && !self.has_seasons()
    }

    pub fn seasons(&self) -> Vec<Season> {
        let indexes: BTreeSet<u32> = self.videos.iter().filter_map(|v| v.season).collect();
        indexes
            .into_iter()
            .map(|index| Season {
                index,
                title: self.info.as_ref().and_then(|i| i.season_title(index)).map(str::to_string),
            })
            .collect()
    }

    pub fn episodes(&self, season: u32) -> Vec<Episode> {
        let indexes: BTreeSet<u32> = self
            .videos
            .iter()
            .filter(|v| v.season == Some(season))
            .filter_map(|v| v.episode)
            .collect();

        indexes
            .into_iter()
            .map(|index| Episode {
                season: Some(season),
                index,
                title: self
                    .info_episode_title(Some(season), index)
                    .or_else(|| {
                        self.video_for(Some(season), Some(index))
                            .and_then(|v| v.episode_title.clone())
                    }),
            })
            .collect()
    }

    /// Parts of a multi-part movie
    pub fn parts(&self) -> Vec<Episode> {
        let indexes: BTreeSet<u32> = self
            .videos
            .iter()
            .filter(|v| v.season.is_none())
            .filter_map(|v| v.episode)
            .collect();

        indexes
            .into_iter()
            .map(|index| Episode {
                season: None,
                index,
                title: self.info_episode_title(None, index),
            })
            .collect()
    }

    /// Title including the episode or part label
    pub fn full_title(&self, video: &Video) -> String {
        match self.episode_title(video) {
            Some(episode) => format!("{} - {}", self.display_title(), episode),
            None => self.display_title().to_string(),
        }
    }

    /// Label for an episode or part, e.g. "1.2 Pilot", "S1 E2", "Part 2"
    pub fn episode_title(&self, video: &Video) -> Option<String> {
        let episode = video.episode?;
        let name = self
            .info_episode_title(video.season, episode)
            .or_else(|| video.episode_title.clone());

        Some(match (video.season, name) {
            (Some(season), Some(name)) => format!("{}.{} {}", season, episode, name),
            (Some(season), None) => format!("S{} E{}", season, episode),
            (None, Some(name)) => format!("{}. {}", episode, name),
            (None, None) => format!("Part {}", episode),
        })
    }

    fn info_episode_title(&self, season: Option<u32>, episode: u32) -> Option<String> {
        self.info
            .as_ref()
            .and_then(|i| i.episode_title(season, episode))
            .map(str::to_string)
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.info.as_ref().and_then(|i| i.year) {
            Some(year) => write!(f, "{} ({})", self.display_title(), year),
            None => write!(f, "{}", self.display_title()),
        }
    }
}

// =============================================================================
// Metadata Models
// =============================================================================

/// Descriptive metadata for a title
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Info {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub year: Option<u32>,
    pub rated: Option<String>,
    pub runtime: Option<String>,
    pub plot: Option<String>,
    pub subjects: Vec<String>,
    pub genres: Vec<String>,
    pub directors: Vec<String>,
    pub stars: Vec<String>,
    pub actors: Vec<String>,
    pub languages: Vec<String>,
    /// Season and episode title overrides
    pub seasons: Vec<SeasonInfo>,
}

impl Info {
    pub fn season_title(&self, season: u32) -> Option<&str> {
        self.seasons
            .iter()
            .find(|s| s.index == Some(season))
            .and_then(|s| s.title.as_deref())
    }

    /// Episode title override; `season` is `None` for movie parts
    pub fn episode_title(&self, season: Option<u32>, episode: u32) -> Option<&str> {
        self.seasons
            .iter()
            .find(|s| s.index == season)
            .and_then(|s| s.episodes.iter().find(|e| e.index == episode))
            .and_then(|e| e.title.as_deref())
    }
}

/// Season title override within [`Info`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SeasonInfo {
    pub index: Option<u32>,
    pub title: Option<String>,
    pub episodes: Vec<EpisodeInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct EpisodeInfo {
    pub index: u32,
    pub title: Option<String>,
}

/// A season of a title, derived from its videos
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Season {
    pub index: u32,
    pub title: Option<String>,
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.title {
            Some(title) => write!(f, "Season {} - {}", self.index, title),
            None => write!(f, "Season {}", self.index),
        }
    }
}

/// An episode within a season, or a part of a movie when `season` is `None`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Episode {
    pub season: Option<u32>,
    pub index: u32,
    pub title: Option<String>,
}

impl fmt::Display for Episode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.season, &self.title) {
            (Some(_), Some(title)) => write!(f, "{}. {}", self.index, title),
            (Some(_), None) => write!(f, "Episode {}", self.index),
            (None, Some(title)) => write!(f, "Part {} - {}", self.index, title),
            (None, None) => write!(f, "Part {}", self.index),
        }
    }
}

// =============================================================================
// Server Models
// =============================================================================

/// A server that answered one discovery round
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredServer {
    /// Source address of the response datagram
    pub address: IpAddr,
    pub name: Option<String>,
    /// Advertised URL with its host replaced by `address`
    pub url: String,
}

impl DiscoveredServer {
    /// Label shown when asking the user to choose
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.url)
    }
}

impl fmt::Display for DiscoveredServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Persisted identity of the last bound server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRecord {
    /// Network the server was bound on; a different network makes this stale
    pub network: Option<String>,
    pub name: Option<String>,
    pub url: Option<String>,
    /// ETag of the cached catalog
    pub etag: Option<String>,
    /// Last client update version the user was told about
    #[serde(default)]
    pub update_version: u32,
}

impl ServerRecord {
    /// Fresh binding to a server on the given network, with no cached ETag
    pub fn bind(network: Option<String>, server: &DiscoveredServer, update_version: u32) -> Self {
        Self {
            network,
            name: server.name.clone(),
            url: Some(server.url.clone()),
            etag: None,
            update_version,
        }
    }

    /// True if this record points at a server reachable on `network`
    pub fn is_bound_to(&self, network: Option<&str>) -> bool {
        self.url.is_some() && self.network.is_some() && self.network.as_deref() == network
    }

    pub fn titles_url(&self) -> Option<String> {
        self.url.as_ref().map(|u| format!("{}/api/v1/titles", u.trim_end_matches('/')))
    }

    pub fn update_url(&self) -> Option<String> {
        self.url.as_ref().map(|u| format!("{}/api/v1/android", u.trim_end_matches('/')))
    }

    /// URL of a file published next to the server API
    pub fn app_url(&self, filename: &str) -> Option<String> {
        self.url
            .as_ref()
            .map(|u| format!("{}/{}", u.trim_end_matches('/'), filename))
    }
}

impl fmt::Display for ServerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, &self.url) {
            (Some(name), Some(url)) => write!(f, "{} <{}>", name, url),
            (None, Some(url)) => write!(f, "{}", url),
            _ => write!(f, "(no server)"),
        }
    }
}

// =============================================================================
// Update Models
// =============================================================================

/// Client update metadata served at `/api/v1/android`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UpdateInfo {
    pub package_name: String,
    pub version_code: u32,
    pub version_name: String,
    #[serde(default)]
    pub label: Option<String>,
    pub filename: String,
    #[serde(default)]
    pub min_sdk_version: u32,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn container(width: u32, video: &str, audio: &str, mimetype: &str) -> Container {
        Container {
            filename: format!("movie-{}.mp4", width),
            filetype: None,
            mimetype: Some(mimetype.to_string()),
            language: None,
            size: 1_000_000,
            bitrate: 1_000_000,
            width,
            height: width * 9 / 16,
            dimension: None,
            video: Some(video.to_string()),
            audio: Some(audio.to_string()),
            modified: 0,
            url: format!("http://server/movie-{}", width),
        }
    }

    fn video(season: Option<u32>, episode: Option<u32>, title: Option<&str>) -> Video {
        Video {
            title: "Show".to_string(),
            duration: 0.0,
            season,
            episode,
            episode_title: title.map(str::to_string),
            poster: None,
            thumb: None,
            containers: vec![],
            subtitles: vec![],
            downloaded: false,
        }
    }

    // -------------------------------------------------------------------------
    // Container Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_container_predicates() {
        let mp4 = container(1920, "H.264 High", "AAC LC", "video/mp4");
        assert!(mp4.has_h264());
        assert!(mp4.can_cast());
        assert!(mp4.is_compatible());

        let mkv = container(1920, "H.264", "AAC", "video/x-matroska");
        assert!(mkv.can_cast());
        assert!(!mkv.is_compatible());

        let hevc = container(3840, "HEVC", "AAC", "video/mp4");
        assert!(!hevc.has_h264());
        assert!(!hevc.can_cast());

        let ac3 = container(1920, "H.264", "AC-3", "video/mp4");
        assert!(!ac3.can_cast());
    }

    #[test]
    fn test_container_missing_codecs() {
        let mut c = container(720, "H.264", "AAC", "video/mp4");
        c.video = None;
        c.audio = None;
        assert!(!c.has_h264());
        assert!(!c.can_cast());
    }

    #[test]
    fn test_can_download_ceiling() {
        let mut c = container(720, "H.264", "AAC", "video/mp4");
        c.size = DOWNLOADABLE_SIZE - 1;
        assert!(c.can_download());
        c.size = DOWNLOADABLE_SIZE;
        assert!(!c.can_download());
    }

    #[test]
    fn test_format_rank() {
        assert_eq!(container(1, "", "", "video/mp4").format_rank(), 2);
        assert_eq!(container(1, "", "", "video/x-matroska").format_rank(), 1);
        assert_eq!(container(1, "", "", "video/avi").format_rank(), 0);
    }

    #[test]
    fn test_container_deserialize_kebab_case() {
        let json = r#"{
            "filename": "Movie.mp4",
            "mimetype": "video/mp4",
            "size": 1234,
            "bitrate": 5000000,
            "width": 1920,
            "height": 1080,
            "dimension": "1080p",
            "video": "H.264",
            "audio": "AAC",
            "modified": 1500000000000,
            "url": "http://server/Movie.mp4"
        }"#;
        let c: Container = serde_json::from_str(json).unwrap();
        assert_eq!(c.width, 1920);
        assert_eq!(c.dimension.as_deref(), Some("1080p"));
        assert!(c.is_compatible());
    }

    // -------------------------------------------------------------------------
    // Video Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_video_languages_sorted_unique() {
        let mut v = video(None, None, None);
        let mut a = container(1920, "H.264", "AAC", "video/mp4");
        a.language = Some("eng, spa".to_string());
        let mut b = container(720, "H.264", "AAC", "video/mp4");
        b.language = Some("eng,fre".to_string());
        v.containers = vec![a, b];

        assert_eq!(v.languages(), vec!["eng", "fre", "spa"]);
    }

    #[test]
    fn test_video_modified_range() {
        let mut v = video(None, None, None);
        let mut a = container(1920, "H.264", "AAC", "video/mp4");
        a.modified = 200;
        let mut b = container(720, "H.264", "AAC", "video/mp4");
        b.modified = 100;
        v.containers = vec![a, b];

        assert_eq!(v.modified(), Some(100));
        assert_eq!(v.last_modified(), Some(200));
        assert_eq!(video(None, None, None).modified(), None);
    }

    #[test]
    fn test_video_codecs_distinct() {
        let mut v = video(None, None, None);
        v.containers = vec![
            container(1920, "H.264", "AAC", "video/mp4"),
            container(1280, "H.264", "AC-3", "video/mp4"),
            container(720, "MPEG-4", "AAC", "video/mp4"),
        ];
        assert_eq!(v.video_codecs(), vec!["H.264", "MPEG-4"]);
        assert_eq!(v.audio_codecs(), vec!["AAC", "AC-3"]);
    }

    #[test]
    fn test_should_stream_below_ceiling() {
        let with_bitrates = |bitrates: &[u64]| {
            let mut v = video(None, None, None);
            v.containers = bitrates
                .iter()
                .map(|&b| {
                    let mut c = container(1920, "H.264", "AAC", "video/mp4");
                    c.bitrate = b;
                    c
                })
                .collect();
            v
        };

        assert!(with_bitrates(&[12_000_000, 8_000_000]).should_stream(false));
        assert!(!with_bitrates(&[12_000_000]).should_stream(false));
        assert!(!with_bitrates(&[select::HIGH_QUALITY_BITRATE]).should_stream(false));
        assert!(!with_bitrates(&[]).should_stream(false));

        // High-quality streaming always streams
        assert!(with_bitrates(&[12_000_000]).should_stream(true));
        assert!(with_bitrates(&[]).should_stream(true));
    }

    #[test]
    fn test_download_size_and_qualities() {
        let mut big = container(3840, "HEVC", "AAC", "video/x-matroska");
        big.size = 5 * 1024 * 1024 * 1024;
        big.dimension = Some("2160p".to_string());
        let mut hd = container(1920, "H.264", "AAC", "video/mp4");
        hd.size = 3 * 1024 * 1024 * 1024 / 2;
        hd.dimension = Some("1080p".to_string());
        let mut alt = container(1920, "H.264", "AC-3", "video/x-matroska");
        alt.size = 2 * 1024 * 1024 * 1024;
        alt.dimension = Some("1080p".to_string());

        let mut v = video(None, None, None);
        v.containers = vec![big, hd, alt];

        // The 5 GB file is over the download ceiling
        assert_eq!(v.download_size().as_deref(), Some("1.5 GB"));
        assert_eq!(v.qualities(), vec!["2160p", "1080p"]);

        let empty = video(None, None, None);
        assert_eq!(empty.download_size(), None);
        assert!(empty.qualities().is_empty());
    }

    // -------------------------------------------------------------------------
    // Title Tests
    // -------------------------------------------------------------------------

    fn show() -> Title {
        Title {
            id: "show".to_string(),
            title: "The Show".to_string(),
            sorting: Some("Show, The".to_string()),
            poster: None,
            thumb: None,
            info: Some(Info {
                seasons: vec![SeasonInfo {
                    index: Some(1),
                    title: Some("Beginnings".to_string()),
                    episodes: vec![EpisodeInfo {
                        index: 1,
                        title: Some("Pilot".to_string()),
                    }],
                }],
                ..Info::default()
            }),
            videos: vec![
                video(Some(1), Some(2), Some("Second")),
                video(Some(1), Some(1), None),
                video(Some(2), Some(1), None),
            ],
        }
    }

    #[test]
    fn test_rank_videos_nulls_first() {
        let mut title = show();
        title.videos.push(video(None, Some(3), None));
        title.videos.push(video(None, None, None));
        title.rank_videos();

        let keys: Vec<_> = title.videos.iter().map(|v| (v.season, v.episode)).collect();
        assert_eq!(
            keys,
            vec![
                (None, None),
                (None, Some(3)),
                (Some(1), Some(1)),
                (Some(1), Some(2)),
                (Some(2), Some(1)),
            ]
        );
    }

    #[test]
    fn test_seasons_and_episodes() {
        let title = show();
        assert!(title.has_seasons());
        assert!(!title.has_parts());

        let seasons = title.seasons();
        assert_eq!(seasons.len(), 2);
        assert_eq!(seasons[0].to_string(), "Season 1 - Beginnings");
        assert_eq!(seasons[1].to_string(), "Season 2");

        let episodes = title.episodes(1);
        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[0].title.as_deref(), Some("Pilot"));
        assert_eq!(episodes[1].title.as_deref(), Some("Second"));
    }

    #[test]
    fn test_episode_titles() {
        let title = show();
        let pilot = title.video_for(Some(1), Some(1)).unwrap();
        assert_eq!(title.full_title(pilot), "The Show - 1.1 Pilot");

        let untitled = title.video_for(Some(2), Some(1)).unwrap();
        assert_eq!(title.episode_title(untitled).as_deref(), Some("S2 E1"));
    }

    #[test]
    fn test_movie_parts() {
        let title = Title {
            id: "epic".to_string(),
            title: "Epic".to_string(),
            sorting: None,
            poster: None,
            thumb: None,
            info: None,
            videos: vec![video(None, Some(1), None), video(None, Some(2), None)],
        };
        assert!(title.has_parts());
        assert_eq!(title.parts().len(), 2);
        assert_eq!(title.parts()[1].to_string(), "Part 2");
        assert_eq!(title.full_title(&title.videos[0]), "Epic - Part 1");
        assert_eq!(title.sorting_title(), "Epic");
    }

    // -------------------------------------------------------------------------
    // Server Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_server_record_binding() {
        let server = DiscoveredServer {
            address: IpAddr::V4(Ipv4Addr::new(192, 168, 1, 10)),
            name: Some("nas".to_string()),
            url: "http://192.168.1.10:8090".to_string(),
        };
        let record = ServerRecord::bind(Some("home".to_string()), &server, 7);

        assert!(record.is_bound_to(Some("home")));
        assert!(!record.is_bound_to(Some("cafe")));
        assert!(!record.is_bound_to(None));
        assert_eq!(record.etag, None);
        assert_eq!(record.update_version, 7);
        assert_eq!(
            record.titles_url().as_deref(),
            Some("http://192.168.1.10:8090/api/v1/titles")
        );
    }

    #[test]
    fn test_empty_record_is_unbound() {
        let record = ServerRecord::default();
        assert!(!record.is_bound_to(None));
        assert_eq!(record.titles_url(), None);
        assert_eq!(record.to_string(), "(no server)");
    }
}
