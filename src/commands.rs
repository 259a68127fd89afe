//! CLI Command Handlers
//!
//! Implements all CLI commands on top of the homevideo client.
//! Each handler takes CLI args, the shared context and Output, returns ExitCode.

use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use homevideo::config::Config;
use homevideo::server::{resolve_choice, IndexChooser, ServerChoice, ServerChooser};
use homevideo::{
    resolve_cast_container, resolve_download_container, resolve_streaming_container, BindOutcome, CatalogUpdate,
    ClientStore, Container, DiscoveredServer, DiscoveryError, FileStore, HomeVideo, StreamingPreference, SyncError,
    Title,
};

use homevideo::cli::{
    DiscoverCmd, ExitCode, ForgetCmd, Output, PickCmd, PickMode, PickResponse, ServerCmd, ShowCmd, SyncCmd,
    TitlesCmd, UpdateCmd,
};

// =============================================================================
// Context
// =============================================================================

/// Everything a handler needs besides its own arguments
pub struct Context {
    pub config: Config,
    pub store: Arc<FileStore>,
    pub choose: Option<usize>,
}

impl Context {
    pub fn new(config: Config, choose: Option<usize>) -> anyhow::Result<Self> {
        let store = match &config.data_dir {
            Some(dir) => FileStore::new(dir),
            None => FileStore::default_location()?,
        };

        Ok(Self {
            config,
            store: Arc::new(store),
            choose,
        })
    }

    fn client(&self) -> HomeVideo {
        let store: Arc<dyn ClientStore> = self.store.clone();
        let server = homevideo::VideoServer::with_timeout(
            store.clone(),
            Arc::new(self.config.network()),
            self.config.discovery_client(),
            self.config.http_timeout(),
        );
        HomeVideo::from_parts(server, store)
    }

    /// Client with the cached catalog loaded
    fn cached_client(&self) -> HomeVideo {
        let mut client = self.client();
        client.load_cached();
        client
    }

    fn chooser(&self) -> Box<dyn ServerChooser + Send> {
        match self.choose {
            Some(index) => Box::new(IndexChooser(Some(index))),
            None if std::io::stdin().is_terminal() => Box::new(PromptChooser),
            None => Box::new(IndexChooser(None)),
        }
    }

    /// Directory holding downloaded video files
    fn downloads_dir(&self) -> PathBuf {
        self.store.dir().join("downloads")
    }
}

/// Asks on the terminal which server to use
struct PromptChooser;

impl ServerChooser for PromptChooser {
    fn choose(&self, labels: &[String]) -> Option<usize> {
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "Several servers answered:");
        for (i, label) in labels.iter().enumerate() {
            let _ = writeln!(stderr, "  [{}] {}", i, label);
        }
        let _ = write!(stderr, "Server number: ");
        let _ = stderr.flush();

        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line).ok()?;
        line.trim().parse().ok()
    }
}

fn sync_exit_code(e: &SyncError) -> ExitCode {
    match e {
        SyncError::Discovery(DiscoveryError::NoServerFound) | SyncError::Unbound => ExitCode::ServerNotFound,
        SyncError::Discovery(DiscoveryError::Cancelled) => ExitCode::NeedsChoice,
        SyncError::Discovery(_) | SyncError::Transport(_) | SyncError::Status(_) | SyncError::InvalidResponse(_) => {
            ExitCode::NetworkError
        }
        SyncError::Store(_) => ExitCode::Error,
    }
}

/// Run `chooser` on the blocking pool; the terminal prompt waits on stdin
async fn ask_chooser(chooser: Box<dyn ServerChooser + Send>, labels: Vec<String>) -> Option<usize> {
    tokio::task::spawn_blocking(move || chooser.choose(&labels))
        .await
        .ok()
        .flatten()
}

/// Let the chooser pick one of several servers, then bind it and sync
async fn choose_and_sync(
    client: &mut HomeVideo,
    servers: Vec<DiscoveredServer>,
    ctx: &Context,
    output: &Output,
) -> Result<CatalogUpdate, ExitCode> {
    let labels: Vec<String> = servers.iter().map(|s| s.label().to_string()).collect();
    let index = ask_chooser(ctx.chooser(), labels).await;
    let server = resolve_choice(ServerChoice::Ambiguous(servers), &IndexChooser(index))
        .map_err(|e| output.error(format!("{} (use --choose N)", e), ExitCode::NeedsChoice))?;

    output.info(format!("Using {}", server));
    client
        .choose_server(&server)
        .await
        .map_err(|e| output.error(format!("Sync failed: {}", e), sync_exit_code(&e)))
}

// =============================================================================
// Discover Command
// =============================================================================

pub async fn discover_cmd(cmd: DiscoverCmd, ctx: &Context, output: &Output) -> ExitCode {
    let mut client = ctx.client();
    output.info("Looking for servers...");

    if cmd.list {
        return match client.server().discover().await {
            Ok(servers) => {
                let lines: Vec<String> = servers.iter().map(|s| format!("{}\t{}", s.label(), s.url)).collect();
                if let Err(e) = output.print_lines(&lines, &servers) {
                    return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
                }
                ExitCode::Success
            }
            Err(e) => output.error(format!("Discovery failed: {}", e), ExitCode::NetworkError),
        };
    }

    match client.discover_and_bind().await {
        Ok(BindOutcome::Bound { record }) => {
            if let Err(e) = output.print_lines(&[record.to_string()], &record) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        Ok(BindOutcome::Ambiguous { servers }) => match choose_and_sync(&mut client, servers, ctx, output).await {
            Ok(update) => print_update(&client, &update, output),
            Err(code) => code,
        },
        Err(e) => output.error(format!("Discovery failed: {}", e), sync_exit_code(&e)),
    }
}

// =============================================================================
// Sync Command
// =============================================================================

pub async fn sync_cmd(cmd: SyncCmd, ctx: &Context, output: &Output) -> ExitCode {
    let mut client = ctx.cached_client();

    if cmd.force {
        if let Err(e) = client.server_mut().invalidate_etag() {
            return output.error(format!("Failed to reset cache: {}", e), ExitCode::Error);
        }
    }

    let update = match client.sync_catalog().await {
        Ok(CatalogUpdate::NeedsChoice { servers }) => match choose_and_sync(&mut client, servers, ctx, output).await {
            Ok(update) => update,
            Err(code) => return code,
        },
        Ok(update) => update,
        Err(e) => return output.error(format!("Sync failed: {}", e), sync_exit_code(&e)),
    };

    print_update(&client, &update, output)
}

fn print_update(client: &HomeVideo, update: &CatalogUpdate, output: &Output) -> ExitCode {
    let line = match update {
        CatalogUpdate::Offline => "Offline, using cached catalog".to_string(),
        CatalogUpdate::Unchanged { .. } => format!(
            "Catalog up to date ({} titles)",
            client.catalog().map(|c| c.len()).unwrap_or(0)
        ),
        CatalogUpdate::Replaced { titles, .. } => format!("Catalog updated ({} titles)", titles),
        CatalogUpdate::Rejected { error, .. } => format!("Server sent an unreadable catalog: {}", error),
        CatalogUpdate::NeedsChoice { servers } => format!("{} servers found, none chosen", servers.len()),
    };

    if let Err(e) = output.print_lines(&[line], update) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }

    match update {
        CatalogUpdate::Rejected { .. } => ExitCode::NetworkError,
        CatalogUpdate::NeedsChoice { .. } => ExitCode::NeedsChoice,
        _ => ExitCode::Success,
    }
}

// =============================================================================
// Titles Command
// =============================================================================

#[derive(Serialize)]
struct TitleSummary<'a> {
    id: &'a str,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    year: Option<u32>,
    videos: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    seasons: Option<String>,
}

impl<'a> TitleSummary<'a> {
    fn new(title: &'a Title) -> Self {
        let seasons: Vec<u32> = title.seasons().iter().map(|s| s.index).collect();
        Self {
            id: &title.id,
            title: title.display_title(),
            year: title.info.as_ref().and_then(|i| i.year),
            videos: title.videos.len(),
            seasons: (!seasons.is_empty()).then(|| homevideo::format::ranges(&seasons)),
        }
    }

    fn line(&self) -> String {
        let mut line = format!("{}\t{}", self.id, self.title);
        if let Some(year) = self.year {
            line.push_str(&format!(" ({})", year));
        }
        if let Some(seasons) = &self.seasons {
            line.push_str(&format!("\tseasons {}", seasons));
        }
        line
    }
}

pub async fn titles_cmd(cmd: TitlesCmd, ctx: &Context, output: &Output) -> ExitCode {
    let client = ctx.cached_client();
    let Some(catalog) = client.catalog() else {
        return output.error("No cached catalog, run `homevideo sync` first", ExitCode::NotFound);
    };

    let mut titles: Vec<TitleSummary> = catalog
        .sorted()
        .into_iter()
        .filter(|t| cmd.matches(t.display_title()))
        .map(TitleSummary::new)
        .collect();
    if let Some(limit) = cmd.limit {
        titles.truncate(limit);
    }

    let lines: Vec<String> = titles.iter().map(TitleSummary::line).collect();
    if let Err(e) = output.print_lines(&lines, &titles) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

// =============================================================================
// Show Command
// =============================================================================

pub async fn show_cmd(cmd: ShowCmd, ctx: &Context, output: &Output) -> ExitCode {
    let client = ctx.cached_client();
    let Some(title) = client.catalog().and_then(|c| c.title(&cmd.id)) else {
        return output.error(format!("Title not found: {}", cmd.id), ExitCode::NotFound);
    };

    let mut lines = vec![title.to_string()];
    if let Some(plot) = title.info.as_ref().and_then(|i| i.plot.as_ref()) {
        lines.push(plot.clone());
    }
    for video in &title.videos {
        lines.push(format!("  {} [{}]", title.full_title(video), video.duration_label()));
        for container in &video.containers {
            lines.push(format!("    {}", container));
        }
    }

    if let Err(e) = output.print_lines(&lines, title) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

// =============================================================================
// Pick Command
// =============================================================================

pub async fn pick_cmd(cmd: PickCmd, ctx: &Context, output: &Output) -> ExitCode {
    let mut client = ctx.cached_client();

    let Some(title) = client.catalog().and_then(|c| c.title(&cmd.id)) else {
        return output.error(format!("Title not found: {}", cmd.id), ExitCode::NotFound);
    };
    let Some(video) = find_video(title, cmd.season, cmd.episode) else {
        return output.error(
            format!("No video for season {:?} episode {:?}", cmd.season, cmd.episode),
            ExitCode::NotFound,
        );
    };
    let (season, episode) = (video.season, video.episode);

    if cmd.offline {
        let downloaded = video
            .download()
            .map(|c| ctx.downloads_dir().join(&c.filename).is_file())
            .unwrap_or(false);
        if downloaded {
            client.library_mut().mark_downloaded(&cmd.id, season, episode);
        }
    }

    // Re-borrow after the library may have changed
    let Some((title, video)) = client
        .catalog()
        .and_then(|c| c.title(&cmd.id))
        .and_then(|t| t.video_for(season, episode).map(|v| (t, v)))
    else {
        return output.error(format!("Title not found: {}", cmd.id), ExitCode::NotFound);
    };

    let container = match cmd.mode {
        PickMode::Stream => resolve_streaming_container(video, preference(&cmd, &ctx.config)),
        PickMode::Download => resolve_download_container(video),
        PickMode::Cast => resolve_cast_container(video),
    };
    let Some(container) = container else {
        let action = match cmd.mode {
            PickMode::Stream => "stream",
            PickMode::Download => "download",
            PickMode::Cast => "cast",
        };
        return output.error(
            format!("No file of {} can be used to {}", title.full_title(video), action),
            ExitCode::NotAvailable,
        );
    };

    let response = pick_response(title.full_title(video), cmd.mode, container, video);
    let line = format!("{}\t{}", container, container.url);
    if let Err(e) = output.print_lines(&[line], &response) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

fn find_video(title: &Title, season: Option<u32>, episode: Option<u32>) -> Option<&homevideo::Video> {
    match (season, episode) {
        (None, None) => title.single_video().or_else(|| title.first_video()),
        (None, Some(_)) if title.has_seasons() => title.video_for(Some(1), episode),
        _ => title.video_for(season, episode),
    }
}

fn preference(cmd: &PickCmd, config: &Config) -> StreamingPreference {
    if cmd.offline {
        return StreamingPreference::Offline;
    }
    StreamingPreference::from_settings(
        cmd.highest || config.stream_highest_quality,
        cmd.h264 || config.stream_h264,
        cmd.width.unwrap_or(config.display_width),
    )
}

fn pick_response(title: String, mode: PickMode, container: &Container, video: &homevideo::Video) -> PickResponse {
    PickResponse {
        title,
        mode,
        url: container.url.clone(),
        filename: container.filename.clone(),
        mimetype: container.mimetype.clone(),
        width: container.width,
        bitrate: container.bitrate,
        size: container.size,
        subtitles: video.subtitles.iter().map(|s| s.url.clone()).collect(),
    }
}

// =============================================================================
// Server Command
// =============================================================================

pub async fn server_cmd(_cmd: ServerCmd, ctx: &Context, output: &Output) -> ExitCode {
    let client = ctx.client();
    let record = client.server().record();

    let mut lines = vec![record.to_string()];
    if client.server().is_stale() {
        lines.push("Not bound on the current network".to_string());
    }

    if let Err(e) = output.print_lines(&lines, record) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

// =============================================================================
// Forget Command
// =============================================================================

pub async fn forget_cmd(_cmd: ForgetCmd, ctx: &Context, output: &Output) -> ExitCode {
    let mut client = ctx.client();
    match client.server_mut().forget() {
        Ok(()) => {
            output.info("Server forgotten");
            ExitCode::Success
        }
        Err(e) => output.error(format!("Failed to forget server: {}", e), ExitCode::Error),
    }
}

// =============================================================================
// Update Command
// =============================================================================

#[derive(Serialize)]
struct UpdateResponse {
    available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

pub async fn update_cmd(cmd: UpdateCmd, ctx: &Context, output: &Output) -> ExitCode {
    let mut client = ctx.client();

    let response = match client.server_mut().check_update(&cmd.package, cmd.current).await {
        Ok(Some(update)) => UpdateResponse {
            available: true,
            url: client.server().app_url(&update.filename),
            version: Some(update.version_name),
        },
        Ok(None) => UpdateResponse {
            available: false,
            version: None,
            url: None,
        },
        Err(e) => return output.error(format!("Update check failed: {}", e), sync_exit_code(&e)),
    };

    let line = match (&response.version, &response.url) {
        (Some(version), Some(url)) => format!("Version {} available at {}", version, url),
        _ => "No update available".to_string(),
    };
    if let Err(e) = output.print_lines(&[line], &response) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

#[cfg(test)]
mod tests {
    use super::*;
    use homevideo::Catalog;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    const SHOW: &str = r#"[{
        "id": "show",
        "title": "Show",
        "videos": [
            {"title": "Show", "season": 2, "episode": 1, "containers": []},
            {"title": "Show", "season": 1, "episode": 2, "containers": []},
            {"title": "Show", "season": 1, "episode": 1, "containers": []}
        ]
    }]"#;

    #[test]
    fn test_find_video_defaults_to_first_episode() {
        let catalog = Catalog::parse(SHOW.as_bytes()).unwrap();
        let title = catalog.title("show").unwrap();

        let video = find_video(title, None, None).unwrap();
        assert_eq!((video.season, video.episode), (Some(1), Some(1)));

        let video = find_video(title, None, Some(2)).unwrap();
        assert_eq!((video.season, video.episode), (Some(1), Some(2)));

        assert!(find_video(title, Some(3), Some(1)).is_none());
    }

    #[test]
    fn test_sync_exit_codes() {
        assert_eq!(
            sync_exit_code(&SyncError::Discovery(DiscoveryError::NoServerFound)),
            ExitCode::ServerNotFound
        );
        assert_eq!(sync_exit_code(&SyncError::Status(500)), ExitCode::NetworkError);
        assert_eq!(
            sync_exit_code(&SyncError::Discovery(DiscoveryError::Cancelled)),
            ExitCode::NeedsChoice
        );
    }

    /// Blocks its thread, then answers 0 if `ticked` was set meanwhile
    struct SlowChooser(Arc<AtomicBool>);

    impl ServerChooser for SlowChooser {
        fn choose(&self, _labels: &[String]) -> Option<usize> {
            std::thread::sleep(Duration::from_millis(300));
            self.0.load(Ordering::SeqCst).then_some(0)
        }
    }

    #[tokio::test]
    async fn test_chooser_runs_off_the_runtime() {
        let ticked = Arc::new(AtomicBool::new(false));
        let flag = ticked.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            flag.store(true, Ordering::SeqCst);
        });

        // Single-threaded runtime: the task above only runs if the chooser
        // does not hold the runtime thread
        let labels = vec!["den".to_string(), "attic".to_string()];
        assert_eq!(ask_chooser(Box::new(SlowChooser(ticked)), labels.clone()).await, Some(0));
        assert_eq!(ask_chooser(Box::new(IndexChooser(Some(1))), labels.clone()).await, Some(1));
        assert_eq!(ask_chooser(Box::new(IndexChooser(Some(5))), labels).await, None);
    }
}
