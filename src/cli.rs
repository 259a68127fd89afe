//! CLI - Command Line Interface for homevideo
//!
//! Every action is scriptable. All output is JSON-parseable.
//!
//! # Examples
//!
//! ```bash
//! # Find servers and bind one
//! homevideo discover --choose 0
//!
//! # Refresh the catalog and list titles
//! homevideo sync
//! homevideo titles --json
//!
//! # Which file to play, download or cast
//! homevideo pick breaking-bad -s 1 -e 3 --mode cast
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Network error
    NetworkError = 3,
    /// No server answered discovery
    ServerNotFound = 4,
    /// No container qualifies for the requested action
    NotAvailable = 5,
    /// Several servers answered and none was chosen
    NeedsChoice = 6,
    /// Title or video not in the catalog
    NotFound = 7,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// homevideo - client for a home video server
#[derive(Parser, Debug)]
#[command(
    name = "homevideo",
    version,
    about = "Client for a home video server",
    long_about = "Finds a video server on the local network, keeps its catalog \
                  cached, and picks the right file to stream, download or cast.",
    after_help = "EXAMPLES:\n\
                  homevideo discover                  Find and bind a server\n\
                  homevideo sync                      Refresh the catalog\n\
                  homevideo titles --json             List titles\n\
                  homevideo pick matrix --mode cast   Container to cast"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// More log output (repeat for trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Server to bind when discovery finds several (index in the listed order)
    #[arg(long, global = true)]
    pub choose: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }

    /// Default log filter for the verbosity level
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "homevideo=info",
            1 => "homevideo=debug",
            _ => "homevideo=trace",
        }
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Find servers on the local network and bind one
    #[command(visible_alias = "d")]
    Discover(DiscoverCmd),

    /// Bring the cached catalog up to date
    Sync(SyncCmd),

    /// List titles in the cached catalog
    #[command(visible_alias = "ls")]
    Titles(TitlesCmd),

    /// Show a title with its videos and containers
    Show(ShowCmd),

    /// Choose the container to stream, download or cast
    Pick(PickCmd),

    /// Show the bound server
    Server(ServerCmd),

    /// Forget the bound server and cached catalog
    Forget(ForgetCmd),

    /// Check the server for a newer client build
    Update(UpdateCmd),
}

/// Discover servers on the local network
#[derive(Args, Debug)]
pub struct DiscoverCmd {
    /// Only list servers, do not bind
    #[arg(long)]
    pub list: bool,
}

/// Sync the catalog with the bound server
#[derive(Args, Debug)]
pub struct SyncCmd {
    /// Ignore the cached ETag and fetch the full catalog
    #[arg(long, short = 'f')]
    pub force: bool,
}

/// List titles
#[derive(Args, Debug)]
pub struct TitlesCmd {
    /// Only titles whose name contains this text
    #[arg(long, short = 'f')]
    pub filter: Option<String>,

    /// Maximum number of results
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,
}

impl TitlesCmd {
    pub fn matches(&self, title: &str) -> bool {
        self.filter
            .as_ref()
            .map(|f| title.to_lowercase().contains(&f.to_lowercase()))
            .unwrap_or(true)
    }
}

/// Show one title
#[derive(Args, Debug)]
pub struct ShowCmd {
    /// Title id
    #[arg(required = true)]
    pub id: String,
}

/// What the picked container is for
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickMode {
    /// Play now on this device
    #[default]
    Stream,
    /// Store on this device
    Download,
    /// Play on a cast receiver
    Cast,
}

/// Pick a container
#[derive(Args, Debug)]
pub struct PickCmd {
    /// Title id
    #[arg(required = true)]
    pub id: String,

    /// Season number (for TV shows)
    #[arg(long, short = 's')]
    pub season: Option<u32>,

    /// Episode or part number
    #[arg(long, short = 'e')]
    pub episode: Option<u32>,

    /// Consumption mode
    #[arg(long, short = 'm', value_enum, default_value = "stream")]
    pub mode: PickMode,

    /// Display width in pixels (overrides config)
    #[arg(long, short = 'w')]
    pub width: Option<u32>,

    /// Stream the highest quality regardless of bandwidth
    #[arg(long)]
    pub highest: bool,

    /// Prefer H.264 containers that play everywhere
    #[arg(long)]
    pub h264: bool,

    /// Only play a downloaded copy
    #[arg(long)]
    pub offline: bool,
}

/// Show the bound server
#[derive(Args, Debug)]
pub struct ServerCmd {}

/// Forget the bound server
#[derive(Args, Debug)]
pub struct ForgetCmd {}

/// Check for a client update
#[derive(Args, Debug)]
pub struct UpdateCmd {
    /// Package name the server publishes updates for
    #[arg(long, default_value = "com.hudren.homevideo")]
    pub package: String,

    /// Version code of the running client
    #[arg(long, default_value = "0")]
    pub current: u32,
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

/// Picked container response
#[derive(Debug, Serialize)]
pub struct PickResponse {
    pub title: String,
    pub mode: PickMode,
    pub url: String,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    pub width: u32,
    pub bitrate: u64,
    pub size: u64,
    pub subtitles: Vec<String>,
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Ok(())
    }

    /// Print plain lines, or `data` as JSON in JSON mode
    pub fn print_lines<T: Serialize>(&self, lines: &[String], data: T) -> anyhow::Result<()> {
        if self.json {
            self.print(data)
        } else {
            for line in lines {
                println!("{}", line);
            }
            Ok(())
        }
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["homevideo", "--json", "--quiet", "--choose", "1", "-vv", "sync"]);
        assert!(cli.json);
        assert!(cli.quiet);
        assert_eq!(cli.choose, Some(1));
        assert_eq!(cli.log_filter(), "homevideo=trace");
        assert!(matches!(cli.command, Command::Sync(_)));
    }

    #[test]
    fn test_pick_with_options() {
        let cli = Cli::parse_from([
            "homevideo", "pick", "show", "-s", "1", "-e", "3", "--mode", "cast", "-w", "1280",
        ]);
        if let Command::Pick(cmd) = cli.command {
            assert_eq!(cmd.id, "show");
            assert_eq!(cmd.season, Some(1));
            assert_eq!(cmd.episode, Some(3));
            assert_eq!(cmd.mode, PickMode::Cast);
            assert_eq!(cmd.width, Some(1280));
            assert!(!cmd.highest);
        } else {
            panic!("Expected Pick command");
        }
    }

    #[test]
    fn test_pick_defaults_to_stream() {
        let cli = Cli::parse_from(["homevideo", "pick", "movie"]);
        if let Command::Pick(cmd) = cli.command {
            assert_eq!(cmd.mode, PickMode::Stream);
            assert_eq!(cmd.season, None);
        } else {
            panic!("Expected Pick command");
        }
    }

    #[test]
    fn test_titles_filter() {
        let cmd = TitlesCmd {
            filter: Some("matrix".to_string()),
            limit: None,
        };
        assert!(cmd.matches("The Matrix"));
        assert!(!cmd.matches("Alien"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::NetworkError), 3);
        assert_eq!(i32::from(ExitCode::ServerNotFound), 4);
        assert_eq!(i32::from(ExitCode::NotAvailable), 5);
        assert_eq!(i32::from(ExitCode::NeedsChoice), 6);
    }
}
