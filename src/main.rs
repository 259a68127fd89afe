//! homevideo - command line client for a home video server
//!
//! Finds the server on the local network, keeps the catalog cached, and picks
//! the file to stream, download or cast.
//!
//! # Usage
//!
//! ```bash
//! homevideo sync
//! homevideo titles
//! homevideo pick the-matrix --mode stream --width 1280
//! ```

mod commands;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use homevideo::cli::{Cli, Command, ExitCode, Output};
use homevideo::config::Config;

use crate::commands::Context;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| cli.log_filter().into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    run_cli(cli).await.into()
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli) -> ExitCode {
    let output = Output::new(&cli);

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    let ctx = match Context::new(config, cli.choose) {
        Ok(ctx) => ctx,
        Err(e) => return output.error(format!("No data directory: {}", e), ExitCode::Error),
    };

    match cli.command {
        Command::Discover(cmd) => commands::discover_cmd(cmd, &ctx, &output).await,
        Command::Sync(cmd) => commands::sync_cmd(cmd, &ctx, &output).await,
        Command::Titles(cmd) => commands::titles_cmd(cmd, &ctx, &output).await,
        Command::Show(cmd) => commands::show_cmd(cmd, &ctx, &output).await,
        Command::Pick(cmd) => commands::pick_cmd(cmd, &ctx, &output).await,
        Command::Server(cmd) => commands::server_cmd(cmd, &ctx, &output).await,
        Command::Forget(cmd) => commands::forget_cmd(cmd, &ctx, &output).await,
        Command::Update(cmd) => commands::update_cmd(cmd, &ctx, &output).await,
    }
}
