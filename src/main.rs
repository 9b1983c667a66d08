//! # Blockfields - Block Field Session Runner
//!
//! Replays a scripted editing session against a media field and any
//! number of rich-text fields, then prints the block's attributes.
//!
//! ## Quick Start
//!
//! ```bash
//! # Replay a session
//! cargo run -- session.toml
//!
//! # Store uploads somewhere else and show the rendered media field
//! cargo run -- session.toml --media-dir /tmp/uploads --view
//! ```

mod session;
mod uploads;

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blockfields_core::Config;

use crate::session::{Session, SessionRunner};
use crate::uploads::DirectoryUploadService;

/// Blockfields - replay editing sessions against block fields
#[derive(Parser, Debug)]
#[command(name = "blockfields")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Session file to replay
    #[arg(value_name = "SESSION")]
    session: PathBuf,

    /// Config file (defaults to the user config)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory that receives uploaded files
    #[arg(short, long, value_name = "DIR", default_value = "media")]
    media_dir: PathBuf,

    /// Also print the rendered field views
    #[arg(long)]
    view: bool,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    tracing::info!("Starting Blockfields v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("cannot load config {}", path.display()))?,
        None => Config::load(),
    };

    let session = Session::load(&args.session)?;
    tracing::info!(
        "Replaying {} steps from {}",
        session.steps.len(),
        args.session.display()
    );

    let runner = SessionRunner::new(
        Arc::new(config),
        Arc::new(DirectoryUploadService::new(args.media_dir)),
    );
    let mut report = runner.run(session).await?;

    if !args.view {
        report.media = None;
    }
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
