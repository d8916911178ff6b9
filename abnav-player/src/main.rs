//! Audiobook navigator player (abnav-player) - Main entry point
//!
//! Inspects audiobook manifests and plays their reading order through the
//! navigator on a simulated clock.
//!
//! **Usage:**
//! ```bash
//! abnav-player info <MANIFEST>
//! abnav-player play <MANIFEST> [--href <HREF>] [--time <SECONDS>] [--json]
//! ```

use std::path::{Path, PathBuf};

use abnav_common::config::{load_config, TomlConfig};
use abnav_common::human_time::{format_playback_time, format_playback_time_opt};
use abnav_common::{Locator, NavigatorEvent, Publication};
use abnav_player::session::{PlaybackSession, SessionOptions};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for abnav-player
#[derive(Parser, Debug)]
#[command(name = "abnav-player")]
#[command(about = "Audiobook reading-order player")]
#[command(version)]
struct Args {
    /// Config file (overrides ABNAV_CONFIG and the per-user config)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show a publication's reading order
    Info {
        /// Path to the manifest JSON
        manifest: PathBuf,
    },

    /// Play a publication on a simulated clock
    Play {
        /// Path to the manifest JSON
        manifest: PathBuf,

        /// Reading-order href to start at (defaults to the first entry)
        #[arg(long)]
        href: Option<String>,

        /// Start position in seconds within the starting resource
        #[arg(long, value_name = "SECONDS")]
        time: Option<f64>,

        /// Volume, 0.0 to 1.0
        #[arg(long)]
        volume: Option<f64>,

        /// Playback rate
        #[arg(long)]
        rate: Option<f64>,

        /// Simulation clock multiplier
        #[arg(long)]
        speedup: Option<f64>,

        /// Print notifications as JSON lines
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config);

    match args.command {
        Command::Info { manifest } => show_info(&manifest),
        Command::Play {
            manifest,
            href,
            time,
            volume,
            rate,
            speedup,
            json,
        } => {
            let publication = load_publication(&manifest)?;
            let initial_location = initial_location(&publication, href.as_deref(), time)?;

            let mut options = SessionOptions::from(&config.playback);
            options.volume = volume.unwrap_or(options.volume);
            options.rate = rate.unwrap_or(options.rate);
            options.speedup = speedup.unwrap_or(options.speedup);

            play(publication, initial_location, options, json).await
        }
    }
}

/// Initialize tracing from RUST_LOG, else the configured level
fn init_tracing(config: &TomlConfig) {
    let level = &config.logging.level;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("abnav_player={},abnav_common={}", level, level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_publication(manifest: &Path) -> Result<Publication> {
    Publication::load(manifest)
        .with_context(|| format!("Failed to load manifest {}", manifest.display()))
}

fn initial_location(
    publication: &Publication,
    href: Option<&str>,
    time: Option<f64>,
) -> Result<Option<Locator>> {
    let link = match href {
        Some(href) => match publication.index_of_href(href) {
            Some(index) => &publication.reading_order[index],
            None => bail!("'{}' is not in the reading order", href),
        },
        None if time.is_some() => match publication.reading_order.first() {
            Some(link) => link,
            None => bail!("Reading order is empty"),
        },
        None => return Ok(None),
    };

    let locator = Locator::from_link(link);
    Ok(Some(match time {
        Some(time) if time < 0.0 || !time.is_finite() => bail!("Invalid start time {}", time),
        Some(time) => locator.with_time(time),
        None => locator,
    }))
}

fn show_info(manifest: &Path) -> Result<()> {
    let publication = load_publication(manifest)?;
    let total = publication.total_duration();
    let typical_max = total.unwrap_or(0.0);

    println!("{}", publication.metadata.title);
    if let Some(identifier) = &publication.metadata.identifier {
        println!("  Identifier: {}", identifier);
    }
    if let Some(base_url) = publication.base_url() {
        println!("  Base URL:   {}", base_url);
    }
    println!("  Duration:   {}", format_playback_time_opt(total));
    println!("  Reading order ({} resources):", publication.reading_order.len());

    for (index, link) in publication.reading_order.iter().enumerate() {
        let duration = link
            .duration
            .map(|d| format_playback_time(d, typical_max.max(d)))
            .unwrap_or_else(|| format_playback_time_opt(None));
        match &link.title {
            Some(title) => println!("  {:>3}. {:>8}  {}  ({})", index, duration, title, link.href),
            None => println!("  {:>3}. {:>8}  {}", index, duration, link.href),
        }
    }
    Ok(())
}

async fn play(
    publication: Publication,
    initial_location: Option<Locator>,
    options: SessionOptions,
    json: bool,
) -> Result<()> {
    info!(
        "Playing '{}' ({} resources, speedup {}x)",
        publication.metadata.title,
        publication.reading_order.len(),
        options.speedup
    );

    let mut session = PlaybackSession::new(publication, initial_location, options)
        .context("Failed to start playback session")?;

    session
        .run_until(shutdown_signal(), |event| {
            if json {
                print_json_line(event);
            }
        })
        .await
        .context("Playback failed")?;

    if session.is_finished() {
        info!("Finished playback");
    }
    Ok(())
}

fn print_json_line(event: &NavigatorEvent) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{}", line),
        Err(e) => tracing::error!("Failed to encode {} event: {}", event.event_type(), e),
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, stopping playback");
        },
        _ = terminate => {
            info!("Received terminate signal, stopping playback");
        },
    }
}
