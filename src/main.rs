//! Triumph Tracker - Destiny 2 triumph browser and tracker
//!
//! Serves the triumph tree over HTTP, or searches a player from the command
//! line.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use triumph_tracker::{
    api::{Platform, PlayerQuery},
    config::TrackerConfig,
    server::{self, TriumphState},
    service::TriumphService,
    tracker::TrackerStore,
    triumphs::Hash,
};

#[derive(Parser)]
#[command(name = "triumph-tracker")]
#[command(author = "Triumph Tracker Team")]
#[command(version)]
#[command(about = "Browse and track Destiny 2 triumphs")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "TRIUMPH_TRACKER_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Search a player and print their triumph summary
    Search {
        /// Platform (xbox, psn, steam, blizzard, stadia, epic, all)
        #[arg(short, long, default_value = "all")]
        platform: Platform,

        /// Display name
        username: String,

        /// Print the full tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the distinct record state codes of a player
    States {
        /// Platform (xbox, psn, steam, blizzard, stadia, epic, all)
        #[arg(short, long, default_value = "all")]
        platform: Platform,

        /// Display name
        username: String,
    },

    /// Manage tracked triumphs
    Track {
        #[command(subcommand)]
        action: TrackAction,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[derive(Subcommand)]
enum TrackAction {
    /// Track a triumph by record hash
    Add { hash: Hash },
    /// Stop tracking a triumph
    Remove { hash: Hash },
    /// List tracked record hashes
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("triumph_tracker={},tower_http=debug", log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(cli.config)?;

    match cli.command {
        Commands::Serve { host, port } => {
            run_server(config, host, port).await?;
        }
        Commands::Search {
            platform,
            username,
            json,
        } => {
            run_search(&config, PlayerQuery { platform, username }, json).await?;
        }
        Commands::States { platform, username } => {
            run_states(&config, PlayerQuery { platform, username }).await?;
        }
        Commands::Track { action } => {
            run_track(&config, action).await?;
        }
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
    }

    Ok(())
}

/// Load the explicit config file, else the per-user one, else defaults
fn load_config(path: Option<PathBuf>) -> Result<TrackerConfig> {
    let path = path.or_else(|| {
        dirs_next::config_dir()
            .map(|dir| dir.join("triumph-tracker").join("config.toml"))
            .filter(|p| p.exists())
    });

    match path {
        Some(path) => {
            tracing::debug!("Loading configuration from {}", path.display());
            TrackerConfig::load(&path)
                .with_context(|| format!("failed to load {}", path.display()))
        }
        None => Ok(TrackerConfig::default()),
    }
}

async fn run_server(mut config: TrackerConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate()?;

    tracing::info!("Starting Triumph Tracker");
    let state = TriumphState {
        service: Arc::new(TriumphService::from_config(&config)?),
        tracker: Arc::new(TrackerStore::new(config.storage.tracker_file.clone()).await),
    };
    server::serve(&config.server, state).await?;
    Ok(())
}

async fn run_search(config: &TrackerConfig, query: PlayerQuery, json: bool) -> Result<()> {
    let service = TriumphService::from_config(config)?;
    let snapshot = service.build(query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&*snapshot.tree)?);
        return Ok(());
    }

    let summary = snapshot.summary();
    println!(
        "{} ({}:{})",
        summary.player.display_name, summary.player.membership_type, summary.player.membership_id
    );
    if let Some(version) = &summary.manifest_version {
        println!("Manifest {}", version);
    }
    println!(
        "{} triumphs, score {}\n",
        summary.triumph_count, summary.earned_score
    );
    for category in &summary.categories {
        println!(
            "  {:<32} {:>5}/{:<5}",
            category.name, category.completed, category.total
        );
    }

    if summary.failure_count > 0 {
        println!("\n{} build failures:", summary.failure_count);
        for failure in &snapshot.tree.failures {
            println!("  - {}", failure);
        }
    }
    Ok(())
}

async fn run_states(config: &TrackerConfig, query: PlayerQuery) -> Result<()> {
    let service = TriumphService::from_config(config)?;
    let states = service.survey(&query).await?;
    for state in states.values() {
        println!("{}", state);
    }
    Ok(())
}

async fn run_track(config: &TrackerConfig, action: TrackAction) -> Result<()> {
    let store = TrackerStore::new(config.storage.tracker_file.clone()).await;
    match action {
        TrackAction::Add { hash } => {
            if store.track(hash).await? {
                println!("Tracking {}", hash);
            } else {
                println!("{} is already tracked", hash);
            }
        }
        TrackAction::Remove { hash } => {
            if store.untrack(hash).await? {
                println!("Stopped tracking {}", hash);
            } else {
                println!("{} was not tracked", hash);
            }
        }
        TrackAction::List => {
            let hashes = store.list().await;
            if hashes.is_empty() {
                println!("No tracked triumphs ({})", store.path().display());
            }
            for hash in hashes {
                println!("{}", hash);
            }
        }
    }
    Ok(())
}

fn show_config(config: Option<&TrackerConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    let toml = toml::to_string_pretty(&config)?;
    println!("{}", toml);
    Ok(())
}
