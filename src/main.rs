//! # catalog-worker
//!
//! Runs catalog workers against an MPD server from the command line.
//!
//! ## Usage
//!
//! ```bash
//! # Build the album cache and list one line per album
//! catalog-worker albums --host localhost --port 6600
//!
//! # Same, as JSON
//! catalog-worker albums --json
//!
//! # Show the configuration read from the environment
//! catalog-worker config
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_worker::commands::{albums::AlbumsCommand, config::ConfigCommand};
use catalog_worker::config::SharedState;

/// catalog-worker - background catalog workers for MPD
#[derive(Parser)]
#[command(
    name = "catalog-worker",
    about = "Background catalog workers for a music-server client",
    long_about = "Runs detached workers against an MPD server, such as building a deduplicated album cache.",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Build the album cache in a background worker and print it
    Albums {
        /// MPD host, overrides MPD_HOST
        #[arg(long, short = 'H', env = "MPD_HOST")]
        host: Option<String>,
        /// MPD port, defaults to MPD_PORT or 6600
        #[arg(long, short = 'p')]
        port: Option<u16>,
        /// Seconds to wait for the worker
        #[arg(long, short = 't', default_value_t = 300)]
        timeout: u64,
        /// Print albums as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as JSON
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catalog_worker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut state = SharedState::from_env();

    let result = match cli.command {
        Commands::Albums {
            host,
            port,
            timeout,
            json,
        } => {
            if let Some(host) = host {
                state.mpd.host = host;
            }
            if let Some(port) = port {
                state.mpd.port = port;
            }
            info!(
                "Starting albums command for {}, timeout: {}s",
                state.mpd.address(),
                timeout
            );
            AlbumsCommand::new(state, Duration::from_secs(timeout), json)
                .execute()
                .await
        }
        Commands::Config => ConfigCommand::new(state).execute(),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
