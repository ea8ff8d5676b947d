//! ws-manager CLI Entry Point

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::{interval, timeout};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use ws_manager::cli::config::{Config, LoggingConfig};
use ws_manager::cli::feed;
use ws_manager::{ConnectionRegistry, ReadyState, TungsteniteConnector};

/// How often `watch` checks whether the server went away
const STATE_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// How long `watch` waits for the socket to finish closing after Ctrl-C
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "ws-manager")]
#[command(author, version, about = "Open one WebSocket connection and print what arrives")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "WS_MANAGER_CONFIG")]
    config: Option<PathBuf>,

    /// WebSocket URL, overrides the configured one
    #[arg(short, long)]
    url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect and print every inbound message until Ctrl-C
    Watch,
    /// Print the effective configuration
    Config,
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_or_default(cli.config.as_deref())?.with_url(cli.url.clone());
    init_logging(&config.logging, cli.verbose)?;

    match cli.command {
        Commands::Watch => {
            watch(&config).await?;
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
        Commands::Version => {
            println!("ws-manager {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn init_logging(logging: &LoggingConfig, verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = match logging.format.as_str() {
        "json" => builder.json().try_init(),
        "compact" => builder.compact().try_init(),
        _ => builder.pretty().try_init(),
    };

    result.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

async fn watch(config: &Config) -> Result<()> {
    let connector =
        TungsteniteConnector::new().with_connect_timeout(config.connection.connect_timeout());
    let registry = ConnectionRegistry::new(connector);

    let handle = registry
        .get_or_create(&config.connection.url)
        .context("Failed to open connection")?;
    info!(connection_id = %handle.id(), url = %handle.url(), "Watching for messages");

    handle.on_message(|payload| {
        debug!(bytes = payload.len(), text = payload.is_text(), "Message received");
        println!("{}", feed::describe(&payload));
    });

    let mut ticker = interval(STATE_POLL_INTERVAL);
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                info!("Interrupted, closing connection");
                handle.close();
                break;
            }
            _ = ticker.tick() => {
                if handle.ready_state() == ReadyState::Closed {
                    if let Some(reason) = handle.connect_failure() {
                        bail!("Failed to connect to {}: {}", handle.url(), reason);
                    }
                    info!("Connection closed");
                    return Ok(());
                }
            }
        }
    }

    let closed = timeout(SHUTDOWN_GRACE, async {
        while handle.ready_state() != ReadyState::Closed {
            tokio::time::sleep(STATE_POLL_INTERVAL).await;
        }
    })
    .await;
    if closed.is_err() {
        warn!("Connection did not finish closing in time");
    }

    Ok(())
}
