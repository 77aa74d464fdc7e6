//! MISPForge
//!
//! Search a MISP instance for events and attributes from the command line.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mispforge::cli::{self, Command};
use mispforge::{ConfigOverrides, Connection, MispConfig};

/// MISPForge
#[derive(Parser, Debug)]
#[command(name = "mispforge")]
#[command(about = "Search MISP events and attributes")]
struct Args {
    /// JSON configuration file (protocol, host, api-key)
    #[arg(long, env = "MISP_CONFIG")]
    config: Option<PathBuf>,

    /// http or https
    #[arg(long, env = "MISP_PROTOCOL")]
    protocol: Option<String>,

    /// MISP host, optionally with port and path prefix
    #[arg(long, env = "MISP_HOST")]
    host: Option<String>,

    /// MISP API key
    #[arg(long, env = "MISP_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Skip TLS certificate verification (insecure)
    #[arg(long, env = "MISP_INSECURE")]
    insecure: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Logs go to stderr, results to stdout
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mispforge=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if args.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let overrides = ConfigOverrides {
        protocol: args.protocol,
        host: args.host,
        api_key: args.api_key,
        insecure: args.insecure,
    };
    let config = MispConfig::resolve(args.config.as_deref(), overrides)
        .context("Failed to load MISP configuration")?;

    if config.insecure {
        tracing::warn!(host = %config.host, "TLS certificate verification disabled");
    }
    let connection =
        Connection::from_config(&config).context("Failed to create MISP connection")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let written = cli::run(&connection, args.command, &mut out).await?;
    out.flush()?;

    tracing::info!(results = written, "Done");
    Ok(())
}
