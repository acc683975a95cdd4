// ABOUTME: Entry point for the portico binary.
// ABOUTME: Loads .env and config, parses CLI overrides, initializes tracing, and serves.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use portico_core::TracingLog;
use portico_server::{LogFormat, ServerConfig, create_router};
use tracing_subscriber::EnvFilter;

/// Session-gated HTTP service bootstrap.
#[derive(Debug, Parser)]
#[command(name = "portico", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (the default).
    Serve {
        /// Address to listen on; overrides PORTICO_BIND.
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// pretty, compact or json; overrides PORTICO_LOG_FORMAT.
        #[arg(long)]
        log_format: Option<LogFormat>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = ServerConfig::from_env()?;

    if let Some(Command::Serve { bind, log_format }) = cli.command {
        if let Some(bind) = bind {
            config.bind = bind;
        }
        if let Some(format) = log_format {
            config.log_format = format;
        }
    }

    init_tracing(config.log_format, &config.log_filter);
    tracing::info!(bind = %config.bind, format = %config.log_format, "portico starting up");

    let router = create_router(Arc::new(TracingLog));
    portico_server::serve(&config, router).await?;

    tracing::info!("portico stopped");
    Ok(())
}

fn init_tracing(format: LogFormat, default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }
}
