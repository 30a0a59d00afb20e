//! OpenTibia status query tool
//!
//! Usage: `otstatus <host> [port]`
//!
//! Prints the server's status snapshot as JSON, served from the cache when
//! it is fresh.

use std::env;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use otstatus::{OtServ, StatusConfig, VERSION};

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let (host, port) = parse_args(env::args().skip(1))?;

    let config = StatusConfig::load().await?;
    debug!(
        "Configuration loaded from: {}",
        config.config_path.display()
    );
    info!("otstatus v{} querying {}", VERSION, host);

    let mut server = OtServ::new(host, port, &config);
    let outcome = server.get().await;

    if let Some(err) = &outcome.error {
        warn!("Serving {:?} status after failure: {}", outcome.source, err);
    }

    let json = serde_json::to_string_pretty(&outcome.record)
        .context("Failed to serialize status")?;
    println!("{}", json);

    Ok(())
}

/// Parse `<host> [port]`
fn parse_args(mut args: impl Iterator<Item = String>) -> Result<(String, Option<u16>)> {
    let host = args
        .next()
        .context("usage: otstatus <host> [port]")?;
    let port = args
        .next()
        .map(|p| p.parse::<u16>())
        .transpose()
        .context("port must be a number between 1 and 65535")?;

    if port == Some(0) {
        anyhow::bail!("port must be a number between 1 and 65535");
    }
    if args.next().is_some() {
        anyhow::bail!("usage: otstatus <host> [port]");
    }

    Ok((host, port))
}

/// Initialize the logging/tracing system
fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,otstatus=debug"));

    // stdout carries the JSON snapshot
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();
}
