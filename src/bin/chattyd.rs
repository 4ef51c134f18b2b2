//! chatty Daemon - Chat relay server
//!
//! Accepts line-oriented chat clients on a TCP port, tracks their
//! nicknames, and relays chat lines, direct messages and join/leave notices.
//!
//! # Usage
//!
//! ```bash
//! # Listen on every interface, port 4000
//! chattyd 4000
//!
//! # Loopback only, at most 10 clients
//! chattyd 4000 --host 127.0.0.1 --max-clients 10
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use chattyd::config::{ServerConfig, DEFAULT_MAX_LINE_LENGTH};
use chattyd::registry::{spawn_registry, MAX_SESSIONS};
use chattyd::server::ChatServer;

/// chatty server - line-based chat relay
#[derive(Parser, Debug)]
#[command(name = "chattyd", version, about)]
struct Args {
    /// TCP port to listen on
    port: u16,

    /// Address to bind
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    host: IpAddr,

    /// Maximum number of concurrently connected clients
    #[arg(long, default_value_t = MAX_SESSIONS)]
    max_clients: usize,

    /// Longest accepted input line, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_LINE_LENGTH)]
    max_line_length: usize,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            max_clients: self.max_clients,
            max_line_length: self.max_line_length,
            ..ServerConfig::new(SocketAddr::new(self.host, self.port))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("chattyd=info".parse()?)
                .add_directive("chatty_core=info".parse()?)
                .add_directive("chatty_protocol=info".parse()?),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        "chatty server starting"
    );

    let config = args.into_config();
    let cancel_token = CancellationToken::new();

    let registry = spawn_registry(config.max_clients);
    info!("Nickname registry started");

    let bind_addr = config.bind_addr;
    let server = ChatServer::bind(config, registry, cancel_token.clone())
        .await
        .with_context(|| format!("Failed to start server on {bind_addr}"))?;

    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!(error = %e, "Error waiting for shutdown signal");
        }
        info!("Shutdown signal received");
        shutdown_token.cancel();
    });

    server.run().await;

    info!("chatty server stopped");
    Ok(())
}

async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}
