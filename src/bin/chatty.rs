//! chatty - Interactive chat client
//!
//! Connects to a chatty server, sends each line typed on stdin, and prints
//! every line the server sends.
//!
//! # Usage
//!
//! ```bash
//! chatty localhost 4000
//!
//! # Prefix received lines with the local time
//! chatty localhost 4000 --timestamps
//! ```
//!
//! Type `/nick <name>` to pick a nickname, `/dm <name> <message>` to send a
//! private message, and `/quit` to leave.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{stdin, stdout, BufReader};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use chatty_client::{ChatClient, ClientConfig};

/// chatty client - line-based chat
#[derive(Parser, Debug)]
#[command(name = "chatty", version, about)]
struct Args {
    /// Server hostname or IP address
    hostname: String,

    /// Server port
    port: u16,

    /// Prefix received lines with the local time
    #[arg(long)]
    timestamps: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so they never mix with chat output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("chatty_client=warn".parse()?),
        )
        .init();

    let config = ClientConfig {
        timestamps: args.timestamps,
        ..ClientConfig::new(args.hostname, args.port)
    };

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let result = runtime.block_on(run_client(config));

    // A blocked stdin read would otherwise keep the process alive
    runtime.shutdown_background();
    result
}

async fn run_client(config: ClientConfig) -> Result<()> {
    let client = ChatClient::connect(config).await?;

    let exit = client
        .run(BufReader::new(stdin()), stdout())
        .await
        .context("Connection to server failed")?;

    debug!(?exit, "Client finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_host_and_port() {
        assert!(Args::try_parse_from(["chatty"]).is_err());
        assert!(Args::try_parse_from(["chatty", "localhost"]).is_err());
        assert!(Args::try_parse_from(["chatty", "localhost", "port"]).is_err());
    }

    #[test]
    fn test_parses_arguments() {
        let args = Args::try_parse_from(["chatty", "localhost", "4000", "--timestamps"]).unwrap();
        assert_eq!(args.hostname, "localhost");
        assert_eq!(args.port, 4000);
        assert!(args.timestamps);
    }
}
