//! Server connection client for the chat line client.
//!
//! This module provides the `ChatClient` which handles:
//! - Connecting to the server over TCP
//! - Relaying input lines to the server
//! - Printing every line the server sends
//! - Ending on `/quit`, end of input, or server close
//!
//! **Panic-Free Policy:** This module follows the project's panic-free guidelines.
//! No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, or `todo!()`.

use chrono::Local;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{debug, info};

use chatty_protocol::Command;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Printed once the connection is up.
pub const CONNECTED_BANNER: &str = "Connected to ChattyChatChat Server";

/// Printed when the server closes the connection.
pub const DISCONNECTED_NOTICE: &str = "Disconnected from server.";

/// Longest server line the client accepts.
const MAX_SERVER_LINE_LENGTH: usize = 64 * 1024;

/// Why [`ChatClient::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The user typed `/quit`.
    Quit,

    /// Input reached end of stream.
    InputClosed,

    /// The server closed the connection.
    ServerClosed,
}

// ============================================================================
// Chat Client
// ============================================================================

/// A connected chat client.
///
/// # Example
///
/// ```rust,ignore
/// use chatty_client::{ChatClient, ClientConfig};
/// use tokio::io::{stdin, stdout, BufReader};
///
/// let client = ChatClient::connect(ClientConfig::new("localhost", 4000)).await?;
/// client.run(BufReader::new(stdin()), stdout()).await?;
/// ```
pub struct ChatClient {
    stream: TcpStream,
    config: ClientConfig,
}

impl ChatClient {
    /// Connects to the server named in `config`.
    ///
    /// # Errors
    ///
    /// - `ClientError::ConnectTimeout` if the connection takes longer than
    ///   `config.connect_timeout`
    /// - `ClientError::Connect` if the host cannot be resolved or reached
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let addr = config.address();

        let stream = timeout(
            config.connect_timeout,
            TcpStream::connect((config.host.as_str(), config.port)),
        )
        .await
        .map_err(|_| ClientError::ConnectTimeout {
            addr: addr.clone(),
            timeout: config.connect_timeout,
        })?
        .map_err(|source| ClientError::Connect {
            addr: addr.clone(),
            source,
        })?;

        info!(server = %addr, "Connected");
        Ok(Self { stream, config })
    }

    /// Relays `input` lines to the server and server lines to `output`
    /// until the user quits, input ends, or the server hangs up.
    ///
    /// Input lines are trimmed; blank ones are not sent. After `/quit`,
    /// server lines (the farewell) keep being printed until the server
    /// closes or `quit_grace` runs out.
    ///
    /// # Errors
    ///
    /// - `ClientError::Io` if reading input, writing output, or the socket fails
    /// - `ClientError::Codec` if the server sends an undecodable line
    pub async fn run<I, O>(self, input: I, output: O) -> Result<Exit>
    where
        I: AsyncBufRead + Unpin,
        O: AsyncWrite + Unpin,
    {
        let ChatClient { stream, config } = self;
        let (read_half, write_half) = stream.into_split();

        let mut server = FramedRead::new(
            read_half,
            LinesCodec::new_with_max_length(MAX_SERVER_LINE_LENGTH),
        );
        let mut sink = FramedWrite::new(write_half, LinesCodec::new());
        let mut input = input.lines();
        let mut printer = Printer::new(output, config.timestamps);

        printer.print(CONNECTED_BANNER).await?;

        loop {
            tokio::select! {
                line = server.next() => match line {
                    Some(line) => printer.print(&line?).await?,
                    None => {
                        debug!("Server closed the connection");
                        printer.print(DISCONNECTED_NOTICE).await?;
                        return Ok(Exit::ServerClosed);
                    }
                },

                line = input.next_line() => match line? {
                    Some(line) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }

                        sink.send(line).await?;

                        if Command::parse(line).is_some_and(|command| command.is_quit()) {
                            debug!("Quit sent, waiting for the server to close");
                            drain_after_quit(&mut server, &mut printer, &config).await?;
                            return Ok(Exit::Quit);
                        }
                    }
                    None => {
                        debug!("Input closed");
                        return Ok(Exit::InputClosed);
                    }
                },
            }
        }
    }
}

/// Prints what the server still sends after `/quit`, for at most `quit_grace`.
async fn drain_after_quit<O>(
    server: &mut FramedRead<OwnedReadHalf, LinesCodec>,
    printer: &mut Printer<O>,
    config: &ClientConfig,
) -> Result<()>
where
    O: AsyncWrite + Unpin,
{
    let drain = async {
        while let Some(line) = server.next().await {
            printer.print(&line?).await?;
        }
        Ok::<(), ClientError>(())
    };

    match timeout(config.quit_grace, drain).await {
        Ok(result) => result,
        Err(_) => {
            debug!(grace = ?config.quit_grace, "Server did not close after quit");
            Ok(())
        }
    }
}

// ============================================================================
// Output
// ============================================================================

/// Writes whole lines to the output, optionally time-stamped.
struct Printer<O> {
    output: O,
    timestamps: bool,
}

impl<O: AsyncWrite + Unpin> Printer<O> {
    fn new(output: O, timestamps: bool) -> Self {
        Self { output, timestamps }
    }

    async fn print(&mut self, line: &str) -> std::io::Result<()> {
        let text = if self.timestamps {
            format!("[{}] {line}\n", Local::now().format("%H:%M:%S"))
        } else {
            format!("{line}\n")
        };

        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await
    }
}
