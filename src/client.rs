//! Client entry point and connection driver.
//!
//! [`PharosClient`] runs one operation per connection: connect, drive
//! the handshake and response stream through a [`QuerySession`], and
//! return the terminal [`PharosResult`]. No pooling and no reuse: the
//! connection and all transient state are scoped to the call.
//!
//! The driver adds two hardenings on top of the wire protocol: an
//! operation deadline (default 30 s) and cooperative cancellation via a
//! [`CancellationToken`]. Both resolve the operation as an `Error`
//! result with a dedicated code and drop the connection.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

use crate::command;
use crate::error::{PharosError, Result};
use crate::protocol::{codes, LineBuffer};
use crate::session::{PharosResult, QuerySession, Step};

/// Default operation deadline.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// Read buffer size for the driver loop.
const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Client for the Pharos directory protocol.
///
/// # Example
///
/// ```ignore
/// use pharos_client::PharosClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = PharosClient::new("127.0.0.1:1050", "mdb-web");
///     let result = client.query("hostname=node-01").await?;
///     println!("{result:?}");
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct PharosClient {
    addr: String,
    client_id: String,
    deadline: Duration,
    cancel: CancellationToken,
}

impl PharosClient {
    /// Create a client for the given server address and client
    /// identity string.
    pub fn new(addr: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            client_id: client_id.into(),
            deadline: DEFAULT_DEADLINE,
            cancel: CancellationToken::new(),
        }
    }

    /// Set the per-operation deadline.
    ///
    /// Expiry resolves the operation as an `Error` result with the
    /// timeout code and tears the connection down.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Attach a cancellation token observed between reads.
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run a query. Free text is auto-prefixed with the `query` verb;
    /// text already starting with a recognized verb is sent unmodified.
    pub async fn query(&self, text: &str) -> Result<PharosResult> {
        self.execute(text).await
    }

    /// Add a record built from structured fields. Values are quoted and
    /// escaped before interpolation into the command line.
    pub async fn add(&self, fields: &[(&str, &str)]) -> Result<PharosResult> {
        self.execute(&command::add_command(fields)).await
    }

    /// Change the records matched by `selections`, applying
    /// `modifications`. `force` applies the change regardless of how
    /// many records match.
    pub async fn change(
        &self,
        selections: &[(&str, &str)],
        modifications: &[(&str, &str)],
        force: bool,
    ) -> Result<PharosResult> {
        self.execute(&command::change_command(selections, modifications, force))
            .await
    }

    /// Delete the records matched by `selections`.
    pub async fn delete(&self, selections: &[(&str, &str)]) -> Result<PharosResult> {
        self.execute(&command::delete_command(selections)).await
    }

    async fn execute(&self, query: &str) -> Result<PharosResult> {
        tracing::debug!(addr = %self.addr, "connecting");
        let stream = TcpStream::connect(&self.addr).await?;
        let session = QuerySession::new(&self.client_id, query);

        // The session future owns the stream; on deadline expiry the
        // future is dropped and the connection torn down with it.
        let run = run_session(stream, session, self.cancel.clone());
        match tokio::time::timeout(self.deadline, run).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(addr = %self.addr, "operation deadline expired");
                Ok(PharosResult::Error {
                    code: codes::TIMEOUT,
                    message: "operation deadline expired".to_string(),
                })
            }
        }
    }
}

/// Execute a single query against `host:port` under the given client
/// identity. Convenience wrapper around [`PharosClient`] with default
/// deadline and no cancellation token.
pub async fn execute_query(
    client_id: &str,
    query: &str,
    host: &str,
    port: u16,
) -> Result<PharosResult> {
    PharosClient::new(format!("{host}:{port}"), client_id)
        .query(query)
        .await
}

/// Drive one session over an established stream: read chunks, frame
/// them into lines, and react to each line until the session resolves.
async fn run_session<S>(
    stream: S,
    mut session: QuerySession,
    cancel: CancellationToken,
) -> Result<PharosResult>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut reader, mut writer) = tokio::io::split(stream);
    let mut framer = LineBuffer::new();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let n = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("operation cancelled");
                return Ok(PharosResult::Error {
                    code: codes::CANCELLED,
                    message: "operation cancelled".to_string(),
                });
            }
            read = reader.read(&mut buf) => read?,
        };
        if n == 0 {
            return Err(PharosError::ConnectionClosed);
        }

        for line in framer.push(&buf[..n]) {
            tracing::trace!(line = line.as_str(), "received");
            session = match session.on_line(&line) {
                Step::Send(next, cmd) => {
                    tracing::trace!(command = cmd.as_str(), "sending");
                    writer.write_all(cmd.as_bytes()).await?;
                    writer.write_all(b"\r\n").await?;
                    writer.flush().await?;
                    next
                }
                Step::Read(next) => next,
                Step::Done(result) => {
                    // Courtesy close; the peer may already be gone.
                    let _ = writer.write_all(command::QUIT.as_bytes()).await;
                    let _ = writer.write_all(b"\r\n").await;
                    let _ = writer.flush().await;
                    return Ok(result);
                }
            };
        }
    }
}
