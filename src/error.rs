//! Error types for pharos-client.

use thiserror::Error;

/// Main error type for all client operations.
///
/// Only transport-level failures surface here. Protocol-level outcomes
/// (identity rejections, server error codes, empty result sets) are
/// reported as [`PharosResult`](crate::PharosResult) variants, never as
/// errors; callers must inspect the result tag.
#[derive(Debug, Error)]
pub enum PharosError {
    /// I/O error during connect, read, or write.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Peer closed the connection before sending a terminal line.
    #[error("Connection closed before the response completed")]
    ConnectionClosed,
}

/// Result type alias using PharosError.
pub type Result<T> = std::result::Result<T, PharosError>;
