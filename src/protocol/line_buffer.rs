//! Line buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` for buffer management. Incoming chunks of
//! arbitrary size (including zero-length and multi-line chunks) are
//! appended to a residual buffer; complete lines are extracted as soon
//! as their `\n` terminator has been observed. A single trailing `\r`
//! is stripped from each line. Any unterminated tail stays buffered
//! for the next push.
//!
//! Framing never fails on its own: an unterminated final fragment at
//! stream end is simply never emitted; the peer always signals
//! completion with a terminal line before closing.
//!
//! # Example
//!
//! ```
//! use pharos_client::protocol::LineBuffer;
//!
//! let mut buffer = LineBuffer::new();
//! assert!(buffer.push(b"200:Data").is_empty());
//! assert_eq!(buffer.push(b"base ready\r\n"), vec!["200:Database ready"]);
//! ```

use bytes::BytesMut;

/// Buffer for accumulating incoming bytes and extracting complete lines.
///
/// Lines are emitted in byte order exactly once; no data is lost across
/// chunk boundaries.
#[derive(Debug, Default)]
pub struct LineBuffer {
    /// Accumulated bytes from socket reads.
    buffer: BytesMut,
}

impl LineBuffer {
    /// Create a new, empty line buffer.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4 * 1024),
        }
    }

    /// Push data into the buffer and extract all complete lines.
    ///
    /// This is the main API for processing incoming data from the
    /// socket. Returns the decoded lines, terminators stripped. If data
    /// is fragmented, the partial line is buffered for the next push.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            // Consume the line and its terminator.
            let mut raw = self.buffer.split_to(pos + 1);
            raw.truncate(pos);
            if raw.last() == Some(&b'\r') {
                raw.truncate(raw.len() - 1);
            }
            lines.push(String::from_utf8_lossy(&raw).into_owned());
        }
        lines
    }

    /// Number of buffered bytes not yet forming a complete line.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer holds no partial line.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
