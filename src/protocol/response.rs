//! Response line classification.
//!
//! A server response line is a numeric status code (possibly negative)
//! followed by one or more colon-separated segments:
//!
//! ```text
//! 102:There were 2 matches to your request.
//! -200:1:hostname:node-01
//! 200:Ok
//! 404:QUERY:Record not found
//! ```
//!
//! [`classify`] turns one decoded line into a [`ResponseLine`], or
//! `None` for a line that does not carry the minimum structure. Skipped
//! lines are deliberately not surfaced as errors: unrecognized chatter
//! is ignored and processing continues.

/// Status codes used by the wire protocol, plus the client-side codes
/// reported for locally-triggered terminations.
pub mod codes {
    /// Handshake acceptance and terminal success.
    pub const OK: i32 = 200;
    /// Informational line declaring the total match count.
    pub const MATCH_COUNT: i32 = 102;
    /// Lowest code classified as a terminal error.
    pub const ERROR_MIN: i32 = 400;
    /// Fallback when an identity rejection carries no parsable code.
    pub const REJECTED: i32 = 500;
    /// Deadline expired before a terminal line arrived.
    pub const TIMEOUT: i32 = 408;
    /// Operation cancelled through the caller's token.
    pub const CANCELLED: i32 = 499;
}

/// One classified response line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseLine {
    /// Match-count declaration. `None` when the count token was missing
    /// or unparsable; the stored count is left at its default.
    Count(Option<i32>),
    /// One data field belonging to the record with the given id.
    Data {
        id: i32,
        field: String,
        value: String,
    },
    /// Terminal error (code >= 400).
    Error { code: i32, message: String },
    /// Terminal success (code 200).
    Success { message: String },
    /// Well-formed line with a code no category claims (1xx, 3xx...);
    /// ignored by the caller.
    Other(i32),
}

/// Classify a non-empty response line.
///
/// Returns `None` for malformed input: fewer than two colon-delimited
/// segments, a non-numeric status code, or a data line with fewer than
/// three sub-segments. Callers skip such lines without surfacing an
/// error.
pub fn classify(line: &str) -> Option<ResponseLine> {
    let segments: Vec<&str> = line.split(':').collect();
    if segments.len() < 2 {
        return None;
    }

    let code: i32 = segments[0].trim().parse().ok()?;
    let message = segments[1..].join(":");

    if code == codes::MATCH_COUNT {
        let count = message
            .split_whitespace()
            .nth(2)
            .and_then(|token| token.parse().ok());
        return Some(ResponseLine::Count(count));
    }

    if code >= codes::ERROR_MIN {
        return Some(ResponseLine::Error {
            code,
            message: message.trim().to_string(),
        });
    }

    if code < 0 {
        // Data line: <record-id>:<field-name>:<field-value...>; the
        // value may itself contain colons.
        let data: Vec<&str> = segments[1..].to_vec();
        if data.len() < 3 {
            return None;
        }
        let id: i32 = data[0].trim().parse().unwrap_or(0);
        return Some(ResponseLine::Data {
            id,
            field: data[1].to_string(),
            value: data[2..].join(":").trim().to_string(),
        });
    }

    if code == codes::OK {
        return Some(ResponseLine::Success {
            message: message.trim().to_string(),
        });
    }

    Some(ResponseLine::Other(code))
}

/// Parse the leading status code of a line, used where only the code
/// matters (the identity acknowledgement).
pub fn leading_code(line: &str) -> Option<i32> {
    line.split(':').next()?.trim().parse().ok()
}
