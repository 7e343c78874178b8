//! Handshake stage machine and result assembly.
//!
//! One [`QuerySession`] drives one operation over a fresh connection:
//!
//! 1. `AwaitingBanner`: the first line is the banner; its content is
//!    ignored and the identity command is sent.
//! 2. `AwaitingIdentityAck`: a `200` code accepts the identity and the
//!    normalized query command is sent; any other code terminates the
//!    operation with an error result.
//! 3. `AwaitingQueryResult`: count/data lines accumulate until a
//!    terminal line (success, error, or blank) produces the result.
//!
//! Stage transitions are strictly forward. [`QuerySession::on_line`]
//! consumes the session and only hands it back while the operation is
//! still pending, so a terminal result can be produced at most once;
//! double resolution is unrepresentable.

use crate::command;
use crate::protocol::{classify, codes, leading_code, Record, RecordAccumulator, ResponseLine};

/// The terminal value of one operation.
///
/// Exactly one of these is produced per operation. Protocol-level
/// failures (identity rejection, server error codes, deadline expiry,
/// cancellation) are `Error` values, not `Err` returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PharosResult {
    /// Terminal success with no matching records.
    Ok { message: String },
    /// Declared match count plus the assembled records, in arrival
    /// order.
    Matches { count: i32, records: Vec<Record> },
    /// Terminal error code and message.
    Error { code: i32, message: String },
}

/// What the machine expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    AwaitingBanner,
    AwaitingIdentityAck,
    AwaitingQueryResult,
}

/// Reaction of the session to one response line.
#[derive(Debug)]
pub enum Step {
    /// Write this command line (the driver appends the terminator),
    /// then keep reading.
    Send(QuerySession, String),
    /// Keep reading.
    Read(QuerySession),
    /// Terminal result; the session has been consumed.
    Done(PharosResult),
}

/// Per-operation state: stage, identity, query, and the accumulated
/// response. Created per call and discarded with the result; nothing is
/// shared across operations.
#[derive(Debug)]
pub struct QuerySession {
    stage: Stage,
    client_id: String,
    query: String,
    records: RecordAccumulator,
    declared_count: i32,
    skipped: u64,
}

impl QuerySession {
    /// Create a session for one query under the given client identity.
    pub fn new(client_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            stage: Stage::AwaitingBanner,
            client_id: client_id.into(),
            query: query.into(),
            records: RecordAccumulator::new(),
            declared_count: 0,
            skipped: 0,
        }
    }

    /// Number of malformed lines skipped so far. Skipping is silent by
    /// design; this counter exists so protocol drift stays detectable.
    pub fn skipped_lines(&self) -> u64 {
        self.skipped
    }

    /// Feed one decoded line to the machine.
    pub fn on_line(mut self, line: &str) -> Step {
        match self.stage {
            Stage::AwaitingBanner => {
                // Banner content carries nothing beyond "connected".
                self.stage = Stage::AwaitingIdentityAck;
                let cmd = command::id_command(&self.client_id);
                Step::Send(self, cmd)
            }
            Stage::AwaitingIdentityAck => match leading_code(line) {
                Some(codes::OK) => {
                    self.stage = Stage::AwaitingQueryResult;
                    let cmd = command::normalize_query(&self.query);
                    Step::Send(self, cmd)
                }
                code => Step::Done(PharosResult::Error {
                    code: code.unwrap_or(codes::REJECTED),
                    message: format!("identification rejected: {line}"),
                }),
            },
            Stage::AwaitingQueryResult => self.on_result_line(line),
        }
    }

    fn on_result_line(mut self, line: &str) -> Step {
        if line.is_empty() {
            // Alternate terminal signal; no line text to report.
            return Step::Done(self.finish("Ok".to_string()));
        }

        match classify(line) {
            None => {
                self.skipped += 1;
                tracing::trace!(line, "skipping malformed response line");
                Step::Read(self)
            }
            Some(ResponseLine::Count(count)) => {
                if let Some(n) = count {
                    self.declared_count = n;
                }
                Step::Read(self)
            }
            Some(ResponseLine::Data { id, field, value }) => {
                self.records.push_field(id, field, value);
                Step::Read(self)
            }
            Some(ResponseLine::Error { code, message }) => {
                self.log_skipped();
                Step::Done(PharosResult::Error { code, message })
            }
            Some(ResponseLine::Success { message }) => Step::Done(self.finish(message)),
            Some(ResponseLine::Other(code)) => {
                tracing::trace!(code, "ignoring informational line");
                Step::Read(self)
            }
        }
    }

    /// The single decision point turning accumulated state into the
    /// terminal result. Consumes the session and its accumulator.
    fn finish(self, message: String) -> PharosResult {
        self.log_skipped();
        let declared = self.declared_count;
        let records = self.records.finish();
        if records.is_empty() && declared <= 0 {
            return PharosResult::Ok { message };
        }
        // A count line without a parsable total leaves the declared
        // count at zero; report what was actually assembled instead.
        let count = if declared > 0 {
            declared
        } else {
            records.len() as i32
        };
        PharosResult::Matches { count, records }
    }

    fn log_skipped(&self) {
        if self.skipped > 0 {
            tracing::debug!(skipped = self.skipped, "ignored malformed response lines");
        }
    }
}
