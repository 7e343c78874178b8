//! # pharos-client
//!
//! Async Rust client for the Pharos line-oriented directory protocol.
//!
//! A Pharos server answers free-text queries over a plain TCP text
//! protocol: the server greets with a banner, the client identifies
//! itself (`id <client>`), and each subsequent command receives a
//! newline-delimited response stream of status, count, and data lines.
//!
//! ## Architecture
//!
//! - **Framing** ([`protocol::LineBuffer`]): raw chunks in, complete
//!   lines out, partial lines buffered across reads.
//! - **Classification** ([`protocol::classify`]): one decoded line to
//!   one [`protocol::ResponseLine`].
//! - **Accumulation** ([`protocol::RecordAccumulator`]): consecutive
//!   data lines sharing a record id grouped into [`protocol::Record`]s.
//! - **Session** ([`session::QuerySession`]): the handshake stage
//!   machine; consumes itself on the terminal transition, producing the
//!   operation's single [`PharosResult`].
//! - **Driver** ([`PharosClient`]): one connection per operation, with
//!   deadline and cancellation hardening.
//!
//! ## Example
//!
//! ```ignore
//! use pharos_client::{execute_query, PharosResult};
//!
//! #[tokio::main]
//! async fn main() {
//!     match execute_query("mdb-web", "hostname=node-01", "127.0.0.1", 1050).await {
//!         Ok(PharosResult::Matches { count, records }) => {
//!             println!("{count} match(es)");
//!             for record in records {
//!                 println!("  #{}: {:?}", record.id, record.fields);
//!             }
//!         }
//!         Ok(other) => println!("{other:?}"),
//!         Err(err) => eprintln!("transport failure: {err}"),
//!     }
//! }
//! ```

pub mod command;
pub mod error;
pub mod protocol;
pub mod session;

mod client;

pub use client::{execute_query, PharosClient, DEFAULT_DEADLINE};
pub use error::{PharosError, Result};
pub use protocol::{Field, Record};
pub use session::PharosResult;
