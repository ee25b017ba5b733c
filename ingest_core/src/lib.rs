//! Event-driven ingestion core.
//!
//! Consumes a pre-tokenized stream of line-protocol events and
//! materializes them as rows in a columnar store reached through the
//! [`engine`] traits: it binds tokens to a table writer, auto-evolves
//! table schema on first use, resolves per-field value types, and commits
//! rows through the correct per-table writer, tolerating malformed lines
//! without losing throughput on well-formed ones.
//!
//! The state machine itself, [`IngestCore`], is the crate's single public
//! entry point; everything else is either a supporting type it threads
//! through, or an external-collaborator trait ([`engine::StorageEngine`],
//! [`engine::TableWriter`], [`engine::TimestampAdapter`],
//! [`token::TokenCache`], [`engine::SecurityContext`]) that a host wires
//! up to a real storage engine.

#![deny(rustdoc::broken_intra_doc_links, rust_2018_idioms)]
#![warn(missing_docs, missing_debug_implementations, clippy::use_self)]

mod config;
mod dispatch;
mod error;
mod mode;
mod scratch;
mod state_machine;
mod table_adapter;
mod types;
mod writer_cache;

pub mod engine;
pub mod token;

#[cfg(any(test, feature = "test-support"))]
pub mod test_util;

pub use config::IngestConfig;
pub use error::{ErrorCode, IngestError};
pub use mode::{EventKind, Mode};
pub use state_machine::IngestCore;
pub use types::{infer_value_type, ColumnType};
