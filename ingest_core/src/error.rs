//! The crate's one `pub` error type: faults that propagate to the host,
//! as opposed to per-line faults, which are absorbed and logged (see
//! [`crate::state_machine`]).

use snafu::Snafu;

use crate::engine::EngineError;

/// A code describing why the upstream tokenizer abandoned a line, passed
/// through verbatim from `on_error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode(pub u8);

/// Errors that can propagate out of [`crate::IngestCore`]'s host-facing
/// surface (`commit_all`).
///
/// Per-line faults (cast failure, type mismatch, bad timestamp) never
/// reach this type — per the error-handling design, they are logged and
/// the offending line is dropped internally.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum IngestError {
    /// Committing a table's writer failed.
    #[snafu(display("commit of table '{table}' failed: {source}"))]
    Commit {
        /// The table whose commit failed.
        table: String,
        /// The underlying engine error.
        source: EngineError,
    },
}
