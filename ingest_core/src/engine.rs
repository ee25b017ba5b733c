//! External collaborator traits: the storage engine, its writers and
//! metadata, the security context, and the timestamp adapter.
//!
//! None of these are implemented by this crate for production use — they
//! are the seams a host wires up to a real columnar store. `test_util`
//! supplies in-memory doubles for tests and downstream exercising.

use std::fmt::Debug;

use snafu::Snafu;

use crate::types::ColumnType;

/// Authority under which storage operations run.
///
/// Consumed, never implemented here; production hosts supply a real
/// context carrying credentials/tenancy, `test_util` supplies a no-op one.
pub trait SecurityContext: Debug {}

/// A [`SecurityContext`] that grants unconditional access.
///
/// Useful for hosts that enforce authorization upstream of this crate, or
/// for tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSecurityContext;

impl SecurityContext for NoSecurityContext {}

/// The result of asking the engine whether a table exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    /// The table exists and can be written to.
    Exists,
    /// The table does not exist; the caller should create it.
    DoesNotExist,
    /// The table's status could not be determined (e.g. permission denied,
    /// underlying store unavailable). Causes the name to be marked
    /// permanently unusable for the life of the cache.
    Unknown,
}

/// One column of a table to be created, as seen by [`StorageEngine::create_table`].
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec<'a> {
    /// The column's name.
    pub name: &'a str,
    /// The column's storage type.
    pub ty: ColumnType,
}

/// A read-only view of the columns a new table should be created with.
///
/// Built lazily at line-end from the per-line scratch buffers — see
/// [`crate::table_adapter::NewTableStructure`] for the concrete
/// implementation used by the ingest state machine.
pub trait TableStructure {
    /// The name of the table to create.
    fn table_name(&self) -> &str;
    /// Number of columns, including the synthetic trailing timestamp
    /// column.
    fn column_count(&self) -> usize;
    /// The column at `index`.
    ///
    /// # Panics
    ///
    /// May panic if `index >= self.column_count()`.
    fn column(&self, index: usize) -> ColumnSpec<'_>;
    /// Whether the new table should partition its rows, and by what. `None`
    /// means unpartitioned.
    fn partitioning(&self) -> Option<&str> {
        None
    }
    /// Whether `Symbol` columns on the new table should maintain a
    /// dictionary (symbol) cache. Defaults from [`crate::IngestConfig`].
    fn symbol_cache(&self) -> bool {
        true
    }
    /// Initial capacity of each `Symbol` column's dictionary cache, if
    /// enabled. Defaults from [`crate::IngestConfig`].
    fn symbol_capacity(&self) -> usize {
        128
    }
}

/// Introspectable metadata of an existing table, as exposed by a
/// [`TableWriter`].
pub trait TableMetadata: Debug {
    /// The table's name.
    fn name(&self) -> &str;
    /// Look up a column by name, returning its index and type if present.
    fn column(&self, name: &str) -> Option<(u32, ColumnType)>;
    /// Total number of columns currently defined on the table.
    fn column_count(&self) -> usize;
}

/// Errors raised while acquiring or operating on storage-engine resources.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum EngineError {
    /// The engine refused to hand out a writer for `table`.
    #[snafu(display("failed to acquire writer for table '{table}': {reason}"))]
    WriterUnavailable {
        /// The table that could not be acquired.
        table: String,
        /// The engine's reported reason.
        reason: String,
    },
    /// The engine refused to create `table`.
    #[snafu(display("failed to create table '{table}': {reason}"))]
    CreateFailed {
        /// The table that could not be created.
        table: String,
        /// The engine's reported reason.
        reason: String,
    },
    /// A commit to `table` failed.
    #[snafu(display("failed to commit table '{table}': {reason}"))]
    CommitFailed {
        /// The table whose commit failed.
        table: String,
        /// The engine's reported reason.
        reason: String,
    },
}

/// A value could not be cast into a column's storage type.
#[derive(Debug, Snafu)]
#[snafu(display("cannot write '{token}' as column '{column}' (type {expected})"))]
pub struct CastError {
    /// The column being written.
    pub column: String,
    /// The column's declared type.
    pub expected: &'static str,
    /// The raw token that failed to cast.
    pub token: String,
}

/// A handle that accepts rows for one table.
///
/// Exclusively owned by a single [`crate::writer_cache::CacheEntry`] at any
/// time; this crate never clones or otherwise duplicates ownership of a
/// writer.
pub trait TableWriter: Debug {
    /// This writer's table metadata.
    fn metadata(&self) -> &dyn TableMetadata;
    /// Begin a new row at the given microsecond timestamp.
    fn new_row(&mut self, micros: i64);
    /// Add a column to the table, returning its newly assigned index.
    fn add_column(&mut self, name: &str, ty: ColumnType) -> u32;
    /// Write a `Long` value into column `idx` of the current row.
    fn put_long(&mut self, idx: u32, value: i64) -> Result<(), CastError>;
    /// Write a `Boolean` value into column `idx` of the current row.
    fn put_bool(&mut self, idx: u32, value: bool) -> Result<(), CastError>;
    /// Write a `String` value into column `idx` of the current row.
    fn put_str(&mut self, idx: u32, value: &str) -> Result<(), CastError>;
    /// Write a `Symbol` value into column `idx` of the current row.
    fn put_sym(&mut self, idx: u32, value: &str) -> Result<(), CastError>;
    /// Write a `Double` value into column `idx` of the current row.
    fn put_double(&mut self, idx: u32, value: f64) -> Result<(), CastError>;
    /// Discard the row in progress, leaving the writer valid for the next
    /// row.
    fn cancel_row(&mut self);
    /// Append the row in progress, making it pending commit.
    fn append(&mut self);
    /// Flush all pending rows, making them visible to readers.
    fn commit(&mut self) -> Result<(), EngineError>;
    /// The table name this writer was acquired for.
    fn name(&self) -> &str;
}

/// Supplies table writers and table-existence checks.
///
/// The single external collaborator the ingest state machine drives
/// storage through; consumed, never implemented here for production use.
pub trait StorageEngine: Debug {
    /// Whether `name` currently exists as a table.
    fn get_status(&self, security_ctx: &dyn SecurityContext, name: &str) -> TableStatus;
    /// Acquire a writer for the existing table `name`.
    fn get_writer(
        &self,
        security_ctx: &dyn SecurityContext,
        name: &str,
    ) -> Result<Box<dyn TableWriter>, EngineError>;
    /// Create a table per `structure`.
    fn create_table(
        &self,
        security_ctx: &dyn SecurityContext,
        structure: &dyn TableStructure,
    ) -> Result<(), EngineError>;
}

/// Failure to parse a line-protocol timestamp token.
#[derive(Debug, Snafu)]
#[snafu(display("invalid timestamp token '{token}'"))]
pub struct TimestampParseError {
    /// The token that failed to parse.
    pub token: String,
}

/// Parses the trailing timestamp token of a line into microseconds since
/// the Unix epoch.
///
/// Line protocol conventionally carries nanosecond timestamps; the
/// adapter is the seam where that convention is reconciled with whatever
/// resolution the wired storage engine actually stores (this corpus's
/// columnar stores write microseconds).
pub trait TimestampAdapter: Debug {
    /// Parse `token` into a microsecond Unix timestamp.
    fn parse_micros(&self, token: &str) -> Result<i64, TimestampParseError>;
}
