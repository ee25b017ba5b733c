//! In-memory test doubles: a [`StorageEngine`], a [`TokenCache`], and a
//! [`TimestampAdapter`], exercised by this crate's own tests and available
//! to downstream crates under the `test-support` feature.

use std::collections::HashMap as StdHashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::engine::{
    CastError, ColumnSpec, EngineError, NoSecurityContext, SecurityContext, TableMetadata,
    TableStatus, TableStructure, TableWriter, TimestampAdapter, TimestampParseError,
};
use crate::token::{Token, TokenAddress, TokenCache};
use crate::types::ColumnType;

/// A single written row, kept as `(column_index, rendered value)` pairs
/// plus its timestamp, for assertions in tests.
#[derive(Debug, Clone, PartialEq)]
pub struct MemRow {
    /// Microsecond timestamp the row was written with.
    pub micros: i64,
    /// Values by column index, rendered to a debug-friendly [`MemValue`].
    pub values: Vec<(u32, MemValue)>,
}

/// A column value as captured by [`MemTableWriter`], typed for assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum MemValue {
    /// A `Long` value.
    Long(i64),
    /// A `Boolean` value.
    Bool(bool),
    /// A `String` value.
    Str(String),
    /// A `Symbol` value.
    Sym(String),
    /// A `Double` value.
    Double(f64),
}

#[derive(Debug, Default)]
struct TableState {
    columns: Vec<(String, ColumnType)>,
    rows: Vec<MemRow>,
}

#[derive(Debug, Default)]
struct MemTableMetadata {
    name: String,
    columns: Vec<(String, ColumnType)>,
}

impl TableMetadata for MemTableMetadata {
    fn name(&self) -> &str {
        &self.name
    }

    fn column(&self, name: &str) -> Option<(u32, ColumnType)> {
        self.columns
            .iter()
            .position(|(n, _)| n == name)
            .map(|idx| (idx as u32, self.columns[idx].1))
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// An in-memory [`TableWriter`] backed by a table's shared, `Arc<Mutex<_>>`
/// state.
///
/// Row-in-progress state lives in `pending` and only moves into `appended`
/// on [`TableWriter::append`]; [`TableWriter::cancel_row`] simply drops
/// it. `appended` only becomes visible in the shared table state (and
/// hence to other writer handles / [`InMemoryEngine::committed_rows`]) on
/// [`TableWriter::commit`], matching the commit-makes-visible contract
/// real storage engines in this corpus follow.
#[derive(Debug)]
pub struct MemTableWriter {
    metadata: MemTableMetadata,
    state: Arc<Mutex<TableState>>,
    appended: Vec<MemRow>,
    pending: Option<MemRow>,
}

impl MemTableWriter {
    fn new(name: String, state: Arc<Mutex<TableState>>) -> Self {
        let columns = state.lock().columns.clone();
        Self {
            metadata: MemTableMetadata { name, columns },
            state,
            appended: Vec::new(),
            pending: None,
        }
    }

    /// Rows this writer has appended and committed so far (this handle's
    /// view only; use [`InMemoryEngine::committed_rows`] for the
    /// table-wide view across handles).
    pub fn appended_rows(&self) -> &[MemRow] {
        &self.appended
    }

    fn put(&mut self, idx: u32, value: MemValue) -> Result<(), CastError> {
        let row = self.pending.as_mut().expect("put called with no row open");
        row.values.push((idx, value));
        Ok(())
    }
}

impl TableWriter for MemTableWriter {
    fn metadata(&self) -> &dyn TableMetadata {
        &self.metadata
    }

    fn new_row(&mut self, micros: i64) {
        self.pending = Some(MemRow {
            micros,
            values: Vec::new(),
        });
    }

    fn add_column(&mut self, name: &str, ty: ColumnType) -> u32 {
        self.metadata.columns.push((name.to_string(), ty));
        (self.metadata.columns.len() - 1) as u32
    }

    fn put_long(&mut self, idx: u32, value: i64) -> Result<(), CastError> {
        self.put(idx, MemValue::Long(value))
    }

    fn put_bool(&mut self, idx: u32, value: bool) -> Result<(), CastError> {
        self.put(idx, MemValue::Bool(value))
    }

    fn put_str(&mut self, idx: u32, value: &str) -> Result<(), CastError> {
        self.put(idx, MemValue::Str(value.to_string()))
    }

    fn put_sym(&mut self, idx: u32, value: &str) -> Result<(), CastError> {
        self.put(idx, MemValue::Sym(value.to_string()))
    }

    fn put_double(&mut self, idx: u32, value: f64) -> Result<(), CastError> {
        self.put(idx, MemValue::Double(value))
    }

    fn cancel_row(&mut self) {
        self.pending = None;
    }

    fn append(&mut self) {
        if let Some(row) = self.pending.take() {
            self.appended.push(row);
        }
    }

    fn commit(&mut self) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.columns = self.metadata.columns.clone();
        state.rows.extend(self.appended.drain(..));
        Ok(())
    }

    fn name(&self) -> &str {
        &self.metadata.name
    }
}

/// An in-memory [`StorageEngine`] double.
///
/// Each table's state lives behind its own `Arc<Mutex<TableState>>`, so
/// multiple writer handles acquired for the same table (e.g. across lines,
/// before and after a schema change) all commit into the same place,
/// mirroring how a real client handed a fresh writer still writes through
/// to shared server-side table state.
#[derive(Debug, Default)]
pub struct InMemoryEngine {
    tables: Mutex<StdHashMap<String, Arc<Mutex<TableState>>>>,
}

impl InMemoryEngine {
    /// Construct an empty engine with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit-visible rows for `table`, or `None` if it does not exist.
    pub fn committed_rows(&self, table: &str) -> Option<Vec<MemRow>> {
        let tables = self.tables.lock();
        tables.get(table).map(|state| state.lock().rows.clone())
    }

    /// Whether `table` has been created.
    pub fn has_table(&self, table: &str) -> bool {
        self.tables.lock().contains_key(table)
    }
}

impl StorageEngine for InMemoryEngine {
    fn get_status(&self, _security_ctx: &dyn SecurityContext, name: &str) -> TableStatus {
        if self.tables.lock().contains_key(name) {
            TableStatus::Exists
        } else {
            TableStatus::DoesNotExist
        }
    }

    fn get_writer(
        &self,
        _security_ctx: &dyn SecurityContext,
        name: &str,
    ) -> Result<Box<dyn TableWriter>, EngineError> {
        let state = self
            .tables
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::WriterUnavailable {
                table: name.to_string(),
                reason: "no such table".to_string(),
            })?;
        Ok(Box::new(MemTableWriter::new(name.to_string(), state)))
    }

    fn create_table(
        &self,
        _security_ctx: &dyn SecurityContext,
        structure: &dyn TableStructure,
    ) -> Result<(), EngineError> {
        let name = structure.table_name().to_string();
        let mut tables = self.tables.lock();
        if tables.contains_key(&name) {
            return Err(EngineError::CreateFailed {
                table: name,
                reason: "table already exists".to_string(),
            });
        }
        let columns = (0..structure.column_count())
            .map(|i| {
                let ColumnSpec { name, ty } = structure.column(i);
                (name.to_string(), ty)
            })
            .collect();
        tables.insert(
            name,
            Arc::new(Mutex::new(TableState {
                columns,
                rows: Vec::new(),
            })),
        );
        Ok(())
    }
}

/// A [`TokenCache`] backed by an arena of owned strings, for tests that
/// build events by hand rather than receiving them from a real tokenizer.
#[derive(Debug, Default)]
pub struct ArenaTokenCache {
    arena: Vec<String>,
}

impl ArenaTokenCache {
    /// Construct an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `text`, returning a [`Token`] addressing it.
    pub fn intern(&mut self, text: &str) -> Token {
        self.arena.push(text.to_string());
        let addr = TokenAddress::new(self.arena.len() as u32).expect("index is never zero");
        Token(addr)
    }
}

impl TokenCache for ArenaTokenCache {
    fn resolve(&self, address: TokenAddress) -> &str {
        &self.arena[(address.raw() - 1) as usize]
    }
}

/// A [`TimestampAdapter`] that parses a decimal microsecond Unix
/// timestamp, rejecting anything else.
#[derive(Debug, Default, Clone, Copy)]
pub struct DecimalMicrosAdapter;

impl TimestampAdapter for DecimalMicrosAdapter {
    fn parse_micros(&self, token: &str) -> Result<i64, TimestampParseError> {
        token.parse().map_err(|_| TimestampParseError {
            token: token.to_string(),
        })
    }
}

/// A [`SecurityContext`] for tests: identical to [`NoSecurityContext`],
/// re-exported here so downstream test code need not import the `engine`
/// module directly.
pub type TestSecurityContext = NoSecurityContext;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ColumnSpec as EngineColumnSpec;

    struct FixedStructure {
        name: &'static str,
        columns: Vec<(&'static str, ColumnType)>,
    }

    impl TableStructure for FixedStructure {
        fn table_name(&self) -> &str {
            self.name
        }

        fn column_count(&self) -> usize {
            self.columns.len()
        }

        fn column(&self, index: usize) -> EngineColumnSpec<'_> {
            let (name, ty) = self.columns[index];
            EngineColumnSpec { name, ty }
        }
    }

    #[test]
    fn create_then_write_then_commit_round_trips() {
        let engine = InMemoryEngine::new();
        let ctx = TestSecurityContext::default();
        let structure = FixedStructure {
            name: "cpu",
            columns: vec![("host", ColumnType::Symbol), ("timestamp", ColumnType::Timestamp)],
        };
        engine.create_table(&ctx, &structure).unwrap();
        assert_eq!(engine.get_status(&ctx, "cpu"), TableStatus::Exists);

        let mut writer = engine.get_writer(&ctx, "cpu").unwrap();
        writer.new_row(42);
        writer.put_sym(0, "server-1").unwrap();
        writer.append();
        writer.commit().unwrap();

        let rows = engine.committed_rows("cpu").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].micros, 42);
    }

    #[test]
    fn arena_token_cache_resolves_interned_text() {
        let mut arena = ArenaTokenCache::new();
        let token = arena.intern("cpu");
        assert_eq!(token.text(&arena), "cpu");
    }

    #[test]
    fn decimal_micros_adapter_rejects_non_numeric() {
        let adapter = DecimalMicrosAdapter;
        assert!(adapter.parse_micros("1700000000000000").is_ok());
        assert!(adapter.parse_micros("not-a-number").is_err());
    }
}
