//! The event-driven ingest state machine: binds tokens to table writers,
//! auto-evolves schema, and commits rows.

use observability_deps::tracing::{debug, warn};

use iox_time::TimeProvider;

use crate::config::IngestConfig;
use crate::dispatch::write_value;
use crate::engine::{
    SecurityContext, StorageEngine, TableStatus, TableWriter, TimestampAdapter,
};
use crate::error::{CommitSnafu, ErrorCode, IngestError};
use crate::mode::{EventKind, Mode};
use crate::scratch::RowScratch;
use crate::table_adapter::NewTableStructure;
use crate::token::{Token, TokenCache};
use crate::types::{infer_value_type, ColumnType};
use crate::writer_cache::{CommitList, EntryState, Handle, WriterCache};

use snafu::ResultExt;

/// A field or tag name seen this line, awaiting its value.
#[derive(Debug, Clone)]
enum Pending {
    /// No name event pending a value.
    None,
    /// The name matched an existing column at this index/type (`Append`
    /// mode only).
    ExistingColumn(u32, ColumnType),
    /// The name did not match an existing column (`Append` mode), or no
    /// table exists yet to match against (`NewTable` mode); its type is
    /// decided once the paired value arrives.
    NewColumn(Box<str>),
}

/// Consumes a pre-tokenized stream of line-protocol events and
/// materializes them as rows in a columnar store reached through a
/// [`StorageEngine`].
///
/// Owns the per-line scratch buffers, the writer cache, and the commit
/// list; none of these are reallocated between lines in steady state.
#[derive(Debug)]
pub struct IngestCore {
    config: IngestConfig,
    scratch: RowScratch,
    cache: WriterCache,
    commit_list: CommitList,
    mode: Mode,
    active_entry: Option<usize>,
    pending: Pending,
}

impl IngestCore {
    /// Construct a fresh ingest core with no bound table and empty
    /// scratch/cache/commit-list state.
    pub fn new(config: IngestConfig) -> Self {
        let capacity = config.default_column_name_type_capacity;
        Self {
            config,
            scratch: RowScratch::with_capacity(capacity),
            cache: WriterCache::new(),
            commit_list: CommitList::new(),
            mode: Mode::Unbound,
            active_entry: None,
            pending: Pending::None,
        }
    }

    /// The mode the line currently in progress is being handled under.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Feed one upstream event into the state machine.
    ///
    /// `security_ctx` is threaded through alongside `engine` because
    /// resolving a `Measurement` event may call through to
    /// `StorageEngine::get_status`/`get_writer`, both of which require an
    /// authority to run under; the upstream per-event contract otherwise
    /// only names `token` and `cache`.
    pub fn on_event(
        &mut self,
        event: EventKind,
        token: Token,
        cache: &dyn TokenCache,
        engine: &dyn StorageEngine,
        security_ctx: &dyn SecurityContext,
    ) {
        match event {
            EventKind::Measurement => {
                let name = token.text(cache);
                self.on_measurement(name, engine, security_ctx);
            }
            EventKind::TagName | EventKind::FieldName => {
                self.on_name_event(token, cache);
            }
            EventKind::TagValue => {
                self.on_value_event(token, cache, true);
            }
            EventKind::FieldValue => {
                self.on_value_event(token, cache, false);
            }
            EventKind::Timestamp => {
                self.scratch.column_values.push(token.0);
            }
        }
    }

    /// Finalize the line in progress: assemble and append a row (or create
    /// a table then append its first row), then clear scratch
    /// unconditionally.
    ///
    /// Takes `cache` because row assembly — resolving each scratch token
    /// to text and writing it through column dispatch — happens here, not
    /// at event time.
    pub fn on_line_end(
        &mut self,
        cache: &dyn TokenCache,
        engine: &dyn StorageEngine,
        security_ctx: &dyn SecurityContext,
        clock: &dyn TimeProvider,
        ts_adapter: &dyn TimestampAdapter,
    ) {
        match self.mode {
            Mode::Append => self.line_end_append(cache, clock, ts_adapter),
            Mode::NewTable => self.line_end_new_table(cache, engine, security_ctx, clock, ts_adapter),
            Mode::SkipLine | Mode::Unbound => {}
        }
        self.finish_line();
    }

    /// Abandon the line in progress after an upstream tokenizer error.
    pub fn on_error(&mut self, position: u32, state: u8, code: ErrorCode) {
        debug!(position, state, code = code.0, "tokenizer error, abandoning line");
        self.finish_line();
    }

    /// Commit the active writer, if any, plus every writer named on the
    /// commit list, then clear the list.
    pub fn commit_all(&mut self) -> Result<(), IngestError> {
        if let Some(idx) = self.active_entry {
            self.commit_slot(idx)?;
        }
        let names: Vec<Box<str>> = self.commit_list.names().to_vec();
        for name in &names {
            if let Handle::Present(idx) = self.cache.lookup(name) {
                self.commit_slot(idx)?;
            }
        }
        self.commit_list.clear();
        Ok(())
    }

    /// Release every cached writer. Consumes `self`: once resources are
    /// released there is nothing left to operate on.
    pub fn close(mut self) {
        self.cache.release_all();
    }

    fn commit_slot(&mut self, idx: usize) -> Result<(), IngestError> {
        let entry = self.cache.entry_mut(idx);
        if let Some(writer) = entry.writer.as_mut() {
            let table = writer.name().to_string();
            writer.commit().context(CommitSnafu { table })?;
        }
        Ok(())
    }

    fn finish_line(&mut self) {
        self.scratch.clear();
        self.pending = Pending::None;
    }

    fn on_measurement(
        &mut self,
        name: &str,
        engine: &dyn StorageEngine,
        security_ctx: &dyn SecurityContext,
    ) {
        let handle = self.cache.lookup(name);

        if let (Handle::Present(idx), Some(active)) = (handle, self.active_entry) {
            if idx == active {
                if self.cache.entry(idx).writer.is_some() {
                    self.mode = Mode::Append;
                } else {
                    self.init_cache_entry(idx, engine, security_ctx);
                }
                return;
            }
        }

        if let Some(prev) = self.active_entry.take() {
            if self.cache.entry(prev).writer.is_some() {
                let prev_name = self.cache.name_at(prev).to_string();
                self.commit_list.mark_dirty(&prev_name);
            }
        }

        let idx = match handle {
            Handle::Present(idx) => idx,
            Handle::Absent(_) => self.cache.insert(name),
        };
        self.active_entry = Some(idx);

        if self.cache.entry(idx).writer.is_some() {
            // This table may still be sitting on the commit list from an
            // earlier displacement; now that it is active again it will be
            // committed through the active-writer branch of `commit_all`,
            // so it must not also be committed via the dirty list.
            let reactivated_name = self.cache.name_at(idx).to_string();
            self.commit_list.mark_clean(&reactivated_name);
            self.mode = Mode::Append;
        } else {
            self.init_cache_entry(idx, engine, security_ctx);
        }
    }

    fn init_cache_entry(
        &mut self,
        idx: usize,
        engine: &dyn StorageEngine,
        security_ctx: &dyn SecurityContext,
    ) {
        let state = self.cache.entry(idx).state;
        match state {
            EntryState::Initial => {
                let name = self.cache.name_at(idx).to_string();
                match engine.get_status(security_ctx, &name) {
                    TableStatus::Exists => {
                        self.cache.entry_mut(idx).state = EntryState::Exists;
                        self.acquire_writer(idx, &name, engine, security_ctx);
                    }
                    TableStatus::DoesNotExist => {
                        self.mode = Mode::NewTable;
                    }
                    TableStatus::Unknown => {
                        self.cache.entry_mut(idx).state = EntryState::Unusable;
                        warn!(table = %name, "table status unknown, marking unusable");
                        self.mode = Mode::SkipLine;
                    }
                }
            }
            EntryState::Exists => {
                let name = self.cache.name_at(idx).to_string();
                self.acquire_writer(idx, &name, engine, security_ctx);
            }
            EntryState::Unusable => {
                self.mode = Mode::SkipLine;
            }
        }
    }

    fn acquire_writer(
        &mut self,
        idx: usize,
        name: &str,
        engine: &dyn StorageEngine,
        security_ctx: &dyn SecurityContext,
    ) {
        match engine.get_writer(security_ctx, name) {
            Ok(writer) => {
                self.cache.entry_mut(idx).writer = Some(writer);
                self.mode = Mode::Append;
            }
            Err(err) => {
                warn!(table = name, error = %err, "failed to acquire writer");
                self.mode = Mode::SkipLine;
            }
        }
    }

    fn on_name_event(&mut self, token: Token, cache: &dyn TokenCache) {
        match self.mode {
            Mode::Append => {
                let name = token.text(cache);
                let idx = self.active_entry.expect("Append mode implies a bound entry");
                let writer = self
                    .cache
                    .entry(idx)
                    .writer
                    .as_ref()
                    .expect("Append mode implies an acquired writer");
                self.pending = match writer.metadata().column(name) {
                    Some((col_idx, ty)) => Pending::ExistingColumn(col_idx, ty),
                    None => Pending::NewColumn(name.into()),
                };
            }
            Mode::NewTable => {
                let name = token.text(cache);
                self.pending = Pending::NewColumn(name.into());
            }
            Mode::SkipLine | Mode::Unbound => {}
        }
    }

    fn on_value_event(&mut self, token: Token, cache: &dyn TokenCache, is_tag: bool) {
        match self.mode {
            Mode::Append => self.append_value(token, cache, is_tag),
            Mode::NewTable => self.new_table_value(token, cache, is_tag),
            Mode::SkipLine | Mode::Unbound => {}
        }
    }

    fn append_value(&mut self, token: Token, cache: &dyn TokenCache, is_tag: bool) {
        let text = token.text(cache);
        let ty = if is_tag {
            Some(ColumnType::Symbol)
        } else {
            infer_value_type(text)
        };
        let Some(ty) = ty else {
            warn!(token = text, "unrecognized value token, skipping line");
            self.mode = Mode::SkipLine;
            return;
        };

        match std::mem::replace(&mut self.pending, Pending::None) {
            Pending::NewColumn(name) => {
                let idx = self.active_entry.expect("Append mode implies a bound entry");
                let writer = self
                    .cache
                    .entry_mut(idx)
                    .writer
                    .as_mut()
                    .expect("Append mode implies an acquired writer");
                let col_idx = writer.add_column(&name, ty);
                self.scratch.column_index_and_type.push((col_idx, ty));
                self.scratch.column_values.push(token.0);
            }
            Pending::ExistingColumn(col_idx, existing_ty) if existing_ty == ty => {
                self.scratch.column_index_and_type.push((col_idx, ty));
                self.scratch.column_values.push(token.0);
            }
            Pending::ExistingColumn(_, existing_ty) => {
                warn!(
                    expected = existing_ty.name(),
                    found = ty.name(),
                    "type mismatch against existing column, skipping line"
                );
                self.mode = Mode::SkipLine;
            }
            Pending::None => {
                debug_assert!(false, "value event with no pending name");
            }
        }
    }

    fn new_table_value(&mut self, token: Token, cache: &dyn TokenCache, is_tag: bool) {
        let text = token.text(cache);
        let ty = if is_tag {
            Some(ColumnType::Symbol)
        } else {
            infer_value_type(text)
        };
        let Some(ty) = ty else {
            warn!(token = text, "unrecognized value token, skipping line");
            self.mode = Mode::SkipLine;
            return;
        };

        match std::mem::replace(&mut self.pending, Pending::None) {
            Pending::NewColumn(name) => {
                self.scratch.column_name_type.push((name, ty));
                self.scratch.column_values.push(token.0);
            }
            Pending::ExistingColumn(..) | Pending::None => {
                debug_assert!(false, "NewTable mode never produces ExistingColumn pending");
            }
        }
    }

    fn line_end_append(
        &mut self,
        cache: &dyn TokenCache,
        clock: &dyn TimeProvider,
        ts_adapter: &dyn TimestampAdapter,
    ) {
        let n = self.scratch.column_index_and_type.len();
        let micros = match self.resolve_timestamp(n, cache, clock, ts_adapter) {
            Some(micros) => micros,
            None => return,
        };

        let idx = self.active_entry.expect("Append mode implies a bound entry");
        let writer = self
            .cache
            .entry_mut(idx)
            .writer
            .as_mut()
            .expect("Append mode implies an acquired writer");

        writer.new_row(micros);
        let failed = Self::write_columns(
            writer.as_mut(),
            &self.scratch.column_index_and_type,
            &self.scratch.column_values,
            cache,
        );
        if failed {
            writer.cancel_row();
        } else {
            writer.append();
        }
    }

    fn line_end_new_table(
        &mut self,
        cache: &dyn TokenCache,
        engine: &dyn StorageEngine,
        security_ctx: &dyn SecurityContext,
        clock: &dyn TimeProvider,
        ts_adapter: &dyn TimestampAdapter,
    ) {
        let idx = self.active_entry.expect("NewTable mode implies a bound entry");
        let name = self.cache.name_at(idx).to_string();
        let structure = NewTableStructure::new(&name, &self.scratch.column_name_type, &self.config);
        if let Err(err) = engine.create_table(security_ctx, &structure) {
            warn!(table = %name, error = %err, "failed to create table");
            self.mode = Mode::SkipLine;
            return;
        }

        match engine.get_writer(security_ctx, &name) {
            Ok(mut writer) => {
                let n = self.scratch.column_name_type.len();
                let micros = match self.resolve_timestamp(n, cache, clock, ts_adapter) {
                    Some(micros) => micros,
                    None => {
                        self.cache.entry_mut(idx).state = EntryState::Exists;
                        self.cache.entry_mut(idx).writer = Some(writer);
                        self.mode = Mode::Append;
                        return;
                    }
                };

                writer.new_row(micros);
                let positional: Vec<(u32, ColumnType)> = self
                    .scratch
                    .column_name_type
                    .iter()
                    .enumerate()
                    .map(|(i, (_, ty))| (i as u32, *ty))
                    .collect();
                let failed = Self::write_columns(
                    writer.as_mut(),
                    &positional,
                    &self.scratch.column_values,
                    cache,
                );
                if failed {
                    writer.cancel_row();
                } else {
                    writer.append();
                }

                self.cache.entry_mut(idx).state = EntryState::Exists;
                self.cache.entry_mut(idx).writer = Some(writer);
                self.mode = Mode::Append;
            }
            Err(err) => {
                warn!(table = %name, error = %err, "failed to acquire writer for newly created table");
                self.mode = Mode::SkipLine;
            }
        }
    }

    /// Write every `(index, type)`/value pair through column dispatch.
    /// Returns `true` if any cast failed (the row must be canceled).
    fn write_columns(
        writer: &mut dyn TableWriter,
        columns: &[(u32, ColumnType)],
        values: &[crate::token::TokenAddress],
        cache: &dyn TokenCache,
    ) -> bool {
        for (i, (idx, ty)) in columns.iter().enumerate() {
            let text = cache.resolve(values[i]);
            if let Err(err) = write_value(writer, *idx, *ty, text) {
                warn!(error = %err, "cast failure, canceling row");
                return true;
            }
        }
        false
    }

    /// Resolve the row's timestamp: the wall clock if no explicit
    /// timestamp token was emitted, or the trailing token parsed through
    /// `ts_adapter` if one was. Returns `None` (and logs) on parse
    /// failure, meaning no row should be created.
    fn resolve_timestamp(
        &self,
        bound_columns: usize,
        cache: &dyn TokenCache,
        clock: &dyn TimeProvider,
        ts_adapter: &dyn TimestampAdapter,
    ) -> Option<i64> {
        if self.scratch.has_trailing_timestamp(bound_columns) {
            let token = *self.scratch.column_values.last().expect("trailing token present");
            let text = cache.resolve(token);
            match ts_adapter.parse_micros(text) {
                Ok(micros) => Some(micros),
                Err(err) => {
                    warn!(token = text, error = %err, "bad timestamp, dropping row");
                    None
                }
            }
        } else {
            Some(clock.now().timestamp_micros())
        }
    }
}
