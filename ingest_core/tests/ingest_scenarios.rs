//! End-to-end scenarios against the in-memory [`test_util`] engine,
//! exercising the handful of cases called out in the ingest design: new
//! table creation, schema extension, type mismatch, bad timestamps, table
//! churn with commit grouping, and quoted strings.

use assert_matches::assert_matches;
use ingest_core::engine::{StorageEngine, TimestampAdapter};
use ingest_core::test_util::{
    ArenaTokenCache, DecimalMicrosAdapter, InMemoryEngine, MemValue, TestSecurityContext,
};
use ingest_core::{EventKind, IngestConfig, IngestCore};
use iox_time::{MockProvider, Time, TimeProvider};

struct Harness {
    core: IngestCore,
    engine: InMemoryEngine,
    tokens: ArenaTokenCache,
    ctx: TestSecurityContext,
    clock: MockProvider,
    ts_adapter: DecimalMicrosAdapter,
}

impl Harness {
    fn new() -> Self {
        Self {
            core: IngestCore::new(IngestConfig::default()),
            engine: InMemoryEngine::new(),
            tokens: ArenaTokenCache::new(),
            ctx: TestSecurityContext::default(),
            clock: MockProvider::new(Time::from_timestamp_millis(1_600_000_000_000)),
            ts_adapter: DecimalMicrosAdapter,
        }
    }

    fn event(&mut self, kind: EventKind, text: &str) {
        let token = self.tokens.intern(text);
        self.core
            .on_event(kind, token, &self.tokens, &self.engine, &self.ctx);
    }

    fn line_end(&mut self) {
        self.core
            .on_line_end(&self.tokens, &self.engine, &self.ctx, &self.clock, &self.ts_adapter);
    }

    fn commit_all(&mut self) {
        self.core.commit_all().expect("commit_all should not fail");
    }
}

use ingest_core::EventKind::*;

#[test]
fn new_table_with_typed_fields() {
    let mut h = Harness::new();

    h.event(Measurement, "cpu");
    h.event(TagName, "host");
    h.event(TagValue, "A");
    h.event(FieldName, "load");
    h.event(FieldValue, "0.5");
    h.event(FieldName, "count");
    h.event(FieldValue, "3i");
    h.event(Timestamp, "1700000000000000");
    h.line_end();
    h.commit_all();

    assert!(h.engine.has_table("cpu"));
    let rows = h.engine.committed_rows("cpu").unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.micros, h.ts_adapter.parse_micros("1700000000000000").unwrap());
    assert_eq!(row.values[0], (0, MemValue::Sym("A".to_string())));
    assert_eq!(row.values[1], (1, MemValue::Double(0.5)));
    assert_eq!(row.values[2], (2, MemValue::Long(3)));
}

#[test]
fn existing_table_schema_extension() {
    let mut h = Harness::new();

    // First line creates `cpu` with host, load.
    h.event(Measurement, "cpu");
    h.event(TagName, "host");
    h.event(TagValue, "A");
    h.event(FieldName, "load");
    h.event(FieldValue, "0.5");
    h.event(Timestamp, "1700000000000000");
    h.line_end();

    // Second line adds a new field `temp`, no explicit timestamp.
    h.event(Measurement, "cpu");
    h.event(TagName, "host");
    h.event(TagValue, "B");
    h.event(FieldName, "load");
    h.event(FieldValue, "1.0");
    h.event(FieldName, "temp");
    h.event(FieldValue, "42.5");
    h.line_end();
    h.commit_all();

    let rows = h.engine.committed_rows("cpu").unwrap();
    assert_eq!(rows.len(), 2);
    let second = &rows[1];
    assert_eq!(second.micros, h.clock.now().timestamp_micros());
    assert_eq!(second.values[0], (0, MemValue::Sym("B".to_string())));
    assert_eq!(second.values[1], (1, MemValue::Double(1.0)));
    assert_eq!(second.values[2], (2, MemValue::Double(42.5)));
}

#[test]
fn type_mismatch_drops_line_but_keeps_writer_usable() {
    let mut h = Harness::new();

    h.event(Measurement, "cpu");
    h.event(FieldName, "load");
    h.event(FieldValue, "0.5");
    h.event(Timestamp, "1700000000000000");
    h.line_end();

    // load is DOUBLE; sending a BOOLEAN should mismatch and drop the line.
    h.event(Measurement, "cpu");
    h.event(FieldName, "load");
    h.event(FieldValue, "true");
    h.line_end();

    // A well-formed line afterwards still appends normally.
    h.event(Measurement, "cpu");
    h.event(FieldName, "load");
    h.event(FieldValue, "9.9");
    h.event(Timestamp, "1700000000000001");
    h.line_end();
    h.commit_all();

    let rows = h.engine.committed_rows("cpu").unwrap();
    assert_eq!(rows.len(), 2);
    assert_matches!(&rows[1].values[0], (0, MemValue::Double(v)) if (*v - 9.9).abs() < f64::EPSILON);
}

#[test]
fn bad_timestamp_drops_row_but_not_subsequent_lines() {
    let mut h = Harness::new();

    h.event(Measurement, "cpu");
    h.event(FieldName, "load");
    h.event(FieldValue, "0.5");
    h.event(Timestamp, "notanumber");
    h.line_end();

    h.event(Measurement, "cpu");
    h.event(FieldName, "load");
    h.event(FieldValue, "0.6");
    h.event(Timestamp, "1700000000000002");
    h.line_end();
    h.commit_all();

    let rows = h.engine.committed_rows("cpu").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].values[0], (0, MemValue::Double(0.6)));
}

#[test]
fn table_churn_groups_commits_across_writers() {
    let mut h = Harness::new();

    for i in 0..5 {
        h.event(Measurement, "cpu");
        h.event(FieldName, "load");
        h.event(FieldValue, "1.0");
        h.event(Timestamp, &format!("170000000000000{i}"));
        h.line_end();

        h.event(Measurement, "mem");
        h.event(FieldName, "used");
        h.event(FieldValue, "2.0");
        h.event(Timestamp, &format!("170000000000001{i}"));
        h.line_end();
    }

    h.commit_all();

    assert_eq!(h.engine.committed_rows("cpu").unwrap().len(), 5);
    assert_eq!(h.engine.committed_rows("mem").unwrap().len(), 5);

    // Commit idempotence: a second commit_all with no intervening events
    // changes nothing further.
    h.commit_all();
    assert_eq!(h.engine.committed_rows("cpu").unwrap().len(), 5);
    assert_eq!(h.engine.committed_rows("mem").unwrap().len(), 5);
}

#[test]
fn quoted_string_field_has_quotes_stripped() {
    let mut h = Harness::new();

    h.event(Measurement, "log");
    h.event(FieldName, "msg");
    h.event(FieldValue, "\"hello\"");
    h.event(Timestamp, "1700000000000000");
    h.line_end();
    h.commit_all();

    let rows = h.engine.committed_rows("log").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].values[0], (0, MemValue::Str("hello".to_string())));
}

/// A [`StorageEngine`] wrapper that reports [`TableStatus::Unknown`] for one
/// poisoned table name and otherwise delegates to an [`InMemoryEngine`].
#[derive(Debug)]
struct PoisonedNameEngine {
    inner: InMemoryEngine,
    poisoned: &'static str,
}

impl StorageEngine for PoisonedNameEngine {
    fn get_status(
        &self,
        security_ctx: &dyn ingest_core::engine::SecurityContext,
        name: &str,
    ) -> ingest_core::engine::TableStatus {
        if name == self.poisoned {
            ingest_core::engine::TableStatus::Unknown
        } else {
            self.inner.get_status(security_ctx, name)
        }
    }

    fn get_writer(
        &self,
        security_ctx: &dyn ingest_core::engine::SecurityContext,
        name: &str,
    ) -> Result<Box<dyn ingest_core::engine::TableWriter>, ingest_core::engine::EngineError> {
        self.inner.get_writer(security_ctx, name)
    }

    fn create_table(
        &self,
        security_ctx: &dyn ingest_core::engine::SecurityContext,
        structure: &dyn ingest_core::engine::TableStructure,
    ) -> Result<(), ingest_core::engine::EngineError> {
        self.inner.create_table(security_ctx, structure)
    }
}

#[test]
fn unusable_table_produces_zero_rows_for_every_subsequent_line() {
    let mut core = IngestCore::new(IngestConfig::default());
    let engine = PoisonedNameEngine {
        inner: InMemoryEngine::new(),
        poisoned: "cpu",
    };
    let mut tokens = ArenaTokenCache::new();
    let ctx = TestSecurityContext::default();
    let clock = MockProvider::new(Time::from_timestamp_millis(1_600_000_000_000));
    let ts_adapter = DecimalMicrosAdapter;

    for i in 0..3 {
        let m = tokens.intern("cpu");
        core.on_event(Measurement, m, &tokens, &engine, &ctx);
        let fname = tokens.intern("load");
        core.on_event(FieldName, fname, &tokens, &engine, &ctx);
        let fval = tokens.intern("1.0");
        core.on_event(FieldValue, fval, &tokens, &engine, &ctx);
        let ts = tokens.intern(&format!("170000000000000{i}"));
        core.on_event(Timestamp, ts, &tokens, &engine, &ctx);
        core.on_line_end(&tokens, &engine, &ctx, &clock, &ts_adapter);
    }
    core.commit_all().unwrap();

    // Never created, since every line was SkipLine from the first
    // Unknown status onward.
    assert!(!engine.inner.has_table("cpu"));
    assert_matches!(engine.inner.committed_rows("cpu"), None);
}
