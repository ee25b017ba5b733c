use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use ingest_core::test_util::{
    ArenaTokenCache, DecimalMicrosAdapter, InMemoryEngine, TestSecurityContext,
};
use ingest_core::{EventKind, IngestConfig, IngestCore};
use iox_time::{MockProvider, Time};

/// Feed `n` well-formed `cpu` lines through a fresh [`IngestCore`], the
/// first of which creates the table and the rest of which append to it.
fn ingest_lines(n: usize) {
    let mut core = IngestCore::new(IngestConfig::default());
    let engine = InMemoryEngine::new();
    let ctx = TestSecurityContext::default();
    let clock = MockProvider::new(Time::from_timestamp_millis(1_600_000_000_000));
    let ts_adapter = DecimalMicrosAdapter;
    let mut tokens = ArenaTokenCache::new();

    for i in 0..n {
        let m = tokens.intern("cpu");
        core.on_event(EventKind::Measurement, m, &tokens, &engine, &ctx);
        let tag_name = tokens.intern("host");
        core.on_event(EventKind::TagName, tag_name, &tokens, &engine, &ctx);
        let tag_value = tokens.intern("server-1");
        core.on_event(EventKind::TagValue, tag_value, &tokens, &engine, &ctx);
        let field_name = tokens.intern("load");
        core.on_event(EventKind::FieldName, field_name, &tokens, &engine, &ctx);
        let field_value = tokens.intern("0.64");
        core.on_event(EventKind::FieldValue, field_value, &tokens, &engine, &ctx);
        let ts = tokens.intern(&format!("{}", 1_700_000_000_000_000u64 + i as u64));
        core.on_event(EventKind::Timestamp, ts, &tokens, &engine, &ctx);
        core.on_line_end(&tokens, &engine, &ctx, &clock, &ts_adapter);
    }

    core.commit_all().expect("commit_all should not fail");
}

fn ingest_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest_throughput");

    let line = "cpu,host=server-1 load=0.64 1700000000000000";
    group.throughput(Throughput::Bytes(line.len() as u64));
    group.bench_function("append_to_existing_table", |b| {
        b.iter(|| ingest_lines(1_000));
    });

    group.finish();
}

criterion_group!(benches, ingest_benchmarks);
criterion_main!(benches);
