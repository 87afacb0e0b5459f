//! Criterion benchmarks for rust_logger_registry

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rust_logger_registry::prelude::*;

fn sink_registry(name: &str, level: LevelFilter, pattern: Option<&str>) -> LoggerRegistry {
    let registry = LoggerRegistry::initialized();
    registry
        .add_stream_destination(std::io::sink(), name, level, pattern)
        .unwrap();
    registry
}

// ============================================================================
// Pattern Rendering Benchmarks
// ============================================================================

fn bench_pattern_rendering(c: &mut Criterion) {
    let mut group = c.benchmark_group("pattern_rendering");
    group.throughput(Throughput::Elements(1));

    let entry = LogEntry::new(LogLevel::Info, "com.example.service.core", "Request handled")
        .with_location("src/service/core.rs", 128);

    let default_layout = PatternLayout::compile(DEFAULT_PATTERN).unwrap();
    group.bench_function("default_pattern", |b| {
        b.iter(|| black_box(default_layout.render(black_box(&entry))));
    });

    let syslog_layout = PatternLayout::compile(SYSLOG_PATTERN).unwrap();
    group.bench_function("syslog_pattern", |b| {
        b.iter(|| black_box(syslog_layout.render(black_box(&entry))));
    });

    let message_only = PatternLayout::compile("%msg%n").unwrap();
    group.bench_function("message_only", |b| {
        b.iter(|| black_box(message_only.render(black_box(&entry))));
    });

    group.bench_function("compile_default", |b| {
        b.iter(|| black_box(PatternLayout::compile(black_box(DEFAULT_PATTERN)).unwrap()));
    });

    group.finish();
}

// ============================================================================
// Log Entry Creation Benchmarks
// ============================================================================

fn bench_log_entry_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("log_entry_creation");
    group.throughput(Throughput::Elements(1));

    group.bench_function("new", |b| {
        b.iter(|| {
            let entry = LogEntry::new(
                black_box(LogLevel::Info),
                black_box("svc.core"),
                black_box("Test message"),
            );
            black_box(entry)
        });
    });

    group.bench_function("needs_escaping", |b| {
        b.iter(|| {
            let entry = LogEntry::new(
                black_box(LogLevel::Info),
                black_box("svc.core"),
                black_box("line one\nline two\tcolumn"),
            );
            black_box(entry)
        });
    });

    group.finish();
}

// ============================================================================
// Registry Dispatch Benchmarks
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Elements(1));

    let registry = sink_registry("svc.core", LevelFilter::Info, None);
    let direct = registry.logger("svc.core");
    group.bench_function("direct_logger", |b| {
        b.iter(|| direct.info(black_box("Dispatched message")));
    });

    let nested = registry.logger("svc.core.handlers.http.v1");
    group.bench_function("inherited_logger", |b| {
        b.iter(|| nested.info(black_box("Dispatched message")));
    });

    group.finish();
}

// ============================================================================
// Filtering Benchmarks
// ============================================================================

fn bench_level_filtering(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_filtering");
    group.throughput(Throughput::Elements(1));

    let registry = sink_registry("svc", LevelFilter::Warn, Some("%msg%n"));
    let logger = registry.logger("svc");

    group.bench_function("below_threshold", |b| {
        b.iter(|| {
            logger.debug(black_box("This should be filtered"));
        });
    });

    group.bench_function("above_threshold", |b| {
        b.iter(|| {
            logger.error(black_box("This should be logged"));
        });
    });

    group.finish();
}

// ============================================================================
// Concurrent Logging Benchmarks
// ============================================================================

fn bench_concurrent_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_logging");

    let registry = sink_registry("svc", LevelFilter::Info, Some("%thread %msg%n"));

    group.bench_function("multi_thread_4", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let logger = registry.logger("svc");
                    std::thread::spawn(move || {
                        for _ in 0..100 {
                            logger.info(black_box("Concurrent message"));
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }
        });
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_pattern_rendering,
    bench_log_entry_creation,
    bench_dispatch,
    bench_level_filtering,
    bench_concurrent_logging
);

criterion_main!(benches);
