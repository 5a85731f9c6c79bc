//! Benchmarks for the digest loop.
//!
//! Run with: `cargo bench --package ngl-runtime --bench digest_bench`
//!
//! # Performance Baselines
//!
//! - Clean digest: every watcher evaluated once, nothing fires
//! - Dirty digest: one change per watcher, followed by the confirming pass
//! - Deep trees: one watcher per scope, digest recursing through children

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use ngl_core::{Object, Value};
use ngl_runtime::Scope;

// ============================================================================
// Fixtures
// ============================================================================

/// A root scope with `count` watchers over `items[i].value + offset`.
fn watched_scope(count: usize) -> Scope {
    let scope = Scope::new();
    let items: Vec<Value> = (0..count)
        .map(|i| Value::from(Object::new().with("value", i as f64)))
        .collect();
    scope.set("items", items);
    scope.set("offset", 0);
    for i in 0..count {
        scope.watch(format!("items[{i}].value + offset"), |_| {});
    }
    scope.digest();
    scope
}

/// A chain of `depth` nested scopes, each watching the root's `tick`.
fn nested_scopes(depth: usize) -> Scope {
    let root = Scope::new();
    root.set("tick", 0);
    let mut current = root.clone();
    for _ in 0..depth {
        current = current.new_child();
        current.watch("tick", |_| {});
    }
    root
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_clean_digest(c: &mut Criterion) {
    let mut group = c.benchmark_group("digest_clean");

    for count in [10, 100, 1_000] {
        let scope = watched_scope(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &scope, |b, scope| {
            b.iter(|| black_box(scope).digest());
        });
    }

    group.finish();
}

fn bench_dirty_digest(c: &mut Criterion) {
    let mut group = c.benchmark_group("digest_dirty");

    for count in [10, 100, 1_000] {
        let scope = watched_scope(count);
        let mut offset = 0;
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &scope, |b, scope| {
            b.iter(|| {
                offset += 1;
                scope.set("offset", offset);
                black_box(scope).digest();
            });
        });
    }

    group.finish();
}

fn bench_nested_digest(c: &mut Criterion) {
    let mut group = c.benchmark_group("digest_nested");

    for depth in [8, 64, 256] {
        let root = nested_scopes(depth);
        let mut tick = 0;
        group.bench_with_input(BenchmarkId::from_parameter(depth), &root, |b, root| {
            b.iter(|| {
                tick += 1;
                root.set("tick", tick);
                black_box(root).digest();
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_clean_digest,
    bench_dirty_digest,
    bench_nested_digest,
);

criterion_main!(benches);
