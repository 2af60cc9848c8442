// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `understory_mutation` dispatch, raw and through the element tree.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use understory_element::Tree;
use understory_mutation::{DispatchTable, MutationEvent, MutationKey};
use understory_property::{Category, WATCH_ALL};
use understory_value::Value;

fn bench_mutation(c: &mut Criterion) {
    let mut group = c.benchmark_group("mutation/table");

    for handlers in [1_u32, 8, 64] {
        let mut table: DispatchTable<u32, u32> = DispatchTable::new();
        for owner in 0..handlers {
            table.add(MutationKey::new(0, Category::Data, "x"), owner, owner);
            table.add(MutationKey::new(0, Category::Data, WATCH_ALL), owner, owner);
        }
        let event = MutationEvent::new(
            MutationKey::new(0, Category::Data, "x"),
            Value::from(1),
            None,
        );
        group.bench_function(BenchmarkId::new("dispatch", handlers), |b| {
            b.iter(|| {
                table.dispatch(&event, |&handler, event| {
                    black_box((handler, event.property()));
                    false
                })
            });
        });
        group.bench_function(BenchmarkId::new("snapshot", handlers), |b| {
            b.iter(|| black_box(table.snapshot(&event.key)));
        });
    }

    group.finish();

    let mut group = c.benchmark_group("mutation/tree");

    for watchers in [0_u32, 1, 16] {
        let mut tree = Tree::new();
        let target = tree.create();
        for _ in 0..watchers {
            let watcher = tree.create();
            tree.watch(watcher, target, Category::Data, "x", |_, event| {
                black_box(&event.new_value);
                false
            });
        }
        let mut n = 0_u32;
        group.bench_function(BenchmarkId::new("set", watchers), |b| {
            b.iter(|| {
                n = n.wrapping_add(1);
                tree.set(target, Category::Data, "x", Value::from(n));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_mutation);
criterion_main!(benches);
