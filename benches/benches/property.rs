// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `understory_property` resolution and `understory_value` copy-on-write.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::sync::Once;

use understory_property::{Category, PropertyStore, Tier};
use understory_value::{Object, Value};

fn bench_property(c: &mut Criterion) {
    static PRINT_SIZES: Once = Once::new();
    PRINT_SIZES.call_once(|| {
        eprintln!(
            "sizes: PropertyStore<u32>={} Value={}",
            core::mem::size_of::<PropertyStore<u32>>(),
            core::mem::size_of::<Value>(),
        );
    });

    let mut group = c.benchmark_group("property/resolve");

    let mut store = PropertyStore::new(1_u32);
    store.set_default(Category::Ui, "width", Value::from(0));
    group.bench_function("default", |b| {
        b.iter(|| black_box(store.get(Category::Ui, black_box("width"))));
    });

    store.set(Category::Ui, "width", Value::from(100), false);
    group.bench_function("local", |b| {
        b.iter(|| black_box(store.get(Category::Ui, black_box("width"))));
    });

    store.set(Category::Ui, "width", Value::from(200), true);
    group.bench_function("inheritable", |b| {
        b.iter(|| black_box(store.resolve(Category::Ui, black_box("width"))));
    });

    group.bench_function("missing", |b| {
        b.iter(|| black_box(store.get(Category::Ui, black_box("height"))));
    });

    for count in [8_u32, 64, 512] {
        let mut wide = PropertyStore::new(1_u32);
        for i in 0..count {
            wide.set_in(Category::Data, Tier::Local, format!("p{i}"), Value::from(i));
        }
        let probe = format!("p{}", count / 2);
        group.bench_function(BenchmarkId::new("local_among", count), |b| {
            b.iter(|| black_box(wide.get(Category::Data, black_box(&probe))));
        });
    }

    group.finish();

    let mut group = c.benchmark_group("property/inherit");

    for count in [8_u32, 64] {
        let mut parent = PropertyStore::new(0_u32);
        for i in 0..count {
            parent.set(Category::Ui, format!("p{i}"), Value::from(i), true);
        }
        group.bench_function(BenchmarkId::new("attach", count), |b| {
            b.iter_batched(
                || PropertyStore::new(1_u32),
                |mut child| {
                    child.inherit(&parent);
                    black_box(child);
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();

    let mut group = c.benchmark_group("value/copy_on_write");

    let object: Object = (0..32_u32)
        .map(|i| (format!("k{i}"), Value::from(i)))
        .collect();
    let value = Value::from(object);

    group.bench_function("clone_shared", |b| {
        b.iter(|| black_box(value.clone()));
    });

    group.bench_function("edit_one_field", |b| {
        b.iter_batched(
            || value.clone(),
            |shared| {
                let Some(object) = shared.as_object() else {
                    return;
                };
                let mut temp = object.make_copy();
                temp.insert("k0", Value::from("changed"));
                black_box(temp.commit());
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_property);
criterion_main!(benches);
