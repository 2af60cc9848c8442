// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for event propagation through `understory_element` trees.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use understory_element::{ElementId, Tree};
use understory_responder::{Event, EventFlags, ListenerFlags, dispatcher};
use understory_value::Value;

/// A chain of `depth` elements with a capture and a bubble listener on each.
fn chain(depth: usize) -> (Tree, ElementId) {
    let mut tree = Tree::new();
    let mut parent = tree.create();
    for _ in 1..depth {
        let child = tree.create();
        tree.append_child(parent, child);
        parent = child;
    }
    let mut node = Some(parent);
    while let Some(id) = node {
        tree.add_event_listener(id, "press", ListenerFlags::CAPTURE, |_, event| {
            black_box(event.phase());
        });
        tree.add_event_listener(id, "press", ListenerFlags::empty(), |_, event| {
            black_box(event.phase());
        });
        node = tree.parent(id);
    }
    (tree, parent)
}

fn bench_propagation(c: &mut Criterion) {
    let mut group = c.benchmark_group("propagation/sequence");

    for depth in [4_usize, 16, 64] {
        let path: Vec<u32> = (0..depth as u32).collect();
        group.bench_function(BenchmarkId::new("bubbling", depth), |b| {
            b.iter(|| black_box(dispatcher::sequence(black_box(&path), true)));
        });
    }

    group.finish();

    let mut group = c.benchmark_group("propagation/tree");

    for depth in [4_usize, 16, 64] {
        let (mut tree, leaf) = chain(depth);
        group.bench_function(BenchmarkId::new("dispatch", depth), |b| {
            b.iter(|| {
                let mut event =
                    Event::new("press", leaf, EventFlags::BUBBLES, Value::from(true));
                black_box(tree.dispatch_event(&mut event))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_propagation);
criterion_main!(benches);
