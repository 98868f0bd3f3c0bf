// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the blattwerk-document crate.  Benchmarks the
// two-pass pagination planner on a synthetic book-sized outline.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use blattwerk_core::types::{OutlineEntry, PageGeometry};
use blattwerk_document::plan;

/// Benchmark pagination planning over a 2000-entry, three-level outline,
/// roughly a large technical manual.  Both passes run per call, so this
/// measures the full count-then-place cost.
fn bench_pagination_plan(c: &mut Criterion) {
    let outline: Vec<OutlineEntry> = (1..=2000u32)
        .map(|i| OutlineEntry {
            level: 1 + (i % 3),
            title: format!("Section {i}"),
            target_page: i,
        })
        .collect();

    c.bench_function("pagination_plan (2000 entries)", |b| {
        b.iter(|| {
            let plan = plan(
                black_box(&outline),
                PageGeometry::a4(),
                12.0,
                "Table of Contents",
            );
            black_box(plan.toc_page_count);
        });
    });
}

criterion_group!(benches, bench_pagination_plan);
criterion_main!(benches);
