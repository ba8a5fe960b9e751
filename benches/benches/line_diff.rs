//! Benchmarks for the line algorithms in `textdiff`.
//!
//! Performance-critical paths:
//! - `line_diff`: Myers diff over interned lines, by file size and edit density
//! - `diff3_merge`: combining two diffs against a common base
//! - `intern_text`: splitting and interning file contents

#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use textdiff::{LineHash, LineInterner, diff3_merge, line_diff};

/// Source-like text with `lines` lines.
fn source_text(lines: usize) -> String {
    (0..lines)
        .map(|i| format!("    let value_{i} = compute({i}, {});\n", i % 17))
        .collect()
}

/// Replaces every `stride`-th line, starting at `offset`.
fn edit(text: &str, stride: usize, offset: usize, tag: &str) -> String {
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            if i % stride == offset {
                format!("{line} // {tag}\n")
            } else {
                format!("{line}\n")
            }
        })
        .collect()
}

fn intern(interner: &mut LineInterner, text: &str) -> Vec<LineHash> {
    interner.intern_text(text)
}

fn bench_line_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("textdiff/line_diff");

    // (lines, edit every n-th line)
    let cases = [(1_000usize, 100usize), (10_000, 1_000), (10_000, 50), (50_000, 5_000)];

    for (lines, stride) in cases {
        let base = source_text(lines);
        let changed = edit(&base, stride, 3, "changed");
        let mut interner = LineInterner::new();
        let a = intern(&mut interner, &base);
        let b = intern(&mut interner, &changed);

        group.throughput(Throughput::Elements(lines as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{lines}_lines_every_{stride}")),
            &(a, b),
            |bench, (a, b)| bench.iter(|| line_diff(black_box(a), black_box(b))),
        );
    }

    group.finish();
}

fn bench_diff3_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("textdiff/diff3_merge");

    for lines in [1_000usize, 10_000, 50_000] {
        let base = source_text(lines);
        let local = edit(&base, 97, 5, "local");
        let remote = edit(&base, 89, 40, "remote");
        let mut interner = LineInterner::new();
        let base = intern(&mut interner, &base);
        let local = intern(&mut interner, &local);
        let remote = intern(&mut interner, &remote);
        let diff_local = line_diff(&base, &local);
        let diff_remote = line_diff(&base, &remote);

        group.throughput(Throughput::Elements(lines as u64));
        group.bench_function(format!("{lines}_lines"), |b| {
            b.iter(|| {
                diff3_merge(
                    black_box(&diff_local),
                    black_box(&diff_remote),
                    &local,
                    &remote,
                )
            });
        });
    }

    group.finish();
}

fn bench_intern_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("textdiff/intern_text");

    for lines in [1_000usize, 10_000, 100_000] {
        let text = source_text(lines);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_function(format!("{lines}_lines"), |b| {
            b.iter(|| LineInterner::new().intern_text(black_box(&text)).len());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_line_diff,
    bench_diff3_merge,
    bench_intern_text
);

criterion_main!(benches);
