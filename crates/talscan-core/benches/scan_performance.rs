//! Scanner performance benchmarks
//!
//! Scan time should stay linear in line count:
//! - 1,000 lines: well under 1ms per view
//! - 20,000 lines: under 20ms per view

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;
use talscan_core::{Document, FoldingAnalyzer, Scanner, SymbolAnalyzer};
use tokio_util::sync::CancellationToken;

/// Synthetic module with `proc_count` procs, each carrying two subprocs,
/// a toggle and a comment banner
fn generate_module(proc_count: usize) -> String {
    let mut source = String::from("?section declarations\nint counter;\nstring .buffer[0:79];\n");

    for i in 0..proc_count {
        source.push_str(&format!(
            r#"-- ------------------------------------------
-- proc_{i}: generated body
-- ------------------------------------------
int proc proc_{i} (a, b) main;
  int a;
  int .b;
begin
  int local;

  subproc helper_{i}a;
  begin
    local := a + 1;
  end;

  subproc helper_{i}b;
  begin
    if local > 0 then begin
      call helper_{i}a;
    end;
  end;

?if trace_{i}
  call debug_print ("entering proc_{i}");
?endif trace_{i}
  call helper_{i}b; ! inline note !
  return local;
end;

"#
        ));
    }

    source
}

fn bench_analyzers(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyzers");
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(3));

    for proc_count in [40, 800] {
        let source = generate_module(proc_count);
        let lines: Vec<&str> = source.lines().collect();

        group.bench_with_input(BenchmarkId::new("folding", lines.len()), &lines, |b, lines| {
            b.iter(|| black_box(FoldingAnalyzer::generate_ranges(black_box(lines.as_slice()))))
        });

        group.bench_with_input(BenchmarkId::new("symbols", lines.len()), &lines, |b, lines| {
            b.iter(|| black_box(SymbolAnalyzer::extract_symbols(black_box(lines.as_slice()))))
        });
    }

    group.finish();
}

fn bench_scanner_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("scanner");
    group.warm_up_time(Duration::from_millis(200));
    group.measurement_time(Duration::from_secs(2));

    let doc = Document::new("file:///bench/module.tal", 1, &generate_module(200));
    let cancel = CancellationToken::new();

    group.bench_function("cold_symbols", |b| {
        b.iter(|| {
            let scanner = Scanner::new();
            black_box(scanner.document_symbols(black_box(&doc), &cancel))
        });
    });

    group.bench_function("cached_symbols", |b| {
        let scanner = Scanner::new();
        let _ = scanner.document_symbols(&doc, &cancel);
        b.iter(|| black_box(scanner.document_symbols(black_box(&doc), &cancel)));
    });

    group.bench_function("narrowing_span", |b| {
        let scanner = Scanner::new();
        let _ = scanner.document_symbols(&doc, &cancel);
        b.iter(|| black_box(scanner.narrowing_span(doc.uri(), black_box(3000))));
    });

    group.finish();
}

criterion_group!(benches, bench_analyzers, bench_scanner_cache);
criterion_main!(benches);
