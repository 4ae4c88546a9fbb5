//! Benchmarks for span extraction, citation parsing and highlight lookup.
//!
//! Run with: cargo bench
//!
//! All inputs are synthetic so the numbers are comparable between machines.

use citespan::store::covering_slice;
use citespan::{
    BoundingBox, CitationParser, ExtractOptions, MemorySpanStore, SpanExtractor, SpanRef,
    SpanStore, TextRun,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Builds a run source with `pages` pages of `words` runs each.
fn synthetic_pages(pages: usize, words: usize) -> Vec<Vec<TextRun>> {
    (0..pages)
        .map(|_| {
            (0..words)
                .map(|i| {
                    let x = (i % 12) as f32 * 45.0;
                    let y = 720.0 - (i / 12) as f32 * 14.0;
                    TextRun::new(format!("word{} ", i), BoundingBox::new(x, y, 40.0, 10.0))
                })
                .collect()
        })
        .collect()
}

/// Builds generated prose with a mix of all three marker grammars.
fn synthetic_answer(paragraphs: usize) -> String {
    let mut text = String::new();
    for i in 0..paragraphs {
        text.push_str(&format!(
            "Revenue grew in segment {} [CITATION:Annual Report 2023, page {}, {}, {}]. ",
            i,
            i % 40 + 1,
            i * 10,
            i * 10 + 25
        ));
        text.push_str(&format!("Margins held steady [{}]. ", i % 8 + 1));
        text.push_str("Management noted Citation: \"demand remained strong\" in the outlook. ");
    }
    text
}

/// Benchmark extraction of a prepared run source.
fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction");
    let source = synthetic_pages(20, 400);

    group.bench_function("20_pages_parallel", |b| {
        let extractor = SpanExtractor::new();
        b.iter(|| extractor.extract("doc", black_box(&source)).unwrap());
    });

    group.bench_function("20_pages_sequential", |b| {
        let extractor = SpanExtractor::with_options(ExtractOptions::new().sequential());
        b.iter(|| extractor.extract("doc", black_box(&source)).unwrap());
    });

    group.finish();
}

/// Benchmark citation parsing at various answer lengths.
fn bench_citation_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("citation_parsing");
    let parser = CitationParser::new();
    let list: Vec<SpanRef> = (0..8)
        .map(|i| SpanRef::new("report", i + 1, 0, 20))
        .collect();

    for paragraphs in [1, 10, 100].iter() {
        let text = synthetic_answer(*paragraphs);
        group.bench_function(format!("{}_paragraphs", paragraphs), |b| {
            b.iter(|| parser.parse(black_box(&text), Some(&list)));
        });
    }

    group.bench_function("marker_free", |b| {
        let text = "Plain prose without any markers at all. ".repeat(200);
        b.iter(|| parser.parse(black_box(&text), None));
    });

    group.finish();
}

/// Benchmark covering-span lookup on an indexed page.
fn bench_find_covering(c: &mut Criterion) {
    let extracted = SpanExtractor::new()
        .extract("doc", &synthetic_pages(1, 5_000))
        .unwrap();
    let spans = extracted.pages[0].spans.clone();
    let mid = spans[2_500].start_offset;

    c.bench_function("covering_slice", |b| {
        b.iter(|| covering_slice(black_box(&spans), mid, mid + 60).len());
    });

    let store = MemorySpanStore::new();
    store.save_document(&extracted).unwrap();
    c.bench_function("memory_store_find_covering", |b| {
        b.iter(|| store.find_covering("doc", 1, black_box(mid), mid + 60).unwrap());
    });
}

criterion_group!(
    benches,
    bench_extraction,
    bench_citation_parsing,
    bench_find_covering,
);
criterion_main!(benches);
