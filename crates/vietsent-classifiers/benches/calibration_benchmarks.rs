//! Latency benchmarks for the normalize -> score -> calibrate path
//!
//! Run with: cargo bench -p vietsent-classifiers

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use tokio::runtime::Runtime;

use vietsent_classifiers::{
    calibrate, lexical_score, normalize_text, LexiconModel, SentimentAnalyzer,
};

const TEST_CASES: &[(&str, &str)] = &[
    ("short_positive", "Hôm nay tôi rất vui"),
    ("short_negative", "Món ăn này dở quá"),
    ("teencode", "hok biet dc dau, zui wa ko"),
    (
        "long_mixed",
        "Sản phẩm giao hơi chậm nhưng chất lượng tốt, đóng gói đẹp, nhân viên dễ thương. \
         Tuy vậy giá hơi cao và hướng dẫn sử dụng khó hiểu, lần sau sẽ cân nhắc.",
    ),
];

fn benchmark_pipeline_steps(c: &mut Criterion) {
    let mut group = c.benchmark_group("Calibration_Pipeline");
    group.sample_size(100);

    for (name, text) in TEST_CASES {
        group.bench_with_input(BenchmarkId::new("normalize", name), text, |b, text| {
            b.iter(|| normalize_text(black_box(text)))
        });

        let normalized = normalize_text(text);
        group.bench_with_input(BenchmarkId::new("lexical_score", name), &normalized, |b, text| {
            b.iter(|| lexical_score(black_box(text)))
        });

        let score = lexical_score(&normalized);
        group.bench_with_input(BenchmarkId::new("calibrate", name), &score, |b, score| {
            b.iter(|| calibrate(black_box("LABEL_1"), black_box(0.8), black_box(*score)))
        });
    }

    group.finish();
}

fn benchmark_analyzer(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let model = Arc::new(LexiconModel::new().expect("Failed to create lexicon model"));
    let analyzer = SentimentAnalyzer::new(model);

    let mut group = c.benchmark_group("Analyzer_Builtin_Model");
    for (name, text) in TEST_CASES {
        group.bench_with_input(BenchmarkId::new("analyze", name), text, |b, text| {
            b.iter(|| rt.block_on(async { analyzer.analyze(black_box(text)).await }))
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_pipeline_steps, benchmark_analyzer);
criterion_main!(benches);
