//! Pipeline benchmark: detections → behavior records (and the full frame with verdicts).

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use drive_risk::config::{AnalyzerConfig, BehaviorConfig};
use drive_risk::features::BehaviorAnalyzer;
use drive_risk::model::{RiskClassifier, SharedClassifier};
use drive_risk::pipeline::RiskPipeline;
use drive_risk::Detection;

fn make_frame(frame: usize, vehicles: u64) -> Vec<Detection> {
    (0..vehicles)
        .map(|id| {
            let t = frame as f64;
            let x = t * (2.0 + id as f64 * 0.5);
            let y = 100.0 + (t * 0.7 + id as f64).sin() * 40.0;
            Detection::new(id, (x, y))
        })
        .collect()
}

fn bench_analyze(c: &mut Criterion) {
    let frames: Vec<Vec<Detection>> = (0..60).map(|f| make_frame(f, 20)).collect();

    c.bench_function("analyze_60_frames_20_vehicles", |b| {
        b.iter(|| {
            let mut analyzer = BehaviorAnalyzer::new(BehaviorConfig::default());
            for f in &frames {
                black_box(analyzer.analyze(black_box(f), 720.0));
            }
        })
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let config = AnalyzerConfig::default();
    let classifier = SharedClassifier::new(RiskClassifier::new(config.classifier.clone()));
    classifier.ensure_trained().unwrap();
    let frames: Vec<Vec<Detection>> = (0..30).map(|f| make_frame(f, 10)).collect();

    c.bench_function("full_pipeline_30_frames_10_vehicles", |b| {
        b.iter(|| {
            let mut pipeline = RiskPipeline::new(&config, classifier.clone());
            for f in &frames {
                black_box(pipeline.process_frame(f, 720.0).unwrap());
            }
        })
    });
}

criterion_group!(benches, bench_analyze, bench_full_pipeline);
criterion_main!(benches);
