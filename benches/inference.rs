//! Inference benchmark: behavior records → feature matrix → classifier verdicts.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use drive_risk::config::ClassifierConfig;
use drive_risk::model::{RiskClassifier, TrainingSource};
use drive_risk::{BehaviorRecord, FrameBehaviors, Point, RiskLevel};

fn make_frame(n: u64) -> FrameBehaviors {
    (0..n)
        .map(|i| {
            let score = (i * 7 % 101) as u32;
            let record = BehaviorRecord {
                speed: (i % 150) as f64,
                acceleration: if i % 3 == 0 { None } else { Some((i % 40) as f64 - 20.0) },
                lane_changes: (i % 4) as u32,
                erratic_movements: (i % 3) as u32,
                behavior_score: score,
                risk_level: RiskLevel::from_score(score),
                center: Point::new(i as f64, i as f64),
            };
            (i, record)
        })
        .collect()
}

fn trained() -> RiskClassifier {
    let mut c = RiskClassifier::new(ClassifierConfig::default());
    c.train(TrainingSource::Synthetic).unwrap();
    c
}

fn bench_predict_by_frame_size(c: &mut Criterion) {
    let classifier = trained();
    let mut g = c.benchmark_group("predict_by_tracks");
    for n in [1, 10, 50] {
        let frame = make_frame(n);
        g.bench_function(format!("tracks_{}", n).as_str(), |b| {
            b.iter(|| classifier.predict_trained(black_box(&frame)).unwrap())
        });
    }
    g.finish();
}

fn bench_train_synthetic(c: &mut Criterion) {
    let mut g = c.benchmark_group("train");
    g.sample_size(10);
    g.bench_function("synthetic_100_trees", |b| {
        b.iter(|| {
            let mut classifier = RiskClassifier::new(ClassifierConfig::default());
            black_box(classifier.train(TrainingSource::Synthetic).unwrap())
        })
    });
    g.finish();
}

criterion_group!(benches, bench_predict_by_frame_size, bench_train_synthetic);
criterion_main!(benches);
