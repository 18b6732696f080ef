use criterion::{Criterion, black_box, criterion_group, criterion_main};
use relocalization_judger::dataset::Dataset;
use relocalization_judger::evaluation::roc_curve;
use relocalization_judger::label::LabelThresholds;
use relocalization_judger::split::{SplitConfig, split_and_normalize};
use relocalization_judger::svm::{ModelConfiguration, Svc};
use relocalization_judger::synthetic::{SyntheticConfig, generate_samples};
use relocalization_judger::types::Label;

fn bench_svc_fit(c: &mut Criterion) {
    let samples = generate_samples(
        &SyntheticConfig {
            scenes: 8,
            positions_per_scene: 25,
            noise_features: 2,
            seed: 0,
        },
        &LabelThresholds::default(),
    );
    let dataset = Dataset::from_samples(&samples).unwrap();
    let split = split_and_normalize(&dataset, &SplitConfig::default(), 1).unwrap();
    let train = split.train_normalized;
    let config = ModelConfiguration::rbf(100.0, 1e-6);

    c.bench_function("svc_fit_160", |b| {
        b.iter(|| Svc::fit(black_box(train.features()), black_box(train.labels()), &config))
    });
}

fn bench_roc_curve(c: &mut Criterion) {
    let n = 10_000;
    let labels: Vec<Label> = (0..n)
        .map(|i| if i % 3 == 0 { Label::Success } else { Label::Failure })
        .collect();
    let scores: Vec<f64> = (0..n).map(|i| ((i * 7919) % 1000) as f64 / 1000.0).collect();

    c.bench_function("roc_curve_10k", |b| {
        b.iter(|| roc_curve(black_box(&labels), black_box(&scores)))
    });
}

criterion_group!(benches, bench_svc_fit, bench_roc_curve);
criterion_main!(benches);
