//! Benchmarks for the rating transform and model training
//!
//! Run with: cargo bench --package factorization
//!
//! Uses a synthetic corpus so no snapshot files are needed.

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_loader::RatingEvent;
use factorization::{LatentFactorModel, ModelConfig, TransformConfig, transform_ratings};

const USERS: usize = 500;
const RESTAURANTS: usize = 200;

fn synthetic_events() -> Vec<RatingEvent> {
    let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    (0..USERS)
        .flat_map(|u| {
            (0..RESTAURANTS)
                .filter(move |r| (u * 7 + r * 13) % 10 == 0)
                .map(move |r| {
                    RatingEvent::new(format!("u{u}"), format!("r{r}"), ((u + r) % 5 + 1) as f64)
                        .at(base + Duration::days(((u * r) % 300) as i64))
                        .with_helpful_votes((r % 4) as u32)
                })
        })
        .collect()
}

fn bench_transform(c: &mut Criterion) {
    let events = synthetic_events();
    let now = Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap();
    let config = TransformConfig::default();

    c.bench_function("transform_ratings", |b| {
        b.iter(|| black_box(transform_ratings(black_box(&events), now, &config)))
    });
}

fn bench_train(c: &mut Criterion) {
    let events = synthetic_events();
    let now = Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap();
    let signals = transform_ratings(&events, now, &TransformConfig::default());
    let config = ModelConfig::default().with_seed(42);

    c.bench_function("train_default_config", |b| {
        b.iter(|| black_box(LatentFactorModel::train(black_box(&signals), &config).unwrap()))
    });
}

fn bench_predict(c: &mut Criterion) {
    let events = synthetic_events();
    let now = Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap();
    let signals = transform_ratings(&events, now, &TransformConfig::default());
    let model = LatentFactorModel::train(&signals, &ModelConfig::default().with_seed(42))
        .unwrap()
        .expect("non-empty corpus");

    c.bench_function("predict_all_restaurants_for_user", |b| {
        b.iter(|| {
            let total: f64 = (0..RESTAURANTS)
                .map(|r| model.predict(black_box("u17"), &format!("r{r}")))
                .sum();
            black_box(total)
        })
    });
}

criterion_group!(benches, bench_transform, bench_train, bench_predict);
criterion_main!(benches);
