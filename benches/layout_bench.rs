//! Criterion benchmarks for the Euler diagram layout engine.
//!
//! Run with: `cargo bench`

use criterion::{criterion_group, criterion_main, Criterion};
use edeap_engine::geometry::EllipseParams;
use edeap_engine::layout::layout;
use edeap_engine::sampler::{AreaSampler, SampleOptions};
use edeap_engine::stress::zone_areas;
use edeap_engine::types::{LayoutParams, SamplerSettings};

// -- JSON fixtures --

/// Three sets with every overlap, 60 hill-climbing steps.
const THREE_SET_HC_JSON: &str = r#"{
  "seed": 42,
  "diagram": {
    "zones": [
      {"labels": ["a"], "proportion": 0.3},
      {"labels": ["b"], "proportion": 0.2},
      {"labels": ["c"], "proportion": 0.2},
      {"labels": ["a", "b"], "proportion": 0.1},
      {"labels": ["a", "c"], "proportion": 0.1},
      {"labels": ["b", "c"], "proportion": 0.05},
      {"labels": ["a", "b", "c"], "proportion": 0.05}
    ]
  },
  "optimizer": {"strategy": "hill_climbing", "max_steps": 60},
  "label_positions": false
}"#;

/// Four sets, full annealing schedule, split zones tracked.
const FOUR_SET_SA_JSON: &str = r#"{
  "seed": 7,
  "diagram": {
    "zones": [
      {"labels": ["a"], "proportion": 0.25},
      {"labels": ["b"], "proportion": 0.2},
      {"labels": ["c"], "proportion": 0.15},
      {"labels": ["d"], "proportion": 0.1},
      {"labels": ["a", "b"], "proportion": 0.1},
      {"labels": ["b", "c"], "proportion": 0.1},
      {"labels": ["c", "d"], "proportion": 0.1}
    ]
  },
  "initial_layout": {"kind": "random", "max_x": 3.0, "max_y": 3.0},
  "optimizer": {
    "strategy": "simulated_annealing",
    "sampler": {"track_split_zones": true},
    "weights": {"split_zone": 1.0}
  },
  "canvas": {"width": 800.0, "height": 600.0}
}"#;

fn three_ellipses() -> Vec<EllipseParams> {
    vec![
        EllipseParams { x: 0.0, y: 0.0, a: 1.0, b: 0.7, rotation: 0.3 },
        EllipseParams { x: 0.9, y: 0.1, a: 0.8, b: 0.8, rotation: 0.0 },
        EllipseParams { x: 0.4, y: 0.8, a: 1.1, b: 0.5, rotation: 1.2 },
    ]
}

fn bench_three_set_hill_climbing(c: &mut Criterion) {
    let params: LayoutParams = serde_json::from_str(THREE_SET_HC_JSON).unwrap();
    c.bench_function("layout_three_set_hc_60_steps", |b| {
        b.iter(|| layout(&params).unwrap());
    });
}

fn bench_four_set_annealing(c: &mut Criterion) {
    let params: LayoutParams = serde_json::from_str(FOUR_SET_SA_JSON).unwrap();
    let mut group = c.benchmark_group("annealing");
    group.sample_size(10);
    group.bench_function("layout_four_set_sa_full", |b| {
        b.iter(|| layout(&params).unwrap());
    });
    group.finish();
}

fn bench_sample_cached(c: &mut Criterion) {
    // Same geometry every iteration: rasters come from the cache.
    let ellipses = three_ellipses();
    let mut sampler = AreaSampler::new(SamplerSettings::default());
    c.bench_function("sample_cached_three", |b| {
        b.iter(|| sampler.sample(&ellipses, SampleOptions::areas_only()));
    });
}

fn bench_sample_with_labels(c: &mut Criterion) {
    let ellipses = three_ellipses();
    let mut sampler = AreaSampler::new(SamplerSettings::default());
    c.bench_function("sample_with_label_positions_three", |b| {
        b.iter(|| sampler.sample(&ellipses, SampleOptions::full()));
    });
}

fn bench_stress_areas(c: &mut Criterion) {
    let ellipses = three_ellipses();
    c.bench_function("stress_zone_areas_three", |b| {
        b.iter(|| zone_areas(&ellipses));
    });
}

criterion_group!(
    benches,
    bench_three_set_hill_climbing,
    bench_four_set_annealing,
    bench_sample_cached,
    bench_sample_with_labels,
    bench_stress_areas
);
criterion_main!(benches);
