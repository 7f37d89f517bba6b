use criterion::{black_box, criterion_group, criterion_main, Criterion};
use grind_qa::core::{AnalysisSettings, DetectedParticle, GrindType};
use grind_qa::detect::ThresholdDetector;
use grind_qa::synth::{generate_grid, generate_scatter, GridParams, ScatterParams};
use grind_qa::validate::{match_and_score, render_overlay};
use nalgebra::Point2;

fn jittered(scene: &grind_qa::SyntheticScene) -> Vec<DetectedParticle> {
    scene
        .ground_truth
        .iter()
        .map(|p| {
            let k = p.id as f32;
            DetectedParticle::new(
                Point2::new(p.center.x + (k * 1.7).sin(), p.center.y + (k * 2.3).cos()),
                p.area,
            )
        })
        .collect()
}

fn bench_match_and_score(c: &mut Criterion) {
    let small = generate_scatter(&ScatterParams::new(1000, 1000, 200, (4, 12), 10.0));
    let small_det = jittered(&small);
    c.bench_function("match_and_score_200", |b| {
        b.iter(|| match_and_score(black_box(&small_det), black_box(&small.ground_truth), 5.0))
    });

    let large = generate_grid(&GridParams::new(2500, 2500, 40, 40, 10, 10.0));
    let large_det = jittered(&large);
    c.bench_function("match_and_score_1600", |b| {
        b.iter(|| match_and_score(black_box(&large_det), black_box(&large.ground_truth), 5.0))
    });
}

fn bench_reference_detector(c: &mut Criterion) {
    let scene = generate_grid(&GridParams::new(1000, 1000, 5, 5, 30, 10.0));
    let detector = ThresholdDetector::default();
    let targets = GrindType::Filter.targets();
    let settings = AnalysisSettings::with_calibration(10.0);
    c.bench_function("threshold_detect_1000x1000", |b| {
        b.iter(|| detector.detect_blocking(black_box(&scene.image), &targets, &settings))
    });
}

fn bench_overlay(c: &mut Criterion) {
    let scene = generate_grid(&GridParams::new(1000, 1000, 5, 5, 30, 10.0));
    let report = match_and_score(&jittered(&scene)[..20], &scene.ground_truth, 5.0);
    c.bench_function("render_overlay_1000x1000", |b| {
        b.iter(|| render_overlay(black_box(&scene.image), black_box(&report)))
    });
}

criterion_group!(
    benches,
    bench_match_and_score,
    bench_reference_detector,
    bench_overlay
);
criterion_main!(benches);
