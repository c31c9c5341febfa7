//! Benchmarks for cycle feature extraction
//!
//! Covers the FIR filter, cycle extraction and the full pipeline under both
//! burst detection methods.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use cycle_core::{CenterExtrema, FrequencyRange};
use cycle_processing::{
    compute_cyclepoints, compute_features, ExtremaConfig, FeatureConfig, FirFilter,
    NarrowbandFilterConfig,
};
use cycle_simulation::{NoiseConfig, OscillationConfig, OscillationSimulator, SignalPattern};

const FS: f64 = 1000.0;

fn burst_train(seconds: f64) -> Vec<f64> {
    let config = OscillationConfig {
        sampling_rate: FS,
        frequency: 10.0,
        pattern: SignalPattern::BurstTrain {
            background_amplitude: 0.1,
            burst_amplitude: 1.0,
            on_cycles: 6,
            off_cycles: 8,
        },
        noise: NoiseConfig { gaussian_std: 0.05 },
        seed: Some(1),
    };

    OscillationSimulator::new(config)
        .and_then(|mut simulator| simulator.generate(seconds))
        .map(|signal| signal.into_samples())
        .unwrap()
}

fn bench_narrowband_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("narrowband_filter");
    let band = FrequencyRange::new(8.0, 12.0);
    let filter = FirFilter::bandpass(band, FS, &NarrowbandFilterConfig::default()).unwrap();

    for &seconds in &[5.0, 30.0, 120.0] {
        let signal = burst_train(seconds);
        group.bench_with_input(
            BenchmarkId::new("apply", format!("{}s", seconds)),
            &signal,
            |b, signal| b.iter(|| black_box(filter.apply(black_box(signal)))),
        );
    }

    group.finish();
}

fn bench_cyclepoints(c: &mut Criterion) {
    let signal = burst_train(30.0);
    let band = FrequencyRange::new(8.0, 12.0);
    let extrema = ExtremaConfig::default();

    c.bench_function("cyclepoints_30s", |b| {
        b.iter(|| {
            black_box(compute_cyclepoints(
                black_box(&signal),
                FS,
                band,
                CenterExtrema::Peak,
                &extrema,
            ))
        })
    });
}

fn bench_compute_features(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_features");
    let band = FrequencyRange::new(8.0, 12.0);
    let configs = [
        ("cycles", FeatureConfig::consistency_default(FS, band)),
        ("amplitude", FeatureConfig::amplitude_default(FS, band)),
    ];

    for &seconds in &[10.0, 60.0] {
        let signal = burst_train(seconds);
        for (name, config) in &configs {
            group.bench_with_input(
                BenchmarkId::new(*name, format!("{}s", seconds)),
                &signal,
                |b, signal| b.iter(|| black_box(compute_features(black_box(signal), config))),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_narrowband_filter, bench_cyclepoints, bench_compute_features);
criterion_main!(benches);
