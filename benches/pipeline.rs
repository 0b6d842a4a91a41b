//! Benchmarks for the doublet fit pipeline.
//!
//! Covers one Voigt evaluation pass, a single fixed-width fit and the full
//! three-stage pipeline for growing numbers of components.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array1;
use xps_fit::config::DoubletShape;
use xps_fit::lm::LmConfig;
use xps_fit::model::{fit, Model};
use xps_fit::models::{voigt_profile, CompositeModel};
use xps_fit::spectrum::{RawTable, Spectrum};
use xps_fit::{DoubletFitPipeline, PipelineConfig};

const CENTERS: [f64; 5] = [128.8, 131.2, 132.5, 133.6, 135.0];
const AMPLITUDES: [f64; 5] = [3000.0, 900.0, 600.0, 400.0, 300.0];

/// Noise-free export of the first `peaks` doublets on a flat background.
fn synthetic_table(peaks: usize) -> RawTable {
    let energy = Array1::linspace(145.0, 115.0, 601);
    let truth =
        CompositeModel::build(&CENTERS[..peaks], &AMPLITUDES[..peaks], &DoubletShape::default())
            .unwrap();
    let counts = truth.eval(&energy).unwrap() + 100.0;
    let window = energy.iter().map(|&e| Some(e)).collect();
    let background = vec![Some(100.0); energy.len()];
    RawTable::new(energy, counts, window, background).unwrap()
}

fn guesses(peaks: usize) -> (Vec<f64>, Vec<f64>) {
    let centers = CENTERS[..peaks].iter().map(|c| c - 0.2).collect();
    let intensities = AMPLITUDES[..peaks].iter().map(|a| a / AMPLITUDES[0]).collect();
    (centers, intensities)
}

fn bench_voigt(c: &mut Criterion) {
    let x = Array1::linspace(115.0, 145.0, 601);
    c.bench_function("voigt_profile_601", |b| {
        b.iter(|| voigt_profile(black_box(&x), 1.0, 130.0, 0.35, 0.15))
    });
}

fn bench_single_fit(c: &mut Criterion) {
    let table = synthetic_table(3);
    let spectrum = Spectrum::from_table(&table).unwrap();
    let (centers, intensities) = guesses(3);
    let config = LmConfig::default();

    c.bench_function("fixed_width_fit_3", |b| {
        b.iter(|| {
            let mut model =
                CompositeModel::build(&centers, &intensities, &DoubletShape::default()).unwrap();
            model.scale_amplitudes(spectrum.max_intensity()).unwrap();
            let _ = fit(&mut model, black_box(&spectrum), &config);
        })
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);

    for peaks in [1, 3, 5] {
        let table = synthetic_table(peaks);
        let (centers, intensities) = guesses(peaks);
        let pipeline =
            DoubletFitPipeline::new(PipelineConfig::with_peaks(peaks).with_guesses(centers, intensities));

        group.bench_with_input(BenchmarkId::from_parameter(peaks), &table, |b, table| {
            b.iter(|| {
                let _ = pipeline.run(black_box(table));
            })
        });
    }

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit_batch");
    group.sample_size(10);

    let tables: Vec<RawTable> = (0..8).map(|_| synthetic_table(2)).collect();
    let (centers, intensities) = guesses(2);
    let pipeline =
        DoubletFitPipeline::new(PipelineConfig::with_peaks(2).with_guesses(centers, intensities));

    group.bench_function("8_spectra", |b| {
        b.iter(|| {
            let _ = pipeline.fit_batch(black_box(&tables));
        })
    });

    group.finish();
}

// Combine all benchmarks
criterion_group!(benches, bench_voigt, bench_single_fit, bench_pipeline, bench_batch);
criterion_main!(benches);
