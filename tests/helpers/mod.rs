//! Test helpers - synthetic instrument exports

use ndarray::Array1;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::fmt::Write;

use xps_fit::config::DoubletShape;
use xps_fit::model::Model;
use xps_fit::models::CompositeModel;
use xps_fit::spectrum::RawTable;

/// Install a test logger once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Recipe for a synthetic export: doublets on a sloped background over a
/// descending energy grid, with the fit window on an inner range.
#[derive(Debug, Clone)]
pub struct SyntheticExport {
    pub centers: Vec<f64>,
    pub amplitudes: Vec<f64>,
    pub shape: DoubletShape,
    /// Full grid runs from `grid.0` down to `grid.1`
    pub grid: (f64, f64),
    pub step: f64,
    /// Window bounds, inclusive
    pub window: (f64, f64),
    /// Standard deviation of the Gaussian noise on the counts
    pub noise: f64,
    pub seed: u64,
}

impl SyntheticExport {
    pub fn new(centers: &[f64], amplitudes: &[f64]) -> Self {
        Self {
            centers: centers.to_vec(),
            amplitudes: amplitudes.to_vec(),
            shape: DoubletShape::default(),
            grid: (150.0, 110.0),
            step: 0.05,
            window: (115.0, 145.0),
            noise: 0.0,
            seed: 42,
        }
    }

    pub fn with_shape(mut self, shape: DoubletShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_noise(mut self, noise: f64, seed: u64) -> Self {
        self.noise = noise;
        self.seed = seed;
        self
    }

    fn background(energy: f64) -> f64 {
        200.0 + 2.0 * (energy - 110.0)
    }

    pub fn energy(&self) -> Array1<f64> {
        let n = ((self.grid.0 - self.grid.1) / self.step).round() as usize + 1;
        Array1::from_iter((0..n).map(|i| self.grid.0 - i as f64 * self.step))
    }

    pub fn build(&self) -> RawTable {
        let energy = self.energy();
        let truth = CompositeModel::build(&self.centers, &self.amplitudes, &self.shape).unwrap();
        let signal = truth.eval(&energy).unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let normal = Normal::new(0.0, self.noise.max(f64::MIN_POSITIVE)).unwrap();
        let counts: Array1<f64> = energy
            .iter()
            .zip(signal.iter())
            .map(|(&e, &s)| {
                let noise = if self.noise > 0.0 { normal.sample(&mut rng) } else { 0.0 };
                Self::background(e) + s + noise
            })
            .collect();

        let (lower, upper) = self.window;
        let inside = |e: f64| e >= lower - 1e-9 && e <= upper + 1e-9;
        let window = energy.iter().map(|&e| inside(e).then_some(e)).collect();
        let background = energy
            .iter()
            .map(|&e| inside(e).then(|| Self::background(e)))
            .collect();

        RawTable::new(energy, counts, window, background).unwrap()
    }
}

/// Render a table in the instrument's CSV layout, preceded by `skip_rows`
/// metadata lines.
pub fn render_export(table: &RawTable, skip_rows: usize) -> String {
    let mut out = String::new();
    for i in 0..skip_rows {
        writeln!(out, "Metadata line {}", i).unwrap();
    }
    writeln!(out, "B. E.,Counts,PkGrp1_BE,PkGrp1_Count,PkFitEnv1").unwrap();

    let cell = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
    for i in 0..table.energy().len() {
        writeln!(
            out,
            "{},{},{},{},",
            table.energy()[i],
            table.counts()[i],
            cell(table.window_energy()[i]),
            cell(table.background()[i]),
        )
        .unwrap();
    }
    out
}
