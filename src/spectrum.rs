//! Raw instrument tables and background-subtracted spectra.
//!
//! A [`RawTable`] mirrors the columns of an instrument export: the full energy
//! grid with its counts, plus the peak-fit columns that are only defined inside
//! the fit window. [`Spectrum::from_table`] cuts the window out of the full grid
//! and subtracts the background trace.

use ndarray::Array1;

use crate::error::{Result, XpsFitError};

/// Maximum absolute difference allowed between the window energies and the
/// matching rows of the full energy grid.
pub const GRID_TOLERANCE: f64 = 1e-10;

/// Columns of an instrument export.
///
/// Window columns hold `None` outside the fit window.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    energy: Array1<f64>,
    counts: Array1<f64>,
    window_energy: Vec<Option<f64>>,
    background: Vec<Option<f64>>,
    envelope: Vec<Option<f64>>,
    peaks: Vec<Vec<Option<f64>>>,
}

impl RawTable {
    /// Create a table from the full energy grid, the total counts, the
    /// fit-window energy column and the background trace.
    pub fn new(
        energy: Array1<f64>,
        counts: Array1<f64>,
        window_energy: Vec<Option<f64>>,
        background: Vec<Option<f64>>,
    ) -> Result<Self> {
        if energy.len() != counts.len() {
            return Err(XpsFitError::InvalidInput(format!(
                "Energy column has {} rows but counts column has {}",
                energy.len(),
                counts.len()
            )));
        }

        Ok(Self {
            energy,
            counts,
            window_energy,
            background,
            envelope: Vec::new(),
            peaks: Vec::new(),
        })
    }

    /// Attach the instrument's own fit envelope.
    pub fn with_envelope(mut self, envelope: Vec<Option<f64>>) -> Self {
        self.envelope = envelope;
        self
    }

    /// Attach the instrument's own per-peak fit curves (`Pk01`, `Pk02`, ...).
    pub fn with_peaks(mut self, peaks: Vec<Vec<Option<f64>>>) -> Self {
        self.peaks = peaks;
        self
    }

    pub fn energy(&self) -> &Array1<f64> {
        &self.energy
    }

    pub fn counts(&self) -> &Array1<f64> {
        &self.counts
    }

    pub fn window_energy(&self) -> &[Option<f64>] {
        &self.window_energy
    }

    pub fn background(&self) -> &[Option<f64>] {
        &self.background
    }

    pub fn envelope(&self) -> &[Option<f64>] {
        &self.envelope
    }

    pub fn peaks(&self) -> &[Vec<Option<f64>>] {
        &self.peaks
    }

    /// A copy with `shift` added to both energy columns.
    pub fn shifted(&self, shift: f64) -> Self {
        Self {
            energy: self.energy.mapv(|e| e + shift),
            window_energy: self
                .window_energy
                .iter()
                .map(|e| e.map(|e| e + shift))
                .collect(),
            ..self.clone()
        }
    }
}

/// Background-subtracted intensities over the fit window.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    energies: Array1<f64>,
    intensities: Array1<f64>,
}

impl Spectrum {
    /// Create a spectrum from matching energy and intensity arrays.
    pub fn new(energies: Array1<f64>, intensities: Array1<f64>) -> Result<Self> {
        if energies.len() != intensities.len() {
            return Err(XpsFitError::InvalidInput(format!(
                "Spectrum has {} energies but {} intensities",
                energies.len(),
                intensities.len()
            )));
        }
        if energies.is_empty() {
            return Err(XpsFitError::EmptyFitWindow);
        }
        if energies.iter().chain(intensities.iter()).any(|v| !v.is_finite()) {
            return Err(XpsFitError::InvalidInput(
                "Spectrum contains non-finite values".to_string(),
            ));
        }
        Ok(Self {
            energies,
            intensities,
        })
    }

    /// Extract the fit window from an instrument table.
    ///
    /// The window runs between the first and last defined values of the
    /// window-energy column. Rows of the full grid inside that range must line
    /// up with the window energies to within [`GRID_TOLERANCE`], and the
    /// background column must cover exactly the same rows.
    pub fn from_table(table: &RawTable) -> Result<Self> {
        let window: Vec<f64> = table.window_energy.iter().flatten().copied().collect();
        let (first, last) = match (window.first(), window.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return Err(XpsFitError::EmptyFitWindow),
        };
        let (lower, upper) = (first.min(last), first.max(last));

        let rows: Vec<usize> = table
            .energy
            .iter()
            .enumerate()
            .filter(|&(_, &e)| e >= lower && e <= upper)
            .map(|(i, _)| i)
            .collect();

        if rows.len() != window.len() {
            return Err(XpsFitError::DataAlignment(format!(
                "Fit window has {} energies but the full grid has {} rows in [{}, {}]",
                window.len(),
                rows.len(),
                lower,
                upper
            )));
        }
        for (&row, &expected) in rows.iter().zip(&window) {
            let actual = table.energy[row];
            if (actual - expected).abs() > GRID_TOLERANCE {
                return Err(XpsFitError::DataAlignment(format!(
                    "Energy grid mismatch at row {}: {} vs fit window {}",
                    row, actual, expected
                )));
            }
        }

        let background: Vec<f64> = table.background.iter().flatten().copied().collect();
        if background.len() != window.len() {
            return Err(XpsFitError::DataAlignment(format!(
                "Background has {} values but the fit window has {}",
                background.len(),
                window.len()
            )));
        }

        let energies: Array1<f64> = rows.iter().map(|&row| table.energy[row]).collect();
        let intensities: Array1<f64> = rows
            .iter()
            .zip(&background)
            .map(|(&row, &bg)| table.counts[row] - bg)
            .collect();

        log::debug!(
            "Extracted {} points between {:.3} and {:.3} eV",
            energies.len(),
            lower,
            upper
        );
        Self::new(energies, intensities)
    }

    pub fn energies(&self) -> &Array1<f64> {
        &self.energies
    }

    pub fn intensities(&self) -> &Array1<f64> {
        &self.intensities
    }

    pub fn len(&self) -> usize {
        self.energies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.energies.is_empty()
    }

    /// Largest background-subtracted intensity.
    pub fn max_intensity(&self) -> f64 {
        self.intensities
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }
}
