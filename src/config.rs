//! Pipeline configuration.
//!
//! [`DoubletShape`] holds the lineshape constants of one chemical species and
//! [`PipelineConfig`] everything a pipeline run needs besides the data. Both
//! round-trip through JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::error::{Result, XpsFitError};
use crate::lm::LmConfig;
use crate::parameters::{ComponentLabel, MAX_COMPONENTS};

/// Default center guesses for up to five components (eV).
pub const DEFAULT_CENTER_GUESSES: [f64; MAX_COMPONENTS] = [120.0, 123.0, 124.0, 124.5, 125.0];

/// Default relative intensities for up to five components.
pub const DEFAULT_INTENSITY_GUESSES: [f64; MAX_COMPONENTS] = [1.0, 0.1, 0.25, 0.2, 0.2];

/// Literature energy the reference component is calibrated to (eV).
pub const DEFAULT_REFERENCE_ENERGY: f64 = 130.0;

/// Lineshape constants shared by both lines of a doublet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoubletShape {
    /// Gaussian width.
    pub sigma: f64,
    /// Lorentzian half width.
    pub gamma: f64,
    /// Satellite offset; the satellite sits at `center - splitting`.
    pub splitting: f64,
    /// Main:satellite amplitude ratio.
    pub ratio: f64,
}

impl Default for DoubletShape {
    fn default() -> Self {
        Self {
            sigma: 0.35,
            gamma: 0.15,
            splitting: -0.84,
            ratio: 2.0,
        }
    }
}

impl DoubletShape {
    /// Check that the constants describe a physical doublet.
    pub fn validate(&self) -> Result<()> {
        for (name, width) in [("sigma", self.sigma), ("gamma", self.gamma)] {
            if !width.is_finite() || width < 0.0 {
                return Err(XpsFitError::InvalidInput(format!(
                    "{} must be finite and non-negative, got {}",
                    name, width
                )));
            }
        }
        if !self.splitting.is_finite() {
            return Err(XpsFitError::InvalidInput(format!(
                "splitting must be finite, got {}",
                self.splitting
            )));
        }
        if !self.ratio.is_finite() || self.ratio == 0.0 {
            return Err(XpsFitError::InvalidInput(format!(
                "ratio must be finite and non-zero, got {}",
                self.ratio
            )));
        }
        Ok(())
    }
}

/// Settings of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Initial center guess per component, in label order.
    pub center_guesses: Vec<f64>,

    /// Initial relative intensity per component, in label order.
    pub intensity_guesses: Vec<f64>,

    /// Lineshape constants for every component.
    pub shape: DoubletShape,

    /// Energy the reference component is moved to by the axis recalibration.
    pub reference_energy: f64,

    /// Main-line centers held at literal energies during the refined fit.
    pub fixed_centers: BTreeMap<ComponentLabel, f64>,

    /// Fit the recalibrated spectrum with fixed widths before freeing them.
    pub prefit_recalibrated: bool,

    /// Lines to skip before the header of an instrument export.
    pub skip_rows: usize,

    /// Optimizer settings used by every stage.
    pub lm: LmConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::with_peaks(3)
    }
}

impl PipelineConfig {
    /// Configuration with the default guesses for the first `peaks` components.
    ///
    /// The guess lists always hold `peaks` entries. Counts past the last
    /// default repeat it, so an out-of-range count is rejected when the
    /// pipeline validates instead of being silently shortened.
    pub fn with_peaks(peaks: usize) -> Self {
        let default_at = |defaults: &[f64; MAX_COMPONENTS], i: usize| {
            defaults[i.min(MAX_COMPONENTS - 1)]
        };
        Self {
            center_guesses: (0..peaks).map(|i| default_at(&DEFAULT_CENTER_GUESSES, i)).collect(),
            intensity_guesses: (0..peaks)
                .map(|i| default_at(&DEFAULT_INTENSITY_GUESSES, i))
                .collect(),
            shape: DoubletShape::default(),
            reference_energy: DEFAULT_REFERENCE_ENERGY,
            fixed_centers: BTreeMap::new(),
            prefit_recalibrated: true,
            skip_rows: 7,
            lm: LmConfig::default(),
        }
    }

    /// Replace the guesses.
    pub fn with_guesses(mut self, centers: Vec<f64>, intensities: Vec<f64>) -> Self {
        self.center_guesses = centers;
        self.intensity_guesses = intensities;
        self
    }

    /// Hold a component's main-line center at `energy` in the refined fit.
    pub fn with_fixed_center(mut self, label: ComponentLabel, energy: f64) -> Self {
        self.fixed_centers.insert(label, energy);
        self
    }

    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the configuration to a pretty-printed JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a configuration from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Save the configuration to a JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}
