//! The three-stage doublet fit.
//!
//! 1. **Coarse fit** of the raw spectrum with fixed widths, used only to
//!    locate the reference component.
//! 2. **Recalibration**: the energy axis is shifted so the reference lands on
//!    the configured energy, the model is rebuilt around the shifted guesses
//!    and (optionally) fitted again with fixed widths.
//! 3. **Refined fit** with every component's widths tied to the reference and
//!    the reference widths free, holding any configured centers fixed.
//!
//! The refined fit yields the area fractions and peak distances.

use rayon::prelude::*;
use std::path::Path;

use crate::analysis::FitReport;
use crate::config::PipelineConfig;
use crate::error::{Result, XpsFitError};
use crate::model::{fit, FitOutcome, Model};
use crate::models::{validate_guesses, CompositeModel};
use crate::parameters::{ComponentLabel, ParamKey, ParamKind};
use crate::spectrum::{RawTable, Spectrum};
use crate::table;

/// Everything a pipeline run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Energy added to the axis to move the reference onto its literature value
    pub shift: f64,

    /// Fit of the uncalibrated spectrum
    pub coarse: FitOutcome,

    /// Fixed-width fit of the recalibrated spectrum, if enabled
    pub recalibrated: Option<FitOutcome>,

    /// Final fit with tied widths
    pub refined: FitOutcome,

    /// Area fractions and peak distances of the refined fit
    pub report: FitReport,
}

/// Runs the coarse, recalibrated and refined fits for one configuration.
#[derive(Debug, Clone, Default)]
pub struct DoubletFitPipeline {
    config: PipelineConfig,
}

impl DoubletFitPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Check the configuration without touching any data.
    pub fn validate(&self) -> Result<()> {
        let config = &self.config;
        validate_guesses(&config.center_guesses, &config.intensity_guesses)?;
        config.shape.validate()?;

        if !config.reference_energy.is_finite() {
            return Err(XpsFitError::InvalidInput(format!(
                "Reference energy must be finite, got {}",
                config.reference_energy
            )));
        }

        let count = config.center_guesses.len();
        for (label, energy) in &config.fixed_centers {
            if label.index() >= count {
                return Err(XpsFitError::InvalidInput(format!(
                    "Fixed center for component {} but only {} components are configured",
                    label, count
                )));
            }
            if !energy.is_finite() {
                return Err(XpsFitError::InvalidInput(format!(
                    "Fixed center of component {} must be finite, got {}",
                    label, energy
                )));
            }
        }
        Ok(())
    }

    /// Read an instrument export and run the pipeline on it.
    pub fn run_file<P: AsRef<Path>>(&self, path: P) -> Result<PipelineOutcome> {
        self.validate()?;
        let table = table::read_csv(path, self.config.skip_rows)?;
        self.run(&table)
    }

    /// Run all three stages on one table.
    ///
    /// The recalibrated model starts from each configured center guess plus
    /// the measured `shift`, so the guesses follow the axis correction. A
    /// fixed offset such as `guess + 10` would only match when the shift is
    /// exactly 10 eV.
    pub fn run(&self, table: &RawTable) -> Result<PipelineOutcome> {
        self.validate()?;
        let config = &self.config;

        let spectrum = Spectrum::from_table(table)?;
        let mut model = self.build_model(&config.center_guesses, &spectrum)?;
        let coarse = self.fit_stage("coarse", &mut model, &spectrum)?;

        let reference = coarse.value(ParamKey::main(ComponentLabel::REFERENCE, ParamKind::Center))?;
        let shift = config.reference_energy - reference;
        log::info!(
            "Reference found at {:.3} eV; shifting energy axis by {:+.3} eV",
            reference,
            shift
        );

        let shifted = table.shifted(shift);
        let spectrum = Spectrum::from_table(&shifted)?;
        let centers: Vec<f64> = config.center_guesses.iter().map(|c| c + shift).collect();
        let mut model = self.build_model(&centers, &spectrum)?;

        let recalibrated = if config.prefit_recalibrated {
            Some(self.fit_stage("recalibrated", &mut model, &spectrum)?)
        } else {
            None
        };

        for (&label, &energy) in &config.fixed_centers {
            log::debug!("Holding center of component {} at {} eV", label, energy);
            model.fix_center(label, energy)?;
        }
        model.tie_widths_to_reference()?;
        let refined = self.fit_stage("refined", &mut model, &spectrum)?;

        let report = FitReport::from_outcome(&refined)?;
        log::info!("{}", report);

        Ok(PipelineOutcome {
            shift,
            coarse,
            recalibrated,
            refined,
            report,
        })
    }

    /// Run the pipeline on several tables in parallel.
    ///
    /// Each table succeeds or fails on its own; results come back in input
    /// order.
    pub fn fit_batch(&self, tables: &[RawTable]) -> Vec<Result<PipelineOutcome>> {
        tables.par_iter().map(|table| self.run(table)).collect()
    }

    fn build_model(&self, centers: &[f64], spectrum: &Spectrum) -> Result<CompositeModel> {
        let mut model =
            CompositeModel::build(centers, &self.config.intensity_guesses, &self.config.shape)?;
        model.scale_amplitudes(spectrum.max_intensity())?;
        Ok(model)
    }

    fn fit_stage(
        &self,
        stage: &str,
        model: &mut CompositeModel,
        spectrum: &Spectrum,
    ) -> Result<FitOutcome> {
        log::info!(
            "Starting {} fit: {} components, {} free parameters, {} points",
            stage,
            model.component_count(),
            model.parameters().free_count(),
            spectrum.len()
        );

        let outcome = fit(model, spectrum, &self.config.lm)?;
        if !outcome.success {
            log::warn!("{} fit failed: {}", stage, outcome.message);
            return Err(XpsFitError::NonConvergence {
                stage: stage.to_string(),
                message: outcome.message,
            });
        }

        log::info!(
            "{} fit converged after {} iterations (chi-square {:.6e}, reduced {:.6e})",
            stage,
            outcome.iterations,
            outcome.chisqr,
            outcome.redchi
        );
        Ok(outcome)
    }
}
