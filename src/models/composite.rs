//! Composite model of several doublets.
//!
//! Components are labelled `a`, `b`, ... in the order of their guesses and
//! their parameter sets are merged into one [`Parameters`] collection. Since
//! every key carries its component label, the merge cannot collide.

use ndarray::Array1;
use std::collections::BTreeMap;

use crate::config::DoubletShape;
use crate::error::{Result, XpsFitError};
use crate::model::{ComponentCurves, Model};
use crate::parameters::{
    Bounds, ComponentLabel, Derivation, Line, ParamKey, ParamKind, Parameters, MAX_COMPONENTS,
};

use super::doublet::{doublet_parameters, line_profile};

/// Check a list of center and intensity guesses.
///
/// Requires between one and [`MAX_COMPONENTS`] components, one intensity per
/// center and finite values throughout.
pub fn validate_guesses(centers: &[f64], intensities: &[f64]) -> Result<()> {
    if centers.is_empty() || centers.len() > MAX_COMPONENTS {
        return Err(XpsFitError::InvalidInput(format!(
            "Expected 1 to {} components, got {}",
            MAX_COMPONENTS,
            centers.len()
        )));
    }
    if centers.len() != intensities.len() {
        return Err(XpsFitError::InvalidInput(format!(
            "Intensities and energies must have the same length ({} energies, {} intensities)",
            centers.len(),
            intensities.len()
        )));
    }
    if let Some(bad) = centers.iter().chain(intensities).find(|v| !v.is_finite()) {
        return Err(XpsFitError::InvalidInput(format!(
            "Guesses must be finite, got {}",
            bad
        )));
    }
    Ok(())
}

/// Sum of up to five doublet components.
#[derive(Debug, Clone)]
pub struct CompositeModel {
    labels: Vec<ComponentLabel>,
    params: Parameters,
}

impl CompositeModel {
    /// Build a composite from center guesses and relative intensities.
    ///
    /// Each component's main amplitude starts at its relative intensity.
    ///
    /// # Examples
    ///
    /// ```
    /// use xps_fit::config::DoubletShape;
    /// use xps_fit::model::Model;
    /// use xps_fit::models::CompositeModel;
    ///
    /// let model = CompositeModel::build(&[130.0, 133.0], &[1.0, 0.25], &DoubletShape::default()).unwrap();
    /// assert_eq!(model.parameters().independent_count(), 12);
    /// assert_eq!(model.parameters().derived_count(), 8);
    ///
    /// // Three energies but two intensities
    /// assert!(CompositeModel::build(&[1.0, 2.0, 3.0], &[1.0, 1.0], &DoubletShape::default()).is_err());
    /// ```
    pub fn build(centers: &[f64], intensities: &[f64], shape: &DoubletShape) -> Result<Self> {
        validate_guesses(centers, intensities)?;
        shape.validate()?;

        let labels = ComponentLabel::sequence(centers.len())?;
        let mut params = Parameters::new();
        for ((&label, &center), &intensity) in labels.iter().zip(centers).zip(intensities) {
            params.extend(doublet_parameters(label, shape, center, intensity)?)?;
        }

        Ok(Self { labels, params })
    }

    /// Component labels in order.
    pub fn labels(&self) -> &[ComponentLabel] {
        &self.labels
    }

    pub fn component_count(&self) -> usize {
        self.labels.len()
    }

    pub fn contains(&self, label: ComponentLabel) -> bool {
        self.labels.contains(&label)
    }

    /// Multiply every main-line amplitude by `factor`.
    pub fn scale_amplitudes(&mut self, factor: f64) -> Result<()> {
        if !factor.is_finite() {
            return Err(XpsFitError::InvalidInput(format!(
                "Amplitude scale must be finite, got {}",
                factor
            )));
        }
        for &label in &self.labels {
            let key = ParamKey::main(label, ParamKind::Amplitude);
            let value = self.params.value(key)?;
            self.params.set_value(key, value * factor)?;
        }
        Ok(())
    }

    /// Hold a component's main-line center at a literal energy.
    pub fn fix_center(&mut self, label: ComponentLabel, energy: f64) -> Result<()> {
        if !self.contains(label) {
            return Err(XpsFitError::InvalidInput(format!(
                "Cannot fix center of component {}: the model has {} components",
                label,
                self.labels.len()
            )));
        }
        if !energy.is_finite() {
            return Err(XpsFitError::InvalidInput(format!(
                "Fixed center of component {} must be finite, got {}",
                label, energy
            )));
        }
        self.params
            .fix(ParamKey::main(label, ParamKind::Center), energy)?;
        Ok(())
    }

    /// Tie every component's widths to the reference component and let the
    /// reference widths vary (bounded below by zero).
    ///
    /// Satellite widths already follow their own main line, so they follow
    /// the reference transitively.
    pub fn tie_widths_to_reference(&mut self) -> Result<()> {
        let reference = ComponentLabel::REFERENCE;
        for kind in [ParamKind::Sigma, ParamKind::Gamma] {
            let source = ParamKey::main(reference, kind);
            for &label in self.labels.iter().filter(|l| !l.is_reference()) {
                self.params
                    .derive(ParamKey::main(label, kind), Derivation::SameAs(source))?;
            }
            self.params.set_bounds(source, Bounds::min_only(0.0))?;
            self.params.free(source)?;
        }
        Ok(())
    }

    /// Main plus satellite curve of each component.
    pub fn eval_doublets(&self, x: &Array1<f64>) -> Result<BTreeMap<ComponentLabel, Array1<f64>>> {
        let mut doublets: BTreeMap<ComponentLabel, Array1<f64>> = BTreeMap::new();
        for ((label, _), curve) in self.eval_components(x)? {
            match doublets.get_mut(&label) {
                Some(sum) => *sum += &curve,
                None => {
                    doublets.insert(label, curve);
                }
            }
        }
        Ok(doublets)
    }
}

impl Model for CompositeModel {
    fn parameters(&self) -> &Parameters {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.params
    }

    fn eval_components_with(&self, params: &Parameters, x: &Array1<f64>) -> Result<ComponentCurves> {
        let mut curves = ComponentCurves::new();
        for &label in &self.labels {
            for line in Line::BOTH {
                curves.insert((label, line), line_profile(params, label, line, x)?);
            }
        }
        Ok(curves)
    }
}
