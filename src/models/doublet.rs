//! Doublet component model.
//!
//! A doublet is a pair of Voigt lines from one spin-orbit split transition.
//! Only the main line is parameterized independently: the satellite sits at a
//! fixed energy offset, carries a fixed fraction of the main amplitude and
//! shares the main line's widths.
//!
//! | parameter | main line | satellite |
//! |---|---|---|
//! | amplitude | free | `main.amplitude / ratio` |
//! | center | free | `main.center - splitting` |
//! | sigma | fixed | `main.sigma` |
//! | gamma | fixed | `main.gamma` |
//! | splitting | fixed | |
//! | ratio | fixed | |

use ndarray::Array1;

use crate::config::DoubletShape;
use crate::error::{Result, XpsFitError};
use crate::model::{ComponentCurves, Model};
use crate::parameters::{
    ComponentLabel, Derivation, Line, ParamKey, ParamKind, Parameter, Parameters,
};

use super::voigt::voigt_profile;

/// Build the parameters of one doublet.
///
/// The returned set holds six independent main-line entries and four
/// satellite entries derived from them.
pub fn doublet_parameters(
    label: ComponentLabel,
    shape: &DoubletShape,
    center: f64,
    amplitude: f64,
) -> Result<Parameters> {
    shape.validate()?;
    if !center.is_finite() {
        return Err(XpsFitError::InvalidInput(format!(
            "Center guess for component {} must be finite, got {}",
            label, center
        )));
    }
    if !amplitude.is_finite() {
        return Err(XpsFitError::InvalidInput(format!(
            "Amplitude guess for component {} must be finite, got {}",
            label, amplitude
        )));
    }

    let main = |kind| ParamKey::main(label, kind);
    let mut params = Parameters::new();
    params.add(Parameter::free(main(ParamKind::Amplitude), amplitude))?;
    params.add(Parameter::free(main(ParamKind::Center), center))?;
    params.add(Parameter::fixed(main(ParamKind::Sigma), shape.sigma))?;
    params.add(Parameter::fixed(main(ParamKind::Gamma), shape.gamma))?;
    params.add(Parameter::fixed(main(ParamKind::Splitting), shape.splitting))?;
    params.add(Parameter::fixed(main(ParamKind::Ratio), shape.ratio))?;

    let satellite = |kind| ParamKey::satellite(label, kind);
    params.add(Parameter::derived(
        satellite(ParamKind::Amplitude),
        amplitude / shape.ratio,
        Derivation::Quotient(main(ParamKind::Amplitude), main(ParamKind::Ratio)),
    ))?;
    params.add(Parameter::derived(
        satellite(ParamKind::Center),
        center - shape.splitting,
        Derivation::Difference(main(ParamKind::Center), main(ParamKind::Splitting)),
    ))?;
    params.add(Parameter::derived(
        satellite(ParamKind::Sigma),
        shape.sigma,
        Derivation::SameAs(main(ParamKind::Sigma)),
    ))?;
    params.add(Parameter::derived(
        satellite(ParamKind::Gamma),
        shape.gamma,
        Derivation::SameAs(main(ParamKind::Gamma)),
    ))?;

    Ok(params)
}

/// Evaluate one line of a doublet from a parameter set.
pub fn line_profile(
    params: &Parameters,
    label: ComponentLabel,
    line: Line,
    x: &Array1<f64>,
) -> Result<Array1<f64>> {
    let value = |kind| params.value(ParamKey::new(label, line, kind));
    Ok(voigt_profile(
        x,
        value(ParamKind::Amplitude)?,
        value(ParamKind::Center)?,
        value(ParamKind::Sigma)?,
        value(ParamKind::Gamma)?,
    ))
}

/// A single doublet component.
#[derive(Debug, Clone)]
pub struct DoubletModel {
    label: ComponentLabel,
    params: Parameters,
}

impl DoubletModel {
    /// Create a doublet with unit main amplitude centered at `center`.
    ///
    /// # Examples
    ///
    /// ```
    /// use xps_fit::config::DoubletShape;
    /// use xps_fit::model::Model;
    /// use xps_fit::models::DoubletModel;
    /// use xps_fit::parameters::{ComponentLabel, ParamKey, ParamKind};
    ///
    /// let a = ComponentLabel::REFERENCE;
    /// let doublet = DoubletModel::new(a, &DoubletShape::default(), 130.0).unwrap();
    /// let satellite = doublet.parameters().value(ParamKey::satellite(a, ParamKind::Center)).unwrap();
    /// assert!((satellite - 130.84).abs() < 1e-12);
    /// ```
    pub fn new(label: ComponentLabel, shape: &DoubletShape, center: f64) -> Result<Self> {
        Ok(Self {
            label,
            params: doublet_parameters(label, shape, center, 1.0)?,
        })
    }

    /// Set the initial main-line amplitude.
    pub fn with_amplitude(mut self, amplitude: f64) -> Result<Self> {
        if !amplitude.is_finite() {
            return Err(XpsFitError::InvalidInput(format!(
                "Amplitude guess for component {} must be finite, got {}",
                self.label, amplitude
            )));
        }
        self.params
            .set_value(ParamKey::main(self.label, ParamKind::Amplitude), amplitude)?;
        Ok(self)
    }

    pub fn label(&self) -> ComponentLabel {
        self.label
    }

    /// Hand the parameters over, e.g. to a composite model.
    pub fn into_parameters(self) -> Parameters {
        self.params
    }
}

impl Model for DoubletModel {
    fn parameters(&self) -> &Parameters {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.params
    }

    fn eval_components_with(&self, params: &Parameters, x: &Array1<f64>) -> Result<ComponentCurves> {
        Line::BOTH
            .iter()
            .map(|&line| Ok(((self.label, line), line_profile(params, self.label, line, x)?)))
            .collect()
    }
}
