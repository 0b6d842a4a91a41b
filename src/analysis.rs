//! Quantities derived from a finished fit.
//!
//! Area fractions compare the summed main + satellite curves of each
//! component; distances measure how far each main line sits from the
//! reference component's main line.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, XpsFitError};
use crate::model::FitOutcome;
use crate::parameters::{ComponentLabel, ParamKey, ParamKind};

/// Unnormalized area of each component: main plus satellite curve summed over
/// the fit domain.
pub fn component_areas(outcome: &FitOutcome) -> BTreeMap<ComponentLabel, f64> {
    let mut areas = BTreeMap::new();
    for ((label, _), curve) in &outcome.component_curves {
        *areas.entry(*label).or_insert(0.0) += curve.sum();
    }
    areas
}

/// Share of the total area carried by each component.
///
/// The fractions sum to one. A non-finite total, or one that is rounding
/// noise next to the component areas it was summed from, is a
/// [`XpsFitError::DegenerateResult`].
pub fn component_fractions(outcome: &FitOutcome) -> Result<BTreeMap<ComponentLabel, f64>> {
    let areas = component_areas(outcome);
    let total: f64 = areas.values().sum();
    let magnitude: f64 = areas.values().map(|a| a.abs()).sum();
    let noise = f64::EPSILON * magnitude * areas.len() as f64;
    if areas.is_empty() || !total.is_finite() || total.abs() <= noise {
        return Err(XpsFitError::DegenerateResult(format!(
            "Cannot compute area fractions: total area is {}",
            total
        )));
    }
    Ok(areas
        .into_iter()
        .map(|(label, area)| (label, area / total))
        .collect())
}

/// Absolute distance of each component's main-line center from the reference
/// component's, including the reference itself at zero.
pub fn peak_distances(outcome: &FitOutcome) -> Result<BTreeMap<ComponentLabel, f64>> {
    let reference = outcome.value(ParamKey::main(ComponentLabel::REFERENCE, ParamKind::Center))?;
    let labels: Vec<ComponentLabel> = component_areas(outcome).into_keys().collect();
    labels
        .into_iter()
        .map(|label| {
            let center = outcome.value(ParamKey::main(label, ParamKind::Center))?;
            Ok((label, (center - reference).abs()))
        })
        .collect()
}

/// Area fractions and peak distances of a fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    /// Fraction of the total area per component
    pub fractions: BTreeMap<ComponentLabel, f64>,
    /// Distance from the reference component per component (eV)
    pub distances: BTreeMap<ComponentLabel, f64>,
}

impl FitReport {
    pub fn from_outcome(outcome: &FitOutcome) -> Result<Self> {
        Ok(Self {
            fractions: component_fractions(outcome)?,
            distances: peak_distances(outcome)?,
        })
    }

    /// Fractions as percentages with two decimals, e.g. `"75.00%"`.
    pub fn formatted_fractions(&self) -> BTreeMap<ComponentLabel, String> {
        self.fractions
            .iter()
            .map(|(label, fraction)| (*label, format!("{:.2}%", fraction * 100.0)))
            .collect()
    }

    /// Distances of the non-reference components keyed `ab_dist`, `ac_dist`, ...
    pub fn formatted_distances(&self) -> BTreeMap<String, String> {
        self.distances
            .iter()
            .filter(|(label, _)| !label.is_reference())
            .map(|(label, distance)| {
                (
                    format!("{}{}_dist", ComponentLabel::REFERENCE, label),
                    format!("{:.2} eV", distance),
                )
            })
            .collect()
    }
}

fn write_map<K: fmt::Display, V: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    map: &BTreeMap<K, V>,
) -> fmt::Result {
    write!(f, "{{")?;
    for (i, (key, value)) in map.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "'{}': '{}'", key, value)?;
    }
    write!(f, "}}")
}

impl fmt::Display for FitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Proportions are ")?;
        write_map(f, &self.formatted_fractions())?;
        writeln!(f)?;
        write!(f, "Distances are ")?;
        write_map(f, &self.formatted_distances())
    }
}
