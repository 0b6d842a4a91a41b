//! Parameters collection implementation
//!
//! [`Parameters`] is an ordered collection of [`Parameter`]s keyed by
//! [`ParamKey`]. It owns the dependency graph between derived parameters and
//! resolves them, sources first, whenever free values change.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::bounds::Bounds;
use super::key::ParamKey;
use super::parameter::{Binding, Derivation, Parameter, ParameterError};

/// A collection of parameters for a doublet fit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    params: BTreeMap<ParamKey, Parameter>,
}

impl Parameters {
    /// Create a new empty parameters collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter to the collection
    ///
    /// Derived parameters are resolved immediately if their sources are
    /// already present.
    ///
    /// # Examples
    ///
    /// ```
    /// use xps_fit::parameters::{ComponentLabel, Derivation, ParamKey, ParamKind, Parameter, Parameters};
    ///
    /// let a = ComponentLabel::REFERENCE;
    /// let mut params = Parameters::new();
    /// params.add(Parameter::fixed(ParamKey::main(a, ParamKind::Sigma), 0.35)).unwrap();
    /// params
    ///     .add(Parameter::derived(
    ///         ParamKey::satellite(a, ParamKind::Sigma),
    ///         0.0,
    ///         Derivation::SameAs(ParamKey::main(a, ParamKind::Sigma)),
    ///     ))
    ///     .unwrap();
    ///
    /// assert_eq!(params.value(ParamKey::satellite(a, ParamKind::Sigma)).unwrap(), 0.35);
    /// ```
    pub fn add(&mut self, param: Parameter) -> Result<(), ParameterError> {
        let key = param.key();
        if self.params.contains_key(&key) {
            return Err(ParameterError::DuplicateParameter {
                key: key.to_string(),
            });
        }
        self.params.insert(key, param);
        self.resolve_available()
    }

    /// Merge another collection into this one. Keys must be disjoint.
    pub fn extend(&mut self, other: Parameters) -> Result<(), ParameterError> {
        if let Some(key) = other.params.keys().find(|k| self.params.contains_key(k)) {
            return Err(ParameterError::DuplicateParameter {
                key: key.to_string(),
            });
        }
        self.params.extend(other.params);
        self.resolve_available()
    }

    pub fn get(&self, key: ParamKey) -> Option<&Parameter> {
        self.params.get(&key)
    }

    /// Mutable access to a parameter.
    ///
    /// Call [`Parameters::resolve`] after changing a source value so that
    /// dependents follow.
    pub fn get_mut(&mut self, key: ParamKey) -> Option<&mut Parameter> {
        self.params.get_mut(&key)
    }

    fn require(&self, key: ParamKey) -> Result<&Parameter, ParameterError> {
        self.params
            .get(&key)
            .ok_or_else(|| ParameterError::ParameterNotFound {
                key: key.to_string(),
            })
    }

    fn require_mut(&mut self, key: ParamKey) -> Result<&mut Parameter, ParameterError> {
        self.params
            .get_mut(&key)
            .ok_or_else(|| ParameterError::ParameterNotFound {
                key: key.to_string(),
            })
    }

    /// Current value of a parameter.
    pub fn value(&self, key: ParamKey) -> Result<f64, ParameterError> {
        self.require(key).map(Parameter::value)
    }

    pub fn contains(&self, key: ParamKey) -> bool {
        self.params.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = ParamKey> + '_ {
        self.params.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.values()
    }

    /// Keys of the parameters the optimizer varies, in key order.
    pub fn free_keys(&self) -> Vec<ParamKey> {
        self.params
            .values()
            .filter(|p| p.is_free())
            .map(Parameter::key)
            .collect()
    }

    pub fn free_count(&self) -> usize {
        self.params.values().filter(|p| p.is_free()).count()
    }

    /// Number of parameters that are not derived from others.
    pub fn independent_count(&self) -> usize {
        self.params.values().filter(|p| !p.is_derived()).count()
    }

    pub fn derived_count(&self) -> usize {
        self.params.values().filter(|p| p.is_derived()).count()
    }

    /// Set the value of a free or fixed parameter and re-resolve dependents.
    pub fn set_value(&mut self, key: ParamKey, value: f64) -> Result<(), ParameterError> {
        self.require_mut(key)?.set_value(value)?;
        self.resolve()
    }

    /// Hold a parameter at a literal value.
    pub fn fix(&mut self, key: ParamKey, value: f64) -> Result<(), ParameterError> {
        self.require_mut(key)?.fix(value)?;
        self.resolve()
    }

    /// Let the optimizer vary a parameter, starting from its current value.
    pub fn free(&mut self, key: ParamKey) -> Result<(), ParameterError> {
        self.require_mut(key)?.set_free();
        Ok(())
    }

    pub fn set_bounds(&mut self, key: ParamKey, bounds: Bounds) -> Result<(), ParameterError> {
        self.require_mut(key)?.set_bounds(bounds);
        self.resolve()
    }

    /// Bind a parameter to a derivation.
    ///
    /// Sources must exist and the new binding must not introduce a cycle;
    /// on error the collection is left unchanged.
    pub fn derive(&mut self, key: ParamKey, derivation: Derivation) -> Result<(), ParameterError> {
        for source in derivation.sources() {
            self.require(source)?;
        }
        let previous = *self.require(key)?.binding();

        self.require_mut(key)?.set_derivation(derivation);
        if let Err(err) = self.resolve() {
            let param = self.require_mut(key)?;
            match previous {
                Binding::Free => param.set_free(),
                Binding::Fixed => {
                    let value = param.value();
                    param.fix(value)?;
                }
                Binding::Derived(old) => param.set_derivation(old),
            }
            return Err(err);
        }
        Ok(())
    }

    /// Derived parameters ordered so every source precedes its dependents.
    fn resolution_order(&self) -> Result<Vec<ParamKey>, ParameterError> {
        fn visit(
            key: ParamKey,
            params: &BTreeMap<ParamKey, Parameter>,
            done: &mut BTreeSet<ParamKey>,
            in_progress: &mut BTreeSet<ParamKey>,
            order: &mut Vec<ParamKey>,
        ) -> Result<(), ParameterError> {
            if done.contains(&key) {
                return Ok(());
            }
            if in_progress.contains(&key) {
                return Err(ParameterError::CircularDependency {
                    key: key.to_string(),
                });
            }

            let param = params
                .get(&key)
                .ok_or_else(|| ParameterError::ParameterNotFound {
                    key: key.to_string(),
                })?;

            if let Some(derivation) = param.derivation() {
                in_progress.insert(key);
                for source in derivation.sources() {
                    visit(source, params, done, in_progress, order)?;
                }
                in_progress.remove(&key);
                order.push(key);
            }

            done.insert(key);
            Ok(())
        }

        let mut order = Vec::new();
        let mut done = BTreeSet::new();
        let mut in_progress = BTreeSet::new();
        for key in self.params.keys() {
            visit(*key, &self.params, &mut done, &mut in_progress, &mut order)?;
        }
        Ok(order)
    }

    /// Recompute every derived parameter from its sources.
    pub fn resolve(&mut self) -> Result<(), ParameterError> {
        for key in self.resolution_order()? {
            self.resolve_one(key)?;
        }
        Ok(())
    }

    fn resolve_one(&mut self, key: ParamKey) -> Result<(), ParameterError> {
        let derivation = match self.require(key)?.derivation() {
            Some(derivation) => *derivation,
            None => return Ok(()),
        };
        let value = derivation.evaluate(key, |source| self.value(source))?;
        self.require_mut(key)?.assign(value)
    }

    /// Resolve derived parameters while the collection is still being built.
    ///
    /// Missing sources are tolerated here; `resolve` reports them later.
    fn resolve_available(&mut self) -> Result<(), ParameterError> {
        match self.resolve() {
            Err(ParameterError::ParameterNotFound { .. }) => Ok(()),
            other => other,
        }
    }

    /// Internal (optimizer) coordinates of the free parameters, in key order.
    pub fn to_internal(&self) -> Result<Vec<f64>, ParameterError> {
        self.params
            .values()
            .filter(|p| p.is_free())
            .map(Parameter::to_internal)
            .collect()
    }

    /// Free-parameter values, in key order.
    pub fn free_values(&self) -> Vec<f64> {
        self.params
            .values()
            .filter(|p| p.is_free())
            .map(Parameter::value)
            .collect()
    }

    /// Update the free parameters from internal coordinates and resolve
    /// every derived parameter.
    pub fn update_from_internal(&mut self, values: &[f64]) -> Result<(), ParameterError> {
        let free = self.free_keys();
        if values.len() != free.len() {
            return Err(ParameterError::CountMismatch {
                expected: free.len(),
                got: values.len(),
            });
        }

        for (key, &internal) in free.iter().zip(values) {
            self.require_mut(*key)?.set_from_internal(internal)?;
        }
        self.resolve()
    }

    /// d(external)/d(internal) for each free parameter at the given
    /// internal coordinates.
    pub fn internal_derivatives(&self, values: &[f64]) -> Result<Vec<f64>, ParameterError> {
        let free: Vec<&Parameter> = self.params.values().filter(|p| p.is_free()).collect();
        if values.len() != free.len() {
            return Err(ParameterError::CountMismatch {
                expected: free.len(),
                got: values.len(),
            });
        }
        Ok(free
            .iter()
            .zip(values)
            .map(|(p, &internal)| p.bounds().external_derivative(internal))
            .collect())
    }

    /// Record standard errors for the free parameters and carry them to the
    /// derived ones.
    ///
    /// Derived errors use first-order propagation through the derivation
    /// rule and ignore correlations between sources. Every derivation built
    /// by this crate has at most one source with an error, so nothing is lost.
    pub fn set_standard_errors(&mut self, errors: &[(ParamKey, f64)]) -> Result<(), ParameterError> {
        for param in self.params.values_mut() {
            param.stderr = None;
        }
        for &(key, stderr) in errors {
            self.require_mut(key)?.stderr = Some(stderr);
        }
        for key in self.resolution_order()? {
            let derivation = match self.require(key)?.derivation() {
                Some(derivation) => *derivation,
                None => continue,
            };
            let partials = derivation.partials(|source| self.value(source))?;
            let mut variance = 0.0;
            let mut any = false;
            for (source, partial) in partials {
                if let Some(stderr) = self.require(source)?.stderr {
                    variance += (partial * stderr).powi(2);
                    any = true;
                }
            }
            self.require_mut(key)?.stderr = if any { Some(variance.sqrt()) } else { None };
        }
        Ok(())
    }
}

impl fmt::Display for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for param in self.params.values() {
            writeln!(f, "{}", param)?;
        }
        Ok(())
    }
}
