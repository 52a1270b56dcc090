//! Reference and mock samplers for testing the composite without hardware.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use energy::{
    Assignment, BinaryPolynomial, BinaryQuadraticModel, EnergyError, Sample, SampleSet, Variable,
    Vartype,
};

use crate::composite::{Properties, ScaleError, Sampler};
use crate::config::Parameters;

// ---------------------------------------------------------------------------
// ExactSolver
// ---------------------------------------------------------------------------

/// Brute-force sampler: returns every assignment, lowest energy first.
///
/// Only usable for small models; the enumeration is `2^n`.
pub struct ExactSolver {
    max_variables: usize,
}

impl Default for ExactSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ExactSolver {
    /// Create a solver that accepts up to 20 variables.
    pub fn new() -> Self {
        Self { max_variables: 20 }
    }

    pub fn with_max_variables(max_variables: usize) -> Self {
        Self { max_variables }
    }

    fn enumerate<F>(
        &self,
        vartype: Vartype,
        variables: Vec<&Variable>,
        energy: F,
    ) -> Result<SampleSet, ScaleError>
    where
        F: Fn(&Assignment) -> Result<f64, EnergyError>,
    {
        let n = variables.len();
        if n > self.max_variables {
            return Err(ScaleError::Sampler(anyhow::anyhow!(
                "exact solver limited to {} variables, model has {n}",
                self.max_variables
            )));
        }
        // Assignments are indexed by a u64 bitmask
        let count = u32::try_from(n)
            .ok()
            .and_then(|n| 1u64.checked_shl(n))
            .ok_or_else(|| {
                ScaleError::Sampler(anyhow::anyhow!(
                    "exact solver cannot enumerate {n} variables"
                ))
            })?;

        let [low, high] = vartype.values();
        let mut samples = Vec::new();
        for bits in 0..count {
            let assignment: Assignment = variables
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    let value = if (bits >> i) & 1 == 1 { high } else { low };
                    ((*v).clone(), value)
                })
                .collect();
            let e = energy(&assignment)?;
            samples.push(Sample::new(assignment, e));
        }

        let mut sampleset = SampleSet::new(vartype, samples);
        sampleset.sort_by_energy();
        Ok(sampleset)
    }
}

impl Sampler for ExactSolver {
    fn sample(
        &self,
        bqm: &BinaryQuadraticModel,
        _parameters: &Parameters,
    ) -> Result<SampleSet, ScaleError> {
        self.enumerate(bqm.vartype(), bqm.variables().collect(), |a| bqm.energy(a))
    }

    fn sample_poly(
        &self,
        poly: &BinaryPolynomial,
        _parameters: &Parameters,
    ) -> Result<SampleSet, ScaleError> {
        self.enumerate(poly.vartype(), poly.variables().collect(), |a| poly.energy(a))
    }

    fn parameters(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn properties(&self) -> Properties {
        let mut properties = Properties::new();
        properties.insert("max_variables".to_string(), self.max_variables.into());
        properties
    }
}

// ---------------------------------------------------------------------------
// RecordingSampler
// ---------------------------------------------------------------------------

/// A model handed to a [`RecordingSampler`].
#[derive(Debug, Clone, PartialEq)]
pub enum Received {
    Pairwise(BinaryQuadraticModel),
    Polynomial(BinaryPolynomial),
}

/// Records every model and parameter bag it receives, then delegates.
pub struct RecordingSampler<S> {
    inner: S,
    received: Mutex<Vec<(Received, Parameters)>>,
    extra_parameters: BTreeSet<String>,
}

impl<S> RecordingSampler<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            received: Mutex::new(Vec::new()),
            extra_parameters: BTreeSet::new(),
        }
    }

    /// Advertise additional accepted parameter names.
    pub fn with_parameters<I, P>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.extra_parameters.extend(names.into_iter().map(Into::into));
        self
    }

    /// Get a reference to the inner sampler.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Everything received so far, oldest first.
    pub fn received(&self) -> Vec<(Received, Parameters)> {
        self.lock().clone()
    }

    pub fn num_calls(&self) -> usize {
        self.lock().len()
    }

    /// Most recent quadratic model passed to `sample`.
    pub fn last_model(&self) -> Option<BinaryQuadraticModel> {
        self.lock().iter().rev().find_map(|(r, _)| match r {
            Received::Pairwise(bqm) => Some(bqm.clone()),
            Received::Polynomial(_) => None,
        })
    }

    /// Most recent polynomial passed to `sample_poly`.
    pub fn last_polynomial(&self) -> Option<BinaryPolynomial> {
        self.lock().iter().rev().find_map(|(r, _)| match r {
            Received::Polynomial(poly) => Some(poly.clone()),
            Received::Pairwise(_) => None,
        })
    }

    /// Parameters of the most recent call.
    pub fn last_parameters(&self) -> Option<Parameters> {
        self.lock().last().map(|(_, p)| p.clone())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(Received, Parameters)>> {
        self.received.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<S: Sampler> Sampler for RecordingSampler<S> {
    fn sample(
        &self,
        bqm: &BinaryQuadraticModel,
        parameters: &Parameters,
    ) -> Result<SampleSet, ScaleError> {
        self.lock()
            .push((Received::Pairwise(bqm.clone()), parameters.clone()));
        self.inner.sample(bqm, parameters)
    }

    fn sample_poly(
        &self,
        poly: &BinaryPolynomial,
        parameters: &Parameters,
    ) -> Result<SampleSet, ScaleError> {
        self.lock()
            .push((Received::Polynomial(poly.clone()), parameters.clone()));
        self.inner.sample_poly(poly, parameters)
    }

    fn parameters(&self) -> BTreeSet<String> {
        let mut parameters = self.inner.parameters();
        parameters.extend(self.extra_parameters.iter().cloned());
        parameters
    }

    fn properties(&self) -> Properties {
        self.inner.properties()
    }
}

// ---------------------------------------------------------------------------
// FailingSampler
// ---------------------------------------------------------------------------

/// Sampler whose every call fails with the same message.
pub struct FailingSampler {
    message: String,
}

impl FailingSampler {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn fail(&self) -> ScaleError {
        ScaleError::Sampler(anyhow::anyhow!("{}", self.message))
    }
}

impl Sampler for FailingSampler {
    fn sample(
        &self,
        _bqm: &BinaryQuadraticModel,
        _parameters: &Parameters,
    ) -> Result<SampleSet, ScaleError> {
        Err(self.fail())
    }

    fn sample_poly(
        &self,
        _poly: &BinaryPolynomial,
        _parameters: &Parameters,
    ) -> Result<SampleSet, ScaleError> {
        Err(self.fail())
    }

    fn parameters(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn properties(&self) -> Properties {
        Properties::new()
    }
}
