//! Rescaling composite: scale a model into range, delegate, restore energies.
//!
//! The composite normalizes exclusions, resolves the scalar, builds the
//! scaled model, hands it to the wrapped [`Sampler`] together with the
//! caller's pass-through parameters, and maps every returned energy back to
//! the units of the original model.

use std::collections::{BTreeMap, BTreeSet};

use energy::{
    Assignment, BinaryPolynomial, BinaryQuadraticModel, EnergyError, SampleSet, Term, Variable,
};

use crate::config::{Parameters, ScaleOptions, SCALING_PARAMETERS};
use crate::exclusions::{Exclusions, InteractionKey};
use crate::scalar::calc_norm_coeff;
use crate::scaler::{scale_hyper, scale_pairwise, ModelOrder};

/// Sampler-reported static properties.
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Errors that can occur while scaling a model or sampling it.
#[derive(Debug, thiserror::Error)]
pub enum ScaleError {
    /// Neither a model nor linear/interaction biases were supplied.
    #[error("no model given: pass a model or linear and interaction biases")]
    MissingModel,
    /// Both a model and linear/interaction biases were supplied.
    #[error("both a model and linear/interaction biases were given")]
    AmbiguousModel,
    /// Exclusion sets are required when the scalar is not 1.
    #[error("ignored variables and interactions must be given when scaling")]
    MissingExclusions,
    /// A scaling option had the wrong shape.
    #[error("invalid scaling options: {0}")]
    InvalidOptions(String),
    /// The scalar is zero, negative, or not finite.
    #[error("scalar must be a positive finite number, got {0}")]
    InvalidScalar(f64),
    /// An interaction key names fewer than two distinct variables.
    #[error("interaction {0} needs at least two distinct variables")]
    InvalidInteraction(String),
    /// No finite scalar fits the bias into the range.
    #[error("{kind} bias {bias} cannot be scaled into [{low}, {high}]")]
    DegenerateRange {
        kind: &'static str,
        bias: f64,
        low: f64,
        high: f64,
    },
    /// A range edge is NaN or infinite.
    #[error("{kind} range [{low}, {high}] has a non-finite edge")]
    InvalidRange {
        kind: &'static str,
        low: f64,
        high: f64,
    },
    /// Error from the energy-function containers.
    #[error("Energy error: {0}")]
    Energy(#[from] EnergyError),
    /// Error from the wrapped sampler.
    #[error("Sampler error: {0}")]
    Sampler(#[source] anyhow::Error),
}

// ---------------------------------------------------------------------------
// Sampler
// ---------------------------------------------------------------------------

/// Solver that returns candidate assignments for an energy function.
///
/// Sync trait; a composite over a thread-safe child is itself thread-safe.
pub trait Sampler: Send + Sync {
    /// Sample a quadratic model.
    fn sample(
        &self,
        bqm: &BinaryQuadraticModel,
        parameters: &Parameters,
    ) -> Result<SampleSet, ScaleError>;

    /// Sample a polynomial with interactions of any order.
    ///
    /// Samplers without higher-order support keep the default, which fails.
    fn sample_poly(
        &self,
        poly: &BinaryPolynomial,
        _parameters: &Parameters,
    ) -> Result<SampleSet, ScaleError> {
        Err(ScaleError::Sampler(anyhow::anyhow!(
            "sampler does not support polynomials of order {}",
            poly.max_interaction_arity()
        )))
    }

    /// Names of the keyword parameters the sampler accepts.
    fn parameters(&self) -> BTreeSet<String>;

    /// Static properties of the sampler.
    fn properties(&self) -> Properties;
}

// ---------------------------------------------------------------------------
// ScaleRequest
// ---------------------------------------------------------------------------

/// Spin-valued energy function given as raw biases.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IsingTerms {
    pub linear: Vec<(Variable, f64)>,
    /// Interaction keys in caller order; any arity of two or more.
    pub interactions: Vec<(Vec<Variable>, f64)>,
    pub offset: f64,
}

impl IsingTerms {
    /// Build a polynomial, rejecting keys with fewer than two variables.
    pub fn to_polynomial(&self) -> Result<BinaryPolynomial, ScaleError> {
        let mut interactions = Vec::with_capacity(self.interactions.len());
        for (key, bias) in &self.interactions {
            let term = Term::new(key.iter().cloned());
            if term.arity() < 2 {
                return Err(ScaleError::InvalidInteraction(format!("{key:?}")));
            }
            interactions.push((term, *bias));
        }
        Ok(BinaryPolynomial::from_ising(
            self.linear.iter().cloned(),
            interactions,
            self.offset,
        )?)
    }
}

/// What to sample: a model or raw biases, exactly one of them.
#[derive(Debug, Clone, Default)]
pub struct ScaleRequest {
    pub model: Option<BinaryQuadraticModel>,
    pub terms: Option<IsingTerms>,
}

impl ScaleRequest {
    pub fn model(bqm: BinaryQuadraticModel) -> Self {
        Self {
            model: Some(bqm),
            terms: None,
        }
    }

    pub fn terms(terms: IsingTerms) -> Self {
        Self {
            model: None,
            terms: Some(terms),
        }
    }
}

// ---------------------------------------------------------------------------
// ScaleComposite
// ---------------------------------------------------------------------------

/// Wraps a [`Sampler`] so that every model it sees has biases within range.
///
/// Returned samples keep their assignments and order; energies are in the
/// units of the caller's model and `info["scalar"]` records the scalar used.
pub struct ScaleComposite<S> {
    child: S,
}

impl<S> ScaleComposite<S> {
    pub fn new(child: S) -> Self {
        Self { child }
    }

    /// Get a reference to the wrapped sampler.
    pub fn child(&self) -> &S {
        &self.child
    }
}

impl<S: Sampler> ScaleComposite<S> {
    /// Sample whichever model the request carries.
    pub fn solve(
        &self,
        request: ScaleRequest,
        options: &ScaleOptions,
    ) -> Result<SampleSet, ScaleError> {
        match (request.model, request.terms) {
            (None, None) => Err(ScaleError::MissingModel),
            (Some(_), Some(_)) => Err(ScaleError::AmbiguousModel),
            (Some(bqm), None) => self.sample_scaled(&bqm, options),
            (None, Some(terms)) => self.sample_polynomial(&terms.to_polynomial()?, options),
        }
    }

    /// Scale a quadratic model, sample it, and restore energies.
    pub fn sample_scaled(
        &self,
        bqm: &BinaryQuadraticModel,
        options: &ScaleOptions,
    ) -> Result<SampleSet, ScaleError> {
        let plan = Plan::new(bqm.linear(), bqm.quadratic(), options)?;
        let scaled = scale_pairwise(
            bqm,
            Some(plan.scalar),
            options.bias_range,
            options.quadratic_range,
            Some(&plan.exclusions),
            options.ignore_offset,
        )?;
        let sampleset = self.child.sample(&scaled, &options.passthrough)?;
        plan.restore(sampleset, |a| bqm.energy(a))
    }

    /// Sample a polynomial, routing pairwise ones through [`Sampler::sample`].
    pub fn sample_polynomial(
        &self,
        poly: &BinaryPolynomial,
        options: &ScaleOptions,
    ) -> Result<SampleSet, ScaleError> {
        let order = ModelOrder::of_polynomial(poly);
        tracing::debug!(?order, num_variables = poly.num_variables(), "classified model");
        if order == ModelOrder::Pairwise {
            let bqm = BinaryQuadraticModel::try_from(poly)?;
            return self.sample_scaled(&bqm, options);
        }

        let plan = Plan::new(poly.linear(), poly.interactions(), options)?;
        let scaled = scale_hyper(
            poly,
            Some(plan.scalar),
            options.bias_range,
            options.quadratic_range,
            Some(&plan.exclusions),
            options.ignore_offset,
        )?;
        let sampleset = self.child.sample_poly(&scaled, &options.passthrough)?;
        plan.restore(sampleset, |a| poly.energy(a))
    }

    /// Sample a spin-valued energy function given as raw biases.
    ///
    /// Interaction keys may couple any number of variables; keys of arity
    /// three or more route the model to [`Sampler::sample_poly`].
    pub fn sample_ising<L, J, K, V>(
        &self,
        linear: L,
        interactions: J,
        offset: f64,
        options: &ScaleOptions,
    ) -> Result<SampleSet, ScaleError>
    where
        L: IntoIterator<Item = (V, f64)>,
        J: IntoIterator<Item = (K, f64)>,
        K: IntoIterator<Item = V>,
        V: Into<Variable>,
    {
        let terms = IsingTerms {
            linear: linear.into_iter().map(|(v, b)| (v.into(), b)).collect(),
            interactions: interactions
                .into_iter()
                .map(|(key, b)| (key.into_iter().map(Into::into).collect(), b))
                .collect(),
            offset,
        };
        self.solve(ScaleRequest::terms(terms), options)
    }
}

/// Exclusions and scalar resolved once per call, shared by scaling and
/// energy restoration.
struct Plan {
    exclusions: Exclusions,
    scalar: f64,
    /// Every bias and the offset were divided by the scalar.
    uniform: bool,
}

impl Plan {
    fn new<K: InteractionKey>(
        linear: &BTreeMap<Variable, f64>,
        interactions: &BTreeMap<K, f64>,
        options: &ScaleOptions,
    ) -> Result<Self, ScaleError> {
        options.validate();
        let exclusions = Exclusions::from_options(options)?;
        let scalar = match options.scalar {
            Some(s) => s,
            None => calc_norm_coeff(
                linear,
                interactions,
                options.bias_range,
                options.quadratic_range,
                &exclusions,
            )?,
        };
        let uniform = exclusions.is_empty() && !options.ignore_offset;
        Ok(Self {
            exclusions,
            scalar,
            uniform,
        })
    }

    /// Map energies of the scaled model back to the original model.
    ///
    /// A uniform scaling is undone by multiplying with the scalar; anything
    /// else is recomputed from the assignment.
    fn restore<F>(&self, mut sampleset: SampleSet, energy: F) -> Result<SampleSet, ScaleError>
    where
        F: Fn(&Assignment) -> Result<f64, EnergyError>,
    {
        let scalar = self.scalar;
        if self.uniform {
            sampleset.try_map_energies(|s| Ok::<_, ScaleError>(s.energy * scalar))?;
        } else {
            sampleset.try_map_energies(|s| energy(&s.assignment).map_err(ScaleError::from))?;
        }
        sampleset
            .info
            .insert("scalar".to_string(), serde_json::Value::from(scalar));
        Ok(sampleset)
    }
}

impl<S: Sampler> Sampler for ScaleComposite<S> {
    fn sample(
        &self,
        bqm: &BinaryQuadraticModel,
        parameters: &Parameters,
    ) -> Result<SampleSet, ScaleError> {
        let options = ScaleOptions::from_parameters(parameters)?;
        self.sample_scaled(bqm, &options)
    }

    fn sample_poly(
        &self,
        poly: &BinaryPolynomial,
        parameters: &Parameters,
    ) -> Result<SampleSet, ScaleError> {
        let options = ScaleOptions::from_parameters(parameters)?;
        self.sample_polynomial(poly, &options)
    }

    fn parameters(&self) -> BTreeSet<String> {
        let mut parameters = self.child.parameters();
        parameters.extend(SCALING_PARAMETERS.iter().map(|p| p.to_string()));
        parameters
    }

    fn properties(&self) -> Properties {
        self.child.properties()
    }
}
