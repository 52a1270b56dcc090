//! Scaling options: magnitude ranges, exclusions, and the pass-through bag.
//!
//! Options deserialize from TOML (`[scale]` section of `configs/scale.toml`)
//! or from the untyped parameter map handed to [`Sampler::sample`]. Keys
//! that are not scaling options land in [`ScaleOptions::passthrough`] and
//! are forwarded to the wrapped sampler untouched.
//!
//! [`Sampler::sample`]: crate::Sampler::sample

use std::path::Path;

use energy::Variable;
use serde::{Deserialize, Serialize};

use crate::composite::ScaleError;

/// Untyped keyword parameters forwarded to a sampler.
pub type Parameters = serde_json::Map<String, serde_json::Value>;

/// Parameter names consumed by the scaling composite.
pub const SCALING_PARAMETERS: [&str; 6] = [
    "scalar",
    "bias_range",
    "quadratic_range",
    "ignored_variables",
    "ignored_interactions",
    "ignore_offset",
];

/// Target magnitude range for a class of biases.
///
/// Deserializes from a bare number (`2` ⇒ `[-2, 2]`) or a two-element
/// array (`[-1, 0.4]`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BiasRange {
    /// `[-|r|, |r|]`.
    Symmetric(f64),
    /// Explicit `(low, high)`; expected to satisfy `low < 0 < high`.
    Bounds(f64, f64),
}

impl Default for BiasRange {
    fn default() -> Self {
        default_bias_range()
    }
}

impl BiasRange {
    /// `(low, high)` edges of the range.
    pub fn edges(self) -> (f64, f64) {
        match self {
            BiasRange::Symmetric(r) => (-r.abs(), r.abs()),
            BiasRange::Bounds(low, high) => (low, high),
        }
    }

    /// Whether the range straddles zero with nonzero width on both sides.
    pub fn straddles_zero(self) -> bool {
        let (low, high) = self.edges();
        low < 0.0 && high > 0.0
    }
}

/// Per-call configuration of the scaling composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleOptions {
    /// Explicit divisor. When absent it is computed from the ranges.
    #[serde(default)]
    pub scalar: Option<f64>,

    /// Range for linear biases.
    #[serde(default = "default_bias_range")]
    pub bias_range: BiasRange,

    /// Range for interaction biases; falls back to `bias_range`.
    #[serde(default)]
    pub quadratic_range: Option<BiasRange>,

    /// Variables whose linear bias is left unscaled.
    #[serde(default)]
    pub ignored_variables: Option<Vec<Variable>>,

    /// Interactions (any variable order) whose bias is left unscaled.
    #[serde(default)]
    pub ignored_interactions: Option<Vec<Vec<Variable>>>,

    /// Leave the offset unscaled.
    #[serde(default)]
    pub ignore_offset: bool,

    /// Everything else, forwarded verbatim to the wrapped sampler.
    #[serde(flatten)]
    pub passthrough: Parameters,
}

fn default_bias_range() -> BiasRange {
    BiasRange::Symmetric(1.0)
}

impl Default for ScaleOptions {
    fn default() -> Self {
        Self {
            scalar: None,
            bias_range: default_bias_range(),
            quadratic_range: None,
            ignored_variables: None,
            ignored_interactions: None,
            ignore_offset: false,
            passthrough: Parameters::new(),
        }
    }
}

impl ScaleOptions {
    /// Split an untyped parameter map into scaling options and pass-through
    /// parameters.
    ///
    /// Fails with [`ScaleError::InvalidOptions`] when a scaling key has the
    /// wrong shape (non-numeric scalar, range with three edges, ...).
    pub fn from_parameters(parameters: &Parameters) -> Result<Self, ScaleError> {
        serde_json::from_value(serde_json::Value::Object(parameters.clone()))
            .map_err(|e| ScaleError::InvalidOptions(e.to_string()))
    }

    /// Range applied to interaction biases.
    pub fn effective_quadratic_range(&self) -> BiasRange {
        self.quadratic_range.unwrap_or(self.bias_range)
    }

    /// Log a warning for ranges that cannot scale biases of both signs.
    pub fn validate(&self) {
        let ranges = [
            ("bias_range", self.bias_range),
            ("quadratic_range", self.effective_quadratic_range()),
        ];
        for (name, range) in ranges {
            if !range.straddles_zero() {
                let (low, high) = range.edges();
                tracing::warn!(
                    range = name,
                    low,
                    high,
                    "{name} [{low}, {high}] does not straddle zero; biases of one sign cannot be scaled into it"
                );
            }
        }
        if let Some(scalar) = self.scalar {
            if !(scalar.is_finite() && scalar > 0.0) {
                tracing::warn!(scalar, "explicit scalar is not a positive finite number");
            }
        }
    }
}

/// Top-level structure matching `configs/scale.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct ScaleToml {
    /// Scaling options and sampler pass-through parameters.
    #[serde(default)]
    pub scale: ScaleOptions,
}

/// Load and deserialize a `ScaleToml` from a TOML file.
pub fn load_scale_toml(path: &Path) -> anyhow::Result<ScaleToml> {
    let contents = std::fs::read_to_string(path)?;
    let config: ScaleToml = toml::from_str(&contents)?;
    tracing::info!(path = %path.display(), "Loaded scale config");
    Ok(config)
}
