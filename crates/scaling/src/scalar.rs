//! Normalization scalar: the smallest divisor that fits every included bias
//! into its magnitude range.

use std::collections::BTreeMap;

use energy::Variable;

use crate::composite::ScaleError;
use crate::config::BiasRange;
use crate::exclusions::{Exclusions, InteractionKey};

/// Compute the divisor that brings all non-excluded biases within range.
///
/// Each nonzero bias is measured against the range edge on its own sign:
/// positive biases against `high`, negative biases against `|low|`. The
/// result is `max(1, max |bias| / edge)` over linear biases (checked against
/// `bias_range`) and interaction biases of any arity (checked against
/// `quadratic_range`, which defaults to `bias_range`). It never falls below 1,
/// so scaling only shrinks magnitudes.
pub fn calc_norm_coeff<K: InteractionKey>(
    linear: &BTreeMap<Variable, f64>,
    interactions: &BTreeMap<K, f64>,
    bias_range: BiasRange,
    quadratic_range: Option<BiasRange>,
    exclusions: &Exclusions,
) -> Result<f64, ScaleError> {
    let quadratic_range = quadratic_range.unwrap_or(bias_range);

    let linear_factor = max_ratio(
        "linear",
        linear
            .iter()
            .filter(|(v, _)| !exclusions.ignores_variable(v))
            .map(|(_, bias)| *bias),
        bias_range,
    )?;
    let quadratic_factor = max_ratio(
        "quadratic",
        interactions
            .iter()
            .filter(|(key, _)| !key.is_excluded(exclusions))
            .map(|(_, bias)| *bias),
        quadratic_range,
    )?;

    let scalar = [linear_factor, quadratic_factor]
        .into_iter()
        .flatten()
        .fold(1.0, f64::max);

    tracing::debug!(
        ?linear_factor,
        ?quadratic_factor,
        scalar,
        "computed normalization scalar"
    );
    Ok(scalar)
}

/// Largest `|bias| / edge` over nonzero biases, `None` if there are none.
fn max_ratio(
    kind: &'static str,
    biases: impl Iterator<Item = f64>,
    range: BiasRange,
) -> Result<Option<f64>, ScaleError> {
    let (low, high) = range.edges();
    let mut factor: Option<f64> = None;
    for bias in biases {
        if bias == 0.0 {
            continue;
        }
        if !(low.is_finite() && high.is_finite()) {
            return Err(ScaleError::InvalidRange { kind, low, high });
        }
        let edge = if bias > 0.0 { high } else { -low };
        if edge <= 0.0 {
            return Err(ScaleError::DegenerateRange {
                kind,
                bias,
                low,
                high,
            });
        }
        let ratio = bias.abs() / edge;
        factor = Some(factor.map_or(ratio, |f| f.max(ratio)));
    }
    Ok(factor)
}
