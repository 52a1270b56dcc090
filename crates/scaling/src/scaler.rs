//! Apply a scalar to a model's linear biases, interactions, and offset.

use energy::{BinaryPolynomial, BinaryQuadraticModel, Term};

use crate::composite::ScaleError;
use crate::config::BiasRange;
use crate::exclusions::{Exclusions, InteractionKey};
use crate::scalar::calc_norm_coeff;

/// Interaction order of a model, decided once per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelOrder {
    /// Every interaction couples exactly two variables.
    Pairwise,
    /// At least one interaction couples three or more variables.
    HigherOrder,
}

impl ModelOrder {
    /// Classify from the arities of a model's interaction keys.
    ///
    /// A model without interactions is pairwise.
    pub fn classify<I: IntoIterator<Item = usize>>(arities: I) -> Self {
        if arities.into_iter().any(|arity| arity > 2) {
            ModelOrder::HigherOrder
        } else {
            ModelOrder::Pairwise
        }
    }

    /// Classify a polynomial by its interaction terms.
    pub fn of_polynomial(poly: &BinaryPolynomial) -> Self {
        Self::classify(poly.interactions().keys().map(Term::arity))
    }
}

/// Scale a quadratic model, returning a new model.
///
/// When `scalar` is `None` it is computed from the ranges over the biases
/// that `exclusions` leaves in. A scalar of exactly 1 returns an unchanged
/// copy; otherwise `exclusions` must be given and every non-excluded bias
/// (and the offset, unless `ignore_offset`) is divided by the scalar.
pub fn scale_pairwise(
    bqm: &BinaryQuadraticModel,
    scalar: Option<f64>,
    bias_range: BiasRange,
    quadratic_range: Option<BiasRange>,
    exclusions: Option<&Exclusions>,
    ignore_offset: bool,
) -> Result<BinaryQuadraticModel, ScaleError> {
    let empty = Exclusions::default();
    let scalar = resolve_scalar(scalar, || {
        calc_norm_coeff(
            bqm.linear(),
            bqm.quadratic(),
            bias_range,
            quadratic_range,
            exclusions.unwrap_or(&empty),
        )
    })?;
    if scalar == 1.0 {
        return Ok(bqm.clone());
    }
    let exclusions = exclusions.ok_or(ScaleError::MissingExclusions)?;

    let linear = bqm.linear().iter().map(|(v, bias)| {
        let bias = if exclusions.ignores_variable(v) {
            *bias
        } else {
            bias / scalar
        };
        (v.clone(), bias)
    });
    let quadratic = bqm.quadratic().iter().map(|(key, bias)| {
        let bias = if key.is_excluded(exclusions) {
            *bias
        } else {
            bias / scalar
        };
        (key.clone(), bias)
    });
    let offset = scaled_offset(bqm.offset(), scalar, ignore_offset);

    let scaled = BinaryQuadraticModel::from_parts(bqm.vartype(), linear, quadratic, offset)?;
    tracing::debug!(
        scalar,
        num_variables = scaled.num_variables(),
        num_interactions = scaled.num_interactions(),
        "scaled pairwise model"
    );
    Ok(scaled)
}

/// Scale a polynomial of any order, returning a new polynomial.
///
/// Same rules as [`scale_pairwise`]; interaction exclusions match any
/// permutation of a term's variables.
pub fn scale_hyper(
    poly: &BinaryPolynomial,
    scalar: Option<f64>,
    bias_range: BiasRange,
    quadratic_range: Option<BiasRange>,
    exclusions: Option<&Exclusions>,
    ignore_offset: bool,
) -> Result<BinaryPolynomial, ScaleError> {
    let empty = Exclusions::default();
    let scalar = resolve_scalar(scalar, || {
        calc_norm_coeff(
            poly.linear(),
            poly.interactions(),
            bias_range,
            quadratic_range,
            exclusions.unwrap_or(&empty),
        )
    })?;
    if scalar == 1.0 {
        return Ok(poly.clone());
    }
    let exclusions = exclusions.ok_or(ScaleError::MissingExclusions)?;

    let linear = poly.linear().iter().map(|(v, bias)| {
        let bias = if exclusions.ignores_variable(v) {
            *bias
        } else {
            bias / scalar
        };
        (v.clone(), bias)
    });
    let interactions = poly.interactions().iter().map(|(term, bias)| {
        let bias = if term.is_excluded(exclusions) {
            *bias
        } else {
            bias / scalar
        };
        (term.clone(), bias)
    });
    let offset = scaled_offset(poly.offset(), scalar, ignore_offset);

    let scaled = BinaryPolynomial::from_parts(poly.vartype(), linear, interactions, offset)?;
    tracing::debug!(
        scalar,
        num_variables = scaled.num_variables(),
        max_arity = scaled.max_interaction_arity(),
        "scaled polynomial"
    );
    Ok(scaled)
}

/// Use the explicit scalar or compute one, then check it is usable.
fn resolve_scalar<F>(scalar: Option<f64>, compute: F) -> Result<f64, ScaleError>
where
    F: FnOnce() -> Result<f64, ScaleError>,
{
    let scalar = match scalar {
        Some(s) => s,
        None => compute()?,
    };
    if !(scalar.is_finite() && scalar > 0.0) {
        return Err(ScaleError::InvalidScalar(scalar));
    }
    Ok(scalar)
}

fn scaled_offset(offset: f64, scalar: f64, ignore_offset: bool) -> f64 {
    if ignore_offset {
        offset
    } else {
        offset / scalar
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exclusions::normalize;
    use energy::Vartype;

    fn example() -> BinaryQuadraticModel {
        BinaryQuadraticModel::from_ising([("a", -4.0), ("b", -4.0)], [(("a", "b"), 3.2)], 5.0)
            .unwrap()
    }

    fn example_hyper() -> BinaryPolynomial {
        BinaryPolynomial::from_ising(
            [("a", -4.0), ("b", -4.0), ("c", -4.0)],
            [(Term::new(["a", "b", "c"]), 3.2)],
            5.0,
        )
        .unwrap()
    }

    fn none() -> Exclusions {
        Exclusions::default()
    }

    #[test]
    fn test_classify() {
        assert_eq!(ModelOrder::classify([]), ModelOrder::Pairwise);
        assert_eq!(ModelOrder::classify([2, 2]), ModelOrder::Pairwise);
        assert_eq!(ModelOrder::classify([2, 3]), ModelOrder::HigherOrder);
        assert_eq!(ModelOrder::of_polynomial(&example_hyper()), ModelOrder::HigherOrder);
        assert_eq!(
            ModelOrder::of_polynomial(&BinaryPolynomial::from(&example())),
            ModelOrder::Pairwise
        );
    }

    #[test]
    fn test_scale_offset() {
        let bqm = example();
        let scaled =
            scale_pairwise(&bqm, Some(2.0), BiasRange::default(), None, Some(&none()), false)
                .unwrap();
        assert_eq!(scaled.offset(), 2.5);
        assert_eq!(scaled.linear()["a"], -2.0);
        assert_eq!(scaled.linear()["b"], -2.0);
        assert_eq!(scaled.get_quadratic("a", "b"), Some(1.6));
        assert_eq!(scaled.vartype(), Vartype::Spin);
    }

    #[test]
    fn test_ignore_offset() {
        let bqm = example();
        let scaled =
            scale_pairwise(&bqm, Some(2.0), BiasRange::default(), None, Some(&none()), true)
                .unwrap();
        assert_eq!(scaled.offset(), 5.0);
        assert_eq!(scaled.linear()["a"], -2.0);
        assert_eq!(scaled.get_quadratic("a", "b"), Some(1.6));
    }

    #[test]
    fn test_input_not_mutated() {
        let bqm = example();
        let before = bqm.clone();
        let _ = scale_pairwise(&bqm, Some(4.0), BiasRange::default(), None, Some(&none()), false)
            .unwrap();
        assert_eq!(bqm, before);
    }

    #[test]
    fn test_computed_scalar() {
        let bqm = example();
        let scaled = scale_pairwise(
            &bqm,
            None,
            BiasRange::Symmetric(2.0),
            None,
            Some(&none()),
            false,
        )
        .unwrap();
        let expected =
            BinaryQuadraticModel::from_ising([("a", -2.0), ("b", -2.0)], [(("a", "b"), 1.6)], 2.5)
                .unwrap();
        assert_eq!(scaled, expected);
    }

    #[test]
    fn test_identity_when_in_range() {
        let bqm = example();
        let scaled = scale_pairwise(
            &bqm,
            None,
            BiasRange::Bounds(-8.0, 5.0),
            Some(BiasRange::Bounds(-1.0, 10.0)),
            None,
            false,
        )
        .unwrap();
        assert_eq!(scaled, bqm);
    }

    #[test]
    fn test_missing_exclusions_rejected() {
        let bqm = example();
        let err =
            scale_pairwise(&bqm, Some(2.0), BiasRange::default(), None, None, false).unwrap_err();
        assert!(matches!(err, ScaleError::MissingExclusions));
    }

    #[test]
    fn test_invalid_scalar_rejected() {
        let bqm = example();
        for bad in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            let err = scale_pairwise(&bqm, Some(bad), BiasRange::default(), None, Some(&none()), false)
                .unwrap_err();
            assert!(matches!(err, ScaleError::InvalidScalar(_)), "{bad} accepted");
        }
    }

    #[test]
    fn test_full_exclusion_is_idempotent() {
        let bqm = example();
        let vars = vec!["a".to_string(), "b".to_string()];
        let terms = vec![vec!["b".to_string(), "a".to_string()]];
        let ex = normalize(Some(&vars), Some(&terms)).unwrap();
        let scaled =
            scale_pairwise(&bqm, Some(7.0), BiasRange::default(), None, Some(&ex), true).unwrap();
        assert_eq!(scaled, bqm);
    }

    #[test]
    fn test_partial_exclusion() {
        let bqm = example();
        let vars = vec!["a".to_string()];
        let ex = normalize(Some(&vars), None).unwrap();
        let scaled =
            scale_pairwise(&bqm, Some(0.5), BiasRange::default(), None, Some(&ex), false).unwrap();
        assert_eq!(scaled.linear()["a"], -4.0);
        assert_eq!(scaled.linear()["b"], -8.0);
        assert_eq!(scaled.get_quadratic("a", "b"), Some(6.4));
        assert_eq!(scaled.offset(), 10.0);
    }

    #[test]
    fn test_hyper_scale() {
        let poly = example_hyper();
        let scaled =
            scale_hyper(&poly, Some(2.0), BiasRange::default(), None, Some(&none()), false)
                .unwrap();
        assert_eq!(scaled.linear()["c"], -2.0);
        assert_eq!(scaled.interactions()[&Term::new(["a", "b", "c"])], 1.6);
        assert_eq!(scaled.offset(), 2.5);
    }

    #[test]
    fn test_hyper_computed_scalar_uses_quadratic_range() {
        let poly = example_hyper();
        let scaled = scale_hyper(
            &poly,
            None,
            BiasRange::Symmetric(4.0),
            Some(BiasRange::Bounds(-1.0, 0.4)),
            Some(&none()),
            true,
        )
        .unwrap();
        assert!((scaled.interactions()[&Term::new(["a", "b", "c"])] - 0.4).abs() < 1e-12);
        assert!((scaled.linear()["a"] - (-0.5)).abs() < 1e-12);
        assert_eq!(scaled.offset(), 5.0);
    }

    #[test]
    fn test_hyper_permuted_exclusion() {
        let poly = example_hyper();
        let terms = vec![vec!["c".to_string(), "b".to_string(), "a".to_string()]];
        let ex = normalize(None, Some(&terms)).unwrap();
        let scaled =
            scale_hyper(&poly, Some(0.5), BiasRange::default(), None, Some(&ex), false).unwrap();
        assert_eq!(scaled.interactions()[&Term::new(["a", "b", "c"])], 3.2);
        assert_eq!(scaled.linear()["a"], -8.0);
    }

    #[test]
    fn test_computed_scalar_skips_excluded_variables() {
        let bqm = BinaryQuadraticModel::from_ising(
            [("a", -4.0), ("b", -4.0)],
            [(("a", "b"), 3.2)],
            0.0,
        )
        .unwrap();
        let vars = vec!["a".to_string(), "b".to_string()];
        let ex = normalize(Some(&vars), None).unwrap();
        let scaled =
            scale_pairwise(&bqm, None, BiasRange::Bounds(2.0, 2.0), None, Some(&ex), false)
                .unwrap();
        assert_eq!(scaled.linear()["a"], -4.0);
        assert_eq!(scaled.linear()["b"], -4.0);
        assert!((scaled.get_quadratic("a", "b").unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_excluded_bias_does_not_drive_scalar() {
        let bqm =
            BinaryQuadraticModel::from_ising([("a", -4.0), ("b", 0.5)], Vec::new(), 1.0).unwrap();
        let vars = vec!["a".to_string()];
        let ex = normalize(Some(&vars), None).unwrap();
        let scaled =
            scale_pairwise(&bqm, None, BiasRange::Symmetric(1.0), None, Some(&ex), false).unwrap();
        assert_eq!(scaled, bqm);
    }

    #[test]
    fn test_hyper_computed_scalar_skips_excluded_variables() {
        let poly = BinaryPolynomial::from_ising(
            [("a", -4.0), ("b", -4.0)],
            [(Term::new(["a", "b", "c"]), 3.2)],
            5.0,
        )
        .unwrap();
        let vars = vec!["a".to_string(), "b".to_string()];
        let ex = normalize(Some(&vars), None).unwrap();
        let scaled =
            scale_hyper(&poly, None, BiasRange::Bounds(-2.0, 2.0), None, Some(&ex), false)
                .unwrap();
        assert_eq!(scaled.linear()["a"], -4.0);
        assert!((scaled.interactions()[&Term::new(["a", "b", "c"])] - 2.0).abs() < 1e-12);
        assert!((scaled.offset() - 5.0 / 1.6).abs() < 1e-12);
    }

    #[test]
    fn test_hyper_identity() {
        let poly = example_hyper();
        let scaled = scale_hyper(&poly, Some(1.0), BiasRange::default(), None, None, false).unwrap();
        assert_eq!(scaled, poly);
    }
}
