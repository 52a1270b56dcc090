//! Variable labels, vartypes, errors, and sample sets.

use std::collections::BTreeMap;
use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Label of a single model variable.
pub type Variable = String;

/// Value assigned to each variable of a model.
pub type Assignment = BTreeMap<Variable, i8>;

/// Errors that can occur while building or evaluating an energy function.
#[derive(Debug, thiserror::Error)]
pub enum EnergyError {
    /// A pairwise interaction named the same variable twice.
    #[error("interaction ({0}, {0}) couples a variable with itself")]
    SelfInteraction(Variable),

    /// A polynomial term had fewer than two distinct variables.
    #[error("interaction term needs at least two distinct variables, got {0}")]
    TermArity(usize),

    /// A polynomial could not be represented as a quadratic model.
    #[error("polynomial has an interaction of arity {0}, expected at most 2")]
    NotQuadratic(usize),

    /// The assignment does not give the variable a value.
    #[error("variable '{0}' has no value in the assignment")]
    MissingVariable(Variable),

    /// The assigned value is outside the vartype's domain.
    #[error("value {value} of variable '{variable}' is not a {vartype} value")]
    InvalidValue {
        variable: Variable,
        value: i8,
        vartype: Vartype,
    },
}

/// Domain of the model's variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Vartype {
    /// Variables take values in {-1, +1}.
    Spin,
    /// Variables take values in {0, 1}.
    Binary,
}

impl fmt::Display for Vartype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spin => write!(f, "SPIN"),
            Self::Binary => write!(f, "BINARY"),
        }
    }
}

impl Vartype {
    /// The two values a variable of this type can take, lowest first.
    pub fn values(self) -> [i8; 2] {
        match self {
            Self::Spin => [-1, 1],
            Self::Binary => [0, 1],
        }
    }

    /// Whether `value` belongs to this vartype's domain.
    pub fn contains(self, value: i8) -> bool {
        self.values().contains(&value)
    }
}

/// Look up and validate the value of `variable` in `assignment`.
pub(crate) fn value_of(
    assignment: &Assignment,
    variable: &str,
    vartype: Vartype,
) -> Result<f64, EnergyError> {
    let value = *assignment
        .get(variable)
        .ok_or_else(|| EnergyError::MissingVariable(variable.to_string()))?;
    if !vartype.contains(value) {
        return Err(EnergyError::InvalidValue {
            variable: variable.to_string(),
            value,
            vartype,
        });
    }
    Ok(f64::from(value))
}

/// A single candidate returned by a sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Value of every model variable.
    pub assignment: Assignment,
    /// Energy of the assignment.
    pub energy: f64,
    /// How many times the sampler produced this assignment.
    pub num_occurrences: u32,
}

impl Sample {
    pub fn new(assignment: Assignment, energy: f64) -> Self {
        Self {
            assignment,
            energy,
            num_occurrences: 1,
        }
    }
}

/// Ordered collection of samples plus free-form metadata.
///
/// Sample order is whatever the producing sampler chose; nothing here
/// re-sorts implicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSet {
    /// Vartype of every assignment in the set.
    pub vartype: Vartype,
    /// Candidates in sampler order.
    pub samples: Vec<Sample>,
    /// Sampler-specific metadata (timing, ranking details, scaling factor).
    #[serde(default)]
    pub info: serde_json::Map<String, serde_json::Value>,
}

impl SampleSet {
    /// Create a sample set with empty metadata.
    pub fn new(vartype: Vartype, samples: Vec<Sample>) -> Self {
        Self {
            vartype,
            samples,
            info: serde_json::Map::new(),
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the set holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Iterate samples in sampler order.
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// The lowest-energy sample (the earliest one on ties).
    pub fn first(&self) -> Option<&Sample> {
        self.samples.iter().min_by_key(|s| OrderedFloat(s.energy))
    }

    /// Energies in sampler order.
    pub fn energies(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.energy).collect()
    }

    /// Stable sort by ascending energy.
    pub fn sort_by_energy(&mut self) {
        self.samples.sort_by_key(|s| OrderedFloat(s.energy));
    }

    /// Replace every energy with `f(sample)`, keeping order and assignments.
    ///
    /// Stops at the first error; samples before it are already updated.
    pub fn try_map_energies<E, F>(&mut self, mut f: F) -> Result<(), E>
    where
        F: FnMut(&Sample) -> Result<f64, E>,
    {
        for sample in &mut self.samples {
            sample.energy = f(sample)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(pairs: &[(&str, i8)]) -> Assignment {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_vartype_display() {
        assert_eq!(Vartype::Spin.to_string(), "SPIN");
        assert_eq!(Vartype::Binary.to_string(), "BINARY");
    }

    #[test]
    fn test_vartype_domain() {
        assert!(Vartype::Spin.contains(-1));
        assert!(Vartype::Spin.contains(1));
        assert!(!Vartype::Spin.contains(0));
        assert!(Vartype::Binary.contains(0));
        assert!(!Vartype::Binary.contains(-1));
    }

    #[test]
    fn test_vartype_serde_roundtrip() {
        for vartype in [Vartype::Spin, Vartype::Binary] {
            let json = serde_json::to_string(&vartype).unwrap();
            let parsed: Vartype = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, vartype);
        }
        assert_eq!(serde_json::to_string(&Vartype::Spin).unwrap(), "\"SPIN\"");
    }

    #[test]
    fn test_value_of_rejects_out_of_domain() {
        let a = assignment(&[("a", 0)]);
        let err = value_of(&a, "a", Vartype::Spin).unwrap_err();
        assert!(matches!(err, EnergyError::InvalidValue { value: 0, .. }));
    }

    #[test]
    fn test_value_of_missing() {
        let a = assignment(&[("a", 1)]);
        let err = value_of(&a, "b", Vartype::Spin).unwrap_err();
        assert!(matches!(err, EnergyError::MissingVariable(v) if v == "b"));
    }

    #[test]
    fn test_first_is_lowest_energy() {
        let set = SampleSet::new(
            Vartype::Spin,
            vec![
                Sample::new(assignment(&[("a", 1)]), 3.0),
                Sample::new(assignment(&[("a", -1)]), -2.0),
            ],
        );
        assert_eq!(set.first().unwrap().energy, -2.0);
    }

    #[test]
    fn test_first_prefers_earliest_on_tie() {
        let set = SampleSet::new(
            Vartype::Spin,
            vec![
                Sample::new(assignment(&[("a", 1)]), 0.0),
                Sample::new(assignment(&[("a", -1)]), 0.0),
            ],
        );
        assert_eq!(set.first().unwrap().assignment["a"], 1);
    }

    #[test]
    fn test_first_empty() {
        let set = SampleSet::new(Vartype::Binary, vec![]);
        assert!(set.first().is_none());
        assert!(set.is_empty());
    }

    #[test]
    fn test_try_map_energies_keeps_order() {
        let mut set = SampleSet::new(
            Vartype::Spin,
            vec![
                Sample::new(assignment(&[("a", 1)]), 1.0),
                Sample::new(assignment(&[("a", -1)]), 2.0),
            ],
        );
        set.try_map_energies::<(), _>(|s| Ok(s.energy * 10.0)).unwrap();
        assert_eq!(set.energies(), vec![10.0, 20.0]);
        assert_eq!(set.samples[0].assignment["a"], 1);
    }

    #[test]
    fn test_sort_by_energy() {
        let mut set = SampleSet::new(
            Vartype::Spin,
            vec![
                Sample::new(assignment(&[("a", 1)]), 5.0),
                Sample::new(assignment(&[("a", -1)]), -5.0),
            ],
        );
        set.sort_by_energy();
        assert_eq!(set.energies(), vec![-5.0, 5.0]);
    }

    #[test]
    fn test_sample_set_serde_roundtrip() {
        let mut set = SampleSet::new(
            Vartype::Binary,
            vec![Sample::new(assignment(&[("x", 1), ("y", 0)]), 0.5)],
        );
        set.info.insert("scalar".to_string(), serde_json::json!(2.0));
        let json = serde_json::to_string(&set).unwrap();
        let parsed: SampleSet = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, set);
    }
}
