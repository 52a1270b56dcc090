//! Higher-order (polynomial) energy functions.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bqm::BinaryQuadraticModel;
use crate::types::{value_of, Assignment, EnergyError, Variable, Vartype};

/// An interaction key: a set of distinct variables.
///
/// Construction sorts and deduplicates, so any permutation of the same
/// variables yields an equal `Term`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Variable>")]
pub struct Term(Vec<Variable>);

impl Term {
    pub fn new<I, V>(variables: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Variable>,
    {
        variables.into_iter().collect()
    }

    /// Number of distinct variables.
    pub fn arity(&self) -> usize {
        self.0.len()
    }

    /// Variables in sorted order.
    pub fn variables(&self) -> &[Variable] {
        &self.0
    }

    pub fn contains(&self, variable: &str) -> bool {
        self.0.binary_search_by(|v| v.as_str().cmp(variable)).is_ok()
    }
}

impl<V: Into<Variable>> FromIterator<V> for Term {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let set: BTreeSet<Variable> = iter.into_iter().map(Into::into).collect();
        Term(set.into_iter().collect())
    }
}

impl From<Vec<Variable>> for Term {
    fn from(variables: Vec<Variable>) -> Self {
        variables.into_iter().collect()
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.join(", "))
    }
}

/// Energy function whose interactions may couple any number of variables.
///
/// `E(x) = offset + Σ h_i x_i + Σ J_t Π_{i∈t} x_i`
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryPolynomial {
    vartype: Vartype,
    linear: BTreeMap<Variable, f64>,
    interactions: BTreeMap<Term, f64>,
    offset: f64,
}

impl BinaryPolynomial {
    /// Create an empty polynomial.
    pub fn new(vartype: Vartype) -> Self {
        Self {
            vartype,
            linear: BTreeMap::new(),
            interactions: BTreeMap::new(),
            offset: 0.0,
        }
    }

    /// Build a spin-valued polynomial from `h`, `J` and an offset.
    pub fn from_ising<L, J, V>(linear: L, interactions: J, offset: f64) -> Result<Self, EnergyError>
    where
        L: IntoIterator<Item = (V, f64)>,
        J: IntoIterator<Item = (Term, f64)>,
        V: Into<Variable>,
    {
        Self::from_parts(Vartype::Spin, linear, interactions, offset)
    }

    /// Build a polynomial of the given vartype. Repeated terms accumulate.
    pub fn from_parts<L, J, V>(
        vartype: Vartype,
        linear: L,
        interactions: J,
        offset: f64,
    ) -> Result<Self, EnergyError>
    where
        L: IntoIterator<Item = (V, f64)>,
        J: IntoIterator<Item = (Term, f64)>,
        V: Into<Variable>,
    {
        let mut poly = Self::new(vartype);
        for (v, bias) in linear {
            poly.add_variable(v, bias);
        }
        for (term, bias) in interactions {
            poly.add_interaction(term, bias)?;
        }
        poly.offset = offset;
        Ok(poly)
    }

    /// Add `bias` to the linear bias of `v`, creating it if needed.
    pub fn add_variable(&mut self, v: impl Into<Variable>, bias: f64) {
        *self.linear.entry(v.into()).or_insert(0.0) += bias;
    }

    /// Add `bias` to the interaction on `term`.
    pub fn add_interaction(&mut self, term: Term, bias: f64) -> Result<(), EnergyError> {
        if term.arity() < 2 {
            return Err(EnergyError::TermArity(term.arity()));
        }
        for v in term.variables() {
            self.linear.entry(v.clone()).or_insert(0.0);
        }
        *self.interactions.entry(term).or_insert(0.0) += bias;
        Ok(())
    }

    pub fn vartype(&self) -> Vartype {
        self.vartype
    }

    pub fn linear(&self) -> &BTreeMap<Variable, f64> {
        &self.linear
    }

    pub fn interactions(&self) -> &BTreeMap<Term, f64> {
        &self.interactions
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: f64) {
        self.offset = offset;
    }

    pub fn num_variables(&self) -> usize {
        self.linear.len()
    }

    /// Variable labels in sorted order.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.linear.keys()
    }

    /// Largest interaction arity, 0 when there are no interactions.
    pub fn max_interaction_arity(&self) -> usize {
        self.interactions.keys().map(Term::arity).max().unwrap_or(0)
    }

    /// Energy of `assignment`, which must give every model variable a value.
    pub fn energy(&self, assignment: &Assignment) -> Result<f64, EnergyError> {
        let mut energy = self.offset;
        for (v, bias) in &self.linear {
            energy += bias * value_of(assignment, v, self.vartype)?;
        }
        for (term, bias) in &self.interactions {
            let mut product = *bias;
            for v in term.variables() {
                product *= value_of(assignment, v, self.vartype)?;
            }
            energy += product;
        }
        Ok(energy)
    }
}

impl From<&BinaryQuadraticModel> for BinaryPolynomial {
    fn from(bqm: &BinaryQuadraticModel) -> Self {
        let interactions = bqm
            .quadratic()
            .iter()
            .map(|((u, v), bias)| (Term::new([u.clone(), v.clone()]), *bias))
            .collect();
        Self {
            vartype: bqm.vartype(),
            linear: bqm.linear().clone(),
            interactions,
            offset: bqm.offset(),
        }
    }
}
