//! Binary quadratic model: linear biases, pairwise interactions, offset.

use std::collections::BTreeMap;

use crate::poly::BinaryPolynomial;
use crate::types::{value_of, Assignment, EnergyError, Variable, Vartype};

/// Order a pair so `(a, b)` and `(b, a)` share one key.
fn canonical_pair(u: Variable, v: Variable) -> (Variable, Variable) {
    if u <= v {
        (u, v)
    } else {
        (v, u)
    }
}

/// Quadratic energy function over spin or binary variables.
///
/// `E(x) = offset + Σ h_i x_i + Σ J_ij x_i x_j`
///
/// Interaction keys are stored with the smaller label first. Every variable
/// named by an interaction is also a model variable (with bias 0 if it was
/// never given one). Equality compares all biases exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryQuadraticModel {
    vartype: Vartype,
    linear: BTreeMap<Variable, f64>,
    quadratic: BTreeMap<(Variable, Variable), f64>,
    offset: f64,
}

impl BinaryQuadraticModel {
    /// Create an empty model.
    pub fn new(vartype: Vartype) -> Self {
        Self {
            vartype,
            linear: BTreeMap::new(),
            quadratic: BTreeMap::new(),
            offset: 0.0,
        }
    }

    /// Build a spin-valued model from `h`, `J` and an offset.
    pub fn from_ising<L, Q, V>(linear: L, quadratic: Q, offset: f64) -> Result<Self, EnergyError>
    where
        L: IntoIterator<Item = (V, f64)>,
        Q: IntoIterator<Item = ((V, V), f64)>,
        V: Into<Variable>,
    {
        Self::from_parts(Vartype::Spin, linear, quadratic, offset)
    }

    /// Build a model of the given vartype from linear and quadratic biases.
    ///
    /// Repeated keys accumulate, including `(a, b)` followed by `(b, a)`.
    pub fn from_parts<L, Q, V>(
        vartype: Vartype,
        linear: L,
        quadratic: Q,
        offset: f64,
    ) -> Result<Self, EnergyError>
    where
        L: IntoIterator<Item = (V, f64)>,
        Q: IntoIterator<Item = ((V, V), f64)>,
        V: Into<Variable>,
    {
        let mut bqm = Self::new(vartype);
        for (v, bias) in linear {
            bqm.add_variable(v, bias);
        }
        for ((u, v), bias) in quadratic {
            bqm.add_interaction(u, v, bias)?;
        }
        bqm.offset = offset;
        Ok(bqm)
    }

    /// Add `bias` to the linear bias of `v`, creating it if needed.
    pub fn add_variable(&mut self, v: impl Into<Variable>, bias: f64) {
        *self.linear.entry(v.into()).or_insert(0.0) += bias;
    }

    /// Add `bias` to the interaction between `u` and `v`.
    pub fn add_interaction(
        &mut self,
        u: impl Into<Variable>,
        v: impl Into<Variable>,
        bias: f64,
    ) -> Result<(), EnergyError> {
        let (u, v) = (u.into(), v.into());
        if u == v {
            return Err(EnergyError::SelfInteraction(u));
        }
        self.linear.entry(u.clone()).or_insert(0.0);
        self.linear.entry(v.clone()).or_insert(0.0);
        *self.quadratic.entry(canonical_pair(u, v)).or_insert(0.0) += bias;
        Ok(())
    }

    pub fn vartype(&self) -> Vartype {
        self.vartype
    }

    pub fn linear(&self) -> &BTreeMap<Variable, f64> {
        &self.linear
    }

    /// Interactions keyed by `(smaller, larger)` label.
    pub fn quadratic(&self) -> &BTreeMap<(Variable, Variable), f64> {
        &self.quadratic
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

    pub fn num_interactions(&self) -> usize {
        self.quadratic.len()
    }

    /// Variable labels in sorted order.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.linear.keys()
    }

    /// Interaction bias between `u` and `v` in either order.
    pub fn get_quadratic(&self, u: &str, v: &str) -> Option<f64> {
        let key = canonical_pair(u.to_string(), v.to_string());
        self.quadratic.get(&key).copied()
    }

    /// Energy of `assignment`, which must give every model variable a value.
    pub fn energy(&self, assignment: &Assignment) -> Result<f64, EnergyError> {
        let mut energy = self.offset;
        for (v, bias) in &self.linear {
            energy += bias * value_of(assignment, v, self.vartype)?;
        }
        for ((u, v), bias) in &self.quadratic {
            energy += bias
                * value_of(assignment, u, self.vartype)?
                * value_of(assignment, v, self.vartype)?;
        }
        Ok(energy)
    }
}

impl TryFrom<&BinaryPolynomial> for BinaryQuadraticModel {
    type Error = EnergyError;

    fn try_from(poly: &BinaryPolynomial) -> Result<Self, Self::Error> {
        let arity = poly.max_interaction_arity();
        if arity > 2 {
            return Err(EnergyError::NotQuadratic(arity));
        }
        let quadratic = poly.interactions().iter().map(|(term, bias)| {
            let vars = term.variables();
            ((vars[0].clone(), vars[1].clone()), *bias)
        });
        Self::from_parts(
            poly.vartype(),
            poly.linear().iter().map(|(v, b)| (v.clone(), *b)),
            quadratic,
            poly.offset(),
        )
    }
}
