//! Pseudo-Boolean energy functions and the sample sets samplers return.
//!
//! Provides the containers a sampler consumes and produces: quadratic models,
//! higher-order polynomials, and ranked sets of variable assignments with
//! their energies.
//!
//! # Key types
//!
//! - [`BinaryQuadraticModel`] — linear biases, pairwise interactions, offset
//! - [`BinaryPolynomial`] / [`Term`] — interactions of any arity
//! - [`SampleSet`] / [`Sample`] — candidate assignments with energies
//! - [`Vartype`] — spin (−1/+1) or binary (0/1) variables

pub mod bqm;
pub mod poly;
pub mod types;

pub use bqm::BinaryQuadraticModel;
pub use poly::{BinaryPolynomial, Term};
pub use types::{Assignment, EnergyError, Sample, SampleSet, Variable, Vartype};
