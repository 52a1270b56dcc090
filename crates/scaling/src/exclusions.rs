//! Canonical "do not scale" sets for variables and interactions.

use std::collections::BTreeSet;

use energy::{Term, Variable};

use crate::composite::ScaleError;

/// Variables and interactions exempt from scaling.
///
/// Interactions are stored as [`Term`]s, so membership ignores the order in
/// which the variables were listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions {
    variables: BTreeSet<Variable>,
    interactions: BTreeSet<Term>,
}

impl Exclusions {
    /// Normalize the exclusion lists carried by scaling options.
    pub fn from_options(options: &crate::ScaleOptions) -> Result<Self, ScaleError> {
        normalize(
            options.ignored_variables.as_deref(),
            options.ignored_interactions.as_deref(),
        )
    }

    pub fn ignores_variable(&self, variable: &str) -> bool {
        self.variables.contains(variable)
    }

    pub fn ignores_interaction(&self, term: &Term) -> bool {
        self.interactions.contains(term)
    }

    /// Whether nothing is excluded.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty() && self.interactions.is_empty()
    }

    pub fn variables(&self) -> &BTreeSet<Variable> {
        &self.variables
    }

    pub fn interactions(&self) -> &BTreeSet<Term> {
        &self.interactions
    }
}

/// Canonicalize caller-supplied exclusion lists.
///
/// `None` means "exclude nothing". Interaction entries must name at least
/// two distinct variables.
pub fn normalize(
    ignored_variables: Option<&[Variable]>,
    ignored_interactions: Option<&[Vec<Variable>]>,
) -> Result<Exclusions, ScaleError> {
    let variables = ignored_variables
        .unwrap_or_default()
        .iter()
        .cloned()
        .collect();

    let mut interactions = BTreeSet::new();
    for entry in ignored_interactions.unwrap_or_default() {
        let term = Term::new(entry.iter().cloned());
        if term.arity() < 2 {
            return Err(ScaleError::InvalidInteraction(format!("{entry:?}")));
        }
        interactions.insert(term);
    }

    Ok(Exclusions {
        variables,
        interactions,
    })
}

/// Interaction key of a model, checked against [`Exclusions`].
pub trait InteractionKey {
    /// Number of variables the interaction couples.
    fn arity(&self) -> usize;

    /// Whether `exclusions` exempts this interaction.
    fn is_excluded(&self, exclusions: &Exclusions) -> bool;
}

impl InteractionKey for (Variable, Variable) {
    fn arity(&self) -> usize {
        2
    }

    fn is_excluded(&self, exclusions: &Exclusions) -> bool {
        if exclusions.interactions.is_empty() {
            return false;
        }
        exclusions.ignores_interaction(&Term::new([self.0.as_str(), self.1.as_str()]))
    }
}

impl InteractionKey for Term {
    fn arity(&self) -> usize {
        Term::arity(self)
    }

    fn is_excluded(&self, exclusions: &Exclusions) -> bool {
        exclusions.ignores_interaction(self)
    }
}
