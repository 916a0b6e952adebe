//! Defines the error types for the identification module.
use crate::graph::{GraphError, MixedGraph, Variable};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// A proven structural non-identifiability result.
///
/// This is a valid terminal answer ("the effect is not identifiable from this
/// graph"), not a fault to retry. `graph` is the subproblem graph `F` in which
/// the failure was detected; it is a single district. `district` is the
/// district `F'` of that graph with the treatments removed. Together they form
/// the hedge `(F, F')`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hedge {
    pub graph: MixedGraph,
    pub district: MixedGraph,
}

impl Hedge {
    /// The vertices intervened on in the failing subproblem: `F \ F'`.
    pub fn treatments(&self) -> BTreeSet<Variable> {
        self.graph.vertices().difference(self.district.vertices()).cloned().collect()
    }
}

impl std::error::Error for Hedge {}

impl fmt::Display for Hedge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |set: &BTreeSet<Variable>| set.iter().map(Variable::to_string).collect::<Vec<_>>().join(", ");
        write!(
            f,
            "hedge over {{{}}} with district {{{}}}",
            names(self.graph.vertices()),
            names(self.district.vertices())
        )
    }
}

/// A query or estimand that cannot be evaluated against its graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidQueryError {
    #[error("variable '{variable}' is not a vertex of the graph")]
    UnknownVariable { variable: Variable },
    #[error("the query has no outcome variables")]
    EmptyOutcomes,
    #[error("variable '{variable}' appears as both {first} and {second}")]
    Overlap {
        variable: Variable,
        first: &'static str,
        second: &'static str,
    },
    #[error("the query must be a single distribution term, got '{0}'")]
    NotADistribution(String),
    /// The bare guard chain handles interventional queries only; conditional
    /// ones go through `Identifier::identify`.
    #[error("'{0}' has conditioning variables")]
    Conditional(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentificationError {
    #[error("not identifiable: {0}")]
    Hedge(#[from] Hedge),
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] InvalidQueryError),
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),
    /// The caller's recursion budget ran out before an answer was proven.
    /// Unlike a hedge this says nothing about identifiability.
    #[error("recursion budget of {max_depth} exhausted")]
    BudgetExhausted { max_depth: usize },
}

impl IdentificationError {
    pub fn is_hedge(&self) -> bool {
        matches!(self, IdentificationError::Hedge(_))
    }
}
