//! Causal effect identification: the ID and IDC procedures over a `MixedGraph`.
pub mod algorithm;
pub mod conditional;
pub mod error;
pub mod identification;

pub use algorithm::{step, Identifier, Step};
pub use error::{Hedge, IdentificationError, InvalidQueryError};
pub use identification::Identification;

use crate::dsl::Expression;
use crate::graph::{MixedGraph, Variable};
use std::collections::BTreeSet;

/// Identifies `P(outcomes | do(treatments), conditions)` in `graph` with the
/// default configuration.
///
/// Returns the estimand over the observational joint, or
/// `IdentificationError::Hedge` when the effect is not identifiable.
pub fn identify(
    outcomes: BTreeSet<Variable>,
    treatments: BTreeSet<Variable>,
    conditions: BTreeSet<Variable>,
    graph: MixedGraph,
) -> Result<Expression, IdentificationError> {
    let id = Identification::from_parts(outcomes, treatments, conditions, graph)?;
    Identifier::default().identify(id)
}
