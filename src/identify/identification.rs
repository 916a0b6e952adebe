//! The `Identification` state: one node of the ID search tree.

use super::error::InvalidQueryError;
use crate::dsl::{Distribution, Expression};
use crate::graph::{MixedGraph, Variable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A `(query, estimand, graph)` triple.
///
/// `query` is the causal quantity sought; `estimand` is the observational
/// distribution it must be expressed in terms of; `graph` is the structure
/// both are evaluated against. Equality is structural over all three.
/// Deserialization runs the same checks as [`Identification::from_expression`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawIdentification")]
pub struct Identification {
    query: Expression,
    estimand: Expression,
    graph: MixedGraph,
}

impl Identification {
    /// Builds an identification from an arbitrary query/estimand pair.
    ///
    /// Fails if either mentions a variable outside the graph, or if the query
    /// is a distribution whose outcome, treatment and condition sets are
    /// empty or overlapping.
    pub fn from_expression(
        query: Expression,
        estimand: Expression,
        graph: MixedGraph,
    ) -> Result<Self, InvalidQueryError> {
        let id = Self { query, estimand, graph };
        id.validate()?;
        Ok(id)
    }

    /// Checks that every variable of the query and estimand is a vertex, and
    /// that a distribution query has outcomes and disjoint roles.
    pub fn validate(&self) -> Result<(), InvalidQueryError> {
        for variable in self.query.variables().into_iter().chain(self.estimand.variables()) {
            if !self.graph.contains(&variable) {
                return Err(InvalidQueryError::UnknownVariable { variable });
            }
        }
        match self.query.as_distribution() {
            Some(d) => validate_roles(d),
            None => Ok(()),
        }
    }

    /// Builds the canonical query `P(outcomes | do(treatments), conditions)`
    /// with the joint over every vertex as estimand.
    pub fn from_parts(
        outcomes: BTreeSet<Variable>,
        treatments: BTreeSet<Variable>,
        conditions: BTreeSet<Variable>,
        graph: MixedGraph,
    ) -> Result<Self, InvalidQueryError> {
        let estimand = Expression::joint(graph.vertices().iter().cloned());
        Self::from_parts_with_estimand(outcomes, treatments, conditions, estimand, graph)
    }

    pub fn from_parts_with_estimand(
        outcomes: BTreeSet<Variable>,
        treatments: BTreeSet<Variable>,
        conditions: BTreeSet<Variable>,
        estimand: Expression,
        graph: MixedGraph,
    ) -> Result<Self, InvalidQueryError> {
        let query = Distribution { children: outcomes, parents: conditions, interventions: treatments };
        Self::from_expression(query.into(), estimand, graph)
    }

    /// Builds a subproblem node. The query is checked against the graph, the
    /// estimand is not: after an ID line 7 reduction the estimand legitimately
    /// conditions on values fixed outside the reduced graph.
    pub(crate) fn derive(query: Distribution, estimand: Expression, graph: MixedGraph) -> Self {
        Self { query: query.into(), estimand, graph }
    }

    pub fn query(&self) -> &Expression { &self.query }
    pub fn estimand(&self) -> &Expression { &self.estimand }
    pub fn graph(&self) -> &MixedGraph { &self.graph }

    pub fn into_parts(self) -> (Expression, Expression, MixedGraph) {
        (self.query, self.estimand, self.graph)
    }

    /// The query as a single distribution term, which the ID algorithm needs.
    pub fn distribution(&self) -> Result<&Distribution, InvalidQueryError> {
        self.query
            .as_distribution()
            .ok_or_else(|| InvalidQueryError::NotADistribution(self.query.to_string()))
    }

    pub fn outcomes(&self) -> Result<&BTreeSet<Variable>, InvalidQueryError> {
        Ok(&self.distribution()?.children)
    }

    pub fn treatments(&self) -> Result<&BTreeSet<Variable>, InvalidQueryError> {
        Ok(&self.distribution()?.interventions)
    }

    pub fn conditions(&self) -> Result<&BTreeSet<Variable>, InvalidQueryError> {
        Ok(&self.distribution()?.parents)
    }
}

#[derive(Deserialize)]
struct RawIdentification {
    query: Expression,
    estimand: Expression,
    graph: MixedGraph,
}

impl TryFrom<RawIdentification> for Identification {
    type Error = InvalidQueryError;

    fn try_from(raw: RawIdentification) -> Result<Self, Self::Error> {
        Identification::from_expression(raw.query, raw.estimand, raw.graph)
    }
}

fn validate_roles(d: &Distribution) -> Result<(), InvalidQueryError> {
    if d.children.is_empty() {
        return Err(InvalidQueryError::EmptyOutcomes);
    }
    let roles = [
        ("outcome", &d.children),
        ("treatment", &d.interventions),
        ("condition", &d.parents),
    ];
    for (i, (first, a)) in roles.iter().enumerate() {
        for (second, b) in &roles[i + 1..] {
            if let Some(variable) = a.intersection(b).next() {
                return Err(InvalidQueryError::Overlap { variable: variable.clone(), first: *first, second: *second });
            }
        }
    }
    Ok(())
}
