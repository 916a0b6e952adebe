//! Conditional queries `P(Y | do(X), Z)` via IDC (Shpitser & Pearl, 2006).

use super::algorithm::Identifier;
use super::error::IdentificationError;
use super::identification::Identification;
use crate::analysis::is_d_separated;
use crate::dsl::{Distribution, Expression};
use crate::graph::{GraphError, MixedGraph, Variable};
use std::collections::BTreeSet;
use tracing::debug;

/// Identifies a query with conditioning variables.
///
/// Every condition `z` that is independent of the outcomes once `X` is acted
/// on and `z`'s own outgoing edges are cut is promoted to a treatment (rule 2
/// of do-calculus). What remains is answered as `P' / Σ_Y P'` with
/// `P' = P(Y, Z | do(X))` from the ID procedure.
pub fn idc(identifier: &Identifier, id: Identification) -> Result<Expression, IdentificationError> {
    let query = id.distribution()?.clone();
    let outcomes = query.children;
    let mut treatments = query.interventions;
    let mut conditions = query.parents;

    while let Some(z) = promotable(id.graph(), &outcomes, &treatments, &conditions)? {
        debug!(condition = %z, "promoting condition to treatment");
        conditions.remove(&z);
        treatments.insert(z);
    }

    let (_, estimand, graph) = id.into_parts();
    if conditions.is_empty() {
        let query = Distribution { children: outcomes, parents: BTreeSet::new(), interventions: treatments };
        return identifier.run(Identification::derive(query, estimand, graph), 0);
    }

    debug!(remaining = ?conditions, "identifying joint of outcomes and conditions");
    let children = outcomes.union(&conditions).cloned().collect();
    let query = Distribution { children, parents: BTreeSet::new(), interventions: treatments };
    let joint = identifier.run(Identification::derive(query, estimand, graph), 0)?;
    let denominator = joint.clone().marginalize(&outcomes);
    Ok(Expression::fraction(joint, denominator))
}

/// The first condition, in name order, that may be moved into the treatments.
fn promotable(
    graph: &MixedGraph,
    outcomes: &BTreeSet<Variable>,
    treatments: &BTreeSet<Variable>,
    conditions: &BTreeSet<Variable>,
) -> Result<Option<Variable>, GraphError> {
    let acted = graph.without_incoming(treatments);
    for z in conditions {
        let single = BTreeSet::from([z.clone()]);
        let cut = acted.without_outgoing(&single);
        let given: BTreeSet<Variable> = treatments.iter().chain(conditions).filter(|v| *v != z).cloned().collect();
        if is_d_separated(&cut, outcomes, &single, &given)? {
            return Ok(Some(z.clone()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::variables;

    fn conditional_query(g: MixedGraph) -> Identification {
        Identification::from_parts(variables(["Y"]), variables(["X"]), variables(["Z"]), g).unwrap()
    }

    #[test]
    fn test_condition_promoted_when_separated() {
        // X -> Z -> Y with X <-> Z: Z screens Y off once acted on.
        let g = MixedGraph::from_edges([("X", "Z"), ("Z", "Y")], [("X", "Z")]).unwrap();
        let estimand = Identifier::default().identify(conditional_query(g)).unwrap();
        assert_eq!(estimand, Expression::from(Distribution::of(["Y"]).given(["X", "Z"])));
    }

    #[test]
    fn test_descendant_condition_stays_a_ratio() {
        let g = MixedGraph::from_edges([("X", "Y"), ("Y", "Z")], Vec::<(&str, &str)>::new()).unwrap();
        let estimand = Identifier::default().identify(conditional_query(g)).unwrap();
        assert_eq!(
            estimand.to_string(),
            "[P(Y | X) P(Z | X, Y)] / [Σ_{Y} P(Y | X) P(Z | X, Y)]"
        );
    }

    #[test]
    fn test_hedge_in_joint_propagates() {
        // Z is a child of Y, so it cannot be promoted, and P(Y, Z | do(X)) hits the bow arc.
        let g = MixedGraph::from_edges([("X", "Y"), ("Y", "Z")], [("X", "Y")]).unwrap();
        let err = Identifier::default().identify(conditional_query(g)).unwrap_err();
        assert!(err.is_hedge(), "got {err:?}");
    }
}
