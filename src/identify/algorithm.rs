//! The seven-line ID procedure (Shpitser & Pearl, 2008) as an ordered guard
//! chain, plus the driver that runs it to completion.
//!
//! `step` inspects one `Identification` and reports what the first matching
//! line does with it. `Identifier` feeds recursions back into `step` until an
//! estimand or a hedge comes out.

use super::error::{Hedge, IdentificationError, InvalidQueryError};
use super::identification::Identification;
use crate::config::IdentifyConfig;
use crate::dsl::{Distribution, Expression};
use crate::graph::Variable;
use rayon::prelude::*;
use std::collections::BTreeSet;
use tracing::debug;

/// The outcome of applying the first matching line to one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Lines 1 and 6: a closed-form estimand.
    Identified(Expression),
    /// Lines 2, 3 and 7: a single smaller subproblem whose answer is the answer.
    Recurse(Identification),
    /// Line 4: the answer is `Σ_{ranges} Π answer(child)`, children in district order.
    Decompose {
        ranges: BTreeSet<Variable>,
        children: Vec<Identification>,
    },
    /// Line 5.
    Failure(Hedge),
}

fn difference(a: &BTreeSet<Variable>, b: &BTreeSet<Variable>) -> BTreeSet<Variable> {
    a.difference(b).cloned().collect()
}

fn interventional(children: BTreeSet<Variable>, interventions: BTreeSet<Variable>) -> Distribution {
    Distribution { children, parents: BTreeSet::new(), interventions }
}

/// Applies the first line of ID whose guard holds.
///
/// The query must be `P(Y | do(X))` with no conditioning variables; the order
/// of the guards below is part of the algorithm's correctness.
pub fn step(id: &Identification) -> Result<Step, IdentificationError> {
    let query = id.distribution()?;
    if !query.parents.is_empty() {
        return Err(InvalidQueryError::Conditional(query.to_string()).into());
    }
    let graph = id.graph();
    let vertices = graph.vertices();
    let outcomes = &query.children;
    let treatments = &query.interventions;

    // 1: nothing left to intervene on.
    if treatments.is_empty() {
        debug!(line = 1, outcomes = ?outcomes, "marginalizing estimand");
        let ranges = difference(vertices, outcomes);
        return Ok(Step::Identified(id.estimand().clone().marginalize(&ranges)));
    }

    // 2: drop non-ancestors of the outcomes.
    let ancestors = graph.ancestors_inclusive(outcomes);
    let irrelevant = difference(vertices, &ancestors);
    if !irrelevant.is_empty() {
        debug!(line = 2, dropped = ?irrelevant, "restricting to ancestors of outcomes");
        let treatments = treatments.intersection(&ancestors).cloned().collect();
        return Ok(Step::Recurse(Identification::derive(
            interventional(outcomes.clone(), treatments),
            id.estimand().clone().marginalize(&irrelevant),
            graph.subgraph(&ancestors),
        )));
    }

    // 3: intervening on vertices that no longer reach the outcomes is free.
    let reaching = graph.without_incoming(treatments).ancestors_inclusive(outcomes);
    let forced: BTreeSet<Variable> = vertices
        .iter()
        .filter(|v| !treatments.contains(*v) && !reaching.contains(*v))
        .cloned()
        .collect();
    if !forced.is_empty() {
        debug!(line = 3, forced = ?forced, "adding forced interventions");
        let treatments = treatments.union(&forced).cloned().collect();
        return Ok(Step::Recurse(Identification::derive(
            interventional(outcomes.clone(), treatments),
            id.estimand().clone(),
            graph.clone(),
        )));
    }

    // 4: one subproblem per district of G \ X.
    let remainder = graph.remove_vertices(treatments);
    let mut districts = remainder.districts();
    if districts.len() > 1 {
        debug!(line = 4, districts = districts.len(), "decomposing into districts");
        let kept: BTreeSet<Variable> = outcomes.union(treatments).cloned().collect();
        let children = districts
            .into_iter()
            .map(|district| {
                let rest = difference(vertices, &district);
                Identification::derive(interventional(district, rest), id.estimand().clone(), graph.clone())
            })
            .collect();
        return Ok(Step::Decompose { ranges: difference(vertices, &kept), children });
    }
    let district = districts.pop().ok_or(InvalidQueryError::EmptyOutcomes)?;

    // 5: G is a single district but G \ X is strictly smaller.
    let components = graph.districts();
    if components.len() == 1 {
        debug!(line = 5, district = ?district, "hedge found");
        return Ok(Step::Failure(Hedge { graph: graph.clone(), district: remainder }));
    }

    // Districts of G \ X refine those of G, so an enclosing one always exists.
    let enclosing = components
        .into_iter()
        .find(|c| c.is_superset(&district))
        .unwrap_or_else(|| district.clone());
    let order = graph.topological_order();

    // 6: the district of G \ X is a district of G.
    if enclosing == district {
        debug!(line = 6, district = ?district, "factorizing district");
        let factors = factorize(id.estimand(), &order, &district, vertices);
        let ranges = difference(&district, outcomes);
        return Ok(Step::Identified(Expression::product(factors).marginalize(&ranges)));
    }

    // 7: it sits strictly inside a district S' of G; recurse on G[S'].
    debug!(line = 7, district = ?enclosing, "restricting to enclosing district");
    let estimand = Expression::product(factorize(id.estimand(), &order, &enclosing, vertices));
    let treatments = treatments.intersection(&enclosing).cloned().collect();
    Ok(Step::Recurse(Identification::derive(
        interventional(outcomes.clone(), treatments),
        estimand,
        graph.subgraph(&enclosing),
    )))
}

/// `P(v | v_π^(i-1))` for every `v` of `keep`, in topological order.
fn factorize(
    estimand: &Expression,
    order: &[Variable],
    keep: &BTreeSet<Variable>,
    vertices: &BTreeSet<Variable>,
) -> Vec<Expression> {
    let mut preceding = BTreeSet::new();
    let mut factors = Vec::with_capacity(keep.len());
    for v in order {
        if keep.contains(v) {
            factors.push(conditional(estimand, v, &preceding, vertices));
        }
        preceding.insert(v.clone());
    }
    factors
}

/// The conditional of `child` given `given` under `estimand`, whose free
/// variables range over `vertices`.
///
/// A plain joint yields the term `P(child | given)` directly; anything else is
/// written as the ratio of its two marginals.
pub fn conditional(
    estimand: &Expression,
    child: &Variable,
    given: &BTreeSet<Variable>,
    vertices: &BTreeSet<Variable>,
) -> Expression {
    if let Some(d) = estimand.as_distribution() {
        if d.is_joint() && d.children.contains(child) && given.is_subset(&d.children) {
            return Distribution::of([child.clone()]).given(given.iter().cloned()).into();
        }
    }
    let mut kept = given.clone();
    kept.insert(child.clone());
    let numerator = estimand.clone().marginalize(&difference(vertices, &kept));
    if given.is_empty() {
        return numerator;
    }
    let denominator = estimand.clone().marginalize(&difference(vertices, given));
    Expression::fraction(numerator, denominator)
}

/// Runs `step` to completion.
#[derive(Debug, Clone, Default)]
pub struct Identifier {
    config: IdentifyConfig,
}

impl Identifier {
    pub fn new(config: IdentifyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IdentifyConfig {
        &self.config
    }

    /// Identifies `id`, routing queries with conditioning variables through IDC.
    pub fn identify(&self, id: Identification) -> Result<Expression, IdentificationError> {
        if id.conditions()?.is_empty() {
            self.run(id, 0)
        } else {
            super::conditional::idc(self, id)
        }
    }

    /// Drives the guard chain from `id`, which sits `depth` levels below the root.
    pub(crate) fn run(&self, mut id: Identification, mut depth: usize) -> Result<Expression, IdentificationError> {
        loop {
            if let Some(max_depth) = self.config.max_depth {
                if depth > max_depth {
                    return Err(IdentificationError::BudgetExhausted { max_depth });
                }
            }
            match step(&id)? {
                Step::Identified(estimand) => return Ok(estimand),
                Step::Failure(hedge) => return Err(hedge.into()),
                Step::Recurse(next) => {
                    id = next;
                    depth += 1;
                }
                Step::Decompose { ranges, children } => {
                    // Both paths keep district order; the parallel one stops at the first error it sees.
                    let factors = if self.config.parallel {
                        children
                            .into_par_iter()
                            .map(|child| self.run(child, depth + 1))
                            .collect::<Result<Vec<_>, _>>()?
                    } else {
                        children
                            .into_iter()
                            .map(|child| self.run(child, depth + 1))
                            .collect::<Result<Vec<_>, _>>()?
                    };
                    return Ok(Expression::product(factors).marginalize(&ranges));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{variables, MixedGraph};
    use rstest::rstest;

    fn graph(directed: &[(&str, &str)], undirected: &[(&str, &str)]) -> MixedGraph {
        MixedGraph::from_edges(directed.iter().copied(), undirected.iter().copied()).unwrap()
    }

    fn query(outcomes: &[&str], treatments: &[&str], g: MixedGraph) -> Identification {
        Identification::from_parts(
            variables(outcomes.iter().copied()),
            variables(treatments.iter().copied()),
            BTreeSet::new(),
            g,
        )
        .unwrap()
    }

    fn identify(id: Identification) -> Result<Expression, IdentificationError> {
        Identifier::default().identify(id)
    }

    #[test]
    fn test_line_1_marginalizes_joint() {
        let g = graph(&[("X", "Y")], &[]);
        let step = step(&query(&["Y"], &[], g)).unwrap();
        assert_eq!(step, Step::Identified(Expression::joint(["Y"])));
    }

    #[test]
    fn test_line_2_restricts_to_ancestors() {
        let g = graph(&[("X", "Y"), ("Y", "W")], &[]);
        let Step::Recurse(next) = step(&query(&["Y"], &["X"], g)).unwrap() else {
            panic!("expected line 2 recursion");
        };
        assert_eq!(next.graph().vertices(), &variables(["X", "Y"]));
        assert_eq!(next.estimand(), &Expression::joint(["X", "Y"]));
    }

    #[test]
    fn test_line_3_adds_forced_interventions() {
        let g = graph(&[("Z2", "Z1"), ("Z1", "X"), ("X", "Y")], &[("Z2", "X"), ("Z2", "Y")]);
        let Step::Recurse(next) = step(&query(&["Y"], &["X"], g)).unwrap() else {
            panic!("expected line 3 recursion");
        };
        assert_eq!(next.treatments().unwrap(), &variables(["X", "Z1", "Z2"]));
    }

    #[test]
    fn test_backdoor() {
        let g = graph(&[("Z", "X"), ("Z", "Y"), ("X", "Y")], &[]);
        let estimand = identify(query(&["Y"], &["X"], g)).unwrap();
        let expected = (Expression::from(Distribution::of(["Y"]).given(["X", "Z"])) * Expression::joint(["Z"]))
            .marginalize(&variables(["Z"]));
        assert_eq!(estimand, expected);
        assert_eq!(estimand.to_string(), "Σ_{Z} P(Y | X, Z) P(Z)");
    }

    #[test]
    fn test_frontdoor() {
        let g = graph(&[("X", "Z"), ("Z", "Y")], &[("X", "Y")]);
        let estimand = identify(query(&["Y"], &["X"], g)).unwrap();
        assert_eq!(estimand.to_string(), "Σ_{Z} [Σ_{X} P(X) P(Y | X, Z)] P(Z | X)");
    }

    #[test]
    fn test_napkin() {
        let g = graph(&[("Z2", "Z1"), ("Z1", "X"), ("X", "Y")], &[("Z2", "X"), ("Z2", "Y")]);
        let estimand = identify(query(&["Y"], &["X"], g)).unwrap();
        let body = "P(Z2) P(X | Z1, Z2) P(Y | X, Z1, Z2)";
        assert_eq!(estimand.to_string(), format!("[Σ_{{Z2}} {body}] / [Σ_{{Y, Z2}} {body}]"));
    }

    #[test]
    fn test_line_4_product_of_districts() {
        let g = graph(
            &[("X", "M"), ("Z", "X"), ("Z", "Y"), ("M", "Y")],
            &[("Z", "X"), ("M", "Y")],
        );
        let id = query(&["Y"], &["X"], g);
        let Step::Decompose { ranges, children } = step(&id).unwrap() else {
            panic!("expected line 4 decomposition");
        };
        assert_eq!(ranges, variables(["M", "Z"]));
        let outcomes: Vec<_> = children.iter().map(|c| c.outcomes().unwrap().clone()).collect();
        assert_eq!(outcomes, vec![variables(["M", "Y"]), variables(["Z"])]);

        let estimand = identify(id).unwrap();
        assert_eq!(estimand.to_string(), "Σ_{M, Z} P(M | X, Z) P(Y | M, X, Z) P(Z)");
    }

    #[test]
    fn test_line_6_conditions_on_predecessors() {
        let g = graph(&[("X", "Y"), ("Z", "Y")], &[]);
        let step = step(&query(&["Y"], &["X", "Z"], g)).unwrap();
        assert_eq!(step, Step::Identified(Distribution::of(["Y"]).given(["X", "Z"]).into()));
    }

    #[test]
    fn test_line_7_recurses_into_enclosing_district() {
        let g = graph(&[("X", "Y1"), ("W1", "X")], &[("W1", "Y1")]);
        let id = query(&["Y1"], &["X", "W1"], g);
        let Step::Recurse(next) = step(&id).unwrap() else {
            panic!("expected line 7 recursion");
        };
        assert_eq!(next.graph().vertices(), &variables(["W1", "Y1"]));
        assert_eq!(next.treatments().unwrap(), &variables(["W1"]));

        assert_eq!(identify(id).unwrap().to_string(), "Σ_{W1} P(W1) P(Y1 | W1, X)");
    }

    #[test]
    fn test_m_graph_collapses_to_conditional() {
        let g = graph(&[("X", "Y")], &[("X", "M"), ("M", "Y")]);
        let estimand = identify(query(&["Y"], &["X"], g)).unwrap();
        assert_eq!(estimand, Expression::from(Distribution::of(["Y"]).given(["X"])));
    }

    #[rstest]
    #[case::bow_arc(&[("X", "Y")], &[("X", "Y")])]
    #[case::instrument(&[("Z", "X"), ("X", "Y")], &[("X", "Y")])]
    fn test_hedges(#[case] directed: &[(&str, &str)], #[case] undirected: &[(&str, &str)]) {
        let hedge = match identify(query(&["Y"], &["X"], graph(directed, undirected))) {
            Err(IdentificationError::Hedge(hedge)) => hedge,
            other => panic!("expected a hedge, got {other:?}"),
        };
        assert_eq!(hedge.graph.vertices(), &variables(["X", "Y"]));
        assert_eq!(hedge.district.vertices(), &variables(["Y"]));
        assert_eq!(hedge.treatments(), variables(["X"]));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let g = graph(
            &[("X", "M"), ("Z", "X"), ("Z", "Y"), ("M", "Y")],
            &[("Z", "X"), ("M", "Y")],
        );
        let parallel = Identifier::new(IdentifyConfig { parallel: true, max_depth: None });
        let a = parallel.identify(query(&["Y"], &["X"], g.clone())).unwrap();
        let b = identify(query(&["Y"], &["X"], g)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_budget_exhaustion_is_not_a_hedge() {
        let g = graph(&[("Z", "X"), ("Z", "Y"), ("X", "Y")], &[]);
        let bounded = Identifier::new(IdentifyConfig { parallel: false, max_depth: Some(0) });
        let err = bounded.identify(query(&["Y"], &["X"], g)).unwrap_err();
        assert_eq!(err, IdentificationError::BudgetExhausted { max_depth: 0 });
        assert!(!err.is_hedge());
    }

    #[test]
    fn test_step_rejects_conditional_queries() {
        let g = graph(&[("X", "Y"), ("Y", "Z")], &[]);
        let id = Identification::from_parts(variables(["Y"]), variables(["X"]), variables(["Z"]), g).unwrap();
        assert!(matches!(
            step(&id),
            Err(IdentificationError::InvalidQuery(InvalidQueryError::Conditional(_)))
        ));
    }

    #[test]
    fn test_conditional_of_composite_estimand_is_a_ratio() {
        let q = Expression::from(Distribution::of(["Y"]).given(["X"])) * Expression::joint(["X"]);
        let c = conditional(&q, &"Y".into(), &variables(["X"]), &variables(["X", "Y"]));
        assert_eq!(c, Expression::fraction(q.clone(), q.marginalize(&variables(["Y"]))));
    }
}
