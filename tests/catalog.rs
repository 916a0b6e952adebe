//! End-to-end runs over a catalog of textbook graphs.

use causal_id_core::graph::variables;
use causal_id_core::{identify, IdentificationError, LatentDag, MixedGraph};
use rstest::rstest;

fn graph(directed: &[(&str, &str)], undirected: &[(&str, &str)]) -> MixedGraph {
    MixedGraph::from_edges(directed.iter().copied(), undirected.iter().copied()).unwrap()
}

fn run(g: MixedGraph, outcomes: &[&str], treatments: &[&str], conditions: &[&str]) -> Result<String, IdentificationError> {
    identify(
        variables(outcomes.iter().copied()),
        variables(treatments.iter().copied()),
        variables(conditions.iter().copied()),
        g,
    )
    .map(|estimand| estimand.to_string())
}

#[rstest]
#[case::backdoor(
    graph(&[("Z", "X"), ("Z", "Y"), ("X", "Y")], &[]),
    "Σ_{Z} P(Y | X, Z) P(Z)"
)]
#[case::frontdoor(
    graph(&[("X", "Z"), ("Z", "Y")], &[("X", "Y")]),
    "Σ_{Z} [Σ_{X} P(X) P(Y | X, Z)] P(Z | X)"
)]
#[case::m_bias(
    graph(&[("X", "Y")], &[("X", "M"), ("M", "Y")]),
    "P(Y | X)"
)]
#[case::line_4(
    graph(&[("X", "M"), ("Z", "X"), ("Z", "Y"), ("M", "Y")], &[("Z", "X"), ("M", "Y")]),
    "Σ_{M, Z} P(M | X, Z) P(Y | M, X, Z) P(Z)"
)]
fn test_identifiable_effects_of_x_on_y(#[case] g: MixedGraph, #[case] expected: &str) {
    assert_eq!(run(g, &["Y"], &["X"], &[]).unwrap(), expected);
}

#[test]
fn test_napkin_is_identifiable_despite_confounding() {
    let g = graph(&[("Z2", "Z1"), ("Z1", "X"), ("X", "Y")], &[("Z2", "X"), ("Z2", "Y")]);
    let estimand = run(g, &["Y"], &["X"], &[]).unwrap();
    assert!(estimand.starts_with("[Σ_{Z2} P(Z2) P(X | Z1, Z2)"), "{estimand}");
    assert!(estimand.contains(" / [Σ_{Y, Z2} "), "{estimand}");
}

#[test]
fn test_verma_1() {
    let g = graph(&[("V1", "V2"), ("V2", "V3"), ("V3", "V4")], &[("V2", "V4")]);
    assert_eq!(
        run(g, &["V4"], &["V3"], &[]).unwrap(),
        "Σ_{V2} P(V2 | V1) P(V4 | V1, V2, V3)"
    );
}

#[rstest]
#[case::bow_arc(graph(&[("X", "Y")], &[("X", "Y")]))]
#[case::instrumental_variable(graph(&[("Z", "X"), ("X", "Y")], &[("X", "Y")]))]
fn test_unidentifiable(#[case] g: MixedGraph) {
    let err = run(g, &["Y"], &["X"], &[]).unwrap_err();
    assert!(err.is_hedge(), "expected a hedge, got {err:?}");
}

#[test]
fn test_conditional_effect_figure_6a() {
    let g = graph(&[("X", "Z"), ("Z", "Y")], &[("X", "Z")]);
    assert_eq!(run(g, &["Y"], &["X"], &["Z"]).unwrap(), "P(Y | X, Z)");
}

#[test]
fn test_invalid_query_is_not_a_hedge() {
    let g = graph(&[("X", "Y")], &[]);
    let err = run(g, &["Y"], &["Q"], &[]).unwrap_err();
    assert!(matches!(err, IdentificationError::InvalidQuery(_)), "{err:?}");
}

#[test]
fn test_graph_survives_json_and_latent_round_trips() {
    let g = graph(&[("V1", "V2"), ("V2", "V3"), ("V3", "V4"), ("V4", "V5")], &[("V1", "V3"), ("V2", "V4"), ("V3", "V5")]);
    let json = g.to_json().unwrap();
    assert_eq!(MixedGraph::from_json(&json).unwrap(), g);

    let dag = LatentDag::from_admg(&g);
    assert_eq!(dag.latents().len(), 3);
    assert_eq!(dag.to_admg().unwrap(), g);
}

#[test]
fn test_shared_graph_across_threads() {
    let g = graph(&[("Z", "X"), ("Z", "Y"), ("X", "Y")], &[]);
    let results: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| run(g.clone(), &["Y"], &["X"], &[]).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(results.iter().all(|r| r == "Σ_{Z} P(Y | X, Z) P(Z)"));
    assert_eq!(g.vertices(), &variables(["X", "Y", "Z"]));
}
