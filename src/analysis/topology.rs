use crate::graph::{GraphError, MixedGraph, Variable};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Performs a Topological Sort of the directed edges using Depth-First Search.
///
/// Returns the vertices so that every parent appears before its children.
/// Vertices are visited in name order and parents are recursed in name order,
/// so the result is deterministic for a given graph.
pub fn sort(graph: &MixedGraph) -> Result<Vec<Variable>, GraphError> {
    let mut order = Vec::with_capacity(graph.vertex_count());
    let mut state: BTreeMap<&Variable, VisitState> = BTreeMap::new();

    for vertex in graph.vertices() {
        if !state.contains_key(vertex) {
            visit(vertex, graph, &mut state, &mut order)?;
        }
    }

    Ok(order)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Visiting, // Used for cycle detection
    Visited,
}

fn visit<'a>(
    vertex: &'a Variable,
    graph: &'a MixedGraph,
    state: &mut BTreeMap<&'a Variable, VisitState>,
    order: &mut Vec<Variable>,
) -> Result<(), GraphError> {
    match state.get(vertex) {
        Some(VisitState::Visited) => return Ok(()),
        Some(VisitState::Visiting) => return Err(GraphError::Cyclic { vertex: vertex.clone() }),
        None => {
            state.insert(vertex, VisitState::Visiting);
        }
    }

    for parent in graph.parents(vertex) {
        visit(parent, graph, state, order)?;
    }

    state.insert(vertex, VisitState::Visited);
    order.push(vertex.clone());
    Ok(())
}

/// Every vertex with a directed path into `start`, `start` included.
/// Start vertices that are not in the graph are kept but not expanded.
pub fn upstream_from<'a>(graph: &MixedGraph, start: impl IntoIterator<Item = &'a Variable>) -> BTreeSet<Variable> {
    closure(start, |v| graph.parents(v))
}

/// Every vertex reachable from `start` along directed edges, `start` included.
pub fn downstream_from<'a>(graph: &MixedGraph, start: impl IntoIterator<Item = &'a Variable>) -> BTreeSet<Variable> {
    closure(start, |v| graph.children(v))
}

fn closure<'a, 'g, F>(start: impl IntoIterator<Item = &'a Variable>, next: F) -> BTreeSet<Variable>
where
    F: Fn(&Variable) -> &'g BTreeSet<Variable>,
{
    let mut visited = BTreeSet::new();
    let mut queue: VecDeque<Variable> = start.into_iter().cloned().collect();

    while let Some(vertex) = queue.pop_front() {
        if visited.insert(vertex.clone()) {
            queue.extend(next(&vertex).iter().cloned());
        }
    }
    visited
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::variables;
    use proptest::prelude::*;

    #[test]
    fn test_sort_diamond_dependency() {
        // Shape: A -> B, A -> C, B+C -> D
        let g = MixedGraph::from_edges(
            [("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")],
            Vec::<(&str, &str)>::new(),
        )
        .unwrap();

        let res = sort(&g).expect("Sort failed");
        let names: Vec<&str> = res.iter().map(Variable::name).collect();
        assert_eq!(names, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_bidirected_edges_do_not_constrain_order() {
        let g = MixedGraph::from_edges([("B", "A")], [("A", "B")]).unwrap();
        let names: Vec<String> = sort(&g).unwrap().iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn test_unknown_start_vertex_is_kept() {
        let g = MixedGraph::from_edges([("A", "B")], Vec::<(&str, &str)>::new()).unwrap();
        assert_eq!(upstream_from(&g, &variables(["B", "Q"])), variables(["A", "B", "Q"]));
    }

    /// Random DAGs over `n` vertices: edges only run from lower to higher index.
    fn dag_strategy() -> impl Strategy<Value = (MixedGraph, Vec<Variable>)> {
        (2usize..8).prop_flat_map(|n| {
            (Just(n), proptest::collection::vec((0..n, 0..n), 0..16))
        })
        .prop_map(|(n, pairs)| {
            let names: Vec<Variable> = (0..n).map(|i| Variable::new(format!("V{i}"))).collect();
            let edges: Vec<(Variable, Variable)> = pairs
                .into_iter()
                .filter(|(a, b)| a < b)
                .map(|(a, b)| (names[a].clone(), names[b].clone()))
                .collect();
            let g = MixedGraph::new(names.clone(), edges, Vec::new()).unwrap();
            (g, names)
        })
    }

    proptest! {
        #[test]
        fn prop_ancestors_idempotent_superset((g, names) in dag_strategy(), pick in 0usize..8) {
            let start: BTreeSet<Variable> = names.iter().take(pick % names.len() + 1).cloned().collect();
            let once = upstream_from(&g, &start);
            prop_assert!(once.is_superset(&start));
            prop_assert_eq!(upstream_from(&g, &once), once);
        }

        #[test]
        fn prop_back_edge_makes_cycle((g, names) in dag_strategy()) {
            // Close a cycle along any existing edge by adding its reverse.
            if let Some((u, v)) = g.directed_edges().next() {
                let mut edges: Vec<(Variable, Variable)> =
                    g.directed_edges().map(|(a, b)| (a.clone(), b.clone())).collect();
                edges.push((v.clone(), u.clone()));
                let err = MixedGraph::new(names, edges, Vec::new()).unwrap_err();
                let is_cyclic = matches!(err, GraphError::Cyclic { .. });
                prop_assert!(is_cyclic);
            }
        }
    }
}
