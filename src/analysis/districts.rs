//! District (C-component) partitioning over the bidirected edges.

use crate::graph::{MixedGraph, Variable};
use petgraph::unionfind::UnionFind;
use std::collections::{BTreeMap, BTreeSet};

/// Splits the vertex set into districts: the connected components of the
/// graph restricted to its bidirected edges. Every vertex lands in exactly one
/// district. The result is sorted, so it is stable across calls.
pub fn partition(graph: &MixedGraph) -> Vec<BTreeSet<Variable>> {
    let index: BTreeMap<&Variable, usize> = graph.vertices().iter().enumerate().map(|(i, v)| (v, i)).collect();
    let mut components = UnionFind::<usize>::new(index.len());

    for (u, v) in graph.undirected_edges() {
        if let (Some(&a), Some(&b)) = (index.get(u), index.get(v)) {
            components.union(a, b);
        }
    }

    let mut by_root: BTreeMap<usize, BTreeSet<Variable>> = BTreeMap::new();
    for (vertex, &i) in &index {
        by_root.entry(components.find_mut(i)).or_default().insert((*vertex).clone());
    }

    let mut districts: Vec<BTreeSet<Variable>> = by_root.into_values().collect();
    districts.sort();
    districts
}
