//! d-separation (m-separation for mixed graphs) via moralization of the
//! ancestral subgraph.

use crate::graph::{GraphError, MixedGraph, Variable};
use petgraph::algo::has_path_connecting;
use petgraph::graphmap::UnGraphMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeSet;
use tracing::trace;

/// A conditional (in)dependence fact between two disjoint vertex sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DSeparationJudgement {
    pub left: BTreeSet<Variable>,
    pub right: BTreeSet<Variable>,
    pub conditions: BTreeSet<Variable>,
    pub separated: bool,
}

impl DSeparationJudgement {
    /// Records that `left` and `right` are separated given `conditions`,
    /// without consulting any graph. Used to write expected fixtures.
    pub fn create<L, R, C>(left: L, right: R, conditions: C) -> Self
    where
        L: IntoIterator,
        L::Item: Into<Variable>,
        R: IntoIterator,
        R::Item: Into<Variable>,
        C: IntoIterator,
        C::Item: Into<Variable>,
    {
        Self {
            left: left.into_iter().map(Into::into).collect(),
            right: right.into_iter().map(Into::into).collect(),
            conditions: conditions.into_iter().map(Into::into).collect(),
            separated: true,
        }
    }

    /// Tests the judgement against `graph`.
    pub fn test(
        graph: &MixedGraph,
        left: BTreeSet<Variable>,
        right: BTreeSet<Variable>,
        conditions: BTreeSet<Variable>,
    ) -> Result<Self, GraphError> {
        let separated = is_d_separated(graph, &left, &right, &conditions)?;
        Ok(Self { left, right, conditions, separated })
    }
}

impl MixedGraph {
    /// See [`is_d_separated`].
    pub fn is_d_separated(
        &self,
        left: &BTreeSet<Variable>,
        right: &BTreeSet<Variable>,
        conditions: &BTreeSet<Variable>,
    ) -> Result<bool, GraphError> {
        is_d_separated(self, left, right, conditions)
    }
}

/// Decides whether `conditions` separates `left` from `right` in `graph`.
///
/// 1. Restrict to the ancestors of `left ∪ right ∪ conditions`.
/// 2. Moralize: within each district `D` of that subgraph, join every pair of
///    vertices in `D ∪ pa(D)`. With no bidirected edges this is exactly
///    "marry co-parents and drop directions"; bidirected edges become plain
///    edges, and colliders along confounded paths are accounted for.
/// 3. Delete the conditioning vertices and look for any remaining path.
///
/// The three sets must be disjoint and drawn from the graph's vertices.
pub fn is_d_separated(
    graph: &MixedGraph,
    left: &BTreeSet<Variable>,
    right: &BTreeSet<Variable>,
    conditions: &BTreeSet<Variable>,
) -> Result<bool, GraphError> {
    validate_sets(graph, [left, right, conditions])?;
    if left.is_empty() || right.is_empty() {
        return Ok(true);
    }

    let ancestral = graph.subgraph(&graph.ancestors_inclusive(left.iter().chain(right).chain(conditions)));
    let moral = moralize(&ancestral, conditions);

    for a in left {
        for b in right {
            if has_path_connecting(&moral, a, b, None) {
                trace!(from = %a, to = %b, "d-connected");
                return Ok(false);
            }
        }
    }
    Ok(true)
}

fn validate_sets(graph: &MixedGraph, sets: [&BTreeSet<Variable>; 3]) -> Result<(), GraphError> {
    let mut seen = BTreeSet::new();
    for set in sets {
        for v in set {
            if !graph.contains(v) {
                return Err(GraphError::UnknownVertex { vertex: v.clone() });
            }
            if !seen.insert(v) {
                return Err(GraphError::Overlap { vertex: v.clone() });
            }
        }
    }
    Ok(())
}

/// Builds the moral graph of `graph` with the `removed` vertices already deleted.
fn moralize<'g>(graph: &'g MixedGraph, removed: &BTreeSet<Variable>) -> UnGraphMap<&'g Variable, ()> {
    let mut moral = UnGraphMap::new();
    for v in graph.vertices() {
        if !removed.contains(v) {
            moral.add_node(v);
        }
    }

    for district in graph.districts() {
        let mut family: SmallVec<[&Variable; 8]> = SmallVec::new();
        let mut parents: BTreeSet<&Variable> = BTreeSet::new();
        for v in &district {
            parents.extend(graph.parents(v));
        }
        for v in district.iter().filter_map(|v| graph.vertices().get(v)).chain(parents) {
            if !removed.contains(v) && !family.contains(&v) {
                family.push(v);
            }
        }
        for (i, &u) in family.iter().enumerate() {
            for &w in &family[i + 1..] {
                moral.add_edge(u, w, ());
            }
        }
    }
    moral
}

/// Enumerates, for every unordered pair of non-adjacent vertices, exactly one
/// judgement: the lexicographically first minimum-size conditioning set that
/// separates them (see [`minimal_separator`]). Other separators of that size
/// or larger are not listed. Pairs that no set separates are omitted. Each
/// pair is searched independently, in parallel.
pub fn find_all(graph: &MixedGraph) -> Vec<DSeparationJudgement> {
    let vertices: Vec<&Variable> = graph.vertices().iter().collect();
    let pairs: Vec<(&Variable, &Variable)> = vertices
        .iter()
        .enumerate()
        .flat_map(|(i, &a)| vertices[i + 1..].iter().map(move |&b| (a, b)))
        .filter(|(a, b)| !graph.is_adjacent(a, b))
        .collect();

    pairs
        .par_iter()
        .filter_map(|&(a, b)| {
            let conditions = minimal_separator(graph, a, b)?;
            trace!(left = %a, right = %b, size = conditions.len(), "found separator");
            Some(DSeparationJudgement {
                left: BTreeSet::from([a.clone()]),
                right: BTreeSet::from([b.clone()]),
                conditions,
                separated: true,
            })
        })
        .collect()
}

/// The lexicographically first minimum-size set separating `a` from `b`.
pub fn minimal_separator(graph: &MixedGraph, a: &Variable, b: &Variable) -> Option<BTreeSet<Variable>> {
    let left = BTreeSet::from([a.clone()]);
    let right = BTreeSet::from([b.clone()]);
    let candidates: Vec<&Variable> = graph.vertices().iter().filter(|v| *v != a && *v != b).collect();

    for size in 0..=candidates.len() {
        for picked in Combinations::new(candidates.len(), size) {
            let conditions: BTreeSet<Variable> = picked.iter().map(|&i| candidates[i].clone()).collect();
            if let Ok(true) = is_d_separated(graph, &left, &right, &conditions) {
                return Some(conditions);
            }
        }
    }
    None
}

/// Index combinations of `k` out of `n`, in lexicographic order.
struct Combinations {
    n: usize,
    indices: Vec<usize>,
    started: bool,
}

impl Combinations {
    fn new(n: usize, k: usize) -> Self {
        Self { n, indices: (0..k).collect(), started: false }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let k = self.indices.len();
        if k > self.n {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(self.indices.clone());
        }
        // Rightmost index that can still move right.
        let i = (0..k).rev().find(|&i| self.indices[i] < self.n - k + i)?;
        self.indices[i] += 1;
        for j in i + 1..k {
            self.indices[j] = self.indices[j - 1] + 1;
        }
        Some(self.indices.clone())
    }
}
