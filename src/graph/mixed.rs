//! mixed.rs
//! The acyclic directed mixed graph (ADMG) and its derived, immutable views.

use super::error::GraphError;
use super::Variable;
use crate::analysis::{districts, topology};
use std::collections::{BTreeMap, BTreeSet};

static EMPTY: BTreeSet<Variable> = BTreeSet::new();

/// An acyclic directed mixed graph.
///
/// Directed edges encode direct causal influence; bidirected edges encode a
/// latent confounder shared by their endpoints. A pair of vertices may carry
/// both kinds of edge at once.
///
/// A `MixedGraph` is never mutated after construction. Every transformation
/// (`subgraph`, `remove_vertices`, the edge-cut views) returns a fresh graph,
/// so recursive branches holding graphs derived from a common ancestor can
/// never observe each other's pruning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct MixedGraph {
    vertices: BTreeSet<Variable>,
    // Adjacency is kept for every vertex, including isolated ones.
    parents: BTreeMap<Variable, BTreeSet<Variable>>,
    children: BTreeMap<Variable, BTreeSet<Variable>>,
    partners: BTreeMap<Variable, BTreeSet<Variable>>,
}

impl MixedGraph {
    /// Builds a graph, validating endpoints, self-loops and acyclicity.
    ///
    /// Acyclicity is checked once here and never again: every derived graph
    /// only ever drops vertices or edges.
    pub fn new<V, D, U>(vertices: V, directed: D, undirected: U) -> Result<Self, GraphError>
    where
        V: IntoIterator<Item = Variable>,
        D: IntoIterator<Item = (Variable, Variable)>,
        U: IntoIterator<Item = (Variable, Variable)>,
    {
        let vertices: BTreeSet<Variable> = vertices.into_iter().collect();
        let mut graph = Self::with_vertices(vertices);

        for (u, v) in directed {
            graph.check_edge(&u, &v)?;
            graph.insert_directed(u, v);
        }
        for (u, v) in undirected {
            graph.check_edge(&u, &v)?;
            graph.insert_undirected(u, v);
        }

        topology::sort(&graph)?;
        Ok(graph)
    }

    /// Builds a graph from edge lists. The vertex set is the set of endpoints.
    pub fn from_edges<A, B, D, U>(directed: D, undirected: U) -> Result<Self, GraphError>
    where
        A: Into<Variable>,
        B: Into<Variable>,
        D: IntoIterator<Item = (A, A)>,
        U: IntoIterator<Item = (B, B)>,
    {
        let directed: Vec<(Variable, Variable)> =
            directed.into_iter().map(|(u, v)| (u.into(), v.into())).collect();
        let undirected: Vec<(Variable, Variable)> =
            undirected.into_iter().map(|(u, v)| (u.into(), v.into())).collect();
        let vertices: Vec<Variable> = directed
            .iter()
            .chain(undirected.iter())
            .flat_map(|(u, v)| [u.clone(), v.clone()])
            .collect();
        Self::new(vertices, directed, undirected)
    }

    /// Builds a graph from adjacency mappings: each key maps to its directed
    /// successors (resp. bidirected partners). Keys with empty lists still
    /// become vertices.
    pub fn from_adjacency<K, V>(
        directed: &BTreeMap<K, Vec<V>>,
        undirected: &BTreeMap<K, Vec<V>>,
    ) -> Result<Self, GraphError>
    where
        K: Clone + Into<Variable>,
        V: Clone + Into<Variable>,
    {
        let flatten = |adj: &BTreeMap<K, Vec<V>>| -> Vec<(Variable, Variable)> {
            adj.iter()
                .flat_map(|(u, vs)| {
                    let u: Variable = u.clone().into();
                    vs.iter().map(move |v| (u.clone(), v.clone().into()))
                })
                .collect()
        };
        let directed_edges = flatten(directed);
        let undirected_edges = flatten(undirected);

        let vertices: Vec<Variable> = directed
            .keys()
            .chain(undirected.keys())
            .map(|k| k.clone().into())
            .chain(directed_edges.iter().map(|(_, v)| v.clone()))
            .chain(undirected_edges.iter().map(|(_, v)| v.clone()))
            .collect();
        Self::new(vertices, directed_edges, undirected_edges)
    }

    fn with_vertices(vertices: BTreeSet<Variable>) -> Self {
        let empty = || vertices.iter().map(|v| (v.clone(), BTreeSet::new())).collect();
        Self {
            parents: empty(),
            children: empty(),
            partners: empty(),
            vertices,
        }
    }

    fn check_edge(&self, u: &Variable, v: &Variable) -> Result<(), GraphError> {
        for endpoint in [u, v] {
            if !self.vertices.contains(endpoint) {
                return Err(GraphError::UnknownVertex { vertex: endpoint.clone() });
            }
        }
        if u == v {
            return Err(GraphError::SelfLoop { vertex: u.clone() });
        }
        Ok(())
    }

    fn insert_directed(&mut self, u: Variable, v: Variable) {
        if let Some(set) = self.children.get_mut(&u) {
            set.insert(v.clone());
        }
        if let Some(set) = self.parents.get_mut(&v) {
            set.insert(u);
        }
    }

    fn insert_undirected(&mut self, u: Variable, v: Variable) {
        if let Some(set) = self.partners.get_mut(&u) {
            set.insert(v.clone());
        }
        if let Some(set) = self.partners.get_mut(&v) {
            set.insert(u);
        }
    }

    /// Rebuilds a graph over `keep`, retaining only edges accepted by the filters.
    /// Both endpoints of a retained edge always lie in `keep`.
    fn derive(
        &self,
        keep: impl Fn(&Variable) -> bool,
        keep_directed: impl Fn(&Variable, &Variable) -> bool,
        keep_undirected: impl Fn(&Variable, &Variable) -> bool,
    ) -> Self {
        let vertices: BTreeSet<Variable> = self.vertices.iter().filter(|v| keep(v)).cloned().collect();
        let mut graph = Self::with_vertices(vertices);
        for (u, v) in self.directed_edges() {
            if keep(u) && keep(v) && keep_directed(u, v) {
                graph.insert_directed(u.clone(), v.clone());
            }
        }
        for (u, v) in self.undirected_edges() {
            if keep(u) && keep(v) && keep_undirected(u, v) {
                graph.insert_undirected(u.clone(), v.clone());
            }
        }
        graph
    }

    // --- Accessors ---

    pub fn vertices(&self) -> &BTreeSet<Variable> { &self.vertices }
    pub fn vertex_count(&self) -> usize { self.vertices.len() }
    pub fn contains(&self, v: &Variable) -> bool { self.vertices.contains(v) }

    pub fn parents(&self, v: &Variable) -> &BTreeSet<Variable> {
        self.parents.get(v).unwrap_or(&EMPTY)
    }

    pub fn children(&self, v: &Variable) -> &BTreeSet<Variable> {
        self.children.get(v).unwrap_or(&EMPTY)
    }

    /// Vertices sharing a bidirected edge with `v`.
    pub fn partners(&self, v: &Variable) -> &BTreeSet<Variable> {
        self.partners.get(v).unwrap_or(&EMPTY)
    }

    /// Directed edges as `(tail, head)` pairs, in lexicographic order.
    pub fn directed_edges(&self) -> impl Iterator<Item = (&Variable, &Variable)> + '_ {
        self.children.iter().flat_map(|(u, vs)| vs.iter().map(move |v| (u, v)))
    }

    /// Bidirected edges, each reported once with its smaller endpoint first.
    pub fn undirected_edges(&self) -> impl Iterator<Item = (&Variable, &Variable)> + '_ {
        self.partners
            .iter()
            .flat_map(|(u, vs)| vs.iter().filter(move |v| u < *v).map(move |v| (u, v)))
    }

    pub fn has_directed_edge(&self, u: &Variable, v: &Variable) -> bool {
        self.children(u).contains(v)
    }

    pub fn has_undirected_edge(&self, u: &Variable, v: &Variable) -> bool {
        self.partners(u).contains(v)
    }

    /// Whether `u` and `v` share any edge, of either kind or direction.
    pub fn is_adjacent(&self, u: &Variable, v: &Variable) -> bool {
        self.has_directed_edge(u, v) || self.has_directed_edge(v, u) || self.has_undirected_edge(u, v)
    }

    // --- Graph Algorithms ---

    /// The smallest superset of `set` closed under taking directed parents.
    pub fn ancestors_inclusive<'a>(&self, set: impl IntoIterator<Item = &'a Variable>) -> BTreeSet<Variable> {
        topology::upstream_from(self, set)
    }

    /// The smallest superset of `set` closed under taking directed children.
    pub fn descendants_inclusive<'a>(&self, set: impl IntoIterator<Item = &'a Variable>) -> BTreeSet<Variable> {
        topology::downstream_from(self, set)
    }

    /// A deterministic topological order of the directed part of the graph.
    pub fn topological_order(&self) -> Vec<Variable> {
        // Construction rejected every cycle, and derived graphs only lose edges.
        topology::sort(self).unwrap_or_default()
    }

    /// The districts (C-components), sorted. They partition the vertex set.
    pub fn districts(&self) -> Vec<BTreeSet<Variable>> {
        districts::partition(self)
    }

    /// The district containing `v`, or `None` if `v` is not a vertex.
    pub fn district(&self, v: &Variable) -> Option<BTreeSet<Variable>> {
        if !self.contains(v) {
            return None;
        }
        self.districts().into_iter().find(|d| d.contains(v))
    }

    // --- Derived graphs ---

    /// The subgraph induced on `keep`. Unknown vertices in `keep` are ignored.
    pub fn subgraph(&self, keep: &BTreeSet<Variable>) -> Self {
        self.derive(|v| keep.contains(v), |_, _| true, |_, _| true)
    }

    /// The subgraph induced on every vertex outside `drop`.
    pub fn remove_vertices(&self, drop: &BTreeSet<Variable>) -> Self {
        self.derive(|v| !drop.contains(v), |_, _| true, |_, _| true)
    }

    /// Cuts every edge pointing into `set`: directed edges with a head in the
    /// set and every bidirected edge touching it.
    pub fn without_incoming(&self, set: &BTreeSet<Variable>) -> Self {
        self.derive(
            |_| true,
            |_, v| !set.contains(v),
            |u, v| !set.contains(u) && !set.contains(v),
        )
    }

    /// Cuts every directed edge leaving `set`. Bidirected edges are kept.
    pub fn without_outgoing(&self, set: &BTreeSet<Variable>) -> Self {
        self.derive(|_| true, |u, _| !set.contains(u), |_, _| true)
    }
}
