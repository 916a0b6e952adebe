//! storage.rs
//! Adjacency-mapping layout used to (de)serialize a `MixedGraph`.

use super::{GraphError, MixedGraph, Variable};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The serialized form of a graph: every vertex maps to its directed
/// successors and to its bidirected partners.
///
/// Every vertex appears as a key of `directed`, so isolated vertices survive a
/// round trip. Bidirected edges are listed once, under their smaller endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacencySpec {
    #[serde(default)]
    pub directed: BTreeMap<Variable, Vec<Variable>>,
    #[serde(default)]
    pub undirected: BTreeMap<Variable, Vec<Variable>>,
}

impl From<MixedGraph> for AdjacencySpec {
    fn from(graph: MixedGraph) -> Self {
        let mut spec = AdjacencySpec::default();
        for v in graph.vertices() {
            spec.directed.insert(v.clone(), graph.children(v).iter().cloned().collect());
        }
        for (u, v) in graph.undirected_edges() {
            spec.undirected.entry(u.clone()).or_default().push(v.clone());
        }
        spec
    }
}

impl TryFrom<AdjacencySpec> for MixedGraph {
    type Error = GraphError;

    fn try_from(spec: AdjacencySpec) -> Result<Self, Self::Error> {
        MixedGraph::from_adjacency(&spec.directed, &spec.undirected)
    }
}

impl Serialize for MixedGraph {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        AdjacencySpec::from(self.clone()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MixedGraph {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let spec = AdjacencySpec::deserialize(deserializer)?;
        MixedGraph::try_from(spec).map_err(serde::de::Error::custom)
    }
}

impl MixedGraph {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parses a graph from its adjacency JSON, running the usual validation.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Vertices with no incident edge of either kind.
    pub fn isolated_vertices(&self) -> BTreeSet<Variable> {
        self.vertices()
            .iter()
            .filter(|v| self.parents(v).is_empty() && self.children(v).is_empty() && self.partners(v).is_empty())
            .cloned()
            .collect()
    }
}
