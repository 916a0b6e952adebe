//! The latent-augmented DAG handed to the Verma oracle, and the latent
//! projection that turns one back into a `MixedGraph`.

use super::error::OracleError;
use crate::graph::{GraphError, MixedGraph, Variable};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A DAG whose vertices each carry an "is latent" tag.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LatentDag {
    vertices: BTreeMap<Variable, bool>,
    edges: BTreeSet<(Variable, Variable)>,
}

impl LatentDag {
    /// Replaces every bidirected edge `u <-> v` of `graph` with a fresh latent
    /// `U_u_v` and the edges `U_u_v -> u`, `U_u_v -> v`. All original vertices
    /// are observed.
    pub fn from_admg(graph: &MixedGraph) -> Self {
        Self::build(graph, |_| false)
    }

    /// Like [`LatentDag::from_admg`], additionally marking the vertices tagged
    /// `true` in `tags` as latent. Untagged vertices are observed.
    pub fn from_tagged(graph: &MixedGraph, tags: &BTreeMap<Variable, bool>) -> Result<Self, OracleError> {
        if let Some(vertex) = tags.keys().find(|v| !graph.contains(v)) {
            return Err(OracleError::UnknownVertex { vertex: vertex.clone() });
        }
        Ok(Self::build(graph, |v| tags.get(v).copied().unwrap_or(false)))
    }

    fn build(graph: &MixedGraph, latent: impl Fn(&Variable) -> bool) -> Self {
        let mut dag = Self {
            vertices: graph.vertices().iter().map(|v| (v.clone(), latent(v))).collect(),
            edges: graph.directed_edges().map(|(u, v)| (u.clone(), v.clone())).collect(),
        };
        for (u, v) in graph.undirected_edges() {
            let confounder = dag.fresh_name(&format!("U_{}_{}", u, v));
            dag.vertices.insert(confounder.clone(), true);
            dag.edges.insert((confounder.clone(), u.clone()));
            dag.edges.insert((confounder, v.clone()));
        }
        dag
    }

    fn fresh_name(&self, base: &str) -> Variable {
        let mut candidate = Variable::new(base);
        let mut counter = 1;
        while self.vertices.contains_key(&candidate) {
            candidate = Variable::new(format!("{}_{}", base, counter));
            counter += 1;
        }
        candidate
    }

    pub fn vertices(&self) -> &BTreeMap<Variable, bool> { &self.vertices }
    pub fn edges(&self) -> &BTreeSet<(Variable, Variable)> { &self.edges }

    /// `None` if `v` is not a vertex.
    pub fn is_latent(&self, v: &Variable) -> Option<bool> {
        self.vertices.get(v).copied()
    }

    pub fn latents(&self) -> BTreeSet<Variable> {
        self.vertices.iter().filter(|(_, &l)| l).map(|(v, _)| v.clone()).collect()
    }

    pub fn observed(&self) -> BTreeSet<Variable> {
        self.vertices.iter().filter(|(_, &l)| !l).map(|(v, _)| v.clone()).collect()
    }

    /// Projects the latent vertices out.
    ///
    /// Observed `a -> b` whenever a directed path from `a` to `b` passes only
    /// through latents; `a <-> b` whenever some latent reaches both along
    /// latent-only paths.
    pub fn to_admg(&self) -> Result<MixedGraph, GraphError> {
        let mut children: BTreeMap<&Variable, Vec<&Variable>> = BTreeMap::new();
        for (u, v) in &self.edges {
            children.entry(u).or_default().push(v);
        }

        let mut directed = BTreeSet::new();
        let mut undirected = BTreeSet::new();
        for (v, &latent) in &self.vertices {
            let reached = self.observed_through_latents(v, &children);
            if latent {
                for (i, a) in reached.iter().enumerate() {
                    for b in reached.iter().skip(i + 1) {
                        undirected.insert(((*a).clone(), (*b).clone()));
                    }
                }
            } else {
                directed.extend(reached.into_iter().map(|b| (v.clone(), b.clone())));
            }
        }
        MixedGraph::new(self.observed(), directed, undirected)
    }

    /// Observed vertices reachable from `start` by a directed path whose
    /// interior is latent.
    fn observed_through_latents<'a>(
        &'a self,
        start: &'a Variable,
        children: &BTreeMap<&'a Variable, Vec<&'a Variable>>,
    ) -> BTreeSet<&'a Variable> {
        let mut reached = BTreeSet::new();
        let mut seen = BTreeSet::from([start]);
        let mut stack = vec![start];
        while let Some(u) = stack.pop() {
            for &child in children.get(u).map(Vec::as_slice).unwrap_or_default() {
                if !seen.insert(child) {
                    continue;
                }
                if self.is_latent(child).unwrap_or(false) {
                    stack.push(child);
                } else {
                    reached.insert(child);
                }
            }
        }
        reached
    }
}
