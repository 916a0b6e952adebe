use crate::config::IdentifyConfig;
use crate::graph::{MixedGraph, Variable};
use crate::identify::{Identification, IdentificationError, Identifier};
use pyo3::create_exception;
use pyo3::exceptions::{PyException, PyValueError};
use pyo3::prelude::*;
use std::collections::BTreeSet;

create_exception!(_core, Unidentifiable, PyException, "The causal query is not identifiable (a hedge exists).");

fn to_set(names: Vec<String>) -> BTreeSet<Variable> {
    names.into_iter().map(Variable::from).collect()
}

fn to_names<'a>(set: impl IntoIterator<Item = &'a Variable>) -> Vec<String> {
    set.into_iter().map(Variable::to_string).collect()
}

fn to_py_err(e: IdentificationError) -> PyErr {
    match e {
        IdentificationError::Hedge(hedge) => Unidentifiable::new_err(hedge.to_string()),
        other => PyValueError::new_err(other.to_string()),
    }
}

#[pyclass(name = "_MixedGraph")]
#[derive(Debug, Clone, Default)]
pub struct PyMixedGraph {
    inner: MixedGraph,
}

#[pymethods]
impl PyMixedGraph {
    #[new]
    #[pyo3(signature = (directed, undirected = Vec::new()))]
    pub fn new(directed: Vec<(String, String)>, undirected: Vec<(String, String)>) -> PyResult<Self> {
        MixedGraph::from_edges(directed, undirected)
            .map(|inner| Self { inner })
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    #[staticmethod]
    pub fn from_json(json: &str) -> PyResult<Self> {
        MixedGraph::from_json(json)
            .map(|inner| Self { inner })
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    pub fn to_json(&self) -> PyResult<String> {
        self.inner.to_json().map_err(|e| PyValueError::new_err(e.to_string()))
    }

    pub fn vertices(&self) -> Vec<String> {
        to_names(self.inner.vertices())
    }

    pub fn directed_edges(&self) -> Vec<(String, String)> {
        self.inner.directed_edges().map(|(u, v)| (u.to_string(), v.to_string())).collect()
    }

    pub fn undirected_edges(&self) -> Vec<(String, String)> {
        self.inner.undirected_edges().map(|(u, v)| (u.to_string(), v.to_string())).collect()
    }

    pub fn ancestors(&self, names: Vec<String>) -> Vec<String> {
        to_names(&self.inner.ancestors_inclusive(&to_set(names)))
    }

    pub fn districts(&self) -> Vec<Vec<String>> {
        self.inner.districts().iter().map(|d| to_names(d)).collect()
    }

    #[pyo3(signature = (left, right, conditions = Vec::new()))]
    pub fn is_d_separated(&self, left: Vec<String>, right: Vec<String>, conditions: Vec<String>) -> PyResult<bool> {
        self.inner
            .is_d_separated(&to_set(left), &to_set(right), &to_set(conditions))
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    /// Returns the estimand rendered as text; raises `Unidentifiable` on a hedge.
    #[pyo3(signature = (outcomes, treatments, conditions = Vec::new(), parallel = false))]
    pub fn identify(
        &self,
        outcomes: Vec<String>,
        treatments: Vec<String>,
        conditions: Vec<String>,
        parallel: bool,
    ) -> PyResult<String> {
        let id = Identification::from_parts(to_set(outcomes), to_set(treatments), to_set(conditions), self.inner.clone())
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        let identifier = Identifier::new(IdentifyConfig { parallel, ..IdentifyConfig::default() });
        identifier.identify(id).map(|estimand| estimand.to_string()).map_err(to_py_err)
    }

    fn __repr__(&self) -> String {
        format!(
            "_MixedGraph(vertices={}, directed={}, undirected={})",
            self.inner.vertex_count(),
            self.inner.directed_edges().count(),
            self.inner.undirected_edges().count()
        )
    }
}

pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyMixedGraph>()?;
    m.add("Unidentifiable", m.py().get_type::<Unidentifiable>())?;
    Ok(())
}
