//! Causal effect identification over acyclic directed mixed graphs (ADMGs).
//!
//! Build a [`MixedGraph`], then ask [`identify`] for an estimand of
//! `P(Y | do(X), Z)` or a [`Hedge`] proving there is none.

pub mod analysis;
pub mod config;
pub mod dsl;
pub mod graph;
pub mod identify;
pub mod verma;

#[cfg(feature = "python")]
mod bindings;

pub use analysis::{find_all, is_d_separated, DSeparationJudgement};
pub use config::IdentifyConfig;
pub use dsl::{Distribution, Expression};
pub use graph::{GraphError, MixedGraph, Variable};
pub use identify::{identify, Hedge, Identification, IdentificationError, Identifier, InvalidQueryError};
pub use verma::{verma_constraints, LatentDag, OracleError, VermaConstraint, VermaOracle};

#[cfg(feature = "python")]
use pyo3::prelude::*;

// --- Module Definition ---
/// Defines the `_core` Python module.
#[cfg(feature = "python")]
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    bindings::python::register(m)
}
