//! Defines the error types for the Verma-constraint boundary.
use crate::graph::{GraphError, Variable};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// The external computation could not be reached or installed. The caller
    /// decides whether to retry; it never means "no constraints".
    #[error("Verma oracle unavailable: {0}")]
    Unavailable(String),
    /// A latent tag names a vertex the graph does not have.
    #[error("tagged vertex '{vertex}' is not in the graph")]
    UnknownVertex { vertex: Variable },
    /// A returned constraint mentions a name outside the oracle's input.
    #[error("constraint mentions unknown variable '{variable}'")]
    UnknownVariable { variable: Variable },
    /// A returned constraint is conditioned on a latent vertex.
    #[error("constraint is conditioned on latent variable '{variable}'")]
    LatentConditioning { variable: Variable },
    #[error("latent projection failed: {0}")]
    Projection(#[from] GraphError),
}
