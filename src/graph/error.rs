//! Defines the error types for graph construction and graph queries.
use super::Variable;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The directed edges close a cycle through `vertex`. Fatal at construction.
    #[error("directed edges form a cycle through '{vertex}'")]
    Cyclic { vertex: Variable },
    #[error("self-loop on '{vertex}'")]
    SelfLoop { vertex: Variable },
    #[error("vertex '{vertex}' is not in the graph")]
    UnknownVertex { vertex: Variable },
    /// The same vertex appears in two sets that must be disjoint.
    #[error("vertex '{vertex}' appears in more than one argument set")]
    Overlap { vertex: Variable },
}
