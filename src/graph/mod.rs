//! Defines the core data structures for the causal graph.
pub mod error;
pub mod mixed;
pub mod storage;
pub mod variable;

// Re-export key types for convenient access
pub use error::GraphError;
pub use mixed::MixedGraph;
pub use storage::AdjacencySpec;
pub use variable::{variables, Variable};
