//! The boundary to the external Verma-constraint computation.
pub mod constraint;
pub mod error;
pub mod latent;
pub mod oracle;

pub use constraint::VermaConstraint;
pub use error::OracleError;
pub use latent::LatentDag;
pub use oracle::{verma_constraints, VermaOracle};
