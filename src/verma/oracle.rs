//! The injected capability that computes Verma constraints, and the boundary
//! call that prepares its input and checks its output.

use super::constraint::VermaConstraint;
use super::error::OracleError;
use super::latent::LatentDag;
use crate::graph::{MixedGraph, Variable};
use std::collections::BTreeMap;
use tracing::debug;

/// Something that can compute the Verma constraints of a latent DAG.
///
/// Implementations wrap whatever external tool does the algebra. They must
/// report `OracleError::Unavailable` rather than return an empty list when
/// that tool cannot be reached.
///
/// Returned constraints must be written in the names of `dag`: observed
/// vertices keep their graph names and confounders are the `U_a_b` latents
/// the DAG minted. A tool that invents its own latent names has to map them
/// back, typically with [`VermaConstraint::rename`]; anything else is
/// rejected with `OracleError::UnknownVariable`.
pub trait VermaOracle {
    fn compute_verma_constraints(&self, dag: &LatentDag) -> Result<Vec<VermaConstraint>, OracleError>;
}

impl<O: VermaOracle + ?Sized> VermaOracle for &O {
    fn compute_verma_constraints(&self, dag: &LatentDag) -> Result<Vec<VermaConstraint>, OracleError> {
        (**self).compute_verma_constraints(dag)
    }
}

/// Computes the Verma constraints of `graph` through `oracle`.
///
/// `latent_tags` marks additional graph vertices as latent. Every name in a
/// returned constraint must be a vertex of the DAG the oracle was given, and
/// the constraint may not be indexed by a latent one.
pub fn verma_constraints<O: VermaOracle + ?Sized>(
    oracle: &O,
    graph: &MixedGraph,
    latent_tags: &BTreeMap<Variable, bool>,
) -> Result<Vec<VermaConstraint>, OracleError> {
    let dag = LatentDag::from_tagged(graph, latent_tags)?;
    debug!(vertices = dag.vertices().len(), latents = dag.latents().len(), "calling Verma oracle");
    let constraints = oracle.compute_verma_constraints(&dag)?;
    for constraint in &constraints {
        check_vocabulary(&dag, constraint)?;
    }
    Ok(constraints)
}

fn check_vocabulary(dag: &LatentDag, constraint: &VermaConstraint) -> Result<(), OracleError> {
    for variable in constraint.mentioned() {
        if dag.is_latent(&variable).is_none() {
            return Err(OracleError::UnknownVariable { variable });
        }
    }
    if let Some(variable) = constraint.variables.iter().find(|v| dag.is_latent(v) == Some(true)) {
        return Err(OracleError::LatentConditioning { variable: variable.clone() });
    }
    Ok(())
}
