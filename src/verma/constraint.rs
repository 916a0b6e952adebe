use crate::dsl::Expression;
use crate::graph::Variable;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Two functionals of the observational distribution that must be equal,
/// for every value of `variables`, in any model compatible with the graph.
///
/// Each side is given both as a C-factor and as the expression that computes
/// it. The record is opaque to this crate: nothing here evaluates it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VermaConstraint {
    pub lhs_cfactor: Expression,
    pub lhs_expr: Expression,
    pub rhs_cfactor: Expression,
    pub rhs_expr: Expression,
    pub variables: BTreeSet<Variable>,
}

impl VermaConstraint {
    /// Every name the constraint mentions, bound or free.
    pub fn mentioned(&self) -> BTreeSet<Variable> {
        let mut out = self.variables.clone();
        for e in [&self.lhs_cfactor, &self.lhs_expr, &self.rhs_cfactor, &self.rhs_expr] {
            out.extend(e.variables());
        }
        out
    }

    /// Renames variables through `names`; unmapped variables are kept. Oracle
    /// adapters use this to put a tool's own latent names back onto the
    /// `LatentDag`'s confounders.
    pub fn rename(&self, names: &BTreeMap<Variable, Variable>) -> Self {
        Self {
            lhs_cfactor: self.lhs_cfactor.rename(names),
            lhs_expr: self.lhs_expr.rename(names),
            rhs_cfactor: self.rhs_cfactor.rename(names),
            rhs_expr: self.rhs_expr.rename(names),
            variables: self.variables.iter().map(|v| names.get(v).unwrap_or(v).clone()).collect(),
        }
    }
}
