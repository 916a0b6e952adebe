//! Defines the `Variable`, the atom every graph vertex and estimand term is built from.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// An observed (or, at the Verma boundary, latent) random variable.
///
/// Variables are identified purely by name: equality, ordering and hashing all
/// delegate to the name, so two independently constructed `Variable("X")`
/// values are interchangeable. The name is reference counted, which keeps the
/// many clones made while deriving subgraphs cheap.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variable(Arc<str>);

impl Variable {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Variable {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Variable {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl From<&Variable> for Variable {
    fn from(v: &Variable) -> Self {
        v.clone()
    }
}

impl Borrow<str> for Variable {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Collects anything name-like into an ordered variable set.
pub fn variables<I, V>(names: I) -> std::collections::BTreeSet<Variable>
where
    I: IntoIterator<Item = V>,
    V: Into<Variable>,
{
    names.into_iter().map(Into::into).collect()
}
