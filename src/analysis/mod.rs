//! Graph-theoretic analyses over a `MixedGraph`: ordering, ancestry,
//! districts and d-separation.
pub mod districts;
pub mod dseparation;
pub mod topology;

pub use dseparation::{find_all, is_d_separated, minimal_separator, DSeparationJudgement};
