//! The probability-expression carrier used for queries and estimands.
mod display;
pub mod expression;

pub use expression::{Distribution, Expression};
