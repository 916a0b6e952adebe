//! Human-readable rendering of estimands, e.g. `Σ_{Z} P(Y | X, Z) P(Z)`.

use super::expression::{Distribution, Expression};
use crate::graph::Variable;
use std::collections::BTreeSet;
use std::fmt::{self, Display, Write};

fn join(set: &BTreeSet<Variable>) -> String {
    let mut out = String::new();
    for (i, v) in set.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{}", v);
    }
    out
}

impl Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P({}", join(&self.children))?;
        if !self.is_joint() {
            f.write_str(" | ")?;
        }
        if !self.interventions.is_empty() {
            write!(f, "do({})", join(&self.interventions))?;
            if !self.parents.is_empty() {
                f.write_str(", ")?;
            }
        }
        write!(f, "{})", join(&self.parents))
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Probability(d) => write!(f, "{}", d),
            Expression::QFactor { codomain, domain } => {
                write!(f, "Q[{}]({})", join(codomain), join(domain))
            }
            Expression::Sum { ranges, expression } => {
                write!(f, "Σ_{{{}}} ", join(ranges))?;
                write_operand(f, expression, matches!(**expression, Expression::Fraction { .. }))
            }
            Expression::Product { factors } if factors.is_empty() => f.write_str("1"),
            Expression::Product { factors } => {
                for (i, factor) in factors.iter().enumerate() {
                    if i > 0 {
                        f.write_char(' ')?;
                    }
                    let bracket = matches!(factor, Expression::Sum { .. } | Expression::Fraction { .. });
                    write_operand(f, factor, bracket)?;
                }
                Ok(())
            }
            Expression::Fraction { numerator, denominator } => {
                let compound = |e: &Expression| !matches!(e, Expression::Probability(_) | Expression::QFactor { .. });
                write_operand(f, numerator, compound(numerator))?;
                f.write_str(" / ")?;
                write_operand(f, denominator, compound(denominator))
            }
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, e: &Expression, bracket: bool) -> fmt::Result {
    if bracket {
        write!(f, "[{}]", e)
    } else {
        write!(f, "{}", e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::variables;
    use rstest::rstest;

    #[rstest]
    #[case(Distribution::of(["Y", "X"]), "P(X, Y)")]
    #[case(Distribution::of(["Y"]).given(["Z", "X"]), "P(Y | X, Z)")]
    #[case(Distribution::of(["Y"]).intervene(["X"]), "P(Y | do(X))")]
    #[case(Distribution::of(["Y"]).intervene(["X"]).given(["Z"]), "P(Y | do(X), Z)")]
    fn test_distribution_display(#[case] d: Distribution, #[case] expected: &str) {
        assert_eq!(d.to_string(), expected);
    }

    #[test]
    fn test_backdoor_rendering() {
        let e = (Expression::from(Distribution::of(["Y"]).given(["X", "Z"])) * Expression::joint(["Z"]))
            .marginalize(&variables(["Z"]));
        assert_eq!(e.to_string(), "Σ_{Z} P(Y | X, Z) P(Z)");
    }

    #[test]
    fn test_nested_operands_are_bracketed() {
        let inner = (Expression::joint(["X"]) * Expression::from(Distribution::of(["Y"]).given(["X", "Z"])))
            .marginalize(&variables(["X"]));
        let e = inner * Expression::from(Distribution::of(["Z"]).given(["X"]));
        assert_eq!(e.to_string(), "[Σ_{X} P(X) P(Y | X, Z)] P(Z | X)");

        let ratio = Expression::q_factor(["X", "Y"], ["Z1", "X", "Y"])
            / Expression::q_factor(["X", "Y"], ["Z1", "X", "Y"]).marginalize(&variables(["Y"]));
        assert_eq!(ratio.to_string(), "Q[X, Y](X, Y, Z1) / [Σ_{Y} Q[X, Y](X, Y, Z1)]");
    }

    #[test]
    fn test_empty_product_is_one() {
        assert_eq!(Expression::Product { factors: vec![] }.to_string(), "1");
    }
}
