//! Defines the `Distribution` and `Expression` types, the inert algebra that
//! carries queries and estimands.
//!
//! Nothing here evaluates probabilities. The only rewrites performed are the
//! structural ones needed to keep estimands readable: empty sums vanish,
//! nested sums merge, products flatten, and summing variables out of a plain
//! joint distribution yields the marginal joint.

use crate::graph::Variable;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::{Div, Mul};

/// A (possibly conditional, possibly post-intervention) distribution term:
/// `P(children | do(interventions), parents)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Distribution {
    pub children: BTreeSet<Variable>,
    #[serde(default)]
    pub parents: BTreeSet<Variable>,
    #[serde(default)]
    pub interventions: BTreeSet<Variable>,
}

impl Distribution {
    /// The joint distribution over `children`.
    pub fn of<I>(children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Variable>,
    {
        Self {
            children: children.into_iter().map(Into::into).collect(),
            parents: BTreeSet::new(),
            interventions: BTreeSet::new(),
        }
    }

    /// Adds conditioning variables.
    pub fn given<I>(mut self, parents: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Variable>,
    {
        self.parents.extend(parents.into_iter().map(Into::into));
        self
    }

    /// Adds intervened-on variables.
    pub fn intervene<I>(mut self, treatments: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Variable>,
    {
        self.interventions.extend(treatments.into_iter().map(Into::into));
        self
    }

    /// A plain joint: no conditioning and no intervention.
    pub fn is_joint(&self) -> bool {
        self.parents.is_empty() && self.interventions.is_empty()
    }

    pub fn variables(&self) -> BTreeSet<Variable> {
        self.children
            .iter()
            .chain(&self.parents)
            .chain(&self.interventions)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expression {
    Probability(Distribution),
    /// A C-factor `Q[codomain](domain)`: the distribution of `codomain` with
    /// every other variable of `domain` intervened on.
    QFactor {
        codomain: BTreeSet<Variable>,
        domain: BTreeSet<Variable>,
    },
    Sum {
        ranges: BTreeSet<Variable>,
        expression: Box<Expression>,
    },
    /// An empty product is the constant one.
    Product { factors: Vec<Expression> },
    Fraction {
        numerator: Box<Expression>,
        denominator: Box<Expression>,
    },
}

impl From<Distribution> for Expression {
    fn from(distribution: Distribution) -> Self {
        Expression::Probability(distribution)
    }
}

impl Expression {
    pub fn joint<I>(children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Variable>,
    {
        Distribution::of(children).into()
    }

    pub fn q_factor<C, D>(codomain: C, domain: D) -> Self
    where
        C: IntoIterator,
        C::Item: Into<Variable>,
        D: IntoIterator,
        D::Item: Into<Variable>,
    {
        Expression::QFactor {
            codomain: codomain.into_iter().map(Into::into).collect(),
            domain: domain.into_iter().map(Into::into).collect(),
        }
    }

    /// `Σ_{ranges} self`, with the structural rewrites described in the
    /// module docs. Summing every child out of a joint is kept as a sum.
    pub fn marginalize(self, ranges: &BTreeSet<Variable>) -> Expression {
        if ranges.is_empty() {
            return self;
        }
        match self {
            Expression::Probability(d) if d.is_joint() && ranges.is_subset(&d.children) && ranges.len() < d.children.len() => {
                Distribution::of(d.children.difference(ranges).cloned()).into()
            }
            Expression::Sum { ranges: inner, expression } => {
                let merged: BTreeSet<Variable> = inner.union(ranges).cloned().collect();
                expression.marginalize(&merged)
            }
            other => Expression::Sum {
                ranges: ranges.clone(),
                expression: Box::new(other),
            },
        }
    }

    /// The product of `factors`, flattening nested products. A single factor
    /// is returned unwrapped.
    pub fn product<I: IntoIterator<Item = Expression>>(factors: I) -> Expression {
        let mut flat = Vec::new();
        for factor in factors {
            match factor {
                Expression::Product { factors } => flat.extend(factors),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            if let Some(only) = flat.pop() {
                return only;
            }
        }
        Expression::Product { factors: flat }
    }

    pub fn fraction(numerator: Expression, denominator: Expression) -> Expression {
        Expression::Fraction {
            numerator: Box::new(numerator),
            denominator: Box::new(denominator),
        }
    }

    /// Every variable mentioned anywhere in the expression, bound or free.
    pub fn variables(&self) -> BTreeSet<Variable> {
        let mut out = BTreeSet::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut BTreeSet<Variable>) {
        match self {
            Expression::Probability(d) => out.extend(d.variables()),
            Expression::QFactor { codomain, domain } => {
                out.extend(codomain.iter().cloned());
                out.extend(domain.iter().cloned());
            }
            Expression::Sum { ranges, expression } => {
                out.extend(ranges.iter().cloned());
                expression.collect_variables(out);
            }
            Expression::Product { factors } => factors.iter().for_each(|f| f.collect_variables(out)),
            Expression::Fraction { numerator, denominator } => {
                numerator.collect_variables(out);
                denominator.collect_variables(out);
            }
        }
    }

    /// Renames variables through `names`; unmapped variables are kept.
    pub fn rename(&self, names: &BTreeMap<Variable, Variable>) -> Expression {
        let map = |set: &BTreeSet<Variable>| -> BTreeSet<Variable> {
            set.iter().map(|v| names.get(v).unwrap_or(v).clone()).collect()
        };
        match self {
            Expression::Probability(d) => Expression::Probability(Distribution {
                children: map(&d.children),
                parents: map(&d.parents),
                interventions: map(&d.interventions),
            }),
            Expression::QFactor { codomain, domain } => {
                Expression::QFactor { codomain: map(codomain), domain: map(domain) }
            }
            Expression::Sum { ranges, expression } => {
                Expression::Sum { ranges: map(ranges), expression: Box::new(expression.rename(names)) }
            }
            Expression::Product { factors } => {
                Expression::Product { factors: factors.iter().map(|f| f.rename(names)).collect() }
            }
            Expression::Fraction { numerator, denominator } => Expression::Fraction {
                numerator: Box::new(numerator.rename(names)),
                denominator: Box::new(denominator.rename(names)),
            },
        }
    }

    pub fn as_distribution(&self) -> Option<&Distribution> {
        match self {
            Expression::Probability(d) => Some(d),
            _ => None,
        }
    }
}

impl Mul for Expression {
    type Output = Expression;

    fn mul(self, rhs: Expression) -> Expression {
        Expression::product([self, rhs])
    }
}

impl Div for Expression {
    type Output = Expression;

    fn div(self, rhs: Expression) -> Expression {
        Expression::fraction(self, rhs)
    }
}
