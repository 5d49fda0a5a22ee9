//! Filter operators.
//!
//! The [`Op`] enum names every operator a filter can carry. Which operators
//! are offered for a data category is a lookup table owned by the container;
//! [`default_operators`] is the table used when the container does not
//! supply its own.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::DataCategory;

/// Filter operator.
///
/// Operators are grouped by the categories they are offered for:
/// - **String**: `Contains`, `NotContains`, `Equals`, `NotEquals`,
///   `StartsWith`, `EndsWith`
/// - **Numeric**: `Eq`, `Ne`, `Gt`, `Gte`, `Lt`, `Lte`
/// - **Enumerated / Boolean**: `Is`, `IsNot`
/// - **Date / Time of day**: `Is`, `IsNot`, `After`, `OnOrAfter`, `Before`,
///   `OnOrBefore`
/// - **Any category with values**: `IsEmpty`, `IsNotEmpty`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Op {
    Contains,
    NotContains,
    Equals,
    NotEquals,
    StartsWith,
    EndsWith,

    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,

    Is,
    IsNot,
    After,
    OnOrAfter,
    Before,
    OnOrBefore,

    IsEmpty,
    IsNotEmpty,
}

const STRING_OPS: &[Op] = &[
    Op::Contains,
    Op::NotContains,
    Op::Equals,
    Op::NotEquals,
    Op::StartsWith,
    Op::EndsWith,
    Op::IsEmpty,
    Op::IsNotEmpty,
];

const NUMERIC_OPS: &[Op] = &[
    Op::Eq,
    Op::Ne,
    Op::Gt,
    Op::Gte,
    Op::Lt,
    Op::Lte,
    Op::IsEmpty,
    Op::IsNotEmpty,
];

const ENUM_OPS: &[Op] = &[Op::Is, Op::IsNot];

const BOOL_OPS: &[Op] = &[Op::Is];

const DATE_OPS: &[Op] = &[
    Op::Is,
    Op::IsNot,
    Op::After,
    Op::OnOrAfter,
    Op::Before,
    Op::OnOrBefore,
    Op::IsEmpty,
    Op::IsNotEmpty,
];

const ALL_OPS: &[Op] = &[
    Op::Contains,
    Op::NotContains,
    Op::Equals,
    Op::NotEquals,
    Op::StartsWith,
    Op::EndsWith,
    Op::Eq,
    Op::Ne,
    Op::Gt,
    Op::Gte,
    Op::Lt,
    Op::Lte,
    Op::Is,
    Op::IsNot,
    Op::After,
    Op::OnOrAfter,
    Op::Before,
    Op::OnOrBefore,
    Op::IsEmpty,
    Op::IsNotEmpty,
];

/// The operators offered for `category`, default operator first.
pub fn default_operators(category: DataCategory) -> &'static [Op] {
    match category {
        DataCategory::String => STRING_OPS,
        DataCategory::Numeric => NUMERIC_OPS,
        DataCategory::Enumerated => ENUM_OPS,
        DataCategory::Boolean => BOOL_OPS,
        DataCategory::Date | DataCategory::TimeOfDay => DATE_OPS,
        DataCategory::Other => &[],
    }
}

impl Op {
    /// Returns `true` if this operator needs no comparison value.
    pub fn is_unary(self) -> bool {
        matches!(self, Op::IsEmpty | Op::IsNotEmpty)
    }

    /// Normalizes synonyms to their canonical ordering form.
    ///
    /// - `Equals`, `Is` -> `Eq`
    /// - `NotEquals`, `IsNot` -> `Ne`
    /// - `After` -> `Gt`, `OnOrAfter` -> `Gte`
    /// - `Before` -> `Lt`, `OnOrBefore` -> `Lte`
    /// - Others unchanged
    pub fn normalize(self) -> Op {
        match self {
            Op::Equals | Op::Is => Op::Eq,
            Op::NotEquals | Op::IsNot => Op::Ne,
            Op::After => Op::Gt,
            Op::OnOrAfter => Op::Gte,
            Op::Before => Op::Lt,
            Op::OnOrBefore => Op::Lte,
            other => other,
        }
    }

    /// Evaluates a comparison given an ordering result.
    ///
    /// Returns `false` for operators that are not ordering based.
    pub fn eval_ordering(self, ordering: Ordering) -> bool {
        match self.normalize() {
            Op::Eq => ordering == Ordering::Equal,
            Op::Ne => ordering != Ordering::Equal,
            Op::Gt => ordering == Ordering::Greater,
            Op::Gte => ordering != Ordering::Less,
            Op::Lt => ordering == Ordering::Less,
            Op::Lte => ordering != Ordering::Greater,
            _ => false,
        }
    }

    /// Returns the display name of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Contains => "contains",
            Op::NotContains => "not contains",
            Op::Equals => "equals",
            Op::NotEquals => "not equals",
            Op::StartsWith => "starts with",
            Op::EndsWith => "ends with",
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Is => "is",
            Op::IsNot => "is not",
            Op::After => "is after",
            Op::OnOrAfter => "is on or after",
            Op::Before => "is before",
            Op::OnOrBefore => "is on or before",
            Op::IsEmpty => "is empty",
            Op::IsNotEmpty => "is not empty",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown operator name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter operator: '{0}'")]
pub struct UnknownOperator(pub String);

impl FromStr for Op {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_OPS
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| UnknownOperator(s.to_string()))
    }
}

impl TryFrom<String> for Op {
    type Error = UnknownOperator;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Op> for String {
    fn from(op: Op) -> Self {
        op.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table() {
        assert_eq!(default_operators(DataCategory::String)[0], Op::Contains);
        assert_eq!(default_operators(DataCategory::Numeric)[0], Op::Eq);
        assert_eq!(default_operators(DataCategory::Enumerated), &[Op::Is, Op::IsNot]);
        assert_eq!(default_operators(DataCategory::Boolean), &[Op::Is]);
        assert_eq!(
            default_operators(DataCategory::Date),
            default_operators(DataCategory::TimeOfDay)
        );
        assert!(default_operators(DataCategory::Other).is_empty());
    }

    #[test]
    fn op_normalization() {
        assert_eq!(Op::Before.normalize(), Op::Lt);
        assert_eq!(Op::OnOrAfter.normalize(), Op::Gte);
        assert_eq!(Op::Is.normalize(), Op::Eq);
        assert_eq!(Op::NotEquals.normalize(), Op::Ne);
        assert_eq!(Op::Contains.normalize(), Op::Contains);
    }

    #[test]
    fn op_eval_ordering() {
        assert!(Op::Eq.eval_ordering(Ordering::Equal));
        assert!(!Op::Eq.eval_ordering(Ordering::Less));

        assert!(Op::Ne.eval_ordering(Ordering::Greater));
        assert!(!Op::Ne.eval_ordering(Ordering::Equal));

        assert!(Op::Gte.eval_ordering(Ordering::Equal));
        assert!(!Op::Gte.eval_ordering(Ordering::Less));

        assert!(Op::Lte.eval_ordering(Ordering::Less));
        assert!(!Op::Lte.eval_ordering(Ordering::Greater));

        assert!(Op::Before.eval_ordering(Ordering::Less));
        assert!(Op::After.eval_ordering(Ordering::Greater));

        assert!(!Op::Contains.eval_ordering(Ordering::Equal));
    }

    #[test]
    fn names_round_trip() {
        for op in ALL_OPS {
            assert_eq!(op.as_str().parse::<Op>().unwrap(), *op);
        }
        assert!("like".parse::<Op>().is_err());
        assert_eq!(Op::OnOrBefore.to_string(), "is on or before");
    }

    #[test]
    fn unary_ops() {
        assert!(Op::IsEmpty.is_unary());
        assert!(Op::IsNotEmpty.is_unary());
        assert!(!Op::Is.is_unary());
    }
}
