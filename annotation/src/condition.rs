//! Mapping conditions: `<column> <op> <comparand>` row filters.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::dataset::{Cell, Column, ColumnKind};

/// Comparison operator of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `eq`
    Eq,
    /// `neq`
    Neq,
    /// `lt`
    Lt,
    /// `gt`
    Gt,
    /// `lte`
    Lte,
    /// `gte`
    Gte,
}

impl Operator {
    /// Returns true if `ordering` (cell compared to comparand) satisfies the
    /// operator.
    #[must_use]
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Neq => ordering != Ordering::Equal,
            Self::Lt => ordering == Ordering::Less,
            Self::Gt => ordering == Ordering::Greater,
            Self::Lte => ordering != Ordering::Greater,
            Self::Gte => ordering != Ordering::Less,
        }
    }
}

impl FromStr for Operator {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(Self::Eq),
            "neq" => Ok(Self::Neq),
            "lt" => Ok(Self::Lt),
            "gt" => Ok(Self::Gt),
            "lte" => Ok(Self::Lte),
            "gte" => Ok(Self::Gte),
            other => Err(ConditionError::UnknownOperator(other.to_owned())),
        }
    }
}

/// How a comparand is compared with cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Coercion {
    /// Numeric comparison when the column is numeric and the comparand is a
    /// number, string comparison otherwise.
    #[default]
    Native,
    /// Always compare cell text with the comparand as strings.
    Text,
}

impl FromStr for Coercion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "native" => Ok(Self::Native),
            "text" => Ok(Self::Text),
            other => Err(format!("unknown comparison mode '{other}' (expected native or text)")),
        }
    }
}

/// Why a condition could not be used. These are recoverable: the mapping
/// carrying the condition is skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConditionError {
    /// Not exactly three whitespace-separated tokens.
    #[error("expected three space-separated tokens, found {0}")]
    TokenCount(usize),
    /// The operator is not one of `eq neq lt gt lte gte`.
    #[error("unrecognized comparison operator '{0}', try one of eq|neq|lt|gt|lte|gte")]
    UnknownOperator(String),
}

/// A parsed row filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    /// Column the filter reads.
    pub column: String,
    /// Comparison operator.
    pub operator: Operator,
    /// Value compared against.
    pub comparand: String,
}

impl Condition {
    /// Parses `<column> <op> <comparand>`.
    ///
    /// # Errors
    ///
    /// [`ConditionError::TokenCount`] unless there are exactly three tokens,
    /// [`ConditionError::UnknownOperator`] for an unsupported operator.
    pub fn parse(text: &str) -> Result<Self, ConditionError> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let [column, operator, comparand] = tokens.as_slice() else {
            return Err(ConditionError::TokenCount(tokens.len()));
        };
        Ok(Self {
            column: (*column).to_owned(),
            operator: operator.parse()?,
            comparand: (*comparand).to_owned(),
        })
    }

    /// Tests one cell of a column of kind `kind`. A missing cell is unequal
    /// to every comparand and unordered, so only `neq` holds for it.
    #[must_use]
    pub fn matches(&self, cell: &Cell, kind: ColumnKind, coercion: Coercion) -> bool {
        if cell.is_missing() {
            return self.operator == Operator::Neq;
        }
        let numeric = match coercion {
            Coercion::Native if kind.is_numeric() => self
                .comparand
                .parse::<f64>()
                .ok()
                .zip(cell.value.as_f64()),
            _ => None,
        };
        let ordering = match numeric {
            Some((comparand, value)) => value.partial_cmp(&comparand),
            None => Some(cell.text.as_str().cmp(self.comparand.as_str())),
        };
        ordering.is_some_and(|o| self.operator.holds(o))
    }

    /// Row indices of `column` whose cells satisfy the condition.
    #[must_use]
    pub fn select(&self, column: &Column, coercion: Coercion) -> Vec<usize> {
        column
            .iter()
            .filter(|(_, cell)| self.matches(cell, column.kind(), coercion))
            .map(|(row, _)| row)
            .collect()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.operator {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Lt => "lt",
            Operator::Gt => "gt",
            Operator::Lte => "lte",
            Operator::Gte => "gte",
        };
        write!(f, "{} {} {}", self.column, op, self.comparand)
    }
}
