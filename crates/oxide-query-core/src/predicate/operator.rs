//! Operators used by predicates and predicate sets.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    /// Equal (`=`).
    Eq,
    /// Not equal (`!=`).
    Ne,
    /// Less than (`<`).
    Lt,
    /// Less than or equal (`<=`).
    Lte,
    /// Greater than (`>`).
    Gt,
    /// Greater than or equal (`>=`).
    Gte,
}

impl ComparisonOp {
    /// Returns the SQL representation of this operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
        }
    }

    /// The parameter marker hint for values compared with this operator.
    #[must_use]
    pub const fn hint(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Gt => "gt",
            Self::Gte => "gte",
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComparisonOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "=" | "==" | "eq" => Ok(Self::Eq),
            "!=" | "<>" | "ne" | "neq" => Ok(Self::Ne),
            "<" | "lt" => Ok(Self::Lt),
            "<=" | "lte" | "le" => Ok(Self::Lte),
            ">" | "gt" => Ok(Self::Gt),
            ">=" | "gte" | "ge" => Ok(Self::Gte),
            _ => Err(Error::InvalidOperator(String::from(s))),
        }
    }
}

/// Operator joining the entries of a predicate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LogicalOp {
    /// Logical AND.
    #[default]
    And,
    /// Logical OR.
    Or,
}

impl LogicalOp {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    /// Parses only the symbolic forms `&&` and `||`.
    pub(crate) fn from_symbol(s: &str) -> Option<Self> {
        match s {
            "&&" => Some(Self::And),
            "||" => Some(Self::Or),
            _ => None,
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogicalOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "&&" | "and" => Ok(Self::And),
            "||" | "or" => Ok(Self::Or),
            _ => Err(Error::InvalidOperator(String::from(s))),
        }
    }
}

/// Right-hand side of an `IS` test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsValue {
    /// `IS NULL`.
    Null,
    /// `IS TRUE`.
    True,
    /// `IS FALSE`.
    False,
    /// `IS UNKNOWN`.
    Unknown,
}

impl IsValue {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::True => "TRUE",
            Self::False => "FALSE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl FromStr for IsValue {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "null" => Ok(Self::Null),
            "true" => Ok(Self::True),
            "false" => Ok(Self::False),
            "unknown" => Ok(Self::Unknown),
            _ => Err(Error::InvalidValue(format!("`{s}` cannot follow IS"))),
        }
    }
}

/// Quantifier of a subquery comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubqueryQuantifier {
    /// `ALL (...)`.
    All,
    /// `ANY (...)`.
    Any,
    /// `SOME (...)`.
    Some,
}

impl SubqueryQuantifier {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Any => "ANY",
            Self::Some => "SOME",
        }
    }
}
