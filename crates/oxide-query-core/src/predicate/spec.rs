//! Declarative predicate specifications.
//!
//! A specification is plain JSON data:
//!
//! | Shape | Meaning |
//! |---|---|
//! | `"a = b"` | literal predicate |
//! | `{"col": 1}` | `col = 1` (`IS NULL` for null) |
//! | `{"col": [1, 2]}` | `col IN (1, 2)` |
//! | `{"&&": [...]}`, `{"||": [...]}` | nested group |
//! | `["||", spec]` | `spec` joined with OR |
//! | `["col", "op", value]` | condition |
//! | `["col", "between", low, high]` | range condition |
//! | `["col", "like", pattern, "!"]` | pattern with escape character |
//! | `[spec, spec, ...]` | specs applied in order |

use serde_json::Value;

use super::{ComparisonOp, IsValue, LogicalOp, Predicate, PredicateSet};
use crate::error::{Error, Result};
use crate::primitive::Identifier;
use crate::value::SqlValue;

/// The shape of a specification, decided before anything is built.
#[derive(Debug)]
enum Shape<'a> {
    Raw(&'a str),
    Pair(&'a str, &'a Value),
    Group(LogicalOp, &'a [Value]),
    Chained(LogicalOp, &'a Value),
    Condition {
        column: &'a str,
        operator: Operator,
        value: &'a Value,
        extra: Option<&'a Value>,
    },
    List(&'a [Value]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Compare(ComparisonOp),
    In { negated: bool },
    Like { negated: bool },
    Between { negated: bool },
    Is { negated: bool },
}

impl Operator {
    fn parse(raw: &str) -> Option<Self> {
        let normalized = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_lowercase();
        let op = match normalized.as_str() {
            "in" => Self::In { negated: false },
            "not in" | "nin" => Self::In { negated: true },
            "like" => Self::Like { negated: false },
            "not like" => Self::Like { negated: true },
            "between" => Self::Between { negated: false },
            "not between" => Self::Between { negated: true },
            "is" => Self::Is { negated: false },
            "is not" => Self::Is { negated: true },
            other => Self::Compare(other.parse().ok()?),
        };
        Some(op)
    }
}

fn classify(spec: &Value) -> Result<Shape<'_>> {
    match spec {
        Value::String(sql) if LogicalOp::from_symbol(sql).is_some() => {
            Err(Error::spec(spec, "a logical operator needs a specification"))
        }
        Value::String(sql) => Ok(Shape::Raw(sql)),
        Value::Object(map) => {
            let mut entries = map.iter();
            let (Some((key, value)), None) = (entries.next(), entries.next()) else {
                return Err(Error::spec(spec, "an object must have exactly one key"));
            };
            match (LogicalOp::from_symbol(key), value) {
                (Some(op), Value::Array(items)) => Ok(Shape::Group(op, items)),
                (Some(_), _) => Err(Error::spec(spec, "a group must hold an array")),
                (None, _) => Ok(Shape::Pair(key, value)),
            }
        }
        Value::Array(items) => match items.as_slice() {
            [Value::String(op), inner] if LogicalOp::from_symbol(op).is_some() => {
                let op = LogicalOp::from_symbol(op).unwrap_or_default();
                Ok(Shape::Chained(op, inner))
            }
            [] => Err(Error::spec(spec, "an empty list")),
            [Value::String(op), ..] if LogicalOp::from_symbol(op).is_some() => Err(Error::spec(
                spec,
                "a logical operator takes exactly one specification",
            )),
            [Value::String(column), Value::String(operator), value, rest @ ..]
                if rest.len() <= 1 && Identifier::new(column.as_str()).is_ok() =>
            {
                let operator = Operator::parse(operator).ok_or_else(|| {
                    Error::spec(spec, format!("unknown operator `{operator}`"))
                })?;
                Ok(Shape::Condition {
                    column,
                    operator,
                    value,
                    extra: rest.first(),
                })
            }
            [Value::String(column), Value::String(operator), _, rest @ ..]
                if rest.len() <= 1 && Operator::parse(operator).is_some() =>
            {
                Err(Identifier::new(column.as_str()).err().unwrap_or_else(|| {
                    Error::spec(spec, "not a predicate specification")
                }))
            }
            _ => Ok(Shape::List(items)),
        },
        Value::Null | Value::Bool(_) | Value::Number(_) => {
            Err(Error::spec(spec, "not a predicate specification"))
        }
    }
}

fn scalar(spec: &Value, value: &Value) -> Result<SqlValue> {
    SqlValue::from_json(value).ok_or_else(|| Error::spec(spec, "expected a scalar value"))
}

fn scalars(spec: &Value, value: &Value) -> Result<Vec<SqlValue>> {
    match value {
        Value::Array(items) => items.iter().map(|item| scalar(spec, item)).collect(),
        _ => Err(Error::spec(spec, "expected an array of values")),
    }
}

fn condition(
    spec: &Value,
    column: &str,
    operator: Operator,
    value: &Value,
    extra: Option<&Value>,
) -> Result<Predicate> {
    match operator {
        Operator::Between { negated } => {
            let high = extra.ok_or_else(|| Error::spec(spec, "BETWEEN needs two bounds"))?;
            Predicate::between(column, scalar(spec, value)?, scalar(spec, high)?, negated)
        }
        Operator::Like { negated } => {
            let escape = match extra {
                None => None,
                Some(Value::String(escape)) => {
                    let mut chars = escape.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => Some(c),
                        _ => return Err(Error::spec(spec, "escape must be one character")),
                    }
                }
                Some(_) => return Err(Error::spec(spec, "escape must be a string")),
            };
            Predicate::like(column, scalar(spec, value)?, escape, negated)
        }
        _ if extra.is_some() => Err(Error::spec(spec, "too many elements")),
        Operator::Compare(op) => Predicate::comparison(column, op, scalar(spec, value)?),
        Operator::In { negated } => Predicate::in_values(column, scalars(spec, value)?, negated),
        Operator::Is { negated } => {
            let target = match value {
                Value::Null => IsValue::Null,
                Value::Bool(true) => IsValue::True,
                Value::Bool(false) => IsValue::False,
                Value::String(keyword) => keyword.parse()?,
                _ => return Err(Error::spec(spec, "IS takes null, a boolean or UNKNOWN")),
            };
            Predicate::is(column, target, negated)
        }
    }
}

/// Applies a specification to `set`.
///
/// Entries are appended as they are built; callers wanting all-or-nothing
/// behavior apply to a scratch set.
pub(super) fn apply(set: &mut PredicateSet, spec: &Value) -> Result<()> {
    match classify(spec)? {
        Shape::Raw(sql) => {
            set.add(Predicate::literal(sql)?)?;
        }
        Shape::Pair(column, values @ Value::Array(_)) => {
            let values = scalars(spec, values)?;
            set.add(Predicate::in_values(column, values, false)?)?;
        }
        Shape::Pair(column, value) => {
            set.add(Predicate::comparison(
                column,
                ComparisonOp::Eq,
                scalar(spec, value)?,
            )?)?;
        }
        Shape::Group(op, items) => {
            let group = set.nest_with(op);
            for item in items {
                apply(group, item)?;
            }
        }
        Shape::Chained(op, inner) => {
            set.next_operator(op);
            apply(set, inner)?;
        }
        Shape::Condition {
            column,
            operator,
            value,
            extra,
        } => {
            set.add(condition(spec, column, operator, value, extra)?)?;
        }
        Shape::List(items) => {
            for item in items {
                apply(set, item)?;
            }
        }
    }
    Ok(())
}
