//! Predicates and predicate sets.
//!
//! A [`Predicate`] is a single boolean test. Predicates are validated when
//! they are built, so an invalid operator or a NULL in a position that
//! cannot take one fails immediately rather than at compile time.
//!
//! # Example
//!
//! ```
//! use oxide_query_core::predicate::{eq, in_list, PredicateSet};
//! use oxide_query_core::{Element, GenericDriver};
//!
//! let mut set = PredicateSet::new();
//! set.add(eq("status", "active").unwrap()).unwrap();
//! set.or(in_list("role", ["admin", "owner"]).unwrap()).unwrap();
//!
//! let sql = set.compile(&GenericDriver::ansi(), None).unwrap();
//! assert_eq!(sql, r#""status" = :eq1 OR "role" IN (:in1, :in2)"#);
//! ```

mod operator;
mod set;
mod spec;

pub use operator::{ComparisonOp, IsValue, LogicalOp, SubqueryQuantifier};
pub use set::{PredicateInput, PredicateSet};

use crate::dialect::Driver;
use crate::element::Element;
use crate::error::{Error, Result};
use crate::expression::Expression;
use crate::params::Params;
use crate::primitive::{Identifier, IntoReference, Literal, Reference};
use crate::statement::Select;
use crate::value::{SqlValue, ToSqlValue};

/// The right-hand side of a predicate.
#[derive(Debug, Clone)]
pub enum Operand {
    /// Bound as a parameter.
    Value(SqlValue),
    /// A quoted column reference.
    Identifier(Identifier),
    /// Raw SQL.
    Literal(Literal),
    /// A template expression.
    Expression(Expression),
    /// A parenthesised subquery.
    Subquery(Box<Select>),
}

impl Operand {
    const fn is_null(&self) -> bool {
        matches!(self, Self::Value(SqlValue::Null))
    }

    pub(crate) fn compile_with_hint(
        &mut self,
        driver: &dyn Driver,
        params: &mut Params,
        hint: &str,
    ) -> Result<String> {
        match self {
            Self::Value(value) => Ok(params.create(value.clone(), None, Some(hint))),
            Self::Identifier(identifier) => Ok(identifier.quoted(driver)),
            Self::Literal(literal) => Ok(String::from(literal.as_str())),
            Self::Expression(expression) => expression.compile(driver, Some(params)),
            Self::Subquery(select) => Ok(format!("({})", select.compile(driver, Some(params))?)),
        }
    }
}

impl<T: ToSqlValue> From<T> for Operand {
    fn from(value: T) -> Self {
        Self::Value(value.to_sql_value())
    }
}

impl From<Identifier> for Operand {
    fn from(identifier: Identifier) -> Self {
        Self::Identifier(identifier)
    }
}

impl From<Literal> for Operand {
    fn from(literal: Literal) -> Self {
        Self::Literal(literal)
    }
}

impl From<Expression> for Operand {
    fn from(expression: Expression) -> Self {
        Self::Expression(expression)
    }
}

impl From<Select> for Operand {
    fn from(select: Select) -> Self {
        Self::Subquery(Box::new(select))
    }
}

impl From<&Select> for Operand {
    fn from(select: &Select) -> Self {
        Self::Subquery(Box::new(select.clone()))
    }
}

#[derive(Debug, Clone)]
enum InValues {
    List { values: Vec<SqlValue>, has_null: bool },
    Subquery(Box<Select>),
}

#[derive(Debug, Clone)]
enum Kind {
    Comparison {
        left: Reference,
        op: ComparisonOp,
        right: Operand,
    },
    Between {
        left: Reference,
        negated: bool,
        low: Operand,
        high: Operand,
    },
    In {
        left: Reference,
        negated: bool,
        values: InValues,
    },
    Like {
        left: Reference,
        negated: bool,
        pattern: Operand,
        escape: Option<char>,
    },
    Is {
        left: Reference,
        negated: bool,
        value: IsValue,
    },
    Exists {
        negated: bool,
        subquery: Box<Select>,
    },
    Quantified {
        left: Reference,
        op: ComparisonOp,
        quantifier: SubqueryQuantifier,
        subquery: Box<Select>,
    },
    Literal(Literal),
    Expression(Expression),
    Set(PredicateSet),
}

/// A single boolean test, or a nested group of them.
#[derive(Debug, Clone)]
pub struct Predicate(Kind);

impl Predicate {
    /// `left op right`.
    ///
    /// A NULL right-hand side turns `=` into `IS NULL` and `!=` into
    /// `IS NOT NULL`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] when NULL is compared with any other
    /// operator, or an identifier error for an invalid `left`.
    pub fn comparison(
        left: impl IntoReference,
        op: ComparisonOp,
        right: impl Into<Operand>,
    ) -> Result<Self> {
        let left = left.into_reference()?;
        let right = right.into();
        if right.is_null() {
            return match op {
                ComparisonOp::Eq => Ok(Self(Kind::Is {
                    left,
                    negated: false,
                    value: IsValue::Null,
                })),
                ComparisonOp::Ne => Ok(Self(Kind::Is {
                    left,
                    negated: true,
                    value: IsValue::Null,
                })),
                other => Err(Error::InvalidValue(format!(
                    "NULL cannot be compared with `{other}`"
                ))),
            };
        }
        Ok(Self(Kind::Comparison { left, op, right }))
    }

    /// `left [NOT] BETWEEN low AND high`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] unless both bounds are non-NULL
    /// values or literals.
    pub fn between(
        left: impl IntoReference,
        low: impl Into<Operand>,
        high: impl Into<Operand>,
        negated: bool,
    ) -> Result<Self> {
        let left = left.into_reference()?;
        let (low, high) = (low.into(), high.into());
        for bound in [&low, &high] {
            match bound {
                Operand::Value(SqlValue::Null) => {
                    return Err(Error::InvalidValue(String::from("BETWEEN bound is NULL")))
                }
                Operand::Value(_) | Operand::Literal(_) => {}
                _ => {
                    return Err(Error::InvalidValue(String::from(
                        "BETWEEN bounds must be values or literals",
                    )))
                }
            }
        }
        Ok(Self(Kind::Between {
            left,
            negated,
            low,
            high,
        }))
    }

    /// `left [NOT] IN (values)`, NULL-aware.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] for an empty list.
    pub fn in_values<I, V>(left: impl IntoReference, values: I, negated: bool) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        let left = left.into_reference()?;
        let mut has_null = false;
        let mut kept = Vec::new();
        for value in values {
            match value.to_sql_value() {
                SqlValue::Null => has_null = true,
                value => kept.push(value),
            }
        }
        if kept.is_empty() && !has_null {
            return Err(Error::InvalidValue(String::from("IN list is empty")));
        }
        Ok(Self(Kind::In {
            left,
            negated,
            values: InValues::List {
                values: kept,
                has_null,
            },
        }))
    }

    /// `left [NOT] IN (subquery)`.
    ///
    /// # Errors
    ///
    /// Returns an identifier error for an invalid `left`.
    pub fn in_subquery(
        left: impl IntoReference,
        subquery: impl Into<Select>,
        negated: bool,
    ) -> Result<Self> {
        Ok(Self(Kind::In {
            left: left.into_reference()?,
            negated,
            values: InValues::Subquery(Box::new(subquery.into())),
        }))
    }

    /// `left [NOT] LIKE pattern [ESCAPE 'c']`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] for a NULL pattern.
    pub fn like(
        left: impl IntoReference,
        pattern: impl Into<Operand>,
        escape: Option<char>,
        negated: bool,
    ) -> Result<Self> {
        let left = left.into_reference()?;
        let pattern = pattern.into();
        if pattern.is_null() {
            return Err(Error::InvalidValue(String::from("LIKE pattern is NULL")));
        }
        Ok(Self(Kind::Like {
            left,
            negated,
            pattern,
            escape,
        }))
    }

    /// `left IS [NOT] NULL|TRUE|FALSE|UNKNOWN`.
    ///
    /// # Errors
    ///
    /// Returns an identifier error for an invalid `left`.
    pub fn is(left: impl IntoReference, value: IsValue, negated: bool) -> Result<Self> {
        Ok(Self(Kind::Is {
            left: left.into_reference()?,
            negated,
            value,
        }))
    }

    /// `[NOT] EXISTS (subquery)`.
    #[must_use]
    pub fn exists(subquery: impl Into<Select>, negated: bool) -> Self {
        Self(Kind::Exists {
            negated,
            subquery: Box::new(subquery.into()),
        })
    }

    /// `left op ALL|ANY|SOME (subquery)`.
    ///
    /// # Errors
    ///
    /// Returns an identifier error for an invalid `left`.
    pub fn quantified(
        left: impl IntoReference,
        op: ComparisonOp,
        quantifier: SubqueryQuantifier,
        subquery: impl Into<Select>,
    ) -> Result<Self> {
        Ok(Self(Kind::Quantified {
            left: left.into_reference()?,
            op,
            quantifier,
            subquery: Box::new(subquery.into()),
        }))
    }

    /// Trusted SQL text used as a predicate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLiteral`] for blank text.
    pub fn literal(sql: impl Into<String>) -> Result<Self> {
        Literal::new(sql).map(|literal| Self(Kind::Literal(literal)))
    }

    /// Returns the nested set if this predicate is a group.
    #[must_use]
    pub const fn as_set(&self) -> Option<&PredicateSet> {
        match &self.0 {
            Kind::Set(set) => Some(set),
            _ => None,
        }
    }

    /// Mutable access to the nested set if this predicate is a group.
    pub fn as_set_mut(&mut self) -> Option<&mut PredicateSet> {
        match &mut self.0 {
            Kind::Set(set) => Some(set),
            _ => None,
        }
    }

    /// Mutable access to the subquery this predicate owns, if any.
    pub fn subquery_mut(&mut self) -> Option<&mut Select> {
        match &mut self.0 {
            Kind::In {
                values: InValues::Subquery(select),
                ..
            }
            | Kind::Exists {
                subquery: select, ..
            }
            | Kind::Quantified {
                subquery: select, ..
            }
            | Kind::Comparison {
                right: Operand::Subquery(select),
                ..
            } => Some(select.as_mut()),
            _ => None,
        }
    }

    pub(crate) fn from_set(set: PredicateSet) -> Self {
        Self(Kind::Set(set))
    }

    fn escape_literal(driver: &dyn Driver, escape: char) -> String {
        let quote = driver.value_quote();
        if escape == quote {
            format!("{quote}{escape}{escape}{quote}")
        } else {
            format!("{quote}{escape}{quote}")
        }
    }

    fn render(&mut self, driver: &dyn Driver, params: &mut Params) -> Result<String> {
        match &mut self.0 {
            Kind::Comparison { left, op, right } => {
                let left = left.quoted(driver);
                let right = right.compile_with_hint(driver, params, op.hint())?;
                Ok(format!("{left} {op} {right}"))
            }
            Kind::Between {
                left,
                negated,
                low,
                high,
            } => {
                let left = left.quoted(driver);
                let low = low.compile_with_hint(driver, params, "between")?;
                let high = high.compile_with_hint(driver, params, "between")?;
                let not = if *negated { "NOT " } else { "" };
                Ok(format!("{left} {not}BETWEEN {low} AND {high}"))
            }
            Kind::In {
                left,
                negated,
                values,
            } => {
                let left = left.quoted(driver);
                let (keyword, null_test, joiner) = if *negated {
                    ("NOT IN", "IS NOT NULL", "AND")
                } else {
                    ("IN", "IS NULL", "OR")
                };
                match values {
                    InValues::Subquery(select) => Ok(format!(
                        "{left} {keyword} ({})",
                        select.compile(driver, Some(params))?
                    )),
                    InValues::List { values, has_null } => {
                        if values.is_empty() {
                            return Ok(format!("{left} {null_test}"));
                        }
                        let markers: Vec<String> = values
                            .iter()
                            .map(|value| params.create(value.clone(), None, Some("in")))
                            .collect();
                        let list = format!("{left} {keyword} ({})", markers.join(", "));
                        if *has_null {
                            Ok(format!("({list} {joiner} {left} {null_test})"))
                        } else {
                            Ok(list)
                        }
                    }
                }
            }
            Kind::Like {
                left,
                negated,
                pattern,
                escape,
            } => {
                let left = left.quoted(driver);
                let pattern = pattern.compile_with_hint(driver, params, "like")?;
                let not = if *negated { "NOT " } else { "" };
                let mut sql = format!("{left} {not}LIKE {pattern}");
                if let Some(escape) = escape {
                    sql.push_str(" ESCAPE ");
                    sql.push_str(&Self::escape_literal(driver, *escape));
                }
                Ok(sql)
            }
            Kind::Is {
                left,
                negated,
                value,
            } => {
                let not = if *negated { "NOT " } else { "" };
                Ok(format!("{} IS {not}{}", left.quoted(driver), value.as_str()))
            }
            Kind::Exists { negated, subquery } => {
                let not = if *negated { "NOT " } else { "" };
                Ok(format!(
                    "{not}EXISTS ({})",
                    subquery.compile(driver, Some(params))?
                ))
            }
            Kind::Quantified {
                left,
                op,
                quantifier,
                subquery,
            } => Ok(format!(
                "{} {op} {} ({})",
                left.quoted(driver),
                quantifier.as_str(),
                subquery.compile(driver, Some(params))?
            )),
            Kind::Literal(literal) => Ok(String::from(literal.as_str())),
            Kind::Expression(expression) => expression.compile(driver, Some(params)),
            Kind::Set(set) => set.compile(driver, Some(params)),
        }
    }
}

impl From<Expression> for Predicate {
    fn from(expression: Expression) -> Self {
        Self(Kind::Expression(expression))
    }
}

impl From<Literal> for Predicate {
    fn from(literal: Literal) -> Self {
        Self(Kind::Literal(literal))
    }
}

impl Element for Predicate {
    fn compile(&mut self, driver: &dyn Driver, params: Option<&mut Params>) -> Result<String> {
        match params {
            Some(params) => params.atomic(|params| self.render(driver, params)),
            None => {
                let mut params = Params::new(driver.param_style());
                self.render(driver, &mut params)
            }
        }
    }
}

/// `left = right`.
///
/// # Errors
///
/// See [`Predicate::comparison`].
pub fn eq(left: impl IntoReference, right: impl Into<Operand>) -> Result<Predicate> {
    Predicate::comparison(left, ComparisonOp::Eq, right)
}

/// `left != right`.
///
/// # Errors
///
/// See [`Predicate::comparison`].
pub fn ne(left: impl IntoReference, right: impl Into<Operand>) -> Result<Predicate> {
    Predicate::comparison(left, ComparisonOp::Ne, right)
}

/// `left < right`.
///
/// # Errors
///
/// See [`Predicate::comparison`].
pub fn lt(left: impl IntoReference, right: impl Into<Operand>) -> Result<Predicate> {
    Predicate::comparison(left, ComparisonOp::Lt, right)
}

/// `left <= right`.
///
/// # Errors
///
/// See [`Predicate::comparison`].
pub fn lte(left: impl IntoReference, right: impl Into<Operand>) -> Result<Predicate> {
    Predicate::comparison(left, ComparisonOp::Lte, right)
}

/// `left > right`.
///
/// # Errors
///
/// See [`Predicate::comparison`].
pub fn gt(left: impl IntoReference, right: impl Into<Operand>) -> Result<Predicate> {
    Predicate::comparison(left, ComparisonOp::Gt, right)
}

/// `left >= right`.
///
/// # Errors
///
/// See [`Predicate::comparison`].
pub fn gte(left: impl IntoReference, right: impl Into<Operand>) -> Result<Predicate> {
    Predicate::comparison(left, ComparisonOp::Gte, right)
}

/// `left BETWEEN low AND high`.
///
/// # Errors
///
/// See [`Predicate::between`].
pub fn between(
    left: impl IntoReference,
    low: impl Into<Operand>,
    high: impl Into<Operand>,
) -> Result<Predicate> {
    Predicate::between(left, low, high, false)
}

/// `left NOT BETWEEN low AND high`.
///
/// # Errors
///
/// See [`Predicate::between`].
pub fn not_between(
    left: impl IntoReference,
    low: impl Into<Operand>,
    high: impl Into<Operand>,
) -> Result<Predicate> {
    Predicate::between(left, low, high, true)
}

/// `left IN (values)`.
///
/// # Errors
///
/// See [`Predicate::in_values`].
pub fn in_list<I, V>(left: impl IntoReference, values: I) -> Result<Predicate>
where
    I: IntoIterator<Item = V>,
    V: ToSqlValue,
{
    Predicate::in_values(left, values, false)
}

/// `left NOT IN (values)`.
///
/// # Errors
///
/// See [`Predicate::in_values`].
pub fn not_in<I, V>(left: impl IntoReference, values: I) -> Result<Predicate>
where
    I: IntoIterator<Item = V>,
    V: ToSqlValue,
{
    Predicate::in_values(left, values, true)
}

/// `left IN (subquery)`.
///
/// # Errors
///
/// See [`Predicate::in_subquery`].
pub fn in_select(left: impl IntoReference, subquery: impl Into<Select>) -> Result<Predicate> {
    Predicate::in_subquery(left, subquery, false)
}

/// `left NOT IN (subquery)`.
///
/// # Errors
///
/// See [`Predicate::in_subquery`].
pub fn not_in_select(left: impl IntoReference, subquery: impl Into<Select>) -> Result<Predicate> {
    Predicate::in_subquery(left, subquery, true)
}

/// `left LIKE pattern`.
///
/// # Errors
///
/// See [`Predicate::like`].
pub fn like(left: impl IntoReference, pattern: impl Into<Operand>) -> Result<Predicate> {
    Predicate::like(left, pattern, None, false)
}

/// `left NOT LIKE pattern`.
///
/// # Errors
///
/// See [`Predicate::like`].
pub fn not_like(left: impl IntoReference, pattern: impl Into<Operand>) -> Result<Predicate> {
    Predicate::like(left, pattern, None, true)
}

/// `left IS NULL`.
///
/// # Errors
///
/// See [`Predicate::is`].
pub fn is_null(left: impl IntoReference) -> Result<Predicate> {
    Predicate::is(left, IsValue::Null, false)
}

/// `left IS NOT NULL`.
///
/// # Errors
///
/// See [`Predicate::is`].
pub fn is_not_null(left: impl IntoReference) -> Result<Predicate> {
    Predicate::is(left, IsValue::Null, true)
}

/// `EXISTS (subquery)`.
#[must_use]
pub fn exists(subquery: impl Into<Select>) -> Predicate {
    Predicate::exists(subquery, false)
}

/// `NOT EXISTS (subquery)`.
#[must_use]
pub fn not_exists(subquery: impl Into<Select>) -> Predicate {
    Predicate::exists(subquery, true)
}

/// Trusted SQL text used as a predicate.
///
/// # Errors
///
/// See [`Predicate::literal`].
pub fn literal(sql: impl Into<String>) -> Result<Predicate> {
    Predicate::literal(sql)
}
