//! WHERE / HAVING / ON clauses and joins.

use std::fmt;

use crate::dialect::Driver;
use crate::element::{compile_cached, Cache, Cached, Element};
use crate::error::{Error, Result};
use crate::params::Params;
use crate::predicate::{PredicateInput, PredicateSet};
use crate::primitive::{Alias, Identifier};
use crate::statement::Select;

/// The keyword a clause compiles with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseKind {
    /// `WHERE ...`.
    Where,
    /// `HAVING ...`.
    Having,
    /// `ON ...`.
    On,
}

impl ClauseKind {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Where => "WHERE",
            Self::Having => "HAVING",
            Self::On => "ON",
        }
    }
}

/// A keyword followed by a predicate set.
///
/// The set is created on first mutable access; an empty clause compiles
/// to an empty string.
#[derive(Debug, Clone)]
pub struct Clause {
    kind: ClauseKind,
    predicates: Option<PredicateSet>,
}

impl Clause {
    /// Creates an empty clause.
    #[must_use]
    pub const fn new(kind: ClauseKind) -> Self {
        Self {
            kind,
            predicates: None,
        }
    }

    /// Creates an empty WHERE clause.
    #[must_use]
    pub const fn where_clause() -> Self {
        Self::new(ClauseKind::Where)
    }

    /// Creates an empty HAVING clause.
    #[must_use]
    pub const fn having() -> Self {
        Self::new(ClauseKind::Having)
    }

    /// Creates an empty ON clause.
    #[must_use]
    pub const fn on() -> Self {
        Self::new(ClauseKind::On)
    }

    /// The clause keyword.
    #[must_use]
    pub const fn kind(&self) -> ClauseKind {
        self.kind
    }

    /// The root predicate set, created if needed.
    pub fn predicates_mut(&mut self) -> &mut PredicateSet {
        self.predicates.get_or_insert_with(PredicateSet::new)
    }

    /// The root predicate set, if it was ever created.
    #[must_use]
    pub const fn predicates(&self) -> Option<&PredicateSet> {
        self.predicates.as_ref()
    }

    /// Adds a predicate to the root set.
    ///
    /// # Errors
    ///
    /// See [`PredicateSet::add`].
    pub fn add(&mut self, input: impl Into<PredicateInput>) -> Result<&mut Self> {
        self.predicates_mut().add(input)?;
        Ok(self)
    }

    /// Returns true if the clause has no predicates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.as_ref().map_or(true, PredicateSet::is_empty)
    }

    pub(crate) fn into_predicates(self) -> Option<PredicateSet> {
        self.predicates
    }
}

impl Element for Clause {
    fn compile(&mut self, driver: &dyn Driver, params: Option<&mut Params>) -> Result<String> {
        let Some(predicates) = self.predicates.as_mut() else {
            return Ok(String::new());
        };
        let sql = predicates.compile(driver, params)?;
        if sql.is_empty() {
            Ok(sql)
        } else {
            Ok(format!("{} {sql}", self.kind.as_str()))
        }
    }
}

/// Join types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    /// `INNER JOIN`.
    Inner,
    /// `LEFT JOIN`.
    Left,
    /// `RIGHT JOIN`.
    Right,
    /// `FULL JOIN`.
    Full,
    /// `CROSS JOIN`.
    Cross,
}

impl JoinKind {
    /// Returns the SQL keywords.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Full => "FULL JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
enum JoinTarget {
    Table(Identifier),
    Subquery(Box<Select>),
}

/// A joined table or subquery.
#[derive(Debug, Clone)]
pub struct Join {
    kind: JoinKind,
    target: JoinTarget,
    alias: Option<Alias>,
    on: Clause,
    cache: Cache,
}

impl Join {
    /// Joins a table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] for an invalid table name.
    pub fn new(kind: JoinKind, table: &str) -> Result<Self> {
        Ok(Self::with_target(kind, JoinTarget::Table(Identifier::new(table)?)))
    }

    /// Joins a subquery.
    #[must_use]
    pub fn subquery(kind: JoinKind, select: impl Into<Select>) -> Self {
        Self::with_target(kind, JoinTarget::Subquery(Box::new(select.into())))
    }

    fn with_target(kind: JoinKind, target: JoinTarget) -> Self {
        Self {
            kind,
            target,
            alias: None,
            on: Clause::on(),
            cache: Cache::default(),
        }
    }

    /// Sets the alias of the joined table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAlias`] for an invalid alias.
    pub fn alias(mut self, alias: &str) -> Result<Self> {
        self.cache.invalidate();
        self.alias = Some(Alias::new(alias)?);
        Ok(self)
    }

    /// Adds a join condition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperator`] on a CROSS JOIN, or the
    /// validation error of the input.
    pub fn on(mut self, input: impl Into<PredicateInput>) -> Result<Self> {
        if self.kind == JoinKind::Cross {
            return Err(Error::InvalidOperator(String::from("ON with CROSS JOIN")));
        }
        self.cache.invalidate();
        self.on.add(input)?;
        Ok(self)
    }

    /// Mutable access to the join condition.
    pub fn on_mut(&mut self) -> &mut PredicateSet {
        self.cache.invalidate();
        self.on.predicates_mut()
    }

    /// Mutable access to the joined subquery, if any.
    pub fn subquery_mut(&mut self) -> Option<&mut Select> {
        self.cache.invalidate();
        match &mut self.target {
            JoinTarget::Subquery(select) => Some(select.as_mut()),
            JoinTarget::Table(_) => None,
        }
    }

    /// The join type.
    #[must_use]
    pub const fn kind(&self) -> JoinKind {
        self.kind
    }

    /// The joined table name, unless a subquery is joined.
    #[must_use]
    pub fn table_name(&self) -> Option<&str> {
        match &self.target {
            JoinTarget::Table(table) => Some(table.as_str()),
            JoinTarget::Subquery(_) => None,
        }
    }

    /// The alias of the joined table.
    #[must_use]
    pub fn alias_name(&self) -> Option<&str> {
        self.alias.as_ref().map(Alias::as_str)
    }

    /// Returns true if the compiled SQL is cached.
    #[must_use]
    pub const fn is_cached(&self) -> bool {
        self.cache.is_valid()
    }
}

impl Cached for Join {
    const NODE: &'static str = "join";

    fn cache(&mut self) -> &mut Cache {
        &mut self.cache
    }

    fn compile_fragment(&mut self, driver: &dyn Driver, params: &mut Params) -> Result<String> {
        let target = match &mut self.target {
            JoinTarget::Table(table) => table.quoted(driver),
            JoinTarget::Subquery(select) => format!("({})", select.compile(driver, Some(params))?),
        };
        let mut sql = format!("{} {target}", self.kind);
        if let Some(alias) = &self.alias {
            sql.push(' ');
            sql.push_str(&alias.quoted(driver));
        }
        let on = self.on.compile(driver, Some(params))?;
        if !on.is_empty() {
            sql.push(' ');
            sql.push_str(&on);
        }
        Ok(sql)
    }
}

impl Element for Join {
    fn compile(&mut self, driver: &dyn Driver, params: Option<&mut Params>) -> Result<String> {
        compile_cached(self, driver, params)
    }

    fn params(&self) -> Option<&Params> {
        self.cache.params()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::GenericDriver;
    use crate::predicate::eq;

    #[test]
    fn test_clause_keyword() {
        let driver = GenericDriver::ansi();
        let mut clause = Clause::where_clause();
        assert!(clause.is_empty());
        assert_eq!(clause.compile(&driver, None).unwrap(), "");

        clause.predicates_mut();
        assert!(clause.is_empty());
        assert_eq!(clause.compile(&driver, None).unwrap(), "");

        clause.add(eq("id", 1).unwrap()).unwrap();
        assert_eq!(
            clause.compile(&driver, None).unwrap(),
            r#"WHERE "id" = :eq1"#
        );

        let mut having = Clause::having();
        having.add("COUNT(*) > 1").unwrap();
        assert_eq!(having.compile(&driver, None).unwrap(), "HAVING COUNT(*) > 1");
    }

    #[test]
    fn test_join_table() {
        let mut join = Join::new(JoinKind::Inner, "orders")
            .unwrap()
            .alias("o")
            .unwrap()
            .on(eq("o.user_id", Identifier::new("u.id").unwrap()).unwrap())
            .unwrap();
        assert_eq!(
            join.compile(&GenericDriver::ansi(), None).unwrap(),
            r#"INNER JOIN "orders" "o" ON "o"."user_id" = "u"."id""#
        );
        assert_eq!(join.table_name(), Some("orders"));
        assert_eq!(join.alias_name(), Some("o"));
    }

    #[test]
    fn test_join_subquery_and_cross() {
        let sub = Select::new().from("totals").unwrap();
        let mut join = Join::subquery(JoinKind::Left, sub)
            .alias("t")
            .unwrap()
            .on("t.id = u.id")
            .unwrap();
        assert_eq!(
            join.compile(&GenericDriver::ansi(), None).unwrap(),
            r#"LEFT JOIN (SELECT * FROM "totals") "t" ON t.id = u.id"#
        );

        let cross = Join::new(JoinKind::Cross, "dates").unwrap();
        assert!(cross.clone().on("1 = 1").is_err());
        let mut cross = cross;
        assert_eq!(
            cross.compile(&GenericDriver::ansi(), None).unwrap(),
            r#"CROSS JOIN "dates""#
        );
    }

    #[test]
    fn test_join_invalidation() {
        let driver = GenericDriver::ansi();
        let mut join = Join::new(JoinKind::Inner, "orders").unwrap().on("1 = 1").unwrap();
        join.compile(&driver, None).unwrap();
        assert!(join.is_cached());
        join.on_mut().add("2 = 2").unwrap();
        assert!(!join.is_cached());
        assert_eq!(
            join.compile(&driver, None).unwrap(),
            r#"INNER JOIN "orders" ON 1 = 1 AND 2 = 2"#
        );
    }
}
