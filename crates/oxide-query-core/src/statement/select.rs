//! SELECT statements.

use std::fmt;

use super::{requote, Statement, StatementKind};
use crate::clause::{Clause, Join};
use crate::dialect::{
    standard_limit_offset, ColumnList, DecoratedSelect, Driver, LimitOffset,
};
use crate::element::{compile_cached, Cache, Cached, DriverKey, Element};
use crate::error::{Error, Result};
use crate::expression::Expression;
use crate::params::Params;
use crate::predicate::{LogicalOp, PredicateInput, PredicateSet};
use crate::primitive::{Alias, Identifier, IntoReference, Reference};

const INDENT: &str = "    ";

/// Sort direction of an ORDER BY term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl Direction {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
enum ColumnSource {
    Reference(Reference),
    Expression(Expression),
    Subquery(Box<Select>),
}

#[derive(Debug, Clone)]
struct Column {
    source: ColumnSource,
    alias: Option<Alias>,
}

#[derive(Debug, Clone)]
enum FromSource {
    Table {
        table: Identifier,
        alias: Option<Alias>,
    },
    Subquery {
        select: Box<Select>,
        alias: Alias,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combine {
    Union,
    UnionAll,
    Intersect,
}

impl Combine {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Union => "UNION",
            Self::UnionAll => "UNION ALL",
            Self::Intersect => "INTERSECT",
        }
    }
}

/// Compiled column texts, reused while every column is a plain reference.
#[derive(Debug, Default)]
struct ColumnMemo(Option<(DriverKey, Vec<String>)>);

impl Clone for ColumnMemo {
    fn clone(&self) -> Self {
        Self::default()
    }
}

/// A SELECT statement.
///
/// ```
/// use oxide_query_core::{Select, Statement};
/// use oxide_query_core::predicate::eq;
///
/// let mut select = Select::new()
///     .columns(["id", "name"])
///     .unwrap()
///     .from("user")
///     .unwrap()
///     .where_clause(eq("id", 42).unwrap())
///     .unwrap();
/// assert_eq!(
///     select.to_sql().unwrap(),
///     r#"SELECT "id", "name" FROM "user" WHERE "id" = :eq1"#
/// );
/// ```
///
/// A select can never contain itself; the borrow checker rejects it:
///
/// ```compile_fail
/// use oxide_query_core::Select;
/// use oxide_query_core::predicate::in_select;
///
/// let mut select = Select::new().from("user").unwrap();
/// select.where_mut().add(in_select("id", &select).unwrap()).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct Select {
    distinct: bool,
    columns: Vec<Column>,
    into: Option<Identifier>,
    from: Option<FromSource>,
    joins: Vec<Join>,
    where_clause: Clause,
    group_by: Vec<Reference>,
    having: Clause,
    combine: Option<(Combine, Box<Select>)>,
    order_by: Vec<(Reference, Direction)>,
    limit: Option<u64>,
    offset: Option<u64>,
    nesting: usize,
    pretty: bool,
    column_memo: ColumnMemo,
    cache: Cache,
}

impl From<&Select> for Select {
    fn from(select: &Select) -> Self {
        select.clone()
    }
}

impl Default for Select {
    fn default() -> Self {
        Self::new()
    }
}

impl Select {
    /// Creates an empty select.
    #[must_use]
    pub fn new() -> Self {
        Self {
            distinct: false,
            columns: Vec::new(),
            into: None,
            from: None,
            joins: Vec::new(),
            where_clause: Clause::where_clause(),
            group_by: Vec::new(),
            having: Clause::having(),
            combine: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            nesting: 0,
            pretty: false,
            column_memo: ColumnMemo::default(),
            cache: Cache::default(),
        }
    }

    fn touch(&mut self) {
        self.cache.invalidate();
        self.column_memo.0 = None;
    }

    /// Adds `DISTINCT`.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.touch();
        self.distinct = true;
        self
    }

    fn push_column(&mut self, source: ColumnSource, alias: Option<&str>) -> Result<()> {
        let alias = alias.map(Alias::new).transpose()?;
        self.touch();
        self.columns.push(Column { source, alias });
        Ok(())
    }

    /// Adds a column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] for an invalid name.
    pub fn column(mut self, name: impl IntoReference) -> Result<Self> {
        self.push_column(ColumnSource::Reference(name.into_reference()?), None)?;
        Ok(self)
    }

    /// Adds several columns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] for an invalid name.
    pub fn columns<I, C>(mut self, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = C>,
        C: IntoReference,
    {
        for name in names {
            self.push_column(ColumnSource::Reference(name.into_reference()?), None)?;
        }
        Ok(self)
    }

    /// Adds a column with an alias (`"name" AS "alias"`).
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid name or alias.
    pub fn column_as(mut self, name: impl IntoReference, alias: &str) -> Result<Self> {
        self.push_column(ColumnSource::Reference(name.into_reference()?), Some(alias))?;
        Ok(self)
    }

    /// Adds an expression column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAlias`] for an invalid alias.
    pub fn column_expr(mut self, expression: Expression, alias: Option<&str>) -> Result<Self> {
        self.push_column(ColumnSource::Expression(expression), alias)?;
        Ok(self)
    }

    /// Adds a scalar subquery column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAlias`] for an invalid alias.
    pub fn column_subquery(mut self, select: impl Into<Self>, alias: &str) -> Result<Self> {
        self.push_column(ColumnSource::Subquery(Box::new(select.into())), Some(alias))?;
        Ok(self)
    }

    /// Adds `INTO table`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] for an invalid name.
    pub fn into_table(mut self, table: &str) -> Result<Self> {
        let table = Identifier::new(table)?;
        self.touch();
        self.into = Some(table);
        Ok(self)
    }

    fn set_from(&mut self, source: FromSource) -> Result<()> {
        if let Some(existing) = &self.from {
            let name = match existing {
                FromSource::Table { table, .. } => String::from(table.as_str()),
                FromSource::Subquery { alias, .. } => String::from(alias.as_str()),
            };
            return Err(Error::TableAlreadySet(name));
        }
        self.touch();
        self.from = Some(source);
        self.set_nesting(self.nesting);
        Ok(())
    }

    /// Sets the table to select from.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TableAlreadySet`] if a source is already set, or an
    /// identifier error.
    pub fn from(mut self, table: &str) -> Result<Self> {
        let table = Identifier::new(table)?;
        self.set_from(FromSource::Table { table, alias: None })?;
        Ok(self)
    }

    /// Sets the table to select from, with an alias.
    ///
    /// # Errors
    ///
    /// See [`from`](Self::from).
    pub fn from_as(mut self, table: &str, alias: &str) -> Result<Self> {
        let table = Identifier::new(table)?;
        let alias = Some(Alias::new(alias)?);
        self.set_from(FromSource::Table { table, alias })?;
        Ok(self)
    }

    /// Selects from a subquery.
    ///
    /// # Errors
    ///
    /// See [`from`](Self::from).
    pub fn from_subquery(mut self, select: impl Into<Self>, alias: &str) -> Result<Self> {
        let alias = Alias::new(alias)?;
        let select = Box::new(select.into());
        self.set_from(FromSource::Subquery { select, alias })?;
        Ok(self)
    }

    /// Adds a join.
    #[must_use]
    pub fn join(mut self, join: Join) -> Self {
        self.touch();
        self.joins.push(join);
        self
    }

    /// Adds a WHERE predicate joined with AND.
    ///
    /// # Errors
    ///
    /// Returns the validation error of the input.
    pub fn where_clause(mut self, input: impl Into<PredicateInput>) -> Result<Self> {
        self.where_mut().add(input)?;
        Ok(self)
    }

    /// Adds a WHERE predicate joined with OR.
    ///
    /// # Errors
    ///
    /// Returns the validation error of the input.
    pub fn or_where(mut self, input: impl Into<PredicateInput>) -> Result<Self> {
        self.where_mut().next_operator(LogicalOp::Or).add(input)?;
        Ok(self)
    }

    /// Mutable access to the WHERE predicates.
    pub fn where_mut(&mut self) -> &mut PredicateSet {
        self.touch();
        self.where_clause.predicates_mut()
    }

    /// Adds a GROUP BY term.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] for an invalid name.
    pub fn group_by(mut self, reference: impl IntoReference) -> Result<Self> {
        let reference = reference.into_reference()?;
        self.touch();
        self.group_by.push(reference);
        Ok(self)
    }

    /// Adds a HAVING predicate joined with AND.
    ///
    /// # Errors
    ///
    /// Returns the validation error of the input.
    pub fn having(mut self, input: impl Into<PredicateInput>) -> Result<Self> {
        self.having_mut().add(input)?;
        Ok(self)
    }

    /// Mutable access to the HAVING predicates.
    pub fn having_mut(&mut self) -> &mut PredicateSet {
        self.touch();
        self.having.predicates_mut()
    }

    fn combine(mut self, kind: Combine, other: Self) -> Result<Self> {
        if let Some((existing, _)) = &self.combine {
            if *existing != kind {
                return Err(Error::CombineConflict {
                    existing: existing.as_str(),
                    requested: kind.as_str(),
                });
            }
        }
        self.touch();
        self.combine = Some((kind, Box::new(other)));
        Ok(self)
    }

    /// Appends `UNION other`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CombineConflict`] if another set operator is set.
    pub fn union(self, other: impl Into<Self>) -> Result<Self> {
        self.combine(Combine::Union, other.into())
    }

    /// Appends `UNION ALL other`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CombineConflict`] if another set operator is set.
    pub fn union_all(self, other: impl Into<Self>) -> Result<Self> {
        self.combine(Combine::UnionAll, other.into())
    }

    /// Appends `INTERSECT other`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CombineConflict`] if another set operator is set.
    pub fn intersect(self, other: impl Into<Self>) -> Result<Self> {
        self.combine(Combine::Intersect, other.into())
    }

    /// Adds an ORDER BY term.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] for an invalid name.
    pub fn order_by(mut self, reference: impl IntoReference, direction: Direction) -> Result<Self> {
        let reference = reference.into_reference()?;
        self.touch();
        self.order_by.push((reference, direction));
        Ok(self)
    }

    /// Adds ORDER BY terms from a string such as `"name DESC, id"`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] or [`Error::InvalidOperator`]
    /// for a term that is not `name [ASC|DESC]`.
    pub fn order(mut self, terms: &str) -> Result<Self> {
        let mut parsed = Vec::new();
        for term in terms.split(',') {
            let mut words = term.split_whitespace();
            let name = words.next().unwrap_or_default();
            let direction = match words.next().map(str::to_ascii_uppercase).as_deref() {
                None | Some("ASC") => Direction::Asc,
                Some("DESC") => Direction::Desc,
                Some(other) => return Err(Error::InvalidOperator(String::from(other))),
            };
            if let Some(extra) = words.next() {
                return Err(Error::InvalidOperator(String::from(extra)));
            }
            parsed.push((name.into_reference()?, direction));
        }
        self.touch();
        self.order_by.extend(parsed);
        Ok(self)
    }

    /// Sets the row limit.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.set_limit(Some(limit));
        self
    }

    /// Sets the number of rows to skip.
    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.set_offset(Some(offset));
        self
    }

    /// Changes the row limit of a built select.
    pub fn set_limit(&mut self, limit: Option<u64>) {
        self.touch();
        self.limit = limit;
    }

    /// Changes the offset of a built select.
    pub fn set_offset(&mut self, offset: Option<u64>) {
        self.touch();
        self.offset = offset;
    }

    /// Spreads FROM subqueries over indented lines.
    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.touch();
        self.pretty = pretty;
        self
    }

    /// How deep this select sits inside FROM subqueries.
    #[must_use]
    pub const fn nesting(&self) -> usize {
        self.nesting
    }

    fn set_nesting(&mut self, depth: usize) {
        self.touch();
        self.nesting = depth;
        if let Some(FromSource::Subquery { select, .. }) = &mut self.from {
            select.set_nesting(depth + 1);
        }
    }

    /// Mutable access to a join.
    pub fn join_mut(&mut self, index: usize) -> Option<&mut Join> {
        self.touch();
        self.joins.get_mut(index)
    }

    /// Mutable access to the FROM subquery, if any.
    pub fn from_subquery_mut(&mut self) -> Option<&mut Self> {
        self.touch();
        match &mut self.from {
            Some(FromSource::Subquery { select, .. }) => Some(select.as_mut()),
            _ => None,
        }
    }

    /// The FROM table name, unless selecting from a subquery.
    #[must_use]
    pub fn table(&self) -> Option<&str> {
        match &self.from {
            Some(FromSource::Table { table, .. }) => Some(table.as_str()),
            _ => None,
        }
    }

    /// The alias of the FROM source.
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        match &self.from {
            Some(FromSource::Table { alias, .. }) => alias.as_ref().map(Alias::as_str),
            Some(FromSource::Subquery { alias, .. }) => Some(alias.as_str()),
            None => None,
        }
    }

    /// The row limit.
    #[must_use]
    pub const fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    /// The offset.
    #[must_use]
    pub const fn offset_value(&self) -> Option<u64> {
        self.offset
    }

    /// Returns true if the compiled SQL is cached.
    #[must_use]
    pub const fn is_cached(&self) -> bool {
        self.cache.is_valid()
    }

    fn compile_columns(&mut self, driver: &dyn Driver, params: &mut Params) -> Result<Vec<String>> {
        let key = DriverKey::of(driver);
        if let Some((memo_key, columns)) = &self.column_memo.0 {
            if *memo_key == key {
                return Ok(columns.clone());
            }
        }

        let star = match self.alias() {
            Some(alias) => format!("{}.*", driver.quote_alias(alias)),
            None => String::from("*"),
        };
        let mut compiled = Vec::with_capacity(self.columns.len().max(1));
        let mut fixed = true;
        if self.columns.is_empty() {
            compiled.push(star.clone());
        }
        for column in &mut self.columns {
            let sql = match &mut column.source {
                ColumnSource::Reference(Reference::Identifier(identifier))
                    if identifier.is_wildcard() =>
                {
                    star.clone()
                }
                ColumnSource::Reference(reference) => reference.quoted(driver),
                ColumnSource::Expression(expression) => {
                    fixed = false;
                    expression.compile(driver, Some(params))?
                }
                ColumnSource::Subquery(select) => {
                    fixed = false;
                    format!("({})", select.compile(driver, Some(params))?)
                }
            };
            match &column.alias {
                Some(alias) => compiled.push(format!("{sql} AS {}", alias.quoted(driver))),
                None => compiled.push(sql),
            }
        }
        if fixed {
            self.column_memo.0 = Some((key, compiled.clone()));
        }
        Ok(compiled)
    }

    fn compile_from(&mut self, driver: &dyn Driver, params: &mut Params) -> Result<String> {
        let pretty = self.pretty;
        let outer = INDENT.repeat(self.nesting);
        match &mut self.from {
            None => Ok(String::new()),
            Some(FromSource::Table { table, alias }) => {
                let mut sql = format!(" FROM {}", table.quoted(driver));
                if let Some(alias) = alias {
                    sql.push(' ');
                    sql.push_str(&alias.quoted(driver));
                }
                Ok(sql)
            }
            Some(FromSource::Subquery { select, alias }) => {
                let inner = select.compile(driver, Some(params))?;
                let alias = alias.quoted(driver);
                if pretty {
                    let indent = INDENT.repeat(select.nesting());
                    Ok(format!(" FROM (\n{indent}{inner}\n{outer}) {alias}"))
                } else {
                    Ok(format!(" FROM ({inner}) {alias}"))
                }
            }
        }
    }

    fn known_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        if let Some(table) = self.table() {
            names.push(String::from(table));
        }
        if let Some(alias) = self.alias() {
            names.push(String::from(alias));
        }
        for join in &self.joins {
            names.extend(join.table_name().map(String::from));
            names.extend(join.alias_name().map(String::from));
        }
        names
    }
}

impl Cached for Select {
    const NODE: &'static str = "select";

    fn cache(&mut self) -> &mut Cache {
        &mut self.cache
    }

    fn compile_fragment(&mut self, driver: &dyn Driver, params: &mut Params) -> Result<String> {
        let paginated = self.limit.is_some() || self.offset.is_some();
        let decorator = driver.select_decorator().filter(|_| paginated);
        let (limit, offset) = if decorator.is_some() {
            (None, None)
        } else {
            (self.limit, self.offset)
        };
        let has_order_by = !self.order_by.is_empty();

        let quantifier = self.distinct.then_some("DISTINCT");
        let column_list = match driver.column_list_hook() {
            Some(hook) => hook.column_list(
                &ColumnList {
                    quantifier,
                    limit,
                    offset,
                },
                &mut |params: &mut Params| self.compile_columns(driver, params),
                params,
            )?,
            None => {
                let columns = self.compile_columns(driver, params)?.join(", ");
                match quantifier {
                    Some(quantifier) => format!("{quantifier} {columns}"),
                    None => columns,
                }
            }
        };
        let mut sql = format!("SELECT {column_list}");

        if let Some(into) = &self.into {
            sql.push_str(" INTO ");
            sql.push_str(&into.quoted(driver));
        }
        sql.push_str(&self.compile_from(driver, params)?);
        for join in &mut self.joins {
            sql.push(' ');
            sql.push_str(&join.compile(driver, Some(params))?);
        }

        let filter = self.where_clause.compile(driver, Some(params))?;
        if !filter.is_empty() {
            sql.push(' ');
            sql.push_str(&filter);
        }
        if !self.group_by.is_empty() {
            let terms: Vec<String> = self.group_by.iter().map(|r| r.quoted(driver)).collect();
            sql.push_str(" GROUP BY ");
            sql.push_str(&terms.join(", "));
        }
        let having = self.having.compile(driver, Some(params))?;
        if !having.is_empty() {
            sql.push(' ');
            sql.push_str(&having);
        }
        if let Some((kind, other)) = &mut self.combine {
            sql.push(' ');
            sql.push_str(kind.as_str());
            sql.push(' ');
            sql.push_str(&other.compile(driver, Some(params))?);
        }
        if has_order_by {
            let terms: Vec<String> = self
                .order_by
                .iter()
                .map(|(reference, direction)| format!("{} {direction}", reference.quoted(driver)))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }
        if limit.is_some() || offset.is_some() {
            let request = LimitOffset {
                limit,
                offset,
                has_order_by,
            };
            let fragment = match driver.limit_offset_hook() {
                Some(hook) => hook.limit_offset(&request, params)?,
                None if driver.supports_limit_offset() => standard_limit_offset(&request, params)?,
                None => {
                    return Err(Error::Unsupported {
                        driver: String::from(driver.name()),
                        feature: "LIMIT/OFFSET",
                    })
                }
            };
            if !fragment.is_empty() {
                sql.push(' ');
                sql.push_str(&fragment);
            }
        }

        let names = self.known_names();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let sql = requote(&sql, &names, driver);

        match decorator {
            Some(decorator) => decorator.decorate(
                DecoratedSelect {
                    sql,
                    limit: self.limit,
                    offset: self.offset,
                    has_order_by,
                },
                params,
            ),
            None => Ok(sql),
        }
    }
}

impl Element for Select {
    fn compile(&mut self, driver: &dyn Driver, params: Option<&mut Params>) -> Result<String> {
        compile_cached(self, driver, params)
    }

    fn params(&self) -> Option<&Params> {
        self.cache.params()
    }
}

impl Statement for Select {
    fn kind(&self) -> StatementKind {
        StatementKind::Select
    }
}
