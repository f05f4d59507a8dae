//! UPDATE statements.

use super::{requote, Statement, StatementKind, TableSlot};
use crate::clause::Clause;
use crate::dialect::Driver;
use crate::element::{compile_cached, Cache, Cached, Element};
use crate::error::{Error, Result};
use crate::params::Params;
use crate::predicate::{LogicalOp, Operand, PredicateInput, PredicateSet};
use crate::primitive::Identifier;

/// An UPDATE statement.
///
/// Compiling requires a table, at least one assignment and a non-empty
/// WHERE clause.
///
/// ```
/// use oxide_query_core::{Statement, Update};
/// use oxide_query_core::predicate::eq;
///
/// let mut update = Update::new()
///     .table("product")
///     .unwrap()
///     .set("price", 10)
///     .unwrap()
///     .where_clause(eq("id", 7).unwrap())
///     .unwrap();
/// assert_eq!(
///     update.to_sql().unwrap(),
///     r#"UPDATE "product" SET "price" = :price1 WHERE "id" = :eq1"#
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Update {
    table: TableSlot,
    assignments: Vec<(Identifier, Operand)>,
    where_clause: Clause,
    cache: Cache,
}

impl Default for Update {
    fn default() -> Self {
        Self::new()
    }
}

impl Update {
    /// Creates an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: TableSlot::default(),
            assignments: Vec::new(),
            where_clause: Clause::where_clause(),
            cache: Cache::default(),
        }
    }

    /// Sets the target table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TableAlreadySet`] on a second call, or an identifier
    /// error.
    pub fn table(mut self, table: &str) -> Result<Self> {
        self.table.set(table)?;
        self.cache.invalidate();
        Ok(self)
    }

    /// Assigns a value to a column; assigning the same column again
    /// replaces the earlier value in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] for an invalid column name.
    pub fn set(mut self, column: &str, value: impl Into<Operand>) -> Result<Self> {
        let column = Identifier::new(column)?;
        let value = value.into();
        self.cache.invalidate();
        match self.assignments.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = value,
            None => self.assignments.push((column, value)),
        }
        Ok(self)
    }

    /// Assigns several columns.
    ///
    /// # Errors
    ///
    /// See [`set`](Self::set).
    pub fn set_all<I, K, V>(mut self, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Operand>,
    {
        for (column, value) in pairs {
            self = self.set(column.as_ref(), value)?;
        }
        Ok(self)
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
        self.cache.invalidate();
        self.where_clause.predicates_mut()
    }

    /// The target table.
    #[must_use]
    pub fn table_name(&self) -> Option<&str> {
        self.table.get().map(Identifier::as_str)
    }

    /// Returns true if the compiled SQL is cached.
    #[must_use]
    pub const fn is_cached(&self) -> bool {
        self.cache.is_valid()
    }
}

impl Cached for Update {
    const NODE: &'static str = "update";

    fn cache(&mut self) -> &mut Cache {
        &mut self.cache
    }

    fn compile_fragment(&mut self, driver: &dyn Driver, params: &mut Params) -> Result<String> {
        let table = self.table.require(StatementKind::Update)?;
        let name = String::from(table.as_str());
        let table = table.quoted(driver);
        if self.assignments.is_empty() {
            return Err(Error::MissingValues {
                statement: StatementKind::Update.as_str(),
            });
        }
        if self.where_clause.is_empty() {
            return Err(Error::MissingWhere {
                statement: StatementKind::Update.as_str(),
            });
        }

        let mut assignments = Vec::with_capacity(self.assignments.len());
        for (column, value) in &mut self.assignments {
            let value = value.compile_with_hint(driver, params, column.as_str())?;
            assignments.push(format!("{} = {value}", column.quoted(driver)));
        }
        let filter = self.where_clause.compile(driver, Some(params))?;
        // An all-empty nested set compiles to nothing.
        if filter.is_empty() {
            return Err(Error::MissingWhere {
                statement: StatementKind::Update.as_str(),
            });
        }
        let sql = format!("UPDATE {table} SET {} {filter}", assignments.join(", "));
        Ok(requote(&sql, &[&name], driver))
    }
}

impl Element for Update {
    fn compile(&mut self, driver: &dyn Driver, params: Option<&mut Params>) -> Result<String> {
        compile_cached(self, driver, params)
    }

    fn params(&self) -> Option<&Params> {
        self.cache.params()
    }
}

impl Statement for Update {
    fn kind(&self) -> StatementKind {
        StatementKind::Update
    }
}
