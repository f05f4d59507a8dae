//! DELETE statements.

use super::{requote, Statement, StatementKind, TableSlot};
use crate::clause::Clause;
use crate::dialect::Driver;
use crate::element::{compile_cached, Cache, Cached, Element};
use crate::error::{Error, Result};
use crate::params::Params;
use crate::predicate::{LogicalOp, PredicateInput, PredicateSet};
use crate::primitive::Identifier;

/// A DELETE statement. It never compiles without a WHERE clause.
#[derive(Debug, Clone)]
pub struct Delete {
    table: TableSlot,
    where_clause: Clause,
    cache: Cache,
}

impl Default for Delete {
    fn default() -> Self {
        Self::new()
    }
}

impl Delete {
    /// Creates an empty delete.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: TableSlot::default(),
            where_clause: Clause::where_clause(),
            cache: Cache::default(),
        }
    }

    /// Sets the table to delete from.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TableAlreadySet`] on a second call, or an identifier
    /// error.
    pub fn from(mut self, table: &str) -> Result<Self> {
        self.table.set(table)?;
        self.cache.invalidate();
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

impl Cached for Delete {
    const NODE: &'static str = "delete";

    fn cache(&mut self) -> &mut Cache {
        &mut self.cache
    }

    fn compile_fragment(&mut self, driver: &dyn Driver, params: &mut Params) -> Result<String> {
        let table = self.table.require(StatementKind::Delete)?;
        let name = String::from(table.as_str());
        let table = table.quoted(driver);
        let filter = self.where_clause.compile(driver, Some(params))?;
        if filter.is_empty() {
            return Err(Error::MissingWhere {
                statement: StatementKind::Delete.as_str(),
            });
        }
        Ok(requote(&format!("DELETE FROM {table} {filter}"), &[&name], driver))
    }
}

impl Element for Delete {
    fn compile(&mut self, driver: &dyn Driver, params: Option<&mut Params>) -> Result<String> {
        compile_cached(self, driver, params)
    }

    fn params(&self) -> Option<&Params> {
        self.cache.params()
    }
}

impl Statement for Delete {
    fn kind(&self) -> StatementKind {
        StatementKind::Delete
    }
}
