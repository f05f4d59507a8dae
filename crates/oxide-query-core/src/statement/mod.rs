//! Statement trees: SELECT, INSERT, UPDATE and DELETE.
//!
//! Statements are built by value, in the style of a builder, and compiled
//! on demand. Attaching a statement to another one moves it; attaching a
//! borrowed statement clones it first, so a subtree is never shared.

mod delete;
mod insert;
mod select;
mod update;

use std::fmt;

pub use delete::Delete;
pub use insert::Insert;
pub use select::{Direction, Select};
pub use update::Update;

use crate::dialect::{default_driver, Driver};
use crate::element::Element;
use crate::error::{Error, Result};
use crate::primitive::Identifier;

/// The four statement types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    /// `SELECT`.
    Select,
    /// `INSERT`.
    Insert,
    /// `UPDATE`.
    Update,
    /// `DELETE`.
    Delete,
}

impl StatementKind {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete statement.
pub trait Statement: Element {
    /// The statement type.
    fn kind(&self) -> StatementKind;

    /// Compiles with the default ANSI driver.
    ///
    /// # Errors
    ///
    /// See [`Element::compile`].
    fn to_sql(&mut self) -> Result<String> {
        self.compile(default_driver(), None)
    }

    /// Compiles with `driver` and substitutes every marker with its quoted
    /// value.
    ///
    /// The result is meant for logs and debugging.
    ///
    /// # Errors
    ///
    /// See [`Element::compile`] and [`Params::inline`](crate::Params::inline).
    fn to_inline_sql(&mut self, driver: &dyn Driver) -> Result<String> {
        let sql = self.compile(driver, None)?;
        match self.params() {
            Some(params) => params.inline(&sql, driver),
            None => Ok(sql),
        }
    }
}

/// A table name that can be set only once.
#[derive(Debug, Clone, Default)]
pub(crate) struct TableSlot(Option<Identifier>);

impl TableSlot {
    pub(crate) fn set(&mut self, name: &str) -> Result<()> {
        if let Some(existing) = &self.0 {
            return Err(Error::TableAlreadySet(String::from(existing.as_str())));
        }
        self.0 = Some(Identifier::new(name)?);
        Ok(())
    }

    pub(crate) fn get(&self) -> Option<&Identifier> {
        self.0.as_ref()
    }

    pub(crate) fn require(&self, statement: StatementKind) -> Result<&Identifier> {
        self.0.as_ref().ok_or(Error::MissingTable {
            statement: statement.as_str(),
        })
    }
}

/// Quotes bare `name.` prefixes found outside quoted regions.
///
/// Raw SQL fragments such as `ON u.id = o.user_id` refer to tables and
/// aliases the statement knows about; their prefixes are quoted so they
/// match the quoted names the statement itself emits.
pub(crate) fn requote(sql: &str, names: &[&str], driver: &dyn Driver) -> String {
    let mut names: Vec<&str> = names.iter().copied().filter(|n| !n.is_empty()).collect();
    if names.is_empty() {
        return String::from(sql);
    }
    names.sort_by_key(|name| std::cmp::Reverse(name.len()));
    let (left, right) = driver.identifier_quotes();
    let value_quote = driver.value_quote();

    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.char_indices().peekable();
    let mut previous: Option<char> = None;
    while let Some((i, c)) = chars.next() {
        if c == value_quote || c == left {
            let close = if c == value_quote { value_quote } else { right };
            out.push(c);
            for (_, inner) in chars.by_ref() {
                out.push(inner);
                if inner == close {
                    break;
                }
            }
            previous = Some(close);
            continue;
        }
        let at_boundary = previous.map_or(true, |p| {
            !(p.is_ascii_alphanumeric() || matches!(p, '_' | '.' | ':' | '$' | '@'))
        });
        if at_boundary {
            let rest = &sql[i..];
            let hit = names.iter().find(|name| {
                rest.starts_with(**name) && rest[name.len()..].starts_with('.')
            });
            if let Some(name) = hit {
                out.push_str(&driver.quote_identifier(name));
                out.push('.');
                let skip = name.len() + 1;
                while chars.peek().is_some_and(|&(j, _)| j < i + skip) {
                    chars.next();
                }
                previous = Some('.');
                continue;
            }
        }
        out.push(c);
        previous = Some(c);
    }
    out
}
