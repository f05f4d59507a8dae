//! Quoting primitives: identifiers, aliases and trusted literals.

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::dialect::Driver;
use crate::element::Element;
use crate::error::{Error, Result};
use crate::params::Params;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\*|[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*(?:\.\*)?)$")
        .expect("identifier pattern compiles")
});

static ALIAS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("alias pattern compiles"));

/// A validated, possibly qualified name such as `id`, `u.id` or `u.*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Validates and wraps a name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] unless the name is `*` or a
    /// dot-separated list of `[A-Za-z_][A-Za-z0-9_]*` segments, optionally
    /// ending in `.*`.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if IDENTIFIER.is_match(&name) {
            Ok(Self(name))
        } else {
            Err(Error::InvalidIdentifier(name))
        }
    }

    /// The raw name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the bare `*` wildcard.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.0 == "*"
    }

    /// Returns true if the name contains a qualifying prefix.
    #[must_use]
    pub fn is_qualified(&self) -> bool {
        self.0.contains('.')
    }

    /// Quotes the name through the driver.
    #[must_use]
    pub fn quoted(&self, driver: &dyn Driver) -> String {
        driver.quote_identifier(&self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated alias for a table or a column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Alias(String);

impl Alias {
    /// Validates and wraps an alias.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAlias`] unless the alias matches
    /// `[A-Za-z_][A-Za-z0-9_]*`.
    pub fn new(alias: impl Into<String>) -> Result<Self> {
        let alias = alias.into();
        if ALIAS.is_match(&alias) {
            Ok(Self(alias))
        } else {
            Err(Error::InvalidAlias(alias))
        }
    }

    /// The raw alias.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Quotes the alias through the driver.
    #[must_use]
    pub fn quoted(&self, driver: &dyn Driver) -> String {
        driver.quote_alias(&self.0)
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trusted SQL text emitted verbatim.
///
/// **Warning**: Never build a literal from user input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal(Arc<str>);

impl Literal {
    /// Wraps trusted SQL text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLiteral`] for blank text.
    pub fn new(sql: impl Into<String>) -> Result<Self> {
        let sql = sql.into();
        if sql.trim().is_empty() {
            return Err(Error::InvalidLiteral(String::from("literal is empty")));
        }
        Ok(Self(Arc::from(sql)))
    }

    /// The SQL text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The left-hand side of a predicate or an ordering/grouping term.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    /// A quoted identifier.
    Identifier(Identifier),
    /// A quoted alias.
    Alias(Alias),
    /// Raw SQL.
    Literal(Literal),
}

impl Reference {
    /// Renders the reference through the driver.
    #[must_use]
    pub fn quoted(&self, driver: &dyn Driver) -> String {
        match self {
            Self::Identifier(identifier) => identifier.quoted(driver),
            Self::Alias(alias) => alias.quoted(driver),
            Self::Literal(literal) => String::from(literal.as_str()),
        }
    }
}

/// Conversion into a validated [`Reference`].
///
/// Plain strings are validated as identifiers.
pub trait IntoReference {
    /// Converts into a reference.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] when a string is not a valid
    /// identifier.
    fn into_reference(self) -> Result<Reference>;
}

impl IntoReference for &str {
    fn into_reference(self) -> Result<Reference> {
        Identifier::new(self).map(Reference::Identifier)
    }
}

impl IntoReference for String {
    fn into_reference(self) -> Result<Reference> {
        Identifier::new(self).map(Reference::Identifier)
    }
}

impl IntoReference for &String {
    fn into_reference(self) -> Result<Reference> {
        Identifier::new(self.as_str()).map(Reference::Identifier)
    }
}

impl IntoReference for Identifier {
    fn into_reference(self) -> Result<Reference> {
        Ok(Reference::Identifier(self))
    }
}

impl IntoReference for Alias {
    fn into_reference(self) -> Result<Reference> {
        Ok(Reference::Alias(self))
    }
}

impl IntoReference for Literal {
    fn into_reference(self) -> Result<Reference> {
        Ok(Reference::Literal(self))
    }
}

impl IntoReference for Reference {
    fn into_reference(self) -> Result<Reference> {
        Ok(self)
    }
}

impl Element for Reference {
    fn compile(&mut self, driver: &dyn Driver, _params: Option<&mut Params>) -> Result<String> {
        Ok(self.quoted(driver))
    }
}

impl Element for Identifier {
    fn compile(&mut self, driver: &dyn Driver, _params: Option<&mut Params>) -> Result<String> {
        Ok(self.quoted(driver))
    }
}

impl Element for Alias {
    fn compile(&mut self, driver: &dyn Driver, _params: Option<&mut Params>) -> Result<String> {
        Ok(self.quoted(driver))
    }
}

impl Element for Literal {
    fn compile(&mut self, _driver: &dyn Driver, _params: Option<&mut Params>) -> Result<String> {
        Ok(String::from(self.as_str()))
    }
}
