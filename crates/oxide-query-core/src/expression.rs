//! SQL expressions built from a template and named substitutions.
//!
//! ```
//! use oxide_query_core::{Element, Expression, Identifier, Substitution, GenericDriver, Params};
//!
//! let mut expr = Expression::new(
//!     "COALESCE({col}, {fallback})",
//!     [
//!         ("col", Substitution::from(Identifier::new("u.nick").unwrap())),
//!         ("fallback", Substitution::from("anonymous")),
//!     ],
//! )
//! .unwrap();
//! let mut params = Params::named();
//! let sql = expr.compile(&GenericDriver::ansi(), Some(&mut params)).unwrap();
//! assert_eq!(sql, r#"COALESCE("u"."nick", :expr1)"#);
//! ```

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::dialect::Driver;
use crate::element::Element;
use crate::error::{Error, Result};
use crate::params::Params;
use crate::primitive::{Alias, Identifier, Literal};
use crate::statement::Select;
use crate::value::{SqlValue, ToSqlValue};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern compiles")
});

/// What a placeholder is replaced with.
#[derive(Debug, Clone)]
pub enum Substitution {
    /// Bound as a parameter.
    Value(SqlValue),
    /// Quoted as an identifier.
    Identifier(Identifier),
    /// Quoted as an alias.
    Alias(Alias),
    /// Inserted verbatim.
    Literal(Literal),
    /// Compiled and parenthesised.
    Select(Box<Select>),
}

impl<T: ToSqlValue> From<T> for Substitution {
    fn from(value: T) -> Self {
        Self::Value(value.to_sql_value())
    }
}

impl From<Identifier> for Substitution {
    fn from(identifier: Identifier) -> Self {
        Self::Identifier(identifier)
    }
}

impl From<Alias> for Substitution {
    fn from(alias: Alias) -> Self {
        Self::Alias(alias)
    }
}

impl From<Literal> for Substitution {
    fn from(literal: Literal) -> Self {
        Self::Literal(literal)
    }
}

impl From<Select> for Substitution {
    fn from(select: Select) -> Self {
        Self::Select(Box::new(select))
    }
}

impl From<&Select> for Substitution {
    fn from(select: &Select) -> Self {
        Self::Select(Box::new(select.clone()))
    }
}

/// A template such as `COUNT({col}) > {min}` with its substitutions.
#[derive(Debug, Clone)]
pub struct Expression {
    template: String,
    substitutions: Vec<(String, Substitution)>,
}

impl Expression {
    /// Creates an expression.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidExpression`] if the template is blank, a
    /// substitution name is not used by the template, or a placeholder has
    /// no substitution.
    pub fn new<I, K>(template: impl Into<String>, substitutions: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Substitution)>,
        K: Into<String>,
    {
        let template = template.into();
        let invalid = |message: String| Error::InvalidExpression {
            template: template.clone(),
            message,
        };
        if template.trim().is_empty() {
            return Err(invalid(String::from("template is empty")));
        }

        let placeholders: HashSet<&str> = PLACEHOLDER
            .captures_iter(&template)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect();
        let mut owned = Vec::new();
        for (name, substitution) in substitutions {
            let name = name.into();
            if !placeholders.contains(name.as_str()) {
                return Err(invalid(format!("`{name}` is not used")));
            }
            if owned.iter().any(|(existing, _)| *existing == name) {
                return Err(invalid(format!("`{name}` is given twice")));
            }
            owned.push((name, substitution));
        }
        if let Some(missing) = placeholders
            .iter()
            .find(|placeholder| !owned.iter().any(|(name, _)| name == *placeholder))
        {
            return Err(invalid(format!("`{{{missing}}}` has no substitution")));
        }

        Ok(Self {
            template,
            substitutions: owned,
        })
    }

    /// Creates an expression without placeholders.
    ///
    /// # Errors
    ///
    /// See [`Expression::new`].
    pub fn raw(template: impl Into<String>) -> Result<Self> {
        Self::new(template, std::iter::empty::<(String, Substitution)>())
    }

    /// The template text.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    fn substitution_mut(&mut self, name: &str) -> Option<&mut Substitution> {
        self.substitutions
            .iter_mut()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, substitution)| substitution)
    }

    fn render(&mut self, driver: &dyn Driver, params: &mut Params) -> Result<String> {
        let template = self.template.clone();
        let mut sql = String::with_capacity(template.len());
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(&template) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            sql.push_str(&template[last..whole.start()]);
            last = whole.end();
            let rendered = match self.substitution_mut(name.as_str()) {
                Some(Substitution::Value(value)) => {
                    params.create(value.clone(), None, Some("expr"))
                }
                Some(Substitution::Identifier(identifier)) => identifier.quoted(driver),
                Some(Substitution::Alias(alias)) => alias.quoted(driver),
                Some(Substitution::Literal(literal)) => String::from(literal.as_str()),
                Some(Substitution::Select(select)) => {
                    format!("({})", select.compile(driver, Some(params))?)
                }
                None => String::from(whole.as_str()),
            };
            sql.push_str(&rendered);
        }
        sql.push_str(&template[last..]);
        Ok(sql)
    }
}

impl Element for Expression {
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
