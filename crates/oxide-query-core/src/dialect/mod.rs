//! SQL driver support.
//!
//! Different databases quote names differently, bind parameters
//! differently and disagree on a few statement shapes. A [`Driver`]
//! captures the quoting rules and may expose optional hooks that replace
//! a default compilation algorithm for one concern:
//!
//! - [`LimitOffsetHook`]: custom LIMIT/OFFSET syntax.
//! - [`InsertRowsHook`]: custom multi-row INSERT syntax.
//! - [`ColumnListHook`]: custom SELECT column-list rendering.
//! - [`SelectDecorator`]: whole-statement rewriting, for engines that
//!   paginate through pseudo-columns.

mod generic;
mod mysql;
mod oracle;
mod sqlserver;

use std::fmt;
use std::fmt::Write as _;
use std::sync::LazyLock;

pub use generic::{DriverConfig, GenericDriver};
pub use mysql::MysqlDriver;
pub use oracle::OracleDriver;
pub use sqlserver::SqlServerDriver;

use crate::error::{Error, Result};
use crate::params::{ParamStyle, ParamType, Params};
use crate::value::SqlValue;

/// A live database handle, used only to quote string values.
///
/// String escaping depends on connection state (character set, server
/// flags) for some engines, so drivers refuse to quote strings without one.
pub trait Connection: fmt::Debug + Send + Sync {
    /// Returns `raw` as a complete, quoted string literal.
    fn quote_string(&self, raw: &str) -> String;
}

/// Trait for dialect-specific quoting and compilation behavior.
pub trait Driver {
    /// Returns the name of the driver.
    fn name(&self) -> &str;

    /// Returns the opening and closing identifier quote characters.
    fn identifier_quotes(&self) -> (char, char) {
        ('"', '"')
    }

    /// Returns the string value quote character.
    fn value_quote(&self) -> char {
        '\''
    }

    /// Returns the marker style used for bound parameters.
    fn param_style(&self) -> ParamStyle {
        ParamStyle::Named
    }

    /// Returns the live connection used for string quoting, if any.
    fn connection(&self) -> Option<&dyn Connection> {
        None
    }

    /// Returns whether the default LIMIT/OFFSET syntax is understood.
    fn supports_limit_offset(&self) -> bool {
        true
    }

    /// Returns whether `VALUES (...), (...)` is understood.
    fn supports_multi_row_insert(&self) -> bool {
        true
    }

    /// Quotes a possibly qualified identifier.
    ///
    /// `*` is left alone, every dot-separated segment is quoted on its own,
    /// `*` segments stay bare and segments that are already quoted are
    /// kept as they are.
    fn quote_identifier(&self, name: &str) -> String {
        let (left, right) = self.identifier_quotes();
        split_segments(name, left, right)
            .into_iter()
            .map(|segment| {
                if segment == "*" || is_quoted(segment, left, right) {
                    String::from(segment)
                } else {
                    quote_segment(segment, left, right)
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Quotes an alias as a single name.
    fn quote_alias(&self, alias: &str) -> String {
        let (left, right) = self.identifier_quotes();
        if is_quoted(alias, left, right) {
            String::from(alias)
        } else {
            quote_segment(alias, left, right)
        }
    }

    /// Renders a value as a SQL literal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoConnection`] for strings when the driver has no
    /// connection, and [`Error::InvalidValue`] for non-finite floats.
    fn quote_value(&self, value: &SqlValue) -> Result<String> {
        quote_standard_value(self, value)
    }

    /// Strips identifier quotes from every segment.
    fn unquote(&self, text: &str) -> String {
        let (left, right) = self.identifier_quotes();
        let doubled = format!("{right}{right}");
        split_segments(text, left, right)
            .into_iter()
            .map(|segment| {
                if is_quoted(segment, left, right) {
                    let inner = &segment[left.len_utf8()..segment.len() - right.len_utf8()];
                    inner.replace(&doubled, &right.to_string())
                } else {
                    String::from(segment)
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Custom LIMIT/OFFSET rendering.
    fn limit_offset_hook(&self) -> Option<&dyn LimitOffsetHook> {
        None
    }

    /// Custom multi-row INSERT rendering.
    fn insert_rows_hook(&self) -> Option<&dyn InsertRowsHook> {
        None
    }

    /// Custom SELECT column-list rendering.
    fn column_list_hook(&self) -> Option<&dyn ColumnListHook> {
        None
    }

    /// Whole-statement SELECT rewriting.
    fn select_decorator(&self) -> Option<&dyn SelectDecorator> {
        None
    }
}

/// LIMIT/OFFSET request handed to a [`LimitOffsetHook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitOffset {
    /// Maximum number of rows.
    pub limit: Option<u64>,
    /// Number of rows to skip.
    pub offset: Option<u64>,
    /// Whether the statement already has an ORDER BY clause.
    pub has_order_by: bool,
}

/// Replaces the default LIMIT/OFFSET algorithm.
pub trait LimitOffsetHook {
    /// Renders the trailing pagination fragment, or an empty string.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be expressed.
    fn limit_offset(&self, request: &LimitOffset, params: &mut Params) -> Result<String>;
}

/// A compiled INSERT handed to an [`InsertRowsHook`].
#[derive(Debug, Clone, Copy)]
pub struct InsertRows<'a> {
    /// Quoted table name.
    pub table: &'a str,
    /// Quoted column names (may be empty).
    pub columns: &'a [String],
    /// Compiled values, row by row.
    pub rows: &'a [Vec<String>],
}

/// Replaces the default `VALUES (...), (...)` algorithm.
pub trait InsertRowsHook {
    /// Renders the whole INSERT statement.
    ///
    /// # Errors
    ///
    /// Returns an error if the rows cannot be expressed.
    fn insert_rows(&self, insert: &InsertRows<'_>) -> Result<String>;
}

/// The parts of a SELECT column list handed to a [`ColumnListHook`].
#[derive(Debug, Clone, Copy)]
pub struct ColumnList<'a> {
    /// `DISTINCT` or `ALL`, when set.
    pub quantifier: Option<&'a str>,
    /// The statement's row limit.
    pub limit: Option<u64>,
    /// The statement's row offset.
    pub offset: Option<u64>,
}

/// Compiles the statement's columns, aliases included, into a collector.
pub type CompileColumns<'a> = dyn FnMut(&mut Params) -> Result<Vec<String>> + 'a;

/// Replaces the default column-list rendering of SELECT.
pub trait ColumnListHook {
    /// Renders everything between `SELECT ` and the rest of the statement.
    ///
    /// `columns` binds the parameters of the columns themselves, so it must
    /// be called at the point the columns appear in the returned text.
    ///
    /// # Errors
    ///
    /// Returns an error if the column list cannot be expressed.
    fn column_list(
        &self,
        list: &ColumnList<'_>,
        columns: &mut CompileColumns<'_>,
        params: &mut Params,
    ) -> Result<String>;
}

/// A SELECT compiled without LIMIT/OFFSET, handed to a [`SelectDecorator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratedSelect {
    /// The statement without its pagination.
    pub sql: String,
    /// Maximum number of rows.
    pub limit: Option<u64>,
    /// Number of rows to skip.
    pub offset: Option<u64>,
    /// Whether the statement has an ORDER BY clause.
    pub has_order_by: bool,
}

/// Rewrites a whole SELECT statement.
pub trait SelectDecorator {
    /// Returns the final statement.
    ///
    /// # Errors
    ///
    /// Returns an error if the rewrite is impossible.
    fn decorate(&self, select: DecoratedSelect, params: &mut Params) -> Result<String>;
}

/// Returns the process-wide ANSI driver.
pub fn default_driver() -> &'static GenericDriver {
    static ANSI: LazyLock<GenericDriver> = LazyLock::new(GenericDriver::ansi);
    &ANSI
}

/// Binds a row count as an integer parameter and returns its marker.
///
/// # Errors
///
/// Returns [`Error::InvalidValue`] for counts beyond `i64::MAX`.
pub fn bind_count(params: &mut Params, count: u64, hint: &str) -> Result<String> {
    let count = i64::try_from(count)
        .map_err(|_| Error::InvalidValue(format!("row count {count} is out of range")))?;
    Ok(params.create(SqlValue::Int(count), Some(ParamType::Int), Some(hint)))
}

/// The default LIMIT/OFFSET algorithm.
pub(crate) fn standard_limit_offset(request: &LimitOffset, params: &mut Params) -> Result<String> {
    let mut parts = Vec::new();
    if let Some(limit) = request.limit {
        parts.push(format!("LIMIT {}", bind_count(params, limit, "limit")?));
    }
    if let Some(offset) = request.offset {
        parts.push(format!("OFFSET {}", bind_count(params, offset, "offset")?));
    }
    Ok(parts.join(" "))
}

/// The value quoting shared by every driver.
///
/// # Errors
///
/// See [`Driver::quote_value`].
pub fn quote_standard_value<D: Driver + ?Sized>(driver: &D, value: &SqlValue) -> Result<String> {
    match value {
        SqlValue::Null => Ok(String::from("NULL")),
        SqlValue::Bool(true) => Ok(String::from("TRUE")),
        SqlValue::Bool(false) => Ok(String::from("FALSE")),
        SqlValue::Int(n) => Ok(n.to_string()),
        // Rust float formatting ignores the host locale.
        SqlValue::Float(f) if f.is_finite() => Ok(f.to_string()),
        SqlValue::Float(f) => Err(Error::InvalidValue(format!("{f} has no SQL literal"))),
        SqlValue::Text(s) => driver
            .connection()
            .map(|connection| connection.quote_string(s))
            .ok_or_else(|| Error::NoConnection(String::from(driver.name()))),
        SqlValue::Blob(bytes) => {
            let mut hex = String::with_capacity(bytes.len() * 2 + 3);
            hex.push_str("X'");
            for byte in bytes {
                let _ = write!(hex, "{byte:02X}");
            }
            hex.push('\'');
            Ok(hex)
        }
    }
}

fn is_quoted(text: &str, left: char, right: char) -> bool {
    text.chars().count() >= 2 && text.starts_with(left) && text.ends_with(right)
}

fn quote_segment(segment: &str, left: char, right: char) -> String {
    let escaped = segment.replace(right, &format!("{right}{right}"));
    format!("{left}{escaped}{right}")
}

/// Splits on dots that are not inside quotes.
fn split_segments(name: &str, left: char, right: char) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    for (i, c) in name.char_indices() {
        if quoted {
            if c == right {
                quoted = false;
            }
        } else if c == left && i == start {
            quoted = true;
        } else if c == '.' {
            segments.push(&name[start..i]);
            start = i + 1;
        }
    }
    segments.push(&name[start..]);
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Doubling;

    impl Connection for Doubling {
        fn quote_string(&self, raw: &str) -> String {
            format!("'{}'", raw.replace('\'', "''"))
        }
    }

    #[test]
    fn test_quote_identifier() {
        let driver = GenericDriver::ansi();
        assert_eq!(driver.quote_identifier("*"), "*");
        assert_eq!(driver.quote_identifier("id"), r#""id""#);
        assert_eq!(driver.quote_identifier("u.id"), r#""u"."id""#);
        assert_eq!(driver.quote_identifier("u.*"), r#""u".*"#);
        assert_eq!(driver.quote_identifier(r#""u"."id""#), r#""u"."id""#);
        assert_eq!(driver.quote_identifier(r#""a.b""#), r#""a.b""#);
        assert_eq!(driver.quote_identifier(r#"we"ird"#), r#""we""ird""#);
    }

    #[test]
    fn test_quote_identifier_brackets() {
        let driver = SqlServerDriver::new();
        assert_eq!(driver.quote_identifier("dbo.user"), "[dbo].[user]");
        assert_eq!(driver.quote_identifier("[dbo].[user]"), "[dbo].[user]");
        assert_eq!(driver.quote_alias("a]b"), "[a]]b]");
    }

    #[test]
    fn test_unquote() {
        let driver = GenericDriver::ansi();
        assert_eq!(driver.unquote(r#""u"."id""#), "u.id");
        assert_eq!(driver.unquote(r#""we""ird""#), r#"we"ird"#);
        assert_eq!(driver.unquote("plain"), "plain");
        assert_eq!(driver.unquote(&driver.quote_identifier("s.t.c")), "s.t.c");
    }

    #[test]
    fn test_quote_value_scalars() {
        let driver = GenericDriver::ansi();
        assert_eq!(driver.quote_value(&SqlValue::Null).unwrap(), "NULL");
        assert_eq!(driver.quote_value(&SqlValue::Bool(true)).unwrap(), "TRUE");
        assert_eq!(driver.quote_value(&SqlValue::Bool(false)).unwrap(), "FALSE");
        assert_eq!(driver.quote_value(&SqlValue::Int(-3)).unwrap(), "-3");
        assert_eq!(driver.quote_value(&SqlValue::Float(1.25)).unwrap(), "1.25");
        assert_eq!(driver.quote_value(&SqlValue::Float(1e21)).unwrap(), "1000000000000000000000");
        assert_eq!(
            driver.quote_value(&SqlValue::Blob(vec![0x48, 0x49])).unwrap(),
            "X'4849'"
        );
        assert!(driver.quote_value(&SqlValue::Float(f64::NAN)).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_quote_string_requires_connection() {
        let value = SqlValue::Text(String::from("O'Brien"));
        let err = GenericDriver::ansi().quote_value(&value).unwrap_err();
        assert_eq!(err, Error::NoConnection(String::from("ansi")));

        let driver = GenericDriver::ansi().with_connection(std::sync::Arc::new(Doubling));
        assert_eq!(driver.quote_value(&value).unwrap(), "'O''Brien'");
    }

    #[test]
    fn test_bind_count_range() {
        let mut params = Params::named();
        assert_eq!(bind_count(&mut params, 10, "limit").unwrap(), ":limit1");
        assert_eq!(params.get(":limit1").unwrap().param_type(), ParamType::Int);
        assert!(bind_count(&mut params, u64::MAX, "limit").is_err());
    }

    #[test]
    fn test_standard_limit_offset() {
        let mut params = Params::named();
        let request = LimitOffset {
            limit: Some(10),
            offset: Some(5),
            has_order_by: false,
        };
        assert_eq!(
            standard_limit_offset(&request, &mut params).unwrap(),
            "LIMIT :limit1 OFFSET :offset1"
        );
        let request = LimitOffset {
            limit: None,
            offset: Some(5),
            has_order_by: false,
        };
        assert_eq!(
            standard_limit_offset(&request, &mut params).unwrap(),
            "OFFSET :offset2"
        );
    }

    #[test]
    fn test_default_driver_is_shared() {
        assert!(std::ptr::eq(default_driver(), default_driver()));
        assert_eq!(default_driver().name(), "ansi");
    }
}
