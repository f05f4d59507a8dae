//! SQLite driver.

use oxide_query_core::dialect::{
    bind_count, quote_standard_value, Driver, LimitOffset, LimitOffsetHook,
};
use oxide_query_core::{ParamStyle, Params, Result, SqlValue};

/// SQLite driver.
///
/// Markers are positional by default since `sqlx` binds SQLite
/// parameters by index and rejects `:name` markers. SQLite escapes a
/// string the same way whatever the encoding, so strings are quoted
/// without a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqliteDriver {
    style: ParamStyle,
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SqliteDriver {
    /// Creates a driver with positional markers.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            style: ParamStyle::Positional,
        }
    }

    /// Changes the marker style.
    #[must_use]
    pub const fn with_param_style(mut self, style: ParamStyle) -> Self {
        self.style = style;
        self
    }
}

impl Driver for SqliteDriver {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn param_style(&self) -> ParamStyle {
        self.style
    }

    fn quote_value(&self, value: &SqlValue) -> Result<String> {
        match value {
            SqlValue::Text(text) => Ok(format!("'{}'", text.replace('\'', "''"))),
            SqlValue::Bool(flag) => Ok(String::from(if *flag { "1" } else { "0" })),
            other => quote_standard_value(self, other),
        }
    }

    fn limit_offset_hook(&self) -> Option<&dyn LimitOffsetHook> {
        Some(self)
    }
}

impl LimitOffsetHook for SqliteDriver {
    fn limit_offset(&self, request: &LimitOffset, params: &mut Params) -> Result<String> {
        // A negative limit means no limit.
        let limit = match request.limit {
            Some(limit) => bind_count(params, limit, "limit")?,
            None if request.offset.is_some() => String::from("-1"),
            None => return Ok(String::new()),
        };
        match request.offset {
            Some(offset) => Ok(format!(
                "LIMIT {limit} OFFSET {}",
                bind_count(params, offset, "offset")?
            )),
            None => Ok(format!("LIMIT {limit}")),
        }
    }
}
