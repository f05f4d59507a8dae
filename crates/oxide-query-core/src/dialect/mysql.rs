//! MySQL driver.

use std::sync::Arc;

use super::{bind_count, Connection, Driver, LimitOffset, LimitOffsetHook};
use crate::error::Result;
use crate::params::{ParamStyle, Params};

/// The largest row count MySQL accepts, used when only an offset is given.
const MAX_ROWS: &str = "18446744073709551615";

/// MySQL driver: backtick quoting and positional markers.
///
/// MySQL string escaping depends on the connection character set, so
/// string values can only be quoted with a connection attached.
#[derive(Debug, Clone, Default)]
pub struct MysqlDriver {
    connection: Option<Arc<dyn Connection>>,
}

impl MysqlDriver {
    /// Creates a driver without a connection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a connection used to quote strings.
    #[must_use]
    pub fn with_connection(mut self, connection: Arc<dyn Connection>) -> Self {
        self.connection = Some(connection);
        self
    }
}

impl Driver for MysqlDriver {
    fn name(&self) -> &str {
        "mysql"
    }

    fn identifier_quotes(&self) -> (char, char) {
        ('`', '`')
    }

    fn param_style(&self) -> ParamStyle {
        ParamStyle::Positional
    }

    fn connection(&self) -> Option<&dyn Connection> {
        self.connection.as_deref()
    }

    fn limit_offset_hook(&self) -> Option<&dyn LimitOffsetHook> {
        Some(self)
    }
}

impl LimitOffsetHook for MysqlDriver {
    fn limit_offset(&self, request: &LimitOffset, params: &mut Params) -> Result<String> {
        let limit = match request.limit {
            Some(limit) => bind_count(params, limit, "limit")?,
            None if request.offset.is_some() => String::from(MAX_ROWS),
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
