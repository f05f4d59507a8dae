//! SQL Server driver.

use std::sync::Arc;

use super::{
    bind_count, quote_standard_value, ColumnList, ColumnListHook, CompileColumns, Connection,
    Driver, LimitOffset, LimitOffsetHook,
};
use crate::error::Result;
use crate::params::Params;
use crate::value::SqlValue;

/// SQL Server driver: bracket quoting and named markers.
///
/// A limit without an offset becomes `TOP (n)` in the column list; with an
/// offset, pagination uses `OFFSET .. ROWS FETCH NEXT .. ROWS ONLY`.
#[derive(Debug, Clone, Default)]
pub struct SqlServerDriver {
    connection: Option<Arc<dyn Connection>>,
}

impl SqlServerDriver {
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

impl Driver for SqlServerDriver {
    fn name(&self) -> &str {
        "sqlsrv"
    }

    fn identifier_quotes(&self) -> (char, char) {
        ('[', ']')
    }

    fn connection(&self) -> Option<&dyn Connection> {
        self.connection.as_deref()
    }

    fn quote_value(&self, value: &SqlValue) -> Result<String> {
        match value {
            SqlValue::Bool(b) => Ok(String::from(if *b { "1" } else { "0" })),
            other => quote_standard_value(self, other),
        }
    }

    fn limit_offset_hook(&self) -> Option<&dyn LimitOffsetHook> {
        Some(self)
    }

    fn column_list_hook(&self) -> Option<&dyn ColumnListHook> {
        Some(self)
    }
}

impl ColumnListHook for SqlServerDriver {
    fn column_list(
        &self,
        list: &ColumnList<'_>,
        columns: &mut CompileColumns<'_>,
        params: &mut Params,
    ) -> Result<String> {
        let mut sql = String::new();
        if let Some(quantifier) = list.quantifier {
            sql.push_str(quantifier);
            sql.push(' ');
        }
        if let (Some(limit), None) = (list.limit, list.offset) {
            sql.push_str("TOP (");
            sql.push_str(&bind_count(params, limit, "limit")?);
            sql.push_str(") ");
        }
        sql.push_str(&columns(params)?.join(", "));
        Ok(sql)
    }
}

impl LimitOffsetHook for SqlServerDriver {
    fn limit_offset(&self, request: &LimitOffset, params: &mut Params) -> Result<String> {
        // Without an offset the limit is already rendered as TOP.
        let Some(offset) = request.offset else {
            return Ok(String::new());
        };
        let mut sql = String::new();
        if !request.has_order_by {
            sql.push_str("ORDER BY (SELECT NULL) ");
        }
        sql.push_str("OFFSET ");
        sql.push_str(&bind_count(params, offset, "offset")?);
        sql.push_str(" ROWS");
        if let Some(limit) = request.limit {
            sql.push_str(" FETCH NEXT ");
            sql.push_str(&bind_count(params, limit, "limit")?);
            sql.push_str(" ROWS ONLY");
        }
        Ok(sql)
    }
}
