//! Oracle driver.
//!
//! Oracle (before 12c) has neither `LIMIT` nor multi-row `VALUES`, so
//! pagination wraps the statement in `ROWNUM` filters and multi-row
//! inserts use `INSERT ALL`.

use std::sync::Arc;

use super::{
    bind_count, quote_standard_value, Connection, DecoratedSelect, Driver, InsertRows,
    InsertRowsHook, SelectDecorator,
};
use crate::error::Result;
use crate::params::Params;
use crate::value::SqlValue;

/// Oracle driver: double-quoted identifiers and named markers.
#[derive(Debug, Clone, Default)]
pub struct OracleDriver {
    connection: Option<Arc<dyn Connection>>,
}

impl OracleDriver {
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

impl Driver for OracleDriver {
    fn name(&self) -> &str {
        "oracle"
    }

    fn connection(&self) -> Option<&dyn Connection> {
        self.connection.as_deref()
    }

    fn supports_limit_offset(&self) -> bool {
        false
    }

    fn supports_multi_row_insert(&self) -> bool {
        false
    }

    // No boolean literals in Oracle SQL.
    fn quote_value(&self, value: &SqlValue) -> Result<String> {
        match value {
            SqlValue::Bool(b) => Ok(String::from(if *b { "1" } else { "0" })),
            other => quote_standard_value(self, other),
        }
    }

    fn insert_rows_hook(&self) -> Option<&dyn InsertRowsHook> {
        Some(self)
    }

    fn select_decorator(&self) -> Option<&dyn SelectDecorator> {
        Some(self)
    }
}

impl SelectDecorator for OracleDriver {
    fn decorate(&self, select: DecoratedSelect, params: &mut Params) -> Result<String> {
        let inner = select.sql;
        match (select.limit, select.offset) {
            (None, None) => Ok(inner),
            (Some(limit), None) => {
                let limit = bind_count(params, limit, "limit")?;
                Ok(format!("SELECT * FROM ({inner}) WHERE ROWNUM <= {limit}"))
            }
            (Some(limit), Some(offset)) => {
                let upper = bind_count(params, offset.saturating_add(limit), "limit")?;
                let lower = bind_count(params, offset, "offset")?;
                Ok(format!(
                    "SELECT * FROM (SELECT b.*, ROWNUM b_rownum FROM ({inner}) b WHERE ROWNUM <= {upper}) WHERE b_rownum > {lower}"
                ))
            }
            (None, Some(offset)) => {
                let lower = bind_count(params, offset, "offset")?;
                Ok(format!(
                    "SELECT * FROM (SELECT b.*, ROWNUM b_rownum FROM ({inner}) b) WHERE b_rownum > {lower}"
                ))
            }
        }
    }
}

impl InsertRowsHook for OracleDriver {
    fn insert_rows(&self, insert: &InsertRows<'_>) -> Result<String> {
        let columns = if insert.columns.is_empty() {
            String::new()
        } else {
            format!(" ({})", insert.columns.join(", "))
        };
        if let [row] = insert.rows {
            return Ok(format!(
                "INSERT INTO {}{columns} VALUES ({})",
                insert.table,
                row.join(", ")
            ));
        }
        let mut sql = String::from("INSERT ALL");
        for row in insert.rows {
            sql.push_str(&format!(
                " INTO {}{columns} VALUES ({})",
                insert.table,
                row.join(", ")
            ));
        }
        sql.push_str(" SELECT 1 FROM DUAL");
        Ok(sql)
    }
}
