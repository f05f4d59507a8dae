//! INSERT statements.

use super::{Select, Statement, StatementKind, TableSlot};
use crate::dialect::{Driver, InsertRows};
use crate::element::{compile_cached, Cache, Cached, Element};
use crate::error::{Error, Result};
use crate::params::Params;
use crate::predicate::Operand;
use crate::primitive::Identifier;

/// An INSERT statement.
///
/// Rows are either positional, lined up with [`columns`](Self::columns),
/// or given as column/value pairs through [`row`](Self::row). A source
/// select replaces the rows entirely.
///
/// ```
/// use oxide_query_core::{Insert, Statement};
///
/// let mut insert = Insert::new()
///     .into_table("product")
///     .unwrap()
///     .row([("name", "lamp"), ("sku", "L-1")])
///     .unwrap();
/// assert_eq!(
///     insert.to_sql().unwrap(),
///     r#"INSERT INTO "product" ("name", "sku") VALUES (:name1, :sku1)"#
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct Insert {
    table: TableSlot,
    columns: Vec<Identifier>,
    rows: Vec<Vec<Operand>>,
    source: Option<Box<Select>>,
    cache: Cache,
}

impl Insert {
    /// Creates an empty insert.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the target table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TableAlreadySet`] on a second call, or an identifier
    /// error.
    pub fn into_table(mut self, table: &str) -> Result<Self> {
        self.table.set(table)?;
        self.cache.invalidate();
        Ok(self)
    }

    /// Sets the column list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] for an invalid name, or
    /// [`Error::ColumnMismatch`] if existing rows have another length.
    pub fn columns<I, S>(mut self, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = columns
            .into_iter()
            .map(Identifier::new)
            .collect::<Result<Vec<_>>>()?;
        if let Some(row) = self.rows.first() {
            if row.len() != columns.len() {
                return Err(Error::ColumnMismatch(format!(
                    "{} columns for rows of {} values",
                    columns.len(),
                    row.len()
                )));
            }
        }
        self.cache.invalidate();
        self.columns = columns;
        Ok(self)
    }

    fn push_row(&mut self, row: Vec<Operand>) -> Result<()> {
        if self.source.is_some() {
            return Err(Error::SourceConflict);
        }
        let expected = if self.columns.is_empty() {
            self.rows.first().map(Vec::len)
        } else {
            Some(self.columns.len())
        };
        if let Some(expected) = expected {
            if row.len() != expected {
                return Err(Error::ColumnMismatch(format!(
                    "expected {expected} values, got {}",
                    row.len()
                )));
            }
        }
        if row.is_empty() {
            return Err(Error::ColumnMismatch(String::from("empty row")));
        }
        self.cache.invalidate();
        self.rows.push(row);
        Ok(())
    }

    /// Appends a positional row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnMismatch`] if the row length differs from the
    /// column list (or from the first row), or [`Error::SourceConflict`]
    /// if a source select is set.
    pub fn values<I, V>(mut self, row: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Operand>,
    {
        self.push_row(row.into_iter().map(Into::into).collect())?;
        Ok(self)
    }

    /// Appends a row of column/value pairs.
    ///
    /// The first row defines the column list when none is set; later rows
    /// must name the same columns, in any order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnMismatch`] if the names differ from the
    /// column list, [`Error::SourceConflict`] if a source select is set, or
    /// an identifier error.
    pub fn row<I, K, V>(mut self, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Operand>,
    {
        let mut named: Vec<(Identifier, Operand)> = Vec::new();
        for (column, value) in pairs {
            let column = Identifier::new(column)?;
            if named.iter().any(|(existing, _)| existing == &column) {
                return Err(Error::ColumnMismatch(format!(
                    "column `{}` given twice",
                    column.as_str()
                )));
            }
            named.push((column, value.into()));
        }

        if self.columns.is_empty() && self.rows.is_empty() {
            let (columns, row): (Vec<_>, Vec<_>) = named.into_iter().unzip();
            self.push_row(row)?;
            self.columns = columns;
            return Ok(self);
        }

        if named.len() != self.columns.len() {
            return Err(Error::ColumnMismatch(format!(
                "expected columns {}",
                self.column_names().join(", ")
            )));
        }
        let mut row = Vec::with_capacity(named.len());
        for column in &self.columns {
            let position = named
                .iter()
                .position(|(name, _)| name == column)
                .ok_or_else(|| {
                    Error::ColumnMismatch(format!("missing column `{}`", column.as_str()))
                })?;
            row.push(named.swap_remove(position).1);
        }
        self.push_row(row)?;
        Ok(self)
    }

    /// Inserts the result of a select instead of explicit rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceConflict`] if rows were already added.
    pub fn select(mut self, source: impl Into<Select>) -> Result<Self> {
        if !self.rows.is_empty() {
            return Err(Error::SourceConflict);
        }
        self.cache.invalidate();
        self.source = Some(Box::new(source.into()));
        Ok(self)
    }

    /// Mutable access to the source select, if any.
    pub fn source_mut(&mut self) -> Option<&mut Select> {
        self.cache.invalidate();
        self.source.as_deref_mut()
    }

    /// The target table.
    #[must_use]
    pub fn table(&self) -> Option<&str> {
        self.table.get().map(Identifier::as_str)
    }

    /// Number of explicit rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the compiled SQL is cached.
    #[must_use]
    pub const fn is_cached(&self) -> bool {
        self.cache.is_valid()
    }

    fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Identifier::as_str).collect()
    }
}

impl Cached for Insert {
    const NODE: &'static str = "insert";

    fn cache(&mut self) -> &mut Cache {
        &mut self.cache
    }

    fn compile_fragment(&mut self, driver: &dyn Driver, params: &mut Params) -> Result<String> {
        let table = self.table.require(StatementKind::Insert)?.quoted(driver);
        let columns: Vec<String> = self.columns.iter().map(|c| c.quoted(driver)).collect();
        let column_list = if columns.is_empty() {
            String::new()
        } else {
            format!(" ({})", columns.join(", "))
        };

        if let Some(source) = &mut self.source {
            let select = source.compile(driver, Some(params))?;
            return Ok(format!("INSERT INTO {table}{column_list} {select}"));
        }
        if self.rows.is_empty() {
            return Err(Error::MissingValues {
                statement: StatementKind::Insert.as_str(),
            });
        }

        let mut rows = Vec::with_capacity(self.rows.len());
        for row in &mut self.rows {
            let mut compiled = Vec::with_capacity(row.len());
            for (index, value) in row.iter_mut().enumerate() {
                let hint = self.columns.get(index).map_or("value", Identifier::as_str);
                compiled.push(value.compile_with_hint(driver, params, hint)?);
            }
            rows.push(compiled);
        }

        if rows.len() > 1 {
            if let Some(hook) = driver.insert_rows_hook() {
                return hook.insert_rows(&InsertRows {
                    table: &table,
                    columns: &columns,
                    rows: &rows,
                });
            }
            if !driver.supports_multi_row_insert() {
                return Err(Error::Unsupported {
                    driver: String::from(driver.name()),
                    feature: "multi-row INSERT",
                });
            }
        }
        let values: Vec<String> = rows
            .iter()
            .map(|row| format!("({})", row.join(", ")))
            .collect();
        Ok(format!(
            "INSERT INTO {table}{column_list} VALUES {}",
            values.join(", ")
        ))
    }
}

impl Element for Insert {
    fn compile(&mut self, driver: &dyn Driver, params: Option<&mut Params>) -> Result<String> {
        compile_cached(self, driver, params)
    }

    fn params(&self) -> Option<&Params> {
        self.cache.params()
    }
}

impl Statement for Insert {
    fn kind(&self) -> StatementKind {
        StatementKind::Insert
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{GenericDriver, MysqlDriver, OracleDriver};
    use crate::primitive::Literal;
    use crate::value::SqlValue;

    #[test]
    fn test_insert_with_columns() {
        let mut insert = Insert::new()
            .into_table("product")
            .unwrap()
            .columns(["name", "price"])
            .unwrap()
            .values([Operand::from("lamp"), Operand::from(12)])
            .unwrap()
            .values([Operand::from("desk"), Operand::from(Literal::new("DEFAULT").unwrap())])
            .unwrap();
        assert_eq!(
            insert.compile(&GenericDriver::ansi(), None).unwrap(),
            r#"INSERT INTO "product" ("name", "price") VALUES (:name1, :price1), (:name2, DEFAULT)"#
        );
        let params = insert.params().unwrap();
        assert_eq!(params.len(), 3);
        assert_eq!(params.get(":price1").unwrap().value(), &SqlValue::Int(12));
    }

    #[test]
    fn test_insert_without_columns() {
        let mut insert = Insert::new()
            .into_table("log")
            .unwrap()
            .values([1, 2])
            .unwrap();
        assert_eq!(
            insert.compile(&GenericDriver::ansi(), None).unwrap(),
            r#"INSERT INTO "log" VALUES (:value1, :value2)"#
        );
        assert!(matches!(
            Insert::new().values([1, 2]).unwrap().values([1]),
            Err(Error::ColumnMismatch(_))
        ));
    }

    #[test]
    fn test_value_arity_must_match_columns() {
        let err = Insert::new()
            .columns(["a", "b"])
            .unwrap()
            .values([1])
            .unwrap_err();
        assert!(matches!(err, Error::ColumnMismatch(_)));
        assert!(err.is_runtime());
    }

    #[test]
    fn test_map_rows_are_reordered() {
        let mut insert = Insert::new()
            .into_table("product")
            .unwrap()
            .row([("name", "x"), ("sku", "a")])
            .unwrap()
            .row([("sku", "b"), ("name", "y")])
            .unwrap();
        assert_eq!(
            insert.compile(&GenericDriver::ansi(), None).unwrap(),
            r#"INSERT INTO "product" ("name", "sku") VALUES (:name1, :sku1), (:name2, :sku2)"#
        );
        let values: Vec<_> = insert.params().unwrap().values().cloned().collect();
        assert_eq!(
            values,
            vec![
                SqlValue::Text(String::from("x")),
                SqlValue::Text(String::from("a")),
                SqlValue::Text(String::from("y")),
                SqlValue::Text(String::from("b"))
            ]
        );
    }

    #[test]
    fn test_map_row_mismatch() {
        let first = Insert::new().into_table("product").unwrap().row([("name", "x")]).unwrap();
        assert!(matches!(
            first.clone().row([("other", "y")]),
            Err(Error::ColumnMismatch(_))
        ));
        assert!(matches!(
            first.clone().row([("name", "y"), ("other", "z")]),
            Err(Error::ColumnMismatch(_))
        ));
        assert!(matches!(
            Insert::new().row([("a", 1), ("a", 2)]),
            Err(Error::ColumnMismatch(_))
        ));
    }

    #[test]
    fn test_source_select() {
        let source = Select::new().columns(["id", "name"]).unwrap().from("staging").unwrap();
        let mut insert = Insert::new()
            .into_table("product")
            .unwrap()
            .columns(["id", "name"])
            .unwrap()
            .select(&source)
            .unwrap();
        assert_eq!(
            insert.compile(&GenericDriver::ansi(), None).unwrap(),
            r#"INSERT INTO "product" ("id", "name") SELECT "id", "name" FROM "staging""#
        );
        assert_eq!(insert.clone().values([1, 2]).unwrap_err(), Error::SourceConflict);
        assert_eq!(
            Insert::new().values([1]).unwrap().select(source).unwrap_err(),
            Error::SourceConflict
        );
    }

    #[test]
    fn test_compile_requirements() {
        let driver = GenericDriver::ansi();
        assert_eq!(
            Insert::new().values([1]).unwrap().compile(&driver, None).unwrap_err(),
            Error::MissingTable { statement: "INSERT" }
        );
        let mut empty = Insert::new().into_table("t").unwrap();
        assert_eq!(
            empty.compile(&driver, None).unwrap_err(),
            Error::MissingValues { statement: "INSERT" }
        );
        assert!(!empty.is_cached());
        assert!(matches!(
            Insert::new().into_table("a").unwrap().into_table("b"),
            Err(Error::TableAlreadySet(_))
        ));
    }

    #[test]
    fn test_multi_row_hooks() {
        let build = || {
            Insert::new()
                .into_table("t")
                .unwrap()
                .columns(["a"])
                .unwrap()
                .values([1])
                .unwrap()
                .values([2])
                .unwrap()
        };
        assert_eq!(
            build().compile(&MysqlDriver::new(), None).unwrap(),
            "INSERT INTO `t` (`a`) VALUES (?), (?)"
        );
        assert_eq!(
            build().compile(&OracleDriver::new(), None).unwrap(),
            r#"INSERT ALL INTO "t" ("a") VALUES (:a1) INTO "t" ("a") VALUES (:a2) SELECT 1 FROM DUAL"#
        );

        let driver = GenericDriver::from_config(crate::dialect::DriverConfig {
            multi_row_insert: false,
            ..crate::dialect::DriverConfig::default()
        });
        assert!(matches!(
            build().compile(&driver, None),
            Err(Error::Unsupported { feature: "multi-row INSERT", .. })
        ));
    }
}
