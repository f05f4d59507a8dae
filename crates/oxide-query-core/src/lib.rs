//! # oxide-query-core
//!
//! Composable SQL statement trees compiled into dialect-specific SQL and a
//! collection of bound parameters.
//!
//! This crate provides:
//! - `SELECT`, `INSERT`, `UPDATE` and `DELETE` trees that own their
//!   clauses, predicates and subqueries
//! - Drivers describing how a database quotes names and values, with
//!   optional hooks for pagination, multi-row inserts and column lists
//! - Bound parameters with unique markers, so values never reach the SQL
//!   text
//! - A JSON grammar for building predicates from plain data
//!
//! ## Building and compiling
//!
//! ```rust
//! use oxide_query_core::predicate::eq;
//! use oxide_query_core::{Element, GenericDriver, ParamType, Select, SqlValue};
//!
//! let mut select = Select::new()
//!     .columns(["id", "name"])
//!     .unwrap()
//!     .from("user")
//!     .unwrap()
//!     .where_clause(eq("id", 42).unwrap())
//!     .unwrap();
//!
//! let sql = select.compile(&GenericDriver::ansi(), None).unwrap();
//! assert_eq!(sql, r#"SELECT "id", "name" FROM "user" WHERE "id" = :eq1"#);
//!
//! let param = select.params().unwrap().get(":eq1").unwrap();
//! assert_eq!(param.value(), &SqlValue::Int(42));
//! assert_eq!(param.param_type(), ParamType::Int);
//! ```
//!
//! ## Caching
//!
//! A compiled node keeps its SQL until it is mutated or compiled for
//! another driver. Mutating a node through its owner clears the caches on
//! the path from the root to that node and nothing else:
//!
//! ```rust
//! use oxide_query_core::{Element, GenericDriver, Select};
//!
//! let driver = GenericDriver::ansi();
//! let mut select = Select::new().from("user").unwrap();
//! select.compile(&driver, None).unwrap();
//! assert!(select.is_cached());
//!
//! select.where_mut().add("deleted_at IS NULL").unwrap();
//! assert!(!select.is_cached());
//! ```
//!
//! ## Predicates from data
//!
//! ```rust
//! use oxide_query_core::{Element, GenericDriver, PredicateSet};
//! use serde_json::json;
//!
//! let mut set = PredicateSet::from_spec(&json!([
//!     {"status": null},
//!     ["||", ["age", "between", 18, 65]],
//! ]))
//! .unwrap();
//! assert_eq!(
//!     set.compile(&GenericDriver::ansi(), None).unwrap(),
//!     r#""status" IS NULL OR "age" BETWEEN :between1 AND :between2"#
//! );
//! ```

pub mod clause;
pub mod dialect;
pub mod element;
pub mod error;
pub mod expression;
pub mod params;
pub mod predicate;
pub mod primitive;
pub mod statement;
pub mod value;

pub use clause::{Clause, ClauseKind, Join, JoinKind};
pub use dialect::{
    Connection, Driver, DriverConfig, GenericDriver, MysqlDriver, OracleDriver, SqlServerDriver,
};
pub use element::{DriverKey, Element};
pub use error::{Error, ErrorKind, Result};
pub use expression::{Expression, Substitution};
pub use params::{BoundParam, ParamKey, ParamStyle, ParamType, Params};
pub use predicate::{Operand, Predicate, PredicateInput, PredicateSet};
pub use primitive::{Alias, Identifier, IntoReference, Literal, Reference};
pub use statement::{Delete, Direction, Insert, Select, Statement, StatementKind, Update};
pub use value::{SqlValue, ToSqlValue};
