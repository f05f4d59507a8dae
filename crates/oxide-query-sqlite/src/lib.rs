//! # oxide-query-sqlite
//!
//! SQLite driver for `oxide-query-core` statement trees.
//!
//! # How SQLite differs from other dialects
//!
//! - **Identifier quoting**: SQLite uses double quotes (`"`) as the
//!   standard quoting style, though it also accepts backticks and square
//!   brackets. See [SQLite keywords].
//! - **Pagination**: [LIMIT] takes a negative count to mean "no limit",
//!   so an offset without a limit renders as `LIMIT -1 OFFSET ?`.
//! - **String literals**: quotes are doubled and nothing else is escaped,
//!   whatever the database encoding, so values can be inlined without a
//!   live connection.
//! - **Booleans**: SQLite has no boolean storage class; `true` and
//!   `false` are stored as `1` and `0`.
//!
//! [SQLite keywords]: https://www.sqlite.org/lang_keywords.html
//! [LIMIT]: https://www.sqlite.org/lang_select.html#limitoffset
//!
//! ## Example
//!
//! ```rust
//! use oxide_query_core::predicate::eq;
//! use oxide_query_core::{Element, Select};
//! use oxide_query_sqlite::SqliteDriver;
//!
//! let mut select = Select::new()
//!     .from("users")
//!     .unwrap()
//!     .where_clause(eq("email", "alice@example.com").unwrap())
//!     .unwrap()
//!     .offset(20);
//! let sql = select.compile(&SqliteDriver::new(), None).unwrap();
//! assert_eq!(sql, r#"SELECT * FROM "users" WHERE "email" = ? LIMIT -1 OFFSET ?"#);
//! assert_eq!(select.params().unwrap().len(), 2);
//! ```

mod driver;

pub use driver::SqliteDriver;
