#![allow(dead_code)]

use oxide_query_core::{Element, Params, SqlValue};
use oxide_query_sqlite::SqliteDriver;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Sqlite;

const SCHEMA: &str = "CREATE TABLE product (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    price REAL,
    stock INTEGER NOT NULL DEFAULT 0,
    category TEXT
)";

pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .expect("Failed to create in-memory SQLite pool");
    sqlx::query(SCHEMA)
        .execute(&pool)
        .await
        .expect("Failed to create schema");
    pool
}

/// Binds every parameter in order.
pub fn bind<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: Option<&Params>,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in params.into_iter().flat_map(Params::values) {
        query = match value.clone() {
            SqlValue::Null => query.bind(None::<i64>),
            SqlValue::Bool(flag) => query.bind(flag),
            SqlValue::Int(n) => query.bind(n),
            SqlValue::Float(f) => query.bind(f),
            SqlValue::Text(text) => query.bind(text),
            SqlValue::Blob(bytes) => query.bind(bytes),
        };
    }
    query
}

/// Compiles for SQLite, binds and executes; returns the affected row count.
pub async fn execute(pool: &SqlitePool, statement: &mut impl Element) -> u64 {
    let sql = statement
        .compile(&SqliteDriver::new(), None)
        .unwrap_or_else(|e| panic!("Failed to compile: {e}"));
    bind(sqlx::query(&sql), statement.params())
        .execute(pool)
        .await
        .unwrap_or_else(|e| panic!("Failed to execute: {sql}\nError: {e}"))
        .rows_affected()
}

/// Compiles for SQLite, binds and fetches every row.
pub async fn fetch_all(pool: &SqlitePool, statement: &mut impl Element) -> Vec<SqliteRow> {
    let sql = statement
        .compile(&SqliteDriver::new(), None)
        .unwrap_or_else(|e| panic!("Failed to compile: {e}"));
    bind(sqlx::query(&sql), statement.params())
        .fetch_all(pool)
        .await
        .unwrap_or_else(|e| panic!("Failed to fetch: {sql}\nError: {e}"))
}
