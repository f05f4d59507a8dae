//! Compiled statements executed against an in-memory SQLite database.

mod common;
use common::*;

use oxide_query_core::predicate::{eq, gt, in_list, in_select, is_null};
use oxide_query_core::{Delete, Direction, Element, Insert, Select, SqlValue, Statement, Update};
use oxide_query_sqlite::SqliteDriver;
use serde_json::json;
use sqlx::Row;

async fn seed(pool: &sqlx::SqlitePool) {
    let mut insert = Insert::new()
        .into_table("product")
        .unwrap()
        .columns(["name", "price", "stock", "category"])
        .unwrap()
        .values([
            SqlValue::Text(String::from("lamp")),
            SqlValue::Float(19.5),
            SqlValue::Int(4),
            SqlValue::Text(String::from("home")),
        ])
        .unwrap()
        .values([
            SqlValue::Text(String::from("desk")),
            SqlValue::Float(120.0),
            SqlValue::Int(0),
            SqlValue::Text(String::from("office")),
        ])
        .unwrap()
        .values([
            SqlValue::Text(String::from("it's a chair")),
            SqlValue::Null,
            SqlValue::Int(9),
            SqlValue::Null,
        ])
        .unwrap();
    assert_eq!(execute(pool, &mut insert).await, 3);
}

fn names(rows: &[sqlx::sqlite::SqliteRow]) -> Vec<String> {
    rows.iter().map(|row| row.get::<String, _>("name")).collect()
}

#[tokio::test]
async fn test_select_with_filters_and_order() {
    let pool = create_test_pool().await;
    seed(&pool).await;

    let mut select = Select::new()
        .columns(["id", "name"])
        .unwrap()
        .from("product")
        .unwrap()
        .where_clause(gt("stock", 0).unwrap())
        .unwrap()
        .order_by("name", Direction::Desc)
        .unwrap();
    let rows = fetch_all(&pool, &mut select).await;
    assert_eq!(names(&rows), vec!["lamp", "it's a chair"]);
}

#[tokio::test]
async fn test_null_aware_in_list() {
    let pool = create_test_pool().await;
    seed(&pool).await;

    let mut select = Select::new()
        .column("name")
        .unwrap()
        .from("product")
        .unwrap()
        .where_clause(in_list("category", [Some("home"), None]).unwrap())
        .unwrap()
        .order("name")
        .unwrap();
    let rows = fetch_all(&pool, &mut select).await;
    assert_eq!(names(&rows), vec!["it's a chair", "lamp"]);
}

#[tokio::test]
async fn test_spec_predicates_and_pagination() {
    let pool = create_test_pool().await;
    seed(&pool).await;

    let mut select = Select::new()
        .column("name")
        .unwrap()
        .from("product")
        .unwrap()
        .where_clause(json!([["stock", ">=", 0], ["||", {"category": null}]]))
        .unwrap()
        .order("id")
        .unwrap()
        .offset(1);
    assert_eq!(
        select.compile(&SqliteDriver::new(), None).unwrap(),
        r#"SELECT "name" FROM "product" WHERE "stock" >= ? OR "category" IS NULL ORDER BY "id" ASC LIMIT -1 OFFSET ?"#
    );
    let rows = fetch_all(&pool, &mut select).await;
    assert_eq!(names(&rows), vec!["desk", "it's a chair"]);

    select.set_offset(None);
    select.set_limit(Some(1));
    let rows = fetch_all(&pool, &mut select).await;
    assert_eq!(names(&rows), vec!["lamp"]);
}

#[tokio::test]
async fn test_update_and_delete() {
    let pool = create_test_pool().await;
    seed(&pool).await;

    let mut restock = Update::new()
        .table("product")
        .unwrap()
        .set("stock", 10)
        .unwrap()
        .set("category", "office")
        .unwrap()
        .where_clause(is_null("category").unwrap())
        .unwrap();
    assert_eq!(execute(&pool, &mut restock).await, 1);

    let office = Select::new()
        .column("id")
        .unwrap()
        .from("product")
        .unwrap()
        .where_clause(eq("category", "office").unwrap())
        .unwrap();
    let mut delete = Delete::new()
        .from("product")
        .unwrap()
        .where_clause(in_select("id", office).unwrap())
        .unwrap();
    assert_eq!(execute(&pool, &mut delete).await, 2);

    let mut remaining = Select::new().column("name").unwrap().from("product").unwrap();
    let rows = fetch_all(&pool, &mut remaining).await;
    assert_eq!(names(&rows), vec!["lamp"]);
}

#[tokio::test]
async fn test_insert_from_select() {
    let pool = create_test_pool().await;
    seed(&pool).await;

    let source = Select::new()
        .column("name")
        .unwrap()
        .from("product")
        .unwrap()
        .where_clause(eq("category", "home").unwrap())
        .unwrap();
    let mut copy = Insert::new()
        .into_table("product")
        .unwrap()
        .columns(["name"])
        .unwrap()
        .select(source)
        .unwrap();
    assert_eq!(execute(&pool, &mut copy).await, 1);

    let mut count = Select::new()
        .column(oxide_query_core::Literal::new("COUNT(*) AS total").unwrap())
        .unwrap()
        .from("product")
        .unwrap();
    let rows = fetch_all(&pool, &mut count).await;
    assert_eq!(rows[0].get::<i64, _>("total"), 4);
}

#[tokio::test]
async fn test_inline_sql_matches_bound_execution() {
    let pool = create_test_pool().await;
    seed(&pool).await;

    let mut select = Select::new()
        .column("name")
        .unwrap()
        .from("product")
        .unwrap()
        .where_clause(eq("name", "it's a chair").unwrap())
        .unwrap();
    let inline = select.to_inline_sql(&SqliteDriver::new()).unwrap();
    assert_eq!(
        inline,
        r#"SELECT "name" FROM "product" WHERE "name" = 'it''s a chair'"#
    );
    let rows = sqlx::query(&inline).fetch_all(&pool).await.unwrap();
    assert_eq!(names(&rows), names(&fetch_all(&pool, &mut select).await));
}
