//! Tests for SELECT compilation: columns, sources, joins, grouping,
//! set operators, ordering and pagination.

mod common;
use common::*;

use oxide_query_core::predicate::{eq, exists, gt, in_select, is_null};
use oxide_query_core::{
    Direction, Element, Expression, Identifier, Join, JoinKind, Literal, ParamType, Select, SqlValue,
    Statement, Substitution,
};

#[test]
fn test_select_with_where() {
    let mut select = Select::new()
        .columns(["id", "name"])
        .unwrap()
        .from("user")
        .unwrap()
        .where_clause(eq("id", 42).unwrap())
        .unwrap();
    assert_eq!(
        compile(&mut select),
        r#"SELECT "id", "name" FROM "user" WHERE "id" = :eq1"#
    );
    assert_eq!(
        bound(&select),
        vec![(String::from(":eq1"), SqlValue::Int(42), ParamType::Int)]
    );
}

#[test]
fn test_select_star_with_alias_and_pagination() {
    let mut select = Select::new()
        .column("*")
        .unwrap()
        .from_as("user", "u")
        .unwrap()
        .limit(10)
        .offset(5);
    assert_eq!(
        compile(&mut select),
        r#"SELECT "u".* FROM "user" "u" LIMIT :limit1 OFFSET :offset1"#
    );
    assert_eq!(
        bound(&select),
        vec![
            (String::from(":limit1"), SqlValue::Int(10), ParamType::Int),
            (String::from(":offset1"), SqlValue::Int(5), ParamType::Int),
        ]
    );
}

#[test]
fn test_select_in_subquery() {
    let products = Select::new()
        .column("id")
        .unwrap()
        .from("product")
        .unwrap()
        .where_clause(eq("active", true).unwrap())
        .unwrap();
    let mut select = Select::new()
        .from("order_item")
        .unwrap()
        .where_clause(in_select("product_id", &products).unwrap())
        .unwrap()
        .where_clause(gt("quantity", 1).unwrap())
        .unwrap();
    assert_eq!(
        compile(&mut select),
        concat!(
            r#"SELECT * FROM "order_item" WHERE "product_id" IN "#,
            r#"(SELECT "id" FROM "product" WHERE "active" = :eq1) AND "quantity" > :gt1"#
        )
    );
    let markers: Vec<_> = bound(&select).into_iter().map(|(m, _, _)| m).collect();
    assert_eq!(markers, vec![":eq1", ":gt1"]);
}

#[test]
fn test_nested_subqueries_share_marker_space() {
    let inner = Select::new()
        .column("id")
        .unwrap()
        .from("a")
        .unwrap()
        .where_clause(eq("x", 1).unwrap())
        .unwrap();
    let mut outer = Select::new()
        .from("b")
        .unwrap()
        .where_clause(eq("x", 2).unwrap())
        .unwrap()
        .where_clause(in_select("id", inner).unwrap())
        .unwrap()
        .where_clause(eq("y", 3).unwrap())
        .unwrap();
    assert_eq!(
        compile(&mut outer),
        r#"SELECT * FROM "b" WHERE "x" = :eq1 AND "id" IN (SELECT "id" FROM "a" WHERE "x" = :eq2) AND "y" = :eq3"#
    );
    let values: Vec<_> = bound(&outer).into_iter().map(|(_, v, _)| v).collect();
    assert_eq!(
        values,
        vec![SqlValue::Int(2), SqlValue::Int(1), SqlValue::Int(3)]
    );
}

#[test]
fn test_select_with_joins_and_grouping() {
    let total = Expression::new(
        "SUM({amount})",
        [("amount", Substitution::from(Identifier::new("o.amount").unwrap()))],
    )
    .unwrap();
    let mut select = Select::new()
        .column("u.name")
        .unwrap()
        .column_expr(total, Some("total"))
        .unwrap()
        .from_as("user", "u")
        .unwrap()
        .join(
            Join::new(JoinKind::Inner, "orders")
                .unwrap()
                .alias("o")
                .unwrap()
                .on("o.user_id = u.id")
                .unwrap(),
        )
        .group_by("u.name")
        .unwrap()
        .having(gt(Literal::new("SUM(o.amount)").unwrap(), 100).unwrap())
        .unwrap()
        .order_by("total", Direction::Desc)
        .unwrap();
    assert_eq!(
        compile(&mut select),
        concat!(
            r#"SELECT "u"."name", SUM("o"."amount") AS "total" FROM "user" "u" "#,
            r#"INNER JOIN "orders" "o" ON "o".user_id = "u".id "#,
            r#"GROUP BY "u"."name" HAVING SUM("o".amount) > :gt1 ORDER BY "total" DESC"#
        )
    );
}

#[test]
fn test_select_with_subquery_column_and_exists() {
    let count = Select::new()
        .column(Literal::new("COUNT(*)").unwrap())
        .unwrap()
        .from("orders")
        .unwrap()
        .where_clause("orders.user_id = user.id")
        .unwrap();
    let archived = Select::new()
        .column(Literal::new("1").unwrap())
        .unwrap()
        .from("archive")
        .unwrap()
        .where_clause(is_null("archive.deleted_at").unwrap())
        .unwrap();
    let mut select = Select::new()
        .column("id")
        .unwrap()
        .column_subquery(count, "order_count")
        .unwrap()
        .from("user")
        .unwrap()
        .where_clause(exists(archived))
        .unwrap();
    assert_eq!(
        compile(&mut select),
        concat!(
            r#"SELECT "id", (SELECT COUNT(*) FROM "orders" WHERE "orders".user_id = "user".id) "#,
            r#"AS "order_count" FROM "user" WHERE EXISTS "#,
            r#"(SELECT 1 FROM "archive" WHERE "archive"."deleted_at" IS NULL)"#
        )
    );
    assert!(!select.has_params());
}

#[test]
fn test_select_union_and_into() {
    let archived = Select::new().column("id").unwrap().from("old_user").unwrap();
    let mut select = Select::new()
        .column("id")
        .unwrap()
        .from("user")
        .unwrap()
        .union(archived)
        .unwrap();
    assert_eq!(
        select.to_sql().unwrap(),
        r#"SELECT "id" FROM "user" UNION SELECT "id" FROM "old_user""#
    );

    let mut copy = Select::new()
        .into_table("user_backup")
        .unwrap()
        .from("user")
        .unwrap();
    assert_eq!(
        copy.to_sql().unwrap(),
        r#"SELECT * INTO "user_backup" FROM "user""#
    );
}

#[test]
fn test_select_from_pretty_subquery() {
    let inner = Select::new()
        .from_subquery(Select::new().from("event").unwrap(), "e")
        .unwrap()
        .pretty(true);
    let mut outer = Select::new()
        .from_subquery(inner, "x")
        .unwrap()
        .pretty(true);
    assert_eq!(
        compile(&mut outer),
        concat!(
            "SELECT \"x\".* FROM (\n",
            "    SELECT \"e\".* FROM (\n",
            "        SELECT * FROM \"event\"\n",
            "    ) \"e\"\n",
            ") \"x\""
        )
    );
}

#[test]
fn test_inline_sql_for_logging() {
    let driver = ansi().with_connection(std::sync::Arc::new(AnsiConnection));
    let mut select = Select::new()
        .from("user")
        .unwrap()
        .where_clause(eq("name", "O'Brien").unwrap())
        .unwrap()
        .where_clause(eq("age", 40).unwrap())
        .unwrap();
    assert_eq!(
        select.to_inline_sql(&driver).unwrap(),
        r#"SELECT * FROM "user" WHERE "name" = 'O''Brien' AND "age" = 40"#
    );
    assert!(matches!(
        select.to_inline_sql(&ansi()),
        Err(oxide_query_core::Error::NoConnection(_))
    ));
}
