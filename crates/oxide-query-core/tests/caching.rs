//! Tests for compiled-SQL caching across mutation, drivers and clones.

mod common;
use common::*;

use oxide_query_core::predicate::{eq, in_select};
use oxide_query_core::{
    DriverConfig, Element, Error, GenericDriver, Insert, MysqlDriver, Predicate, Select,
};

fn report() -> Select {
    let sub = Select::new()
        .column("user_id")
        .unwrap()
        .from("orders")
        .unwrap()
        .where_clause(eq("paid", true).unwrap())
        .unwrap();
    Select::new()
        .from("user")
        .unwrap()
        .where_clause(in_select("id", sub).unwrap())
        .unwrap()
}

#[test]
fn test_compile_is_idempotent() {
    let mut select = report();
    let first = compile(&mut select);
    let first_params = bound(&select);
    assert!(select.is_cached());
    assert_eq!(compile(&mut select), first);
    assert_eq!(bound(&select), first_params);
}

#[test]
fn test_deep_mutation_invalidates_ancestors() {
    let mut select = report();
    compile(&mut select);

    let subquery = select
        .where_mut()
        .get_mut(0)
        .and_then(Predicate::subquery_mut)
        .unwrap();
    subquery.where_mut().add(eq("refunded", false).unwrap()).unwrap();
    assert!(!select.is_cached());
    assert_eq!(
        compile(&mut select),
        r#"SELECT * FROM "user" WHERE "id" IN (SELECT "user_id" FROM "orders" WHERE "paid" = :eq1 AND "refunded" = :eq2)"#
    );
}

#[test]
fn test_driver_switch_recompiles() {
    let mut select = report();
    let ansi_sql = compile(&mut select);
    let mysql_sql = select.compile(&MysqlDriver::new(), None).unwrap();
    assert_eq!(
        mysql_sql,
        "SELECT * FROM `user` WHERE `id` IN (SELECT `user_id` FROM `orders` WHERE `paid` = ?)"
    );
    assert_eq!(select.params().unwrap().len(), 1);
    assert_eq!(compile(&mut select), ansi_sql);
}

#[test]
fn test_clones_are_isolated() {
    let mut original = report();
    compile(&mut original);
    let mut copy = original.clone();
    assert!(!copy.is_cached());

    copy.where_mut().add("1 = 0").unwrap();
    assert!(original.is_cached());
    assert!(compile(&mut copy).ends_with(" AND 1 = 0"));
    assert!(!compile(&mut original).ends_with(" AND 1 = 0"));
}

#[test]
fn test_attaching_by_reference_copies() {
    let mut sub = Select::new().column("id").unwrap().from("a").unwrap();
    let mut outer = Select::new()
        .from("b")
        .unwrap()
        .where_clause(in_select("id", &sub).unwrap())
        .unwrap();
    sub.where_mut().add("x = 1").unwrap();
    assert_eq!(
        compile(&mut outer),
        r#"SELECT * FROM "b" WHERE "id" IN (SELECT "id" FROM "a")"#
    );
    assert_eq!(
        compile(&mut sub),
        r#"SELECT "id" FROM "a" WHERE x = 1"#
    );
}

#[test]
fn test_markers_stay_unique() {
    let mut select = Select::new()
        .from("t")
        .unwrap()
        .where_clause(eq("a", 1).unwrap())
        .unwrap()
        .where_clause(eq("b", 2).unwrap())
        .unwrap()
        .where_clause(eq("c", 3).unwrap())
        .unwrap();
    compile(&mut select);
    let markers: Vec<_> = bound(&select).into_iter().map(|(m, _, _)| m).collect();
    assert_eq!(markers, vec![":eq1", ":eq2", ":eq3"]);
}

#[test]
fn test_capabilities_are_part_of_the_cache_key() {
    let restricted = GenericDriver::from_config(DriverConfig {
        limit_offset: false,
        multi_row_insert: false,
        ..DriverConfig::default()
    });

    let mut insert = Insert::new()
        .into_table("t")
        .unwrap()
        .columns(["a"])
        .unwrap()
        .values([1])
        .unwrap()
        .values([2])
        .unwrap();
    assert_eq!(
        compile(&mut insert),
        r#"INSERT INTO "t" ("a") VALUES (:a1), (:a2)"#
    );
    assert!(matches!(
        insert.compile(&restricted, None),
        Err(Error::Unsupported {
            feature: "multi-row INSERT",
            ..
        })
    ));
    assert!(!insert.is_cached());

    let mut select = Select::new().from("t").unwrap().limit(5);
    assert_eq!(compile(&mut select), r#"SELECT * FROM "t" LIMIT :limit1"#);
    assert!(select.compile(&restricted, None).is_err());
    assert!(!select.is_cached());
}
