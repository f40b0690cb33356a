//! Tests for the function manager module

use super::*;
use indoc::indoc;
use pretty_assertions::assert_eq;
use quarry_core::{
    DataAccess, FunctionDescriptor, QuarryError, RoutineParameter, maria_profile, mysql_profile,
    postgres_profile,
};

fn net_price() -> FunctionDescriptor {
    let mut function = FunctionDescriptor::new("net_price");
    function.schema = Some("shop".into());
    function.parameters = vec![
        RoutineParameter::new("gross", "decimal").with_length("10,2"),
        // modes are not written for functions
        RoutineParameter::new("rate", "int").with_context(quarry_core::ParameterMode::Out),
    ];
    function.returns = Some("decimal".into());
    function.returns_length = Some(10);
    function.deterministic = true;
    function.data_access = DataAccess::NoSql;
    function.sql = "RETURN gross / (1 + rate / 100)".into();
    function
}

#[test]
fn test_create_function() {
    let mysql = mysql_profile();
    let sql = FunctionManager::new(&mysql)
        .build_create_function(&net_price())
        .unwrap();

    assert_eq!(
        sql,
        indoc! {"
            CREATE FUNCTION `shop`.`net_price`(`gross` DECIMAL(10,2),`rate` INT) RETURNS DECIMAL(10)
            LANGUAGE SQL
            DETERMINISTIC
            NO SQL
            SQL SECURITY DEFINER
            COMMENT ''
            RETURN gross / (1 + rate / 100)"}
    );
}

#[test]
fn test_stub_function() {
    let maria = maria_profile();
    let mut function = FunctionDescriptor::new("todo");
    function.definer = Some("`dev`@`%`".into());

    let sql = FunctionManager::new(&maria)
        .build_create_function(&function)
        .unwrap();
    assert!(sql.starts_with("CREATE DEFINER=`dev`@`%` FUNCTION `todo`() RETURNS SMALLINT\n"));
    assert!(sql.ends_with("\nBEGIN\n  RETURN 0;\nEND"));
}

#[test]
fn test_declared_return_needs_body() {
    let mysql = mysql_profile();
    let mut function = net_price();
    function.sql.clear();
    assert!(matches!(
        FunctionManager::new(&mysql).build_create_function(&function),
        Err(QuarryError::Schema(_))
    ));
}

#[test]
fn test_alter_and_drop() {
    let mysql = mysql_profile();
    let manager = FunctionManager::new(&mysql);

    let plan = manager.build_alter_function(&net_price(), "price").unwrap();
    assert_eq!(plan.steps[2].sql, "DROP FUNCTION `shop`.`price`");
    assert_eq!(plan.steps[3].purpose, "create function");

    assert!(matches!(
        FunctionManager::new(&postgres_profile()).build_drop_function(None, "f"),
        Err(QuarryError::NotSupported(_))
    ));
}

#[test]
fn test_alter_replaces_in_place_on_mariadb() {
    let maria = maria_profile();
    let plan = FunctionManager::new(&maria)
        .build_alter_function(&net_price(), "net_price")
        .unwrap();

    assert_eq!(plan.len(), 1);
    assert!(plan.steps[0].sql.starts_with("CREATE OR REPLACE FUNCTION `shop`.`net_price`("));
}
