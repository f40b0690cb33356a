//! Tests for the trigger manager module

use super::*;
use indoc::indoc;
use pretty_assertions::assert_eq;
use quarry_core::{
    QuarryError, TriggerDescriptor, TriggerEvent, TriggerTiming, maria_profile, mysql_profile,
    postgres_profile,
};

fn audit_trigger() -> TriggerDescriptor {
    TriggerDescriptor {
        name: "audit_orders".into(),
        schema: Some("shop".into()),
        definer: Some("`admin`@`localhost`".into()),
        table: "orders".into(),
        timing: TriggerTiming::After,
        event: TriggerEvent::Update,
        sql: indoc! {"
            BEGIN
              INSERT INTO audit (id) VALUES (NEW.id);
            END
        "}
        .into(),
    }
}

#[test]
fn test_create_with_definer() {
    let mysql = mysql_profile();
    let sql = TriggerManager::new(&mysql)
        .build_create_trigger(&audit_trigger())
        .unwrap();

    assert_eq!(
        sql,
        indoc! {"
            CREATE DEFINER=`admin`@`localhost` TRIGGER `shop`.`audit_orders` AFTER UPDATE ON `orders` FOR EACH ROW BEGIN
              INSERT INTO audit (id) VALUES (NEW.id);
            END"}
    );
}

#[test]
fn test_alter_recreates_unsplit() {
    let mysql = mysql_profile();
    let plan = TriggerManager::new(&mysql)
        .build_alter_trigger(&audit_trigger(), "old_audit")
        .unwrap();

    assert_eq!(plan.len(), 4);
    assert!(plan.steps[0].sql.contains("TRIGGER `shop`.`quarry_audit_orders_tmp`"));
    assert!(!plan.steps[0].split);
    assert_eq!(plan.steps[1].sql, "DROP TRIGGER `shop`.`quarry_audit_orders_tmp`");
    assert_eq!(plan.steps[2].sql, "DROP TRIGGER `shop`.`old_audit`");
    assert!(plan.steps[3].sql.contains("TRIGGER `shop`.`audit_orders`"));
    assert!(!plan.steps[3].split);
}

#[test]
fn test_missing_table() {
    let mysql = mysql_profile();
    let mut trigger = audit_trigger();
    trigger.table = String::new();
    assert!(matches!(
        TriggerManager::new(&mysql).build_create_trigger(&trigger),
        Err(QuarryError::Schema(_))
    ));
}

#[test]
fn test_postgres_not_supported() {
    let pg = postgres_profile();
    let manager = TriggerManager::new(&pg);
    assert!(matches!(
        manager.build_create_trigger(&audit_trigger()),
        Err(QuarryError::NotSupported(_))
    ));
    assert!(manager.build_drop_trigger(None, "t").is_err());
}

#[test]
fn test_alter_replaces_in_place_on_mariadb() {
    let maria = maria_profile();
    let plan = TriggerManager::new(&maria)
        .build_alter_trigger(&audit_trigger(), "old_audit")
        .unwrap();

    assert_eq!(plan.len(), 2);
    assert!(plan.steps[0]
        .sql
        .starts_with("CREATE OR REPLACE DEFINER=`admin`@`localhost` TRIGGER `shop`.`audit_orders` "));
    assert_eq!(plan.steps[0].purpose, "replace trigger");
    assert_eq!(plan.steps[1].sql, "DROP TRIGGER `shop`.`old_audit`");
}
