//! MySqlClient against a scripted server

mod common;

use common::{MockConnection, row, table_field, text};
use indoc::indoc;
use pretty_assertions::assert_eq;
use quarry_core::{
    ParameterMode, QuarryError, RawResult, SchemaIntrospection, TableKind, Value, ViewDescriptor,
    mysql_profile,
};
use quarry_driver_mysql::MySqlClient;
use quarry_query::QueryOptions;
use quarry_table_designer::TableDiff;
use std::sync::Arc;

fn client(mock: MockConnection) -> (MySqlClient, Arc<MockConnection>) {
    let mock = Arc::new(mock);
    let client = MySqlClient::new(mock.clone(), Arc::new(mysql_profile()));
    (client, mock)
}

#[tokio::test]
async fn test_structure_collects_every_listing_on_one_session() {
    let (client, mock) = client(
        MockConnection::new()
            .respond(
                "SHOW DATABASES",
                vec![
                    row(&[("Database", text("shop"))]),
                    row(&[("Database", text("mysql"))]),
                ],
            )
            .respond(
                "SHOW FUNCTION STATUS",
                vec![row(&[("Db", text("shop")), ("Name", text("total_of"))])],
            )
            .respond(
                "SHOW PROCEDURE STATUS",
                vec![
                    row(&[("Db", text("shop")), ("Name", text("archive"))]),
                    row(&[("Db", text("mysql")), ("Name", text("internal"))]),
                ],
            )
            .respond(
                "`information_schema`.`EVENTS`",
                vec![row(&[
                    ("EVENT_SCHEMA", text("shop")),
                    ("EVENT_NAME", text("purge")),
                    ("STATUS", text("ENABLED")),
                ])],
            )
            .respond(
                "SHOW TABLE STATUS FROM `shop`",
                vec![
                    row(&[
                        ("Name", text("orders")),
                        ("Engine", text("InnoDB")),
                        ("Data_length", Value::Int64(16384)),
                        ("Index_length", Value::Int64(8192)),
                    ]),
                    row(&[("Name", text("open_orders")), ("Comment", text("VIEW"))]),
                ],
            )
            .respond(
                "SHOW TRIGGERS FROM `shop`",
                vec![row(&[
                    ("Trigger", text("audit")),
                    ("Table", text("orders")),
                    ("Timing", text("AFTER")),
                    ("Event", text("UPDATE")),
                ])],
            ),
    );

    let structure = client.structure(&["shop".to_string()]).await.unwrap();

    assert_eq!(structure.len(), 1);
    let shop = &structure[0];
    assert_eq!(shop.name, "shop");
    assert_eq!(shop.size, 16384 + 8192);
    assert_eq!(shop.tables.len(), 2);
    assert_eq!(shop.tables[1].kind, TableKind::View);
    assert_eq!(shop.procedures.len(), 1);
    assert_eq!(shop.procedures[0].name, "archive");
    assert_eq!(shop.functions[0].name, "total_of");
    assert_eq!(shop.triggers[0].table, "orders");
    assert!(shop.schedulers[0].enabled);

    assert_eq!(mock.sessions(), 1);
    assert!(!mock.log().iter().any(|sql| sql.contains("FROM `mysql`")));
}

#[tokio::test]
async fn test_client_schema_limits_structure() {
    let (client, mock) = client(MockConnection::new().respond(
        "SHOW DATABASES",
        vec![
            row(&[("Database", text("shop"))]),
            row(&[("Database", text("crm"))]),
        ],
    ));
    let client = client.with_schema("crm");

    let structure = client.structure(&[]).await.unwrap();

    assert_eq!(structure.len(), 1);
    assert_eq!(structure[0].name, "crm");
    assert!(mock.log().contains(&"SHOW TABLE STATUS FROM `crm`".to_string()));
}

#[tokio::test]
async fn test_users_without_privilege_is_empty() {
    let (client, _mock) = client(MockConnection::new().fail_on("`mysql`.`user`", 1142));
    assert!(client.users().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_other_failures_propagate() {
    let (client, _mock) = client(MockConnection::new().fail_on("SHOW COLLATION", 2013));
    let err = client.collations().await.unwrap_err();
    assert_eq!(err.server_code(), Some(2013));
}

#[tokio::test]
async fn test_table_columns_prefer_declared_text() {
    let create = indoc! {"
        CREATE TABLE `orders` (
          `id` int(10) unsigned NOT NULL AUTO_INCREMENT,
          `status` varchar(20) NOT NULL DEFAULT 'new',
          PRIMARY KEY (`id`)
        ) ENGINE=InnoDB
    "};
    let catalog = |name: &str, data_type: &str, column_type: &str| {
        row(&[
            ("TABLE_SCHEMA", text("shop")),
            ("TABLE_NAME", text("orders")),
            ("COLUMN_NAME", text(name)),
            ("DATA_TYPE", text(data_type)),
            ("COLUMN_TYPE", text(column_type)),
            ("IS_NULLABLE", text("NO")),
            ("COLUMN_DEFAULT", text("new")),
        ])
    };
    let (client, mock) = client(
        MockConnection::new()
            .respond(
                "`information_schema`.`COLUMNS`",
                vec![
                    catalog("id", "int", "int(10) unsigned"),
                    catalog("status", "varchar", "varchar(20)"),
                ],
            )
            .respond(
                "SHOW CREATE TABLE",
                vec![row(&[("Table", text("orders")), ("Create Table", text(create))])],
            ),
    );

    let columns = client.table_columns("shop", "orders").await.unwrap();

    assert_eq!(columns.len(), 2);
    assert_eq!(columns[0].type_name, "INT");
    assert!(columns[0].unsigned);
    assert_eq!(columns[1].length.as_deref(), Some("20"));
    assert_eq!(columns[1].default.as_deref(), Some("'new'"));
    assert_eq!(
        mock.log()[1],
        "SHOW CREATE TABLE `shop`.`orders`".to_string()
    );
}

#[tokio::test]
async fn test_table_columns_survive_unreadable_definition() {
    let (client, _mock) = client(
        MockConnection::new()
            .respond(
                "`information_schema`.`COLUMNS`",
                vec![row(&[
                    ("COLUMN_NAME", text("id")),
                    ("DATA_TYPE", text("int")),
                    ("COLUMN_DEFAULT", text("0")),
                ])],
            )
            .fail_on("SHOW CREATE TABLE", 1142),
    );

    let columns = client.table_columns("shop", "orders").await.unwrap();
    assert_eq!(columns[0].default.as_deref(), Some("0"));
}

#[tokio::test]
async fn test_view_definition() {
    let (client, mock) = client(MockConnection::new().respond(
        "SHOW CREATE VIEW",
        vec![row(&[
            ("View", text("open_orders")),
            (
                "Create View",
                text(
                    "CREATE ALGORITHM=UNDEFINED DEFINER=`app`@`%` SQL SECURITY INVOKER \
                     VIEW `open_orders` AS select `id` from `orders` WITH CASCADED CHECK OPTION",
                ),
            ),
        ])],
    ));

    let view = client.view("shop", "open_orders").await.unwrap().unwrap();

    assert_eq!(view.schema.as_deref(), Some("shop"));
    assert_eq!(view.update_option, "CASCADED");
    assert_eq!(view.sql, "select `id` from `orders`");
    assert_eq!(mock.log(), vec!["SHOW CREATE VIEW `shop`.`open_orders`"]);
}

#[tokio::test]
async fn test_missing_view_is_none() {
    let (client, _mock) = client(MockConnection::new());
    assert!(client.view("shop", "nope").await.unwrap().is_none());
}

#[tokio::test]
async fn test_routine_reads_parameters_on_same_session() {
    let parameter = |name: &str, mode: Value, data_type: &str| {
        row(&[
            ("PARAMETER_MODE", mode),
            ("PARAMETER_NAME", text(name)),
            ("DATA_TYPE", text(data_type)),
            ("CHARACTER_MAXIMUM_LENGTH", Value::Int64(64)),
        ])
    };
    let (client, mock) = client(
        MockConnection::new()
            .respond(
                "SHOW CREATE PROCEDURE",
                vec![row(&[
                    ("Procedure", text("rename_user")),
                    (
                        "Create Procedure",
                        text(
                            "CREATE DEFINER=`root`@`localhost` PROCEDURE `rename_user`(IN id INT, OUT label VARCHAR(64))\nBEGIN\n  SELECT 1;\nEND",
                        ),
                    ),
                ])],
            )
            .respond(
                "`information_schema`.`PARAMETERS`",
                vec![
                    parameter("label", text("OUT"), "varchar"),
                    parameter("ignored", Value::Null, "int"),
                ],
            ),
    );

    let routine = client.routine("shop", "rename_user").await.unwrap().unwrap();

    assert_eq!(routine.parameters.len(), 1);
    assert_eq!(routine.parameters[0].name, "label");
    assert_eq!(routine.parameters[0].type_name, "VARCHAR");
    assert_eq!(routine.parameters[0].context, ParameterMode::Out);
    assert_eq!(routine.parameters[0].length.as_deref(), Some("64"));
    assert!(routine.sql.starts_with("BEGIN"));
    assert_eq!(mock.sessions(), 1);
}

#[tokio::test]
async fn test_alter_view_with_rename() {
    let (client, mock) = client(MockConnection::new());
    let mut view = ViewDescriptor::new("recent_orders", "SELECT * FROM orders");
    view.schema = Some("shop".into());

    client.alter_view(&view, "new_orders").await.unwrap();

    assert_eq!(
        mock.log(),
        vec![
            "ALTER ALGORITHM = UNDEFINED SQL SECURITY DEFINER VIEW `shop`.`new_orders` AS SELECT * FROM orders",
            "RENAME TABLE `shop`.`new_orders` TO `shop`.`recent_orders`",
        ]
    );
}

#[tokio::test]
async fn test_failed_object_statement_reports_step() {
    let (client, _mock) = client(MockConnection::new().fail_on("DROP VIEW", 1051));

    let err = client.drop_view("shop", "gone").await.unwrap_err();

    assert!(matches!(err, QuarryError::PlanStep { index: 1, .. }));
    assert_eq!(err.server_code(), Some(1051));
}

#[tokio::test]
async fn test_alter_table_checks_live_definition() {
    let (client, mock) = client(
        MockConnection::new()
            .respond(
                "SHOW TABLE STATUS FROM `shop`",
                vec![row(&[("Name", text("orders"))])],
            )
            .respond(
                "`information_schema`.`COLUMNS`",
                vec![
                    row(&[("COLUMN_NAME", text("id")), ("DATA_TYPE", text("int"))]),
                    row(&[("COLUMN_NAME", text("note")), ("DATA_TYPE", text("text"))]),
                ],
            ),
    );

    client
        .alter_table(&TableDiff::new("orders").in_schema("shop").drop_column("note"))
        .await
        .unwrap();
    assert!(
        mock.log()
            .last()
            .is_some_and(|sql| sql.contains("DROP COLUMN `note`"))
    );

    let err = client
        .alter_table(&TableDiff::new("orders").in_schema("shop").drop_column("ghost"))
        .await
        .unwrap_err();
    assert!(matches!(err, QuarryError::Schema(_)));
}

#[tokio::test]
async fn test_alter_missing_table_is_not_found() {
    let (client, _mock) = client(MockConnection::new());
    let err = client
        .alter_table(&TableDiff::new("ghost").in_schema("shop").drop_column("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, QuarryError::NotFound(_)));
}

#[tokio::test]
async fn test_approximate_count() {
    let (client, _mock) = client(MockConnection::new().respond(
        "AS `count`",
        vec![row(&[("count", Value::Int64(1200))])],
    ));
    assert_eq!(client.approximate_count("shop", "orders").await.unwrap(), 1200);
}

#[tokio::test]
async fn test_version_folds_variables() {
    let variable = |name: &str, value: &str| {
        row(&[("Variable_name", text(name)), ("Value", text(value))])
    };
    let (client, _mock) = client(MockConnection::new().respond(
        "LIKE '%vers%'",
        vec![
            variable("version", "8.0.36-0ubuntu0.22.04.1"),
            variable("version_comment", "(Ubuntu)"),
            variable("version_compile_os", "Linux"),
        ],
    ));

    let version = client.version().await.unwrap();
    assert_eq!(version.number, "8.0.36");
    assert_eq!(version.name, "(Ubuntu)");
    assert_eq!(version.os, "Linux");
}

#[tokio::test]
async fn test_raw_with_details_enriches_on_same_session() {
    let (client, mock) = client(
        MockConnection::new()
            .respond_raw(
                "SELECT id FROM orders",
                RawResult::Rows {
                    fields: vec![table_field("shop", "orders", "id")],
                    rows: vec![row(&[("id", Value::Int64(1))])],
                },
            )
            .respond(
                "`information_schema`.`COLUMNS`",
                vec![row(&[
                    ("TABLE_SCHEMA", text("shop")),
                    ("TABLE_NAME", text("orders")),
                    ("COLUMN_NAME", text("id")),
                    ("DATA_TYPE", text("int")),
                    ("COLUMN_KEY", text("PRI")),
                ])],
            ),
    );

    let outcome = client
        .raw("SELECT id FROM orders", &QueryOptions::new().with_details(true))
        .await
        .unwrap();

    let results = outcome.into_vec();
    let detail = results[0].fields[0].detail.as_ref().unwrap();
    assert_eq!(detail.key.as_deref(), Some("pri"));
    assert_eq!(mock.sessions(), 1);

    let log = mock.log();
    assert_eq!(log[0], "SELECT id FROM orders");
    assert!(log[1].contains("`information_schema`.`COLUMNS`"));
    assert!(log.iter().any(|sql| sql.contains("KEY_COLUMN_USAGE")));
    assert!(!log.iter().any(|sql| sql.contains("REFERENTIAL_CONSTRAINTS")));
}

#[tokio::test]
async fn test_raw_with_nest_names_columns_by_table() {
    let (client, _mock) = client(MockConnection::new().respond_raw(
        "FROM orders JOIN customers",
        RawResult::Rows {
            fields: vec![
                table_field("shop", "orders", "id"),
                table_field("shop", "customers", "id"),
            ],
            rows: vec![row(&[("id", Value::Int64(7)), ("id", Value::Int64(3))])],
        },
    ));

    let results = client
        .raw(
            "SELECT orders.id, customers.id FROM orders JOIN customers",
            &QueryOptions::new().with_nest(true),
        )
        .await
        .unwrap()
        .into_vec();

    assert_eq!(results[0].fields[1].name, "customers.id");
    assert_eq!(results[0].rows[0].get_by_name("orders.id"), Some(&Value::Int64(7)));
    assert_eq!(results[0].rows[0].get_by_name("customers.id"), Some(&Value::Int64(3)));
}
