//! Tests for statement splitting and batch execution

use super::*;
use crate::builder::QueryBuilder;
use crate::test_helpers::{FixedMetadata, MockConnection, rows};
use pretty_assertions::assert_eq;
use quarry_core::{
    DdlPlan, FieldDescriptor, FieldKind, FieldMeta, ForeignKeyDescriptor, QuarryError,
    QueryDefaults, QueryOutcome, RawResult, mysql_profile, postgres_profile,
};
use std::sync::Arc;

mod split_statements_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_simple_statements() {
        let statements = split_statements("SELECT 1; SELECT 2; SELECT 3", &mysql_profile());
        assert_eq!(statements, vec!["SELECT 1", "SELECT 2", "SELECT 3"]);
    }

    #[test]
    fn test_split_with_whitespace_and_trailing_semicolons() {
        let statements = split_statements("  SELECT 1  ;  \n  SELECT 2  ;  ;", &mysql_profile());
        assert_eq!(statements, vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn test_semicolon_inside_literal() {
        let statements = split_statements(
            "UPDATE t SET note = 'a;b' WHERE id = 1; DELETE FROM t WHERE id = 2;",
            &mysql_profile(),
        );
        assert_eq!(
            statements,
            vec![
                "UPDATE t SET note = 'a;b' WHERE id = 1",
                "DELETE FROM t WHERE id = 2"
            ]
        );
    }

    #[test]
    fn test_escaped_quotes_keep_literal_open() {
        let mysql = mysql_profile();

        let statements = split_statements(r"SELECT 'it\'s; fine'; SELECT 2", &mysql);
        assert_eq!(statements, vec![r"SELECT 'it\'s; fine'", "SELECT 2"]);

        let statements = split_statements("SELECT 'it''s; fine'; SELECT 2", &mysql);
        assert_eq!(statements, vec!["SELECT 'it''s; fine'", "SELECT 2"]);
    }

    #[test]
    fn test_backslash_is_literal_in_postgres() {
        let statements = split_statements(r"SELECT 'C:\'; SELECT 2", &postgres_profile());
        assert_eq!(statements, vec![r"SELECT 'C:\'", "SELECT 2"]);
    }

    #[test]
    fn test_quoted_identifiers() {
        let statements = split_statements("SELECT `a;b` FROM t; SELECT \"x;y\"", &mysql_profile());
        assert_eq!(statements, vec!["SELECT `a;b` FROM t", "SELECT \"x;y\""]);
    }

    #[test]
    fn test_comments_do_not_split() {
        let mysql = mysql_profile();

        let statements = split_statements(
            "SELECT 1; -- this is a comment; with semicolons\nSELECT 2",
            &mysql,
        );
        assert_eq!(statements.len(), 2);
        assert!(statements[1].contains("-- this is a comment"));
        assert!(statements[1].ends_with("SELECT 2"));

        let statements = split_statements("SELECT 1; /* a; b; c */ SELECT 2", &mysql);
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_comment_only_fragments_dropped() {
        let statements = split_statements("SELECT 1; -- trailing note\n", &mysql_profile());
        assert_eq!(statements, vec!["SELECT 1"]);
    }

    #[test]
    fn test_hash_comments_on_mysql_only() {
        let statements = split_statements(
            "SELECT 1; # it's a note\nSELECT 2; SELECT 3",
            &mysql_profile(),
        );
        assert_eq!(statements.len(), 3);
        assert_eq!(statements[1], "# it's a note\nSELECT 2");
        assert_eq!(statements[2], "SELECT 3");

        let statements = split_statements("SELECT 1 # 2; SELECT 3", &postgres_profile());
        assert_eq!(statements, vec!["SELECT 1 # 2", "SELECT 3"]);
    }

    #[test]
    fn test_double_dash_needs_space_on_mysql() {
        let statements = split_statements("SELECT 5--2; SELECT 3", &mysql_profile());
        assert_eq!(statements, vec!["SELECT 5--2", "SELECT 3"]);

        let statements = split_statements("SELECT 1;--\tnote; x\nSELECT 2", &mysql_profile());
        assert_eq!(statements.len(), 2);

        let statements = split_statements("SELECT 5--2; SELECT 3", &postgres_profile());
        assert_eq!(statements, vec!["SELECT 5--2; SELECT 3"]);
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        assert!(split_statements("", &mysql_profile()).is_empty());
        assert!(split_statements("   \n\t   ", &mysql_profile()).is_empty());
    }
}

mod strip_comments_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strip_line_and_block_comments() {
        let stripped = strip_comments(
            "SELECT 1 -- one\n, /* two */ 2 FROM t",
            &mysql_profile(),
        );
        assert_eq!(stripped, "SELECT 1 \n,   2 FROM t");
    }

    #[test]
    fn test_strip_follows_dialect_line_comments() {
        let mysql = mysql_profile();
        assert_eq!(
            strip_comments("SELECT 5--2 # it's gone\nFROM t", &mysql),
            "SELECT 5--2 \nFROM t"
        );
        assert_eq!(
            strip_comments("SELECT a # b -- c\nFROM t", &postgres_profile()),
            "SELECT a # b \nFROM t"
        );
    }

    #[test]
    fn test_comment_markers_inside_literals_survive() {
        let sql = "SELECT '-- not a comment', '/* nor this */'";
        assert_eq!(strip_comments(sql, &mysql_profile()), sql);
    }
}

mod query_options_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let options = QueryOptions::default();
        assert_eq!(options.schema, None);
        assert!(options.split);
        assert!(!options.details);
        assert!(options.comments);
    }

    #[test]
    fn test_from_configured_defaults() {
        let defaults = QueryDefaults {
            split: false,
            details: true,
            comments: false,
        };
        let options = QueryOptions::from(&defaults).with_schema("app");

        assert_eq!(options.schema.as_deref(), Some("app"));
        assert!(!options.split);
        assert!(options.details);
        assert!(!options.comments);
    }
}

mod runner_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn runner() -> QueryRunner {
        QueryRunner::new(Arc::new(mysql_profile()))
    }

    #[tokio::test]
    async fn test_single_statement_returns_single() {
        let connection = MockConnection::new().with_query_response("SELECT 1", rows("1", &[1]));

        let outcome = runner()
            .execute(&connection, "SELECT 1", &QueryOptions::default())
            .await
            .unwrap();

        match outcome {
            QueryOutcome::Single(result) => {
                assert_eq!(result.statement, "SELECT 1");
                assert_eq!(result.rows.len(), 1);
            }
            other => panic!("expected a single result, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_batch_runs_in_order_on_one_session() {
        let connection = MockConnection::new();

        let outcome = runner()
            .execute(
                &connection,
                "CREATE TABLE t (id INT); INSERT INTO t VALUES (1); SELECT * FROM t",
                &QueryOptions::default().with_schema("app"),
            )
            .await
            .unwrap();

        assert_eq!(outcome.len(), 3);
        assert_eq!(connection.sessions_acquired(), 1);
        assert_eq!(
            connection.query_log(),
            vec![
                "USE app",
                "CREATE TABLE t (id INT)",
                "INSERT INTO t VALUES (1)",
                "SELECT * FROM t",
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_batch_skips_the_server() {
        let connection = MockConnection::new();

        let outcome = runner()
            .execute(&connection, " ; -- nothing\n", &QueryOptions::default().with_schema("app"))
            .await
            .unwrap();

        assert!(matches!(outcome, QueryOutcome::Multiple(ref results) if results.is_empty()));
        assert_eq!(connection.sessions_acquired(), 0);
        assert!(connection.query_log().is_empty());
    }

    #[tokio::test]
    async fn test_unsplit_body_sent_verbatim() {
        let connection = MockConnection::new();
        let body = "CREATE PROCEDURE p() BEGIN SELECT 1; SELECT 2; END";

        let outcome = runner()
            .execute(&connection, body, &QueryOptions::default().with_split(false))
            .await
            .unwrap();

        assert_eq!(outcome.len(), 1);
        assert_eq!(connection.query_log(), vec![body]);
    }

    #[tokio::test]
    async fn test_comments_stripped_before_splitting() {
        let connection = MockConnection::new();

        runner()
            .execute(
                &connection,
                "-- setup; ignored\nSELECT 1; /* x; y */ SELECT 2",
                &QueryOptions::default().with_comments(false),
            )
            .await
            .unwrap();

        assert_eq!(connection.query_log(), vec!["SELECT 1", "SELECT 2"]);
    }

    #[tokio::test]
    async fn test_first_failure_aborts_with_statement() {
        let connection = MockConnection::new().with_failure_on("BROKEN");

        let err = runner()
            .execute(
                &connection,
                "SELECT 1; SELECT BROKEN; SELECT 3",
                &QueryOptions::default(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.statement(), Some("SELECT BROKEN"));
        assert_eq!(err.server_code(), Some(1064));
        assert_eq!(connection.query_log(), vec!["SELECT 1", "SELECT BROKEN"]);
    }

    #[tokio::test]
    async fn test_details_enrich_per_table_on_same_session() {
        let field = |name: &str, table: Option<&str>| FieldMeta {
            name: name.into(),
            alias: name.into(),
            org_name: name.into(),
            org_table: table.map(Into::into),
            type_name: "INT".into(),
            ..Default::default()
        };
        let connection = MockConnection::new().with_query_response(
            "FROM users",
            RawResult::Rows {
                fields: vec![
                    field("id", Some("users")),
                    field("team_id", Some("users")),
                    field("computed", None),
                ],
                rows: Vec::new(),
            },
        );

        let mut id = FieldDescriptor::new("id", "INT", FieldKind::Numeric).not_null();
        id.table = Some("users".into());
        let mut team = FieldDescriptor::new("team_id", "INT", FieldKind::Numeric);
        team.table = Some("users".into());
        let mut fk = ForeignKeyDescriptor::new("fk_team", "team_id", "teams", "id");
        fk.table = Some("users".into());

        let metadata = Arc::new(FixedMetadata {
            columns: vec![id, team],
            keys: vec![fk],
        });

        let outcome = runner()
            .with_metadata(metadata)
            .execute(
                &connection,
                "SELECT id, team_id, 1 AS computed FROM users",
                &QueryOptions::default().with_schema("app").with_details(true),
            )
            .await
            .unwrap();

        let result = outcome.into_vec().remove(0);
        assert_eq!(connection.sessions_acquired(), 1);
        assert_eq!(
            connection.query_log(),
            vec![
                "USE app",
                "SELECT id, team_id, 1 AS computed FROM users",
                "-- columns of app.users",
                "-- keys of app.users",
            ]
        );
        assert!(result.fields[0].detail.as_ref().is_some_and(|d| !d.nullable));
        assert_eq!(
            result.fields[1].detail.as_ref().map(|d| d.name.as_str()),
            Some("team_id")
        );
        assert_eq!(result.fields[2].detail, None);
        assert_eq!(result.keys.len(), 1);
        assert_eq!(result.keys[0].constraint, "fk_team");
    }

    #[tokio::test]
    async fn test_run_renders_builder() {
        let connection = MockConnection::new();
        let query = QueryBuilder::new()
            .schema("app")
            .from("users")
            .and_where([("id", "= 1")]);

        runner()
            .run(&connection, &query, &QueryOptions::default())
            .await
            .unwrap();

        assert_eq!(
            connection.query_log(),
            vec!["SELECT * FROM `app`.`users` WHERE id = 1"]
        );
    }

    #[tokio::test]
    async fn test_plan_respects_split_flag_and_reports_step() {
        let connection = MockConnection::new().with_failure_on("CREATE TRIGGER");
        let plan = DdlPlan::new()
            .step("DROP TRIGGER IF EXISTS `a`; DROP TRIGGER IF EXISTS `b`", true, "drop old")
            .step(
                "CREATE TRIGGER `b` BEFORE INSERT ON `t` FOR EACH ROW BEGIN SET @x = 1; END",
                false,
                "create final",
            );

        let err = runner()
            .execute_plan(&connection, &plan, Some("app"))
            .await
            .unwrap_err();

        match &err {
            QuarryError::PlanStep { index, purpose, .. } => {
                assert_eq!(*index, 2);
                assert_eq!(purpose, "create final");
            }
            other => panic!("expected a plan step error, got {:?}", other),
        }
        assert!(err.statement().is_some_and(|s| s.contains("SET @x = 1; END")));
        assert_eq!(connection.query_log().len(), 4);
        assert_eq!(connection.query_log()[1], "DROP TRIGGER IF EXISTS `a`");
    }
}
