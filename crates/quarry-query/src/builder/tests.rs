//! Tests for the query builder and renderer

use super::*;
use pretty_assertions::assert_eq;
use quarry_core::{QuarryError, mysql_profile, postgres_profile};

mod reducer_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pairs_flatten_in_place() {
        let fragments = vec![
            Fragment::raw("a = 1"),
            Fragment::pair("b", "= 2"),
            Fragment::pair("c", "IS NOT NULL"),
            Fragment::raw("d > 4"),
        ];

        assert_eq!(
            reduce(&fragments),
            vec!["a = 1", "b = 2", "c IS NOT NULL", "d > 4"]
        );
    }
}

mod builder_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_append_and_replace_semantics() {
        let ast = QueryBuilder::new()
            .select(["id"])
            .select(["name"])
            .from("a")
            .from("b")
            .limit(10)
            .limit(5)
            .and_where([("id", "> 1")])
            .and_where(["name IS NOT NULL"])
            .build();

        assert_eq!(ast.select.len(), 2);
        assert_eq!(ast.from.as_deref(), Some("b"));
        assert_eq!(ast.limit, Some(5));
        assert_eq!(ast.filters.len(), 2);
    }

    #[test]
    fn test_delete_sets_flag_and_target() {
        let ast = QueryBuilder::new().delete("users").build();
        assert!(ast.delete);
        assert_eq!(ast.from.as_deref(), Some("users"));
    }

    #[test]
    fn test_builders_branch_independently() {
        let base = QueryBuilder::new().from("users");
        let narrow = base.clone().and_where([("id", "= 1")]);

        assert!(base.ast().filters.is_empty());
        assert_eq!(narrow.ast().filters.len(), 1);
    }
}

mod render_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_select_all_clauses() {
        let sql = QueryBuilder::new()
            .schema("app")
            .select(["status", "COUNT(*) AS total"])
            .from("orders")
            .and_where([("created_at", ">= '2024-01-01'")])
            .and_where([("deleted", "= 0")])
            .group_by(["status"])
            .order_by([("total", "DESC")])
            .limit(10)
            .offset(20)
            .to_sql(&mysql_profile())
            .unwrap();

        assert_eq!(
            sql,
            "SELECT status, COUNT(*) AS total FROM `app`.`orders` \
             WHERE created_at >= '2024-01-01' AND deleted = 0 \
             GROUP BY status ORDER BY total DESC LIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn test_empty_select_defaults_to_star() {
        let sql = QueryBuilder::new()
            .from("users")
            .to_sql(&postgres_profile())
            .unwrap();
        assert_eq!(sql, "SELECT * FROM \"users\"");
    }

    #[test]
    fn test_select_without_target() {
        let sql = QueryBuilder::new()
            .select(["1"])
            .to_sql(&mysql_profile())
            .unwrap();
        assert_eq!(sql, "SELECT 1");
    }

    #[test]
    fn test_update() {
        let sql = QueryBuilder::new()
            .schema("app")
            .update([("`name`", "= 'Ann'"), ("`age`", "= 31")])
            .from("users")
            .and_where([("`id`", "= 7")])
            .to_sql(&mysql_profile())
            .unwrap();

        assert_eq!(
            sql,
            "UPDATE `app`.`users` SET `name` = 'Ann', `age` = 31 WHERE `id` = 7"
        );
    }

    #[test]
    fn test_insert_rows_take_first_row_columns() {
        let sql = QueryBuilder::new()
            .into("users")
            .insert([("id", "1"), ("name", "'Ann'")])
            .insert([("id", "2"), ("name", "'Bob'")])
            .to_sql(&mysql_profile())
            .unwrap();

        assert_eq!(
            sql,
            "INSERT INTO `users` (`id`, `name`) VALUES (1, 'Ann'), (2, 'Bob')"
        );
    }

    #[test]
    fn test_delete() {
        let sql = QueryBuilder::new()
            .schema("app")
            .delete("sessions")
            .and_where(["expires < NOW()"])
            .limit(100)
            .to_sql(&mysql_profile())
            .unwrap();

        assert_eq!(
            sql,
            "DELETE FROM `app`.`sessions` WHERE expires < NOW() LIMIT 100"
        );
    }

    #[test]
    fn test_render_is_repeatable() {
        let builder = QueryBuilder::new()
            .select(["id"])
            .from("t")
            .order_by([("id", "ASC")]);
        let profile = mysql_profile();

        assert_eq!(
            builder.to_sql(&profile).unwrap(),
            builder.to_sql(&profile).unwrap()
        );
    }

    #[test]
    fn test_invalid_combinations() {
        let mysql = mysql_profile();

        let both = QueryBuilder::new()
            .from("t")
            .update([("a", "= 1")])
            .insert([("a", "1")]);
        assert!(matches!(both.to_sql(&mysql), Err(QuarryError::Render(_))));

        let delete_update = QueryBuilder::new().delete("t").update([("a", "= 1")]);
        assert!(matches!(
            delete_update.to_sql(&mysql),
            Err(QuarryError::Render(_))
        ));

        let untargeted = QueryBuilder::new().update([("a", "= 1")]);
        assert!(matches!(untargeted.to_sql(&mysql), Err(QuarryError::Render(_))));

        let empty_row = QueryBuilder::new()
            .into("t")
            .insert(Vec::<(String, String)>::new());
        assert!(matches!(empty_row.to_sql(&mysql), Err(QuarryError::Render(_))));

        assert!(matches!(
            QueryBuilder::new().to_sql(&mysql),
            Err(QuarryError::Render(_))
        ));
    }
}

mod parse_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sqlparser::dialect::MySqlDialect;
    use sqlparser::parser::Parser;

    fn parses(sql: &str) {
        let statements = Parser::parse_sql(&MySqlDialect {}, sql)
            .unwrap_or_else(|e| panic!("{} did not parse: {}", sql, e));
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_rendered_dml_parses() {
        let mysql = mysql_profile();

        parses(
            &QueryBuilder::new()
                .schema("app")
                .select(["id", "name"])
                .from("users")
                .and_where([("id", "> 10")])
                .order_by([("name", "ASC")])
                .limit(5)
                .offset(10)
                .to_sql(&mysql)
                .unwrap(),
        );
        parses(
            &QueryBuilder::new()
                .from("users")
                .update([("name", "= 'x'")])
                .and_where([("id", "= 1")])
                .to_sql(&mysql)
                .unwrap(),
        );
        parses(
            &QueryBuilder::new()
                .into("users")
                .insert([("id", "1"), ("name", "'a'")])
                .insert([("id", "2"), ("name", "'b'")])
                .to_sql(&mysql)
                .unwrap(),
        );
        parses(
            &QueryBuilder::new()
                .delete("users")
                .and_where([("id", "= 1")])
                .to_sql(&mysql)
                .unwrap(),
        );
    }
}
