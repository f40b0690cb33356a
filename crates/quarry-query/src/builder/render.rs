//! Dialect renderer
//!
//! Clause order is fixed: verb, target, `SET`, `WHERE`, `GROUP BY`,
//! `ORDER BY`, `LIMIT`, `OFFSET`, then the insert tuple list. Empty clauses
//! emit nothing and clauses are joined by single spaces.

use super::ast::{QueryAst, reduce};
use quarry_core::{DialectProfile, QuarryError, Result};

/// Render `ast` as SQL text for `profile`
pub fn render(ast: &QueryAst, profile: &DialectProfile) -> Result<String> {
    check(ast)?;

    let target = ast
        .from
        .as_deref()
        .map(|table| profile.qualified(ast.schema.as_deref(), table));

    let mut clauses: Vec<String> = Vec::new();

    if ast.delete {
        clauses.push("DELETE".to_string());
    } else if ast.is_update() {
        clauses.push("UPDATE".to_string());
    } else if ast.is_insert() {
        clauses.push("INSERT".to_string());
    } else {
        let select = reduce(&ast.select);
        if select.is_empty() {
            clauses.push("SELECT *".to_string());
        } else {
            clauses.push(format!("SELECT {}", select.join(", ")));
        }
    }

    if let Some(target) = target {
        if ast.is_update() {
            clauses.push(target);
        } else if ast.is_insert() {
            clauses.push(format!("INTO {}", target));
        } else {
            clauses.push(format!("FROM {}", target));
        }
    }

    push_list(&mut clauses, "SET", &reduce(&ast.update), ", ");
    push_list(&mut clauses, "WHERE", &reduce(&ast.filters), " AND ");
    push_list(&mut clauses, "GROUP BY", &reduce(&ast.group_by), ", ");
    push_list(&mut clauses, "ORDER BY", &reduce(&ast.order_by), ", ");

    if let Some(limit) = ast.limit {
        clauses.push(format!("LIMIT {}", limit));
    }
    if let Some(offset) = ast.offset {
        clauses.push(format!("OFFSET {}", offset));
    }

    if let Some(first) = ast.insert.first() {
        let columns: Vec<String> = first
            .keys()
            .map(|column| profile.quote_identifier(column))
            .collect();
        // Every row is assumed to carry the first row's columns in the same order
        let rows: Vec<String> = ast
            .insert
            .iter()
            .map(|row| {
                format!(
                    "({})",
                    row.values().map(String::as_str).collect::<Vec<_>>().join(", ")
                )
            })
            .collect();
        clauses.push(format!("({}) VALUES {}", columns.join(", "), rows.join(", ")));
    }

    Ok(clauses.join(" "))
}

fn push_list(clauses: &mut Vec<String>, keyword: &str, items: &[String], separator: &str) {
    if !items.is_empty() {
        clauses.push(format!("{} {}", keyword, items.join(separator)));
    }
}

fn check(ast: &QueryAst) -> Result<()> {
    if ast.is_update() && ast.is_insert() {
        return Err(QuarryError::Render(
            "a statement cannot both update and insert".into(),
        ));
    }
    if ast.delete && (ast.is_update() || ast.is_insert()) {
        return Err(QuarryError::Render(
            "a delete cannot carry update or insert clauses".into(),
        ));
    }
    if ast.from.is_none() {
        let verb = if ast.delete {
            Some("DELETE")
        } else if ast.is_update() {
            Some("UPDATE")
        } else if ast.is_insert() {
            Some("INSERT")
        } else {
            None
        };
        if let Some(verb) = verb {
            return Err(QuarryError::Render(format!("{} requires a target table", verb)));
        }
        if ast.select.is_empty() {
            return Err(QuarryError::Render(
                "a query needs a select list or a target table".into(),
            ));
        }
    }
    if ast.insert.iter().any(|row| row.is_empty()) {
        return Err(QuarryError::Render("insert rows need at least one column".into()));
    }
    Ok(())
}
