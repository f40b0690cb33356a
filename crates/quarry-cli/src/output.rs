//! Terminal rendering of result sets

use comfy_table::{Table, presets::UTF8_FULL};
use quarry_core::ResultSet;

/// Rows as a table, or the execution report of a non-tabular statement
pub fn render_result(result: &ResultSet) -> String {
    if result.rows.is_empty() && result.fields.is_empty() {
        let report = result.report.clone().unwrap_or_default();
        let mut line = format!(
            "{} row(s) affected ({} ms)",
            report.affected_rows,
            result.duration.as_millis()
        );
        if let Some(id) = report.last_insert_id.filter(|id| *id > 0) {
            line.push_str(&format!(", last insert id {}", id));
        }
        if report.warnings > 0 {
            line.push_str(&format!(", {} warning(s)", report.warnings));
        }
        return line;
    }

    let header: Vec<String> = if result.fields.is_empty() {
        result
            .rows
            .first()
            .map(|row| row.columns().to_vec())
            .unwrap_or_default()
    } else {
        result.fields.iter().map(|f| f.name.clone()).collect()
    };

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(header);
    for row in &result.rows {
        table.add_row(row.values.iter().map(ToString::to_string).collect::<Vec<_>>());
    }
    format!(
        "{}\n{} row(s) in set ({} ms)",
        table,
        result.rows.len(),
        result.duration.as_millis()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::{ExecReport, RawResult, Row, Value};
    use std::time::Duration;

    #[test]
    fn test_report_line() {
        let result = ResultSet::from_raw(
            "DELETE FROM orders",
            Duration::from_millis(3),
            RawResult::Report(ExecReport {
                affected_rows: 4,
                warnings: 1,
                ..Default::default()
            }),
        );
        assert_eq!(
            render_result(&result),
            "4 row(s) affected (3 ms), 1 warning(s)"
        );
    }

    #[test]
    fn test_rows_render_as_table() {
        let result = ResultSet::from_raw(
            "SELECT 1",
            Duration::ZERO,
            RawResult::Rows {
                fields: Vec::new(),
                rows: vec![Row::from_pairs([("name", Value::Null)])],
            },
        );
        let text = render_result(&result);
        assert!(text.contains("name"));
        assert!(text.contains("NULL"));
        assert!(text.ends_with("1 row(s) in set (0 ms)"));
    }
}
