//! Column descriptors
//!
//! `information_schema.COLUMNS` gives the structured catalog view of a
//! column. The `SHOW CREATE TABLE` text adds what the catalog does not carry
//! verbatim: the declared type spelling, its length annotation and the
//! default expression exactly as the server prints it.

use quarry_core::{DialectProfile, FieldDescriptor, Row};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static INT_DISPLAY_LENGTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)int\((\d+)\)").expect("valid regex"));

static MEMBER_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)^\s*(?:enum|set)\s*\((.*)\)").expect("valid regex"));

/// One column definition read from `CREATE TABLE` text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredColumn {
    pub name: String,
    pub type_name: String,
    pub length: Option<String>,
    pub default: Option<String>,
}

/// Column definitions of a `CREATE TABLE` statement keyed by column name.
/// Index, key and constraint lines are skipped.
pub fn parse_create_table(text: &str) -> HashMap<String, DeclaredColumn> {
    let Some(body) = outer_parenthesized(text) else {
        return HashMap::new();
    };

    split_top_level(body)
        .into_iter()
        .filter_map(|item| parse_column_item(item.trim()))
        .map(|column| (column.name.clone(), column))
        .collect()
}

/// Text between the first unquoted `(` and its matching `)`
fn outer_parenthesized(text: &str) -> Option<&str> {
    let mut open = None;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        match quote {
            Some(q) => {
                if ch == '\\' && q == '\'' {
                    chars.next();
                } else if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '\'' | '`' | '"' => quote = Some(ch),
                '(' => {
                    if depth == 0 {
                        open = Some(idx);
                    }
                    depth += 1;
                }
                ')' if depth > 0 => {
                    depth -= 1;
                    if depth == 0 {
                        return open.map(|start| &text[start + 1..idx]);
                    }
                }
                _ => {}
            },
        }
    }
    None
}

/// Split on commas outside parentheses and quotes
fn split_top_level(body: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut chars = body.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        match quote {
            Some(q) => {
                if ch == '\\' && q == '\'' {
                    chars.next();
                } else if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '\'' | '`' | '"' => quote = Some(ch),
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    items.push(&body[start..idx]);
                    start = idx + 1;
                }
                _ => {}
            },
        }
    }
    items.push(&body[start..]);
    items
}

fn parse_column_item(item: &str) -> Option<DeclaredColumn> {
    let rest = item.strip_prefix('`')?;

    // name up to the closing backtick; doubled backticks are part of the name
    let mut name = String::new();
    let mut chars = rest.char_indices().peekable();
    let mut after_name = None;
    while let Some((idx, ch)) = chars.next() {
        if ch == '`' {
            if chars.peek().map(|(_, c)| *c) == Some('`') {
                chars.next();
                name.push('`');
            } else {
                after_name = Some(idx + 1);
                break;
            }
        } else {
            name.push(ch);
        }
    }
    let details = rest[after_name?..].trim_start();

    let (type_token, details) = read_token(details);
    let (type_name, length) = match type_token.split_once('(') {
        Some((base, args)) => (
            base.to_ascii_uppercase(),
            Some(args.strip_suffix(')').unwrap_or(args).to_string()),
        ),
        None => (type_token.to_ascii_uppercase(), None),
    };
    if type_name.is_empty() {
        return None;
    }

    let default = keyword_position(details, "DEFAULT")
        .map(|pos| read_token(details[pos + "DEFAULT".len()..].trim_start()).0)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    Some(DeclaredColumn {
        name,
        type_name,
        length,
        default,
    })
}

/// Next whitespace-delimited token, keeping quoted text and parenthesized
/// groups whole
fn read_token(text: &str) -> (&str, &str) {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        match quote {
            Some(q) => {
                if ch == '\\' && q == '\'' {
                    chars.next();
                } else if ch == q {
                    if chars.peek().map(|(_, c)| *c) == Some(q) {
                        chars.next();
                    } else {
                        quote = None;
                    }
                }
            }
            None => match ch {
                '\'' | '"' | '`' => quote = Some(ch),
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                c if c.is_whitespace() && depth == 0 => return (&text[..idx], &text[idx..]),
                _ => {}
            },
        }
    }
    (text, "")
}

/// Byte offset of a standalone keyword outside quotes
fn keyword_position(text: &str, keyword: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut prev_boundary = true;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if let Some(q) = quote {
            if ch == '\\' && q == '\'' {
                chars.next();
            } else if ch == q {
                quote = None;
            }
            prev_boundary = true;
            continue;
        }
        match ch {
            '\'' | '"' | '`' => quote = Some(ch),
            _ if prev_boundary => {
                let end = idx + keyword.len();
                let candidate = text.get(idx..end);
                let next_is_boundary = text
                    .get(end..)
                    .and_then(|rest| rest.chars().next())
                    .is_none_or(|c| !(c.is_alphanumeric() || c == '_'));
                if candidate.is_some_and(|c| c.eq_ignore_ascii_case(keyword)) && next_is_boundary
                {
                    return Some(idx);
                }
            }
            _ => {}
        }
        prev_boundary = !(ch.is_alphanumeric() || ch == '_');
    }
    None
}

/// Field descriptor from an `information_schema.COLUMNS` row
pub fn column_from_catalog(profile: &DialectProfile, row: &Row) -> Option<FieldDescriptor> {
    let name = row.text("COLUMN_NAME")?;
    let data_type = row.text("DATA_TYPE").unwrap_or_default();
    let column_type = row.text("COLUMN_TYPE").unwrap_or_default();
    let extra = row.text("EXTRA").unwrap_or_default();

    let mut field = profile.field(name, &data_type);
    field.schema = row.text("TABLE_SCHEMA");
    field.table = row.text("TABLE_NAME");
    field.key = row
        .text("COLUMN_KEY")
        .map(|k| k.to_lowercase())
        .filter(|k| !k.is_empty());
    field.num_precision = row.u64("NUMERIC_PRECISION");
    field.num_scale = row.u64("NUMERIC_SCALE");
    field.num_length = INT_DISPLAY_LENGTH
        .captures(&column_type)
        .and_then(|caps| caps[1].parse().ok());
    field.enum_values = MEMBER_LIST
        .captures(&column_type)
        .map(|caps| caps[1].to_string());
    field.date_precision = row.u64("DATETIME_PRECISION");
    field.char_length = row.u64("CHARACTER_MAXIMUM_LENGTH");
    field.nullable = row
        .text("IS_NULLABLE")
        .is_some_and(|n| n.eq_ignore_ascii_case("YES"));
    field.unsigned = column_type.contains("unsigned");
    field.zerofill = column_type.contains("zerofill");
    field.order = row.u64("ORDINAL_POSITION").unwrap_or(0) as u32;
    field.default = row.text("COLUMN_DEFAULT");
    field.charset = row.text("CHARACTER_SET_NAME");
    field.collation = row.text("COLLATION_NAME");
    field.auto_increment = extra.to_ascii_lowercase().contains("auto_increment");
    field.on_update = on_update_clause(&extra);
    field.comment = row.text("COLUMN_COMMENT").filter(|c| !c.is_empty());
    Some(field)
}

/// Expression after `on update` in the EXTRA column
fn on_update_clause(extra: &str) -> Option<String> {
    let lower = extra.to_ascii_lowercase();
    let pos = lower.find("on update")?;
    let expression = extra[pos + "on update".len()..].trim();
    (!expression.is_empty()).then(|| expression.to_string())
}

/// Overlay the declared type, length and default of each column onto its
/// catalog descriptor. Columns without a declaration keep catalog values.
pub fn merge_declared(
    profile: &DialectProfile,
    fields: Vec<FieldDescriptor>,
    declared: &HashMap<String, DeclaredColumn>,
) -> Vec<FieldDescriptor> {
    fields
        .into_iter()
        .map(|mut field| {
            if let Some(column) = declared.get(&field.name) {
                if column.type_name != field.type_name {
                    field.kind = profile.types.kind_of(&column.type_name);
                    field.type_name = column.type_name.clone();
                }
                field.length = column.length.clone();
                field.default = column.default.clone();
            }
            field
        })
        .collect()
}
