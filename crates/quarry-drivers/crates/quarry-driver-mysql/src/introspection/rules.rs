//! Named extraction rules
//!
//! Each object kind has one [`RuleSet`]: a list of named regular expressions
//! run against the text the server returns from `SHOW CREATE ...`. Capture
//! rules yield their first group; flag rules only test for a match.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Backtick-quoted identifier, with doubled backticks inside
const IDENT: &str = r"`(?:[^`]|``)*`";
/// Quoted or bare identifier; statements kept as written may omit the quotes
const NAME: &str = r"(?:`(?:[^`]|``)*`|[\w$]+)";
/// A single-quoted literal as the server prints it
const LITERAL: &str = r"'(?:[^'\\]|\\.|'')*'";

pub struct Rule {
    pub name: &'static str,
    pattern: Regex,
}

impl Rule {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("valid regex"),
        }
    }

    /// First capture group, or the whole match for group-less rules
    pub fn capture<'t>(&self, text: &'t str) -> Option<&'t str> {
        let caps = self.pattern.captures(text)?;
        caps.get(1).or_else(|| caps.get(0)).map(|m| m.as_str())
    }

    pub fn captures<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
        self.pattern.captures(text)
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    /// Byte range of the first capture group
    pub fn span(&self, text: &str) -> Option<(usize, usize)> {
        let caps = self.pattern.captures(text)?;
        let m = caps.get(1).or_else(|| caps.get(0))?;
        Some((m.start(), m.end()))
    }
}

pub struct RuleSet {
    pub kind: &'static str,
    rules: Vec<Rule>,
}

impl RuleSet {
    fn new(kind: &'static str, rules: Vec<Rule>) -> Self {
        Self { kind, rules }
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn capture<'t>(&self, name: &str, text: &'t str) -> Option<&'t str> {
        self.rule(name)?.capture(text)
    }

    pub fn captures<'t>(&self, name: &str, text: &'t str) -> Option<Captures<'t>> {
        self.rule(name)?.captures(text)
    }

    pub fn flag(&self, name: &str, text: &str) -> bool {
        self.rule(name).is_some_and(|r| r.matches(text))
    }

    pub fn span(&self, name: &str, text: &str) -> Option<(usize, usize)> {
        self.rule(name)?.span(text)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|r| r.name)
    }
}

fn definer_rule() -> Rule {
    Rule::new("definer", r"\bDEFINER=(\S+)")
}

fn comment_rule() -> Rule {
    Rule::new("comment", &format!(r"(?s)\bCOMMENT\s+({LITERAL})"))
}

/// Characteristics shared by procedures and functions
fn routine_rules() -> Vec<Rule> {
    vec![
        definer_rule(),
        Rule::new("body", r"(?is)\b(BEGIN\b.*\bEND)\b"),
        comment_rule(),
        Rule::new("security_invoker", r"(?i)\bSQL\s+SECURITY\s+INVOKER\b"),
        Rule::new("deterministic", r"(?i)(?:^|[\s)])DETERMINISTIC\b"),
        Rule::new("not_deterministic", r"(?i)\bNOT\s+DETERMINISTIC\b"),
        Rule::new("no_sql", r"(?i)\bNO\s+SQL\b"),
        Rule::new("reads_sql_data", r"(?i)\bREADS\s+SQL\s+DATA\b"),
        Rule::new("modifies_sql_data", r"(?i)\bMODIFIES\s+SQL\s+DATA\b"),
    ]
}

/// `SHOW CREATE VIEW` → `Create View`
pub static VIEW_RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new(
        "view",
        vec![
            Rule::new("algorithm", r"\bALGORITHM=(\S+)"),
            definer_rule(),
            Rule::new("security", r"\bSQL\s+SECURITY\s+(DEFINER|INVOKER)\b"),
            Rule::new(
                "update_option",
                r"(?is)\bWITH\s+(CASCADED|LOCAL)\s+CHECK\s+OPTION\s*$",
            ),
            Rule::new(
                "body",
                &format!(
                    r"(?is)\bVIEW\s+{IDENT}(?:\.{IDENT})?\s+AS\s+(.*?)(?:\s+WITH\s+(?:CASCADED|LOCAL)\s+CHECK\s+OPTION)?\s*$"
                ),
            ),
        ],
    )
});

/// `SHOW CREATE TRIGGER` → `SQL Original Statement`
pub static TRIGGER_RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new(
        "trigger",
        vec![
            definer_rule(),
            Rule::new(
                "timing",
                &format!(r"(?i)\bTRIGGER\s+(?:{NAME}\.)?{NAME}\s+(BEFORE|AFTER)\b"),
            ),
            Rule::new(
                "event",
                r"(?i)\b(?:BEFORE|AFTER)\s+(INSERT|UPDATE|DELETE)\s+ON\b",
            ),
            Rule::new(
                "table",
                &format!(r"(?i)\bON\s+(?:{NAME}\.)?({NAME})\s+FOR\s+EACH\s+ROW\b"),
            ),
            Rule::new(
                "body",
                r"(?is)\bFOR\s+EACH\s+ROW\s+(?:(?:FOLLOWS|PRECEDES)\s+\S+\s+)?(.*?)\s*$",
            ),
        ],
    )
});

/// `SHOW CREATE PROCEDURE` → `Create Procedure`
pub static ROUTINE_RULES: LazyLock<RuleSet> =
    LazyLock::new(|| RuleSet::new("procedure", routine_rules()));

/// `SHOW CREATE FUNCTION` → `Create Function`
pub static FUNCTION_RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    let mut rules = routine_rules();
    rules.push(Rule::new(
        "returns",
        r"(?i)\bRETURNS\s+([A-Za-z][A-Za-z0-9_]*)(?:\(([^)]*)\))?",
    ));
    RuleSet::new("function", rules)
});

/// `SHOW CREATE EVENT` → `Create Event`
pub static EVENT_RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new(
        "event",
        vec![
            definer_rule(),
            Rule::new(
                "every",
                r"(?i)\bON\s+SCHEDULE\s+EVERY\s+('[^']*'|\S+)\s+([A-Za-z_]+)",
            ),
            Rule::new("at", r"(?i)\bON\s+SCHEDULE\s+AT\s+'([^']*)'"),
            Rule::new("starts", r"(?i)\bSTARTS\s+'([^']*)'"),
            Rule::new("ends", r"(?i)\bENDS\s+'([^']*)'"),
            Rule::new("preserve", r"(?i)\bON\s+COMPLETION\s+PRESERVE\b"),
            // state keywords follow the schedule, never the event name
            Rule::new(
                "disable_on_slave",
                &format!(
                    r"(?is)\bEVENT\s+{NAME}(?:\.{NAME})?\s+ON\s+SCHEDULE\b.*\bDISABLE\s+ON\s+(?:SLAVE|REPLICA)\b"
                ),
            ),
            Rule::new(
                "disable",
                &format!(r"(?is)\bEVENT\s+{NAME}(?:\.{NAME})?\s+ON\s+SCHEDULE\b.*\bDISABLE\b"),
            ),
            comment_rule(),
            Rule::new(
                "body",
                &format!(
                    r"(?is)\b(?:ENABLE|DISABLE(?:\s+ON\s+(?:SLAVE|REPLICA))?)(?:\s+COMMENT\s+{LITERAL})?\s+DO\s+(.*?)\s*$"
                ),
            ),
        ],
    )
});

/// Literal text of a `'...'` rule capture
pub fn unquote_literal(literal: &str) -> String {
    let inner = literal
        .strip_prefix('\'')
        .and_then(|l| l.strip_suffix('\''))
        .unwrap_or(literal);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('0') => out.push('\0'),
                Some('Z') => out.push('\x1a'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            },
            '\'' if chars.peek() == Some(&'\'') => {
                chars.next();
                out.push('\'');
            }
            other => out.push(other),
        }
    }
    out
}

/// Bare identifier from a captured name, quoted or not
pub fn unquote_identifier(name: &str) -> String {
    match name.strip_prefix('`').and_then(|n| n.strip_suffix('`')) {
        Some(inner) => inner.replace("``", "`"),
        None => name.to_string(),
    }
}
