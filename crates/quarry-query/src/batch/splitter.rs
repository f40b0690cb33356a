//! Statement splitting and comment stripping
//!
//! Both scanners walk the text once, tracking whether the cursor sits in a
//! string literal, a quoted identifier, a line comment or a block comment.
//! Quotes close on an unpaired quote character; a doubled quote stays inside
//! the literal, and so does a backslash-escaped one when the dialect treats
//! backslash as an escape.

use quarry_core::DialectProfile;

/// Split `sql` on semicolons outside literals, quoted identifiers and
/// comments. Fragments holding only whitespace or comments are dropped.
pub fn split_statements(sql: &str, profile: &DialectProfile) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut has_code = false;
    let mut in_quote: Option<char> = None;
    let mut in_line_comment = false;
    let mut in_block_comment = false;
    let chars: Vec<char> = sql.chars().collect();
    let len = chars.len();
    let mut i = 0;

    while i < len {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if in_line_comment {
            current.push(c);
            if c == '\n' {
                in_line_comment = false;
            }
            i += 1;
            continue;
        }

        if in_block_comment {
            current.push(c);
            if c == '*' && next == Some('/') {
                current.push('/');
                in_block_comment = false;
                i += 2;
                continue;
            }
            i += 1;
            continue;
        }

        if let Some(quote) = in_quote {
            current.push(c);
            if c == '\\' && profile.backslash_escapes && quote != profile.identifier_quote {
                if let Some(escaped) = next {
                    current.push(escaped);
                    i += 2;
                    continue;
                }
            } else if c == quote {
                if next == Some(quote) {
                    current.push(quote);
                    i += 2;
                    continue;
                }
                in_quote = None;
            }
            i += 1;
            continue;
        }

        if let Some(marker) = line_comment_marker(&chars, i, profile) {
            in_line_comment = true;
            current.extend(&chars[i..i + marker]);
            i += marker;
            continue;
        }

        if c == '/' && next == Some('*') {
            in_block_comment = true;
            current.push_str("/*");
            i += 2;
            continue;
        }

        if is_quote(c, profile) {
            in_quote = Some(c);
            has_code = true;
            current.push(c);
            i += 1;
            continue;
        }

        if c == ';' {
            if has_code {
                statements.push(current.trim().to_string());
            }
            current.clear();
            has_code = false;
            i += 1;
            continue;
        }

        if !c.is_whitespace() {
            has_code = true;
        }
        current.push(c);
        i += 1;
    }

    if has_code {
        statements.push(current.trim().to_string());
    }

    statements
}

/// Remove line and `/* */` comments outside quotes. A line comment is
/// dropped up to its newline, a block comment is replaced by one space.
pub fn strip_comments(sql: &str, profile: &DialectProfile) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut in_quote: Option<char> = None;
    let chars: Vec<char> = sql.chars().collect();
    let len = chars.len();
    let mut i = 0;

    while i < len {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if let Some(quote) = in_quote {
            out.push(c);
            if c == '\\' && profile.backslash_escapes && quote != profile.identifier_quote {
                if let Some(escaped) = next {
                    out.push(escaped);
                    i += 2;
                    continue;
                }
            } else if c == quote {
                if next == Some(quote) {
                    out.push(quote);
                    i += 2;
                    continue;
                }
                in_quote = None;
            }
            i += 1;
            continue;
        }

        if line_comment_marker(&chars, i, profile).is_some() {
            while i < len && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }

        if c == '/' && next == Some('*') {
            i += 2;
            while i < len && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                i += 1;
            }
            i += 2;
            out.push(' ');
            continue;
        }

        if is_quote(c, profile) {
            in_quote = Some(c);
        }
        out.push(c);
        i += 1;
    }

    out
}

/// Length of the line comment marker starting at `i`, if one does
fn line_comment_marker(chars: &[char], i: usize, profile: &DialectProfile) -> Option<usize> {
    match chars[i] {
        '#' if profile.hash_comments => Some(1),
        '-' if chars.get(i + 1) == Some(&'-') => {
            let spaced = chars
                .get(i + 2)
                .is_none_or(|c| c.is_whitespace() || c.is_control());
            (spaced || !profile.dash_comment_needs_space).then_some(2)
        }
        _ => None,
    }
}

fn is_quote(c: char, profile: &DialectProfile) -> bool {
    c == '\'' || c == '"' || c == profile.identifier_quote
}
