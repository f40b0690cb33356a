//! Pieces shared by the object generators

use quarry_core::{
    DataAccess, DdlPlan, DialectProfile, ObjectKind, QuarryError, Result, RoutineParameter,
    SqlSecurity,
};

/// `DEFINER=` clause with both halves of `user@host` identifier-quoted.
///
/// Accepts the definer as the server reports it (`` `root`@`%` ``) or bare
/// (`root@localhost`).
pub fn definer_clause(profile: &DialectProfile, definer: &str) -> String {
    let q = profile.identifier_quote;
    let unquote = |part: &str| {
        let part = part.trim();
        part.strip_prefix(q)
            .and_then(|p| p.strip_suffix(q))
            .map(|p| p.replace(&format!("{q}{q}"), &q.to_string()))
            .unwrap_or_else(|| part.to_string())
    };

    match definer.rsplit_once('@') {
        Some((user, host)) => format!(
            "DEFINER={}@{}",
            profile.quote_identifier(&unquote(user)),
            profile.quote_identifier(&unquote(host))
        ),
        None => format!("DEFINER={}", profile.quote_identifier(&unquote(definer))),
    }
}

/// `DEFINER=.. ` with a trailing space, or nothing when no definer is set
pub fn definer_prefix(profile: &DialectProfile, definer: Option<&str>) -> String {
    definer
        .filter(|d| !d.trim().is_empty())
        .map(|d| format!("{} ", definer_clause(profile, d)))
        .unwrap_or_default()
}

/// Collation names are written unquoted, so only word characters pass
pub fn check_collation(collation: &str) -> Result<&str> {
    let collation = collation.trim();
    if !collation.is_empty()
        && collation
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Ok(collation)
    } else {
        Err(QuarryError::Schema(format!(
            "'{}' is not a valid collation name",
            collation
        )))
    }
}

pub fn require_name(kind: ObjectKind, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(QuarryError::Schema(format!(
            "{} name cannot be empty",
            kind.as_sql().to_lowercase()
        )));
    }
    Ok(())
}

pub fn require_body(kind: ObjectKind, name: &str, sql: &str) -> Result<()> {
    if sql.trim().is_empty() {
        return Err(QuarryError::Schema(format!(
            "{} '{}' has no body",
            kind.as_sql().to_lowercase(),
            name
        )));
    }
    Ok(())
}

/// Fail for dialects without MySQL-style stored program DDL
pub fn require_stored_programs(profile: &DialectProfile, kind: ObjectKind) -> Result<()> {
    if profile.ddl.stored_programs {
        Ok(())
    } else {
        Err(QuarryError::NotSupported(format!(
            "{} DDL is not available for {}",
            kind.as_sql(),
            profile.display_name
        )))
    }
}

/// `` `name` TYPE(len) `` entries, prefixed with the parameter mode when
/// `with_mode` is set (procedures)
pub fn parameter_list(
    profile: &DialectProfile,
    parameters: &[RoutineParameter],
    with_mode: bool,
) -> String {
    parameters
        .iter()
        .map(|param| {
            let mut out = String::new();
            if with_mode {
                out.push_str(param.context.as_sql());
                out.push(' ');
            }
            out.push_str(&profile.quote_identifier(&param.name));
            out.push(' ');
            out.push_str(&param.type_name);
            if let Some(length) = param.length.as_deref().filter(|l| !l.is_empty()) {
                out.push_str(&format!("({})", length));
            }
            out
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Characteristic lines between the signature and the body of a routine
pub fn routine_characteristics(
    profile: &DialectProfile,
    deterministic: bool,
    data_access: DataAccess,
    security: SqlSecurity,
    comment: &str,
) -> String {
    format!(
        "LANGUAGE SQL\n{}DETERMINISTIC\n{}\nSQL SECURITY {}\nCOMMENT {}",
        if deterministic { "" } else { "NOT " },
        data_access.as_sql(),
        security.as_sql(),
        profile.quote_string(comment)
    )
}

/// `<prefix>_<name>_tmp`
pub fn temp_name(prefix: &str, name: &str) -> String {
    format!("{}_{}_tmp", prefix, name)
}

/// Replace an object that cannot be altered in place.
///
/// The new definition is first created under a temporary name so a broken
/// definition fails before anything is dropped. Between dropping the
/// original and creating the final object the object does not exist.
/// In-place replacement: `CREATE OR REPLACE` the new definition, then drop
/// the old name when the object was renamed
pub fn replace_plan(
    kind: ObjectKind,
    create: &str,
    drop_original: Option<String>,
    split: bool,
) -> Result<DdlPlan> {
    let label = kind.as_sql().to_lowercase();
    let body = create.strip_prefix("CREATE ").ok_or_else(|| {
        QuarryError::Schema(format!("{} definition does not start with CREATE", label))
    })?;
    let mut plan = DdlPlan::single(
        format!("CREATE OR REPLACE {}", body),
        split,
        format!("replace {}", label),
    );
    if let Some(drop) = drop_original {
        plan = plan.step(drop, true, format!("drop renamed {}", label));
    }
    Ok(plan)
}

pub fn recreate_plan(
    kind: ObjectKind,
    create_temp: String,
    drop_temp: String,
    drop_original: String,
    create_final: String,
    split: bool,
) -> DdlPlan {
    let label = kind.as_sql().to_lowercase();
    tracing::debug!(kind = %label, "replacing object through a temporary copy");
    DdlPlan::new()
        .step(create_temp, split, format!("create temporary {}", label))
        .step(drop_temp, true, format!("drop temporary {}", label))
        .step(drop_original, true, format!("drop original {}", label))
        .step(create_final, split, format!("create {}", label))
}
