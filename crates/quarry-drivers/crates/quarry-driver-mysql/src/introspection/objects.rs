//! Object descriptors from `SHOW CREATE ...` rows
//!
//! A row whose required parts cannot be extracted yields `None` and a
//! warning; it never fails the lookup. Optional parts fall back to the
//! server defaults.

use super::rules::{
    EVENT_RULES, FUNCTION_RULES, ROUTINE_RULES, RuleSet, TRIGGER_RULES, VIEW_RULES,
    unquote_identifier, unquote_literal,
};
use quarry_core::{
    DataAccess, EventSchedule, EventState, FunctionDescriptor, RoutineDescriptor,
    RoutineParameter, Row, SchedulerDescriptor, SqlSecurity, TriggerDescriptor, TriggerEvent,
    TriggerTiming, ViewDescriptor,
};

fn missing<T>(rules: &RuleSet, name: &str, part: &str) -> Option<T> {
    tracing::warn!(kind = rules.kind, name = %name, part, "could not extract object definition");
    None
}

pub fn parse_view(schema: &str, row: &Row) -> Option<ViewDescriptor> {
    let name = row.text("View")?;
    let text = row.text("Create View")?;
    let rules = &*VIEW_RULES;

    let Some(body) = rules.capture("body", &text) else {
        return missing(rules, &name, "body");
    };

    let mut view = ViewDescriptor::new(name, body.trim());
    view.schema = Some(schema.to_string());
    if let Some(algorithm) = rules.capture("algorithm", &text) {
        view.algorithm = algorithm.to_ascii_uppercase();
    }
    view.definer = rules.capture("definer", &text).map(str::to_string);
    if rules.capture("security", &text).is_some_and(|s| s.eq_ignore_ascii_case("INVOKER")) {
        view.security = SqlSecurity::Invoker;
    }
    view.update_option = rules
        .capture("update_option", &text)
        .map(str::to_ascii_uppercase)
        .unwrap_or_default();
    Some(view)
}

pub fn parse_trigger(schema: &str, row: &Row) -> Option<TriggerDescriptor> {
    let name = row.text("Trigger")?;
    let text = row.text("SQL Original Statement")?;
    let rules = &*TRIGGER_RULES;

    let Some(timing) = rules.capture("timing", &text).and_then(TriggerTiming::parse) else {
        return missing(rules, &name, "timing");
    };
    let Some(event) = rules.capture("event", &text).and_then(TriggerEvent::parse) else {
        return missing(rules, &name, "event");
    };
    let Some(table) = rules.capture("table", &text) else {
        return missing(rules, &name, "table");
    };
    let Some(body) = rules.capture("body", &text).filter(|b| !b.is_empty()) else {
        return missing(rules, &name, "body");
    };

    Some(TriggerDescriptor {
        schema: Some(schema.to_string()),
        definer: rules.capture("definer", &text).map(str::to_string),
        table: unquote_identifier(table),
        timing,
        event,
        sql: body.to_string(),
        name,
    })
}

/// Characteristics common to procedures and functions, read from the text
/// before the body
struct Characteristics {
    definer: Option<String>,
    comment: String,
    security: SqlSecurity,
    deterministic: bool,
    data_access: DataAccess,
}

fn characteristics(rules: &RuleSet, header: &str) -> Characteristics {
    let data_access = if rules.flag("modifies_sql_data", header) {
        DataAccess::ModifiesSqlData
    } else if rules.flag("reads_sql_data", header) {
        DataAccess::ReadsSqlData
    } else if rules.flag("no_sql", header) {
        DataAccess::NoSql
    } else {
        DataAccess::ContainsSql
    };

    Characteristics {
        definer: rules.capture("definer", header).map(str::to_string),
        comment: rules
            .capture("comment", header)
            .map(unquote_literal)
            .unwrap_or_default(),
        security: if rules.flag("security_invoker", header) {
            SqlSecurity::Invoker
        } else {
            SqlSecurity::Definer
        },
        deterministic: rules.flag("deterministic", header)
            && !rules.flag("not_deterministic", header),
        data_access,
    }
}

/// `parameters` come from `information_schema.PARAMETERS`
pub fn parse_routine(
    schema: &str,
    row: &Row,
    parameters: Vec<RoutineParameter>,
) -> Option<RoutineDescriptor> {
    let name = row.text("Procedure")?;
    let rules = &*ROUTINE_RULES;

    let mut routine = RoutineDescriptor::new(name, "");
    routine.schema = Some(schema.to_string());

    // NULL when the account may not see the routine body
    let Some(text) = row.text("Create Procedure") else {
        return Some(routine);
    };
    let Some((start, end)) = rules.span("body", &text) else {
        return missing(rules, &routine.name, "body");
    };

    let traits = characteristics(rules, &text[..start]);
    routine.sql = text[start..end].to_string();
    routine.parameters = parameters;
    routine.definer = traits.definer;
    routine.comment = traits.comment;
    routine.security = traits.security;
    routine.deterministic = traits.deterministic;
    routine.data_access = traits.data_access;
    Some(routine)
}

pub fn parse_function(
    schema: &str,
    row: &Row,
    parameters: Vec<RoutineParameter>,
) -> Option<FunctionDescriptor> {
    let name = row.text("Function")?;
    let rules = &*FUNCTION_RULES;

    let mut function = FunctionDescriptor::new(name);
    function.schema = Some(schema.to_string());

    let Some(text) = row.text("Create Function") else {
        return Some(function);
    };
    let Some((start, end)) = rules.span("body", &text) else {
        return missing(rules, &function.name, "body");
    };

    let header = &text[..start];
    if let Some(caps) = rules.captures("returns", header) {
        function.returns = caps.get(1).map(|m| m.as_str().to_ascii_uppercase());
        function.returns_length = caps
            .get(2)
            .and_then(|m| m.as_str().split(',').next())
            .and_then(|len| len.trim().parse().ok());
    }

    let traits = characteristics(rules, header);
    function.sql = text[start..end].to_string();
    function.parameters = parameters;
    function.definer = traits.definer;
    function.comment = traits.comment;
    function.security = traits.security;
    function.deterministic = traits.deterministic;
    function.data_access = traits.data_access;
    Some(function)
}

pub fn parse_event(schema: &str, row: &Row) -> Option<SchedulerDescriptor> {
    let name = row.text("Event")?;
    let text = row.text("Create Event")?;
    let rules = &*EVENT_RULES;

    let Some((start, end)) = rules.span("body", &text) else {
        return missing(rules, &name, "body");
    };
    let header = &text[..start];
    // state keywords are only looked for outside the comment
    let comment = rules.capture("comment", header);
    let flags = match rules.span("comment", header) {
        Some((from, to)) => format!("{}{}", &header[..from], &header[to..]),
        None => header.to_string(),
    };

    let schedule = if let Some(caps) = rules.captures("every", header) {
        let interval = caps.get(1).map_or("", |m| m.as_str());
        EventSchedule::Every {
            interval: interval.trim_matches('\'').to_string(),
            unit: caps.get(2).map_or("", |m| m.as_str()).to_ascii_uppercase(),
            starts: rules.capture("starts", header).map(str::to_string),
            ends: rules.capture("ends", header).map(str::to_string),
        }
    } else if let Some(at) = rules.capture("at", header) {
        EventSchedule::Once { at: at.to_string() }
    } else {
        return missing(rules, &name, "schedule");
    };

    let state = if rules.flag("disable_on_slave", &flags) {
        EventState::DisableOnSlave
    } else if rules.flag("disable", &flags) {
        EventState::Disable
    } else {
        EventState::Enable
    };

    Some(SchedulerDescriptor {
        schema: Some(schema.to_string()),
        definer: rules.capture("definer", header).map(str::to_string),
        schedule,
        preserve: rules.flag("preserve", &flags),
        state,
        comment: comment.map(unquote_literal).unwrap_or_default(),
        sql: text[start..end].to_string(),
        name,
    })
}
