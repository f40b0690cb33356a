//! Scheduled event DDL

use crate::common::{
    definer_prefix, recreate_plan, require_body, require_name, require_stored_programs, temp_name,
};
use quarry_core::{
    DdlPlan, DialectProfile, EventSchedule, ObjectKind, ObjectSettings, QuarryError, Result,
    SchedulerDescriptor,
};

/// Scheduler manager for `CREATE EVENT` / `ALTER EVENT` / `DROP EVENT`
///
/// # Examples
///
/// ```
/// use quarry_core::{EventSchedule, EventState, SchedulerDescriptor, mysql_profile};
/// use quarry_objects::SchedulerManager;
///
/// let mysql = mysql_profile();
/// let event = SchedulerDescriptor {
///     name: "purge".into(),
///     schema: None,
///     definer: None,
///     schedule: EventSchedule::Every {
///         interval: "1".into(),
///         unit: "DAY".into(),
///         starts: None,
///         ends: None,
///     },
///     preserve: true,
///     state: EventState::Enable,
///     comment: String::new(),
///     sql: "DELETE FROM sessions".into(),
/// };
///
/// let sql = SchedulerManager::new(&mysql).build_create_scheduler(&event).unwrap();
/// assert_eq!(
///     sql,
///     "CREATE EVENT `purge` ON SCHEDULE EVERY 1 DAY ON COMPLETION PRESERVE ENABLE COMMENT '' DO DELETE FROM sessions"
/// );
/// ```
pub struct SchedulerManager<'a> {
    profile: &'a DialectProfile,
    temp_prefix: String,
}

impl<'a> SchedulerManager<'a> {
    pub fn new(profile: &'a DialectProfile) -> Self {
        Self {
            profile,
            temp_prefix: ObjectSettings::default().temp_prefix,
        }
    }

    pub fn with_settings(mut self, settings: &ObjectSettings) -> Self {
        self.temp_prefix = settings.temp_prefix.clone();
        self
    }

    pub fn validate(&self, event: &SchedulerDescriptor) -> Result<()> {
        require_stored_programs(self.profile, ObjectKind::Scheduler)?;
        require_name(ObjectKind::Scheduler, &event.name)?;
        require_body(ObjectKind::Scheduler, &event.name, &event.sql)?;

        if let EventSchedule::Every { interval, unit, .. } = &event.schedule {
            if interval.trim().is_empty() {
                return Err(QuarryError::Schema(format!(
                    "event '{}' has no interval",
                    event.name
                )));
            }
            if unit.is_empty() || !unit.chars().all(|c| c.is_ascii_alphabetic() || c == '_') {
                return Err(QuarryError::Schema(format!(
                    "'{}' is not an interval unit",
                    unit
                )));
            }
        }
        Ok(())
    }

    pub fn build_create_scheduler(&self, event: &SchedulerDescriptor) -> Result<String> {
        self.validate(event)?;
        Ok(format!(
            "CREATE {}EVENT {} ON SCHEDULE {} {} {} COMMENT {} DO {}",
            definer_prefix(self.profile, event.definer.as_deref()),
            self.profile.qualified(event.schema.as_deref(), &event.name),
            self.schedule(&event.schedule),
            completion(event),
            event.state.as_sql(),
            self.profile.quote_string(&event.comment),
            event.sql.trim()
        ))
    }

    /// Alter `old_name` in place, renaming it when the name changed
    pub fn build_alter_scheduler(
        &self,
        event: &SchedulerDescriptor,
        old_name: &str,
    ) -> Result<DdlPlan> {
        self.validate(event)?;
        let schema = event.schema.as_deref();

        if !self.profile.alters_in_place(ObjectKind::Scheduler) {
            let mut temp = event.clone();
            temp.name = temp_name(&self.temp_prefix, &event.name);
            return Ok(recreate_plan(
                ObjectKind::Scheduler,
                self.build_create_scheduler(&temp)?,
                self.build_drop_scheduler(schema, &temp.name)?,
                self.build_drop_scheduler(schema, old_name)?,
                self.build_create_scheduler(event)?,
                false,
            ));
        }

        let rename = if event.name != old_name {
            format!(
                " RENAME TO {}",
                self.profile.qualified(schema, &event.name)
            )
        } else {
            String::new()
        };

        let sql = format!(
            "ALTER {}EVENT {} ON SCHEDULE {} {}{} {} COMMENT {} DO {}",
            definer_prefix(self.profile, event.definer.as_deref()),
            self.profile.qualified(schema, old_name),
            self.schedule(&event.schedule),
            completion(event),
            rename,
            event.state.as_sql(),
            self.profile.quote_string(&event.comment),
            event.sql.trim()
        );
        Ok(DdlPlan::single(sql, false, "alter event"))
    }

    pub fn build_drop_scheduler(&self, schema: Option<&str>, name: &str) -> Result<String> {
        require_stored_programs(self.profile, ObjectKind::Scheduler)?;
        Ok(format!("DROP EVENT {}", self.profile.qualified(schema, name)))
    }

    fn schedule(&self, schedule: &EventSchedule) -> String {
        match schedule {
            EventSchedule::Every {
                interval,
                unit,
                starts,
                ends,
            } => {
                let interval = interval.trim();
                // compound intervals such as `1-6 YEAR_MONTH` must be string literals
                let interval = if interval.contains('-') {
                    self.profile.quote_string(interval)
                } else {
                    interval.to_string()
                };
                let mut out = format!("EVERY {} {}", interval, unit.to_ascii_uppercase());
                if let Some(starts) = starts.as_deref().filter(|s| !s.is_empty()) {
                    out.push_str(&format!(" STARTS {}", self.profile.quote_string(starts)));
                }
                if let Some(ends) = ends.as_deref().filter(|s| !s.is_empty()) {
                    out.push_str(&format!(" ENDS {}", self.profile.quote_string(ends)));
                }
                out
            }
            EventSchedule::Once { at } => format!("AT {}", self.profile.quote_string(at)),
        }
    }
}

fn completion(event: &SchedulerDescriptor) -> &'static str {
    if event.preserve {
        "ON COMPLETION PRESERVE"
    } else {
        "ON COMPLETION NOT PRESERVE"
    }
}
