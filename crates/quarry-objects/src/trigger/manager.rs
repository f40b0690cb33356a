//! Trigger manager implementation
//!
//! Row triggers only exist on dialects with stored programs. There is no
//! `ALTER TRIGGER`: dialects with `CREATE OR REPLACE` replace the trigger in
//! place, the others go through a recreate plan.

use crate::common::{
    definer_prefix, recreate_plan, replace_plan, require_body, require_name,
    require_stored_programs, temp_name,
};
use quarry_core::{
    DdlPlan, DialectProfile, ObjectKind, ObjectSettings, QuarryError, Result, TriggerDescriptor,
};

/// Trigger manager for generating trigger DDL
///
/// # Examples
///
/// ```
/// use quarry_core::{TriggerDescriptor, TriggerEvent, TriggerTiming, mysql_profile};
/// use quarry_objects::TriggerManager;
///
/// let mysql = mysql_profile();
/// let trigger = TriggerDescriptor {
///     name: "stamp".into(),
///     schema: Some("app".into()),
///     definer: None,
///     table: "orders".into(),
///     timing: TriggerTiming::Before,
///     event: TriggerEvent::Insert,
///     sql: "SET NEW.created = NOW()".into(),
/// };
///
/// let sql = TriggerManager::new(&mysql).build_create_trigger(&trigger).unwrap();
/// assert_eq!(
///     sql,
///     "CREATE TRIGGER `app`.`stamp` BEFORE INSERT ON `orders` FOR EACH ROW SET NEW.created = NOW()"
/// );
/// ```
pub struct TriggerManager<'a> {
    profile: &'a DialectProfile,
    temp_prefix: String,
}

impl<'a> TriggerManager<'a> {
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

    pub fn validate(&self, trigger: &TriggerDescriptor) -> Result<()> {
        require_stored_programs(self.profile, ObjectKind::Trigger)?;
        require_name(ObjectKind::Trigger, &trigger.name)?;
        require_body(ObjectKind::Trigger, &trigger.name, &trigger.sql)?;
        if trigger.table.trim().is_empty() {
            return Err(QuarryError::Schema(format!(
                "trigger '{}' has no table",
                trigger.name
            )));
        }
        Ok(())
    }

    /// The statement must run unsplit, the body may contain semicolons
    pub fn build_create_trigger(&self, trigger: &TriggerDescriptor) -> Result<String> {
        self.validate(trigger)?;

        let definer = definer_prefix(self.profile, trigger.definer.as_deref());

        Ok(format!(
            "CREATE {}TRIGGER {} {} {} ON {} FOR EACH ROW {}",
            definer,
            self.profile.qualified(trigger.schema.as_deref(), &trigger.name),
            trigger.timing.as_sql(),
            trigger.event.as_sql(),
            self.profile.quote_identifier(&trigger.table),
            trigger.sql.trim()
        ))
    }

    /// Replace `old_name` with `trigger`
    pub fn build_alter_trigger(
        &self,
        trigger: &TriggerDescriptor,
        old_name: &str,
    ) -> Result<DdlPlan> {
        self.validate(trigger)?;
        let schema = trigger.schema.as_deref();

        if self.profile.alters_in_place(ObjectKind::Trigger) {
            let drop = (trigger.name != old_name)
                .then(|| self.build_drop_trigger(schema, old_name))
                .transpose()?;
            return replace_plan(
                ObjectKind::Trigger,
                &self.build_create_trigger(trigger)?,
                drop,
                false,
            );
        }

        let mut temp = trigger.clone();
        temp.name = temp_name(&self.temp_prefix, &trigger.name);

        Ok(recreate_plan(
            ObjectKind::Trigger,
            self.build_create_trigger(&temp)?,
            self.build_drop_trigger(schema, &temp.name)?,
            self.build_drop_trigger(schema, old_name)?,
            self.build_create_trigger(trigger)?,
            false,
        ))
    }

    pub fn build_drop_trigger(&self, schema: Option<&str>, name: &str) -> Result<String> {
        require_stored_programs(self.profile, ObjectKind::Trigger)?;
        Ok(format!("DROP TRIGGER {}", self.profile.qualified(schema, name)))
    }
}
