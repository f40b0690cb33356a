//! Stored procedure DDL

use crate::common::{
    definer_prefix, parameter_list, recreate_plan, replace_plan, require_body, require_name,
    require_stored_programs, routine_characteristics, temp_name,
};
use quarry_core::{DdlPlan, DialectProfile, ObjectKind, ObjectSettings, Result, RoutineDescriptor};

/// Routine manager for stored procedure DDL
pub struct RoutineManager<'a> {
    profile: &'a DialectProfile,
    temp_prefix: String,
}

impl<'a> RoutineManager<'a> {
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

    pub fn validate(&self, routine: &RoutineDescriptor) -> Result<()> {
        require_stored_programs(self.profile, ObjectKind::Routine)?;
        require_name(ObjectKind::Routine, &routine.name)?;
        require_body(ObjectKind::Routine, &routine.name, &routine.sql)
    }

    /// `CREATE PROCEDURE` with one characteristic per line; run unsplit
    pub fn build_create_routine(&self, routine: &RoutineDescriptor) -> Result<String> {
        self.validate(routine)?;

        let definer = definer_prefix(self.profile, routine.definer.as_deref());

        Ok(format!(
            "CREATE {}PROCEDURE {}({})\n{}\n{}",
            definer,
            self.profile.qualified(routine.schema.as_deref(), &routine.name),
            parameter_list(self.profile, &routine.parameters, true),
            routine_characteristics(
                self.profile,
                routine.deterministic,
                routine.data_access,
                routine.security,
                &routine.comment,
            ),
            routine.sql.trim()
        ))
    }

    /// Replace `old_name` with `routine`. Without an in-place form the new
    /// definition is created under a temporary name first, then swapped in.
    pub fn build_alter_routine(
        &self,
        routine: &RoutineDescriptor,
        old_name: &str,
    ) -> Result<DdlPlan> {
        self.validate(routine)?;
        let schema = routine.schema.as_deref();

        if self.profile.alters_in_place(ObjectKind::Routine) {
            let drop = (routine.name != old_name)
                .then(|| self.build_drop_routine(schema, old_name))
                .transpose()?;
            return replace_plan(
                ObjectKind::Routine,
                &self.build_create_routine(routine)?,
                drop,
                false,
            );
        }

        let mut temp = routine.clone();
        temp.name = temp_name(&self.temp_prefix, &routine.name);

        Ok(recreate_plan(
            ObjectKind::Routine,
            self.build_create_routine(&temp)?,
            self.build_drop_routine(schema, &temp.name)?,
            self.build_drop_routine(schema, old_name)?,
            self.build_create_routine(routine)?,
            false,
        ))
    }

    pub fn build_drop_routine(&self, schema: Option<&str>, name: &str) -> Result<String> {
        require_stored_programs(self.profile, ObjectKind::Routine)?;
        Ok(format!(
            "DROP PROCEDURE {}",
            self.profile.qualified(schema, name)
        ))
    }
}
