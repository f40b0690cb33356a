//! View DDL
//!
//! Views are created with their algorithm, definer and security clauses
//! where the dialect has them. Dialects that alter views in place get an
//! `ALTER VIEW` plus an optional rename; the others replace the view through
//! a recreate plan.

use crate::common::{definer_prefix, recreate_plan, require_body, require_name, temp_name};
use quarry_core::{
    DdlPlan, DialectProfile, ObjectKind, ObjectSettings, QuarryError, Result, ViewDescriptor,
};

const ALGORITHMS: &[&str] = &["UNDEFINED", "MERGE", "TEMPTABLE"];
const CHECK_OPTIONS: &[&str] = &["CASCADED", "LOCAL"];

/// View manager for generating view DDL statements
///
/// # Examples
///
/// ```
/// use quarry_core::{ViewDescriptor, mysql_profile};
/// use quarry_objects::ViewManager;
///
/// let mysql = mysql_profile();
/// let manager = ViewManager::new(&mysql);
/// let mut view = ViewDescriptor::new("active_users", "SELECT * FROM users WHERE active");
/// view.schema = Some("app".into());
///
/// let sql = manager.build_create_view(&view).unwrap();
/// assert_eq!(
///     sql,
///     "CREATE ALGORITHM = UNDEFINED SQL SECURITY DEFINER VIEW `app`.`active_users` \
///      AS SELECT * FROM users WHERE active"
/// );
/// ```
pub struct ViewManager<'a> {
    profile: &'a DialectProfile,
    temp_prefix: String,
}

impl<'a> ViewManager<'a> {
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

    /// Validate a view definition
    pub fn validate(&self, view: &ViewDescriptor) -> Result<()> {
        require_name(ObjectKind::View, &view.name)?;
        require_body(ObjectKind::View, &view.name, &view.sql)?;

        if self.profile.ddl.definer_clauses
            && !ALGORITHMS.contains(&view.algorithm.to_ascii_uppercase().as_str())
        {
            return Err(QuarryError::Schema(format!(
                "unknown view algorithm '{}'",
                view.algorithm
            )));
        }
        if !view.update_option.is_empty()
            && !CHECK_OPTIONS.contains(&view.update_option.to_ascii_uppercase().as_str())
        {
            return Err(QuarryError::Schema(format!(
                "unknown check option '{}'",
                view.update_option
            )));
        }
        Ok(())
    }

    pub fn build_create_view(&self, view: &ViewDescriptor) -> Result<String> {
        self.validate(view)?;
        Ok(format!(
            "CREATE {}VIEW {} AS {}{}",
            self.characteristics(view),
            self.profile.qualified(view.schema.as_deref(), &view.name),
            view.sql.trim(),
            self.check_option(view)
        ))
    }

    /// Change `old_name` into `view`
    pub fn build_alter_view(&self, view: &ViewDescriptor, old_name: &str) -> Result<DdlPlan> {
        self.validate(view)?;
        let schema = view.schema.as_deref();

        if !self.profile.alters_in_place(ObjectKind::View) {
            let mut temp = view.clone();
            temp.name = temp_name(&self.temp_prefix, &view.name);
            return Ok(recreate_plan(
                ObjectKind::View,
                self.build_create_view(&temp)?,
                self.build_drop_view(schema, &temp.name),
                self.build_drop_view(schema, old_name),
                self.build_create_view(view)?,
                true,
            ));
        }

        let alter = format!(
            "ALTER {}VIEW {} AS {}{}",
            self.characteristics(view),
            self.profile.qualified(schema, old_name),
            view.sql.trim(),
            self.check_option(view)
        );
        let mut plan = DdlPlan::single(alter, false, "alter view");

        if view.name != old_name {
            plan = plan.step(
                format!(
                    "RENAME TABLE {} TO {}",
                    self.profile.qualified(schema, old_name),
                    self.profile.qualified(schema, &view.name)
                ),
                true,
                "rename view",
            );
        }
        Ok(plan)
    }

    pub fn build_drop_view(&self, schema: Option<&str>, name: &str) -> String {
        format!("DROP VIEW {}", self.profile.qualified(schema, name))
    }

    /// `ALGORITHM = .. [DEFINER=..] SQL SECURITY .. ` including the trailing space
    fn characteristics(&self, view: &ViewDescriptor) -> String {
        if !self.profile.ddl.definer_clauses {
            return String::new();
        }
        let mut out = format!("ALGORITHM = {} ", view.algorithm.to_ascii_uppercase());
        out.push_str(&definer_prefix(self.profile, view.definer.as_deref()));
        out.push_str(&format!("SQL SECURITY {} ", view.security.as_sql()));
        out
    }

    fn check_option(&self, view: &ViewDescriptor) -> String {
        if view.update_option.is_empty() {
            String::new()
        } else {
            format!(" WITH {} CHECK OPTION", view.update_option.to_ascii_uppercase())
        }
    }
}
