//! Function manager implementation
//!
//! Stored function DDL. A function without a return type is a fresh stub:
//! it returns `SMALLINT` and gets a placeholder body.

use crate::common::{
    definer_prefix, parameter_list, recreate_plan, replace_plan, require_body, require_name,
    require_stored_programs, routine_characteristics, temp_name,
};
use quarry_core::{
    DdlPlan, DialectProfile, FunctionDescriptor, ObjectKind, ObjectSettings, Result,
};

const STUB_RETURNS: &str = "SMALLINT";
const STUB_BODY: &str = "BEGIN\n  RETURN 0;\nEND";

/// Function manager for generating stored function DDL
///
/// # Examples
///
/// ```
/// use quarry_core::{FunctionDescriptor, mysql_profile};
/// use quarry_objects::FunctionManager;
///
/// let mysql = mysql_profile();
/// let sql = FunctionManager::new(&mysql)
///     .build_create_function(&FunctionDescriptor::new("answer"))
///     .unwrap();
/// assert!(sql.starts_with("CREATE FUNCTION `answer`() RETURNS SMALLINT\n"));
/// assert!(sql.ends_with("RETURN 0;\nEND"));
/// ```
pub struct FunctionManager<'a> {
    profile: &'a DialectProfile,
    temp_prefix: String,
}

impl<'a> FunctionManager<'a> {
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

    pub fn validate(&self, function: &FunctionDescriptor) -> Result<()> {
        require_stored_programs(self.profile, ObjectKind::Function)?;
        require_name(ObjectKind::Function, &function.name)?;
        if function.returns.is_some() {
            require_body(ObjectKind::Function, &function.name, &function.sql)?;
        }
        Ok(())
    }

    pub fn build_create_function(&self, function: &FunctionDescriptor) -> Result<String> {
        self.validate(function)?;

        let (returns, body) = match function.returns.as_deref() {
            Some(returns) => (returns.trim().to_ascii_uppercase(), function.sql.trim()),
            None => (STUB_RETURNS.to_string(), STUB_BODY),
        };
        let returns_length = function
            .returns_length
            .map(|len| format!("({})", len))
            .unwrap_or_default();

        Ok(format!(
            "CREATE {}FUNCTION {}({}) RETURNS {}{}\n{}\n{}",
            definer_prefix(self.profile, function.definer.as_deref()),
            self.profile.qualified(function.schema.as_deref(), &function.name),
            parameter_list(self.profile, &function.parameters, false),
            returns,
            returns_length,
            routine_characteristics(
                self.profile,
                function.deterministic,
                function.data_access,
                function.security,
                &function.comment,
            ),
            body
        ))
    }

    /// Replace `old_name` with `function`, through a temporary function where
    /// the dialect cannot replace it in place
    pub fn build_alter_function(
        &self,
        function: &FunctionDescriptor,
        old_name: &str,
    ) -> Result<DdlPlan> {
        self.validate(function)?;
        let schema = function.schema.as_deref();

        if self.profile.alters_in_place(ObjectKind::Function) {
            let drop = (function.name != old_name)
                .then(|| self.build_drop_function(schema, old_name))
                .transpose()?;
            return replace_plan(
                ObjectKind::Function,
                &self.build_create_function(function)?,
                drop,
                false,
            );
        }

        let mut temp = function.clone();
        temp.name = temp_name(&self.temp_prefix, &function.name);

        Ok(recreate_plan(
            ObjectKind::Function,
            self.build_create_function(&temp)?,
            self.build_drop_function(schema, &temp.name)?,
            self.build_drop_function(schema, old_name)?,
            self.build_create_function(function)?,
            false,
        ))
    }

    pub fn build_drop_function(&self, schema: Option<&str>, name: &str) -> Result<String> {
        require_stored_programs(self.profile, ObjectKind::Function)?;
        Ok(format!("DROP FUNCTION {}", self.profile.qualified(schema, name)))
    }
}
