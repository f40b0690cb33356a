//! MySQL client
//!
//! [`MySqlClient`] is the upward interface of the driver: read-only object
//! inspection through [`SchemaIntrospection`], everything that changes the
//! server as inherent methods. Generated statements go through the
//! [`QueryRunner`] so they are logged and fail with their statement text.

use crate::introspection::{
    catalog, parse_event, parse_function, parse_routine, parse_trigger, parse_view,
};
use crate::lookup::{self, fetch, fetch_one};
use crate::{MySqlDriver, MySqlMetadata};
use async_trait::async_trait;
use indexmap::IndexMap;
use quarry_core::{
    CollationInfo, Connection, ConnectionConfig, DatabaseDriver, DdlPlan, DialectProfile,
    EngineInfo, FieldDescriptor, FunctionDescriptor, IndexDescriptor, KeyUsage, ObjectSettings,
    ProcessInfo, QuarryError, QueryOutcome, Result, ResultSet, RoutineDescriptor,
    RoutineParameter, SchedulerDescriptor, SchemaIntrospection, SchemaStructure, Session,
    TableSummary, TriggerDescriptor, UserInfo, VariableInfo, VersionInfo, ViewDescriptor,
};
use quarry_objects::{
    FunctionManager, RoutineManager, SchedulerManager, SchemaManager, TriggerManager, ViewManager,
};
use quarry_query::{QueryBuilder, QueryOptions, QueryRunner};
use quarry_table_designer::{DdlCompiler, TableDefinition, TableDiff, TableLoader};
use std::sync::Arc;

/// Server code for "command denied to user for table"
const TABLE_ACCESS_DENIED: u16 = 1142;

/// Longest `INFO` text fetched per process
const PROCESS_INFO_LIMIT: usize = 51200;

pub struct MySqlClient {
    connection: Arc<dyn Connection>,
    profile: Arc<DialectProfile>,
    runner: QueryRunner,
    settings: ObjectSettings,
    /// Restricts structure listings to one schema when set
    schema: Option<String>,
}

impl MySqlClient {
    pub fn new(connection: Arc<dyn Connection>, profile: Arc<DialectProfile>) -> Self {
        let runner = QueryRunner::new(Arc::clone(&profile))
            .with_metadata(Arc::new(MySqlMetadata::new(Arc::clone(&profile))));
        Self {
            connection,
            profile,
            runner,
            settings: ObjectSettings::default(),
            schema: None,
        }
    }

    /// Connect through `driver` and wrap the pool
    pub async fn connect(driver: &MySqlDriver, config: &ConnectionConfig) -> Result<Self> {
        let connection = driver.connect(config).await?;
        let profile = driver.dialect_profile()?;
        let mut client = Self::new(connection, profile);
        client.schema = config.schema.clone();
        Ok(client)
    }

    pub fn with_settings(mut self, settings: ObjectSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn profile(&self) -> &DialectProfile {
        &self.profile
    }

    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    pub async fn close(&self) -> Result<()> {
        self.connection.close().await
    }

    async fn session(&self) -> Result<Box<dyn Session>> {
        self.connection.acquire().await
    }

    async fn rows(&self, sql: &str) -> Result<Vec<quarry_core::Row>> {
        let mut session = self.session().await?;
        fetch(session.as_mut(), sql).await
    }

    async fn apply(&self, plan: DdlPlan, schema: Option<&str>) -> Result<Vec<ResultSet>> {
        self.runner
            .execute_plan(self.connection.as_ref(), &plan, schema)
            .await
    }

    async fn apply_one(&self, sql: String, purpose: &str) -> Result<()> {
        self.apply(DdlPlan::single(sql, false, purpose), None)
            .await
            .map(|_| ())
    }

    fn literal(&self, value: &str) -> String {
        self.profile.quote_string(value)
    }

    // --- execution ---

    /// Execute caller SQL verbatim
    pub async fn raw(&self, sql: &str, options: &QueryOptions) -> Result<QueryOutcome> {
        self.runner
            .execute(self.connection.as_ref(), sql, options)
            .await
    }

    /// Render and execute a built query
    pub async fn run(&self, query: &QueryBuilder, options: &QueryOptions) -> Result<QueryOutcome> {
        self.runner
            .run(self.connection.as_ref(), query, options)
            .await
    }

    // --- schemas ---

    pub async fn create_schema(&self, name: &str, collation: Option<&str>) -> Result<()> {
        let sql = SchemaManager::new(&self.profile).build_create_schema(name, collation)?;
        self.apply_one(sql, "create schema").await
    }

    pub async fn alter_schema(&self, name: &str, collation: &str) -> Result<()> {
        let sql = SchemaManager::new(&self.profile).build_alter_schema(name, collation)?;
        self.apply_one(sql, "alter schema").await
    }

    pub async fn drop_schema(&self, name: &str) -> Result<()> {
        let sql = SchemaManager::new(&self.profile).build_drop_schema(name);
        self.apply_one(sql, "drop schema").await
    }

    /// Default collation of `schema`
    pub async fn schema_collation(&self, schema: &str) -> Result<Option<String>> {
        let sql = format!(
            "SELECT `DEFAULT_COLLATION_NAME` FROM `information_schema`.`SCHEMATA` WHERE `SCHEMA_NAME` = {}",
            self.literal(schema)
        );
        let mut session = self.session().await?;
        Ok(fetch_one(session.as_mut(), &sql)
            .await?
            .and_then(|row| row.text("DEFAULT_COLLATION_NAME")))
    }

    // --- tables ---

    pub async fn create_table(&self, definition: &TableDefinition) -> Result<()> {
        let statements = DdlCompiler::compile_create(definition, &self.profile)?;
        let plan = statements
            .into_iter()
            .fold(DdlPlan::new(), |plan, sql| plan.step(sql, false, "create table"));
        self.apply(plan, None).await.map(|_| ())
    }

    /// Apply `diff` after validating it against the live table
    pub async fn alter_table(&self, diff: &TableDiff) -> Result<()> {
        let schema = diff
            .schema
            .as_deref()
            .or(self.schema.as_deref())
            .ok_or_else(|| QuarryError::Schema("Table diff has no schema".into()))?;
        let prior = TableLoader::load_table(self, schema, &diff.table).await?;
        let statements = DdlCompiler::compile_alter_checked(diff, &prior, &self.profile)?;

        tracing::debug!(table = %diff.table, statements = statements.len(), "altering table");
        let plan = statements
            .into_iter()
            .fold(DdlPlan::new(), |plan, sql| plan.step(sql, false, "alter table"));
        self.apply(plan, None).await.map(|_| ())
    }

    pub async fn duplicate_table(&self, schema: &str, table: &str) -> Result<()> {
        let sql = DdlCompiler::compile_duplicate(Some(schema), table, &self.profile);
        self.apply_one(sql, "duplicate table").await
    }

    pub async fn truncate_table(&self, schema: &str, table: &str) -> Result<()> {
        let sql = DdlCompiler::compile_truncate(Some(schema), table, &self.profile);
        self.apply_one(sql, "truncate table").await
    }

    pub async fn drop_table(&self, schema: &str, table: &str) -> Result<()> {
        let sql = DdlCompiler::compile_drop(Some(schema), table, &self.profile);
        self.apply_one(sql, "drop table").await
    }

    /// Status row of one table: engine, collation, comment, counters
    pub async fn table_options(&self, schema: &str, table: &str) -> Result<Option<TableSummary>> {
        let sql = format!(
            "SHOW TABLE STATUS FROM {} WHERE `Name` = {}",
            self.profile.quote_identifier(schema),
            self.literal(table)
        );
        let mut session = self.session().await?;
        Ok(fetch_one(session.as_mut(), &sql)
            .await?
            .as_ref()
            .and_then(catalog::table_summary))
    }

    /// Row count estimate from the table statistics
    pub async fn approximate_count(&self, schema: &str, table: &str) -> Result<u64> {
        let sql = format!(
            "SELECT `TABLE_ROWS` AS `count` FROM `information_schema`.`TABLES` WHERE `TABLE_SCHEMA` = {} AND `TABLE_NAME` = {}",
            self.literal(schema),
            self.literal(table)
        );
        let mut session = self.session().await?;
        Ok(fetch_one(session.as_mut(), &sql)
            .await?
            .and_then(|row| row.u64("count"))
            .unwrap_or(0))
    }

    // --- views ---

    fn views(&self) -> ViewManager<'_> {
        ViewManager::new(&self.profile).with_settings(&self.settings)
    }

    pub async fn create_view(&self, view: &ViewDescriptor) -> Result<()> {
        let sql = self.views().build_create_view(view)?;
        self.apply_one(sql, "create view").await
    }

    /// Replace the view stored as `old_name` with `view`
    pub async fn alter_view(&self, view: &ViewDescriptor, old_name: &str) -> Result<()> {
        let plan = self.views().build_alter_view(view, old_name)?;
        self.apply(plan, None).await.map(|_| ())
    }

    pub async fn drop_view(&self, schema: &str, name: &str) -> Result<()> {
        let sql = self.views().build_drop_view(Some(schema), name);
        self.apply_one(sql, "drop view").await
    }

    // --- triggers ---

    fn triggers(&self) -> TriggerManager<'_> {
        TriggerManager::new(&self.profile).with_settings(&self.settings)
    }

    pub async fn create_trigger(&self, trigger: &TriggerDescriptor) -> Result<()> {
        let sql = self.triggers().build_create_trigger(trigger)?;
        self.apply_one(sql, "create trigger").await
    }

    pub async fn alter_trigger(&self, trigger: &TriggerDescriptor, old_name: &str) -> Result<()> {
        let plan = self.triggers().build_alter_trigger(trigger, old_name)?;
        self.apply(plan, None).await.map(|_| ())
    }

    pub async fn drop_trigger(&self, schema: &str, name: &str) -> Result<()> {
        let sql = self.triggers().build_drop_trigger(Some(schema), name)?;
        self.apply_one(sql, "drop trigger").await
    }

    // --- stored procedures ---

    fn routines(&self) -> RoutineManager<'_> {
        RoutineManager::new(&self.profile).with_settings(&self.settings)
    }

    pub async fn create_routine(&self, routine: &RoutineDescriptor) -> Result<()> {
        let sql = self.routines().build_create_routine(routine)?;
        self.apply_one(sql, "create procedure").await
    }

    pub async fn alter_routine(&self, routine: &RoutineDescriptor, old_name: &str) -> Result<()> {
        let plan = self.routines().build_alter_routine(routine, old_name)?;
        self.apply(plan, None).await.map(|_| ())
    }

    pub async fn drop_routine(&self, schema: &str, name: &str) -> Result<()> {
        let sql = self.routines().build_drop_routine(Some(schema), name)?;
        self.apply_one(sql, "drop procedure").await
    }

    // --- stored functions ---

    fn functions(&self) -> FunctionManager<'_> {
        FunctionManager::new(&self.profile).with_settings(&self.settings)
    }

    pub async fn create_function(&self, function: &FunctionDescriptor) -> Result<()> {
        let sql = self.functions().build_create_function(function)?;
        self.apply_one(sql, "create function").await
    }

    pub async fn alter_function(&self, function: &FunctionDescriptor, old_name: &str) -> Result<()> {
        let plan = self.functions().build_alter_function(function, old_name)?;
        self.apply(plan, None).await.map(|_| ())
    }

    pub async fn drop_function(&self, schema: &str, name: &str) -> Result<()> {
        let sql = self.functions().build_drop_function(Some(schema), name)?;
        self.apply_one(sql, "drop function").await
    }

    // --- scheduled events ---

    fn schedulers(&self) -> SchedulerManager<'_> {
        SchedulerManager::new(&self.profile).with_settings(&self.settings)
    }

    pub async fn create_scheduler(&self, event: &SchedulerDescriptor) -> Result<()> {
        let sql = self.schedulers().build_create_scheduler(event)?;
        self.apply_one(sql, "create event").await
    }

    pub async fn alter_scheduler(&self, event: &SchedulerDescriptor, old_name: &str) -> Result<()> {
        let plan = self.schedulers().build_alter_scheduler(event, old_name)?;
        self.apply(plan, None).await.map(|_| ())
    }

    pub async fn drop_scheduler(&self, schema: &str, name: &str) -> Result<()> {
        let sql = self.schedulers().build_drop_scheduler(Some(schema), name)?;
        self.apply_one(sql, "drop event").await
    }

    // --- server ---

    /// Accounts of the server. Empty when the account may not read
    /// `mysql.user`.
    pub async fn users(&self) -> Result<Vec<UserInfo>> {
        let sql = "SELECT `user`, `host`, authentication_string AS `password` FROM `mysql`.`user`";
        match self.rows(sql).await {
            Ok(rows) => Ok(rows.iter().filter_map(catalog::user).collect()),
            Err(e) if e.server_code() == Some(TABLE_ACCESS_DENIED) => {
                tracing::warn!(error = %e, "no access to mysql.user, listing no users");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn collations(&self) -> Result<Vec<CollationInfo>> {
        Ok(self
            .rows("SHOW COLLATION")
            .await?
            .iter()
            .filter_map(catalog::collation)
            .collect())
    }

    pub async fn variables(&self) -> Result<Vec<VariableInfo>> {
        Ok(self
            .rows("SHOW VARIABLES")
            .await?
            .iter()
            .filter_map(catalog::variable)
            .collect())
    }

    pub async fn engines(&self) -> Result<Vec<EngineInfo>> {
        Ok(self
            .rows("SHOW ENGINES")
            .await?
            .iter()
            .filter_map(catalog::engine)
            .collect())
    }

    pub async fn version(&self) -> Result<VersionInfo> {
        let rows = self.rows("SHOW VARIABLES LIKE '%vers%'").await?;
        Ok(catalog::version(&rows))
    }

    pub async fn processes(&self) -> Result<Vec<ProcessInfo>> {
        let sql = format!(
            "SELECT `ID`, `USER`, `HOST`, `DB`, `COMMAND`, `TIME`, `STATE`, LEFT(`INFO`, {}) AS `INFO` FROM `information_schema`.`PROCESSLIST`",
            PROCESS_INFO_LIMIT
        );
        Ok(self
            .rows(&sql)
            .await?
            .iter()
            .filter_map(catalog::process)
            .collect())
    }

    pub async fn kill_process(&self, id: u64) -> Result<()> {
        self.apply_one(format!("KILL {}", id), "kill process").await
    }

    async fn routine_parameters(
        &self,
        session: &mut dyn Session,
        schema: &str,
        name: &str,
    ) -> Result<Vec<RoutineParameter>> {
        let sql = format!(
            "SELECT * FROM `information_schema`.`PARAMETERS` WHERE `SPECIFIC_NAME` = {} AND `SPECIFIC_SCHEMA` = {} ORDER BY `ORDINAL_POSITION`",
            self.literal(name),
            self.literal(schema)
        );
        Ok(catalog::routine_parameters(&fetch(session, &sql).await?))
    }

    async fn show_create(
        &self,
        session: &mut dyn Session,
        kind: &str,
        schema: &str,
        name: &str,
    ) -> Result<Option<quarry_core::Row>> {
        let sql = format!(
            "SHOW CREATE {} {}",
            kind,
            self.profile.qualified(Some(schema), name)
        );
        fetch_one(session, &sql).await
    }
}

#[async_trait]
impl SchemaIntrospection for MySqlClient {
    async fn schemas(&self) -> Result<Vec<String>> {
        Ok(self
            .rows("SHOW DATABASES")
            .await?
            .iter()
            .filter_map(|row| row.text("Database"))
            .collect())
    }

    #[tracing::instrument(skip(self, schemas), fields(requested = schemas.len()))]
    async fn structure(&self, schemas: &[String]) -> Result<Vec<SchemaStructure>> {
        let mut session = self.session().await?;
        let session = session.as_mut();

        let databases: Vec<String> = fetch(session, "SHOW DATABASES")
            .await?
            .iter()
            .filter_map(|row| row.text("Database"))
            .filter(|db| self.schema.as_deref().is_none_or(|only| only == db.as_str()))
            .filter(|db| schemas.is_empty() || schemas.contains(db))
            .collect();

        let functions = fetch(session, "SHOW FUNCTION STATUS").await?;
        let procedures = fetch(session, "SHOW PROCEDURE STATUS").await?;
        let events = fetch(
            session,
            "SELECT *, `EVENT_SCHEMA` AS `Db`, `EVENT_NAME` AS `Name` FROM `information_schema`.`EVENTS`",
        )
        .await?;

        let mut tables = IndexMap::new();
        let mut triggers = IndexMap::new();
        for db in &databases {
            let quoted = self.profile.quote_identifier(db);
            tables.insert(
                db.clone(),
                fetch(session, &format!("SHOW TABLE STATUS FROM {}", quoted)).await?,
            );
            triggers.insert(
                db.clone(),
                fetch(session, &format!("SHOW TRIGGERS FROM {}", quoted)).await?,
            );
        }

        Ok(catalog::structure(catalog::StructureRows {
            databases: &databases,
            tables: &tables,
            triggers: &triggers,
            procedures: &procedures,
            functions: &functions,
            events: &events,
        }))
    }

    async fn tables(&self, schema: &str) -> Result<Vec<TableSummary>> {
        let sql = format!(
            "SHOW TABLE STATUS FROM {}",
            self.profile.quote_identifier(schema)
        );
        Ok(self
            .rows(&sql)
            .await?
            .iter()
            .filter_map(catalog::table_summary)
            .collect())
    }

    async fn table_columns(&self, schema: &str, table: &str) -> Result<Vec<FieldDescriptor>> {
        let mut session = self.session().await?;
        lookup::table_columns(&self.profile, session.as_mut(), schema, table).await
    }

    async fn table_indexes(&self, schema: &str, table: &str) -> Result<Vec<IndexDescriptor>> {
        let sql = format!(
            "SHOW INDEXES FROM {} FROM {}",
            self.profile.quote_identifier(table),
            self.profile.quote_identifier(schema)
        );
        Ok(catalog::indexes(&self.rows(&sql).await?))
    }

    async fn key_usage(&self, schema: &str, table: Option<&str>) -> Result<Vec<KeyUsage>> {
        let mut session = self.session().await?;
        lookup::key_usage(&self.profile, session.as_mut(), schema, table).await
    }

    async fn view(&self, schema: &str, name: &str) -> Result<Option<ViewDescriptor>> {
        let mut session = self.session().await?;
        let row = self.show_create(session.as_mut(), "VIEW", schema, name).await?;
        Ok(row.and_then(|row| parse_view(schema, &row)))
    }

    async fn trigger(&self, schema: &str, name: &str) -> Result<Option<TriggerDescriptor>> {
        let mut session = self.session().await?;
        let row = self
            .show_create(session.as_mut(), "TRIGGER", schema, name)
            .await?;
        Ok(row.and_then(|row| parse_trigger(schema, &row)))
    }

    async fn routine(&self, schema: &str, name: &str) -> Result<Option<RoutineDescriptor>> {
        let mut session = self.session().await?;
        let Some(row) = self
            .show_create(session.as_mut(), "PROCEDURE", schema, name)
            .await?
        else {
            return Ok(None);
        };
        let parameters = self
            .routine_parameters(session.as_mut(), schema, name)
            .await?;
        Ok(parse_routine(schema, &row, parameters))
    }

    async fn function(&self, schema: &str, name: &str) -> Result<Option<FunctionDescriptor>> {
        let mut session = self.session().await?;
        let Some(row) = self
            .show_create(session.as_mut(), "FUNCTION", schema, name)
            .await?
        else {
            return Ok(None);
        };
        let parameters = self
            .routine_parameters(session.as_mut(), schema, name)
            .await?;
        Ok(parse_function(schema, &row, parameters))
    }

    async fn scheduler(&self, schema: &str, name: &str) -> Result<Option<SchedulerDescriptor>> {
        let mut session = self.session().await?;
        let row = self
            .show_create(session.as_mut(), "EVENT", schema, name)
            .await?;
        Ok(row.and_then(|row| parse_event(schema, &row)))
    }
}
