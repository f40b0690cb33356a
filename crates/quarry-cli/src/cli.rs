//! `quarry` command-line tool
//!
//! Runs SQL batches, splits scripts, compiles table definitions to DDL and
//! inspects live schemas through the configured connections.

mod logging;
mod output;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use quarry_core::{ConnectionConfig, EngineConfig, SchemaIntrospection, dialect_profile};
use quarry_drivers::DriverRegistry;
use quarry_drivers::mysql::MySqlClient;
use quarry_query::{QueryOptions, split_statements};
use quarry_table_designer::{DdlCompiler, TableDefinition, TableDiff};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "quarry")]
#[command(author, version, about = "Cross-dialect SQL toolkit", long_about = None)]
struct Cli {
    /// Configuration file (defaults to <config dir>/quarry/config.toml)
    #[arg(short, long, env = "QUARRY_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a SQL file (or stdin) statement by statement
    Run {
        #[command(flatten)]
        target: Target,

        /// SQL file; `-` or absent reads stdin
        file: Option<PathBuf>,

        /// Execute the text as one statement
        #[arg(long)]
        no_split: bool,

        /// Attach column and key metadata to result fields
        #[arg(long)]
        details: bool,

        /// Remove comments before splitting
        #[arg(long)]
        strip_comments: bool,

        /// Name result columns `table.column`
        #[arg(long)]
        nest: bool,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the statements a script splits into
    Split {
        file: PathBuf,

        #[arg(short, long, default_value = "mysql")]
        dialect: String,
    },

    /// Compile a JSON table definition (or diff) into DDL
    Ddl {
        file: PathBuf,

        #[arg(short, long, default_value = "mysql")]
        dialect: String,

        /// Treat the file as a diff against an existing table
        #[arg(long)]
        alter: bool,

        /// Execute the statements on this connection instead of printing
        #[arg(long, value_name = "NAME")]
        apply: Option<String>,
    },

    /// Describe live schema objects as JSON
    Inspect {
        #[command(flatten)]
        target: Target,

        #[command(subcommand)]
        object: Inspect,
    },
}

#[derive(Args)]
struct Target {
    /// Named connection from the configuration file
    #[arg(long, short = 'C', env = "QUARRY_CONNECTION")]
    connection: Option<String>,

    /// Host of an ad-hoc connection
    #[arg(long, short = 'H')]
    host: Option<String>,

    #[arg(long, default_value = "mysql")]
    driver: String,

    #[arg(long, short = 'P', default_value_t = 0)]
    port: u16,

    #[arg(long, short)]
    user: Option<String>,

    #[arg(long, env = "QUARRY_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Default schema of the session
    #[arg(long, short)]
    schema: Option<String>,
}

#[derive(Subcommand)]
enum Inspect {
    /// Schema names
    Schemas,
    /// Tables, routines, triggers and events per schema
    Structure { schemas: Vec<String> },
    /// Columns, indexes and foreign keys of a table
    Table { schema: String, table: String },
    View { schema: String, name: String },
    Trigger { schema: String, name: String },
    Procedure { schema: String, name: String },
    Function { schema: String, name: String },
    Event { schema: String, name: String },
    /// Version, engines and accounts of the server
    Server,
}

#[derive(Serialize)]
struct TableReport {
    columns: Vec<quarry_core::FieldDescriptor>,
    indexes: Vec<quarry_core::IndexDescriptor>,
    foreign_keys: Vec<quarry_core::KeyUsage>,
}

#[derive(Serialize)]
struct ServerReport {
    version: quarry_core::VersionInfo,
    engines: Vec<quarry_core::EngineInfo>,
    users: Vec<quarry_core::UserInfo>,
}

fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn resolve(target: &Target, config: &EngineConfig) -> anyhow::Result<ConnectionConfig> {
    let mut resolved = match (&target.connection, &target.host) {
        (Some(name), _) => config.connection(name)?.clone(),
        (None, Some(host)) => {
            let mut adhoc = ConnectionConfig::new(&target.driver, host);
            adhoc.port = target.port;
            adhoc.user = target.user.clone();
            adhoc.password = target.password.clone();
            adhoc
        }
        (None, None) => bail!("pass --connection NAME or --host HOST"),
    };
    if target.schema.is_some() {
        resolved.schema = target.schema.clone();
    }
    Ok(resolved)
}

async fn open(connection: ConnectionConfig, config: &EngineConfig) -> anyhow::Result<MySqlClient> {
    let registry = DriverRegistry::with_defaults();
    let pool = registry
        .connect(&connection)
        .await
        .with_context(|| format!("failed to connect to {}", connection.host))?;
    let profile = dialect_profile(pool.dialect_id())?;

    let client = MySqlClient::new(pool, profile).with_settings(config.objects.clone());
    Ok(match connection.schema {
        Some(schema) => client.with_schema(schema),
        None => client,
    })
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn inspect(client: &MySqlClient, object: Inspect) -> anyhow::Result<()> {
    match object {
        Inspect::Schemas => print_json(&client.schemas().await?),
        Inspect::Structure { schemas } => print_json(&client.structure(&schemas).await?),
        Inspect::Table { schema, table } => print_json(&TableReport {
            columns: client.table_columns(&schema, &table).await?,
            indexes: client.table_indexes(&schema, &table).await?,
            foreign_keys: client.key_usage(&schema, Some(&table)).await?,
        }),
        Inspect::View { schema, name } => print_json(&client.view(&schema, &name).await?),
        Inspect::Trigger { schema, name } => print_json(&client.trigger(&schema, &name).await?),
        Inspect::Procedure { schema, name } => print_json(&client.routine(&schema, &name).await?),
        Inspect::Function { schema, name } => print_json(&client.function(&schema, &name).await?),
        Inspect::Event { schema, name } => print_json(&client.scheduler(&schema, &name).await?),
        Inspect::Server => print_json(&ServerReport {
            version: client.version().await?,
            engines: client.engines().await?,
            users: client.users().await?,
        }),
    }
}

async fn ddl(
    file: &Path,
    dialect: &str,
    alter: bool,
    apply: Option<String>,
    config: &EngineConfig,
) -> anyhow::Result<()> {
    let text = read_input(Some(file))?;
    let profile = dialect_profile(dialect)?;

    if let Some(name) = apply {
        let client = open(config.connection(&name)?.clone(), config).await?;
        if alter {
            let diff: TableDiff = serde_json::from_str(&text)?;
            client.alter_table(&diff).await?;
        } else {
            let definition: TableDefinition = serde_json::from_str(&text)?;
            client.create_table(&definition).await?;
        }
        client.close().await?;
        eprintln!("applied to '{}'", name);
        return Ok(());
    }

    let statements = if alter {
        let diff: TableDiff = serde_json::from_str(&text)?;
        DdlCompiler::compile_alter(&diff, &profile)?
    } else {
        let definition: TableDefinition = serde_json::from_str(&text)?;
        DdlCompiler::compile_create(&definition, &profile)?
    };
    for statement in statements {
        println!("{};", statement);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = EngineConfig::load_or_default(cli.config.as_deref())?;
    let _guard = logging::init(&config.logging, cli.verbose)?;

    match cli.command {
        Commands::Run {
            target,
            file,
            no_split,
            details,
            strip_comments,
            nest,
            json,
        } => {
            let sql = read_input(file.as_deref())?;
            let connection = resolve(&target, &config)?;
            let mut options = QueryOptions::from(&config.query)
                .with_details(details || config.query.details)
                .with_comments(!strip_comments && config.query.comments)
                .with_nest(nest);
            if no_split {
                options = options.with_split(false);
            }
            if let Some(schema) = connection.schema.clone() {
                options = options.with_schema(schema);
            }

            let client = open(connection, &config).await?;
            let results = client.raw(&sql, &options).await?.into_vec();
            client.close().await?;

            if json {
                print_json(&results)?;
            } else {
                for result in &results {
                    println!("{}", output::render_result(result));
                }
            }
        }
        Commands::Split { file, dialect } => {
            let profile = dialect_profile(&dialect)?;
            for statement in split_statements(&read_input(Some(&file))?, &profile) {
                println!("{};\n", statement);
            }
        }
        Commands::Ddl {
            file,
            dialect,
            alter,
            apply,
        } => ddl(&file, &dialect, alter, apply, &config).await?,
        Commands::Inspect { target, object } => {
            let client = open(resolve(&target, &config)?, &config).await?;
            let outcome = inspect(&client, object).await;
            client.close().await?;
            outcome?;
        }
    }

    Ok(())
}
