use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

use modelgen::codegen::Factory;
use modelgen::config::{DbConfig, GeneratorConfig};
use modelgen::meta::Connection;
use modelgen::storage::FsStorage;

#[derive(Debug, Clone, ValueEnum)]
enum Database {
    Postgres,
}

#[derive(Parser, Debug)]
#[command(name = "modelgen")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Target database type
    database: Database,

    /// The name of the connection
    #[arg(short, long, default_value = "default")]
    connection: String,

    /// The name of the schema to map (all schemas when omitted)
    #[arg(short, long)]
    schema: Option<String>,

    /// The name of the table to generate (whole schema when omitted)
    #[arg(short, long)]
    table: Option<String>,

    /// Path to the generator configuration file
    #[arg(long, default_value = "./modelgen.toml")]
    config: PathBuf,

    /// Path to .env file for connection config
    #[arg(long, default_value = "./.env")]
    env_file: PathBuf,

    /// Verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    if let Err(e) = run() {
        error!(error = ?e, "Fatal error");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    info!("modelgen v{}", env!("CARGO_PKG_VERSION"));
    info!(
        database = ?cli.database,
        connection = ?cli.connection,
        schema = ?cli.schema,
        table = ?cli.table,
        "Starting model generation"
    );

    let db_config =
        DbConfig::load(&cli.env_file).context("Failed to load database configuration")?;
    debug!(connection = ?db_config.redacted_connection_string(), "Loaded configuration");

    let config =
        GeneratorConfig::load(&cli.config).context("Failed to load generator configuration")?;

    let connection = open_connection(&cli.database, &db_config, &cli.connection)?;
    let storage = FsStorage;
    let factory =
        Factory::on(&connection, &config, &storage).context("Failed to bind to connection")?;

    match (&cli.schema, &cli.table) {
        (Some(schema), Some(table)) => {
            info!(schema = ?schema, table = ?table, "Generating model for one table");
            factory.create(schema, table)?;
        }
        (Some(schema), None) => {
            info!(schema = ?schema, "Generating models for schema");
            factory.map(schema)?;
        }
        (None, Some(_)) => bail!("--table requires --schema"),
        (None, None) => {
            info!("Generating models for all schemas");
            factory.map_all()?;
        }
    }

    info!("Model generation complete");
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn open_connection(database: &Database, config: &DbConfig, name: &str) -> Result<Connection> {
    match database {
        Database::Postgres => open_postgres(config, name),
    }
}

#[cfg(feature = "postgres")]
fn open_postgres(config: &DbConfig, name: &str) -> Result<Connection> {
    use postgres::NoTls;

    info!(connection = ?config.redacted_connection_string(), "Connecting to PostgreSQL");

    let client = postgres::Client::connect(&config.postgres_connection_string(), NoTls)
        .with_context(|| {
            format!(
                "Failed to connect to PostgreSQL at {}",
                config.redacted_connection_string()
            )
        })?;

    info!("Connected to database");

    Ok(Connection::postgres(name, client))
}

#[cfg(not(feature = "postgres"))]
fn open_postgres(_config: &DbConfig, _name: &str) -> Result<Connection> {
    bail!("PostgreSQL support not enabled. Rebuild with --features postgres")
}
