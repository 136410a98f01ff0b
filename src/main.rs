//! csv-ingest - load CSV files into PostgreSQL tables

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};

use csv_ingest::config::Config;
use csv_ingest::{Loader, MemorySink, PostgresSink};

/// Load the configured CSV files into PostgreSQL in fixed-size batches
#[derive(Parser, Debug)]
#[command(name = "csv-ingest")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file (built-in table definitions when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory containing the source CSV files
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Database host
    #[arg(long)]
    host: Option<String>,

    /// Database port
    #[arg(long)]
    port: Option<u16>,

    /// Database name
    #[arg(long)]
    database: Option<String>,

    /// Database user
    #[arg(long)]
    user: Option<String>,

    /// Database password
    #[arg(long, env = "CSV_INGEST_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Destination schema for all tables
    #[arg(long)]
    schema: Option<String>,

    /// Read and normalize every file without connecting to the database
    #[arg(long)]
    dry_run: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn init_logging(verbose: bool) {
    let mut env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // -v wins over a quieter RUST_LOG
    if verbose {
        env = env.add_directive(LevelFilter::DEBUG.into());
    }
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_path(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => Config::builtin(PathBuf::from("data")),
    };

    if let Some(dir) = &cli.source_dir {
        config.source_directory = dir.clone();
    }
    if let Some(host) = &cli.host {
        config.connection.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.connection.port = port;
    }
    if let Some(database) = &cli.database {
        config.connection.database = database.clone();
    }
    if let Some(user) = &cli.user {
        config.connection.user = user.clone();
    }
    if let Some(password) = &cli.password {
        config.connection.password = password.clone();
    }
    if let Some(schema) = &cli.schema {
        config.schema = schema.clone();
    }
    Ok(config)
}

/// Copy of the config that is safe to print
fn masked(config: &Config) -> Config {
    let mut config = config.clone();
    if !config.connection.password.is_empty() {
        config.connection.password = "********".to_string();
    }
    config
}

fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli)?;

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&masked(&config))?);
        return Ok(());
    }

    let loader = Loader::new(config)?;
    let summary = if cli.dry_run {
        info!("dry run: no data will be written");
        loader.run_with(|_| Ok(MemorySink::counting()))?
    } else {
        loader.run_with(|config| PostgresSink::connect(&config.connection))?
    };

    for table in &summary.tables {
        println!(
            "{}: {} rows in {} batches",
            table.table, table.rows, table.batches
        );
    }
    Ok(())
}
