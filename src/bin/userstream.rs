use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use user_stream::{
    batch_processing, calculate_average_age, lazy_paginate, seed, stream_users, Config, Result,
    Store,
};

#[derive(Parser)]
#[command(name = "userstream")]
#[command(about = "Stream the user_data table without loading it into memory")]
#[command(version)]
struct Cli {
    /// SQLite database file (overrides the config file)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create user_data and load rows from a CSV file (name,email,age)
    Seed {
        /// CSV file to load
        #[arg(long)]
        csv: PathBuf,
    },
    /// Print every user, one at a time, with names remapped
    StreamUsers {
        /// Stop after this many users
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Scan in batches and print users older than the age threshold
    Batch {
        /// Rows per batch
        #[arg(long, allow_negative_numbers = true)]
        batch_size: Option<i64>,
        /// Users strictly older than this are printed
        #[arg(long)]
        min_age: Option<f64>,
    },
    /// Print users page by page
    Paginate {
        /// Rows per page
        #[arg(long, allow_negative_numbers = true)]
        page_size: Option<i64>,
    },
    /// Print the average age of all users
    AverageAge,
}

fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match Config::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_lowercase())),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run_command(cli, config) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run_command(cli: Cli, config: Config) -> Result<()> {
    let database = cli.database.unwrap_or(config.database_path.clone());
    let format = cli.format;
    let mut store = Store::open(&database)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Seed { csv } => {
            seed::create_table(&store)?;
            let inserted = seed::insert_data(&mut store, &csv)?;
            let total = seed::count_users(&store)?;
            match format {
                OutputFormat::Text => {
                    writeln!(out, "Inserted {inserted} users ({total} total)")?
                }
                OutputFormat::Json => emit_json(
                    &mut out,
                    &serde_json::json!({ "inserted": inserted, "total": total }),
                )?,
            }
        }
        Commands::StreamUsers { limit } => {
            let mut stream = stream_users(&store, &config.name_map)?;
            let limit = limit.unwrap_or(usize::MAX);
            for user in stream.by_ref().take(limit) {
                emit(&mut out, format, &user?)?;
            }
            stream.close();
        }
        Commands::Batch {
            batch_size,
            min_age,
        } => {
            let batch_size = batch_size.unwrap_or(config.batch_size);
            let min_age = min_age.unwrap_or(config.min_age);
            for user in batch_processing(&store, batch_size, min_age)? {
                emit(&mut out, format, &user)?;
            }
        }
        Commands::Paginate { page_size } => {
            let page_size = page_size.unwrap_or(config.page_size);
            for (number, page) in lazy_paginate(&store, page_size)?.enumerate() {
                let page = page?;
                info!(page = number + 1, rows = page.len(), "page fetched");
                for user in &page {
                    emit(&mut out, format, user)?;
                }
            }
        }
        Commands::AverageAge => {
            let average = calculate_average_age(&store)?;
            match format {
                OutputFormat::Text => writeln!(out, "{average}")?,
                OutputFormat::Json => emit_json(&mut out, &average)?,
            }
        }
    }

    out.flush()?;
    store.close()
}

fn emit<T: Serialize + std::fmt::Display>(
    out: &mut impl Write,
    format: OutputFormat,
    value: &T,
) -> Result<()> {
    match format {
        OutputFormat::Text => writeln!(out, "{value}")?,
        OutputFormat::Json => emit_json(out, value)?,
    }
    Ok(())
}

fn emit_json<T: Serialize>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, value).map_err(io::Error::from)?;
    writeln!(out)?;
    Ok(())
}
