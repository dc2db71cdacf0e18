//! Binary entry point for chunkbase.
//!
//! This binary provides the CLI and the web form UI over one chunk store.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use chunkbase::config::{CONFIG_PATH_ENV, ChunkbaseConfig};
use chunkbase::io::{OutputFormat, write_files, write_hits, write_records};
use chunkbase::models::{VECTOR, parse_vector};
use chunkbase::services::{DEMO_QUERIES, demo_records, filename_condition};
use chunkbase::ui::{self, AppState};
use chunkbase::{Chunk, ChunkStore, DenseQuery, DistanceMetric, SqliteEngine, observability};
use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Chunkbase - text chunks with embeddings, searchable by keyword and by vector.
#[derive(Parser)]
#[command(name = "chunkbase")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Start the web form UI.
    Serve {
        /// Bind host (overrides config).
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides config).
        #[arg(short, long)]
        port: Option<u16>,

        /// Insert the demo rows before serving.
        #[arg(long)]
        seed: bool,
    },

    /// Insert the demo rows, create the full-text index and run the demo queries.
    Seed,

    /// Insert one chunk.
    Insert {
        /// Chunk text.
        #[arg(short, long)]
        text: String,

        /// Vector as comma-separated numbers.
        #[arg(long, allow_hyphen_values = true)]
        vector: String,

        /// Source filename.
        #[arg(short, long, default_value = "")]
        filename: String,

        /// Source file uuid (generated when omitted).
        #[arg(long)]
        file_uuid: Option<String>,
    },

    /// Delete rows matching a condition, e.g. "filename = 'test1.txt'".
    Delete {
        /// Condition expression.
        condition: String,
    },

    /// Full-text search.
    Search {
        /// Query (phrases, AND/OR/NOT, NEAR).
        query: String,

        /// Maximum number of results.
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Output format: table, json or csv.
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },

    /// Dense vector search.
    Similar {
        /// Query vector as comma-separated numbers.
        #[arg(allow_hyphen_values = true)]
        vector: String,

        /// Distance metric: l2, cosine or ip.
        #[arg(short, long, default_value = "l2")]
        metric: DistanceMetric,

        /// Maximum number of results.
        #[arg(short, long, default_value = "3")]
        limit: usize,

        /// Only consider chunks of this file.
        #[arg(short, long)]
        filename: Option<String>,

        /// Output format: table, json or csv.
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },

    /// List stored chunks.
    List {
        /// Group by filename instead of listing rows.
        #[arg(long)]
        by_filename: bool,

        /// Output format: table, json or csv.
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },

    /// Drop the chunk table.
    DropTable,

    /// Remove every database in the workspace.
    DropWorkspace {
        /// Confirm the removal.
        #[arg(long)]
        yes: bool,
    },

    /// Manage configuration.
    Config {
        /// Show current configuration.
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let observability = match observability::init(&config.logging, config.metrics, cli.verbose)
    {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Failed to initialize observability: {e}");
            return ExitCode::FAILURE;
        },
    };

    match run_command(cli, config, observability.metrics).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
async fn run_command(
    cli: Cli,
    config: ChunkbaseConfig,
    metrics: Option<PrometheusHandle>,
) -> CliResult {
    match cli.command {
        Commands::Serve { host, port, seed } => cmd_serve(config, host, port, seed, metrics).await,
        Commands::Seed => cmd_seed(&config),
        Commands::Insert {
            text,
            vector,
            filename,
            file_uuid,
        } => cmd_insert(&config, text, &vector, filename, file_uuid),
        Commands::Delete { condition } => cmd_delete(&config, &condition),
        Commands::Search {
            query,
            limit,
            format,
        } => cmd_search(&config, &query, limit, format),
        Commands::Similar {
            vector,
            metric,
            limit,
            filename,
            format,
        } => cmd_similar(&config, &vector, metric, limit, filename.as_deref(), format),
        Commands::List {
            by_filename,
            format,
        } => cmd_list(&config, by_filename, format),
        Commands::DropTable => cmd_drop_table(&config),
        Commands::DropWorkspace { yes } => cmd_drop_workspace(&config, yes),
        Commands::Config { show } => cmd_config(&config, show),
    }
}

/// Loads configuration.
fn load_config(path: Option<&str>) -> Result<ChunkbaseConfig, Box<dyn std::error::Error>> {
    // If a path is provided, load from that file
    let config = if let Some(config_path) = path {
        ChunkbaseConfig::load_from_file(Path::new(config_path))?
    } else {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(config_path) if !config_path.trim().is_empty() => {
                ChunkbaseConfig::load_from_file(Path::new(&config_path))?
            },
            _ => ChunkbaseConfig::load_default()?,
        }
    };
    Ok(config.apply_env()?)
}

/// Opens the configured store.
fn open_store(config: &ChunkbaseConfig) -> chunkbase::Result<ChunkStore<SqliteEngine>> {
    let engine = SqliteEngine::connect(&config.storage.workspace)?;
    ChunkStore::open(engine, config.store_settings())
}

/// Store over the configured workspace that has not created or checked
/// anything yet.
fn attach_store(config: &ChunkbaseConfig) -> chunkbase::Result<ChunkStore<SqliteEngine>> {
    let engine = SqliteEngine::connect(&config.storage.workspace)?;
    Ok(ChunkStore::attach(engine, config.store_settings()))
}

fn column_names(store: &ChunkStore<SqliteEngine>) -> Vec<String> {
    store
        .settings()
        .schema
        .column_names()
        .map(ToString::to_string)
        .collect()
}

fn seed(store: &ChunkStore<SqliteEngine>) -> chunkbase::Result<()> {
    let report = store.insert(demo_records())?;
    store.ensure_index()?;
    println!(
        "Seeded {} demo row(s) ({} rejected)",
        report.inserted,
        report.rejected.len()
    );
    for rejected in &report.rejected {
        println!("  record {}: {}", rejected.index, rejected.reason);
    }
    Ok(())
}

async fn cmd_serve(
    config: ChunkbaseConfig,
    host: Option<String>,
    port: Option<u16>,
    seed_first: bool,
    metrics: Option<PrometheusHandle>,
) -> CliResult {
    let store = open_store(&config)?;
    if seed_first {
        seed(&store)?;
    }
    store.ensure_index()?;

    let host = host.unwrap_or(config.server.host);
    let port = port.unwrap_or(config.server.port);
    println!("Serving chunkbase on http://{host}:{port}");

    let state = AppState::new(Arc::new(store)).with_metrics(metrics);
    ui::serve(state, &host, port).await?;
    Ok(())
}

fn cmd_seed(config: &ChunkbaseConfig) -> CliResult {
    let store = open_store(config)?;
    seed(&store)?;

    let columns = column_names(&store);
    for query in DEMO_QUERIES {
        let hits = store.search_by_text(query, 10)?;
        println!("\nquery: {query}");
        write_hits(std::io::stdout().lock(), OutputFormat::Table, &columns, "score", &hits)?;
    }
    Ok(())
}

fn cmd_insert(
    config: &ChunkbaseConfig,
    text: String,
    vector: &str,
    filename: String,
    file_uuid: Option<String>,
) -> CliResult {
    let store = open_store(config)?;
    let file_uuid = file_uuid.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    store.insert_chunk(Chunk {
        chunk_text: text,
        file_uuid: file_uuid.clone(),
        filename,
        vector: parse_vector(vector)?,
    })?;
    println!("Inserted chunk (file uuid {file_uuid})");
    Ok(())
}

fn cmd_delete(config: &ChunkbaseConfig, condition: &str) -> CliResult {
    let store = open_store(config)?;
    let deleted = store.delete(condition)?;
    println!("Deleted {deleted} row(s)");
    Ok(())
}

fn cmd_search(config: &ChunkbaseConfig, query: &str, limit: usize, format: OutputFormat) -> CliResult {
    let store = open_store(config)?;
    let hits = store.search_by_text(query, limit)?;
    write_hits(
        std::io::stdout().lock(),
        format,
        &column_names(&store),
        "score",
        &hits,
    )?;
    Ok(())
}

fn cmd_similar(
    config: &ChunkbaseConfig,
    vector: &str,
    metric: DistanceMetric,
    limit: usize,
    filename: Option<&str>,
    format: OutputFormat,
) -> CliResult {
    let store = open_store(config)?;
    let mut query = DenseQuery::new(VECTOR, parse_vector(vector)?, metric, limit);
    if let Some(condition) = filename.and_then(filename_condition) {
        query = query.with_filter(condition);
    }
    let hits = store.search_dense(&query)?;
    write_hits(
        std::io::stdout().lock(),
        format,
        &column_names(&store),
        metric.score_label(),
        &hits,
    )?;
    Ok(())
}

fn cmd_list(config: &ChunkbaseConfig, by_filename: bool, format: OutputFormat) -> CliResult {
    let store = open_store(config)?;
    let out = std::io::stdout().lock();
    if by_filename {
        write_files(out, format, &store.list_by_filename()?)?;
    } else {
        write_records(out, format, &column_names(&store), &store.list_all()?)?;
    }
    Ok(())
}

fn cmd_drop_table(config: &ChunkbaseConfig) -> CliResult {
    attach_store(config)?.drop_table()?;
    println!("Dropped table '{}'", config.storage.table);
    Ok(())
}

fn cmd_drop_workspace(config: &ChunkbaseConfig, yes: bool) -> CliResult {
    if !yes {
        return Err(format!(
            "refusing to remove workspace '{}' without --yes",
            config.storage.workspace
        )
        .into());
    }
    attach_store(config)?.drop_workspace()?;
    println!("Removed workspace '{}'", config.storage.workspace);
    Ok(())
}

fn cmd_config(config: &ChunkbaseConfig, show: bool) -> CliResult {
    if show {
        print!("{}", config.to_toml()?);
    } else {
        println!("Config file lookup order:");
        println!("  --config <path> or ${CONFIG_PATH_ENV}");
        for path in ChunkbaseConfig::default_paths() {
            println!("  {}", path.display());
        }
        println!("Run with --show to print the effective configuration.");
    }
    Ok(())
}
