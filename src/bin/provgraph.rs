//! provgraph CLI: store PROV documents in SQLite and read them back.
//!
//! Usage:
//!   provgraph import <file> [--format json|xml|provn] [--db path]
//!   provgraph export <id> [--format json|provn] [--db path]
//!   provgraph list [--db path]
//!   provgraph delete <id> [--db path]

use clap::{Parser, Subcommand};
use provgraph::{
    ApiConfig, ContainerId, Format, LogConfig, OpenStore, ProvApi, ProvStore, SqliteStore,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "provgraph",
    version,
    about = "Store W3C PROV documents in a graph database"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a document and print its id
    Import {
        /// PROV document to import
        file: PathBuf,
        /// Input format; guessed from the content if omitted
        #[arg(long)]
        format: Option<Format>,
    },
    /// Print a stored document
    Export {
        /// Document id
        id: String,
        /// Output format
        #[arg(long, default_value = "json")]
        format: Format,
    },
    /// List stored document ids
    List,
    /// Delete a stored document
    Delete {
        /// Document id
        id: String,
    },
}

/// Get the default database path (~/.local/share/provgraph/provgraph.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("provgraph").join("provgraph.db")
}

fn init_logging(level: &str) -> Result<(), String> {
    let filter = LogConfig::new(level)
        .level_filter()
        .map_err(|e| e.to_string())?;
    tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ApiConfig, String> {
    match path {
        Some(path) => ApiConfig::from_path(path)
            .map_err(|e| format!("Failed to load {}: {}", path.display(), e)),
        None => Ok(ApiConfig::default()),
    }
}

fn open_store(db: Option<PathBuf>, config: &ApiConfig) -> Result<Arc<SqliteStore>, String> {
    let db_path = db
        .or_else(|| config.db_path.clone())
        .unwrap_or_else(default_db_path);
    SqliteStore::open(&db_path)
        .map(Arc::new)
        .map_err(|e| format!("Failed to open database: {}", e))
}

fn cmd_import(api: &ProvApi, file: &Path, format: Option<Format>) -> i32 {
    let text = match std::fs::read_to_string(file) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {}", file.display(), e);
            return 1;
        }
    };
    let format = format.unwrap_or_else(|| Format::detect(&text));
    match api.create_document_from(&text, format) {
        Ok(id) => {
            println!("{}", id);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_export(api: &ProvApi, id: &str, format: Format) -> i32 {
    match api.get_document_as(&ContainerId::from(id), format) {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_list(api: &ProvApi) -> i32 {
    match api.list_documents() {
        Ok(ids) if ids.is_empty() => {
            println!("No documents stored.");
            0
        }
        Ok(ids) => {
            for id in ids {
                println!("{}", id);
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_delete(store: &SqliteStore, id: &str) -> i32 {
    match store.delete_document(&ContainerId::from(id)) {
        Ok(true) => {
            println!("Deleted document {}", id);
            0
        }
        Ok(false) => {
            eprintln!("Error: document {} not found", id);
            1
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn run(cli: Cli) -> Result<i32, String> {
    init_logging(&cli.log_level)?;
    let config = load_config(cli.config.as_deref())?;
    let store = open_store(cli.db, &config)?;
    let api = ProvApi::new(store.clone() as Arc<dyn ProvStore>, config)
        .map_err(|e| format!("Invalid configuration: {}", e))?;

    let code = match cli.command {
        Commands::Import { file, format } => cmd_import(&api, &file, format),
        Commands::Export { id, format } => cmd_export(&api, &id, format),
        Commands::List => cmd_list(&api),
        Commands::Delete { id } => cmd_delete(&store, &id),
    };
    Ok(code)
}

fn main() {
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };
    std::process::exit(code);
}
