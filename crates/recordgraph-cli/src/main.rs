//! RecordGraph CLI
//!
//! The `recordgraph` command saves a demo object graph and inspects records.
//!
//! ## Commands
//!
//! - `demo`: save two authors who reference each other, plus their books
//! - `get`: look up the first record of a class whose field equals a value

mod model;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use recordgraph_core::{GraphSaver, ObjectRef, Query, Session};
use recordgraph_state::encoding::{decode_value, record_to_json};
use recordgraph_state::{RecordHandle, StoreConfig, SurrealRecordStore};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "recordgraph")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Save object graphs as linked records", long_about = None)]
struct Cli {
    /// Store URL (mem://, surrealkv://path, ws://host:port)
    #[arg(long, global = true, env = "SURREALDB_URL")]
    url: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save the demo author graph and print the stored records
    Demo,

    /// Print the first record of CLASS whose FIELD equals VALUE
    Get {
        /// Remote class name
        class: String,

        /// Stored field name
        field: String,

        /// Value to match; parsed as JSON when possible, else a string
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    recordgraph_core::init_tracing(cli.json, level);

    let config = match &cli.url {
        Some(url) => StoreConfig::url(url.as_str()),
        None => StoreConfig::from_env(),
    };
    let store = SurrealRecordStore::connect(&config)
        .await
        .context("Failed to connect to record store")?;
    let session = Session::new(Arc::new(store));

    match cli.command {
        Commands::Demo => cmd_demo(&session).await,
        Commands::Get {
            class,
            field,
            value,
        } => cmd_get(&session, &class, &field, &value).await,
    }
}

/// Save the demo graph and print every stored author and book.
async fn cmd_demo(session: &Session) -> Result<()> {
    let root: ObjectRef = model::demo_graph();

    let mut saver = GraphSaver::new(session.clone());
    let record = saver.save(&root).await.context("Failed to save demo graph")?;
    let stats = saver.stats();
    info!(
        object_id = ?record.object_id(),
        objects_saved = stats.objects_saved,
        cycles_reused = stats.cycles_reused,
        "demo graph saved"
    );

    let mut documents = Vec::new();
    for class in ["Author", "Book"] {
        for handle in session.find(&Query::new(class)).await? {
            documents.push(record_to_json(&handle)?);
        }
    }
    println!("{}", serde_json::to_string_pretty(&documents)?);
    Ok(())
}

async fn cmd_get(session: &Session, class: &str, field: &str, raw: &str) -> Result<()> {
    let json = serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::from(raw));
    let value = decode_value(&json).context("Unsupported lookup value")?;

    let query = Query::new(class).where_equal_to(field, value);
    match session.first(&query).await? {
        Some(record) => print_record(&record),
        None => {
            println!("not found");
            Ok(())
        }
    }
}

fn print_record(record: &RecordHandle) -> Result<()> {
    let document = record_to_json(record)?;
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}
