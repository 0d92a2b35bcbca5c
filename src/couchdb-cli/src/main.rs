//! couchdb-cli
//!
//! Command-line interface for a CouchDB server. Results are printed to
//! stdout as JSON; logs go to stderr.

use anyhow::Result;
use clap::{Parser, Subcommand};
use couchdb_rs::{ChangesQueryParameters, ChangesService, Client, Config, FeedEnd, Sequence};
use serde_json::Value;
use url::Url;

mod telemetry;

/// CouchDB CLI
#[derive(Parser, Debug)]
#[command(name = "couchdb-cli")]
#[command(about = "CLI for the CouchDB REST API")]
struct Args {
    /// Path to the JSON config file
    #[arg(short, long, default_value = "couchdb.json")]
    config: String,

    /// Server URL, overriding the config file
    #[arg(short, long, env = "COUCHDB_URL")]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the server welcome document
    Info,

    /// List running tasks
    Tasks,

    /// List all databases
    Dbs,

    /// Show database information
    Db {
        /// Database name
        name: String,
    },

    /// Create a database
    CreateDb {
        /// Database name
        name: String,
    },

    /// Delete a database
    DeleteDb {
        /// Database name
        name: String,
    },

    /// Fetch a document
    Get {
        /// Database name
        db: String,

        /// Document id
        id: String,
    },

    /// Read the changes feed of a database
    Changes {
        /// Database name
        db: String,

        /// Start after this sequence ("now" for new changes only)
        #[arg(long)]
        since: Option<String>,

        /// Keep the feed open and print changes as they arrive
        #[arg(short, long)]
        follow: bool,

        /// Include document bodies
        #[arg(long)]
        include_docs: bool,

        /// Maximum number of changes
        #[arg(long)]
        limit: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (mut config, load_error) = match Config::load(&args.config) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    if let Some(url) = &args.url {
        config.url = url.clone();
    }

    let _guard = telemetry::init_telemetry(&config.logging)?;
    if let Some(e) = load_error {
        tracing::warn!("Failed to load {}, using defaults: {}", args.config, e);
    }
    tracing::debug!("Using server {}", redact(&config.url));

    let client = Client::with_config(&config)?;

    match args.command {
        Commands::Info => print(&client.info().await?)?,
        Commands::Tasks => print(&client.active_tasks().await?)?,
        Commands::Dbs => print(&client.all_dbs().await?)?,
        Commands::Db { name } => print(&client.get_db(&name).await?)?,
        Commands::CreateDb { name } => print(&client.create_db(&name).await?)?,
        Commands::DeleteDb { name } => print(&client.delete_db(&name).await?)?,
        Commands::Get { db, id } => match client.database(db).get::<Value>(&id).await? {
            Some(doc) => print(&doc)?,
            None => anyhow::bail!("document {} not found", id),
        },
        Commands::Changes {
            db,
            since,
            follow,
            include_docs,
            limit,
        } => {
            let params = ChangesQueryParameters {
                since: since.map(Sequence::new),
                include_docs: Some(include_docs || config.changes.include_docs),
                limit,
                heartbeat: follow.then_some(config.changes.heartbeat_ms),
                ..ChangesQueryParameters::default()
            };
            let changes = client.database(db).changes();

            if follow {
                follow_changes(&changes, &params).await?;
            } else {
                print(&changes.poll(&params).await?)?;
            }
        }
    }

    Ok(())
}

/// Print changes one JSON object per line until the feed ends or Ctrl-C.
async fn follow_changes(changes: &impl ChangesService, params: &ChangesQueryParameters) -> Result<()> {
    let mut feed = changes.stream(params).await?;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            change = feed.next() => match change {
                Some(change) => println!("{}", serde_json::to_string(&change)?),
                None => break,
            },
            _ = &mut ctrl_c => {
                tracing::info!("Interrupted, closing feed");
                feed.stop();
                break;
            }
        }
    }

    match feed.finish().await? {
        FeedEnd::ReadError(e) => Err(e.into()),
        end => {
            tracing::debug!(?end, "Feed closed");
            Ok(())
        }
    }
}

fn print<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Hide the password part of a URL before logging it.
fn redact(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return raw.to_string();
    };
    if url.password().is_some() && url.set_password(Some("***")).is_err() {
        return "<redacted>".to_string();
    }
    url.to_string()
}
