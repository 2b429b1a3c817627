//! centralconfig binary
//!
//! Runs the HTTP service and manages the store file.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use centralconfig::datastore::open_datastore;
use centralconfig::http::{AppState, Server};
use centralconfig::settings::{DatastoreKind, Settings};
use centralconfig::{ConfigDatastore, FileStore, Result, StoreConfig, StoreError};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// centralconfig
#[derive(Parser, Debug)]
#[command(name = "centralconfig")]
#[command(about = "A simple REST service for application configuration")]
#[command(version)]
struct Args {
    /// Settings file (default is $HOME/centralconfig.toml, then ./centralconfig.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Interface to bind (empty for all)
        #[arg(short, long)]
        bind: Option<String>,

        /// Store file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Keep everything in memory (nothing is persisted)
        #[arg(long)]
        memory: bool,
    },

    /// Create a new, empty store file
    Init {
        /// Store file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Reset an existing store file. Destroys all stored items!
        #[arg(long)]
        overwrite: bool,
    },

    /// Print the effective settings
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,centralconfig=debug"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let loaded = Settings::load(args.config.as_deref())?;
    match &loaded.source {
        Some(path) => tracing::debug!(path = %path.display(), "Loaded settings file"),
        None => tracing::warn!("No settings file found, using defaults and environment"),
    }
    let mut settings = loaded.settings;

    match args.command {
        Commands::Serve {
            port,
            bind,
            database,
            memory,
        } => {
            if let Some(port) = port {
                settings.server.port = port;
            }
            if let Some(bind) = bind {
                settings.server.bind = bind;
            }
            if let Some(database) = database {
                settings.datastore.database = database;
            }
            if memory {
                settings.datastore.kind = DatastoreKind::Memory;
            }
            serve(settings).await
        }
        Commands::Init {
            database,
            overwrite,
        } => {
            let path = database.unwrap_or(settings.datastore.database);
            init(&path, overwrite)
        }
        Commands::Config => {
            let json = serde_json::to_string_pretty(&settings)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            println!("{}", json);
            Ok(())
        }
    }
}

async fn serve(settings: Settings) -> Result<()> {
    tracing::info!("centralconfig v{}", centralconfig::VERSION);
    tracing::info!(
        datastore = %settings.datastore.kind,
        database = %settings.datastore.database.display(),
        "Opening datastore"
    );

    let store = open_datastore(&settings.datastore)?;
    let state = AppState::new(store, settings.server.allowed_origins());

    let server = Server::bind(&settings.server.listen_addr(), state).await?;
    server.run().await
}

/// Create the store file; refuses to touch an existing one unless `overwrite`
fn init(path: &Path, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        return Err(StoreError::Config(format!(
            "Store file {} already exists; pass --overwrite to reset it (all items will be lost)",
            path.display()
        )));
    }

    let config = StoreConfig::builder().database(path).build();
    let store = if overwrite {
        // Skips recovery; a damaged file is replaced too
        FileStore::create(config)?
    } else {
        let store = FileStore::open(config)?;
        store.init_store(false)?;
        store
    };
    store.close()?;

    tracing::info!(path = %path.display(), overwrite, "Store initialized");
    Ok(())
}
