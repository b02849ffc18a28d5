//! mcat-api - music catalogue HTTP service
//!
//! Settings resolve CLI > environment > config file > compiled default.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use mcat_api::{build_router, db, AppState};
use mcat_common::config::{
    self, config_file_path, load_toml_config, DEFAULT_BIND_ADDRESS, DEFAULT_CORS_ORIGIN,
    DEFAULT_LOG_LEVEL, DEFAULT_PORT,
};
use mcat_common::SongValidator;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Database path selecting a throwaway in-memory store
const MEMORY_DATABASE: &str = ":memory:";

#[derive(Parser, Debug)]
#[command(name = "mcat-api", version, about = "Music catalogue HTTP service")]
struct Args {
    /// Config file (default: <config_dir>/mcat/config.toml)
    #[arg(short, long, env = "MCAT_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "MCAT_BIND_ADDRESS")]
    bind_address: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "MCAT_PORT")]
    port: Option<u16>,

    /// SQLite database file, or ":memory:"
    #[arg(long, env = "MCAT_DATABASE_PATH")]
    database_path: Option<PathBuf>,

    /// Front-end origin allowed by CORS
    #[arg(long, env = "MCAT_CORS_ORIGIN")]
    cors_origin: Option<String>,

    /// Log level or filter directives (RUST_LOG takes precedence)
    #[arg(long, env = "MCAT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Include internal error details in 500 responses
    #[arg(long, env = "MCAT_EXPOSE_INTERNAL_ERRORS")]
    expose_internal_errors: Option<bool>,

    /// Catalogue schema preset ("default" or "catalan")
    #[arg(long, env = "MCAT_CATALOG_PRESET")]
    catalog_preset: Option<String>,
}

/// Filter directives for a bare level, or the value as-is if it already
/// names targets
fn log_directives(level: &str) -> String {
    if level.contains('=') {
        level.to_string()
    } else {
        format!("mcat_api={0},mcat_common={0},tower_http={0}", level)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config file is read before tracing starts so its log level applies;
    // its location is reported once logging is up
    let config_path = config_file_path(args.config.as_deref());
    let file_config = load_toml_config(config_path.as_deref()).context("Failed to load config file")?;

    let log_level = config::resolve(
        args.log_level.clone(),
        file_config.log_level.clone(),
        DEFAULT_LOG_LEVEL.to_string(),
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_directives(&log_level))),
        )
        .init();

    // Build identification immediately after tracing init
    info!(
        "Starting music catalogue (mcat-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match &config_path {
        Some(path) if path.exists() => info!("Config file: {}", path.display()),
        Some(path) => warn!("Config file not found at {}, using defaults", path.display()),
        None => warn!("No config directory available, using defaults"),
    }

    let mut catalog = file_config.catalog.clone();
    if args.catalog_preset.is_some() {
        catalog.preset = args.catalog_preset.clone();
    }
    let schema = catalog.to_schema().context("Invalid catalog configuration")?;
    info!(
        "Catalog schema v{}: {} genres, default sort {}, page size {} (max {})",
        schema.version,
        schema.genres.len(),
        schema.default_sort.as_str(),
        schema.default_limit,
        schema.max_limit
    );

    let database_path = config::resolve(
        args.database_path.clone(),
        file_config.database_path.clone(),
        config::default_database_path(),
    );
    let pool = if database_path.as_os_str() == MEMORY_DATABASE {
        warn!("Using in-memory database, data is lost on shutdown");
        db::init_memory_database().await
    } else {
        info!("Database path: {}", database_path.display());
        db::init_database(&database_path).await
    };
    let pool = match pool {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e).context("Database initialization failed");
        }
    };

    let cors_origin = config::resolve(
        args.cors_origin.clone(),
        file_config.cors_origin.clone(),
        DEFAULT_CORS_ORIGIN.to_string(),
    );
    let expose_internal_errors = config::resolve(
        args.expose_internal_errors,
        file_config.expose_internal_errors,
        false,
    );
    if expose_internal_errors {
        warn!("Internal error details will be included in 500 responses");
    }

    let state = AppState::new(pool.clone(), SongValidator::new(schema))
        .with_cors_origin(cors_origin.clone())
        .with_exposed_internal_errors(expose_internal_errors);
    let app = build_router(state);

    let bind_address = config::resolve(
        args.bind_address.clone(),
        file_config.bind_address.clone(),
        DEFAULT_BIND_ADDRESS.to_string(),
    );
    let port = config::resolve(args.port, file_config.port, DEFAULT_PORT);
    let addr: SocketAddr = format!("{}:{}", bind_address, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", bind_address, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("mcat-api listening on http://{}", addr);
    info!("CORS origin: {}", cors_origin);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }
}
