//! Claim Circumstances Server
//!
//! REST API for storing and retrieving claim circumstances records.
//! Wires the SQLite store, the service layer and role checks into an axum
//! router.

#![warn(missing_docs)]

pub mod auth;
pub mod config;
pub mod envelope;
pub mod handlers;

use auth::Authorizer;
use circumstances_service::{CircumstancesService, ServiceError};
use circumstances_store::{SqliteStore, StoreError};
use config::ServerConfig;
use handlers::{create_router, AppState, ResourcePaths};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Database could not be opened
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Service operation failed
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Install the global tracing subscriber
///
/// Honors `RUST_LOG`, defaulting to `info`. Calling it twice is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Open the configured store and wrap it in a service
pub fn build_service(
    config: &ServerConfig,
) -> Result<CircumstancesService<SqliteStore>, ServerError> {
    let store = SqliteStore::new(&config.database_path)?;
    Ok(CircumstancesService::new(Arc::new(Mutex::new(store))))
}

/// Build application state from configuration
pub fn build_state(config: &ServerConfig) -> Result<AppState, ServerError> {
    let authorizer = if config.auth.enabled {
        Authorizer::new(&config.auth.jwt_secret)
    } else {
        warn!("Authorization disabled: every request is allowed");
        Authorizer::disabled()
    };

    Ok(AppState {
        service: build_service(config)?,
        authorizer: Arc::new(authorizer),
        paths: Arc::new(ResourcePaths::new(
            config.base_path.clone(),
            config.api_version.clone(),
        )),
    })
}

/// Claimant ids of up to `limit` records awaiting encryption at rest
pub fn unencrypted_report(config: &ServerConfig, limit: usize) -> Result<Vec<String>, ServerError> {
    let service = build_service(config)?;
    Ok(service.unencrypted_claimant_ids(limit)?)
}

/// Start the HTTP server
///
/// Initializes logging, opens the store, and serves until the process exits.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    init_tracing();

    info!("Starting claim circumstances service");
    info!("Bind address: {}", config.bind_addr());
    info!("Database: {}", config.database_path);
    info!("Base path: {}", config.base_path);

    let state = build_state(&config)?;
    let app = create_router(state, &config.base_path);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    Ok(())
}
