//! # phantom-server
//!
//! HTTP backend for the Phantom movie catalogue.
//!
//! This binary provides:
//! - **Public reads**: movie lookup, free-text search, genre search over a
//!   trailing twelve-month window, and paged listings of movies and comments
//! - **Accounts**: registration and login, issuing stateless access tokens
//! - **Protected writes** behind a bearer token: movie create/replace, and
//!   comment create/edit/delete scoped to the comment's owner

mod api;
mod auth;
mod config;
mod error;
mod ownership;
mod password;
mod planner;
mod store;
mod validate;

use std::sync::Arc;

use anyhow::Context;
use phantom_shared::crypto::generate_symmetric_key;
use phantom_shared::TokenService;
use phantom_store::Database;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::{ServerConfig, ENV_FILE};
use crate::store::ContentStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Load app.env (optional), then initialize tracing
    // -----------------------------------------------------------------------
    let env_file = dotenvy::from_filename(ENV_FILE);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,phantom_server=debug")),
        )
        .init();

    info!("Starting Phantom server v{}", env!("CARGO_PKG_VERSION"));
    match env_file {
        Ok(path) => info!(path = %path.display(), "Loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, file = ENV_FILE, "Could not read environment file"),
    }

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------
    let tokens = match &config.token_symmetric_key {
        Some(secret) => {
            TokenService::from_secret(secret).context("TOKEN_SYMMETRIC_KEY rejected")?
        }
        None => {
            warn!("TOKEN_SYMMETRIC_KEY not set; using a random key, tokens will not survive a restart");
            TokenService::new(generate_symmetric_key())
        }
    };
    tokens
        .issue("startup-check", config.access_token_duration)
        .context("ACCESS_TOKEN_DURATION cannot be used as a token lifetime")?;

    let db_path = match &config.database_path {
        Some(path) => path.clone(),
        None => Database::default_path()?,
    };
    let database = Database::open_at(&db_path)
        .with_context(|| format!("opening database at {}", db_path.display()))?;

    let http_addr = config.http_addr;
    let app_state = AppState {
        store: ContentStore::new(database),
        tokens: Arc::new(tokens),
        config: Arc::new(config),
    };

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
