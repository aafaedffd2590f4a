//! # blogchain-server
//!
//! Single-node host for the Blogchain state machine.
//!
//! This binary provides:
//! - **Action dispatch**: inbound `Msg` values are validated and applied to
//!   the store one transaction at a time
//! - **Query surface** over posts, comment threads, profiles and follows
//! - **HTTP gateway** (axum) exposing both, with request tracing and CORS

mod api;
mod app;
mod config;
mod error;

use std::sync::Arc;

use blogchain_shared::address::Bech32Codec;
use blogchain_shared::events::TracingSink;
use blogchain_store::Database;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,blogchain_server=debug")),
        )
        .init();

    info!("Starting Blogchain node v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Open the store (runs migrations)
    // -----------------------------------------------------------------------
    let db = match &config.db_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };
    if let Some(path) = db.path() {
        info!(path = %path.display(), "Database ready");
    }

    let app = Arc::new(App::new(
        db,
        Arc::new(Bech32Codec::new(config.address_prefix.clone())),
        Arc::new(TracingSink),
        config.default_thread_depth,
    ));

    // -----------------------------------------------------------------------
    // 4. Run the HTTP gateway (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP gateway failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
