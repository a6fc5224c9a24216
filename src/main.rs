//! Course Market - course marketplace backend
//!
//! Administrators create and publish courses; users browse and purchase
//! them. Every protected route sits behind the gate of its role.

use std::sync::Arc;

use tokio::net::TcpListener;

mod api;
mod auth;
mod config;
mod domain;
mod error;
mod logging;
mod storage;

use crate::api::build_router;
use crate::auth::{JwtManager, RoleGate, SecretHasher};
use crate::config::{AuthConfig, Config};
use crate::domain::Role;
use crate::storage::CatalogStore;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Catalog persistence.
    pub store: Arc<dyn CatalogStore>,
    /// Gate for administrator routes.
    pub admin_gate: RoleGate,
    /// Gate for user routes.
    pub user_gate: RoleGate,
}

impl AppState {
    /// Wire one gate per role over a shared store.
    pub fn new(auth: &AuthConfig, store: Arc<dyn CatalogStore>) -> Self {
        let hasher = SecretHasher::new(auth.hash_cost);

        let admin_gate = RoleGate::new(
            auth.strategy,
            JwtManager::new(Role::Admin, &auth.admin_secret, auth.issuer.clone()),
            hasher,
            store.clone(),
        );
        let user_gate = RoleGate::new(
            auth.strategy,
            JwtManager::new(Role::User, &auth.user_secret, auth.issuer.clone()),
            hasher,
            store.clone(),
        );

        Self {
            store,
            admin_gate,
            user_gate,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    if let Err(e) = dotenvy::dotenv() {
        // Missing .env is expected in production
        eprintln!("Note: No .env file loaded ({e})");
    }

    logging::init();

    tracing::info!("Starting Course Market v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        storage = %config.storage.backend,
        auth_strategy = %config.auth.strategy,
        "Configuration loaded"
    );

    let store = storage::open_store(&config.storage).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to open catalog store");
        anyhow::anyhow!("Storage error: {}", e)
    })?;

    let state = AppState::new(&config.auth, store);
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(address = %addr, "Server listening");
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
