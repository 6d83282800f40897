//! # SiteDesk API Server
//!
//! The API server for SiteDesk, a construction-site management service:
//! kanban-style tasks, material procurement tracking, crew accounts with
//! admin/helper roles, and an append-only activity audit trail.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/sitedesk \
//! JWT_SECRET=$(openssl rand -hex 32) \
//! cargo run -p sitedesk-api
//! ```

use sitedesk_api::{
    app::{build_router, AppState},
    config::Config,
};
use sitedesk_shared::db::{
    migrations::run_migrations,
    pool::{create_pool, DatabaseConfig},
    seed::{ensure_default_admin, SeedConfig},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sitedesk_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "SiteDesk API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    run_migrations(&pool).await?;

    // Bootstrap admin on an empty deployment; a failure here is logged but
    // never blocks startup.
    if let Err(e) = ensure_default_admin(&pool, &SeedConfig::from_env()).await {
        tracing::warn!("Bootstrap seeding failed: {}", e);
    }

    let bind_address = config.bind_address();
    let state = AppState::new(pool, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
