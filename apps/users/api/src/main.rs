use axum_helpers::server::{create_app, create_router, health_router};
use axum_helpers::{AuditDispatcher, AuditState, TracingAuditSink};
use core_config::tracing::{init_tracing, install_color_eyre};
use tracing::{info, warn};

mod api;
mod audit;
mod config;
mod openapi;
mod state;

use config::Config;
use state::Storage;

const APP_NAME: &str = env!("CARGO_PKG_NAME");

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    // Initialize tracing with ErrorLayer for span trace capture
    init_tracing(&config.environment);

    let (storage, db) = match &config.database {
        Some(pg_config) => {
            let db = database::postgres::connect_with_retry(pg_config, None)
                .await
                .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;
            database::postgres::run_migrations::<migration::Migrator>(&db, APP_NAME)
                .await
                .map_err(|e| eyre::eyre!("Migrations failed: {}", e))?;
            (Storage::postgres(db.clone()), Some(db))
        }
        None => {
            warn!("DATABASE_URL not set, users are kept in memory and lost on restart");
            (Storage::memory(), None)
        }
    };
    info!("Using {} user store", storage.name());

    let dispatcher = AuditDispatcher::start(TracingAuditSink, config.audit_queue_capacity);
    let audit = AuditState::new(dispatcher, audit::describe_operation);

    let api_routes = api::routes(&storage, audit);

    // create_router adds docs/middleware to our composed routes
    let app = create_router::<openapi::ApiDoc>(api_routes)
        .merge(health_router(APP_NAME, env!("CARGO_PKG_VERSION")));

    create_app(app, &config.server)
        .await
        .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    if let Some(db) = db {
        info!("Shutting down: closing database connections");
        match db.close().await {
            Ok(()) => info!("PostgreSQL connection closed successfully"),
            Err(e) => tracing::error!("Error closing PostgreSQL: {}", e),
        }
    }

    info!("Users API shutdown complete");
    Ok(())
}
