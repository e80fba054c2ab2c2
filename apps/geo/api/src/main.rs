use axum_helpers::server::{create_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use database::common::RetryConfig;
use database::postgres::connect_from_config_with_retry;
use eyre::WrapErr;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    let retry = RetryConfig::new().with_max_retries(5).with_initial_delay(500);
    let db = connect_from_config_with_retry(config.database.clone(), Some(retry))
        .await
        .wrap_err("PostgreSQL connection failed")?;

    if config.run_migrations {
        database::postgres::run_migrations::<migration::Migrator>(&db, config.app.name)
            .await
            .wrap_err("Database migrations failed")?;
    }

    let state = AppState { config, db };

    let router = create_router::<openapi::ApiDoc>(api::routes(&state));

    // /health: liveness with app name and version
    // /ready: database round trip
    let app = router
        .merge(health_router(state.config.app))
        .merge(api::ready_router(state.clone()));

    info!(
        environment = ?state.config.environment,
        "Starting {} v{}",
        state.config.app.name,
        state.config.app.version
    );

    create_app(app, &state.config.server)
        .await
        .wrap_err("Server error")?;

    info!("Shutting down: closing database connections");
    if let Err(e) = state.db.close().await {
        tracing::error!("Error closing PostgreSQL: {}", e);
    }

    info!("Geo API shutdown complete");
    Ok(())
}
