use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use conclave_api::api::{router, AppState};
use conclave_api::app::{self, Adapters};
use conclave_api::config::Config;
use conclave_api::domain::repositories::RemoteContextStore;
use conclave_api::infrastructure::repositories::PostgresRemoteStore;
use conclave_api::infrastructure::OfflineGenerator;
use conclave_api::orchestrator::Monitors;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("conclave_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let mut adapters = Adapters::in_memory(Arc::new(OfflineGenerator::new()));
    if let Some(database_url) = &config.database_url {
        tracing::info!("Connecting to database...");
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(database_url)
            .await?;
        let remote = PostgresRemoteStore::new(pool);
        remote.ensure_schema().await?;
        tracing::info!("Database connected successfully");
        adapters.remote = Some(Arc::new(remote) as Arc<dyn RemoteContextStore>);
    }

    let orchestrator = app::assemble(&config, adapters);
    orchestrator
        .context()
        .start_sync_sweep(config.context_sync_interval);
    let monitors = Monitors::start(Arc::clone(&orchestrator), app::monitor_settings(&config));

    let app = router(AppState::new(
        Arc::clone(&orchestrator),
        config.context_sync_interval,
    ));

    tracing::info!("Server listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down background work");
    monitors.shutdown().await;
    app::shutdown(&orchestrator).await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
