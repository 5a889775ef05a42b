//! Attesta server binary.
//!
//! Wires the PostgreSQL store and filesystem blob publisher into the engine
//! and serves the API. Configuration comes from the environment; see
//! [`attesta_server::AppConfig`].

use attesta_server::blob::FsBlobPublisher;
use attesta_server::store::PgStore;
use attesta_server::{create_router, db, AppConfig, Engine};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Configuration error: {e}");
        e
    })?;

    let pool = db::create_pool(&config.database_url, config.db_max_connections)
        .await
        .map_err(|e| {
            tracing::error!("Database connection failed: {e}");
            e
        })?;

    db::run_migrations(&pool).await.map_err(|e| {
        tracing::error!("Migration failed: {e}");
        e
    })?;

    let store = PgStore::new(pool);
    let blobs = FsBlobPublisher::new(&config.artifact_dir, &config.public_base_url);
    let engine = Engine::new(store, blobs, &config.public_base_url);

    let app = create_router(engine);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Attesta API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
