use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use packwise_api::{app, AppState};
use packwise_core::CatalogRepository;
use packwise_store::app_config::{CatalogBackend, Config};
use packwise_store::{CatalogFixture, DbClient, MemoryCatalogRepository, PostgresCatalogRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "packwise_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting packwise API on port {}", config.server.port);

    let mut packaging = config.packaging.clone();

    let repo: Arc<dyn CatalogRepository> = match config.catalog.backend {
        CatalogBackend::Memory => {
            let path = config
                .catalog
                .fixture_path
                .as_deref()
                .context("catalog.fixture_path is required for the memory backend")?;
            let fixture = CatalogFixture::from_path(path)?;
            Arc::new(MemoryCatalogRepository::new(fixture))
        }
        CatalogBackend::Postgres => {
            let database = config
                .database
                .as_ref()
                .context("[database] is required for the postgres backend")?;
            let db = DbClient::new(database)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await?;

            // Settings stored in the database win over the files
            packaging = match db.fetch_packaging_config(packaging.clone()).await {
                Ok(rules) => rules,
                Err(e) => {
                    tracing::warn!("Failed to read packaging settings, using file config: {}", e);
                    packaging
                }
            };
            Arc::new(PostgresCatalogRepository::new(db.pool.clone()))
        }
    };

    tracing::info!(
        fallback_to_bigger_unit = packaging.fallback_to_bigger_unit,
        "packaging config"
    );

    let state = AppState::new(repo, packaging)?;
    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
