use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use common::storage::filesystem::FilesystemBlobStore;
use server::config::AppConfig;
use server::database::init_db;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load()?;

    let db = init_db(&config.database.url).await?;
    let blob_store =
        FilesystemBlobStore::new(config.storage.root.clone(), config.storage.max_blob_size)
            .await?;

    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState {
        db,
        blob_store: Arc::new(blob_store),
        config: Arc::new(config),
    };
    let app = server::build_router(state);

    info!("Server running at http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
