use std::sync::Arc;

use anime_recommender::{
    config::Config,
    routes::{create_router, AppState},
    services::{narration::narrator_from_config, recommender::EngineSnapshot},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "anime_recommender=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Build the engine snapshot before accepting requests
    let snapshot = {
        let catalog_path = config.catalog_path.clone();
        let raw_path = config.raw_data_path.clone();
        let engine_config = config.engine_config();
        tokio::task::spawn_blocking(move || EngineSnapshot::load(&catalog_path, &raw_path, engine_config))
            .await??
    };

    let narrator = narrator_from_config(&config);
    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(config, snapshot, narrator));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
