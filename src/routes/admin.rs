use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    routes::AppState,
    services::recommender::EngineSnapshot,
};

/// Rebuilds the engine snapshot from the configured files and swaps it in.
///
/// A failed load leaves the current snapshot in place.
pub async fn reload(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<Value>> {
    tracing::info!(request_id = %request_id, "Reloading catalog");

    let catalog_path = state.config.catalog_path.clone();
    let raw_path = state.config.raw_data_path.clone();
    let engine_config = state.config.engine_config();

    let snapshot = tokio::task::spawn_blocking(move || {
        EngineSnapshot::load(&catalog_path, &raw_path, engine_config)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    let entries = snapshot.len();
    let loaded_at = snapshot.loaded_at();
    let previous = state.engine.swap(snapshot).await;

    tracing::info!(
        request_id = %request_id,
        previous_entries = previous.len(),
        entries,
        "Catalog reloaded"
    );

    Ok(Json(json!({ "entries": entries, "loaded_at": loaded_at })))
}
