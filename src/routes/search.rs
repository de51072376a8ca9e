use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{middleware::request_id::RequestId, models::SearchHit, routes::AppState};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
    limit: Option<usize>,
}

/// Handler for title search endpoint
pub async fn search(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<SearchQuery>,
) -> Json<Vec<SearchHit>> {
    let limit = params.limit.unwrap_or(state.config.search_limit);
    let snapshot = state.engine.current().await;
    let hits = snapshot.search(&params.q, limit);

    tracing::info!(
        request_id = %request_id,
        query = %params.q,
        hits = hits.len(),
        "Search completed"
    );

    Json(hits)
}
