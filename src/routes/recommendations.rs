use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{AnimeId, RecommendationResponse},
    routes::AppState,
    services::narration::narrate_recommendations,
};

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub anime_ids: Vec<AnimeId>,
    pub k: Option<usize>,
    pub lambda_mult: Option<f64>,
    #[serde(default)]
    pub narrate: bool,
}

/// Handler for recommendations endpoint
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    let start = Instant::now();
    let k = request.k.unwrap_or(state.config.default_k);
    let lambda_mult = request.lambda_mult.unwrap_or(state.config.default_lambda);
    if !(0.0..=1.0).contains(&lambda_mult) {
        return Err(AppError::InvalidInput(
            "lambda_mult must be between 0 and 1".to_string(),
        ));
    }

    tracing::info!(
        request_id = %request_id,
        seeds = request.anime_ids.len(),
        k,
        lambda_mult,
        narrate = request.narrate,
        "Processing recommendation request"
    );

    let snapshot = state.engine.current().await;
    let seeds = request.anime_ids.clone();
    let (recommendations, seed_names) = tokio::task::spawn_blocking(move || {
        let recs = snapshot.recommend(&seeds, k, lambda_mult);
        let names = snapshot.seed_names(&seeds);
        (recs, names)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))?;

    let recommendations = if request.narrate && !recommendations.is_empty() {
        narrate_recommendations(state.narrator.clone(), &seed_names, recommendations).await
    } else {
        recommendations
    };

    tracing::info!(
        request_id = %request_id,
        returned = recommendations.len(),
        processing_time_ms = start.elapsed().as_millis(),
        "Recommendation completed"
    );

    Ok(Json(RecommendationResponse { recommendations }))
}
