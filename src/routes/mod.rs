use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    config::Config,
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::{
        narration::Narrator,
        recommender::{EngineSnapshot, SnapshotStore},
    },
};

pub mod admin;
pub mod chat;
pub mod recommendations;
pub mod search;

use chat::ChatSessions;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub engine: SnapshotStore,
    pub narrator: Arc<dyn Narrator>,
    pub chat_sessions: ChatSessions,
}

impl AppState {
    pub fn new(config: Config, snapshot: EngineSnapshot, narrator: Arc<dyn Narrator>) -> Self {
        Self {
            chat_sessions: ChatSessions::from_config(&config),
            config,
            engine: SnapshotStore::new(snapshot),
            narrator,
        }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes());

    if let Some(dir) = &state.config.static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router.with_state(state).layer(
        ServiceBuilder::new()
            .layer(middleware::from_fn(request_id_middleware))
            .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
            .layer(CorsLayer::permissive()),
    )
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/search", get(search::search))
        .route("/recommend", post(recommendations::recommend))
        .route("/chat", post(chat::chat))
        .route("/admin/reload", post(admin::reload))
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let snapshot = state.engine.current().await;
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "entries": snapshot.len(),
            "loaded_at": snapshot.loaded_at(),
        })),
    )
}
