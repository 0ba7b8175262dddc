use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::Method,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use crate::api::health::{HealthResponse, HealthState};
use crate::error::AppError;
use crate::history;
use crate::ranker;
use crate::scorer::GameScorer;
use crate::store::{self, SnapshotStore};
use crate::types::{GameSummary, History, Movers, RankKey, Recommendation};

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<dyn SnapshotStore>,
    pub scorer: Arc<GameScorer>,
    pub health: Arc<HealthState>,
    pub top_n: usize,
    pub movers_limit: usize,
}

/// JSON API. Any origin may read it, so browser front ends can call it directly.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods([Method::GET]);

    Router::new()
        .route("/api/recommendation", get(get_recommendation))
        .route("/api/best_any", get(get_best_any))
        .route("/api/best_grand", get(get_best_grand))
        .route("/api/games", get(get_games))
        .route("/api/history", get(get_history))
        .route("/api/movers", get(get_movers))
        .route("/health", get(get_health))
        .with_state(state)
        .layer(cors)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct TopQuery {
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_recommendation(State(state): State<ApiState>) -> Result<Json<Recommendation>, AppError> {
    let table = store::blocking(&state.store, |s| s.load_current()).await?;
    Ok(Json(ranker::best(&table, &state.scorer)?))
}

async fn get_best_any(
    State(state): State<ApiState>,
    Query(params): Query<TopQuery>,
) -> Result<Json<Vec<GameSummary>>, AppError> {
    top_view(&state, RankKey::RemainingPrizes, params.limit).await
}

async fn get_best_grand(
    State(state): State<ApiState>,
    Query(params): Query<TopQuery>,
) -> Result<Json<Vec<GameSummary>>, AppError> {
    top_view(&state, RankKey::GrandPrizesRemaining, params.limit).await
}

async fn top_view(
    state: &ApiState,
    key: RankKey,
    limit: Option<usize>,
) -> Result<Json<Vec<GameSummary>>, AppError> {
    let table = store::blocking(&state.store, |s| s.load_current()).await?;
    let n = limit.unwrap_or(state.top_n);
    Ok(Json(ranker::top_n(&table, key, n, &state.scorer)?))
}

async fn get_games(State(state): State<ApiState>) -> Result<Json<Vec<GameSummary>>, AppError> {
    Ok(Json(store::blocking(&state.store, |s| s.load_current()).await?))
}

async fn get_history(State(state): State<ApiState>) -> Result<Json<History>, AppError> {
    Ok(Json(store::blocking(&state.store, |s| s.load_history()).await?))
}

async fn get_movers(State(state): State<ApiState>) -> Result<Json<Movers>, AppError> {
    let history = store::blocking(&state.store, |s| s.load_history()).await?;
    Ok(Json(history::movers(&history, state.movers_limit)?))
}

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(state.health.snapshot())
}
