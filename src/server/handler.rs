//! HTTP handlers for the triumphs and tracker API
//!
//! - POST   /api/v1/search           - search a player and build the tree
//! - POST   /api/v1/refresh          - rebuild with the last query
//! - GET    /api/v1/tree             - summary of the current tree
//! - GET    /api/v1/nodes/:hash      - one presentation node
//! - GET    /api/v1/triumphs/:hash   - one triumph
//! - GET    /api/v1/failures         - failures of the current build
//! - GET    /api/v1/tracker          - tracked triumphs, resolved
//! - PUT    /api/v1/tracker/:hash    - track a triumph
//! - DELETE /api/v1/tracker/:hash    - untrack a triumph

use crate::api::PlayerQuery;
use crate::server::types::*;
use crate::service::{Snapshot, TreeSummary, TriumphService};
use crate::tracker::{ResolvedTracker, TrackerStore};
use crate::triumphs::{BuildFailure, Hash, PresentationNode, Triumph};
use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;

/// Shared state for the triumph handlers
#[derive(Clone)]
pub struct TriumphState {
    pub service: Arc<TriumphService>,
    pub tracker: Arc<TrackerStore>,
}

type ApiResult<T> = Result<Json<T>, ApiFailure>;

/// Create the triumphs router with all REST endpoints
pub fn triumphs_router(state: TriumphState) -> Router {
    Router::new()
        .route("/api/v1/search", post(search))
        .route("/api/v1/refresh", post(refresh))
        .route("/api/v1/tree", get(get_tree))
        .route("/api/v1/nodes/:hash", get(get_node))
        .route("/api/v1/triumphs/:hash", get(get_triumph))
        .route("/api/v1/failures", get(get_failures))
        .route("/api/v1/tracker", get(get_tracker))
        .route("/api/v1/tracker/:hash", put(track).delete(untrack))
        .with_state(state)
}

// =============================================================================
// Helpers
// =============================================================================

async fn current(state: &TriumphState) -> Result<Arc<Snapshot>, ApiFailure> {
    state
        .service
        .current()
        .await
        .ok_or_else(|| ApiError::no_tree().into_failure())
}

fn parse_hash(raw: &str) -> Result<Hash, ApiFailure> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid hash '{}'", raw)).into_failure())
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /api/v1/search
async fn search(
    State(state): State<TriumphState>,
    Json(request): Json<SearchRequest>,
) -> ApiResult<TreeSummary> {
    let platform = request.platform()?;
    if request.username.trim().is_empty() {
        return Err(ApiError::bad_request("username must not be empty").into_failure());
    }
    let query = PlayerQuery {
        platform,
        username: request.username.trim().to_string(),
    };
    let snapshot = state
        .service
        .build(query)
        .await
        .map_err(|e| ApiError::from(e).into_failure())?;
    Ok(Json(snapshot.summary()))
}

/// POST /api/v1/refresh
async fn refresh(State(state): State<TriumphState>) -> ApiResult<TreeSummary> {
    let snapshot = state
        .service
        .refresh()
        .await
        .map_err(|e| ApiError::from(e).into_failure())?;
    Ok(Json(snapshot.summary()))
}

/// GET /api/v1/tree
async fn get_tree(State(state): State<TriumphState>) -> ApiResult<TreeSummary> {
    Ok(Json(current(&state).await?.summary()))
}

/// GET /api/v1/nodes/:hash
async fn get_node(
    State(state): State<TriumphState>,
    Path(hash): Path<String>,
) -> ApiResult<PresentationNode> {
    let hash = parse_hash(&hash)?;
    let snapshot = current(&state).await?;
    snapshot
        .tree
        .node(hash)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Node {} not found", hash)).into_failure())
}

/// GET /api/v1/triumphs/:hash
async fn get_triumph(
    State(state): State<TriumphState>,
    Path(hash): Path<String>,
) -> ApiResult<Triumph> {
    let hash = parse_hash(&hash)?;
    let snapshot = current(&state).await?;
    snapshot
        .tree
        .triumph(hash)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Triumph {} not found", hash)).into_failure())
}

/// GET /api/v1/failures
async fn get_failures(State(state): State<TriumphState>) -> ApiResult<Vec<BuildFailure>> {
    Ok(Json(current(&state).await?.tree.failures.clone()))
}

/// GET /api/v1/tracker
async fn get_tracker(State(state): State<TriumphState>) -> ApiResult<ResolvedTracker> {
    match state.service.current().await {
        Some(snapshot) => Ok(Json(state.tracker.resolve(&snapshot.tree).await)),
        None => Ok(Json(ResolvedTracker {
            resolved: Vec::new(),
            unresolved: state.tracker.list().await,
        })),
    }
}

/// PUT /api/v1/tracker/:hash
async fn track(
    State(state): State<TriumphState>,
    Path(hash): Path<String>,
) -> ApiResult<TrackResponse> {
    let hash = parse_hash(&hash)?;
    let changed = state
        .tracker
        .track(hash)
        .await
        .map_err(|e| ApiError::from(e).into_failure())?;
    Ok(Json(TrackResponse {
        hash,
        tracked: true,
        changed,
    }))
}

/// DELETE /api/v1/tracker/:hash
async fn untrack(
    State(state): State<TriumphState>,
    Path(hash): Path<String>,
) -> ApiResult<TrackResponse> {
    let hash = parse_hash(&hash)?;
    let changed = state
        .tracker
        .untrack(hash)
        .await
        .map_err(|e| ApiError::from(e).into_failure())?;
    Ok(Json(TrackResponse {
        hash,
        tracked: false,
        changed,
    }))
}
