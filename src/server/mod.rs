//! HTTP API for the triumph tracker
//!
//! ## Endpoint Map
//!
//! | Prefix               | Description                          |
//! |----------------------|--------------------------------------|
//! | `/health`            | Liveness probe                       |
//! | `/api/v1/search`     | Search a player and build the tree   |
//! | `/api/v1/refresh`    | Rebuild with the last query          |
//! | `/api/v1/tree`       | Current tree summary                 |
//! | `/api/v1/nodes/*`    | Presentation nodes                   |
//! | `/api/v1/triumphs/*` | Triumphs                             |
//! | `/api/v1/failures`   | Failures of the current build        |
//! | `/api/v1/tracker/*`  | Tracked triumphs                     |

pub mod handler;
pub mod types;

pub use handler::{triumphs_router, TriumphState};
pub use types::{ApiError, ApiErrorDetail, SearchRequest};

use crate::config::ServerConfig;
use crate::error::Result;
use axum::{
    http::{header, HeaderValue, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the complete HTTP application
pub fn build_app(state: TriumphState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(triumphs_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors(cors_origins))
}

/// Bind and serve until Ctrl-C
pub async fn serve(config: &ServerConfig, state: TriumphState) -> Result<()> {
    let app = build_app(state, &config.cors_origins);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Triumph tracker listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Build CORS layer from configured origins
fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        if parsed.len() < origins.len() {
            tracing::warn!("Ignoring {} invalid CORS origins", origins.len() - parsed.len());
        }
        cors.allow_origin(parsed)
    }
}
