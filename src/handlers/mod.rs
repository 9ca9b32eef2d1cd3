/// HTTP request handlers
use crate::domain::{Health, RouteSummary, StatusReport};
use crate::errors::ApiError;
use crate::services::StatusService;
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub status_service: Arc<StatusService>,
}

/// Status query. Everything is optional and kept as raw text so malformed
/// values reach the service and fall back to defaults instead of a 400.
#[derive(Debug, Default, Deserialize)]
pub struct StatusParams {
    pub route: Option<String>,
    pub start: Option<String>,
    pub speed: Option<String>,
}

/// Health check handler
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        now: Utc::now(),
    })
}

/// List registered routes
pub async fn list_routes(State(state): State<AppState>) -> Json<Vec<RouteSummary>> {
    Json(state.status_service.list_routes())
}

/// Current and at-arrival conditions along a route
pub async fn get_status(
    Query(params): Query<StatusParams>,
    State(state): State<AppState>,
) -> Result<Json<StatusReport>, ApiError> {
    let report = state
        .status_service
        .status(
            params.route.as_deref(),
            params.start.as_deref(),
            params.speed.as_deref(),
        )
        .await?;
    Ok(Json(report))
}
