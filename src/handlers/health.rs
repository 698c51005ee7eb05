//! Health check endpoint for service monitoring.

use crate::{db, error::AppError, state::AppState};
use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Health check response.
///
/// Returns service status, database connectivity and Graphviz availability.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service status
    pub status: String,

    /// Database connection status
    pub database: String,

    /// Graphviz version line, or `unavailable`
    pub graphviz: String,

    /// Analyses currently kept in memory
    pub stored_analyses: usize,

    /// Current server timestamp
    pub timestamp: DateTime<Utc>,
}

/// Health check handler.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "status": "healthy",
///   "database": "connected",
///   "graphviz": "dot - graphviz version 2.43.0 (0)",
///   "stored_analyses": 3,
///   "timestamp": "2025-12-21T19:00:00Z"
/// }
/// ```
///
/// A missing Graphviz degrades the status to `degraded`: plans can still be
/// explained and served as DOT, but not rendered to images.
///
/// # Response (500 Internal Server Error)
///
/// If database is unreachable, returns standard error response.
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    db::ping(&state.pool).await?;

    let (status, graphviz) = match state.graphviz.probe().await {
        Ok(version) => ("healthy", version),
        Err(_) => ("degraded", "unavailable".to_string()),
    };

    Ok(Json(HealthResponse {
        status: status.to_string(),
        database: "connected".to_string(),
        graphviz,
        stored_analyses: state.store.len().await,
        timestamp: Utc::now(),
    }))
}
