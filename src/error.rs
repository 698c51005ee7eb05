//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Database Errors**: Any sqlx::Error outside of planning the user's query
/// - **Query Errors**: SQL rejected by validation or by the PostgreSQL planner
/// - **Resource Errors**: Requested analyses or plans not found
/// - **Rendering Errors**: Graphviz missing or failing
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, pool timeout).
    ///
    /// Returns HTTP 500 without exposing details.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The SQL query was rejected, either locally or by the planner.
    ///
    /// Returns HTTP 400 with the reason.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// No stored analysis has the requested id (it may have been evicted).
    #[error("Analysis not found")]
    AnalysisNotFound,

    /// The analysis exists but does not carry the requested plan.
    #[error("Plan unavailable: {0}")]
    PlanUnavailable(String),

    /// EXPLAIN output could not be understood.
    #[error("Malformed plan: {0}")]
    MalformedPlan(String),

    /// The Graphviz executable could not be started.
    #[error("Graphviz unavailable: {0}")]
    GraphvizUnavailable(String),

    /// Graphviz ran but did not produce an image.
    #[error("Render failed: {0}")]
    RenderFailed(String),
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `InvalidQuery` / `InvalidRequest` → 400 Bad Request
/// - `AnalysisNotFound` / `PlanUnavailable` → 404 Not Found
/// - `MalformedPlan` → 502 Bad Gateway
/// - `GraphvizUnavailable` → 503 Service Unavailable
/// - `RenderFailed` / `Database` → 500 Internal Server Error
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::InvalidQuery(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_query", msg.clone())
            }
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::AnalysisNotFound => (
                StatusCode::NOT_FOUND,
                "analysis_not_found",
                self.to_string(),
            ),
            AppError::PlanUnavailable(_) => {
                (StatusCode::NOT_FOUND, "plan_unavailable", self.to_string())
            }
            AppError::MalformedPlan(_) => {
                (StatusCode::BAD_GATEWAY, "malformed_plan", self.to_string())
            }
            AppError::GraphvizUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "graphviz_unavailable",
                self.to_string(),
            ),
            AppError::RenderFailed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "render_failed",
                self.to_string(),
            ),
            AppError::Database(ref err) => {
                tracing::error!(error = %err, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
