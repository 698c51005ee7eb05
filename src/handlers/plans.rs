//! Plan HTTP handlers.
//!
//! This module implements the query panels of the service:
//! - POST /api/v1/plans - Explain a query (QEP)
//! - POST /api/v1/whatif - Pose a what-if question (QEP vs AQP)
//!
//! Both store their result so it can be fetched and rendered later.

use crate::{
    error::AppError,
    models::analysis::{AnalysisResponse, PlanRequest, WhatIfRequest},
    services::{plan_service, whatif_service},
    state::AppState,
};
use axum::{Json, extract::State};

/// Explain a query.
///
/// # Request Body
///
/// ```json
/// {
///   "query": "SELECT * FROM orders WHERE o_orderdate > '1995-01-01'",
///   "schema": "public"
/// }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: the stored analysis with `qep` and `qep_tree`
/// - **Error (400)**: query rejected by validation or by the planner
/// - **Error (500)**: Database error
pub async fn create_plan(
    State(state): State<AppState>,
    Json(request): Json<PlanRequest>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let analysis =
        plan_service::analyze_plan(&state.pool, &request.query, request.schema.as_deref()).await?;
    tracing::info!(id = %analysis.id, cost = analysis.qep.total_cost(), "plan analysis created");

    state.store.insert(analysis.clone()).await;
    Ok(Json(analysis.into()))
}

/// Answer a what-if question.
///
/// # Request Body
///
/// ```json
/// {
///   "query": "SELECT * FROM customer c JOIN nation n ON c.c_nationkey = n.n_nationkey",
///   "modifications": {
///     "node_type": "Merge Join",
///     "target_node_type": "Hash Join"
///   }
/// }
/// ```
///
/// # Response (200 OK)
///
/// The stored analysis with `qep`, `modified_qep`, `aqp`, `planner_settings`,
/// `modified_sql`, `comparison` and any `warnings` about edits that did not apply.
pub async fn create_whatif(
    State(state): State<AppState>,
    Json(request): Json<WhatIfRequest>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let analysis = whatif_service::analyze(
        &state.pool,
        &request.query,
        request.schema.as_deref(),
        request.modifications,
    )
    .await?;
    tracing::info!(id = %analysis.id, warnings = analysis.warnings.len(), "what-if analysis created");

    state.store.insert(analysis.clone()).await;
    Ok(Json(analysis.into()))
}
