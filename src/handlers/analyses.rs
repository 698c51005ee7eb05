//! Stored analysis HTTP handlers.
//!
//! - GET /api/v1/analyses - Recent analyses, newest first
//! - GET /api/v1/analyses/{id} - One analysis
//! - GET /api/v1/analyses/{id}/graph - A plan of the analysis as DOT or an image

use crate::{
    error::AppError,
    models::{
        analysis::{Analysis, AnalysisResponse, AnalysisSummary},
        plan::{DotOptions, QueryPlan, to_dot},
    },
    services::graphviz::GraphFormat,
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use uuid::Uuid;

const DEFAULT_LIST_LIMIT: usize = 20;
const MAX_LIST_LIMIT: usize = 100;

/// Query string of the listing endpoint.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Only list analyses of the query with this fingerprint
    pub fingerprint: Option<String>,
    pub limit: Option<usize>,
}

/// Which plan of an analysis to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanChoice {
    #[default]
    Qep,
    Aqp,
    /// QEP with the user's edits applied
    Modified,
}

/// Query string of the graph endpoint.
#[derive(Debug, Deserialize)]
pub struct GraphParams {
    #[serde(default)]
    pub plan: PlanChoice,
    #[serde(default)]
    pub format: GraphFormat,
}

/// List recent analyses.
///
/// `limit` defaults to 20 and is capped at 100.
pub async fn list_analyses(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<Vec<AnalysisSummary>> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .min(MAX_LIST_LIMIT);
    Json(state.store.list(params.fingerprint.as_deref(), limit).await)
}

/// Get one analysis.
///
/// # Response
///
/// - **Success (200 OK)**: the analysis with its tree views
/// - **Error (404)**: unknown id, or the analysis was evicted
pub async fn get_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let analysis = state.store.get(id).await.ok_or(AppError::AnalysisNotFound)?;
    Ok(Json(analysis.into()))
}

/// Render a plan of an analysis.
///
/// # Query Parameters
///
/// - `plan`: `qep` (default), `aqp` or `modified`
/// - `format`: `svg` (default), `png`, `pdf` or `dot`
///
/// For what-if analyses the requested operator is highlighted in the AQP and
/// modified plans, and the targeted operator in the QEP.
///
/// # Response
///
/// - **Success (200 OK)**: DOT text or image bytes with matching content type
/// - **Error (404)**: unknown analysis, or a plan the analysis does not have
/// - **Error (503)**: Graphviz is not installed
pub async fn get_graph(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<GraphParams>,
) -> Result<Response, AppError> {
    let analysis = state.store.get(id).await.ok_or(AppError::AnalysisNotFound)?;
    let (plan, options) = graph_source(&analysis, params.plan)?;

    let dot = to_dot(plan, &options);
    let bytes = state.graphviz.render(&dot, params.format).await?;

    Ok(([(header::CONTENT_TYPE, params.format.content_type())], bytes).into_response())
}

/// Pick the plan to draw and how to decorate it.
fn graph_source(
    analysis: &Analysis,
    choice: PlanChoice,
) -> Result<(&QueryPlan, DotOptions), AppError> {
    let modifications = analysis.modifications.as_ref();
    let (plan, name, highlight) = match choice {
        PlanChoice::Qep => (
            Some(&analysis.qep),
            "QEP",
            modifications.and_then(|m| m.target_node_type.clone()),
        ),
        PlanChoice::Aqp => (
            analysis.aqp.as_ref(),
            "AQP",
            modifications.and_then(|m| m.node_type.clone()),
        ),
        PlanChoice::Modified => (
            analysis.modified_qep.as_ref(),
            "Modified QEP",
            modifications.and_then(|m| m.node_type.clone()),
        ),
    };

    let plan = plan.ok_or_else(|| {
        AppError::PlanUnavailable(format!("analysis {} has no {name}", analysis.id))
    })?;

    let options = DotOptions {
        title: Some(format!("{name} (total cost {:.2})", plan.total_cost())),
        highlight: highlight.into_iter().collect(),
    };
    Ok((plan, options))
}
