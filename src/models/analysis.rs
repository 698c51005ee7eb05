//! Analysis records and API request/response types.
//!
//! This module defines:
//! - `Analysis`: a stored result of explaining a query (optionally with a what-if question)
//! - `CostComparison`: QEP vs AQP cost comparison
//! - Request types for plan and what-if endpoints
//! - Summary and response types returned to clients

use crate::models::plan::{Modifications, PlanTree, QueryPlan};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// What produced an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    /// Only the QEP was retrieved
    Plan,
    /// QEP and AQP were retrieved and compared
    WhatIf,
}

/// Direction of a cost change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostVerdict {
    Cheaper,
    MoreExpensive,
    Unchanged,
}

/// Estimated cost of the QEP compared with the AQP.
///
/// # JSON Example
///
/// ```json
/// {
///   "original_cost": 52.32,
///   "modified_cost": 61.9,
///   "cost_difference": 9.58,
///   "percent_change": 18.31,
///   "verdict": "more_expensive"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostComparison {
    pub original_cost: f64,
    pub modified_cost: f64,

    /// `modified_cost - original_cost`
    pub cost_difference: f64,

    /// Relative change in percent; absent when the original cost is zero
    pub percent_change: Option<f64>,

    pub verdict: CostVerdict,
}

/// A `SET` statement applied before explaining the AQP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlannerSetting {
    pub name: &'static str,
    pub enabled: bool,
}

/// Stored analysis.
///
/// Analyses live in memory only; see `services::analysis_store`.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub id: Uuid,
    pub kind: AnalysisKind,
    pub query: String,
    pub schema: Option<String>,

    /// SHA-256 of the normalised query, shared by analyses of the same query
    pub fingerprint: String,

    /// Plan PostgreSQL chose for the query as written
    pub qep: QueryPlan,

    /// The what-if question that was asked
    pub modifications: Option<Modifications>,

    /// QEP with the user's edits applied (what-if only)
    pub modified_qep: Option<QueryPlan>,

    /// Plan obtained under the planner settings (what-if only)
    pub aqp: Option<QueryPlan>,

    pub planner_settings: Vec<PlannerSetting>,

    /// Planner settings followed by the query, as it would be run by hand
    pub modified_sql: Option<String>,

    pub comparison: Option<CostComparison>,
    pub warnings: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Request to explain a query.
///
/// # JSON Example
///
/// ```json
/// {
///   "query": "SELECT * FROM orders WHERE o_orderdate > '1995-01-01'",
///   "schema": "public"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub query: String,

    /// Schema placed first on the search path; database default when absent
    pub schema: Option<String>,
}

/// Request to pose a what-if question about a query.
///
/// # JSON Example
///
/// ```json
/// {
///   "query": "SELECT * FROM customer c JOIN nation n ON c.c_nationkey = n.n_nationkey",
///   "modifications": { "node_type": "Merge Join", "target_node_type": "Hash Join" }
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct WhatIfRequest {
    pub query: String,
    pub schema: Option<String>,
    #[serde(default)]
    pub modifications: Modifications,
}

/// Full analysis returned to clients, with the tree views precomputed.
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    #[serde(flatten)]
    pub analysis: Analysis,
    pub qep_tree: PlanTree,
    pub aqp_tree: Option<PlanTree>,

    /// Operator name → occurrences, for a quick QEP/AQP comparison
    pub qep_operators: BTreeMap<String, usize>,
    pub aqp_operators: Option<BTreeMap<String, usize>>,
}

impl From<Analysis> for AnalysisResponse {
    fn from(analysis: Analysis) -> Self {
        let qep_tree = PlanTree::from_plan(&analysis.qep);
        let aqp_tree = analysis.aqp.as_ref().map(PlanTree::from_plan);
        let qep_operators = analysis.qep.plan.operator_counts();
        let aqp_operators = analysis.aqp.as_ref().map(|p| p.plan.operator_counts());
        Self {
            analysis,
            qep_tree,
            aqp_tree,
            qep_operators,
            aqp_operators,
        }
    }
}

/// Compact listing entry for recent analyses.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub id: Uuid,
    pub kind: AnalysisKind,
    pub query: String,
    pub fingerprint: String,
    pub total_cost: f64,
    pub modified_cost: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl From<&Analysis> for AnalysisSummary {
    fn from(analysis: &Analysis) -> Self {
        Self {
            id: analysis.id,
            kind: analysis.kind,
            query: analysis.query.clone(),
            fingerprint: analysis.fingerprint.clone(),
            total_cost: analysis.qep.total_cost(),
            modified_cost: analysis.aqp.as_ref().map(QueryPlan::total_cost),
            created_at: analysis.created_at,
        }
    }
}
