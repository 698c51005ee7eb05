//! What-if analysis service.
//!
//! A what-if question names the operator the user would like to see in the
//! plan (e.g. "Merge Join" instead of "Hash Join"). PostgreSQL cannot be told
//! to use an operator directly, but its planner method configuration
//! (`enable_hashjoin`, `enable_seqscan`, ...) can discourage the
//! alternatives. The plan obtained that way is the alternative query plan
//! (AQP), whose estimated cost is then compared with the original QEP.
//!
//! # Process
//!
//! 1. Validate the query and retrieve the QEP
//! 2. Apply the user's edits to a copy of the QEP
//! 3. Resolve the requested operator to planner settings
//! 4. Retrieve the AQP under those settings
//! 5. Compare costs

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        analysis::{Analysis, AnalysisKind, CostComparison, CostVerdict, PlannerSetting},
        plan::{Modifications, QueryPlan, apply_modifications},
    },
    query::{fingerprint, quote_ident, terminate_statement, validate_query},
    services::plan_service::{explain, normalize_schema, retrieve_qep},
};
use chrono::Utc;
use uuid::Uuid;

/// Costs closer than this are reported as unchanged.
const COST_EPSILON: f64 = 1e-6;

/// Operators a what-if question can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerHint {
    MergeJoin,
    HashJoin,
    NestedLoop,
    SeqScan,
    IndexScan,
    IndexOnlyScan,
    BitmapHeapScan,
    HashAggregate,
    GroupAggregate,
}

const fn on(name: &'static str) -> PlannerSetting {
    PlannerSetting {
        name,
        enabled: true,
    }
}

const fn off(name: &'static str) -> PlannerSetting {
    PlannerSetting {
        name,
        enabled: false,
    }
}

const MERGE_JOIN: &[PlannerSetting] = &[off("enable_hashjoin"), on("enable_mergejoin")];
const HASH_JOIN: &[PlannerSetting] = &[off("enable_mergejoin"), on("enable_hashjoin")];
const NESTED_LOOP: &[PlannerSetting] = &[
    off("enable_mergejoin"),
    off("enable_hashjoin"),
    on("enable_nestloop"),
];
const SEQ_SCAN: &[PlannerSetting] = &[
    on("enable_seqscan"),
    off("enable_indexscan"),
    off("enable_indexonlyscan"),
    off("enable_bitmapscan"),
];
const INDEX_SCAN: &[PlannerSetting] = &[off("enable_seqscan"), on("enable_indexscan")];
const INDEX_ONLY_SCAN: &[PlannerSetting] = &[off("enable_seqscan"), on("enable_indexonlyscan")];
const BITMAP_HEAP_SCAN: &[PlannerSetting] = &[
    off("enable_seqscan"),
    off("enable_indexscan"),
    on("enable_bitmapscan"),
];
const HASH_AGGREGATE: &[PlannerSetting] = &[on("enable_hashagg"), off("enable_sort")];
const GROUP_AGGREGATE: &[PlannerSetting] = &[off("enable_hashagg")];

impl PlannerHint {
    /// Resolve an operator name, ignoring case and whitespace.
    ///
    /// Accepts both the JSON node type names (`"Index Only Scan"`) and the
    /// text EXPLAIN spellings of aggregates (`"HashAggregate"`).
    pub fn from_operator(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        let hint = match key.as_str() {
            "mergejoin" => Self::MergeJoin,
            "hashjoin" => Self::HashJoin,
            "nestedloop" | "nestloop" => Self::NestedLoop,
            "seqscan" => Self::SeqScan,
            "indexscan" => Self::IndexScan,
            "indexonlyscan" => Self::IndexOnlyScan,
            "bitmapheapscan" | "bitmapindexscan" | "bitmapscan" => Self::BitmapHeapScan,
            "hashaggregate" => Self::HashAggregate,
            "groupaggregate" => Self::GroupAggregate,
            _ => return None,
        };
        Some(hint)
    }

    /// Canonical operator name as it appears in plans.
    pub fn operator(self) -> &'static str {
        match self {
            Self::MergeJoin => "Merge Join",
            Self::HashJoin => "Hash Join",
            Self::NestedLoop => "Nested Loop",
            Self::SeqScan => "Seq Scan",
            Self::IndexScan => "Index Scan",
            Self::IndexOnlyScan => "Index Only Scan",
            Self::BitmapHeapScan => "Bitmap Heap Scan",
            Self::HashAggregate => "HashAggregate",
            Self::GroupAggregate => "GroupAggregate",
        }
    }

    /// Planner settings that steer PostgreSQL towards this operator.
    pub fn settings(self) -> &'static [PlannerSetting] {
        match self {
            Self::MergeJoin => MERGE_JOIN,
            Self::HashJoin => HASH_JOIN,
            Self::NestedLoop => NESTED_LOOP,
            Self::SeqScan => SEQ_SCAN,
            Self::IndexScan => INDEX_SCAN,
            Self::IndexOnlyScan => INDEX_ONLY_SCAN,
            Self::BitmapHeapScan => BITMAP_HEAP_SCAN,
            Self::HashAggregate => HASH_AGGREGATE,
            Self::GroupAggregate => GROUP_AGGREGATE,
        }
    }
}

/// Resolve the operator requested by `modifications`.
///
/// Returns a warning when an operator was requested but has no planner
/// settings; the AQP then equals the QEP.
pub fn resolve_hint(modifications: &Modifications) -> (Option<PlannerHint>, Option<String>) {
    let Some(requested) = modifications
        .node_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    else {
        return (None, None);
    };

    match PlannerHint::from_operator(requested) {
        Some(hint) => (Some(hint), None),
        None => {
            let warning = format!(
                "No planner settings for operator '{requested}'; the alternative plan equals the original"
            );
            tracing::warn!("{}", warning);
            (None, Some(warning))
        }
    }
}

/// A what-if question must ask for an operator or edit at least one property.
pub fn ensure_question(modifications: &Modifications) -> Result<(), AppError> {
    let has_operator = modifications
        .node_type
        .as_deref()
        .is_some_and(|t| !t.trim().is_empty());
    if has_operator || !modifications.properties.is_empty() {
        Ok(())
    } else {
        Err(AppError::InvalidRequest(
            "modifications must name a node_type or at least one property".to_string(),
        ))
    }
}

/// Planner settings followed by the query, as a user would run it by hand.
pub fn render_modified_sql(settings: &[PlannerSetting], schema: Option<&str>, sql: &str) -> String {
    let mut lines = Vec::with_capacity(settings.len() + 2);
    if let Some(schema) = schema {
        lines.push(format!("SET search_path TO {};", quote_ident(schema)));
    }
    for setting in settings {
        lines.push(format!(
            "SET {} = {};",
            setting.name,
            if setting.enabled { "on" } else { "off" }
        ));
    }
    lines.push(terminate_statement(sql));
    lines.join("\n")
}

/// Compare the estimated total costs of two plans.
pub fn compare_costs(qep: &QueryPlan, aqp: &QueryPlan) -> CostComparison {
    let original_cost = qep.total_cost();
    let modified_cost = aqp.total_cost();
    let cost_difference = modified_cost - original_cost;

    let verdict = if cost_difference.abs() < COST_EPSILON {
        CostVerdict::Unchanged
    } else if cost_difference < 0.0 {
        CostVerdict::Cheaper
    } else {
        CostVerdict::MoreExpensive
    };

    let percent_change =
        (original_cost != 0.0).then(|| cost_difference / original_cost * 100.0);

    CostComparison {
        original_cost,
        modified_cost,
        cost_difference,
        percent_change,
        verdict,
    }
}

/// Retrieve the AQP for an already validated query.
pub async fn retrieve_aqp(
    pool: &DbPool,
    sql: &str,
    schema: Option<&str>,
    hint: PlannerHint,
) -> Result<QueryPlan, AppError> {
    tracing::debug!(operator = hint.operator(), "retrieving alternative plan");
    explain(pool, sql, schema, hint.settings()).await
}

/// Answer a what-if question about `query`.
pub async fn analyze(
    pool: &DbPool,
    query: &str,
    schema: Option<&str>,
    modifications: Modifications,
) -> Result<Analysis, AppError> {
    let query = validate_query(query)?;
    ensure_question(&modifications)?;
    let schema = normalize_schema(schema);

    let qep = retrieve_qep(pool, &query, schema).await?;
    let (modified_qep, mut warnings) = apply_modifications(&qep, &modifications);

    let (hint, hint_warning) = resolve_hint(&modifications);
    warnings.extend(hint_warning);

    let aqp = match hint {
        Some(hint) => retrieve_aqp(pool, &query, schema, hint).await?,
        None => qep.clone(),
    };
    let planner_settings = hint.map(|h| h.settings().to_vec()).unwrap_or_default();

    let comparison = compare_costs(&qep, &aqp);
    tracing::info!(
        original_cost = comparison.original_cost,
        modified_cost = comparison.modified_cost,
        verdict = ?comparison.verdict,
        "what-if analysis complete"
    );

    Ok(Analysis {
        id: Uuid::new_v4(),
        kind: AnalysisKind::WhatIf,
        fingerprint: fingerprint(&query),
        modified_sql: Some(render_modified_sql(&planner_settings, schema, &query)),
        schema: schema.map(str::to_string),
        query,
        qep,
        modifications: Some(modifications),
        modified_qep: Some(modified_qep),
        aqp: Some(aqp),
        planner_settings,
        comparison: Some(comparison),
        warnings,
        created_at: Utc::now(),
    })
}
