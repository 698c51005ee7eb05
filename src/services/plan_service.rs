//! Plan retrieval service.
//!
//! Every `EXPLAIN` runs inside its own database transaction which is always
//! rolled back. Session state set for the explain (`search_path`, planner
//! method settings) is applied with `SET LOCAL`, so it ends with the
//! transaction and never leaks into other requests sharing the pool.

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        analysis::{Analysis, AnalysisKind, PlannerSetting},
        plan::{QueryPlan, parse_explain_output},
    },
    query::{fingerprint, quote_ident, validate_query},
};
use chrono::Utc;
use uuid::Uuid;

/// Explain `sql` (already validated) under optional schema and planner settings.
///
/// # Errors
///
/// - `InvalidQuery`: PostgreSQL rejected the query (syntax error, unknown table, ...)
/// - `MalformedPlan`: the EXPLAIN output could not be parsed
/// - `Database`: connection or transaction failure
pub async fn explain(
    pool: &DbPool,
    sql: &str,
    schema: Option<&str>,
    settings: &[PlannerSetting],
) -> Result<QueryPlan, AppError> {
    let mut tx = pool.begin().await?;

    if let Some(schema) = schema {
        let statement = format!("SET LOCAL search_path TO {}", quote_ident(schema));
        sqlx::query(&statement)
            .persistent(false)
            .execute(&mut *tx)
            .await?;
    }

    for setting in settings {
        let statement = format!(
            "SET LOCAL {} = {}",
            setting.name,
            if setting.enabled { "on" } else { "off" }
        );
        sqlx::query(&statement)
            .persistent(false)
            .execute(&mut *tx)
            .await?;
    }

    let statement = format!("EXPLAIN (FORMAT JSON) {sql}");
    let output: serde_json::Value = sqlx::query_scalar(&statement)
        .persistent(false)
        .fetch_one(&mut *tx)
        .await
        .map_err(planner_error)?;

    tx.rollback().await?;

    let plan = parse_explain_output(output)?;
    tracing::debug!(
        total_cost = plan.total_cost(),
        nodes = plan.plan.node_count(),
        settings = settings.len(),
        "query explained"
    );
    Ok(plan)
}

/// Errors raised by the server while planning belong to the user's query.
fn planner_error(err: sqlx::Error) -> AppError {
    match err {
        sqlx::Error::Database(db_err) => AppError::InvalidQuery(db_err.message().to_string()),
        other => AppError::Database(other),
    }
}

/// Blank schema names mean "use the database default".
pub fn normalize_schema(schema: Option<&str>) -> Option<&str> {
    schema.map(str::trim).filter(|s| !s.is_empty())
}

/// Retrieve the QEP of an already validated query.
pub async fn retrieve_qep(
    pool: &DbPool,
    sql: &str,
    schema: Option<&str>,
) -> Result<QueryPlan, AppError> {
    explain(pool, sql, schema, &[]).await
}

/// Explain a query and package the result as a plan analysis.
pub async fn analyze_plan(
    pool: &DbPool,
    query: &str,
    schema: Option<&str>,
) -> Result<Analysis, AppError> {
    let query = validate_query(query)?;
    let schema = normalize_schema(schema);
    let qep = retrieve_qep(pool, &query, schema).await?;

    Ok(Analysis {
        id: Uuid::new_v4(),
        kind: AnalysisKind::Plan,
        fingerprint: fingerprint(&query),
        query,
        schema: schema.map(str::to_string),
        qep,
        modifications: None,
        modified_qep: None,
        aqp: None,
        planner_settings: Vec::new(),
        modified_sql: None,
        comparison: None,
        warnings: Vec::new(),
        created_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_schema_means_default() {
        assert_eq!(normalize_schema(None), None);
        assert_eq!(normalize_schema(Some("   ")), None);
        assert_eq!(normalize_schema(Some(" tpch ")), Some("tpch"));
    }

    #[test]
    fn non_database_errors_stay_internal() {
        assert!(matches!(
            planner_error(sqlx::Error::PoolTimedOut),
            AppError::Database(_)
        ));
    }
}
