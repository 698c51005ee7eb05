//! Schema HTTP handlers.
//!
//! - GET /api/v1/schemas - List user schemas
//! - GET /api/v1/schemas/{name}/validation - Check a schema for the TPC-H tables

use crate::{
    db,
    error::AppError,
    models::schema::{SchemaInfo, SchemaReport},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
};

/// List schemas a query can be run against.
///
/// # Response (200 OK)
///
/// ```json
/// [
///   { "name": "public", "table_count": 8 },
///   { "name": "tpch_sf10", "table_count": 8 }
/// ]
/// ```
pub async fn list_schemas(
    State(state): State<AppState>,
) -> Result<Json<Vec<SchemaInfo>>, AppError> {
    Ok(Json(db::list_schemas(&state.pool).await?))
}

/// Report which TPC-H tables are present in a schema.
///
/// A schema that does not exist reports every table as missing.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "schema": "public",
///   "present": ["region", "nation"],
///   "missing": ["part", "supplier", "partsupp", "customer", "orders", "lineitem"],
///   "valid": false
/// }
/// ```
pub async fn validate_schema(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<SchemaReport>, AppError> {
    Ok(Json(db::validate_tpch_schema(&state.pool, &name).await?))
}
