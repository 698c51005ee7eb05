//! Database connection pool and catalog queries.
//!
//! This module provides utilities for:
//! - Creating and managing a PostgreSQL connection pool
//! - Listing user schemas
//! - Checking that a schema holds the TPC-H tables

use crate::config::Config;
use crate::models::schema::{SchemaInfo, SchemaReport, TPCH_TABLES};
use sqlx::{Pool, Postgres};

/// Type alias for PostgreSQL connection pool.
pub type DbPool = Pool<Postgres>;

/// Create a new PostgreSQL connection pool.
///
/// # Configuration
///
/// - Maximum connections: `DB_MAX_CONNECTIONS`
/// - Connection parameters: `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`
///
/// # Errors
///
/// Returns an error if:
/// - Cannot connect to PostgreSQL server
/// - Database authentication fails
/// - The database does not exist
pub async fn create_pool(config: &Config) -> Result<DbPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect_with(config.connect_options())
        .await
}

/// Check that `schema` contains every TPC-H table.
///
/// Views with a TPC-H table name count as present.
pub async fn validate_tpch_schema(
    pool: &DbPool,
    schema: &str,
) -> Result<SchemaReport, sqlx::Error> {
    let tables: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT table_name::text
        FROM information_schema.tables
        WHERE table_schema = $1 AND table_name = ANY($2)
        "#,
    )
    .bind(schema)
    .bind(&TPCH_TABLES[..])
    .fetch_all(pool)
    .await?;

    Ok(SchemaReport::from_tables(schema, &tables))
}

/// List user schemas with their table counts, alphabetically.
pub async fn list_schemas(pool: &DbPool) -> Result<Vec<SchemaInfo>, sqlx::Error> {
    sqlx::query_as::<_, SchemaInfo>(
        r#"
        SELECT s.schema_name::text AS name, COUNT(t.table_name) AS table_count
        FROM information_schema.schemata s
        LEFT JOIN information_schema.tables t ON t.table_schema = s.schema_name
        WHERE s.schema_name NOT IN ('pg_catalog', 'information_schema')
          AND s.schema_name NOT LIKE 'pg\_toast%'
          AND s.schema_name NOT LIKE 'pg\_temp\_%'
        GROUP BY s.schema_name
        ORDER BY s.schema_name
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Verify database connectivity with a trivial query.
pub async fn ping(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
