//! QEP Lens - Main Application Entry Point
//!
//! A service for exploring PostgreSQL query execution plans. Clients submit
//! SQL queries, inspect the plan PostgreSQL chooses (QEP), pose what-if
//! questions ("what if this join were a Merge Join?") answered with an
//! alternative plan (AQP), compare estimated costs and render plans with
//! Graphviz.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx, usually loaded with TPC-H
//! - **Rendering**: external Graphviz `dot` executable
//! - **Format**: JSON requests/responses, DOT/SVG/PNG/PDF graphs
//!
//! # Startup Flow
//!
//! 1. Load configuration from the `.env` file and environment variables
//! 2. Create database connection pool
//! 3. Validate the TPC-H schema
//! 4. Probe Graphviz
//! 5. Build HTTP router and start server on configured port

mod config;
mod db;
mod error;
mod handlers;
mod models;
mod query;
mod routes;
mod services;
mod state;

use services::{analysis_store::AnalysisStore, graphviz::Graphviz};
use state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = config::Config::from_env()?;
    tracing::info!(
        host = %config.db_host,
        port = config.db_port,
        database = %config.db_name,
        "Configuration loaded"
    );
    tracing::debug!(?config, "Effective configuration");

    // Create database pool
    let pool = db::create_pool(&config).await?;
    tracing::info!("Database pool created");

    // Validate TPC-H schema
    let report = db::validate_tpch_schema(&pool, &config.tpch_schema).await?;
    if report.valid {
        tracing::info!(schema = %report.schema, "TPC-H schema validation successful");
    } else if config.require_tpch_schema {
        anyhow::bail!(
            "TPC-H schema validation failed for schema '{}': missing tables {}",
            report.schema,
            report.missing.join(", ")
        );
    } else {
        tracing::warn!(
            schema = %report.schema,
            missing = %report.missing.join(", "),
            "TPC-H tables missing, continuing because REQUIRE_TPCH_SCHEMA=false"
        );
    }

    // Graphviz is optional: without it graphs are only served as DOT
    let graphviz = Graphviz::new(config.dot_binary.clone(), config.dot_timeout_ms);
    match graphviz.probe().await {
        Ok(version) => tracing::info!(%version, "Graphviz available"),
        Err(e) => tracing::warn!(
            error = %e,
            "Graphviz not found; install it and make sure `dot` is on PATH to render images"
        ),
    }

    let state = AppState {
        pool,
        store: AnalysisStore::new(config.analysis_cache_capacity),
        graphviz,
    };
    let app = routes::router(state);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
