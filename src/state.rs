//! Shared application state handed to every handler.

use crate::{
    db::DbPool,
    services::{analysis_store::AnalysisStore, graphviz::Graphviz},
};

/// Cloned per request by Axum; every field is cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub store: AnalysisStore,
    pub graphviz: Graphviz,
}
