//! Business logic services.
//!
//! Services contain the analysis logic separated from HTTP handlers.
//! They talk to PostgreSQL, keep recent analyses and drive Graphviz.

pub mod analysis_store;
pub mod graphviz;
pub mod plan_service;
pub mod whatif_service;
