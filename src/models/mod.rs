//! Data models for plans, analyses and database schemas.

/// Stored analyses and API request/response types
pub mod analysis;
/// Query execution plan tree, edits and rendering
pub mod plan;
/// Database schema listing and TPC-H validation
pub mod schema;
