//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, query string)
//! 2. Calls into the services (EXPLAIN, what-if analysis, rendering)
//! 3. Returns HTTP response (JSON, DOT text or image bytes)

/// Stored analyses and plan graphs
pub mod analyses;
/// Service health
pub mod health;
/// QEP and what-if endpoints
pub mod plans;
/// Schema listing and TPC-H validation
pub mod schemas;
