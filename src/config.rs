//! Application configuration management.
//!
//! This module handles loading configuration from the `.env` file and environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;
use std::fmt;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DB_HOST` (optional): PostgreSQL host, defaults to `localhost`
/// - `DB_PORT` (optional): PostgreSQL port, defaults to 5432
/// - `DB_USER` (optional): database user, defaults to `postgres`
/// - `DB_PASSWORD` (optional): database password, defaults to empty
/// - `DB_NAME` (optional): database name, defaults to `tpch`
/// - `DB_MAX_CONNECTIONS` (optional): pool size, defaults to 5
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `DOT_BINARY` (optional): Graphviz executable, defaults to `dot` (resolved via PATH)
/// - `DOT_TIMEOUT_MS` (optional): render timeout, defaults to 10000
/// - `ANALYSIS_CACHE_CAPACITY` (optional): analyses kept in memory, defaults to 100
/// - `REQUIRE_TPCH_SCHEMA` (optional): abort startup when TPC-H tables are missing, defaults to true
/// - `TPCH_SCHEMA` (optional): schema validated at startup, defaults to `public`
#[derive(Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_host")]
    pub db_host: String,

    #[serde(default = "default_db_port")]
    pub db_port: u16,

    #[serde(default = "default_db_user")]
    pub db_user: String,

    #[serde(default)]
    pub db_password: String,

    #[serde(default = "default_db_name")]
    pub db_name: String,

    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_dot_binary")]
    pub dot_binary: String,

    #[serde(default = "default_dot_timeout_ms")]
    pub dot_timeout_ms: u64,

    #[serde(default = "default_cache_capacity")]
    pub analysis_cache_capacity: usize,

    #[serde(default = "default_true")]
    pub require_tpch_schema: bool,

    #[serde(default = "default_tpch_schema")]
    pub tpch_schema: String,
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_db_name() -> String {
    "tpch".to_string()
}

fn default_max_connections() -> u32 {
    5
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_dot_binary() -> String {
    "dot".to_string()
}

fn default_dot_timeout_ms() -> u64 {
    10_000
}

fn default_cache_capacity() -> usize {
    100
}

fn default_true() -> bool {
    true
}

fn default_tpch_schema() -> String {
    "public".to_string()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable value cannot be parsed
    /// into the expected type (e.g., `DB_PORT=abc`).
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: db_host -> DB_HOST
        envy::from_env::<Config>()
    }

    /// Connection options for the configured database.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .username(&self.db_user)
            .password(&self.db_password)
            .database(&self.db_name)
    }
}

// Hand-written so the password never reaches the logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("db_host", &self.db_host)
            .field("db_port", &self.db_port)
            .field("db_user", &self.db_user)
            .field("db_password", &"<redacted>")
            .field("db_name", &self.db_name)
            .field("db_max_connections", &self.db_max_connections)
            .field("server_port", &self.server_port)
            .field("dot_binary", &self.dot_binary)
            .field("dot_timeout_ms", &self.dot_timeout_ms)
            .field("analysis_cache_capacity", &self.analysis_cache_capacity)
            .field("require_tpch_schema", &self.require_tpch_schema)
            .field("tpch_schema", &self.tpch_schema)
            .finish()
    }
}
