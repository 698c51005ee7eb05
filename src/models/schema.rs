//! Database schema models.

use serde::Serialize;

/// Tables every TPC-H database must contain.
pub const TPCH_TABLES: [&str; 8] = [
    "region", "nation", "part", "supplier", "partsupp", "customer", "orders", "lineitem",
];

/// A user schema and the number of tables in it.
///
/// # Database Source
///
/// Built from `information_schema.tables`, excluding `pg_catalog`,
/// `information_schema` and `pg_toast*` schemas.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct SchemaInfo {
    pub name: String,
    pub table_count: i64,
}

/// Outcome of checking a schema for the TPC-H tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaReport {
    pub schema: String,
    pub present: Vec<String>,
    pub missing: Vec<String>,
    pub valid: bool,
}

impl SchemaReport {
    /// Compare the tables found in `schema` against the TPC-H table list.
    ///
    /// Table names are compared case-sensitively, as stored in the catalog.
    pub fn from_tables(schema: &str, tables: &[String]) -> Self {
        let (present, missing): (Vec<&str>, Vec<&str>) = TPCH_TABLES
            .iter()
            .copied()
            .partition(|required| tables.iter().any(|t| t.as_str() == *required));

        Self {
            schema: schema.to_string(),
            valid: missing.is_empty(),
            present: present.into_iter().map(str::to_string).collect(),
            missing: missing.into_iter().map(str::to_string).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_schema_is_valid() {
        let mut tables: Vec<String> = TPCH_TABLES.iter().map(|t| t.to_string()).collect();
        tables.push("extra_table".to_string());

        let report = SchemaReport::from_tables("public", &tables);

        assert!(report.valid);
        assert!(report.missing.is_empty());
        assert_eq!(report.present.len(), 8);
    }

    #[test]
    fn missing_tables_are_listed_in_tpch_order() {
        let tables = vec!["orders".to_string(), "region".to_string()];

        let report = SchemaReport::from_tables("tpch", &tables);

        assert!(!report.valid);
        assert_eq!(report.present, ["region", "orders"]);
        assert_eq!(
            report.missing,
            ["nation", "part", "supplier", "partsupp", "customer", "lineitem"]
        );
    }
}
