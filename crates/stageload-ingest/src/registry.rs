//! Schema registry
//!
//! An ordered list of table descriptors. Lookup walks the list in order and
//! returns the first descriptor whose pattern matches the file name, so when
//! two patterns could both match a name, the one registered first wins.
//! Registries are built once and shared read-only.

use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use crate::descriptor::{ColumnSpec, ColumnType, TableDescriptor};
use crate::error::{IngestError, Result};

#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    entries: Vec<TableDescriptor>,
}

impl SchemaRegistry {
    /// Build a registry, rejecting patterns registered twice
    pub fn new(entries: Vec<TableDescriptor>) -> Result<Self> {
        for (i, entry) in entries.iter().enumerate() {
            if entries[..i].iter().any(|e| e.pattern() == entry.pattern()) {
                return Err(IngestError::DuplicatePattern(entry.pattern().to_string()));
            }
        }

        Ok(Self { entries })
    }

    /// The compiled-in staging tables
    pub fn builtin() -> Result<Self> {
        use ColumnType::{Integer, String, Timestamp};

        Self::new(vec![
            TableDescriptor::new(
                r"^departments_.*\.csv$",
                "departments",
                false,
                vec![
                    ColumnSpec::new("id", Integer),
                    ColumnSpec::new("department_name", String),
                ],
            )?,
            TableDescriptor::new(
                r"^hired_employees_.*\.csv$",
                "hired_employees",
                false,
                vec![
                    ColumnSpec::new("id", Integer),
                    ColumnSpec::new("employee_name", String),
                    ColumnSpec::new("hire_datetime", Timestamp),
                    ColumnSpec::new("department_id", Integer),
                    ColumnSpec::new("job_id", Integer),
                ],
            )?,
            TableDescriptor::new(
                r"^jobs.*\.csv$",
                "jobs",
                false,
                vec![
                    ColumnSpec::new("id", Integer),
                    ColumnSpec::new("job_name", String),
                ],
            )?,
        ])
    }

    /// Parse a registry from TOML
    ///
    /// ```toml
    /// [[tables]]
    /// pattern = '^departments_.*\.csv$'
    /// table = "departments"
    /// has_header = false
    /// columns = [
    ///     { name = "id", type = "integer" },
    ///     { name = "department_name", type = "string" },
    /// ]
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let file: RegistryFile = toml::from_str(source)?;

        let entries = file
            .tables
            .into_iter()
            .map(|t| TableDescriptor::new(t.pattern, t.table, t.has_header, t.columns))
            .collect::<Result<Vec<_>>>()?;

        Self::new(entries)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| IngestError::RegistryIo {
            path: path.display().to_string(),
            source,
        })?;

        let registry = Self::from_toml_str(&source)?;
        debug!(path = %path.display(), tables = registry.len(), "Loaded schema registry");
        Ok(registry)
    }

    /// First descriptor whose pattern matches `file_name`
    pub fn lookup(&self, file_name: &str) -> Option<&TableDescriptor> {
        self.entries.iter().find(|entry| entry.matches(file_name))
    }

    pub fn entries(&self) -> &[TableDescriptor] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    tables: Vec<TableEntry>,
}

#[derive(Debug, Deserialize)]
struct TableEntry {
    pattern: String,
    table: String,
    #[serde(default)]
    has_header: bool,
    columns: Vec<ColumnSpec>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_routes_each_table() {
        let registry = SchemaRegistry::builtin().unwrap();

        let cases = [
            ("departments_01.csv", "departments"),
            ("departments_2024-01-01.csv", "departments"),
            ("hired_employees_01.csv", "hired_employees"),
            ("jobs.csv", "jobs"),
            ("jobs_batch_7.csv", "jobs"),
        ];
        for (name, table) in cases {
            let found = registry.lookup(name).map(|d| d.table_name());
            assert_eq!(found, Some(table), "{} should route to {}", name, table);
        }
    }

    #[test]
    fn test_no_match_is_none() {
        let registry = SchemaRegistry::builtin().unwrap();
        assert!(registry.lookup("unknown_file.csv").is_none());
        assert!(registry.lookup("departments_01.txt").is_none());
        assert!(registry.lookup("stage/departments_01.csv").is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let registry = SchemaRegistry::new(vec![
            TableDescriptor::new(r"^jobs_special.*\.csv$", "special_jobs", false, vec![]).unwrap(),
            TableDescriptor::new(r"^jobs.*\.csv$", "jobs", false, vec![]).unwrap(),
        ])
        .unwrap();

        assert_eq!(
            registry.lookup("jobs_special_1.csv").unwrap().table_name(),
            "special_jobs"
        );
        assert_eq!(registry.lookup("jobs_1.csv").unwrap().table_name(), "jobs");
    }

    #[test]
    fn test_duplicate_pattern_rejected() {
        let err = SchemaRegistry::new(vec![
            TableDescriptor::new(r"^a\.csv$", "a", false, vec![]).unwrap(),
            TableDescriptor::new(r"^a\.csv$", "b", false, vec![]).unwrap(),
        ])
        .unwrap_err();
        assert!(matches!(err, IngestError::DuplicatePattern(_)));
    }

    #[test]
    fn test_from_toml_str() {
        let registry = SchemaRegistry::from_toml_str(
            r#"
            [[tables]]
            pattern = '^regions_.*\.csv$'
            table = "regions"
            has_header = true
            columns = [
                { name = "code", type = "string" },
                { name = "opened_at", type = "timestamp" },
            ]

            [[tables]]
            pattern = '^jobs.*\.csv$'
            table = "jobs"
            columns = [{ name = "id", type = "integer" }]
            "#,
        )
        .unwrap();

        assert_eq!(registry.len(), 2);
        let regions = registry.lookup("regions_eu.csv").unwrap();
        assert!(regions.has_header());
        assert_eq!(regions.source_columns()[1].column_type, ColumnType::Timestamp);
        assert_eq!(regions.columns().len(), 5);
        assert!(!registry.lookup("jobs_1.csv").unwrap().has_header());
    }

    #[test]
    fn test_from_toml_rejects_unknown_type() {
        let err = SchemaRegistry::from_toml_str(
            r#"
            [[tables]]
            pattern = '^a\.csv$'
            table = "a"
            columns = [{ name = "x", type = "decimal" }]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::RegistryFormat(_)));
    }
}
