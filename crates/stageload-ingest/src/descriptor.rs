//! Table descriptors
//!
//! A descriptor says how to recognise files for one staging table and how to
//! read them. The three load metadata columns are appended by the descriptor
//! itself and are never read from the source file.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};

pub const LOAD_FILE_NAME: &str = "load_file_name";
pub const LOAD_TIMESTAMP: &str = "load_timestamp";
pub const LOAD_ROW_NUMBER: &str = "load_row_number";

/// Names produced by the enricher, in the order they are appended
pub const METADATA_COLUMNS: [&str; 3] = [LOAD_FILE_NAME, LOAD_TIMESTAMP, LOAD_ROW_NUMBER];

/// Declared semantic type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    #[serde(alias = "text")]
    String,
    /// Timezone-aware instant, normalised to UTC
    #[serde(alias = "datetime")]
    Timestamp,
    /// UTC wall-clock time stored without a zone; only used for `load_timestamp`
    #[serde(skip_deserializing, rename = "local_timestamp")]
    LocalTimestamp,
}

impl ColumnType {
    pub fn is_temporal(self) -> bool {
        matches!(self, ColumnType::Timestamp | ColumnType::LocalTimestamp)
    }

    /// PostgreSQL type used when the staging table is (re)created
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Integer => "BIGINT",
            ColumnType::String => "TEXT",
            ColumnType::Timestamp => "TIMESTAMPTZ",
            ColumnType::LocalTimestamp => "TIMESTAMP",
        }
    }
}

/// One column of a staging table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }

    /// Whether values of this column are coerced to timestamps during enrichment
    ///
    /// Declared type wins. The name test is kept for files whose temporal
    /// columns were declared as strings; it matches `datetime` case-insensitively.
    pub fn is_temporal(&self) -> bool {
        self.column_type.is_temporal() || self.name_implies_datetime()
    }

    pub fn name_implies_datetime(&self) -> bool {
        self.name.to_ascii_lowercase().contains("datetime")
    }
}

/// Accepts names usable as unquoted SQL identifiers
pub fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        },
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(IngestError::InvalidIdentifier(name.to_string()))
    }
}

/// Immutable description of one target table
#[derive(Debug, Clone)]
pub struct TableDescriptor {
    pattern: String,
    matcher: Regex,
    table_name: String,
    has_header: bool,
    columns: Vec<ColumnSpec>,
}

impl TableDescriptor {
    /// Build a descriptor from its source columns
    ///
    /// `source_columns` lists the columns present in the file, in file order.
    /// The pattern is anchored at the start of the file name; anchoring the
    /// end is left to the pattern author.
    pub fn new(
        pattern: impl Into<String>,
        table_name: impl Into<String>,
        has_header: bool,
        source_columns: Vec<ColumnSpec>,
    ) -> Result<Self> {
        let pattern = pattern.into();
        let table_name = table_name.into();

        let matcher = Regex::new(&format!("^(?:{})", pattern)).map_err(|source| {
            IngestError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            }
        })?;

        validate_identifier(&table_name)?;

        let mut columns = Vec::with_capacity(source_columns.len() + METADATA_COLUMNS.len());
        for column in source_columns {
            validate_identifier(&column.name)?;
            if METADATA_COLUMNS.contains(&column.name.as_str()) {
                return Err(IngestError::ReservedColumn {
                    table: table_name,
                    column: column.name,
                });
            }
            if columns.iter().any(|c: &ColumnSpec| c.name == column.name) {
                return Err(IngestError::DuplicateColumn {
                    table: table_name,
                    column: column.name,
                });
            }
            columns.push(column);
        }

        columns.push(ColumnSpec::new(LOAD_FILE_NAME, ColumnType::String));
        columns.push(ColumnSpec::new(LOAD_TIMESTAMP, ColumnType::LocalTimestamp));
        columns.push(ColumnSpec::new(LOAD_ROW_NUMBER, ColumnType::Integer));

        Ok(Self {
            pattern,
            matcher,
            table_name,
            has_header,
            columns,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn has_header(&self) -> bool {
        self.has_header
    }

    /// All columns, metadata columns last
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Columns read positionally from the file
    pub fn source_columns(&self) -> &[ColumnSpec] {
        &self.columns[..self.columns.len() - METADATA_COLUMNS.len()]
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.matcher.is_match(file_name)
    }
}
