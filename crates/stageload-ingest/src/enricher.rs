//! Row enrichment
//!
//! Converts temporal columns to UTC instants and appends the load metadata
//! columns. Conversion is strict: one unreadable timestamp fails the file.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::{debug, warn};

use crate::dataset::{Dataset, Value};
use crate::descriptor::{ColumnType, TableDescriptor, LOAD_FILE_NAME, LOAD_ROW_NUMBER, LOAD_TIMESTAMP};
use crate::error::{IngestError, Result};

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M%#z",
    "%Y-%m-%dT%H:%M%#z",
];
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 style timestamp into a UTC instant
///
/// Values with an offset are converted to UTC; values without one are taken
/// to already be UTC. A bare date means midnight UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(raw, format) {
            return Some(ts.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Enrich a parsed dataset in place
///
/// `load_file_name` and `now` are written to every row unchanged;
/// `load_row_number` counts rows from 1 in parse order.
pub fn enrich(
    dataset: &mut Dataset,
    descriptor: &TableDescriptor,
    load_file_name: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    for spec in descriptor.source_columns().iter().filter(|c| c.is_temporal()) {
        let Some(idx) = dataset.column_index(&spec.name) else {
            continue;
        };

        if !spec.column_type.is_temporal() {
            warn!(
                table = descriptor.table_name(),
                column = %spec.name,
                "Column converted to timestamp because of its name; declare it as timestamp"
            );
        }

        dataset.map_column(idx, ColumnType::Timestamp, |row, value| match value {
            Value::Text(raw) => parse_timestamp(raw).map(Value::Timestamp).ok_or_else(|| {
                IngestError::InvalidTimestamp {
                    column: spec.name.clone(),
                    row: row + 1,
                    value: raw.clone(),
                }
            }),
            other => Ok(other.clone()),
        })?;
    }

    let load_timestamp = now.naive_utc();

    dataset.push_column(LOAD_FILE_NAME, ColumnType::String, |_| {
        Value::Text(load_file_name.to_string())
    });
    dataset.push_column(LOAD_TIMESTAMP, ColumnType::LocalTimestamp, |_| {
        Value::LocalTimestamp(load_timestamp)
    });
    dataset.push_column(LOAD_ROW_NUMBER, ColumnType::Integer, |i| {
        Value::Integer(i as i64 + 1)
    });

    debug!(
        table = descriptor.table_name(),
        rows = dataset.len(),
        load_file_name,
        "Enriched dataset"
    );

    Ok(())
}
