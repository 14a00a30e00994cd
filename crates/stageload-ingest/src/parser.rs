//! CSV parsing into a [`Dataset`]
//!
//! Fields are assigned to the descriptor's source columns by position. When
//! the descriptor has a header, exactly the first physical record is dropped
//! and its contents are ignored. Empty fields become nulls and short records
//! are padded with nulls. Records with more fields than declared columns are
//! rejected.
//!
//! Integer columns are converted here. Temporal columns are kept as text and
//! converted by the enricher.

use tracing::debug;

use crate::dataset::{Column, Dataset, Value};
use crate::descriptor::{ColumnSpec, ColumnType, TableDescriptor};
use crate::error::{IngestError, Result};

pub fn parse_csv(data: &[u8], descriptor: &TableDescriptor) -> Result<Dataset> {
    let source_columns = descriptor.source_columns();

    let mut dataset = Dataset::new(
        source_columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                column_type: raw_type(c),
            })
            .collect(),
    );

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(descriptor.has_header())
        .flexible(true)
        .from_reader(data);

    for result in reader.records() {
        let record = result.map_err(|e| IngestError::csv(&e))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.len() > source_columns.len() {
            return Err(IngestError::TooManyFields {
                table: descriptor.table_name().to_string(),
                line,
                expected: source_columns.len(),
                found: record.len(),
            });
        }

        let row = source_columns
            .iter()
            .enumerate()
            .map(|(i, column)| convert_field(record.get(i), column, line))
            .collect::<Result<Vec<_>>>()?;

        dataset.push_row(row);
    }

    debug!(
        table = descriptor.table_name(),
        rows = dataset.len(),
        "Parsed CSV"
    );

    Ok(dataset)
}

/// Type a column carries between parsing and enrichment
fn raw_type(column: &ColumnSpec) -> ColumnType {
    if column.is_temporal() {
        ColumnType::String
    } else {
        column.column_type
    }
}

fn convert_field(field: Option<&str>, column: &ColumnSpec, line: u64) -> Result<Value> {
    let field = match field {
        Some(f) if !f.is_empty() => f,
        _ => return Ok(Value::Null),
    };

    match raw_type(column) {
        ColumnType::Integer => field
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| IngestError::InvalidInteger {
                column: column.name.clone(),
                line,
                value: field.to_string(),
            }),
        _ => Ok(Value::Text(field.to_string())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn descriptor(has_header: bool) -> TableDescriptor {
        TableDescriptor::new(
            r"^departments_.*\.csv$",
            "departments",
            has_header,
            vec![
                ColumnSpec::new("id", ColumnType::Integer),
                ColumnSpec::new("department_name", ColumnType::String),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_headerless_keeps_first_line() {
        let dataset = parse_csv(b"1,Engineering\n2,Sales\n", &descriptor(false)).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.rows()[0], vec![Value::Integer(1), Value::Text("Engineering".into())]);
        assert_eq!(dataset.rows()[1], vec![Value::Integer(2), Value::Text("Sales".into())]);
    }

    #[test]
    fn test_header_drops_first_line_only() {
        let data = b"identifier,name\n1,Engineering\n2,Sales\n";
        let dataset = parse_csv(data, &descriptor(true)).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.rows()[0][0], Value::Integer(1));
        // header contents do not rename anything
        assert!(dataset.column_index("department_name").is_some());
    }

    #[test]
    fn test_empty_and_missing_fields_are_null() {
        let dataset = parse_csv(b"1,\n2\n", &descriptor(false)).unwrap();
        assert_eq!(dataset.rows()[0][1], Value::Null);
        assert_eq!(dataset.rows()[1][1], Value::Null);
    }

    #[test]
    fn test_quoted_field_with_comma() {
        let dataset = parse_csv(b"7,\"Research, Development\"\n", &descriptor(false)).unwrap();
        assert_eq!(dataset.rows()[0][1], Value::Text("Research, Development".into()));
    }

    #[test]
    fn test_too_many_fields() {
        let err = parse_csv(b"1,Sales\n2,Ops,extra\n", &descriptor(false)).unwrap_err();
        match err {
            IngestError::TooManyFields { line, expected, found, .. } => {
                assert_eq!(line, 2);
                assert_eq!(expected, 2);
                assert_eq!(found, 3);
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_integer() {
        let err = parse_csv(b"one,Sales\n", &descriptor(false)).unwrap_err();
        assert!(matches!(err, IngestError::InvalidInteger { ref column, .. } if column == "id"));
    }

    #[test]
    fn test_temporal_columns_stay_text() {
        let descriptor = TableDescriptor::new(
            r"^hired_.*\.csv$",
            "hired_employees",
            false,
            vec![
                ColumnSpec::new("id", ColumnType::Integer),
                ColumnSpec::new("hire_datetime", ColumnType::Timestamp),
            ],
        )
        .unwrap();

        let dataset = parse_csv(b"4,2021-07-27T16:02:08Z\n", &descriptor).unwrap();
        assert_eq!(dataset.rows()[0][1], Value::Text("2021-07-27T16:02:08Z".into()));
        assert_eq!(dataset.columns()[1].column_type, ColumnType::String);
    }

    #[test]
    fn test_empty_file() {
        let dataset = parse_csv(b"", &descriptor(false)).unwrap();
        assert!(dataset.is_empty());
    }
}
