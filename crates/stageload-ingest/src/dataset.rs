//! In-memory tabular dataset
//!
//! Row-major storage of one parsed file. Every row has exactly one value per
//! column; the parser guarantees this and `push_column` keeps it true.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::descriptor::ColumnType;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
    LocalTimestamp(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Values of one column in row order
    pub fn column_values(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    pub(crate) fn push_row(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    /// Append a column whose value is computed per row from its 0-based index
    pub(crate) fn push_column<F>(&mut self, name: &str, column_type: ColumnType, mut value: F)
    where
        F: FnMut(usize) -> Value,
    {
        self.columns.push(Column {
            name: name.to_string(),
            column_type,
        });
        for (i, row) in self.rows.iter_mut().enumerate() {
            row.push(value(i));
        }
    }

    /// Rewrite the cells of one column in place
    pub(crate) fn map_column<F, E>(
        &mut self,
        idx: usize,
        column_type: ColumnType,
        mut f: F,
    ) -> Result<(), E>
    where
        F: FnMut(usize, &Value) -> Result<Value, E>,
    {
        for (i, row) in self.rows.iter_mut().enumerate() {
            row[idx] = f(i, &row[idx])?;
        }
        self.columns[idx].column_type = column_type;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        let mut dataset = Dataset::new(vec![Column {
            name: "id".to_string(),
            column_type: ColumnType::Integer,
        }]);
        dataset.push_row(vec![Value::Integer(10)]);
        dataset.push_row(vec![Value::Integer(20)]);
        dataset
    }

    #[test]
    fn test_push_column_fills_every_row() {
        let mut dataset = sample();
        dataset.push_column("n", ColumnType::Integer, |i| Value::Integer(i as i64 + 1));

        assert_eq!(dataset.columns().len(), 2);
        let values: Vec<_> = dataset
            .column_values("n")
            .unwrap()
            .into_iter()
            .map(|v| v.as_integer().unwrap())
            .collect();
        assert_eq!(values, vec![1, 2]);
    }

    #[test]
    fn test_map_column_stops_on_error() {
        let mut dataset = sample();
        let result: Result<(), String> = dataset.map_column(0, ColumnType::String, |i, _| {
            if i == 1 {
                Err("boom".to_string())
            } else {
                Ok(Value::Text("x".to_string()))
            }
        });
        assert_eq!(result.unwrap_err(), "boom");
        assert_eq!(dataset.columns()[0].column_type, ColumnType::Integer);
    }

    #[test]
    fn test_unknown_column() {
        assert!(sample().column_values("missing").is_none());
    }
}
