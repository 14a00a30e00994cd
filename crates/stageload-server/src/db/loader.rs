//! Full-replace loads into PostgreSQL
//!
//! Each load runs in one transaction:
//! `CREATE SCHEMA IF NOT EXISTS` -> `DROP TABLE IF EXISTS` -> `CREATE TABLE`
//! -> batched `INSERT`s -> `COMMIT`. A failure anywhere rolls back, so readers
//! see either the previous table or the new one.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use stageload_ingest::{Column, ColumnType, Dataset, TableLoader, Value};
use tracing::{debug, info, instrument};

use crate::config::DEFAULT_LOAD_CHUNK_ROWS;

/// PostgreSQL caps bind parameters per statement at 65,535
const MAX_BIND_PARAMS: usize = 65_535;

#[derive(Clone)]
pub struct PgTableLoader {
    pool: PgPool,
    chunk_rows: usize,
}

impl PgTableLoader {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            chunk_rows: DEFAULT_LOAD_CHUNK_ROWS,
        }
    }

    pub fn with_chunk_rows(mut self, chunk_rows: usize) -> Self {
        self.chunk_rows = chunk_rows;
        self
    }
}

#[async_trait]
impl TableLoader for PgTableLoader {
    #[instrument(skip(self, dataset), fields(rows = dataset.len()))]
    async fn load_replace(&self, table: &str, schema: &str, dataset: &Dataset) -> Result<u64> {
        let qualified = qualified_name(schema, table);
        let columns = dataset.columns();

        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let create_schema = format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema));
        sqlx::query(&create_schema)
            .execute(&mut *tx)
            .await
            .context(format!("Failed to create schema {}", schema))?;

        let drop_table = format!("DROP TABLE IF EXISTS {}", qualified);
        sqlx::query(&drop_table)
            .execute(&mut *tx)
            .await
            .context(format!("Failed to drop {}", qualified))?;

        let create_table = create_table_sql(schema, table, columns);
        sqlx::query(&create_table)
            .execute(&mut *tx)
            .await
            .context(format!("Failed to create {}", qualified))?;

        let batch = rows_per_statement(self.chunk_rows, columns.len());
        let insert_prefix = insert_prefix(schema, table, columns);
        let mut written = 0u64;

        for (chunk_idx, chunk) in dataset.rows().chunks(batch).enumerate() {
            let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(&insert_prefix);

            query_builder.push_values(chunk, |mut b, row| {
                for (column, value) in columns.iter().zip(row) {
                    match value {
                        Value::Integer(v) => {
                            b.push_bind(*v);
                        },
                        Value::Text(v) => {
                            b.push_bind(v.clone());
                        },
                        Value::Timestamp(v) => {
                            b.push_bind(*v);
                        },
                        Value::LocalTimestamp(v) => {
                            b.push_bind(*v);
                        },
                        Value::Null => match column.column_type {
                            ColumnType::Integer => {
                                b.push_bind(None::<i64>);
                            },
                            ColumnType::String => {
                                b.push_bind(None::<String>);
                            },
                            ColumnType::Timestamp => {
                                b.push_bind(None::<DateTime<Utc>>);
                            },
                            ColumnType::LocalTimestamp => {
                                b.push_bind(None::<NaiveDateTime>);
                            },
                        },
                    }
                }
            });

            let result = query_builder
                .build()
                .execute(&mut *tx)
                .await
                .context(format!("Failed to insert batch {} into {}", chunk_idx + 1, qualified))?;
            written += result.rows_affected();
            debug!(batch = chunk_idx + 1, rows = chunk.len(), "Inserted batch");
        }

        tx.commit().await.context("Failed to commit transaction")?;

        info!(table = %qualified, rows = written, "Replaced table contents");

        Ok(written)
    }
}

/// Double-quote an identifier, doubling any embedded quotes
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn qualified_name(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

pub fn create_table_sql(schema: &str, table: &str, columns: &[Column]) -> String {
    let definitions: Vec<_> = columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), c.column_type.sql_type()))
        .collect();
    format!(
        "CREATE TABLE {} ({})",
        qualified_name(schema, table),
        definitions.join(", ")
    )
}

fn insert_prefix(schema: &str, table: &str, columns: &[Column]) -> String {
    let names: Vec<_> = columns.iter().map(|c| quote_ident(&c.name)).collect();
    format!(
        "INSERT INTO {} ({}) ",
        qualified_name(schema, table),
        names.join(", ")
    )
}

/// Rows per INSERT, bounded so one statement never exceeds the bind limit
pub fn rows_per_statement(chunk_rows: usize, column_count: usize) -> usize {
    let ceiling = MAX_BIND_PARAMS / column_count.max(1);
    chunk_rows.clamp(1, ceiling.max(1))
}
