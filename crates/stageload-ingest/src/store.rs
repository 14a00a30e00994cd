//! Collaborator interfaces
//!
//! The pipeline talks to the object store and the relational store only
//! through these traits. Production implementations live in the server crate;
//! tests use in-memory doubles.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::dataset::Dataset;

/// Object storage addressed by container (bucket) and key
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Copy an object within one container
    async fn copy(&self, container: &str, source_key: &str, dest_key: &str) -> Result<()>;

    async fn delete(&self, container: &str, key: &str) -> Result<()>;

    /// Full object contents
    async fn get(&self, container: &str, key: &str) -> Result<Vec<u8>>;
}

/// Relational store that can replace a table's contents with a dataset
#[async_trait]
pub trait TableLoader: Send + Sync {
    /// Create or replace `schema.table` with exactly the rows of `dataset`
    ///
    /// Returns the number of rows written.
    async fn load_replace(&self, table: &str, schema: &str, dataset: &Dataset) -> Result<u64>;
}

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
