//! Relocation of staged files into per-table areas
//!
//! A move is a copy followed by a delete of the source. The delete is only
//! attempted after the copy succeeded. The two calls are not atomic: if the
//! delete fails the source stays behind, and a redelivered event produces a
//! second relocated copy under a new timestamp.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{IngestError, Result};
use crate::store::ObjectStore;

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Where a staged file ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub destination_key: String,
    /// Bare file name of the destination, also written as `load_file_name`
    pub file_name: String,
}

/// Timestamped file name for a relocated file
///
/// `departments_01.csv` at 2026-10-18 09:30:00 becomes
/// `departments_01_20261018-093000.csv`. Names without an extension get the
/// suffix appended at the end.
pub fn relocated_file_name(base_name: &str, now: DateTime<Utc>) -> String {
    let stamp = now.format(TIMESTAMP_FORMAT);
    match base_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, stamp, ext),
        _ => format!("{}_{}", base_name, stamp),
    }
}

/// Destination key for a file routed to `table`
pub fn destination_key(table: &str, base_name: &str, now: DateTime<Utc>) -> (String, String) {
    let file_name = relocated_file_name(base_name, now);
    (format!("{}/{}", table, file_name), file_name)
}

#[derive(Clone)]
pub struct Relocator {
    store: Arc<dyn ObjectStore>,
}

impl Relocator {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Move `source_key` to `{table}/{stem}_{timestamp}.{ext}` in the same container
    pub async fn relocate(
        &self,
        container: &str,
        source_key: &str,
        base_name: &str,
        table: &str,
        now: DateTime<Utc>,
    ) -> Result<Relocation> {
        let (destination_key, file_name) = destination_key(table, base_name, now);

        debug!(container, source_key, destination_key = %destination_key, "Copying staged file");
        self.store
            .copy(container, source_key, &destination_key)
            .await
            .map_err(IngestError::ObjectStore)?;

        self.store
            .delete(container, source_key)
            .await
            .map_err(IngestError::ObjectStore)?;

        info!(container, source_key, destination_key = %destination_key, "Relocated staged file");

        Ok(Relocation {
            destination_key,
            file_name,
        })
    }
}
