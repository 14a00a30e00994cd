//! In-memory collaborators for pipeline tests

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use stageload_ingest::{
    Clock, Dataset, IngestionOrchestrator, ObjectStore, OrchestratorConfig, SchemaRegistry,
    TableLoader,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

/// Calls made against the object store, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Copy { container: String, from: String, to: String },
    Delete { container: String, key: String },
    Get { container: String, key: String },
}

#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
    calls: Mutex<Vec<StoreCall>>,
    fail_delete: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn put(&self, container: &str, key: &str, data: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert((container.to_string(), key.to_string()), data.to_vec());
    }

    pub fn exists(&self, container: &str, key: &str) -> bool {
        self.objects
            .lock()
            .unwrap()
            .contains_key(&(container.to_string(), key.to_string()))
    }

    pub fn keys(&self, container: &str) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(c, _)| c == container)
            .map(|(_, k)| k.clone())
            .collect()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_deletes(&self) {
        *self.fail_delete.lock().unwrap() = true;
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn copy(&self, container: &str, source_key: &str, dest_key: &str) -> Result<()> {
        self.record(StoreCall::Copy {
            container: container.to_string(),
            from: source_key.to_string(),
            to: dest_key.to_string(),
        });

        let mut objects = self.objects.lock().unwrap();
        let data = objects
            .get(&(container.to_string(), source_key.to_string()))
            .cloned()
            .ok_or_else(|| anyhow!("NoSuchKey: {}/{}", container, source_key))?;
        objects.insert((container.to_string(), dest_key.to_string()), data);
        Ok(())
    }

    async fn delete(&self, container: &str, key: &str) -> Result<()> {
        self.record(StoreCall::Delete {
            container: container.to_string(),
            key: key.to_string(),
        });

        if *self.fail_delete.lock().unwrap() {
            return Err(anyhow!("AccessDenied: delete {}/{}", container, key));
        }
        self.objects
            .lock()
            .unwrap()
            .remove(&(container.to_string(), key.to_string()));
        Ok(())
    }

    async fn get(&self, container: &str, key: &str) -> Result<Vec<u8>> {
        self.record(StoreCall::Get {
            container: container.to_string(),
            key: key.to_string(),
        });

        self.objects
            .lock()
            .unwrap()
            .get(&(container.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| anyhow!("NoSuchKey: {}/{}", container, key))
    }
}

/// One full-replace load as the relational store saw it
#[derive(Debug, Clone)]
pub struct LoadCall {
    pub schema: String,
    pub table: String,
    pub dataset: Dataset,
}

#[derive(Default)]
pub struct RecordingLoader {
    loads: Mutex<Vec<LoadCall>>,
    failing_tables: Mutex<HashSet<String>>,
}

impl RecordingLoader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_table(&self, table: &str) {
        self.failing_tables.lock().unwrap().insert(table.to_string());
    }

    pub fn loads(&self) -> Vec<LoadCall> {
        self.loads.lock().unwrap().clone()
    }
}

#[async_trait]
impl TableLoader for RecordingLoader {
    async fn load_replace(&self, table: &str, schema: &str, dataset: &Dataset) -> Result<u64> {
        if self.failing_tables.lock().unwrap().contains(table) {
            return Err(anyhow!("connection refused"));
        }

        self.loads.lock().unwrap().push(LoadCall {
            schema: schema.to_string(),
            table: table.to_string(),
            dataset: dataset.clone(),
        });
        Ok(dataset.len() as u64)
    }
}

/// Clock pinned to one instant
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 5).unwrap()
}

pub fn orchestrator(
    store: &Arc<MemoryStore>,
    loader: &Arc<RecordingLoader>,
    config: OrchestratorConfig,
) -> IngestionOrchestrator {
    IngestionOrchestrator::new(
        Arc::new(SchemaRegistry::builtin().unwrap()),
        store.clone(),
        loader.clone(),
        config,
    )
    .with_clock(Arc::new(FixedClock(fixed_now())))
}
