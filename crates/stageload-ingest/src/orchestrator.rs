//! Ingestion orchestrator
//!
//! Drives each notified file through
//! `received -> relocating -> downloading -> parsing -> enriching -> loading`
//! and records one [`FileOutcome`] per event. Files are handled strictly one
//! after another.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::descriptor::TableDescriptor;
use crate::enricher::enrich;
use crate::error::IngestError;
use crate::notification::{FileEvent, Notification};
use crate::outcome::{
    FileOutcome, IngestionReport, InvocationResponse, SkipReason, Stage, MISSING_RECORDS_MESSAGE,
};
use crate::parser::parse_csv;
use crate::registry::SchemaRegistry;
use crate::relocator::{Relocation, Relocator};
use crate::store::{Clock, ObjectStore, SystemClock, TableLoader};

pub const DEFAULT_INCOMING_PREFIX: &str = "stage/";
pub const DEFAULT_SCHEMA: &str = "stage";

/// What to do with the rest of a batch once a file fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop at the first failure; later events are reported as not attempted
    #[default]
    Halt,
    /// Keep going with the remaining events
    Continue,
}

impl std::str::FromStr for FailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "halt" | "stop" => Ok(FailurePolicy::Halt),
            "continue" => Ok(FailurePolicy::Continue),
            _ => Err(anyhow::anyhow!("Invalid failure policy: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Keys outside this prefix are ignored
    pub incoming_prefix: String,
    /// Schema that receives the staging tables
    pub schema: String,
    pub failure_policy: FailurePolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            incoming_prefix: DEFAULT_INCOMING_PREFIX.to_string(),
            schema: DEFAULT_SCHEMA.to_string(),
            failure_policy: FailurePolicy::Halt,
        }
    }
}

#[derive(Clone)]
pub struct IngestionOrchestrator {
    registry: Arc<SchemaRegistry>,
    store: Arc<dyn ObjectStore>,
    loader: Arc<dyn TableLoader>,
    relocator: Relocator,
    clock: Arc<dyn Clock>,
    config: OrchestratorConfig,
}

struct StepError {
    stage: Stage,
    error: IngestError,
}

impl StepError {
    fn at(stage: Stage) -> impl FnOnce(IngestError) -> Self {
        move |error| Self { stage, error }
    }
}

impl IngestionOrchestrator {
    pub fn new(
        registry: Arc<SchemaRegistry>,
        store: Arc<dyn ObjectStore>,
        loader: Arc<dyn TableLoader>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            registry,
            relocator: Relocator::new(store.clone()),
            store,
            loader,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Entry point for one notification
    ///
    /// A notification without an event list is rejected before any store is
    /// touched. Otherwise every event gets an outcome and the response is
    /// derived from them.
    pub async fn handle(&self, notification: &Notification) -> InvocationResponse {
        let Some(events) = notification.file_events() else {
            error!("Notification has no 'Records' list");
            return InvocationResponse::invalid(MISSING_RECORDS_MESSAGE);
        };

        InvocationResponse::from_report(self.process_events(&events).await)
    }

    pub async fn process_events(&self, events: &[FileEvent]) -> IngestionReport {
        let invocation_id = Uuid::new_v4();
        let span = info_span!("ingest_invocation", %invocation_id, events = events.len());

        async {
            let mut outcomes = Vec::with_capacity(events.len());
            let mut loaded_tables = HashSet::new();
            let mut halted = false;

            for event in events {
                if halted {
                    outcomes.push(FileOutcome::Skipped {
                        container: event.container.clone(),
                        key: event.key.clone(),
                        reason: SkipReason::NotAttempted,
                    });
                    continue;
                }

                let file_span =
                    info_span!("ingest_file", container = %event.container, key = %event.key);
                let outcome = self
                    .process_file(event, &mut loaded_tables)
                    .instrument(file_span)
                    .await;

                if outcome.is_failure() && self.config.failure_policy == FailurePolicy::Halt {
                    halted = true;
                }
                outcomes.push(outcome);
            }

            let report = IngestionReport {
                invocation_id,
                outcomes,
            };
            info!(
                loaded = report.loaded(),
                skipped = report.skipped(),
                failed = report.first_failure().is_some(),
                "Invocation finished"
            );
            report
        }
        .instrument(span)
        .await
    }

    async fn process_file(
        &self,
        event: &FileEvent,
        loaded_tables: &mut HashSet<String>,
    ) -> FileOutcome {
        let skipped = |reason| FileOutcome::Skipped {
            container: event.container.clone(),
            key: event.key.clone(),
            reason,
        };

        let Some(remainder) = event.key.strip_prefix(self.config.incoming_prefix.as_str()) else {
            info!(prefix = %self.config.incoming_prefix, "Skipping file outside the incoming prefix");
            return skipped(SkipReason::NotIncomingPrefix);
        };

        let base_name = remainder.rsplit('/').next().unwrap_or(remainder);

        let Some(descriptor) = self.registry.lookup(base_name) else {
            info!(file_name = base_name, "Skipping file with no matching table");
            return skipped(SkipReason::NoMatch);
        };

        info!(table = descriptor.table_name(), "Loading file");

        match self.ingest(event, base_name, descriptor).await {
            Ok((relocation, rows)) => {
                let table = descriptor.table_name().to_string();
                let replaced_earlier_load = !loaded_tables.insert(table.clone());
                if replaced_earlier_load {
                    warn!(
                        table = %table,
                        "Table was already loaded earlier in this invocation; its rows were replaced"
                    );
                }
                info!(table = %table, rows, relocated_key = %relocation.destination_key, "Imported file");

                FileOutcome::Loaded {
                    container: event.container.clone(),
                    key: event.key.clone(),
                    table,
                    relocated_key: relocation.destination_key,
                    rows,
                    replaced_earlier_load,
                }
            },
            Err(StepError { stage, error }) => {
                error!(%stage, error = %error, "Error processing file");
                FileOutcome::Failed {
                    container: event.container.clone(),
                    key: event.key.clone(),
                    stage,
                    error: error.to_string(),
                }
            },
        }
    }

    async fn ingest(
        &self,
        event: &FileEvent,
        base_name: &str,
        descriptor: &TableDescriptor,
    ) -> Result<(Relocation, u64), StepError> {
        let table = descriptor.table_name();

        let relocation = self
            .relocator
            .relocate(&event.container, &event.key, base_name, table, self.clock.now())
            .await
            .map_err(StepError::at(Stage::Relocating))?;

        let data = self
            .store
            .get(&event.container, &relocation.destination_key)
            .await
            .map_err(|e| StepError::at(Stage::Downloading)(IngestError::ObjectStore(e)))?;

        let mut dataset = parse_csv(&data, descriptor).map_err(StepError::at(Stage::Parsing))?;

        enrich(&mut dataset, descriptor, &relocation.file_name, self.clock.now())
            .map_err(StepError::at(Stage::Enriching))?;

        let rows = self
            .loader
            .load_replace(table, &self.config.schema, &dataset)
            .await
            .map_err(|source| {
                StepError::at(Stage::Loading)(IngestError::Load {
                    table: format!("{}.{}", self.config.schema, table),
                    source,
                })
            })?;

        Ok((relocation, rows))
    }
}
