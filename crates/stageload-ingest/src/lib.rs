//! Stageload Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Event-driven loading of staged CSV files into a relational staging schema.
//!
//! # Pipeline
//!
//! For every file event in a notification:
//!
//! 1. Keys outside the incoming prefix (`stage/` by default) are skipped
//! 2. The file name is routed to a table through the [`SchemaRegistry`]
//!    (first matching pattern wins); unknown names are skipped
//! 3. The file is moved to `{table}/{stem}_{YYYYMMDD-HHMMSS}.{ext}` by the [`Relocator`]
//! 4. The relocated file is downloaded and parsed into a [`Dataset`]
//! 5. Temporal columns are converted and load metadata appended by [`enrich`]
//! 6. The table is replaced through the [`TableLoader`]
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use stageload_ingest::{
//!     IngestionOrchestrator, Notification, ObjectStore, OrchestratorConfig, SchemaRegistry,
//!     TableLoader,
//! };
//!
//! async fn run(store: Arc<dyn ObjectStore>, loader: Arc<dyn TableLoader>) -> anyhow::Result<()> {
//!     let registry = Arc::new(SchemaRegistry::builtin()?);
//!     let orchestrator =
//!         IngestionOrchestrator::new(registry, store, loader, OrchestratorConfig::default());
//!
//!     let notification: Notification = serde_json::from_str(
//!         r#"{"Records":[{"s3":{"bucket":{"name":"bucket1"},"object":{"key":"stage/jobs_1.csv"}}}]}"#,
//!     )?;
//!     let response = orchestrator.handle(&notification).await;
//!     println!("{} {}", response.status_code, response.message);
//!     Ok(())
//! }
//! ```

pub mod dataset;
pub mod descriptor;
pub mod enricher;
pub mod error;
pub mod notification;
pub mod orchestrator;
pub mod outcome;
pub mod parser;
pub mod registry;
pub mod relocator;
pub mod store;

// Re-export commonly used types
pub use dataset::{Column, Dataset, Value};
pub use descriptor::{ColumnSpec, ColumnType, TableDescriptor};
pub use enricher::enrich;
pub use error::{IngestError, Result};
pub use notification::{FileEvent, Notification};
pub use orchestrator::{FailurePolicy, IngestionOrchestrator, OrchestratorConfig};
pub use outcome::{FileOutcome, IngestionReport, InvocationResponse, ResponseStatus, SkipReason, Stage};
pub use parser::parse_csv;
pub use registry::SchemaRegistry;
pub use relocator::{Relocation, Relocator};
pub use store::{Clock, ObjectStore, SystemClock, TableLoader};
