//! Stageload Server Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Webhook service that receives object-created notifications and loads the
//! staged files into PostgreSQL.
//!
//! # Overview
//!
//! - **API**: `POST /api/v1/notifications` and `GET /health` on Axum
//! - **Storage**: S3 or any S3-compatible store through the AWS SDK
//! - **Database**: full-replace table loads through SQLx
//! - **Configuration**: environment variables with compiled-in defaults
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use stageload_ingest::IngestionOrchestrator;
//! use stageload_server::{api, config::Config, db, storage::Storage};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = db::create_pool(&config.database)?;
//!     let storage = Storage::new(config.storage.clone()).await?;
//!     let orchestrator = IngestionOrchestrator::new(
//!         Arc::new(config.ingest.load_registry()?),
//!         Arc::new(storage),
//!         Arc::new(db::PgTableLoader::new(pool.clone())),
//!         config.ingest.orchestrator_config(),
//!     );
//!
//!     let app = api::create_router(api::AppState {
//!         orchestrator: Arc::new(orchestrator),
//!         db: pool,
//!     });
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod storage;

// Re-export commonly used types
pub use error::AppError;
