//! Stageload Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared plumbing for the Stageload binaries.
//!
//! - **Logging**: `tracing` subscriber setup driven by environment variables
//! - **Env**: typed helpers for reading configuration from the environment

pub mod env;
pub mod logging;
