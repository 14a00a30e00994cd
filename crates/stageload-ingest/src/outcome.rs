//! Per-file outcomes and the invocation response derived from them

use serde::Serialize;
use uuid::Uuid;

pub const SUCCESS_MESSAGE: &str = "File processed and imported successfully!";
pub const MISSING_RECORDS_MESSAGE: &str = "Invalid event: Missing 'Records'";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Key is outside the incoming prefix
    NotIncomingPrefix,
    /// No descriptor matches the file name
    NoMatch,
    /// An earlier file failed and the invocation stopped
    NotAttempted,
}

/// Pipeline step a file was in when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Relocating,
    Downloading,
    Parsing,
    Enriching,
    Loading,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Relocating => "relocating",
            Stage::Downloading => "downloading",
            Stage::Parsing => "parsing",
            Stage::Enriching => "enriching",
            Stage::Loading => "loading",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Loaded {
        container: String,
        key: String,
        table: String,
        relocated_key: String,
        rows: u64,
        /// Another file earlier in the same invocation was loaded into this table
        replaced_earlier_load: bool,
    },
    Skipped {
        container: String,
        key: String,
        reason: SkipReason,
    },
    Failed {
        container: String,
        key: String,
        stage: Stage,
        error: String,
    },
}

impl FileOutcome {
    pub fn key(&self) -> &str {
        match self {
            FileOutcome::Loaded { key, .. }
            | FileOutcome::Skipped { key, .. }
            | FileOutcome::Failed { key, .. } => key,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, FileOutcome::Failed { .. })
    }
}

/// Everything that happened during one invocation, in event order
#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    pub invocation_id: Uuid,
    pub outcomes: Vec<FileOutcome>,
}

impl IngestionReport {
    pub fn loaded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Loaded { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Skipped { .. }))
            .count()
    }

    pub fn first_failure(&self) -> Option<&FileOutcome> {
        self.outcomes.iter().find(|o| o.is_failure())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Success,
    ClientError,
    ServerError,
}

impl ResponseStatus {
    pub fn status_code(self) -> u16 {
        match self {
            ResponseStatus::Success => 200,
            ResponseStatus::ClientError => 400,
            ResponseStatus::ServerError => 500,
        }
    }
}

/// What the caller of one invocation gets back
///
/// Skips never affect the status. Any failed file turns the whole invocation
/// into a server error carrying that file's error, even when other files in
/// the same batch were loaded.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationResponse {
    pub status_code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invocation_id: Option<Uuid>,
    pub outcomes: Vec<FileOutcome>,
}

impl InvocationResponse {
    /// Response for a payload without an event list
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            status_code: ResponseStatus::ClientError.status_code(),
            message: message.into(),
            invocation_id: None,
            outcomes: Vec::new(),
        }
    }

    pub fn from_report(report: IngestionReport) -> Self {
        let (status, message) = match report.first_failure() {
            Some(FileOutcome::Failed { error, .. }) => (
                ResponseStatus::ServerError,
                format!("Error processing file: {}", error),
            ),
            _ => (ResponseStatus::Success, SUCCESS_MESSAGE.to_string()),
        };

        Self {
            status_code: status.status_code(),
            message,
            invocation_id: Some(report.invocation_id),
            outcomes: report.outcomes,
        }
    }

    pub fn status(&self) -> ResponseStatus {
        match self.status_code {
            200..=299 => ResponseStatus::Success,
            400..=499 => ResponseStatus::ClientError,
            _ => ResponseStatus::ServerError,
        }
    }
}
