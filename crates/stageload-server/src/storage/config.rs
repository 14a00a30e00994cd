use serde::{Deserialize, Serialize};
use stageload_common::env::{parse_or, var_opt, var_or};

pub const DEFAULT_REGION: &str = "us-east-1";

/// S3 client settings
///
/// The bucket is not part of the configuration: every notification names the
/// bucket its object lives in. Without static keys the default AWS credential
/// chain is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub endpoint: Option<String>,
    pub region: String,
    pub access_key: Option<String>,
    #[serde(skip_serializing)]
    pub secret_key: Option<String>,
    pub path_style: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: DEFAULT_REGION.to_string(),
            access_key: None,
            secret_key: None,
            path_style: false,
        }
    }
}

impl StorageConfig {
    pub fn from_env() -> Self {
        Self {
            endpoint: var_opt("S3_ENDPOINT"),
            region: var_or("S3_REGION", DEFAULT_REGION),
            access_key: var_opt("S3_ACCESS_KEY"),
            secret_key: var_opt("S3_SECRET_KEY"),
            path_style: parse_or("S3_PATH_STYLE", false),
        }
    }

    /// Local MinIO with its stock credentials
    pub fn for_minio(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            region: DEFAULT_REGION.to_string(),
            access_key: Some("minioadmin".to_string()),
            secret_key: Some("minioadmin".to_string()),
            path_style: true,
        }
    }

    /// Static key pair, when both halves are configured
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        match (&self.access_key, &self.secret_key) {
            (Some(access), Some(secret)) => Some((access.as_str(), secret.as_str())),
            _ => None,
        }
    }
}
