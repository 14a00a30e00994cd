use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Credentials, Region},
    Client,
};
use stageload_ingest::ObjectStore;
use tracing::{debug, info, instrument};

pub mod config;

/// S3 (or S3-compatible) object store
///
/// One client serves every bucket; the bucket comes with each call.
#[derive(Clone)]
pub struct Storage {
    client: Client,
}

impl Storage {
    pub async fn new(config: config::StorageConfig) -> Result<Self> {
        debug!("Initializing storage with config: {:?}", config);

        let mut s3_config_builder = match config.static_credentials() {
            Some((access_key, secret_key)) => {
                let credentials =
                    Credentials::new(access_key, secret_key, None, None, "stageload-storage");
                aws_sdk_s3::Config::builder()
                    .behavior_version(BehaviorVersion::latest())
                    .credentials_provider(credentials)
                    .region(Region::new(config.region.clone()))
            },
            None => {
                let shared = aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(config.region.clone()))
                    .load()
                    .await;
                aws_sdk_s3::config::Builder::from(&shared)
            },
        };

        s3_config_builder = s3_config_builder.force_path_style(config.path_style);
        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());

        info!(
            region = %config.region,
            endpoint = config.endpoint.as_deref().unwrap_or("aws"),
            "Storage client initialized"
        );

        Ok(Self { client })
    }
}

#[async_trait]
impl ObjectStore for Storage {
    #[instrument(skip(self))]
    async fn copy(&self, bucket: &str, source_key: &str, dest_key: &str) -> Result<()> {
        debug!(
            "Copying s3://{}/{} to s3://{}/{}",
            bucket, source_key, bucket, dest_key
        );

        self.client
            .copy_object()
            .bucket(bucket)
            .copy_source(copy_source(bucket, source_key))
            .key(dest_key)
            .send()
            .await
            .context(format!("Failed to copy s3://{}/{}", bucket, source_key))?;

        info!(
            "Successfully copied s3://{}/{} to s3://{}/{}",
            bucket, source_key, bucket, dest_key
        );

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        debug!("Deleting s3://{}/{}", bucket, key);

        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .context(format!("Failed to delete s3://{}/{}", bucket, key))?;

        info!("Successfully deleted s3://{}/{}", bucket, key);

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        debug!("Downloading from s3://{}/{}", bucket, key);

        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .context(format!("Failed to download s3://{}/{}", bucket, key))?;

        let data = response
            .body
            .collect()
            .await
            .context("Failed to read S3 response body")?
            .into_bytes()
            .to_vec();

        debug!("Downloaded {} bytes from s3://{}/{}", data.len(), bucket, key);

        Ok(data)
    }
}

/// `bucket/key` with each key segment percent-encoded, as CopyObject expects
fn copy_source(bucket: &str, key: &str) -> String {
    let encoded: Vec<_> = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("{}/{}", bucket, encoded.join("/"))
}
