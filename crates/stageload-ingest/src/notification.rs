//! Object-store event notifications
//!
//! The payload follows the S3 event notification layout, which MinIO and
//! LocalStack emit as well. Only the bucket name and object key are read.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Top-level notification. `records` is `None` when the payload carries no
/// event list at all, which is different from an empty list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "Records", default)]
    pub records: Option<Vec<EventRecord>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Entity {
    pub bucket: BucketRef,
    pub object: ObjectRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketRef {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectRef {
    pub key: String,
}

/// A single file event reduced to what the pipeline needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub container: String,
    pub key: String,
}

impl FileEvent {
    pub fn new(container: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            key: key.into(),
        }
    }
}

impl Notification {
    /// Build a notification from (bucket, key) pairs
    pub fn from_events<I, B, K>(events: I) -> Self
    where
        I: IntoIterator<Item = (B, K)>,
        B: Into<String>,
        K: Into<String>,
    {
        let records = events
            .into_iter()
            .map(|(bucket, key)| EventRecord {
                s3: S3Entity {
                    bucket: BucketRef { name: bucket.into() },
                    object: ObjectRef { key: key.into() },
                },
            })
            .collect();

        Self {
            records: Some(records),
        }
    }

    /// The file events carried by this notification, keys URL-decoded
    pub fn file_events(&self) -> Option<Vec<FileEvent>> {
        self.records.as_ref().map(|records| {
            records
                .iter()
                .map(|r| FileEvent::new(r.s3.bucket.name.clone(), decode_key(&r.s3.object.key)))
                .collect()
        })
    }
}

/// Undo the form encoding S3 applies to keys in event payloads
///
/// Keys that are not valid percent-encoding are passed through unchanged.
pub fn decode_key(raw: &str) -> String {
    let spaced: Cow<'_, str> = if raw.contains('+') {
        Cow::Owned(raw.replace('+', " "))
    } else {
        Cow::Borrowed(raw)
    };

    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced.into_owned(),
    }
}
