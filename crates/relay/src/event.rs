// SPDX-FileCopyrightText: 2026 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! S3 object-created notification payloads

use crate::{RelayError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3Event {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3EventRecord {
    #[serde(rename = "eventName", default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Object {
    /// Key as delivered by S3: form-URL-encoded
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// A decoded `{bucket, key}` pair from one notification record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

impl S3Event {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Build an event for the given `(bucket, raw key)` pairs.
    ///
    /// Keys are used verbatim, so they must already be in notification
    /// (form-URL-encoded) form.
    #[must_use]
    pub fn for_objects<'a>(objects: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            records: objects
                .into_iter()
                .map(|(bucket, key)| S3EventRecord {
                    event_name: Some("ObjectCreated:Put".to_string()),
                    s3: S3Entity {
                        bucket: S3Bucket {
                            name: bucket.to_string(),
                        },
                        object: S3Object {
                            key: key.to_string(),
                            size: None,
                        },
                    },
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl S3EventRecord {
    /// The record's bucket and decoded object key.
    pub fn object_ref(&self) -> Result<ObjectRef> {
        Ok(ObjectRef {
            bucket: self.s3.bucket.name.clone(),
            key: decode_key(&self.s3.object.key)?,
        })
    }
}

/// Decode an object key from its notification form.
///
/// S3 notifications encode keys like HTML form values: `+` stands for a
/// space and other reserved bytes appear as `%XX`.
pub fn decode_key(raw: &str) -> Result<String> {
    let spaced = raw.replace('+', " ");
    percent_encoding::percent_decode_str(&spaced)
        .decode_utf8()
        .map(|key| key.into_owned())
        .map_err(|e| RelayError::InvalidKey {
            key: raw.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "Records": [
            {
                "eventVersion": "2.1",
                "eventSource": "aws:s3",
                "awsRegion": "eu-west-1",
                "eventName": "ObjectCreated:Put",
                "s3": {
                    "s3SchemaVersion": "1.0",
                    "bucket": { "name": "raw-logs", "arn": "arn:aws:s3:::raw-logs" },
                    "object": { "key": "2024/app+server%3A1.log.gz", "size": 1024, "eTag": "abc" }
                }
            },
            {
                "s3": {
                    "bucket": { "name": "raw-logs" },
                    "object": { "key": "second.gz" }
                }
            }
        ]
    }"#;

    #[test]
    fn test_parse_notification() {
        let event = S3Event::from_json(SAMPLE).unwrap();
        assert_eq!(event.len(), 2);
        assert_eq!(event.records[0].event_name.as_deref(), Some("ObjectCreated:Put"));
        assert_eq!(event.records[0].s3.object.size, Some(1024));
        assert_eq!(event.records[1].event_name, None);

        let first = event.records[0].object_ref().unwrap();
        assert_eq!(first.bucket, "raw-logs");
        assert_eq!(first.key, "2024/app server:1.log.gz");
    }

    #[test]
    fn test_missing_records_is_empty_batch() {
        let event = S3Event::from_json("{}").unwrap();
        assert!(event.is_empty());
    }

    #[test]
    fn test_malformed_event() {
        let err = S3Event::from_json(r#"{"Records": [{"s3": {}}]}"#).unwrap_err();
        assert!(matches!(err, RelayError::Event(_)));
    }

    #[test]
    fn test_decode_key() {
        assert_eq!(decode_key("plain/key.gz").unwrap(), "plain/key.gz");
        assert_eq!(decode_key("a+b%2Bc").unwrap(), "a b+c");
        assert!(matches!(decode_key("bad%FF"), Err(RelayError::InvalidKey { .. })));
    }

    #[test]
    fn test_for_objects_round_trips_through_json() {
        let event = S3Event::for_objects([("in", "x.gz"), ("in", "y.gz")]);
        let json = serde_json::to_string(&event).unwrap();
        let parsed = S3Event::from_json(&json).unwrap();
        let keys: Vec<String> = parsed
            .records
            .iter()
            .map(|r| r.object_ref().unwrap().key)
            .collect();
        assert_eq!(keys, vec!["x.gz", "y.gz"]);
    }
}
