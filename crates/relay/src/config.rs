// SPDX-FileCopyrightText: 2026 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Relay configuration loaded from environment variables

use crate::dispatch::FailurePolicy;
use crate::key::{DEFAULT_SUFFIX, KeyMapper, MissingSuffixPolicy};
use crate::pipe::DEFAULT_PIPE_CAPACITY;
use crate::{RelayError, Result};

pub const DESTINATION_BUCKET_VAR: &str = "DESTINATION_BUCKET";
pub const REGION_VAR: &str = "AWS_REGION";
pub const ENDPOINT_VAR: &str = "AWS_ENDPOINT_URL";
pub const SUFFIX_VAR: &str = "RELAY_COMPRESSED_SUFFIX";
pub const CONTENT_TYPE_VAR: &str = "RELAY_CONTENT_TYPE";
pub const PIPE_CAPACITY_VAR: &str = "RELAY_PIPE_CAPACITY";
pub const FAILURE_POLICY_VAR: &str = "RELAY_FAILURE_POLICY";
pub const ALLOW_UNSUFFIXED_VAR: &str = "RELAY_ALLOW_UNSUFFIXED";

pub const DEFAULT_REGION: &str = "eu-west-1";
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Bucket receiving decompressed objects
    pub destination_bucket: String,

    /// AWS region for S3 buckets
    pub region: String,

    /// Custom S3 endpoint (for MinIO, R2, etc.)
    pub endpoint: Option<String>,

    /// Marker stripped from source keys to form destination keys
    pub compressed_suffix: String,

    /// Content type attached to uploaded objects
    pub content_type: String,

    /// Unread bytes the download may run ahead of the upload
    pub pipe_capacity: usize,

    pub failure_policy: FailurePolicy,

    pub missing_suffix: MissingSuffixPolicy,
}

impl RelayConfig {
    /// Defaults for everything except the destination bucket.
    #[must_use]
    pub fn new(destination_bucket: impl Into<String>) -> Self {
        Self {
            destination_bucket: destination_bucket.into(),
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            compressed_suffix: DEFAULT_SUFFIX.to_string(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            pipe_capacity: DEFAULT_PIPE_CAPACITY,
            failure_policy: FailurePolicy::default(),
            missing_suffix: MissingSuffixPolicy::default(),
        }
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value if set.
    ///
    /// Empty values count as unset.
    ///
    /// # Errors
    /// Returns [`RelayError::Config`] naming the offending variable when the
    /// destination bucket is missing or a value does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let destination_bucket = get(DESTINATION_BUCKET_VAR).ok_or_else(|| {
            RelayError::Config(format!(
                "{DESTINATION_BUCKET_VAR} environment variable is required"
            ))
        })?;

        let mut config = Self::new(destination_bucket.trim());

        if let Some(region) = get(REGION_VAR) {
            config.region = region;
        }
        config.endpoint = get(ENDPOINT_VAR);

        if let Some(suffix) = lookup(SUFFIX_VAR) {
            if suffix.trim().is_empty() {
                return Err(RelayError::Config(format!(
                    "{SUFFIX_VAR} must not be empty or blank"
                )));
            }
            config.compressed_suffix = suffix;
        }

        if let Some(content_type) = get(CONTENT_TYPE_VAR) {
            config.content_type = content_type;
        }

        if let Some(capacity) = get(PIPE_CAPACITY_VAR) {
            config.pipe_capacity = match capacity.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(RelayError::Config(format!(
                        "{PIPE_CAPACITY_VAR} must be a positive number of bytes, got '{capacity}'"
                    )));
                }
            };
        }

        if let Some(policy) = get(FAILURE_POLICY_VAR) {
            config.failure_policy = policy
                .parse()
                .map_err(|e| named(FAILURE_POLICY_VAR, e))?;
        }

        if let Some(allow) = get(ALLOW_UNSUFFIXED_VAR) {
            config.missing_suffix = allow
                .parse()
                .map_err(|e| named(ALLOW_UNSUFFIXED_VAR, e))?;
        }

        Ok(config)
    }

    #[must_use]
    pub fn key_mapper(&self) -> KeyMapper {
        KeyMapper::new(self.compressed_suffix.clone(), self.missing_suffix)
    }
}

/// Prefix a value parse error with the variable it came from.
fn named(var: &str, err: RelayError) -> RelayError {
    match err {
        RelayError::Config(message) => RelayError::Config(format!("{var}: {message}")),
        other => other,
    }
}
