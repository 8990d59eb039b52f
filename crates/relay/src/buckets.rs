// SPDX-FileCopyrightText: 2026 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Resolve bucket names to object stores
//!
//! Event records name buckets; transfers need an `ObjectStore` for each.
//! [`S3Buckets`] talks to S3 (or any S3-compatible endpoint),
//! [`LocalBuckets`] maps each bucket to a directory, and [`MemoryBuckets`]
//! keeps everything in process for tests.

use crate::{RelayError, Result};
use diagnostics::*;
use object_store::ObjectStore;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// An object store bound to one bucket.
#[derive(Clone)]
pub struct Bucket {
    name: String,
    url_prefix: String,
    store: Arc<dyn ObjectStore>,
    supports_attributes: bool,
}

impl std::fmt::Debug for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bucket")
            .field("name", &self.name)
            .field("url_prefix", &self.url_prefix)
            .field("supports_attributes", &self.supports_attributes)
            .finish_non_exhaustive()
    }
}

impl Bucket {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        url_prefix: impl Into<String>,
        store: Arc<dyn ObjectStore>,
        supports_attributes: bool,
    ) -> Self {
        Self {
            name: name.into(),
            url_prefix: url_prefix.into(),
            store,
            supports_attributes,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn store(&self) -> Arc<dyn ObjectStore> {
        Arc::clone(&self.store)
    }

    /// Whether puts may carry attributes such as a content type.
    ///
    /// `LocalFileSystem` rejects attributes, so uploads there go out bare.
    #[must_use]
    pub fn supports_attributes(&self) -> bool {
        self.supports_attributes
    }

    /// Human-readable location of `key` in this bucket, e.g. `s3://bucket/key`.
    #[must_use]
    pub fn location(&self, key: &str) -> String {
        format!("{}/{}", self.url_prefix, key)
    }
}

/// Source of per-bucket object stores.
pub trait BucketResolver: Send + Sync {
    /// Return the store for `name`, creating it if needed.
    ///
    /// # Errors
    /// Fails if the name is unusable or the store cannot be built.
    fn bucket(&self, name: &str) -> Result<Bucket>;
}

/// S3 buckets, one client per bucket, cached for the process lifetime.
///
/// Credentials come from the standard AWS environment variables via
/// [`AmazonS3Builder::from_env`].
pub struct S3Buckets {
    region: String,
    endpoint: Option<String>,
    cache: Mutex<HashMap<String, Bucket>>,
}

impl S3Buckets {
    #[must_use]
    pub fn new(region: impl Into<String>, endpoint: Option<String>) -> Self {
        Self {
            region: region.into(),
            endpoint,
            cache: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn from_config(config: &crate::RelayConfig) -> Self {
        Self::new(config.region.clone(), config.endpoint.clone())
    }

    fn build(&self, name: &str) -> Result<Bucket> {
        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(name)
            .with_region(&self.region);

        if let Some(endpoint) = &self.endpoint {
            builder = builder.with_endpoint(endpoint);
            if endpoint.starts_with("http://") {
                builder = builder.with_allow_http(true);
            }
        }

        let store = builder.build()?;
        debug!("Built S3 store for bucket {bucket} in {region}", bucket: name, region: self.region.as_str());
        Ok(Bucket::new(name, format!("s3://{name}"), Arc::new(store), true))
    }
}

impl BucketResolver for S3Buckets {
    fn bucket(&self, name: &str) -> Result<Bucket> {
        if name.is_empty() {
            return Err(RelayError::InvalidBucket(name.to_string()));
        }
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(bucket) = cache.get(name) {
            return Ok(bucket.clone());
        }
        let bucket = self.build(name)?;
        let _ = cache.insert(name.to_string(), bucket.clone());
        Ok(bucket)
    }
}

/// Buckets as sub-directories of a local root, for running without S3.
pub struct LocalBuckets {
    root: PathBuf,
}

impl LocalBuckets {
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl BucketResolver for LocalBuckets {
    fn bucket(&self, name: &str) -> Result<Bucket> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(RelayError::InvalidBucket(name.to_string()));
        }
        let dir = self.root.join(name);
        std::fs::create_dir_all(&dir)?;
        let store = LocalFileSystem::new_with_prefix(&dir)?;
        Ok(Bucket::new(
            name,
            format!("file://{}", dir.display()),
            Arc::new(store),
            false,
        ))
    }
}

/// In-process buckets backed by [`InMemory`] stores.
#[derive(Default)]
pub struct MemoryBuckets {
    stores: Mutex<HashMap<String, Arc<InMemory>>>,
}

impl MemoryBuckets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The store for `name`, created empty on first use.
    #[must_use]
    pub fn store(&self, name: &str) -> Arc<InMemory> {
        let mut stores = self.stores.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            stores
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(InMemory::new())),
        )
    }

    /// Names of buckets that have been touched so far, sorted.
    #[must_use]
    pub fn bucket_names(&self) -> Vec<String> {
        let stores = self.stores.lock().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = stores.keys().cloned().collect();
        names.sort();
        names
    }
}

impl BucketResolver for MemoryBuckets {
    fn bucket(&self, name: &str) -> Result<Bucket> {
        if name.is_empty() {
            return Err(RelayError::InvalidBucket(name.to_string()));
        }
        let store: Arc<dyn ObjectStore> = self.store(name);
        Ok(Bucket::new(name, format!("memory://{name}"), store, true))
    }
}
