// SPDX-FileCopyrightText: 2026 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Streaming gunzip relay between object-store buckets
//!
//! When a compressed object lands in a source bucket, the relay streams it
//! out, gunzips it on the fly and streams the plain bytes into a destination
//! bucket under the same key minus its `.gz` marker. Objects are never held
//! in memory whole: a bounded byte pipe joins the download to the upload.
//!
//! # Architecture
//!
//! - **Dispatcher**: walks an S3 notification batch, one transfer per record,
//!   strictly in order, stopping or continuing on failure per [`FailurePolicy`]
//! - **GunzipTransfer**: runs the download and the decompress-upload halves
//!   concurrently and commits the upload only when both succeed
//! - **byte_pipe**: bounded in-memory conduit with an append-only writer
//! - **BucketResolver**: maps bucket names to `object_store` handles
//!   (S3, local directories, or memory)
//!
//! # Usage
//!
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use relay::{Dispatcher, GunzipTransfer, RelayConfig, S3Buckets, S3Event};
//! use std::sync::Arc;
//!
//! let config = RelayConfig::from_env()?;
//! let buckets = Arc::new(S3Buckets::from_config(&config));
//! let transfer = GunzipTransfer::from_config(buckets, &config);
//! let dispatcher = Dispatcher::new(transfer, &config.destination_bucket, config.failure_policy);
//!
//! let event = S3Event::from_json(&std::fs::read_to_string("event.json")?)?;
//! let reports = dispatcher.dispatch(&event).await?.into_result()?;
//! # Ok(())
//! # }
//! ```

pub mod buckets;
pub mod config;
pub mod decompress;
pub mod dispatch;
mod error;
pub mod event;
pub mod key;
pub mod pipe;
pub mod testing;
pub mod transfer;

pub use buckets::{Bucket, BucketResolver, LocalBuckets, MemoryBuckets, S3Buckets};
pub use config::RelayConfig;
pub use dispatch::{BatchOutcome, Dispatcher, FailurePolicy, RecordOutcome};
pub use error::{FailureKind, PipeError, RelayError};
pub use event::{ObjectRef, S3Event};
pub use key::{KeyMapper, MissingSuffixPolicy, strip_first};
pub use pipe::{PipeReader, SequentialWriter, byte_pipe};
pub use transfer::{GunzipTransfer, Transfer, TransferReport, TransferRequest};

/// Result type for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;
