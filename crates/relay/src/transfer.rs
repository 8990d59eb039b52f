// SPDX-FileCopyrightText: 2026 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Streaming gunzip transfer between two buckets
//!
//! One transfer runs two halves concurrently over a bounded [`byte_pipe`]:
//!
//! - **download**: GET the source object and append each chunk to the pipe,
//!   closing the write end when the body ends or the GET fails
//! - **upload**: decode the pipe's read end as gzip and stream the result
//!   into a staged upload of the destination object
//!
//! Neither half ever holds the whole object. Once both halves have finished
//! the staged upload is committed if both succeeded and aborted otherwise,
//! so a failed download never leaves a destination object behind.

use crate::buckets::{Bucket, BucketResolver};
use crate::decompress::gzip_reader;
use crate::key::KeyMapper;
use crate::pipe::{DEFAULT_PIPE_CAPACITY, PipeReader, SequentialWriter, byte_pipe};
use crate::{RelayConfig, RelayError, Result};
use async_trait::async_trait;
use diagnostics::*;
use futures::StreamExt;
use object_store::buffered::BufWriter;
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, Attributes};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Size of the buffer decoded bytes pass through on their way to the upload
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Move one object from `source_bucket/key` to `destination_bucket`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    source_bucket: String,
    destination_bucket: String,
    key: String,
}

impl TransferRequest {
    #[must_use]
    pub fn new(
        source_bucket: impl Into<String>,
        destination_bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            source_bucket: source_bucket.into(),
            destination_bucket: destination_bucket.into(),
            key: key.into(),
        }
    }

    #[must_use]
    pub fn source_bucket(&self) -> &str {
        &self.source_bucket
    }

    #[must_use]
    pub fn destination_bucket(&self) -> &str {
        &self.destination_bucket
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Outcome of a successful transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub request: TransferRequest,
    pub destination_key: String,
    /// Compressed bytes read from the source
    pub downloaded_bytes: u64,
    /// Decompressed bytes written to the destination
    pub uploaded_bytes: u64,
    /// Where the object landed, e.g. `s3://bucket/key`
    pub location: String,
}

/// A unit of work run once per notification record.
#[async_trait]
pub trait Transfer: Send + Sync {
    async fn run(&self, request: &TransferRequest) -> Result<TransferReport>;
}

/// Download, gunzip and upload one object without buffering it.
pub struct GunzipTransfer {
    buckets: Arc<dyn BucketResolver>,
    keys: KeyMapper,
    content_type: String,
    pipe_capacity: usize,
}

impl GunzipTransfer {
    #[must_use]
    pub fn new(buckets: Arc<dyn BucketResolver>) -> Self {
        Self {
            buckets,
            keys: KeyMapper::default(),
            content_type: crate::config::DEFAULT_CONTENT_TYPE.to_string(),
            pipe_capacity: DEFAULT_PIPE_CAPACITY,
        }
    }

    #[must_use]
    pub fn from_config(buckets: Arc<dyn BucketResolver>, config: &RelayConfig) -> Self {
        Self::new(buckets)
            .with_key_mapper(config.key_mapper())
            .with_content_type(config.content_type.clone())
            .with_pipe_capacity(config.pipe_capacity)
    }

    #[must_use]
    pub fn with_key_mapper(mut self, keys: KeyMapper) -> Self {
        self.keys = keys;
        self
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    #[must_use]
    pub fn with_pipe_capacity(mut self, pipe_capacity: usize) -> Self {
        self.pipe_capacity = pipe_capacity;
        self
    }

    /// Derive the destination key, refusing to overwrite the source.
    fn plan(&self, request: &TransferRequest) -> Result<String> {
        let destination_key = self.keys.destination_key(request.key())?;
        if request.source_bucket() == request.destination_bucket()
            && destination_key == request.key()
        {
            return Err(RelayError::SelfOverwrite {
                bucket: request.source_bucket().to_string(),
                key: request.key().to_string(),
            });
        }
        Ok(destination_key)
    }

    fn staged_upload(&self, destination: &Bucket, key: &str) -> BufWriter {
        let upload = BufWriter::new(destination.store(), ObjectPath::from(key));
        if !destination.supports_attributes() {
            debug!(
                "Bucket {bucket} does not store attributes; uploading {key} without a content type",
                bucket: destination.name(),
                key,
            );
            return upload;
        }
        let mut attributes = Attributes::new();
        let _ = attributes.insert(Attribute::ContentType, self.content_type.clone().into());
        upload.with_attributes(attributes)
    }
}

#[async_trait]
impl Transfer for GunzipTransfer {
    async fn run(&self, request: &TransferRequest) -> Result<TransferReport> {
        let destination_key = self.plan(request)?;
        let source = self.buckets.bucket(request.source_bucket())?;
        let destination = self.buckets.bucket(request.destination_bucket())?;

        debug!(
            "Gunzip {source}/{key} -> {destination}/{destination_key} through a {capacity} byte pipe",
            source: source.name(),
            key: request.key(),
            destination: destination.name(),
            destination_key: destination_key.as_str(),
            capacity: self.pipe_capacity as u64,
        );

        let (writer, reader) = byte_pipe(self.pipe_capacity);
        let mut upload = self.staged_upload(&destination, &destination_key);

        let (downloaded, uploaded) = tokio::join!(
            download(&source, request.key(), writer),
            decompress_into(reader, &mut upload, request.key(), &destination, &destination_key),
        );

        match settle(downloaded, uploaded) {
            Ok((downloaded_bytes, uploaded_bytes)) => {
                upload
                    .shutdown()
                    .await
                    .map_err(|source| RelayError::Upload {
                        bucket: destination.name().to_string(),
                        key: destination_key.clone(),
                        source,
                    })?;

                let location = destination.location(&destination_key);
                info!(
                    "Successfully uploaded {bytes} bytes to {location}",
                    bytes: uploaded_bytes,
                    location: location.as_str(),
                );

                Ok(TransferReport {
                    request: request.clone(),
                    destination_key,
                    downloaded_bytes,
                    uploaded_bytes,
                    location,
                })
            }
            Err(failure) => {
                if let Err(abort_failure) = upload.abort().await {
                    let reason = abort_failure.to_string();
                    warn!(
                        "Failed to abort staged upload of {key}: {reason}",
                        key: destination_key.as_str(),
                        reason: reason.as_str(),
                    );
                }
                Err(failure)
            }
        }
    }
}

/// Download half: stream the source object into the pipe, then close it.
async fn download(source: &Bucket, key: &str, mut writer: SequentialWriter) -> Result<u64> {
    let streamed = stream_object(source, key, &mut writer).await;
    // Close on every path so the upload half sees end-of-stream.
    let closed = writer.close().await;
    let downloaded = streamed?;
    let _ = closed.map_err(|source| RelayError::Pipe {
        key: key.to_string(),
        source,
    })?;

    info!("Downloaded {bytes} bytes from {key}", bytes: downloaded, key);
    Ok(downloaded)
}

async fn stream_object(source: &Bucket, key: &str, writer: &mut SequentialWriter) -> Result<u64> {
    let download_failure = |source_error: object_store::Error| RelayError::Download {
        bucket: source.name().to_string(),
        key: key.to_string(),
        source: source_error,
    };

    let result = source
        .store()
        .get(&ObjectPath::from(key))
        .await
        .map_err(download_failure)?;
    let expected = result.range.end - result.range.start;

    // A single GET yields the body front to back, so each chunk starts
    // exactly where the previous one ended.
    let mut body = result.into_stream();
    let mut received = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(download_failure)?;
        let _ = writer
            .write_at(received, &chunk)
            .await
            .map_err(|source| RelayError::Pipe {
                key: key.to_string(),
                source,
            })?;
        received += chunk.len() as u64;
    }

    if received != expected {
        return Err(RelayError::ShortDownload {
            key: key.to_string(),
            expected,
            actual: received,
        });
    }
    Ok(received)
}

/// Upload half: gunzip the pipe into the staged upload.
///
/// Consumes the read end, so an early failure here drops it and unblocks
/// a download waiting on a full pipe.
async fn decompress_into(
    reader: PipeReader,
    upload: &mut BufWriter,
    source_key: &str,
    destination: &Bucket,
    destination_key: &str,
) -> Result<u64> {
    let decompression_failure = |source: std::io::Error| RelayError::Decompression {
        key: source_key.to_string(),
        source,
    };

    let mut decoded = gzip_reader(reader).await.map_err(decompression_failure)?;

    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut uploaded = 0u64;
    loop {
        let n = decoded.read(&mut buffer).await.map_err(decompression_failure)?;
        if n == 0 {
            break;
        }
        upload
            .write_all(&buffer[..n])
            .await
            .map_err(|source| RelayError::Upload {
                bucket: destination.name().to_string(),
                key: destination_key.to_string(),
                source,
            })?;
        uploaded += n as u64;
    }
    Ok(uploaded)
}

/// Combine the two halves' results, picking the error that explains the failure.
///
/// A download failure wins, except when the download only failed because the
/// upload half had already given up and dropped the pipe.
fn settle(downloaded: Result<u64>, uploaded: Result<u64>) -> Result<(u64, u64)> {
    match (downloaded, uploaded) {
        (Ok(downloaded), Ok(uploaded)) => Ok((downloaded, uploaded)),
        (Err(RelayError::Pipe { source, .. }), Err(upload_failure))
            if source.is_reader_gone() =>
        {
            Err(upload_failure)
        }
        (Err(failure), _) | (Ok(_), Err(failure)) => Err(failure),
    }
}
