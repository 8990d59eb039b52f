// SPDX-FileCopyrightText: 2026 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for relay operations

use thiserror::Error;

/// Failures raised by the byte pipe's write end.
#[derive(Error, Debug)]
pub enum PipeError {
    #[error("out-of-order write: offset {actual} does not match write position {expected}")]
    OutOfOrder { expected: u64, actual: u64 },

    #[error("pipe I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipeError {
    /// True when the read end went away before the writer finished.
    #[must_use]
    pub fn is_reader_gone(&self) -> bool {
        matches!(self, PipeError::Io(e) if e.kind() == std::io::ErrorKind::BrokenPipe)
    }
}

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Unable to download item {key:?} from bucket {bucket}: {source}")]
    Download {
        bucket: String,
        key: String,
        #[source]
        source: object_store::Error,
    },

    #[error("Download of {key:?} ended after {actual} bytes, expected {expected}")]
    ShortDownload {
        key: String,
        expected: u64,
        actual: u64,
    },

    #[error("Pipe failure while streaming {key:?}: {source}")]
    Pipe {
        key: String,
        #[source]
        source: PipeError,
    },

    #[error("Invalid gzip stream in {key:?}: {source}")]
    Decompression {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to upload {key:?} to bucket {bucket}: {source}")]
    Upload {
        bucket: String,
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Object key {key:?} does not contain the compressed suffix {suffix:?}")]
    UnsuffixedKey { key: String, suffix: String },

    #[error("Object key {key:?} maps to an empty destination key")]
    EmptyDestinationKey { key: String },

    #[error("Refusing to overwrite source object {bucket}/{key} with its decompressed copy")]
    SelfOverwrite { bucket: String, key: String },

    #[error("Invalid object key {key:?} in event: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Invalid bucket name {0:?}")]
    InvalidBucket(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid event: {0}")]
    Event(#[from] serde_json::Error),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Batch aborted at record {index} ({key:?}): {source}")]
    BatchAborted {
        index: usize,
        key: String,
        #[source]
        source: Box<RelayError>,
    },

    #[error("{failed} of {total} transfers failed; first failure: {first}")]
    BatchFailed {
        failed: usize,
        total: usize,
        first: Box<RelayError>,
    },
}

/// Coarse classification of a [`RelayError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Download,
    Decompression,
    Upload,
    Key,
    /// A bucket name could not be turned into a usable store.
    Bucket,
    Config,
    Event,
    Batch,
}

impl RelayError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            RelayError::Download { .. }
            | RelayError::ShortDownload { .. }
            | RelayError::Pipe { .. } => FailureKind::Download,
            RelayError::Decompression { .. } => FailureKind::Decompression,
            RelayError::Upload { .. } => FailureKind::Upload,
            RelayError::UnsuffixedKey { .. }
            | RelayError::EmptyDestinationKey { .. }
            | RelayError::SelfOverwrite { .. }
            | RelayError::InvalidKey { .. } => FailureKind::Key,
            RelayError::InvalidBucket(_) | RelayError::ObjectStore(_) | RelayError::Io(_) => {
                FailureKind::Bucket
            }
            RelayError::Config(_) => FailureKind::Config,
            RelayError::Event(_) => FailureKind::Event,
            RelayError::BatchAborted { .. } | RelayError::BatchFailed { .. } => FailureKind::Batch,
        }
    }

    /// The error that caused a batch to fail, or `self` for per-transfer errors.
    #[must_use]
    pub fn root(&self) -> &RelayError {
        match self {
            RelayError::BatchAborted { source, .. } => source.root(),
            RelayError::BatchFailed { first, .. } => first.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_error_names_key() {
        let err = RelayError::Download {
            bucket: "incoming".to_string(),
            key: "logs/a.txt.gz".to_string(),
            source: object_store::Error::NotFound {
                path: "logs/a.txt.gz".to_string(),
                source: "missing".into(),
            },
        };
        assert!(err.to_string().contains("\"logs/a.txt.gz\""));
        assert_eq!(err.kind(), FailureKind::Download);
    }

    #[test]
    fn test_root_unwraps_batch_errors() {
        let inner = RelayError::UnsuffixedKey {
            key: "plain.txt".to_string(),
            suffix: ".gz".to_string(),
        };
        let err = RelayError::BatchAborted {
            index: 3,
            key: "plain.txt".to_string(),
            source: Box::new(inner),
        };
        assert_eq!(err.kind(), FailureKind::Batch);
        assert_eq!(err.root().kind(), FailureKind::Key);
    }

    #[test]
    fn test_reader_gone() {
        let gone = PipeError::Io(std::io::Error::from(std::io::ErrorKind::BrokenPipe));
        assert!(gone.is_reader_gone());
        let order = PipeError::OutOfOrder {
            expected: 4,
            actual: 0,
        };
        assert!(!order.is_reader_gone());
    }
}
