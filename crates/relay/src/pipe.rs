// SPDX-FileCopyrightText: 2026 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Bounded in-memory byte pipe joining the download and upload halves
//!
//! The pipe holds at most `capacity` unread bytes. A writer blocks when the
//! buffer is full and a reader blocks when it is empty, so the slower half
//! of a transfer sets the pace. Closing or dropping the write end signals
//! end-of-stream once the reader has drained what was written.
//!
//! # Sequential-only producer
//!
//! Download mechanisms may annotate each chunk with its offset in the source
//! object. The pipe has no random access: it can only append. The write end
//! therefore requires offsets to arrive in order, each chunk starting exactly
//! where the previous one ended. A producer that fetches ranges in parallel
//! or out of order must reorder before writing; mismatched offsets are
//! rejected with [`PipeError::OutOfOrder`] rather than silently appended.

use crate::error::PipeError;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWriteExt, DuplexStream, ReadBuf};

/// Default number of unread bytes the pipe can hold
pub const DEFAULT_PIPE_CAPACITY: usize = 64 * 1024;

/// Open a pipe holding at most `capacity` unread bytes.
///
/// A zero capacity is raised to one byte, since nothing could ever be written.
#[must_use]
pub fn byte_pipe(capacity: usize) -> (SequentialWriter, PipeReader) {
    // Both halves of a duplex stream are bidirectional; each side here only
    // ever uses one direction.
    let (write_half, read_half) = tokio::io::duplex(capacity.max(1));
    (
        SequentialWriter {
            inner: write_half,
            position: 0,
        },
        PipeReader { inner: read_half },
    )
}

/// Append-only write end of a byte pipe.
pub struct SequentialWriter {
    inner: DuplexStream,
    position: u64,
}

impl SequentialWriter {
    /// Bytes written so far, which is also the offset the next chunk must carry.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Append `chunk`, which the producer claims starts at `offset`.
    ///
    /// Waits while the pipe is full.
    ///
    /// # Errors
    /// - [`PipeError::OutOfOrder`] if `offset` is not the current position;
    ///   nothing is written in that case
    /// - [`PipeError::Io`] if the read end has been dropped
    pub async fn write_at(&mut self, offset: u64, chunk: &[u8]) -> Result<usize, PipeError> {
        if offset != self.position {
            return Err(PipeError::OutOfOrder {
                expected: self.position,
                actual: offset,
            });
        }
        self.inner.write_all(chunk).await?;
        self.position += chunk.len() as u64;
        Ok(chunk.len())
    }

    /// Append `chunk` at the current position.
    pub async fn append(&mut self, chunk: &[u8]) -> Result<usize, PipeError> {
        let offset = self.position;
        self.write_at(offset, chunk).await
    }

    /// Signal end-of-stream to the reader and return the total bytes written.
    pub async fn close(mut self) -> Result<u64, PipeError> {
        self.inner.shutdown().await?;
        Ok(self.position)
    }
}

/// Read end of a byte pipe.
pub struct PipeReader {
    inner: DuplexStream,
}

impl AsyncRead for PipeReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio_test::{assert_pending, assert_ready, task};

    #[tokio::test]
    async fn test_bytes_arrive_in_write_order() {
        let (mut writer, mut reader) = byte_pipe(1024);

        writer.write_at(0, b"hello ").await.unwrap();
        writer.write_at(6, b"pipe").await.unwrap();
        assert_eq!(writer.position(), 10);
        assert_eq!(writer.close().await.unwrap(), 10);

        let mut out = String::new();
        let _ = reader.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "hello pipe");
    }

    #[tokio::test]
    async fn test_dropping_writer_ends_stream() {
        let (mut writer, mut reader) = byte_pipe(16);
        writer.append(b"abc").await.unwrap();
        drop(writer);

        let mut out = Vec::new();
        let _ = reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"abc");
    }

    #[tokio::test]
    async fn test_out_of_order_offset_rejected() {
        let (mut writer, _reader) = byte_pipe(64);
        writer.append(b"0123").await.unwrap();

        let err = writer.write_at(10, b"later").await.unwrap_err();
        assert!(matches!(
            err,
            PipeError::OutOfOrder {
                expected: 4,
                actual: 10
            }
        ));
        // Rejected chunk is not counted.
        assert_eq!(writer.position(), 4);

        let err = writer.write_at(0, b"again").await.unwrap_err();
        assert!(matches!(err, PipeError::OutOfOrder { .. }));
    }

    #[tokio::test]
    async fn test_writer_blocks_when_full() {
        let (mut writer, mut reader) = byte_pipe(16);
        writer.append(&[7u8; 16]).await.unwrap();

        {
            // Buffer is full and nobody reads: the next write must wait.
            let mut blocked = task::spawn(writer.append(&[8u8; 4]));
            assert_pending!(blocked.poll());

            let mut drained = [0u8; 16];
            reader.read_exact(&mut drained).await.unwrap();
            assert_eq!(drained, [7u8; 16]);

            assert!(blocked.is_woken());
            assert_eq!(assert_ready!(blocked.poll()).unwrap(), 4);
        }
        assert_eq!(writer.position(), 20);
    }

    #[tokio::test]
    async fn test_write_fails_after_reader_dropped() {
        let (mut writer, reader) = byte_pipe(8);
        drop(reader);

        let err = writer.append(b"orphan").await.unwrap_err();
        assert!(err.is_reader_gone());
    }

    #[tokio::test]
    async fn test_zero_capacity_is_usable() {
        let (mut writer, mut reader) = byte_pipe(0);
        let produce = async move {
            writer.append(b"xyz").await.unwrap();
            writer.close().await.unwrap()
        };
        let consume = async move {
            let mut out = Vec::new();
            let _ = reader.read_to_end(&mut out).await.unwrap();
            out
        };
        let (written, read) = tokio::join!(produce, consume);
        assert_eq!(written, 3);
        assert_eq!(read, b"xyz");
    }
}
