// SPDX-FileCopyrightText: 2026 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Checked gzip decompression over any AsyncRead stream
//!
//! The member header is read and validated before the decoder is built, so a
//! source that is not gzip at all fails up front instead of surfacing as a
//! confusing read error halfway through an upload.

use async_compression::tokio::bufread::GzipDecoder;
use std::io::{Cursor, Error, ErrorKind};
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};

pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Fixed part of a gzip member header (RFC 1952, section 2.3)
pub const GZIP_HEADER_LEN: usize = 10;

const METHOD_DEFLATE: u8 = 8;
const RESERVED_FLAGS: u8 = 0xe0;

/// Decompressed byte stream produced by [`gzip_reader`]
pub type DecodedReader = Pin<Box<dyn AsyncRead + Send>>;

/// Validate the fixed gzip header fields.
///
/// # Errors
/// Returns `InvalidData` for a bad magic number, an unknown compression
/// method, or reserved flag bits.
pub fn check_header(header: &[u8; GZIP_HEADER_LEN]) -> std::io::Result<()> {
    if header[..2] != GZIP_MAGIC {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!(
                "missing gzip magic bytes (found {:02x} {:02x})",
                header[0], header[1]
            ),
        ));
    }
    if header[2] != METHOD_DEFLATE {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!("unsupported gzip compression method {}", header[2]),
        ));
    }
    if header[3] & RESERVED_FLAGS != 0 {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!("reserved gzip flag bits set ({:#04x})", header[3]),
        ));
    }
    Ok(())
}

/// Wrap `reader` in a gzip decoder after checking the member header.
///
/// Concatenated members decode as one continuous stream.
///
/// # Errors
/// Returns `InvalidData` if the stream is shorter than a gzip header or the
/// header is invalid, or any I/O error from reading the header.
pub async fn gzip_reader<R>(mut reader: R) -> std::io::Result<DecodedReader>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    let mut header = [0u8; GZIP_HEADER_LEN];
    reader.read_exact(&mut header).await.map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            Error::new(
                ErrorKind::InvalidData,
                "stream ended before a complete gzip header",
            )
        } else {
            e
        }
    })?;
    check_header(&header)?;

    // Hand the consumed header back to the decoder ahead of the rest.
    let replay = Cursor::new(header).chain(reader);
    let mut decoder = GzipDecoder::new(BufReader::new(replay));
    decoder.multiple_members(true);
    Ok(Box::pin(decoder))
}
