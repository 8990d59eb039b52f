// SPDX-FileCopyrightText: 2026 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Helpers for building compressed fixtures in tests

use async_compression::tokio::bufread::GzipEncoder;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tokio::io::AsyncReadExt;

/// Gzip-compress `data` into a single member.
pub async fn gzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzipEncoder::new(data);
    let mut out = Vec::new();
    let _ = encoder.read_to_end(&mut out).await?;
    Ok(out)
}

/// Deterministic, poorly compressible bytes for streaming tests.
#[must_use]
pub fn noise(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; len];
    rng.fill_bytes(&mut data);
    data
}
