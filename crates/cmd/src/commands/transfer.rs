// SPDX-FileCopyrightText: 2026 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;

use anyhow::Result;
use relay::{Transfer, TransferReport, TransferRequest};

use crate::common::{RelayContext, format_report};

/// Relay a single object without an event envelope.
///
/// `key` is taken literally; no notification decoding is applied.
pub async fn transfer_command(
    context: &RelayContext,
    source_bucket: &str,
    key: &str,
    out: &mut impl Write,
) -> Result<TransferReport> {
    let request = TransferRequest::new(
        source_bucket,
        context.config().destination_bucket.as_str(),
        key,
    );
    let report = context.transfer().run(&request).await?;
    writeln!(out, "{}", format_report(&report))?;
    Ok(report)
}
