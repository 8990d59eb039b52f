// SPDX-FileCopyrightText: 2026 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use relay::{S3Event, TransferReport};

use crate::common::{RelayContext, format_report};

/// Read a notification from `event_path` (or stdin) and relay every record.
///
/// Each completed transfer is written to `out` as one line. The command
/// fails if any record failed, whatever the failure policy.
pub async fn handle_command(
    context: &RelayContext,
    event_path: Option<&Path>,
    out: &mut impl Write,
) -> Result<Vec<TransferReport>> {
    let event = read_event(event_path)?;
    diagnostics::info!(
        "Handling notification with {count} record(s)",
        count: event.len() as u64,
    );

    let outcome = context.dispatcher().dispatch(&event).await?;
    for report in outcome.reports() {
        writeln!(out, "{}", format_report(report))?;
    }

    Ok(outcome.into_result()?)
}

fn read_event(event_path: Option<&Path>) -> Result<S3Event> {
    match event_path {
        Some(path) => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("Failed to open event file {}", path.display()))?;
            S3Event::from_reader(std::io::BufReader::new(file))
                .with_context(|| format!("Failed to parse event file {}", path.display()))
        }
        None => S3Event::from_reader(std::io::stdin().lock())
            .context("Failed to parse event from stdin"),
    }
}
