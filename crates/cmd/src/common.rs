// SPDX-FileCopyrightText: 2026 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use relay::{
    BucketResolver, Dispatcher, FailurePolicy, GunzipTransfer, LocalBuckets, RelayConfig,
    S3Buckets, TransferReport,
};

/// Options shared by every subcommand
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Serve buckets from subdirectories of this path instead of S3
    pub local_root: Option<PathBuf>,
    /// Keep going after a failed record instead of aborting the batch
    pub continue_on_error: bool,
}

/// Configuration plus the bucket backend a command runs against.
///
/// Built once per invocation; commands only deal with transfers and
/// dispatchers from here.
pub struct RelayContext {
    config: RelayConfig,
    buckets: Arc<dyn BucketResolver>,
}

impl RelayContext {
    /// Load configuration from the environment and apply command-line overrides.
    pub fn from_env(options: &GlobalOptions) -> Result<Self> {
        let config = RelayConfig::from_env().context("Failed to load relay configuration")?;
        Ok(Self::new(config, options))
    }

    #[must_use]
    pub fn new(mut config: RelayConfig, options: &GlobalOptions) -> Self {
        if options.continue_on_error {
            config.failure_policy = FailurePolicy::Continue;
        }

        let buckets: Arc<dyn BucketResolver> = match &options.local_root {
            Some(root) => {
                let root_display = root.display().to_string();
                diagnostics::debug!("Using local buckets under {root}", root: root_display.as_str());
                Arc::new(LocalBuckets::new(root))
            }
            None => Arc::new(S3Buckets::from_config(&config)),
        };

        Self { config, buckets }
    }

    #[must_use]
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    #[must_use]
    pub fn transfer(&self) -> GunzipTransfer {
        GunzipTransfer::from_config(self.buckets.clone(), &self.config)
    }

    #[must_use]
    pub fn dispatcher(&self) -> Dispatcher<GunzipTransfer> {
        Dispatcher::new(
            self.transfer(),
            &self.config.destination_bucket,
            self.config.failure_policy,
        )
    }
}

/// One line per completed transfer: `<source> -> <location> (<bytes> bytes)`
#[must_use]
pub fn format_report(report: &TransferReport) -> String {
    format!(
        "{}/{} -> {} ({} bytes)",
        report.request.source_bucket(),
        report.request.key(),
        report.location,
        report.uploaded_bytes
    )
}
