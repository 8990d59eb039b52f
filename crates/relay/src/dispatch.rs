// SPDX-FileCopyrightText: 2026 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Turn a notification batch into sequential transfers

use crate::event::S3Event;
use crate::transfer::{Transfer, TransferReport, TransferRequest};
use crate::{RelayError, Result};
use diagnostics::*;
use std::str::FromStr;

/// How a failed transfer affects the rest of its batch.
///
/// Applies the same way to download, decompression and upload failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failure; later records are not attempted.
    #[default]
    AbortBatch,
    /// Record the failure and move on to the next record.
    Continue,
}

impl FromStr for FailurePolicy {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" | "abort-batch" => Ok(FailurePolicy::AbortBatch),
            "continue" => Ok(FailurePolicy::Continue),
            other => Err(RelayError::Config(format!(
                "unknown failure policy '{other}' (expected 'abort' or 'continue')"
            ))),
        }
    }
}

/// Result of one record in a batch
#[derive(Debug)]
pub struct RecordOutcome {
    pub index: usize,
    pub key: String,
    pub result: Result<TransferReport>,
}

/// Per-record results of a dispatched batch, in input order.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub records: Vec<RecordOutcome>,
}

impl BatchOutcome {
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.records.iter().filter(|r| r.result.is_err()).count()
    }

    pub fn reports(&self) -> impl Iterator<Item = &TransferReport> {
        self.records.iter().filter_map(|r| r.result.as_ref().ok())
    }

    /// All reports, or [`RelayError::BatchFailed`] if any record failed.
    pub fn into_result(self) -> Result<Vec<TransferReport>> {
        let total = self.records.len();
        let failed = self.failed();
        let mut reports = Vec::with_capacity(total - failed);
        let mut first = None;
        for record in self.records {
            match record.result {
                Ok(report) => reports.push(report),
                Err(err) => {
                    if first.is_none() {
                        first = Some(err);
                    }
                }
            }
        }
        match first {
            None => Ok(reports),
            Some(first) => Err(RelayError::BatchFailed {
                failed,
                total,
                first: Box::new(first),
            }),
        }
    }
}

/// Runs one transfer per notification record, strictly in order.
pub struct Dispatcher<T> {
    transfer: T,
    destination_bucket: String,
    policy: FailurePolicy,
}

impl<T: Transfer> Dispatcher<T> {
    #[must_use]
    pub fn new(transfer: T, destination_bucket: impl Into<String>, policy: FailurePolicy) -> Self {
        Self {
            transfer,
            destination_bucket: destination_bucket.into(),
            policy,
        }
    }

    #[must_use]
    pub fn destination_bucket(&self) -> &str {
        &self.destination_bucket
    }

    #[must_use]
    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    #[must_use]
    pub fn transfer(&self) -> &T {
        &self.transfer
    }

    /// Transfer every record of `event` to the destination bucket.
    ///
    /// Records run one at a time in the order received; there is no
    /// deduplication and no retry.
    ///
    /// # Errors
    /// Under [`FailurePolicy::AbortBatch`] the first failure is returned as
    /// [`RelayError::BatchAborted`]. Under [`FailurePolicy::Continue`]
    /// failures are recorded in the outcome instead.
    pub async fn dispatch(&self, event: &S3Event) -> Result<BatchOutcome> {
        let total = event.len();
        debug!("Dispatching {total} record(s)", total: total as u64);

        let mut outcome = BatchOutcome {
            records: Vec::with_capacity(total),
        };

        for (index, record) in event.records.iter().enumerate() {
            let raw_key = record.s3.object.key.clone();
            let result = match record.object_ref() {
                Ok(object) => {
                    let request = TransferRequest::new(
                        object.bucket,
                        self.destination_bucket.clone(),
                        object.key,
                    );
                    self.transfer.run(&request).await
                }
                Err(err) => Err(err),
            };

            if let Err(err) = &result {
                let reason = err.to_string();
                error!(
                    "Transfer {index} of {total} ({key}) failed: {reason}",
                    index: (index + 1) as u64,
                    total: total as u64,
                    key: raw_key.as_str(),
                    reason: reason.as_str(),
                );
            }

            match (result, self.policy) {
                (Err(err), FailurePolicy::AbortBatch) => {
                    return Err(RelayError::BatchAborted {
                        index,
                        key: raw_key,
                        source: Box::new(err),
                    });
                }
                (result, _) => outcome.records.push(RecordOutcome {
                    index,
                    key: raw_key,
                    result,
                }),
            }
        }

        if outcome.failed() > 0 {
            warn!(
                "{failed} of {total} transfer(s) failed",
                failed: outcome.failed() as u64,
                total: total as u64,
            );
        }
        Ok(outcome)
    }
}
