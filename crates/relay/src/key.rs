// SPDX-FileCopyrightText: 2026 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Destination key derivation

use crate::{RelayError, Result};
use std::str::FromStr;

/// Default marker for compressed objects
pub const DEFAULT_SUFFIX: &str = ".gz";

/// What to do with a source key that lacks the compressed suffix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingSuffixPolicy {
    /// Fail the transfer before touching the object store.
    #[default]
    Reject,
    /// Use the source key unchanged as the destination key.
    PassThrough,
}

/// Remove the first occurrence of `suffix` from `key`.
///
/// Only the first match is removed; the rest of the key keeps its order.
#[must_use]
pub fn strip_first(key: &str, suffix: &str) -> String {
    key.replacen(suffix, "", 1)
}

/// Maps source object keys to destination keys.
#[derive(Debug, Clone)]
pub struct KeyMapper {
    suffix: String,
    missing: MissingSuffixPolicy,
}

impl Default for KeyMapper {
    fn default() -> Self {
        Self::new(DEFAULT_SUFFIX, MissingSuffixPolicy::default())
    }
}

impl KeyMapper {
    #[must_use]
    pub fn new(suffix: impl Into<String>, missing: MissingSuffixPolicy) -> Self {
        Self {
            suffix: suffix.into(),
            missing,
        }
    }

    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    #[must_use]
    pub fn missing_suffix_policy(&self) -> MissingSuffixPolicy {
        self.missing
    }

    /// Derive the destination key for `key`.
    ///
    /// # Errors
    /// - [`RelayError::UnsuffixedKey`] when the key lacks the suffix under
    ///   [`MissingSuffixPolicy::Reject`]
    /// - [`RelayError::EmptyDestinationKey`] when nothing is left after stripping
    pub fn destination_key(&self, key: &str) -> Result<String> {
        let derived = if !self.suffix.is_empty() && key.contains(self.suffix.as_str()) {
            strip_first(key, &self.suffix)
        } else {
            match self.missing {
                MissingSuffixPolicy::Reject => {
                    return Err(RelayError::UnsuffixedKey {
                        key: key.to_string(),
                        suffix: self.suffix.clone(),
                    });
                }
                MissingSuffixPolicy::PassThrough => key.to_string(),
            }
        };

        if derived.is_empty() {
            return Err(RelayError::EmptyDestinationKey {
                key: key.to_string(),
            });
        }
        Ok(derived)
    }
}

impl FromStr for MissingSuffixPolicy {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" | "false" | "0" | "no" => Ok(MissingSuffixPolicy::Reject),
            "passthrough" | "pass-through" | "true" | "1" | "yes" => {
                Ok(MissingSuffixPolicy::PassThrough)
            }
            other => Err(RelayError::Config(format!(
                "unknown missing-suffix policy '{other}'"
            ))),
        }
    }
}
