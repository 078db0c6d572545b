// SPDX-License-Identifier: PMPL-1.0-or-later
//! In-memory backend configuration.

use serde::{Deserialize, Serialize};

use sieve_core::validator::MAX_DEPTH;

/// Configuration for [`crate::MemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Reject conditions whose field path does not exist on a record,
    /// instead of resolving it to null.
    pub strict_fields: bool,
    /// Maximum group nesting accepted by validation.
    pub max_depth: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            strict_fields: false,
            max_depth: MAX_DEPTH,
        }
    }
}

impl MemoryConfig {
    pub fn strict() -> Self {
        Self {
            strict_fields: true,
            ..Self::default()
        }
    }
}
