// SPDX-License-Identifier: PMPL-1.0-or-later
//! Relational backend configuration.

use serde::{Deserialize, Serialize};

use sieve_core::validator::MAX_DEPTH;

pub use crate::render::PlaceholderStyle;

/// Configuration for [`crate::SqlBackend`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlConfig {
    /// Placeholder syntax used by [`crate::SqlBackend::render`].
    pub placeholder: PlaceholderStyle,
    /// Maximum group nesting accepted by validation.
    pub max_depth: usize,
    /// Stem for synthesized join aliases; the target table name when unset.
    pub alias_prefix: Option<String>,
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            placeholder: PlaceholderStyle::Dollar,
            max_depth: MAX_DEPTH,
            alias_prefix: None,
        }
    }
}
