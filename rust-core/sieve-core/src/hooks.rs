// SPDX-License-Identifier: PMPL-1.0-or-later
//! Backend-neutral state handed to field resolution hooks.
//!
//! Backends wrap [`ResolutionContext`] with their own traversal state and
//! advance it one path segment at a time.

use crate::value::Value;

/// Where resolution of one field path currently stands.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionContext {
    /// Full dot path, e.g. `"element_type.label"`.
    pub field_path: String,
    /// `field_path` split on `.`.
    pub parts: Vec<String>,
    /// Index into `parts` of the segment being resolved.
    pub current_index: usize,
    /// Condition value the field will be compared against.
    pub value: Option<Value>,
    pub value_type: Option<String>,
}

impl ResolutionContext {
    pub fn from_field(field_path: &str, value: Option<Value>, value_type: Option<String>) -> Self {
        Self {
            field_path: field_path.to_string(),
            parts: field_path.split('.').map(str::to_string).collect(),
            current_index: 0,
            value,
            value_type,
        }
    }

    pub fn current_part(&self) -> &str {
        self.parts
            .get(self.current_index)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Segments after the current one.
    pub fn remaining_parts(&self) -> &[String] {
        self.parts.get(self.current_index + 1..).unwrap_or(&[])
    }

    pub fn is_last_part(&self) -> bool {
        self.current_index + 1 >= self.parts.len()
    }

    /// Dot path up to and including the current segment.
    pub fn path_so_far(&self) -> String {
        let end = (self.current_index + 1).min(self.parts.len());
        self.parts[..end].join(".")
    }

    /// Move to segment `index`.
    pub fn at(&mut self, index: usize) -> &mut Self {
        self.current_index = index;
        self
    }
}
