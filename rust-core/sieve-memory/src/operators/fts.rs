// SPDX-License-Identifier: PMPL-1.0-or-later
//! Plain-text stand-ins for full-text search.

use sieve_core::operators as names;
use sieve_core::{OperatorError, Value};

use crate::operator::{required, MemoryOperator};

/// `fts`: every whitespace-separated term occurs, ignoring case.
pub struct Fts;

impl MemoryOperator for Fts {
    fn name(&self) -> &str {
        names::FTS
    }

    fn evaluate(&self, field: &Value, value: Option<&Value>, _: Option<&str>) -> Result<bool, OperatorError> {
        if field.is_null() {
            return Ok(false);
        }
        let text = field.to_string().to_lowercase();
        let query = required(value, names::FTS)?.to_string().to_lowercase();
        Ok(query.split_whitespace().all(|term| text.contains(term)))
    }
}

/// `fts_phrase`: the phrase occurs verbatim, ignoring case.
pub struct FtsPhrase;

impl MemoryOperator for FtsPhrase {
    fn name(&self) -> &str {
        names::FTS_PHRASE
    }

    fn evaluate(&self, field: &Value, value: Option<&Value>, _: Option<&str>) -> Result<bool, OperatorError> {
        if field.is_null() {
            return Ok(false);
        }
        let text = field.to_string().to_lowercase();
        let phrase = required(value, names::FTS_PHRASE)?.to_string().to_lowercase();
        Ok(text.contains(&phrase))
    }
}
