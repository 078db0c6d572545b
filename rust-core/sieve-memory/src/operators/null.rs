// SPDX-License-Identifier: PMPL-1.0-or-later
//! Null and emptiness checks. None of these take a condition value.

use sieve_core::operators as names;
use sieve_core::{OperatorError, Value};

use crate::operator::MemoryOperator;

/// Null, the empty string and empty containers count as empty.
fn is_empty(field: &Value) -> bool {
    match field {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::List(items) => items.is_empty(),
        Value::Map(map) => map.is_empty(),
        _ => false,
    }
}

pub struct IsNull;

impl MemoryOperator for IsNull {
    fn name(&self) -> &str {
        names::IS_NULL
    }

    fn evaluate(&self, field: &Value, _: Option<&Value>, _: Option<&str>) -> Result<bool, OperatorError> {
        Ok(field.is_null())
    }
}

pub struct IsNotNull;

impl MemoryOperator for IsNotNull {
    fn name(&self) -> &str {
        names::IS_NOT_NULL
    }

    fn evaluate(&self, field: &Value, _: Option<&Value>, _: Option<&str>) -> Result<bool, OperatorError> {
        Ok(!field.is_null())
    }
}

pub struct IsEmpty;

impl MemoryOperator for IsEmpty {
    fn name(&self) -> &str {
        names::IS_EMPTY
    }

    fn evaluate(&self, field: &Value, _: Option<&Value>, _: Option<&str>) -> Result<bool, OperatorError> {
        Ok(is_empty(field))
    }
}

pub struct IsNotEmpty;

impl MemoryOperator for IsNotEmpty {
    fn name(&self) -> &str {
        names::IS_NOT_EMPTY
    }

    fn evaluate(&self, field: &Value, _: Option<&Value>, _: Option<&str>) -> Result<bool, OperatorError> {
        Ok(!is_empty(field))
    }
}
