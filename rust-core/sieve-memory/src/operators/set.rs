// SPDX-License-Identifier: PMPL-1.0-or-later
//! Membership and range operators.
//!
//! List values may arrive as real lists or as strings such as `"a, b"` and
//! `"[1, 2]"`; see [`sieve_core::parse_list_value`].

use std::cmp::Ordering;

use sieve_core::operators as names;
use sieve_core::{parse_list_value, OperatorError, Value};

use super::coerce_against;
use crate::operator::{required, MemoryOperator};

fn contains(candidates: &[Value], field: &Value, value_type: Option<&str>) -> bool {
    candidates
        .iter()
        .any(|candidate| field.loose_eq(&coerce_against(field, candidate, value_type)))
}

/// `in`: the field equals one of the listed values.
pub struct In;

impl MemoryOperator for In {
    fn name(&self) -> &str {
        names::IN
    }

    fn evaluate(&self, field: &Value, value: Option<&Value>, value_type: Option<&str>) -> Result<bool, OperatorError> {
        let candidates = parse_list_value(required(value, names::IN)?);
        Ok(contains(&candidates, field, value_type))
    }
}

/// `not_in`: the field equals none of the listed values.
pub struct NotIn;

impl MemoryOperator for NotIn {
    fn name(&self) -> &str {
        names::NOT_IN
    }

    fn evaluate(&self, field: &Value, value: Option<&Value>, value_type: Option<&str>) -> Result<bool, OperatorError> {
        let candidates = parse_list_value(required(value, names::NOT_IN)?);
        Ok(!contains(&candidates, field, value_type))
    }
}

/// Inclusive range check shared by `between` and `not_between`.
fn within_bounds(
    operator: &str,
    field: &Value,
    value: Option<&Value>,
    value_type: Option<&str>,
) -> Result<bool, OperatorError> {
    let bounds = match required(value, operator)? {
        Value::List(items) => items.clone(),
        raw @ Value::String(_) => parse_list_value(raw),
        _ => Vec::new(),
    };
    let [low, high] = bounds.as_slice() else {
        return Err(OperatorError::InvalidArgument(format!(
            "'{operator}' operator requires a list of exactly 2 values [min, max]"
        )));
    };

    let low = coerce_against(field, low, value_type);
    let high = coerce_against(field, high, value_type);
    Ok(field.try_cmp(&low)? != Ordering::Less && field.try_cmp(&high)? != Ordering::Greater)
}

/// `between [min, max]`, inclusive on both ends.
pub struct Between;

impl MemoryOperator for Between {
    fn name(&self) -> &str {
        names::BETWEEN
    }

    fn evaluate(&self, field: &Value, value: Option<&Value>, value_type: Option<&str>) -> Result<bool, OperatorError> {
        if field.is_null() {
            return Ok(false);
        }
        within_bounds(names::BETWEEN, field, value, value_type)
    }
}

/// `not_between [min, max]`, the complement of [`Between`] for non-null fields.
pub struct NotBetween;

impl MemoryOperator for NotBetween {
    fn name(&self) -> &str {
        names::NOT_BETWEEN
    }

    fn evaluate(&self, field: &Value, value: Option<&Value>, value_type: Option<&str>) -> Result<bool, OperatorError> {
        if field.is_null() {
            return Ok(false);
        }
        within_bounds(names::NOT_BETWEEN, field, value, value_type).map(|inside| !inside)
    }
}

/// `all`: a list field holds every listed value. An empty list matches.
pub struct All;

impl MemoryOperator for All {
    fn name(&self) -> &str {
        names::ALL
    }

    fn evaluate(&self, field: &Value, value: Option<&Value>, value_type: Option<&str>) -> Result<bool, OperatorError> {
        let present: &[Value] = match field {
            Value::Null => return Ok(false),
            Value::List(items) => items.as_slice(),
            single => std::slice::from_ref(single),
        };
        let expected = parse_list_value(required(value, names::ALL)?);
        Ok(expected.iter().all(|wanted| {
            present
                .iter()
                .any(|item| item.loose_eq(&coerce_against(item, wanted, value_type)))
        }))
    }
}
