// SPDX-License-Identifier: PMPL-1.0-or-later
//! JSON container operators, mirroring the PostgreSQL `jsonb` family.

use std::collections::BTreeMap;

use sieve_core::operators as names;
use sieve_core::{cast_value, OperatorError, Value};

use crate::operator::{required, MemoryOperator};

/// Every pair of `subset` is present in `container`; nested maps recurse.
fn map_contains(container: &BTreeMap<String, Value>, subset: &BTreeMap<String, Value>) -> bool {
    subset.iter().all(|(key, wanted)| match (container.get(key), wanted) {
        (Some(Value::Map(inner)), Value::Map(wanted)) => map_contains(inner, wanted),
        (Some(present), wanted) => present.loose_eq(wanted),
        (None, _) => false,
    })
}

fn list_contains(container: &[Value], subset: &[Value]) -> bool {
    subset
        .iter()
        .all(|wanted| container.iter().any(|item| item.loose_eq(wanted)))
}

/// A JSON document written as a string is decoded when the field is a
/// container.
fn document(field: &Value, value: &Value) -> Value {
    match (field, value) {
        (Value::Map(_) | Value::List(_), Value::String(_)) => cast_value(value, Some("json")),
        _ => value.clone(),
    }
}

/// `value` as a list of key names.
fn key_list(value: &Value) -> Vec<String> {
    match value {
        Value::List(items) => items.iter().map(Value::to_string).collect(),
        single => vec![single.to_string()],
    }
}

/// `jsonb_contains` (`@>`).
pub struct Contains;

impl MemoryOperator for Contains {
    fn name(&self) -> &str {
        names::JSONB_CONTAINS
    }

    fn evaluate(&self, field: &Value, value: Option<&Value>, _: Option<&str>) -> Result<bool, OperatorError> {
        let wanted = document(field, required(value, names::JSONB_CONTAINS)?);
        Ok(match (field, &wanted) {
            (Value::Null, _) => false,
            (Value::Map(container), Value::Map(subset)) => map_contains(container, subset),
            (Value::List(container), Value::List(subset)) => list_contains(container, subset),
            (Value::List(container), item) => container.iter().any(|c| c.loose_eq(item)),
            (Value::Map(container), key) => container.contains_key(&key.to_string()),
            (Value::String(text), needle) => text.contains(&needle.to_string()),
            _ => false,
        })
    }
}

/// `jsonb_contained_by` (`<@`).
pub struct ContainedBy;

impl MemoryOperator for ContainedBy {
    fn name(&self) -> &str {
        names::JSONB_CONTAINED_BY
    }

    fn evaluate(&self, field: &Value, value: Option<&Value>, _: Option<&str>) -> Result<bool, OperatorError> {
        let outer = document(field, required(value, names::JSONB_CONTAINED_BY)?);
        Ok(match (field, &outer) {
            (Value::Map(inner), Value::Map(outer)) => map_contains(outer, inner),
            (Value::List(inner), Value::List(outer)) => list_contains(outer, inner),
            _ => false,
        })
    }
}

/// `jsonb_has_key` (`?`).
pub struct HasKey;

impl MemoryOperator for HasKey {
    fn name(&self) -> &str {
        names::JSONB_HAS_KEY
    }

    fn evaluate(&self, field: &Value, value: Option<&Value>, _: Option<&str>) -> Result<bool, OperatorError> {
        let key = required(value, names::JSONB_HAS_KEY)?.to_string();
        Ok(field.as_map().is_some_and(|map| map.contains_key(&key)))
    }
}

/// `jsonb_has_any_keys` (`?|`).
pub struct HasAnyKeys;

impl MemoryOperator for HasAnyKeys {
    fn name(&self) -> &str {
        names::JSONB_HAS_ANY_KEYS
    }

    fn evaluate(&self, field: &Value, value: Option<&Value>, _: Option<&str>) -> Result<bool, OperatorError> {
        let keys = key_list(required(value, names::JSONB_HAS_ANY_KEYS)?);
        Ok(field
            .as_map()
            .is_some_and(|map| keys.iter().any(|k| map.contains_key(k))))
    }
}

/// `jsonb_has_all_keys` (`?&`).
pub struct HasAllKeys;

impl MemoryOperator for HasAllKeys {
    fn name(&self) -> &str {
        names::JSONB_HAS_ALL_KEYS
    }

    fn evaluate(&self, field: &Value, value: Option<&Value>, _: Option<&str>) -> Result<bool, OperatorError> {
        let keys = key_list(required(value, names::JSONB_HAS_ALL_KEYS)?);
        Ok(field
            .as_map()
            .is_some_and(|map| keys.iter().all(|k| map.contains_key(k))))
    }
}

/// `jsonb_path_exists` with a dotted key path such as `$.a.b.0`.
pub struct PathExists;

impl MemoryOperator for PathExists {
    fn name(&self) -> &str {
        names::JSONB_PATH_EXISTS
    }

    fn evaluate(&self, field: &Value, value: Option<&Value>, _: Option<&str>) -> Result<bool, OperatorError> {
        if field.is_null() {
            return Ok(false);
        }
        let raw = required(value, names::JSONB_PATH_EXISTS)?.to_string();
        let path = raw.trim_matches(|c| c == '$' || c == '.');

        let mut current = field;
        for part in path.split('.') {
            current = match current {
                Value::Map(map) => match map.get(part) {
                    Some(next) => next,
                    None => return Ok(false),
                },
                Value::List(items) if !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()) => {
                    match part.parse::<usize>().ok().and_then(|i| items.get(i)) {
                        Some(next) => next,
                        None => return Ok(false),
                    }
                }
                _ => return Ok(false),
            };
        }
        Ok(true)
    }
}
