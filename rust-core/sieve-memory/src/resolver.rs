// SPDX-License-Identifier: PMPL-1.0-or-later
//! Dot-path resolution over in-memory records.
//!
//! Maps are indexed by key and lists by numeric segment. A list met with a
//! segment that is not a valid index broadcasts the rest of the path over
//! every element, so `items.name` yields the list of item names.

use std::borrow::Cow;

use sieve_core::Value;

/// Resolve `path` against `root`.
///
/// Missing keys resolve to `Value::Null`. A broadcast produces a list of the
/// non-null per-element results (possibly empty).
pub fn resolve<'a>(root: &'a Value, path: &str) -> Cow<'a, Value> {
    let parts: Vec<&str> = path.split('.').collect();
    resolve_parts(root, &parts)
}

fn resolve_parts<'a>(current: &'a Value, parts: &[&str]) -> Cow<'a, Value> {
    let Some((part, rest)) = parts.split_first() else {
        return Cow::Borrowed(current);
    };

    match current {
        Value::Map(map) => match map.get(*part) {
            Some(next) => resolve_parts(next, rest),
            None => Cow::Owned(Value::Null),
        },
        Value::List(items) => match list_index(items, part) {
            Some(next) => resolve_parts(next, rest),
            None => {
                let collected = items
                    .iter()
                    .map(|item| resolve_parts(item, parts))
                    .filter(|v| !v.is_null())
                    .map(Cow::into_owned)
                    .collect();
                Cow::Owned(Value::List(collected))
            }
        },
        _ => Cow::Owned(Value::Null),
    }
}

/// True when `path` exists on `root`, even if it holds null.
///
/// During a broadcast the path only has to exist on one element.
pub fn exists(root: &Value, path: &str) -> bool {
    let parts: Vec<&str> = path.split('.').collect();
    exists_parts(root, &parts)
}

fn exists_parts(current: &Value, parts: &[&str]) -> bool {
    let Some((part, rest)) = parts.split_first() else {
        return true;
    };

    match current {
        Value::Map(map) => map.get(*part).is_some_and(|next| exists_parts(next, rest)),
        Value::List(items) => match list_index(items, part) {
            Some(next) => exists_parts(next, rest),
            None => items.iter().any(|item| exists_parts(item, parts)),
        },
        _ => false,
    }
}

/// First segment of a path that could not be followed.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingField<'a> {
    pub segment: String,
    /// Value the segment was looked up on; `None` when it was null.
    pub parent: Option<&'a Value>,
}

/// Walk `path` without broadcasting and report where it breaks.
pub fn find_missing<'a>(root: &'a Value, path: &str) -> MissingField<'a> {
    let mut current = root;
    let mut last = "";

    for part in path.split('.') {
        last = part;
        let missing = |parent: Option<&'a Value>| MissingField {
            segment: part.to_string(),
            parent,
        };
        current = match current {
            Value::Null => return missing(None),
            Value::Map(map) => match map.get(part) {
                Some(next) => next,
                None => return missing(Some(current)),
            },
            Value::List(items) => match list_index(items, part) {
                Some(next) => next,
                None => return missing(Some(current)),
            },
            _ => return missing(Some(current)),
        };
    }

    MissingField {
        segment: last.to_string(),
        parent: Some(current),
    }
}

/// Field names available on `value`. For a list, those of its first element.
pub fn available_fields(value: &Value) -> Vec<String> {
    match value {
        Value::Map(map) => map.keys().cloned().collect(),
        Value::List(items) => items.first().map(available_fields).unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn list_index<'a>(items: &'a [Value], part: &str) -> Option<&'a Value> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse::<usize>().ok().and_then(|i| items.get(i))
}
