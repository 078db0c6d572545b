// SPDX-License-Identifier: PMPL-1.0-or-later
//! Built-in in-memory operators.
//!
//! Geometry operators have no in-memory body; callers with a geometry
//! engine register their own under the names in
//! [`sieve_core::operators::GEOMETRY_OPERATORS`].

pub mod fts;
pub mod jsonb;
pub mod null;
pub mod set;
pub mod standard;
pub mod string;

use sieve_core::{cast_value, Value};

use crate::registry::OperatorRegistry;

/// Register every built-in operator into `registry`.
pub fn register_defaults(registry: &mut OperatorRegistry) {
    registry.register(standard::Equal);
    registry.register(standard::NotEqual);
    registry.register(standard::Ordered::GREATER_THAN);
    registry.register(standard::Ordered::LESS_THAN);
    registry.register(standard::Ordered::GREATER_THAN_OR_EQUAL);
    registry.register(standard::Ordered::LESS_THAN_OR_EQUAL);

    registry.register(set::In);
    registry.register(set::NotIn);
    registry.register(set::Between);
    registry.register(set::NotBetween);
    registry.register(set::All);

    for op in string::Like::ALL {
        registry.register(op);
    }
    for op in string::Substring::ALL {
        registry.register(op);
    }
    registry.register(string::Regex::CASE_SENSITIVE);
    registry.register(string::Regex::CASE_INSENSITIVE);

    registry.register(null::IsNull);
    registry.register(null::IsNotNull);
    registry.register(null::IsEmpty);
    registry.register(null::IsNotEmpty);

    registry.register(jsonb::Contains);
    registry.register(jsonb::ContainedBy);
    registry.register(jsonb::HasKey);
    registry.register(jsonb::HasAnyKeys);
    registry.register(jsonb::HasAllKeys);
    registry.register(jsonb::PathExists);

    registry.register(fts::Fts);
    registry.register(fts::FtsPhrase);
}

/// Cast a condition value for comparison against `field`.
///
/// Without a type hint a string compared with a string field is kept as
/// written, so `"25"` still equals the text `"25"`.
pub(crate) fn coerce_against(field: &Value, value: &Value, type_hint: Option<&str>) -> Value {
    if type_hint.is_none() && matches!((field, value), (Value::String(_), Value::String(_))) {
        return value.clone();
    }
    cast_value(value, type_hint)
}
