// SPDX-License-Identifier: PMPL-1.0-or-later
//! Built-in relational operators.
//!
//! JSON, full-text and geometry operators emit PostgreSQL (and PostGIS)
//! syntax; the rest is portable SQL.

pub mod fts;
pub mod geometry;
pub mod jsonb;
pub mod null;
pub mod set;
pub mod standard;
pub mod string;

use crate::registry::SqlOperatorRegistry;

/// Register every built-in operator into `registry`.
pub fn register_defaults(registry: &mut SqlOperatorRegistry) {
    for op in standard::Comparison::ALL {
        registry.register(op);
    }

    registry.register(set::In::IN);
    registry.register(set::In::NOT_IN);
    registry.register(set::Between::BETWEEN);
    registry.register(set::Between::NOT_BETWEEN);
    registry.register(set::All);

    for op in string::Like::ALL {
        registry.register(op);
    }
    for op in string::Substring::ALL {
        registry.register(op);
    }
    registry.register(string::Regex::CASE_SENSITIVE);
    registry.register(string::Regex::CASE_INSENSITIVE);

    registry.register(null::IsNull::IS_NULL);
    registry.register(null::IsNull::IS_NOT_NULL);
    registry.register(null::IsEmpty::IS_EMPTY);
    registry.register(null::IsEmpty::IS_NOT_EMPTY);

    registry.register(jsonb::Containment::CONTAINS);
    registry.register(jsonb::Containment::CONTAINED_BY);
    registry.register(jsonb::HasKey);
    registry.register(jsonb::HasKeys::ANY);
    registry.register(jsonb::HasKeys::ALL);
    registry.register(jsonb::PathExists);

    registry.register(fts::TextSearch::TERMS);
    registry.register(fts::TextSearch::PHRASE);

    for op in geometry::Spatial::ALL {
        registry.register(op);
    }
    registry.register(geometry::Distance::DWITHIN);
    registry.register(geometry::Distance::DISTANCE_LT);
    registry.register(geometry::BboxIntersects);
}
