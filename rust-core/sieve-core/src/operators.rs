// SPDX-License-Identifier: PMPL-1.0-or-later
//! Operator name surface shared by every backend.
//!
//! Backends register implementations under these names; the validator only
//! ever sees the names a backend actually registered.

// Standard comparison
pub const EQUAL: &str = "=";
pub const NOT_EQUAL: &str = "!=";
pub const GREATER_THAN: &str = ">";
pub const LESS_THAN: &str = "<";
pub const GREATER_THAN_OR_EQUAL: &str = ">=";
pub const LESS_THAN_OR_EQUAL: &str = "<=";

// Set membership and ranges
pub const IN: &str = "in";
pub const NOT_IN: &str = "not_in";
pub const ALL: &str = "all";
pub const BETWEEN: &str = "between";
pub const NOT_BETWEEN: &str = "not_between";

// String matching
pub const LIKE: &str = "like";
pub const NOT_LIKE: &str = "not_like";
pub const ILIKE: &str = "ilike";
pub const CONTAINS: &str = "contains";
pub const ICONTAINS: &str = "icontains";
pub const STARTSWITH: &str = "startswith";
pub const ISTARTSWITH: &str = "istartswith";
pub const ENDSWITH: &str = "endswith";
pub const IENDSWITH: &str = "iendswith";
pub const REGEX: &str = "regex";
pub const IREGEX: &str = "iregex";

// Null and emptiness
pub const IS_NULL: &str = "is_null";
pub const IS_NOT_NULL: &str = "is_not_null";
pub const IS_EMPTY: &str = "is_empty";
pub const IS_NOT_EMPTY: &str = "is_not_empty";

// JSON containers
pub const JSONB_CONTAINS: &str = "jsonb_contains";
pub const JSONB_CONTAINED_BY: &str = "jsonb_contained_by";
pub const JSONB_HAS_KEY: &str = "jsonb_has_key";
pub const JSONB_HAS_ANY_KEYS: &str = "jsonb_has_any_keys";
pub const JSONB_HAS_ALL_KEYS: &str = "jsonb_has_all_keys";
pub const JSONB_PATH_EXISTS: &str = "jsonb_path_exists";

// Geometry (PostGIS)
pub const INTERSECTS: &str = "intersects";
pub const WITHIN: &str = "within";
pub const CONTAINS_GEOM: &str = "contains_geom";
pub const TOUCHES: &str = "touches";
pub const CROSSES: &str = "crosses";
pub const OVERLAPS: &str = "overlaps";
pub const DISJOINT: &str = "disjoint";
pub const GEOM_EQUALS: &str = "geom_equals";
pub const DISTANCE_LT: &str = "distance_lt";
pub const DWITHIN: &str = "dwithin";
pub const BBOX_INTERSECTS: &str = "bbox_intersects";

// Full-text search
pub const FTS: &str = "fts";
pub const FTS_PHRASE: &str = "fts_phrase";

/// Operators that take no value.
pub const NULL_OPERATORS: [&str; 4] = [IS_NULL, IS_NOT_NULL, IS_EMPTY, IS_NOT_EMPTY];

/// Operators whose value is a list.
pub const LIST_OPERATORS: [&str; 7] = [
    IN,
    NOT_IN,
    ALL,
    BETWEEN,
    NOT_BETWEEN,
    JSONB_HAS_ANY_KEYS,
    JSONB_HAS_ALL_KEYS,
];

pub const GEOMETRY_OPERATORS: [&str; 11] = [
    INTERSECTS,
    WITHIN,
    CONTAINS_GEOM,
    TOUCHES,
    CROSSES,
    OVERLAPS,
    DISJOINT,
    GEOM_EQUALS,
    DISTANCE_LT,
    DWITHIN,
    BBOX_INTERSECTS,
];

/// Every built-in operator name.
pub const ALL_OPERATORS: [&str; 45] = [
    EQUAL,
    NOT_EQUAL,
    GREATER_THAN,
    LESS_THAN,
    GREATER_THAN_OR_EQUAL,
    LESS_THAN_OR_EQUAL,
    IN,
    NOT_IN,
    ALL,
    BETWEEN,
    NOT_BETWEEN,
    LIKE,
    NOT_LIKE,
    ILIKE,
    CONTAINS,
    ICONTAINS,
    STARTSWITH,
    ISTARTSWITH,
    ENDSWITH,
    IENDSWITH,
    REGEX,
    IREGEX,
    IS_NULL,
    IS_NOT_NULL,
    IS_EMPTY,
    IS_NOT_EMPTY,
    JSONB_CONTAINS,
    JSONB_CONTAINED_BY,
    JSONB_HAS_KEY,
    JSONB_HAS_ANY_KEYS,
    JSONB_HAS_ALL_KEYS,
    JSONB_PATH_EXISTS,
    INTERSECTS,
    WITHIN,
    CONTAINS_GEOM,
    TOUCHES,
    CROSSES,
    OVERLAPS,
    DISJOINT,
    GEOM_EQUALS,
    DISTANCE_LT,
    DWITHIN,
    BBOX_INTERSECTS,
    FTS,
    FTS_PHRASE,
];

pub fn is_valid_operator(operator: &str) -> bool {
    ALL_OPERATORS.contains(&operator)
}

pub fn requires_value(operator: &str) -> bool {
    !NULL_OPERATORS.contains(&operator)
}

pub fn requires_list(operator: &str) -> bool {
    LIST_OPERATORS.contains(&operator)
}

pub fn is_geometry_operator(operator: &str) -> bool {
    GEOMETRY_OPERATORS.contains(&operator)
}
