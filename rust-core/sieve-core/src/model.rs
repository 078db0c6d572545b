// SPDX-License-Identifier: PMPL-1.0-or-later
//! Condition-tree model and its JSON wire format.
//!
//! Wire shape:
//!
//! ```json
//! { "groups": [{ "group_operator": "and",
//!                "conditions": [{ "field": "status", "operator": "=", "value": "active" },
//!                               { "group_operator": "or", "conditions": [...] }] }],
//!   "limit": 10, "offset": 0, "order_by": ["-created"] }
//! ```
//!
//! Optional members are omitted when unset rather than written as `null`.
//! A condition whose value JSON cannot carry (dates, times, intervals,
//! uuids, non-finite floats) also gets a `value_kind` member so it decodes
//! back to the same variant. `value_type` stays the caller's casting hint.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map};

use crate::error::QueryError;
use crate::value::Value;

/// Boolean combinator of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GroupOperator {
    /// Every child must match.
    #[default]
    And,
    /// At least one child must match.
    Or,
    /// Negated conjunction: `NOT (child AND child ...)`.
    Not,
}

impl GroupOperator {
    pub const ALL: [GroupOperator; 3] = [GroupOperator::And, GroupOperator::Or, GroupOperator::Not];

    pub fn as_str(self) -> &'static str {
        match self {
            GroupOperator::And => "and",
            GroupOperator::Or => "or",
            GroupOperator::Not => "not",
        }
    }
}

impl fmt::Display for GroupOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GroupOperator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "and" => Ok(GroupOperator::And),
            "or" => Ok(GroupOperator::Or),
            "not" => Ok(GroupOperator::Not),
            _ => Err(QueryError::validation(
                format!("Invalid group_operator: '{s}'. Must be one of: and, or, not"),
                "group_operator",
            )),
        }
    }
}

/// Tags a condition's `value_kind` member may carry.
const WIRE_KINDS: [&str; 6] = ["date", "datetime", "time", "interval", "uuid", "float"];

/// A leaf comparison of one field path against one value.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Field name or dot path (`"category.name"`).
    pub field: String,
    pub operator: String,
    /// Absent for the null/emptiness operators.
    pub value: Option<Value>,
    /// Type hint used when casting `value`.
    pub value_type: Option<String>,
}

impl Condition {
    /// A condition with a value. `Value::Null` is stored as "no value".
    pub fn new(field: impl Into<String>, operator: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        Self {
            field: field.into(),
            operator: operator.into(),
            value: (!value.is_null()).then_some(value),
            value_type: None,
        }
    }

    /// A condition without a value, for `is_null` and friends.
    pub fn unary(field: impl Into<String>, operator: impl Into<String>) -> Self {
        Self::new(field, operator, Value::Null)
    }

    pub fn with_type(mut self, value_type: impl Into<String>) -> Self {
        self.value_type = Some(value_type.into());
        self
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = Map::new();
        obj.insert("field".into(), json!(self.field));
        obj.insert("operator".into(), json!(self.operator));
        if let Some(value) = &self.value {
            obj.insert("value".into(), value.to_json());
            if let Some(kind) = value.wire_kind() {
                obj.insert("value_kind".into(), json!(kind));
            }
        }
        if let Some(value_type) = &self.value_type {
            obj.insert("value_type".into(), json!(value_type));
        }
        serde_json::Value::Object(obj)
    }

    fn from_wire(obj: &Map<String, serde_json::Value>, path: &str) -> Result<Self, QueryError> {
        let field = required_str(obj, "field", path)?;
        let operator = required_str(obj, "operator", path)?;
        let mut value = match obj.get("value") {
            None | Some(serde_json::Value::Null) => None,
            Some(v) => Some(Value::from(v.clone())),
        };
        if let Some(kind) = optional_str(obj, "value_kind", path)? {
            if !WIRE_KINDS.contains(&kind.as_str()) {
                return Err(QueryError::validation(
                    format!("Invalid value_kind: '{kind}'. Must be one of: {}", WIRE_KINDS.join(", ")),
                    format!("{path}.value_kind"),
                ));
            }
            value = value
                .map(|v| {
                    v.restore_kind(&kind).ok_or_else(|| {
                        QueryError::validation(
                            format!("Condition value is not a valid {kind}"),
                            format!("{path}.value"),
                        )
                    })
                })
                .transpose()?;
        }
        let value_type = optional_str(obj, "value_type", path)?;

        Ok(Self {
            field,
            operator,
            value,
            value_type,
        })
    }
}

/// A child of a group: either a leaf or a nested group.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Condition(Condition),
    Group(Group),
}

impl Node {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Node::Condition(c) => c.to_json(),
            Node::Group(g) => g.to_json(),
        }
    }
}

impl From<Condition> for Node {
    fn from(c: Condition) -> Self {
        Node::Condition(c)
    }
}

impl From<Group> for Node {
    fn from(g: Group) -> Self {
        Node::Group(g)
    }
}

/// A boolean combinator over conditions and nested groups.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Group {
    pub operator: GroupOperator,
    pub conditions: Vec<Node>,
}

impl Group {
    pub fn new(operator: GroupOperator) -> Self {
        Self {
            operator,
            conditions: Vec::new(),
        }
    }

    /// Append a child, builder style.
    pub fn with(mut self, node: impl Into<Node>) -> Self {
        self.conditions.push(node.into());
        self
    }

    /// Nesting depth below this group (a group of leaves has depth 0).
    pub fn depth(&self) -> usize {
        self.conditions
            .iter()
            .filter_map(|node| match node {
                Node::Group(g) => Some(g.depth() + 1),
                Node::Condition(_) => None,
            })
            .max()
            .unwrap_or(0)
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "group_operator": self.operator.as_str(),
            "conditions": self.conditions.iter().map(Node::to_json).collect::<Vec<_>>(),
        })
    }

    fn from_wire(raw: &serde_json::Value, path: &str) -> Result<Self, QueryError> {
        let obj = raw
            .as_object()
            .ok_or_else(|| QueryError::validation("Group must be an object", path))?;

        let operator = match obj.get("group_operator") {
            None | Some(serde_json::Value::Null) => GroupOperator::And,
            Some(serde_json::Value::String(s)) => s.parse().map_err(|err| match err {
                QueryError::Validation { message, .. } => {
                    QueryError::validation(message, format!("{path}.group_operator"))
                }
                other => other,
            })?,
            Some(_) => {
                return Err(QueryError::validation(
                    "group_operator must be a string",
                    format!("{path}.group_operator"),
                ))
            }
        };

        let items = match obj.get("conditions") {
            None | Some(serde_json::Value::Null) => Vec::new(),
            Some(serde_json::Value::Array(items)) => items.clone(),
            Some(_) => {
                return Err(QueryError::validation(
                    "conditions must be a list",
                    format!("{path}.conditions"),
                ))
            }
        };

        let mut conditions = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let item_path = format!("{path}.conditions[{i}]");
            let item_obj = item.as_object().ok_or_else(|| {
                QueryError::validation("Condition must be an object", item_path.clone())
            })?;
            if item_obj.contains_key("conditions") && !item_obj.contains_key("field") {
                conditions.push(Node::Group(Group::from_wire(item, &item_path)?));
            } else {
                conditions.push(Node::Condition(Condition::from_wire(item_obj, &item_path)?));
            }
        }

        Ok(Self {
            operator,
            conditions,
        })
    }
}

/// One `order_by` entry split into path and direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderField {
    pub path: String,
    pub descending: bool,
}

impl OrderField {
    /// `"-created"` sorts descending on `created`; anything else ascending.
    pub fn parse(spec: &str) -> Self {
        match spec.strip_prefix('-') {
            Some(path) => Self {
                path: path.to_string(),
                descending: true,
            },
            None => Self {
                path: spec.to_string(),
                descending: false,
            },
        }
    }
}

/// Top-level search query. Groups are AND-combined.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    pub groups: Vec<Group>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// Field paths, `-` prefixed for descending.
    pub order_by: Option<Vec<String>>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when there is nothing to filter on.
    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.conditions.is_empty())
    }

    /// AND `other` onto this query.
    ///
    /// Pagination and ordering come from `self` when set, else from `other`.
    pub fn merge(&self, other: &Query) -> Query {
        Query {
            groups: self.groups.iter().chain(&other.groups).cloned().collect(),
            limit: self.limit.or(other.limit),
            offset: self.offset.or(other.offset),
            order_by: self.order_by.clone().or_else(|| other.order_by.clone()),
        }
    }

    /// Parsed `order_by` entries.
    pub fn order_fields(&self) -> Vec<OrderField> {
        self.order_by
            .iter()
            .flatten()
            .map(|spec| OrderField::parse(spec))
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = Map::new();
        obj.insert(
            "groups".into(),
            serde_json::Value::Array(self.groups.iter().map(Group::to_json).collect()),
        );
        if let Some(limit) = self.limit {
            obj.insert("limit".into(), json!(limit));
        }
        if let Some(offset) = self.offset {
            obj.insert("offset".into(), json!(offset));
        }
        if let Some(order_by) = &self.order_by {
            obj.insert("order_by".into(), json!(order_by));
        }
        serde_json::Value::Object(obj)
    }

    /// Decode the wire format.
    ///
    /// `null` and `{}` decode to the empty query. Shape errors are reported
    /// as [`QueryError::Validation`] with a path locator.
    pub fn from_json(raw: &serde_json::Value) -> Result<Query, QueryError> {
        let obj = match raw {
            serde_json::Value::Null => return Ok(Query::default()),
            serde_json::Value::Object(obj) => obj,
            _ => return Err(QueryError::validation("Query must be an object", "query")),
        };

        let groups = match obj.get("groups") {
            None | Some(serde_json::Value::Null) => Vec::new(),
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, g)| Group::from_wire(g, &format!("groups[{i}]")))
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(QueryError::validation("groups must be a list", "groups")),
        };

        let order_by = match obj.get("order_by") {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::Array(items)) => Some(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        item.as_str().map(str::to_string).ok_or_else(|| {
                            QueryError::validation(
                                "order_by entries must be strings",
                                format!("order_by[{i}]"),
                            )
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Some(_) => return Err(QueryError::validation("order_by must be a list", "order_by")),
        };

        Ok(Query {
            groups,
            limit: optional_int(obj, "limit")?,
            offset: optional_int(obj, "offset")?,
            order_by,
        })
    }

    pub fn from_json_str(raw: &str) -> Result<Query, QueryError> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        Query::from_json(&value)
    }
}

fn required_str(obj: &Map<String, serde_json::Value>, key: &str, path: &str) -> Result<String, QueryError> {
    match obj.get(key) {
        Some(serde_json::Value::String(s)) => Ok(s.clone()),
        None | Some(serde_json::Value::Null) => Err(QueryError::validation(
            format!("Condition {key} is required"),
            format!("{path}.{key}"),
        )),
        Some(_) => Err(QueryError::validation(
            format!("Condition {key} must be a string"),
            format!("{path}.{key}"),
        )),
    }
}

fn optional_str(
    obj: &Map<String, serde_json::Value>,
    key: &str,
    path: &str,
) -> Result<Option<String>, QueryError> {
    match obj.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(QueryError::validation(
            format!("{key} must be a string"),
            format!("{path}.{key}"),
        )),
    }
}

fn optional_int(obj: &Map<String, serde_json::Value>, key: &str) -> Result<Option<i64>, QueryError> {
    match obj.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or_else(|| QueryError::validation(format!("{key} must be an integer"), key)),
    }
}

impl Serialize for Query {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Query {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Query::from_json(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Query {
        Query {
            groups: vec![Group::new(GroupOperator::Or)
                .with(Condition::new("status", "=", "active"))
                .with(
                    Group::new(GroupOperator::Not)
                        .with(Condition::new("created", ">", "2024-01-01").with_type("datetime"))
                        .with(Condition::unary("deleted_at", "is_null")),
                )],
            limit: Some(10),
            offset: Some(5),
            order_by: Some(vec!["name".into(), "-created".into()]),
        }
    }

    #[test]
    fn test_wire_roundtrip() {
        let query = sample();
        let decoded = Query::from_json(&query.to_json()).unwrap();
        assert_eq!(decoded, query);
    }

    #[test]
    fn test_typed_values_survive_the_wire() {
        let day = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let query = Query {
            groups: vec![Group::new(GroupOperator::And)
                .with(Condition::new("created", ">", day))
                .with(Condition::new("window", "between", vec![Value::Date(day), Value::Date(day)]))
                .with(Condition::new("score", "<", f64::INFINITY))
                .with(Condition::new("published", "=", day).with_type("date"))],
            ..Query::default()
        };
        let json = query.to_json();
        let first = &json["groups"][0]["conditions"][0];
        assert_eq!(first["value"], "2024-01-01");
        assert_eq!(first["value_kind"], "date");
        assert!(first.get("value_type").is_none());

        assert_eq!(Query::from_json(&json).unwrap(), query);
    }

    #[test]
    fn test_value_kind_is_checked() {
        let unknown = serde_json::json!({"groups": [{"conditions": [
            {"field": "a", "operator": "=", "value": "x", "value_kind": "colour"}
        ]}]});
        let unparsable = serde_json::json!({"groups": [{"conditions": [
            {"field": "a", "operator": "=", "value": ["2024-01-01", "soon"], "value_kind": "date"}
        ]}]});
        for (body, expected) in [
            (unknown, "groups[0].conditions[0].value_kind"),
            (unparsable, "groups[0].conditions[0].value"),
        ] {
            match Query::from_json(&body) {
                Err(QueryError::Validation { path, .. }) => assert_eq!(path, expected),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_serde_roundtrip() {
        let query = sample();
        let text = serde_json::to_string(&query).unwrap();
        let parsed: Query = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, query);
    }

    #[test]
    fn test_unset_members_omitted() {
        let json = Query {
            groups: vec![Group::new(GroupOperator::And).with(Condition::unary("x", "is_null"))],
            ..Query::default()
        }
        .to_json();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("limit"));
        assert!(!obj.contains_key("order_by"));
        assert!(!json["groups"][0]["conditions"][0]
            .as_object()
            .unwrap()
            .contains_key("value"));
    }

    #[test]
    fn test_empty_document_is_empty_query() {
        assert_eq!(Query::from_json(&json!({})).unwrap(), Query::default());
        assert_eq!(Query::from_json(&serde_json::Value::Null).unwrap(), Query::default());
    }

    #[test]
    fn test_group_operator_defaults_to_and() {
        let query = Query::from_json(&json!({
            "groups": [{"conditions": [{"field": "a", "operator": "=", "value": 1}]}]
        }))
        .unwrap();
        assert_eq!(query.groups[0].operator, GroupOperator::And);
    }

    #[test]
    fn test_bad_group_operator_has_path() {
        let err = Query::from_json(&json!({
            "groups": [{"group_operator": "xor", "conditions": []}]
        }))
        .unwrap_err();
        match err {
            QueryError::Validation { path, .. } => assert_eq!(path, "groups[0].group_operator"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_item_with_field_and_conditions_is_condition() {
        let query = Query::from_json(&json!({
            "groups": [{"conditions": [
                {"field": "a", "operator": "=", "value": 1, "conditions": []}
            ]}]
        }))
        .unwrap();
        assert!(matches!(query.groups[0].conditions[0], Node::Condition(_)));
    }

    #[test]
    fn test_merge_prefers_self() {
        let user = Query {
            groups: vec![Group::new(GroupOperator::And).with(Condition::new("a", "=", 1))],
            limit: Some(5),
            ..Query::default()
        };
        let auth = Query {
            groups: vec![Group::new(GroupOperator::And).with(Condition::new("owner", "=", 7))],
            limit: Some(100),
            offset: Some(3),
            ..Query::default()
        };
        let merged = user.merge(&auth);
        assert_eq!(merged.groups.len(), 2);
        assert_eq!(merged.limit, Some(5));
        assert_eq!(merged.offset, Some(3));
    }

    #[test]
    fn test_is_empty() {
        assert!(Query::default().is_empty());
        assert!(Query {
            groups: vec![Group::new(GroupOperator::And)],
            ..Query::default()
        }
        .is_empty());
        assert!(!sample().is_empty());
    }

    #[test]
    fn test_order_field_parse() {
        assert_eq!(
            OrderField::parse("-priority"),
            OrderField {
                path: "priority".into(),
                descending: true
            }
        );
        assert!(!OrderField::parse("status").descending);
    }

    #[test]
    fn test_group_depth() {
        assert_eq!(sample().groups[0].depth(), 1);
    }
}
