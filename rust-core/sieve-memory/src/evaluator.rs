// SPDX-License-Identifier: PMPL-1.0-or-later
//! Condition-tree evaluation over in-memory records.
//!
//! Records are any `Serialize` type; each is converted once into a
//! [`Value`] tree and every condition resolves its field path against that.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::ptr;

use serde::Serialize;
use tracing::{debug, trace};

use sieve_core::suggest::suggest_fields;
use sieve_core::{
    Condition, Group, GroupOperator, Node, OperatorError, OrderField, Query, QueryError, Validator,
    Value,
};

use crate::config::MemoryConfig;
use crate::operator::MemoryOperator;
use crate::registry::OperatorRegistry;
use crate::resolver;

/// Filters, sorts and paginates in-memory records.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    registry: OperatorRegistry,
    config: MemoryConfig,
}

impl MemoryBackend {
    /// Backend with every built-in operator and the default configuration.
    pub fn new() -> Self {
        Self::with_registry(OperatorRegistry::with_defaults())
    }

    pub fn with_registry(registry: OperatorRegistry) -> Self {
        Self {
            registry,
            config: MemoryConfig::default(),
        }
    }

    pub fn with_config(mut self, config: MemoryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    pub fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut OperatorRegistry {
        &mut self.registry
    }

    /// Names of every operator this backend accepts.
    pub fn operators(&self) -> Vec<String> {
        self.registry.names().map(str::to_string).collect()
    }

    /// Records of `items` matching `query`, ordered and paginated.
    ///
    /// A `None` query is rejected; a query without groups keeps every record.
    pub fn search<'a, T: Serialize>(
        &self,
        query: Option<&Query>,
        items: &'a [T],
    ) -> Result<Vec<&'a T>, QueryError> {
        let records = items
            .iter()
            .map(|item| Value::from_serialize(item).map(|value| (item, Cow::Owned(value))))
            .collect::<Result<Vec<_>, QueryError>>()?;
        self.run(query, records, short_type_name::<T>())
    }

    /// Apply `query` to a single record.
    pub fn search_one<'a, T: Serialize>(
        &self,
        query: Option<&Query>,
        item: &'a T,
    ) -> Result<Option<&'a T>, QueryError> {
        Ok(self
            .search(query, std::slice::from_ref(item))?
            .into_iter()
            .next())
    }

    /// Like [`Self::search`] for records that are already [`Value`]s, so
    /// temporal and uuid values keep their kind.
    pub fn search_values<'a>(
        &self,
        query: Option<&Query>,
        records: &'a [Value],
    ) -> Result<Vec<&'a Value>, QueryError> {
        let records = records.iter().map(|r| (r, Cow::Borrowed(r))).collect();
        self.run(query, records, "record")
    }

    /// Whether `record` passes every group of `query`. No validation.
    pub fn matches(&self, query: &Query, record: &Value) -> Result<bool, QueryError> {
        self.matches_record(query, record, "record")
    }

    fn validator(&self) -> Validator {
        Validator::new(self.registry.names()).with_max_depth(self.config.max_depth)
    }

    fn run<'a, 'v, T>(
        &self,
        query: Option<&Query>,
        records: Vec<(&'a T, Cow<'v, Value>)>,
        label: &str,
    ) -> Result<Vec<&'a T>, QueryError> {
        let query = self.validator().check(query)?;
        debug!(
            groups = query.groups.len(),
            records = records.len(),
            "evaluating query in memory"
        );

        let mut matched = if query.groups.is_empty() {
            records
        } else {
            let mut kept = Vec::with_capacity(records.len());
            for (item, record) in records {
                if self.matches_record(query, &record, label)? {
                    kept.push((item, record));
                }
            }
            kept
        };

        let order = query.order_fields();
        if !order.is_empty() {
            let mut keyed: Vec<_> = matched
                .into_iter()
                .map(|entry| {
                    let keys: Vec<Value> = order
                        .iter()
                        .map(|field| resolver::resolve(&entry.1, &field.path).into_owned())
                        .collect();
                    (keys, entry)
                })
                .collect();
            keyed.sort_by(|a, b| compare_sort_keys(&a.0, &b.0, &order));
            matched = keyed.into_iter().map(|(_, entry)| entry).collect();
        }

        let offset = query.offset.and_then(|o| usize::try_from(o).ok()).unwrap_or(0);
        let limit = query
            .limit
            .and_then(|l| usize::try_from(l).ok())
            .unwrap_or(usize::MAX);

        Ok(matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(item, _)| item)
            .collect())
    }

    fn matches_record(&self, query: &Query, record: &Value, label: &str) -> Result<bool, QueryError> {
        for group in &query.groups {
            if !self.evaluate_group(group, record, label)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn evaluate_group(&self, group: &Group, record: &Value, label: &str) -> Result<bool, QueryError> {
        if group.conditions.is_empty() {
            return Ok(true);
        }

        match group.operator {
            GroupOperator::And => self.all_match(&group.conditions, record, label),
            GroupOperator::Not => self.all_match(&group.conditions, record, label).map(|all| !all),
            GroupOperator::Or => {
                for node in &group.conditions {
                    if self.evaluate_node(node, record, label)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    fn all_match(&self, nodes: &[Node], record: &Value, label: &str) -> Result<bool, QueryError> {
        for node in nodes {
            if !self.evaluate_node(node, record, label)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn evaluate_node(&self, node: &Node, record: &Value, label: &str) -> Result<bool, QueryError> {
        match node {
            Node::Group(group) => self.evaluate_group(group, record, label),
            Node::Condition(condition) => self.evaluate_condition(condition, record, label),
        }
    }

    fn evaluate_condition(&self, condition: &Condition, record: &Value, label: &str) -> Result<bool, QueryError> {
        if self.config.strict_fields && !resolver::exists(record, &condition.field) {
            return Err(missing_field_error(record, &condition.field, label));
        }

        let operator = self.registry.lookup(&condition.operator)?;
        let field = resolver::resolve(record, &condition.field);
        let value = condition.value.as_ref().filter(|v| !v.is_null());
        let value_type = condition.value_type.as_deref();

        if attempt(operator.as_ref(), &field, value, value_type)? {
            return Ok(true);
        }

        // Any element of a list-valued field may satisfy the condition.
        if let Value::List(items) = field.as_ref() {
            for item in items {
                if attempt(operator.as_ref(), item, value, value_type)? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

/// Run one operator, treating a type mismatch as "no match".
fn attempt(
    operator: &dyn MemoryOperator,
    field: &Value,
    value: Option<&Value>,
    value_type: Option<&str>,
) -> Result<bool, QueryError> {
    match operator.evaluate(field, value, value_type) {
        Ok(matched) => Ok(matched),
        Err(OperatorError::TypeMismatch(reason)) => {
            trace!(operator = operator.name(), %reason, "comparison skipped");
            Ok(false)
        }
        Err(OperatorError::InvalidArgument(message)) => Err(QueryError::InvalidArgument {
            operator: operator.name().to_string(),
            message,
        }),
    }
}

fn missing_field_error(record: &Value, path: &str, label: &str) -> QueryError {
    let missing = resolver::find_missing(record, path);
    let (model, available) = match missing.parent {
        Some(parent) if ptr::eq(parent, record) => (label.to_string(), resolver::available_fields(parent)),
        Some(parent) => (parent.type_name().to_string(), resolver::available_fields(parent)),
        None => (label.to_string(), Vec::new()),
    };
    let suggestions = suggest_fields(&missing.segment, available.iter().map(String::as_str));

    QueryError::FieldNotFound {
        field: missing.segment,
        model,
        full_path: path.to_string(),
        available,
        suggestions,
    }
}

/// Composite comparison: nulls last in either direction, each key with its
/// own direction.
fn compare_sort_keys(a: &[Value], b: &[Value], order: &[OrderField]) -> Ordering {
    for ((x, y), field) in a.iter().zip(b).zip(order) {
        let ordering = match (x.is_null(), y.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) if field.descending => x.sort_cmp(y).reverse(),
            (false, false) => x.sort_cmp(y),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// `my_crate::model::Order<T>` becomes `Order`.
fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
