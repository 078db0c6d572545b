// SPDX-License-Identifier: PMPL-1.0-or-later
//! Fluent construction of nested condition trees.
//!
//! ```
//! use sieve_core::{GroupOperator, QueryBuilder};
//!
//! // (a = 1 AND b = 2) OR (c = 3 AND d = 4)
//! let query = QueryBuilder::new()
//!     .add_group(GroupOperator::Or)
//!     .add_nested_group(GroupOperator::And)
//!     .add_condition("a", "=", 1)
//!     .add_condition("b", "=", 2)
//!     .end_nested_group()
//!     .add_nested_group(GroupOperator::And)
//!     .add_condition("c", "=", 3)
//!     .add_condition("d", "=", 4)
//!     .end_nested_group()
//!     .build();
//! assert_eq!(query.groups[0].conditions.len(), 2);
//! ```

use crate::model::{Condition, Group, GroupOperator, Node, Query};
use crate::value::Value;

/// Staging area for a [`Query`].
///
/// The open group is tracked as a stack of child indices from the current
/// top-level group down to the innermost nested group.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    groups: Vec<Group>,
    stack: Vec<usize>,
    limit: Option<i64>,
    offset: Option<i64>,
    order_by: Option<Vec<String>>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new top-level group and make it current.
    pub fn add_group(mut self, operator: GroupOperator) -> Self {
        self.groups.push(Group::new(operator));
        self.stack = vec![self.groups.len() - 1];
        self
    }

    /// Open a group inside the current one.
    pub fn add_nested_group(mut self, operator: GroupOperator) -> Self {
        if self.stack.is_empty() {
            self = self.add_group(GroupOperator::And);
        }
        if let Some(parent) = self.current_group() {
            parent.conditions.push(Node::Group(Group::new(operator)));
            let index = parent.conditions.len() - 1;
            self.stack.push(index);
        }
        self
    }

    /// Close the innermost nested group. Never leaves the top-level group.
    pub fn end_nested_group(mut self) -> Self {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
        self
    }

    /// Add a condition to the current group, opening an `and` group if none
    /// is open. A `Value::Null` value means "no value".
    pub fn add_condition(
        self,
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.push_condition(Condition::new(field, operator, value))
    }

    /// Add a condition carrying a type hint for value casting.
    pub fn add_typed_condition(
        self,
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Value>,
        value_type: impl Into<String>,
    ) -> Self {
        self.push_condition(Condition::new(field, operator, value).with_type(value_type))
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Set ordering fields; prefix a field with `-` for descending.
    pub fn order_by<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order_by = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Snapshot the staged query. Later builder calls do not affect it.
    pub fn build(&self) -> Query {
        Query {
            groups: self.groups.clone(),
            limit: self.limit,
            offset: self.offset,
            order_by: self.order_by.clone(),
        }
    }

    /// Discard everything staged so far.
    pub fn reset(self) -> Self {
        Self::default()
    }

    fn push_condition(mut self, condition: Condition) -> Self {
        if self.stack.is_empty() {
            self = self.add_group(GroupOperator::And);
        }
        if let Some(group) = self.current_group() {
            group.conditions.push(Node::Condition(condition));
        }
        self
    }

    fn current_group(&mut self) -> Option<&mut Group> {
        let (first, rest) = self.stack.split_first()?;
        let mut group = self.groups.get_mut(*first)?;
        for index in rest {
            group = match group.conditions.get_mut(*index) {
                Some(Node::Group(nested)) => nested,
                _ => return None,
            };
        }
        Some(group)
    }
}
