// SPDX-License-Identifier: PMPL-1.0-or-later
//! Structural validation of a query before it is evaluated or compiled.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::QueryError;
use crate::model::{Condition, Group, Node, Query};
use crate::operators::{self, NULL_OPERATORS};
use crate::suggest::suggest_operators;

/// Default nesting limit. Top-level groups sit at depth 0.
pub const MAX_DEPTH: usize = 10;

/// Checks a [`Query`] against a set of allowed operator names.
#[derive(Debug, Clone)]
pub struct Validator {
    operators: BTreeSet<String>,
    max_depth: usize,
}

impl Default for Validator {
    /// Every built-in operator, depth limit 10.
    fn default() -> Self {
        Self::new(operators::ALL_OPERATORS)
    }
}

impl Validator {
    pub fn new<I, S>(operators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            operators: operators.into_iter().map(Into::into).collect(),
            max_depth: MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn operators(&self) -> impl Iterator<Item = &str> {
        self.operators.iter().map(String::as_str)
    }

    /// Validate an optional query, rejecting `None` outright.
    pub fn check<'q>(&self, query: Option<&'q Query>) -> Result<&'q Query, QueryError> {
        let query = query.ok_or(QueryError::NullQuery)?;
        self.validate(query)?;
        Ok(query)
    }

    pub fn validate(&self, query: &Query) -> Result<(), QueryError> {
        if matches!(query.limit, Some(limit) if limit < 1) {
            return Err(QueryError::validation("limit must be >= 1", "limit"));
        }
        if matches!(query.offset, Some(offset) if offset < 0) {
            return Err(QueryError::validation("offset must be >= 0", "offset"));
        }

        for (i, group) in query.groups.iter().enumerate() {
            self.validate_group(group, &format!("groups[{i}]"), 0)?;
        }

        debug!(groups = query.groups.len(), "query validated");
        Ok(())
    }

    fn validate_group(&self, group: &Group, path: &str, depth: usize) -> Result<(), QueryError> {
        if depth > self.max_depth {
            return Err(QueryError::validation(
                format!("Maximum nesting depth ({}) exceeded", self.max_depth),
                path,
            ));
        }
        if group.conditions.is_empty() {
            return Err(QueryError::validation(
                "Group must contain at least one condition",
                format!("{path}.conditions"),
            ));
        }

        for (i, node) in group.conditions.iter().enumerate() {
            let item_path = format!("{path}.conditions[{i}]");
            match node {
                Node::Group(nested) => self.validate_group(nested, &item_path, depth + 1)?,
                Node::Condition(condition) => self.validate_condition(condition, &item_path)?,
            }
        }
        Ok(())
    }

    fn validate_condition(&self, condition: &Condition, path: &str) -> Result<(), QueryError> {
        if condition.field.is_empty() {
            return Err(QueryError::validation(
                "Condition field cannot be empty",
                format!("{path}.field"),
            ));
        }
        if condition.operator.is_empty() {
            return Err(QueryError::validation(
                "Condition operator cannot be empty",
                format!("{path}.operator"),
            ));
        }
        if !self.operators.contains(&condition.operator) {
            return Err(self.operator_not_found(&condition.operator));
        }

        let has_value = condition.value.as_ref().is_some_and(|v| !v.is_null());
        if !has_value && !NULL_OPERATORS.contains(&condition.operator.as_str()) {
            return Err(QueryError::validation(
                format!("Operator '{}' requires a value", condition.operator),
                format!("{path}.value"),
            ));
        }
        Ok(())
    }

    fn operator_not_found(&self, operator: &str) -> QueryError {
        QueryError::OperatorNotFound {
            operator: operator.to_string(),
            suggestions: suggest_operators(operator, self.operators()),
            valid_operators: self.operators.iter().cloned().collect(),
        }
    }
}

/// Validate `query` against every built-in operator.
pub fn validate_query(query: Option<&Query>) -> Result<&Query, QueryError> {
    Validator::default().check(query)
}
