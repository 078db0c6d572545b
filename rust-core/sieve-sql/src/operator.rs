// SPDX-License-Identifier: PMPL-1.0-or-later
//! The relational operator contract.

use sieve_core::{cast_value, QueryError, Value};

use crate::predicate::{Expr, Predicate};
use crate::schema::{Entity, Schema};
use crate::statement::{ColumnRef, FieldRef, Statement};

/// What an operator may inspect while compiling one condition.
#[derive(Debug, Clone, Copy)]
pub struct PlanContext<'a> {
    pub schema: &'a Schema,
    /// Entity the query selects.
    pub root: &'a Entity,
    /// Statement after the condition's field was resolved.
    pub statement: &'a Statement,
}

impl PlanContext<'_> {
    /// Primary key of the root entity, qualified by its source.
    pub fn primary_key(&self) -> ColumnRef {
        ColumnRef::new(self.statement.root_source(self.root), &self.root.primary_key)
    }
}

/// Compiles one condition into a predicate.
pub trait SqlOperator: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the operator accepts a relationship, not only a column.
    fn supports_relationship(&self) -> bool {
        false
    }

    fn compile(
        &self,
        field: &FieldRef,
        value: Option<&Value>,
        value_type: Option<&str>,
        ctx: &PlanContext<'_>,
    ) -> Result<Predicate, QueryError>;
}

/// The condition value, or an error naming the operator.
pub(crate) fn required<'v>(value: Option<&'v Value>, operator: &str) -> Result<&'v Value, QueryError> {
    value.ok_or_else(|| invalid(operator, "a value is required"))
}

pub(crate) fn invalid(operator: &str, message: impl Into<String>) -> QueryError {
    QueryError::InvalidArgument {
        operator: operator.to_string(),
        message: message.into(),
    }
}

/// The condition's hint, else the hint implied by the column type.
pub(crate) fn effective_hint<'h>(field: &FieldRef, value_type: Option<&'h str>) -> Option<&'h str> {
    value_type.or_else(|| field.column_type().and_then(|t| t.cast_hint()))
}

/// `value` cast for `field` and bound as a parameter.
pub(crate) fn bind(field: &FieldRef, value: &Value, value_type: Option<&str>) -> Expr {
    Expr::Param(cast_value(value, effective_hint(field, value_type)))
}
