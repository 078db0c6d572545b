// SPDX-License-Identifier: PMPL-1.0-or-later
//! Membership and range operators.

use sieve_core::operators as names;
use sieve_core::{cast_value, parse_list_value, QueryError, Value};

use crate::operator::{bind, effective_hint, invalid, required, PlanContext, SqlOperator};
use crate::predicate::{Expr, Predicate};
use crate::statement::FieldRef;

/// `in` and `not_in`. An empty list matches nothing (or everything).
pub struct In {
    name: &'static str,
    negated: bool,
}

impl In {
    pub const IN: In = In { name: names::IN, negated: false };
    pub const NOT_IN: In = In { name: names::NOT_IN, negated: true };
}

impl SqlOperator for In {
    fn name(&self) -> &str {
        self.name
    }

    fn compile(
        &self,
        field: &FieldRef,
        value: Option<&Value>,
        value_type: Option<&str>,
        _: &PlanContext<'_>,
    ) -> Result<Predicate, QueryError> {
        let values = parse_list_value(required(value, self.name)?)
            .iter()
            .map(|v| bind(field, v, value_type))
            .collect();
        Ok(Predicate::InList {
            expr: field.to_expr(self.name)?,
            values,
            negated: self.negated,
        })
    }
}

/// `between` and `not_between`, inclusive; exactly two bounds.
pub struct Between {
    name: &'static str,
    negated: bool,
}

impl Between {
    pub const BETWEEN: Between = Between { name: names::BETWEEN, negated: false };
    pub const NOT_BETWEEN: Between = Between { name: names::NOT_BETWEEN, negated: true };
}

impl SqlOperator for Between {
    fn name(&self) -> &str {
        self.name
    }

    fn compile(
        &self,
        field: &FieldRef,
        value: Option<&Value>,
        value_type: Option<&str>,
        _: &PlanContext<'_>,
    ) -> Result<Predicate, QueryError> {
        let bounds = match required(value, self.name)? {
            Value::List(items) => items.clone(),
            raw @ Value::String(_) => parse_list_value(raw),
            _ => Vec::new(),
        };
        let [low, high] = bounds.as_slice() else {
            return Err(invalid(
                self.name,
                format!("'{}' operator requires a list of exactly 2 values [min, max]", self.name),
            ));
        };
        Ok(Predicate::Between {
            expr: field.to_expr(self.name)?,
            low: bind(field, low, value_type),
            high: bind(field, high, value_type),
            negated: self.negated,
        })
    }
}

/// `all`: rows whose related values include every listed value.
///
/// Compiled as a primary-key sub-select over the statement so far, grouped
/// by key and keeping groups with one distinct match per listed value.
pub struct All;

impl SqlOperator for All {
    fn name(&self) -> &str {
        names::ALL
    }

    fn compile(
        &self,
        field: &FieldRef,
        value: Option<&Value>,
        value_type: Option<&str>,
        ctx: &PlanContext<'_>,
    ) -> Result<Predicate, QueryError> {
        let hint = effective_hint(field, value_type);
        let mut wanted: Vec<Value> = Vec::new();
        for item in parse_list_value(required(value, names::ALL)?) {
            let cast = cast_value(&item, hint);
            if !wanted.contains(&cast) {
                wanted.push(cast);
            }
        }
        if wanted.is_empty() {
            return Ok(Predicate::Literal(true));
        }

        Ok(Predicate::ContainsAll {
            key: ctx.primary_key(),
            base: Box::new(ctx.statement.clone()),
            column: field.to_expr(names::ALL)?,
            values: wanted.into_iter().map(Expr::Param).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{render_predicate, PlaceholderStyle};
    use crate::schema::{ColumnType, Entity, Schema};
    use crate::statement::{ColumnRef, Statement};

    fn compile(op: &dyn SqlOperator, value: Value) -> Result<Predicate, QueryError> {
        let root = Entity::new("Order", "orders");
        let schema = Schema::new().with(root.clone());
        let statement = Statement::select(&root);
        let ctx = PlanContext { schema: &schema, root: &root, statement: &statement };
        let field = FieldRef::Column(ColumnRef::new("orders", "qty").typed(ColumnType::Integer));
        op.compile(&field, Some(&value), None, &ctx)
    }

    #[test]
    fn test_in_accepts_string_lists() {
        let predicate = compile(&In::IN, Value::from("1, 2, 3")).unwrap();
        let rendered = render_predicate(&predicate, PlaceholderStyle::Dollar);
        assert_eq!(rendered.sql, "\"orders\".\"qty\" IN ($1, $2, $3)");
        assert_eq!(rendered.params, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn test_between_arity() {
        assert!(compile(&Between::BETWEEN, Value::from(vec![1, 5])).is_ok());
        assert!(matches!(
            compile(&Between::NOT_BETWEEN, Value::from(vec![1])),
            Err(QueryError::InvalidArgument { .. })
        ));
        assert!(matches!(
            compile(&Between::BETWEEN, Value::Int(3)),
            Err(QueryError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_all_dedups_and_handles_empty() {
        assert_eq!(compile(&All, Value::List(vec![])).unwrap(), Predicate::Literal(true));
        match compile(&All, Value::from(vec![1, 1, 2])).unwrap() {
            Predicate::ContainsAll { key, values, .. } => {
                assert_eq!(key, ColumnRef::new("orders", "id"));
                assert_eq!(values.len(), 2);
            }
            other => panic!("unexpected predicate {other:?}"),
        }
    }
}
