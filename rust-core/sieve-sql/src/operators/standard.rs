// SPDX-License-Identifier: PMPL-1.0-or-later
//! Equality and ordering comparisons.

use sieve_core::operators as names;
use sieve_core::{QueryError, Value};

use crate::operator::{bind, required, PlanContext, SqlOperator};
use crate::predicate::{CompareOp, Predicate};
use crate::statement::FieldRef;

/// `= != > < >= <=`: `column <op> $n`.
pub struct Comparison {
    name: &'static str,
    op: CompareOp,
}

impl Comparison {
    pub const ALL: [Comparison; 6] = [
        Comparison { name: names::EQUAL, op: CompareOp::Eq },
        Comparison { name: names::NOT_EQUAL, op: CompareOp::NotEq },
        Comparison { name: names::GREATER_THAN, op: CompareOp::Gt },
        Comparison { name: names::LESS_THAN, op: CompareOp::Lt },
        Comparison { name: names::GREATER_THAN_OR_EQUAL, op: CompareOp::Ge },
        Comparison { name: names::LESS_THAN_OR_EQUAL, op: CompareOp::Le },
    ];
}

impl SqlOperator for Comparison {
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
        let value = required(value, self.name)?;
        Ok(Predicate::compare(
            field.to_expr(self.name)?,
            self.op,
            bind(field, value, value_type),
        ))
    }
}
