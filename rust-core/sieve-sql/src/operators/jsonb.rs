// SPDX-License-Identifier: PMPL-1.0-or-later
//! PostgreSQL `jsonb` operators.
//!
//! Key tests use the `jsonb_exists*` functions rather than `?`, `?|` and
//! `?&`, which would clash with `?` placeholders.

use sieve_core::operators as names;
use sieve_core::{parse_list_value, QueryError, Value};

use crate::operator::{required, PlanContext, SqlOperator};
use crate::predicate::{Expr, Predicate};
use crate::statement::FieldRef;

/// JSON text for a condition value; strings are taken as JSON already.
fn json_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_json().to_string(),
    }
}

/// `jsonb_contains` (`@>`) and `jsonb_contained_by` (`<@`).
pub struct Containment {
    name: &'static str,
    op: &'static str,
}

impl Containment {
    pub const CONTAINS: Containment = Containment { name: names::JSONB_CONTAINS, op: "@>" };
    pub const CONTAINED_BY: Containment = Containment { name: names::JSONB_CONTAINED_BY, op: "<@" };
}

impl SqlOperator for Containment {
    fn name(&self) -> &str {
        self.name
    }

    fn compile(
        &self,
        field: &FieldRef,
        value: Option<&Value>,
        _: Option<&str>,
        _: &PlanContext<'_>,
    ) -> Result<Predicate, QueryError> {
        let document = json_text(required(value, self.name)?);
        Ok(Predicate::Binary {
            left: field.to_expr(self.name)?,
            op: self.op.to_string(),
            right: Expr::param(document).cast("jsonb"),
        })
    }
}

/// `jsonb_has_key`.
pub struct HasKey;

impl SqlOperator for HasKey {
    fn name(&self) -> &str {
        names::JSONB_HAS_KEY
    }

    fn compile(
        &self,
        field: &FieldRef,
        value: Option<&Value>,
        _: Option<&str>,
        _: &PlanContext<'_>,
    ) -> Result<Predicate, QueryError> {
        let key = required(value, names::JSONB_HAS_KEY)?.to_string();
        Ok(Predicate::Function(Expr::call(
            "jsonb_exists",
            vec![field.to_expr(names::JSONB_HAS_KEY)?, Expr::param(key)],
        )))
    }
}

/// `jsonb_has_any_keys` and `jsonb_has_all_keys`.
pub struct HasKeys {
    name: &'static str,
    function: &'static str,
}

impl HasKeys {
    pub const ANY: HasKeys = HasKeys { name: names::JSONB_HAS_ANY_KEYS, function: "jsonb_exists_any" };
    pub const ALL: HasKeys = HasKeys { name: names::JSONB_HAS_ALL_KEYS, function: "jsonb_exists_all" };
}

impl SqlOperator for HasKeys {
    fn name(&self) -> &str {
        self.name
    }

    fn compile(
        &self,
        field: &FieldRef,
        value: Option<&Value>,
        _: Option<&str>,
        _: &PlanContext<'_>,
    ) -> Result<Predicate, QueryError> {
        let keys = parse_list_value(required(value, self.name)?)
            .iter()
            .map(|key| Expr::param(key.to_string()))
            .collect();
        Ok(Predicate::Function(Expr::call(
            self.function,
            vec![field.to_expr(self.name)?, Expr::Array(keys).cast("text[]")],
        )))
    }
}

/// `jsonb_path_exists` with a SQL/JSON path such as `$.a.b`.
pub struct PathExists;

impl SqlOperator for PathExists {
    fn name(&self) -> &str {
        names::JSONB_PATH_EXISTS
    }

    fn compile(
        &self,
        field: &FieldRef,
        value: Option<&Value>,
        _: Option<&str>,
        _: &PlanContext<'_>,
    ) -> Result<Predicate, QueryError> {
        let path = required(value, names::JSONB_PATH_EXISTS)?.to_string();
        Ok(Predicate::Function(Expr::call(
            "jsonb_path_exists",
            vec![
                field.to_expr(names::JSONB_PATH_EXISTS)?,
                Expr::param(path).cast("jsonpath"),
            ],
        )))
    }
}
