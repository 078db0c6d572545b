// SPDX-License-Identifier: PMPL-1.0-or-later
//! PostgreSQL full-text search.

use sieve_core::operators as names;
use sieve_core::{QueryError, Value};

use crate::operator::{required, PlanContext, SqlOperator};
use crate::predicate::{Expr, Predicate};
use crate::statement::FieldRef;

/// `to_tsvector('english', column::text) @@ <query function>('english', $n)`.
pub struct TextSearch {
    name: &'static str,
    query_function: &'static str,
}

impl TextSearch {
    /// `fts`: the value is `to_tsquery` syntax.
    pub const TERMS: TextSearch = TextSearch { name: names::FTS, query_function: "to_tsquery" };
    /// `fts_phrase`: the value is a phrase.
    pub const PHRASE: TextSearch = TextSearch { name: names::FTS_PHRASE, query_function: "phraseto_tsquery" };
}

impl SqlOperator for TextSearch {
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
        let text = required(value, self.name)?.to_string();
        let config = || Expr::raw("'english'");
        Ok(Predicate::Binary {
            left: Expr::call("to_tsvector", vec![config(), field.to_expr(self.name)?.cast("text")]),
            op: "@@".to_string(),
            right: Expr::call(self.query_function, vec![config(), Expr::param(text)]),
        })
    }
}
