// SPDX-License-Identifier: PMPL-1.0-or-later
//! SQL text rendering for statements and predicates.
//!
//! Identifiers are always double-quoted; every condition value is bound as
//! a parameter, never interpolated.

use std::collections::BTreeSet;
use std::fmt::Write;

use serde::{Deserialize, Serialize};

use sieve_core::Value;

use crate::predicate::{Expr, Predicate};
use crate::statement::{ColumnRef, JoinKind, Source, Statement};

/// Placeholder syntax for bound parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderStyle {
    /// `$1, $2, ...` (PostgreSQL).
    #[default]
    Dollar,
    /// `?` (SQLite, MySQL).
    Question,
}

/// SQL text plus its parameters in placeholder order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedSql {
    pub sql: String,
    pub params: Vec<Value>,
}

pub(crate) struct Renderer {
    style: PlaceholderStyle,
    sql: String,
    params: Vec<Value>,
    /// Source names visible at the current point, outer queries included.
    taken: BTreeSet<String>,
}

/// `"name"` with embedded quotes doubled.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

impl Renderer {
    pub(crate) fn new(style: PlaceholderStyle) -> Self {
        Self {
            style,
            sql: String::new(),
            params: Vec::new(),
            taken: BTreeSet::new(),
        }
    }

    pub(crate) fn finish(self) -> RenderedSql {
        RenderedSql {
            sql: self.sql,
            params: self.params,
        }
    }

    fn push(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    fn ident(&mut self, name: &str) {
        let quoted = quote_ident(name);
        self.push(&quoted);
    }

    fn param(&mut self, value: &Value) {
        self.params.push(value.clone());
        match self.style {
            PlaceholderStyle::Dollar => {
                let n = self.params.len();
                let _ = write!(self.sql, "${n}");
            }
            PlaceholderStyle::Question => self.push("?"),
        }
    }

    fn column(&mut self, column: &ColumnRef) {
        self.ident(&column.source);
        self.push(".");
        self.ident(&column.column);
    }

    /// `<table>_<n>` with the smallest `n` not naming a visible source.
    fn inner_alias(&self, table: &str) -> String {
        (1..)
            .map(|n| format!("{table}_{n}"))
            .find(|alias| !self.taken.contains(alias))
            .unwrap_or_else(|| table.to_string())
    }

    fn source(&mut self, source: &Source) {
        self.ident(&source.table);
        if let Some(alias) = &source.alias {
            self.push(" AS ");
            self.ident(alias);
        }
    }

    pub(crate) fn statement(&mut self, statement: &Statement) {
        self.push("SELECT ");
        self.ident(statement.from.name());
        self.push(".* ");
        self.from_where(statement, None);

        for (i, item) in statement.order_by.iter().enumerate() {
            self.push(if i == 0 { " ORDER BY " } else { ", " });
            self.expr(&item.expr);
            self.push(if item.descending {
                " DESC NULLS LAST"
            } else {
                " ASC NULLS LAST"
            });
        }
        if let Some(limit) = statement.limit {
            let _ = write!(self.sql, " LIMIT {limit}");
        }
        if let Some(offset) = statement.offset {
            let _ = write!(self.sql, " OFFSET {offset}");
        }
    }

    /// `FROM .. JOIN .. WHERE ..`, with an optional extra conjunct.
    fn from_where(&mut self, statement: &Statement, extra: Option<&dyn Fn(&mut Renderer)>) {
        self.taken
            .extend(statement.source_names().into_iter().map(str::to_string));
        self.push("FROM ");
        self.source(&statement.from);
        for join in &statement.joins {
            self.push(match join.kind {
                JoinKind::Inner => " JOIN ",
                JoinKind::Left => " LEFT OUTER JOIN ",
            });
            self.source(&join.source);
            self.push(" ON ");
            self.column(&join.left);
            self.push(" = ");
            self.column(&join.right);
        }

        let mut first = true;
        for filter in &statement.filters {
            self.push(if first { " WHERE " } else { " AND " });
            first = false;
            self.predicate_operand(filter);
        }
        if let Some(extra) = extra {
            self.push(if first { " WHERE " } else { " AND " });
            extra(self);
        }
    }

    fn exprs(&mut self, exprs: &[Expr]) {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.expr(expr);
        }
    }

    pub(crate) fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Column(column) => self.column(column),
            Expr::Param(value) => self.param(value),
            Expr::Raw(sql) => self.push(sql),
            Expr::Function { name, args } => {
                self.push(name);
                self.push("(");
                self.exprs(args);
                self.push(")");
            }
            Expr::Cast { expr, to } => {
                self.push("CAST(");
                self.expr(expr);
                self.push(" AS ");
                self.push(to);
                self.push(")");
            }
            Expr::Array(items) => {
                self.push("ARRAY[");
                self.exprs(items);
                self.push("]");
            }
        }
    }

    /// A predicate in a position where it is combined with others.
    fn predicate_operand(&mut self, predicate: &Predicate) {
        match predicate {
            Predicate::And(children) | Predicate::Or(children) if children.len() > 1 => {
                self.push("(");
                self.predicate(predicate);
                self.push(")");
            }
            _ => self.predicate(predicate),
        }
    }

    fn junction(&mut self, children: &[Predicate], keyword: &str, empty: &str) {
        if children.is_empty() {
            self.push(empty);
            return;
        }
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                self.push(keyword);
            }
            self.predicate_operand(child);
        }
    }

    pub(crate) fn predicate(&mut self, predicate: &Predicate) {
        match predicate {
            Predicate::Compare { left, op, right } => {
                self.expr(left);
                self.push(" ");
                self.push(op.as_sql());
                self.push(" ");
                self.expr(right);
            }
            Predicate::IsNull { expr, negated } => {
                self.expr(expr);
                self.push(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Predicate::InList { values, negated, .. } if values.is_empty() => {
                self.push(if *negated { "TRUE" } else { "FALSE" });
            }
            Predicate::InList {
                expr,
                values,
                negated,
            } => {
                self.expr(expr);
                self.push(if *negated { " NOT IN (" } else { " IN (" });
                self.exprs(values);
                self.push(")");
            }
            Predicate::Between {
                expr,
                low,
                high,
                negated,
            } => {
                self.expr(expr);
                self.push(if *negated { " NOT BETWEEN " } else { " BETWEEN " });
                self.expr(low);
                self.push(" AND ");
                self.expr(high);
            }
            Predicate::Like {
                expr,
                pattern,
                negated,
                case_insensitive,
            } => {
                self.expr(expr);
                if *negated {
                    self.push(" NOT");
                }
                self.push(if *case_insensitive { " ILIKE " } else { " LIKE " });
                self.expr(pattern);
            }
            Predicate::Regex {
                expr,
                pattern,
                case_insensitive,
            } => {
                self.expr(expr);
                self.push(if *case_insensitive { " ~* " } else { " ~ " });
                self.expr(pattern);
            }
            Predicate::Binary { left, op, right } => {
                self.expr(left);
                self.push(" ");
                self.push(op);
                self.push(" ");
                self.expr(right);
            }
            Predicate::Function(expr) => self.expr(expr),
            Predicate::Exists { subject, negated } => {
                self.taken.insert(subject.source.clone());
                let inner = self.inner_alias(&subject.target_table);
                self.taken.insert(inner.clone());
                self.push(if *negated { "NOT EXISTS (SELECT 1 FROM " } else { "EXISTS (SELECT 1 FROM " });
                self.ident(&subject.target_table);
                self.push(" AS ");
                self.ident(&inner);
                self.push(" WHERE ");
                self.ident(&inner);
                self.push(".");
                self.ident(&subject.relationship.remote_key);
                self.push(" = ");
                self.ident(&subject.source);
                self.push(".");
                self.ident(&subject.relationship.local_key);
                self.push(")");
                self.taken.remove(&inner);
            }
            Predicate::ContainsAll {
                key,
                base,
                column,
                values,
            } => {
                self.column(key);
                self.push(" IN (SELECT ");
                self.column(key);
                self.push(" ");
                let membership = |r: &mut Renderer| {
                    r.expr(column);
                    r.push(" IN (");
                    r.exprs(values);
                    r.push(")");
                };
                self.from_where(base, Some(&membership));
                self.push(" GROUP BY ");
                self.column(key);
                self.push(" HAVING COUNT(DISTINCT ");
                self.expr(column);
                let _ = write!(self.sql, ") = {})", values.len());
            }
            Predicate::And(children) => self.junction(children, " AND ", "TRUE"),
            Predicate::Or(children) => self.junction(children, " OR ", "FALSE"),
            Predicate::Not(inner) => {
                self.push("NOT (");
                self.predicate(inner);
                self.push(")");
            }
            Predicate::Literal(value) => self.push(if *value { "TRUE" } else { "FALSE" }),
        }
    }
}

/// Render a lone predicate, e.g. for logging or embedding.
pub fn render_predicate(predicate: &Predicate, style: PlaceholderStyle) -> RenderedSql {
    let mut renderer = Renderer::new(style);
    renderer.predicate(predicate);
    renderer.finish()
}
