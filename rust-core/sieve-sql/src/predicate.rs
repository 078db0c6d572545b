// SPDX-License-Identifier: PMPL-1.0-or-later
//! Boolean predicate tree compiled from condition groups.

use serde::{Deserialize, Serialize};

use sieve_core::Value;

use crate::statement::{ColumnRef, RelationshipRef, Statement};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    NotEq,
    Gt,
    Lt,
    Ge,
    Le,
}

impl CompareOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "<>",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
        }
    }
}

/// Scalar expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Column(ColumnRef),
    /// Bound as a query parameter.
    Param(Value),
    /// Emitted verbatim. Never built from condition values.
    Raw(String),
    Function { name: String, args: Vec<Expr> },
    Cast { expr: Box<Expr>, to: String },
    Array(Vec<Expr>),
}

impl Expr {
    pub fn param(value: impl Into<Value>) -> Self {
        Expr::Param(value.into())
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        Expr::Raw(sql.into())
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Function {
            name: name.into(),
            args,
        }
    }

    pub fn cast(self, to: impl Into<String>) -> Self {
        Expr::Cast {
            expr: Box::new(self),
            to: to.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    Compare {
        left: Expr,
        op: CompareOp,
        right: Expr,
    },
    IsNull {
        expr: Expr,
        negated: bool,
    },
    InList {
        expr: Expr,
        values: Vec<Expr>,
        negated: bool,
    },
    Between {
        expr: Expr,
        low: Expr,
        high: Expr,
        negated: bool,
    },
    Like {
        expr: Expr,
        pattern: Expr,
        negated: bool,
        case_insensitive: bool,
    },
    Regex {
        expr: Expr,
        pattern: Expr,
        case_insensitive: bool,
    },
    /// Infix operator such as `@>` or `@@`.
    Binary {
        left: Expr,
        op: String,
        right: Expr,
    },
    /// A function returning boolean, e.g. `ST_Intersects(..)`.
    Function(Expr),
    /// Whether the relationship has at least one target row.
    Exists {
        subject: RelationshipRef,
        negated: bool,
    },
    /// `key IN (SELECT key FROM <base> WHERE column IN (values) GROUP BY key
    /// HAVING COUNT(DISTINCT column) = len(values))`.
    ContainsAll {
        key: ColumnRef,
        base: Box<Statement>,
        column: Expr,
        values: Vec<Expr>,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    Literal(bool),
}

impl Predicate {
    pub fn compare(left: Expr, op: CompareOp, right: Expr) -> Self {
        Predicate::Compare { left, op, right }
    }

    /// Conjunction, collapsing a single child to itself.
    pub fn and(mut children: Vec<Predicate>) -> Self {
        if children.len() == 1 {
            children.remove(0)
        } else {
            Predicate::And(children)
        }
    }

    /// Disjunction, collapsing a single child to itself.
    pub fn or(mut children: Vec<Predicate>) -> Self {
        if children.len() == 1 {
            children.remove(0)
        } else {
            Predicate::Or(children)
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Predicate) -> Self {
        Predicate::Not(Box::new(inner))
    }
}
