// SPDX-License-Identifier: PMPL-1.0-or-later
//! The query plan a compilation produces: a single-entity `SELECT` with
//! joins, filters, ordering and bounds.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use sieve_core::QueryError;

use crate::predicate::{Expr, Predicate};
use crate::render::{PlaceholderStyle, RenderedSql, Renderer};
use crate::schema::{ColumnType, Entity, Relationship};

/// A table in FROM or JOIN, optionally under an alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub entity: String,
    pub table: String,
    pub alias: Option<String>,
}

impl Source {
    pub fn table(entity: &Entity) -> Self {
        Self {
            entity: entity.name.clone(),
            table: entity.table.clone(),
            alias: None,
        }
    }

    pub fn aliased(entity: &Entity, alias: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
            ..Self::table(entity)
        }
    }

    /// Name columns of this source are qualified with.
    pub fn name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    Inner,
    Left,
}

/// `JOIN source ON left = right`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub kind: JoinKind,
    pub source: Source,
    pub left: ColumnRef,
    pub right: ColumnRef,
}

/// A column qualified by the source it is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
    pub source: String,
    pub column: String,
    pub column_type: Option<ColumnType>,
}

impl ColumnRef {
    pub fn new(source: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            column: column.into(),
            column_type: None,
        }
    }

    pub fn typed(mut self, column_type: ColumnType) -> Self {
        self.column_type = Some(column_type);
        self
    }
}

/// A relationship used as a condition target, e.g. `tags is_empty`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipRef {
    /// Source the owning entity is bound to.
    pub source: String,
    pub relationship: Relationship,
    pub target_table: String,
}

/// What a field path resolved to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldRef {
    Column(ColumnRef),
    Relationship(RelationshipRef),
    /// Arbitrary expression supplied by a resolution hook.
    Expr(Expr),
}

impl FieldRef {
    /// The field as a scalar expression. Relationships have none.
    pub fn to_expr(&self, operator: &str) -> Result<Expr, QueryError> {
        match self {
            FieldRef::Column(column) => Ok(Expr::Column(column.clone())),
            FieldRef::Expr(expr) => Ok(expr.clone()),
            FieldRef::Relationship(rel) => Err(QueryError::InvalidArgument {
                operator: operator.to_string(),
                message: format!(
                    "relationship '{}' cannot be compared as a value",
                    rel.relationship.name
                ),
            }),
        }
    }

    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            FieldRef::Column(column) => column.column_type,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub expr: Expr,
    pub descending: bool,
}

/// `SELECT <from>.* FROM <from> <joins> WHERE <filters> ORDER BY .. LIMIT .. OFFSET ..`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub from: Source,
    #[serde(default)]
    pub joins: Vec<Join>,
    /// ANDed together.
    #[serde(default)]
    pub filters: Vec<Predicate>,
    #[serde(default)]
    pub order_by: Vec<OrderItem>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Statement {
    /// `SELECT` of every row of `entity`.
    pub fn select(entity: &Entity) -> Self {
        Self {
            from: Source::table(entity),
            joins: Vec::new(),
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    /// Every underlying table in FROM and JOIN, aliased or not.
    pub fn tables(&self) -> BTreeSet<&str> {
        std::iter::once(&self.from)
            .chain(self.joins.iter().map(|j| &j.source))
            .map(|s| s.table.as_str())
            .collect()
    }

    /// Names sources are referenced by; aliases must not collide with these.
    pub fn source_names(&self) -> BTreeSet<&str> {
        std::iter::once(&self.from)
            .chain(self.joins.iter().map(|j| &j.source))
            .map(Source::name)
            .collect()
    }

    /// The source bound to `entity`'s root: FROM when it selects `entity`.
    pub fn root_source(&self, entity: &Entity) -> String {
        if self.from.entity == entity.name {
            self.from.name().to_string()
        } else {
            entity.table.clone()
        }
    }

    /// Render as parameterised SQL.
    pub fn to_sql(&self, style: PlaceholderStyle) -> RenderedSql {
        let mut renderer = Renderer::new(style);
        renderer.statement(self);
        renderer.finish()
    }
}
