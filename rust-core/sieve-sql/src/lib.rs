// SPDX-License-Identifier: PMPL-1.0-or-later
//! Sieve SQL
//!
//! Relational backend for Sieve queries. Field paths are resolved over a
//! [`Schema`] graph by a join synthesizer that reuses joins per path prefix
//! and aliases repeated or self-referential tables. Conditions compile to a
//! [`Predicate`] tree on a [`Statement`], which renders to parameterised SQL
//! and runs through an [`Executor`].
//!
//! Resolution can be taken over per path segment by [`ResolutionHook`]s.

pub mod compiler;
pub mod config;
pub mod executor;
pub mod hooks;
pub mod operator;
pub mod operators;
pub mod predicate;
pub mod registry;
pub mod render;
pub mod resolver;
pub mod schema;
pub mod statement;

pub use compiler::SqlBackend;
pub use config::SqlConfig;
pub use executor::Executor;
pub use hooks::{FnHook, HookOutcome, HookResult, ResolutionHook, SqlResolutionContext};
pub use operator::{PlanContext, SqlOperator};
pub use predicate::{CompareOp, Expr, Predicate};
pub use registry::SqlOperatorRegistry;
pub use render::{quote_ident, render_predicate, PlaceholderStyle, RenderedSql};
pub use resolver::{AliasCache, Binding, FieldRequest, JoinSynthesizer};
pub use schema::{Attribute, Column, ColumnType, Entity, Relationship, Schema};
pub use statement::{
    ColumnRef, FieldRef, Join, JoinKind, OrderItem, RelationshipRef, Source, Statement,
};
