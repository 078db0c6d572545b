// SPDX-License-Identifier: PMPL-1.0-or-later
//! Sieve Core
//!
//! Backend-agnostic search query DSL: a condition tree of nested
//! `and`/`or`/`not` groups over field comparisons, a fluent builder, the
//! JSON wire format, structural validation and value coercion.
//!
//! Backends (`sieve-memory`, `sieve-sql`) supply the operator
//! implementations and decide what a condition means for their data.

pub mod builder;
pub mod coerce;
pub mod error;
pub mod hooks;
pub mod model;
pub mod operators;
pub mod suggest;
pub mod validator;
pub mod value;

pub use builder::QueryBuilder;
pub use coerce::{cast_value, parse_list_value};
pub use error::{OperatorError, QueryError};
pub use hooks::ResolutionContext;
pub use model::{Condition, Group, GroupOperator, Node, OrderField, Query};
pub use validator::{validate_query, Validator};
pub use value::Value;
