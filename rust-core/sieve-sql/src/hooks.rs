// SPDX-License-Identifier: PMPL-1.0-or-later
//! Resolution hooks: caller code that can take over field path resolution
//! one segment at a time.
//!
//! Hooks run in registration order before the default handling of every
//! segment. The first hook that returns [`HookOutcome::Handled`] wins.

use async_trait::async_trait;

use sieve_core::{QueryError, ResolutionContext};

use crate::resolver::{AliasCache, Binding};
use crate::schema::{Entity, Schema};
use crate::statement::{ColumnRef, FieldRef, Statement};

/// What a hook sees for one path segment.
#[derive(Debug, Clone, Copy)]
pub struct SqlResolutionContext<'a> {
    /// Path, segment index, condition value and type hint.
    pub base: &'a ResolutionContext,
    pub schema: &'a Schema,
    /// Entity the query selects.
    pub root: &'a Entity,
    /// Entity and source the current segment is looked up on.
    pub current: &'a Binding,
    /// Working statement, including joins made for earlier segments.
    pub statement: &'a Statement,
    pub alias_cache: &'a AliasCache,
}

impl SqlResolutionContext<'_> {
    pub fn current_part(&self) -> &str {
        self.base.current_part()
    }

    pub fn remaining_parts(&self) -> &[String] {
        self.base.remaining_parts()
    }

    pub fn is_last_part(&self) -> bool {
        self.base.is_last_part()
    }

    pub fn current_entity(&self) -> Result<&Entity, QueryError> {
        self.schema.lookup(&self.current.entity)
    }

    /// A column of the current entity, qualified by the current source.
    pub fn column(&self, name: &str) -> Result<ColumnRef, QueryError> {
        let entity = self.current_entity()?;
        let column = entity.get_column(name).ok_or_else(|| QueryError::FieldNotFound {
            field: name.to_string(),
            model: entity.name.clone(),
            full_path: self.base.field_path.clone(),
            available: entity.column_names(),
            suggestions: Vec::new(),
        })?;
        Ok(ColumnRef::new(&self.current.source, &column.name).typed(column.column_type))
    }
}

/// A claimed segment.
///
/// With `field`, resolution ends there unless `node` is also set and
/// segments remain. With only `node`, traversal continues from it. With
/// neither, default handling runs against `statement`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookResult {
    pub field: Option<FieldRef>,
    /// Replaces the working statement, e.g. with extra joins.
    pub statement: Option<Statement>,
    pub node: Option<Binding>,
}

impl HookResult {
    pub fn field(field: FieldRef) -> Self {
        Self {
            field: Some(field),
            ..Self::default()
        }
    }

    pub fn node(node: Binding) -> Self {
        Self {
            node: Some(node),
            ..Self::default()
        }
    }

    pub fn with_statement(mut self, statement: Statement) -> Self {
        self.statement = Some(statement);
        self
    }

    /// Whether the result changes anything at all.
    pub fn is_empty(&self) -> bool {
        self.field.is_none() && self.statement.is_none() && self.node.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HookOutcome {
    /// Let the next hook, or default handling, take the segment.
    Skip,
    Handled(HookResult),
}

#[async_trait]
pub trait ResolutionHook: Send + Sync {
    async fn resolve(&self, ctx: &SqlResolutionContext<'_>) -> Result<HookOutcome, QueryError>;
}

/// Adapts a synchronous closure into a [`ResolutionHook`].
pub struct FnHook<F>(pub F);

impl<F> FnHook<F>
where
    F: Fn(&SqlResolutionContext<'_>) -> Result<HookOutcome, QueryError> + Send + Sync,
{
    pub fn new(resolve: F) -> Self {
        Self(resolve)
    }
}

#[async_trait]
impl<F> ResolutionHook for FnHook<F>
where
    F: Fn(&SqlResolutionContext<'_>) -> Result<HookOutcome, QueryError> + Send + Sync,
{
    async fn resolve(&self, ctx: &SqlResolutionContext<'_>) -> Result<HookOutcome, QueryError> {
        (self.0)(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;

    fn fixture() -> (Schema, Entity, Statement, Binding, AliasCache, ResolutionContext) {
        let root = Entity::new("Order", "orders").column("total", ColumnType::Float);
        let schema = Schema::new().with(root.clone());
        let statement = Statement::select(&root);
        let binding = Binding::new("Order", "orders");
        let base = ResolutionContext::from_field("total", None, None);
        (schema, root, statement, binding, AliasCache::new(), base)
    }

    #[tokio::test]
    async fn test_fn_hook_sees_context() {
        let (schema, root, statement, binding, cache, base) = fixture();
        let ctx = SqlResolutionContext {
            base: &base,
            schema: &schema,
            root: &root,
            current: &binding,
            statement: &statement,
            alias_cache: &cache,
        };

        let hook = FnHook::new(|ctx| {
            if ctx.current_part() == "total" && ctx.is_last_part() {
                Ok(HookOutcome::Handled(HookResult::field(FieldRef::Column(ctx.column("total")?))))
            } else {
                Ok(HookOutcome::Skip)
            }
        });

        match hook.resolve(&ctx).await.unwrap() {
            HookOutcome::Handled(result) => assert_eq!(
                result.field,
                Some(FieldRef::Column(
                    ColumnRef::new("orders", "total").typed(ColumnType::Float)
                ))
            ),
            HookOutcome::Skip => panic!("hook should claim the segment"),
        }
    }

    #[test]
    fn test_context_column_lookup_fails_for_unknown() {
        let (schema, root, statement, binding, cache, base) = fixture();
        let ctx = SqlResolutionContext {
            base: &base,
            schema: &schema,
            root: &root,
            current: &binding,
            statement: &statement,
            alias_cache: &cache,
        };
        assert!(matches!(ctx.column("missing"), Err(QueryError::FieldNotFound { .. })));
        assert!(HookResult::default().is_empty());
    }
}
