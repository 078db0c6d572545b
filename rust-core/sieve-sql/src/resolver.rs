// SPDX-License-Identifier: PMPL-1.0-or-later
//! Dot-path resolution over the schema graph, synthesizing joins.
//!
//! Every non-leaf segment must be a relationship and becomes an inner join.
//! Joins are keyed by path prefix in an [`AliasCache`], so one compilation
//! never joins the same prefix twice. A join is aliased when its table is
//! already among the statement's sources or the relationship points back at
//! its own table.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use sieve_core::suggest::suggest_fields;
use sieve_core::{QueryError, ResolutionContext, Value};

use crate::hooks::{HookOutcome, HookResult, ResolutionHook, SqlResolutionContext};
use crate::schema::{Attribute, Entity, Schema};
use crate::statement::{ColumnRef, FieldRef, Join, JoinKind, RelationshipRef, Source, Statement};

/// An entity bound to the source its columns are read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub entity: String,
    /// Table name or alias.
    pub source: String,
}

impl Binding {
    pub fn new(entity: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            source: source.into(),
        }
    }
}

/// Path prefix to binding, scoped to one compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasCache {
    bindings: HashMap<String, Binding>,
}

impl AliasCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&Binding> {
        self.bindings.get(path)
    }

    pub fn insert(&mut self, path: impl Into<String>, binding: Binding) -> Option<Binding> {
        self.bindings.insert(path.into(), binding)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// One field path to resolve.
#[derive(Debug, Clone, Copy)]
pub struct FieldRequest<'a> {
    pub path: &'a str,
    pub value: Option<&'a Value>,
    pub value_type: Option<&'a str>,
    /// Whether a relationship is acceptable as the final segment.
    pub allow_relationship: bool,
}

impl<'a> FieldRequest<'a> {
    /// A path used for ordering: no value, columns only.
    pub fn path(path: &'a str) -> Self {
        Self {
            path,
            value: None,
            value_type: None,
            allow_relationship: false,
        }
    }
}

pub struct JoinSynthesizer<'a> {
    schema: &'a Schema,
    hooks: &'a [Arc<dyn ResolutionHook>],
    alias_prefix: Option<&'a str>,
}

impl<'a> JoinSynthesizer<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            hooks: &[],
            alias_prefix: None,
        }
    }

    pub fn with_hooks(mut self, hooks: &'a [Arc<dyn ResolutionHook>]) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_alias_prefix(mut self, prefix: Option<&'a str>) -> Self {
        self.alias_prefix = prefix;
        self
    }

    /// Resolve `request.path` from `root`, adding joins to `statement`.
    pub async fn resolve(
        &self,
        request: &FieldRequest<'_>,
        root: &Entity,
        statement: &mut Statement,
        cache: &mut AliasCache,
    ) -> Result<FieldRef, QueryError> {
        let mut ctx = ResolutionContext::from_field(
            request.path,
            request.value.cloned(),
            request.value_type.map(str::to_string),
        );
        let mut current = Binding::new(&root.name, statement.root_source(root));

        for index in 0..ctx.parts.len() {
            ctx.at(index);
            let is_last = ctx.is_last_part();

            if let Some(result) = self.run_hooks(&ctx, root, &current, statement, cache).await? {
                if result.is_empty() {
                    warn!(
                        path = %ctx.field_path,
                        segment = ctx.current_part(),
                        "resolution hook claimed a segment without a field, node or statement"
                    );
                }
                if let Some(replacement) = result.statement {
                    *statement = replacement;
                }
                match (result.field, result.node) {
                    (Some(field), _) if is_last => return Ok(field),
                    (Some(field), None) => return Ok(field),
                    (_, Some(node)) => {
                        cache.insert(ctx.path_so_far(), node.clone());
                        current = node;
                        continue;
                    }
                    (None, None) => {}
                }
            }

            let entity = self.schema.lookup(&current.entity)?;
            if is_last {
                return self.leaf(entity, &current, &ctx, request.allow_relationship);
            }
            current = self.traverse(entity, &current, &ctx, statement, cache)?;
        }

        Err(QueryError::FieldNotFound {
            field: request.path.to_string(),
            model: root.name.clone(),
            full_path: request.path.to_string(),
            available: root.attribute_names(),
            suggestions: Vec::new(),
        })
    }

    /// The first hook that handles the segment, if any.
    async fn run_hooks(
        &self,
        base: &ResolutionContext,
        root: &Entity,
        current: &Binding,
        statement: &Statement,
        cache: &AliasCache,
    ) -> Result<Option<HookResult>, QueryError> {
        if self.hooks.is_empty() {
            return Ok(None);
        }
        let ctx = SqlResolutionContext {
            base,
            schema: self.schema,
            root,
            current,
            statement,
            alias_cache: cache,
        };
        for (position, hook) in self.hooks.iter().enumerate() {
            if let HookOutcome::Handled(result) = hook.resolve(&ctx).await? {
                trace!(
                    hook = position,
                    path = %base.field_path,
                    segment = base.current_part(),
                    "resolution hook claimed segment"
                );
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    fn leaf(
        &self,
        entity: &Entity,
        current: &Binding,
        ctx: &ResolutionContext,
        allow_relationship: bool,
    ) -> Result<FieldRef, QueryError> {
        let part = ctx.current_part();
        match entity.attribute(part) {
            Attribute::Column(column) => Ok(FieldRef::Column(
                ColumnRef::new(&current.source, &column.name).typed(column.column_type),
            )),
            Attribute::Relationship(relationship) if allow_relationship => {
                let target = self.schema.lookup(&relationship.target)?;
                Ok(FieldRef::Relationship(RelationshipRef {
                    source: current.source.clone(),
                    relationship: relationship.clone(),
                    target_table: target.table.clone(),
                }))
            }
            Attribute::Relationship(_) | Attribute::Computed => Err(QueryError::FieldNotQueryable {
                field: part.to_string(),
                model: entity.name.clone(),
                full_path: ctx.field_path.clone(),
                available: entity.column_names(),
            }),
            Attribute::Missing => Err(field_not_found(entity, ctx)),
        }
    }

    /// Join through the relationship named by the current segment.
    fn traverse(
        &self,
        entity: &Entity,
        current: &Binding,
        ctx: &ResolutionContext,
        statement: &mut Statement,
        cache: &mut AliasCache,
    ) -> Result<Binding, QueryError> {
        let path = ctx.path_so_far();
        if let Some(binding) = cache.get(&path) {
            trace!(path = %path, source = %binding.source, "reusing join");
            return Ok(binding.clone());
        }

        let relationship = match entity.attribute(ctx.current_part()) {
            Attribute::Relationship(relationship) => relationship,
            _ => return Err(not_traversable(entity, ctx)),
        };
        let target = self.schema.lookup(&relationship.target)?;

        let self_referential = target.table == entity.table;
        let source = if self_referential || statement.tables().contains(target.table.as_str()) {
            Source::aliased(target, self.unique_alias(target, statement))
        } else {
            Source::table(target)
        };
        let binding = Binding::new(&target.name, source.name());

        trace!(
            path = %path,
            table = %target.table,
            source = %binding.source,
            "synthesized join"
        );
        statement.joins.push(Join {
            kind: JoinKind::Inner,
            left: ColumnRef::new(&current.source, &relationship.local_key),
            right: ColumnRef::new(&binding.source, &relationship.remote_key),
            source,
        });
        cache.insert(path, binding.clone());
        Ok(binding)
    }

    /// `<stem>_<n>` with the smallest `n` not already naming a source.
    fn unique_alias(&self, target: &Entity, statement: &Statement) -> String {
        let stem = self.alias_prefix.unwrap_or(&target.table);
        let taken = statement.source_names();
        (1..)
            .map(|n| format!("{stem}_{n}"))
            .find(|alias| !taken.contains(alias.as_str()))
            .unwrap_or_else(|| stem.to_string())
    }
}

fn field_not_found(entity: &Entity, ctx: &ResolutionContext) -> QueryError {
    let part = ctx.current_part();
    let available = entity.attribute_names();
    let suggestions = suggest_fields(part, available.iter().map(String::as_str));
    QueryError::FieldNotFound {
        field: part.to_string(),
        model: entity.name.clone(),
        full_path: ctx.field_path.clone(),
        available,
        suggestions,
    }
}

/// A non-final segment that is not a relationship, missing ones included.
fn not_traversable(entity: &Entity, ctx: &ResolutionContext) -> QueryError {
    let part = ctx.current_part();
    let available = entity.relationship_names();
    let suggestions = suggest_fields(part, available.iter().map(String::as_str));
    QueryError::RelationshipTraversal {
        field: part.to_string(),
        model: entity.name.clone(),
        full_path: ctx.field_path.clone(),
        available,
        suggestions,
    }
}
