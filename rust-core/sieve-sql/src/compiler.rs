// SPDX-License-Identifier: PMPL-1.0-or-later
//! Compiles a condition tree onto a base [`Statement`].
//!
//! Each top-level group becomes one `WHERE` conjunct. Conditions resolve
//! their field through the [`JoinSynthesizer`] and are compiled by the
//! registered operator. Ordering paths share the filters' alias cache, so
//! they reuse the joins the filters made.

use std::fmt;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tracing::debug;

use sieve_core::{Condition, Group, GroupOperator, Node, Query, QueryError, Validator};

use crate::config::SqlConfig;
use crate::hooks::ResolutionHook;
use crate::operator::{PlanContext, SqlOperator};
use crate::predicate::Predicate;
use crate::registry::SqlOperatorRegistry;
use crate::render::RenderedSql;
use crate::resolver::{AliasCache, FieldRequest, JoinSynthesizer};
use crate::schema::{Entity, Schema};
use crate::statement::{OrderItem, Statement};

/// Relational backend: schema, operators, hooks and configuration.
#[derive(Clone)]
pub struct SqlBackend {
    schema: Schema,
    registry: SqlOperatorRegistry,
    hooks: Vec<Arc<dyn ResolutionHook>>,
    config: SqlConfig,
}

impl SqlBackend {
    /// Backend over `schema` with every built-in operator.
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            registry: SqlOperatorRegistry::with_defaults(),
            hooks: Vec::new(),
            config: SqlConfig::default(),
        }
    }

    pub fn with_registry(mut self, registry: SqlOperatorRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Append a resolution hook. Hooks run in the order they were added.
    pub fn with_hook<H>(mut self, hook: H) -> Self
    where
        H: ResolutionHook + 'static,
    {
        self.hooks.push(Arc::new(hook));
        self
    }

    pub fn with_config(mut self, config: SqlConfig) -> Self {
        self.config = config;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn registry(&self) -> &SqlOperatorRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SqlOperatorRegistry {
        &mut self.registry
    }

    pub fn config(&self) -> &SqlConfig {
        &self.config
    }

    /// Names of every operator this backend accepts.
    pub fn operators(&self) -> Vec<String> {
        self.registry.names().map(str::to_string).collect()
    }

    /// Render with the configured placeholder style.
    pub fn render(&self, statement: &Statement) -> RenderedSql {
        statement.to_sql(self.config.placeholder)
    }

    /// Apply `query` to `statement`, a plan selecting `entity`.
    ///
    /// A `None` query is rejected. Ordering and pagination are applied even
    /// when the query has no groups.
    pub async fn apply(
        &self,
        query: Option<&Query>,
        statement: Statement,
        entity: &str,
    ) -> Result<Statement, QueryError> {
        let query = Validator::new(self.registry.names())
            .with_max_depth(self.config.max_depth)
            .check(query)?;
        let root = self.schema.lookup(entity)?;
        debug!(
            entity,
            groups = query.groups.len(),
            joins = statement.joins.len(),
            "compiling query"
        );

        let mut compilation = Compilation {
            backend: self,
            root,
            synthesizer: JoinSynthesizer::new(&self.schema)
                .with_hooks(&self.hooks)
                .with_alias_prefix(self.config.alias_prefix.as_deref()),
            statement,
            cache: AliasCache::new(),
        };
        compilation.query(query).await?;
        Ok(compilation.statement)
    }

    /// [`Self::apply`] to a plain `SELECT` of `entity`.
    pub async fn compile(&self, query: Option<&Query>, entity: &str) -> Result<Statement, QueryError> {
        let base = Statement::select(self.schema.lookup(entity)?);
        self.apply(query, base, entity).await
    }
}

impl fmt::Debug for SqlBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlBackend")
            .field("schema", &self.schema)
            .field("registry", &self.registry)
            .field("hooks", &self.hooks.len())
            .field("config", &self.config)
            .finish()
    }
}

/// State of one `apply` call.
struct Compilation<'a> {
    backend: &'a SqlBackend,
    root: &'a Entity,
    synthesizer: JoinSynthesizer<'a>,
    statement: Statement,
    cache: AliasCache,
}

impl Compilation<'_> {
    async fn query(&mut self, query: &Query) -> Result<(), QueryError> {
        for group in &query.groups {
            let predicate = self.group(group).await?;
            self.statement.filters.push(predicate);
        }

        for order in query.order_fields() {
            let field = self
                .synthesizer
                .resolve(
                    &FieldRequest::path(&order.path),
                    self.root,
                    &mut self.statement,
                    &mut self.cache,
                )
                .await?;
            self.statement.order_by.push(OrderItem {
                expr: field.to_expr("order_by")?,
                descending: order.descending,
            });
        }

        if query.limit.is_some() {
            self.statement.limit = query.limit;
        }
        if query.offset.is_some() {
            self.statement.offset = query.offset;
        }
        Ok(())
    }

    fn group<'c>(&'c mut self, group: &'c Group) -> BoxFuture<'c, Result<Predicate, QueryError>> {
        async move {
            let mut children = Vec::with_capacity(group.conditions.len());
            for node in &group.conditions {
                let predicate = match node {
                    Node::Condition(condition) => self.condition(condition).await?,
                    Node::Group(nested) => self.group(nested).await?,
                };
                children.push(predicate);
            }
            Ok(match group.operator {
                GroupOperator::And => Predicate::and(children),
                GroupOperator::Or => Predicate::or(children),
                GroupOperator::Not => Predicate::not(Predicate::and(children)),
            })
        }
        .boxed()
    }

    async fn condition(&mut self, condition: &Condition) -> Result<Predicate, QueryError> {
        let backend = self.backend;
        let operator: &dyn SqlOperator = backend.registry.lookup(&condition.operator)?.as_ref();
        let request = FieldRequest {
            path: &condition.field,
            value: condition.value.as_ref(),
            value_type: condition.value_type.as_deref(),
            allow_relationship: operator.supports_relationship(),
        };
        let field = self
            .synthesizer
            .resolve(&request, self.root, &mut self.statement, &mut self.cache)
            .await?;

        let ctx = PlanContext {
            schema: &backend.schema,
            root: self.root,
            statement: &self.statement,
        };
        operator.compile(
            &field,
            condition.value.as_ref(),
            condition.value_type.as_deref(),
            &ctx,
        )
    }
}
