// SPDX-License-Identifier: PMPL-1.0-or-later
//! Compiling queries against a small publishing schema

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use sieve_core::{GroupOperator, Query, QueryBuilder, QueryError, Value};
use sieve_sql::{
    Binding, ColumnRef, ColumnType, Entity, Executor, Expr, FieldRef, FnHook, HookOutcome,
    HookResult, Join, JoinKind, PlaceholderStyle, PlanContext, Predicate, Relationship,
    ResolutionHook, Schema, Source, SqlBackend, SqlConfig, SqlOperator, SqlResolutionContext,
    Statement,
};

fn schema() -> Schema {
    Schema::new()
        .with(
            Entity::new("Article", "articles")
                .column("id", ColumnType::Integer)
                .column("title", ColumnType::Text)
                .column("status", ColumnType::Text)
                .column("views", ColumnType::Integer)
                .column("published", ColumnType::Date)
                .column("metadata", ColumnType::Json)
                .column("author_id", ColumnType::Integer)
                .column("category_id", ColumnType::Integer)
                .column("parent_id", ColumnType::Integer)
                .relationship(Relationship::to_one("author", "User", "author_id", "id"))
                .relationship(Relationship::to_one("category", "Category", "category_id", "id"))
                .relationship(Relationship::to_one("parent", "Article", "parent_id", "id"))
                .relationship(Relationship::to_many("tags", "Tag", "id", "article_id"))
                .computed("word_count"),
        )
        .with(
            Entity::new("User", "users")
                .column("id", ColumnType::Integer)
                .column("name", ColumnType::Text)
                .column("email", ColumnType::Text)
                .column("manager_id", ColumnType::Integer)
                .relationship(Relationship::to_one("manager", "User", "manager_id", "id")),
        )
        .with(
            Entity::new("Category", "categories")
                .column("id", ColumnType::Integer)
                .column("name", ColumnType::Text),
        )
        .with(
            Entity::new("Tag", "tags")
                .column("id", ColumnType::Integer)
                .column("article_id", ColumnType::Integer)
                .column("name", ColumnType::Text),
        )
}

fn backend() -> SqlBackend {
    SqlBackend::new(schema())
}

async fn sql(backend: &SqlBackend, query: &Query) -> (String, Vec<Value>) {
    let statement = backend.compile(Some(query), "Article").await.unwrap();
    let rendered = backend.render(&statement);
    (rendered.sql, rendered.params)
}

#[tokio::test]
async fn test_plain_columns_need_no_join() {
    let query = QueryBuilder::new()
        .add_condition("status", "=", "published")
        .add_condition("views", ">=", "100")
        .build();
    let (sql, params) = sql(&backend(), &query).await;

    assert_eq!(
        sql,
        "SELECT \"articles\".* FROM \"articles\" \
         WHERE (\"articles\".\"status\" = $1 AND \"articles\".\"views\" >= $2)"
    );
    assert_eq!(params, vec![Value::from("published"), Value::Int(100)]);
}

#[tokio::test]
async fn test_repeated_prefix_reuses_join() {
    let query = QueryBuilder::new()
        .add_condition("author.name", "=", "Ada")
        .add_group(GroupOperator::Or)
        .add_condition("author.email", "endswith", "@example.org")
        .add_condition("author.name", "=", "Grace")
        .build();
    let (sql, _) = sql(&backend(), &query).await;

    assert_eq!(sql.matches(" JOIN ").count(), 1);
    assert!(sql.contains("JOIN \"users\" ON \"articles\".\"author_id\" = \"users\".\"id\""));
    assert!(sql.contains("\"users\".\"email\" LIKE $2"));
}

#[tokio::test]
async fn test_self_reference_is_aliased_on_first_use() {
    let query = QueryBuilder::new()
        .add_condition("parent.title", "icontains", "intro")
        .build();
    let (sql, params) = sql(&backend(), &query).await;

    assert_eq!(
        sql,
        "SELECT \"articles\".* FROM \"articles\" \
         JOIN \"articles\" AS \"articles_1\" ON \"articles\".\"parent_id\" = \"articles_1\".\"id\" \
         WHERE \"articles_1\".\"title\" ILIKE $1"
    );
    assert_eq!(params, vec![Value::from("%intro%")]);
}

#[tokio::test]
async fn test_chained_self_reference_gets_distinct_aliases() {
    let query = QueryBuilder::new()
        .add_condition("author.manager.manager.name", "=", "Root")
        .build();
    let statement = backend().compile(Some(&query), "Article").await.unwrap();

    let aliases: Vec<&str> = statement.joins.iter().map(|j| j.source.name()).collect();
    assert_eq!(aliases, vec!["users", "users_1", "users_2"]);
    assert_eq!(statement.joins[2].left, ColumnRef::new("users_1", "manager_id"));
}

#[tokio::test]
async fn test_table_already_in_base_statement_is_aliased() {
    let schema = schema();
    let category = schema.lookup("Category").unwrap().clone();
    let base = Statement::select(schema.lookup("Article").unwrap()).join(Join {
        kind: JoinKind::Left,
        source: Source::table(&category),
        left: ColumnRef::new("articles", "category_id"),
        right: ColumnRef::new("categories", "id"),
    });

    let backend = SqlBackend::new(schema);
    let query = QueryBuilder::new().add_condition("category.name", "=", "News").build();
    let statement = backend.apply(Some(&query), base, "Article").await.unwrap();

    assert_eq!(statement.joins.len(), 2);
    assert_eq!(statement.joins[1].source.alias.as_deref(), Some("categories_1"));
    assert!(backend
        .render(&statement)
        .sql
        .ends_with("WHERE \"categories_1\".\"name\" = $1"));
}

#[tokio::test]
async fn test_ordering_reuses_filter_join_and_paginates() {
    let query = QueryBuilder::new()
        .add_condition("category.name", "in", vec!["News", "Sport"])
        .order_by(["-category.name", "id"])
        .limit(20)
        .offset(40)
        .build();
    let (sql, params) = sql(&backend(), &query).await;

    assert_eq!(sql.matches(" JOIN ").count(), 1);
    assert!(sql.ends_with(
        "ORDER BY \"categories\".\"name\" DESC NULLS LAST, \"articles\".\"id\" ASC NULLS LAST \
         LIMIT 20 OFFSET 40"
    ));
    assert_eq!(params.len(), 2);
}

#[tokio::test]
async fn test_ordering_applies_without_groups() {
    let query = QueryBuilder::new().order_by(["-author.name"]).limit(5).build();
    let (sql, params) = sql(&backend(), &query).await;

    assert_eq!(
        sql,
        "SELECT \"articles\".* FROM \"articles\" \
         JOIN \"users\" ON \"articles\".\"author_id\" = \"users\".\"id\" \
         ORDER BY \"users\".\"name\" DESC NULLS LAST LIMIT 5"
    );
    assert!(params.is_empty());
}

#[tokio::test]
async fn test_collection_relationship_emptiness() {
    let query = QueryBuilder::new()
        .add_condition("tags", "is_empty", Value::Null)
        .build();
    let (sql, params) = sql(&backend(), &query).await;

    assert!(sql.ends_with(
        "WHERE NOT EXISTS (SELECT 1 FROM \"tags\" AS \"tags_1\" \
         WHERE \"tags_1\".\"article_id\" = \"articles\".\"id\")"
    ));
    assert!(params.is_empty());
}

#[tokio::test]
async fn test_exists_subselect_avoids_outer_aliases() {
    let backend = SqlBackend::new(
        Schema::new().with(
            Entity::new("Employee", "employees")
                .column("id", ColumnType::Integer)
                .column("manager_id", ColumnType::Integer)
                .relationship(Relationship::to_one("manager", "Employee", "manager_id", "id"))
                .relationship(Relationship::to_many("reports", "Employee", "id", "manager_id")),
        ),
    );
    let query = QueryBuilder::new()
        .add_condition("manager.reports", "is_empty", Value::Null)
        .add_condition("reports", "is_not_empty", Value::Null)
        .build();
    let statement = backend.compile(Some(&query), "Employee").await.unwrap();

    assert_eq!(
        backend.render(&statement).sql,
        "SELECT \"employees\".* FROM \"employees\" \
         JOIN \"employees\" AS \"employees_1\" ON \"employees\".\"manager_id\" = \"employees_1\".\"id\" \
         WHERE (NOT EXISTS (SELECT 1 FROM \"employees\" AS \"employees_2\" \
         WHERE \"employees_2\".\"manager_id\" = \"employees_1\".\"id\") \
         AND EXISTS (SELECT 1 FROM \"employees\" AS \"employees_2\" \
         WHERE \"employees_2\".\"manager_id\" = \"employees\".\"id\"))"
    );
}

#[tokio::test]
async fn test_all_compiles_to_grouped_subselect() {
    let query = QueryBuilder::new()
        .add_condition("tags.name", "all", vec!["rust", "sql", "rust"])
        .build();
    let (sql, params) = sql(&backend(), &query).await;

    assert!(sql.contains(
        "WHERE \"articles\".\"id\" IN (SELECT \"articles\".\"id\" FROM \"articles\" \
         JOIN \"tags\" ON \"articles\".\"id\" = \"tags\".\"article_id\" \
         WHERE \"tags\".\"name\" IN ($1, $2) GROUP BY \"articles\".\"id\" \
         HAVING COUNT(DISTINCT \"tags\".\"name\") = 2)"
    ));
    assert_eq!(params, vec![Value::from("rust"), Value::from("sql")]);
}

#[tokio::test]
async fn test_column_type_casts_untyped_values() {
    let query = QueryBuilder::new()
        .add_condition("published", "between", "2024-01-01, 2024-12-31")
        .add_typed_condition("title", "=", "2024-01-01", "string")
        .build();
    let (_, params) = sql(&backend(), &query).await;

    assert!(matches!(params[0], Value::Date(_)));
    assert!(matches!(params[1], Value::Date(_)));
    assert_eq!(params[2], Value::from("2024-01-01"));
}

#[tokio::test]
async fn test_jsonb_and_question_placeholders() {
    let backend = backend().with_config(SqlConfig {
        placeholder: PlaceholderStyle::Question,
        ..SqlConfig::default()
    });
    let query = QueryBuilder::new()
        .add_condition("metadata", "jsonb_contains", json!({"featured": true}))
        .add_condition("metadata", "jsonb_has_key", "seo")
        .build();
    let (sql, params) = sql(&backend, &query).await;

    assert!(sql.contains("\"articles\".\"metadata\" @> CAST(? AS jsonb)"));
    assert!(sql.contains("jsonb_exists(\"articles\".\"metadata\", ?)"));
    assert_eq!(params, vec![Value::from("{\"featured\":true}"), Value::from("seo")]);
}

#[tokio::test]
async fn test_resolution_errors() {
    let backend = backend();

    let query = QueryBuilder::new().add_condition("titel", "=", "x").build();
    match backend.compile(Some(&query), "Article").await.unwrap_err() {
        QueryError::FieldNotFound { field, model, suggestions, .. } => {
            assert_eq!(field, "titel");
            assert_eq!(model, "Article");
            assert_eq!(suggestions[0], "title");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let query = QueryBuilder::new().add_condition("author.nmae", "=", "x").build();
    match backend.compile(Some(&query), "Article").await.unwrap_err() {
        QueryError::FieldNotFound { model, full_path, .. } => {
            assert_eq!(model, "User");
            assert_eq!(full_path, "author.nmae");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    for field in ["author", "word_count"] {
        let query = QueryBuilder::new().add_condition(field, "=", 1).build();
        assert!(matches!(
            backend.compile(Some(&query), "Article").await,
            Err(QueryError::FieldNotQueryable { .. })
        ));
    }

    let query = QueryBuilder::new().add_condition("title.length", ">", 3).build();
    assert!(matches!(
        backend.compile(Some(&query), "Article").await,
        Err(QueryError::RelationshipTraversal { .. })
    ));

    let query = QueryBuilder::new().add_condition("autor.name", "=", "x").build();
    match backend.compile(Some(&query), "Article").await.unwrap_err() {
        QueryError::RelationshipTraversal { field, suggestions, .. } => {
            assert_eq!(field, "autor");
            assert_eq!(suggestions[0], "author");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_query_level_errors() {
    let backend = backend();
    assert!(matches!(
        backend.compile(None, "Article").await,
        Err(QueryError::NullQuery)
    ));
    assert!(matches!(
        backend.compile(Some(&Query::new()), "Comment").await,
        Err(QueryError::UnknownEntity(_))
    ));

    let query = QueryBuilder::new().add_condition("views", "betwen", vec![1, 2]).build();
    match backend.compile(Some(&query), "Article").await.unwrap_err() {
        QueryError::OperatorNotFound { suggestions, .. } => {
            assert!(suggestions.contains(&"between".to_string()))
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let query = QueryBuilder::new().add_condition("views", "between", vec![1]).build();
    assert!(matches!(
        backend.compile(Some(&query), "Article").await,
        Err(QueryError::InvalidArgument { .. })
    ));
}

#[tokio::test]
async fn test_depth_limit_from_config() {
    let backend = backend().with_config(SqlConfig {
        max_depth: 1,
        ..SqlConfig::default()
    });
    let query = QueryBuilder::new()
        .add_group(GroupOperator::And)
        .add_nested_group(GroupOperator::Or)
        .add_nested_group(GroupOperator::Not)
        .add_condition("status", "=", "draft")
        .build();
    assert!(matches!(
        backend.compile(Some(&query), "Article").await,
        Err(QueryError::Validation { .. })
    ));
}

#[tokio::test]
async fn test_terminal_hook_supplies_expression() {
    let backend = backend().with_hook(FnHook::new(|ctx| {
        if ctx.current_part() != "search" {
            return Ok(HookOutcome::Skip);
        }
        let title = ctx.column("title")?;
        Ok(HookOutcome::Handled(HookResult::field(FieldRef::Expr(Expr::call(
            "lower",
            vec![Expr::Column(title)],
        )))))
    }));
    let query = QueryBuilder::new().add_condition("search", "=", "rust").build();
    let (sql, _) = sql(&backend, &query).await;
    assert!(sql.ends_with("WHERE lower(\"articles\".\"title\") = $1"));
}

/// Exposes `writer` as a left-joined alias of the article's author.
fn writer_hook(ctx: &SqlResolutionContext<'_>) -> Result<HookOutcome, QueryError> {
    if ctx.current_part() != "writer" || ctx.is_last_part() {
        return Ok(HookOutcome::Skip);
    }
    if let Some(binding) = ctx.alias_cache.get("writer") {
        return Ok(HookOutcome::Handled(HookResult::node(binding.clone())));
    }
    let users = ctx.schema.lookup("User")?;
    let statement = ctx.statement.clone().join(Join {
        kind: JoinKind::Left,
        source: Source::aliased(users, "w"),
        left: ColumnRef::new(&ctx.current.source, "author_id"),
        right: ColumnRef::new("w", "id"),
    });
    Ok(HookOutcome::Handled(
        HookResult::node(Binding::new("User", "w")).with_statement(statement),
    ))
}

#[tokio::test]
async fn test_node_hook_redirects_traversal() {
    let backend = backend().with_hook(FnHook::new(writer_hook));
    let query = QueryBuilder::new()
        .add_condition("writer.name", "=", "Ada")
        .add_condition("writer.email", "is_not_null", Value::Null)
        .build();
    let (sql, _) = sql(&backend, &query).await;

    assert_eq!(
        sql,
        "SELECT \"articles\".* FROM \"articles\" \
         LEFT OUTER JOIN \"users\" AS \"w\" ON \"articles\".\"author_id\" = \"w\".\"id\" \
         WHERE (\"w\".\"name\" = $1 AND \"w\".\"email\" IS NOT NULL)"
    );
}

#[tokio::test]
async fn test_first_handling_hook_wins() {
    let labelled = |label: &'static str| {
        FnHook::new(move |ctx| {
            Ok(if ctx.current_part() == "title" {
                HookOutcome::Handled(HookResult::field(FieldRef::Expr(Expr::raw(label))))
            } else {
                HookOutcome::Skip
            })
        })
    };
    let backend = backend()
        .with_hook(FnHook::new(|_| Ok(HookOutcome::Skip)))
        .with_hook(labelled("first"))
        .with_hook(labelled("second"));

    let query = QueryBuilder::new().add_condition("title", "=", "x").build();
    let (sql, _) = sql(&backend, &query).await;
    assert!(sql.ends_with("WHERE first = $1"));
}

#[tokio::test]
async fn test_empty_handled_result_falls_back_to_default() {
    let backend = backend().with_hook(FnHook::new(|_| {
        Ok(HookOutcome::Handled(HookResult::default()))
    }));
    let query = QueryBuilder::new().add_condition("author.name", "=", "Ada").build();
    let (sql, _) = sql(&backend, &query).await;
    assert!(sql.ends_with("WHERE \"users\".\"name\" = $1"));
}

/// Maps a renamed attribute onto its current column after a lookup.
struct Renamed {
    from: &'static str,
    to: &'static str,
}

#[async_trait]
impl ResolutionHook for Renamed {
    async fn resolve(&self, ctx: &SqlResolutionContext<'_>) -> Result<HookOutcome, QueryError> {
        tokio::task::yield_now().await;
        if ctx.is_last_part() && ctx.current_part() == self.from {
            let column = ctx.column(self.to)?;
            return Ok(HookOutcome::Handled(HookResult::field(FieldRef::Column(column))));
        }
        Ok(HookOutcome::Skip)
    }
}

#[tokio::test]
async fn test_async_hook_applies_on_nested_segment() {
    let backend = backend().with_hook(Renamed { from: "headline", to: "title" });
    let query = QueryBuilder::new()
        .add_condition("parent.headline", "startswith", "Re:")
        .build();
    let (sql, params) = sql(&backend, &query).await;

    assert!(sql.ends_with("WHERE \"articles_1\".\"title\" LIKE $1"));
    assert_eq!(params, vec![Value::from("Re:%")]);
}

/// `column % 2 = 0`.
struct Even;

impl SqlOperator for Even {
    fn name(&self) -> &str {
        "even"
    }

    fn compile(
        &self,
        field: &FieldRef,
        _: Option<&Value>,
        _: Option<&str>,
        _: &PlanContext<'_>,
    ) -> Result<Predicate, QueryError> {
        Ok(Predicate::Binary {
            left: Expr::call("MOD", vec![field.to_expr("even")?, Expr::raw("2")]),
            op: "=".to_string(),
            right: Expr::raw("0"),
        })
    }
}

#[tokio::test]
async fn test_registered_operator_is_accepted() {
    let mut backend = backend();
    backend.registry_mut().register(Even);
    assert!(backend.operators().contains(&"even".to_string()));

    let query = QueryBuilder::new().add_condition("views", "even", true).build();
    let (sql, _) = sql(&backend, &query).await;
    assert!(sql.ends_with("WHERE MOD(\"articles\".\"views\", 2) = 0"));
}

struct Recorder {
    statements: Mutex<Vec<Statement>>,
}

#[async_trait]
impl Executor for Recorder {
    type Row = serde_json::Value;

    async fn fetch_all(&self, statement: &Statement) -> Result<Vec<Self::Row>, QueryError> {
        self.statements
            .lock()
            .map_err(|e| QueryError::Execution(e.to_string()))?
            .push(statement.clone());
        Ok(vec![json!({"id": 7})])
    }
}

#[tokio::test]
async fn test_search_runs_compiled_statement() {
    let backend = backend();
    let recorder = Recorder { statements: Mutex::new(Vec::new()) };
    let user_filter = QueryBuilder::new().add_condition("title", "contains", "rust").build();
    let authz = QueryBuilder::new().add_condition("status", "=", "published").build();
    let query = user_filter.merge(&authz);

    let rows = backend
        .search(Some(&query), &recorder, "Article", None)
        .await
        .unwrap();
    assert_eq!(rows, vec![json!({"id": 7})]);

    let statements = recorder.statements.lock().unwrap();
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0].filters.len(), 2);
    assert_eq!(
        backend.render(&statements[0]).sql,
        "SELECT \"articles\".* FROM \"articles\" \
         WHERE \"articles\".\"title\" LIKE $1 AND \"articles\".\"status\" = $2"
    );
}
