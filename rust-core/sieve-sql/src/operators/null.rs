// SPDX-License-Identifier: PMPL-1.0-or-later
//! Null and emptiness checks, on columns or relationships.
//!
//! On a relationship these test for related rows: a collection through
//! `EXISTS`, a scalar relationship through its foreign key.

use sieve_core::operators as names;
use sieve_core::{QueryError, Value};

use crate::operator::{PlanContext, SqlOperator};
use crate::predicate::{CompareOp, Expr, Predicate};
use crate::statement::{ColumnRef, FieldRef, RelationshipRef};

/// `local_key IS [NOT] NULL` for a scalar relationship.
fn foreign_key_null(rel: &RelationshipRef, negated: bool) -> Predicate {
    Predicate::IsNull {
        expr: Expr::Column(ColumnRef::new(&rel.source, &rel.relationship.local_key)),
        negated,
    }
}

/// `is_null` and `is_not_null`.
pub struct IsNull {
    name: &'static str,
    negated: bool,
}

impl IsNull {
    pub const IS_NULL: IsNull = IsNull { name: names::IS_NULL, negated: false };
    pub const IS_NOT_NULL: IsNull = IsNull { name: names::IS_NOT_NULL, negated: true };
}

impl SqlOperator for IsNull {
    fn name(&self) -> &str {
        self.name
    }

    fn supports_relationship(&self) -> bool {
        true
    }

    fn compile(
        &self,
        field: &FieldRef,
        _: Option<&Value>,
        _: Option<&str>,
        _: &PlanContext<'_>,
    ) -> Result<Predicate, QueryError> {
        Ok(match field {
            FieldRef::Relationship(rel) if rel.relationship.collection => Predicate::Exists {
                subject: rel.clone(),
                negated: !self.negated,
            },
            FieldRef::Relationship(rel) => foreign_key_null(rel, self.negated),
            _ => Predicate::IsNull {
                expr: field.to_expr(self.name)?,
                negated: self.negated,
            },
        })
    }
}

/// `is_empty` and `is_not_empty`. A null column counts as empty.
pub struct IsEmpty {
    name: &'static str,
    negated: bool,
}

impl IsEmpty {
    pub const IS_EMPTY: IsEmpty = IsEmpty { name: names::IS_EMPTY, negated: false };
    pub const IS_NOT_EMPTY: IsEmpty = IsEmpty { name: names::IS_NOT_EMPTY, negated: true };
}

impl SqlOperator for IsEmpty {
    fn name(&self) -> &str {
        self.name
    }

    fn supports_relationship(&self) -> bool {
        true
    }

    fn compile(
        &self,
        field: &FieldRef,
        _: Option<&Value>,
        _: Option<&str>,
        _: &PlanContext<'_>,
    ) -> Result<Predicate, QueryError> {
        if let FieldRef::Relationship(rel) = field {
            return Ok(Predicate::Exists {
                subject: rel.clone(),
                negated: !self.negated,
            });
        }

        let expr = field.to_expr(self.name)?;
        Ok(if self.negated {
            Predicate::And(vec![
                Predicate::IsNull { expr: expr.clone(), negated: true },
                Predicate::compare(expr, CompareOp::NotEq, Expr::param("")),
            ])
        } else {
            Predicate::Or(vec![
                Predicate::IsNull { expr: expr.clone(), negated: false },
                Predicate::compare(expr, CompareOp::Eq, Expr::param("")),
            ])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{render_predicate, PlaceholderStyle};
    use crate::schema::{Entity, Relationship, Schema};
    use crate::statement::Statement;

    fn render(op: &dyn SqlOperator, field: FieldRef) -> String {
        let root = Entity::new("Customer", "customers");
        let schema = Schema::new().with(root.clone());
        let statement = Statement::select(&root);
        let ctx = PlanContext { schema: &schema, root: &root, statement: &statement };
        let predicate = op.compile(&field, None, None, &ctx).unwrap();
        render_predicate(&predicate, PlaceholderStyle::Dollar).sql
    }

    fn orders() -> FieldRef {
        FieldRef::Relationship(RelationshipRef {
            source: "customers".into(),
            relationship: Relationship::to_many("orders", "Order", "id", "customer_id"),
            target_table: "orders".into(),
        })
    }

    fn referrer() -> FieldRef {
        FieldRef::Relationship(RelationshipRef {
            source: "customers".into(),
            relationship: Relationship::to_one("referrer", "Customer", "referrer_id", "id"),
            target_table: "customers".into(),
        })
    }

    #[test]
    fn test_collection_emptiness_uses_exists() {
        assert_eq!(
            render(&IsEmpty::IS_EMPTY, orders()),
            "NOT EXISTS (SELECT 1 FROM \"orders\" AS \"orders_1\" WHERE \"orders_1\".\"customer_id\" = \"customers\".\"id\")"
        );
        assert!(render(&IsNull::IS_NOT_NULL, orders()).starts_with("EXISTS ("));
    }

    #[test]
    fn test_scalar_relationship_null_checks_foreign_key() {
        assert_eq!(
            render(&IsNull::IS_NULL, referrer()),
            "\"customers\".\"referrer_id\" IS NULL"
        );
    }

    #[test]
    fn test_column_emptiness_includes_null() {
        let name = FieldRef::Column(ColumnRef::new("customers", "name"));
        assert_eq!(
            render(&IsEmpty::IS_EMPTY, name.clone()),
            "\"customers\".\"name\" IS NULL OR \"customers\".\"name\" = $1"
        );
        assert_eq!(
            render(&IsEmpty::IS_NOT_EMPTY, name),
            "\"customers\".\"name\" IS NOT NULL AND \"customers\".\"name\" <> $1"
        );
    }
}
