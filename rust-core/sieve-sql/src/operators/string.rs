// SPDX-License-Identifier: PMPL-1.0-or-later
//! Pattern and substring operators.

use sieve_core::operators as names;
use sieve_core::{QueryError, Value};

use crate::operator::{required, PlanContext, SqlOperator};
use crate::predicate::{Expr, Predicate};
use crate::statement::FieldRef;

/// `like`, `not_like`, `ilike` with the caller's own `%`/`_` pattern.
pub struct Like {
    name: &'static str,
    negated: bool,
    case_insensitive: bool,
}

impl Like {
    pub const ALL: [Like; 3] = [
        Like { name: names::LIKE, negated: false, case_insensitive: false },
        Like { name: names::NOT_LIKE, negated: true, case_insensitive: false },
        Like { name: names::ILIKE, negated: false, case_insensitive: true },
    ];
}

impl SqlOperator for Like {
    fn name(&self) -> &str {
        self.name
    }

    fn compile(
        &self,
        field: &FieldRef,
        value: Option<&Value>,
        _: Option<&str>,
        _: &PlanContext<'_>,
    ) -> Result<Predicate, QueryError> {
        let pattern = required(value, self.name)?.to_string();
        Ok(Predicate::Like {
            expr: field.to_expr(self.name)?,
            pattern: Expr::param(pattern),
            negated: self.negated,
            case_insensitive: self.case_insensitive,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Anywhere,
    Start,
    End,
}

/// `contains`, `startswith`, `endswith` and their `i` variants.
///
/// The value is matched literally: LIKE wildcards in it are escaped.
pub struct Substring {
    name: &'static str,
    position: Position,
    case_insensitive: bool,
}

impl Substring {
    pub const ALL: [Substring; 6] = [
        Substring { name: names::CONTAINS, position: Position::Anywhere, case_insensitive: false },
        Substring { name: names::ICONTAINS, position: Position::Anywhere, case_insensitive: true },
        Substring { name: names::STARTSWITH, position: Position::Start, case_insensitive: false },
        Substring { name: names::ISTARTSWITH, position: Position::Start, case_insensitive: true },
        Substring { name: names::ENDSWITH, position: Position::End, case_insensitive: false },
        Substring { name: names::IENDSWITH, position: Position::End, case_insensitive: true },
    ];
}

/// Escape `\`, `%` and `_` for a LIKE pattern using the default `\` escape.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl SqlOperator for Substring {
    fn name(&self) -> &str {
        self.name
    }

    fn compile(
        &self,
        field: &FieldRef,
        value: Option<&Value>,
        _: Option<&str>,
        _: &PlanContext<'_>,
    ) -> Result<Predicate, QueryError> {
        let needle = escape_like(&required(value, self.name)?.to_string());
        let pattern = match self.position {
            Position::Anywhere => format!("%{needle}%"),
            Position::Start => format!("{needle}%"),
            Position::End => format!("%{needle}"),
        };
        Ok(Predicate::Like {
            expr: field.to_expr(self.name)?,
            pattern: Expr::param(pattern),
            negated: false,
            case_insensitive: self.case_insensitive,
        })
    }
}

/// `regex` (`~`) and `iregex` (`~*`).
pub struct Regex {
    name: &'static str,
    case_insensitive: bool,
}

impl Regex {
    pub const CASE_SENSITIVE: Regex = Regex { name: names::REGEX, case_insensitive: false };
    pub const CASE_INSENSITIVE: Regex = Regex { name: names::IREGEX, case_insensitive: true };
}

impl SqlOperator for Regex {
    fn name(&self) -> &str {
        self.name
    }

    fn compile(
        &self,
        field: &FieldRef,
        value: Option<&Value>,
        _: Option<&str>,
        _: &PlanContext<'_>,
    ) -> Result<Predicate, QueryError> {
        let pattern = required(value, self.name)?.to_string();
        Ok(Predicate::Regex {
            expr: field.to_expr(self.name)?,
            pattern: Expr::param(pattern),
            case_insensitive: self.case_insensitive,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{render_predicate, PlaceholderStyle};
    use crate::schema::{Entity, Schema};
    use crate::statement::{ColumnRef, Statement};

    fn render(op: &dyn SqlOperator, value: &str) -> (String, Vec<Value>) {
        let root = Entity::new("User", "users");
        let schema = Schema::new().with(root.clone());
        let statement = Statement::select(&root);
        let ctx = PlanContext { schema: &schema, root: &root, statement: &statement };
        let field = FieldRef::Column(ColumnRef::new("users", "name"));
        let predicate = op.compile(&field, Some(&Value::from(value)), None, &ctx).unwrap();
        let rendered = render_predicate(&predicate, PlaceholderStyle::Dollar);
        (rendered.sql, rendered.params)
    }

    #[test]
    fn test_like_passes_pattern_through() {
        let [_, not_like, _] = Like::ALL;
        let (sql, params) = render(&not_like, "a%");
        assert_eq!(sql, "\"users\".\"name\" NOT LIKE $1");
        assert_eq!(params, vec![Value::from("a%")]);
    }

    #[test]
    fn test_substring_escapes_wildcards() {
        let [_, icontains, ..] = Substring::ALL;
        let (sql, params) = render(&icontains, "50%_off");
        assert_eq!(sql, "\"users\".\"name\" ILIKE $1");
        assert_eq!(params, vec![Value::from("%50\\%\\_off%")]);
    }

    #[test]
    fn test_regex_operators() {
        assert_eq!(render(&Regex::CASE_INSENSITIVE, "^a").0, "\"users\".\"name\" ~* $1");
        assert_eq!(render(&Regex::CASE_SENSITIVE, "^a").0, "\"users\".\"name\" ~ $1");
    }
}
