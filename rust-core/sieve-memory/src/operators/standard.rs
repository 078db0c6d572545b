// SPDX-License-Identifier: PMPL-1.0-or-later
//! Equality and ordering comparisons.

use std::cmp::Ordering;

use sieve_core::operators as names;
use sieve_core::{OperatorError, Value};

use super::coerce_against;
use crate::operator::{required, MemoryOperator};

/// `=`, with numeric widening and string-to-temporal parsing.
pub struct Equal;

impl MemoryOperator for Equal {
    fn name(&self) -> &str {
        names::EQUAL
    }

    fn evaluate(&self, field: &Value, value: Option<&Value>, value_type: Option<&str>) -> Result<bool, OperatorError> {
        let expected = coerce_against(field, required(value, names::EQUAL)?, value_type);
        Ok(field.loose_eq(&expected))
    }
}

/// `!=`, the exact negation of [`Equal`].
pub struct NotEqual;

impl MemoryOperator for NotEqual {
    fn name(&self) -> &str {
        names::NOT_EQUAL
    }

    fn evaluate(&self, field: &Value, value: Option<&Value>, value_type: Option<&str>) -> Result<bool, OperatorError> {
        Equal.evaluate(field, value, value_type).map(|eq| !eq)
    }
}

/// `>`, `<`, `>=` and `<=`. A null field never satisfies an ordering.
pub struct Ordered {
    name: &'static str,
    accept: fn(Ordering) -> bool,
}

impl Ordered {
    pub const GREATER_THAN: Ordered = Ordered {
        name: names::GREATER_THAN,
        accept: Ordering::is_gt,
    };
    pub const LESS_THAN: Ordered = Ordered {
        name: names::LESS_THAN,
        accept: Ordering::is_lt,
    };
    pub const GREATER_THAN_OR_EQUAL: Ordered = Ordered {
        name: names::GREATER_THAN_OR_EQUAL,
        accept: Ordering::is_ge,
    };
    pub const LESS_THAN_OR_EQUAL: Ordered = Ordered {
        name: names::LESS_THAN_OR_EQUAL,
        accept: Ordering::is_le,
    };
}

impl MemoryOperator for Ordered {
    fn name(&self) -> &str {
        self.name
    }

    fn evaluate(&self, field: &Value, value: Option<&Value>, value_type: Option<&str>) -> Result<bool, OperatorError> {
        if field.is_null() {
            return Ok(false);
        }
        let bound = coerce_against(field, required(value, self.name)?, value_type);
        field.try_cmp(&bound).map(self.accept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn eval(op: &dyn MemoryOperator, field: Value, value: Value, hint: Option<&str>) -> Result<bool, OperatorError> {
        op.evaluate(&field, Some(&value), hint)
    }

    #[test]
    fn test_equal_and_not_equal_are_complements() {
        for (field, value) in [
            (Value::Int(5), Value::Int(5)),
            (Value::Int(5), Value::Float(5.0)),
            (Value::from("a"), Value::from("b")),
            (Value::Null, Value::from("x")),
        ] {
            let eq = eval(&Equal, field.clone(), value.clone(), None).unwrap();
            let ne = eval(&NotEqual, field, value, None).unwrap();
            assert_ne!(eq, ne);
        }
    }

    #[test]
    fn test_equal_casts_with_hint() {
        assert!(eval(&Equal, Value::Int(42), Value::from("42"), Some("integer")).unwrap());
        assert!(eval(&Equal, Value::Int(42), Value::from("42"), None).unwrap());
    }

    #[test]
    fn test_string_field_keeps_condition_text() {
        assert!(eval(&Equal, Value::from("25"), Value::from("25"), None).unwrap());
        assert!(!eval(&Equal, Value::from("25"), Value::Int(25), None).unwrap());
    }

    #[test]
    fn test_ordering() {
        assert!(eval(&Ordered::GREATER_THAN, Value::Int(25), Value::Int(18), None).unwrap());
        assert!(!eval(&Ordered::GREATER_THAN, Value::Int(10), Value::Int(18), None).unwrap());
        assert!(eval(&Ordered::LESS_THAN_OR_EQUAL, Value::Float(1.5), Value::Int(2), None).unwrap());
        assert!(eval(&Ordered::GREATER_THAN_OR_EQUAL, Value::Int(2), Value::Int(2), None).unwrap());
    }

    #[test]
    fn test_ordering_null_field_is_false() {
        assert!(!eval(&Ordered::LESS_THAN, Value::Null, Value::Int(1), None).unwrap());
    }

    #[test]
    fn test_ordering_mismatch_is_error() {
        let err = eval(&Ordered::GREATER_THAN, Value::from("abc"), Value::Int(1), None).unwrap_err();
        assert!(matches!(err, OperatorError::TypeMismatch(_)));
    }

    #[test]
    fn test_ordering_dates_from_strings() {
        let field = Value::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(eval(&Ordered::GREATER_THAN, field, Value::from("2024-01-01"), Some("date")).unwrap());
        assert!(eval(
            &Ordered::GREATER_THAN,
            Value::from("2024-03-01"),
            Value::from("2024-01-01"),
            None
        )
        .unwrap());
    }
}
