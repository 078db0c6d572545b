// SPDX-License-Identifier: PMPL-1.0-or-later
//! The in-memory operator contract.

use sieve_core::{OperatorError, Value};

/// A named comparison applied to one resolved field value.
///
/// Implementations return [`OperatorError::TypeMismatch`] for values they
/// cannot compare (the evaluator treats that as "no match") and
/// [`OperatorError::InvalidArgument`] for a malformed condition value.
pub trait MemoryOperator: Send + Sync {
    /// Name the operator is registered and referenced under.
    fn name(&self) -> &str;

    fn evaluate(
        &self,
        field: &Value,
        value: Option<&Value>,
        value_type: Option<&str>,
    ) -> Result<bool, OperatorError>;
}

/// The condition value, or an invalid-argument error naming `operator`.
pub(crate) fn required<'v>(value: Option<&'v Value>, operator: &str) -> Result<&'v Value, OperatorError> {
    value.ok_or_else(|| OperatorError::InvalidArgument(format!("'{operator}' requires a value")))
}
