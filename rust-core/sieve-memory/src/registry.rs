// SPDX-License-Identifier: PMPL-1.0-or-later
//! Name-keyed registry of in-memory operators.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use sieve_core::suggest::suggest_operators;
use sieve_core::QueryError;

use crate::operator::MemoryOperator;
use crate::operators;

/// Operators available to a [`crate::MemoryBackend`].
#[derive(Clone, Default)]
pub struct OperatorRegistry {
    operators: BTreeMap<String, Arc<dyn MemoryOperator>>,
}

impl OperatorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in operator.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        operators::register_defaults(&mut registry);
        registry
    }

    /// Register `operator` under its own name, returning any operator it
    /// replaced.
    pub fn register<O>(&mut self, operator: O) -> Option<Arc<dyn MemoryOperator>>
    where
        O: MemoryOperator + 'static,
    {
        self.register_arc(Arc::new(operator))
    }

    pub fn register_arc(&mut self, operator: Arc<dyn MemoryOperator>) -> Option<Arc<dyn MemoryOperator>> {
        self.operators.insert(operator.name().to_string(), operator)
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn MemoryOperator>> {
        self.operators.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn MemoryOperator>> {
        self.operators.get(name)
    }

    /// Like [`Self::get`], but an unknown name becomes
    /// [`QueryError::OperatorNotFound`] with near-match suggestions.
    pub fn lookup(&self, name: &str) -> Result<&Arc<dyn MemoryOperator>, QueryError> {
        self.get(name).ok_or_else(|| QueryError::OperatorNotFound {
            operator: name.to_string(),
            suggestions: suggest_operators(name, self.names()),
            valid_operators: self.names().map(str::to_string).collect(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operators.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operators.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

impl fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}
