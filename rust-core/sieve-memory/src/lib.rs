// SPDX-License-Identifier: PMPL-1.0-or-later
//! Sieve Memory
//!
//! Evaluates Sieve condition trees directly against in-memory records:
//! dot-path resolution with implicit list broadcast, a pluggable operator
//! registry, and filtering, ordering and pagination of the results.

pub mod config;
pub mod evaluator;
pub mod operator;
pub mod operators;
pub mod registry;
pub mod resolver;

pub use config::MemoryConfig;
pub use evaluator::MemoryBackend;
pub use operator::MemoryOperator;
pub use registry::OperatorRegistry;
