// SPDX-License-Identifier: PMPL-1.0-or-later
//! Query error types.

use serde_json::{json, Map};
use thiserror::Error;

/// Errors surfaced by validation, evaluation and compilation.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("query cannot be null")]
    NullQuery,

    #[error("{message} (at {path})")]
    Validation { message: String, path: String },

    #[error("operator '{operator}' not found")]
    OperatorNotFound {
        operator: String,
        suggestions: Vec<String>,
        valid_operators: Vec<String>,
    },

    #[error("field '{field}' not found on {model} (path '{full_path}')")]
    FieldNotFound {
        field: String,
        model: String,
        full_path: String,
        available: Vec<String>,
        suggestions: Vec<String>,
    },

    #[error("field '{field}' on {model} is not queryable (path '{full_path}')")]
    FieldNotQueryable {
        field: String,
        model: String,
        full_path: String,
        available: Vec<String>,
    },

    #[error("cannot traverse '{field}' on {model}: not a relationship (path '{full_path}')")]
    RelationshipTraversal {
        field: String,
        model: String,
        full_path: String,
        /// Relationship names on `model`.
        available: Vec<String>,
        suggestions: Vec<String>,
    },

    #[error("invalid argument for operator '{operator}': {message}")]
    InvalidArgument { operator: String, message: String },

    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    #[error("resolution hook failed: {0}")]
    Hook(String),

    #[error("execution failed: {0}")]
    Execution(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl QueryError {
    /// Shorthand for a structural validation failure at `path`.
    pub fn validation(message: impl Into<String>, path: impl Into<String>) -> Self {
        QueryError::Validation {
            message: message.into(),
            path: path.into(),
        }
    }

    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::NullQuery | QueryError::Validation { .. } => "VALIDATION_ERROR",
            QueryError::OperatorNotFound { .. } => "OPERATOR_NOT_FOUND",
            QueryError::FieldNotFound { .. } => "INVALID_FIELD",
            QueryError::FieldNotQueryable { .. } => "FIELD_NOT_QUERYABLE",
            QueryError::RelationshipTraversal { .. } => "RELATIONSHIP_TRAVERSAL_ERROR",
            QueryError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            QueryError::UnknownEntity(_) => "UNKNOWN_ENTITY",
            QueryError::Hook(_) => "HOOK_ERROR",
            QueryError::Execution(_) => "EXECUTION_ERROR",
            QueryError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// JSON report carrying the code, the message and every structured field.
    pub fn to_report(&self) -> serde_json::Value {
        let mut report = Map::new();
        report.insert("error".into(), json!(self.code()));
        report.insert("message".into(), json!(self.to_string()));

        match self {
            QueryError::Validation { path, .. } => {
                report.insert("path".into(), json!(path));
            }
            QueryError::OperatorNotFound {
                operator,
                suggestions,
                valid_operators,
            } => {
                report.insert("operator".into(), json!(operator));
                report.insert("suggestions".into(), json!(suggestions));
                report.insert("valid_operators".into(), json!(valid_operators));
            }
            QueryError::FieldNotFound {
                field,
                model,
                full_path,
                available,
                suggestions,
            }
            | QueryError::RelationshipTraversal {
                field,
                model,
                full_path,
                available,
                suggestions,
            } => {
                report.insert("field".into(), json!(field));
                report.insert("model".into(), json!(model));
                report.insert("path".into(), json!(full_path));
                report.insert("available_fields".into(), json!(available));
                report.insert("suggestions".into(), json!(suggestions));
            }
            QueryError::FieldNotQueryable {
                field,
                model,
                full_path,
                available,
            } => {
                report.insert("field".into(), json!(field));
                report.insert("model".into(), json!(model));
                report.insert("path".into(), json!(full_path));
                report.insert("available_fields".into(), json!(available));
            }
            QueryError::InvalidArgument { operator, .. } => {
                report.insert("operator".into(), json!(operator));
            }
            _ => {}
        }

        serde_json::Value::Object(report)
    }
}

/// Failure of a single in-memory operator application.
///
/// The evaluator treats a type mismatch as "no match" and turns an invalid
/// argument into [`QueryError::InvalidArgument`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperatorError {
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
