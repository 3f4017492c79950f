//! Service Layer Error Types
//!
//! This module defines error types for organization operations. Callers
//! branch on [`OrgServiceError::kind`]; the message carries the detail.

use crate::db::{RejectionKind, StoreError};
use crate::query::QueryError;
use serde::Serialize;
use thiserror::Error;

/// Caller-facing error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Conflict,
    EmptyResult,
    /// The store failed for a reason unrelated to the request
    Store,
}

/// Organization service errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrgServiceError {
    /// Missing or malformed required fields, bad numeric literal, bad sort,
    /// position without department
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Referenced employee does not resolve
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate employee, missing department or taken manager slot
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A well-formed read matched nothing
    #[error("No results for {operation}")]
    EmptyResult { operation: &'static str },

    /// Graph store failure
    #[error("Graph store operation failed: {0}")]
    Store(#[source] StoreError),
}

impl OrgServiceError {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create an empty result error
    pub fn empty_result(operation: &'static str) -> Self {
        Self::EmptyResult { operation }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::EmptyResult { .. } => ErrorKind::EmptyResult,
            Self::Store(_) => ErrorKind::Store,
        }
    }
}

/// Guard rejections become `NotFound`/`Conflict`; anything else is a store failure.
impl From<StoreError> for OrgServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected {
                kind: RejectionKind::NotFound,
                reason,
            } => Self::NotFound(reason),
            StoreError::Rejected {
                kind: RejectionKind::Conflict,
                reason,
            } => Self::Conflict(reason),
            other => Self::Store(other),
        }
    }
}

impl From<QueryError> for OrgServiceError {
    fn from(err: QueryError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
