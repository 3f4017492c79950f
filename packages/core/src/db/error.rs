//! Graph Store Error Types
//!
//! This module defines error types for executing transactional units
//! against the graph engine. Guard rejections carry the caller-facing kind
//! so the service layer can map them onto `NotFound`/`Conflict`.

use thiserror::Error;

/// Why a write plan's guard refused to proceed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// A referenced entity does not exist
    NotFound,
    /// The write would violate a uniqueness or existence invariant
    Conflict,
}

/// Graph store operation errors
///
/// Any error returned from a write unit means nothing from that unit was
/// applied.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// A guard in a write plan did not hold
    #[error("Write rejected ({kind:?}): {reason}")]
    Rejected { kind: RejectionKind, reason: String },

    /// A predicate or step referenced a parameter that was never bound
    #[error("Missing query parameter: ${0}")]
    MissingParameter(String),

    /// A predicate, projection or selector referenced an unbound variable
    #[error("Variable '{0}' is not bound by the pattern")]
    UnboundVariable(String),

    /// A variable was used as a node but is bound to a relationship (or vice versa)
    #[error("Variable '{var}' is not bound to a {expected}")]
    WrongBinding { var: String, expected: &'static str },

    /// A result row lacked a column or carried the wrong scalar type
    #[error("Malformed result row: column '{column}' missing or mistyped")]
    MalformedRow { column: String },

    /// The engine could not complete the transactional unit
    #[error("Transaction failed: {context}")]
    TransactionFailed { context: String },
}

impl StoreError {
    /// Create a guard rejection
    pub fn rejected(kind: RejectionKind, reason: impl Into<String>) -> Self {
        Self::Rejected {
            kind,
            reason: reason.into(),
        }
    }

    /// Create a malformed row error
    pub fn malformed_row(column: impl Into<String>) -> Self {
        Self::MalformedRow {
            column: column.into(),
        }
    }

    /// Create a transaction failed error
    pub fn transaction_failed(context: impl Into<String>) -> Self {
        Self::TransactionFailed {
            context: context.into(),
        }
    }
}
