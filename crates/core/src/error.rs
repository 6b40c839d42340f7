//! Engine error model.

use thiserror::Error;

/// Result type used across the engine crates.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine-level error.
///
/// The aggregator and evaluator never raise for malformed-but-parseable
/// rules (unknown operators/targets resolve to a non-match instead), so the
/// variants here cover explicit outcomes the calling layer must distinguish:
/// 401 vs 403, workflow precondition failures, and collaborator I/O.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// No resolvable principal (401-equivalent).
    #[error("unauthenticated")]
    Unauthenticated,

    /// A capability/field/record check denied the operation (403-equivalent).
    #[error("forbidden: {reason}")]
    Forbidden { reason: String },

    /// A referenced entity is absent (app/record/action/definition).
    #[error("not found: {what}")]
    NotFound { what: String },

    /// A workflow precondition was violated (current status mismatch).
    #[error("invalid transition: {reason}")]
    InvalidTransition { reason: String },

    /// A record without process state was moved via a non-initial action.
    #[error("record has no process state and the action does not start at the initial status")]
    NoProcessState,

    /// The application's workflow is disabled.
    #[error("process is disabled for this application")]
    ProcessDisabled,

    /// A rule/definition is malformed (e.g. zero or multiple initial statuses).
    #[error("validation failed: {reason}")]
    ValidationFailed { reason: String },

    /// A store collaborator failed.
    #[error("store unavailable: {reason}")]
    StoreUnavailable { reason: String },
}

impl EngineError {
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn invalid_transition(reason: impl Into<String>) -> Self {
        Self::InvalidTransition {
            reason: reason.into(),
        }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::ValidationFailed {
            reason: reason.into(),
        }
    }

    pub fn store(reason: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            reason: reason.into(),
        }
    }
}
