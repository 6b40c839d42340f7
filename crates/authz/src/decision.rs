//! Typed access decision.

use serde::Serialize;

use recordflow_core::{EngineError, EngineResult};

/// Outcome of a capability check.
///
/// Deliberately not a boolean: the calling layer must be able to map
/// "no principal" to 401 and "principal lacks the capability" to 403
/// without guessing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "decision", content = "reason")]
pub enum AccessDecision {
    Granted,
    /// No resolvable principal (401-equivalent).
    Unauthenticated,
    /// Principal resolved but denied, with a human-readable reason
    /// (403-equivalent).
    Forbidden(String),
}

impl AccessDecision {
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden(reason.into())
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }

    /// Convert to a result for `?`-style gating in the calling layer.
    pub fn into_result(self) -> EngineResult<()> {
        match self {
            Self::Granted => Ok(()),
            Self::Unauthenticated => Err(EngineError::Unauthenticated),
            Self::Forbidden(reason) => Err(EngineError::Forbidden { reason }),
        }
    }
}
