//! Workflow store collaborator contracts.

use thiserror::Error;

use recordflow_core::{ActionId, AppId, DefinitionId, EngineError, RecordId, StatusId};

use crate::model::{
    ProcessAction, ProcessActionLog, ProcessDefinition, ProcessStatus, RecordProcessState,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProcessStoreError {
    #[error("not found: {0}")]
    NotFound(String),

    /// Compare-and-swap on `current_status_id` lost against a concurrent
    /// transition.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<ProcessStoreError> for EngineError {
    fn from(err: ProcessStoreError) -> Self {
        match err {
            ProcessStoreError::NotFound(what) => EngineError::NotFound { what },
            ProcessStoreError::Conflict(reason) => EngineError::InvalidTransition { reason },
            ProcessStoreError::Unavailable(reason) => EngineError::StoreUnavailable { reason },
        }
    }
}

/// Persistence contract for workflow configuration and per-record state.
///
/// The `expected` parameter of [`ProcessStore::upsert_state`] carries the
/// status the engine read as current (`None` = no state row yet). The
/// implementation must make read-current/validate/write-new atomic per
/// record (a compare-and-swap or equivalent transaction) and return
/// [`ProcessStoreError::Conflict`] when the row moved underneath the
/// caller. Without that guarantee two concurrent transitions could both be
/// accepted from a now-stale current status.
pub trait ProcessStore {
    fn definition(&self, app: AppId) -> Result<Option<ProcessDefinition>, ProcessStoreError>;

    fn statuses(&self, definition: DefinitionId) -> Result<Vec<ProcessStatus>, ProcessStoreError>;

    fn actions(&self, definition: DefinitionId) -> Result<Vec<ProcessAction>, ProcessStoreError>;

    fn action(&self, action: ActionId) -> Result<Option<ProcessAction>, ProcessStoreError>;

    fn state(&self, record: RecordId) -> Result<Option<RecordProcessState>, ProcessStoreError>;

    fn upsert_state(
        &self,
        record: RecordId,
        definition: DefinitionId,
        expected: Option<StatusId>,
        next: StatusId,
    ) -> Result<(), ProcessStoreError>;

    /// Clear stale assignee rows tied to the old state. The assignee entity
    /// itself is outside the engine's scope beyond triggering the clear.
    fn clear_assignees(&self, record: RecordId) -> Result<(), ProcessStoreError>;

    /// Append one audit row. Implementations must never update or delete
    /// existing rows.
    fn append_log(&self, log: ProcessActionLog) -> Result<(), ProcessStoreError>;

    /// Most recent log rows, newest first.
    fn recent_logs(
        &self,
        record: RecordId,
        limit: usize,
    ) -> Result<Vec<ProcessActionLog>, ProcessStoreError>;
}

/// Denormalized-status writer on the record store.
///
/// After a transition the new status's display name is mirrored onto the
/// record's top-level `status` field. Callers treat this write as part of
/// the transition unit: a failure is a hard error, not best-effort.
pub trait StatusMirror {
    fn mirror_status(&self, record: RecordId, status_name: &str) -> Result<(), ProcessStoreError>;
}
