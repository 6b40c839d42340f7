//! `recordflow-workflow`; the per-record status state machine.
//!
//! Statuses and actions are externally configured rows, not code: the
//! engine validates and executes transitions against whatever graph the
//! administrative surface authored. State is created lazily on the first
//! transition, every executed transition appends one immutable log row,
//! and all failures are hard errors; transitions must be explicit and
//! auditable, never best-effort.

pub mod engine;
pub mod model;
pub mod store;

pub use engine::{ProcessStateView, WorkflowEngine};
pub use model::{
    initial_status, ProcessAction, ProcessActionLog, ProcessDefinition, ProcessStatus,
    RecordProcessState,
};
pub use store::{ProcessStore, ProcessStoreError, StatusMirror};
