//! `recordflow-engine` — composition layer over the policy crates.
//!
//! Wires the permission aggregator, notification rule engine, and workflow
//! engine behind one request-scoped facade, defines the remaining
//! collaborator contracts (rule store, identity, record store), and ships
//! in-memory implementations of every collaborator for tests and
//! development. Notification dispatch runs on a background thread with its
//! own error boundary; callers never await it for correctness.

pub mod dispatch;
pub mod service;
pub mod stores;

pub use dispatch::{dispatch_notifications, DispatchHandle};
pub use service::{MutationOutcome, RecordEngine, TransitionOutcome};
pub use stores::{
    Identity, InMemoryDirectory, InMemoryProcessStore, InMemoryRecordStore, InMemoryRuleStore,
    MemorySink, RecordStore, RuleStore, StoreError,
};
