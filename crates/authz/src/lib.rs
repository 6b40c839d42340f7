//! `recordflow-authz` — rule-based authorization for record applications.
//!
//! Three layers of rules govern every record operation:
//!
//! - **app-level** capability rules, combined by union (a grant is
//!   monotonic: once any matching rule grants a flag it stays granted);
//! - **field-level** access rules, resolved first-match by descending
//!   priority, defaulting to full access when no rule matches;
//! - **record-level** conditional overrides, also first-match, returning
//!   `None` when no rule matches so the app-level capability applies
//!   unchanged.
//!
//! The two aggregation semantics (union vs first-match) are deliberately
//! kept as separate functions; collapsing them into one generic resolver
//! would silently change behavior.
//!
//! This crate is pure policy: no IO, no storage. Rule sets are passed in
//! per request so edits take effect immediately.

pub mod capability;
pub mod decision;
pub mod principal;
pub mod resolve;
pub mod rules;
pub mod target;

pub use capability::{AppCapability, Capability, RecordCapability};
pub use decision::AccessDecision;
pub use principal::Principal;
pub use resolve::{
    apply_field_access, check_capability, effective_record_capability, resolve_app_capability,
    resolve_field_access, resolve_record_permission, visible_records, FieldAccess, FieldMasking,
};
pub use rules::{AccessLevel, FieldPermissionRule, PermissionRule, RecordPermissionRule};
pub use target::Target;
