//! Stored permission rule rows.
//!
//! Rules are authored out-of-band by an administrative surface and are
//! read-only here. The store contract returns active rules ordered by
//! descending priority; the resolvers re-sort defensively with a stable
//! sort so ties stay deterministic.

use serde::{Deserialize, Serialize};

use recordflow_core::RuleId;
use recordflow_condition::Condition;

use crate::capability::{AppCapability, RecordCapability};
use crate::target::Target;

/// App-level capability rule. All matching active rules are combined by
/// union; priority does not gate app-level grants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionRule {
    pub id: RuleId,
    #[serde(flatten)]
    pub target: Target,
    pub priority: i64,
    #[serde(flatten)]
    pub capability: AppCapability,
    pub is_active: bool,
}

/// Stored per-field access level.
///
/// Note the resolver exposes a fourth, effective-only level
/// ([`crate::resolve::FieldAccess::Full`]) for "no rule matched"; it is
/// deliberately not representable in a stored rule so "no rule" can never
/// be conflated with an explicit grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    View,
    Edit,
    Hidden,
}

/// Field-level access rule. Exactly one rule per field applies: the
/// highest-priority matching one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldPermissionRule {
    pub id: RuleId,
    pub field_name: String,
    #[serde(flatten)]
    pub target: Target,
    pub access_level: AccessLevel,
    pub priority: i64,
    pub is_active: bool,
}

/// Record-level conditional override. First matching rule (by descending
/// priority) wins; no match means no override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPermissionRule {
    pub id: RuleId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(flatten)]
    pub target: Target,
    pub priority: i64,
    #[serde(flatten)]
    pub capability: RecordCapability,
    pub is_active: bool,
}
