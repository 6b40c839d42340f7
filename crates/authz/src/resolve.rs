//! Permission aggregation.
//!
//! Pure functions over (principal, rule set, record). Rule sets are passed
//! in fresh per request by the calling layer; nothing here caches across
//! requests, so rule edits take effect immediately.

use serde::Serialize;
use tracing::debug;

use recordflow_core::Record;
use recordflow_condition::evaluate;

use crate::capability::{AppCapability, Capability, RecordCapability};
use crate::decision::AccessDecision;
use crate::principal::Principal;
use crate::rules::{AccessLevel, FieldPermissionRule, PermissionRule, RecordPermissionRule};

/// Union all active matching app-level rules into one capability set.
///
/// Priority does not gate this step: capability is a monotonic grant, so
/// every matching rule contributes its flags.
pub fn resolve_app_capability(principal: &Principal, rules: &[PermissionRule]) -> AppCapability {
    let mut effective = AppCapability::default();
    for rule in rules {
        if !rule.is_active {
            continue;
        }
        if rule.target.matches(principal, None) {
            effective.union_with(&rule.capability);
        }
    }
    effective
}

/// Check one capability for an optionally-authenticated caller.
///
/// `None` principal means the session could not be resolved and maps to
/// [`AccessDecision::Unauthenticated`], never to a plain denial.
pub fn check_capability(
    principal: Option<&Principal>,
    rules: &[PermissionRule],
    capability: Capability,
) -> AccessDecision {
    let Some(principal) = principal else {
        return AccessDecision::Unauthenticated;
    };

    let effective = resolve_app_capability(principal, rules);
    if effective.allows(capability) {
        AccessDecision::Granted
    } else {
        debug!(user = %principal.user_id, %capability, "capability denied");
        AccessDecision::forbidden(format!("missing '{capability}' capability"))
    }
}

/// Effective per-field access level.
///
/// `Full` is the fourth, effective-only level returned when no rule
/// matches a field: distinct from the stored levels so "no rule" is never
/// conflated with an explicit view-only grant (default-open invariant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldAccess {
    Full,
    Edit,
    View,
    Hidden,
}

impl FieldAccess {
    pub fn is_visible(&self) -> bool {
        !matches!(self, Self::Hidden)
    }

    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Full | Self::Edit)
    }
}

impl From<AccessLevel> for FieldAccess {
    fn from(level: AccessLevel) -> Self {
        match level {
            AccessLevel::View => Self::View,
            AccessLevel::Edit => Self::Edit,
            AccessLevel::Hidden => Self::Hidden,
        }
    }
}

/// Resolve one field's access level: highest-priority matching rule wins.
///
/// The sort is stable, so among equal priorities the rule earlier in the
/// supplied ordering wins, deterministic given stable input.
pub fn resolve_field_access(
    field_name: &str,
    principal: &Principal,
    rules: &[FieldPermissionRule],
) -> FieldAccess {
    let mut candidates: Vec<&FieldPermissionRule> = rules
        .iter()
        .filter(|r| r.is_active && r.field_name == field_name)
        .collect();
    candidates.sort_by(|a, b| b.priority.cmp(&a.priority));

    for rule in candidates {
        if rule.target.matches(principal, None) {
            return rule.access_level.into();
        }
    }
    FieldAccess::Full
}

/// Resolve the record-level override, if any.
///
/// Rules are evaluated in descending priority; the first whose condition
/// AND target both match wins (short-circuit, not union). `None` means no
/// override: the app-level capability applies unchanged.
pub fn resolve_record_permission(
    record: &Record,
    principal: &Principal,
    rules: &[RecordPermissionRule],
) -> Option<RecordCapability> {
    let mut candidates: Vec<&RecordPermissionRule> =
        rules.iter().filter(|r| r.is_active).collect();
    candidates.sort_by(|a, b| b.priority.cmp(&a.priority));

    for rule in candidates {
        if !evaluate(rule.condition.as_ref(), record) {
            continue;
        }
        if rule.target.matches(principal, Some(record)) {
            return Some(rule.capability);
        }
    }
    None
}

/// Combine app-level capability with any record-level override.
///
/// A matching override replaces the view/edit/delete subset; the remaining
/// flags (add/manage/export/import) stay app-level.
pub fn effective_record_capability(
    app: AppCapability,
    record: &Record,
    principal: &Principal,
    rules: &[RecordPermissionRule],
) -> AppCapability {
    match resolve_record_permission(record, principal, rules) {
        None => app,
        Some(rec) => AppCapability {
            can_view: rec.can_view,
            can_edit: rec.can_edit,
            can_delete: rec.can_delete,
            ..app
        },
    }
}

/// Keep the records a principal may view.
///
/// A record-level override decides when one matches; otherwise the
/// app-level view capability applies.
pub fn visible_records<'a>(
    records: &'a [Record],
    principal: &Principal,
    app: &AppCapability,
    rules: &[RecordPermissionRule],
) -> Vec<&'a Record> {
    records
        .iter()
        .filter(|record| match resolve_record_permission(record, principal, rules) {
            Some(rec) => rec.can_view,
            None => app.allows(Capability::View),
        })
        .collect()
}

/// Result of masking a record against field rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldMasking {
    /// Fields stripped from the record because they resolved to `Hidden`.
    pub hidden: Vec<String>,
    /// Fields the caller may see but not edit.
    pub read_only: Vec<String>,
}

/// Strip hidden custom fields from a record and report read-only ones.
///
/// Applied by the calling layer before a record leaves the engine boundary.
pub fn apply_field_access(
    record: &mut Record,
    principal: &Principal,
    rules: &[FieldPermissionRule],
) -> FieldMasking {
    let field_names: Vec<String> = record
        .data()
        .map(|data| data.keys().cloned().collect())
        .unwrap_or_default();

    let mut masking = FieldMasking::default();
    for name in field_names {
        match resolve_field_access(&name, principal, rules) {
            FieldAccess::Hidden => {
                record.remove_data_field(&name);
                masking.hidden.push(name);
            }
            FieldAccess::View => masking.read_only.push(name),
            FieldAccess::Edit | FieldAccess::Full => {}
        }
    }
    masking
}
