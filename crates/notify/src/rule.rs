//! Stored notification rule rows.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use recordflow_core::{OrgId, RoleId, RuleId, UserId};
use recordflow_condition::Condition;

/// Record lifecycle event that may fire notification rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    RecordAdded,
    RecordEdited,
    RecordDeleted,
    CommentAdded,
    StatusChanged,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RecordAdded => "record_added",
            Self::RecordEdited => "record_edited",
            Self::RecordDeleted => "record_deleted",
            Self::CommentAdded => "comment_added",
            Self::StatusChanged => "status_changed",
        }
    }
}

impl core::fmt::Display for Trigger {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared recipient set of a notification rule.
///
/// An unrecognized `notify_type` deserializes to [`NotifyTarget::Unknown`],
/// which resolves to an empty recipient set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawNotifyTarget", into = "RawNotifyTarget")]
pub enum NotifyTarget {
    Creator,
    User(UserId),
    FieldValue { field: String },
    Role(RoleId),
    Organization(OrgId),
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawNotifyTarget {
    notify_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notify_target_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notify_target_field: Option<String>,
}

impl From<RawNotifyTarget> for NotifyTarget {
    fn from(raw: RawNotifyTarget) -> Self {
        match (raw.notify_type.as_str(), raw.notify_target_id, raw.notify_target_field) {
            ("creator", _, _) => Self::Creator,
            ("user", Some(id), _) => Self::User(UserId::from_uuid(id)),
            ("field_value", _, Some(field)) => Self::FieldValue { field },
            ("role", Some(id), _) => Self::Role(RoleId::from_uuid(id)),
            ("organization", Some(id), _) => Self::Organization(OrgId::from_uuid(id)),
            _ => Self::Unknown,
        }
    }
}

impl From<NotifyTarget> for RawNotifyTarget {
    fn from(target: NotifyTarget) -> Self {
        let (notify_type, notify_target_id, notify_target_field) = match target {
            NotifyTarget::Creator => ("creator", None, None),
            NotifyTarget::User(id) => ("user", Some(*id.as_uuid()), None),
            NotifyTarget::FieldValue { field } => ("field_value", None, Some(field)),
            NotifyTarget::Role(id) => ("role", Some(*id.as_uuid()), None),
            NotifyTarget::Organization(id) => ("organization", Some(*id.as_uuid()), None),
            NotifyTarget::Unknown => ("unknown", None, None),
        };
        RawNotifyTarget {
            notify_type: notify_type.to_string(),
            notify_target_id,
            notify_target_field,
        }
    }
}

/// One stored notification rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRule {
    pub id: RuleId,
    pub trigger_type: Trigger,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(flatten)]
    pub notify: NotifyTarget,
    pub title_template: String,
    pub message_template: String,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rule_row_shape() {
        let role = RoleId::new();
        let raw = json!({
            "id": RuleId::new(),
            "trigger_type": "status_changed",
            "condition": { "field": "status", "operator": "eq", "value": "approved" },
            "notify_type": "role",
            "notify_target_id": role.to_string(),
            "title_template": "Record {{record_number}} approved",
            "message_template": "Status is now {{status}}",
            "is_active": true
        });
        let rule: NotificationRule = serde_json::from_value(raw).unwrap();
        assert_eq!(rule.trigger_type, Trigger::StatusChanged);
        assert_eq!(rule.notify, NotifyTarget::Role(role));
    }

    #[test]
    fn unknown_notify_type_is_preserved_not_rejected() {
        let raw = json!({
            "id": RuleId::new(),
            "trigger_type": "record_added",
            "notify_type": "pager_duty",
            "title_template": "t",
            "message_template": "m",
            "is_active": true
        });
        let rule: NotificationRule = serde_json::from_value(raw).unwrap();
        assert_eq!(rule.notify, NotifyTarget::Unknown);
    }
}
