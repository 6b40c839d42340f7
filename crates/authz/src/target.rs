//! Rule target matching.
//!
//! Every rule declares the audience it applies to. The set of target kinds
//! is closed, so matching is an exhaustive `match` with one arm per kind
//! rather than a dispatch hierarchy. A `target_type` this engine does not
//! recognize deserializes to [`Target::Unknown`] and never matches (fail
//! closed): a misconfigured rule denies rather than crashes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use recordflow_core::{OrgId, Record, RoleId, UserId};

use crate::principal::Principal;

/// Declared audience of a rule.
///
/// `Creator` and `FieldValue` are meaningful for record-level rules only;
/// at app/field level they are matched without a record and fail closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawTarget", into = "RawTarget")]
pub enum Target {
    Everyone,
    User(UserId),
    Organization(OrgId),
    Role(RoleId),
    Creator,
    FieldValue { field: String },
    Unknown,
}

impl Target {
    /// Whether a principal matches this target.
    ///
    /// `record` is `None` at app/field scope; the record-only kinds then
    /// resolve to `false`.
    pub fn matches(&self, principal: &Principal, record: Option<&Record>) -> bool {
        match self {
            Target::Everyone => true,
            Target::User(id) => *id == principal.user_id,
            Target::Organization(id) => principal.in_org(*id),
            Target::Role(id) => principal.has_role(*id),
            Target::Creator => {
                record.and_then(Record::created_by) == Some(principal.user_id)
            }
            Target::FieldValue { field } => record
                .and_then(|r| r.str_field(field))
                .and_then(|s| s.parse::<UserId>().ok())
                == Some(principal.user_id),
            Target::Unknown => false,
        }
    }
}

/// Stored row shape: `{target_type, target_id?, target_field?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawTarget {
    target_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_field: Option<String>,
}

impl From<RawTarget> for Target {
    fn from(raw: RawTarget) -> Self {
        match (raw.target_type.as_str(), raw.target_id, raw.target_field) {
            ("everyone", _, _) => Target::Everyone,
            ("user", Some(id), _) => Target::User(UserId::from_uuid(id)),
            ("organization", Some(id), _) => Target::Organization(OrgId::from_uuid(id)),
            ("role", Some(id), _) => Target::Role(RoleId::from_uuid(id)),
            ("creator", _, _) => Target::Creator,
            ("field_value", _, Some(field)) => Target::FieldValue { field },
            // Unknown kind, or a kind missing its required id/field.
            _ => Target::Unknown,
        }
    }
}

impl From<Target> for RawTarget {
    fn from(target: Target) -> Self {
        let (target_type, target_id, target_field) = match target {
            Target::Everyone => ("everyone", None, None),
            Target::User(id) => ("user", Some(*id.as_uuid()), None),
            Target::Organization(id) => ("organization", Some(*id.as_uuid()), None),
            Target::Role(id) => ("role", Some(*id.as_uuid()), None),
            Target::Creator => ("creator", None, None),
            Target::FieldValue { field } => ("field_value", None, Some(field)),
            Target::Unknown => ("unknown", None, None),
        };
        RawTarget {
            target_type: target_type.to_string(),
            target_id,
            target_field,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record_created_by(user: UserId) -> Record {
        let mut r = Record::new();
        r.set_top_level("created_by", json!(user.to_string()));
        r
    }

    #[test]
    fn everyone_always_matches() {
        let p = Principal::new(UserId::new());
        assert!(Target::Everyone.matches(&p, None));
    }

    #[test]
    fn user_matches_exact_id() {
        let p = Principal::new(UserId::new());
        assert!(Target::User(p.user_id).matches(&p, None));
        assert!(!Target::User(UserId::new()).matches(&p, None));
    }

    #[test]
    fn organization_and_role_match_memberships() {
        let org = OrgId::new();
        let role = RoleId::new();
        let p = Principal::new(UserId::new()).with_org(org).with_role(role);
        assert!(Target::Organization(org).matches(&p, None));
        assert!(Target::Role(role).matches(&p, None));
        assert!(!Target::Organization(OrgId::new()).matches(&p, None));
        assert!(!Target::Role(RoleId::new()).matches(&p, None));
    }

    #[test]
    fn creator_requires_matching_record() {
        let p = Principal::new(UserId::new());
        let record = record_created_by(p.user_id);
        assert!(Target::Creator.matches(&p, Some(&record)));
        assert!(!Target::Creator.matches(&p, None));

        let other = record_created_by(UserId::new());
        assert!(!Target::Creator.matches(&p, Some(&other)));
    }

    #[test]
    fn field_value_checks_data_first_then_top_level() {
        let p = Principal::new(UserId::new());
        let mut record = Record::new();
        record.set_data_field("assignee", json!(p.user_id.to_string()));
        let target = Target::FieldValue {
            field: "assignee".to_string(),
        };
        assert!(target.matches(&p, Some(&record)));

        let mut top = Record::new();
        top.set_top_level("owner", json!(p.user_id.to_string()));
        let target = Target::FieldValue {
            field: "owner".to_string(),
        };
        assert!(target.matches(&p, Some(&top)));
    }

    #[test]
    fn unknown_target_type_fails_closed() {
        let raw = json!({ "target_type": "department", "target_id": UserId::new().to_string() });
        let target: Target = serde_json::from_value(raw).unwrap();
        assert_eq!(target, Target::Unknown);
        let p = Principal::new(UserId::new());
        assert!(!target.matches(&p, None));
    }

    #[test]
    fn user_without_id_fails_closed() {
        let raw = json!({ "target_type": "user" });
        let target: Target = serde_json::from_value(raw).unwrap();
        assert_eq!(target, Target::Unknown);
    }

    #[test]
    fn round_trips_through_row_shape() {
        let target = Target::Role(RoleId::new());
        let value = serde_json::to_value(&target).unwrap();
        assert_eq!(value["target_type"], "role");
        let back: Target = serde_json::from_value(value).unwrap();
        assert_eq!(target, back);
    }
}
