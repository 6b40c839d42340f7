//! Workflow entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use recordflow_core::{
    ActionId, AppId, DefinitionId, EngineError, EngineResult, RecordId, StatusId, UserId,
};

/// One workflow definition per application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessDefinition {
    pub id: DefinitionId,
    pub app_id: AppId,
    /// A disabled workflow rejects all actions up front.
    pub enabled: bool,
}

/// One workflow state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessStatus {
    pub id: StatusId,
    pub definition_id: DefinitionId,
    pub name: String,
    pub is_initial: bool,
    /// Advisory: the engine reports final statuses to callers but does not
    /// hard-block actions leaving them; some workflows intentionally
    /// allow reopening.
    pub is_final: bool,
    pub display_order: i32,
}

/// One directed transition edge of the workflow graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessAction {
    pub id: ActionId,
    pub definition_id: DefinitionId,
    pub name: String,
    pub from_status_id: StatusId,
    pub to_status_id: StatusId,
    pub display_order: i32,
}

/// Current status pointer for one record.
///
/// Created lazily on the first transition, never at record creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordProcessState {
    pub record_id: RecordId,
    pub definition_id: DefinitionId,
    pub current_status_id: StatusId,
    pub updated_at: DateTime<Utc>,
}

/// Append-only audit row, one per executed transition. Never mutated or
/// deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessActionLog {
    pub record_id: RecordId,
    pub action_id: ActionId,
    pub from_status_id: StatusId,
    pub to_status_id: StatusId,
    pub executed_by: UserId,
    pub comment: Option<String>,
    pub executed_at: DateTime<Utc>,
}

/// The definition's unique initial status.
///
/// The administrative surface does not enforce the flag, so this is where
/// the policy lives: zero or multiple `is_initial` statuses is a
/// configuration error, surfaced explicitly instead of silently picking
/// the first.
pub fn initial_status(statuses: &[ProcessStatus]) -> EngineResult<&ProcessStatus> {
    let mut initials = statuses.iter().filter(|s| s.is_initial);
    match (initials.next(), initials.next()) {
        (Some(status), None) => Ok(status),
        (None, _) => Err(EngineError::validation(
            "workflow definition has no initial status",
        )),
        (Some(_), Some(_)) => Err(EngineError::validation(
            "workflow definition has multiple initial statuses",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(definition_id: DefinitionId, name: &str, is_initial: bool) -> ProcessStatus {
        ProcessStatus {
            id: StatusId::new(),
            definition_id,
            name: name.to_string(),
            is_initial,
            is_final: false,
            display_order: 0,
        }
    }

    #[test]
    fn single_initial_status_is_found() {
        let def = DefinitionId::new();
        let statuses = vec![
            status(def, "In Progress", false),
            status(def, "Open", true),
            status(def, "Done", false),
        ];
        assert_eq!(initial_status(&statuses).unwrap().name, "Open");
    }

    #[test]
    fn zero_initial_statuses_is_a_configuration_error() {
        let def = DefinitionId::new();
        let statuses = vec![status(def, "A", false), status(def, "B", false)];
        assert!(matches!(
            initial_status(&statuses),
            Err(EngineError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn multiple_initial_statuses_is_a_configuration_error() {
        let def = DefinitionId::new();
        let statuses = vec![status(def, "A", true), status(def, "B", true)];
        assert!(matches!(
            initial_status(&statuses),
            Err(EngineError::ValidationFailed { .. })
        ));
    }
}
