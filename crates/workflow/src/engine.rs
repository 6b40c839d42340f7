//! Transition execution and state reads.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use recordflow_core::{ActionId, AppId, EngineError, EngineResult, RecordId, StatusId, UserId};

use crate::model::{initial_status, ProcessAction, ProcessActionLog, ProcessStatus};
use crate::store::{ProcessStore, StatusMirror};

/// Snapshot returned by [`WorkflowEngine::get_state`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessStateView {
    pub current_status_id: StatusId,
    pub current_status_name: String,
    pub is_final: bool,
    /// Actions leaving the current status, by display order.
    pub available_actions: Vec<ProcessAction>,
    /// Most recent transitions, newest first, capped at 20.
    pub recent_logs: Vec<ProcessActionLog>,
}

const RECENT_LOG_LIMIT: usize = 20;

/// The per-record workflow state machine.
///
/// Stateless and request-scoped: every call loads configuration and
/// current state fresh through the store collaborator.
pub struct WorkflowEngine<'a, P: ?Sized, M: ?Sized> {
    store: &'a P,
    mirror: &'a M,
}

impl<'a, P: ProcessStore + ?Sized, M: StatusMirror + ?Sized> WorkflowEngine<'a, P, M> {
    pub fn new(store: &'a P, mirror: &'a M) -> Self {
        Self { store, mirror }
    }

    /// Validate and execute one transition, returning the new status name.
    ///
    /// A record with existing state requires the action to originate at
    /// its current status. A record with no state can only be moved via an
    /// action originating at the initial status; the first transition
    /// implicitly starts the workflow. The state upsert, assignee clear,
    /// log append, and status mirror form one logical unit: any failure is
    /// a hard error to the caller.
    pub fn apply_action(
        &self,
        app: AppId,
        record: RecordId,
        action_id: ActionId,
        actor: UserId,
        comment: Option<String>,
    ) -> EngineResult<String> {
        let definition = self
            .store
            .definition(app)?
            .ok_or_else(|| EngineError::not_found("workflow definition"))?;
        if !definition.enabled {
            return Err(EngineError::ProcessDisabled);
        }

        let action = self
            .store
            .action(action_id)?
            .filter(|a| a.definition_id == definition.id)
            .ok_or_else(|| EngineError::not_found("workflow action"))?;

        let statuses = self.store.statuses(definition.id)?;
        // Resolve the destination before any write so a misconfigured
        // action fails the transition cleanly.
        let to_status = find_status(&statuses, action.to_status_id)?;

        let expected = match self.store.state(record)? {
            Some(state) => {
                if state.current_status_id != action.from_status_id {
                    let current = find_status(&statuses, state.current_status_id)?;
                    return Err(EngineError::invalid_transition(format!(
                        "action '{}' starts at a different status than the record's current '{}'",
                        action.name, current.name
                    )));
                }
                Some(state.current_status_id)
            }
            None => {
                let initial = initial_status(&statuses)?;
                if action.from_status_id != initial.id {
                    return Err(EngineError::NoProcessState);
                }
                None
            }
        };

        self.store
            .upsert_state(record, definition.id, expected, action.to_status_id)?;
        self.store.clear_assignees(record)?;
        self.store.append_log(ProcessActionLog {
            record_id: record,
            action_id: action.id,
            from_status_id: action.from_status_id,
            to_status_id: action.to_status_id,
            executed_by: actor,
            comment,
            executed_at: Utc::now(),
        })?;
        self.mirror.mirror_status(record, &to_status.name)?;

        info!(
            %record,
            action = %action.name,
            status = %to_status.name,
            executed_by = %actor,
            "workflow transition applied"
        );
        Ok(to_status.name.clone())
    }

    /// Read the record's workflow snapshot.
    ///
    /// A record without a state row is reported at the initial status,
    /// synthesized rather than persisted; state is only created on write.
    pub fn get_state(&self, app: AppId, record: RecordId) -> EngineResult<ProcessStateView> {
        let definition = self
            .store
            .definition(app)?
            .ok_or_else(|| EngineError::not_found("workflow definition"))?;

        let statuses = self.store.statuses(definition.id)?;
        let current = match self.store.state(record)? {
            Some(state) => find_status(&statuses, state.current_status_id)?.clone(),
            None => {
                debug!(%record, "no process state; reporting initial status");
                initial_status(&statuses)?.clone()
            }
        };

        let mut available_actions: Vec<ProcessAction> = self
            .store
            .actions(definition.id)?
            .into_iter()
            .filter(|a| a.from_status_id == current.id)
            .collect();
        available_actions.sort_by_key(|a| a.display_order);

        let recent_logs = self.store.recent_logs(record, RECENT_LOG_LIMIT)?;

        Ok(ProcessStateView {
            current_status_id: current.id,
            current_status_name: current.name.clone(),
            is_final: current.is_final,
            available_actions,
            recent_logs,
        })
    }
}

fn find_status(statuses: &[ProcessStatus], id: StatusId) -> EngineResult<&ProcessStatus> {
    statuses
        .iter()
        .find(|s| s.id == id)
        .ok_or_else(|| EngineError::validation("action references a status outside its definition"))
}
