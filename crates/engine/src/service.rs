//! Request-scoped engine facade.
//!
//! One entry point per caller-facing operation: capability/field/record
//! checks, the gated record mutations, and the workflow surface. Every
//! call loads its rule sets fresh from the rule store; no cross-request
//! caching, so rule edits take effect immediately. Notification firing
//! happens only after the mutation commits and never fails the caller.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;
use tracing::instrument;

use recordflow_authz::{
    apply_field_access, check_capability, effective_record_capability, resolve_app_capability,
    resolve_field_access, resolve_record_permission, AccessDecision, Capability, FieldAccess,
    FieldMasking, Principal, RecordCapability,
};
use recordflow_core::{ActionId, AppId, EngineError, EngineResult, Record, RecordId, UserId};
use recordflow_notify::{Directory, NotificationSink, Trigger};
use recordflow_workflow::{ProcessStateView, ProcessStore, WorkflowEngine};

use crate::dispatch::{dispatch_notifications, DispatchHandle};
use crate::stores::{Identity, RecordStore, RuleStore};

/// Result of a gated record mutation.
#[derive(Debug)]
pub struct MutationOutcome {
    pub record_id: RecordId,
    /// Fire-and-forget notification dispatch; wait on it only for
    /// telemetry.
    pub notifications: DispatchHandle,
}

/// Result of a workflow transition.
#[derive(Debug)]
pub struct TransitionOutcome {
    pub new_status: String,
    pub notifications: DispatchHandle,
}

/// The engine facade composed over its collaborators.
pub struct RecordEngine {
    rules: Arc<dyn RuleStore>,
    identity: Arc<dyn Identity>,
    records: Arc<dyn RecordStore>,
    process: Arc<dyn ProcessStore + Send + Sync>,
    directory: Arc<dyn Directory + Send + Sync>,
    sink: Arc<dyn NotificationSink + Send + Sync>,
}

impl RecordEngine {
    pub fn new(
        rules: Arc<dyn RuleStore>,
        identity: Arc<dyn Identity>,
        records: Arc<dyn RecordStore>,
        process: Arc<dyn ProcessStore + Send + Sync>,
        directory: Arc<dyn Directory + Send + Sync>,
        sink: Arc<dyn NotificationSink + Send + Sync>,
    ) -> Self {
        Self {
            rules,
            identity,
            records,
            process,
            directory,
            sink,
        }
    }

    fn principal(&self, session_token: &str) -> EngineResult<Principal> {
        self.identity
            .resolve_principal(session_token)?
            .ok_or(EngineError::Unauthenticated)
    }

    /// Capability check as a typed decision (401 vs 403 preserved).
    pub fn check_capability(
        &self,
        session_token: &str,
        app: AppId,
        capability: Capability,
    ) -> EngineResult<AccessDecision> {
        let principal = self.identity.resolve_principal(session_token)?;
        let rules = self.rules.app_permission_rules(app)?;
        Ok(check_capability(principal.as_ref(), &rules, capability))
    }

    /// Effective access level for one field.
    pub fn field_access(
        &self,
        session_token: &str,
        app: AppId,
        field_name: &str,
    ) -> EngineResult<FieldAccess> {
        let principal = self.principal(session_token)?;
        let rules = self.rules.field_permission_rules(app)?;
        Ok(resolve_field_access(field_name, &principal, &rules))
    }

    /// Record-level override, `None` meaning app-level capability applies.
    pub fn record_permission(
        &self,
        session_token: &str,
        app: AppId,
        record_id: RecordId,
    ) -> EngineResult<Option<RecordCapability>> {
        let principal = self.principal(session_token)?;
        let record = self.load_record(record_id)?;
        let rules = self.rules.record_permission_rules(app)?;
        Ok(resolve_record_permission(&record, &principal, &rules))
    }

    /// Gated read: app + record view checks, then field masking.
    #[instrument(skip(self, session_token), fields(%app, %record_id))]
    pub fn get_record(
        &self,
        session_token: &str,
        app: AppId,
        record_id: RecordId,
    ) -> EngineResult<(Record, FieldMasking)> {
        let principal = self.principal(session_token)?;
        let mut record = self.load_record(record_id)?;
        self.gate_record(&principal, app, &record, Capability::View)?;

        let field_rules = self.rules.field_permission_rules(app)?;
        let masking = apply_field_access(&mut record, &principal, &field_rules);
        Ok((record, masking))
    }

    /// Gated create. Stamps the record's id and creator, persists, then
    /// fires `record_added` as a detached side effect.
    #[instrument(skip(self, session_token, record), fields(%app))]
    pub fn add_record(
        &self,
        session_token: &str,
        app: AppId,
        mut record: Record,
    ) -> EngineResult<MutationOutcome> {
        let principal = self.principal(session_token)?;
        self.gate_app(&principal, app, Capability::Add)?;

        let record_id = record.id().unwrap_or_else(RecordId::new);
        record.set_top_level("id", json!(record_id.to_string()));
        record.set_top_level("created_by", json!(principal.user_id.to_string()));
        self.records.insert(record.clone())?;

        let notifications =
            self.fire(Trigger::RecordAdded, app, record, principal.user_id, BTreeMap::new())?;
        Ok(MutationOutcome {
            record_id,
            notifications,
        })
    }

    /// Gated update. Rejects writes to fields the caller cannot edit, then
    /// fires `record_edited`.
    #[instrument(skip(self, session_token, record), fields(%app))]
    pub fn edit_record(
        &self,
        session_token: &str,
        app: AppId,
        record: Record,
    ) -> EngineResult<MutationOutcome> {
        let principal = self.principal(session_token)?;
        let record_id = record
            .id()
            .ok_or_else(|| EngineError::validation("record has no id"))?;
        let existing = self.load_record(record_id)?;
        self.gate_record(&principal, app, &existing, Capability::Edit)?;
        self.reject_uneditable_field_writes(&principal, app, &existing, &record)?;

        let mut next = record;
        // The creator stamp is immutable.
        if let Some(creator) = existing.created_by() {
            next.set_top_level("created_by", json!(creator.to_string()));
        }
        self.restore_unwritable_fields(&principal, app, &existing, &mut next)?;
        self.records.update(next.clone())?;

        let notifications =
            self.fire(Trigger::RecordEdited, app, next, principal.user_id, BTreeMap::new())?;
        Ok(MutationOutcome {
            record_id,
            notifications,
        })
    }

    /// Gated delete; fires `record_deleted` with the pre-delete snapshot.
    #[instrument(skip(self, session_token), fields(%app, %record_id))]
    pub fn delete_record(
        &self,
        session_token: &str,
        app: AppId,
        record_id: RecordId,
    ) -> EngineResult<MutationOutcome> {
        let principal = self.principal(session_token)?;
        let existing = self.load_record(record_id)?;
        self.gate_record(&principal, app, &existing, Capability::Delete)?;

        self.records.delete(record_id)?;

        let notifications = self.fire(
            Trigger::RecordDeleted,
            app,
            existing,
            principal.user_id,
            BTreeMap::new(),
        )?;
        Ok(MutationOutcome {
            record_id,
            notifications,
        })
    }

    /// Comment on a viewable record; fires `comment_added` with the body
    /// available to templates.
    pub fn add_comment(
        &self,
        session_token: &str,
        app: AppId,
        record_id: RecordId,
        body: &str,
    ) -> EngineResult<DispatchHandle> {
        let principal = self.principal(session_token)?;
        let record = self.load_record(record_id)?;
        self.gate_record(&principal, app, &record, Capability::View)?;

        let mut extra = BTreeMap::new();
        extra.insert("comment".to_string(), body.to_string());
        self.fire(Trigger::CommentAdded, app, record, principal.user_id, extra)
    }

    /// Execute one workflow transition. Hard errors; on success fires
    /// `status_changed` against the mirrored record.
    #[instrument(skip(self, session_token, comment), fields(%app, %record_id))]
    pub fn apply_action(
        &self,
        session_token: &str,
        app: AppId,
        record_id: RecordId,
        action_id: ActionId,
        comment: Option<String>,
    ) -> EngineResult<TransitionOutcome> {
        let principal = self.principal(session_token)?;
        // A transition mutates the record (status mirror), so it is gated
        // like an edit, record-level overrides included.
        let existing = self.load_record(record_id)?;
        self.gate_record(&principal, app, &existing, Capability::Edit)?;

        let workflow = WorkflowEngine::new(&*self.process, &*self.records);
        let new_status =
            workflow.apply_action(app, record_id, action_id, principal.user_id, comment.clone())?;

        // Reload so templates see the mirrored status.
        let record = self.load_record(record_id)?;
        let mut extra = BTreeMap::new();
        extra.insert("new_status".to_string(), new_status.clone());
        if let Some(comment) = comment {
            extra.insert("comment".to_string(), comment);
        }
        let notifications =
            self.fire(Trigger::StatusChanged, app, record, principal.user_id, extra)?;

        Ok(TransitionOutcome {
            new_status,
            notifications,
        })
    }

    /// Workflow snapshot for a viewable record.
    pub fn workflow_state(
        &self,
        session_token: &str,
        app: AppId,
        record_id: RecordId,
    ) -> EngineResult<ProcessStateView> {
        let principal = self.principal(session_token)?;
        self.gate_app(&principal, app, Capability::View)?;

        let workflow = WorkflowEngine::new(&*self.process, &*self.records);
        workflow.get_state(app, record_id)
    }

    fn load_record(&self, record_id: RecordId) -> EngineResult<Record> {
        self.records
            .get(record_id)?
            .ok_or_else(|| EngineError::not_found("record"))
    }

    fn gate_app(&self, principal: &Principal, app: AppId, capability: Capability) -> EngineResult<()> {
        let rules = self.rules.app_permission_rules(app)?;
        check_capability(Some(principal), &rules, capability).into_result()
    }

    /// App-level capability adjusted by a matching record-level override.
    fn gate_record(
        &self,
        principal: &Principal,
        app: AppId,
        record: &Record,
        capability: Capability,
    ) -> EngineResult<()> {
        let app_rules = self.rules.app_permission_rules(app)?;
        let record_rules = self.rules.record_permission_rules(app)?;
        let app_cap = resolve_app_capability(principal, &app_rules);
        let effective = effective_record_capability(app_cap, record, principal, &record_rules);
        if effective.allows(capability) {
            Ok(())
        } else {
            Err(EngineError::forbidden(format!(
                "missing '{capability}' capability for this record"
            )))
        }
    }

    /// An edit may not change a field the caller sees as read-only or
    /// hidden.
    fn reject_uneditable_field_writes(
        &self,
        principal: &Principal,
        app: AppId,
        existing: &Record,
        incoming: &Record,
    ) -> EngineResult<()> {
        let Some(incoming_data) = incoming.data() else {
            return Ok(());
        };
        let field_rules = self.rules.field_permission_rules(app)?;

        for (name, value) in incoming_data {
            let access = resolve_field_access(name, principal, &field_rules);
            if access.is_editable() {
                continue;
            }
            let unchanged = existing.field(name) == Some(value);
            if !unchanged {
                return Err(EngineError::forbidden(format!(
                    "field '{name}' is not editable"
                )));
            }
        }
        Ok(())
    }

    /// Hidden fields are masked out of reads, so the caller's edit payload
    /// never round-trips them; their absence is not a deletion. Copy every
    /// stored data field the caller cannot edit back into the incoming
    /// record when the payload omits it.
    fn restore_unwritable_fields(
        &self,
        principal: &Principal,
        app: AppId,
        existing: &Record,
        next: &mut Record,
    ) -> EngineResult<()> {
        let Some(existing_data) = existing.data() else {
            return Ok(());
        };
        let field_rules = self.rules.field_permission_rules(app)?;

        let mut restore = Vec::new();
        for (name, value) in existing_data {
            if next.data().is_some_and(|d| d.contains_key(name)) {
                continue;
            }
            if resolve_field_access(name, principal, &field_rules).is_editable() {
                continue;
            }
            restore.push((name.clone(), value.clone()));
        }
        for (name, value) in restore {
            next.set_data_field(name, value);
        }
        Ok(())
    }

    fn fire(
        &self,
        trigger: Trigger,
        app: AppId,
        record: Record,
        actor: UserId,
        extra: BTreeMap<String, String>,
    ) -> EngineResult<DispatchHandle> {
        let rules = self.rules.notification_rules(app, trigger)?;
        Ok(dispatch_notifications(
            self.directory.clone(),
            self.sink.clone(),
            trigger,
            app,
            record,
            actor,
            extra,
            rules,
        ))
    }
}
