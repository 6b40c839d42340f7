//! Collaborator contracts and in-memory implementations.
//!
//! The in-memory stores exist for tests and development. They keep the
//! same contracts a database-backed implementation would: rule listings
//! ordered by descending priority, compare-and-swap on process state, and
//! an append-only action log.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

use recordflow_authz::{FieldPermissionRule, PermissionRule, Principal, RecordPermissionRule};
use recordflow_core::{
    ActionId, AppId, DefinitionId, EngineError, OrgId, Record, RecordId, RoleId, StatusId, UserId,
};
use recordflow_notify::{
    Directory, DirectoryError, Notification, NotificationRule, NotificationSink, SinkError,
    Trigger,
};
use recordflow_workflow::{
    ProcessAction, ProcessActionLog, ProcessDefinition, ProcessStatus, ProcessStore,
    ProcessStoreError, RecordProcessState, StatusMirror,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(reason) => EngineError::StoreUnavailable { reason },
        }
    }
}

/// Read-only rule source. Listings return active and inactive rows; the
/// resolvers skip inactive ones. Ordering is by descending priority.
pub trait RuleStore: Send + Sync {
    fn app_permission_rules(&self, app: AppId) -> Result<Vec<PermissionRule>, StoreError>;
    fn field_permission_rules(&self, app: AppId) -> Result<Vec<FieldPermissionRule>, StoreError>;
    fn record_permission_rules(&self, app: AppId) -> Result<Vec<RecordPermissionRule>, StoreError>;
    fn notification_rules(
        &self,
        app: AppId,
        trigger: Trigger,
    ) -> Result<Vec<NotificationRule>, StoreError>;
}

/// Session resolution. `None` means the token resolved to nobody; the
/// caller maps that to an unauthenticated outcome, never a plain denial.
pub trait Identity: Send + Sync {
    fn resolve_principal(&self, session_token: &str) -> Result<Option<Principal>, StoreError>;
}

/// Generic record persistence. Records are opaque maps to the engine.
///
/// Every record store is also the [`StatusMirror`] target: mirroring the
/// workflow status onto the record's denormalized `status` field is a
/// record-store write.
pub trait RecordStore: StatusMirror + Send + Sync {
    fn get(&self, record: RecordId) -> Result<Option<Record>, StoreError>;
    fn insert(&self, record: Record) -> Result<(), StoreError>;
    fn update(&self, record: Record) -> Result<(), StoreError>;
    fn delete(&self, record: RecordId) -> Result<(), StoreError>;
}

// ─────────────────────────────────────────────────────────────────────────
// In-memory implementations
// ─────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct RuleRows {
    app: Vec<PermissionRule>,
    field: Vec<FieldPermissionRule>,
    record: Vec<RecordPermissionRule>,
    notification: Vec<NotificationRule>,
}

/// Rule source backed by per-app vectors.
#[derive(Default)]
pub struct InMemoryRuleStore {
    rows: Mutex<HashMap<AppId, RuleRows>>,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_app_rule(&self, app: AppId, rule: PermissionRule) {
        let mut rows = self.rows.lock().unwrap();
        let entry = rows.entry(app).or_default();
        entry.app.push(rule);
        entry.app.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    pub fn add_field_rule(&self, app: AppId, rule: FieldPermissionRule) {
        let mut rows = self.rows.lock().unwrap();
        let entry = rows.entry(app).or_default();
        entry.field.push(rule);
        entry.field.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    pub fn add_record_rule(&self, app: AppId, rule: RecordPermissionRule) {
        let mut rows = self.rows.lock().unwrap();
        let entry = rows.entry(app).or_default();
        entry.record.push(rule);
        entry.record.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    pub fn add_notification_rule(&self, app: AppId, rule: NotificationRule) {
        self.rows
            .lock()
            .unwrap()
            .entry(app)
            .or_default()
            .notification
            .push(rule);
    }
}

impl RuleStore for InMemoryRuleStore {
    fn app_permission_rules(&self, app: AppId) -> Result<Vec<PermissionRule>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&app)
            .map(|r| r.app.clone())
            .unwrap_or_default())
    }

    fn field_permission_rules(&self, app: AppId) -> Result<Vec<FieldPermissionRule>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&app)
            .map(|r| r.field.clone())
            .unwrap_or_default())
    }

    fn record_permission_rules(&self, app: AppId) -> Result<Vec<RecordPermissionRule>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&app)
            .map(|r| r.record.clone())
            .unwrap_or_default())
    }

    fn notification_rules(
        &self,
        app: AppId,
        trigger: Trigger,
    ) -> Result<Vec<NotificationRule>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&app)
            .map(|r| {
                r.notification
                    .iter()
                    .filter(|n| n.trigger_type == trigger)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Identity + directory over in-memory membership tables.
///
/// Organization lookup is the contract's two-step walk: membership rows
/// first, then the principal directory, flattened here because both tables
/// live in the same struct.
#[derive(Default)]
pub struct InMemoryDirectory {
    sessions: Mutex<HashMap<String, Principal>>,
    role_members: Mutex<HashMap<RoleId, Vec<UserId>>>,
    org_members: Mutex<HashMap<OrgId, Vec<UserId>>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session and mirror the principal's memberships into the
    /// role/org tables.
    pub fn add_session(&self, token: impl Into<String>, principal: Principal) {
        for role in &principal.roles {
            self.role_members
                .lock()
                .unwrap()
                .entry(*role)
                .or_default()
                .push(principal.user_id);
        }
        for org in &principal.orgs {
            self.org_members
                .lock()
                .unwrap()
                .entry(*org)
                .or_default()
                .push(principal.user_id);
        }
        self.sessions.lock().unwrap().insert(token.into(), principal);
    }
}

impl Identity for InMemoryDirectory {
    fn resolve_principal(&self, session_token: &str) -> Result<Option<Principal>, StoreError> {
        Ok(self.sessions.lock().unwrap().get(session_token).cloned())
    }
}

impl Directory for InMemoryDirectory {
    fn members_of_role(&self, role: RoleId) -> Result<Vec<UserId>, DirectoryError> {
        Ok(self
            .role_members
            .lock()
            .unwrap()
            .get(&role)
            .cloned()
            .unwrap_or_default())
    }

    fn members_of_org(&self, org: OrgId) -> Result<Vec<UserId>, DirectoryError> {
        Ok(self
            .org_members
            .lock()
            .unwrap()
            .get(&org)
            .cloned()
            .unwrap_or_default())
    }
}

/// Record persistence over a map, doubling as the status mirror target.
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: Mutex<HashMap<RecordId, Record>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn get(&self, record: RecordId) -> Result<Option<Record>, StoreError> {
        Ok(self.records.lock().unwrap().get(&record).cloned())
    }

    fn insert(&self, record: Record) -> Result<(), StoreError> {
        let id = record
            .id()
            .ok_or_else(|| StoreError::Unavailable("record has no id".to_string()))?;
        self.records.lock().unwrap().insert(id, record);
        Ok(())
    }

    fn update(&self, record: Record) -> Result<(), StoreError> {
        self.insert(record)
    }

    fn delete(&self, record: RecordId) -> Result<(), StoreError> {
        self.records.lock().unwrap().remove(&record);
        Ok(())
    }
}

impl StatusMirror for InMemoryRecordStore {
    fn mirror_status(&self, record: RecordId, status_name: &str) -> Result<(), ProcessStoreError> {
        let mut records = self.records.lock().unwrap();
        let entry = records
            .get_mut(&record)
            .ok_or_else(|| ProcessStoreError::NotFound("record".to_string()))?;
        entry.set_top_level("status", serde_json::Value::String(status_name.to_string()));
        Ok(())
    }
}

/// Workflow persistence with per-record compare-and-swap on state.
#[derive(Default)]
pub struct InMemoryProcessStore {
    definitions: Mutex<Vec<ProcessDefinition>>,
    statuses: Mutex<Vec<ProcessStatus>>,
    actions: Mutex<Vec<ProcessAction>>,
    states: Mutex<HashMap<RecordId, RecordProcessState>>,
    logs: Mutex<Vec<ProcessActionLog>>,
    assignees: Mutex<HashMap<RecordId, Vec<UserId>>>,
}

impl InMemoryProcessStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_definition(&self, definition: ProcessDefinition) {
        self.definitions.lock().unwrap().push(definition);
    }

    pub fn add_status(&self, status: ProcessStatus) {
        self.statuses.lock().unwrap().push(status);
    }

    pub fn add_action(&self, action: ProcessAction) {
        self.actions.lock().unwrap().push(action);
    }

    pub fn assign(&self, record: RecordId, user: UserId) {
        self.assignees.lock().unwrap().entry(record).or_default().push(user);
    }

    pub fn assignees(&self, record: RecordId) -> Vec<UserId> {
        self.assignees
            .lock()
            .unwrap()
            .get(&record)
            .cloned()
            .unwrap_or_default()
    }

    pub fn log_count(&self) -> usize {
        self.logs.lock().unwrap().len()
    }
}

impl ProcessStore for InMemoryProcessStore {
    fn definition(&self, app: AppId) -> Result<Option<ProcessDefinition>, ProcessStoreError> {
        Ok(self
            .definitions
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.app_id == app)
            .cloned())
    }

    fn statuses(&self, definition: DefinitionId) -> Result<Vec<ProcessStatus>, ProcessStoreError> {
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.definition_id == definition)
            .cloned()
            .collect())
    }

    fn actions(&self, definition: DefinitionId) -> Result<Vec<ProcessAction>, ProcessStoreError> {
        Ok(self
            .actions
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.definition_id == definition)
            .cloned()
            .collect())
    }

    fn action(&self, action: ActionId) -> Result<Option<ProcessAction>, ProcessStoreError> {
        Ok(self
            .actions
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == action)
            .cloned())
    }

    fn state(&self, record: RecordId) -> Result<Option<RecordProcessState>, ProcessStoreError> {
        Ok(self.states.lock().unwrap().get(&record).cloned())
    }

    fn upsert_state(
        &self,
        record: RecordId,
        definition: DefinitionId,
        expected: Option<StatusId>,
        next: StatusId,
    ) -> Result<(), ProcessStoreError> {
        // The lock makes read-validate-write atomic per store; a database
        // implementation would use a conditional UPDATE instead.
        let mut states = self.states.lock().unwrap();
        let current = states.get(&record).map(|s| s.current_status_id);
        if current != expected {
            return Err(ProcessStoreError::Conflict(
                "process state moved concurrently".to_string(),
            ));
        }
        states.insert(
            record,
            RecordProcessState {
                record_id: record,
                definition_id: definition,
                current_status_id: next,
                updated_at: chrono::Utc::now(),
            },
        );
        Ok(())
    }

    fn clear_assignees(&self, record: RecordId) -> Result<(), ProcessStoreError> {
        self.assignees.lock().unwrap().remove(&record);
        Ok(())
    }

    fn append_log(&self, log: ProcessActionLog) -> Result<(), ProcessStoreError> {
        self.logs.lock().unwrap().push(log);
        Ok(())
    }

    fn recent_logs(
        &self,
        record: RecordId,
        limit: usize,
    ) -> Result<Vec<ProcessActionLog>, ProcessStoreError> {
        Ok(self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.record_id == record)
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Sink that collects everything it receives, for tests and development.
#[derive(Default)]
pub struct MemorySink {
    inserted: Mutex<Vec<Notification>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut self.inserted.lock().unwrap())
    }

    pub fn count(&self) -> usize {
        self.inserted.lock().unwrap().len()
    }
}

impl NotificationSink for MemorySink {
    fn insert_notifications(&self, notifications: Vec<Notification>) -> Result<(), SinkError> {
        self.inserted.lock().unwrap().extend(notifications);
        Ok(())
    }
}
