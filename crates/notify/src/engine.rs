//! Notification rule engine.
//!
//! `fire` is best-effort by contract: it catches every internal failure,
//! logs it, and moves on to the next rule, because a notification failure
//! must not block the business mutation that already committed.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use recordflow_core::{AppId, OrgId, Record, RoleId, UserId};
use recordflow_condition::evaluate;

use crate::rule::{NotificationRule, NotifyTarget, Trigger};
use crate::template::{expand_template, substitutions};

/// Directory lookups the recipient resolver needs.
///
/// Organization membership is expected to be a two-step lookup on the
/// implementor's side (membership rows → principal directory); this trait
/// only sees the flattened result.
pub trait Directory {
    fn members_of_role(&self, role: RoleId) -> Result<Vec<UserId>, DirectoryError>;
    fn members_of_org(&self, org: OrgId) -> Result<Vec<UserId>, DirectoryError>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// One notification ready for persistence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub recipient_id: UserId,
    /// Trigger name, for client-side routing.
    pub kind: String,
    pub title: String,
    pub message: String,
    /// Relative record URL, when the record carries an id.
    pub link: Option<String>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

/// Persistence collaborator for emitted notifications.
pub trait NotificationSink {
    fn insert_notifications(&self, notifications: Vec<Notification>) -> Result<(), SinkError>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("notification sink unavailable: {0}")]
    Unavailable(String),
}

/// Per-invocation context for `fire`.
#[derive(Debug, Clone)]
pub struct FireContext<'a> {
    pub app_id: AppId,
    pub record: &'a Record,
    /// The acting actor; always removed from recipient sets.
    pub actor: UserId,
    /// Extra template context (e.g. the comment body, the new status name).
    pub extra: BTreeMap<String, String>,
}

/// Telemetry from one `fire` invocation. Informational only; `fire`
/// never fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FireReport {
    /// Notifications handed to the sink.
    pub emitted: usize,
    /// Rules skipped (inactive, wrong trigger, condition false, empty
    /// recipient set).
    pub skipped: usize,
    /// Rules whose recipient resolution or insert failed.
    pub failed: usize,
}

/// The notification rule engine, generic over its collaborators.
pub struct NotificationEngine<'a, D: ?Sized, S: ?Sized> {
    directory: &'a D,
    sink: &'a S,
}

impl<'a, D: Directory + ?Sized, S: NotificationSink + ?Sized> NotificationEngine<'a, D, S> {
    pub fn new(directory: &'a D, sink: &'a S) -> Self {
        Self { directory, sink }
    }

    /// Fire all rules matching `trigger` against the record.
    ///
    /// Rule sets are passed in fresh per call; the engine holds no rule
    /// state across requests.
    pub fn fire(
        &self,
        trigger: Trigger,
        ctx: &FireContext<'_>,
        rules: &[NotificationRule],
    ) -> FireReport {
        let mut report = FireReport::default();
        let subs = substitutions(ctx.record, &ctx.extra);

        for rule in rules {
            if !rule.is_active || rule.trigger_type != trigger {
                report.skipped += 1;
                continue;
            }
            if !evaluate(rule.condition.as_ref(), ctx.record) {
                report.skipped += 1;
                continue;
            }

            let mut recipients = match self.resolve_recipients(&rule.notify, ctx) {
                Ok(recipients) => recipients,
                Err(err) => {
                    warn!(rule = %rule.id, %trigger, %err, "recipient resolution failed; rule skipped");
                    report.failed += 1;
                    continue;
                }
            };

            // No self-notification: drop the actor and duplicates, and the
            // whole rule if nobody else is left.
            let mut seen = std::collections::HashSet::new();
            recipients.retain(|r| *r != ctx.actor && seen.insert(*r));
            if recipients.is_empty() {
                report.skipped += 1;
                continue;
            }

            let title = expand_template(&rule.title_template, &subs);
            let message = expand_template(&rule.message_template, &subs);
            let link = ctx
                .record
                .id()
                .map(|id| format!("/apps/{}/records/{}", ctx.app_id, id));
            let now = Utc::now();

            let batch: Vec<Notification> = recipients
                .into_iter()
                .map(|recipient_id| Notification {
                    recipient_id,
                    kind: trigger.as_str().to_string(),
                    title: title.clone(),
                    message: message.clone(),
                    link: link.clone(),
                    metadata: json!({ "trigger": trigger.as_str(), "rule_id": rule.id }),
                    created_at: now,
                })
                .collect();

            let count = batch.len();
            match self.sink.insert_notifications(batch) {
                Ok(()) => {
                    debug!(rule = %rule.id, %trigger, count, "notifications emitted");
                    report.emitted += count;
                }
                Err(err) => {
                    // Log and continue with the remaining rules.
                    warn!(rule = %rule.id, %trigger, %err, "notification insert failed");
                    report.failed += 1;
                }
            }
        }

        report
    }

    fn resolve_recipients(
        &self,
        target: &NotifyTarget,
        ctx: &FireContext<'_>,
    ) -> Result<Vec<UserId>, DirectoryError> {
        Ok(match target {
            NotifyTarget::Creator => ctx.record.created_by().into_iter().collect(),
            NotifyTarget::User(id) => vec![*id],
            NotifyTarget::FieldValue { field } => ctx
                .record
                .str_field(field)
                .and_then(|s| s.parse::<UserId>().ok())
                .into_iter()
                .collect(),
            NotifyTarget::Role(role) => self.directory.members_of_role(*role)?,
            NotifyTarget::Organization(org) => self.directory.members_of_org(*org)?,
            // Unrecognized target kinds resolve to nobody, never to a guess.
            NotifyTarget::Unknown => Vec::new(),
        })
    }
}
