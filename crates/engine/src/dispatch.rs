//! Fire-and-forget notification dispatch.
//!
//! Notification firing is decoupled from the record mutation's result
//! channel: the mutation has already committed when dispatch starts, and
//! the background thread is its own error boundary. Callers never await
//! the handle for correctness; only optionally for completion telemetry
//! (tests do).

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use tracing::{debug, error};

use recordflow_core::{AppId, Record, UserId};
use recordflow_notify::{
    Directory, FireContext, FireReport, NotificationEngine, NotificationRule, NotificationSink,
    Trigger,
};

/// Handle to a background dispatch. Dropping it detaches the thread.
#[derive(Debug)]
pub struct DispatchHandle {
    join: Option<thread::JoinHandle<FireReport>>,
}

impl DispatchHandle {
    /// A handle with nothing behind it (no rules to fire, or spawn failed
    /// after the work ran inline).
    pub fn completed() -> Self {
        Self { join: None }
    }

    /// Block until dispatch finishes and return its telemetry, if the
    /// background thread ran.
    pub fn wait(mut self) -> Option<FireReport> {
        self.join.take().and_then(|join| join.join().ok())
    }
}

/// Spawn a background thread that fires the given rules.
///
/// The spawn itself can fail under resource exhaustion; the dispatch is
/// then dropped and logged. Notification is advisory, so the caller sees
/// no failure either way.
#[allow(clippy::too_many_arguments)]
pub fn dispatch_notifications(
    directory: Arc<dyn Directory + Send + Sync>,
    sink: Arc<dyn NotificationSink + Send + Sync>,
    trigger: Trigger,
    app_id: AppId,
    record: Record,
    actor: UserId,
    extra: BTreeMap<String, String>,
    rules: Vec<NotificationRule>,
) -> DispatchHandle {
    if rules.is_empty() {
        return DispatchHandle::completed();
    }

    let fire = move || {
        let engine = NotificationEngine::new(&*directory, &*sink);
        let ctx = FireContext {
            app_id,
            record: &record,
            actor,
            extra,
        };
        let report = engine.fire(trigger, &ctx, &rules);
        debug!(
            %trigger,
            emitted = report.emitted,
            skipped = report.skipped,
            failed = report.failed,
            "notification dispatch finished"
        );
        report
    };

    match thread::Builder::new()
        .name("notify-dispatch".to_string())
        .spawn(fire)
    {
        Ok(join) => DispatchHandle { join: Some(join) },
        Err(err) => {
            error!(%err, "failed to spawn notification dispatch; notifications dropped");
            DispatchHandle::completed()
        }
    }
}
