//! Listener broadcaster module
//!
//! Listeners are registered under a unique name with a list of matchers
//! (§4.7). Broadcasting iterates registrations in insertion order, applies
//! matchers, and invokes the callback; a listener that panics is caught and
//! logged so the broadcast still reaches the rest (Rust's analogue of "the
//! exception does not stop the broadcast").

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error};

use crate::domain::entities::context::JobExecutionContext;
use crate::domain::entities::identity::{Key, Matcher};
use crate::domain::entities::job::JobExecutionOutcome;
use crate::domain::entities::trigger::Trigger;
use crate::domain::value_objects::completion_instruction::CompletionInstruction;

pub trait JobListener: Send + Sync {
    fn name(&self) -> &str;
    fn job_to_be_executed(&self, context: &JobExecutionContext) {
        let _ = context;
    }
    fn job_execution_vetoed(&self, context: &JobExecutionContext) {
        let _ = context;
    }
    fn job_was_executed(&self, context: &JobExecutionContext, result: &anyhow::Result<JobExecutionOutcome>) {
        let _ = (context, result);
    }
}

pub trait TriggerListener: Send + Sync {
    fn name(&self) -> &str;
    fn trigger_fired(&self, trigger: &Trigger, context: &JobExecutionContext) {
        let _ = (trigger, context);
    }
    /// Returning true vetoes execution (§4.6 step 2).
    fn vetoes_execution(&self, trigger: &Trigger, context: &JobExecutionContext) -> bool {
        let _ = (trigger, context);
        false
    }
    fn trigger_misfired(&self, trigger: &Trigger) {
        let _ = trigger;
    }
    fn trigger_complete(&self, trigger: &Trigger, context: &JobExecutionContext, instruction: CompletionInstruction) {
        let _ = (trigger, context, instruction);
    }
}

pub trait SchedulerListener: Send + Sync {
    fn scheduler_started(&self) {}
    fn scheduler_in_standby_mode(&self) {}
    fn scheduler_shutdown(&self) {}
    fn scheduling_data_cleared(&self) {}
    fn job_scheduled(&self, trigger: &Trigger) {
        let _ = trigger;
    }
}

struct Registration<L: ?Sized> {
    matchers: Vec<Matcher>,
    listener: Arc<L>,
}

fn matches_any(matchers: &[Matcher], key: &Key) -> bool {
    matchers.is_empty() || matchers.iter().any(|m| m.matches(key))
}

fn guarded<F: FnOnce()>(name: &str, f: F) {
    if catch_unwind(AssertUnwindSafe(f)).is_err() {
        error!(listener = name, "listener callback panicked; broadcast continues");
    }
}

/// Holds the registries; `Arc`-shared so the dispatcher and façade can both
/// broadcast to the same listener set.
#[derive(Default)]
pub struct ListenerManager {
    job_listeners: Mutex<Vec<Registration<dyn JobListener>>>,
    trigger_listeners: Mutex<Vec<Registration<dyn TriggerListener>>>,
    scheduler_listeners: Mutex<Vec<Arc<dyn SchedulerListener>>>,
}

impl ListenerManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_job_listener(&self, listener: Arc<dyn JobListener>, matchers: Vec<Matcher>) {
        self.job_listeners.lock().push(Registration { matchers, listener });
    }

    pub fn add_trigger_listener(&self, listener: Arc<dyn TriggerListener>, matchers: Vec<Matcher>) {
        self.trigger_listeners.lock().push(Registration { matchers, listener });
    }

    pub fn add_scheduler_listener(&self, listener: Arc<dyn SchedulerListener>) {
        self.scheduler_listeners.lock().push(listener);
    }

    fn job_snapshot(&self, key: &Key) -> Vec<Arc<dyn JobListener>> {
        self.job_listeners
            .lock()
            .iter()
            .filter(|r| matches_any(&r.matchers, key))
            .map(|r| r.listener.clone())
            .collect()
    }

    fn trigger_snapshot(&self, key: &Key) -> Vec<Arc<dyn TriggerListener>> {
        self.trigger_listeners
            .lock()
            .iter()
            .filter(|r| matches_any(&r.matchers, key))
            .map(|r| r.listener.clone())
            .collect()
    }

    pub fn notify_trigger_fired(&self, trigger: &Trigger, context: &JobExecutionContext) -> bool {
        let mut vetoed = false;
        for listener in self.trigger_snapshot(trigger.key()) {
            guarded(listener.name(), || listener.trigger_fired(trigger, context));
            if catch_unwind(AssertUnwindSafe(|| listener.vetoes_execution(trigger, context))).unwrap_or(false) {
                vetoed = true;
            }
        }
        vetoed
    }

    pub fn notify_trigger_misfired(&self, trigger: &Trigger) {
        for listener in self.trigger_snapshot(trigger.key()) {
            guarded(listener.name(), || listener.trigger_misfired(trigger));
        }
    }

    pub fn notify_trigger_complete(&self, trigger: &Trigger, context: &JobExecutionContext, instruction: CompletionInstruction) {
        for listener in self.trigger_snapshot(trigger.key()) {
            guarded(listener.name(), || listener.trigger_complete(trigger, context, instruction));
        }
    }

    pub fn notify_job_to_be_executed(&self, job_key: &Key, context: &JobExecutionContext) {
        for listener in self.job_snapshot(job_key) {
            guarded(listener.name(), || listener.job_to_be_executed(context));
        }
    }

    pub fn notify_job_execution_vetoed(&self, job_key: &Key, context: &JobExecutionContext) {
        for listener in self.job_snapshot(job_key) {
            guarded(listener.name(), || listener.job_execution_vetoed(context));
        }
    }

    pub fn notify_job_was_executed(&self, job_key: &Key, context: &JobExecutionContext, result: &anyhow::Result<JobExecutionOutcome>) {
        for listener in self.job_snapshot(job_key) {
            guarded(listener.name(), || listener.job_was_executed(context, result));
        }
    }

    pub fn notify_scheduler_started(&self) {
        for l in self.scheduler_listeners.lock().iter().cloned().collect::<Vec<_>>() {
            guarded("scheduler", || l.scheduler_started());
        }
    }

    pub fn notify_scheduler_in_standby_mode(&self) {
        for l in self.scheduler_listeners.lock().iter().cloned().collect::<Vec<_>>() {
            guarded("scheduler", || l.scheduler_in_standby_mode());
        }
    }

    pub fn notify_scheduler_shutdown(&self) {
        for l in self.scheduler_listeners.lock().iter().cloned().collect::<Vec<_>>() {
            guarded("scheduler", || l.scheduler_shutdown());
        }
    }

    pub fn notify_scheduling_data_cleared(&self) {
        for l in self.scheduler_listeners.lock().iter().cloned().collect::<Vec<_>>() {
            guarded("scheduler", || l.scheduling_data_cleared());
        }
    }

    pub fn notify_job_scheduled(&self, trigger: &Trigger) {
        for l in self.scheduler_listeners.lock().iter().cloned().collect::<Vec<_>>() {
            guarded("scheduler", || l.job_scheduled(trigger));
        }
    }
}

/// Default `JobListener` that logs every callback at `debug`, giving the
/// scheduler observability without requiring a caller to write one.
pub struct TracingJobListener;

impl JobListener for TracingJobListener {
    fn name(&self) -> &str {
        "tracing-job-listener"
    }

    fn job_to_be_executed(&self, context: &JobExecutionContext) {
        debug!(job = %context.job_key, trigger = %context.trigger_key, "job to be executed");
    }

    fn job_execution_vetoed(&self, context: &JobExecutionContext) {
        debug!(job = %context.job_key, "job execution vetoed");
    }

    fn job_was_executed(&self, context: &JobExecutionContext, result: &anyhow::Result<JobExecutionOutcome>) {
        match result {
            Ok(_) => debug!(job = %context.job_key, "job executed successfully"),
            Err(err) => debug!(job = %context.job_key, error = %err, "job execution failed"),
        }
    }
}

/// Default `TriggerListener` counterpart to `TracingJobListener`.
pub struct TracingTriggerListener;

impl TriggerListener for TracingTriggerListener {
    fn name(&self) -> &str {
        "tracing-trigger-listener"
    }

    fn trigger_fired(&self, trigger: &Trigger, _context: &JobExecutionContext) {
        debug!(trigger = %trigger.key(), "trigger fired");
    }

    fn trigger_misfired(&self, trigger: &Trigger) {
        debug!(trigger = %trigger.key(), "trigger misfired");
    }

    fn trigger_complete(&self, trigger: &Trigger, _context: &JobExecutionContext, instruction: CompletionInstruction) {
        debug!(trigger = %trigger.key(), instruction = ?instruction, "trigger complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::identity::{JobKey, TriggerKey};
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingJobListener(Arc<AtomicUsize>);
    impl JobListener for CountingJobListener {
        fn name(&self) -> &str {
            "counting"
        }
        fn job_to_be_executed(&self, _context: &JobExecutionContext) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn sample_context() -> JobExecutionContext {
        JobExecutionContext {
            job_key: JobKey::new("j"),
            trigger_key: TriggerKey::new("t"),
            merged_data_map: Default::default(),
            fire_time: Utc::now(),
            scheduled_fire_time: Utc::now(),
            previous_fire_time: None,
            next_fire_time: None,
            is_recovering: false,
            recovering_trigger_key: None,
            refire_count: 0,
            fire_instance_id: "1".to_string(),
        }
    }

    #[test]
    fn matcher_filters_broadcast() {
        let manager = ListenerManager::new();
        let counter = Arc::new(AtomicUsize::new(0));
        manager.add_job_listener(
            Arc::new(CountingJobListener(counter.clone())),
            vec![Matcher::KeyEquals(JobKey::new("other"))],
        );
        manager.notify_job_to_be_executed(&JobKey::new("j"), &sample_context());
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        manager.notify_job_to_be_executed(&JobKey::new("other"), &sample_context());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_matcher_list_matches_everything() {
        let manager = ListenerManager::new();
        let counter = Arc::new(AtomicUsize::new(0));
        manager.add_job_listener(Arc::new(CountingJobListener(counter.clone())), vec![]);
        manager.notify_job_to_be_executed(&JobKey::new("anything"), &sample_context());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
