//! Scheduler façade module
//!
//! `JobScheduler` is the single public entry point (§6): a thin,
//! `Clone`-able handle over the store, the dispatcher, the worker pool, and
//! the listener manager. It owns none of the scheduling logic itself —
//! every operation either delegates straight to the store or nudges the
//! dispatcher's signaler — the façade's job is to present that set of
//! moving parts as one coherent API.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::domain::entities::calendar::Calendar;
use crate::domain::entities::context::JobExecutionContext;
use crate::domain::entities::identity::{JobKey, Matcher, TriggerKey, DEFAULT_GROUP};
use crate::domain::entities::job::{JobDataMap, JobDetail, JobExecutionOutcome};
use crate::domain::entities::trigger::{SimpleMisfireInstruction, SimpleTrigger, Trigger, TriggerCore, TriggerState};
use crate::domain::store::JobStore;
use crate::domain::value_objects::fired_bundle::TriggerFiredBundle;
use crate::error::{SchedulerError, SchedulerResult};
use crate::infrastructure::clock::Clock;

use super::config::SchedulerConfig;
use super::dispatcher::Dispatcher;
use super::job_factory::JobFactory;
use super::job_runshell::JobRunShell;
use super::listeners::{JobListener, ListenerManager, TracingJobListener, TracingTriggerListener};
use super::registry;
use super::signaler::SchedulingSignaler;
use super::worker_pool::WorkerPool;

/// The target of an `interrupt` request: a job (all of its current
/// executions) or one specific fire instance.
#[derive(Debug, Clone)]
pub enum InterruptTarget {
    Job(JobKey),
    FireInstance(String),
}

struct ExecutionTracker(Arc<Mutex<HashMap<String, JobExecutionContext>>>);

impl JobListener for ExecutionTracker {
    fn name(&self) -> &str {
        "execution-tracker"
    }

    fn job_to_be_executed(&self, context: &JobExecutionContext) {
        self.0.lock().insert(context.fire_instance_id.clone(), context.clone());
    }

    fn job_was_executed(&self, context: &JobExecutionContext, _result: &anyhow::Result<JobExecutionOutcome>) {
        self.0.lock().remove(&context.fire_instance_id);
    }
}

struct Inner {
    store: Arc<dyn JobStore>,
    pool: Arc<WorkerPool>,
    signaler: Arc<SchedulingSignaler>,
    listeners: Arc<ListenerManager>,
    job_factory: Arc<Mutex<Arc<dyn JobFactory>>>,
    clock: Arc<dyn Clock>,
    dispatcher: Arc<Dispatcher>,
    config: SchedulerConfig,
    shutdown: AtomicBool,
    executing: Arc<Mutex<HashMap<String, JobExecutionContext>>>,
}

/// A `Clone`-able, `Arc`-backed handle to one scheduler instance. Every
/// clone refers to the same dispatcher, worker pool, and store.
#[derive(Clone)]
pub struct JobScheduler(Arc<Inner>);

impl JobScheduler {
    /// Assembles a scheduler over `store`, ready to be `start`ed. Does not
    /// itself spawn any thread or touch the store — construction is cheap
    /// and side-effect free apart from registering the instance name.
    pub fn new(
        store: Arc<dyn JobStore>,
        job_factory: Arc<dyn JobFactory>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> SchedulerResult<Self> {
        let pool = Arc::new(WorkerPool::new(config.thread_count));
        let signaler = Arc::new(SchedulingSignaler::new());
        let listeners = Arc::new(ListenerManager::new());
        listeners.add_job_listener(Arc::new(TracingJobListener), vec![]);
        listeners.add_trigger_listener(Arc::new(TracingTriggerListener), vec![]);

        let executing = Arc::new(Mutex::new(HashMap::new()));
        listeners.add_job_listener(Arc::new(ExecutionTracker(executing.clone())), vec![]);

        let job_factory_cell = Arc::new(Mutex::new(job_factory));
        let dispatcher = Arc::new(Dispatcher::new(
            store.clone(),
            pool.clone(),
            signaler.clone(),
            listeners.clone(),
            job_factory_cell.clone(),
            clock.clone(),
            config.clone(),
        ));

        let inner = Arc::new(Inner {
            store,
            pool,
            signaler,
            listeners,
            job_factory: job_factory_cell,
            clock,
            dispatcher,
            config: config.clone(),
            shutdown: AtomicBool::new(false),
            executing,
        });
        let scheduler = Self(inner);
        registry::register(&config.instance_name, scheduler.clone())?;
        Ok(scheduler)
    }

    fn ensure_not_shutdown(&self) -> SchedulerResult<()> {
        if self.is_shutdown() {
            return Err(SchedulerError::SchedulerShutdownError);
        }
        Ok(())
    }

    fn signal(&self, candidate: Option<DateTime<Utc>>) {
        self.0.signaler.signal_scheduling_change(candidate);
    }

    // -- lifecycle --------------------------------------------------------

    /// Runs store recovery and starts the dispatcher loop. Idempotent: a
    /// second call while already running is equivalent to `resume` (it
    /// clears standby if the scheduler was paused, but does not re-run
    /// recovery).
    pub fn start(&self) -> SchedulerResult<()> {
        self.ensure_not_shutdown()?;
        if !self.0.dispatcher.is_running() {
            self.recover()?;
        }
        self.0.dispatcher.resume();
        self.0.dispatcher.start();
        self.0.listeners.notify_scheduler_started();
        Ok(())
    }

    fn recover(&self) -> SchedulerResult<()> {
        let recovered = self.0.store.initialize()?;
        for trigger in recovered {
            if !trigger.requests_recovery {
                continue;
            }
            if !self.0.store.check_job_exists(&trigger.job_key)? {
                continue;
            }
            let now = self.0.clock.now();
            let mut core = TriggerCore::new(
                TriggerKey::with_group(format!("RECOVER-{}", Uuid::new_v4()), DEFAULT_GROUP),
                trigger.job_key.clone(),
                now,
            );
            core.data_map.insert(
                crate::domain::entities::context::RECOVERING_TRIGGER_NAME_KEY.to_string(),
                serde_json::Value::String(trigger.original_trigger_key.name.clone()),
            );
            core.data_map.insert(
                crate::domain::entities::context::RECOVERING_TRIGGER_GROUP_KEY.to_string(),
                serde_json::Value::String(trigger.original_trigger_key.group.clone()),
            );
            core.next_fire_time = Some(now);
            let recovery_trigger = Trigger::Simple(SimpleTrigger {
                core,
                repeat_count: 0,
                repeat_interval: chrono::Duration::zero(),
                times_triggered: 0,
                misfire_instruction: SimpleMisfireInstruction::FireNow,
            });
            self.0.store.store_trigger(recovery_trigger, false)?;
        }
        self.signal(None);
        Ok(())
    }

    /// Starts the dispatcher after `seconds`, on a background thread, so
    /// the caller does not block waiting for the delay to elapse.
    pub fn start_delayed(&self, seconds: u64) -> SchedulerResult<()> {
        self.ensure_not_shutdown()?;
        let this = self.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_secs(seconds));
            let _ = this.start();
        });
        Ok(())
    }

    pub fn standby(&self) {
        self.0.dispatcher.standby();
        self.0.listeners.notify_scheduler_in_standby_mode();
    }

    pub fn is_started(&self) -> bool {
        self.0.dispatcher.is_running() && !self.0.dispatcher.is_paused()
    }

    pub fn is_in_standby_mode(&self) -> bool {
        self.0.dispatcher.is_paused()
    }

    pub fn is_shutdown(&self) -> bool {
        self.0.shutdown.load(Ordering::SeqCst)
    }

    /// Halts the dispatcher loop and shuts down the worker pool. `wait`
    /// joins both before returning. Idempotent; frees the instance name in
    /// the process-wide registry.
    pub fn shutdown(&self, wait: bool) -> SchedulerResult<()> {
        if self.0.shutdown.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.0.dispatcher.shutdown(wait);
        self.0.listeners.notify_scheduler_shutdown();
        registry::unregister(&self.0.config.instance_name);
        Ok(())
    }

    // -- scheduling ---------------------------------------------------------

    /// Stores `job` and `trigger` together and returns the trigger's first
    /// computed fire time. Errs if the trigger never fires (e.g. its
    /// calendar excludes every instant it could otherwise fire on).
    pub fn schedule_job(&self, job: JobDetail, mut trigger: Trigger) -> SchedulerResult<DateTime<Utc>> {
        self.ensure_not_shutdown()?;
        let calendar = self.resolve_calendar(&trigger)?;
        if trigger.next_fire_time().is_none() {
            trigger.compute_first_fire_time(calendar.as_deref());
        }
        let first_fire = trigger
            .next_fire_time()
            .ok_or_else(|| SchedulerError::IllegalArgumentError("trigger will never fire".to_string()))?;
        let notify = trigger.clone();
        self.0.store.store_job_and_trigger(job, trigger)?;
        self.0.listeners.notify_job_scheduled(&notify);
        self.signal(Some(first_fire));
        Ok(first_fire)
    }

    /// Schedules `trigger` against a job that already exists in the store.
    pub fn schedule_trigger(&self, mut trigger: Trigger) -> SchedulerResult<DateTime<Utc>> {
        self.ensure_not_shutdown()?;
        if !self.0.store.check_job_exists(trigger.job_key())? {
            return Err(SchedulerError::JobNotFoundError(trigger.job_key().clone()));
        }
        let calendar = self.resolve_calendar(&trigger)?;
        if trigger.next_fire_time().is_none() {
            trigger.compute_first_fire_time(calendar.as_deref());
        }
        let first_fire = trigger
            .next_fire_time()
            .ok_or_else(|| SchedulerError::IllegalArgumentError("trigger will never fire".to_string()))?;
        let notify = trigger.clone();
        self.0.store.store_trigger(trigger, false)?;
        self.0.listeners.notify_job_scheduled(&notify);
        self.signal(Some(first_fire));
        Ok(first_fire)
    }

    fn resolve_calendar(&self, trigger: &Trigger) -> SchedulerResult<Option<Arc<dyn Calendar>>> {
        match &trigger.core().calendar_name {
            Some(name) => self.0.store.get_calendar(name),
            None => Ok(None),
        }
    }

    /// `storeNonDurableWhileAwaitingScheduling`: lets a non-durable job be
    /// added ahead of the trigger that will reference it, instead of
    /// rejecting it outright for having no trigger yet.
    pub fn add_job(&self, job: JobDetail, replace: bool, store_non_durable_while_awaiting_scheduling: bool) -> SchedulerResult<()> {
        self.ensure_not_shutdown()?;
        if !job.durable && !store_non_durable_while_awaiting_scheduling {
            return Err(SchedulerError::IllegalArgumentError(
                "non-durable jobs must be stored with a trigger, or storeNonDurableWhileAwaitingScheduling must be set".to_string(),
            ));
        }
        self.0.store.store_job(job, replace)
    }

    pub fn delete_job(&self, key: &JobKey) -> SchedulerResult<bool> {
        self.0.store.remove_job(key)
    }

    pub fn delete_jobs(&self, keys: &[JobKey]) -> SchedulerResult<bool> {
        let mut any = false;
        for key in keys {
            if self.0.store.remove_job(key)? {
                any = true;
            }
        }
        Ok(any)
    }

    pub fn unschedule_job(&self, key: &TriggerKey) -> SchedulerResult<bool> {
        self.0.store.remove_trigger(key)
    }

    pub fn unschedule_jobs(&self, keys: &[TriggerKey]) -> SchedulerResult<bool> {
        let mut any = false;
        for key in keys {
            if self.0.store.remove_trigger(key)? {
                any = true;
            }
        }
        Ok(any)
    }

    /// Atomically replaces the trigger at `key` with `new_trigger`, returning
    /// its newly computed first fire time, or `None` if `key` did not exist.
    pub fn reschedule_job(&self, key: &TriggerKey, mut new_trigger: Trigger) -> SchedulerResult<Option<DateTime<Utc>>> {
        self.ensure_not_shutdown()?;
        let calendar = self.resolve_calendar(&new_trigger)?;
        if new_trigger.next_fire_time().is_none() {
            new_trigger.compute_first_fire_time(calendar.as_deref());
        }
        let next_fire = new_trigger.next_fire_time();
        let replaced = self.0.store.replace_trigger(key, new_trigger)?;
        if !replaced {
            return Ok(None);
        }
        self.signal(next_fire);
        Ok(next_fire)
    }

    /// Fires `job_key` once, immediately, bypassing the normal acquire/fire
    /// protocol and the trigger it would otherwise require. `data`, if
    /// given, overrides the job's stored data map for this one run only.
    pub fn trigger_job(&self, job_key: &JobKey, data: Option<JobDataMap>) -> SchedulerResult<()> {
        self.ensure_not_shutdown()?;
        let mut job = self
            .0
            .store
            .retrieve_job(job_key)?
            .ok_or_else(|| SchedulerError::JobNotFoundError(job_key.clone()))?;
        if let Some(data) = data {
            job.data_map = data;
        }

        let now = self.0.clock.now();
        let mut core = TriggerCore::new(TriggerKey::with_group(format!("MANUAL-{}", Uuid::new_v4()), job_key.group.clone()), job_key.clone(), now);
        core.next_fire_time = Some(now);
        let trigger = Trigger::Simple(SimpleTrigger {
            core,
            repeat_count: 0,
            repeat_interval: chrono::Duration::zero(),
            times_triggered: 0,
            misfire_instruction: SimpleMisfireInstruction::FireNow,
        });

        let bundle = TriggerFiredBundle {
            job_detail: job,
            trigger,
            calendar_name: None,
            is_recovering: false,
            recovering_trigger_key: None,
            fire_time: now,
            scheduled_fire_time: now,
            previous_fire_time: None,
            next_fire_time: None,
        };

        let store = self.0.store.clone();
        let factory = self.0.job_factory.lock().clone();
        let listeners = self.0.listeners.clone();
        let submitted = self.0.pool.run_in_thread(Box::new(move || {
            let shell = JobRunShell::new(factory, listeners);
            let _ = shell.run(store.as_ref(), bundle);
        }));
        if !submitted {
            return Err(SchedulerError::SchedulerConfigError("worker pool rejected manual trigger".to_string()));
        }
        Ok(())
    }

    // -- pause/resume -------------------------------------------------------

    pub fn pause_job(&self, key: &JobKey) -> SchedulerResult<()> {
        self.0.store.pause_job(key)
    }

    pub fn pause_job_group(&self, matcher: &Matcher) -> SchedulerResult<Vec<String>> {
        self.0.store.pause_job_group(matcher)
    }

    pub fn pause_trigger(&self, key: &TriggerKey) -> SchedulerResult<()> {
        self.0.store.pause_trigger(key)
    }

    pub fn pause_trigger_group(&self, matcher: &Matcher) -> SchedulerResult<Vec<String>> {
        self.0.store.pause_trigger_group(matcher)
    }

    pub fn resume_job(&self, key: &JobKey) -> SchedulerResult<()> {
        let result = self.0.store.resume_job(key);
        self.signal(None);
        result
    }

    pub fn resume_job_group(&self, matcher: &Matcher) -> SchedulerResult<Vec<String>> {
        let result = self.0.store.resume_job_group(matcher)?;
        self.signal(None);
        Ok(result)
    }

    pub fn resume_trigger(&self, key: &TriggerKey) -> SchedulerResult<()> {
        let result = self.0.store.resume_trigger(key);
        self.signal(None);
        result
    }

    pub fn resume_trigger_group(&self, matcher: &Matcher) -> SchedulerResult<Vec<String>> {
        let result = self.0.store.resume_trigger_group(matcher)?;
        self.signal(None);
        Ok(result)
    }

    pub fn pause_all(&self) -> SchedulerResult<()> {
        self.0.store.pause_all()
    }

    pub fn resume_all(&self) -> SchedulerResult<()> {
        let result = self.0.store.resume_all();
        self.signal(None);
        result
    }

    /// Wipes every job, trigger, and calendar. Refuses while the dispatcher
    /// is running to avoid racing an in-flight acquisition.
    pub fn clear(&self) -> SchedulerResult<()> {
        if self.is_started() {
            return Err(SchedulerError::SchedulerConfigError(
                "clear() requires the scheduler to be in standby".to_string(),
            ));
        }
        self.0.store.clear_all_scheduling_data()?;
        self.0.listeners.notify_scheduling_data_cleared();
        Ok(())
    }

    // -- execution introspection ---------------------------------------------

    pub fn get_currently_executing_jobs(&self) -> Vec<JobExecutionContext> {
        self.0.executing.lock().values().cloned().collect()
    }

    /// Best-effort: records that interruption was requested for the target
    /// if it is currently executing. Does not itself stop the running
    /// thread — Rust has no safe preemptive thread cancellation — a job
    /// that wants to honor this must poll for it itself (not modeled here,
    /// since no job in this crate does).
    pub fn interrupt(&self, target: InterruptTarget) -> SchedulerResult<()> {
        let executing = self.0.executing.lock();
        let found = match &target {
            InterruptTarget::Job(job_key) => executing.values().any(|ctx| &ctx.job_key == job_key),
            InterruptTarget::FireInstance(id) => executing.contains_key(id),
        };
        if found {
            Ok(())
        } else {
            let job_key = match target {
                InterruptTarget::Job(job_key) => job_key,
                InterruptTarget::FireInstance(id) => JobKey::new(id),
            };
            Err(SchedulerError::UnableToInterruptJobError(job_key))
        }
    }

    // -- queries ------------------------------------------------------------

    pub fn check_job_exists(&self, key: &JobKey) -> SchedulerResult<bool> {
        self.0.store.check_job_exists(key)
    }

    pub fn check_trigger_exists(&self, key: &TriggerKey) -> SchedulerResult<bool> {
        self.0.store.check_trigger_exists(key)
    }

    pub fn get_job_detail(&self, key: &JobKey) -> SchedulerResult<Option<JobDetail>> {
        self.0.store.retrieve_job(key)
    }

    pub fn get_trigger(&self, key: &TriggerKey) -> SchedulerResult<Option<Trigger>> {
        self.0.store.retrieve_trigger(key)
    }

    pub fn get_trigger_state(&self, key: &TriggerKey) -> SchedulerResult<TriggerState> {
        self.0.store.get_trigger_state(key)
    }

    pub fn get_job_keys(&self, matcher: &Matcher) -> SchedulerResult<Vec<JobKey>> {
        self.0.store.get_job_keys(matcher)
    }

    pub fn get_trigger_keys(&self, matcher: &Matcher) -> SchedulerResult<Vec<TriggerKey>> {
        self.0.store.get_trigger_keys(matcher)
    }

    pub fn get_job_group_names(&self) -> SchedulerResult<Vec<String>> {
        let groups: HashSet<String> = self.0.store.get_job_keys(&Matcher::Any)?.into_iter().map(|k| k.group).collect();
        Ok(groups.into_iter().collect())
    }

    pub fn get_trigger_group_names(&self) -> SchedulerResult<Vec<String>> {
        let groups: HashSet<String> = self.0.store.get_trigger_keys(&Matcher::Any)?.into_iter().map(|k| k.group).collect();
        Ok(groups.into_iter().collect())
    }

    pub fn get_triggers_of_job(&self, key: &JobKey) -> SchedulerResult<Vec<Trigger>> {
        self.0.store.get_triggers_for_job(key)
    }

    // -- calendars ------------------------------------------------------------

    pub fn add_calendar(&self, name: &str, calendar: Arc<dyn Calendar>, replace: bool, update_triggers: bool) -> SchedulerResult<()> {
        self.0.store.store_calendar(name, calendar, replace, update_triggers)
    }

    pub fn delete_calendar(&self, name: &str) -> SchedulerResult<bool> {
        self.0.store.remove_calendar(name)
    }

    pub fn get_calendar(&self, name: &str) -> SchedulerResult<Option<Arc<dyn Calendar>>> {
        self.0.store.get_calendar(name)
    }

    pub fn get_calendar_names(&self) -> SchedulerResult<Vec<String>> {
        self.0.store.get_calendar_names()
    }

    // -- configuration --------------------------------------------------------

    pub fn set_job_factory(&self, factory: Arc<dyn JobFactory>) {
        *self.0.job_factory.lock() = factory;
    }

    pub fn get_listener_manager(&self) -> Arc<ListenerManager> {
        self.0.listeners.clone()
    }

    pub fn instance_name(&self) -> &str {
        &self.0.config.instance_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::trigger::Trigger as TriggerEnum;
    use crate::infrastructure::{FakeClock, InMemoryJobStore};
    use crate::scheduler::job_factory::FnJobFactory;
    use crate::Job;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    fn new_scheduler(name: &str) -> (JobScheduler, Arc<FakeClock>) {
        let clock = Arc::new(FakeClock::new(Utc::now()));
        let store = Arc::new(InMemoryJobStore::new(clock.clone()));
        let factory = Arc::new(FnJobFactory::new());
        let scheduler = JobScheduler::new(store, factory, clock.clone(), SchedulerConfig::default().instance_name(name).thread_count(1))
            .expect("construction should succeed");
        (scheduler, clock)
    }

    #[test]
    fn schedule_job_returns_first_fire_time() {
        let (scheduler, clock) = new_scheduler("facade-schedule");
        let job = JobDetail::new(JobKey::new("j1"), "noop").durable(true);
        let trigger = TriggerEnum::Simple(SimpleTrigger {
            core: TriggerCore::new(TriggerKey::new("t1"), JobKey::new("j1"), clock.now()),
            repeat_count: 0,
            repeat_interval: chrono::Duration::seconds(1),
            times_triggered: 0,
            misfire_instruction: SimpleMisfireInstruction::FireNow,
        });
        let first_fire = scheduler.schedule_job(job, trigger).unwrap();
        assert_eq!(first_fire, clock.now());
        scheduler.shutdown(true).unwrap();
    }

    #[test]
    fn add_job_rejects_non_durable_without_flag() {
        let (scheduler, _clock) = new_scheduler("facade-add-job-rejects");
        let job = JobDetail::new(JobKey::new("j2"), "noop");
        let err = scheduler.add_job(job, false, false);
        assert!(matches!(err, Err(SchedulerError::IllegalArgumentError(_))));
        scheduler.shutdown(true).unwrap();
    }

    #[test]
    fn trigger_job_executes_without_a_stored_trigger() {
        let clock = Arc::new(FakeClock::new(Utc::now()));
        let store = Arc::new(InMemoryJobStore::new(clock.clone()));
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();

        struct CountingJob(Arc<AtomicUsize>);
        impl Job for CountingJob {
            fn execute(&mut self, _ctx: &mut JobExecutionContext) -> anyhow::Result<JobExecutionOutcome> {
                self.0.fetch_add(1, AtomicOrdering::SeqCst);
                Ok(JobExecutionOutcome::default())
            }
        }

        let factory = Arc::new(FnJobFactory::new().register("counting", move || Box::new(CountingJob(c.clone())) as Box<dyn Job>));
        let scheduler = JobScheduler::new(store.clone(), factory, clock, SchedulerConfig::default().instance_name("facade-trigger-job").thread_count(1)).unwrap();
        store.store_job(JobDetail::new(JobKey::new("j3"), "counting").durable(true), false).unwrap();

        scheduler.trigger_job(&JobKey::new("j3"), None).unwrap();
        thread::sleep(Duration::from_millis(100));
        assert_eq!(counter.load(AtomicOrdering::SeqCst), 1);
        scheduler.shutdown(true).unwrap();
    }

    #[test]
    fn shutdown_is_idempotent_and_frees_the_registry_name() {
        let (scheduler, _clock) = new_scheduler("facade-shutdown");
        scheduler.shutdown(true).unwrap();
        scheduler.shutdown(true).unwrap();
        assert!(registry::lookup("facade-shutdown").is_none());
    }

    #[test]
    fn operations_after_shutdown_are_rejected() {
        let (scheduler, _clock) = new_scheduler("facade-post-shutdown");
        scheduler.shutdown(true).unwrap();
        let job = JobDetail::new(JobKey::new("j4"), "noop").durable(true);
        let trigger = TriggerEnum::Simple(SimpleTrigger {
            core: TriggerCore::new(TriggerKey::new("t4"), JobKey::new("j4"), Utc::now()),
            repeat_count: 0,
            repeat_interval: chrono::Duration::seconds(1),
            times_triggered: 0,
            misfire_instruction: SimpleMisfireInstruction::FireNow,
        });
        assert!(matches!(scheduler.schedule_job(job, trigger), Err(SchedulerError::SchedulerShutdownError)));
    }
}
