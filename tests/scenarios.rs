//! End-to-end scenarios run against the full `JobStore` firing protocol
//! (acquire → fire → complete) driven by a `FakeClock`, rather than against
//! the cron engine or trigger state machine in isolation.

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration as ChronoDuration, TimeZone, Utc};

use jobweaver::domain::entities::context::JobExecutionContext;
use jobweaver::domain::entities::identity::{JobKey, TriggerKey};
use jobweaver::domain::entities::job::{Job, JobDetail, JobExecutionOutcome};
use jobweaver::domain::entities::trigger::{
    CronMisfireInstruction, CronTrigger, SimpleMisfireInstruction, SimpleTrigger, Trigger, TriggerCore, TriggerState,
};
use jobweaver::domain::store::JobStore;
use jobweaver::domain::value_objects::CompletionInstruction;
use jobweaver::infrastructure::{FakeClock, InMemoryJobStore};
use jobweaver::scheduler::{FnJobFactory, JobFactory, JobScheduler, SchedulerConfig};

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

/// Acquires, fires, and completes everything currently due, returning the
/// fired bundles in acquisition order. Mirrors one dispatcher tick without
/// spinning up worker threads.
fn fire_due(store: &InMemoryJobStore, no_later_than: chrono::DateTime<Utc>) -> Vec<jobweaver::domain::value_objects::TriggerFiredBundle> {
    let acquired = store.acquire_next_triggers(no_later_than, 16, ChronoDuration::zero()).unwrap();
    let keys: Vec<TriggerKey> = acquired.iter().map(|t| t.key().clone()).collect();
    store
        .triggers_fired(&keys)
        .unwrap()
        .into_iter()
        .flatten()
        .collect()
}

// 1. Daily cron: `0 0 12 * * ?` from 2024-01-01T00:00:00Z fires at noon on
// each of the first three days.
#[test]
fn scenario_daily_cron_fires_at_noon_three_days_running() {
    let clock = Arc::new(FakeClock::new(utc(2024, 1, 1, 0, 0, 0)));
    let store = InMemoryJobStore::new(clock.clone());
    let job = JobDetail::new(JobKey::new("daily"), "noop").durable(true);
    store.store_job(job.clone(), false).unwrap();

    let core = TriggerCore::new(TriggerKey::new("daily-t"), job.key.clone(), utc(2024, 1, 1, 0, 0, 0));
    let cron_expression = "0 0 12 * * ?".parse().unwrap();
    let mut trigger = Trigger::Cron(CronTrigger {
        core,
        cron_expression,
        time_zone: chrono_tz::UTC,
        misfire_instruction: CronMisfireInstruction::FireOnceNow,
    });
    trigger.compute_first_fire_time(None);
    store.store_trigger(trigger, false).unwrap();

    let expected = [
        utc(2024, 1, 1, 12, 0, 0),
        utc(2024, 1, 2, 12, 0, 0),
        utc(2024, 1, 3, 12, 0, 0),
    ];
    for fire_time in expected {
        clock.set(fire_time);
        let fired = fire_due(&store, fire_time);
        assert_eq!(fired.len(), 1, "expected exactly one fire at {fire_time}");
        assert_eq!(fired[0].scheduled_fire_time, fire_time);
        store.triggered_job_complete(&TriggerKey::new("daily-t"), &job, CompletionInstruction::Noop).unwrap();
    }
}

// 2. Weekday cron: `0 15 10 ? * MON-FRI` from a Saturday fires first on the
// following Monday.
#[test]
fn scenario_weekday_cron_skips_the_weekend() {
    let clock = Arc::new(FakeClock::new(utc(2024, 6, 1, 0, 0, 0)));
    let store = InMemoryJobStore::new(clock.clone());
    let job = JobDetail::new(JobKey::new("weekday"), "noop").durable(true);
    store.store_job(job.clone(), false).unwrap();

    let core = TriggerCore::new(TriggerKey::new("weekday-t"), job.key.clone(), utc(2024, 6, 1, 0, 0, 0));
    let cron_expression = "0 15 10 ? * MON-FRI".parse().unwrap();
    let mut trigger = Trigger::Cron(CronTrigger {
        core,
        cron_expression,
        time_zone: chrono_tz::UTC,
        misfire_instruction: CronMisfireInstruction::FireOnceNow,
    });
    trigger.compute_first_fire_time(None);
    assert_eq!(trigger.next_fire_time(), Some(utc(2024, 6, 3, 10, 15, 0)));

    store.store_trigger(trigger, false).unwrap();
    clock.set(utc(2024, 6, 3, 10, 15, 0));
    let fired = fire_due(&store, utc(2024, 6, 3, 10, 15, 0));
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].scheduled_fire_time, utc(2024, 6, 3, 10, 15, 0));
}

// 3. Nth-day: `0 15 10 ? * 6#3` (3rd Friday) fires on the 3rd Friday of
// January, February, and March 2024.
#[test]
fn scenario_third_friday_of_the_month() {
    let clock = Arc::new(FakeClock::new(utc(2024, 1, 1, 0, 0, 0)));
    let store = InMemoryJobStore::new(clock.clone());
    let job = JobDetail::new(JobKey::new("nth"), "noop").durable(true);
    store.store_job(job.clone(), false).unwrap();

    let core = TriggerCore::new(TriggerKey::new("nth-t"), job.key.clone(), utc(2024, 1, 1, 0, 0, 0));
    let cron_expression = "0 15 10 ? * 6#3".parse().unwrap();
    let mut trigger = Trigger::Cron(CronTrigger {
        core,
        cron_expression,
        time_zone: chrono_tz::UTC,
        misfire_instruction: CronMisfireInstruction::FireOnceNow,
    });
    trigger.compute_first_fire_time(None);
    store.store_trigger(trigger, false).unwrap();

    let expected = [
        utc(2024, 1, 19, 10, 15, 0),
        utc(2024, 2, 16, 10, 15, 0),
        utc(2024, 3, 15, 10, 15, 0),
    ];
    for fire_time in expected {
        clock.set(fire_time);
        let fired = fire_due(&store, fire_time);
        assert_eq!(fired.len(), 1, "expected exactly one fire at {fire_time}");
        store.triggered_job_complete(&TriggerKey::new("nth-t"), &job, CompletionInstruction::Noop).unwrap();
    }
}

// 4. Simple repeat: repeatCount = 4 fires 5 times (+0, +60, +120, +180,
// +240s) then a 6th acquisition returns nothing and the trigger is COMPLETE.
#[test]
fn scenario_simple_repeat_fires_five_times_then_completes() {
    let start = utc(2024, 1, 1, 0, 0, 0);
    let clock = Arc::new(FakeClock::new(start));
    let store = InMemoryJobStore::new(clock.clone());
    let job = JobDetail::new(JobKey::new("repeat"), "noop").durable(true);
    store.store_job(job.clone(), false).unwrap();

    let core = TriggerCore::new(TriggerKey::new("repeat-t"), job.key.clone(), start);
    let trigger = Trigger::Simple(SimpleTrigger {
        core,
        repeat_count: 4,
        repeat_interval: ChronoDuration::seconds(60),
        times_triggered: 0,
        misfire_instruction: SimpleMisfireInstruction::FireNow,
    });
    store.store_trigger(trigger, false).unwrap();

    for i in 0..5 {
        let fire_time = start + ChronoDuration::seconds(60 * i);
        clock.set(fire_time);
        let fired = fire_due(&store, fire_time);
        assert_eq!(fired.len(), 1, "expected fire #{i}");
        store.triggered_job_complete(&TriggerKey::new("repeat-t"), &job, CompletionInstruction::Noop).unwrap();
    }

    clock.set(start + ChronoDuration::seconds(300));
    let sixth = fire_due(&store, start + ChronoDuration::seconds(300));
    assert!(sixth.is_empty());
    assert_eq!(store.get_trigger_state(&TriggerKey::new("repeat-t")).unwrap(), TriggerState::Complete);
}

// 5. Misfire FIRE_ONCE_NOW: an hourly cron that the dispatcher wakes up to
// late fires exactly once, at the wake-up time, and resumes its normal
// schedule from there rather than replaying every missed hour.
#[test]
fn scenario_misfire_fire_once_now_fires_a_single_catch_up() {
    let start = utc(2024, 1, 1, 0, 0, 0);
    let clock = Arc::new(FakeClock::new(start));
    let store = InMemoryJobStore::new(clock.clone());
    let job = JobDetail::new(JobKey::new("hourly"), "noop").durable(true);
    store.store_job(job.clone(), false).unwrap();

    let core = TriggerCore::new(TriggerKey::new("hourly-t"), job.key.clone(), start);
    let cron_expression = "0 0 * * * ?".parse().unwrap();
    let mut trigger = Trigger::Cron(CronTrigger {
        core,
        cron_expression,
        time_zone: chrono_tz::UTC,
        misfire_instruction: CronMisfireInstruction::FireOnceNow,
    });
    trigger.compute_first_fire_time(None);
    assert_eq!(trigger.next_fire_time(), Some(utc(2024, 1, 1, 1, 0, 0)));
    store.store_trigger(trigger, false).unwrap();

    // Dispatcher does not wake until 03:05 — the 01:00 fire is > 60s late.
    clock.set(utc(2024, 1, 1, 3, 5, 0));
    let fired = fire_due(&store, utc(2024, 1, 1, 3, 5, 0));
    assert_eq!(fired.len(), 1, "exactly one catch-up fire, not one per missed hour");
    assert_eq!(fired[0].fire_time, utc(2024, 1, 1, 3, 5, 0));
    store.triggered_job_complete(&TriggerKey::new("hourly-t"), &job, CompletionInstruction::Noop).unwrap();

    let trigger = store.retrieve_trigger(&TriggerKey::new("hourly-t")).unwrap().unwrap();
    assert_eq!(trigger.next_fire_time(), Some(utc(2024, 1, 1, 4, 0, 0)));

    // No second fire shows up at the next tick.
    let second = fire_due(&store, utc(2024, 1, 1, 3, 6, 0));
    assert!(second.is_empty());
}

// 6. Disallow concurrent execution: two triggers on one such job fire at
// the same instant; only one executes, the other is BLOCKED, and it comes
// back to WAITING once the first trigger's run completes.
#[test]
fn scenario_disallow_concurrent_execution_blocks_the_sibling_trigger() {
    let start = utc(2024, 1, 1, 0, 0, 0);
    let clock = Arc::new(FakeClock::new(start));
    let store = InMemoryJobStore::new(clock.clone());
    let job = JobDetail::new(JobKey::new("exclusive"), "noop").durable(true).disallow_concurrent_execution(true);
    store.store_job(job.clone(), false).unwrap();

    for name in ["t1", "t2"] {
        let core = TriggerCore::new(TriggerKey::new(name), job.key.clone(), start);
        let trigger = Trigger::Simple(SimpleTrigger {
            core,
            repeat_count: 0,
            repeat_interval: ChronoDuration::seconds(60),
            times_triggered: 0,
            misfire_instruction: SimpleMisfireInstruction::FireNow,
        });
        store.store_trigger(trigger, false).unwrap();
    }

    let acquired = store.acquire_next_triggers(start, 16, ChronoDuration::zero()).unwrap();
    assert_eq!(acquired.len(), 2);
    let keys: Vec<TriggerKey> = acquired.iter().map(|t| t.key().clone()).collect();
    let fired: Vec<_> = store.triggers_fired(&keys).unwrap().into_iter().flatten().collect();
    assert_eq!(fired.len(), 2, "the store hands back a bundle for both; blocking is about sibling state, not suppression");

    let states: Vec<TriggerState> = keys.iter().map(|k| store.get_trigger_state(k).unwrap()).collect();
    assert_eq!(states.iter().filter(|s| **s == TriggerState::Executing).count(), 1);
    assert_eq!(states.iter().filter(|s| **s == TriggerState::Blocked).count(), 1);

    let executing_key = keys[states.iter().position(|s| *s == TriggerState::Executing).unwrap()].clone();
    store.triggered_job_complete(&executing_key, &job, CompletionInstruction::Noop).unwrap();

    let blocked_key = keys.iter().find(|k| **k != executing_key).unwrap();
    assert_eq!(store.get_trigger_state(blocked_key).unwrap(), TriggerState::Waiting);
}

// 7. Recovery: a job requesting recovery is left ACQUIRED/EXECUTING by a
// simulated crash; `initialize()` reports it for recovery and resets it to
// WAITING so the store never gets stuck with an orphaned in-flight trigger.
#[test]
fn scenario_recovery_reports_orphaned_trigger_and_resets_its_state() {
    let clock = Arc::new(FakeClock::new(utc(2024, 1, 1, 0, 0, 0)));
    let store = InMemoryJobStore::new(clock.clone());
    let job = JobDetail::new(JobKey::new("recoverable"), "noop").durable(true).requests_recovery(true);
    store.store_job(job.clone(), false).unwrap();

    let core = TriggerCore::new(TriggerKey::new("recoverable-t"), job.key.clone(), utc(2024, 1, 1, 0, 0, 0));
    let trigger = Trigger::Simple(SimpleTrigger {
        core,
        repeat_count: 0,
        repeat_interval: ChronoDuration::seconds(60),
        times_triggered: 0,
        misfire_instruction: SimpleMisfireInstruction::FireNow,
    });
    store.store_trigger(trigger, false).unwrap();

    // Simulate the dispatcher having acquired and fired the trigger, then
    // the process dying before `triggered_job_complete` is ever called.
    let acquired = store.acquire_next_triggers(utc(2024, 1, 1, 0, 0, 0), 16, ChronoDuration::zero()).unwrap();
    assert_eq!(acquired.len(), 1);
    let keys: Vec<TriggerKey> = acquired.iter().map(|t| t.key().clone()).collect();
    store.triggers_fired(&keys).unwrap();
    assert_eq!(store.get_trigger_state(&TriggerKey::new("recoverable-t")).unwrap(), TriggerState::Executing);

    let recovered = store.initialize().unwrap();
    assert_eq!(recovered.len(), 1);
    assert_eq!(recovered[0].original_trigger_key, TriggerKey::new("recoverable-t"));
    assert_eq!(recovered[0].job_key, job.key);
    assert!(recovered[0].requests_recovery);
    assert_eq!(store.get_trigger_state(&TriggerKey::new("recoverable-t")).unwrap(), TriggerState::Waiting);

    // A second initialize() call finds nothing left to recover.
    assert!(store.initialize().unwrap().is_empty());
}

// 7b. Recovery, end to end: the synthesized RECOVER-* trigger is actually
// fired through the real dispatcher and job run shell, and the delivered
// context reports isRecovering against the original trigger's identity.
#[test]
fn scenario_recovery_fires_recovered_trigger_with_recovering_context() {
    let job_class = "recoverable-end-to-end";

    let clock = Arc::new(FakeClock::new(utc(2024, 1, 1, 0, 0, 0)));
    let store = Arc::new(InMemoryJobStore::new(clock.clone()));
    let job = JobDetail::new(JobKey::new("recoverable-e2e"), job_class).durable(true).requests_recovery(true);
    store.store_job(job.clone(), false).unwrap();

    let core = TriggerCore::new(TriggerKey::new("recoverable-e2e-t"), job.key.clone(), utc(2024, 1, 1, 0, 0, 0));
    let trigger = Trigger::Simple(SimpleTrigger {
        core,
        repeat_count: 0,
        repeat_interval: ChronoDuration::seconds(60),
        times_triggered: 0,
        misfire_instruction: SimpleMisfireInstruction::FireNow,
    });
    store.store_trigger(trigger, false).unwrap();

    // Simulate the dispatcher having acquired and fired the trigger, then
    // the process dying before `triggered_job_complete` is ever called.
    let acquired = store.acquire_next_triggers(utc(2024, 1, 1, 0, 0, 0), 16, ChronoDuration::zero()).unwrap();
    assert_eq!(acquired.len(), 1);
    let keys: Vec<TriggerKey> = acquired.iter().map(|t| t.key().clone()).collect();
    store.triggers_fired(&keys).unwrap();
    assert_eq!(store.get_trigger_state(&TriggerKey::new("recoverable-e2e-t")).unwrap(), TriggerState::Executing);

    struct RecordingJob(mpsc::Sender<JobExecutionContext>);
    impl Job for RecordingJob {
        fn execute(&mut self, ctx: &mut JobExecutionContext) -> anyhow::Result<JobExecutionOutcome> {
            let _ = self.0.send(ctx.clone());
            Ok(JobExecutionOutcome::default())
        }
    }

    let (tx, rx) = mpsc::channel::<JobExecutionContext>();
    let factory: Arc<dyn JobFactory> = Arc::new(
        FnJobFactory::new().register(job_class, move || Box::new(RecordingJob(tx.clone())) as Box<dyn Job>),
    );
    let config = SchedulerConfig::default().instance_name("scenario-recovery-e2e").thread_count(1);

    // `start()` runs recovery before spinning up the dispatcher loop: the
    // orphaned trigger is reset to WAITING and a one-shot RECOVER-* trigger
    // is synthesized, due immediately on the fake clock.
    let scheduler = JobScheduler::new(store.clone(), factory, clock.clone(), config).unwrap();
    scheduler.start().unwrap();

    let delivered = rx
        .recv_timeout(StdDuration::from_secs(5))
        .expect("recovered trigger should fire through the real dispatcher within the timeout");

    scheduler.shutdown(true).unwrap();

    assert!(delivered.is_recovering);
    assert_eq!(delivered.recovering_trigger_key, Some(TriggerKey::new("recoverable-e2e-t")));
    assert_eq!(delivered.job_key, job.key);

    // Only the one recovery fire happened; no duplicate deliveries queued up.
    assert!(rx.try_recv().is_err());
}
