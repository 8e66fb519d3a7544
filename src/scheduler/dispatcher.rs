//! Scheduler dispatcher module
//!
//! The dispatcher is a single long-running task, one iteration per loop
//! (§4.4): standby gate, backoff, reserve workers, acquire, wait-until-due
//! with early-replan, fire, idle. It is the only thread that calls the
//! store's firing-protocol methods.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use parking_lot::Mutex;
use rand::Rng;
use tracing::{error, warn};

use crate::domain::entities::identity::TriggerKey;
use crate::domain::store::JobStore;
use crate::domain::value_objects::completion_instruction::CompletionInstruction;
use crate::infrastructure::clock::Clock;

use super::config::SchedulerConfig;
use super::job_factory::JobFactory;
use super::job_runshell::JobRunShell;
use super::listeners::ListenerManager;
use super::signaler::SchedulingSignaler;
use super::worker_pool::WorkerPool;

const MIN_RETRY_DELAY: Duration = Duration::from_millis(20);
const MAX_RETRY_DELAY: Duration = Duration::from_millis(600_000);
const COST_THRESHOLD_PERSISTENT: ChronoDuration = ChronoDuration::milliseconds(70);
const COST_THRESHOLD_IN_MEMORY: ChronoDuration = ChronoDuration::milliseconds(7);
const REPLAN_GRANULARITY: ChronoDuration = ChronoDuration::milliseconds(2);

pub struct Dispatcher {
    store: Arc<dyn JobStore>,
    pool: Arc<WorkerPool>,
    signaler: Arc<SchedulingSignaler>,
    listeners: Arc<ListenerManager>,
    job_factory: Arc<Mutex<Arc<dyn JobFactory>>>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
    running: AtomicBool,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn JobStore>,
        pool: Arc<WorkerPool>,
        signaler: Arc<SchedulingSignaler>,
        listeners: Arc<ListenerManager>,
        job_factory: Arc<Mutex<Arc<dyn JobFactory>>>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            pool,
            signaler,
            listeners,
            job_factory,
            clock,
            config,
            running: AtomicBool::new(false),
            handle: Mutex::new(None),
        }
    }

    /// Spawns the dispatcher thread. Idempotent: a second call while already
    /// running is a no-op.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        self.signaler.set_paused(false);
        let dispatcher = self.clone();
        let handle = thread::Builder::new()
            .name("jobweaver-dispatcher".to_string())
            .spawn(move || dispatcher.run_loop())
            .expect("failed to spawn dispatcher thread");
        *self.handle.lock() = Some(handle);
    }

    pub fn standby(&self) {
        self.signaler.set_paused(true);
    }

    pub fn resume(&self) {
        self.signaler.set_paused(false);
    }

    pub fn is_paused(&self) -> bool {
        self.signaler.is_paused()
    }

    /// Whether the dispatcher thread has been spawned (`start` called at
    /// least once).
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stops the dispatcher loop and, if `wait`, joins its thread and the
    /// worker pool's threads.
    pub fn shutdown(&self, wait: bool) {
        self.signaler.halt();
        self.pool.shutdown(wait);
        if wait {
            if let Some(handle) = self.handle.lock().take() {
                let _ = handle.join();
            }
        }
    }

    fn run_loop(&self) {
        let mut failures: u32 = 0;
        loop {
            if self.signaler.is_halted() {
                return;
            }
            if self.signaler.is_paused() {
                self.signaler.wait_timeout(Duration::from_secs(1));
                failures = 0;
                continue;
            }
            self.tick(&mut failures);
        }
    }

    /// Runs steps 2-7 of one dispatcher cycle. Step 1 (standby gate) and the
    /// halt check live in `run_loop` since they gate whether `tick` runs at
    /// all.
    fn tick(&self, failures: &mut u32) {
        if *failures > 0 {
            let delay = self.store.get_acquire_retry_delay(*failures).clamp(MIN_RETRY_DELAY, MAX_RETRY_DELAY);
            thread::sleep(delay);
        }

        let workers_available = self.pool.block_for_available_threads();
        let max_count = workers_available.min(self.config.batch_trigger_acquisition_max_count).max(1);
        let now = self.clock.now();
        let window = to_chrono(self.config.batch_trigger_acquisition_fire_ahead_time_window);
        let no_later_than = now + to_chrono(self.config.idle_wait_time);

        let batch = match self.store.acquire_next_triggers(no_later_than, max_count, window) {
            Ok(batch) => {
                *failures = 0;
                batch
            }
            Err(err) => {
                *failures += 1;
                warn!(error = %err, failures = *failures, "trigger acquisition failed, backing off");
                return;
            }
        };

        if batch.is_empty() {
            self.signaler.wait_timeout(randomized_idle(self.config.idle_wait_time));
            return;
        }

        let first_fire = match batch[0].next_fire_time() {
            Some(t) => t,
            None => {
                for trigger in &batch {
                    let _ = self.store.release_acquired_trigger(trigger.key());
                }
                return;
            }
        };

        loop {
            let now = self.clock.now();
            if first_fire - now <= REPLAN_GRANULARITY {
                break;
            }
            match self.signaler.clear_signaled_scheduling_change() {
                Some(candidate) => {
                    let now = self.clock.now();
                    let cost_threshold = if self.store.supports_persistence() {
                        COST_THRESHOLD_PERSISTENT
                    } else {
                        COST_THRESHOLD_IN_MEMORY
                    };
                    let candidate_is_earlier = candidate.map(|c| c < first_fire).unwrap_or(true);
                    if candidate_is_earlier && first_fire - now >= cost_threshold {
                        for trigger in &batch {
                            let _ = self.store.release_acquired_trigger(trigger.key());
                        }
                        return;
                    }
                }
                None => {
                    self.signaler.wait_until(first_fire, || self.clock.now());
                }
            }
        }

        self.fire(batch);
    }

    fn fire(&self, batch: Vec<crate::domain::entities::trigger::Trigger>) {
        let keys: Vec<TriggerKey> = batch.iter().map(|t| t.key().clone()).collect();
        let results = match self.store.triggers_fired(&keys) {
            Ok(results) => results,
            Err(err) => {
                warn!(error = %err, "triggers_fired failed, releasing batch");
                for key in &keys {
                    let _ = self.store.release_acquired_trigger(key);
                }
                return;
            }
        };

        for (key, result) in keys.into_iter().zip(results) {
            match result {
                Some(bundle) => {
                    let job_detail_fallback = bundle.job_detail.clone();
                    let store = self.store.clone();
                    let factory = self.job_factory.lock().clone();
                    let run_shell = JobRunShell::new(factory, self.listeners.clone());
                    let key_for_log = key.clone();
                    let submitted = self.pool.run_in_thread(Box::new(move || {
                        if let Err(err) = run_shell.run(store.as_ref(), bundle) {
                            error!(trigger = %key_for_log, error = %err, "job run shell failed");
                        }
                    }));
                    if !submitted {
                        error!(trigger = %key, "pool submission failed, marking all of this job's triggers errored");
                        let _ = self.store.triggered_job_complete(
                            &key,
                            &job_detail_fallback,
                            CompletionInstruction::SetAllJobTriggersError,
                        );
                    }
                }
                None => {
                    let _ = self.store.release_acquired_trigger(&key);
                }
            }
        }
    }
}

fn to_chrono(d: Duration) -> ChronoDuration {
    ChronoDuration::from_std(d).unwrap_or(ChronoDuration::zero())
}

/// `idleWaitTime − uniform[0, 0.2·idleWaitTime]` (§4.4 step 7).
fn randomized_idle(idle_wait_time: Duration) -> Duration {
    let shrink: f64 = rand::thread_rng().gen_range(0.0..=0.2);
    idle_wait_time.mul_f64(1.0 - shrink)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn randomized_idle_stays_within_bounds() {
        let idle = Duration::from_secs(30);
        for _ in 0..50 {
            let actual = randomized_idle(idle);
            assert!(actual <= idle);
            assert!(actual >= idle.mul_f64(0.8));
        }
    }

    #[test]
    fn to_chrono_converts_std_duration() {
        assert_eq!(to_chrono(Duration::from_millis(500)), ChronoDuration::milliseconds(500));
    }
}
