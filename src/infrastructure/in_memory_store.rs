//! Reference in-memory job store module
//!
//! The only `JobStore` implementation this crate ships (a SQL-backed store
//! is explicitly out of scope). Guarded by a single `parking_lot::Mutex`
//! around its maps, the same `Arc<Mutex<_>>` style used for the repository
//! layer elsewhere in this crate.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::domain::entities::calendar::Calendar;
use crate::domain::entities::identity::{JobKey, Matcher, TriggerKey};
use crate::domain::entities::job::JobDetail;
use crate::domain::entities::trigger::{Trigger, TriggerState};
use crate::domain::store::{JobStore, RecoveredTrigger};
use crate::domain::value_objects::completion_instruction::CompletionInstruction;
use crate::domain::value_objects::fired_bundle::TriggerFiredBundle;
use crate::error::{SchedulerError, SchedulerResult};
use crate::infrastructure::clock::Clock;

const DEFAULT_MISFIRE_THRESHOLD_SECS: i64 = 60;

struct Tables {
    jobs: HashMap<JobKey, JobDetail>,
    triggers: HashMap<TriggerKey, Trigger>,
    calendars: HashMap<String, Arc<dyn Calendar>>,
    paused_trigger_groups: HashSet<String>,
    paused_job_groups: HashSet<String>,
    /// Count of currently-`EXECUTING` triggers per disallow-concurrent job,
    /// used to know when the last sibling finishes and blocked triggers can
    /// unblock.
    executing_counts: HashMap<JobKey, u32>,
}

impl Tables {
    fn new() -> Self {
        Self {
            jobs: HashMap::new(),
            triggers: HashMap::new(),
            calendars: HashMap::new(),
            paused_trigger_groups: HashSet::new(),
            paused_job_groups: HashSet::new(),
            executing_counts: HashMap::new(),
        }
    }

    /// Deletes `key`'s job if it is not durable and no trigger references
    /// it any more (§3 "Lifecycles").
    fn cleanup_orphan_job(&mut self, key: &JobKey) {
        let has_trigger = self.triggers.values().any(|t| t.job_key() == key);
        if has_trigger {
            return;
        }
        if let Some(job) = self.jobs.get(key) {
            if !job.durable {
                self.jobs.remove(key);
            }
        }
    }

    fn sibling_keys(&self, job_key: &JobKey, exclude: &TriggerKey) -> Vec<TriggerKey> {
        self.triggers
            .values()
            .filter(|t| t.job_key() == job_key && t.key() != exclude)
            .map(|t| t.key().clone())
            .collect()
    }
}

pub struct InMemoryJobStore {
    clock: Arc<dyn Clock>,
    misfire_threshold: ChronoDuration,
    tables: Mutex<Tables>,
}

impl InMemoryJobStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            misfire_threshold: ChronoDuration::seconds(DEFAULT_MISFIRE_THRESHOLD_SECS),
            tables: Mutex::new(Tables::new()),
        }
    }

    pub fn with_misfire_threshold(mut self, threshold: ChronoDuration) -> Self {
        self.misfire_threshold = threshold;
        self
    }

    fn is_misfired(&self, trigger: &Trigger, now: DateTime<Utc>) -> bool {
        match trigger.next_fire_time() {
            Some(next) => now - next > self.misfire_threshold,
            None => false,
        }
    }
}

impl JobStore for InMemoryJobStore {
    fn initialize(&self) -> SchedulerResult<Vec<RecoveredTrigger>> {
        let mut tables = self.tables.lock();
        let mut recovered = Vec::new();
        let orphaned: Vec<TriggerKey> = tables
            .triggers
            .values()
            .filter(|t| matches!(t.state(), TriggerState::Acquired | TriggerState::Executing))
            .map(|t| t.key().clone())
            .collect();

        for key in orphaned {
            let job_key = tables.triggers[&key].job_key().clone();
            let requests_recovery = tables.jobs.get(&job_key).map(|j| j.requests_recovery).unwrap_or(false);
            if let Some(trigger) = tables.triggers.get_mut(&key) {
                trigger.set_state(TriggerState::Waiting);
            }
            if requests_recovery {
                recovered.push(RecoveredTrigger {
                    original_trigger_key: key,
                    job_key,
                    requests_recovery,
                });
            }
        }
        debug!(recovered = recovered.len(), "store initialized, recovery scan complete");
        Ok(recovered)
    }

    fn store_job(&self, job: JobDetail, replace_existing: bool) -> SchedulerResult<()> {
        let mut tables = self.tables.lock();
        if !replace_existing && tables.jobs.contains_key(&job.key) {
            return Err(SchedulerError::ObjectAlreadyExistsError(job.key.to_string()));
        }
        tables.jobs.insert(job.key.clone(), job);
        Ok(())
    }

    fn store_trigger(&self, mut trigger: Trigger, replace_existing: bool) -> SchedulerResult<()> {
        let mut tables = self.tables.lock();
        if !replace_existing && tables.triggers.contains_key(trigger.key()) {
            return Err(SchedulerError::ObjectAlreadyExistsError(trigger.key().to_string()));
        }
        if trigger.next_fire_time().is_none() {
            let calendar = trigger
                .core()
                .calendar_name
                .as_ref()
                .and_then(|name| tables.calendars.get(name))
                .cloned();
            trigger.compute_first_fire_time(calendar.as_deref());
        }
        let group_paused = tables.paused_trigger_groups.contains(&trigger.key().group)
            || tables.paused_job_groups.contains(&trigger.job_key().group);
        if group_paused && trigger.state() == TriggerState::Waiting {
            trigger.set_state(TriggerState::Paused);
        }
        tables.triggers.insert(trigger.key().clone(), trigger);
        Ok(())
    }

    fn store_job_and_trigger(&self, job: JobDetail, trigger: Trigger) -> SchedulerResult<()> {
        self.store_job(job, true)?;
        self.store_trigger(trigger, true)
    }

    fn remove_job(&self, key: &JobKey) -> SchedulerResult<bool> {
        let mut tables = self.tables.lock();
        let existed = tables.jobs.remove(key).is_some();
        if existed {
            let dead_triggers: Vec<TriggerKey> = tables
                .triggers
                .values()
                .filter(|t| t.job_key() == key)
                .map(|t| t.key().clone())
                .collect();
            for tk in dead_triggers {
                tables.triggers.remove(&tk);
            }
        }
        Ok(existed)
    }

    fn remove_trigger(&self, key: &TriggerKey) -> SchedulerResult<bool> {
        let mut tables = self.tables.lock();
        let removed = tables.triggers.remove(key);
        match removed {
            Some(trigger) => {
                let job_key = trigger.job_key().clone();
                tables.cleanup_orphan_job(&job_key);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn replace_trigger(&self, key: &TriggerKey, mut new_trigger: Trigger) -> SchedulerResult<bool> {
        let mut tables = self.tables.lock();
        if !tables.triggers.contains_key(key) {
            return Ok(false);
        }
        if new_trigger.next_fire_time().is_none() {
            let cal = new_trigger
                .core()
                .calendar_name
                .as_ref()
                .and_then(|name| tables.calendars.get(name))
                .cloned();
            new_trigger.compute_first_fire_time(cal.as_deref());
        }
        tables.triggers.insert(key.clone(), new_trigger);
        Ok(true)
    }

    fn pause_trigger(&self, key: &TriggerKey) -> SchedulerResult<()> {
        let mut tables = self.tables.lock();
        if let Some(t) = tables.triggers.get_mut(key) {
            match t.state() {
                TriggerState::Waiting => t.set_state(TriggerState::Paused),
                TriggerState::Blocked => t.set_state(TriggerState::PausedBlocked),
                _ => {}
            }
        }
        Ok(())
    }

    fn pause_trigger_group(&self, matcher: &Matcher) -> SchedulerResult<Vec<String>> {
        let mut tables = self.tables.lock();
        let mut groups = HashSet::new();
        let keys: Vec<TriggerKey> = tables
            .triggers
            .values()
            .filter(|t| matcher.matches(t.key()))
            .map(|t| t.key().clone())
            .collect();
        for key in &keys {
            groups.insert(key.group.clone());
            if let Some(t) = tables.triggers.get_mut(key) {
                match t.state() {
                    TriggerState::Waiting => t.set_state(TriggerState::Paused),
                    TriggerState::Blocked => t.set_state(TriggerState::PausedBlocked),
                    _ => {}
                }
            }
        }
        tables.paused_trigger_groups.extend(groups.iter().cloned());
        Ok(groups.into_iter().collect())
    }

    fn pause_job(&self, key: &JobKey) -> SchedulerResult<()> {
        let mut tables = self.tables.lock();
        let trigger_keys: Vec<TriggerKey> = tables
            .triggers
            .values()
            .filter(|t| t.job_key() == key)
            .map(|t| t.key().clone())
            .collect();
        for tk in trigger_keys {
            if let Some(t) = tables.triggers.get_mut(&tk) {
                match t.state() {
                    TriggerState::Waiting => t.set_state(TriggerState::Paused),
                    TriggerState::Blocked => t.set_state(TriggerState::PausedBlocked),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn pause_job_group(&self, matcher: &Matcher) -> SchedulerResult<Vec<String>> {
        let mut tables = self.tables.lock();
        let job_keys: Vec<JobKey> = tables.jobs.keys().filter(|k| matcher.matches(k)).cloned().collect();
        let mut groups = HashSet::new();
        for jk in &job_keys {
            groups.insert(jk.group.clone());
            let trigger_keys: Vec<TriggerKey> = tables
                .triggers
                .values()
                .filter(|t| t.job_key() == jk)
                .map(|t| t.key().clone())
                .collect();
            for tk in trigger_keys {
                if let Some(t) = tables.triggers.get_mut(&tk) {
                    match t.state() {
                        TriggerState::Waiting => t.set_state(TriggerState::Paused),
                        TriggerState::Blocked => t.set_state(TriggerState::PausedBlocked),
                        _ => {}
                    }
                }
            }
        }
        tables.paused_job_groups.extend(groups.iter().cloned());
        Ok(groups.into_iter().collect())
    }

    fn resume_trigger(&self, key: &TriggerKey) -> SchedulerResult<()> {
        let mut tables = self.tables.lock();
        if let Some(t) = tables.triggers.get_mut(key) {
            match t.state() {
                TriggerState::Paused => t.set_state(TriggerState::Waiting),
                TriggerState::PausedBlocked => t.set_state(TriggerState::Blocked),
                _ => {}
            }
        }
        Ok(())
    }

    fn resume_trigger_group(&self, matcher: &Matcher) -> SchedulerResult<Vec<String>> {
        let mut tables = self.tables.lock();
        let mut groups = HashSet::new();
        let keys: Vec<TriggerKey> = tables
            .triggers
            .values()
            .filter(|t| matcher.matches(t.key()))
            .map(|t| t.key().clone())
            .collect();
        for key in &keys {
            groups.insert(key.group.clone());
            if let Some(t) = tables.triggers.get_mut(key) {
                match t.state() {
                    TriggerState::Paused => t.set_state(TriggerState::Waiting),
                    TriggerState::PausedBlocked => t.set_state(TriggerState::Blocked),
                    _ => {}
                }
            }
        }
        for g in &groups {
            tables.paused_trigger_groups.remove(g);
        }
        Ok(groups.into_iter().collect())
    }

    fn resume_job(&self, key: &JobKey) -> SchedulerResult<()> {
        let mut tables = self.tables.lock();
        let trigger_keys: Vec<TriggerKey> = tables
            .triggers
            .values()
            .filter(|t| t.job_key() == key)
            .map(|t| t.key().clone())
            .collect();
        for tk in trigger_keys {
            if let Some(t) = tables.triggers.get_mut(&tk) {
                match t.state() {
                    TriggerState::Paused => t.set_state(TriggerState::Waiting),
                    TriggerState::PausedBlocked => t.set_state(TriggerState::Blocked),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn resume_job_group(&self, matcher: &Matcher) -> SchedulerResult<Vec<String>> {
        let mut tables = self.tables.lock();
        let job_keys: Vec<JobKey> = tables.jobs.keys().filter(|k| matcher.matches(k)).cloned().collect();
        let mut groups = HashSet::new();
        for jk in &job_keys {
            groups.insert(jk.group.clone());
            let trigger_keys: Vec<TriggerKey> = tables
                .triggers
                .values()
                .filter(|t| t.job_key() == jk)
                .map(|t| t.key().clone())
                .collect();
            for tk in trigger_keys {
                if let Some(t) = tables.triggers.get_mut(&tk) {
                    match t.state() {
                        TriggerState::Paused => t.set_state(TriggerState::Waiting),
                        TriggerState::PausedBlocked => t.set_state(TriggerState::Blocked),
                        _ => {}
                    }
                }
            }
        }
        for g in &groups {
            tables.paused_job_groups.remove(g);
        }
        Ok(groups.into_iter().collect())
    }

    fn pause_all(&self) -> SchedulerResult<()> {
        self.pause_trigger_group(&Matcher::Any).map(|_| ())
    }

    fn resume_all(&self) -> SchedulerResult<()> {
        self.resume_trigger_group(&Matcher::Any).map(|_| ())
    }

    fn store_calendar(
        &self,
        name: &str,
        calendar: Arc<dyn Calendar>,
        replace_existing: bool,
        update_triggers: bool,
    ) -> SchedulerResult<()> {
        let mut tables = self.tables.lock();
        if !replace_existing && tables.calendars.contains_key(name) {
            return Err(SchedulerError::ObjectAlreadyExistsError(format!("calendar {name}")));
        }
        tables.calendars.insert(name.to_string(), calendar.clone());
        if update_triggers {
            let keys: Vec<TriggerKey> = tables
                .triggers
                .values()
                .filter(|t| t.core().calendar_name.as_deref() == Some(name))
                .map(|t| t.key().clone())
                .collect();
            for key in keys {
                if let Some(t) = tables.triggers.get_mut(&key) {
                    let next = t.next_fire_time().unwrap_or(t.core().start_time);
                    let recomputed = t.fire_time_after(next - ChronoDuration::seconds(1), Some(calendar.as_ref()));
                    t.core_mut().next_fire_time = recomputed;
                }
            }
        }
        Ok(())
    }

    fn remove_calendar(&self, name: &str) -> SchedulerResult<bool> {
        let mut tables = self.tables.lock();
        let in_use = tables.triggers.values().any(|t| t.core().calendar_name.as_deref() == Some(name));
        if in_use {
            return Err(SchedulerError::JobPersistenceError(anyhow::anyhow!(
                "calendar {name} is still referenced by a trigger"
            )));
        }
        Ok(tables.calendars.remove(name).is_some())
    }

    fn get_calendar(&self, name: &str) -> SchedulerResult<Option<Arc<dyn Calendar>>> {
        Ok(self.tables.lock().calendars.get(name).cloned())
    }

    fn get_calendar_names(&self) -> SchedulerResult<Vec<String>> {
        Ok(self.tables.lock().calendars.keys().cloned().collect())
    }

    fn clear_all_scheduling_data(&self) -> SchedulerResult<()> {
        let mut tables = self.tables.lock();
        *tables = Tables::new();
        Ok(())
    }

    fn reset_trigger_from_error_state(&self, key: &TriggerKey) -> SchedulerResult<()> {
        let mut tables = self.tables.lock();
        let group_paused = tables.paused_trigger_groups.contains(&key.group);
        if let Some(t) = tables.triggers.get_mut(key) {
            if t.state() == TriggerState::Error {
                t.set_state(if group_paused { TriggerState::Paused } else { TriggerState::Waiting });
            }
        }
        Ok(())
    }

    fn retrieve_job(&self, key: &JobKey) -> SchedulerResult<Option<JobDetail>> {
        Ok(self.tables.lock().jobs.get(key).cloned())
    }

    fn retrieve_trigger(&self, key: &TriggerKey) -> SchedulerResult<Option<Trigger>> {
        Ok(self.tables.lock().triggers.get(key).cloned())
    }

    fn check_job_exists(&self, key: &JobKey) -> SchedulerResult<bool> {
        Ok(self.tables.lock().jobs.contains_key(key))
    }

    fn check_trigger_exists(&self, key: &TriggerKey) -> SchedulerResult<bool> {
        Ok(self.tables.lock().triggers.contains_key(key))
    }

    fn get_job_keys(&self, matcher: &Matcher) -> SchedulerResult<Vec<JobKey>> {
        Ok(self.tables.lock().jobs.keys().filter(|k| matcher.matches(k)).cloned().collect())
    }

    fn get_trigger_keys(&self, matcher: &Matcher) -> SchedulerResult<Vec<TriggerKey>> {
        Ok(self
            .tables
            .lock()
            .triggers
            .values()
            .map(|t| t.key().clone())
            .filter(|k| matcher.matches(k))
            .collect())
    }

    fn get_triggers_for_job(&self, key: &JobKey) -> SchedulerResult<Vec<Trigger>> {
        Ok(self.tables.lock().triggers.values().filter(|t| t.job_key() == key).cloned().collect())
    }

    fn get_trigger_state(&self, key: &TriggerKey) -> SchedulerResult<TriggerState> {
        Ok(self.tables.lock().triggers.get(key).map(|t| t.state()).unwrap_or(TriggerState::None))
    }

    fn get_number_of_jobs(&self) -> SchedulerResult<usize> {
        Ok(self.tables.lock().jobs.len())
    }

    fn get_number_of_triggers(&self) -> SchedulerResult<usize> {
        Ok(self.tables.lock().triggers.len())
    }

    fn get_number_of_calendars(&self) -> SchedulerResult<usize> {
        Ok(self.tables.lock().calendars.len())
    }

    fn get_paused_trigger_groups(&self) -> SchedulerResult<Vec<String>> {
        Ok(self.tables.lock().paused_trigger_groups.iter().cloned().collect())
    }

    fn acquire_next_triggers(
        &self,
        no_later_than: DateTime<Utc>,
        max_count: usize,
        time_window: ChronoDuration,
    ) -> SchedulerResult<Vec<Trigger>> {
        let mut tables = self.tables.lock();
        let now = self.clock.now();
        let cutoff = no_later_than + time_window;

        let candidate_keys: Vec<TriggerKey> = tables
            .triggers
            .values()
            .filter(|t| t.state() == TriggerState::Waiting)
            .map(|t| t.key().clone())
            .collect();

        for key in candidate_keys {
            let misfired = {
                let t = &tables.triggers[&key];
                self.is_misfired(t, now)
            };
            if misfired {
                let cal_owned = tables
                    .triggers
                    .get(&key)
                    .and_then(|t| t.core().calendar_name.clone())
                    .and_then(|name| tables.calendars.get(&name).cloned());
                warn!(trigger = %key, "trigger misfired, applying misfire instruction");
                if let Some(t) = tables.triggers.get_mut(&key) {
                    t.update_after_misfire(now, cal_owned.as_deref());
                }
            }
        }

        let mut due: Vec<TriggerKey> = tables
            .triggers
            .values()
            .filter(|t| t.state() == TriggerState::Waiting)
            .filter(|t| matches!(t.next_fire_time(), Some(nf) if nf <= cutoff))
            .map(|t| t.key().clone())
            .collect();

        due.sort_by(|a, b| {
            let ta = &tables.triggers[a];
            let tb = &tables.triggers[b];
            ta.next_fire_time()
                .cmp(&tb.next_fire_time())
                .then_with(|| tb.core().priority.cmp(&ta.core().priority))
                .then_with(|| a.cmp(b))
        });
        due.truncate(max_count);

        let mut acquired = Vec::with_capacity(due.len());
        for key in due {
            if let Some(t) = tables.triggers.get_mut(&key) {
                t.set_state(TriggerState::Acquired);
                acquired.push(t.clone());
            }
        }
        debug!(count = acquired.len(), "acquired triggers");
        Ok(acquired)
    }

    fn release_acquired_trigger(&self, key: &TriggerKey) -> SchedulerResult<()> {
        let mut tables = self.tables.lock();
        if let Some(t) = tables.triggers.get_mut(key) {
            if t.state() == TriggerState::Acquired {
                t.set_state(TriggerState::Waiting);
            }
        }
        Ok(())
    }

    fn triggers_fired(&self, keys: &[TriggerKey]) -> SchedulerResult<Vec<Option<TriggerFiredBundle>>> {
        let mut tables = self.tables.lock();
        let now = self.clock.now();
        let mut results = Vec::with_capacity(keys.len());

        for key in keys {
            let still_acquired = tables
                .triggers
                .get(key)
                .map(|t| t.state() == TriggerState::Acquired)
                .unwrap_or(false);
            if !still_acquired {
                results.push(None);
                continue;
            }

            let job_key = tables.triggers[key].job_key().clone();
            let Some(job) = tables.jobs.get(&job_key).cloned() else {
                results.push(None);
                continue;
            };

            let calendar_name = tables.triggers[key].core().calendar_name.clone();
            let calendar = calendar_name.as_ref().and_then(|n| tables.calendars.get(n)).cloned();
            let scheduled_fire_time = tables.triggers[key].next_fire_time().unwrap_or(now);
            let previous_fire_time = tables.triggers[key].core().previous_fire_time;

            {
                let t = tables.triggers.get_mut(key).unwrap();
                t.set_state(TriggerState::Executing);
                t.triggered(calendar.as_deref());
            }

            let next_fire_time = tables.triggers[key].next_fire_time();
            let fired_trigger_snapshot = tables.triggers[key].clone();

            if job.disallow_concurrent_execution {
                *tables.executing_counts.entry(job_key.clone()).or_insert(0) += 1;
                let siblings = tables.sibling_keys(&job_key, key);
                for sk in siblings {
                    if let Some(st) = tables.triggers.get_mut(&sk) {
                        match st.state() {
                            TriggerState::Waiting => st.set_state(TriggerState::Blocked),
                            TriggerState::Paused => st.set_state(TriggerState::PausedBlocked),
                            _ => {}
                        }
                    }
                }
            }

            results.push(Some(TriggerFiredBundle {
                job_detail: job,
                trigger: fired_trigger_snapshot,
                calendar_name,
                is_recovering: false,
                recovering_trigger_key: None,
                fire_time: now,
                scheduled_fire_time,
                previous_fire_time,
                next_fire_time,
            }));
        }
        Ok(results)
    }

    fn triggered_job_complete(
        &self,
        key: &TriggerKey,
        job_detail: &JobDetail,
        instruction: CompletionInstruction,
    ) -> SchedulerResult<()> {
        let mut tables = self.tables.lock();
        let job_key = job_detail.key.clone();

        if job_detail.persist_data_after_execution {
            if let Some(stored) = tables.jobs.get_mut(&job_key) {
                stored.data_map = job_detail.data_map.clone();
            }
        }

        match instruction {
            CompletionInstruction::Noop => {
                if let Some(t) = tables.triggers.get_mut(key) {
                    if t.next_fire_time().is_some() {
                        t.set_state(TriggerState::Waiting);
                    } else {
                        t.set_state(TriggerState::Complete);
                    }
                }
            }
            CompletionInstruction::DeleteTrigger => {
                tables.triggers.remove(key);
            }
            CompletionInstruction::SetTriggerComplete => {
                if let Some(t) = tables.triggers.get_mut(key) {
                    t.set_state(TriggerState::Complete);
                }
            }
            CompletionInstruction::ReExecuteJob => {}
            CompletionInstruction::SetTriggerError => {
                if let Some(t) = tables.triggers.get_mut(key) {
                    t.set_state(TriggerState::Error);
                }
            }
            CompletionInstruction::SetAllJobTriggersError => {
                let keys: Vec<TriggerKey> = tables
                    .triggers
                    .values()
                    .filter(|t| t.job_key() == &job_key)
                    .map(|t| t.key().clone())
                    .collect();
                for k in keys {
                    if let Some(t) = tables.triggers.get_mut(&k) {
                        t.set_state(TriggerState::Error);
                    }
                }
            }
            CompletionInstruction::SetAllJobTriggersComplete => {
                let keys: Vec<TriggerKey> = tables
                    .triggers
                    .values()
                    .filter(|t| t.job_key() == &job_key)
                    .map(|t| t.key().clone())
                    .collect();
                for k in keys {
                    if let Some(t) = tables.triggers.get_mut(&k) {
                        t.set_state(TriggerState::Complete);
                    }
                }
            }
        }

        if job_detail.disallow_concurrent_execution {
            let remaining = tables.executing_counts.entry(job_key.clone()).or_insert(0);
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                let siblings: Vec<TriggerKey> = tables
                    .triggers
                    .values()
                    .filter(|t| t.job_key() == &job_key)
                    .map(|t| t.key().clone())
                    .collect();
                for sk in siblings {
                    if let Some(st) = tables.triggers.get_mut(&sk) {
                        match st.state() {
                            TriggerState::Blocked => st.set_state(TriggerState::Waiting),
                            TriggerState::PausedBlocked => st.set_state(TriggerState::Paused),
                            _ => {}
                        }
                    }
                }
            }
        }

        if !job_detail.durable {
            tables.cleanup_orphan_job(&job_key);
        }
        Ok(())
    }

    fn get_acquire_retry_delay(&self, failure_count: u32) -> StdDuration {
        let backoff_ms = 20u64.saturating_mul(1u64 << failure_count.min(20));
        StdDuration::from_millis(backoff_ms.clamp(20, 600_000))
    }

    fn supports_persistence(&self) -> bool {
        false
    }

    fn is_clustered(&self) -> bool {
        false
    }
}
