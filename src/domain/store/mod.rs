//! Job store contract module
//!
//! `JobStore` is the transactional boundary the dispatcher relies on
//! (§4.3). This crate ships exactly one implementation
//! (`infrastructure::in_memory_store::InMemoryJobStore`); a SQL-backed
//! store is explicitly out of scope.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};

use crate::domain::entities::calendar::Calendar;
use crate::domain::entities::identity::{JobKey, Matcher, TriggerKey};
use crate::domain::entities::job::JobDetail;
use crate::domain::entities::trigger::{Trigger, TriggerState};
use crate::domain::value_objects::completion_instruction::CompletionInstruction;
use crate::domain::value_objects::fired_bundle::TriggerFiredBundle;
use crate::error::SchedulerResult;

/// Bundles produced by `initialize()` recovering orphaned `ACQUIRED`/
/// `EXECUTING` triggers left behind by a crash (§4.3 "Recovery").
#[derive(Debug, Clone)]
pub struct RecoveredTrigger {
    pub original_trigger_key: TriggerKey,
    pub job_key: JobKey,
    pub requests_recovery: bool,
}

/// The authoritative, transactional source of truth for jobs, triggers,
/// and calendars.
#[cfg_attr(test, mockall::automock)]
pub trait JobStore: Send + Sync {
    /// Called once at scheduler startup. Returns triggers recovered from a
    /// prior crash (orphaned `ACQUIRED`/`EXECUTING` rows), each moved back
    /// to `WAITING`.
    fn initialize(&self) -> SchedulerResult<Vec<RecoveredTrigger>>;

    // -- mutation -----------------------------------------------------
    fn store_job(&self, job: JobDetail, replace_existing: bool) -> SchedulerResult<()>;
    fn store_trigger(&self, trigger: Trigger, replace_existing: bool) -> SchedulerResult<()>;
    fn store_job_and_trigger(&self, job: JobDetail, trigger: Trigger) -> SchedulerResult<()>;
    fn remove_job(&self, key: &JobKey) -> SchedulerResult<bool>;
    fn remove_trigger(&self, key: &TriggerKey) -> SchedulerResult<bool>;
    fn replace_trigger(&self, key: &TriggerKey, new_trigger: Trigger) -> SchedulerResult<bool>;
    fn pause_trigger(&self, key: &TriggerKey) -> SchedulerResult<()>;
    fn pause_trigger_group(&self, matcher: &Matcher) -> SchedulerResult<Vec<String>>;
    fn pause_job(&self, key: &JobKey) -> SchedulerResult<()>;
    fn pause_job_group(&self, matcher: &Matcher) -> SchedulerResult<Vec<String>>;
    fn resume_trigger(&self, key: &TriggerKey) -> SchedulerResult<()>;
    fn resume_trigger_group(&self, matcher: &Matcher) -> SchedulerResult<Vec<String>>;
    fn resume_job(&self, key: &JobKey) -> SchedulerResult<()>;
    fn resume_job_group(&self, matcher: &Matcher) -> SchedulerResult<Vec<String>>;
    fn pause_all(&self) -> SchedulerResult<()>;
    fn resume_all(&self) -> SchedulerResult<()>;
    fn store_calendar(
        &self,
        name: &str,
        calendar: Arc<dyn Calendar>,
        replace_existing: bool,
        update_triggers: bool,
    ) -> SchedulerResult<()>;
    fn remove_calendar(&self, name: &str) -> SchedulerResult<bool>;
    fn get_calendar(&self, name: &str) -> SchedulerResult<Option<Arc<dyn Calendar>>>;
    fn get_calendar_names(&self) -> SchedulerResult<Vec<String>>;
    fn clear_all_scheduling_data(&self) -> SchedulerResult<()>;
    fn reset_trigger_from_error_state(&self, key: &TriggerKey) -> SchedulerResult<()>;

    // -- query ----------------------------------------------------------
    fn retrieve_job(&self, key: &JobKey) -> SchedulerResult<Option<JobDetail>>;
    fn retrieve_trigger(&self, key: &TriggerKey) -> SchedulerResult<Option<Trigger>>;
    fn check_job_exists(&self, key: &JobKey) -> SchedulerResult<bool>;
    fn check_trigger_exists(&self, key: &TriggerKey) -> SchedulerResult<bool>;
    fn get_job_keys(&self, matcher: &Matcher) -> SchedulerResult<Vec<JobKey>>;
    fn get_trigger_keys(&self, matcher: &Matcher) -> SchedulerResult<Vec<TriggerKey>>;
    fn get_triggers_for_job(&self, key: &JobKey) -> SchedulerResult<Vec<Trigger>>;
    fn get_trigger_state(&self, key: &TriggerKey) -> SchedulerResult<TriggerState>;
    fn get_number_of_jobs(&self) -> SchedulerResult<usize>;
    fn get_number_of_triggers(&self) -> SchedulerResult<usize>;
    fn get_number_of_calendars(&self) -> SchedulerResult<usize>;
    fn get_paused_trigger_groups(&self) -> SchedulerResult<Vec<String>>;

    // -- firing protocol --------------------------------------------------
    fn acquire_next_triggers(
        &self,
        no_later_than: DateTime<Utc>,
        max_count: usize,
        time_window: ChronoDuration,
    ) -> SchedulerResult<Vec<Trigger>>;
    fn release_acquired_trigger(&self, key: &TriggerKey) -> SchedulerResult<()>;
    fn triggers_fired(&self, keys: &[TriggerKey]) -> SchedulerResult<Vec<Option<TriggerFiredBundle>>>;
    fn triggered_job_complete(
        &self,
        key: &TriggerKey,
        job_detail: &JobDetail,
        instruction: CompletionInstruction,
    ) -> SchedulerResult<()>;

    // -- retry/capabilities ------------------------------------------------
    fn get_acquire_retry_delay(&self, failure_count: u32) -> StdDuration;
    fn supports_persistence(&self) -> bool;
    fn is_clustered(&self) -> bool;
}
