//! Job execution context module
//!
//! The context a job run shell builds once per fire and hands to the job's
//! `execute` method. Cross-references (to the trigger, the job, the
//! scheduler) are carried by key, never by embedded object identity, so the
//! context stays cheap to construct and free of back-reference cycles.

use chrono::{DateTime, Utc};

use super::identity::{JobKey, TriggerKey};
use super::job::JobDataMap;

/// Everything a running job needs to know about why it is running.
#[derive(Debug, Clone)]
pub struct JobExecutionContext {
    pub job_key: JobKey,
    pub trigger_key: TriggerKey,
    /// Merged data map: job's data map overlaid with the trigger's (trigger
    /// wins on key collision).
    pub merged_data_map: JobDataMap,
    pub fire_time: DateTime<Utc>,
    pub scheduled_fire_time: DateTime<Utc>,
    pub previous_fire_time: Option<DateTime<Utc>>,
    pub next_fire_time: Option<DateTime<Utc>>,
    /// True if this execution is a recovery re-fire after a crash.
    pub is_recovering: bool,
    /// Set only when `is_recovering`: the trigger key that was executing
    /// when the process died, carried under a well-known data-map key too.
    pub recovering_trigger_key: Option<TriggerKey>,
    /// Monotonically increasing within one fire, bumped on each
    /// `RE_EXECUTE_JOB` refire of the same bundle.
    pub refire_count: u32,
    /// Unique id for this particular run (fire instance), stable across
    /// refires of the same bundle.
    pub fire_instance_id: String,
}

/// Well-known data-map keys used to carry the original trigger identity
/// into a recovery fire's data map, per §4.3 ("Recovery").
pub const RECOVERING_TRIGGER_NAME_KEY: &str = "__JOBWEAVER_RECOVERING_TRIGGER_NAME";
pub const RECOVERING_TRIGGER_GROUP_KEY: &str = "__JOBWEAVER_RECOVERING_TRIGGER_GROUP";

impl JobExecutionContext {
    pub fn elapsed_since_scheduled(&self) -> chrono::Duration {
        self.fire_time - self.scheduled_fire_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_since_scheduled_is_non_negative_on_time() {
        let now = Utc::now();
        let ctx = JobExecutionContext {
            job_key: JobKey::new("j"),
            trigger_key: TriggerKey::new("t"),
            merged_data_map: Default::default(),
            fire_time: now,
            scheduled_fire_time: now,
            previous_fire_time: None,
            next_fire_time: None,
            is_recovering: false,
            recovering_trigger_key: None,
            refire_count: 0,
            fire_instance_id: "1".to_string(),
        };
        assert_eq!(ctx.elapsed_since_scheduled(), chrono::Duration::zero());
    }
}
