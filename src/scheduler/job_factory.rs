//! Job factory module
//!
//! The store holds only an opaque `job_class` string (§9); resolving it to
//! executable code is the job factory's responsibility.

use std::collections::HashMap;

use crate::domain::entities::job::{Job, JobDetail};
use crate::domain::value_objects::fired_bundle::TriggerFiredBundle;
use crate::error::{SchedulerError, SchedulerResult};

pub trait JobFactory: Send + Sync {
    fn new_job(&self, bundle: &TriggerFiredBundle) -> SchedulerResult<Box<dyn Job>>;
}

type JobConstructor = Box<dyn Fn() -> Box<dyn Job> + Send + Sync>;

/// Reference `JobFactory`: maps `job_class` strings to boxed closures that
/// construct a fresh `Job` instance per fire. Not a general class loader —
/// callers register constructors for the classes they use.
#[derive(Default)]
pub struct FnJobFactory {
    constructors: HashMap<String, JobConstructor>,
}

impl FnJobFactory {
    pub fn new() -> Self {
        Self { constructors: HashMap::new() }
    }

    pub fn register<F>(mut self, job_class: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> Box<dyn Job> + Send + Sync + 'static,
    {
        self.constructors.insert(job_class.into(), Box::new(constructor));
        self
    }
}

impl JobFactory for FnJobFactory {
    fn new_job(&self, bundle: &TriggerFiredBundle) -> SchedulerResult<Box<dyn Job>> {
        let job_class = &bundle.job_detail.job_class;
        self.constructors
            .get(job_class)
            .map(|ctor| ctor())
            .ok_or_else(|| SchedulerError::SchedulerConfigError(format!("no job factory registration for class '{job_class}'")))
    }
}

/// Helper used only by tests that don't need a `JobDetail`'s class to
/// resolve to anything real.
pub fn class_name_of(detail: &JobDetail) -> &str {
    &detail.job_class
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::context::JobExecutionContext;
    use crate::domain::entities::identity::{JobKey, TriggerKey};
    use crate::domain::entities::job::JobExecutionOutcome;
    use crate::domain::entities::trigger::{SimpleMisfireInstruction, SimpleTrigger, Trigger, TriggerCore};
    use chrono::Utc;

    struct NoopJob;
    impl Job for NoopJob {
        fn execute(&mut self, _ctx: &mut JobExecutionContext) -> anyhow::Result<JobExecutionOutcome> {
            Ok(JobExecutionOutcome::default())
        }
    }

    fn sample_bundle(job_class: &str) -> TriggerFiredBundle {
        let now = Utc::now();
        let job = JobDetail::new(JobKey::new("j"), job_class);
        let core = TriggerCore::new(TriggerKey::new("t"), JobKey::new("j"), now);
        let trigger = Trigger::Simple(SimpleTrigger {
            core,
            repeat_count: 0,
            repeat_interval: chrono::Duration::seconds(1),
            times_triggered: 0,
            misfire_instruction: SimpleMisfireInstruction::FireNow,
        });
        TriggerFiredBundle {
            job_detail: job,
            trigger,
            calendar_name: None,
            is_recovering: false,
            recovering_trigger_key: None,
            fire_time: now,
            scheduled_fire_time: now,
            previous_fire_time: None,
            next_fire_time: None,
        }
    }

    #[test]
    fn resolves_registered_class() {
        let factory = FnJobFactory::new().register("noop", || Box::new(NoopJob));
        let bundle = sample_bundle("noop");
        assert!(factory.new_job(&bundle).is_ok());
    }

    #[test]
    fn unknown_class_is_a_config_error() {
        let factory = FnJobFactory::new();
        let bundle = sample_bundle("missing");
        assert!(matches!(factory.new_job(&bundle), Err(SchedulerError::SchedulerConfigError(_))));
    }
}
