//! Job run shell module
//!
//! One `JobRunShell` handles exactly one fired bundle (§4.6): build the
//! execution context, run the listener/veto/execute/complete sequence, and
//! tell the store how to reverse the trigger's `EXECUTING` state.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, warn};
use uuid::Uuid;

use crate::domain::entities::context::{JobExecutionContext, RECOVERING_TRIGGER_GROUP_KEY, RECOVERING_TRIGGER_NAME_KEY};
use crate::domain::entities::identity::TriggerKey;
use crate::domain::entities::job::{JobExecutionError, JobExecutionOutcome};
use crate::domain::store::JobStore;
use crate::domain::value_objects::completion_instruction::CompletionInstruction;
use crate::domain::value_objects::fired_bundle::TriggerFiredBundle;
use crate::error::SchedulerResult;

use super::job_factory::JobFactory;
use super::listeners::ListenerManager;

pub struct JobRunShell {
    job_factory: Arc<dyn JobFactory>,
    listeners: Arc<ListenerManager>,
}

impl JobRunShell {
    pub fn new(job_factory: Arc<dyn JobFactory>, listeners: Arc<ListenerManager>) -> Self {
        Self { job_factory, listeners }
    }

    /// Runs the bundle to completion (including any `RE_EXECUTE_JOB`
    /// refires) and reports the outcome back to `store`. Runs on whichever
    /// worker-pool thread invoked it; blocks that thread for the whole
    /// refire loop.
    pub fn run(&self, store: &dyn JobStore, bundle: TriggerFiredBundle) -> SchedulerResult<()> {
        let mut context = build_context(&bundle);
        let mut job_detail = bundle.job_detail.clone();

        if self.listeners.notify_trigger_fired(&bundle.trigger, &context) {
            self.listeners.notify_job_execution_vetoed(bundle.trigger.job_key(), &context);
            self.listeners
                .notify_trigger_complete(&bundle.trigger, &context, CompletionInstruction::Noop);
            return store.triggered_job_complete(bundle.trigger.key(), &job_detail, CompletionInstruction::Noop);
        }

        let mut job = match self.job_factory.new_job(&bundle) {
            Ok(job) => job,
            Err(err) => {
                error!(trigger = %bundle.trigger.key(), error = %err, "job factory failed to resolve job class");
                self.listeners
                    .notify_trigger_complete(&bundle.trigger, &context, CompletionInstruction::SetAllJobTriggersError);
                return store.triggered_job_complete(
                    bundle.trigger.key(),
                    &job_detail,
                    CompletionInstruction::SetAllJobTriggersError,
                );
            }
        };

        let mut instruction;
        let mut final_outcome: anyhow::Result<JobExecutionOutcome>;
        loop {
            self.listeners.notify_job_to_be_executed(bundle.trigger.job_key(), &context);

            let job_ref = &mut *job;
            let ctx_ref = &mut context;
            final_outcome = catch_unwind(AssertUnwindSafe(|| job_ref.execute(ctx_ref))).unwrap_or_else(|panic| {
                let message = panic_message(&panic);
                warn!(trigger = %bundle.trigger.key(), %message, "job panicked during execution");
                Err(anyhow::anyhow!("job panicked: {message}"))
            });

            self.listeners
                .notify_job_was_executed(bundle.trigger.job_key(), &context, &final_outcome);

            instruction = derive_instruction(&final_outcome);
            if instruction == CompletionInstruction::ReExecuteJob {
                context.refire_count += 1;
                continue;
            }
            break;
        }

        if let Ok(outcome) = &final_outcome {
            if job_detail.persist_data_after_execution {
                if let Some(updated) = &outcome.updated_data_map {
                    job_detail.data_map = updated.clone();
                }
            }
        }

        self.listeners.notify_trigger_complete(&bundle.trigger, &context, instruction);
        store.triggered_job_complete(bundle.trigger.key(), &job_detail, instruction)
    }
}

fn build_context(bundle: &TriggerFiredBundle) -> JobExecutionContext {
    let mut merged = bundle.job_detail.data_map.clone();
    merged.extend(bundle.trigger.core().data_map.clone());

    let recovering_trigger_key = bundle.recovering_trigger_key.clone().or_else(|| {
        let name = merged.get(RECOVERING_TRIGGER_NAME_KEY)?.as_str()?.to_string();
        let group = merged.get(RECOVERING_TRIGGER_GROUP_KEY)?.as_str()?.to_string();
        Some(TriggerKey::with_group(name, group))
    });
    let is_recovering = bundle.is_recovering || recovering_trigger_key.is_some();

    JobExecutionContext {
        job_key: bundle.job_detail.key.clone(),
        trigger_key: bundle.trigger.key().clone(),
        merged_data_map: merged,
        fire_time: bundle.fire_time,
        scheduled_fire_time: bundle.scheduled_fire_time,
        previous_fire_time: bundle.previous_fire_time,
        next_fire_time: bundle.next_fire_time,
        is_recovering,
        recovering_trigger_key,
        refire_count: 0,
        fire_instance_id: Uuid::new_v4().to_string(),
    }
}

fn derive_instruction(outcome: &anyhow::Result<JobExecutionOutcome>) -> CompletionInstruction {
    match outcome {
        Ok(_) => CompletionInstruction::Noop,
        Err(err) => match err.downcast_ref::<JobExecutionError>() {
            Some(exec_err) if exec_err.refire_immediately => CompletionInstruction::ReExecuteJob,
            Some(exec_err) if exec_err.unschedule_firing_trigger => CompletionInstruction::SetTriggerComplete,
            Some(exec_err) if exec_err.unschedule_all_triggers => CompletionInstruction::SetAllJobTriggersComplete,
            _ => CompletionInstruction::SetTriggerError,
        },
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::identity::{JobKey, TriggerKey};
    use crate::domain::entities::job::JobDetail;
    use crate::domain::entities::trigger::{SimpleMisfireInstruction, SimpleTrigger, Trigger, TriggerCore};
    use crate::domain::store::MockJobStore;
    use crate::scheduler::job_factory::FnJobFactory;
    use mockall::predicate::*;

    struct FailingJob;
    impl crate::domain::entities::job::Job for FailingJob {
        fn execute(&mut self, _ctx: &mut JobExecutionContext) -> anyhow::Result<JobExecutionOutcome> {
            Err(JobExecutionError::new("boom").into())
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
    fn failing_job_reports_set_trigger_error() {
        let factory: Arc<dyn JobFactory> = Arc::new(FnJobFactory::new().register("fails", || Box::new(FailingJob)));
        let listeners = Arc::new(ListenerManager::new());
        let shell = JobRunShell::new(factory, listeners);

        let mut store = MockJobStore::new();
        store
            .expect_triggered_job_complete()
            .with(eq(TriggerKey::new("t")), always(), eq(CompletionInstruction::SetTriggerError))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let bundle = sample_bundle("fails");
        shell.run(&store, bundle).unwrap();
    }
}
