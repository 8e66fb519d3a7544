//! Job entity module
//!
//! This module defines `JobDetail`, the persisted description of a unit of
//! work, and the `Job` trait that the job factory resolves an opaque class
//! identifier into.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::identity::JobKey;

/// Arbitrary serializable value carried in a job's or trigger's data map.
pub type JobDataValue = serde_json::Value;
/// String-keyed data map merged (trigger over job) at fire time.
pub type JobDataMap = HashMap<String, JobDataValue>;

/// Persisted description of a job.
///
/// `persist_data_after_execution` and `disallow_concurrent_execution` are
/// capability flags the job factory derives from the resolved job class;
/// they are cached here so the store and dispatcher never need to resolve
/// the class just to check a flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobDetail {
    pub key: JobKey,
    /// Opaque identifier the job factory resolves to executable code.
    pub job_class: String,
    pub description: Option<String>,
    pub data_map: JobDataMap,
    /// If false, deleted automatically when no trigger references it.
    pub durable: bool,
    /// If true, re-fired on restart if it was executing at shutdown.
    pub requests_recovery: bool,
    /// The data map returned by the job replaces the stored one.
    pub persist_data_after_execution: bool,
    /// At most one execution per job identity at a time.
    pub disallow_concurrent_execution: bool,
}

impl JobDetail {
    pub fn new(key: JobKey, job_class: impl Into<String>) -> Self {
        Self {
            key,
            job_class: job_class.into(),
            description: None,
            data_map: JobDataMap::new(),
            durable: false,
            requests_recovery: false,
            persist_data_after_execution: false,
            disallow_concurrent_execution: false,
        }
    }

    pub fn durable(mut self, durable: bool) -> Self {
        self.durable = durable;
        self
    }

    pub fn requests_recovery(mut self, requests_recovery: bool) -> Self {
        self.requests_recovery = requests_recovery;
        self
    }

    pub fn disallow_concurrent_execution(mut self, disallow: bool) -> Self {
        self.disallow_concurrent_execution = disallow;
        self
    }

    pub fn persist_data_after_execution(mut self, persist: bool) -> Self {
        self.persist_data_after_execution = persist;
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<JobDataValue>) -> Self {
        self.data_map.insert(key.into(), value.into());
        self
    }
}

/// Result of one job execution, as reported back to the run shell.
#[derive(Debug, Default)]
pub struct JobExecutionOutcome {
    /// If `persist_data_after_execution`, this replaces the stored data map.
    pub updated_data_map: Option<JobDataMap>,
}

/// Error a job's `execute` can return to steer the run shell's completion
/// instruction beyond the default (§4.6). Any other error is treated as a
/// plain failure and puts the trigger into the error state.
#[derive(Debug, thiserror::Error)]
#[error("job execution failed: {message}")]
pub struct JobExecutionError {
    pub message: String,
    pub refire_immediately: bool,
    pub unschedule_firing_trigger: bool,
    pub unschedule_all_triggers: bool,
}

impl JobExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            refire_immediately: false,
            unschedule_firing_trigger: false,
            unschedule_all_triggers: false,
        }
    }

    pub fn refire_immediately(mut self) -> Self {
        self.refire_immediately = true;
        self
    }

    pub fn unschedule_firing_trigger(mut self) -> Self {
        self.unschedule_firing_trigger = true;
        self
    }

    pub fn unschedule_all_triggers(mut self) -> Self {
        self.unschedule_all_triggers = true;
        self
    }
}

/// Executable job behaviour, resolved from a `JobDetail::job_class` by a
/// `JobFactory`. Kept deliberately small: the store only ever holds the
/// opaque class string, never a `dyn Job`.
pub trait Job: Send {
    /// Runs the job body. Errors are caught by the run shell and turned into
    /// a completion instruction rather than propagated raw.
    fn execute(
        &mut self,
        context: &mut super::context::JobExecutionContext,
    ) -> anyhow::Result<JobExecutionOutcome>;
}

impl fmt::Debug for dyn Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn Job")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_job_detail_has_sane_defaults() {
        let job = JobDetail::new(JobKey::new("job1"), "com.example.SomeJob");
        assert!(!job.durable);
        assert!(!job.requests_recovery);
        assert!(!job.disallow_concurrent_execution);
        assert!(job.data_map.is_empty());
    }

    #[test]
    fn builder_methods_set_flags() {
        let job = JobDetail::new(JobKey::new("job1"), "class")
            .durable(true)
            .requests_recovery(true)
            .disallow_concurrent_execution(true)
            .with_data("foo", serde_json::json!("bar"));
        assert!(job.durable);
        assert!(job.requests_recovery);
        assert!(job.disallow_concurrent_execution);
        assert_eq!(job.data_map.get("foo").unwrap(), "bar");
    }
}
