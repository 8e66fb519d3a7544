//! Public error taxonomy module
//!
//! A single `SchedulerError` type is returned from every scheduler-façade
//! and job-store operation. Callers pattern-match on its variants rather
//! than on an open hierarchy (§7).

use thiserror::Error;

use crate::domain::entities::identity::{JobKey, TriggerKey};

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("job store operation failed: {0}")]
    JobPersistenceError(#[source] anyhow::Error),

    #[error("object already exists: {0}")]
    ObjectAlreadyExistsError(String),

    #[error("job {0} could not be interrupted")]
    UnableToInterruptJobError(JobKey),

    #[error("invalid scheduler configuration: {0}")]
    SchedulerConfigError(String),

    #[error("illegal argument: {0}")]
    IllegalArgumentError(String),

    #[error("scheduler has already been shut down")]
    SchedulerShutdownError,

    #[error("unknown trigger: {0}")]
    TriggerNotFoundError(TriggerKey),

    #[error("unknown job: {0}")]
    JobNotFoundError(JobKey),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
