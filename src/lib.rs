//! JobWeaver: a reliable, pluggable-store job scheduler core.
//!
//! `scheduler::JobScheduler` is the entry point most callers want; the
//! `domain` and `cron` modules are exposed for callers who implement their
//! own `domain::store::JobStore`.

pub mod cron;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod scheduler;

pub use domain::entities;
pub use domain::entities::Job;
pub use domain::value_objects;
pub use error::{SchedulerError, SchedulerResult};
pub use scheduler::{JobScheduler, SchedulerConfig};
