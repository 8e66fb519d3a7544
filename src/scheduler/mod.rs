//! Scheduler subsystem
//!
//! Wires together the dispatcher loop, worker pool, signaler, listener
//! broadcaster, job factory, and job run shell behind the `JobScheduler`
//! façade (§4, §6).

pub mod config;
pub mod dispatcher;
pub mod facade;
pub mod job_factory;
pub mod job_runshell;
pub mod listeners;
pub mod registry;
pub mod signaler;
pub mod worker_pool;

pub use config::SchedulerConfig;
pub use facade::{InterruptTarget, JobScheduler};
pub use job_factory::{FnJobFactory, JobFactory};
pub use listeners::{JobListener, ListenerManager, SchedulerListener, TracingJobListener, TracingTriggerListener, TriggerListener};
