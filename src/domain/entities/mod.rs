pub mod calendar;
pub mod context;
pub mod identity;
pub mod job;
pub mod trigger;

pub use calendar::{Calendar, ExclusionDatesCalendar};
pub use context::JobExecutionContext;
pub use identity::{JobKey, Key, Matcher, TriggerKey, DEFAULT_GROUP};
pub use job::{Job, JobDataMap, JobDataValue, JobDetail, JobExecutionOutcome};
pub use trigger::{Trigger, TriggerState};
