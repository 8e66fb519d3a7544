//! Trigger-fired bundle value object module
//!
//! The snapshot `triggersFired` (§4.3) hands back per acquired trigger: a
//! frozen copy of everything the job run shell needs, carried by value so
//! the shell never reaches back into the store mid-execution.

use chrono::{DateTime, Utc};

use crate::domain::entities::identity::TriggerKey;
use crate::domain::entities::job::JobDetail;
use crate::domain::entities::trigger::Trigger;

#[derive(Debug, Clone)]
pub struct TriggerFiredBundle {
    pub job_detail: JobDetail,
    pub trigger: Trigger,
    pub calendar_name: Option<String>,
    pub is_recovering: bool,
    pub recovering_trigger_key: Option<TriggerKey>,
    pub fire_time: DateTime<Utc>,
    pub scheduled_fire_time: DateTime<Utc>,
    pub previous_fire_time: Option<DateTime<Utc>>,
    pub next_fire_time: Option<DateTime<Utc>>,
}
