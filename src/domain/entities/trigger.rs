//! Trigger module
//!
//! A trigger is modeled as a closed, tagged variant (§9: "avoid an open
//! hierarchy — variants are closed and versioned with the persistence
//! format") rather than a trait object, since next-fire computation is a
//! match over exactly four known shapes.

use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, Utc};
use chrono_tz::Tz;

use crate::cron::CronExpression;
use crate::domain::value_objects::priority::{Priority, DEFAULT_PRIORITY};

use super::calendar::{skip_excluded, Calendar};
use super::identity::{JobKey, TriggerKey};
use super::job::JobDataMap;

/// Where a trigger sits in its firing lifecycle (§3 "State machine").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerState {
    Waiting,
    Acquired,
    Executing,
    Paused,
    PausedBlocked,
    Blocked,
    Complete,
    Error,
    /// Returned by `getTriggerState` for a key the store does not hold.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CronMisfireInstruction {
    FireOnceNow,
    DoNothing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleMisfireInstruction {
    FireNow,
    RescheduleNowWithExistingRepeatCount,
    RescheduleNowWithRemainingRepeatCount,
    RescheduleNextWithRemainingCount,
    RescheduleNextWithExistingCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalMisfireInstruction {
    FireNow,
    DoNothing,
}

/// Fields common to every trigger variant.
#[derive(Debug, Clone)]
pub struct TriggerCore {
    pub key: TriggerKey,
    pub job_key: JobKey,
    pub calendar_name: Option<String>,
    pub priority: Priority,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub previous_fire_time: Option<DateTime<Utc>>,
    pub next_fire_time: Option<DateTime<Utc>>,
    pub data_map: JobDataMap,
    pub state: TriggerState,
}

impl TriggerCore {
    pub fn new(key: TriggerKey, job_key: JobKey, start_time: DateTime<Utc>) -> Self {
        Self {
            key,
            job_key,
            calendar_name: None,
            priority: Priority::new(DEFAULT_PRIORITY),
            start_time,
            end_time: None,
            previous_fire_time: None,
            next_fire_time: None,
            data_map: JobDataMap::new(),
            state: TriggerState::Waiting,
        }
    }

    /// "Trigger whose startTime > endTime completes immediately" (§8).
    pub fn starts_after_it_ends(&self) -> bool {
        matches!(self.end_time, Some(end) if self.start_time > end)
    }
}

#[derive(Debug, Clone)]
pub struct SimpleTrigger {
    pub core: TriggerCore,
    /// -1 means infinite.
    pub repeat_count: i32,
    pub repeat_interval: ChronoDuration,
    pub times_triggered: u32,
    pub misfire_instruction: SimpleMisfireInstruction,
}

#[derive(Debug, Clone)]
pub struct CronTrigger {
    pub core: TriggerCore,
    pub cron_expression: CronExpression,
    pub time_zone: Tz,
    pub misfire_instruction: CronMisfireInstruction,
}

#[derive(Debug, Clone)]
pub struct CalendarIntervalTrigger {
    pub core: TriggerCore,
    pub repeat_interval: ChronoDuration,
    pub times_triggered: u32,
    pub misfire_instruction: IntervalMisfireInstruction,
}

#[derive(Debug, Clone)]
pub struct DailyTimeIntervalTrigger {
    pub core: TriggerCore,
    pub repeat_interval: ChronoDuration,
    pub start_time_of_day: NaiveTime,
    pub end_time_of_day: NaiveTime,
    pub times_triggered: u32,
    pub misfire_instruction: IntervalMisfireInstruction,
}

#[derive(Debug, Clone)]
pub enum Trigger {
    Simple(SimpleTrigger),
    Cron(CronTrigger),
    CalendarInterval(CalendarIntervalTrigger),
    DailyTimeInterval(DailyTimeIntervalTrigger),
}

impl Trigger {
    pub fn core(&self) -> &TriggerCore {
        match self {
            Trigger::Simple(t) => &t.core,
            Trigger::Cron(t) => &t.core,
            Trigger::CalendarInterval(t) => &t.core,
            Trigger::DailyTimeInterval(t) => &t.core,
        }
    }

    pub fn core_mut(&mut self) -> &mut TriggerCore {
        match self {
            Trigger::Simple(t) => &mut t.core,
            Trigger::Cron(t) => &mut t.core,
            Trigger::CalendarInterval(t) => &mut t.core,
            Trigger::DailyTimeInterval(t) => &mut t.core,
        }
    }

    pub fn key(&self) -> &TriggerKey {
        &self.core().key
    }

    pub fn job_key(&self) -> &JobKey {
        &self.core().job_key
    }

    pub fn state(&self) -> TriggerState {
        self.core().state
    }

    pub fn set_state(&mut self, state: TriggerState) {
        self.core_mut().state = state;
    }

    pub fn next_fire_time(&self) -> Option<DateTime<Utc>> {
        self.core().next_fire_time
    }

    /// `computeFirstFireTime` (§4.2): establishes `nextFireTime` from
    /// `startTime`. Immediately completes a trigger whose window is empty.
    pub fn compute_first_fire_time(&mut self, calendar: Option<&dyn Calendar>) {
        if self.core().starts_after_it_ends() {
            self.core_mut().next_fire_time = None;
            self.core_mut().state = TriggerState::Complete;
            return;
        }
        let start = self.core().start_time;
        let first = self.fire_time_after_uncalendared(start - ChronoDuration::seconds(1));
        let first = self.apply_calendar_and_end_time(first, calendar);
        self.core_mut().next_fire_time = first;
        if first.is_none() {
            self.core_mut().state = TriggerState::Complete;
        }
    }

    /// `getFireTimeAfter` (§4.2): pure peek, does not mutate trigger state.
    pub fn fire_time_after(&self, after: DateTime<Utc>, calendar: Option<&dyn Calendar>) -> Option<DateTime<Utc>> {
        let candidate = self.fire_time_after_uncalendared(after);
        self.apply_calendar_and_end_time(candidate, calendar)
    }

    fn apply_calendar_and_end_time(
        &self,
        candidate: Option<DateTime<Utc>>,
        calendar: Option<&dyn Calendar>,
    ) -> Option<DateTime<Utc>> {
        let mut candidate = candidate?;
        if let Some(cal) = calendar {
            candidate = skip_excluded(cal, candidate, |c| self.fire_time_after_uncalendared(c))?;
        }
        if let Some(end) = self.core().end_time {
            if candidate > end {
                return None;
            }
        }
        Some(candidate)
    }

    fn fire_time_after_uncalendared(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Trigger::Simple(t) => simple_fire_time_after(t, after),
            Trigger::Cron(t) => cron_fire_time_after(t, after),
            Trigger::CalendarInterval(t) => interval_fire_time_after(t.repeat_interval, after, self.core()),
            Trigger::DailyTimeInterval(t) => daily_time_interval_fire_time_after(t, after),
        }
    }

    /// `triggered` (§4.2): advance state after this trigger has fired once.
    pub fn triggered(&mut self, calendar: Option<&dyn Calendar>) {
        let previous = self.core().next_fire_time;
        self.core_mut().previous_fire_time = previous;
        match self {
            Trigger::Simple(t) => t.times_triggered += 1,
            Trigger::CalendarInterval(t) => t.times_triggered += 1,
            Trigger::DailyTimeInterval(t) => t.times_triggered += 1,
            Trigger::Cron(_) => {}
        }
        let after = previous.unwrap_or(self.core().start_time);
        let next = self.fire_time_after_uncalendared(after);
        let next = self.apply_calendar_and_end_time(next, calendar);
        self.core_mut().next_fire_time = next;
    }

    /// `updateAfterMisfire` (§4.2).
    pub fn update_after_misfire(&mut self, now: DateTime<Utc>, calendar: Option<&dyn Calendar>) {
        match self {
            Trigger::Cron(t) => match t.misfire_instruction {
                CronMisfireInstruction::FireOnceNow => {
                    // Fire once at `now`, then resume the regular schedule
                    // from there — one catch-up fire, not one per missed
                    // interval.
                    self.core_mut().next_fire_time = Some(now);
                }
                CronMisfireInstruction::DoNothing => {
                    let next = self.fire_time_after(now, calendar);
                    self.core_mut().next_fire_time = next;
                    if next.is_none() {
                        self.core_mut().state = TriggerState::Complete;
                    }
                }
            },
            Trigger::Simple(t) => {
                let instruction = t.misfire_instruction;
                update_simple_after_misfire(t, now, instruction);
            }
            Trigger::CalendarInterval(t) => {
                if matches!(t.misfire_instruction, IntervalMisfireInstruction::DoNothing) {
                    let next = self.fire_time_after(now, calendar);
                    self.core_mut().next_fire_time = next;
                }
            }
            Trigger::DailyTimeInterval(t) => {
                if matches!(t.misfire_instruction, IntervalMisfireInstruction::DoNothing) {
                    let next = self.fire_time_after(now, calendar);
                    self.core_mut().next_fire_time = next;
                }
            }
        }
    }
}

fn simple_fire_time_after(t: &SimpleTrigger, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if t.repeat_count != -1 && t.times_triggered as i64 > t.repeat_count as i64 {
        return None;
    }
    let base = t.core.next_fire_time.unwrap_or(t.core.start_time);
    let mut next = base;
    if next <= after {
        while next <= after {
            next += t.repeat_interval;
        }
    }
    Some(next)
}

fn update_simple_after_misfire(
    t: &mut SimpleTrigger,
    now: DateTime<Utc>,
    instruction: SimpleMisfireInstruction,
) {
    match instruction {
        SimpleMisfireInstruction::FireNow => {
            t.core.next_fire_time = Some(now);
        }
        SimpleMisfireInstruction::RescheduleNowWithExistingRepeatCount => {
            // Keep the original total fire count intact: jump straight to
            // the next regularly-scheduled instant after `now` without
            // touching times_triggered, so the series still runs for its
            // full repeat_count, just later in wall-clock than planned.
            t.core.next_fire_time = simple_fire_time_after(t, now);
        }
        SimpleMisfireInstruction::RescheduleNowWithRemainingRepeatCount => {
            // Treat the fires missed during the misfire window as already
            // consumed, so the series still completes at its
            // originally-intended final fire instant instead of extending.
            let next = simple_fire_time_after(t, now);
            if let Some(next) = next {
                t.times_triggered = t.times_triggered.saturating_add(times_missed_between(t, next));
            }
            t.core.next_fire_time = next;
        }
        SimpleMisfireInstruction::RescheduleNextWithRemainingCount => {
            // Fire now, and carry forward only the fires not yet consumed.
            if t.repeat_count > 0 {
                t.repeat_count -= t.times_triggered as i32;
            }
            t.times_triggered = 0;
            t.core.start_time = now;
            t.core.next_fire_time = Some(now);
        }
        SimpleMisfireInstruction::RescheduleNextWithExistingCount => {
            // Fire now and restart the clock, but keep the full original
            // repeat_count/times_triggered so the series still runs its
            // originally-intended number of fires from this point.
            t.core.start_time = now;
            t.core.next_fire_time = Some(now);
        }
    }
}

/// Number of `repeat_interval` boundaries between the trigger's current
/// (stale) `next_fire_time` and `new_next`, used by the "remaining repeat
/// count" misfire instruction to treat skipped fires as already consumed.
fn times_missed_between(t: &SimpleTrigger, new_next: DateTime<Utc>) -> u32 {
    if t.repeat_interval <= ChronoDuration::zero() {
        return 0;
    }
    let old = t.core.next_fire_time.unwrap_or(t.core.start_time);
    let elapsed_ms = (new_next - old).num_milliseconds();
    if elapsed_ms <= 0 {
        return 0;
    }
    (elapsed_ms / t.repeat_interval.num_milliseconds().max(1)) as u32
}

fn cron_fire_time_after(t: &CronTrigger, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let after_tz = after.with_timezone(&t.time_zone);
    let next = t.cron_expression.next_after(after_tz)?;
    Some(next.with_timezone(&Utc))
}

fn interval_fire_time_after(
    interval: ChronoDuration,
    after: DateTime<Utc>,
    core: &TriggerCore,
) -> Option<DateTime<Utc>> {
    let base = core.next_fire_time.unwrap_or(core.start_time);
    let mut next = base;
    if next <= after {
        while next <= after {
            next += interval;
        }
    }
    Some(next)
}

fn daily_time_interval_fire_time_after(t: &DailyTimeIntervalTrigger, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let base = t.core.next_fire_time.unwrap_or(t.core.start_time);
    // Steps from `base` by repeat_interval, clamped to the daily
    // [start_time_of_day, end_time_of_day] window; crossing the end of the
    // window rolls over to start_time_of_day the following day.
    let mut next = base;
    loop {
        if next <= after {
            next += t.repeat_interval;
        }
        let tod = next.time();
        if tod > t.end_time_of_day {
            let next_day = (next + ChronoDuration::days(1)).date_naive();
            next = next_day.and_time(t.start_time_of_day).and_utc();
            continue;
        }
        if tod < t.start_time_of_day {
            next = next.date_naive().and_time(t.start_time_of_day).and_utc();
            continue;
        }
        if next > after {
            return Some(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::identity::{JobKey, TriggerKey};
    use chrono::TimeZone;
    use std::str::FromStr;

    fn start_at(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, mi, s).unwrap()
    }

    #[test]
    fn simple_trigger_fires_expected_sequence() {
        let core = TriggerCore::new(TriggerKey::new("t1"), JobKey::new("j1"), start_at(2024, 1, 1, 0, 0, 0));
        let mut trigger = Trigger::Simple(SimpleTrigger {
            core,
            repeat_count: 4,
            repeat_interval: ChronoDuration::seconds(60),
            times_triggered: 0,
            misfire_instruction: SimpleMisfireInstruction::FireNow,
        });
        trigger.compute_first_fire_time(None);
        let mut fires = vec![trigger.next_fire_time().unwrap()];
        for _ in 0..5 {
            trigger.triggered(None);
            if let Some(t) = trigger.next_fire_time() {
                fires.push(t);
            }
        }
        assert_eq!(fires.len(), 5);
        assert_eq!(fires[4], start_at(2024, 1, 1, 0, 4, 0));
    }

    #[test]
    fn starts_after_ends_completes_immediately() {
        let mut core = TriggerCore::new(TriggerKey::new("t1"), JobKey::new("j1"), start_at(2024, 1, 2, 0, 0, 0));
        core.end_time = Some(start_at(2024, 1, 1, 0, 0, 0));
        let mut trigger = Trigger::Simple(SimpleTrigger {
            core,
            repeat_count: -1,
            repeat_interval: ChronoDuration::seconds(60),
            times_triggered: 0,
            misfire_instruction: SimpleMisfireInstruction::FireNow,
        });
        trigger.compute_first_fire_time(None);
        assert!(trigger.next_fire_time().is_none());
        assert_eq!(trigger.state(), TriggerState::Complete);
    }

    #[test]
    fn cron_trigger_first_fire_matches_start_aligned_instant() {
        let cron = CronExpression::from_str("0 0 12 * * ?").unwrap();
        let core = TriggerCore::new(TriggerKey::new("t1"), JobKey::new("j1"), start_at(2024, 1, 1, 0, 0, 0));
        let mut trigger = Trigger::Cron(CronTrigger {
            core,
            cron_expression: cron,
            time_zone: chrono_tz::UTC,
            misfire_instruction: CronMisfireInstruction::DoNothing,
        });
        trigger.compute_first_fire_time(None);
        assert_eq!(trigger.next_fire_time().unwrap(), start_at(2024, 1, 1, 12, 0, 0));
    }

    #[test]
    fn existing_repeat_count_misfire_leaves_times_triggered_untouched() {
        let core = TriggerCore::new(TriggerKey::new("t1"), JobKey::new("j1"), start_at(2024, 1, 1, 0, 0, 0));
        let mut t = SimpleTrigger {
            core,
            repeat_count: 10,
            repeat_interval: ChronoDuration::seconds(60),
            times_triggered: 2,
            misfire_instruction: SimpleMisfireInstruction::RescheduleNowWithExistingRepeatCount,
        };
        t.core.next_fire_time = Some(start_at(2024, 1, 1, 0, 2, 0));
        let now = start_at(2024, 1, 1, 0, 10, 0);
        update_simple_after_misfire(&mut t, now, t.misfire_instruction);
        assert_eq!(t.times_triggered, 2);
        assert_eq!(t.core.next_fire_time, Some(start_at(2024, 1, 1, 0, 11, 0)));
    }

    #[test]
    fn remaining_repeat_count_misfire_consumes_missed_fires() {
        let core = TriggerCore::new(TriggerKey::new("t1"), JobKey::new("j1"), start_at(2024, 1, 1, 0, 0, 0));
        let mut t = SimpleTrigger {
            core,
            repeat_count: 10,
            repeat_interval: ChronoDuration::seconds(60),
            times_triggered: 2,
            misfire_instruction: SimpleMisfireInstruction::RescheduleNowWithRemainingRepeatCount,
        };
        t.core.next_fire_time = Some(start_at(2024, 1, 1, 0, 2, 0));
        // Nine intervals have elapsed between the stale next_fire_time
        // (00:02) and the recomputed one (00:11).
        let now = start_at(2024, 1, 1, 0, 10, 0);
        update_simple_after_misfire(&mut t, now, t.misfire_instruction);
        assert_eq!(t.times_triggered, 2 + 9);
        assert_eq!(t.core.next_fire_time, Some(start_at(2024, 1, 1, 0, 11, 0)));
    }

    #[test]
    fn next_with_remaining_count_resets_times_triggered_and_shrinks_repeat_count() {
        let core = TriggerCore::new(TriggerKey::new("t1"), JobKey::new("j1"), start_at(2024, 1, 1, 0, 0, 0));
        let mut t = SimpleTrigger {
            core,
            repeat_count: 10,
            repeat_interval: ChronoDuration::seconds(60),
            times_triggered: 3,
            misfire_instruction: SimpleMisfireInstruction::RescheduleNextWithRemainingCount,
        };
        let now = start_at(2024, 1, 1, 1, 0, 0);
        update_simple_after_misfire(&mut t, now, t.misfire_instruction);
        assert_eq!(t.repeat_count, 7);
        assert_eq!(t.times_triggered, 0);
        assert_eq!(t.core.start_time, now);
        assert_eq!(t.core.next_fire_time, Some(now));
    }

    #[test]
    fn next_with_existing_count_keeps_repeat_count_and_times_triggered() {
        let core = TriggerCore::new(TriggerKey::new("t1"), JobKey::new("j1"), start_at(2024, 1, 1, 0, 0, 0));
        let mut t = SimpleTrigger {
            core,
            repeat_count: 10,
            repeat_interval: ChronoDuration::seconds(60),
            times_triggered: 3,
            misfire_instruction: SimpleMisfireInstruction::RescheduleNextWithExistingCount,
        };
        let now = start_at(2024, 1, 1, 1, 0, 0);
        update_simple_after_misfire(&mut t, now, t.misfire_instruction);
        assert_eq!(t.repeat_count, 10);
        assert_eq!(t.times_triggered, 3);
        assert_eq!(t.core.start_time, now);
        assert_eq!(t.core.next_fire_time, Some(now));
    }
}
