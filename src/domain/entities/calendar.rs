//! Calendar module
//!
//! A calendar is a predicate over instants; a trigger associated with one
//! skips any fire instant the calendar excludes (§4.2 "Calendar
//! filtering"). This crate ships a single concrete implementation —
//! exclusion by date — sufficient to exercise the interface; richer
//! calendars (annual, weekly, cron-based) are a store-implementation
//! concern, matching the "calendar evaluation beyond its interface" item
//! in the out-of-scope list.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// A predicate over fire instants, plus the ability to find the next
/// instant it does *not* exclude (used when an excluded instant must be
/// skipped forward rather than simply rejected).
pub trait Calendar: fmt::Debug + Send + Sync {
    fn is_time_included(&self, timestamp: DateTime<Utc>) -> bool;

    /// The next instant at or after `timestamp` this calendar does not
    /// exclude. Implementations that exclude whole days should round up to
    /// the first included instant of the next eligible day.
    fn next_included_time(&self, timestamp: DateTime<Utc>) -> Option<DateTime<Utc>>;

    fn description(&self) -> &str;
}

/// Excludes whole calendar dates (in UTC) named explicitly — the "holiday
/// calendar" pattern: a fixed set of dates a trigger should never fire on.
#[derive(Debug, Clone, Default)]
pub struct ExclusionDatesCalendar {
    description: String,
    excluded_dates: BTreeSet<NaiveDate>,
}

impl ExclusionDatesCalendar {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            excluded_dates: BTreeSet::new(),
        }
    }

    pub fn exclude_date(mut self, date: NaiveDate) -> Self {
        self.excluded_dates.insert(date);
        self
    }

    /// A calendar that excludes every date: any trigger bound to it
    /// completes immediately (§4.2, "A calendar that excludes all time").
    pub fn excluding_everything(description: impl Into<String>) -> AlwaysExcludeCalendar {
        AlwaysExcludeCalendar { description: description.into() }
    }
}

impl Calendar for ExclusionDatesCalendar {
    fn is_time_included(&self, timestamp: DateTime<Utc>) -> bool {
        !self.excluded_dates.contains(&timestamp.date_naive())
    }

    fn next_included_time(&self, timestamp: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let mut candidate = timestamp;
        // Bounded: a calendar that excludes an unbroken, unbounded run of
        // dates would loop forever; cap the search at a few years of days.
        for _ in 0..(366 * 5) {
            if self.is_time_included(candidate) {
                return Some(candidate);
            }
            candidate = candidate.date_naive().succ_opt()?.and_hms_opt(0, 0, 0)?.and_utc();
        }
        None
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Always excludes every instant. Used to model "a calendar that excludes
/// all time" (§4.2).
#[derive(Debug, Clone)]
pub struct AlwaysExcludeCalendar {
    description: String,
}

impl Calendar for AlwaysExcludeCalendar {
    fn is_time_included(&self, _timestamp: DateTime<Utc>) -> bool {
        false
    }

    fn next_included_time(&self, _timestamp: DateTime<Utc>) -> Option<DateTime<Utc>> {
        None
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Advances `candidate` until `calendar` includes it, calling `next_after`
/// to produce each new candidate when excluded. Returns `None` if
/// `next_after` runs out of instants or the calendar has no next included
/// time reachable from the advancing sequence.
pub fn skip_excluded<F>(
    calendar: &dyn Calendar,
    mut candidate: DateTime<Utc>,
    mut next_after: F,
) -> Option<DateTime<Utc>>
where
    F: FnMut(DateTime<Utc>) -> Option<DateTime<Utc>>,
{
    // Bounded retry: guards against a pathological calendar/trigger pairing
    // that would otherwise loop indefinitely (e.g. a cron expression that
    // only ever lands on excluded dates within the calendar's search bound).
    for _ in 0..10_000 {
        if calendar.is_time_included(candidate) {
            return Some(candidate);
        }
        candidate = next_after(candidate + Duration::zero())?;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn excludes_named_date() {
        let cal = ExclusionDatesCalendar::new("test")
            .exclude_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let excluded = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let included = Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap();
        assert!(!cal.is_time_included(excluded));
        assert!(cal.is_time_included(included));
    }

    #[test]
    fn always_exclude_calendar_excludes_everything() {
        let cal = ExclusionDatesCalendar::excluding_everything("none");
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(!cal.is_time_included(t));
        assert!(cal.next_included_time(t).is_none());
    }
}
