//! Cron expression evaluation module
//!
//! `CronExpression` is the parsed, immutable representation of a cron
//! string. `next_after` is the "bump and retry" traversal described in
//! spec §4.1: walk the least-significant constrained field forward,
//! carrying into the next field on overflow, until every field agrees or
//! the year exceeds 2099.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use chrono_tz::Tz;

use super::error::CronParseError;
use super::fields::{DayOfMonthField, DayOfWeekField};
use super::parser;

const MAX_YEAR: i32 = 2099;

/// A fully parsed Unix-cron-style expression, bound to no particular time
/// zone until evaluated (`next_after` takes the zone explicitly, matching
/// the way a `CronTrigger` carries its own `TimeZone` alongside the
/// expression).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronExpression {
    pub(crate) seconds: BTreeSet<u32>,
    pub(crate) minutes: BTreeSet<u32>,
    pub(crate) hours: BTreeSet<u32>,
    pub(crate) day_of_month: DayOfMonthField,
    pub(crate) months: BTreeSet<u32>,
    pub(crate) day_of_week: DayOfWeekField,
    pub(crate) years: BTreeSet<i32>,
    source: String,
}

impl FromStr for CronExpression {
    type Err = CronParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}

impl CronExpression {
    pub fn parse(text: &str) -> Result<Self, CronParseError> {
        let fields: Vec<&str> = text.split_whitespace().collect();
        if fields.len() != 6 && fields.len() != 7 {
            return Err(CronParseError::WrongFieldCount { found: fields.len() });
        }

        let seconds = parser::parse_value_list(&parser::SECONDS, fields[0])?;
        let minutes = parser::parse_value_list(&parser::MINUTES, fields[1])?;
        let hours = parser::parse_value_list(&parser::HOURS, fields[2])?;
        let day_of_month = parser::parse_day_of_month(fields[3])?;
        let months = parser::parse_value_list(&parser::MONTH, fields[4])?;
        let day_of_week = parser::parse_day_of_week(fields[5])?;
        let years = if fields.len() == 7 {
            parser::parse_value_list(&parser::YEAR, fields[6])?
                .into_iter()
                .map(|v| v as i32)
                .collect()
        } else {
            (parser::YEAR.min as i32..=parser::YEAR.max as i32).collect()
        };

        match (day_of_month.is_unspecified(), day_of_week.is_unspecified()) {
            (true, true) => return Err(CronParseError::BothFieldsUnspecified),
            (false, false) => return Err(CronParseError::NeitherFieldUnspecified),
            _ => {}
        }

        Ok(Self {
            seconds,
            minutes,
            hours,
            day_of_month,
            months,
            day_of_week,
            years,
            source: text.trim().to_string(),
        })
    }

    /// The canonical, re-parseable re-serialization of this expression used
    /// by the cron round-trip property: sorted lists, collapsed whitespace.
    /// Not a byte-for-byte echo of the original input text.
    pub fn canonical(&self) -> String {
        self.to_string()
    }

    /// The original text this expression was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Computes the next fire instant strictly after `after`, evaluated in
    /// `tz`. Returns `None` if no instant satisfies the expression before
    /// the year exceeds 2099 (§4.1).
    pub fn next_after(&self, after: DateTime<Tz>) -> Option<DateTime<Tz>> {
        let local = after.with_timezone(&after.timezone());
        let naive = local.naive_local() + Duration::seconds(1);
        let tz = after.timezone();
        self.next_after_naive(naive, tz, Some(after))
    }

    /// Same as `next_after` but starting from a naive local wall-clock time
    /// (used by tests that don't want to construct a zoned instant first).
    pub fn next_after_naive(
        &self,
        start: NaiveDateTime,
        tz: Tz,
        not_before: Option<DateTime<Tz>>,
    ) -> Option<DateTime<Tz>> {
        let mut year = start.year();
        let mut month = start.month();
        let mut day = start.day();
        let mut hour = start.hour();
        let mut minute = start.minute();
        let mut second = start.second();

        loop {
            if year > MAX_YEAR {
                return None;
            }

            // seconds
            match self.seconds.range(second..).next() {
                Some(&s) => second = s,
                None => {
                    second = *self.seconds.iter().next().unwrap();
                    minute += 1;
                    if minute > 59 {
                        minute = 0;
                        hour += 1;
                    }
                    if hour > 23 {
                        hour = 0;
                        day += 1;
                        let (ny, nm, nd) = normalize_day_overflow(year, month, day);
                        year = ny;
                        month = nm;
                        day = nd;
                    }
                    continue;
                }
            }

            // minutes
            match self.minutes.range(minute..).next() {
                Some(&m) if m == minute => {}
                Some(&m) => {
                    minute = m;
                    second = *self.seconds.iter().next().unwrap();
                    continue;
                }
                None => {
                    minute = *self.minutes.iter().next().unwrap();
                    second = *self.seconds.iter().next().unwrap();
                    hour += 1;
                    if hour > 23 {
                        hour = 0;
                        day += 1;
                        let (ny, nm, nd) = normalize_day_overflow(year, month, day);
                        year = ny;
                        month = nm;
                        day = nd;
                    }
                    continue;
                }
            }

            // hours
            match self.hours.range(hour..).next() {
                Some(&h) if h == hour => {}
                Some(&h) => {
                    hour = h;
                    minute = *self.minutes.iter().next().unwrap();
                    second = *self.seconds.iter().next().unwrap();
                    continue;
                }
                None => {
                    hour = *self.hours.iter().next().unwrap();
                    minute = *self.minutes.iter().next().unwrap();
                    second = *self.seconds.iter().next().unwrap();
                    day += 1;
                    let (ny, nm, nd) = normalize_day_overflow(year, month, day);
                    year = ny;
                    month = nm;
                    day = nd;
                    continue;
                }
            }

            // day (day-of-month XOR day-of-week constrains)
            match self.advance_day(year, month, day) {
                DayStep::Match => {}
                DayStep::Advance { new_year, new_month, new_day } => {
                    year = new_year;
                    month = new_month;
                    day = new_day;
                    hour = 0;
                    minute = *self.minutes.iter().next().unwrap();
                    second = *self.seconds.iter().next().unwrap();
                    continue;
                }
                DayStep::NoSuchDay => {
                    // advance_day already normalized month/day for retry
                    let (new_year, new_month, new_day) = self.next_month_start(year, month);
                    year = new_year;
                    month = new_month;
                    day = new_day;
                    hour = 0;
                    minute = *self.minutes.iter().next().unwrap();
                    second = *self.seconds.iter().next().unwrap();
                    continue;
                }
            }

            // month
            match self.months.range(month..).next() {
                Some(&m) if m == month => {}
                Some(&m) => {
                    month = m;
                    day = 1;
                    hour = 0;
                    minute = *self.minutes.iter().next().unwrap();
                    second = *self.seconds.iter().next().unwrap();
                    continue;
                }
                None => {
                    month = *self.months.iter().next().unwrap();
                    day = 1;
                    hour = 0;
                    minute = *self.minutes.iter().next().unwrap();
                    second = *self.seconds.iter().next().unwrap();
                    year += 1;
                    continue;
                }
            }

            // year
            match self.years.range(year..).next() {
                Some(&y) if y == year => {}
                Some(&y) => {
                    year = y;
                    month = *self.months.iter().next().unwrap();
                    day = 1;
                    hour = 0;
                    minute = *self.minutes.iter().next().unwrap();
                    second = *self.seconds.iter().next().unwrap();
                    continue;
                }
                None => return None,
            }

            // all fields agree: try to build a real local date/time. An
            // invalid (DST spring-forward gap) local time is treated as
            // non-existent -- advance one second and retry.
            let date = match NaiveDate::from_ymd_opt(year, month, day) {
                Some(d) => d,
                None => {
                    // shouldn't happen: advance_day only returns valid dates
                    second += 1;
                    continue;
                }
            };
            let time = match NaiveTime::from_hms_opt(hour, minute, second) {
                Some(t) => t,
                None => {
                    second = 0;
                    minute += 1;
                    continue;
                }
            };
            let candidate_naive = NaiveDateTime::new(date, time);

            match tz.from_local_datetime(&candidate_naive) {
                chrono::LocalResult::Single(dt) => {
                    if let Some(floor) = not_before {
                        if dt <= floor {
                            second += 1;
                            continue;
                        }
                    }
                    return Some(dt);
                }
                chrono::LocalResult::Ambiguous(earliest, _latest) => {
                    // fall back: fires once, at the first occurrence.
                    if let Some(floor) = not_before {
                        if earliest <= floor {
                            second += 1;
                            continue;
                        }
                    }
                    return Some(earliest);
                }
                chrono::LocalResult::None => {
                    // spring-forward gap: this local time does not exist.
                    // "Forgotten" policy (spec §9 open question): skip
                    // forward past the gap entirely.
                    second += 1;
                    continue;
                }
            }
        }
    }

    fn next_month_start(&self, year: i32, month: u32) -> (i32, u32, u32) {
        if month >= 12 {
            (year + 1, 1, 1)
        } else {
            (year, month + 1, 1)
        }
    }

    /// Evaluates the day-of-month/day-of-week constraint (exactly one is
    /// active) for the given `(year, month, day)`, returning whether it
    /// matches, or how to advance.
    fn advance_day(&self, year: i32, month: u32, day: u32) -> DayStep {
        let last_day = last_day_of_month(year, month);
        if !self.day_of_month.is_unspecified() {
            self.advance_day_of_month(year, month, day, last_day)
        } else {
            self.advance_day_of_week(year, month, day, last_day)
        }
    }

    fn advance_day_of_month(&self, year: i32, month: u32, day: u32, last_day: u32) -> DayStep {
        match &self.day_of_month {
            DayOfMonthField::Values(set) => match set.range(day..).next() {
                Some(&d) if d == day && d <= last_day => DayStep::Match,
                Some(&d) if d <= last_day => DayStep::Advance {
                    new_year: year,
                    new_month: month,
                    new_day: d,
                },
                _ => DayStep::NoSuchDay,
            },
            DayOfMonthField::LastDayOfMonth => {
                if day == last_day {
                    DayStep::Match
                } else if day < last_day {
                    DayStep::Advance { new_year: year, new_month: month, new_day: last_day }
                } else {
                    DayStep::NoSuchDay
                }
            }
            DayOfMonthField::LastWeekdayOfMonth => {
                let target = nearest_weekday(year, month, last_day, last_day);
                if day == target {
                    DayStep::Match
                } else if day < target {
                    DayStep::Advance { new_year: year, new_month: month, new_day: target }
                } else {
                    DayStep::NoSuchDay
                }
            }
            DayOfMonthField::NearestWeekday(d) => {
                if *d > last_day {
                    return DayStep::NoSuchDay;
                }
                let target = nearest_weekday(year, month, *d, last_day);
                if day == target {
                    DayStep::Match
                } else if day < target {
                    DayStep::Advance { new_year: year, new_month: month, new_day: target }
                } else {
                    DayStep::NoSuchDay
                }
            }
            DayOfMonthField::Unspecified => unreachable!(),
        }
    }

    fn advance_day_of_week(&self, year: i32, month: u32, day: u32, last_day: u32) -> DayStep {
        match &self.day_of_week {
            DayOfWeekField::Values(set) => {
                let cur_dow = weekday_number(year, month, day);
                // Prefer the next match within the current week; if none,
                // wrap around to the set's earliest weekday next week
                // rather than bailing out -- a later week can still fall
                // inside this month.
                let target = set.range(cur_dow..).next().copied().or_else(|| set.iter().next().copied());
                match target {
                    Some(target) => {
                        let delta = (target + 7 - cur_dow) % 7;
                        let candidate = day + delta;
                        if candidate <= last_day {
                            if delta == 0 {
                                DayStep::Match
                            } else {
                                DayStep::Advance { new_year: year, new_month: month, new_day: candidate }
                            }
                        } else {
                            DayStep::NoSuchDay
                        }
                    }
                    None => DayStep::NoSuchDay,
                }
            }
            DayOfWeekField::LastOccurrence(target) => {
                let last_dow = weekday_number(year, month, last_day);
                let delta_back = (last_dow + 7 - *target) % 7;
                let occurrence_day = last_day - delta_back;
                if day == occurrence_day {
                    DayStep::Match
                } else if day < occurrence_day {
                    DayStep::Advance { new_year: year, new_month: month, new_day: occurrence_day }
                } else {
                    DayStep::NoSuchDay
                }
            }
            DayOfWeekField::NthOccurrence { weekday, n } => {
                let first_dow = weekday_number(year, month, 1);
                let delta = (*weekday + 7 - first_dow) % 7;
                let first_occurrence = 1 + delta;
                let occurrence_day = first_occurrence + (*n - 1) * 7;
                if occurrence_day > last_day {
                    return DayStep::NoSuchDay;
                }
                if day == occurrence_day {
                    DayStep::Match
                } else if day < occurrence_day {
                    DayStep::Advance { new_year: year, new_month: month, new_day: occurrence_day }
                } else {
                    DayStep::NoSuchDay
                }
            }
            DayOfWeekField::Unspecified => unreachable!(),
        }
    }
}

enum DayStep {
    Match,
    Advance { new_year: i32, new_month: u32, new_day: u32 },
    NoSuchDay,
}

fn normalize_day_overflow(year: i32, month: u32, day: u32) -> (i32, u32, u32) {
    let last = last_day_of_month(year, month);
    if day <= last {
        (year, month, day)
    } else if month >= 12 {
        (year + 1, 1, day - last)
    } else {
        (year, month + 1, day - last)
    }
}

fn last_day_of_month(year: i32, month: u32) -> u32 {
    let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(ny, nm, 1)
        .unwrap()
        .pred_opt()
        .unwrap()
        .day()
}

/// 1=Sunday..7=Saturday, per spec §9.
fn weekday_number(year: i32, month: u32, day: u32) -> u32 {
    let date = NaiveDate::from_ymd_opt(year, month, day).expect("valid date");
    date.weekday().num_days_from_sunday() + 1
}

/// Nearest weekday to `day` within the month, never crossing the month
/// boundary (spec §4.1, `dW`).
fn nearest_weekday(year: i32, month: u32, day: u32, last_day: u32) -> u32 {
    let dow = weekday_number(year, month, day);
    match dow {
        1 => {
            // Sunday: go forward to Monday, unless that would leave the
            // month, in which case go back to Friday.
            if day + 1 <= last_day {
                day + 1
            } else {
                day.saturating_sub(2).max(1)
            }
        }
        7 => {
            // Saturday: go back to Friday, unless that's day 0 (can't
            // happen since day >= 1), go forward to Monday if day==1.
            if day > 1 {
                day - 1
            } else {
                (day + 2).min(last_day)
            }
        }
        _ => day,
    }
}

impl fmt::Display for CronExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {}",
            format_set(&self.seconds),
            format_set(&self.minutes),
            format_set(&self.hours),
            format_dom(&self.day_of_month),
            format_set(&self.months),
            format_dow(&self.day_of_week),
            format_set(&self.years),
        )
    }
}

fn format_set<T: Ord + fmt::Display + Copy>(set: &BTreeSet<T>) -> String {
    set.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",")
}

fn format_dom(field: &DayOfMonthField) -> String {
    match field {
        DayOfMonthField::Values(set) => format_set(set),
        DayOfMonthField::LastDayOfMonth => "L".to_string(),
        DayOfMonthField::LastWeekdayOfMonth => "LW".to_string(),
        DayOfMonthField::NearestWeekday(d) => format!("{d}W"),
        DayOfMonthField::Unspecified => "?".to_string(),
    }
}

fn format_dow(field: &DayOfWeekField) -> String {
    match field {
        DayOfWeekField::Values(set) => format_set(set),
        DayOfWeekField::LastOccurrence(d) => format!("{d}L"),
        DayOfWeekField::NthOccurrence { weekday, n } => format!("{weekday}#{n}"),
        DayOfWeekField::Unspecified => "?".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::UTC;

    fn next(expr: &str, after: &str) -> DateTime<Tz> {
        let cron = CronExpression::parse(expr).unwrap();
        let after = UTC.datetime_from_str(after, "%Y-%m-%dT%H:%M:%S").unwrap();
        cron.next_after(after).unwrap()
    }

    #[test]
    fn daily_cron_fires_three_days_in_a_row() {
        let cron = CronExpression::parse("0 0 12 * * ?").unwrap();
        let mut t = UTC.datetime_from_str("2024-01-01T00:00:00", "%Y-%m-%dT%H:%M:%S").unwrap();
        let expected = [
            "2024-01-01T12:00:00",
            "2024-01-02T12:00:00",
            "2024-01-03T12:00:00",
        ];
        for exp in expected {
            t = cron.next_after(t).unwrap();
            assert_eq!(t.format("%Y-%m-%dT%H:%M:%S").to_string(), exp);
        }
    }

    #[test]
    fn weekday_cron_skips_weekend() {
        let t = next("0 15 10 ? * MON-FRI", "2024-06-01T00:00:00"); // Saturday
        assert_eq!(t.format("%Y-%m-%dT%H:%M:%S").to_string(), "2024-06-03T10:15:00");
    }

    #[test]
    fn nth_friday_fires_third_friday_each_month() {
        let cron = CronExpression::parse("0 15 10 ? * 6#3").unwrap();
        let mut t = UTC.datetime_from_str("2024-01-01T00:00:00", "%Y-%m-%dT%H:%M:%S").unwrap();
        for exp in ["2024-01-19T10:15:00", "2024-02-16T10:15:00", "2024-03-15T10:15:00"] {
            t = cron.next_after(t).unwrap();
            assert_eq!(t.format("%Y-%m-%dT%H:%M:%S").to_string(), exp);
        }
    }

    #[test]
    fn last_day_of_month_across_year() {
        let cron = CronExpression::parse("0 15 10 L * ?").unwrap();
        let mut t = UTC.datetime_from_str("2024-01-01T00:00:00", "%Y-%m-%dT%H:%M:%S").unwrap();
        for exp in [
            "2024-01-31T10:15:00",
            "2024-02-29T10:15:00", // leap year
            "2024-03-31T10:15:00",
        ] {
            t = cron.next_after(t).unwrap();
            assert_eq!(t.format("%Y-%m-%dT%H:%M:%S").to_string(), exp);
        }
    }

    #[test]
    fn both_dom_and_dow_constrained_is_an_error() {
        let err = CronExpression::parse("0 0 12 1 * MON").unwrap_err();
        assert!(matches!(err, CronParseError::NeitherFieldUnspecified));
    }

    #[test]
    fn neither_dom_nor_dow_constrained_is_an_error() {
        let err = CronExpression::parse("0 0 12 ? * ?").unwrap_err();
        assert!(matches!(err, CronParseError::BothFieldsUnspecified));
    }

    #[test]
    fn year_field_exhausted_returns_none() {
        let cron = CronExpression::parse("0 0 12 1 1 ? 2024").unwrap();
        let after = UTC.datetime_from_str("2024-06-01T00:00:00", "%Y-%m-%dT%H:%M:%S").unwrap();
        assert!(cron.next_after(after).is_none());
    }

    #[test]
    fn canonical_round_trip_is_stable() {
        let cron = CronExpression::parse("0 15,45 10 ? * MON-FRI").unwrap();
        let canonical = cron.canonical();
        let reparsed = CronExpression::parse(&canonical).unwrap();
        assert_eq!(reparsed.canonical(), canonical);
    }

    #[test]
    fn nearest_weekday_does_not_cross_month_boundary() {
        // 2024-06-01 is a Saturday; 1W should land on Monday 2024-06-03,
        // not slip backward into May.
        let cron = CronExpression::parse("0 0 12 1W * ?").unwrap();
        let after = UTC.datetime_from_str("2024-05-25T00:00:00", "%Y-%m-%dT%H:%M:%S").unwrap();
        let t = cron.next_after(after).unwrap();
        assert_eq!(t.format("%Y-%m-%d").to_string(), "2024-06-03");
    }
}
