//! Cron field representation module
//!
//! A parsed cron expression is six or seven of these: compact sorted value
//! sets for seconds/minutes/hours/months/years, and the two closed-form
//! "special" fields (day-of-month, day-of-week) that can instead carry one
//! of the `L`/`W`/`#` tokens described below.

use std::collections::BTreeSet;

/// Seconds, minutes, hours, months, or years: a plain sorted set of legal
/// values. `*` expands eagerly to the full range at parse time — the
/// next-fire traversal only ever needs range-from lookups.
pub type ValueSet<T> = BTreeSet<T>;

/// Day-of-month field (1–31), or one of the special tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayOfMonthField {
    Values(ValueSet<u32>),
    /// `L` — last day of the month.
    LastDayOfMonth,
    /// `LW` — last weekday (Mon–Fri) of the month.
    LastWeekdayOfMonth,
    /// `dW` — nearest weekday to day `d`, not crossing month boundary.
    NearestWeekday(u32),
    /// `?` — unspecified; day-of-week constrains instead.
    Unspecified,
}

/// Day-of-week field (1–7, 1 = Sunday), or one of the special tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayOfWeekField {
    Values(ValueSet<u32>),
    /// `dL` — last occurrence of weekday `d` in the month.
    LastOccurrence(u32),
    /// `d#n` — the `n`-th occurrence of weekday `d` in the month.
    NthOccurrence { weekday: u32, n: u32 },
    /// `?` — unspecified; day-of-month constrains instead.
    Unspecified,
}

impl DayOfMonthField {
    pub fn is_unspecified(&self) -> bool {
        matches!(self, DayOfMonthField::Unspecified)
    }
}

impl DayOfWeekField {
    pub fn is_unspecified(&self) -> bool {
        matches!(self, DayOfWeekField::Unspecified)
    }
}
