//! Cron expression parser module
//!
//! Turns the textual fields of a cron expression into the `ValueSet`s and
//! special-token fields consumed by `cron::schedule::CronExpression`.

use std::collections::BTreeSet;

use super::error::CronParseError;
use super::fields::{DayOfMonthField, DayOfWeekField};

const MONTH_NAMES: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];
// This spec numbers 1=Sunday..7=Saturday; DAY_NAMES[0] ("SUN") maps to 1.
const DAY_NAMES: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

pub(super) struct FieldSpec {
    pub index: usize,
    pub name: &'static str,
    pub min: i64,
    pub max: i64,
    pub names: Option<&'static [&'static str]>,
    /// Name-array offset: `names[i]` maps to value `name_base + i`.
    pub name_base: i64,
}

pub(super) const SECONDS: FieldSpec = FieldSpec { index: 0, name: "seconds", min: 0, max: 59, names: None, name_base: 0 };
pub(super) const MINUTES: FieldSpec = FieldSpec { index: 1, name: "minutes", min: 0, max: 59, names: None, name_base: 0 };
pub(super) const HOURS: FieldSpec = FieldSpec { index: 2, name: "hours", min: 0, max: 23, names: None, name_base: 0 };
pub(super) const DAY_OF_MONTH: FieldSpec = FieldSpec { index: 3, name: "day-of-month", min: 1, max: 31, names: None, name_base: 0 };
pub(super) const MONTH: FieldSpec = FieldSpec { index: 4, name: "month", min: 1, max: 12, names: Some(&MONTH_NAMES), name_base: 1 };
pub(super) const DAY_OF_WEEK: FieldSpec = FieldSpec { index: 5, name: "day-of-week", min: 1, max: 7, names: Some(&DAY_NAMES), name_base: 1 };
pub(super) const YEAR: FieldSpec = FieldSpec { index: 6, name: "year", min: 1970, max: 2099, names: None, name_base: 0 };

/// Resolves a token to an integer: a bare number, or a case-insensitive name
/// lookup against `spec.names` when present.
fn resolve_atom(spec: &FieldSpec, token: &str, position: usize) -> Result<i64, CronParseError> {
    if let Ok(n) = token.parse::<i64>() {
        return Ok(n);
    }
    if let Some(names) = spec.names {
        let upper = token.to_ascii_uppercase();
        for (i, name) in names.iter().enumerate() {
            if *name == upper {
                return Ok(spec.name_base + i as i64);
            }
        }
        return Err(CronParseError::UnknownName {
            field: spec.index,
            field_name: spec.name,
            token: token.to_string(),
        });
    }
    Err(CronParseError::InvalidToken {
        field: spec.index,
        field_name: spec.name,
        position,
        message: format!("'{token}' is not a number or recognized name"),
    })
}

fn check_range(spec: &FieldSpec, value: i64) -> Result<u32, CronParseError> {
    if value < spec.min || value > spec.max {
        return Err(CronParseError::OutOfRange {
            field: spec.index,
            field_name: spec.name,
            value,
            min: spec.min,
            max: spec.max,
        });
    }
    Ok(value as u32)
}

/// Parses one comma-separated list of atoms/ranges/steps/`*` into a value
/// set, honouring `spec.min..=spec.max`.
pub(super) fn parse_value_list(spec: &FieldSpec, text: &str) -> Result<BTreeSet<u32>, CronParseError> {
    let mut out = BTreeSet::new();
    let mut pos = 0usize;
    for part in text.split(',') {
        let part_start = pos;
        pos += part.len() + 1;
        parse_one_atom(spec, part, part_start, &mut out)?;
    }
    if out.is_empty() {
        return Err(CronParseError::InvalidToken {
            field: spec.index,
            field_name: spec.name,
            position: 0,
            message: "empty field".to_string(),
        });
    }
    Ok(out)
}

fn parse_one_atom(
    spec: &FieldSpec,
    atom: &str,
    position: usize,
    out: &mut BTreeSet<u32>,
) -> Result<(), CronParseError> {
    if atom.is_empty() {
        return Err(CronParseError::InvalidToken {
            field: spec.index,
            field_name: spec.name,
            position,
            message: "empty list item".to_string(),
        });
    }

    // '?' is only meaningful on day-of-month/day-of-week, and those fields
    // are parsed by their own dedicated functions before ever reaching the
    // generic list/range/step grammar handled here.
    if atom.contains('?') {
        return Err(CronParseError::QuestionMarkNotAllowedHere { field: spec.index });
    }

    // step: base/step, where base may be '*' or 'a-b' or a bare atom
    if let Some((base, step)) = atom.split_once('/') {
        let step: i64 = step.parse().map_err(|_| CronParseError::InvalidToken {
            field: spec.index,
            field_name: spec.name,
            position,
            message: format!("'{step}' is not a valid step value"),
        })?;
        if step <= 0 {
            return Err(CronParseError::InvalidToken {
                field: spec.index,
                field_name: spec.name,
                position,
                message: "step must be positive".to_string(),
            });
        }
        let start = if base == "*" {
            spec.min
        } else if let Some((lo, _hi)) = base.split_once('-') {
            resolve_atom(spec, lo, position)?
        } else {
            resolve_atom(spec, base, position)?
        };
        let mut v = start;
        while v <= spec.max {
            out.insert(check_range(spec, v)?);
            v += step;
        }
        return Ok(());
    }

    if atom == "*" {
        for v in spec.min..=spec.max {
            out.insert(v as u32);
        }
        return Ok(());
    }

    if let Some((lo, hi)) = atom.split_once('-') {
        let lo = resolve_atom(spec, lo, position)?;
        let hi = resolve_atom(spec, hi, position)?;
        if lo <= hi {
            for v in lo..=hi {
                out.insert(check_range(spec, v)?);
            }
        } else {
            // wrap-around range, e.g. NOV-FEB or 6-2
            for v in lo..=spec.max {
                out.insert(check_range(spec, v)?);
            }
            for v in spec.min..=hi {
                out.insert(check_range(spec, v)?);
            }
        }
        return Ok(());
    }

    let v = resolve_atom(spec, atom, position)?;
    out.insert(check_range(spec, v)?);
    Ok(())
}

/// Parses the day-of-month field, handling `?`, `L`, `LW`, `dW` in addition
/// to the generic list/range/step/`*` syntax.
pub(super) fn parse_day_of_month(text: &str) -> Result<DayOfMonthField, CronParseError> {
    let upper = text.to_ascii_uppercase();
    if upper == "?" {
        return Ok(DayOfMonthField::Unspecified);
    }
    if upper == "L" {
        return Ok(DayOfMonthField::LastDayOfMonth);
    }
    if upper == "LW" {
        return Ok(DayOfMonthField::LastWeekdayOfMonth);
    }
    if let Some(day_str) = upper.strip_suffix('W') {
        let day: i64 = day_str.parse().map_err(|_| CronParseError::InvalidToken {
            field: DAY_OF_MONTH.index,
            field_name: DAY_OF_MONTH.name,
            position: 0,
            message: format!("'{text}' is not a valid nearest-weekday spec"),
        })?;
        let day = check_range(&DAY_OF_MONTH, day)?;
        return Ok(DayOfMonthField::NearestWeekday(day));
    }
    Ok(DayOfMonthField::Values(parse_value_list(&DAY_OF_MONTH, &upper)?))
}

/// Parses the day-of-week field, handling `?`, `dL`, `d#n` in addition to
/// the generic syntax (including `SUN`..`SAT` names).
pub(super) fn parse_day_of_week(text: &str) -> Result<DayOfWeekField, CronParseError> {
    let upper = text.to_ascii_uppercase();
    if upper == "?" {
        return Ok(DayOfWeekField::Unspecified);
    }
    if let Some(day_str) = upper.strip_suffix('L') {
        if !day_str.is_empty() {
            let day = resolve_atom(&DAY_OF_WEEK, day_str, 0)?;
            let day = check_range(&DAY_OF_WEEK, day)?;
            return Ok(DayOfWeekField::LastOccurrence(day));
        }
    }
    if let Some((day_str, n_str)) = upper.split_once('#') {
        let day = resolve_atom(&DAY_OF_WEEK, day_str, 0)?;
        let day = check_range(&DAY_OF_WEEK, day)?;
        let n: i64 = n_str
            .parse()
            .map_err(|_| CronParseError::InvalidNthOccurrence { n: -1 })?;
        if !(1..=5).contains(&n) {
            return Err(CronParseError::InvalidNthOccurrence { n });
        }
        return Ok(DayOfWeekField::NthOccurrence { weekday: day, n: n as u32 });
    }
    Ok(DayOfWeekField::Values(parse_value_list(&DAY_OF_WEEK, &upper)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_star() {
        let set = parse_value_list(&SECONDS, "*").unwrap();
        assert_eq!(set.len(), 60);
    }

    #[test]
    fn parses_list() {
        let set = parse_value_list(&MINUTES, "0,15,30,45").unwrap();
        assert_eq!(set, [0, 15, 30, 45].into_iter().collect());
    }

    #[test]
    fn parses_range() {
        let set = parse_value_list(&HOURS, "9-17").unwrap();
        assert_eq!(set.len(), 9);
        assert!(set.contains(&9) && set.contains(&17));
    }

    #[test]
    fn parses_step() {
        let set = parse_value_list(&MINUTES, "0/15").unwrap();
        assert_eq!(set, [0, 15, 30, 45].into_iter().collect());
    }

    #[test]
    fn parses_month_names() {
        let set = parse_value_list(&MONTH, "JAN,MAR").unwrap();
        assert_eq!(set, [1, 3].into_iter().collect());
    }

    #[test]
    fn parses_weekday_range_by_name() {
        let dow = parse_day_of_week("MON-FRI").unwrap();
        match dow {
            DayOfWeekField::Values(v) => assert_eq!(v, [2, 3, 4, 5, 6].into_iter().collect()),
            _ => panic!("expected Values"),
        }
    }

    #[test]
    fn parses_nth_occurrence() {
        let dow = parse_day_of_week("6#3").unwrap();
        assert_eq!(dow, DayOfWeekField::NthOccurrence { weekday: 6, n: 3 });
    }

    #[test]
    fn rejects_out_of_range() {
        let err = parse_value_list(&HOURS, "24").unwrap_err();
        assert!(matches!(err, CronParseError::OutOfRange { .. }));
    }

    #[test]
    fn rejects_bad_nth_occurrence() {
        let err = parse_day_of_week("6#6").unwrap_err();
        assert!(matches!(err, CronParseError::InvalidNthOccurrence { n: 6 }));
    }

    #[test]
    fn rejects_question_mark_outside_day_fields() {
        let err = parse_value_list(&HOURS, "?").unwrap_err();
        assert!(matches!(err, CronParseError::QuestionMarkNotAllowedHere { field } if field == HOURS.index));
    }

    #[test]
    fn rejects_unknown_name() {
        let err = parse_value_list(&MONTH, "FOO").unwrap_err();
        assert!(matches!(err, CronParseError::UnknownName { field, token, .. } if field == MONTH.index && token == "FOO"));
    }
}
