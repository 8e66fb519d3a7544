//! Cron parse error module

use thiserror::Error;

/// A cron expression failed to parse. Carries the 0-based field index (0 =
/// seconds … 6 = year) and character position within that field so callers
/// can point a user at the offending token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CronParseError {
    #[error("expected 6 or 7 whitespace-separated fields, found {found}")]
    WrongFieldCount { found: usize },

    #[error("field {field} ({field_name}), position {position}: {message}")]
    InvalidToken {
        field: usize,
        field_name: &'static str,
        position: usize,
        message: String,
    },

    #[error("field {field} ({field_name}): value {value} out of range {min}-{max}")]
    OutOfRange {
        field: usize,
        field_name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("'?' may only appear in day-of-month or day-of-week")]
    QuestionMarkNotAllowedHere { field: usize },

    #[error("day-of-month and day-of-week cannot both be '?'")]
    BothFieldsUnspecified,

    #[error("day-of-month and day-of-week cannot both be constrained; exactly one must be '?'")]
    NeitherFieldUnspecified,

    #[error("'{token}' is not a recognized name in field {field} ({field_name})")]
    UnknownName {
        field: usize,
        field_name: &'static str,
        token: String,
    },

    #[error("'#' requires an occurrence count between 1 and 5, got {n}")]
    InvalidNthOccurrence { n: i64 },
}
