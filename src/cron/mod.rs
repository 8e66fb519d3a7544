//! Cron expression engine
//!
//! A Unix-cron-style parser and next-fire-time traversal with the
//! extensions used throughout this crate's trigger layer: seconds as a
//! leading field, `?` for "don't care", `L`/`LW`/`dW` on day-of-month,
//! `dL`/`d#n` on day-of-week, and an optional trailing year field.

mod error;
mod fields;
mod parser;
mod schedule;

pub use error::CronParseError;
pub use fields::{DayOfMonthField, DayOfWeekField, ValueSet};
pub use schedule::CronExpression;
