//! Trigger priority value object module

use serde::{Deserialize, Serialize};
use std::fmt;

/// Trigger priority: on a tie in `nextFireTime`, higher priority fires
/// first. Ties in both are broken by trigger key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Priority(i32);

/// Default priority for triggers that don't set one explicitly.
pub const DEFAULT_PRIORITY: i32 = 5;

impl Priority {
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self(DEFAULT_PRIORITY)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl From<Priority> for i32 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_constant() {
        assert_eq!(Priority::default().value(), DEFAULT_PRIORITY);
    }

    #[test]
    fn orders_by_value() {
        assert!(Priority::new(10) > Priority::new(5));
    }
}
