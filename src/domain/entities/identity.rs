//! Identity value types module
//!
//! This module defines the `(group, name)` identity shared by jobs and
//! triggers. Equality, hashing, and ordering all go through the pair, and
//! the default group is the literal `"DEFAULT"`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Default group name used when a caller does not specify one.
pub const DEFAULT_GROUP: &str = "DEFAULT";

/// Identifies a job or a trigger by `(group, name)`.
///
/// Sorting places `DEFAULT_GROUP` before any other group, then falls back to
/// lexicographic group, then name. This is the ordering
/// `acquireNextTriggers` uses as the final tiebreaker after fire time and
/// priority.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Key {
    pub name: String,
    pub group: String,
}

impl Key {
    /// Creates a key in the default group.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: DEFAULT_GROUP.to_string(),
        }
    }

    /// Creates a key in an explicit group.
    pub fn with_group(name: impl Into<String>, group: impl Into<String>) -> Self {
        let group = group.into();
        let group = if group.is_empty() {
            DEFAULT_GROUP.to_string()
        } else {
            group
        };
        Self {
            name: name.into(),
            group,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.name)
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        group_rank(&self.group)
            .cmp(&group_rank(&other.group))
            .then_with(|| self.group.cmp(&other.group))
            .then_with(|| self.name.cmp(&other.name))
    }
}

fn group_rank(group: &str) -> u8 {
    if group == DEFAULT_GROUP {
        0
    } else {
        1
    }
}

/// Identifies a job: `(group, name)`.
pub type JobKey = Key;
/// Identifies a trigger: `(group, name)`.
pub type TriggerKey = Key;

/// A predicate over keys, used by store query operations (`getJobKeys`,
/// `getTriggerKeys`) and by listener registration (§4.7): exact-match,
/// group-equals, name-starts-with, or everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    KeyEquals(Key),
    GroupEquals(String),
    NameStartsWith(String),
    Any,
}

impl Matcher {
    pub fn matches(&self, key: &Key) -> bool {
        match self {
            Matcher::KeyEquals(k) => k == key,
            Matcher::GroupEquals(group) => &key.group == group,
            Matcher::NameStartsWith(prefix) => key.name.starts_with(prefix.as_str()),
            Matcher::Any => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_group_applied_when_empty() {
        let k = Key::with_group("job1", "");
        assert_eq!(k.group, DEFAULT_GROUP);
    }

    #[test]
    fn default_group_sorts_first() {
        let mut keys = vec![
            Key::with_group("a", "ZGROUP"),
            Key::with_group("z", DEFAULT_GROUP),
            Key::with_group("b", "AGROUP"),
        ];
        keys.sort();
        assert_eq!(keys[0].group, DEFAULT_GROUP);
        assert_eq!(keys[1].group, "AGROUP");
        assert_eq!(keys[2].group, "ZGROUP");
    }

    #[test]
    fn same_group_sorts_by_name() {
        let mut keys = vec![Key::new("bbb"), Key::new("aaa")];
        keys.sort();
        assert_eq!(keys[0].name, "aaa");
        assert_eq!(keys[1].name, "bbb");
    }

    #[test]
    fn display_format() {
        let k = Key::with_group("job1", "grp1");
        assert_eq!(k.to_string(), "grp1.job1");
    }

    #[test]
    fn matcher_name_starts_with() {
        let matcher = Matcher::NameStartsWith("report-".to_string());
        assert!(matcher.matches(&Key::new("report-daily")));
        assert!(!matcher.matches(&Key::new("cleanup")));
    }
}
