//! Scheduler configuration module
//!
//! `SchedulerConfig` mirrors the process-wide configuration table in §6.
//! Builder-constructed; `from_env` reads the same keys from the process
//! environment for the CLI binary — no new config-file format is
//! introduced.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub instance_name: String,
    pub instance_id: String,
    pub thread_count: usize,
    pub make_threads_daemons: bool,
    pub misfire_threshold: Duration,
    pub batch_trigger_acquisition_max_count: usize,
    pub batch_trigger_acquisition_fire_ahead_time_window: Duration,
    pub idle_wait_time: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            instance_name: "JobWeaverScheduler".to_string(),
            instance_id: "AUTO".to_string(),
            thread_count: 4,
            make_threads_daemons: true,
            misfire_threshold: Duration::from_secs(60),
            batch_trigger_acquisition_max_count: 1,
            batch_trigger_acquisition_fire_ahead_time_window: Duration::from_millis(0),
            idle_wait_time: Duration::from_secs(30),
        }
    }
}

impl SchedulerConfig {
    pub fn instance_name(mut self, name: impl Into<String>) -> Self {
        self.instance_name = name.into();
        self
    }

    pub fn instance_id(mut self, id: impl Into<String>) -> Self {
        self.instance_id = id.into();
        self
    }

    pub fn thread_count(mut self, count: usize) -> Self {
        self.thread_count = count;
        self
    }

    pub fn make_threads_daemons(mut self, daemon: bool) -> Self {
        self.make_threads_daemons = daemon;
        self
    }

    pub fn misfire_threshold(mut self, threshold: Duration) -> Self {
        self.misfire_threshold = threshold;
        self
    }

    pub fn idle_wait_time(mut self, wait: Duration) -> Self {
        self.idle_wait_time = wait;
        self
    }

    /// Reads `SCHEDULER_INSTANCE_NAME`, `SCHEDULER_INSTANCE_ID`,
    /// `SCHEDULER_THREAD_COUNT`, `SCHEDULER_MISFIRE_THRESHOLD_MS`, and
    /// `SCHEDULER_IDLE_WAIT_TIME_MS` from the process environment, falling
    /// back to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(name) = env::var("SCHEDULER_INSTANCE_NAME") {
            config.instance_name = name;
        }
        if let Ok(id) = env::var("SCHEDULER_INSTANCE_ID") {
            config.instance_id = id;
        }
        if let Some(n) = env::var("SCHEDULER_THREAD_COUNT").ok().and_then(|v| v.parse().ok()) {
            config.thread_count = n;
        }
        if let Some(ms) = env::var("SCHEDULER_MISFIRE_THRESHOLD_MS").ok().and_then(|v| v.parse().ok()) {
            config.misfire_threshold = Duration::from_millis(ms);
        }
        if let Some(ms) = env::var("SCHEDULER_IDLE_WAIT_TIME_MS").ok().and_then(|v| v.parse().ok()) {
            config.idle_wait_time = Duration::from_millis(ms);
        }
        if config.instance_id == "AUTO" {
            config.instance_id = format!("{}-{}", config.instance_name, std::process::id());
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let config = SchedulerConfig::default();
        assert_eq!(config.batch_trigger_acquisition_max_count, 1);
        assert_eq!(config.idle_wait_time, Duration::from_secs(30));
        assert_eq!(config.misfire_threshold, Duration::from_secs(60));
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = SchedulerConfig::default().thread_count(8).instance_name("custom");
        assert_eq!(config.thread_count, 8);
        assert_eq!(config.instance_name, "custom");
    }
}
