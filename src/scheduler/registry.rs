//! Scheduler repository module
//!
//! Keeps named `JobScheduler` handles alive and unique by name (§9
//! "Resource lifecycle"), the same role a servlet container or DI registry
//! plays for singletons — except scoped to this process, not scoped to
//! process exit.

use std::collections::HashMap;
use std::sync::OnceLock;

use parking_lot::Mutex;

use crate::error::{SchedulerError, SchedulerResult};

use super::facade::JobScheduler;

fn registry() -> &'static Mutex<HashMap<String, JobScheduler>> {
    static REGISTRY: OnceLock<Mutex<HashMap<String, JobScheduler>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Registers `scheduler` under `instance_name`, failing if the name is
/// already taken by a live scheduler.
pub fn register(instance_name: &str, scheduler: JobScheduler) -> SchedulerResult<()> {
    let mut reg = registry().lock();
    if reg.contains_key(instance_name) {
        return Err(SchedulerError::ObjectAlreadyExistsError(format!("scheduler {instance_name}")));
    }
    reg.insert(instance_name.to_string(), scheduler);
    Ok(())
}

pub fn lookup(instance_name: &str) -> Option<JobScheduler> {
    registry().lock().get(instance_name).cloned()
}

/// Called by `JobScheduler::shutdown` to free the name for reuse.
pub fn unregister(instance_name: &str) {
    registry().lock().remove(instance_name);
}

pub fn all_instance_names() -> Vec<String> {
    registry().lock().keys().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{FakeClock, InMemoryJobStore};
    use crate::scheduler::config::SchedulerConfig;
    use crate::scheduler::job_factory::FnJobFactory;
    use chrono::Utc;
    use std::sync::Arc;

    fn sample(name: &str) -> JobScheduler {
        let clock = Arc::new(FakeClock::new(Utc::now()));
        let store = Arc::new(InMemoryJobStore::new(clock.clone()));
        let factory = Arc::new(FnJobFactory::new());
        JobScheduler::new(store, factory, clock, SchedulerConfig::default().instance_name(name))
            .expect("scheduler construction should succeed")
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let name = "registry-test-duplicate";
        unregister(name);
        register(name, sample(name)).unwrap();
        let err = register(name, sample(name));
        assert!(matches!(err, Err(SchedulerError::ObjectAlreadyExistsError(_))));
        unregister(name);
    }

    #[test]
    fn lookup_finds_registered_scheduler() {
        let name = "registry-test-lookup";
        unregister(name);
        register(name, sample(name)).unwrap();
        assert!(lookup(name).is_some());
        unregister(name);
        assert!(lookup(name).is_none());
    }
}
