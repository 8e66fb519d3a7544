//! Worker pool module
//!
//! A fixed-size pool of worker threads with blocking handoff (§4.5).
//! Workers live in exactly one of two states (available, busy); all
//! transitions happen under the pool's own lock, separate from the
//! dispatcher's signal lock (§5).

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{channel, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};
use tracing::{error, info};

pub type Runnable = Box<dyn FnOnce() + Send + 'static>;

enum WorkerMsg {
    Run(Runnable),
    Shutdown,
}

struct PoolState {
    available: Vec<usize>,
    busy: usize,
    shutting_down: bool,
}

struct PoolInner {
    lock: Mutex<PoolState>,
    condvar: Condvar,
    senders: Mutex<HashMap<usize, Sender<WorkerMsg>>>,
}

impl PoolInner {
    fn mark_available(&self, id: usize) {
        let mut state = self.lock.lock();
        state.busy = state.busy.saturating_sub(1);
        state.available.push(id);
        self.condvar.notify_all();
    }
}

/// `size == 0` is a permitted but degenerate configuration: a scheduler
/// that may define jobs/triggers but must never be started (§4.5).
pub struct WorkerPool {
    size: usize,
    inner: Arc<PoolInner>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let inner = Arc::new(PoolInner {
            lock: Mutex::new(PoolState { available: Vec::new(), busy: 0, shutting_down: false }),
            condvar: Condvar::new(),
            senders: Mutex::new(HashMap::new()),
        });
        let mut handles = Vec::with_capacity(size);
        for id in 0..size {
            let (tx, rx) = channel::<WorkerMsg>();
            inner.senders.lock().insert(id, tx);
            inner.lock.lock().available.push(id);
            let inner_clone = inner.clone();
            handles.push(thread::spawn(move || {
                for msg in rx {
                    match msg {
                        WorkerMsg::Run(job) => {
                            if catch_unwind(AssertUnwindSafe(job)).is_err() {
                                error!(worker = id, "worker caught a panic from its runnable");
                            }
                            inner_clone.mark_available(id);
                        }
                        WorkerMsg::Shutdown => break,
                    }
                }
            }));
        }
        Self { size, inner, handles: Mutex::new(handles) }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Blocks until a worker is available, returning the count observed.
    /// Contract: the caller's next `run_in_thread` on the same thread must
    /// succeed without another caller stealing the slot first — callers
    /// that rely on this should call `run_in_thread` promptly after.
    pub fn block_for_available_threads(&self) -> usize {
        assert!(self.size > 0, "zero-size worker pool does not support block_for_available_threads");
        let mut state = self.inner.lock.lock();
        while state.available.is_empty() && !state.shutting_down {
            self.inner.condvar.wait(&mut state);
        }
        state.available.len()
    }

    /// Blocks until a worker is available and hands off `job`. If the pool
    /// is shutting down, spawns one extra one-shot thread to run `job`
    /// instead of queuing it to a pool worker.
    pub fn run_in_thread(&self, job: Runnable) -> bool {
        assert!(self.size > 0, "zero-size worker pool does not support run_in_thread");
        let mut state = self.inner.lock.lock();
        if state.shutting_down {
            drop(state);
            info!("pool shutting down; spawning one-shot handoff thread");
            thread::spawn(move || {
                if catch_unwind(AssertUnwindSafe(job)).is_err() {
                    error!("one-shot handoff thread caught a panic from its runnable");
                }
            });
            return true;
        }
        while state.available.is_empty() {
            self.inner.condvar.wait(&mut state);
        }
        let id = state.available.pop().unwrap();
        state.busy += 1;
        drop(state);
        let sender = self.inner.senders.lock().get(&id).cloned();
        match sender {
            Some(sender) => {
                let _ = sender.send(WorkerMsg::Run(job));
                true
            }
            None => false,
        }
    }

    pub fn shutdown(&self, wait_for_jobs: bool) {
        {
            let mut state = self.inner.lock.lock();
            state.shutting_down = true;
            self.inner.condvar.notify_all();
        }
        let senders = self.inner.senders.lock();
        for sender in senders.values() {
            let _ = sender.send(WorkerMsg::Shutdown);
        }
        drop(senders);
        if wait_for_jobs {
            let mut handles = self.handles.lock();
            for handle in handles.drain(..) {
                let _ = handle.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn runs_submitted_job() {
        let pool = WorkerPool::new(2);
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        pool.run_in_thread(Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        thread::sleep(Duration::from_millis(50));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        pool.shutdown(true);
    }

    #[test]
    fn block_for_available_threads_returns_full_count_when_idle() {
        let pool = WorkerPool::new(3);
        assert_eq!(pool.block_for_available_threads(), 3);
        pool.shutdown(false);
    }

    #[test]
    fn panicking_job_does_not_kill_worker() {
        let pool = WorkerPool::new(1);
        pool.run_in_thread(Box::new(|| panic!("boom")));
        thread::sleep(Duration::from_millis(50));
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        pool.run_in_thread(Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        thread::sleep(Duration::from_millis(50));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        pool.shutdown(true);
    }
}
