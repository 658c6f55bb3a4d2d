//! Wall-clock runtime for live trading.
//!
//! The same capability surface as the simulated scheduler, backed by real
//! sleeps. Blocked/unblocked accounting degrades to a task census (with no
//! virtual clock there is no quiescence to detect), but tokens still flow
//! through the same spawn/join plumbing, so strategy code is identical in
//! both modes.

use parking_lot::Mutex;
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use crate::sched::tracker::TaskArena;
use crate::sched::{Runtime, TaskToken};

/// Live-side [`Runtime`]: real sleeps, wall-clock time.
pub struct RealtimeRuntime {
    started: Instant,
    tasks: Mutex<TaskArena>,
}

impl RealtimeRuntime {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            tasks: Mutex::new(TaskArena::default()),
        }
    }

    /// Number of live registered tasks.
    pub fn live_tasks(&self) -> usize {
        self.tasks.lock().live()
    }
}

impl Default for RealtimeRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime for RealtimeRuntime {
    fn register_task(&self) -> TaskToken {
        self.tasks.lock().register()
    }

    fn deregister_task(&self, token: TaskToken) {
        self.tasks.lock().deregister(token);
    }

    fn enter_blocked(&self, token: TaskToken) {
        self.tasks.lock().enter_blocked(token);
    }

    fn exit_blocked(&self, token: TaskToken) {
        self.tasks.lock().exit_blocked(token);
    }

    fn sleep(&self, _token: TaskToken, seconds: u64) {
        thread::sleep(Duration::from_secs(seconds));
    }

    fn elapsed_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}
