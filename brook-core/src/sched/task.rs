//! Blocking-aware task spawning
//!
//! Wraps OS thread creation so every worker participates in quiescence
//! accounting: the token is registered before the thread starts, and a drop
//! guard deregisters it on every exit path, panics included. Joining through
//! [`TaskHandle::join`] registers the joiner as blocked around the underlying
//! wait, so a thread waiting on a child is indistinguishable from a sleeping
//! thread as far as the clock is concerned.

use std::io;
use std::sync::Arc;
use std::thread;

use crate::sched::tracker::TaskToken;
use crate::sched::Runtime;

/// Handle to a spawned task.
pub struct TaskHandle<T = ()> {
    inner: thread::JoinHandle<T>,
}

impl<T> TaskHandle<T> {
    /// Wait for the task, counting the caller as blocked for the duration.
    pub fn join<R: Runtime>(self, runtime: &R, token: TaskToken) -> thread::Result<T> {
        runtime.enter_blocked(token);
        let result = self.inner.join();
        runtime.exit_blocked(token);
        result
    }

    /// Whether the task has finished running.
    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    /// Unwrap the underlying OS thread handle. For callers outside the
    /// scheduler's task ledger (e.g. test harness threads), which must not
    /// appear blocked to quiescence tracking.
    pub fn into_inner(self) -> thread::JoinHandle<T> {
        self.inner
    }
}

/// Deregisters on drop, so a panicking task cannot leak a live entry and
/// stall quiescence forever.
struct DeregisterGuard<R: Runtime> {
    runtime: Arc<R>,
    token: TaskToken,
}

impl<R: Runtime> Drop for DeregisterGuard<R> {
    fn drop(&mut self) {
        self.runtime.deregister_task(self.token);
    }
}

/// Spawn a named worker task registered with the runtime.
///
/// The token is registered before the OS thread starts, so the new task is
/// visible to quiescence tracking from the moment the spawner returns; there
/// is no window in which the clock could tick past a task that is about to
/// begin running.
pub fn spawn_task<R, F, T>(runtime: &Arc<R>, name: &str, f: F) -> io::Result<TaskHandle<T>>
where
    R: Runtime,
    F: FnOnce(TaskToken) -> T + Send + 'static,
    T: Send + 'static,
{
    let token = runtime.register_task();
    let task_runtime = Arc::clone(runtime);
    let spawned = thread::Builder::new().name(name.to_string()).spawn(move || {
        let _guard = DeregisterGuard {
            runtime: task_runtime,
            token,
        };
        f(token)
    });
    match spawned {
        Ok(inner) => Ok(TaskHandle { inner }),
        Err(err) => {
            // The thread never started; take its entry back out ourselves.
            runtime.deregister_task(token);
            Err(err)
        }
    }
}
