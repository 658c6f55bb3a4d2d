//! Scheduling: virtual time, quiescence tracking, blocking-aware primitives.
//!
//! Strategy code is written against the [`Runtime`] capability trait rather
//! than concrete thread/sleep primitives. The backtest injects
//! [`SimScheduler`], whose sleeps advance a simulated clock through
//! system-wide quiescence; a live deployment injects [`RealtimeRuntime`],
//! whose sleeps are real. Nothing is patched at runtime; the capability set
//! travels explicitly through [`spawn_task`] tokens and session handles.
//!
//! The only legal ways for simulated code to stall are the virtual sleep and
//! the quiescence-aware channel in this module. Any other blocking primitive
//! (real sleeps, timers, unmonitored locks) is invisible to the quiescence
//! tracker and will stall the simulated clock forever.

pub mod channel;
pub mod clock;
pub mod realtime;
pub mod scheduler;
pub mod task;
mod tracker;

pub use channel::{sim_channel, RecvError, SendError, SimReceiver, SimSender};
pub use clock::SimClock;
pub use realtime::RealtimeRuntime;
pub use scheduler::SimScheduler;
pub use task::{spawn_task, TaskHandle};
pub use tracker::TaskToken;

use std::time::SystemTime;

/// The capability set a strategy may stall through.
///
/// Implemented by [`SimScheduler`] for backtests (virtual time) and
/// [`RealtimeRuntime`] for live use (wall-clock time).
pub trait Runtime: Send + Sync + 'static {
    /// Register the calling context as a live task and obtain its token.
    fn register_task(&self) -> TaskToken;

    /// Remove a task. Guaranteed to run on every task exit path.
    fn deregister_task(&self, token: TaskToken);

    /// Mark the task blocked (re-entrant); used around any wait that should
    /// free the clock to advance.
    fn enter_blocked(&self, token: TaskToken);

    /// Undo one level of [`enter_blocked`].
    ///
    /// [`enter_blocked`]: Runtime::enter_blocked
    fn exit_blocked(&self, token: TaskToken);

    /// Suspend the task for the given number of whole seconds.
    fn sleep(&self, token: TaskToken, seconds: u64);

    /// Seconds elapsed since the start of the run.
    fn elapsed_seconds(&self) -> u64;

    /// The current (frozen or real) wall-clock value.
    fn now(&self) -> SystemTime;
}
