//! Virtual-time scheduler
//!
//! `SimScheduler` owns every piece of scheduling state for one backtest run:
//! the task arena (blocked/live accounting), the sleep cycle, and the
//! simulated clock. All of it sits behind a single mutex with a single
//! condvar broadcast on every mutation, so a waiter can never miss the state
//! change it is waiting for. This lock is distinct from the account ledger
//! lock: matching logic and scheduling logic never contend.
//!
//! The clock advances through system-wide quiescence rather than a wake-time
//! priority queue: a thread blocked on a queue is, from the clock's point of
//! view, equivalent to a sleeping thread, so time keeps moving while orders
//! wait for data. The flip side is a documented liveness tradeoff: a
//! registered task that spins without ever blocking stalls the run forever.
//!
//! Sleep cycles are numbered generations instead of rebuilt barrier objects.
//! A caller may not join while the previous generation is still releasing;
//! it joins the open generation, marks itself blocked, and waits. Whichever
//! member last observes global quiescence advances the clock exactly once,
//! mints the next generation, and flips the cycle into its release phase;
//! every member leaves the release phase before new registrations open.

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant, SystemTime};
use tracing::trace;

use crate::sched::clock::SimClock;
use crate::sched::tracker::{TaskArena, TaskToken};
use crate::sched::Runtime;

#[derive(Debug, Default)]
struct CycleState {
    /// Current sleep-cycle number; bumped exactly once per completed cycle.
    generation: u64,
    /// Tasks committed to the open generation.
    registered: usize,
    /// Members of the previous generation that have not yet left it.
    releasing: usize,
}

#[derive(Default)]
struct SchedState {
    tasks: TaskArena,
    cycle: CycleState,
}

/// The deterministic virtual-time scheduler for one backtest run.
///
/// The constructing thread is counted as a live task (the root) from the
/// first instant, so the clock cannot tick while it is still setting up
/// workers; it releases the clock only by blocking through
/// [`root_token`](SimScheduler::root_token) (a sleep or a join) like any
/// other task.
pub struct SimScheduler {
    state: Mutex<SchedState>,
    cv: Condvar,
    clock: SimClock,
    root: TaskToken,
}

impl SimScheduler {
    pub fn new() -> Self {
        Self::with_start(SystemTime::now())
    }

    /// Anchor the frozen clock at an explicit wall-clock instant.
    pub fn with_start(start: SystemTime) -> Self {
        let mut state = SchedState::default();
        let root = state.tasks.register();
        Self {
            state: Mutex::new(state),
            cv: Condvar::new(),
            clock: SimClock::new(start),
            root,
        }
    }

    /// Token of the root task, registered at construction for the thread
    /// that owns the scheduler.
    #[inline]
    pub fn root_token(&self) -> TaskToken {
        self.root
    }

    /// The run's clock. Reads are lock-free.
    #[inline]
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Seconds elapsed on the simulated clock.
    #[inline]
    pub fn elapsed_seconds(&self) -> u64 {
        self.clock.elapsed_seconds()
    }

    /// The frozen wall-clock value at the current simulated second.
    #[inline]
    pub fn now(&self) -> SystemTime {
        self.clock.now()
    }

    /// Register the calling context as a live task.
    pub fn register_task(&self) -> TaskToken {
        let mut s = self.state.lock();
        let token = s.tasks.register();
        trace!(?token, live = s.tasks.live(), "task registered");
        self.cv.notify_all();
        token
    }

    /// Remove a task from the ledger. Called from the spawn wrapper's drop
    /// guard, so it runs on every exit path including panics.
    pub fn deregister_task(&self, token: TaskToken) {
        let mut s = self.state.lock();
        s.tasks.deregister(token);
        trace!(?token, live = s.tasks.live(), "task deregistered");
        self.cv.notify_all();
    }

    /// Mark the task blocked (re-entrant).
    pub fn enter_blocked(&self, token: TaskToken) {
        let mut s = self.state.lock();
        s.tasks.enter_blocked(token);
        self.cv.notify_all();
    }

    /// Undo one level of `enter_blocked`.
    pub fn exit_blocked(&self, token: TaskToken) {
        let mut s = self.state.lock();
        s.tasks.exit_blocked(token);
        self.cv.notify_all();
    }

    /// Number of live tasks that are not currently blocked.
    pub fn unblocked_tasks(&self) -> usize {
        self.state.lock().tasks.unblocked()
    }

    /// Number of live registered tasks.
    pub fn live_tasks(&self) -> usize {
        self.state.lock().tasks.live()
    }

    /// Suspend the caller until every live registered task is blocked.
    ///
    /// The caller must not itself be an unblocked registered task (the root
    /// included), or it would be the task that prevents the stall it is
    /// waiting for.
    pub fn await_global_stall(&self) {
        let mut s = self.state.lock();
        while s.tasks.unblocked() > 0 {
            self.cv.wait(&mut s);
        }
    }

    /// Timeout-bounded variant of [`await_global_stall`], returning whether
    /// quiescence was reached. Exists so the liveness counterexample (a task
    /// that never blocks) can be observed without hanging the caller.
    ///
    /// [`await_global_stall`]: SimScheduler::await_global_stall
    pub fn try_await_global_stall(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut s = self.state.lock();
        while s.tasks.unblocked() > 0 {
            if self.cv.wait_until(&mut s, deadline).timed_out() {
                return s.tasks.unblocked() == 0;
            }
        }
        true
    }

    /// Sleep for the given number of whole simulated seconds.
    pub fn sleep(&self, token: TaskToken, seconds: u64) {
        for _ in 0..seconds {
            self.tick_once(token);
        }
    }

    /// Sleep for a duration, rounding fractional seconds up.
    pub fn sleep_duration(&self, token: TaskToken, duration: Duration) {
        let mut seconds = duration.as_secs();
        if duration.subsec_nanos() > 0 {
            seconds += 1;
        }
        self.sleep(token, seconds);
    }

    /// Participate in exactly one simulated second.
    ///
    /// Blocks until every live task has stalled, at which point one member of
    /// the cycle advances the clock by one; all members then leave together.
    pub fn tick_once(&self, token: TaskToken) {
        let mut s = self.state.lock();

        // A new cycle may not form while the previous one is still releasing;
        // this is what keeps two cycles from racing on the same counters.
        while s.cycle.releasing > 0 {
            self.cv.wait(&mut s);
        }

        let generation = s.cycle.generation;
        s.cycle.registered += 1;
        s.tasks.enter_blocked(token);
        self.cv.notify_all();

        // Arrival phase. Registration and blocking happened atomically above,
        // so the cycle completes exactly when nothing live remains unblocked.
        while s.cycle.generation == generation {
            if s.tasks.unblocked() == 0 {
                let second = self.clock.advance();
                trace!(
                    second,
                    sleepers = s.cycle.registered,
                    generation,
                    "clock advanced"
                );
                s.cycle.generation = generation
                    .checked_add(1)
                    .unwrap_or_else(|| panic!("sleep-cycle generation overflow at {generation}"));
                s.cycle.releasing = s.cycle.registered;
                s.cycle.registered = 0;
                self.cv.notify_all();
                break;
            }
            self.cv.wait(&mut s);
        }

        // Release phase: unmark blocked and leave before the next generation
        // may accept registrations.
        s.tasks.exit_blocked(token);
        assert!(
            s.cycle.releasing > 0,
            "sleep-cycle release underflow (generation={}, live={}, unblocked={})",
            s.cycle.generation,
            s.tasks.live(),
            s.tasks.unblocked()
        );
        s.cycle.releasing -= 1;
        if s.cycle.releasing == 0 {
            self.cv.notify_all();
        }
    }
}

impl Default for SimScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime for SimScheduler {
    fn register_task(&self) -> TaskToken {
        SimScheduler::register_task(self)
    }

    fn deregister_task(&self, token: TaskToken) {
        SimScheduler::deregister_task(self, token)
    }

    fn enter_blocked(&self, token: TaskToken) {
        SimScheduler::enter_blocked(self, token)
    }

    fn exit_blocked(&self, token: TaskToken) {
        SimScheduler::exit_blocked(self, token)
    }

    fn sleep(&self, token: TaskToken, seconds: u64) {
        SimScheduler::sleep(self, token, seconds)
    }

    fn elapsed_seconds(&self) -> u64 {
        SimScheduler::elapsed_seconds(self)
    }

    fn now(&self) -> SystemTime {
        SimScheduler::now(self)
    }
}
