//! Quiescence-aware bounded channel
//!
//! A bounded MPMC queue whose blocking operations participate in the
//! scheduler's blocked/unblocked accounting: `send` and `recv` first try the
//! non-blocking path, then park with `enter_blocked`, so a task waiting on a
//! queue frees the clock to advance exactly like a sleeping task.
//!
//! The delivery protocol is ordered so that no additional settling delay is
//! needed after a send. A sender that delivers into a channel with parked
//! consumers removes one parked token from the wait list and exits its
//! blocked count *in the same critical section as the push*. By the time the
//! sender can reach any quiescence check, the woken consumer is already
//! counted unblocked, so the clock can never tick while a consumer holds
//! undelivered data. Receives hand off to parked senders symmetrically.
//!
//! Off-the-shelf channels cannot express this; their blocking waits are
//! invisible to the quiescence tracker, which is why the simulated path
//! carries its own queue instead of a crossbeam channel.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::sched::scheduler::SimScheduler;
use crate::sched::tracker::TaskToken;

/// Sending half of a channel whose receivers all disconnected.
#[derive(Debug, PartialEq, Eq)]
pub struct SendError<T>(pub T);

impl<T> fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sending on a channel with no receivers")
    }
}

/// Receiving on a channel whose senders all disconnected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecvError;

impl fmt::Display for RecvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "receiving on a channel with no senders")
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum TrySendError<T> {
    Full(T),
    Disconnected(T),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryRecvError {
    Empty,
    Disconnected,
}

struct ChanState<T> {
    buffer: VecDeque<T>,
    capacity: usize,
    /// Tokens of consumers currently parked on an empty buffer. A token is in
    /// this list iff the task's blocked count still holds one unit for this
    /// wait; whoever removes the token owns the matching `exit_blocked`.
    recv_parked: VecDeque<TaskToken>,
    /// Tokens of producers currently parked on a full buffer; same ownership
    /// rule as `recv_parked`.
    send_parked: VecDeque<TaskToken>,
    senders: usize,
    receivers: usize,
}

struct Shared<T> {
    sched: Arc<SimScheduler>,
    state: Mutex<ChanState<T>>,
    cv: Condvar,
}

impl<T> Shared<T> {
    /// Remove `token` from a parked list if a peer has not already done so,
    /// releasing the matching blocked unit. Returns silently when a peer got
    /// there first (the handoff path).
    fn unpark_self(&self, parked: &mut VecDeque<TaskToken>, token: TaskToken) {
        if let Some(pos) = parked.iter().position(|t| *t == token) {
            parked.remove(pos);
            self.sched.exit_blocked(token);
        }
    }
}

/// Create a bounded quiescence-aware channel on the given scheduler.
pub fn sim_channel<T: Send>(
    sched: &Arc<SimScheduler>,
    capacity: usize,
) -> (SimSender<T>, SimReceiver<T>) {
    assert!(capacity >= 1, "channel capacity must be at least 1");
    let shared = Arc::new(Shared {
        sched: Arc::clone(sched),
        state: Mutex::new(ChanState {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
            recv_parked: VecDeque::new(),
            send_parked: VecDeque::new(),
            senders: 1,
            receivers: 1,
        }),
        cv: Condvar::new(),
    });
    (
        SimSender {
            shared: Arc::clone(&shared),
        },
        SimReceiver { shared },
    )
}

pub struct SimSender<T> {
    shared: Arc<Shared<T>>,
}

pub struct SimReceiver<T> {
    shared: Arc<Shared<T>>,
}

enum WaitOutcome {
    Ready,
    Disconnected,
}

impl<T: Send> SimSender<T> {
    /// Deliver a value, parking quiescence-aware if the buffer is full.
    pub fn send(&self, token: TaskToken, value: T) -> Result<(), SendError<T>> {
        let shared = &self.shared;
        let mut ch = shared.state.lock();
        let mut parked = false;

        let outcome = loop {
            if parked && !ch.send_parked.contains(&token) {
                // A receiver handed us the free slot and already released our
                // blocked unit.
                parked = false;
            }
            if ch.receivers == 0 {
                break WaitOutcome::Disconnected;
            }
            if ch.buffer.len() < ch.capacity {
                break WaitOutcome::Ready;
            }
            if !parked {
                ch.send_parked.push_back(token);
                shared.sched.enter_blocked(token);
                parked = true;
            }
            shared.cv.wait(&mut ch);
        };

        if parked {
            shared.unpark_self(&mut ch.send_parked, token);
        }
        match outcome {
            WaitOutcome::Disconnected => Err(SendError(value)),
            WaitOutcome::Ready => {
                ch.buffer.push_back(value);
                // Hand the delivery to one parked consumer before this task
                // can reach any quiescence check.
                if let Some(consumer) = ch.recv_parked.pop_front() {
                    shared.sched.exit_blocked(consumer);
                }
                shared.cv.notify_all();
                Ok(())
            }
        }
    }

    /// Non-blocking send.
    pub fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        let shared = &self.shared;
        let mut ch = shared.state.lock();
        if ch.receivers == 0 {
            return Err(TrySendError::Disconnected(value));
        }
        if ch.buffer.len() >= ch.capacity {
            return Err(TrySendError::Full(value));
        }
        ch.buffer.push_back(value);
        if let Some(consumer) = ch.recv_parked.pop_front() {
            shared.sched.exit_blocked(consumer);
        }
        shared.cv.notify_all();
        Ok(())
    }
}

impl<T: Send> SimReceiver<T> {
    /// Take a value, parking quiescence-aware if the buffer is empty.
    pub fn recv(&self, token: TaskToken) -> Result<T, RecvError> {
        let shared = &self.shared;
        let mut ch = shared.state.lock();
        let mut parked = false;

        loop {
            if parked && !ch.recv_parked.contains(&token) {
                parked = false;
            }
            if let Some(value) = ch.buffer.pop_front() {
                if parked {
                    shared.unpark_self(&mut ch.recv_parked, token);
                }
                // Free slot: hand it to one parked producer.
                if let Some(producer) = ch.send_parked.pop_front() {
                    shared.sched.exit_blocked(producer);
                }
                shared.cv.notify_all();
                return Ok(value);
            }
            if ch.senders == 0 {
                if parked {
                    shared.unpark_self(&mut ch.recv_parked, token);
                }
                return Err(RecvError);
            }
            if !parked {
                ch.recv_parked.push_back(token);
                shared.sched.enter_blocked(token);
                parked = true;
            }
            shared.cv.wait(&mut ch);
        }
    }

    /// Non-blocking receive.
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        let shared = &self.shared;
        let mut ch = shared.state.lock();
        match ch.buffer.pop_front() {
            Some(value) => {
                if let Some(producer) = ch.send_parked.pop_front() {
                    shared.sched.exit_blocked(producer);
                }
                shared.cv.notify_all();
                Ok(value)
            }
            None if ch.senders == 0 => Err(TryRecvError::Disconnected),
            None => Err(TryRecvError::Empty),
        }
    }
}

impl<T> Clone for SimSender<T> {
    fn clone(&self) -> Self {
        self.shared.state.lock().senders += 1;
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Drop for SimSender<T> {
    fn drop(&mut self) {
        let mut ch = self.shared.state.lock();
        ch.senders -= 1;
        if ch.senders == 0 {
            // Parked consumers wake, observe the disconnect, and unpark
            // themselves.
            self.shared.cv.notify_all();
        }
    }
}

impl<T> Clone for SimReceiver<T> {
    fn clone(&self) -> Self {
        self.shared.state.lock().receivers += 1;
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Drop for SimReceiver<T> {
    fn drop(&mut self) {
        let mut ch = self.shared.state.lock();
        ch.receivers -= 1;
        if ch.receivers == 0 {
            self.shared.cv.notify_all();
        }
    }
}
