//! Per-task blocked/live accounting
//!
//! The arena hands out explicit `TaskToken`s at registration instead of
//! keying counters on ambient thread identity; every scheduler call carries
//! the caller's token. Tokens embed a nonce so a stale token (used after its
//! task deregistered and the slot was recycled) is caught immediately rather
//! than silently corrupting the quiescence count.
//!
//! `TaskArena` is a plain data structure: all synchronization lives in
//! `SimScheduler`, which keeps exactly one of these behind its lock.

/// Handle identifying a registered task. Issued by `Runtime::register_task`
/// and carried through every subsequent scheduler call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskToken {
    index: u32,
    nonce: u32,
}

#[derive(Debug)]
struct TaskSlot {
    nonce: u32,
    live: bool,
    /// Re-entrant: a task may be counted blocked for nested reasons.
    /// Semantically blocked iff count >= 1.
    blocked_count: u32,
}

/// Arena of registered tasks with running live/blocked totals.
#[derive(Debug, Default)]
pub(crate) struct TaskArena {
    slots: Vec<TaskSlot>,
    free: Vec<u32>,
    live: usize,
    /// Number of live tasks whose blocked count is >= 1.
    blocked: usize,
}

impl TaskArena {
    pub(crate) fn register(&mut self) -> TaskToken {
        let index = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.live = true;
                slot.blocked_count = 0;
                index
            }
            None => {
                self.slots.push(TaskSlot {
                    nonce: 0,
                    live: true,
                    blocked_count: 0,
                });
                (self.slots.len() - 1) as u32
            }
        };
        self.live += 1;
        TaskToken {
            index,
            nonce: self.slots[index as usize].nonce,
        }
    }

    pub(crate) fn deregister(&mut self, token: TaskToken) {
        let (live, blocked) = (self.live, self.blocked);
        let slot = self.slot_mut(token, live, blocked);
        // A task that dies while still counted blocked (e.g. a panic inside a
        // parked channel wait) must not leave the quiescence count skewed.
        if slot.blocked_count >= 1 {
            self.blocked -= 1;
        }
        let slot = &mut self.slots[token.index as usize];
        slot.live = false;
        slot.blocked_count = 0;
        slot.nonce = slot.nonce.wrapping_add(1);
        self.live -= 1;
        self.free.push(token.index);
    }

    pub(crate) fn enter_blocked(&mut self, token: TaskToken) {
        let (live, blocked) = (self.live, self.blocked);
        let slot = self.slot_mut(token, live, blocked);
        slot.blocked_count += 1;
        if slot.blocked_count == 1 {
            self.blocked += 1;
        }
    }

    pub(crate) fn exit_blocked(&mut self, token: TaskToken) {
        let (live, blocked) = (self.live, self.blocked);
        let slot = self.slot_mut(token, live, blocked);
        assert!(
            slot.blocked_count >= 1,
            "exit_blocked on unblocked task {token:?} (live={live}, blocked={blocked})"
        );
        slot.blocked_count -= 1;
        if slot.blocked_count == 0 {
            self.blocked -= 1;
        }
    }

    /// Count of live tasks that are not currently blocked. Global stall
    /// (quiescence) holds exactly when this is zero.
    #[inline]
    pub(crate) fn unblocked(&self) -> usize {
        self.live - self.blocked
    }

    #[inline]
    pub(crate) fn live(&self) -> usize {
        self.live
    }

    fn slot_mut(&mut self, token: TaskToken, live: usize, blocked: usize) -> &mut TaskSlot {
        let slot = self
            .slots
            .get_mut(token.index as usize)
            .unwrap_or_else(|| {
                panic!("unknown task token {token:?} (live={live}, blocked={blocked})")
            });
        assert!(
            slot.live && slot.nonce == token.nonce,
            "stale task token {token:?} (live={live}, blocked={blocked})"
        );
        slot
    }
}
