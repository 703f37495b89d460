//! Virtual-time timers
//!
//! The host advances time explicitly, so every deferred callback fires at a
//! deterministic point. Timers are single-threaded and cancellable.

use std::cell::RefCell;
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    pub struct TimerId;
}

type TimerCallback = Box<dyn FnOnce()>;

struct Timer {
    deadline_ms: u64,
    /// Schedule order, breaks ties between equal deadlines
    seq: u64,
    callback: TimerCallback,
}

#[derive(Default)]
struct TimerQueue {
    now_ms: u64,
    next_seq: u64,
    timers: SlotMap<TimerId, Timer>,
}

impl TimerQueue {
    /// Remove the earliest timer due at or before `until`
    fn pop_due(&mut self, until: u64) -> Option<(u64, TimerCallback)> {
        let (id, _) = self
            .timers
            .iter()
            .filter(|(_, t)| t.deadline_ms <= until)
            .min_by_key(|(_, t)| (t.deadline_ms, t.seq))?;
        let timer = self.timers.remove(id)?;
        Some((timer.deadline_ms, timer.callback))
    }
}

/// Shared handle to a virtual-time timer queue
#[derive(Clone, Default)]
pub struct Timers {
    queue: Rc<RefCell<TimerQueue>>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now_ms(&self) -> u64 {
        self.queue.borrow().now_ms
    }

    /// Run `callback` once `delay_ms` of virtual time has elapsed
    ///
    /// Deadlines saturate at `u64::MAX`.
    pub fn schedule(&self, delay_ms: u64, callback: impl FnOnce() + 'static) -> TimerId {
        let mut queue = self.queue.borrow_mut();
        let deadline_ms = queue.now_ms.saturating_add(delay_ms);
        let seq = queue.next_seq;
        queue.next_seq += 1;
        let id = queue.timers.insert(Timer {
            deadline_ms,
            seq,
            callback: Box::new(callback),
        });
        tracing::trace!(?id, deadline_ms, "timer scheduled");
        id
    }

    /// Cancel a pending timer
    ///
    /// Returns false if it already fired or was cancelled.
    pub fn cancel(&self, id: TimerId) -> bool {
        let cancelled = self.queue.borrow_mut().timers.remove(id).is_some();
        tracing::trace!(?id, cancelled, "timer cancel");
        cancelled
    }

    pub fn cancel_all(&self) {
        self.queue.borrow_mut().timers.clear();
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.queue.borrow().timers.contains_key(id)
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().timers.len()
    }

    /// Advance virtual time, firing due timers in deadline order
    ///
    /// Callbacks run without the queue borrowed, so they may schedule or
    /// cancel other timers. A timer scheduled by a callback fires in the same
    /// call if its deadline falls inside the window.
    pub fn advance(&self, dt_ms: u64) {
        let until = self.queue.borrow().now_ms.saturating_add(dt_ms);

        loop {
            let due = self.queue.borrow_mut().pop_due(until);
            let Some((deadline_ms, callback)) = due else {
                break;
            };
            self.queue.borrow_mut().now_ms = deadline_ms;
            tracing::trace!(deadline_ms, "timer fired");
            callback();
        }

        self.queue.borrow_mut().now_ms = until;
    }
}
