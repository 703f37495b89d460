//! Mount-aware effects
//!
//! An effect watches a dependency key derived from each committed snapshot.
//! The first commit an effect sees is its mount and never runs the callback;
//! every later commit whose key differs from the previous one queues exactly
//! one run. Queued runs execute on [`EffectScheduler::flush`], which the host
//! calls once the frame produced by the commit has been painted.
//!
//! A callback may hand back a [`Cleanup`]. It runs before the same effect runs
//! again and when the scheduler is disposed.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    pub struct EffectId;
}

/// Dependency key compared between commits
pub type DepKey = u64;

/// Teardown returned by an effect run
pub struct Cleanup(Box<dyn FnOnce()>);

impl Cleanup {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Box::new(f))
    }

    pub fn run(self) {
        (self.0)()
    }
}

/// Lifecycle of a single effect
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MountPhase {
    NotYetMounted,
    /// Holds the key observed at the last commit
    Mounted(DepKey),
}

type KeyFn<S> = Box<dyn Fn(&S) -> DepKey>;
type EffectFn<S> = Box<dyn FnMut(&S) -> Option<Cleanup>>;

struct EffectSlot<S> {
    key: KeyFn<S>,
    /// Taken out while the callback runs
    callback: Option<EffectFn<S>>,
    cleanup: Option<Cleanup>,
    phase: MountPhase,
}

struct SchedulerState<S> {
    effects: SlotMap<EffectId, EffectSlot<S>>,
    /// Registration order, which is also run order within one commit
    order: Vec<EffectId>,
    queue: VecDeque<(EffectId, Rc<S>)>,
    flushing: bool,
    disposed: bool,
}

/// Shared handle to the effect scheduler of one widget
pub struct EffectScheduler<S> {
    state: Rc<RefCell<SchedulerState<S>>>,
}

impl<S> Clone for EffectScheduler<S> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<S: 'static> EffectScheduler<S> {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(SchedulerState {
                effects: SlotMap::with_key(),
                order: Vec::new(),
                queue: VecDeque::new(),
                flushing: false,
                disposed: false,
            })),
        }
    }

    /// Register an effect keyed by `key`
    ///
    /// The effect mounts on the next [`commit`](Self::commit).
    pub fn register<K, F>(&self, key: K, callback: F) -> EffectId
    where
        K: Fn(&S) -> DepKey + 'static,
        F: FnMut(&S) -> Option<Cleanup> + 'static,
    {
        let mut state = self.state.borrow_mut();
        let id = state.effects.insert(EffectSlot {
            key: Box::new(key),
            callback: Some(Box::new(callback)),
            cleanup: None,
            phase: MountPhase::NotYetMounted,
        });
        state.order.push(id);
        id
    }

    /// Observe a committed snapshot
    ///
    /// Returns the number of runs queued.
    pub fn commit(&self, snapshot: S) -> usize {
        let mut state = self.state.borrow_mut();
        if state.disposed {
            return 0;
        }

        let snapshot = Rc::new(snapshot);
        let mut queued = 0;
        let order = state.order.clone();
        for id in order {
            let Some(slot) = state.effects.get_mut(id) else {
                continue;
            };
            let key = (slot.key)(&snapshot);
            let changed = match slot.phase {
                MountPhase::NotYetMounted => false,
                MountPhase::Mounted(previous) => previous != key,
            };
            slot.phase = MountPhase::Mounted(key);

            if changed {
                state.queue.push_back((id, snapshot.clone()));
                queued += 1;
            }
        }
        queued
    }

    /// Run queued effects in commit order
    ///
    /// Runs queued while flushing (a callback that commits) are picked up by
    /// the same flush. A nested call is a no-op.
    pub fn flush(&self) -> usize {
        {
            let mut state = self.state.borrow_mut();
            if state.flushing || state.disposed {
                return 0;
            }
            state.flushing = true;
        }

        let mut ran = 0;
        loop {
            let job = {
                let mut state = self.state.borrow_mut();
                if state.disposed {
                    None
                } else {
                    state.queue.pop_front().and_then(|(id, snapshot)| {
                        let slot = state.effects.get_mut(id)?;
                        let callback = slot.callback.take()?;
                        Some((id, snapshot, callback, slot.cleanup.take()))
                    })
                }
            };
            let Some((id, snapshot, mut callback, previous_cleanup)) = job else {
                if self.state.borrow().queue.is_empty() || self.state.borrow().disposed {
                    break;
                }
                continue;
            };

            if let Some(cleanup) = previous_cleanup {
                cleanup.run();
            }
            let cleanup = callback(&snapshot);
            ran += 1;

            // Disposed or removed mid-run: tear down right away
            let orphaned = {
                let mut state = self.state.borrow_mut();
                let disposed = state.disposed;
                match state.effects.get_mut(id) {
                    Some(slot) if !disposed => {
                        slot.callback = Some(callback);
                        slot.cleanup = cleanup;
                        None
                    }
                    _ => cleanup,
                }
            };
            if let Some(cleanup) = orphaned {
                cleanup.run();
            }
        }

        self.state.borrow_mut().flushing = false;
        tracing::trace!(ran, "effects flushed");
        ran
    }

    /// Drop an effect, running its pending cleanup
    pub fn remove(&self, id: EffectId) -> bool {
        let slot = {
            let mut state = self.state.borrow_mut();
            state.order.retain(|other| *other != id);
            state.queue.retain(|(other, _)| *other != id);
            state.effects.remove(id)
        };
        match slot {
            Some(slot) => {
                if let Some(cleanup) = slot.cleanup {
                    cleanup.run();
                }
                true
            }
            None => false,
        }
    }

    /// Discard queued runs and run every cleanup; later commits are ignored
    pub fn dispose(&self) {
        let cleanups: Vec<Cleanup> = {
            let mut state = self.state.borrow_mut();
            state.disposed = true;
            state.queue.clear();
            state
                .effects
                .values_mut()
                .filter_map(|slot| slot.cleanup.take())
                .collect()
        };
        for cleanup in cleanups {
            cleanup.run();
        }
    }

    pub fn phase(&self, id: EffectId) -> Option<MountPhase> {
        self.state.borrow().effects.get(id).map(|slot| slot.phase)
    }

    pub fn pending(&self) -> usize {
        self.state.borrow().queue.len()
    }

    pub fn is_disposed(&self) -> bool {
        self.state.borrow().disposed
    }
}

impl<S: 'static> Default for EffectScheduler<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn recorder() -> (Rc<RefCell<Vec<u64>>>, impl FnMut(&u64) -> Option<Cleanup>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        (seen, move |v: &u64| {
            seen_clone.borrow_mut().push(*v);
            None
        })
    }

    #[test]
    fn test_mount_does_not_run() {
        let effects = EffectScheduler::<u64>::new();
        let (seen, callback) = recorder();
        let id = effects.register(|v| *v, callback);

        assert_eq!(effects.phase(id), Some(MountPhase::NotYetMounted));
        assert_eq!(effects.commit(5), 0);
        effects.flush();

        assert!(seen.borrow().is_empty());
        assert_eq!(effects.phase(id), Some(MountPhase::Mounted(5)));
    }

    #[test]
    fn test_runs_once_per_distinct_key() {
        let effects = EffectScheduler::<u64>::new();
        let (seen, callback) = recorder();
        effects.register(|v| *v, callback);

        effects.commit(0);
        effects.commit(1);
        effects.commit(1);
        effects.commit(2);
        assert_eq!(effects.pending(), 2);

        assert_eq!(effects.flush(), 2);
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_deferred_until_flush() {
        let effects = EffectScheduler::<u64>::new();
        let (seen, callback) = recorder();
        effects.register(|v| *v, callback);

        effects.commit(0);
        effects.commit(3);
        assert!(seen.borrow().is_empty());

        effects.flush();
        assert_eq!(*seen.borrow(), vec![3]);
    }

    #[test]
    fn test_cleanup_runs_before_next_run() {
        let effects = EffectScheduler::<u64>::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_clone = log.clone();
        effects.register(
            |v| *v,
            move |v: &u64| {
                log_clone.borrow_mut().push(format!("run {v}"));
                let log = log_clone.clone();
                let v = *v;
                Some(Cleanup::new(move || log.borrow_mut().push(format!("cleanup {v}"))))
            },
        );

        effects.commit(0);
        effects.commit(1);
        effects.flush();
        effects.commit(2);
        effects.flush();

        assert_eq!(*log.borrow(), vec!["run 1", "cleanup 1", "run 2"]);
    }

    #[test]
    fn test_commit_order_across_effects() {
        let effects = EffectScheduler::<(u64, u64)>::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let a = log.clone();
        effects.register(
            |s| s.0,
            move |_: &(u64, u64)| {
                a.borrow_mut().push("a");
                None
            },
        );
        let b = log.clone();
        effects.register(
            |s| s.1,
            move |_: &(u64, u64)| {
                b.borrow_mut().push("b");
                None
            },
        );

        effects.commit((0, 0));
        effects.commit((0, 1));
        effects.commit((1, 1));
        effects.commit((2, 2));
        effects.flush();

        assert_eq!(*log.borrow(), vec!["b", "a", "a", "b"]);
    }

    #[test]
    fn test_dispose_drops_queue_and_runs_cleanups() {
        let effects = EffectScheduler::<u64>::new();
        let runs = Rc::new(Cell::new(0));
        let cleaned = Rc::new(Cell::new(false));

        let runs_clone = runs.clone();
        let cleaned_clone = cleaned.clone();
        effects.register(
            |v| *v,
            move |_: &u64| {
                runs_clone.set(runs_clone.get() + 1);
                let cleaned = cleaned_clone.clone();
                Some(Cleanup::new(move || cleaned.set(true)))
            },
        );

        effects.commit(0);
        effects.commit(1);
        effects.flush();
        effects.commit(2);
        effects.dispose();
        effects.flush();

        assert_eq!(runs.get(), 1);
        assert!(cleaned.get());
        assert_eq!(effects.commit(3), 0);
    }

    #[test]
    fn test_callback_commit_is_flushed_in_same_pass() {
        let effects = EffectScheduler::<u64>::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let handle = effects.clone();
        let seen_clone = seen.clone();
        effects.register(
            |v| *v,
            move |v: &u64| {
                seen_clone.borrow_mut().push(*v);
                if *v == 1 {
                    handle.commit(2);
                    assert_eq!(handle.flush(), 0);
                }
                None
            },
        );

        effects.commit(0);
        effects.commit(1);
        assert_eq!(effects.flush(), 2);
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_remove_runs_cleanup() {
        let effects = EffectScheduler::<u64>::new();
        let cleaned = Rc::new(Cell::new(false));
        let cleaned_clone = cleaned.clone();
        let id = effects.register(
            |v| *v,
            move |_: &u64| {
                let cleaned = cleaned_clone.clone();
                Some(Cleanup::new(move || cleaned.set(true)))
            },
        );

        effects.commit(0);
        effects.commit(1);
        effects.flush();
        assert!(effects.remove(id));
        assert!(cleaned.get());
        assert!(!effects.remove(id));
    }
}
