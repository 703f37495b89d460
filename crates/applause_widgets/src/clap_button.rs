//! Clap button widget
//!
//! Ties the counter, the element registry, the mount-aware effects, the reset
//! protocol and the clap animation into a single widget:
//!
//! - a clap goes through the configured reducer and commits the new state
//! - a committed count change replays the animation after the next paint
//! - an accepted reset advances the generation, which raises the busy flag
//!   after the next paint and clears it once the busy delay elapses
//!
//! The host drives time with [`ClapButton::tick`] and reports paints with
//! [`ClapButton::after_paint`].

use std::cell::RefCell;
use std::rc::Rc;

use applause_animation::{AnimationSequencer, AnimationTarget, ClapAnimation, ClapFrame, ClapTargets};
use applause_core::{
    Action, BusyIndicator, ClapLimit, ClickTally, Cleanup, CounterMachine, CounterState,
    EffectId, EffectScheduler, ElementHandle, Reducer, ReferenceRegistry, ResetCoordinator,
    Result, Timers,
};

use crate::config::ClapConfig;

/// Snapshot handed to effects after every committed change
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Commit {
    pub state: CounterState,
    pub generation: u64,
}

/// Accessibility props for the trigger element
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TogglerProps {
    /// `aria-pressed`
    pub pressed: bool,
}

/// Accessibility props for the count label
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CounterProps {
    pub count: u32,
    pub value_min: u32,
    pub value_max: u32,
    pub value_now: u32,
}

type SharedAnimation = Rc<RefCell<Option<ClapAnimation>>>;
type SharedTarget = Rc<RefCell<Option<Box<dyn AnimationTarget>>>>;

struct ClapInner {
    reducer: Box<dyn Reducer>,
    state: CounterState,
    /// State before the most recent committed change
    previous: CounterState,
    initial: CounterState,
    max_claps: u32,
    phase_ms: u32,
    coordinator: ResetCoordinator,
    registry: ReferenceRegistry,
    unmounted: bool,
}

impl ClapInner {
    fn commit(&self) -> Commit {
        Commit {
            state: self.state,
            generation: self.coordinator.generation(),
        }
    }
}

/// Handle to a clap button instance
///
/// Cloning yields another handle to the same widget.
#[derive(Clone)]
pub struct ClapButton {
    inner: Rc<RefCell<ClapInner>>,
    effects: EffectScheduler<Commit>,
    timers: Timers,
    busy: BusyIndicator,
    animation: SharedAnimation,
    render_target: SharedTarget,
    tally: ClickTally,
}

/// Create a clap button with default configuration
///
/// `initial` defaults to a zeroed state and `reducer` to the bounded counter.
pub fn create_counter(initial: Option<CounterState>, reducer: Option<Box<dyn Reducer>>) -> ClapButton {
    let mut builder = ClapButton::builder();
    if let Some(initial) = initial {
        builder = builder.initial(initial);
    }
    if let Some(reducer) = reducer {
        builder = builder.boxed_reducer(reducer);
    }
    builder.build()
}

impl ClapButton {
    pub fn new(config: ClapConfig) -> Self {
        Self::builder().config(config).build()
    }

    pub fn builder() -> ClapButtonBuilder {
        ClapButtonBuilder::default()
    }

    // ========================================================================
    // State
    // ========================================================================

    pub fn state(&self) -> CounterState {
        self.inner.borrow().state
    }

    pub fn reset_generation(&self) -> u64 {
        self.inner.borrow().coordinator.generation()
    }

    /// The busy flag raised by the last reset
    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Clicks on the trigger since the last reset
    ///
    /// A configured click limit vetoes claps against this tally.
    pub fn click_tally(&self) -> &ClickTally {
        &self.tally
    }

    pub fn toggler_props(&self) -> TogglerProps {
        TogglerProps {
            pressed: self.inner.borrow().state.activated,
        }
    }

    pub fn counter_props(&self) -> CounterProps {
        let inner = self.inner.borrow();
        CounterProps {
            count: inner.state.count,
            value_min: 0,
            value_max: inner.max_claps,
            value_now: inner.state.count,
        }
    }

    // ========================================================================
    // Interaction
    // ========================================================================

    /// Apply a clap through the configured reducer
    pub fn clap(&self) {
        self.dispatch(Action::Clap);
    }

    /// A click on the trigger: clap, then count the click against the limit
    pub fn press(&self) {
        self.clap();
        self.tally.record();
    }

    /// Reset back to the initial state if anything changed since the last
    /// settled state
    ///
    /// Returns whether a reset happened.
    pub fn reset(&self) -> bool {
        let commit = {
            let mut guard = self.inner.borrow_mut();
            if guard.unmounted {
                tracing::debug!("reset on unmounted clap button ignored");
                return false;
            }
            let inner = &mut *guard;
            let Some(action) = inner
                .coordinator
                .reset(&inner.previous, &inner.state, &inner.initial)
            else {
                return false;
            };
            let next = inner.reducer.reduce(&inner.state, &action);
            inner.state = next;
            inner.previous = next;
            inner.commit()
        };
        self.effects.commit(commit);
        true
    }

    /// A callable that runs the reset protocol
    pub fn get_reset(&self) -> impl Fn() + 'static {
        let button = self.clone();
        move || {
            button.reset();
        }
    }

    fn dispatch(&self, action: Action) -> bool {
        let commit = {
            let mut inner = self.inner.borrow_mut();
            if inner.unmounted {
                tracing::debug!(action = %action.kind(), "dispatch on unmounted clap button ignored");
                return false;
            }
            let next = inner.reducer.reduce(&inner.state, &action);
            let changed = next != inner.state;
            tracing::trace!(action = %action.kind(), changed, count = next.count, total = next.total, "dispatch");
            if !changed {
                return false;
            }
            inner.previous = inner.state;
            inner.state = next;
            inner.commit()
        };
        self.effects.commit(commit);
        true
    }

    // ========================================================================
    // Elements and animation
    // ========================================================================

    /// Register a mounted element under `role`
    ///
    /// Once trigger, count and total are all known the clap animation is
    /// built; replacing one of them later rebuilds it.
    pub fn register_ref(&self, role: &str, handle: ElementHandle) -> Result<()> {
        let built = {
            let mut inner = self.inner.borrow_mut();
            inner.registry.register(role, handle)?;
            if inner.unmounted {
                return Ok(());
            }

            let Some(targets) = ClapTargets::from_registry(&inner.registry) else {
                return Ok(());
            };
            if self.animation.borrow().as_ref().map(ClapAnimation::targets) == Some(targets) {
                return Ok(());
            }
            ClapAnimation::new(targets, inner.phase_ms)
        };

        if let Some(target) = self.render_target.borrow_mut().as_mut() {
            built.normalize(target.as_mut());
        }
        *self.animation.borrow_mut() = Some(built);
        Ok(())
    }

    pub fn is_animation_ready(&self) -> bool {
        self.animation.borrow().is_some()
    }

    pub fn is_animating(&self) -> bool {
        self.animation
            .borrow()
            .as_ref()
            .is_some_and(|animation| animation.is_playing())
    }

    /// Number of times the animation has been (re)started
    pub fn animation_plays(&self) -> u32 {
        self.animation
            .borrow()
            .as_ref()
            .map_or(0, |animation| animation.timeline().plays())
    }

    pub fn animation_frame(&self) -> Option<ClapFrame> {
        self.animation.borrow().as_ref().map(ClapAnimation::frame)
    }

    // ========================================================================
    // Effects and time
    // ========================================================================

    /// Run `callback` after every paint that follows a count change
    ///
    /// Never runs for the count the widget had when the callback was added.
    pub fn on_count_change(&self, mut callback: impl FnMut(&CounterState) + 'static) -> EffectId {
        let id = self.effects.register(
            |commit: &Commit| commit.state.count as u64,
            move |commit: &Commit| {
                callback(&commit.state);
                None
            },
        );
        self.mount_effects();
        id
    }

    /// Run `callback` after every paint that follows an accepted reset
    pub fn on_reset_generation(&self, mut callback: impl FnMut(u64) + 'static) -> EffectId {
        let id = self.effects.register(
            |commit: &Commit| commit.generation,
            move |commit: &Commit| {
                callback(commit.generation);
                None
            },
        );
        self.mount_effects();
        id
    }

    pub fn remove_effect(&self, id: EffectId) -> bool {
        self.effects.remove(id)
    }

    /// The frame produced by the latest commits has been painted
    ///
    /// Runs pending effects; returns how many ran.
    pub fn after_paint(&self) -> usize {
        self.effects.flush()
    }

    /// Advance virtual time by `dt_ms`
    ///
    /// Flushes pending effects first, then fires due timers and steps the
    /// animation, pushing its values to the render target. The widget holds
    /// no borrows while the render target runs, so the target may query it.
    pub fn tick(&self, dt_ms: u64) {
        if self.inner.borrow().unmounted {
            return;
        }
        self.after_paint();
        self.timers.advance(dt_ms);

        let has_target = self.render_target.borrow().is_some();
        let batch = {
            let mut animation = self.animation.borrow_mut();
            let Some(animation) = animation.as_mut() else {
                return;
            };
            animation.tick(dt_ms as f32);
            if !has_target || animation.timeline().plays() == 0 {
                return;
            }
            animation.render_batch()
        };
        if let Some(target) = self.render_target.borrow_mut().as_mut() {
            batch.push_to(target.as_mut());
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.timers.now_ms()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.pending()
    }

    /// Tear the widget down
    ///
    /// Pending effects are dropped, cleanups run and timers are cancelled.
    /// A raised busy flag is lowered. Later interaction is ignored.
    pub fn unmount(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.unmounted {
                return;
            }
            inner.unmounted = true;
        }
        self.effects.dispose();
        self.timers.cancel_all();
        self.busy.clear();
        self.animation.borrow_mut().take();
        tracing::debug!("clap button unmounted");
    }

    pub fn is_unmounted(&self) -> bool {
        self.inner.borrow().unmounted
    }

    fn mount_effects(&self) {
        let commit = self.inner.borrow().commit();
        self.effects.commit(commit);
    }

    fn install_builtin_effects(&self) {
        let animation = self.animation.clone();
        self.effects.register(
            |commit: &Commit| commit.state.count as u64,
            move |_: &Commit| {
                match animation.borrow_mut().as_mut() {
                    Some(animation) => animation.replay(),
                    None => tracing::trace!("replay skipped, elements not registered yet"),
                }
                None
            },
        );

        let busy = self.busy.clone();
        let timers = self.timers.clone();
        let tally = self.tally.clone();
        self.effects.register(
            |commit: &Commit| commit.generation,
            move |commit: &Commit| {
                let timer = busy.engage(&timers);
                tally.clear();
                tracing::debug!(generation = commit.generation, "uploading reset");

                let timers = timers.clone();
                Some(Cleanup::new(move || {
                    timers.cancel(timer);
                }))
            },
        );
    }
}

/// Builder for [`ClapButton`]
#[derive(Default)]
pub struct ClapButtonBuilder {
    config: ClapConfig,
    initial: Option<CounterState>,
    reducer: Option<Box<dyn Reducer>>,
    render_target: Option<Box<dyn AnimationTarget>>,
}

impl ClapButtonBuilder {
    pub fn config(mut self, config: ClapConfig) -> Self {
        self.config = config;
        self
    }

    /// Starting state, overriding the configured initial counts
    pub fn initial(mut self, initial: CounterState) -> Self {
        self.initial = Some(initial);
        self
    }

    /// Replace the built-in counter (and any configured click limit)
    pub fn reducer(self, reducer: impl Reducer + 'static) -> Self {
        self.boxed_reducer(Box::new(reducer))
    }

    pub fn boxed_reducer(mut self, reducer: Box<dyn Reducer>) -> Self {
        self.reducer = Some(reducer);
        self
    }

    pub fn render_target(mut self, target: impl AnimationTarget + 'static) -> Self {
        self.render_target = Some(Box::new(target));
        self
    }

    pub fn build(self) -> ClapButton {
        let config = self.config;
        let mut initial = self.initial.unwrap_or_else(|| config.initial_state());
        if initial.count > config.max_claps {
            tracing::warn!(
                count = initial.count,
                max = config.max_claps,
                "initial count above cap, clamped"
            );
            initial.count = config.max_claps;
        }

        let machine = CounterMachine::new(config.max_claps);
        let tally = ClickTally::new();
        let reducer: Box<dyn Reducer> = match (self.reducer, config.clap_limit) {
            (Some(reducer), _) => reducer,
            (None, Some(limit)) => Box::new(ClapLimit::new(machine, limit, tally.clone())),
            (None, None) => Box::new(machine),
        };

        let button = ClapButton {
            inner: Rc::new(RefCell::new(ClapInner {
                reducer,
                state: initial,
                previous: initial,
                initial,
                max_claps: config.max_claps,
                phase_ms: config.phase_duration_ms,
                coordinator: ResetCoordinator::new(),
                registry: ReferenceRegistry::new(),
                unmounted: false,
            })),
            effects: EffectScheduler::new(),
            timers: Timers::new(),
            busy: BusyIndicator::new(config.busy_delay_ms),
            animation: Rc::new(RefCell::new(None)),
            render_target: Rc::new(RefCell::new(self.render_target)),
            tally,
        };

        button.install_builtin_effects();
        button.mount_effects();
        button
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use applause_animation::Property;
    use applause_core::roles;
    use slotmap::SlotMap;

    fn elements() -> (ElementHandle, ElementHandle, ElementHandle) {
        let mut elements: SlotMap<ElementHandle, ()> = SlotMap::with_key();
        (elements.insert(()), elements.insert(()), elements.insert(()))
    }

    #[test]
    fn test_clap_without_elements_still_counts() {
        let button = create_counter(Some(CounterState::new(0, 10)), None);

        button.clap();
        button.tick(16);

        assert_eq!(button.state().count, 1);
        assert_eq!(button.state().total, 11);
        assert!(!button.is_animation_ready());
    }

    #[test]
    fn test_animation_built_when_roles_complete() {
        let button = ClapButton::new(ClapConfig::default());
        let (trigger, count, total) = elements();

        button.register_ref(roles::COUNT, count).unwrap();
        button.register_ref(roles::TRIGGER, trigger).unwrap();
        assert!(!button.is_animation_ready());

        button.register_ref(roles::TOTAL, total).unwrap();
        assert!(button.is_animation_ready());
        assert_eq!(button.animation_plays(), 0);
    }

    #[test]
    fn test_empty_role_reported() {
        let button = ClapButton::new(ClapConfig::default());
        let (trigger, _, _) = elements();

        assert!(button.register_ref("", trigger).is_err());
    }

    #[test]
    fn test_clap_replays_after_paint() {
        let button = ClapButton::new(ClapConfig::default());
        let (trigger, count, total) = elements();
        button.register_ref(roles::TRIGGER, trigger).unwrap();
        button.register_ref(roles::COUNT, count).unwrap();
        button.register_ref(roles::TOTAL, total).unwrap();

        button.clap();
        assert_eq!(button.animation_plays(), 0);

        button.after_paint();
        assert_eq!(button.animation_plays(), 1);
        assert!(button.is_animating());
    }

    #[test]
    fn test_props_follow_state() {
        let button = ClapButton::new(ClapConfig {
            max_claps: 10,
            ..ClapConfig::default()
        });
        assert!(!button.toggler_props().pressed);

        button.clap();
        assert!(button.toggler_props().pressed);
        assert_eq!(
            button.counter_props(),
            CounterProps {
                count: 1,
                value_min: 0,
                value_max: 10,
                value_now: 1,
            }
        );
    }

    #[test]
    fn test_reset_without_change_is_noop() {
        let button = ClapButton::new(ClapConfig::default());

        assert!(!button.reset());
        assert_eq!(button.reset_generation(), 0);
    }

    struct QueryingTarget {
        button: Rc<RefCell<Option<ClapButton>>>,
        writes: Rc<Cell<usize>>,
    }

    impl AnimationTarget for QueryingTarget {
        fn apply(&mut self, _target: ElementHandle, _property: Property, _value: f32) {
            if let Some(button) = self.button.borrow().as_ref() {
                button.is_animating();
                button.animation_frame();
                button.state();
            }
            self.writes.set(self.writes.get() + 1);
        }
    }

    #[test]
    fn test_render_target_may_query_widget() {
        let (trigger, count, total) = elements();
        let slot = Rc::new(RefCell::new(None));
        let writes = Rc::new(Cell::new(0));
        let button = ClapButton::builder()
            .render_target(QueryingTarget {
                button: slot.clone(),
                writes: writes.clone(),
            })
            .build();
        *slot.borrow_mut() = Some(button.clone());

        button.register_ref(roles::TRIGGER, trigger).unwrap();
        button.register_ref(roles::COUNT, count).unwrap();
        button.register_ref(roles::TOTAL, total).unwrap();
        assert_eq!(writes.get(), 1);

        button.clap();
        button.tick(16);
        assert!(writes.get() > 1);

        slot.borrow_mut().take();
    }

    #[test]
    fn test_initial_count_clamped_to_cap() {
        let button = ClapButton::builder()
            .config(ClapConfig {
                max_claps: 5,
                ..ClapConfig::default()
            })
            .initial(CounterState::new(60, 0))
            .build();
        assert_eq!(button.state().count, 5);

        button.clap();
        assert_eq!(button.state().count, 5);
        assert_eq!(button.counter_props().value_now, 5);
    }

    #[test]
    fn test_unmount_ignores_interaction() {
        let button = ClapButton::new(ClapConfig::default());
        button.unmount();

        button.clap();
        assert_eq!(button.state().count, 0);
        assert!(!button.reset());
        assert!(button.is_unmounted());
    }
}
