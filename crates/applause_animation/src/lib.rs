//! Applause Animation System
//!
//! Easing curves, chained property timelines and particle bursts, composed
//! into the clap button's five-phase sequence.
//!
//! # Features
//!
//! - **Easing**: CSS-compatible cubic bezier curves
//! - **Timelines**: property tracks on one clock, with chained segments
//! - **Bursts**: rings of particles sampled from the timeline
//! - **Sequencer**: the clap animation, restartable at any point

pub mod burst;
pub mod easing;
pub mod sequencer;
pub mod timeline;

pub use burst::{Burst, BurstTracks, Particle, Shape};
pub use easing::Easing;
pub use sequencer::{
    AnimationSequencer, AnimationTarget, ClapAnimation, ClapFrame, ClapTargets, RenderBatch,
    DEFAULT_PHASE_DURATION_MS,
};
pub use timeline::{Property, Sample, Segment, Timeline, TimelineEntryId};
