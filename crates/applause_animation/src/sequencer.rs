//! The clap animation sequence
//!
//! Five phases share one timeline clock, where `D` is the phase duration:
//!
//! | phase            | element | start  | length | motion                                   |
//! |------------------|---------|--------|--------|------------------------------------------|
//! | scale pulse      | trigger | 0      | D      | scale 1.3 -> 1.0, ease-out               |
//! | triangle burst   | trigger | 0      | D      | 5 particles, ring 50 -> 95               |
//! | circle burst     | trigger | 0      | D      | 5 particles, ring 50 -> 75               |
//! | total rise       | total   | 1.5D   | D      | opacity 0 -> 1, y 0 -> -3                |
//! | count rise, fade | count   | 1.5D   | D, D/2 | opacity 0 -> 1 -> 0, y 0 -> -30 -> -80   |

use applause_core::{roles, ElementHandle, ReferenceRegistry};
use smallvec::SmallVec;

use crate::burst::{Burst, BurstTracks, Particle, Shape};
use crate::easing::Easing;
use crate::timeline::{Property, Sample, Segment, Timeline, TimelineEntryId};

/// Default length of one phase, in milliseconds
pub const DEFAULT_PHASE_DURATION_MS: u32 = 300;

/// Something that can restart an animation from time zero
pub trait AnimationSequencer {
    /// Restart every phase from time zero, pre-empting a play in flight
    fn replay(&mut self);

    /// Advance the shared clock
    fn tick(&mut self, dt_ms: f32);

    fn is_playing(&self) -> bool;
}

/// Rendering-layer sink for animated values
pub trait AnimationTarget {
    fn apply(&mut self, target: ElementHandle, property: Property, value: f32);

    /// Burst particles around `parent`, relative to its centre
    fn burst(&mut self, _parent: ElementHandle, _shape: Shape, _particles: &[Particle]) {}
}

/// The three elements the clap sequence animates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClapTargets {
    pub trigger: ElementHandle,
    pub count: ElementHandle,
    pub total: ElementHandle,
}

impl ClapTargets {
    /// Resolve the targets once every role is registered
    pub fn from_registry(registry: &ReferenceRegistry) -> Option<Self> {
        Some(Self {
            trigger: registry.get(roles::TRIGGER)?,
            count: registry.get(roles::COUNT)?,
            total: registry.get(roles::TOTAL)?,
        })
    }
}

/// Values of the clap sequence at the current time
#[derive(Clone, Debug, PartialEq)]
pub struct ClapFrame {
    pub trigger_scale: f32,
    pub total_opacity: f32,
    pub total_offset: f32,
    pub count_opacity: f32,
    pub count_offset: f32,
    pub triangles: SmallVec<[Particle; 8]>,
    pub circles: SmallVec<[Particle; 8]>,
}

/// One frame's worth of render writes, detached from the animation
///
/// Lets the host release its hold on the animation before calling into the
/// rendering layer.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderBatch {
    samples: SmallVec<[Sample; 16]>,
    bursts: SmallVec<[(ElementHandle, Shape, SmallVec<[Particle; 8]>); 2]>,
}

impl RenderBatch {
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn push_to(&self, sink: &mut dyn AnimationTarget) {
        for sample in &self.samples {
            sink.apply(sample.target, sample.property, sample.value);
        }
        for (parent, shape, particles) in &self.bursts {
            sink.burst(*parent, *shape, particles);
        }
    }
}

struct Tracks {
    scale: TimelineEntryId,
    total_opacity: TimelineEntryId,
    total_offset: TimelineEntryId,
    count_opacity: TimelineEntryId,
    count_offset: TimelineEntryId,
    triangles: BurstTracks,
    circles: BurstTracks,
}

/// Five-phase clap animation bound to its target elements
pub struct ClapAnimation {
    timeline: Timeline,
    targets: ClapTargets,
    phase_ms: u32,
    triangles: Burst,
    circles: Burst,
    tracks: Tracks,
}

impl ClapAnimation {
    pub fn new(targets: ClapTargets, phase_ms: u32) -> Self {
        let mut timeline = Timeline::new();
        let triangles = Burst::triangles();
        let circles = Burst::circles();
        let label_offset = phase_ms.saturating_mul(3) / 2;

        let scale = timeline.add(
            targets.trigger,
            Property::Scale,
            Segment::new(0, phase_ms, 1.3, 1.0).eased(Easing::EaseOut),
        );
        let triangle_tracks = triangles.schedule(&mut timeline, targets.trigger, 0, phase_ms);
        let circle_tracks = circles.schedule(&mut timeline, targets.trigger, 0, phase_ms);

        let total_opacity = timeline.add(
            targets.total,
            Property::Opacity,
            Segment::new(label_offset, phase_ms, 0.0, 1.0),
        );
        let total_offset = timeline.add(
            targets.total,
            Property::TranslateY,
            Segment::new(label_offset, phase_ms, 0.0, -3.0),
        );

        let count_opacity = timeline.add(
            targets.count,
            Property::Opacity,
            Segment::new(label_offset, phase_ms, 0.0, 1.0),
        );
        let count_offset = timeline.add(
            targets.count,
            Property::TranslateY,
            Segment::new(label_offset, phase_ms, 0.0, -30.0),
        );
        timeline.then(count_opacity, 0, phase_ms / 2, 0.0, Easing::Linear);
        timeline.then(count_offset, 0, phase_ms / 2, -80.0, Easing::Linear);

        tracing::debug!(phase_ms, length_ms = timeline.duration_ms(), "clap animation built");

        Self {
            timeline,
            targets,
            phase_ms,
            triangles,
            circles,
            tracks: Tracks {
                scale,
                total_opacity,
                total_offset,
                count_opacity,
                count_offset,
                triangles: triangle_tracks,
                circles: circle_tracks,
            },
        }
    }

    pub fn targets(&self) -> ClapTargets {
        self.targets
    }

    pub fn phase_ms(&self) -> u32 {
        self.phase_ms
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Put the trigger back to identity scale
    ///
    /// Done once before the first play, undoing whatever else touched it.
    pub fn normalize(&self, sink: &mut dyn AnimationTarget) {
        sink.apply(self.targets.trigger, Property::Scale, 1.0);
    }

    pub fn frame(&self) -> ClapFrame {
        let value = |id: TimelineEntryId| self.timeline.value(id).unwrap_or_default();
        let (ring, particle) = self.tracks.triangles.sample(&self.timeline).unwrap_or_default();
        let triangles = self.triangles.particles(ring, particle);
        let (ring, particle) = self.tracks.circles.sample(&self.timeline).unwrap_or_default();
        let circles = self.circles.particles(ring, particle);

        ClapFrame {
            trigger_scale: value(self.tracks.scale),
            total_opacity: value(self.tracks.total_opacity),
            total_offset: value(self.tracks.total_offset),
            count_opacity: value(self.tracks.count_opacity),
            count_offset: value(self.tracks.count_offset),
            triangles,
            circles,
        }
    }

    /// Capture the current frame as render writes
    pub fn render_batch(&self) -> RenderBatch {
        let frame = self.frame();
        RenderBatch {
            samples: self.timeline.samples().collect(),
            bursts: smallvec::smallvec![
                (self.targets.trigger, self.triangles.shape, frame.triangles),
                (self.targets.trigger, self.circles.shape, frame.circles),
            ],
        }
    }

    /// Push the current frame to the rendering layer
    pub fn apply(&self, sink: &mut dyn AnimationTarget) {
        self.render_batch().push_to(sink);
    }
}

impl AnimationSequencer for ClapAnimation {
    fn replay(&mut self) {
        self.timeline.replay();
        tracing::debug!(plays = self.timeline.plays(), "clap animation replay");
    }

    fn tick(&mut self, dt_ms: f32) {
        self.timeline.tick(dt_ms);
    }

    fn is_playing(&self) -> bool {
        self.timeline.is_playing()
    }
}
