//! Timeline orchestration for element property tracks
//!
//! Every entry drives one property of one element through a chain of
//! segments, all positioned against the timeline's shared clock.

use applause_core::ElementHandle;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::easing::Easing;

new_key_type! {
    pub struct TimelineEntryId;
}

/// Visual property animated by a timeline entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Property {
    Scale,
    Opacity,
    /// Vertical offset in pixels, negative is up
    TranslateY,
    /// Distance of burst particles from the burst centre
    BurstRadius,
    /// Size of each burst particle
    ParticleRadius,
}

/// One leg of an entry: `from -> to` over `duration_ms`, starting at `offset_ms`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub offset_ms: u32,
    pub duration_ms: u32,
    pub from: f32,
    pub to: f32,
    pub easing: Easing,
}

impl Segment {
    pub fn new(offset_ms: u32, duration_ms: u32, from: f32, to: f32) -> Self {
        Self {
            offset_ms,
            duration_ms,
            from,
            to,
            easing: Easing::Linear,
        }
    }

    pub fn eased(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn end_ms(&self) -> u32 {
        self.offset_ms.saturating_add(self.duration_ms)
    }

    fn sample(&self, local_ms: f32) -> f32 {
        if self.duration_ms == 0 {
            return self.to;
        }
        let progress = local_ms / self.duration_ms as f32;
        self.from + (self.to - self.from) * self.easing.apply(progress)
    }
}

/// An entry in a timeline
struct TimelineEntry {
    target: ElementHandle,
    property: Property,
    /// Ordered by offset, non-overlapping
    segments: SmallVec<[Segment; 2]>,
}

impl TimelineEntry {
    fn value_at(&self, time_ms: f32) -> f32 {
        let mut value = self.segments[0].from;
        for segment in &self.segments {
            let local = time_ms - segment.offset_ms as f32;
            if local < 0.0 {
                break;
            }
            if local >= segment.duration_ms as f32 {
                value = segment.to;
                continue;
            }
            return segment.sample(local);
        }
        value
    }
}

/// Property value sampled from a timeline
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub target: ElementHandle,
    pub property: Property,
    pub value: f32,
}

/// A timeline that orchestrates property tracks on a shared clock
pub struct Timeline {
    entries: SlotMap<TimelineEntryId, TimelineEntry>,
    current_time: f32,
    duration_ms: u32,
    playing: bool,
    /// Times the timeline was (re)started
    plays: u32,
}

impl Timeline {
    pub fn new() -> Self {
        Self {
            entries: SlotMap::with_key(),
            current_time: 0.0,
            duration_ms: 0,
            playing: false,
            plays: 0,
        }
    }

    /// Add a track for `property` of `target`
    pub fn add(&mut self, target: ElementHandle, property: Property, segment: Segment) -> TimelineEntryId {
        self.duration_ms = self.duration_ms.max(segment.end_ms());
        self.entries.insert(TimelineEntry {
            target,
            property,
            segments: smallvec::smallvec![segment],
        })
    }

    /// Chain a segment onto an entry
    ///
    /// It starts `delay_ms` after the entry's last segment ends and departs
    /// from that segment's end value.
    pub fn then(
        &mut self,
        id: TimelineEntryId,
        delay_ms: u32,
        duration_ms: u32,
        to: f32,
        easing: Easing,
    ) -> Option<Segment> {
        let entry = self.entries.get_mut(id)?;
        let last = *entry.segments.last()?;
        let segment = Segment {
            offset_ms: last.end_ms().saturating_add(delay_ms),
            duration_ms,
            from: last.to,
            to,
            easing,
        };
        entry.segments.push(segment);
        self.duration_ms = self.duration_ms.max(segment.end_ms());
        Some(segment)
    }

    /// Restart from time zero, pre-empting any play in flight
    pub fn replay(&mut self) {
        self.current_time = 0.0;
        self.playing = true;
        self.plays += 1;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn plays(&self) -> u32 {
        self.plays
    }

    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Advance the timeline
    pub fn tick(&mut self, dt_ms: f32) {
        if !self.playing {
            return;
        }

        self.current_time += dt_ms;

        if self.current_time >= self.duration_ms as f32 {
            self.current_time = self.duration_ms as f32;
            self.playing = false;
        }
    }

    /// Get the current value for an entry
    pub fn value(&self, id: TimelineEntryId) -> Option<f32> {
        self.entries
            .get(id)
            .map(|entry| entry.value_at(self.current_time))
    }

    /// Current value of every entry
    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.entries.values().map(|entry| Sample {
            target: entry.target,
            property: entry.property,
            value: entry.value_at(self.current_time),
        })
    }

    pub fn segments(&self, id: TimelineEntryId) -> Option<&[Segment]> {
        self.entries.get(id).map(|entry| entry.segments.as_slice())
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}
