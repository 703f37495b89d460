//! Particle bursts
//!
//! A burst scatters a ring of particles around its parent element. The ring
//! grows over the burst's radius range while each particle shrinks away.

use applause_core::ElementHandle;
use smallvec::SmallVec;

use crate::easing::Easing;
use crate::timeline::{Property, Segment, Timeline, TimelineEntryId};

/// Particle outline
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Polygon,
    Circle,
}

/// Static description of a burst
#[derive(Clone, Debug, PartialEq)]
pub struct Burst {
    pub shape: Shape,
    pub count: usize,
    /// Rotation of the whole ring, in degrees
    pub angle: f32,
    /// Ring radius at start and end
    pub radius: (f32, f32),
    /// Particle radius at start and end
    pub particle_radius: (f32, f32),
    /// Particles start this long after the ring
    pub particle_delay_ms: u32,
    pub particle_easing: Easing,
}

impl Burst {
    /// Five triangles flung out to a wide ring
    pub fn triangles() -> Self {
        Self {
            shape: Shape::Polygon,
            count: 5,
            angle: 30.0,
            radius: (50.0, 95.0),
            particle_radius: (6.0, 0.0),
            particle_delay_ms: 30,
            particle_easing: Easing::BURST,
        }
    }

    /// Five dots on a tighter ring
    pub fn circles() -> Self {
        Self {
            shape: Shape::Circle,
            count: 5,
            angle: 25.0,
            radius: (50.0, 75.0),
            particle_radius: (3.0, 0.0),
            particle_delay_ms: 30,
            particle_easing: Easing::BURST,
        }
    }

    /// Add the burst's tracks to `timeline`, anchored on `parent`
    pub fn schedule(
        &self,
        timeline: &mut Timeline,
        parent: ElementHandle,
        offset_ms: u32,
        duration_ms: u32,
    ) -> BurstTracks {
        let ring = timeline.add(
            parent,
            Property::BurstRadius,
            Segment::new(offset_ms, duration_ms, self.radius.0, self.radius.1).eased(Easing::EaseOut),
        );
        let particle = timeline.add(
            parent,
            Property::ParticleRadius,
            Segment::new(
                offset_ms.saturating_add(self.particle_delay_ms),
                duration_ms,
                self.particle_radius.0,
                self.particle_radius.1,
            )
            .eased(self.particle_easing),
        );
        BurstTracks { ring, particle }
    }

    /// Lay out the particles for a ring of `ring_radius`
    ///
    /// Positions are relative to the burst centre, with y pointing down.
    pub fn particles(&self, ring_radius: f32, particle_radius: f32) -> SmallVec<[Particle; 8]> {
        let step = 360.0 / self.count.max(1) as f32;
        (0..self.count)
            .map(|i| {
                let theta = (self.angle + step * i as f32).to_radians();
                Particle {
                    x: ring_radius * theta.sin(),
                    y: -ring_radius * theta.cos(),
                    radius: particle_radius,
                }
            })
            .collect()
    }
}

/// Timeline entries driving a scheduled burst
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BurstTracks {
    pub ring: TimelineEntryId,
    pub particle: TimelineEntryId,
}

impl BurstTracks {
    /// Current `(ring_radius, particle_radius)`
    pub fn sample(&self, timeline: &Timeline) -> Option<(f32, f32)> {
        Some((timeline.value(self.ring)?, timeline.value(self.particle)?))
    }
}

/// One particle of a burst frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn test_particles_on_ring() {
        let burst = Burst::triangles();
        let particles = burst.particles(80.0, 4.0);

        assert_eq!(particles.len(), 5);
        for p in &particles {
            let distance = (p.x * p.x + p.y * p.y).sqrt();
            assert!((distance - 80.0).abs() < 1e-3);
            assert_eq!(p.radius, 4.0);
        }
    }

    #[test]
    fn test_first_particle_follows_angle() {
        let mut burst = Burst::circles();
        burst.angle = 0.0;
        let particles = burst.particles(10.0, 1.0);

        // Straight up
        assert!(particles[0].x.abs() < 1e-5);
        assert!((particles[0].y + 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_schedule_spans_radius_range() {
        let mut elements: SlotMap<ElementHandle, ()> = SlotMap::with_key();
        let parent = elements.insert(());
        let burst = Burst::triangles();
        let mut timeline = Timeline::new();

        let tracks = burst.schedule(&mut timeline, parent, 0, 300);
        timeline.replay();
        assert_eq!(tracks.sample(&timeline), Some((50.0, 6.0)));

        timeline.tick(1000.0);
        assert_eq!(tracks.sample(&timeline), Some((95.0, 0.0)));
        assert_eq!(timeline.duration_ms(), 330);
    }
}
