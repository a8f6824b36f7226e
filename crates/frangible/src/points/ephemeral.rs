//! The pool of short-lived particles.

use glam::Vec2;
use rand::Rng;

use crate::{ElementIndex, MaterialId, MeshError, PlaneId, as_index, consts};

use super::Points;

/// The kinds of short-lived particles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EphemeralType {
    /// An air bubble rising through water.
    AirBubble,
    /// A fragment thrown off by a break.
    Debris,
    /// A smoke puff.
    Smoke,
    /// A spark.
    Sparkle,
    /// A bubble trailing a moving body.
    WakeBubble,
}

impl EphemeralType {
    /// Whether a particle of this kind replaces the oldest one when the pool is full.
    #[must_use]
    pub const fn steals_when_full(self) -> bool {
        matches!(self, Self::Debris | Self::Smoke | Self::Sparkle)
    }
}

/// The state of an in-use ephemeral slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EphemeralParticle {
    /// The kind of particle.
    pub kind: EphemeralType,
    /// The simulation time at which the particle was created.
    pub start_time: f32,
    /// How long the particle lives, in seconds.
    pub max_lifetime: f32,
}

impl EphemeralParticle {
    /// Whether the particle has outlived its lifetime at `current_time`.
    #[must_use]
    pub fn is_expired(&self, current_time: f32) -> bool {
        current_time - self.start_time >= self.max_lifetime
    }
}

impl Points {
    /// Creates an air bubble.
    ///
    /// # Errors
    ///
    /// - If the pool is full. Bubbles never steal a slot.
    pub fn create_air_bubble(&mut self, position: Vec2, current_time: f32, plane: PlaneId) -> Result<ElementIndex, MeshError> {
        let air = self.materials.air();
        self.spawn_ephemeral(
            EphemeralType::AirBubble,
            position,
            Vec2::ZERO,
            air,
            current_time,
            consts::AIR_BUBBLE_LIFETIME,
            plane,
        )
    }

    /// Creates a piece of debris made of `material`.
    ///
    /// # Errors
    ///
    /// - If the pool has no slots at all.
    pub fn create_debris(
        &mut self,
        position: Vec2,
        velocity: Vec2,
        material: MaterialId,
        current_time: f32,
        plane: PlaneId,
    ) -> Result<ElementIndex, MeshError> {
        let lifetime = self.random_lifetime(consts::DEBRIS_LIFETIME);
        self.spawn_ephemeral(EphemeralType::Debris, position, velocity, material, current_time, lifetime, plane)
    }

    /// Creates a smoke puff.
    ///
    /// # Errors
    ///
    /// - If the pool has no slots at all.
    pub fn create_smoke(&mut self, position: Vec2, velocity: Vec2, current_time: f32, plane: PlaneId) -> Result<ElementIndex, MeshError> {
        let air = self.materials.air();
        let lifetime = self.random_lifetime(consts::SMOKE_LIFETIME);
        self.spawn_ephemeral(EphemeralType::Smoke, position, velocity, air, current_time, lifetime, plane)
    }

    /// Creates a spark.
    ///
    /// # Errors
    ///
    /// - If the pool has no slots at all.
    pub fn create_sparkle(
        &mut self,
        position: Vec2,
        velocity: Vec2,
        material: MaterialId,
        current_time: f32,
        plane: PlaneId,
    ) -> Result<ElementIndex, MeshError> {
        let lifetime = self.random_lifetime(consts::SPARKLE_LIFETIME);
        self.spawn_ephemeral(EphemeralType::Sparkle, position, velocity, material, current_time, lifetime, plane)
    }

    /// Creates a wake bubble.
    ///
    /// # Errors
    ///
    /// - If the pool is full. Bubbles never steal a slot.
    pub fn create_wake_bubble(
        &mut self,
        position: Vec2,
        velocity: Vec2,
        current_time: f32,
        plane: PlaneId,
    ) -> Result<ElementIndex, MeshError> {
        let air = self.materials.air();
        self.spawn_ephemeral(
            EphemeralType::WakeBubble,
            position,
            velocity,
            air,
            current_time,
            consts::WAKE_BUBBLE_LIFETIME,
            plane,
        )
    }

    /// Draws a lifetime uniformly from `[lo, hi)`.
    fn random_lifetime(&mut self, (lo, hi): (f32, f32)) -> f32 {
        self.rng.random_range(lo..hi)
    }

    /// Claims a slot and initializes it as a fresh, thawed particle.
    #[expect(clippy::too_many_arguments)]
    fn spawn_ephemeral(
        &mut self,
        kind: EphemeralType,
        position: Vec2,
        velocity: Vec2,
        material: MaterialId,
        current_time: f32,
        max_lifetime: f32,
        plane: PlaneId,
    ) -> Result<ElementIndex, MeshError> {
        let Some(point) = self.find_free_ephemeral_particle(current_time, kind.steals_when_full()) else {
            self.events.on_ephemeral_exhausted();
            return Err(MeshError::EphemeralPoolExhausted {
                capacity: self.ephemeral_capacity,
            });
        };

        let p = point as usize;
        let m = self.materials.get(material);
        self.is_deleted[p] = false;
        self.material[p] = material;
        self.is_rope[p] = false;
        self.is_hull[p] = m.is_hull;
        self.strength[p] = m.strength;
        self.position[p] = position;
        self.factory_position[p] = position;
        self.spring_force[p] = Vec2::ZERO;
        self.static_force[p] = Vec2::ZERO;
        self.mass_offset[p] = 0.0;
        self.augmented_material_mass[p] = m.mass;
        self.is_pinned[p] = false;
        self.water[p] = 0.0;
        self.stress[p] = 0.0;
        self.connected_component[p] = None;
        self.plane[p] = plane;
        self.refresh_total_mass(p);
        self.thaw(point);
        self.velocity[p] = velocity;
        self.ephemeral[p] = Some(EphemeralParticle {
            kind,
            start_time: current_time,
            max_lifetime,
        });

        Ok(point)
    }

    /// Finds a free ephemeral slot.
    ///
    /// The search is circular and starts right after the slot found last, so
    /// freed slots are handed out in rotation. When every slot is in use and
    /// `force` is set, the oldest particle is expired and its slot returned.
    ///
    /// # Returns
    ///
    /// * The index of the slot, or `None` if every slot is in use and `force` is not set.
    pub fn find_free_ephemeral_particle(&mut self, current_time: f32, force: bool) -> Option<ElementIndex> {
        let capacity = self.ephemeral_capacity;
        if capacity == 0 {
            return None;
        }

        let mut oldest: Option<(usize, f32)> = None;
        for offset in 0..capacity {
            let slot = (self.free_ephemeral_search_start + offset) % capacity;
            let p = self.ship_point_capacity + slot;
            match self.ephemeral[p] {
                None => {
                    self.free_ephemeral_search_start = (slot + 1) % capacity;
                    return Some(as_index(p));
                }
                Some(e) => {
                    let age = current_time - e.start_time;
                    if oldest.is_none_or(|(_, a)| age > a) {
                        oldest = Some((slot, age));
                    }
                }
            }
        }

        let (slot, _) = oldest.filter(|_| force)?;
        let point = as_index(self.ship_point_capacity + slot);
        ftlog::debug!("Ephemeral pool full; recycling slot {point}");
        self.expire_ephemeral_particle(point);
        self.free_ephemeral_search_start = (slot + 1) % capacity;
        Some(point)
    }

    /// Returns an ephemeral slot to the pool.
    pub fn expire_ephemeral_particle(&mut self, point: ElementIndex) {
        let p = point as usize;
        if self.ephemeral[p].take().is_some() {
            self.freeze(point);
            self.is_deleted[p] = true;
        }
    }

    /// Expires every ephemeral particle that outlived its lifetime.
    ///
    /// # Returns
    ///
    /// * The number of particles expired.
    pub fn update_ephemeral_particles(&mut self, current_time: f32) -> usize {
        let expired = self
            .ephemeral_points()
            .filter(|&p| self.ephemeral[p as usize].is_some_and(|e| e.is_expired(current_time)))
            .collect::<Vec<_>>();

        for &p in &expired {
            self.expire_ephemeral_particle(p);
        }
        expired.len()
    }

    /// The state of an ephemeral slot, or `None` if it is free or not ephemeral.
    #[must_use]
    pub fn ephemeral_particle(&self, point: ElementIndex) -> Option<EphemeralParticle> {
        self.ephemeral[point as usize]
    }

    /// The indices of the ephemeral slots.
    pub fn ephemeral_points(&self) -> impl Iterator<Item = ElementIndex> + use<> {
        (self.ship_point_capacity..self.ship_point_capacity + self.ephemeral_capacity).map(as_index)
    }

    /// The number of ephemeral slots in use.
    #[must_use]
    pub fn ephemeral_in_use(&self) -> usize {
        self.ephemeral[self.ship_point_capacity..].iter().filter(|e| e.is_some()).count()
    }

    /// The size of the ephemeral pool.
    #[must_use]
    pub const fn ephemeral_capacity(&self) -> usize {
        self.ephemeral_capacity
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Vec2;

    use crate::{MaterialDatabase, MeshError, NullEventSink, Points, SimulationParameters};

    fn pool(capacity: usize) -> Points {
        Points::new(
            0,
            capacity,
            Arc::new(MaterialDatabase::builtin()),
            &SimulationParameters::default(),
            Arc::new(NullEventSink),
            7,
        )
    }

    #[test]
    fn bubbles_fail_when_full() -> Result<(), String> {
        let mut points = pool(2);
        points.create_air_bubble(Vec2::ZERO, 0.0, 0).map_err(|e| e.to_string())?;
        points.create_air_bubble(Vec2::ZERO, 0.0, 0).map_err(|e| e.to_string())?;
        assert_eq!(
            points.create_air_bubble(Vec2::ZERO, 0.0, 0),
            Err(MeshError::EphemeralPoolExhausted { capacity: 2 })
        );
        Ok(())
    }

    #[test]
    fn debris_steals_oldest() -> Result<(), String> {
        let mut points = pool(2);
        let wood = MaterialDatabase::builtin().find("Wood").ok_or("Missing wood")?;
        let first = points.create_debris(Vec2::ZERO, Vec2::X, wood, 0.0, 0).map_err(|e| e.to_string())?;
        let second = points.create_debris(Vec2::ZERO, Vec2::X, wood, 0.1, 0).map_err(|e| e.to_string())?;
        assert_ne!(first, second);

        let third = points.create_debris(Vec2::ZERO, Vec2::X, wood, 0.2, 0).map_err(|e| e.to_string())?;
        assert_eq!(third, first, "The oldest slot should be recycled");
        assert_eq!(points.ephemeral_in_use(), 2);
        Ok(())
    }

    #[test]
    fn search_rotates_through_slots() -> Result<(), String> {
        let mut points = pool(3);
        let a = points.create_air_bubble(Vec2::ZERO, 0.0, 0).map_err(|e| e.to_string())?;
        points.expire_ephemeral_particle(a);
        let b = points.create_air_bubble(Vec2::ZERO, 0.0, 0).map_err(|e| e.to_string())?;
        assert_ne!(a, b, "A freed slot is not reused before the search wraps");
        Ok(())
    }

    #[test]
    fn expiry_frees_slots() -> Result<(), String> {
        let mut points = pool(4);
        let p = points.create_wake_bubble(Vec2::ZERO, Vec2::Y, 0.0, 0).map_err(|e| e.to_string())?;
        assert!(!points.is_deleted(p));
        assert_eq!(points.velocity(p), Vec2::Y);

        assert_eq!(points.update_ephemeral_particles(1.0), 0);
        assert_eq!(points.update_ephemeral_particles(2.0), 1);
        assert!(points.is_deleted(p));
        assert!(points.is_frozen(p));
        assert!(points.ephemeral_particle(p).is_none());
        Ok(())
    }
}
