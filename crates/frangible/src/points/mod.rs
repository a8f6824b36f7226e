//! The particle store.
//!
//! Particles live in parallel buffers addressed by stable indices. The first
//! part of the index space holds the body's structural particles; a reserved
//! tail holds the ephemeral particles used for transient effects.

mod ephemeral;

use std::sync::Arc;

use arrayvec::ArrayVec;
use glam::Vec2;
use rand::prelude::*;
use rayon::prelude::*;

use crate::{
    ConnectedComponentId, ElementIndex, EventSink, MaterialDatabase, MaterialId, MeshError, PlaneId, PointDefinition,
    SimulationParameters, StructuralMaterial, VisitTracker, as_index, consts,
};

pub use ephemeral::{EphemeralParticle, EphemeralType};

/// A callback invoked right before an element is marked deleted.
///
/// Neighboring elements may already be deleted when it runs, and it must not
/// destroy further elements of the same kind.
pub type DestroyHandler = Box<dyn FnMut(ElementIndex) + Send>;

/// A spring incident to a particle, with the particle at its other end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectedSpring {
    /// The index of the spring.
    pub spring: ElementIndex,
    /// The index of the other endpoint of the spring.
    pub other_endpoint: ElementIndex,
}

/// The springs incident to a particle.
type ConnectedSprings = ArrayVec<ConnectedSpring, { consts::MAX_SPRINGS_PER_POINT }>;

/// The triangles incident to a particle. Triangles owned by the particle come first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ConnectedTriangles {
    /// The triangle indices.
    triangles: ArrayVec<ElementIndex, { consts::MAX_TRIANGLES_PER_POINT }>,
    /// How many of the leading triangles are owned by the particle.
    owned: usize,
}

impl ConnectedTriangles {
    /// Adds a triangle, keeping owned triangles first.
    fn connect(&mut self, triangle: ElementIndex, is_owner: bool) -> bool {
        if self.triangles.is_full() {
            return false;
        }
        if is_owner {
            self.triangles.insert(self.owned, triangle);
            self.owned += 1;
        } else {
            self.triangles.push(triangle);
        }
        true
    }

    /// Removes a triangle, keeping owned triangles first.
    fn disconnect(&mut self, triangle: ElementIndex, is_owner: bool) -> bool {
        let range = if is_owner { 0..self.owned } else { self.owned..self.triangles.len() };
        match self.triangles[range.clone()].iter().position(|&t| t == triangle) {
            Some(i) => {
                self.triangles.remove(range.start + i);
                if is_owner {
                    self.owned -= 1;
                }
                true
            }
            None => false,
        }
    }
}

/// The particle store.
pub struct Points {
    /// The materials particles are made of.
    materials: Arc<MaterialDatabase>,
    /// The receiver of particle events.
    events: Arc<dyn EventSink>,
    /// The callback fired right before a particle is deleted.
    destroy_handler: Option<DestroyHandler>,
    /// The random source for seeds and lifetimes.
    rng: StdRng,

    /// The number of structural particle slots.
    ship_point_capacity: usize,
    /// The number of structural particles added so far.
    ship_point_count: usize,
    /// The number of ephemeral particle slots.
    ephemeral_capacity: usize,
    /// Where the next search for a free ephemeral slot starts, relative to the ephemeral range.
    free_ephemeral_search_start: usize,

    /// The duration of a mechanical sub-step the time coefficients were computed with.
    mechanical_step_duration: f32,
    /// The mass of a unit of water held by a particle.
    water_mass: f32,

    /// Whether each particle is deleted.
    is_deleted: Vec<bool>,
    /// Whether each particle lost a spring since it was last restored.
    is_damaged: Vec<bool>,
    /// The material of each particle.
    material: Vec<MaterialId>,
    /// Whether each particle is part of a rope.
    is_rope: Vec<bool>,
    /// The current positions.
    position: Vec<Vec2>,
    /// The positions at load time.
    factory_position: Vec<Vec2>,
    /// The current velocities.
    velocity: Vec<Vec2>,
    /// The forces accumulated from springs in the current sub-step.
    spring_force: Vec<Vec2>,
    /// The forces from the world and from tools, constant over a step.
    static_force: Vec<Vec2>,
    /// The sum of the masses attached to each particle.
    mass_offset: Vec<f32>,
    /// The material mass plus the attached mass offset.
    augmented_material_mass: Vec<f32>,
    /// The total mass, including water.
    mass: Vec<f32>,
    /// The squared sub-step duration times the frozen coefficient.
    integration_factor_time_coefficient: Vec<f32>,
    /// The time coefficient divided by the total mass; zero when frozen.
    integration_factor: Vec<f32>,
    /// One when free, zero when frozen.
    frozen_coefficient: Vec<f32>,
    /// Whether each particle is pinned by the user.
    is_pinned: Vec<bool>,
    /// The strength of each particle.
    strength: Vec<f32>,
    /// The amount of water held by each particle.
    water: Vec<f32>,
    /// Whether each particle is watertight.
    is_hull: Vec<bool>,
    /// Whether each particle is leaking.
    is_leaking: Vec<bool>,
    /// The electrical element living on each particle, if any.
    electrical_element: Vec<Option<ElementIndex>>,
    /// The largest signed strain ratio of the incident springs in the last step.
    stress: Vec<f32>,
    /// A uniform random value in `[0, 1)` drawn once per particle.
    random_seed: Vec<f32>,
    /// The springs currently incident to each particle.
    connected_springs: Vec<ConnectedSprings>,
    /// The springs incident to each particle at load time.
    factory_connected_springs: Vec<ConnectedSprings>,
    /// The triangles currently incident to each particle.
    connected_triangles: Vec<ConnectedTriangles>,
    /// The triangles incident to each particle at load time.
    factory_connected_triangles: Vec<ConnectedTriangles>,
    /// The connected component of each particle, as of the last connectivity visit.
    connected_component: Vec<Option<ConnectedComponentId>>,
    /// The depth layer of each particle.
    plane: Vec<PlaneId>,
    /// The last connectivity visit of each particle.
    visits: VisitTracker,
    /// The state of each ephemeral slot; always `None` for structural particles.
    ephemeral: Vec<Option<EphemeralParticle>>,

    /// The number of damaged particles.
    damaged_count: usize,
    /// The number of leaking particles.
    leaking_count: usize,
    /// The water spilled by destroyed particles.
    spilled_water: f32,
}

impl Points {
    /// Allocates a store for a body.
    ///
    /// All buffers are allocated up front; ephemeral slots start free.
    ///
    /// # Arguments
    ///
    /// - `ship_point_capacity`: The number of structural particles the body will add.
    /// - `ephemeral_capacity`: The size of the ephemeral pool.
    /// - `materials`: The materials particles are made of.
    /// - `params`: The parameters the integration factors are computed with.
    /// - `events`: The receiver of particle events.
    /// - `seed`: The seed of the random source.
    #[must_use]
    pub fn new(
        ship_point_capacity: usize,
        ephemeral_capacity: usize,
        materials: Arc<MaterialDatabase>,
        params: &SimulationParameters,
        events: Arc<dyn EventSink>,
        seed: u64,
    ) -> Self {
        let n = ship_point_capacity + ephemeral_capacity;
        let air = materials.air();
        let air_mass = materials.get(air).mass;

        let mut is_deleted = vec![false; n];
        is_deleted[ship_point_capacity..].fill(true);

        Self {
            materials,
            events,
            destroy_handler: None,
            rng: StdRng::seed_from_u64(seed),
            ship_point_capacity,
            ship_point_count: 0,
            ephemeral_capacity,
            free_ephemeral_search_start: 0,
            mechanical_step_duration: params.mechanical_step_duration(),
            water_mass: consts::WATER_MASS * params.water_density_adjustment,
            is_deleted,
            is_damaged: vec![false; n],
            material: vec![air; n],
            is_rope: vec![false; n],
            position: vec![Vec2::ZERO; n],
            factory_position: vec![Vec2::ZERO; n],
            velocity: vec![Vec2::ZERO; n],
            spring_force: vec![Vec2::ZERO; n],
            static_force: vec![Vec2::ZERO; n],
            mass_offset: vec![0.0; n],
            augmented_material_mass: vec![air_mass; n],
            mass: vec![air_mass; n],
            integration_factor_time_coefficient: vec![0.0; n],
            integration_factor: vec![0.0; n],
            frozen_coefficient: vec![0.0; n],
            is_pinned: vec![false; n],
            strength: vec![0.0; n],
            water: vec![0.0; n],
            is_hull: vec![false; n],
            is_leaking: vec![false; n],
            electrical_element: vec![None; n],
            stress: vec![0.0; n],
            random_seed: vec![0.0; n],
            connected_springs: vec![ConnectedSprings::new(); n],
            factory_connected_springs: vec![ConnectedSprings::new(); n],
            connected_triangles: vec![ConnectedTriangles::default(); n],
            factory_connected_triangles: vec![ConnectedTriangles::default(); n],
            connected_component: vec![None; n],
            plane: vec![0; n],
            visits: VisitTracker::new(n),
            ephemeral: vec![None; n],
            damaged_count: 0,
            leaking_count: 0,
            spilled_water: 0.0,
        }
    }

    /// Registers the callback fired right before a particle is deleted.
    ///
    /// Replaces any previously registered callback.
    pub fn register_destroy_handler(&mut self, handler: DestroyHandler) {
        self.destroy_handler = Some(handler);
    }

    /// Adds a structural particle in the next free slot.
    ///
    /// # Errors
    ///
    /// - If all structural slots are taken.
    pub fn add(&mut self, definition: &PointDefinition) -> Result<ElementIndex, MeshError> {
        if self.ship_point_count == self.ship_point_capacity {
            return Err(MeshError::CapacityExceeded {
                kind: "points",
                capacity: self.ship_point_capacity,
            });
        }

        let p = self.ship_point_count;
        self.ship_point_count += 1;

        let material = self.materials.get(definition.material);
        self.is_deleted[p] = false;
        self.material[p] = definition.material;
        self.is_rope[p] = definition.is_rope || material.is_rope();
        self.position[p] = definition.position;
        self.factory_position[p] = definition.position;
        self.mass_offset[p] = 0.0;
        self.augmented_material_mass[p] = material.mass;
        self.mass[p] = material.mass;
        self.strength[p] = definition.strength.unwrap_or(material.strength);
        self.is_hull[p] = definition.is_hull.unwrap_or(material.is_hull);
        self.electrical_element[p] = definition.electrical_element;
        self.plane[p] = definition.plane;
        self.random_seed[p] = self.rng.random();
        self.frozen_coefficient[p] = 1.0;
        self.integration_factor_time_coefficient[p] = self.time_coefficient(1.0);
        self.integration_factor[p] = self.integration_factor_time_coefficient[p] / self.mass[p];

        Ok(as_index(p))
    }

    /// Destroys a particle.
    ///
    /// The destroy callback fires first, then the particle is marked deleted,
    /// frozen, and its water is spilled. A leaking particle stops leaking.
    /// Springs and triangles must have been detached by the caller.
    pub fn destroy(&mut self, point: ElementIndex) {
        debug_assert!(!self.is_deleted(point), "Point {point} is already deleted");

        if let Some(handler) = self.destroy_handler.as_mut() {
            handler(point);
        }

        let p = point as usize;
        self.events.on_destroy(self.materials.get(self.material[p]), 1);

        self.is_deleted[p] = true;
        self.freeze(point);

        if self.is_leaking[p] {
            self.is_leaking[p] = false;
            self.leaking_count -= 1;
        }
        self.spilled_water += self.water[p];
        self.water[p] = 0.0;
        self.stress[p] = 0.0;
        self.connected_component[p] = None;
    }

    /// Marks a particle as damaged because one of its springs broke.
    ///
    /// A damaged particle that is not hull starts leaking.
    ///
    /// # Returns
    ///
    /// * `true` if the particle was not damaged before.
    pub fn damage(&mut self, point: ElementIndex) -> bool {
        let p = point as usize;
        if self.is_damaged[p] {
            return false;
        }

        self.is_damaged[p] = true;
        self.damaged_count += 1;

        if !self.is_hull[p] && !self.is_leaking[p] {
            self.is_leaking[p] = true;
            self.leaking_count += 1;
            self.events.on_leak(point);
        }

        true
    }

    /// Brings back a destroyed structural particle and clears its damage.
    ///
    /// # Returns
    ///
    /// * `true` if the particle was destroyed or damaged.
    pub fn restore(&mut self, point: ElementIndex) -> bool {
        let p = point as usize;
        let was_deleted = self.is_deleted[p] && p < self.ship_point_count;
        if was_deleted {
            self.is_deleted[p] = false;
            if !self.is_pinned[p] {
                self.thaw(point);
            }
        }

        if !self.is_damaged[p] {
            return was_deleted;
        }

        self.is_damaged[p] = false;
        self.damaged_count -= 1;
        if self.is_leaking[p] {
            self.is_leaking[p] = false;
            self.leaking_count -= 1;
        }

        true
    }

    /// Zeroes the integration factor and velocity of a particle so it stops moving.
    pub fn freeze(&mut self, point: ElementIndex) {
        let p = point as usize;
        self.frozen_coefficient[p] = 0.0;
        self.integration_factor_time_coefficient[p] = 0.0;
        self.integration_factor[p] = 0.0;
        self.velocity[p] = Vec2::ZERO;
    }

    /// Restores the integration factor of a frozen particle.
    pub fn thaw(&mut self, point: ElementIndex) {
        let p = point as usize;
        self.frozen_coefficient[p] = 1.0;
        self.integration_factor_time_coefficient[p] = self.time_coefficient(1.0);
        self.integration_factor[p] = self.integration_factor_time_coefficient[p] / self.mass[p];
    }

    /// Pins a particle in place.
    ///
    /// # Returns
    ///
    /// * `true` if the particle was not pinned before.
    pub fn pin(&mut self, point: ElementIndex) -> bool {
        if self.is_pinned[point as usize] {
            return false;
        }
        self.is_pinned[point as usize] = true;
        self.freeze(point);
        true
    }

    /// Releases a pinned particle.
    ///
    /// # Returns
    ///
    /// * `true` if the particle was pinned.
    pub fn unpin(&mut self, point: ElementIndex) -> bool {
        if !self.is_pinned[point as usize] {
            return false;
        }
        self.is_pinned[point as usize] = false;
        self.thaw(point);
        true
    }

    /// Attaches `delta` to the mass of a particle; a negative `delta` detaches it.
    ///
    /// Offsets accumulate, so several attachments on one particle add up. The
    /// augmented material mass is always recomputed from the material mass, and
    /// the total mass and integration factor are refreshed immediately. Springs
    /// incident to the particle must have their coefficients recomputed by the caller.
    pub fn add_mass_offset(&mut self, point: ElementIndex, delta: f32) {
        let p = point as usize;
        self.mass_offset[p] += delta;
        self.augmented_material_mass[p] = self.materials.get(self.material[p]).mass + self.mass_offset[p];
        self.refresh_total_mass(p);
    }

    /// The sum of the masses attached to a particle.
    #[must_use]
    pub fn mass_offset(&self, point: ElementIndex) -> f32 {
        self.mass_offset[point as usize]
    }

    /// Recomputes the total mass and integration factor of every particle.
    ///
    /// The total mass is the augmented material mass plus the mass of the water
    /// the particle holds, up to its buoyancy volume fill.
    pub fn update_total_masses(&mut self, params: &SimulationParameters) {
        self.water_mass = consts::WATER_MASS * params.water_density_adjustment;
        for p in 0..self.len() {
            self.refresh_total_mass(p);
        }
    }

    /// Recomputes the total mass and integration factor of one particle.
    fn refresh_total_mass(&mut self, p: usize) {
        let fill = self.materials.get(self.material[p]).buoyancy_volume_fill;
        self.mass[p] = self.water[p].min(fill).mul_add(self.water_mass, self.augmented_material_mass[p]);
        self.integration_factor[p] = self.integration_factor_time_coefficient[p] / self.mass[p];
    }

    /// Recomputes the integration time coefficients after the sub-step duration changes.
    pub fn update_for_parameters(&mut self, params: &SimulationParameters) {
        let dt = params.mechanical_step_duration();
        if dt.to_bits() == self.mechanical_step_duration.to_bits() {
            return;
        }

        self.mechanical_step_duration = dt;
        for p in 0..self.len() {
            self.integration_factor_time_coefficient[p] = self.time_coefficient(self.frozen_coefficient[p]);
            self.integration_factor[p] = self.integration_factor_time_coefficient[p] / self.mass[p];
        }
    }

    /// The integration time coefficient for a frozen coefficient.
    fn time_coefficient(&self, frozen_coefficient: f32) -> f32 {
        self.mechanical_step_duration * self.mechanical_step_duration * frozen_coefficient
    }

    /// Adds the weight of every live particle to its static force.
    ///
    /// Deleted particles lose any static force they were given.
    pub fn apply_world_forces(&mut self, apply_gravity: bool) {
        let gravity = if apply_gravity { consts::GRAVITY } else { Vec2::ZERO };
        self.static_force
            .par_iter_mut()
            .zip(self.mass.par_iter())
            .zip(self.is_deleted.par_iter())
            .for_each(|((f, &m), &deleted)| *f = if deleted { Vec2::ZERO } else { *f + gravity * m });
    }

    /// Clears the static forces at the end of a step.
    pub fn reset_static_forces(&mut self) {
        self.static_force.fill(Vec2::ZERO);
    }

    /// Integrates one mechanical sub-step and clears the spring forces.
    ///
    /// Each particle is independent, so the pass runs in parallel and produces
    /// the same result as a sequential pass.
    ///
    /// # Arguments
    ///
    /// - `dt`: The duration of the sub-step.
    /// - `damping`: The fraction of velocity kept, see [`SimulationParameters::global_damping_coefficient`].
    pub fn integrate_and_reset_spring_forces(&mut self, dt: f32, damping: f32) {
        let velocity_factor = damping / dt;
        self.position
            .par_iter_mut()
            .zip(self.velocity.par_iter_mut())
            .zip(self.spring_force.par_iter_mut())
            .zip(self.static_force.par_iter())
            .zip(self.integration_factor.par_iter())
            .for_each(|((((x, v), f), &sf), &k)| {
                let delta = *v * dt + (*f + sf) * k;
                *x += delta;
                *v = delta * velocity_factor;
                *f = Vec2::ZERO;
            });
    }

    /// Adds the incident spring to both the current and the load-time lists.
    ///
    /// # Errors
    ///
    /// - If the particle already has the maximum number of springs.
    pub fn add_factory_connected_spring(
        &mut self,
        point: ElementIndex,
        spring: ElementIndex,
        other_endpoint: ElementIndex,
    ) -> Result<(), MeshError> {
        let p = point as usize;
        let cs = ConnectedSpring { spring, other_endpoint };
        self.factory_connected_springs[p].try_push(cs).map_err(|_| MeshError::CapacityExceeded {
            kind: "springs per point",
            capacity: consts::MAX_SPRINGS_PER_POINT,
        })?;
        self.connected_springs[p].push(cs);
        Ok(())
    }

    /// Adds the incident triangle to both the current and the load-time lists.
    ///
    /// # Errors
    ///
    /// - If the particle already has the maximum number of triangles.
    pub fn add_factory_connected_triangle(&mut self, point: ElementIndex, triangle: ElementIndex, is_owner: bool) -> Result<(), MeshError> {
        let p = point as usize;
        if !self.factory_connected_triangles[p].connect(triangle, is_owner) {
            return Err(MeshError::CapacityExceeded {
                kind: "triangles per point",
                capacity: consts::MAX_TRIANGLES_PER_POINT,
            });
        }
        self.connected_triangles[p].connect(triangle, is_owner);
        Ok(())
    }

    /// Re-attaches a spring to one of its endpoints.
    pub fn connect_spring(&mut self, point: ElementIndex, spring: ElementIndex, other_endpoint: ElementIndex) {
        let springs = &mut self.connected_springs[point as usize];
        debug_assert!(springs.iter().all(|cs| cs.spring != spring), "Spring {spring} already connected to {point}");
        if springs.try_push(ConnectedSpring { spring, other_endpoint }).is_err() {
            ftlog::error!("Point {point} has no room for spring {spring}");
        }
    }

    /// Detaches a spring from one of its endpoints.
    ///
    /// # Returns
    ///
    /// * `true` if the spring was attached.
    pub fn disconnect_spring(&mut self, point: ElementIndex, spring: ElementIndex) -> bool {
        let springs = &mut self.connected_springs[point as usize];
        springs
            .iter()
            .position(|cs| cs.spring == spring)
            .map(|i| springs.remove(i))
            .is_some()
    }

    /// Re-attaches a triangle to one of its endpoints.
    pub fn connect_triangle(&mut self, point: ElementIndex, triangle: ElementIndex, is_owner: bool) {
        if !self.connected_triangles[point as usize].connect(triangle, is_owner) {
            ftlog::error!("Point {point} has no room for triangle {triangle}");
        }
    }

    /// Detaches a triangle from one of its endpoints.
    ///
    /// # Returns
    ///
    /// * `true` if the triangle was attached.
    pub fn disconnect_triangle(&mut self, point: ElementIndex, triangle: ElementIndex, is_owner: bool) -> bool {
        self.connected_triangles[point as usize].disconnect(triangle, is_owner)
    }

    /// Whether the particle has every spring and triangle it had at load time.
    #[must_use]
    pub fn has_all_factory_connections(&self, point: ElementIndex) -> bool {
        let p = point as usize;
        self.connected_springs[p].len() == self.factory_connected_springs[p].len()
            && self.connected_triangles[p].triangles.len() == self.factory_connected_triangles[p].triangles.len()
    }

    /// Sets the water held by a particle.
    pub fn set_water(&mut self, point: ElementIndex, water: f32) {
        self.water[point as usize] = water.max(0.0);
    }

    /// Sets the position of a particle.
    pub fn set_position(&mut self, point: ElementIndex, position: Vec2) {
        self.position[point as usize] = position;
    }

    /// Sets the velocity of a particle. Frozen particles keep a zero velocity.
    pub fn set_velocity(&mut self, point: ElementIndex, velocity: Vec2) {
        let p = point as usize;
        self.velocity[p] = velocity * self.frozen_coefficient[p];
    }

    /// Adds to the static force of a particle for the next step.
    pub fn add_static_force(&mut self, point: ElementIndex, force: Vec2) {
        self.static_force[point as usize] += force;
    }

    /// Records the strain ratio of an incident spring if it is the largest seen.
    pub fn record_stress(&mut self, point: ElementIndex, stress: f32) {
        let s = &mut self.stress[point as usize];
        if stress.abs() > s.abs() {
            *s = stress;
        }
    }

    /// Clears the recorded stress of every particle.
    pub fn reset_stress(&mut self) {
        self.stress.fill(0.0);
    }

    /// Sets the connected component of a particle.
    pub fn set_connected_component(&mut self, point: ElementIndex, component: Option<ConnectedComponentId>) {
        self.connected_component[point as usize] = component;
    }

    /// The tracker of connectivity visits.
    pub const fn visits_mut(&mut self) -> &mut VisitTracker {
        &mut self.visits
    }

    /// The spring forces, for accumulation by the spring store.
    pub fn spring_forces_mut(&mut self) -> &mut [Vec2] {
        &mut self.spring_force
    }

    /// The materials particles are made of.
    #[must_use]
    pub fn materials(&self) -> &MaterialDatabase {
        &self.materials
    }

    /// The receiver of events.
    #[must_use]
    pub fn events(&self) -> &Arc<dyn EventSink> {
        &self.events
    }

    /// The number of slots, structural and ephemeral.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.ship_point_capacity + self.ephemeral_capacity
    }

    /// Whether the store has no slots.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of structural particles added.
    #[must_use]
    pub const fn ship_point_count(&self) -> usize {
        self.ship_point_count
    }

    /// The indices of the structural particles.
    pub fn ship_points(&self) -> impl DoubleEndedIterator<Item = ElementIndex> + use<> {
        (0..self.ship_point_count).map(as_index)
    }

    /// Whether the particle is deleted.
    #[must_use]
    pub fn is_deleted(&self, point: ElementIndex) -> bool {
        self.is_deleted[point as usize]
    }

    /// Whether the particle is damaged.
    #[must_use]
    pub fn is_damaged(&self, point: ElementIndex) -> bool {
        self.is_damaged[point as usize]
    }

    /// The material id of the particle.
    #[must_use]
    pub fn material_id(&self, point: ElementIndex) -> MaterialId {
        self.material[point as usize]
    }

    /// The material of the particle.
    #[must_use]
    pub fn material(&self, point: ElementIndex) -> &StructuralMaterial {
        self.materials.get(self.material[point as usize])
    }

    /// Whether the particle is part of a rope.
    #[must_use]
    pub fn is_rope(&self, point: ElementIndex) -> bool {
        self.is_rope[point as usize]
    }

    /// The current position of the particle.
    #[must_use]
    pub fn position(&self, point: ElementIndex) -> Vec2 {
        self.position[point as usize]
    }

    /// All current positions.
    #[must_use]
    pub fn positions(&self) -> &[Vec2] {
        &self.position
    }

    /// All current velocities.
    #[must_use]
    pub fn velocities(&self) -> &[Vec2] {
        &self.velocity
    }

    /// The position of the particle at load time.
    #[must_use]
    pub fn factory_position(&self, point: ElementIndex) -> Vec2 {
        self.factory_position[point as usize]
    }

    /// The current velocity of the particle.
    #[must_use]
    pub fn velocity(&self, point: ElementIndex) -> Vec2 {
        self.velocity[point as usize]
    }

    /// The spring force accumulated on the particle in the current sub-step.
    #[must_use]
    pub fn spring_force(&self, point: ElementIndex) -> Vec2 {
        self.spring_force[point as usize]
    }

    /// The static force on the particle.
    #[must_use]
    pub fn static_force(&self, point: ElementIndex) -> Vec2 {
        self.static_force[point as usize]
    }

    /// The material mass plus any attached mass offset.
    #[must_use]
    pub fn augmented_material_mass(&self, point: ElementIndex) -> f32 {
        self.augmented_material_mass[point as usize]
    }

    /// The total mass of the particle.
    #[must_use]
    pub fn mass(&self, point: ElementIndex) -> f32 {
        self.mass[point as usize]
    }

    /// The integration factor of the particle; zero when frozen.
    #[must_use]
    pub fn integration_factor(&self, point: ElementIndex) -> f32 {
        self.integration_factor[point as usize]
    }

    /// Whether the particle is frozen.
    #[must_use]
    pub fn is_frozen(&self, point: ElementIndex) -> bool {
        self.frozen_coefficient[point as usize] == 0.0
    }

    /// Whether the particle is pinned.
    #[must_use]
    pub fn is_pinned(&self, point: ElementIndex) -> bool {
        self.is_pinned[point as usize]
    }

    /// The strength of the particle.
    #[must_use]
    pub fn strength(&self, point: ElementIndex) -> f32 {
        self.strength[point as usize]
    }

    /// The water held by the particle.
    #[must_use]
    pub fn water(&self, point: ElementIndex) -> f32 {
        self.water[point as usize]
    }

    /// Whether the particle is watertight.
    #[must_use]
    pub fn is_hull(&self, point: ElementIndex) -> bool {
        self.is_hull[point as usize]
    }

    /// Whether the particle is leaking.
    #[must_use]
    pub fn is_leaking(&self, point: ElementIndex) -> bool {
        self.is_leaking[point as usize]
    }

    /// The electrical element living on the particle, if any.
    #[must_use]
    pub fn electrical_element(&self, point: ElementIndex) -> Option<ElementIndex> {
        self.electrical_element[point as usize]
    }

    /// The largest strain ratio among the particle's springs in the last step.
    #[must_use]
    pub fn stress(&self, point: ElementIndex) -> f32 {
        self.stress[point as usize]
    }

    /// The random seed of the particle, in `[0, 1)`.
    #[must_use]
    pub fn random_seed(&self, point: ElementIndex) -> f32 {
        self.random_seed[point as usize]
    }

    /// The springs incident to the particle.
    #[must_use]
    pub fn connected_springs(&self, point: ElementIndex) -> &[ConnectedSpring] {
        &self.connected_springs[point as usize]
    }

    /// The springs incident to the particle at load time.
    #[must_use]
    pub fn factory_connected_springs(&self, point: ElementIndex) -> &[ConnectedSpring] {
        &self.factory_connected_springs[point as usize]
    }

    /// The triangles incident to the particle, owned triangles first.
    #[must_use]
    pub fn connected_triangles(&self, point: ElementIndex) -> &[ElementIndex] {
        &self.connected_triangles[point as usize].triangles
    }

    /// The triangles incident to the particle at load time.
    #[must_use]
    pub fn factory_connected_triangles(&self, point: ElementIndex) -> &[ElementIndex] {
        &self.factory_connected_triangles[point as usize].triangles
    }

    /// The connected component of the particle.
    #[must_use]
    pub fn connected_component(&self, point: ElementIndex) -> Option<ConnectedComponentId> {
        self.connected_component[point as usize]
    }

    /// The depth layer of the particle.
    #[must_use]
    pub fn plane(&self, point: ElementIndex) -> PlaneId {
        self.plane[point as usize]
    }

    /// The number of damaged particles.
    #[must_use]
    pub const fn damaged_count(&self) -> usize {
        self.damaged_count
    }

    /// The number of leaking particles.
    #[must_use]
    pub const fn leaking_count(&self) -> usize {
        self.leaking_count
    }

    /// The water spilled by destroyed particles.
    #[must_use]
    pub const fn spilled_water(&self) -> f32 {
        self.spilled_water
    }
}
