//! The spring store.
//!
//! A spring joins two particles. Its elastic coefficients are derived from the
//! masses of its endpoints and the simulation parameters; its breaking
//! elongation from the strength of its endpoints. Springs break when stretched
//! or compressed beyond that elongation.

use arrayvec::ArrayVec;
use glam::Vec2;
use rayon::prelude::*;

use crate::{DestroyHandler, ElementIndex, MaterialId, MeshError, Points, SimulationParameters, as_index, consts};

/// The triangles having a spring as an edge.
pub(crate) type SuperTriangles = ArrayVec<ElementIndex, { consts::MAX_SUPER_TRIANGLES_PER_SPRING }>;

/// How a spring destruction cascades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DestroyOptions {
    /// Whether to report the destruction as a break.
    pub fire_break_event: bool,
    /// Whether to destroy every triangle of both endpoints instead of only
    /// the triangles having the spring as an edge.
    pub destroy_all_triangles: bool,
}

/// The spring store.
pub struct Springs {
    /// The callback fired right before a spring is deleted.
    destroy_handler: Option<DestroyHandler>,
    /// The parameters the coefficients were last computed with.
    current_parameters: Option<SimulationParameters>,
    /// Whether some stiffness coefficient is still growing towards its target.
    is_converging: bool,

    /// Whether each spring is deleted.
    is_deleted: Vec<bool>,
    /// The two endpoints of each spring.
    endpoints: Vec<[ElementIndex; 2]>,
    /// The triangles having each spring as an edge at load time.
    factory_super_triangles: Vec<SuperTriangles>,
    /// The live triangles having each spring as an edge.
    super_triangles: Vec<SuperTriangles>,
    /// The number of live triangles covering each spring as a traverse.
    covering_triangles_count: Vec<u32>,
    /// The average strength of the endpoints.
    strength: Vec<f32>,
    /// The average material stiffness of the endpoints.
    material_stiffness: Vec<f32>,
    /// The length at load time.
    rest_length: Vec<f32>,
    /// The weaker of the endpoints' materials.
    base_material: Vec<MaterialId>,
    /// Whether both endpoints are rope.
    is_rope: Vec<bool>,
    /// Zero if either endpoint is hull, one otherwise.
    water_permeability: Vec<f32>,
    /// The randomized fraction of the breaking elongation above which the spring is stressed.
    strain_threshold_fraction: Vec<f32>,
    /// Whether each spring is stressed.
    is_stressed: Vec<bool>,
    /// Whether a bomb is attached to each spring.
    is_bomb_attached: Vec<bool>,
    /// The elongation beyond which each spring breaks.
    breaking_elongation: Vec<f32>,
    /// The stiffness coefficient.
    stiffness_coefficient: Vec<f32>,
    /// The damping coefficient.
    damping_coefficient: Vec<f32>,
}

impl Springs {
    /// Creates an empty store with room for `capacity` springs.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            destroy_handler: None,
            current_parameters: None,
            is_converging: false,
            is_deleted: Vec::with_capacity(capacity),
            endpoints: Vec::with_capacity(capacity),
            factory_super_triangles: Vec::with_capacity(capacity),
            super_triangles: Vec::with_capacity(capacity),
            covering_triangles_count: Vec::with_capacity(capacity),
            strength: Vec::with_capacity(capacity),
            material_stiffness: Vec::with_capacity(capacity),
            rest_length: Vec::with_capacity(capacity),
            base_material: Vec::with_capacity(capacity),
            is_rope: Vec::with_capacity(capacity),
            water_permeability: Vec::with_capacity(capacity),
            strain_threshold_fraction: Vec::with_capacity(capacity),
            is_stressed: Vec::with_capacity(capacity),
            is_bomb_attached: Vec::with_capacity(capacity),
            breaking_elongation: Vec::with_capacity(capacity),
            stiffness_coefficient: Vec::with_capacity(capacity),
            damping_coefficient: Vec::with_capacity(capacity),
        }
    }

    /// Registers the callback fired right before a spring is deleted.
    pub fn register_destroy_handler(&mut self, handler: DestroyHandler) {
        self.destroy_handler = Some(handler);
    }

    /// Adds a spring between two particles.
    ///
    /// The rest length is the current distance between the endpoints. The
    /// spring is not connected to its endpoints; the caller does that.
    ///
    /// # Arguments
    ///
    /// - `point_a`, `point_b`: The endpoints.
    /// - `super_triangles`: The triangles having the spring as an edge.
    /// - `covering_triangles_count`: The number of triangles covering the spring as a traverse.
    /// - `points`: The particle store.
    /// - `params`: The parameters to compute the coefficients with.
    ///
    /// # Returns
    ///
    /// * The index of the new spring.
    pub fn add(
        &mut self,
        point_a: ElementIndex,
        point_b: ElementIndex,
        super_triangles: SuperTriangles,
        covering_triangles_count: u32,
        points: &Points,
        params: &SimulationParameters,
    ) -> ElementIndex {
        let s = as_index(self.len());
        let (material_a, material_b) = (points.material(point_a), points.material(point_b));

        let base_material = if material_a.strength <= material_b.strength {
            points.material_id(point_a)
        } else {
            points.material_id(point_b)
        };
        let threshold = (material_a.strain_threshold_fraction + material_b.strain_threshold_fraction) / 2.0;
        let jitter = consts::STRAIN_THRESHOLD_RANDOM_WIDTH.mul_add(points.random_seed(point_a), 1.0 - consts::STRAIN_THRESHOLD_RANDOM_WIDTH / 2.0);

        self.is_deleted.push(false);
        self.endpoints.push([point_a, point_b]);
        self.factory_super_triangles.push(super_triangles.clone());
        self.super_triangles.push(super_triangles);
        self.covering_triangles_count.push(covering_triangles_count);
        self.strength.push((points.strength(point_a) + points.strength(point_b)) / 2.0);
        self.material_stiffness.push((material_a.stiffness + material_b.stiffness) / 2.0);
        self.rest_length.push(points.position(point_a).distance(points.position(point_b)));
        self.base_material.push(base_material);
        self.is_rope.push(points.is_rope(point_a) && points.is_rope(point_b));
        self.water_permeability.push(if points.is_hull(point_a) || points.is_hull(point_b) { 0.0 } else { 1.0 });
        self.strain_threshold_fraction.push(threshold * jitter);
        self.is_stressed.push(false);
        self.is_bomb_attached.push(false);
        self.breaking_elongation.push(0.0);
        self.stiffness_coefficient.push(f32::MAX);
        self.damping_coefficient.push(0.0);

        self.calculate_coefficients(s, points, params);
        s
    }

    /// Marks a spring deleted after the caller has detached it from its
    /// endpoints and triangles.
    ///
    /// The destroy callback fires first. The coefficients are zeroed so the
    /// spring exerts no force.
    pub fn destroy(&mut self, spring: ElementIndex, fire_break_event: bool, points: &Points) {
        debug_assert!(!self.is_deleted(spring), "Spring {spring} is already deleted");

        if let Some(handler) = self.destroy_handler.as_mut() {
            handler(spring);
        }

        let s = spring as usize;
        if fire_break_event {
            points.events().on_break(points.materials().get(self.base_material[s]), 1);
        }

        self.stiffness_coefficient[s] = 0.0;
        self.damping_coefficient[s] = 0.0;
        self.is_stressed[s] = false;
        self.is_deleted[s] = true;
    }

    /// Brings back a deleted spring and reconnects it to its endpoints.
    ///
    /// Its triangles are not restored; they add themselves back as they come back.
    ///
    /// # Errors
    ///
    /// - If the spring is not deleted.
    pub fn restore(&mut self, spring: ElementIndex, points: &mut Points, params: &SimulationParameters) -> Result<(), MeshError> {
        if !self.is_deleted(spring) {
            return Err(MeshError::NotDeleted { kind: "spring", index: spring });
        }

        let s = spring as usize;
        self.is_deleted[s] = false;
        self.stiffness_coefficient[s] = f32::MAX;
        self.calculate_coefficients(spring, points, params);

        let [a, b] = self.endpoints[s];
        points.connect_spring(a, spring, b);
        points.connect_spring(b, spring, a);

        points.events().on_spring_repaired(points.materials().get(self.base_material[s]), 1);
        Ok(())
    }

    /// Recomputes the coefficients of every live spring if the parameters
    /// changed or some stiffness is still converging.
    pub fn update_for_parameters(&mut self, points: &Points, params: &SimulationParameters) {
        if self.current_parameters.as_ref() == Some(params) && !self.is_converging {
            return;
        }

        self.is_converging = false;
        for s in (0..self.len()).map(as_index) {
            if !self.is_deleted(s) {
                self.calculate_coefficients(s, points, params);
            }
        }
        self.current_parameters = Some(*params);
    }

    /// Recomputes the coefficients of a spring.
    ///
    /// The stiffness drops to a lower target at once, but grows towards a
    /// higher one gradually, so that sudden mass changes do not inject energy.
    pub fn calculate_coefficients(&mut self, spring: ElementIndex, points: &Points, params: &SimulationParameters) {
        let s = spring as usize;
        let [a, b] = self.endpoints[s];
        let (mass_a, mass_b) = (points.augmented_material_mass(a), points.augmented_material_mass(b));
        let mass_factor = (mass_a * mass_b) / (mass_a + mass_b);
        let dt = params.mechanical_step_duration();

        let desired_stiffness = consts::SPRING_REDUCTION_FRACTION
            * self.material_stiffness[s]
            * params.spring_stiffness_adjustment
            * mass_factor
            / (dt * dt);
        let current = self.stiffness_coefficient[s];
        if desired_stiffness < current {
            self.stiffness_coefficient[s] = desired_stiffness;
        } else {
            let next = consts::SPRING_STIFFNESS_CONVERGENCE_RATE.mul_add(desired_stiffness - current, current);
            self.stiffness_coefficient[s] = next;
            if desired_stiffness - next > desired_stiffness * f32::EPSILON {
                self.is_converging = true;
            }
        }

        self.damping_coefficient[s] = consts::SPRING_DAMPING_COEFFICIENT * params.spring_damping_adjustment * mass_factor / dt;

        self.breaking_elongation[s] = self.strength[s]
            * params.spring_strength_adjustment
            * consts::SPRING_STRENGTH_CALIBRATION
            * params.strength_iterations_adjustment()
            * self.rest_length[s];
    }

    /// Accumulates the force of every spring onto its endpoints.
    ///
    /// The per-spring forces are computed in parallel and then added in index
    /// order, so the result does not depend on the thread count.
    pub fn apply_spring_forces(&self, points: &mut Points) {
        let (positions, velocities) = (points.positions(), points.velocities());
        let (endpoints, rest_length, stiffness, damping_coefficient) = (
            &self.endpoints,
            &self.rest_length,
            &self.stiffness_coefficient,
            &self.damping_coefficient,
        );
        let forces = (0..self.len())
            .into_par_iter()
            .map(|s| {
                let [a, b] = endpoints[s];
                let (a, b) = (a as usize, b as usize);
                let displacement = positions[b] - positions[a];
                let length = displacement.length();
                let direction = displacement.normalize_or_zero();

                let spring = (length - rest_length[s]) * stiffness[s];
                let damping = (velocities[b] - velocities[a]).dot(direction) * damping_coefficient[s];
                direction * (spring + damping)
            })
            .collect::<Vec<_>>();

        let spring_forces = points.spring_forces_mut();
        for (force, &[a, b]) in forces.into_iter().zip(self.endpoints.iter()) {
            spring_forces[a as usize] += force;
            spring_forces[b as usize] -= force;
        }
    }

    /// Updates the stress state of every live spring and records the strain
    /// ratio on its endpoints.
    ///
    /// # Returns
    ///
    /// * The springs stretched or compressed beyond their breaking elongation,
    ///   in index order. The caller destroys them.
    pub fn update_strains(&mut self, points: &mut Points) -> Vec<ElementIndex> {
        let mut broken = Vec::new();
        for spring in (0..self.len()).map(as_index) {
            let s = spring as usize;
            if self.is_deleted[s] {
                continue;
            }

            let [a, b] = self.endpoints[s];
            let strain = points.position(a).distance(points.position(b)) - self.rest_length[s];
            let breaking = self.breaking_elongation[s];

            if strain.abs() > breaking {
                broken.push(spring);
                continue;
            }

            if self.is_stressed[s] {
                if strain.abs() < consts::STRAIN_LOW_WATERMARK * breaking {
                    self.is_stressed[s] = false;
                }
            } else if strain.abs() > self.strain_threshold_fraction[s] * breaking {
                self.is_stressed[s] = true;
                points.events().on_stress(points.materials().get(self.base_material[s]), 1);
            }

            let ratio = if breaking > 0.0 { strain / breaking } else { 0.0 };
            points.record_stress(a, ratio);
            points.record_stress(b, ratio);
        }
        broken
    }

    /// Marks a bomb attached to a spring.
    ///
    /// # Returns
    ///
    /// * `true` if no bomb was attached.
    pub fn set_bomb_attached(&mut self, spring: ElementIndex, attached: bool) -> bool {
        let flag = &mut self.is_bomb_attached[spring as usize];
        let changed = *flag != attached;
        *flag = attached;
        changed
    }

    /// Adds a live triangle having the spring as an edge.
    pub fn add_super_triangle(&mut self, spring: ElementIndex, triangle: ElementIndex) {
        let triangles = &mut self.super_triangles[spring as usize];
        debug_assert!(!triangles.contains(&triangle), "Triangle {triangle} already on spring {spring}");
        if triangles.try_push(triangle).is_err() {
            ftlog::error!("Spring {spring} has no room for triangle {triangle}");
        }
    }

    /// Removes a triangle having the spring as an edge.
    ///
    /// # Returns
    ///
    /// * `true` if the triangle was listed.
    pub fn remove_super_triangle(&mut self, spring: ElementIndex, triangle: ElementIndex) -> bool {
        let triangles = &mut self.super_triangles[spring as usize];
        triangles
            .iter()
            .position(|&t| t == triangle)
            .map(|i| triangles.remove(i))
            .is_some()
    }

    /// Records one more triangle covering the spring as a traverse.
    pub fn add_covering_triangle(&mut self, spring: ElementIndex) {
        self.covering_triangles_count[spring as usize] += 1;
    }

    /// Records one less triangle covering the spring as a traverse.
    pub fn remove_covering_triangle(&mut self, spring: ElementIndex) {
        let count = &mut self.covering_triangles_count[spring as usize];
        debug_assert!(*count > 0, "Spring {spring} has no covering triangles");
        *count = count.saturating_sub(1);
    }

    /// The number of springs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Whether the store has no springs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Whether the spring is deleted.
    #[must_use]
    pub fn is_deleted(&self, spring: ElementIndex) -> bool {
        self.is_deleted[spring as usize]
    }

    /// Both endpoints of the spring.
    #[must_use]
    pub fn endpoints(&self, spring: ElementIndex) -> [ElementIndex; 2] {
        self.endpoints[spring as usize]
    }

    /// The endpoint of the spring that is not `point`.
    #[must_use]
    pub fn other_endpoint(&self, spring: ElementIndex, point: ElementIndex) -> ElementIndex {
        let [a, b] = self.endpoints[spring as usize];
        if a == point { b } else { a }
    }

    /// The live triangles having the spring as an edge.
    #[must_use]
    pub fn super_triangles(&self, spring: ElementIndex) -> &[ElementIndex] {
        &self.super_triangles[spring as usize]
    }

    /// The triangles having the spring as an edge at load time.
    #[must_use]
    pub fn factory_super_triangles(&self, spring: ElementIndex) -> &[ElementIndex] {
        &self.factory_super_triangles[spring as usize]
    }

    /// The number of live triangles covering the spring as a traverse.
    #[must_use]
    pub fn covering_triangles_count(&self, spring: ElementIndex) -> u32 {
        self.covering_triangles_count[spring as usize]
    }

    /// The current length of the spring.
    #[must_use]
    pub fn length(&self, spring: ElementIndex, points: &Points) -> f32 {
        let [a, b] = self.endpoints[spring as usize];
        points.position(a).distance(points.position(b))
    }

    /// The direction from the first to the second endpoint.
    #[must_use]
    pub fn direction(&self, spring: ElementIndex, points: &Points) -> Vec2 {
        let [a, b] = self.endpoints[spring as usize];
        (points.position(b) - points.position(a)).normalize_or_zero()
    }

    /// The midpoint of the spring.
    #[must_use]
    pub fn midpoint(&self, spring: ElementIndex, points: &Points) -> Vec2 {
        let [a, b] = self.endpoints[spring as usize];
        (points.position(a) + points.position(b)) * 0.5
    }

    /// The rest length of the spring.
    #[must_use]
    pub fn rest_length(&self, spring: ElementIndex) -> f32 {
        self.rest_length[spring as usize]
    }

    /// The strength of the spring.
    #[must_use]
    pub fn strength(&self, spring: ElementIndex) -> f32 {
        self.strength[spring as usize]
    }

    /// The elongation beyond which the spring breaks.
    #[must_use]
    pub fn breaking_elongation(&self, spring: ElementIndex) -> f32 {
        self.breaking_elongation[spring as usize]
    }

    /// The stiffness coefficient of the spring.
    #[must_use]
    pub fn stiffness_coefficient(&self, spring: ElementIndex) -> f32 {
        self.stiffness_coefficient[spring as usize]
    }

    /// The damping coefficient of the spring.
    #[must_use]
    pub fn damping_coefficient(&self, spring: ElementIndex) -> f32 {
        self.damping_coefficient[spring as usize]
    }

    /// The weaker of the endpoints' materials.
    #[must_use]
    pub fn base_material(&self, spring: ElementIndex) -> MaterialId {
        self.base_material[spring as usize]
    }

    /// Whether both endpoints are rope.
    #[must_use]
    pub fn is_rope(&self, spring: ElementIndex) -> bool {
        self.is_rope[spring as usize]
    }

    /// Whether water may pass through the spring.
    #[must_use]
    pub fn water_permeability(&self, spring: ElementIndex) -> f32 {
        self.water_permeability[spring as usize]
    }

    /// The randomized fraction of the breaking elongation above which the spring is stressed.
    #[must_use]
    pub fn strain_threshold_fraction(&self, spring: ElementIndex) -> f32 {
        self.strain_threshold_fraction[spring as usize]
    }

    /// Whether the spring is stressed.
    #[must_use]
    pub fn is_stressed(&self, spring: ElementIndex) -> bool {
        self.is_stressed[spring as usize]
    }

    /// Whether a bomb is attached to the spring.
    #[must_use]
    pub fn is_bomb_attached(&self, spring: ElementIndex) -> bool {
        self.is_bomb_attached[spring as usize]
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use float_cmp::approx_eq;
    use glam::Vec2;

    use crate::{MaterialDatabase, NullEventSink, PointDefinition, Points, SimulationParameters, consts};

    use super::{SuperTriangles, Springs};

    fn pair(distance: f32) -> Result<(Points, Springs, SimulationParameters), String> {
        let db = MaterialDatabase::builtin();
        let wood = db.find("Wood").ok_or("Missing wood")?;
        let params = SimulationParameters::default();
        let mut points = Points::new(2, 0, Arc::new(db), &params, Arc::new(NullEventSink), 1);
        let a = points.add(&PointDefinition::new(Vec2::ZERO, wood)).map_err(|e| e.to_string())?;
        let b = points.add(&PointDefinition::new(Vec2::new(distance, 0.0), wood)).map_err(|e| e.to_string())?;

        let mut springs = Springs::with_capacity(1);
        let s = springs.add(a, b, SuperTriangles::new(), 0, &points, &params);
        points.add_factory_connected_spring(a, s, b).map_err(|e| e.to_string())?;
        points.add_factory_connected_spring(b, s, a).map_err(|e| e.to_string())?;
        Ok((points, springs, params))
    }

    #[test]
    fn add_derives_properties() -> Result<(), String> {
        let (_, springs, params) = pair(2.0)?;
        assert!(approx_eq!(f32, springs.rest_length(0), 2.0));
        assert!(approx_eq!(f32, springs.strength(0), 0.05));
        assert!(approx_eq!(f32, springs.water_permeability(0), 1.0));

        let expected = 0.05 * consts::SPRING_STRENGTH_CALIBRATION * params.strength_iterations_adjustment() * 2.0;
        assert!(approx_eq!(f32, springs.breaking_elongation(0), expected, ulps = 4));

        let fraction = springs.strain_threshold_fraction(0);
        assert!((0.6 * 0.65..=0.6 * 1.35).contains(&fraction), "Threshold out of range: {fraction}");
        Ok(())
    }

    #[test]
    fn stretched_spring_pulls_endpoints_together() -> Result<(), String> {
        let (mut points, springs, _) = pair(1.0)?;
        points.set_position(1, Vec2::new(1.1, 0.0));
        springs.apply_spring_forces(&mut points);
        assert!(points.spring_force(0).x > 0.0);
        assert!(approx_eq!(f32, points.spring_force(0).x, -points.spring_force(1).x));
        Ok(())
    }

    #[test]
    fn break_threshold() -> Result<(), String> {
        let (mut points, mut springs, _) = pair(1.0)?;
        let elongation = springs.breaking_elongation(0);

        points.set_position(1, Vec2::new(elongation.mul_add(0.999, 1.0), 0.0));
        assert!(springs.update_strains(&mut points).is_empty(), "Just below the threshold should hold");

        points.set_position(1, Vec2::new(elongation.mul_add(1.001, 1.0), 0.0));
        assert_eq!(springs.update_strains(&mut points), vec![0]);
        Ok(())
    }

    #[test]
    fn stress_hysteresis() -> Result<(), String> {
        let (mut points, mut springs, _) = pair(1.0)?;
        let elongation = springs.breaking_elongation(0);

        points.set_position(1, Vec2::new(elongation.mul_add(0.95, 1.0), 0.0));
        springs.update_strains(&mut points);
        assert!(springs.is_stressed(0));
        assert!(points.stress(0) > 0.9);

        points.set_position(1, Vec2::new(elongation.mul_add(0.3, 1.0), 0.0));
        springs.update_strains(&mut points);
        assert!(springs.is_stressed(0), "Stress is only released below the low watermark");

        points.set_position(1, Vec2::new(elongation.mul_add(0.01, 1.0), 0.0));
        springs.update_strains(&mut points);
        assert!(!springs.is_stressed(0));
        Ok(())
    }

    #[test]
    fn destroy_and_restore() -> Result<(), String> {
        let (mut points, mut springs, params) = pair(1.0)?;
        let stiffness = springs.stiffness_coefficient(0);

        points.disconnect_spring(0, 0);
        points.disconnect_spring(1, 0);
        springs.destroy(0, true, &points);
        assert!(springs.is_deleted(0));
        assert!(approx_eq!(f32, springs.stiffness_coefficient(0), 0.0));
        assert!(springs.restore(0, &mut points, &params).is_ok());
        assert!(springs.restore(0, &mut points, &params).is_err(), "Restoring a live spring is an error");

        assert_eq!(springs.stiffness_coefficient(0).to_bits(), stiffness.to_bits());
        assert_eq!(points.connected_springs(0).len(), 1);
        assert_eq!(points.connected_springs(1).len(), 1);
        Ok(())
    }

    #[test]
    fn stiffness_grows_gradually() -> Result<(), String> {
        let (mut points, mut springs, params) = pair(1.0)?;
        let before = springs.stiffness_coefficient(0);

        points.add_mass_offset(0, consts::BOMB_MASS);
        springs.calculate_coefficients(0, &points, &params);
        let grown = springs.stiffness_coefficient(0);
        assert!(grown > before);

        points.add_mass_offset(0, -consts::BOMB_MASS);
        springs.calculate_coefficients(0, &points, &params);
        assert_eq!(springs.stiffness_coefficient(0).to_bits(), before.to_bits(), "Shrinking applies at once");
        Ok(())
    }
}
