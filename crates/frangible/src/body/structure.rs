//! Structural changes: destroying and restoring elements, bombs and pins.
//!
//! The order of operations matters. When a triangle is destroyed it leaves
//! its springs' super-triangle lists before the frontiers are updated; when it
//! is restored the frontiers are updated before it rejoins those lists.

use arrayvec::ArrayVec;
use glam::Vec2;

use crate::{DestroyOptions, ElementIndex, MeshError, consts};

use super::{Body, check_index};

impl Body {
    /// Destroys a triangle, updating its springs, particles and the frontiers.
    ///
    /// # Errors
    ///
    /// - If the index is out of range or the triangle is already deleted.
    pub fn destroy_triangle(&mut self, triangle: ElementIndex) -> Result<(), MeshError> {
        check_index("triangle", triangle, self.triangles.len())?;
        if self.triangles.is_deleted(triangle) {
            return Err(MeshError::Deleted { kind: "triangle", index: triangle });
        }
        self.destroy_triangle_unchecked(triangle);
        Ok(())
    }

    /// Destroys a live triangle.
    pub(super) fn destroy_triangle_unchecked(&mut self, triangle: ElementIndex) {
        for s in self.triangles.sub_springs(triangle) {
            self.springs.remove_super_triangle(s, triangle);
        }
        if let Some(s) = self.triangles.covered_traverse_spring(triangle) {
            self.springs.remove_covering_triangle(s);
        }

        let [p0, p1, p2] = self.triangles.endpoints(triangle);
        self.points.disconnect_triangle(p0, triangle, true);
        self.points.disconnect_triangle(p1, triangle, false);
        self.points.disconnect_triangle(p2, triangle, false);

        self.frontiers
            .handle_triangle_destroy(triangle, &self.springs, &self.triangles, &self.points);
        self.triangles.destroy(triangle);
    }

    /// Brings back a destroyed triangle.
    ///
    /// # Errors
    ///
    /// - If the index is out of range or the triangle is not deleted.
    /// - If one of its springs or particles is deleted.
    pub fn restore_triangle(&mut self, triangle: ElementIndex) -> Result<(), MeshError> {
        check_index("triangle", triangle, self.triangles.len())?;
        if !self.triangles.is_deleted(triangle) {
            return Err(MeshError::NotDeleted { kind: "triangle", index: triangle });
        }
        if let Some(s) = self.triangles.sub_springs(triangle).into_iter().find(|&s| self.springs.is_deleted(s)) {
            return Err(MeshError::Deleted { kind: "spring", index: s });
        }
        if let Some(p) = self.triangles.endpoints(triangle).into_iter().find(|&p| self.points.is_deleted(p)) {
            return Err(MeshError::Deleted { kind: "point", index: p });
        }

        self.frontiers
            .handle_triangle_restore(triangle, &self.springs, &self.triangles, &self.points);
        self.triangles.restore(triangle)?;

        let [p0, p1, p2] = self.triangles.endpoints(triangle);
        self.points.connect_triangle(p0, triangle, true);
        self.points.connect_triangle(p1, triangle, false);
        self.points.connect_triangle(p2, triangle, false);

        if let Some(s) = self.triangles.covered_traverse_spring(triangle) {
            self.springs.add_covering_triangle(s);
        }
        for s in self.triangles.sub_springs(triangle) {
            self.springs.add_super_triangle(s, triangle);
        }

        self.events.on_triangle_repaired(self.points.material(p0), 1);
        for p in [p0, p1, p2] {
            self.attempt_point_restore(p);
        }
        Ok(())
    }

    /// Destroys a spring.
    ///
    /// The spring leaves its endpoints, the triangles it brings down with it
    /// are destroyed, and both endpoints are damaged.
    ///
    /// # Errors
    ///
    /// - If the index is out of range or the spring is already deleted.
    pub fn destroy_spring(&mut self, spring: ElementIndex, options: DestroyOptions) -> Result<(), MeshError> {
        check_index("spring", spring, self.springs.len())?;
        if self.springs.is_deleted(spring) {
            return Err(MeshError::Deleted { kind: "spring", index: spring });
        }
        self.destroy_spring_unchecked(spring, options);
        Ok(())
    }

    /// Destroys a live spring.
    ///
    /// # Returns
    ///
    /// * The number of triangles destroyed with it.
    pub(super) fn destroy_spring_unchecked(&mut self, spring: ElementIndex, options: DestroyOptions) -> usize {
        let [a, b] = self.springs.endpoints(spring);
        self.points.disconnect_spring(a, spring);
        self.points.disconnect_spring(b, spring);

        let mut doomed = ArrayVec::<ElementIndex, { 2 * consts::MAX_TRIANGLES_PER_POINT }>::new();
        if options.destroy_all_triangles {
            doomed.extend(self.points.connected_triangles(a).iter().copied());
            for &t in self.points.connected_triangles(b) {
                if !doomed.contains(&t) {
                    doomed.push(t);
                }
            }
        } else {
            doomed.extend(
                self.points
                    .connected_triangles(a)
                    .iter()
                    .copied()
                    .filter(|&t| self.triangles.contains_both(t, a, b)),
            );
        }
        for &t in &doomed {
            self.destroy_triangle_unchecked(t);
        }

        self.points.damage(a);
        self.points.damage(b);
        self.springs.destroy(spring, options.fire_break_event, &self.points);
        self.is_structure_dirty = true;

        doomed.len()
    }

    /// Brings back a destroyed spring. Its triangles stay destroyed.
    ///
    /// # Errors
    ///
    /// - If the index is out of range or the spring is not deleted.
    /// - If one of its endpoints is deleted.
    pub fn restore_spring(&mut self, spring: ElementIndex) -> Result<(), MeshError> {
        check_index("spring", spring, self.springs.len())?;
        if let Some(p) = self.springs.endpoints(spring).into_iter().find(|&p| self.points.is_deleted(p)) {
            return Err(MeshError::Deleted { kind: "point", index: p });
        }

        self.springs.restore(spring, &mut self.points, &self.params)?;
        self.is_structure_dirty = true;

        let [a, b] = self.springs.endpoints(spring);
        self.attempt_point_restore(a);
        self.attempt_point_restore(b);
        Ok(())
    }

    /// Destroys a particle with all its springs and triangles.
    ///
    /// # Errors
    ///
    /// - If the index does not address a live structural particle.
    pub fn destroy_point(&mut self, point: ElementIndex) -> Result<(), MeshError> {
        check_index("point", point, self.points.ship_point_count())?;
        if self.points.is_deleted(point) {
            return Err(MeshError::Deleted { kind: "point", index: point });
        }

        let options = DestroyOptions {
            fire_break_event: false,
            destroy_all_triangles: false,
        };
        while let Some(cs) = self.points.connected_springs(point).first().copied() {
            self.destroy_spring_unchecked(cs.spring, options);
        }
        while let Some(&t) = self.points.connected_triangles(point).first() {
            self.destroy_triangle_unchecked(t);
        }

        self.points.destroy(point);
        self.is_structure_dirty = true;
        Ok(())
    }

    /// Brings back a destroyed particle. Its springs and triangles stay destroyed.
    ///
    /// # Errors
    ///
    /// - If the index does not address a destroyed structural particle.
    pub fn restore_point(&mut self, point: ElementIndex) -> Result<(), MeshError> {
        check_index("point", point, self.points.ship_point_count())?;
        if !self.points.is_deleted(point) {
            return Err(MeshError::NotDeleted { kind: "point", index: point });
        }
        self.points.restore(point);
        self.is_structure_dirty = true;
        Ok(())
    }

    /// Clears the damage of a particle if all its springs and triangles are back.
    fn attempt_point_restore(&mut self, point: ElementIndex) {
        if self.points.is_damaged(point) && self.points.has_all_factory_connections(point) && self.points.restore(point) {
            ftlog::debug!("Point {point} is whole again");
            if self.points.damaged_count() == 0 {
                self.events.on_body_repaired();
            }
        }
    }

    /// Attaches a bomb to a spring, weighing down both endpoints.
    ///
    /// The coefficients of every spring of either endpoint are recomputed at once.
    ///
    /// # Errors
    ///
    /// - If the index is out of range or the spring is deleted.
    ///
    /// # Returns
    ///
    /// * `false` if a bomb was already attached.
    pub fn attach_bomb(&mut self, spring: ElementIndex) -> Result<bool, MeshError> {
        self.set_bomb(spring, true)
    }

    /// Detaches the bomb of a spring, restoring the mass of both endpoints.
    ///
    /// # Errors
    ///
    /// - If the index is out of range or the spring is deleted.
    ///
    /// # Returns
    ///
    /// * `false` if no bomb was attached.
    pub fn detach_bomb(&mut self, spring: ElementIndex) -> Result<bool, MeshError> {
        self.set_bomb(spring, false)
    }

    /// Attaches or detaches a bomb and refreshes the affected coefficients.
    fn set_bomb(&mut self, spring: ElementIndex, attached: bool) -> Result<bool, MeshError> {
        check_index("spring", spring, self.springs.len())?;
        if self.springs.is_deleted(spring) {
            return Err(MeshError::Deleted { kind: "spring", index: spring });
        }
        if !self.springs.set_bomb_attached(spring, attached) {
            return Ok(false);
        }

        let delta = if attached { consts::BOMB_MASS } else { -consts::BOMB_MASS };
        for p in self.springs.endpoints(spring) {
            self.points.add_mass_offset(p, delta);
        }
        for p in self.springs.endpoints(spring) {
            let affected = self
                .points
                .connected_springs(p)
                .iter()
                .map(|cs| cs.spring)
                .collect::<ArrayVec<_, { consts::MAX_SPRINGS_PER_POINT }>>();
            for s in affected {
                self.springs.calculate_coefficients(s, &self.points, &self.params);
            }
        }
        Ok(true)
    }

    /// Pins a structural particle in place.
    ///
    /// # Errors
    ///
    /// - If the index does not address a live structural particle.
    ///
    /// # Returns
    ///
    /// * `false` if the particle was already pinned.
    pub fn pin_point(&mut self, point: ElementIndex) -> Result<bool, MeshError> {
        self.check_live_ship_point(point)?;
        Ok(self.points.pin(point))
    }

    /// Releases a pinned particle.
    ///
    /// # Errors
    ///
    /// - If the index does not address a live structural particle.
    ///
    /// # Returns
    ///
    /// * `false` if the particle was not pinned.
    pub fn unpin_point(&mut self, point: ElementIndex) -> Result<bool, MeshError> {
        self.check_live_ship_point(point)?;
        Ok(self.points.unpin(point))
    }

    /// Sets the water held by a particle; takes effect on the next step.
    ///
    /// # Errors
    ///
    /// - If the index does not address a live particle.
    pub fn set_water(&mut self, point: ElementIndex, water: f32) -> Result<(), MeshError> {
        self.check_live_point(point)?;
        self.points.set_water(point, water);
        Ok(())
    }

    /// Adds an external force to a particle for the next step.
    ///
    /// # Errors
    ///
    /// - If the index does not address a live particle.
    pub fn apply_force(&mut self, point: ElementIndex, force: Vec2) -> Result<(), MeshError> {
        self.check_live_point(point)?;
        self.points.add_static_force(point, force);
        Ok(())
    }

    /// Checks that `point` addresses a live structural particle.
    fn check_live_ship_point(&self, point: ElementIndex) -> Result<(), MeshError> {
        check_index("point", point, self.points.ship_point_count())?;
        self.check_live_point(point)
    }

    /// Checks that `point` addresses a live particle.
    fn check_live_point(&self, point: ElementIndex) -> Result<(), MeshError> {
        check_index("point", point, self.points.len())?;
        if self.points.is_deleted(point) {
            return Err(MeshError::Deleted { kind: "point", index: point });
        }
        Ok(())
    }
}
