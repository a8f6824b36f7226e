//! The step orchestrator.
//!
//! A [`Body`] owns the particle, spring, triangle and frontier stores of one
//! destructible body and keeps them consistent: every structural change goes
//! through it so that incidence lists, super triangles and frontiers are
//! updated in the right order.

mod connectivity;
mod structure;
mod update;

use std::sync::Arc;

use glam::Vec2;

use crate::{
    DestroyHandler, ElementIndex, EphemeralType, EventSink, FrontierRenderer, Frontiers, MaterialDatabase, MaterialId, MeshDefinition,
    MeshError, PlaneId, Points, SimulationParameters, Springs, Triangles, springs::SuperTriangles,
};

pub use update::StepStatistics;

/// A destructible body.
pub struct Body {
    /// The materials the body is made of.
    materials: Arc<MaterialDatabase>,
    /// The receiver of events.
    events: Arc<dyn EventSink>,
    /// The parameters of the last step.
    params: SimulationParameters,
    /// The particles.
    points: Points,
    /// The springs.
    springs: Springs,
    /// The triangles.
    triangles: Triangles,
    /// The boundary cycles.
    frontiers: Frontiers,
    /// The simulation time of the last step.
    current_time: f32,
    /// Whether springs or particles were destroyed or restored since the last connectivity visit.
    is_structure_dirty: bool,
    /// The number of particles in each connected component.
    connected_component_sizes: Vec<usize>,
}

impl Body {
    /// Builds a body from a loader's definition.
    ///
    /// # Arguments
    ///
    /// - `mesh`: The particles, springs, triangles and initial frontiers.
    /// - `materials`: The materials referenced by the particles.
    /// - `params`: The parameters to compute the initial coefficients with.
    /// - `events`: The receiver of events.
    /// - `seed`: The seed of the random source.
    ///
    /// # Errors
    ///
    /// - If the definition is inconsistent; see [`MeshDefinition::validate`].
    /// - If a particle refers to an unknown material.
    /// - If a particle has too many springs or triangles.
    /// - If the initial frontiers are malformed.
    pub fn new(
        mesh: &MeshDefinition,
        materials: Arc<MaterialDatabase>,
        params: SimulationParameters,
        events: Arc<dyn EventSink>,
        seed: u64,
    ) -> Result<Self, MeshError> {
        mesh.validate()?;
        if let Some(p) = mesh.points.iter().find(|p| usize::from(p.material.0) >= materials.len()) {
            return Err(MeshError::InvalidMesh(format!("unknown material {:?}", p.material)));
        }

        let mut points = Points::new(
            mesh.points.len(),
            mesh.ephemeral_capacity,
            Arc::clone(&materials),
            &params,
            Arc::clone(&events),
            seed,
        );
        for definition in &mesh.points {
            points.add(definition)?;
        }

        let mut super_triangles = vec![SuperTriangles::new(); mesh.springs.len()];
        let mut covering_counts = vec![0_u32; mesh.springs.len()];
        for (t, triangle) in mesh.triangles.iter().enumerate() {
            for &s in &triangle.sub_springs {
                super_triangles[s as usize].push(crate::as_index(t));
            }
            if let Some(s) = triangle.covered_traverse_spring {
                covering_counts[s as usize] += 1;
            }
        }

        let mut springs = Springs::with_capacity(mesh.springs.len());
        for ((definition, super_triangles), covering_count) in mesh.springs.iter().zip(super_triangles).zip(covering_counts) {
            let [a, b] = definition.endpoints;
            let s = springs.add(a, b, super_triangles, covering_count, &points, &params);
            points.add_factory_connected_spring(a, s, b)?;
            points.add_factory_connected_spring(b, s, a)?;
        }

        let mut triangles = Triangles::with_capacity(mesh.triangles.len());
        for definition in &mesh.triangles {
            let t = triangles.add(definition.points, definition.sub_springs, definition.covered_traverse_spring);
            let [p0, p1, p2] = definition.points;
            points.add_factory_connected_triangle(p0, t, true)?;
            points.add_factory_connected_triangle(p1, t, false)?;
            points.add_factory_connected_triangle(p2, t, false)?;
        }

        let mut frontiers = Frontiers::new(springs.len(), points.len());
        for definition in &mesh.frontiers {
            frontiers.add_frontier(definition.kind, &definition.edges, &springs, &points)?;
        }

        let mut body = Self {
            materials,
            events,
            params,
            points,
            springs,
            triangles,
            frontiers,
            current_time: 0.0,
            is_structure_dirty: true,
            connected_component_sizes: Vec::new(),
        };

        if cfg!(debug_assertions) {
            body.frontiers
                .verify_invariants(&body.springs, &body.triangles)
                .map_err(MeshError::InvariantViolation)?;
        }
        body.update_connectivity();

        ftlog::info!(
            "Built body with {} points, {} springs, {} triangles and {} frontiers",
            body.points.ship_point_count(),
            body.springs.len(),
            body.triangles.len(),
            body.frontiers.len()
        );
        Ok(body)
    }

    /// Creates a short-lived particle at the current simulation time.
    ///
    /// `material` is used by debris and sparkles; bubbles and smoke are made of air.
    ///
    /// # Errors
    ///
    /// - If the pool is full and the kind may not steal a slot.
    pub fn spawn_ephemeral(
        &mut self,
        kind: EphemeralType,
        position: Vec2,
        velocity: Vec2,
        material: Option<MaterialId>,
        plane: PlaneId,
    ) -> Result<ElementIndex, MeshError> {
        let time = self.current_time;
        let material = material.unwrap_or_else(|| self.materials.air());
        match kind {
            EphemeralType::AirBubble => self.points.create_air_bubble(position, time, plane),
            EphemeralType::Debris => self.points.create_debris(position, velocity, material, time, plane),
            EphemeralType::Smoke => self.points.create_smoke(position, velocity, time, plane),
            EphemeralType::Sparkle => self.points.create_sparkle(position, velocity, material, time, plane),
            EphemeralType::WakeBubble => self.points.create_wake_bubble(position, velocity, time, plane),
        }
    }

    /// Hands the frontier visualization to a renderer if it changed.
    pub fn upload_frontiers(&mut self, renderer: &mut dyn FrontierRenderer) {
        self.frontiers.upload(renderer);
    }

    /// Registers the callback fired right before a particle is deleted.
    pub fn register_point_destroy_handler(&mut self, handler: DestroyHandler) {
        self.points.register_destroy_handler(handler);
    }

    /// Registers the callback fired right before a spring is deleted.
    pub fn register_spring_destroy_handler(&mut self, handler: DestroyHandler) {
        self.springs.register_destroy_handler(handler);
    }

    /// Registers the callback fired right before a triangle is deleted.
    pub fn register_triangle_destroy_handler(&mut self, handler: DestroyHandler) {
        self.triangles.register_destroy_handler(handler);
    }

    /// The materials the body is made of.
    #[must_use]
    pub fn materials(&self) -> &MaterialDatabase {
        &self.materials
    }

    /// The parameters of the last step.
    #[must_use]
    pub const fn parameters(&self) -> &SimulationParameters {
        &self.params
    }

    /// The particles.
    #[must_use]
    pub const fn points(&self) -> &Points {
        &self.points
    }

    /// The springs.
    #[must_use]
    pub const fn springs(&self) -> &Springs {
        &self.springs
    }

    /// The triangles.
    #[must_use]
    pub const fn triangles(&self) -> &Triangles {
        &self.triangles
    }

    /// The boundary cycles.
    #[must_use]
    pub const fn frontiers(&self) -> &Frontiers {
        &self.frontiers
    }

    /// The simulation time of the last step.
    #[must_use]
    pub const fn current_time(&self) -> f32 {
        self.current_time
    }

    /// The number of connected components, as of the last connectivity visit.
    #[must_use]
    pub fn connected_component_count(&self) -> usize {
        self.connected_component_sizes.len()
    }

    /// The number of particles in each connected component.
    #[must_use]
    pub fn connected_component_sizes(&self) -> &[usize] {
        &self.connected_component_sizes
    }

    /// Checks the frontiers against the mesh.
    ///
    /// # Errors
    ///
    /// - A description of the first violation found.
    pub fn verify_frontiers(&self) -> Result<(), String> {
        self.frontiers.verify_invariants(&self.springs, &self.triangles)
    }
}

/// Checks that `index` addresses an element of a store with `count` elements.
const fn check_index(kind: &'static str, index: ElementIndex, count: usize) -> Result<(), MeshError> {
    if (index as usize) < count {
        Ok(())
    } else {
        Err(MeshError::IndexOutOfRange { kind, index, count })
    }
}
