//! The simulation step.

use serde::{Deserialize, Serialize};

use crate::{DestroyOptions, SimulationParameters};

use super::Body;

/// What happened during one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepStatistics {
    /// The springs that broke.
    pub broken_springs: usize,
    /// The triangles destroyed by breaks.
    pub destroyed_triangles: usize,
    /// The ephemeral particles that expired.
    pub expired_ephemerals: usize,
    /// The connected components after the step.
    pub connected_components: usize,
    /// The frontiers after the step.
    pub frontiers: usize,
}

impl Body {
    /// Advances the body by one simulation step.
    ///
    /// 1. Coefficients are refreshed if the parameters changed.
    /// 2. Total masses are refreshed and world forces added to the forces applied by tools.
    /// 3. For each mechanical sub-step, spring forces are accumulated and particles
    ///    integrated. Static forces are cleared afterwards.
    /// 4. Strains are checked; broken springs are destroyed along with all
    ///    triangles of their endpoints, which updates the frontiers.
    /// 5. Expired ephemeral particles are freed.
    /// 6. Connectivity is recomputed if the structure changed.
    ///
    /// In debug builds the frontiers are verified at the end of the step.
    pub fn update(&mut self, current_time: f32, params: &SimulationParameters) -> StepStatistics {
        self.current_time = current_time;

        self.points.update_for_parameters(params);
        self.springs.update_for_parameters(&self.points, params);
        self.params = *params;

        self.points.update_total_masses(params);
        self.points.apply_world_forces(params.apply_gravity);

        let dt = params.mechanical_step_duration();
        let damping = params.global_damping_coefficient();
        for _ in 0..params.mechanical_iterations() {
            self.springs.apply_spring_forces(&mut self.points);
            self.points.integrate_and_reset_spring_forces(dt, damping);
        }
        self.points.reset_static_forces();

        let mut stats = StepStatistics::default();

        self.points.reset_stress();
        let broken = self.springs.update_strains(&mut self.points);
        let options = DestroyOptions {
            fire_break_event: true,
            destroy_all_triangles: true,
        };
        for &s in &broken {
            if !self.springs.is_deleted(s) {
                stats.destroyed_triangles += self.destroy_spring_unchecked(s, options);
                stats.broken_springs += 1;
            }
        }
        if stats.broken_springs > 0 {
            ftlog::info!(
                "{} springs broke at t = {current_time:.3}, taking {} triangles",
                stats.broken_springs,
                stats.destroyed_triangles
            );
        }

        stats.expired_ephemerals = self.points.update_ephemeral_particles(current_time);

        if self.is_structure_dirty {
            self.update_connectivity();
        }
        self.frontiers.update_aabbs(&self.points);

        if cfg!(debug_assertions) {
            let verified = self.verify_frontiers();
            debug_assert!(verified.is_ok(), "Frontier invariants violated: {verified:?}");
        }

        stats.connected_components = self.connected_component_count();
        stats.frontiers = self.frontiers.len();
        stats
    }
}
