//! The per-run simulation parameters.

use serde::{Deserialize, Serialize};

use crate::{MeshError, consts};

/// Settings for the randomization of particle strengths at load time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrengthRandomization {
    /// Scales the density of weak spots. Zero disables randomization.
    pub density_adjustment: f32,
    /// The largest fraction of strength a particle may lose.
    pub extent: f32,
}

impl Default for StrengthRandomization {
    fn default() -> Self {
        Self {
            density_adjustment: 1.0,
            extent: 0.406,
        }
    }
}

/// The parameters consumed by the structural core.
///
/// Changing these triggers coefficient recomputation on the next step but never
/// changes the structure by itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    /// Multiplies the basis number of mechanical sub-steps. In `[0.5, 20]`.
    pub num_mechanical_dynamics_iterations_adjustment: f32,
    /// Multiplies spring stiffness. In `[0.001, 2.4]`.
    pub spring_stiffness_adjustment: f32,
    /// Multiplies spring damping. In `[0.001, 4]`.
    pub spring_damping_adjustment: f32,
    /// Multiplies spring strength. In `[0.01, 50]`.
    pub spring_strength_adjustment: f32,
    /// Adjusts the global velocity damping. In `[0, 10]`, with `1` being neutral.
    pub global_damping_adjustment: f32,
    /// Multiplies the density of water held by particles. In `[0.001, 100]`.
    pub water_density_adjustment: f32,
    /// Whether gravity acts on the body.
    pub apply_gravity: bool,
    /// Strength randomization, applied by the loader.
    pub strength_randomization: StrengthRandomization,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            num_mechanical_dynamics_iterations_adjustment: 1.0,
            spring_stiffness_adjustment: 1.0,
            spring_damping_adjustment: 1.0,
            spring_strength_adjustment: 1.0,
            global_damping_adjustment: 1.0,
            water_density_adjustment: 1.0,
            apply_gravity: true,
            strength_randomization: StrengthRandomization::default(),
        }
    }
}

impl SimulationParameters {
    /// Reads parameters from a `.json`, `.yaml` or `.yml` file and clamps them.
    ///
    /// # Errors
    ///
    /// - If the file cannot be read.
    /// - If the extension is not recognized.
    /// - If the contents cannot be parsed.
    pub fn from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self, MeshError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| MeshError::InvalidParameters(format!("{path:?}: {e}")))?;

        let params: Self = match path.extension().and_then(std::ffi::OsStr::to_str) {
            Some("json") => serde_json::from_str(&contents).map_err(|e| MeshError::InvalidParameters(e.to_string()))?,
            Some("yaml" | "yml") => serde_yaml::from_str(&contents).map_err(|e| MeshError::InvalidParameters(e.to_string()))?,
            other => return Err(MeshError::InvalidParameters(format!("unsupported parameter file extension: {other:?}"))),
        };

        let clamped = params.clamped();
        if clamped != params {
            ftlog::warn!("Parameters from {path:?} were clamped into range");
        }
        Ok(clamped)
    }

    /// Returns a copy with every adjustment clamped into its documented range.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            num_mechanical_dynamics_iterations_adjustment: self.num_mechanical_dynamics_iterations_adjustment.clamp(0.5, 20.0),
            spring_stiffness_adjustment: self.spring_stiffness_adjustment.clamp(0.001, 2.4),
            spring_damping_adjustment: self.spring_damping_adjustment.clamp(0.001, 4.0),
            spring_strength_adjustment: self.spring_strength_adjustment.clamp(0.01, 50.0),
            global_damping_adjustment: self.global_damping_adjustment.clamp(0.0, consts::MAX_GLOBAL_DAMPING_ADJUSTMENT),
            water_density_adjustment: self.water_density_adjustment.clamp(0.001, 100.0),
            apply_gravity: self.apply_gravity,
            strength_randomization: StrengthRandomization {
                density_adjustment: self.strength_randomization.density_adjustment.max(0.0),
                extent: self.strength_randomization.extent.clamp(0.0, 1.0),
            },
        }
    }

    /// The number of mechanical sub-steps, as a float.
    #[must_use]
    pub fn num_mechanical_dynamics_iterations(&self) -> f32 {
        consts::BASIS_MECHANICAL_DYNAMICS_ITERATIONS * self.num_mechanical_dynamics_iterations_adjustment
    }

    /// The number of mechanical sub-steps to run in each simulation step. At least one.
    #[must_use]
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn mechanical_iterations(&self) -> usize {
        (self.num_mechanical_dynamics_iterations().round() as usize).max(1)
    }

    /// The duration of one mechanical sub-step.
    #[must_use]
    pub fn mechanical_step_duration(&self) -> f32 {
        consts::SIMULATION_STEP_TIME_DURATION / self.num_mechanical_dynamics_iterations()
    }

    /// The factor applied to the breaking elongation of springs to account for
    /// the number of sub-steps.
    ///
    /// Doubling the sub-steps lets displacements be recovered faster, so springs
    /// must tolerate less; the relation is empirical: `4 / (1 + 3 r^1.3)`.
    #[must_use]
    pub fn strength_iterations_adjustment(&self) -> f32 {
        4.0 / 3.0f32.mul_add(self.num_mechanical_dynamics_iterations_adjustment.powf(1.3), 1.0)
    }

    /// The fraction of velocity kept at the end of each sub-step.
    ///
    /// The base damping is calibrated for a fixed number of sub-steps so that
    /// the damping over a whole step does not depend on the sub-step count.
    #[must_use]
    pub fn global_damping_coefficient(&self) -> f32 {
        let damping = 1.0
            - (1.0 - consts::GLOBAL_DAMPING).powf(consts::GLOBAL_DAMPING_BASIS_ITERATIONS / self.num_mechanical_dynamics_iterations());

        let adjustment = self.global_damping_adjustment - 1.0;
        let adjusted = if adjustment <= 0.0 {
            damping * adjustment.mul_add(-adjustment, 1.0)
        } else {
            let max_adjustment = consts::MAX_GLOBAL_DAMPING_ADJUSTMENT - 1.0;
            (adjustment * adjustment / (max_adjustment * max_adjustment)).mul_add(1.0 - damping, damping)
        };

        1.0 - adjusted
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;
    use test_case::test_case;

    use super::SimulationParameters;

    #[test]
    fn defaults() {
        let params = SimulationParameters::default();
        assert_eq!(params.mechanical_iterations(), 30);
        assert!(approx_eq!(f32, params.strength_iterations_adjustment(), 1.0, ulps = 4));
        let keep = params.global_damping_coefficient();
        assert!(keep < 1.0 && keep > 0.9999, "Neutral damping should keep almost all velocity: {keep}");
    }

    #[test_case(0.0; "no damping")]
    #[test_case(10.0; "full damping")]
    fn damping_extremes(adjustment: f32) {
        let params = SimulationParameters {
            global_damping_adjustment: adjustment,
            ..SimulationParameters::default()
        };
        let keep = params.global_damping_coefficient();
        if adjustment == 0.0 {
            assert!(approx_eq!(f32, keep, 1.0), "Zero adjustment should keep all velocity: {keep}");
        } else {
            assert!(approx_eq!(f32, keep, 0.0, epsilon = 1e-6), "Max adjustment should remove all velocity: {keep}");
        }
    }

    #[test]
    fn clamps_out_of_range() {
        let params = SimulationParameters {
            num_mechanical_dynamics_iterations_adjustment: 100.0,
            spring_strength_adjustment: 0.0,
            ..SimulationParameters::default()
        }
        .clamped();
        assert!(approx_eq!(f32, params.num_mechanical_dynamics_iterations_adjustment, 20.0));
        assert!(approx_eq!(f32, params.spring_strength_adjustment, 0.01));
    }

    #[test]
    fn parses_partial_yaml() -> Result<(), String> {
        let params: SimulationParameters =
            serde_yaml::from_str("spring_strength_adjustment: 2.5\napply_gravity: false\n").map_err(|e| e.to_string())?;
        assert!(approx_eq!(f32, params.spring_strength_adjustment, 2.5));
        assert!(!params.apply_gravity);
        assert!(approx_eq!(f32, params.spring_stiffness_adjustment, 1.0), "Missing keys should take defaults");
        Ok(())
    }
}
