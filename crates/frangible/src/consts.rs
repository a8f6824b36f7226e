//! Physical constants and structural limits.

use glam::Vec2;

/// The duration of one simulation step, in seconds.
pub const SIMULATION_STEP_TIME_DURATION: f32 = 1.0 / 64.0;

/// The number of mechanical sub-steps per simulation step before adjustment.
pub const BASIS_MECHANICAL_DYNAMICS_ITERATIONS: f32 = 30.0;

/// The number of sub-steps the global damping value is calibrated against.
pub const GLOBAL_DAMPING_BASIS_ITERATIONS: f32 = 12.0;

/// The fraction of velocity removed at each sub-step before adjustment.
pub const GLOBAL_DAMPING: f32 = 0.000_107_496_53;

/// The largest accepted global damping adjustment.
pub const MAX_GLOBAL_DAMPING_ADJUSTMENT: f32 = 10.0;

/// The gravity acceleration vector.
pub const GRAVITY: Vec2 = Vec2::new(0.0, -9.80);

/// The mass of one cubic meter of water.
pub const WATER_MASS: f32 = 1000.0;

/// The mass of one cubic meter of air.
pub const AIR_MASS: f32 = 1.2754;

/// The mass offset added to both endpoints of a spring carrying a bomb.
pub const BOMB_MASS: f32 = 5000.0;

/// The fraction of a spring's displacement recovered in one sub-step.
pub const SPRING_REDUCTION_FRACTION: f32 = 0.5;

/// The damping coefficient of springs before adjustment.
pub const SPRING_DAMPING_COEFFICIENT: f32 = 0.03;

/// The fraction of the gap covered at each update while a stiffness coefficient grows.
pub const SPRING_STIFFNESS_CONVERGENCE_RATE: f32 = 0.03;

/// Empirical strength calibration carried over from older sub-step counts.
pub const SPRING_STRENGTH_CALIBRATION: f32 = 0.839_501 * 0.643_389;

/// A stressed spring is released once its strain falls below this fraction of its breaking elongation.
pub const STRAIN_LOW_WATERMARK: f32 = 0.08;

/// The relative width of the randomization applied to strain thresholds.
pub const STRAIN_THRESHOLD_RANDOM_WIDTH: f32 = 0.7;

/// The maximum number of springs connected to one particle.
pub const MAX_SPRINGS_PER_POINT: usize = 8 + 1;

/// The maximum number of triangles connected to one particle.
pub const MAX_TRIANGLES_PER_POINT: usize = 8;

/// The maximum number of triangles having a given spring as an edge.
pub const MAX_SUPER_TRIANGLES_PER_SPRING: usize = 2;

/// The lifetime of an air bubble, in seconds.
pub const AIR_BUBBLE_LIFETIME: f32 = 20.0;

/// The lifetime range of a piece of debris, in seconds.
pub const DEBRIS_LIFETIME: (f32, f32) = (0.4, 0.9);

/// The lifetime range of a smoke particle, in seconds.
pub const SMOKE_LIFETIME: (f32, f32) = (2.0, 4.0);

/// The lifetime range of a sparkle, in seconds.
pub const SPARKLE_LIFETIME: (f32, f32) = (0.2, 0.5);

/// The lifetime of a wake bubble, in seconds.
pub const WAKE_BUBBLE_LIFETIME: f32 = 1.5;
