//! Run the simulation.

use std::path::Path;

use frangible::{Body, ElementIndex, consts};

use super::report::SimulationReport;

/// Runs `steps` steps on `body`, pushing `push` particles along the way.
///
/// # Errors
///
/// - If a pinned or pushed particle is not a live structural particle.
/// - If the report cannot be written.
pub fn run(
    mut body: Body,
    steps: usize,
    push: Option<(ElementIndex, [f32; 2])>,
    pin: &[ElementIndex],
    out_path: Option<&Path>,
) -> Result<(), String> {
    for &p in pin {
        body.pin_point(p).map_err(|e| e.to_string())?;
    }

    let params = *body.parameters();
    let mut time = body.current_time();
    let mut statistics = Vec::with_capacity(steps);
    for step in 0..steps {
        if let Some((point, force)) = push {
            body.apply_force(point, force.into()).map_err(|e| e.to_string())?;
        }

        time += consts::SIMULATION_STEP_TIME_DURATION;
        let stats = body.update(time, &params);
        if stats.broken_springs > 0 {
            ftlog::info!(
                "Step {step}: {} springs broke, {} triangles destroyed, {} frontiers",
                stats.broken_springs,
                stats.destroyed_triangles,
                stats.frontiers
            );
        }
        statistics.push(stats);
    }

    let report = SimulationReport::new(statistics, &body);
    ftlog::info!(
        "Ran {steps} steps: {} springs broke, {} components, {} frontiers",
        report.totals.broken_springs,
        report.totals.connected_components,
        report.totals.frontiers
    );
    crate::utils::write_json(&report, out_path)
}
