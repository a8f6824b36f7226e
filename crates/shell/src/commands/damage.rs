//! Destroy parts of a body and inspect the frontiers.

use std::path::Path;

use frangible::{Body, DestroyOptions, ElementIndex};

use super::report::BodyReport;

/// The elements to destroy, in the order in which they are destroyed.
#[derive(Debug, Clone, Default)]
pub struct Damage {
    /// Triangles to destroy.
    pub triangles: Vec<ElementIndex>,
    /// Springs to destroy.
    pub springs: Vec<ElementIndex>,
    /// Particles to destroy.
    pub points: Vec<ElementIndex>,
}

/// Destroys the elements of `damage`, verifies the frontiers and writes a report.
///
/// With `restore`, every deleted element is brought back afterwards, particles
/// first and triangles last, and the report describes the repaired body.
///
/// # Errors
///
/// - If an element does not exist or is already deleted.
/// - If the frontiers are inconsistent after the damage or the repair.
/// - If the report cannot be written.
pub fn apply(mut body: Body, damage: &Damage, restore: bool, out_path: Option<&Path>) -> Result<(), String> {
    for &t in &damage.triangles {
        body.destroy_triangle(t).map_err(|e| e.to_string())?;
    }
    for &s in &damage.springs {
        body.destroy_spring(s, DestroyOptions::default()).map_err(|e| e.to_string())?;
    }
    for &p in &damage.points {
        body.destroy_point(p).map_err(|e| e.to_string())?;
    }
    body.verify_frontiers()?;
    ftlog::info!(
        "After the damage: {} frontiers, {} damaged points",
        body.frontiers().len(),
        body.points().damaged_count()
    );

    if restore {
        repair(&mut body)?;
        body.verify_frontiers()?;
        ftlog::info!(
            "After the repair: {} frontiers, {} damaged points",
            body.frontiers().len(),
            body.points().damaged_count()
        );
    }

    crate::utils::write_json(&BodyReport::new(&body), out_path)
}

/// Brings back every deleted particle, spring and triangle.
fn repair(body: &mut Body) -> Result<(), String> {
    let deleted_points = body
        .points()
        .ship_points()
        .filter(|&p| body.points().is_deleted(p))
        .collect::<Vec<_>>();
    for p in deleted_points {
        body.restore_point(p).map_err(|e| e.to_string())?;
    }

    let deleted_springs = (0..body.springs().len())
        .filter_map(|s| ElementIndex::try_from(s).ok())
        .filter(|&s| body.springs().is_deleted(s))
        .collect::<Vec<_>>();
    for s in deleted_springs {
        body.restore_spring(s).map_err(|e| e.to_string())?;
    }

    let deleted_triangles = (0..body.triangles().len())
        .filter_map(|t| ElementIndex::try_from(t).ok())
        .filter(|&t| body.triangles().is_deleted(t))
        .collect::<Vec<_>>();
    for t in deleted_triangles {
        body.restore_triangle(t).map_err(|e| e.to_string())?;
    }

    Ok(())
}
