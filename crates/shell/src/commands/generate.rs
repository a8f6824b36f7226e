//! Generate lattice bodies.

use std::path::Path;

use frangible::{MaterialDatabase, SimulationParameters};
use meshgen::Lattice;

/// The shape of the lattice to generate.
#[derive(Debug, Clone)]
pub struct LatticeShape {
    /// The number of rows of cells.
    pub rows: usize,
    /// The number of columns of cells.
    pub cols: usize,
    /// The number of random holes.
    pub holes: usize,
    /// The distance between neighboring particles.
    pub spacing: f32,
    /// Whether to add the second diagonal of every cell.
    pub traverse_springs: bool,
    /// The number of slots reserved for ephemeral particles.
    pub ephemeral_capacity: usize,
}

/// Generates a lattice of the given material and writes its mesh definition.
///
/// Particle strengths are randomized with the settings in `params`.
///
/// # Errors
///
/// - If the material is unknown.
/// - If the lattice is empty or has more holes than cells.
/// - If the mesh cannot be written.
pub fn generate_lattice(
    shape: &LatticeShape,
    material: &str,
    params: &SimulationParameters,
    seed: u64,
    out_path: Option<&Path>,
) -> Result<(), String> {
    let materials = MaterialDatabase::builtin();
    let material = materials
        .find(material)
        .ok_or_else(|| format!("Unknown material {material:?}"))?;

    let mesh = Lattice::new(shape.rows, shape.cols)
        .and_then(|lattice| lattice.with_random_holes(shape.holes, seed))
        .map_err(|e| e.to_string())?
        .with_spacing(shape.spacing)
        .with_traverse_springs(shape.traverse_springs)
        .with_ephemeral_capacity(shape.ephemeral_capacity)
        .generate(material, &materials, &params.strength_randomization)
        .map_err(|e| e.to_string())?;

    match out_path {
        Some(path) => {
            mesh.to_json_path(path).map_err(|e| e.to_string())?;
            ftlog::info!("Wrote the mesh to {path:?}");
            Ok(())
        }
        None => crate::utils::write_json(&mesh, None),
    }
}
