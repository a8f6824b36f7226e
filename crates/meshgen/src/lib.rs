//! Synthetic bodies for the `frangible` structural core.
//!
//! A [`Lattice`] describes a rectangular grid of square cells, optionally with
//! some cells punched out, and turns it into a [`MeshDefinition`](frangible::MeshDefinition):
//!
//! - every cell becomes two clockwise triangles sharing its rising diagonal,
//! - the initial frontiers are found with [`detect_frontiers`],
//! - particle strengths are weakened with [`randomize_strengths`].
//!
//! ```rust
//! use frangible::{MaterialDatabase, StrengthRandomization};
//! use meshgen::Lattice;
//!
//! let materials = MaterialDatabase::builtin();
//! let wood = materials.find("Wood").unwrap();
//!
//! let mesh = Lattice::new(3, 3)
//!     .and_then(|l| l.with_holes([(1, 1)]))
//!     .and_then(|l| l.generate(wood, &materials, &StrengthRandomization::default()))
//!     .unwrap();
//!
//! assert_eq!(mesh.triangles.len(), 16);
//! assert_eq!(mesh.frontiers.len(), 2);
//! ```

mod boundary;
mod lattice;
mod strength;

pub use boundary::detect_frontiers;
pub use lattice::Lattice;
pub use strength::randomize_strengths;

use frangible::ElementIndex;

/// Converts a buffer position into an `ElementIndex`.
#[expect(clippy::cast_possible_truncation)]
const fn as_index(i: usize) -> ElementIndex {
    i as ElementIndex
}
