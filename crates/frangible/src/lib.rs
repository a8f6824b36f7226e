//! Structural physics for destructible 2D bodies.
//!
//! A body is a flat-buffer mesh of point-masses ("particles") joined by elastic
//! constraints ("springs") and organized into triangles. The [`Frontiers`]
//! tracker maintains the closed edge-cycles that describe the body's outer hulls
//! and inner holes, updating them incrementally as triangles are destroyed and
//! restored.
//!
//! ## Components
//!
//! - [`Points`]: all point-mass state, including a reserved pool of ephemeral particles.
//! - [`Springs`]: the elastic constraints, their coefficients and their strain/break state.
//! - [`Triangles`]: the three-particle faces and their sub-springs.
//! - [`Frontiers`]: the boundary tracker.
//! - [`Body`]: the step orchestrator that owns all of the above.
//!
//! All elements are addressed by stable [`ElementIndex`] values. Deletion never
//! compacts the buffers; it flags the element as deleted.

pub mod consts;

mod body;
mod error;
mod events;
mod frontiers;
mod material;
mod mesh;
mod params;
mod points;
mod springs;
mod triangles;
mod utils;

pub use body::{Body, StepStatistics};
pub use error::MeshError;
pub use events::{EventSink, NullEventSink};
pub use frontiers::{Aabb, Frontier, FrontierColor, FrontierEdge, FrontierRenderer, FrontierType, Frontiers};
pub use material::{MaterialDatabase, MaterialId, StructuralMaterial, UniqueMaterial};
pub use mesh::{FrontierDefinition, MeshDefinition, PointDefinition, SpringDefinition, TriangleDefinition};
pub use params::{SimulationParameters, StrengthRandomization};
pub use points::{ConnectedSpring, DestroyHandler, EphemeralParticle, EphemeralType, Points};
pub use springs::{DestroyOptions, Springs};
pub use triangles::Triangles;
pub use utils::{SequenceNumber, VisitTracker};

/// The index of an element (particle, spring, triangle) in its store.
pub type ElementIndex = u32;

/// The id of a frontier.
pub type FrontierId = u32;

/// The id of a connected component of particles.
pub type ConnectedComponentId = u32;

/// The id of a depth layer of particles.
pub type PlaneId = u32;

/// Converts a buffer position into an `ElementIndex`.
///
/// Buffers are sized from `ElementIndex` counts, so every position fits.
#[expect(clippy::cast_possible_truncation)]
pub(crate) const fn as_index(i: usize) -> ElementIndex {
    i as ElementIndex
}
