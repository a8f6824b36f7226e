//! Structured notifications emitted by the structural core.

use crate::{ElementIndex, StructuralMaterial};

/// Receives the expected, frequent events of a simulation.
///
/// None of these are errors. All methods default to doing nothing so that
/// collaborators only implement what they care about. Sinks are shared with
/// the stores, so implementations use interior mutability for any state.
pub trait EventSink: Send + Sync {
    /// `count` springs of the given material broke.
    fn on_break(&self, material: &StructuralMaterial, count: usize) {
        let _ = (material, count);
    }

    /// `count` springs of the given material became stressed.
    fn on_stress(&self, material: &StructuralMaterial, count: usize) {
        let _ = (material, count);
    }

    /// `count` particles of the given material were destroyed.
    fn on_destroy(&self, material: &StructuralMaterial, count: usize) {
        let _ = (material, count);
    }

    /// A particle started leaking water.
    fn on_leak(&self, point: ElementIndex) {
        let _ = point;
    }

    /// `count` springs of the given material were repaired.
    fn on_spring_repaired(&self, material: &StructuralMaterial, count: usize) {
        let _ = (material, count);
    }

    /// `count` triangles of the given material were repaired.
    fn on_triangle_repaired(&self, material: &StructuralMaterial, count: usize) {
        let _ = (material, count);
    }

    /// The body has no more broken elements.
    fn on_body_repaired(&self) {}

    /// An ephemeral particle could not be allocated.
    fn on_ephemeral_exhausted(&self) {}
}

/// An `EventSink` that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {}
