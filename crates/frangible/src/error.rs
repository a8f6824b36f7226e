//! The errors reported by the structural core.

use crate::ElementIndex;

/// Errors that callers of the structural core may need to handle.
///
/// Breaks, stress and leaks are not errors; they are reported through an
/// [`EventSink`](crate::EventSink).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    /// All slots of the ephemeral particle pool are in use and the requested
    /// kind may not steal one.
    #[error("the ephemeral particle pool is exhausted ({capacity} slots in use)")]
    EphemeralPoolExhausted {
        /// The size of the pool.
        capacity: usize,
    },

    /// More elements were added than the store was sized for.
    #[error("cannot add more than {capacity} {kind}")]
    CapacityExceeded {
        /// The kind of element.
        kind: &'static str,
        /// The capacity of the store.
        capacity: usize,
    },

    /// An index does not address an element of the store.
    #[error("{kind} index {index} is out of range (count = {count})")]
    IndexOutOfRange {
        /// The kind of element.
        kind: &'static str,
        /// The offending index.
        index: ElementIndex,
        /// The number of elements in the store.
        count: usize,
    },

    /// The element must be live for the requested operation.
    #[error("{kind} {index} is deleted")]
    Deleted {
        /// The kind of element.
        kind: &'static str,
        /// The offending index.
        index: ElementIndex,
    },

    /// The element must be deleted for the requested operation.
    #[error("{kind} {index} is not deleted")]
    NotDeleted {
        /// The kind of element.
        kind: &'static str,
        /// The offending index.
        index: ElementIndex,
    },

    /// The mesh handed over by the loader is not usable.
    #[error("invalid mesh definition: {0}")]
    InvalidMesh(String),

    /// A parameter file could not be read or parsed.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// The boundary tracker disagrees with the mesh topology.
    #[error("frontier invariant violated: {0}")]
    InvariantViolation(String),
}
