//! Error types for mesh construction.

use thiserror::Error;

/// Result type for mesh operations.
pub type MeshResult<T> = Result<T, MeshError>;

/// Errors that can occur while building a mesh.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MeshError {
    /// The element descriptor is not one of the supported reference elements.
    #[error("unknown geometry element '{0}'")]
    UnknownElement(String),

    /// The spatial dimension is not 1, 2 or 3.
    #[error("unsupported spatial dimension {0}")]
    InvalidDimension(usize),

    /// A connectivity array length is not a multiple of the element vertex count.
    #[error("connectivity of group {group} has {len} entries, not a multiple of {per_cell}")]
    RaggedConnectivity {
        /// Group index.
        group: usize,
        /// Length of the flat connectivity array.
        len: usize,
        /// Vertices per cell of the group element.
        per_cell: usize,
    },

    /// A connectivity entry references a vertex outside the mesh.
    #[error("group {group} references vertex {index} (mesh has {vertex_count} vertices)")]
    InvalidVertexIndex {
        /// Group index.
        group: usize,
        /// The invalid index.
        index: u32,
        /// Total number of vertices in the mesh.
        vertex_count: usize,
    },

    /// Vertex tag array length differs from the vertex count.
    #[error("{len} vertex tags given for {vertex_count} vertices")]
    TagCountMismatch {
        /// Number of tags supplied.
        len: usize,
        /// Total number of vertices in the mesh.
        vertex_count: usize,
    },

    /// Two groups share a material id.
    #[error("material id {0} is used by more than one group")]
    DuplicateMaterial(i32),
}
