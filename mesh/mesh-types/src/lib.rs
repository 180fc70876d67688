//! Grouped finite-element mesh types.
//!
//! This crate provides the mesh side of region selection:
//!
//! - [`Mesh`] - Vertex coordinates, vertex tags, named sets and element groups
//! - [`ElementGroup`] - A block of cells sharing one reference element
//! - [`GeometryElement`] - Reference elements with local edge/face/facet tables
//! - [`DomainTopology`] - Per-group edge, face and facet numbering plus surface facets
//! - [`MeshTopology`] - Object-safe read-only view of a mesh
//! - [`Aabb`] - Axis-aligned bounding box
//!
//! # Numbering
//!
//! Vertices are numbered globally. Cells, edges, faces and facets are numbered
//! within their group; a global cell index is the local index plus the cell
//! offset of the group.
//!
//! # Example
//!
//! ```
//! use mesh_types::{unit_square, DomainTopology, MeshTopology};
//!
//! let mesh = unit_square(3, 2);
//! assert_eq!(mesh.vertex_count(), 12);
//! assert_eq!(mesh.cell_offsets(), vec![0]);
//!
//! let topology = DomainTopology::from_mesh(&mesh);
//! assert_eq!(topology.cell_count(), 6);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod bounds;
mod element;
mod error;
mod mesh;
mod topology;
mod traits;

pub use bounds::Aabb;
pub use element::GeometryElement;
pub use error::{MeshError, MeshResult};
pub use mesh::{unit_cube, unit_square, ElementGroup, Mesh};
pub use topology::{DomainTopology, EntityTable, GroupTopology};
pub use traits::{MeshBounds, MeshTopology};

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};
