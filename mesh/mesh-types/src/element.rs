//! Reference geometry elements and their local topology tables.
//!
//! Local numbering follows the usual finite-element conventions: vertices are
//! numbered counter-clockwise for 2D cells, the bottom face first for
//! hexahedra. Faces of 3D cells are listed with outward orientation.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::MeshError;

const LINE_FACETS: &[&[usize]] = &[&[0], &[1]];

const LINE_EDGES: &[[usize; 2]] = &[[0, 1]];

const TRIANGLE_EDGES: &[[usize; 2]] = &[[0, 1], [1, 2], [2, 0]];

const QUAD_EDGES: &[[usize; 2]] = &[[0, 1], [1, 2], [2, 3], [3, 0]];

const TETRA_EDGES: &[[usize; 2]] = &[[0, 1], [1, 2], [2, 0], [0, 3], [1, 3], [2, 3]];

const TETRA_FACES: &[&[usize]] = &[&[0, 2, 1], &[0, 3, 2], &[1, 3, 0], &[1, 2, 3]];

const HEXA_EDGES: &[[usize; 2]] = &[
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 0],
    [4, 5],
    [5, 6],
    [6, 7],
    [7, 4],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
];

const HEXA_FACES: &[&[usize]] = &[
    &[0, 3, 2, 1],
    &[0, 4, 7, 3],
    &[0, 1, 5, 4],
    &[4, 5, 6, 7],
    &[1, 2, 6, 5],
    &[3, 7, 6, 2],
];

const TRIANGLE_FACETS: &[&[usize]] = &[&[0, 1], &[1, 2], &[2, 0]];

const QUAD_FACETS: &[&[usize]] = &[&[0, 1], &[1, 2], &[2, 3], &[3, 0]];

/// A reference geometry element.
///
/// Each variant is named after its dimension and vertex count, so `2_3` is a
/// triangle and `3_8` a hexahedron.
///
/// # Example
///
/// ```
/// use mesh_types::GeometryElement;
///
/// let gel: GeometryElement = "3_4".parse().unwrap();
/// assert_eq!(gel, GeometryElement::Tetrahedron);
/// assert_eq!(gel.edges().len(), 6);
/// assert_eq!(gel.facets().len(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GeometryElement {
    /// Two-vertex line segment (`1_2`).
    Line,
    /// Three-vertex triangle (`2_3`).
    Triangle,
    /// Four-vertex quadrilateral (`2_4`).
    Quadrilateral,
    /// Four-vertex tetrahedron (`3_4`).
    Tetrahedron,
    /// Eight-vertex hexahedron (`3_8`).
    Hexahedron,
}

impl GeometryElement {
    /// Topological dimension of the element.
    #[must_use]
    pub const fn dim(self) -> usize {
        match self {
            Self::Line => 1,
            Self::Triangle | Self::Quadrilateral => 2,
            Self::Tetrahedron | Self::Hexahedron => 3,
        }
    }

    /// Number of vertices of one element.
    #[must_use]
    pub const fn vertex_count(self) -> usize {
        match self {
            Self::Line => 2,
            Self::Triangle => 3,
            Self::Quadrilateral | Self::Tetrahedron => 4,
            Self::Hexahedron => 8,
        }
    }

    /// Local edges as pairs of local vertex indices.
    #[must_use]
    pub const fn edges(self) -> &'static [[usize; 2]] {
        match self {
            Self::Line => LINE_EDGES,
            Self::Triangle => TRIANGLE_EDGES,
            Self::Quadrilateral => QUAD_EDGES,
            Self::Tetrahedron => TETRA_EDGES,
            Self::Hexahedron => HEXA_EDGES,
        }
    }

    /// Local faces as lists of local vertex indices.
    ///
    /// Empty for elements of dimension lower than three.
    #[must_use]
    pub const fn faces(self) -> &'static [&'static [usize]] {
        match self {
            Self::Line | Self::Triangle | Self::Quadrilateral => &[],
            Self::Tetrahedron => TETRA_FACES,
            Self::Hexahedron => HEXA_FACES,
        }
    }

    /// Local facets, the codimension-1 entities of the element.
    ///
    /// These are the end points of a line, the edges of a 2D cell and the
    /// faces of a 3D cell.
    #[must_use]
    pub const fn facets(self) -> &'static [&'static [usize]] {
        match self {
            Self::Line => LINE_FACETS,
            Self::Triangle => TRIANGLE_FACETS,
            Self::Quadrilateral => QUAD_FACETS,
            Self::Tetrahedron => TETRA_FACES,
            Self::Hexahedron => HEXA_FACES,
        }
    }

    /// The `<dim>_<n_vertex>` descriptor of the element.
    #[must_use]
    pub const fn descriptor(self) -> &'static str {
        match self {
            Self::Line => "1_2",
            Self::Triangle => "2_3",
            Self::Quadrilateral => "2_4",
            Self::Tetrahedron => "3_4",
            Self::Hexahedron => "3_8",
        }
    }
}

impl fmt::Display for GeometryElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor())
    }
}

impl FromStr for GeometryElement {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1_2" => Ok(Self::Line),
            "2_3" => Ok(Self::Triangle),
            "2_4" => Ok(Self::Quadrilateral),
            "3_4" => Ok(Self::Tetrahedron),
            "3_8" => Ok(Self::Hexahedron),
            other => Err(MeshError::UnknownElement(other.to_string())),
        }
    }
}
