//! Finite-element mesh split into element groups.

use hashbrown::HashMap;
use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{MeshError, MeshResult};
use crate::{Aabb, GeometryElement, MeshBounds, MeshTopology};

/// A block of cells sharing one reference element.
///
/// Connectivity is stored flat: cell `i` occupies
/// `conn[i * n_ep..(i + 1) * n_ep]` where `n_ep` is the element vertex count.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ElementGroup {
    /// Material id of the group, used by `elements of group <id>` selections.
    pub mat_id: i32,

    /// Reference element of every cell in the group.
    pub element: GeometryElement,

    /// Flat cell connectivity as global vertex indices.
    pub conn: Vec<u32>,
}

impl ElementGroup {
    /// Create a group from flat connectivity.
    #[must_use]
    pub fn new(mat_id: i32, element: GeometryElement, conn: Vec<u32>) -> Self {
        Self {
            mat_id,
            element,
            conn,
        }
    }

    /// Number of cells in the group.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.conn.len() / self.element.vertex_count()
    }

    /// Vertices of cell `iel`, or `None` if out of range.
    #[must_use]
    pub fn cell(&self, iel: usize) -> Option<&[u32]> {
        let n_ep = self.element.vertex_count();
        self.conn.get(iel * n_ep..(iel + 1) * n_ep)
    }

    /// Iterate over the cells of the group.
    pub fn cells(&self) -> impl Iterator<Item = &[u32]> {
        self.conn.chunks_exact(self.element.vertex_count())
    }

    /// Sorted, deduplicated vertices used by the group.
    #[must_use]
    pub fn vertices(&self) -> Vec<u32> {
        let mut vertices = self.conn.clone();
        vertices.sort_unstable();
        vertices.dedup();
        vertices
    }
}

/// A finite-element mesh.
///
/// Vertices are numbered globally. Cells are numbered per group, and a global
/// cell index is the group-local index plus the group's cell offset (the
/// total cell count of all preceding groups).
///
/// Two-dimensional meshes keep `z = 0` in their coordinates.
///
/// # Example
///
/// ```
/// use mesh_types::{ElementGroup, GeometryElement, Mesh, MeshTopology, Point3};
///
/// let coors = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
/// ];
/// let mut mesh = Mesh::new("square", 2, coors).unwrap();
/// mesh.add_group(ElementGroup::new(1, GeometryElement::Triangle, vec![0, 1, 3, 0, 3, 2]))
///     .unwrap();
///
/// assert_eq!(mesh.vertex_count(), 4);
/// assert_eq!(mesh.cell_count(), 2);
/// ```
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Mesh {
    /// Mesh name.
    pub name: String,

    /// Spatial dimension (1, 2 or 3).
    pub dim: usize,

    /// Vertex coordinates.
    pub coors: Vec<Point3<f64>>,

    /// Per-vertex group tags.
    pub vertex_tags: Vec<i32>,

    /// Element groups in group-index order.
    pub groups: Vec<ElementGroup>,

    /// Named vertex sets (global vertex indices).
    pub vertex_sets: HashMap<String, Vec<u32>>,

    /// Named cell sets (global cell indices).
    pub cell_sets: HashMap<String, Vec<u32>>,
}

impl Mesh {
    /// Create a mesh without groups. All vertex tags start at zero.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidDimension`] if `dim` is not 1, 2 or 3.
    pub fn new(name: impl Into<String>, dim: usize, coors: Vec<Point3<f64>>) -> MeshResult<Self> {
        if !(1..=3).contains(&dim) {
            return Err(MeshError::InvalidDimension(dim));
        }
        Ok(Self {
            name: name.into(),
            dim,
            vertex_tags: vec![0; coors.len()],
            coors,
            groups: Vec::new(),
            vertex_sets: HashMap::new(),
            cell_sets: HashMap::new(),
        })
    }

    /// Append an element group and return its group index.
    ///
    /// # Errors
    ///
    /// Fails if the connectivity length is not a multiple of the element
    /// vertex count, references a vertex outside the mesh, or reuses the
    /// material id of an existing group.
    pub fn add_group(&mut self, group: ElementGroup) -> MeshResult<usize> {
        let ig = self.groups.len();
        let per_cell = group.element.vertex_count();
        if group.conn.len() % per_cell != 0 {
            return Err(MeshError::RaggedConnectivity {
                group: ig,
                len: group.conn.len(),
                per_cell,
            });
        }
        if let Some(&index) = group
            .conn
            .iter()
            .find(|&&v| v as usize >= self.coors.len())
        {
            return Err(MeshError::InvalidVertexIndex {
                group: ig,
                index,
                vertex_count: self.coors.len(),
            });
        }
        if self.groups.iter().any(|g| g.mat_id == group.mat_id) {
            return Err(MeshError::DuplicateMaterial(group.mat_id));
        }
        self.groups.push(group);
        Ok(ig)
    }

    /// Replace the per-vertex group tags.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::TagCountMismatch`] if the length differs from the
    /// vertex count.
    pub fn set_vertex_tags(&mut self, tags: Vec<i32>) -> MeshResult<()> {
        if tags.len() != self.coors.len() {
            return Err(MeshError::TagCountMismatch {
                len: tags.len(),
                vertex_count: self.coors.len(),
            });
        }
        self.vertex_tags = tags;
        Ok(())
    }

    /// Declare a named vertex set.
    pub fn add_vertex_set(&mut self, name: impl Into<String>, vertices: impl IntoIterator<Item = u32>) {
        self.vertex_sets
            .insert(name.into(), vertices.into_iter().collect());
    }

    /// Declare a named cell set of global cell indices.
    pub fn add_cell_set(&mut self, name: impl Into<String>, cells: impl IntoIterator<Item = u32>) {
        self.cell_sets.insert(name.into(), cells.into_iter().collect());
    }
}

impl MeshTopology for Mesh {
    fn dim(&self) -> usize {
        self.dim
    }

    fn vertex_count(&self) -> usize {
        self.coors.len()
    }

    fn coors(&self) -> &[Point3<f64>] {
        &self.coors
    }

    fn vertex_tags(&self) -> &[i32] {
        &self.vertex_tags
    }

    fn groups(&self) -> &[ElementGroup] {
        &self.groups
    }

    fn vertex_set(&self, name: &str) -> Option<&[u32]> {
        self.vertex_sets.get(name).map(Vec::as_slice)
    }

    fn cell_set(&self, name: &str) -> Option<&[u32]> {
        self.cell_sets.get(name).map(Vec::as_slice)
    }
}

impl MeshBounds for Mesh {
    fn bounds(&self) -> Aabb {
        Aabb::from_points(self.coors.iter())
    }
}

/// Structured quadrilateral mesh of the unit square.
///
/// Vertices are numbered row by row starting at the origin; the single group
/// has material id 1.
///
/// # Example
///
/// ```
/// use mesh_types::{unit_square, MeshTopology};
///
/// let mesh = unit_square(2, 2);
/// assert_eq!(mesh.vertex_count(), 9);
/// assert_eq!(mesh.cell_count(), 4);
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn unit_square(nx: usize, ny: usize) -> Mesh {
    let nx = nx.max(1);
    let ny = ny.max(1);
    let mut coors = Vec::with_capacity((nx + 1) * (ny + 1));
    for j in 0..=ny {
        for i in 0..=nx {
            coors.push(Point3::new(i as f64 / nx as f64, j as f64 / ny as f64, 0.0));
        }
    }

    let row = nx + 1;
    let mut conn = Vec::with_capacity(nx * ny * 4);
    for j in 0..ny {
        for i in 0..nx {
            let v0 = (j * row + i) as u32;
            let v1 = v0 + 1;
            let v3 = ((j + 1) * row + i) as u32;
            let v2 = v3 + 1;
            conn.extend_from_slice(&[v0, v1, v2, v3]);
        }
    }

    Mesh {
        name: "unit_square".to_string(),
        dim: 2,
        vertex_tags: vec![0; coors.len()],
        coors,
        groups: vec![ElementGroup::new(1, GeometryElement::Quadrilateral, conn)],
        vertex_sets: HashMap::new(),
        cell_sets: HashMap::new(),
    }
}

/// Structured hexahedral mesh of the unit cube with `n` cells per side.
///
/// # Example
///
/// ```
/// use mesh_types::{unit_cube, MeshTopology};
///
/// let cube = unit_cube(1);
/// assert_eq!(cube.vertex_count(), 8);
/// assert_eq!(cube.cell_count(), 1);
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn unit_cube(n: usize) -> Mesh {
    let n = n.max(1);
    let row = n + 1;
    let layer = row * row;
    let mut coors = Vec::with_capacity(layer * row);
    for k in 0..=n {
        for j in 0..=n {
            for i in 0..=n {
                coors.push(Point3::new(
                    i as f64 / n as f64,
                    j as f64 / n as f64,
                    k as f64 / n as f64,
                ));
            }
        }
    }

    let index = |i: usize, j: usize, k: usize| (k * layer + j * row + i) as u32;
    let mut conn = Vec::with_capacity(n * n * n * 8);
    for k in 0..n {
        for j in 0..n {
            for i in 0..n {
                conn.extend_from_slice(&[
                    index(i, j, k),
                    index(i + 1, j, k),
                    index(i + 1, j + 1, k),
                    index(i, j + 1, k),
                    index(i, j, k + 1),
                    index(i + 1, j, k + 1),
                    index(i + 1, j + 1, k + 1),
                    index(i, j + 1, k + 1),
                ]);
            }
        }
    }

    Mesh {
        name: "unit_cube".to_string(),
        dim: 3,
        vertex_tags: vec![0; coors.len()],
        coors,
        groups: vec![ElementGroup::new(1, GeometryElement::Hexahedron, conn)],
        vertex_sets: HashMap::new(),
        cell_sets: HashMap::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn two_triangles() -> Mesh {
        let coors = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        let mut mesh = Mesh::new("tri", 2, coors).unwrap_or_default();
        let _ = mesh.add_group(ElementGroup::new(
            0,
            GeometryElement::Triangle,
            vec![0, 1, 3, 0, 3, 2],
        ));
        mesh
    }

    #[test]
    fn test_group_cells() {
        let mesh = two_triangles();
        let group = &mesh.groups[0];
        assert_eq!(group.cell_count(), 2);
        assert_eq!(group.cell(1), Some(&[0, 3, 2][..]));
        assert_eq!(group.cell(2), None);
        assert_eq!(group.vertices(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_invalid_dimension() {
        assert!(matches!(
            Mesh::new("bad", 4, Vec::new()),
            Err(MeshError::InvalidDimension(4))
        ));
    }

    #[test]
    fn test_add_group_validation() {
        let mut mesh = two_triangles();
        let ragged = ElementGroup::new(5, GeometryElement::Triangle, vec![0, 1]);
        assert!(matches!(
            mesh.add_group(ragged),
            Err(MeshError::RaggedConnectivity { .. })
        ));

        let out_of_range = ElementGroup::new(5, GeometryElement::Triangle, vec![0, 1, 9]);
        assert!(matches!(
            mesh.add_group(out_of_range),
            Err(MeshError::InvalidVertexIndex { index: 9, .. })
        ));

        let duplicate = ElementGroup::new(0, GeometryElement::Triangle, vec![0, 1, 2]);
        assert!(matches!(
            mesh.add_group(duplicate),
            Err(MeshError::DuplicateMaterial(0))
        ));
    }

    #[test]
    fn test_vertex_tags_length_checked() {
        let mut mesh = two_triangles();
        assert!(mesh.set_vertex_tags(vec![1, 2]).is_err());
        assert!(mesh.set_vertex_tags(vec![1, 2, 2, 1]).is_ok());
        assert_eq!(mesh.vertex_tags(), &[1, 2, 2, 1]);
    }

    #[test]
    fn test_named_sets() {
        let mut mesh = two_triangles();
        mesh.add_vertex_set("corner", [0]);
        mesh.add_cell_set("upper", [1]);
        assert_eq!(mesh.vertex_set("corner"), Some(&[0][..]));
        assert_eq!(mesh.cell_set("upper"), Some(&[1][..]));
        assert_eq!(mesh.vertex_set("missing"), None);
    }

    #[test]
    fn test_unit_square_layout() {
        let mesh = unit_square(2, 1);
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.cell_count(), 2);
        assert_eq!(mesh.groups[0].cell(0), Some(&[0, 1, 4, 3][..]));
        assert_relative_eq!(mesh.coors[5].x, 1.0);
        assert_relative_eq!(mesh.coors[5].y, 1.0);
    }

    #[test]
    fn test_unit_cube_diameter() {
        let cube = unit_cube(2);
        assert_eq!(cube.vertex_count(), 27);
        assert_eq!(cube.cell_count(), 8);
        assert_relative_eq!(cube.diameter(), 1.0);
    }
}
