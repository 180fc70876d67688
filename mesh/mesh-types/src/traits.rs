//! Traits for mesh types.

use std::fmt;

use crate::{Aabb, ElementGroup};
use nalgebra::{Point3, Vector3};

/// Read-only view of a grouped finite-element mesh.
///
/// This is the minimal interface region selection needs from a mesh. It is
/// object safe so that selection code can work through `&dyn MeshTopology`.
pub trait MeshTopology: fmt::Debug {
    /// Spatial dimension of the mesh.
    fn dim(&self) -> usize;

    /// Number of vertices (`n_nod`).
    fn vertex_count(&self) -> usize;

    /// Vertex coordinates, indexed by global vertex index.
    fn coors(&self) -> &[Point3<f64>];

    /// Per-vertex group tags.
    fn vertex_tags(&self) -> &[i32];

    /// Element groups in group-index order.
    fn groups(&self) -> &[ElementGroup];

    /// Look up a named vertex set.
    fn vertex_set(&self, name: &str) -> Option<&[u32]>;

    /// Look up a named cell set of global cell indices.
    fn cell_set(&self, name: &str) -> Option<&[u32]>;

    /// Number of element groups (`n_gr`).
    fn group_count(&self) -> usize {
        self.groups().len()
    }

    /// Total number of cells over all groups.
    fn cell_count(&self) -> usize {
        self.groups().iter().map(ElementGroup::cell_count).sum()
    }

    /// Check if the mesh has no vertices or no cells.
    fn is_empty(&self) -> bool {
        self.vertex_count() == 0 || self.cell_count() == 0
    }

    /// Global index of the first cell of every group.
    fn cell_offsets(&self) -> Vec<usize> {
        let mut offset = 0;
        self.groups()
            .iter()
            .map(|group| {
                let current = offset;
                offset += group.cell_count();
                current
            })
            .collect()
    }

    /// Group index of the group with the given material id.
    fn group_of_material(&self, mat_id: i32) -> Option<usize> {
        self.groups().iter().position(|g| g.mat_id == mat_id)
    }

    /// Convert a global cell index into `(group, local cell)`.
    fn locate_cell(&self, cell: usize) -> Option<(usize, usize)> {
        let mut offset = 0;
        for (ig, group) in self.groups().iter().enumerate() {
            let n_el = group.cell_count();
            if cell < offset + n_el {
                return Some((ig, cell - offset));
            }
            offset += n_el;
        }
        None
    }

    /// Cell centroids in global cell order.
    #[allow(clippy::cast_precision_loss)]
    fn cell_centroids(&self) -> Vec<Point3<f64>> {
        let coors = self.coors();
        self.groups()
            .iter()
            .flat_map(ElementGroup::cells)
            .map(|cell| {
                let sum = cell.iter().fold(Vector3::zeros(), |acc, &v| {
                    coors.get(v as usize).map_or(acc, |p| acc + p.coords)
                });
                Point3::from(sum / cell.len() as f64)
            })
            .collect()
    }
}

/// Trait for types that can compute a bounding box.
pub trait MeshBounds {
    /// Compute the axis-aligned bounding box.
    ///
    /// Returns an empty AABB if the mesh has no vertices.
    fn bounds(&self) -> Aabb;

    /// Compute the bounding box, returning `None` if empty.
    fn bounds_opt(&self) -> Option<Aabb> {
        let b = self.bounds();
        if b.is_empty() { None } else { Some(b) }
    }

    /// Largest side of the bounding box, the Friedrichs constant of the domain.
    fn diameter(&self) -> f64 {
        self.bounds_opt().map_or(0.0, |b| b.max_extent())
    }
}
