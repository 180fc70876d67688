//! Derived entity numbering of a grouped mesh.
//!
//! Edges, faces and facets are numbered per group: every distinct entity (by
//! its vertex set) of a group gets one index, shared by all cells of the group
//! that contain it. Surface facets are the facets of top-dimensional cells
//! that belong to exactly one cell of the whole mesh.

use hashbrown::HashMap;

use crate::{ElementGroup, GeometryElement, MeshTopology};

/// Distinct entities of one kind within a group.
#[derive(Debug, Clone, Default)]
pub struct EntityTable {
    /// Sorted vertices of every entity.
    entities: Vec<Vec<u32>>,
    /// Local entity `k` of cell `iel` is `cell_entities[iel * n_local + k]`.
    cell_entities: Vec<u32>,
    n_local: usize,
    /// Group-local cells containing every entity.
    owners: Vec<Vec<u32>>,
}

impl EntityTable {
    #[allow(clippy::cast_possible_truncation)]
    fn build(group: &ElementGroup, local: &[&[usize]]) -> Self {
        let mut index: HashMap<Vec<u32>, u32> = HashMap::new();
        let mut table = Self {
            n_local: local.len(),
            ..Self::default()
        };
        if local.is_empty() {
            return table;
        }

        for (iel, cell) in group.cells().enumerate() {
            for entity in local {
                let mut key: Vec<u32> = entity.iter().map(|&v| cell[v]).collect();
                key.sort_unstable();
                let next = table.entities.len() as u32;
                let id = *index.entry(key.clone()).or_insert_with(|| {
                    table.entities.push(key);
                    table.owners.push(Vec::new());
                    next
                });
                table.cell_entities.push(id);
                table.owners[id as usize].push(iel as u32);
            }
        }
        table
    }

    /// Number of distinct entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the table has no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Sorted vertices of an entity.
    #[must_use]
    pub fn vertices(&self, id: u32) -> Option<&[u32]> {
        self.entities.get(id as usize).map(Vec::as_slice)
    }

    /// Entities of cell `iel`, in local order.
    #[must_use]
    pub fn of_cell(&self, iel: u32) -> &[u32] {
        let start = iel as usize * self.n_local;
        self.cell_entities
            .get(start..start + self.n_local)
            .unwrap_or(&[])
    }

    /// Cells containing an entity.
    #[must_use]
    pub fn owners(&self, id: u32) -> &[u32] {
        self.owners.get(id as usize).map_or(&[], Vec::as_slice)
    }

    /// Iterate over `(entity id, sorted vertices)`.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[u32])> {
        self.entities
            .iter()
            .enumerate()
            .map(|(id, vertices)| (id as u32, vertices.as_slice()))
    }
}

/// Connectivity of one element group with derived entity tables.
#[derive(Debug, Clone)]
pub struct GroupTopology {
    /// Group index.
    pub ig: usize,
    /// Reference element of the group.
    pub element: GeometryElement,
    /// Global index of the first cell.
    pub cell_offset: usize,
    conn: Vec<u32>,
    vertices: Vec<u32>,
    edges: EntityTable,
    faces: EntityTable,
    facets: EntityTable,
}

impl GroupTopology {
    fn build(ig: usize, group: &ElementGroup, cell_offset: usize) -> Self {
        let gel = group.element;
        let edges: Vec<&[usize]> = gel.edges().iter().map(<[usize; 2]>::as_slice).collect();
        Self {
            ig,
            element: gel,
            cell_offset,
            conn: group.conn.clone(),
            vertices: group.vertices(),
            edges: EntityTable::build(group, &edges),
            faces: EntityTable::build(group, gel.faces()),
            facets: EntityTable::build(group, gel.facets()),
        }
    }

    /// Number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.conn.len() / self.element.vertex_count()
    }

    /// Vertices of cell `iel`.
    #[must_use]
    pub fn cell(&self, iel: u32) -> Option<&[u32]> {
        let n_ep = self.element.vertex_count();
        let start = iel as usize * n_ep;
        self.conn.get(start..start + n_ep)
    }

    /// Iterate over the cells of the group.
    pub fn cells(&self) -> impl Iterator<Item = &[u32]> {
        self.conn.chunks_exact(self.element.vertex_count())
    }

    /// Sorted vertices used by the group.
    #[must_use]
    pub fn vertices(&self) -> &[u32] {
        &self.vertices
    }

    /// Check whether the group uses a vertex.
    #[must_use]
    pub fn has_vertex(&self, vertex: u32) -> bool {
        self.vertices.binary_search(&vertex).is_ok()
    }

    /// Edge table.
    #[must_use]
    pub fn edges(&self) -> &EntityTable {
        &self.edges
    }

    /// Face table; empty below three dimensions.
    #[must_use]
    pub fn faces(&self) -> &EntityTable {
        &self.faces
    }

    /// Facet table.
    #[must_use]
    pub fn facets(&self) -> &EntityTable {
        &self.facets
    }
}

/// Derived topology of a whole mesh.
///
/// # Example
///
/// ```
/// use mesh_types::{unit_square, DomainTopology};
///
/// let topology = DomainTopology::from_mesh(&unit_square(2, 2));
/// let group = topology.group(0).unwrap();
/// assert_eq!(group.edges().len(), 12);
/// // Two boundary edges per side of the square.
/// assert_eq!(topology.surface_facets()[0].len(), 8);
/// ```
#[derive(Debug, Clone)]
pub struct DomainTopology {
    dim: usize,
    tdim: usize,
    vertex_count: usize,
    groups: Vec<GroupTopology>,
    surface: Vec<Vec<u32>>,
}

impl DomainTopology {
    /// Build entity tables and surface facets of a mesh.
    #[must_use]
    pub fn from_mesh(mesh: &dyn MeshTopology) -> Self {
        let offsets = mesh.cell_offsets();
        let groups: Vec<GroupTopology> = mesh
            .groups()
            .iter()
            .zip(offsets)
            .enumerate()
            .map(|(ig, (group, offset))| GroupTopology::build(ig, group, offset))
            .collect();
        let tdim = groups.iter().map(|g| g.element.dim()).max().unwrap_or(0);

        // Facets owned by exactly one top-dimensional cell lie on the surface.
        let surface = {
            let mut counts: HashMap<&[u32], usize> = HashMap::new();
            for group in groups.iter().filter(|g| g.element.dim() == tdim) {
                for (id, vertices) in group.facets.iter() {
                    *counts.entry(vertices).or_default() += group.facets.owners(id).len();
                }
            }
            groups
                .iter()
                .map(|group| {
                    if group.element.dim() != tdim {
                        return Vec::new();
                    }
                    group
                        .facets
                        .iter()
                        .filter(|(_, vertices)| counts.get(vertices) == Some(&1))
                        .map(|(id, _)| id)
                        .collect()
                })
                .collect()
        };

        Self {
            dim: mesh.dim(),
            tdim,
            vertex_count: mesh.vertex_count(),
            groups,
            surface,
        }
    }

    /// Spatial dimension.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Highest topological dimension among the groups.
    #[must_use]
    pub fn tdim(&self) -> usize {
        self.tdim
    }

    /// Number of mesh vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.groups.iter().map(GroupTopology::cell_count).sum()
    }

    /// Group topology by group index.
    #[must_use]
    pub fn group(&self, ig: usize) -> Option<&GroupTopology> {
        self.groups.get(ig)
    }

    /// All groups in group-index order.
    #[must_use]
    pub fn groups(&self) -> &[GroupTopology] {
        &self.groups
    }

    /// Check if any group has faces (a 3D mesh).
    #[must_use]
    pub fn has_faces(&self) -> bool {
        self.groups.iter().any(|g| !g.faces.is_empty())
    }

    /// Surface facet ids of every group, in group-index order.
    #[must_use]
    pub fn surface_facets(&self) -> &[Vec<u32>] {
        &self.surface
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{unit_cube, unit_square, Mesh};
    use nalgebra::Point3;

    #[test]
    fn test_shared_edges_numbered_once() {
        let topology = DomainTopology::from_mesh(&unit_square(2, 1));
        let group = &topology.groups()[0];
        // 2 quads: 4 + 4 - 1 shared edge.
        assert_eq!(group.edges().len(), 7);
        let shared: Vec<u32> = group
            .edges()
            .iter()
            .filter(|(id, _)| group.edges().owners(*id).len() == 2)
            .map(|(id, _)| id)
            .collect();
        assert_eq!(shared.len(), 1);
        assert_eq!(group.edges().vertices(shared[0]), Some(&[1, 4][..]));
        assert_eq!(group.edges().of_cell(0).len(), 4);
        assert!(group.faces().is_empty());
    }

    #[test]
    fn test_cube_surface() {
        let topology = DomainTopology::from_mesh(&unit_cube(2));
        assert_eq!(topology.tdim(), 3);
        assert!(topology.has_faces());
        // 6 sides with 4 quads each.
        assert_eq!(topology.surface_facets()[0].len(), 24);
        let group = topology.group(0).unwrap();
        assert_eq!(group.facets().len(), group.faces().len());
    }

    #[test]
    fn test_lower_dimensional_group_has_no_surface() {
        let mut mesh = unit_square(1, 1);
        mesh.add_group(ElementGroup::new(7, GeometryElement::Line, vec![0, 1]))
            .unwrap();
        let topology = DomainTopology::from_mesh(&mesh);
        assert_eq!(topology.surface_facets()[0].len(), 4);
        assert!(topology.surface_facets()[1].is_empty());
        assert_eq!(topology.groups()[1].cell_offset, 1);
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = Mesh::new("empty", 2, vec![Point3::origin()]).unwrap();
        let topology = DomainTopology::from_mesh(&mesh);
        assert_eq!(topology.cell_count(), 0);
        assert_eq!(topology.vertex_count(), 1);
        assert!(topology.surface_facets().is_empty());
    }
}
