//! Region definition.
//!
//! A [`Region`] is a named subset of mesh entities. One entity set, the one
//! matching the kind the region was built from, is authoritative; the sets of
//! the other kinds are derived from it through the [`DomainTopology`] by
//! [`Region::complete`] and are cleared whenever the authoritative set changes.
//!
//! Derivation rules:
//!
//! - vertices of cells, edges, faces or facets are their incident vertices;
//! - cells, edges, faces and facets of a vertex set are the *complete* ones,
//!   those with all vertices in the set;
//! - edges, faces and facets of a cell set are the entities of those cells;
//! - cells of an edge, face or facet set are the cells owning the entities.

use std::collections::{BTreeMap, BTreeSet};

use mesh_types::{DomainTopology, EntityTable, GroupTopology};

use crate::error::{RegionError, RegionResult};
use crate::kind::{EntityKind, SetOp, SetOperator};

/// Per-group entity sets, keyed by group index, in group-local numbering.
pub type GroupSets = BTreeMap<usize, BTreeSet<u32>>;

/// Entity counts of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegionShape {
    /// Number of vertices.
    pub n_vertex: usize,
    /// Number of edges over all groups.
    pub n_edge: usize,
    /// Number of faces over all groups.
    pub n_face: usize,
    /// Number of facets over all groups.
    pub n_facet: usize,
    /// Number of cells over all groups.
    pub n_cell: usize,
}

/// A named, typed subset of mesh entities.
///
/// # Example
///
/// ```
/// use mesh_region::{EntityKind, Region};
/// use mesh_types::{unit_square, DomainTopology};
///
/// let topology = DomainTopology::from_mesh(&unit_square(2, 1));
///
/// let mut left = Region::from_vertices("left", [0, 3]);
/// left.complete(&topology).unwrap();
/// assert_eq!(left.kind(), EntityKind::Vertex);
/// // The edge between vertices 0 and 3 is complete.
/// assert_eq!(left.shape().n_facet, 1);
/// assert!(left.cells().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    name: String,
    definition: String,
    kind: EntityKind,
    parent: Option<String>,

    /// Kind of the authoritative set.
    source: EntityKind,
    /// Whether the derived sets, `igs` and `shape` match the authoritative set.
    derived: bool,

    vertices: BTreeSet<u32>,
    edges: GroupSets,
    faces: GroupSets,
    facets: GroupSets,
    cells: GroupSets,

    igs: BTreeSet<usize>,
    shape: RegionShape,
}

impl Region {
    /// Create an empty vertex region.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definition: String::new(),
            kind: EntityKind::Vertex,
            parent: None,
            source: EntityKind::Vertex,
            derived: true,
            vertices: BTreeSet::new(),
            edges: GroupSets::new(),
            faces: GroupSets::new(),
            facets: GroupSets::new(),
            cells: GroupSets::new(),
            igs: BTreeSet::new(),
            shape: RegionShape::default(),
        }
    }

    /// Create a vertex region from global vertex indices.
    #[must_use]
    pub fn from_vertices(name: impl Into<String>, vertices: impl IntoIterator<Item = u32>) -> Self {
        let mut region = Self::new(name);
        region.set_vertices(vertices);
        region
    }

    /// Create a region of `kind` from per-group entity sets.
    ///
    /// For [`EntityKind::Vertex`] the group keys are ignored and all indices
    /// are taken as global vertex indices.
    #[must_use]
    pub fn from_entities(name: impl Into<String>, kind: EntityKind, sets: GroupSets) -> Self {
        let mut region = Self::new(name);
        region.set_entities(kind, sets);
        region
    }

    /// Region name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Original selection text.
    #[must_use]
    pub fn definition(&self) -> &str {
        &self.definition
    }

    /// Region kind.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Name of the parent region, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Rename the region.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Record the selection text the region was built from.
    pub fn set_definition(&mut self, definition: impl Into<String>) {
        self.definition = definition.into();
    }

    /// Set or clear the parent region name.
    pub fn set_parent(&mut self, parent: Option<String>) {
        self.parent = parent;
    }

    /// Replace the vertex set, making it authoritative.
    pub fn set_vertices(&mut self, vertices: impl IntoIterator<Item = u32>) {
        self.invalidate(EntityKind::Vertex);
        self.vertices = vertices.into_iter().collect();
    }

    /// Replace the cell set, making it authoritative.
    pub fn set_cells(&mut self, cells: GroupSets) {
        self.set_entities(EntityKind::Cell, cells);
    }

    /// Replace the set of `kind`, making it authoritative.
    pub fn set_entities(&mut self, kind: EntityKind, sets: GroupSets) {
        if kind == EntityKind::Vertex {
            self.set_vertices(sets.into_values().flatten());
            return;
        }
        self.invalidate(kind);
        let sets = sets.into_iter().filter(|(_, set)| !set.is_empty()).collect();
        *self.groups_mut(kind) = sets;
    }

    fn invalidate(&mut self, source: EntityKind) {
        self.source = source;
        self.kind = source;
        self.derived = false;
        self.vertices.clear();
        self.edges.clear();
        self.faces.clear();
        self.facets.clear();
        self.cells.clear();
        self.igs.clear();
        self.shape = RegionShape::default();
    }

    /// Check whether derived sets and shape are current.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.derived
    }

    /// Vertex indices.
    #[must_use]
    pub fn vertices(&self) -> &BTreeSet<u32> {
        &self.vertices
    }

    /// Cells per group.
    #[must_use]
    pub fn cells(&self) -> &GroupSets {
        &self.cells
    }

    /// Edges per group.
    #[must_use]
    pub fn edges(&self) -> &GroupSets {
        &self.edges
    }

    /// Faces per group.
    #[must_use]
    pub fn faces(&self) -> &GroupSets {
        &self.faces
    }

    /// Facets per group.
    #[must_use]
    pub fn facets(&self) -> &GroupSets {
        &self.facets
    }

    /// Per-group sets of a non-vertex kind.
    #[must_use]
    pub fn groups_of(&self, kind: EntityKind) -> &GroupSets {
        match kind {
            EntityKind::Edge => &self.edges,
            EntityKind::Face => &self.faces,
            EntityKind::Facet => &self.facets,
            EntityKind::Vertex | EntityKind::Cell => &self.cells,
        }
    }

    fn groups_mut(&mut self, kind: EntityKind) -> &mut GroupSets {
        match kind {
            EntityKind::Edge => &mut self.edges,
            EntityKind::Face => &mut self.faces,
            EntityKind::Facet => &mut self.facets,
            EntityKind::Vertex | EntityKind::Cell => &mut self.cells,
        }
    }

    /// Cells of group `ig`.
    #[must_use]
    pub fn cells_of_group(&self, ig: usize) -> Option<&BTreeSet<u32>> {
        self.cells.get(&ig)
    }

    /// Cells in global numbering.
    #[must_use]
    pub fn global_cells(&self, topology: &DomainTopology) -> Vec<u32> {
        let mut out = Vec::new();
        for (&ig, cells) in &self.cells {
            let Some(group) = topology.group(ig) else {
                continue;
            };
            let offset = u32::try_from(group.cell_offset).unwrap_or(u32::MAX);
            out.extend(cells.iter().map(|&iel| offset.saturating_add(iel)));
        }
        out
    }

    /// Vertices of the region used by group `ig`.
    #[must_use]
    pub fn vertices_of_group(&self, topology: &DomainTopology, ig: usize) -> Vec<u32> {
        topology.group(ig).map_or_else(Vec::new, |group| {
            self.vertices
                .iter()
                .copied()
                .filter(|&v| group.has_vertex(v))
                .collect()
        })
    }

    /// Smallest vertex index of the region.
    #[must_use]
    pub fn first_vertex(&self) -> Option<u32> {
        self.vertices.first().copied()
    }

    /// Groups the region touches.
    #[must_use]
    pub fn igs(&self) -> &BTreeSet<usize> {
        &self.igs
    }

    /// Entity counts, valid once the region is complete.
    #[must_use]
    pub fn shape(&self) -> RegionShape {
        self.shape
    }

    /// Check if the region has any cells.
    #[must_use]
    pub fn has_cells(&self) -> bool {
        !self.cells.is_empty()
    }

    /// Check if the region has no vertices and no entities of any kind.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
            && self.cells.is_empty()
            && self.facets.is_empty()
            && self.edges.is_empty()
            && self.faces.is_empty()
    }

    /// Check if the region contains every mesh vertex.
    #[must_use]
    pub fn is_whole_domain(&self, vertex_count: usize) -> bool {
        vertex_count > 0 && self.vertices.len() == vertex_count
    }

    /// Check if two regions hold the same entities, ignoring names.
    #[must_use]
    pub fn same_entities(&self, other: &Self) -> bool {
        self.vertices == other.vertices
            && self.edges == other.edges
            && self.faces == other.faces
            && self.facets == other.facets
            && self.cells == other.cells
    }

    /// Validate the authoritative set and derive all others.
    ///
    /// # Errors
    ///
    /// Returns an index error if the authoritative set references an entity
    /// outside the mesh.
    pub fn complete(&mut self, topology: &DomainTopology) -> RegionResult<()> {
        self.validate(topology)?;

        let source = self.source;
        if source != EntityKind::Vertex {
            self.vertices = self.incident_vertices(topology, source);
        }

        for kind in [EntityKind::Edge, EntityKind::Face, EntityKind::Facet] {
            if kind != source {
                let sets = self.derive_entities(topology, kind);
                *self.groups_mut(kind) = sets;
            }
        }
        if source != EntityKind::Cell {
            self.cells = self.derive_cells(topology);
        }

        self.igs = topology
            .groups()
            .iter()
            .filter(|group| self.vertices.iter().any(|&v| group.has_vertex(v)))
            .map(|group| group.ig)
            .collect();

        let count = |sets: &GroupSets| sets.values().map(BTreeSet::len).sum();
        self.shape = RegionShape {
            n_vertex: self.vertices.len(),
            n_edge: count(&self.edges),
            n_face: count(&self.faces),
            n_facet: count(&self.facets),
            n_cell: count(&self.cells),
        };
        self.derived = true;
        Ok(())
    }

    /// Convert the region to `kind`.
    ///
    /// The derived set of `kind` becomes authoritative and everything else is
    /// derived again from it.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::Unsupported`] for faces on a domain without
    /// faces, and propagates validation errors from [`Region::complete`].
    pub fn set_kind(&mut self, kind: EntityKind, topology: &DomainTopology) -> RegionResult<()> {
        if kind == EntityKind::Face && !topology.has_faces() {
            return Err(RegionError::Unsupported {
                token: kind.to_string(),
                reason: "the domain has no faces".to_string(),
            });
        }
        if !self.derived {
            self.complete(topology)?;
        }
        if kind == self.source {
            self.kind = kind;
            return Ok(());
        }

        if kind == EntityKind::Vertex {
            let vertices = std::mem::take(&mut self.vertices);
            self.set_vertices(vertices);
        } else {
            let sets = std::mem::take(self.groups_mut(kind));
            self.set_entities(kind, sets);
        }
        self.complete(topology)
    }

    /// Combine two regions with a set operator.
    ///
    /// The operation is applied to the sets of `operator.target` only, group
    /// by group; a group missing from one operand counts as empty. The result
    /// is a new complete region of the target kind.
    ///
    /// # Errors
    ///
    /// Fails if an operand is not complete, or if the target is faces and the
    /// domain has none.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_region::{EntityKind, Region, SetOp, SetOperator};
    /// use mesh_types::{unit_square, DomainTopology};
    ///
    /// let topology = DomainTopology::from_mesh(&unit_square(1, 1));
    /// let mut a = Region::from_vertices("a", [0, 1, 2]);
    /// let mut b = Region::from_vertices("b", [2, 3]);
    /// a.complete(&topology).unwrap();
    /// b.complete(&topology).unwrap();
    ///
    /// let op = SetOperator::new(SetOp::Subtract, EntityKind::Vertex);
    /// let diff = a.combine(&b, op, &topology).unwrap();
    /// assert_eq!(diff.vertices().iter().copied().collect::<Vec<_>>(), vec![0, 1]);
    /// ```
    pub fn combine(
        &self,
        other: &Self,
        operator: SetOperator,
        topology: &DomainTopology,
    ) -> RegionResult<Self> {
        let target = operator.target;
        if target == EntityKind::Face && !topology.has_faces() {
            return Err(RegionError::Unsupported {
                token: operator.to_string(),
                reason: "the domain has no faces".to_string(),
            });
        }
        for operand in [self, other] {
            if !operand.derived && operand.source != target {
                return Err(RegionError::MissingEntities {
                    name: operand.name.clone(),
                    kind: target,
                });
            }
        }

        let name = format!("{}{}{}", self.name, operator, other.name);
        let mut region = if target == EntityKind::Vertex {
            Self::from_vertices(name, apply(operator.op, &self.vertices, &other.vertices))
        } else {
            let left = self.groups_of(target);
            let right = other.groups_of(target);
            let empty = BTreeSet::new();
            let igs: BTreeSet<usize> = left.keys().chain(right.keys()).copied().collect();
            let sets = igs
                .into_iter()
                .map(|ig| {
                    let a = left.get(&ig).unwrap_or(&empty);
                    let b = right.get(&ig).unwrap_or(&empty);
                    (ig, apply(operator.op, a, b))
                })
                .collect();
            Self::from_entities(name, target, sets)
        };
        region.complete(topology)?;
        Ok(region)
    }

    fn validate(&self, topology: &DomainTopology) -> RegionResult<()> {
        if self.source == EntityKind::Vertex {
            let n_nod = topology.vertex_count();
            if let Some(&v) = self.vertices.iter().find(|&&v| v as usize >= n_nod) {
                return Err(RegionError::InvalidVertexIndex {
                    index: i64::from(v),
                    vertex_count: n_nod,
                });
            }
            return Ok(());
        }

        for (&ig, set) in self.groups_of(self.source) {
            let group = topology
                .group(ig)
                .ok_or_else(|| RegionError::InvalidGroupIndex {
                    index: i64::try_from(ig).unwrap_or(i64::MAX),
                    group_count: topology.groups().len(),
                })?;
            let count = match entity_table(group, self.source) {
                Some(table) => table.len(),
                None => group.cell_count(),
            };
            if let Some(&index) = set.iter().find(|&&i| i as usize >= count) {
                return Err(match self.source {
                    EntityKind::Cell | EntityKind::Vertex => RegionError::InvalidCellIndex {
                        index: i64::from(index),
                        cell_count: count,
                    },
                    kind => RegionError::InvalidEntityIndex {
                        kind,
                        group: ig,
                        index,
                        count,
                    },
                });
            }
        }
        Ok(())
    }

    fn incident_vertices(&self, topology: &DomainTopology, source: EntityKind) -> BTreeSet<u32> {
        let mut vertices = BTreeSet::new();
        for (&ig, set) in self.groups_of(source) {
            let Some(group) = topology.group(ig) else {
                continue;
            };
            for &id in set {
                let entity = match entity_table(group, source) {
                    Some(table) => table.vertices(id),
                    None => group.cell(id),
                };
                vertices.extend(entity.unwrap_or(&[]).iter().copied());
            }
        }
        vertices
    }

    fn derive_entities(&self, topology: &DomainTopology, kind: EntityKind) -> GroupSets {
        let mut out = GroupSets::new();
        for group in topology.groups() {
            let Some(table) = entity_table(group, kind) else {
                continue;
            };
            let set: BTreeSet<u32> = if self.source == EntityKind::Cell {
                self.cells
                    .get(&group.ig)
                    .into_iter()
                    .flatten()
                    .flat_map(|&iel| table.of_cell(iel).iter().copied())
                    .collect()
            } else {
                table
                    .iter()
                    .filter(|(_, vertices)| vertices.iter().all(|v| self.vertices.contains(v)))
                    .map(|(id, _)| id)
                    .collect()
            };
            if !set.is_empty() {
                out.insert(group.ig, set);
            }
        }
        out
    }

    fn derive_cells(&self, topology: &DomainTopology) -> GroupSets {
        let mut out = GroupSets::new();
        for group in topology.groups() {
            let set: BTreeSet<u32> = match entity_table(group, self.source) {
                Some(table) => self
                    .groups_of(self.source)
                    .get(&group.ig)
                    .into_iter()
                    .flatten()
                    .flat_map(|&id| table.owners(id).iter().copied())
                    .collect(),
                None => group
                    .cells()
                    .zip(0u32..)
                    .filter(|(cell, _)| cell.iter().all(|v| self.vertices.contains(v)))
                    .map(|(_, iel)| iel)
                    .collect(),
            };
            if !set.is_empty() {
                out.insert(group.ig, set);
            }
        }
        out
    }
}

fn entity_table(group: &GroupTopology, kind: EntityKind) -> Option<&EntityTable> {
    match kind {
        EntityKind::Edge => Some(group.edges()),
        EntityKind::Face => Some(group.faces()),
        EntityKind::Facet => Some(group.facets()),
        EntityKind::Vertex | EntityKind::Cell => None,
    }
}

fn apply(op: SetOp, a: &BTreeSet<u32>, b: &BTreeSet<u32>) -> BTreeSet<u32> {
    match op {
        SetOp::Subtract => a.difference(b).copied().collect(),
        SetOp::Add => a.union(b).copied().collect(),
        SetOp::Intersect => a.intersection(b).copied().collect(),
    }
}
