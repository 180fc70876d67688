//! Leaf evaluation.
//!
//! Every leaf produces a complete region with one authoritative entity set.
//! Named references borrow the materialized region; every other leaf builds
//! a new one.

use std::borrow::Cow;

use mesh_types::{DomainTopology, MeshTopology};

use crate::error::{RegionError, RegionResult};
use crate::functions::Functions;
use crate::kind::EntityKind;
use crate::parser::Leaf;
use crate::region::{GroupSets, Region};
use crate::region_map::RegionMap;

/// Everything a leaf may read.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    /// The mesh.
    pub mesh: &'a dyn MeshTopology,
    /// Derived topology of `mesh`.
    pub topology: &'a DomainTopology,
    /// Regions visible to named references.
    pub regions: &'a RegionMap,
    /// User selection functions.
    pub functions: &'a Functions,
}

impl<'a> EvalContext<'a> {
    /// Create a context.
    #[must_use]
    pub fn new(
        mesh: &'a dyn MeshTopology,
        topology: &'a DomainTopology,
        regions: &'a RegionMap,
        functions: &'a Functions,
    ) -> Self {
        Self {
            mesh,
            topology,
            regions,
            functions,
        }
    }

    /// Evaluate a leaf.
    ///
    /// # Errors
    ///
    /// Fails on undefined names, out-of-range indices, predicate errors, and
    /// leaves the domain cannot provide.
    pub fn eval_leaf(&self, leaf: &Leaf) -> RegionResult<Cow<'a, Region>> {
        let regions: &'a RegionMap = self.regions;
        let mut region = match leaf {
            Leaf::RegionRef(name) => return Ok(Cow::Borrowed(regions.try_get(name)?)),
            Leaf::RegionCopy(name) => {
                let mut copy = regions.try_get(name)?.clone();
                if !copy.is_complete() {
                    copy.complete(self.topology)?;
                }
                return Ok(Cow::Owned(copy));
            }
            Leaf::All => Region::from_vertices(leaf.to_string(), 0..self.vertex_bound()),
            Leaf::Surface => self.surface(leaf)?,
            Leaf::VerticesIn(pred) => {
                let vertices = pred.select(self.mesh.coors(), self.mesh.dim())?;
                Region::from_vertices(leaf.to_string(), vertices)
            }
            Leaf::VerticesInList(list) | Leaf::Vertices(list) => {
                let vertices = self.check_vertices(list.iter().copied())?;
                Region::from_vertices(leaf.to_string(), vertices)
            }
            Leaf::VerticesBy(name) => {
                let function = self.functions.get(name)?;
                let selected = function(self.mesh.coors(), self.mesh);
                let vertices = self.check_vertices(selected.into_iter().map(i64::from))?;
                Region::from_vertices(leaf.to_string(), vertices)
            }
            Leaf::CellsBy(name) => {
                let function = self.functions.get(name)?;
                let centroids = self.mesh.cell_centroids();
                let selected = function(&centroids, self.mesh);
                let cells = self.global_cells(selected.into_iter().map(i64::from))?;
                Region::from_entities(leaf.to_string(), EntityKind::Cell, cells)
            }
            Leaf::CellsOfGroup(mat_id) => {
                let ig = i32::try_from(*mat_id)
                    .ok()
                    .and_then(|mat_id| self.mesh.group_of_material(mat_id))
                    .ok_or(RegionError::UndefinedGroup { mat_id: *mat_id })?;
                let n_cell = self.topology.group(ig).map_or(0, |g| g.cell_count());
                let mut cells = GroupSets::new();
                cells.insert(ig, (0..to_u32(n_cell)).collect());
                Region::from_entities(leaf.to_string(), EntityKind::Cell, cells)
            }
            Leaf::CellsOfSet(name) => {
                let set = self
                    .mesh
                    .cell_set(name)
                    .ok_or_else(|| RegionError::UndefinedCellSet { name: name.clone() })?;
                let cells = self.global_cells(set.iter().copied().map(i64::from))?;
                Region::from_entities(leaf.to_string(), EntityKind::Cell, cells)
            }
            Leaf::VerticesOfGroup(tag) => {
                let vertices = self
                    .mesh
                    .vertex_tags()
                    .iter()
                    .zip(0u32..)
                    .filter(|(t, _)| i64::from(**t) == *tag)
                    .map(|(_, v)| v);
                Region::from_vertices(leaf.to_string(), vertices)
            }
            Leaf::VerticesOfSet(name) => {
                let set = self
                    .mesh
                    .vertex_set(name)
                    .ok_or_else(|| RegionError::UndefinedVertexSet { name: name.clone() })?;
                let vertices = self.check_vertices(set.iter().copied().map(i64::from))?;
                Region::from_vertices(leaf.to_string(), vertices)
            }
            Leaf::VertexOfRegion(name) => {
                let vertex = regions.try_get(name)?.first_vertex().ok_or_else(|| {
                    RegionError::MissingEntities {
                        name: name.clone(),
                        kind: EntityKind::Vertex,
                    }
                })?;
                Region::from_vertices(leaf.to_string(), [vertex])
            }
            Leaf::Cells(list) => {
                let cells = self.global_cells(list.iter().copied())?;
                Region::from_entities(leaf.to_string(), EntityKind::Cell, cells)
            }
            Leaf::GroupCells(pairs) => {
                let mut cells = GroupSets::new();
                for &(ig, iel) in pairs {
                    let group = usize::try_from(ig)
                        .ok()
                        .and_then(|ig| self.topology.group(ig))
                        .ok_or(RegionError::InvalidGroupIndex {
                            index: ig,
                            group_count: self.topology.groups().len(),
                        })?;
                    let n_cell = group.cell_count();
                    let iel = u32::try_from(iel)
                        .ok()
                        .filter(|&iel| (iel as usize) < n_cell)
                        .ok_or(RegionError::InvalidCellIndex {
                            index: iel,
                            cell_count: n_cell,
                        })?;
                    cells.entry(group.ig).or_default().insert(iel);
                }
                Region::from_entities(leaf.to_string(), EntityKind::Cell, cells)
            }
        };
        region.complete(self.topology)?;
        Ok(Cow::Owned(region))
    }

    fn vertex_bound(&self) -> u32 {
        to_u32(self.mesh.vertex_count())
    }

    fn surface(&self, leaf: &Leaf) -> RegionResult<Region> {
        if self.topology.tdim() == 0 {
            return Err(RegionError::Unsupported {
                token: leaf.to_string(),
                reason: "the domain has no cells".to_string(),
            });
        }
        let facets = self
            .topology
            .surface_facets()
            .iter()
            .enumerate()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(ig, ids)| (ig, ids.iter().copied().collect()))
            .collect();
        Ok(Region::from_entities(leaf.to_string(), EntityKind::Facet, facets))
    }

    fn check_vertices(&self, indices: impl Iterator<Item = i64>) -> RegionResult<Vec<u32>> {
        let n_nod = self.mesh.vertex_count();
        indices
            .map(|index| {
                u32::try_from(index)
                    .ok()
                    .filter(|&v| (v as usize) < n_nod)
                    .ok_or(RegionError::InvalidVertexIndex {
                        index,
                        vertex_count: n_nod,
                    })
            })
            .collect()
    }

    fn global_cells(&self, indices: impl Iterator<Item = i64>) -> RegionResult<GroupSets> {
        let n_cell = self.topology.cell_count();
        let mut cells = GroupSets::new();
        for index in indices {
            let (ig, iel) = usize::try_from(index)
                .ok()
                .and_then(|cell| self.mesh.locate_cell(cell))
                .ok_or(RegionError::InvalidCellIndex {
                    index,
                    cell_count: n_cell,
                })?;
            cells.entry(ig).or_default().insert(to_u32(iel));
        }
        Ok(cells)
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
