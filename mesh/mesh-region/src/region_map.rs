//! Collection of named regions.
//!
//! A [`RegionMap`] keeps regions in insertion order, which is also the order
//! they were materialized in during a resolution pass.

use indexmap::IndexMap;
use mesh_types::MeshTopology;

use crate::error::{RegionError, RegionResult};
use crate::region::Region;

/// A collection of named regions for a domain.
///
/// # Example
///
/// ```
/// use mesh_region::{Region, RegionMap};
///
/// let mut regions = RegionMap::new();
/// regions.add_unique(Region::from_vertices("top", [4, 5, 6, 7])).unwrap();
/// regions.add_unique(Region::from_vertices("bottom", [0, 1, 2, 3])).unwrap();
///
/// assert_eq!(regions.len(), 2);
/// assert_eq!(regions.names().collect::<Vec<_>>(), vec!["top", "bottom"]);
/// assert!(regions.add_unique(Region::new("top")).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionMap {
    regions: IndexMap<String, Region>,
}

impl RegionMap {
    /// Create a new empty region map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a region, returning an error if the name is taken.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::DuplicateRegion`] if a region with the same name exists.
    pub fn add_unique(&mut self, region: Region) -> RegionResult<()> {
        if self.regions.contains_key(region.name()) {
            return Err(RegionError::DuplicateRegion {
                name: region.name().to_string(),
            });
        }
        self.regions.insert(region.name().to_string(), region);
        Ok(())
    }

    /// Insert or replace a region, keeping the position of a replaced one.
    ///
    /// Returns the previous region of that name.
    pub fn replace(&mut self, region: Region) -> Option<Region> {
        self.regions.insert(region.name().to_string(), region)
    }

    /// Get a region by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Region> {
        self.regions.get(name)
    }

    /// Get a region by name or fail.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::RegionNotFound`] if the name is unknown.
    pub fn try_get(&self, name: &str) -> RegionResult<&Region> {
        self.regions.get(name).ok_or_else(|| RegionError::RegionNotFound {
            name: name.to_string(),
        })
    }

    /// Remove a region by name, keeping the order of the others.
    pub fn remove(&mut self, name: &str) -> Option<Region> {
        self.regions.shift_remove(name)
    }

    /// Check if a region with the given name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.regions.contains_key(name)
    }

    /// Number of regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Check if the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Region names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }

    /// Iterate over `(name, region)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Region)> {
        self.regions.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Regions in insertion order.
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    /// Move every region of `other` into this map.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::DuplicateRegion`] on the first name clash; this
    /// map is left unchanged in that case.
    pub fn extend_unique(&mut self, other: Self) -> RegionResult<()> {
        if let Some(name) = other.names().find(|name| self.contains(name)) {
            return Err(RegionError::DuplicateRegion {
                name: name.to_string(),
            });
        }
        self.regions.extend(other.regions);
        Ok(())
    }

    /// Clear all regions.
    pub fn clear(&mut self) {
        self.regions.clear();
    }

    /// Mark regions by vertex and cell group ids.
    ///
    /// Regions are numbered in the order of `names` (all regions if `None`),
    /// except that the first region containing every mesh vertex is moved to
    /// the front and gets id 0. Every region overwrites the vertex group ids
    /// of its vertices; every (region, group) pair with cells gets the next
    /// cell group id. Overlapping regions are marked by the later one.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::RegionNotFound`] for an unknown name in `names`.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_region::{Region, RegionMap};
    /// use mesh_types::{unit_square, DomainTopology};
    ///
    /// let mesh = unit_square(1, 1);
    /// let topology = DomainTopology::from_mesh(&mesh);
    /// let mut corner = Region::from_vertices("corner", [0]);
    /// let mut all = Region::from_vertices("all", 0..4);
    /// corner.complete(&topology).unwrap();
    /// all.complete(&topology).unwrap();
    ///
    /// let mut regions = RegionMap::new();
    /// regions.add_unique(corner).unwrap();
    /// regions.add_unique(all).unwrap();
    ///
    /// let groups = regions.as_groups(&mesh, None).unwrap();
    /// assert_eq!(groups.order, vec!["all", "corner"]);
    /// assert_eq!(groups.vertex_groups, vec![1, 0, 0, 0]);
    /// ```
    pub fn as_groups(
        &self,
        mesh: &dyn MeshTopology,
        names: Option<&[&str]>,
    ) -> RegionResult<RegionGroups> {
        let mut order: Vec<&Region> = match names {
            Some(names) => names
                .iter()
                .map(|name| self.try_get(name))
                .collect::<RegionResult<_>>()?,
            None => self.regions.values().collect(),
        };

        let n_nod = mesh.vertex_count();
        if let Some(pos) = order.iter().position(|r| r.is_whole_domain(n_nod)) {
            let whole = order.remove(pos);
            order.insert(0, whole);
        }

        let mut out = RegionGroups {
            order: Vec::with_capacity(order.len()),
            vertex_groups: mesh.vertex_tags().to_vec(),
            cell_groups: mesh
                .groups()
                .iter()
                .map(|group| vec![group.mat_id; group.cell_count()])
                .collect(),
            masks: IndexMap::new(),
        };
        out.vertex_groups.resize(n_nod, 0);

        let mut c_ig = 0i32;
        for (n_ig, region) in (0i32..).zip(order) {
            let mut mask = vec![0.0; n_nod];
            for &v in region.vertices() {
                let v = v as usize;
                if let (Some(tag), Some(m)) = (out.vertex_groups.get_mut(v), mask.get_mut(v)) {
                    *tag = n_ig;
                    *m = 1.0;
                }
            }
            out.masks.insert(region.name().to_string(), mask);

            for (&ig, cells) in region.cells() {
                let Some(ids) = out.cell_groups.get_mut(ig) else {
                    continue;
                };
                for &iel in cells {
                    if let Some(id) = ids.get_mut(iel as usize) {
                        *id = c_ig;
                    }
                }
                c_ig += 1;
            }
            out.order.push(region.name().to_string());
        }
        Ok(out)
    }
}

/// Regions marked by group ids, see [`RegionMap::as_groups`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegionGroups {
    /// Region names in numbering order.
    pub order: Vec<String>,
    /// Vertex group id of every mesh vertex.
    pub vertex_groups: Vec<i32>,
    /// Cell group id of every cell, per element group.
    pub cell_groups: Vec<Vec<i32>>,
    /// Per-region vertex masks: 1.0 for region vertices, 0.0 elsewhere.
    pub masks: IndexMap<String, Vec<f64>>,
}

impl<'a> IntoIterator for &'a RegionMap {
    type Item = (&'a String, &'a Region);
    type IntoIter = indexmap::map::Iter<'a, String, Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.iter()
    }
}
