//! A mesh together with its named regions.

use mesh_types::{Aabb, DomainTopology, ElementGroup, MeshBounds, MeshTopology};
use nalgebra::Point3;
use tracing::{debug, info, warn};

use crate::error::{RegionError, RegionResult};
use crate::functions::Functions;
use crate::interpreter::visit_stack;
use crate::kind::EntityKind;
use crate::leaf::EvalContext;
use crate::parser::{parse, references, StackOp};
use crate::region::Region;
use crate::region_map::RegionMap;
use crate::resolve::{plan, RegionDef, RegionDefs, ResolveConfig};

/// A mesh, its derived topology, and the regions defined on it.
///
/// # Example
///
/// ```
/// use mesh_region::{Domain, Functions, RegionDef, RegionDefs};
/// use mesh_types::unit_square;
///
/// let mut domain = Domain::new("square", unit_square(2, 2));
///
/// let mut defs = RegionDefs::new();
/// defs.insert("Omega".into(), RegionDef::new("all"));
/// defs.insert("Left".into(), RegionDef::new("vertices in (x < 0.1)").with_kind(mesh_region::EntityKind::Facet));
/// domain.create_regions(&defs, &Functions::new()).unwrap();
///
/// let left = domain.region("Left").unwrap();
/// assert_eq!(left.shape().n_vertex, 3);
/// assert_eq!(left.shape().n_facet, 2);
/// ```
#[derive(Debug)]
pub struct Domain {
    name: String,
    mesh: Box<dyn MeshTopology>,
    topology: DomainTopology,
    regions: RegionMap,
}

impl Domain {
    /// Create a domain and derive the topology of its mesh.
    #[must_use]
    pub fn new(name: impl Into<String>, mesh: impl MeshTopology + 'static) -> Self {
        let topology = DomainTopology::from_mesh(&mesh);
        Self {
            name: name.into(),
            mesh: Box::new(mesh),
            topology,
            regions: RegionMap::new(),
        }
    }

    /// Domain name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The mesh.
    #[must_use]
    pub fn mesh(&self) -> &dyn MeshTopology {
        self.mesh.as_ref()
    }

    /// Derived topology.
    #[must_use]
    pub fn topology(&self) -> &DomainTopology {
        &self.topology
    }

    /// Materialized regions.
    #[must_use]
    pub fn regions(&self) -> &RegionMap {
        &self.regions
    }

    /// Look up a region.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::RegionNotFound`] for an unknown name.
    pub fn region(&self, name: &str) -> RegionResult<&Region> {
        self.regions.try_get(name)
    }

    /// Drop all regions.
    pub fn reset_regions(&mut self) {
        self.regions.clear();
    }

    /// Create one region from a selection text.
    ///
    /// References may only name regions that already exist. With
    /// `check_parent` the referenced regions and the parent, if given, are
    /// looked up before anything is evaluated.
    ///
    /// # Errors
    ///
    /// Any failure, wrapped in [`RegionError::InRegion`]. Nothing is
    /// registered on failure.
    pub fn create_region(
        &mut self,
        name: &str,
        select: &str,
        kind: EntityKind,
        parent: Option<&str>,
        check_parent: bool,
        functions: &Functions,
    ) -> RegionResult<&Region> {
        let region = self
            .single_region(name, select, kind, parent, check_parent, functions)
            .map_err(|err| err.in_region(name))?;
        self.regions
            .add_unique(region)
            .map_err(|err| err.in_region(name))?;
        self.region(name)
    }

    fn single_region(
        &self,
        name: &str,
        select: &str,
        kind: EntityKind,
        parent: Option<&str>,
        check_parent: bool,
        functions: &Functions,
    ) -> RegionResult<Region> {
        if self.regions.contains(name) {
            return Err(RegionError::DuplicateRegion {
                name: name.to_string(),
            });
        }
        let stack = parse(select)?;
        if check_parent {
            let missing = references(&stack)
                .into_iter()
                .chain(parent)
                .find(|name| !self.regions.contains(name));
            if let Some(name) = missing {
                return Err(RegionError::RegionNotFound {
                    name: name.to_string(),
                });
            }
        }
        let def = RegionDef {
            select: select.to_string(),
            kind,
            parent: parent.map(str::to_string),
        };
        self.build_region(name, &def, &stack, &self.regions, functions)
    }

    /// Create all regions of `defs` with the default [`ResolveConfig`].
    ///
    /// # Errors
    ///
    /// See [`Domain::create_regions_with`].
    pub fn create_regions(
        &mut self,
        defs: &RegionDefs,
        functions: &Functions,
    ) -> RegionResult<&RegionMap> {
        self.create_regions_with(defs, functions, &ResolveConfig::default())
    }

    /// Create all regions of `defs` in dependency order.
    ///
    /// The pass is staged: regions are built in a scratch collection that
    /// replaces the domain's regions only when every definition succeeded. On
    /// error the domain keeps the regions it had before the call. Without
    /// `reset_before_pass` existing regions stay visible, and a definition
    /// with the name of an existing region replaces it.
    ///
    /// # Errors
    ///
    /// Syntax, undefined-reference and cycle errors are reported before any
    /// region is evaluated; evaluation errors are wrapped in
    /// [`RegionError::InRegion`] with the failing region's name.
    pub fn create_regions_with(
        &mut self,
        defs: &RegionDefs,
        functions: &Functions,
        config: &ResolveConfig,
    ) -> RegionResult<&RegionMap> {
        info!(domain = %self.name, count = defs.len(), "creating regions");

        let mut scratch = if config.reset_before_pass {
            RegionMap::new()
        } else {
            self.regions.clone()
        };

        let plan = plan(defs, &scratch, config)?;
        for name in &plan.order {
            let (Some(def), Some(stack)) = (defs.get(name), plan.stacks.get(name)) else {
                return Err(RegionError::RegionNotFound { name: name.clone() });
            };
            let region = self
                .build_region(name, def, stack, &scratch, functions)
                .map_err(|err| err.in_region(name))?;
            scratch.replace(region);
        }

        self.regions = scratch;
        info!(domain = %self.name, count = self.regions.len(), "created regions");
        Ok(&self.regions)
    }

    fn build_region(
        &self,
        name: &str,
        def: &RegionDef,
        stack: &[StackOp],
        regions: &RegionMap,
        functions: &Functions,
    ) -> RegionResult<Region> {
        let ctx = EvalContext::new(self.mesh.as_ref(), &self.topology, regions, functions);
        let mut region = visit_stack(stack, &ctx)?;
        region.set_name(name);
        region.set_definition(def.select.clone());
        region.set_parent(def.parent.clone());
        region.set_kind(def.kind, &self.topology)?;

        let shape = region.shape();
        if region.is_empty() {
            warn!(region = name, select = %def.select, "region is empty");
        }
        debug!(
            region = name,
            kind = %region.kind(),
            n_vertex = shape.n_vertex,
            n_cell = shape.n_cell,
            n_facet = shape.n_facet,
            "materialized region"
        );
        Ok(region)
    }

    /// Global index of the first cell of every group.
    #[must_use]
    pub fn cell_offsets(&self) -> Vec<usize> {
        self.mesh.cell_offsets()
    }

    /// Centroids of all cells in global cell order.
    #[must_use]
    pub fn centroids(&self) -> Vec<Point3<f64>> {
        self.mesh.cell_centroids()
    }

    /// Bounding box of the mesh vertices, `None` without vertices.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Aabb> {
        self.bounds_opt()
    }

    /// Check if the domain has faces (a 3D mesh).
    #[must_use]
    pub fn has_faces(&self) -> bool {
        self.topology.has_faces()
    }

    /// Element groups of the mesh.
    #[must_use]
    pub fn groups(&self) -> &[ElementGroup] {
        self.mesh.groups()
    }
}

impl MeshBounds for Domain {
    fn bounds(&self) -> Aabb {
        Aabb::from_points(self.mesh.coors().iter())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_types::{unit_cube, unit_square};

    fn defs(items: &[(&str, &str, EntityKind)]) -> RegionDefs {
        items
            .iter()
            .map(|&(name, select, kind)| (name.to_string(), RegionDef::new(select).with_kind(kind)))
            .collect()
    }

    #[test]
    fn test_create_regions_in_dependency_order() {
        let mut domain = Domain::new("square", unit_square(2, 2));
        let defs = defs(&[
            ("Right", "r.Omega -v r.Left", EntityKind::Vertex),
            ("Left", "vertices in (x < 0.1)", EntityKind::Vertex),
            ("Omega", "all", EntityKind::Cell),
        ]);
        let regions = domain.create_regions(&defs, &Functions::new()).unwrap();
        assert_eq!(regions.names().collect::<Vec<_>>(), vec!["Left", "Omega", "Right"]);

        let right = domain.region("Right").unwrap();
        assert_eq!(right.shape().n_vertex, 6);
        assert_eq!(right.definition(), "r.Omega -v r.Left");
        assert_eq!(domain.region("Omega").unwrap().kind(), EntityKind::Cell);
    }

    #[test]
    fn test_failed_pass_keeps_previous_regions() {
        let mut domain = Domain::new("square", unit_square(1, 1));
        let functions = Functions::new();
        domain
            .create_regions(&defs(&[("Omega", "all", EntityKind::Cell)]), &functions)
            .unwrap();

        let bad = defs(&[
            ("A", "all", EntityKind::Vertex),
            ("B", "vertex 0 7", EntityKind::Vertex),
        ]);
        let err = domain.create_regions(&bad, &functions).unwrap_err();
        assert!(matches!(err, RegionError::InRegion { ref name, .. } if name == "B"));
        assert!(matches!(err.root(), RegionError::InvalidVertexIndex { index: 7, .. }));

        assert!(domain.region("Omega").is_ok());
        assert!(domain.region("A").is_err());
        assert!(domain.region("B").is_err());
    }

    #[test]
    fn test_pass_without_reset_sees_existing() {
        let mut domain = Domain::new("square", unit_square(1, 1));
        let functions = Functions::new();
        domain
            .create_regions(&defs(&[("Omega", "all", EntityKind::Cell)]), &functions)
            .unwrap();

        let config = ResolveConfig {
            reset_before_pass: false,
            ..ResolveConfig::default()
        };
        let more = defs(&[("Corner", "vertex in r.Omega", EntityKind::Vertex)]);
        domain.create_regions_with(&more, &functions, &config).unwrap();
        assert_eq!(domain.regions().len(), 2);
        assert_eq!(domain.region("Corner").unwrap().first_vertex(), Some(0));

        domain.create_regions(&more, &functions).unwrap_err();
        assert_eq!(domain.regions().len(), 2);
    }

    #[test]
    fn test_create_region() {
        let mut domain = Domain::new("square", unit_square(1, 1));
        let functions = Functions::new();
        domain
            .create_region("Omega", "all", EntityKind::Cell, None, true, &functions)
            .unwrap();
        let bottom = domain
            .create_region(
                "Bottom",
                "vertices in (y < 0.1)",
                EntityKind::Facet,
                Some("Omega"),
                true,
                &functions,
            )
            .unwrap();
        assert_eq!(bottom.parent(), Some("Omega"));
        assert_eq!(bottom.shape().n_facet, 1);

        let err = domain
            .create_region("Omega", "all", EntityKind::Cell, None, true, &functions)
            .unwrap_err();
        assert!(matches!(err.root(), RegionError::DuplicateRegion { .. }));

        let err = domain
            .create_region("Top", "all", EntityKind::Cell, Some("Nope"), true, &functions)
            .unwrap_err();
        assert!(matches!(err.root(), RegionError::RegionNotFound { .. }));
        assert!(domain
            .create_region("Top", "all", EntityKind::Cell, Some("Nope"), false, &functions)
            .is_ok());
    }

    #[test]
    fn test_create_region_checks_references_first() {
        let mut domain = Domain::new("square", unit_square(1, 1));
        let functions = Functions::new();

        // The bounds error of `vertex 9` would surface first if evaluation ran.
        let err = domain
            .create_region("A", "vertex 9 +v r.Ghost", EntityKind::Vertex, None, true, &functions)
            .unwrap_err();
        assert!(matches!(
            err.root(),
            RegionError::RegionNotFound { name } if name == "Ghost"
        ));

        let err = domain
            .create_region("A", "vertex 9 +v r.Ghost", EntityKind::Vertex, None, false, &functions)
            .unwrap_err();
        assert!(matches!(err.root(), RegionError::InvalidVertexIndex { index: 9, .. }));
        assert!(domain.regions().is_empty());
    }

    #[test]
    fn test_face_kind_needs_3d() {
        let mut domain = Domain::new("square", unit_square(1, 1));
        let functions = Functions::new();
        let err = domain
            .create_region("F", "all +f all", EntityKind::Face, None, true, &functions)
            .unwrap_err();
        assert!(matches!(err.root(), RegionError::Unsupported { .. }));
        let err = domain
            .create_region("F", "all", EntityKind::Face, None, true, &functions)
            .unwrap_err();
        assert!(matches!(err.root(), RegionError::Unsupported { .. }));
        assert!(domain.regions().is_empty());

        let mut cube = Domain::new("cube", unit_cube(1));
        assert!(cube.has_faces());
        let faces = cube
            .create_region("F", "vertices of surface", EntityKind::Face, None, true, &functions)
            .unwrap();
        assert_eq!(faces.shape().n_face, 6);
    }

    #[test]
    fn test_geometry_queries() {
        let domain = Domain::new("cube", unit_cube(2));
        assert_eq!(domain.cell_offsets(), vec![0]);
        assert_eq!(domain.centroids().len(), 8);
        assert_relative_eq!(domain.diameter(), 1.0);
        let bbox = domain.bounding_box().unwrap();
        assert_relative_eq!(bbox.center().x, 0.5);
        assert_eq!(domain.groups().len(), 1);
        assert_eq!(domain.name(), "cube");
    }
}
