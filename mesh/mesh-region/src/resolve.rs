//! Region definitions and dependency ordering.
//!
//! Every definition is parsed first; the names its stack reads (`r.X`,
//! `copy r.X`, `vertex in r.X`) are its dependencies. Names that are neither
//! pending nor already materialized are reported together before anything is
//! evaluated, then the pending definitions are ordered with Kahn's algorithm.

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{RegionError, RegionResult};
use crate::kind::EntityKind;
use crate::parser::{parse, references, StackOp};
use crate::region_map::RegionMap;

/// Definition of one region.
///
/// # Example
///
/// ```
/// use mesh_region::{EntityKind, RegionDef};
///
/// let def = RegionDef::new("vertices in (x < 0.1)")
///     .with_kind(EntityKind::Facet)
///     .with_parent("Omega");
/// assert_eq!(def.kind, EntityKind::Facet);
/// assert_eq!(RegionDef::new("all").kind, EntityKind::Cell);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegionDef {
    /// Selection text.
    pub select: String,
    /// Kind the region is converted to after evaluation.
    #[cfg_attr(feature = "serde", serde(default))]
    pub kind: EntityKind,
    /// Optional parent region name.
    #[cfg_attr(feature = "serde", serde(default))]
    pub parent: Option<String>,
}

impl RegionDef {
    /// Create a cell region definition.
    #[must_use]
    pub fn new(select: impl Into<String>) -> Self {
        Self {
            select: select.into(),
            kind: EntityKind::default(),
            parent: None,
        }
    }

    /// Set the kind.
    #[must_use]
    pub fn with_kind(mut self, kind: EntityKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the parent region.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

/// Region definitions by name, in declaration order.
pub type RegionDefs = IndexMap<String, RegionDef>;

/// Options of a resolution pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResolveConfig {
    /// Require parent names to be pending or materialized.
    pub check_parent_names: bool,
    /// Drop all existing regions before the pass.
    pub reset_before_pass: bool,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            check_parent_names: true,
            reset_before_pass: true,
        }
    }
}

/// Parsed definitions in evaluation order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvePlan {
    /// Names in evaluation order.
    pub order: Vec<String>,
    /// Postfix stack of every definition.
    pub stacks: IndexMap<String, Vec<StackOp>>,
}

/// Parse all definitions and order them by dependency.
///
/// `existing` holds the regions that are already materialized and stay
/// visible during the pass.
///
/// # Errors
///
/// - [`RegionError::InRegion`] wrapping the syntax error of a definition
/// - [`RegionError::UndefinedParents`] listing every dangling reference
/// - [`RegionError::DependencyCycle`] naming the regions that cannot be ordered
///
/// # Example
///
/// ```
/// use mesh_region::{plan, RegionDef, RegionDefs, RegionMap, ResolveConfig};
///
/// let mut defs = RegionDefs::new();
/// defs.insert("Right".into(), RegionDef::new("r.Omega -v r.Left"));
/// defs.insert("Left".into(), RegionDef::new("vertices in (x < 0.5)"));
/// defs.insert("Omega".into(), RegionDef::new("all"));
///
/// let plan = plan(&defs, &RegionMap::new(), &ResolveConfig::default()).unwrap();
/// assert_eq!(plan.order, vec!["Left", "Omega", "Right"]);
/// ```
pub fn plan(
    defs: &RegionDefs,
    existing: &RegionMap,
    config: &ResolveConfig,
) -> RegionResult<ResolvePlan> {
    let mut stacks = IndexMap::with_capacity(defs.len());
    for (name, def) in defs {
        let stack = parse(&def.select).map_err(|err| err.in_region(name))?;
        stacks.insert(name.clone(), stack);
    }

    let known = |name: &str| defs.contains_key(name) || existing.contains(name);
    let mut undefined = Vec::new();
    let mut deps: IndexMap<&str, Vec<&str>> = IndexMap::with_capacity(defs.len());
    for (name, stack) in &stacks {
        let refs = references(stack);
        undefined.extend(
            refs.iter()
                .filter(|r| !known(**r))
                .map(|r| format!("{name} -> {r}")),
        );
        if config.check_parent_names {
            if let Some(parent) = defs.get(name).and_then(|d| d.parent.as_deref()) {
                if !known(parent) {
                    undefined.push(format!("{name} -> {parent} (parent)"));
                }
            }
        }
        // A pending definition shadows a materialized region of the same name.
        deps.insert(
            name.as_str(),
            refs.into_iter().filter(|r| defs.contains_key(*r)).collect(),
        );
    }
    if !undefined.is_empty() {
        return Err(RegionError::UndefinedParents {
            references: undefined,
        });
    }

    let levels = dependency_levels(&deps).map_err(|regions| RegionError::DependencyCycle {
        regions: regions.into_iter().map(str::to_string).collect(),
    })?;
    let order: Vec<String> = levels.into_iter().flatten().map(str::to_string).collect();
    debug!(order = ?order, "resolved region order");

    Ok(ResolvePlan { order, stacks })
}

/// Group nodes into levels with Kahn's algorithm.
///
/// Every node comes after all of its dependencies; within a level nodes keep
/// the order of `deps`. Dependencies that are not keys of `deps` are ignored.
/// On a cycle, returns the nodes that could not be scheduled.
pub fn dependency_levels<'a>(
    deps: &IndexMap<&'a str, Vec<&'a str>>,
) -> Result<Vec<Vec<&'a str>>, Vec<&'a str>> {
    let mut in_degree: IndexMap<&str, usize> = deps.keys().map(|&name| (name, 0)).collect();
    let mut dependents: IndexMap<&str, Vec<&str>> = IndexMap::new();

    for (&name, node_deps) in deps {
        let unique: IndexSet<&str> = node_deps
            .iter()
            .copied()
            .filter(|dep| deps.contains_key(dep))
            .collect();
        if let Some(degree) = in_degree.get_mut(name) {
            *degree += unique.len();
        }
        for dep in unique {
            dependents.entry(dep).or_default().push(name);
        }
    }

    let mut levels = Vec::new();
    let mut current: Vec<&str> = in_degree
        .iter()
        .filter(|&(_, &degree)| degree == 0)
        .map(|(&name, _)| name)
        .collect();
    let mut processed = 0;

    while !current.is_empty() {
        current.sort_by_key(|name| deps.get_index_of(name));
        processed += current.len();

        let mut next = Vec::new();
        for name in &current {
            for &dependent in dependents.get(name).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        next.push(dependent);
                    }
                }
            }
        }
        levels.push(current);
        current = next;
    }

    if processed != deps.len() {
        return Err(in_degree
            .into_iter()
            .filter(|&(_, degree)| degree > 0)
            .map(|(name, _)| name)
            .collect());
    }
    Ok(levels)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::region::Region;

    fn region_defs(items: &[(&str, &str)]) -> RegionDefs {
        items
            .iter()
            .map(|&(name, select)| (name.to_string(), RegionDef::new(select)))
            .collect()
    }

    #[test]
    fn test_references_come_first() {
        let defs = region_defs(&[
            ("C", "r.B +v r.A"),
            ("B", "copy r.A"),
            ("A", "all"),
            ("D", "vertex in r.C"),
        ]);
        let plan = plan(&defs, &RegionMap::new(), &ResolveConfig::default()).unwrap();
        assert_eq!(plan.order, vec!["A", "B", "C", "D"]);
        assert_eq!(plan.stacks.len(), 4);
    }

    #[test]
    fn test_independent_keep_declaration_order() {
        let defs = region_defs(&[("Z", "all"), ("Y", "vertex 0"), ("X", "vertex 1")]);
        let plan = plan(&defs, &RegionMap::new(), &ResolveConfig::default()).unwrap();
        assert_eq!(plan.order, vec!["Z", "Y", "X"]);
    }

    #[test]
    fn test_cycle_detected() {
        let defs = region_defs(&[("A", "r.B"), ("B", "r.A +v vertex 0"), ("C", "all")]);
        let err = plan(&defs, &RegionMap::new(), &ResolveConfig::default()).unwrap_err();
        match err {
            RegionError::DependencyCycle { regions } => assert_eq!(regions, vec!["A", "B"]),
            other => panic!("unexpected error: {other}"),
        }

        let defs = region_defs(&[("Self", "r.Self")]);
        assert!(matches!(
            plan(&defs, &RegionMap::new(), &ResolveConfig::default()),
            Err(RegionError::DependencyCycle { .. })
        ));
    }

    #[test]
    fn test_undefined_reported_together() {
        let mut defs = region_defs(&[("A", "r.Missing"), ("B", "copy r.Gone +v r.A")]);
        defs.insert("C".to_string(), RegionDef::new("all").with_parent("Nobody"));

        let err = plan(&defs, &RegionMap::new(), &ResolveConfig::default()).unwrap_err();
        match err {
            RegionError::UndefinedParents { references } => assert_eq!(
                references,
                vec!["A -> Missing", "B -> Gone", "C -> Nobody (parent)"]
            ),
            other => panic!("unexpected error: {other}"),
        }

        let config = ResolveConfig {
            check_parent_names: false,
            ..ResolveConfig::default()
        };
        let err = plan(&defs, &RegionMap::new(), &config).unwrap_err();
        assert!(matches!(err, RegionError::UndefinedParents { ref references } if references.len() == 2));
    }

    #[test]
    fn test_existing_regions_satisfy_references() {
        let mut existing = RegionMap::new();
        existing.add_unique(Region::from_vertices("Omega", [0])).unwrap();
        let defs = region_defs(&[("A", "r.Omega")]);
        let plan = plan(&defs, &existing, &ResolveConfig::default()).unwrap();
        assert_eq!(plan.order, vec!["A"]);
    }

    #[test]
    fn test_syntax_error_names_region() {
        let defs = region_defs(&[("Good", "all"), ("Bad", "vertices of")]);
        let err = plan(&defs, &RegionMap::new(), &ResolveConfig::default()).unwrap_err();
        assert!(matches!(err, RegionError::InRegion { ref name, .. } if name == "Bad"));
        assert!(matches!(err.root(), RegionError::Syntax { .. }));
    }

    #[test]
    fn test_dependency_levels() {
        let mut deps: IndexMap<&str, Vec<&str>> = IndexMap::new();
        deps.insert("c", vec!["a", "b", "a"]);
        deps.insert("a", vec![]);
        deps.insert("b", vec!["a", "external"]);
        let levels = dependency_levels(&deps).unwrap();
        assert_eq!(levels, vec![vec!["a"], vec!["b"], vec!["c"]]);
    }
}
