//! Named mesh regions built from a set-algebra selection language.
//!
//! A region is a named subset of the vertices, edges, faces, facets or cells
//! of a grouped finite-element mesh. Regions are defined by short selection
//! texts such as `vertices in (x < 0.1)` or `r.Omega -s vertices of surface`,
//! may reference each other by name, and are materialized in dependency order.
//!
//! # Overview
//!
//! - [`Region`] - Per-group entity sets with kind tagging and set algebra
//! - [`parse`] - Selection text to a postfix [`StackOp`] stack
//! - [`EvalContext`] - Leaf evaluation against a mesh and existing regions
//! - [`visit_stack`] - Postfix interpreter producing one region
//! - [`plan`] - Parsing, reference checking and dependency ordering of definitions
//! - [`Domain`] - A mesh plus its [`RegionMap`], with staged creation passes
//!
//! # Selection language
//!
//! | text | selects |
//! |---|---|
//! | `all` | every vertex |
//! | `r.X`, `copy r.X` | region `X`, or an independent copy of it |
//! | `vertices in (<predicate>)` | vertices whose coordinates satisfy a predicate |
//! | `vertices in [i, j]`, `vertex i j` | listed vertices |
//! | `vertices of surface` | boundary facets |
//! | `vertices of group N` | vertices tagged `N` |
//! | `vertices of set S`, `cells of set S` | named mesh sets |
//! | `vertices by f`, `cells by f` | user [`Functions`] |
//! | `cells of group N` | all cells of the group with material id `N` |
//! | `cell i j`, `cell (ig, iel)` | listed cells, global or per group |
//! | `vertex in r.X` | the first vertex of region `X` |
//!
//! Two expressions combine with `+` (union), `-` (difference) or `*`
//! (intersection), followed by the kind the operation acts on: `v`, `e`,
//! `f`, `s` (facet) or `c`. A bare sign acts on vertices. `element(s)` is a
//! synonym of `cell(s)`.
//!
//! # Quick Start
//!
//! ```
//! use mesh_region::{Domain, EntityKind, Functions, RegionDef, RegionDefs};
//! use mesh_types::unit_square;
//!
//! let mut domain = Domain::new("square", unit_square(4, 4));
//!
//! let mut defs = RegionDefs::new();
//! defs.insert("Omega".into(), RegionDef::new("all"));
//! defs.insert(
//!     "Gamma".into(),
//!     RegionDef::new("vertices of surface").with_kind(EntityKind::Facet),
//! );
//! defs.insert(
//!     "Inner".into(),
//!     RegionDef::new("r.Omega -v r.Gamma").with_kind(EntityKind::Vertex),
//! );
//!
//! domain.create_regions(&defs, &Functions::new()).unwrap();
//!
//! assert_eq!(domain.region("Gamma").unwrap().shape().n_facet, 16);
//! assert_eq!(domain.region("Inner").unwrap().shape().n_vertex, 9);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod domain;
mod error;
mod functions;
mod interpreter;
mod kind;
mod leaf;
pub mod lexer;
mod parser;
mod predicate;
mod region;
mod region_map;
mod resolve;

pub use domain::Domain;
pub use error::{RegionError, RegionResult};
pub use functions::{Functions, SelectFn};
pub use interpreter::{eval_operator, visit_stack};
pub use kind::{EntityKind, SetOp, SetOperator};
pub use leaf::EvalContext;
pub use parser::{parse, references, Leaf, StackOp};
pub use predicate::{ArithOp, Axis, CmpOp, Expr, MathFn, Predicate};
pub use region::{GroupSets, Region, RegionShape};
pub use region_map::{RegionGroups, RegionMap};
pub use resolve::{dependency_levels, plan, RegionDef, RegionDefs, ResolveConfig, ResolvePlan};
