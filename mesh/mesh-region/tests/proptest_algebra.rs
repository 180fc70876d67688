//! Property-based tests for region set algebra.
//!
//! Random vertex and cell subsets of a small structured square are combined
//! with every operator and checked against the usual set laws.
//!
//! Run with: cargo test -p mesh-region -- proptest

// Allow test-specific patterns
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::{BTreeMap, BTreeSet};

use mesh_region::{EntityKind, Region, SetOp, SetOperator};
use mesh_types::{DomainTopology, unit_square};
use proptest::prelude::*;

/// 3x3 quads, 16 vertices.
fn topology() -> DomainTopology {
    DomainTopology::from_mesh(&unit_square(3, 3))
}

// =============================================================================
// Strategies
// =============================================================================

/// Generate a subset of the 16 vertices.
fn arb_vertices() -> impl Strategy<Value = BTreeSet<u32>> {
    prop::collection::btree_set(0u32..16, 0..=16)
}

/// Generate a subset of the 9 cells of group 0.
fn arb_cells() -> impl Strategy<Value = BTreeSet<u32>> {
    prop::collection::btree_set(0u32..9, 0..=9)
}

fn arb_op() -> impl Strategy<Value = SetOp> {
    prop_oneof![Just(SetOp::Add), Just(SetOp::Subtract), Just(SetOp::Intersect)]
}

fn vertex_region(name: &str, vertices: &BTreeSet<u32>, topology: &DomainTopology) -> Region {
    let mut region = Region::from_vertices(name, vertices.iter().copied());
    region.complete(topology).unwrap();
    region
}

fn cell_region(name: &str, cells: &BTreeSet<u32>, topology: &DomainTopology) -> Region {
    let sets = BTreeMap::from([(0, cells.clone())]);
    let mut region = Region::from_entities(name, EntityKind::Cell, sets);
    region.complete(topology).unwrap();
    region
}

fn cells_of(region: &Region) -> BTreeSet<u32> {
    region.cells_of_group(0).cloned().unwrap_or_default()
}

fn vertex_op(op: SetOp) -> SetOperator {
    SetOperator::new(op, EntityKind::Vertex)
}

fn cell_op(op: SetOp) -> SetOperator {
    SetOperator::new(op, EntityKind::Cell)
}

// =============================================================================
// Vertex algebra
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Vertex operators agree with the corresponding set operations.
    #[test]
    fn proptest_vertex_ops_match_sets(a in arb_vertices(), b in arb_vertices(), op in arb_op()) {
        let topology = topology();
        let ra = vertex_region("a", &a, &topology);
        let rb = vertex_region("b", &b, &topology);

        let result = ra.combine(&rb, vertex_op(op), &topology).unwrap();
        let expected: BTreeSet<u32> = match op {
            SetOp::Add => a.union(&b).copied().collect(),
            SetOp::Subtract => a.difference(&b).copied().collect(),
            SetOp::Intersect => a.intersection(&b).copied().collect(),
        };
        prop_assert_eq!(result.vertices(), &expected);
    }

    /// Union and intersection are commutative.
    #[test]
    fn proptest_vertex_commutative(a in arb_vertices(), b in arb_vertices()) {
        let topology = topology();
        let ra = vertex_region("a", &a, &topology);
        let rb = vertex_region("b", &b, &topology);

        for op in [SetOp::Add, SetOp::Intersect] {
            let ab = ra.combine(&rb, vertex_op(op), &topology).unwrap();
            let ba = rb.combine(&ra, vertex_op(op), &topology).unwrap();
            prop_assert!(ab.same_entities(&ba));
        }
    }

    /// Union and intersection are associative.
    #[test]
    fn proptest_vertex_associative(
        a in arb_vertices(),
        b in arb_vertices(),
        c in arb_vertices(),
    ) {
        let topology = topology();
        let ra = vertex_region("a", &a, &topology);
        let rb = vertex_region("b", &b, &topology);
        let rc = vertex_region("c", &c, &topology);

        for op in [SetOp::Add, SetOp::Intersect] {
            let op = vertex_op(op);
            let left = ra
                .combine(&rb, op, &topology)
                .unwrap()
                .combine(&rc, op, &topology)
                .unwrap();
            let right = ra
                .combine(&rb.combine(&rc, op, &topology).unwrap(), op, &topology)
                .unwrap();
            prop_assert_eq!(left.vertices(), right.vertices());
        }
    }

    /// A region combined with itself: union and intersection are idempotent,
    /// difference is empty.
    #[test]
    fn proptest_vertex_self_combination(a in arb_vertices()) {
        let topology = topology();
        let ra = vertex_region("a", &a, &topology);

        let union = ra.combine(&ra, vertex_op(SetOp::Add), &topology).unwrap();
        let meet = ra.combine(&ra, vertex_op(SetOp::Intersect), &topology).unwrap();
        let diff = ra.combine(&ra, vertex_op(SetOp::Subtract), &topology).unwrap();

        prop_assert_eq!(union.vertices(), &a);
        prop_assert_eq!(meet.vertices(), &a);
        prop_assert!(diff.is_empty());
    }

    /// Both differences are disjoint from the intersection and from each other.
    #[test]
    fn proptest_vertex_differences_disjoint(a in arb_vertices(), b in arb_vertices()) {
        let topology = topology();
        let ra = vertex_region("a", &a, &topology);
        let rb = vertex_region("b", &b, &topology);

        let a_b = ra.combine(&rb, vertex_op(SetOp::Subtract), &topology).unwrap();
        let b_a = rb.combine(&ra, vertex_op(SetOp::Subtract), &topology).unwrap();
        let meet = ra.combine(&rb, vertex_op(SetOp::Intersect), &topology).unwrap();

        prop_assert!(a_b.vertices().is_disjoint(b_a.vertices()));
        prop_assert!(a_b.vertices().is_disjoint(meet.vertices()));
        let total = a_b.vertices().len() + b_a.vertices().len() + meet.vertices().len();
        prop_assert_eq!(total, a.union(&b).count());
    }
}

// =============================================================================
// Cell algebra
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Cell operators agree with set operations on the per-group cell sets.
    #[test]
    fn proptest_cell_ops_match_sets(a in arb_cells(), b in arb_cells(), op in arb_op()) {
        let topology = topology();
        let ra = cell_region("a", &a, &topology);
        let rb = cell_region("b", &b, &topology);

        let result = ra.combine(&rb, cell_op(op), &topology).unwrap();
        let expected: BTreeSet<u32> = match op {
            SetOp::Add => a.union(&b).copied().collect(),
            SetOp::Subtract => a.difference(&b).copied().collect(),
            SetOp::Intersect => a.intersection(&b).copied().collect(),
        };
        prop_assert_eq!(cells_of(&result), expected);
        prop_assert_eq!(result.kind(), EntityKind::Cell);
    }

    /// Cell union is commutative and covers the vertices of both operands.
    #[test]
    fn proptest_cell_union(a in arb_cells(), b in arb_cells()) {
        let topology = topology();
        let ra = cell_region("a", &a, &topology);
        let rb = cell_region("b", &b, &topology);

        let ab = ra.combine(&rb, cell_op(SetOp::Add), &topology).unwrap();
        let ba = rb.combine(&ra, cell_op(SetOp::Add), &topology).unwrap();
        prop_assert!(ab.same_entities(&ba));

        let vertices: BTreeSet<u32> = ra.vertices().union(rb.vertices()).copied().collect();
        prop_assert_eq!(ab.vertices(), &vertices);
    }

    /// A cell region minus itself has no cells and no vertices.
    #[test]
    fn proptest_cell_self_difference(a in arb_cells()) {
        let topology = topology();
        let ra = cell_region("a", &a, &topology);
        let diff = ra.combine(&ra, cell_op(SetOp::Subtract), &topology).unwrap();
        prop_assert!(diff.is_empty());
        prop_assert!(!diff.has_cells());
    }
}
