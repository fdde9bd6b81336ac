//! Pairwise intersection of two hierarchies.
//!
//! The traversal expands node pairs level by level: every pair of the current frontier
//! is tested for overlap and either discarded, handed to the exact test (two leaves)
//! or replaced by its child pairs in the next frontier.

use log::{debug, trace};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::bounding_hierarchy::{BHValue, Hierarchy, NodeId, PrimitiveId};
use crate::bounding_volume::BoundingVolume;
use crate::error::{BvhError, Result};
#[cfg(feature = "rayon")]
use crate::utils::concatenate_vectors;

/// Decides whether two primitives really intersect, after their leaf volumes were
/// found to overlap. The first argument indexes the primitives of the left tree.
pub trait ExactTest: Sync {
    /// Returns true if primitive `a` of the left tree intersects primitive `b` of the
    /// right tree.
    fn test(&self, a: PrimitiveId, b: PrimitiveId) -> bool;
}

impl<F: Fn(PrimitiveId, PrimitiveId) -> bool + Sync> ExactTest for F {
    fn test(&self, a: PrimitiveId, b: PrimitiveId) -> bool {
        self(a, b)
    }
}

/// How a [`PairwiseTraversal`] schedules its work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Schedule {
    /// Sort both trees completely, then expand every level on the calling thread.
    #[default]
    Serial,
    /// Expand on the calling thread, sorting lazy nodes only when a pair reaches them.
    Lazy,
    /// Sort both trees completely, then expand large levels on the rayon pool.
    Parallel,
    /// Expand large levels on the rayon pool, sorting lazy nodes on first use.
    ParallelLazy,
}

impl Schedule {
    /// Returns true for schedules that distribute levels over worker threads.
    pub fn is_parallel(self) -> bool {
        matches!(self, Schedule::Parallel | Schedule::ParallelLazy)
    }

    /// Returns true for schedules that leave node sorting to the traversal.
    pub fn is_lazy(self) -> bool {
        matches!(self, Schedule::Lazy | Schedule::ParallelLazy)
    }
}

/// Counters collected while traversing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TraversalStats {
    /// Number of frontier levels processed.
    pub levels: usize,
    /// Node pairs taken from a frontier.
    pub node_pairs: usize,
    /// Node pairs whose volumes overlapped.
    pub overlapping_pairs: usize,
    /// Overlapping pairs of two leaves.
    pub leaf_pairs: usize,
    /// Calls to the exact test.
    pub exact_tests: usize,
    /// Exact tests that reported an intersection.
    pub hits: usize,
}

impl TraversalStats {
    /// Adds the per-pair counters of `other`. Levels are counted by the driver.
    fn absorb(&mut self, other: &TraversalStats) {
        self.node_pairs += other.node_pairs;
        self.overlapping_pairs += other.overlapping_pairs;
        self.leaf_pairs += other.leaf_pairs;
        self.exact_tests += other.exact_tests;
        self.hits += other.hits;
    }
}

/// The outcome of a [`PairwiseTraversal`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairwiseResult {
    /// Intersecting `(left primitive, right primitive)` pairs, in no particular order.
    pub pairs: Vec<(PrimitiveId, PrimitiveId)>,
    /// Counters of the traversal.
    pub stats: TraversalStats,
}

/// Finds all intersecting primitive pairs of two hierarchies.
///
/// # Examples
/// ```
/// use pairwise_bvh::aabb::Aabb;
/// use pairwise_bvh::bvh::KeyTree;
/// use pairwise_bvh::traverse::{PairwiseTraversal, Schedule};
/// use nalgebra::Point3;
///
/// let unit = |x: f64| Aabb::with_bounds(Point3::new(x, 0.0, 0.0), Point3::new(x + 1.0, 1.0, 1.0));
/// let left: Vec<Aabb<f64, 3>> = (0..10).map(|i| unit(2.0 * i as f64)).collect();
/// let right = vec![unit(4.5)];
///
/// let a = KeyTree::from_shapes(&left, 2).unwrap();
/// let b = KeyTree::from_shapes(&right, 2).unwrap();
/// let result = PairwiseTraversal::new()
///     .schedule(Schedule::Parallel)
///     .run(&a, &b, &|i: usize, j: usize| left[i].overlaps(&right[j]))
///     .unwrap();
/// assert_eq!(result.pairs, vec![(2, 0)]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairwiseTraversal {
    schedule: Schedule,
    min_parallel_frontier: usize,
}

impl Default for PairwiseTraversal {
    fn default() -> Self {
        Self::new()
    }
}

/// What one worker produced while expanding part of a level.
#[derive(Debug, Default)]
struct Expansion {
    next: Vec<(NodeId, NodeId)>,
    pairs: Vec<(PrimitiveId, PrimitiveId)>,
    stats: TraversalStats,
}

impl PairwiseTraversal {
    /// A serial traversal that keeps levels below 64 pairs inline in parallel mode.
    pub fn new() -> Self {
        PairwiseTraversal {
            schedule: Schedule::Serial,
            min_parallel_frontier: 64,
        }
    }

    /// Sets the schedule.
    pub fn schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Levels with fewer pairs than this are expanded on the calling thread even by
    /// parallel schedules.
    pub fn min_parallel_frontier(mut self, min_parallel_frontier: usize) -> Self {
        self.min_parallel_frontier = min_parallel_frontier;
        self
    }

    /// Runs the traversal. Fails with [`BvhError::EmptyTree`] if either tree holds no
    /// primitives.
    pub fn run<T, const D: usize, A, B, X>(&self, a: &A, b: &B, test: &X) -> Result<PairwiseResult>
    where
        T: BHValue,
        A: Hierarchy<T, D>,
        B: Hierarchy<T, D, Volume = A::Volume>,
        X: ExactTest,
    {
        let (Some(root_a), Some(root_b)) = (a.root(), b.root()) else {
            return Err(BvhError::EmptyTree);
        };

        if !self.schedule.is_lazy() {
            a.materialize_all();
            b.materialize_all();
        }

        let parallel = self.schedule.is_parallel();
        #[cfg(not(feature = "rayon"))]
        {
            if parallel {
                log::warn!(
                    "{:?} traversal requested without the rayon feature, running on the calling thread",
                    self.schedule
                );
            }
        }

        let mut result = PairwiseResult::default();
        let mut frontier = vec![(root_a, root_b)];
        while !frontier.is_empty() {
            trace!("level {}: {} node pairs", result.stats.levels, frontier.len());
            let expansion = if parallel && frontier.len() >= self.min_parallel_frontier {
                expand_level_parallel(a, b, test, &frontier)
            } else {
                expand_level(a, b, test, &frontier)
            };
            result.stats.levels += 1;
            result.stats.absorb(&expansion.stats);
            result.pairs.extend(expansion.pairs);
            frontier = expansion.next;
        }

        debug!(
            "{:?} traversal finished after {} levels: {} node pairs, {} exact tests, {} hits",
            self.schedule,
            result.stats.levels,
            result.stats.node_pairs,
            result.stats.exact_tests,
            result.stats.hits
        );
        Ok(result)
    }
}

/// Returns all intersecting primitive pairs of `a` and `b` under `schedule`.
pub fn intersect<T, const D: usize, A, B, X>(
    a: &A,
    b: &B,
    test: &X,
    schedule: Schedule,
) -> Result<Vec<(PrimitiveId, PrimitiveId)>>
where
    T: BHValue,
    A: Hierarchy<T, D>,
    B: Hierarchy<T, D, Volume = A::Volume>,
    X: ExactTest,
{
    PairwiseTraversal::new()
        .schedule(schedule)
        .run(a, b, test)
        .map(|result| result.pairs)
}

fn expand_level<T, const D: usize, A, B, X>(
    a: &A,
    b: &B,
    test: &X,
    frontier: &[(NodeId, NodeId)],
) -> Expansion
where
    T: BHValue,
    A: Hierarchy<T, D>,
    B: Hierarchy<T, D, Volume = A::Volume>,
    X: ExactTest,
{
    let mut expansion = Expansion::default();
    for &pair in frontier {
        expand_pair(a, b, test, pair, &mut expansion);
    }
    expansion
}

fn expand_pair<T, const D: usize, A, B, X>(
    a: &A,
    b: &B,
    test: &X,
    (node_a, node_b): (NodeId, NodeId),
    out: &mut Expansion,
) where
    T: BHValue,
    A: Hierarchy<T, D>,
    B: Hierarchy<T, D, Volume = A::Volume>,
    X: ExactTest,
{
    out.stats.node_pairs += 1;
    let view_a = a.node(node_a);
    let view_b = b.node(node_b);
    if !view_a.volume.intersects(view_b.volume) {
        return;
    }
    out.stats.overlapping_pairs += 1;

    match (view_a.children, view_b.children) {
        (None, None) => {
            out.stats.leaf_pairs += 1;
            for slot_a in view_a.range() {
                let primitive_a = a.item(slot_a);
                for slot_b in view_b.range() {
                    let primitive_b = b.item(slot_b);
                    out.stats.exact_tests += 1;
                    if test.test(primitive_a, primitive_b) {
                        out.stats.hits += 1;
                        out.pairs.push((primitive_a, primitive_b));
                    }
                }
            }
        }
        (None, Some((left, right))) => {
            out.next.push((node_a, left));
            out.next.push((node_a, right));
        }
        (Some((left, right)), None) => {
            out.next.push((left, node_b));
            out.next.push((right, node_b));
        }
        (Some((left_a, right_a)), Some((left_b, right_b))) => {
            out.next.extend_from_slice(&[
                (left_a, left_b),
                (left_a, right_b),
                (right_a, left_b),
                (right_a, right_b),
            ]);
        }
    }
}

/// Expands a level on the rayon pool. Every worker folds into its own [`Expansion`];
/// the partial results are concatenated once the whole level is done.
#[cfg(feature = "rayon")]
fn expand_level_parallel<T, const D: usize, A, B, X>(
    a: &A,
    b: &B,
    test: &X,
    frontier: &[(NodeId, NodeId)],
) -> Expansion
where
    T: BHValue,
    A: Hierarchy<T, D>,
    B: Hierarchy<T, D, Volume = A::Volume>,
    X: ExactTest,
{
    let partials: Vec<Expansion> = frontier
        .par_iter()
        .fold(Expansion::default, |mut out, &pair| {
            expand_pair(a, b, test, pair, &mut out);
            out
        })
        .collect();

    let mut stats = TraversalStats::default();
    let mut nexts = Vec::with_capacity(partials.len());
    let mut pairs = Vec::with_capacity(partials.len());
    for partial in partials {
        stats.absorb(&partial.stats);
        nexts.push(partial.next);
        pairs.push(partial.pairs);
    }
    Expansion {
        next: concatenate_vectors(&mut nexts),
        pairs: concatenate_vectors(&mut pairs),
        stats,
    }
}

#[cfg(not(feature = "rayon"))]
fn expand_level_parallel<T, const D: usize, A, B, X>(
    a: &A,
    b: &B,
    test: &X,
    frontier: &[(NodeId, NodeId)],
) -> Expansion
where
    T: BHValue,
    A: Hierarchy<T, D>,
    B: Hierarchy<T, D, Volume = A::Volume>,
    X: ExactTest,
{
    expand_level(a, b, test, frontier)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{intersect, PairwiseTraversal, Schedule};
    use crate::bounding_hierarchy::Hierarchy;
    use crate::bvh::{AxisTree, CenterDivider, KeyTree};
    use crate::error::BvhError;
    use crate::testbase::{
        brute_force_pairs, random_triangles, sorted, translated, unit_square_meshes, TKeyTree,
        Triangle,
    };

    const SCHEDULES: [Schedule; 4] = [
        Schedule::Serial,
        Schedule::Lazy,
        Schedule::Parallel,
        Schedule::ParallelLazy,
    ];

    #[test]
    /// Two unit squares sharing an offset edge yield exactly one touching pair.
    fn test_unit_squares_single_pair() {
        let (left, right) = unit_square_meshes();
        let test = |i: usize, j: usize| left[i].intersects_triangle(&right[j]);
        for schedule in SCHEDULES {
            let a: TKeyTree = KeyTree::from_shapes(&left, 1).unwrap();
            let b: TKeyTree = KeyTree::from_shapes(&right, 1).unwrap();
            assert_eq!(intersect(&a, &b, &test, schedule).unwrap(), vec![(1, 0)]);

            let a = AxisTree::lazy(CenterDivider::new(&left), 1).unwrap();
            let b = AxisTree::lazy(CenterDivider::new(&right), 1).unwrap();
            assert_eq!(intersect(&a, &b, &test, schedule).unwrap(), vec![(1, 0)]);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]
        #[test]
        /// Every schedule on every tree kind agrees with the quadratic scan.
        fn test_schedules_match_brute_force(
            count_a in 1usize..120,
            count_b in 1usize..120,
            min_leaf_size in 1usize..6,
            seed: u64,
        ) {
            let left = random_triangles(count_a, seed);
            let right = random_triangles(count_b, seed.wrapping_add(1));
            let test = |i: usize, j: usize| left[i].intersects_triangle(&right[j]);
            let expected = brute_force_pairs(&left, &right);

            for schedule in SCHEDULES {
                let traversal = PairwiseTraversal::new()
                    .schedule(schedule)
                    .min_parallel_frontier(4);

                let a: TKeyTree = KeyTree::from_shapes(&left, min_leaf_size).unwrap();
                let b: TKeyTree = KeyTree::from_shapes(&right, min_leaf_size).unwrap();
                let result = traversal.run(&a, &b, &test).unwrap();
                prop_assert_eq!(sorted(result.pairs), expected.clone());

                let a = AxisTree::lazy(CenterDivider::new(&left), min_leaf_size).unwrap();
                let b = AxisTree::lazy(CenterDivider::new(&right), min_leaf_size).unwrap();
                let result = traversal.run(&a, &b, &test).unwrap();
                prop_assert_eq!(sorted(result.pairs), expected.clone());

                // Mixed tree kinds share the volume type.
                let a: TKeyTree = KeyTree::from_shapes(&left, min_leaf_size).unwrap();
                let result = traversal.run(&a, &b, &test).unwrap();
                prop_assert_eq!(sorted(result.pairs), expected.clone());
            }
        }
    }

    #[test]
    /// Lazy schedules leave the subtrees of disjoint trees unsorted.
    fn test_lazy_skips_disjoint_subtrees() {
        let left = random_triangles(100, 1);
        let right = translated(&random_triangles(100, 2), 1000.0);
        let test = |i: usize, j: usize| left[i].intersects_triangle(&right[j]);

        for schedule in [Schedule::Lazy, Schedule::ParallelLazy] {
            let a = AxisTree::lazy(CenterDivider::new(&left), 2).unwrap();
            let b = AxisTree::lazy(CenterDivider::new(&right), 2).unwrap();
            let result = PairwiseTraversal::new().schedule(schedule).run(&a, &b, &test).unwrap();
            assert!(result.pairs.is_empty());
            assert_eq!(result.stats.levels, 1);
            assert_eq!(a.sorted_count(), 1);
            assert_eq!(b.sorted_count(), 1);
        }

        let a = AxisTree::lazy(CenterDivider::new(&left), 2).unwrap();
        let b = AxisTree::lazy(CenterDivider::new(&right), 2).unwrap();
        intersect(&a, &b, &test, Schedule::Serial).unwrap();
        assert_eq!(a.sorted_count(), a.node_count());
    }

    #[test]
    /// A self-intersection touches every triangle with itself.
    fn test_parallel_lazy_self_intersection() {
        let triangles = random_triangles(500, 3);
        let tree = AxisTree::lazy(CenterDivider::new(&triangles), 2).unwrap();
        let test = |i: usize, j: usize| i == j || triangles[i].intersects_triangle(&triangles[j]);
        let result = PairwiseTraversal::new()
            .schedule(Schedule::ParallelLazy)
            .min_parallel_frontier(1)
            .run(&tree, &tree, &test)
            .unwrap();
        let mut expected = Vec::new();
        for i in 0..triangles.len() {
            for j in 0..triangles.len() {
                if test(i, j) {
                    expected.push((i, j));
                }
            }
        }
        let pairs = sorted(result.pairs);
        assert!((0..triangles.len()).all(|i| pairs.binary_search(&(i, i)).is_ok()));
        assert_eq!(pairs, expected);
    }

    #[test]
    fn test_stats_are_consistent() {
        let left = random_triangles(200, 5);
        let right = random_triangles(150, 6);
        let test = |i: usize, j: usize| left[i].intersects_triangle(&right[j]);
        let a: TKeyTree = KeyTree::from_shapes(&left, 3).unwrap();
        let b: TKeyTree = KeyTree::from_shapes(&right, 3).unwrap();

        let serial = PairwiseTraversal::new().run(&a, &b, &test).unwrap();
        let parallel = PairwiseTraversal::new()
            .schedule(Schedule::Parallel)
            .min_parallel_frontier(1)
            .run(&a, &b, &test)
            .unwrap();
        assert_eq!(serial.stats, parallel.stats);

        let stats = serial.stats;
        assert_eq!(stats.hits, serial.pairs.len());
        assert!(stats.overlapping_pairs <= stats.node_pairs);
        assert!(stats.leaf_pairs <= stats.overlapping_pairs);
        assert!(stats.exact_tests >= stats.hits);
        assert!(stats.exact_tests <= stats.leaf_pairs * 9);
    }

    #[test]
    fn test_single_primitive_trees() {
        let (left, right) = unit_square_meshes();
        let a: TKeyTree = KeyTree::from_shapes(&left[1..], 1).unwrap();
        let b: TKeyTree = KeyTree::from_shapes(&right[..1], 1).unwrap();
        assert_eq!(a.node_count(), 1);

        let hit = intersect(&a, &b, &|_: usize, _: usize| true, Schedule::Serial).unwrap();
        assert_eq!(hit, vec![(0, 0)]);
        let miss = intersect(&a, &b, &|_: usize, _: usize| false, Schedule::Parallel).unwrap();
        assert!(miss.is_empty());
    }

    #[test]
    fn test_empty_tree() {
        let empty: Vec<Triangle> = Vec::new();
        let triangles = random_triangles(10, 7);
        let a: TKeyTree = KeyTree::from_shapes(&empty, 1).unwrap();
        let b: TKeyTree = KeyTree::from_shapes(&triangles, 1).unwrap();
        let test = |_: usize, _: usize| true;
        for schedule in SCHEDULES {
            assert_eq!(intersect(&a, &b, &test, schedule), Err(BvhError::EmptyTree));
            assert_eq!(intersect(&b, &a, &test, schedule), Err(BvhError::EmptyTree));
        }
    }
}
