//! Common utilities shared by unit tests.
#![cfg(test)]

use nalgebra::{Point3, Vector3};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::aabb::{Aabb, Bounded};
use crate::bounding_hierarchy::{Hierarchy, NodeId};
use crate::bvh::KeyTree;
use crate::point_query::PointDistance;

/// A vector represented as a tuple
pub type TupleVec = (f64, f64, f64);

pub type TPoint3 = Point3<f64>;
pub type TVector3 = Vector3<f64>;
pub type TAabb3 = Aabb<f64, 3>;
pub type TKeyTree = KeyTree<f64, 3, TAabb3>;
pub type Triangle = crate::shapes::Triangle<f64>;

/// Generate a `TupleVec` for [`proptest::strategy::Strategy`] from -100 to 100.
/// Small enough that the absolute tolerances of the distance tests hold.
pub fn tuplevec_small_strategy() -> impl Strategy<Value = TupleVec> {
    (-100.0_f64..100.0, -100.0_f64..100.0, -100.0_f64..100.0)
}

/// Convert a `TupleVec` to a [`TPoint3`].
pub fn tuple_to_point(tpl: &TupleVec) -> TPoint3 {
    TPoint3::new(tpl.0, tpl.1, tpl.2)
}

/// Creates `count` small triangles scattered over the cube `[-50, 50]³`. Every corner
/// lies within one unit of the triangle's anchor.
pub fn random_triangles(count: usize, seed: u64) -> Vec<Triangle> {
    let mut rng = StdRng::seed_from_u64(seed);
    let offset = |rng: &mut StdRng| {
        TVector3::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
        )
    };
    (0..count)
        .map(|_| {
            let anchor = TPoint3::new(
                rng.random_range(-50.0..50.0),
                rng.random_range(-50.0..50.0),
                rng.random_range(-50.0..50.0),
            );
            Triangle::new(anchor, anchor + offset(&mut rng), anchor + offset(&mut rng))
        })
        .collect()
}

/// Moves every triangle along the x axis.
pub fn translated(triangles: &[Triangle], dx: f64) -> Vec<Triangle> {
    let shift = TVector3::new(dx, 0.0, 0.0);
    triangles
        .iter()
        .map(|t| Triangle::new(t.a + shift, t.b + shift, t.c + shift))
        .collect()
}

/// Two unit squares in the `z = 0` plane, two triangles each. The right square shares
/// the left square's edge at `x = 1` but is shifted up by half a unit, so that only left
/// triangle 1 and right triangle 0 touch, along that edge.
pub fn unit_square_meshes() -> (Vec<Triangle>, Vec<Triangle>) {
    let p = TPoint3::new;
    let left = vec![
        Triangle::new(p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)),
        Triangle::new(p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0), p(0.0, 1.0, 0.0)),
    ];
    let right = vec![
        Triangle::new(p(1.0, 0.5, 0.0), p(2.0, 0.5, 0.0), p(1.0, 1.5, 0.0)),
        Triangle::new(p(2.0, 0.5, 0.0), p(2.0, 1.5, 0.0), p(1.0, 1.5, 0.0)),
    ];
    (left, right)
}

/// All intersecting pairs by exhaustive testing, in lexicographic order.
pub fn brute_force_pairs(left: &[Triangle], right: &[Triangle]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for (i, a) in left.iter().enumerate() {
        for (j, b) in right.iter().enumerate() {
            if a.intersects_triangle(b) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// The closest triangle to `point` and its distance by linear scan.
pub fn brute_force_nearest(triangles: &[Triangle], point: &TPoint3) -> (usize, f64) {
    triangles
        .iter()
        .map(|t| t.distance_squared(*point).sqrt())
        .enumerate()
        .fold((0, f64::INFINITY), |best, (i, d)| if d < best.1 { (i, d) } else { best })
}

/// Returns true if the volume of every node in `ids` encloses the box of every
/// triangle in its range. Nodes are viewed in the order given.
pub fn volumes_enclose<H>(tree: &H, triangles: &[Triangle], mut ids: impl Iterator<Item = NodeId>) -> bool
where
    H: Hierarchy<f64, 3, Volume = TAabb3>,
{
    ids.all(|id| {
        let view = tree.node(id);
        view.range()
            .all(|slot| view.volume.approx_contains_aabb_eps(&triangles[tree.item(slot)].aabb(), 1e-9))
    })
}

/// Sorts a result vector so it can be compared against an ordered expectation.
pub fn sorted<T: Ord>(mut values: Vec<T>) -> Vec<T> {
    values.sort_unstable();
    values
}
