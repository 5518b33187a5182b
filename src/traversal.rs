//! Priority-queue traversal engine (spec.md §4.1).
//!
//! Both public operations are the same best-first (Dijkstra-style)
//! expansion over the 26-connected in-mask graph, parameterized by an
//! edge-weight closure — exactly the "naturally expressed... as one
//! generic over a weight function" option spec.md §9 calls out. The
//! priority queue is a `std::collections::BinaryHeap`, the idiomatic
//! choice for single-pass Dijkstra without decrease-key; the teacher's
//! own priority ordering trick (`DistPoint`'s hand-rolled `total_cmp`
//! bit-twiddle in `geometry::mod::DistPoint`, written before
//! `f32::total_cmp` was stabilized) is kept in spirit but expressed with
//! the now-stable `f32::total_cmp`.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::geometry::{Anisotropy, Voxel};
use crate::grid::{Grid3, Mask};

#[derive(Debug, Clone, Copy)]
struct Entry {
  cost: f32,
  /// Monotonic push order, used to break cost ties deterministically
  /// (spec.md §4.1: "the tie-break rule must be the same across runs").
  seq: u64,
  voxel: Voxel,
}

impl PartialEq for Entry {
  fn eq(&self, other: &Self) -> bool {
    self.cost == other.cost && self.seq == other.seq
  }
}
impl Eq for Entry {}

impl PartialOrd for Entry {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Entry {
  // BinaryHeap is a max-heap; we want the lowest-cost entry popped first,
  // and among equal costs, the one pushed earliest.
  fn cmp(&self, other: &Self) -> Ordering {
    self.cost.total_cmp(&other.cost).reverse().then_with(|| self.seq.cmp(&other.seq).reverse())
  }
}

/// Runs a single best-first expansion from `source`, returning both the
/// settled cumulative cost and the predecessor of every reached voxel.
/// Unreachable in-mask voxels carry `f32::INFINITY` / `None`.
///
/// Precondition: `mask.is_set(source)`. This is an internal invariant —
/// every call site (the root selector, and `predecessor_field` below)
/// only ever passes an in-mask voxel — rather than spec.md §4.1's public
/// `EmptyMask` failure, which is handled once, before a root is even
/// chosen, by [`crate::skeletonize`].
fn traverse(mask: &Mask, source: Voxel, mut weight: impl FnMut(Voxel, Voxel) -> f32) -> (Grid3<f32>, Grid3<Option<Voxel>>) {
  debug_assert!(mask.is_set(source), "traversal source must be an in-mask voxel");

  let shape = mask.shape();
  let mut cost = Grid3::filled(shape, f32::INFINITY);
  let mut parent: Grid3<Option<Voxel>> = Grid3::filled(shape, None);
  let mut settled = Grid3::filled(shape, false);

  *cost.get_mut(source) = 0.0;
  *parent.get_mut(source) = Some(source);

  let mut heap = BinaryHeap::new();
  let mut seq: u64 = 0;
  heap.push(Entry { cost: 0.0, seq, voxel: source });

  while let Some(Entry { cost: u_cost, voxel: u, .. }) = heap.pop() {
    if *settled.get(u) {
      continue;
    }
    // Stale entry: a cheaper path to `u` settled it since this was pushed.
    if u_cost > *cost.get(u) {
      continue;
    }
    *settled.get_mut(u) = true;

    for v in mask.neighbors(u) {
      if *settled.get(v) {
        continue;
      }
      let w = weight(u, v);
      if !w.is_finite() {
        // Treat any +inf/NaN propagation as "do not relax" (spec.md §4.1).
        continue;
      }
      let candidate = u_cost + w;
      if candidate < *cost.get(v) {
        *cost.get_mut(v) = candidate;
        *parent.get_mut(v) = Some(u);
        seq += 1;
        heap.push(Entry { cost: candidate, seq, voxel: v });
      }
    }
  }

  log::trace!("traversal from {:?} settled {} voxels", source, settled.as_slice().iter().filter(|&&s| s).count());
  (cost, parent)
}

/// Euclidean-mode traversal: edge weight from `u` to `v` is the
/// anisotropy-scaled Euclidean length of `v - u`. Produces the
/// Distance-from-Any(root) Field (spec.md §3, §4.1).
pub fn euclidean_distance_field(mask: &Mask, source: Voxel, anisotropy: Anisotropy) -> Grid3<f32> {
  traverse(mask, source, |u, v| anisotropy.distance(u, v)).0
}

/// Field-mode traversal: edge weight entering `v` is `field[v]`,
/// independent of `u`. Produces the predecessor array used to chase
/// paths back to `source` (spec.md §3, §4.1).
pub fn predecessor_field(mask: &Mask, field: &Grid3<f32>, source: Voxel) -> Grid3<Option<Voxel>> {
  traverse(mask, source, |_u, v| *field.get(v)).1
}

#[cfg(test)]
mod tests {
  use super::*;

  fn line_mask(len: u32) -> Mask {
    let mut mask = Mask::filled((len, 1, 1), false);
    for x in 0..len {
      mask.set(Voxel::new(x, 0, 0), true);
    }
    mask
  }

  #[test]
  fn euclidean_distance_field_is_linear_along_a_rod() {
    let mask = line_mask(20);
    let daf = euclidean_distance_field(&mask, Voxel::new(0, 0, 0), Anisotropy::default());
    for x in 0..20 {
      assert_eq!(*daf.get(Voxel::new(x, 0, 0)), x as f32);
    }
  }

  #[test]
  fn anisotropy_scales_euclidean_distance() {
    let mask = line_mask(5);
    let daf = euclidean_distance_field(&mask, Voxel::new(0, 0, 0), Anisotropy { x: 2.0, y: 1.0, z: 1.0 });
    assert_eq!(*daf.get(Voxel::new(4, 0, 0)), 8.0);
  }

  #[test]
  fn unreachable_voxels_carry_infinity() {
    let mut mask = Mask::filled((5, 1, 1), false);
    mask.set(Voxel::new(0, 0, 0), true);
    mask.set(Voxel::new(4, 0, 0), true); // disconnected from voxel 0
    let daf = euclidean_distance_field(&mask, Voxel::new(0, 0, 0), Anisotropy::default());
    assert!(daf.get(Voxel::new(4, 0, 0)).is_infinite());
  }

  #[test]
  fn predecessor_field_self_loops_at_source() {
    let mask = line_mask(4);
    let field = Grid3::filled(mask.shape(), 1.0f32);
    let parents = predecessor_field(&mask, &field, Voxel::new(2, 0, 0));
    assert_eq!(*parents.get(Voxel::new(2, 0, 0)), Some(Voxel::new(2, 0, 0)));
  }

  #[test]
  fn predecessor_chain_reaches_root_without_cycles() {
    let mask = line_mask(10);
    let field = Grid3::filled(mask.shape(), 1.0f32);
    let root = Voxel::new(0, 0, 0);
    let parents = predecessor_field(&mask, &field, root);

    let mut v = Voxel::new(9, 0, 0);
    let mut steps = 0;
    while v != root {
      v = parents.get(v).expect("reachable voxel must have a parent");
      steps += 1;
      assert!(steps <= 10, "predecessor chase did not terminate");
    }
  }

  #[test]
  fn traversal_is_deterministic() {
    let mask = line_mask(30);
    let a = euclidean_distance_field(&mask, Voxel::new(0, 0, 0), Anisotropy::default());
    let b = euclidean_distance_field(&mask, Voxel::new(0, 0, 0), Anisotropy::default());
    assert_eq!(a.as_slice(), b.as_slice());
  }
}
