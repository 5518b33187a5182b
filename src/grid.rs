//! Dense 3-D array storage.
//!
//! The 3-D generalization of the teacher's `ZOrderStorage<Vec<T>>`
//! (`solver/argmax2d/z_order_storage.rs`): a single flat `Vec<T>`
//! addressed by a row-major index function. Chunking is dropped — it
//! existed there purely to let `rayon` rasterize independent screen
//! tiles of a 2-D SDF; here the grid itself is already the unit of
//! work and `rayon` operates directly on the flat buffer (see
//! `pdrf::compute_pdrf`).

use crate::geometry::Voxel;

/// Grid extents `(width, height, depth)`.
pub type Shape3 = (u32, u32, u32);

#[derive(Debug, Clone)]
pub struct Grid3<T> {
  data: Vec<T>,
  shape: Shape3,
}

impl<T> Grid3<T> {
  pub fn shape(&self) -> Shape3 {
    self.shape
  }

  pub fn len(&self) -> usize {
    self.data.len()
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  #[inline]
  pub fn contains(&self, v: Voxel) -> bool {
    v.x < self.shape.0 && v.y < self.shape.1 && v.z < self.shape.2
  }

  #[inline]
  pub fn index_of(&self, v: Voxel) -> usize {
    let (w, h, _d) = self.shape;
    (v.x as u64 + v.y as u64 * w as u64 + v.z as u64 * w as u64 * h as u64) as usize
  }

  #[inline]
  pub fn voxel_of(&self, index: usize) -> Voxel {
    let (w, h, _d) = self.shape;
    let (w, h) = (w as u64, h as u64);
    let index = index as u64;
    let z = index / (w * h);
    let rem = index % (w * h);
    let y = rem / w;
    let x = rem % w;
    Voxel::new(x as u32, y as u32, z as u32)
  }

  pub fn get(&self, v: Voxel) -> &T {
    &self.data[self.index_of(v)]
  }

  pub fn get_mut(&mut self, v: Voxel) -> &mut T {
    let idx = self.index_of(v);
    &mut self.data[idx]
  }

  pub fn try_get(&self, v: Voxel) -> Option<&T> {
    self.contains(v).then(|| self.get(v))
  }

  pub fn as_slice(&self) -> &[T] {
    &self.data
  }

  pub fn as_mut_slice(&mut self) -> &mut [T] {
    &mut self.data
  }

  pub fn voxels(&self) -> impl Iterator<Item = Voxel> + '_ {
    (0..self.data.len()).map(move |i| self.voxel_of(i))
  }

  pub fn iter(&self) -> impl Iterator<Item = (Voxel, &T)> + '_ {
    self.data.iter().enumerate().map(move |(i, value)| (self.voxel_of(i), value))
  }
}

impl<T: Clone> Grid3<T> {
  pub fn filled(shape: Shape3, value: T) -> Self {
    let (w, h, d) = shape;
    let len = w as usize * h as usize * d as usize;
    Self { data: vec![value; len], shape }
  }
}

impl<T> Grid3<T> {
  /// Builds a grid directly from a row-major buffer. Panics if `data.len()`
  /// does not match `shape`, same contract as `ndarray`'s `from_shape_vec`.
  pub fn from_vec(shape: Shape3, data: Vec<T>) -> Self {
    let (w, h, d) = shape;
    assert_eq!(data.len(), w as usize * h as usize * d as usize, "grid data does not match shape");
    Self { data, shape }
  }

  pub fn into_vec(self) -> Vec<T> {
    self.data
  }
}

/// Boolean object-membership grid (spec.md §3's `Mask`).
#[derive(Debug, Clone)]
pub struct Mask(Grid3<bool>);

impl Mask {
  pub fn filled(shape: Shape3, value: bool) -> Self {
    Self(Grid3::filled(shape, value))
  }

  pub fn from_vec(shape: Shape3, data: Vec<bool>) -> Self {
    Self(Grid3::from_vec(shape, data))
  }

  pub fn shape(&self) -> Shape3 {
    self.0.shape()
  }

  pub fn contains(&self, v: Voxel) -> bool {
    self.0.contains(v)
  }

  #[inline]
  pub fn is_set(&self, v: Voxel) -> bool {
    self.0.contains(v) && *self.0.get(v)
  }

  pub fn set(&mut self, v: Voxel, value: bool) {
    *self.0.get_mut(v) = value;
  }

  pub fn popcount(&self) -> usize {
    self.0.as_slice().iter().filter(|&&b| b).count()
  }

  pub fn voxels(&self) -> impl Iterator<Item = Voxel> + '_ {
    self.0.voxels()
  }

  /// In-mask voxels, in row-major storage order. Order here is only an
  /// implementation detail (used where any deterministic full sweep
  /// suffices, e.g. counting); it is *not* the lexicographic order spec.md
  /// §4.2 requires for root selection — use [`Mask::first_set`] for that.
  pub fn set_voxels(&self) -> impl Iterator<Item = Voxel> + '_ {
    self.0.iter().filter(|(_, &set)| set).map(|(v, _)| v)
  }

  /// The lexicographically smallest in-mask voxel `(x, y, z)` with `x`
  /// most significant, or `None` if the mask is empty. Row-major storage
  /// order varies `x` fastest within a fixed `(y, z)`, which is not the
  /// same order, so this walks the axes explicitly rather than reusing
  /// the flat iterator.
  pub fn first_set(&self) -> Option<Voxel> {
    let (w, h, d) = self.shape();
    for x in 0..w {
      for y in 0..h {
        for z in 0..d {
          let v = Voxel::new(x, y, z);
          if self.is_set(v) {
            return Some(v);
          }
        }
      }
    }
    None
  }

  /// In-mask 26-connected neighbors of `v`.
  pub fn neighbors(&self, v: Voxel) -> impl Iterator<Item = Voxel> + '_ {
    crate::geometry::neighbor_offsets().filter_map(move |offset| {
      crate::geometry::checked_add(v, offset).filter(|&n| self.is_set(n))
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn round_trips_index() {
    let grid = Grid3::<f32>::filled((4, 5, 6), 0.0);
    for v in grid.voxels() {
      assert_eq!(grid.voxel_of(grid.index_of(v)), v);
    }
  }

  #[test]
  fn mask_first_set_is_lexicographically_smallest() {
    let mut mask = Mask::filled((4, 4, 4), false);
    mask.set(Voxel::new(2, 1, 0), true);
    mask.set(Voxel::new(1, 3, 3), true);
    // x=1 sorts before x=2 regardless of y, z.
    assert_eq!(mask.first_set(), Some(Voxel::new(1, 3, 3)));
  }

  #[test]
  fn mask_neighbors_are_26_connected_and_in_mask() {
    let mut mask = Mask::filled((3, 3, 3), false);
    let center = Voxel::new(1, 1, 1);
    mask.set(center, true);
    mask.set(Voxel::new(0, 0, 0), true);
    mask.set(Voxel::new(2, 2, 2), true);
    let neighbors: Vec<_> = mask.neighbors(center).collect();
    assert_eq!(neighbors.len(), 2);
  }
}
