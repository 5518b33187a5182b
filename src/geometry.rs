//! Voxel-grid and physical-unit coordinate spaces.
//!
//! Mirrors the teacher's `PixelSpace`/`WorldSpace` phantom-unit pattern
//! (see `geometry::PixelSpace`/`WorldSpace` in the 2-D original), lifted
//! to three dimensions: [`VoxelSpace`] indexes into a [`crate::grid::Grid3`],
//! [`PhysicalSpace`] is the anisotropy-scaled metric space the TEASAR
//! cost functions actually reason about.

use euclid::{Point3D, Vector3D};

/// Discrete grid-index coordinate basis.
#[derive(Debug, Copy, Clone)]
pub struct VoxelSpace;
/// Anisotropy-scaled physical-unit coordinate basis.
#[derive(Debug, Copy, Clone)]
pub struct PhysicalSpace;

/// A voxel index `(x, y, z)`.
pub type Voxel = Point3D<u32, VoxelSpace>;
/// A displacement in physical units.
pub type Offset = Vector3D<f32, PhysicalSpace>;

/// Per-axis voxel spacing, in whatever physical unit the caller's `DBF` is
/// expressed in (spec.md §3).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Anisotropy {
  pub x: f32,
  pub y: f32,
  pub z: f32,
}

impl Anisotropy {
  pub const fn isotropic() -> Self {
    Self { x: 1.0, y: 1.0, z: 1.0 }
  }

  pub fn is_valid(&self) -> bool {
    [self.x, self.y, self.z].iter().all(|v| v.is_finite() && *v > 0.0)
  }

  /// Physical-unit length of a grid displacement `(dx, dy, dz)`.
  pub fn physical_length(&self, dx: i32, dy: i32, dz: i32) -> f32 {
    let v = Offset::new(dx as f32 * self.x, dy as f32 * self.y, dz as f32 * self.z);
    v.length()
  }

  /// Physical-unit Euclidean distance between two voxels.
  pub fn distance(&self, a: Voxel, b: Voxel) -> f32 {
    self.physical_length(
      a.x as i32 - b.x as i32,
      a.y as i32 - b.y as i32,
      a.z as i32 - b.z as i32,
    )
  }
}

impl Default for Anisotropy {
  fn default() -> Self {
    Self::isotropic()
  }
}

/// The 26 non-zero offsets in `{-1, 0, 1}^3` (spec.md §4.1).
pub fn neighbor_offsets() -> impl Iterator<Item = (i32, i32, i32)> {
  itertools::iproduct!(-1..=1, -1..=1, -1..=1).filter(|&(x, y, z)| (x, y, z) != (0, 0, 0))
}

/// Applies a signed offset to a voxel, returning `None` if it would
/// leave the non-negative index range (the grid's own bounds are
/// checked separately by `Grid3::contains`).
pub fn checked_add(v: Voxel, offset: (i32, i32, i32)) -> Option<Voxel> {
  let x = v.x as i32 + offset.0;
  let y = v.y as i32 + offset.1;
  let z = v.z as i32 + offset.2;
  if x < 0 || y < 0 || z < 0 {
    return None;
  }
  Some(Voxel::new(x as u32, y as u32, z as u32))
}
