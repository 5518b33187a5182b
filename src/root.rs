//! Root selection (spec.md §4.2).
//!
//! Two modes, exactly as the original: a "soma" object (large-radius,
//! roughly spherical) roots at its own center, everything else roots at
//! a geodesic extremal point reached from an arbitrary starting voxel.
//! Hole-filling and DBF recomputation are external collaborators taken
//! as closures, so this module stays a pure transformer over its
//! inputs (SPEC_FULL.md §4.2) rather than depending on an EDT crate
//! directly — the same arm's-length relationship the teacher keeps with
//! its own rasterizer backends in `solver::adf`.

use crate::geometry::{Anisotropy, Voxel};
use crate::grid::{Grid3, Mask};
use crate::traversal::euclidean_distance_field;

/// Outcome of root selection: either a concrete root voxel (carrying
/// along whatever mask/DBF it was resolved against, since soma mode
/// replaces both), or `Empty` when the input mask has no in-mask voxel
/// (spec.md §4.2's "no root" case).
pub enum RootSelection {
  Empty,
  Soma { root: Voxel, mask: Mask, dbf: Grid3<f32> },
  Ordinary { root: Voxel },
}

/// Resolves the root per spec.md §4.2.
///
/// `dbf_max` is the caller's already-computed `max(DBF)`; when it
/// exceeds `soma_detection_threshold` the object is treated as a soma:
/// holes are filled, the DBF is recomputed against the filled mask, and
/// the root is the voxel realizing the (recomputed) maximum DBF.
/// Otherwise the root is the DAF-maximizing voxel reached from the
/// lexicographically smallest in-mask voxel.
pub fn select_root(
  mask: &Mask,
  dbf_max: f32,
  soma_detection_threshold: f32,
  anisotropy: Anisotropy,
  mut fill_holes: impl FnMut(&Mask) -> Mask,
  mut recompute_dbf: impl FnMut(&Mask, Anisotropy) -> Grid3<f32>,
) -> RootSelection {
  let Some(v0) = mask.first_set() else {
    log::debug!("root selection: mask is empty");
    return RootSelection::Empty;
  };

  if dbf_max > soma_detection_threshold {
    let filled = fill_holes(mask);
    let dbf = recompute_dbf(&filled, anisotropy);
    let root = argmax(&dbf, &filled);
    log::debug!("root selection: soma mode, root={root:?}");
    return RootSelection::Soma { root, mask: filled, dbf };
  }

  let daf = euclidean_distance_field(mask, v0, anisotropy);
  let root = argmax(&daf, mask);
  log::debug!("root selection: ordinary mode, v0={v0:?}, root={root:?}");
  RootSelection::Ordinary { root }
}

/// The in-mask voxel maximizing `field`, breaking ties on row-major
/// storage order (the first maximizer encountered) for determinism.
fn argmax(field: &Grid3<f32>, mask: &Mask) -> Voxel {
  let mut best: Option<(Voxel, f32)> = None;
  for (v, &value) in field.iter() {
    if !mask.is_set(v) || !value.is_finite() {
      continue;
    }
    match best {
      Some((_, best_value)) if value <= best_value => {}
      _ => best = Some((v, value)),
    }
  }
  best.map(|(v, _)| v).expect("argmax called against a non-empty mask")
}
