//! Tree assembly: union extracted paths into a single vertex/edge list
//! (spec.md §4.5).
//!
//! Paths are consumed root-first (`skeletonize` reverses the tip-first
//! paths `path.rs` produces before calling in here). Shared prefixes
//! between paths collapse automatically because the adjacency map is
//! keyed on voxel coordinate and deduplicates `(parent, child)` pairs —
//! the same dedup-via-map trick as the original's `path_union`. The
//! traversal that turns the adjacency map into an edge list is an
//! explicit work-stack, not recursion, per spec.md §4.5 and §9: soma
//! trees commonly exceed 10k vertices.

use std::collections::HashMap;

use crate::geometry::Voxel;
use crate::grid::Grid3;

#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
  pub vertices: Vec<[f32; 3]>,
  pub edges: Vec<[u32; 2]>,
  pub radii: Vec<f32>,
}

impl Skeleton {
  pub fn empty() -> Self {
    Self { vertices: Vec::new(), edges: Vec::new(), radii: Vec::new() }
  }
}

type Key = (u32, u32, u32);

fn key(v: Voxel) -> Key {
  (v.x, v.y, v.z)
}

/// Assigns `v` a dense id on first sight, no-op if already interned.
fn intern(v: Voxel, id_of: &mut HashMap<Key, u32>, coords: &mut Vec<Voxel>) -> u32 {
  let k = key(v);
  *id_of.entry(k).or_insert_with(|| {
    coords.push(v);
    (coords.len() - 1) as u32
  })
}

/// Unions root-first `paths` into a single tree, reading radii from
/// `dbf`. Returns [`Skeleton::empty`] if `paths` is empty.
pub fn assemble(paths: &[Vec<Voxel>], dbf: &Grid3<f32>) -> Skeleton {
  let Some(first) = paths.iter().find(|p| !p.is_empty()) else {
    return Skeleton::empty();
  };
  let root = first[0];

  let mut children: HashMap<Key, Vec<Key>> = HashMap::new();
  let mut id_of: HashMap<Key, u32> = HashMap::new();
  let mut coords: Vec<Voxel> = Vec::new();

  for path in paths {
    for window in path.windows(2) {
      let (parent, child) = (window[0], window[1]);
      intern(parent, &mut id_of, &mut coords);
      intern(child, &mut id_of, &mut coords);
      let bucket = children.entry(key(parent)).or_default();
      if !bucket.contains(&key(child)) {
        bucket.push(key(child));
      }
      children.entry(key(child)).or_default();
    }
    if path.len() == 1 {
      intern(path[0], &mut id_of, &mut coords);
      children.entry(key(path[0])).or_default();
    }
  }

  let mut edges = Vec::new();
  let mut stack = vec![key(root)];
  let mut visited: HashMap<Key, bool> = HashMap::new();
  visited.insert(key(root), true);

  while let Some(parent_key) = stack.pop() {
    let parent_id = id_of[&parent_key];
    if let Some(kids) = children.get(&parent_key) {
      for &child_key in kids {
        if visited.insert(child_key, true).is_some() {
          continue;
        }
        let child_id = id_of[&child_key];
        edges.push([parent_id, child_id]);
        stack.push(child_key);
      }
    }
  }

  let vertices: Vec<[f32; 3]> = coords.iter().map(|v| [v.x as f32, v.y as f32, v.z as f32]).collect();
  let radii: Vec<f32> = coords.iter().map(|&v| *dbf.get(v)).collect();

  log::debug!("tree assembled: {} vertices, {} edges from {} paths", vertices.len(), edges.len(), paths.len());
  Skeleton { vertices, edges, radii }
}
