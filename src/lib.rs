//! TEASAR skeletonization core: turns a labeled voxel mask plus its
//! distance-to-boundary field into a centerline tree.
//!
//! This crate implements the algorithmic core only (Sato et al. 2000,
//! "TEASAR: tree-structure extraction algorithm for accurate and
//! robust skeletons") — traversal, root selection, the penalized
//! distance field, path extraction with rolling invalidation, and tree
//! assembly. The Euclidean distance transform and binary hole-filling
//! a full pipeline needs around it are external collaborators, taken
//! as plain closures by [`skeletonize`] rather than as a dependency on
//! any particular EDT implementation.
//!
//! ```no_run
//! use teasar_skeleton::{skeletonize, Mask, Grid3, Anisotropy, TeasarOptions};
//!
//! # fn example(mask: Mask, dbf: Grid3<f32>) -> teasar_skeleton::error::Result<()> {
//! let skeleton = skeletonize(
//!   mask,
//!   dbf,
//!   Anisotropy::isotropic(),
//!   TeasarOptions::default(),
//!   |m| m.clone(),                                   // no hole-filling available
//!   |_m, _a| unimplemented!("plug in an EDT crate"),  // soma mode only
//! )?;
//! println!("{} vertices, {} edges", skeleton.vertices.len(), skeleton.edges.len());
//! # Ok(())
//! # }
//! ```
//!
//! The crate never initializes a logger; it only emits
//! [`log`](https://docs.rs/log) records at phase boundaries, same as
//! any library built against the `log` facade — attach `env_logger` or
//! equivalent in the embedding application to see them.

pub mod error;
pub mod geometry;
pub mod grid;
pub mod options;
pub mod pdrf;
pub mod path;
pub mod root;
pub mod skeletonize;
pub mod traversal;
pub mod tree;

pub use error::SkeletonError;
pub use geometry::Anisotropy;
pub use grid::{Grid3, Mask, Shape3};
pub use options::TeasarOptions;
pub use skeletonize::skeletonize;
pub use tree::Skeleton;
