//! Error kinds for the skeletonization core (spec.md §7).
//!
//! `EmptyMask` is deliberately absent from this enum: an input mask with
//! no in-mask voxels is not a failure, it is a request whose answer is
//! the empty [`crate::tree::Skeleton`]. Everything else that can go
//! wrong is detected before any array is touched.

use crate::grid::Shape3;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SkeletonError {
  #[error("mask shape {mask:?} does not match dbf shape {dbf:?}")]
  ShapeMismatch { mask: Shape3, dbf: Shape3 },

  #[error("invalid option: {0}")]
  InvalidOption(String),

  #[error("non-finite distance field: {0}")]
  NonFinite(String),
}

pub type Result<T> = std::result::Result<T, SkeletonError>;
