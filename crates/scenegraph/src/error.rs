//! Error types.

use thiserror::Error;

use crate::node::NodeId;

/// Errors raised by scene graph mutations.
///
/// These are programmer errors: the call is rejected and the target
/// structure is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
  #[error("invalid LOD band: min distance {min} must be <= max distance {max}")]
  InvalidBand { min: f64, max: f64 },

  #[error(
    "LOD band [{min}, {max}] overlaps neighbouring band [{neighbor_min}, {neighbor_max}]"
  )]
  OverlappingBand {
    min: f64,
    max: f64,
    neighbor_min: f64,
    neighbor_max: f64,
  },

  #[error("LOD band [{min}, {max}] would move band {index} out of ascending order")]
  MisplacedBand { index: usize, min: f64, max: f64 },

  #[error("LOD band index {index} out of range (band count {len})")]
  BandIndexOutOfRange { index: usize, len: usize },

  #[error("node {0:?} is not present")]
  UnknownNode(NodeId),

  #[error("node {0:?} is already present")]
  DuplicateNode(NodeId),

  #[error("invalid configuration: {0}")]
  InvalidConfig(&'static str),
}

/// Failure reported by preparable content from a worker job.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrepareError {
  #[error("preparation failed: {0}")]
  Failed(String),

  #[error("worker job panicked: {0}")]
  Panicked(String),
}

pub type Result<T, E = SceneError> = std::result::Result<T, E>;
