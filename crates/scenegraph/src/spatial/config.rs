//! SpatialIndexConfig - world region, split convention and split thresholds.

use glam::DVec3;

use crate::bounds::DAabb3;
use crate::constants::{
  DEFAULT_MAX_DEPTH, DEFAULT_MAX_LEVEL_FOR_EXTENDED_CELLS, DEFAULT_MIN_NODES_BEFORE_SPLIT,
};
use crate::error::{Result, SceneError};

/// Plane a quad-tree subdivides in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Plane {
  XY,
  /// Ground plane for Y-up worlds.
  #[default]
  XZ,
  YZ,
}

/// How cells subdivide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SplitMode {
  /// 4 standard children, split along the two axes of the plane.
  Quad(Plane),
  /// 8 standard children, split along all three axes.
  Oct,
}

impl SplitMode {
  /// World axes (0 = x, 1 = y, 2 = z) that a split divides.
  pub fn split_axes(&self) -> &'static [usize] {
    match self {
      SplitMode::Quad(Plane::XY) => &[0, 1],
      SplitMode::Quad(Plane::XZ) => &[0, 2],
      SplitMode::Quad(Plane::YZ) => &[1, 2],
      SplitMode::Oct => &[0, 1, 2],
    }
  }
}

impl Default for SplitMode {
  fn default() -> Self {
    SplitMode::Quad(Plane::default())
  }
}

/// Configuration for a [`SpatialIndex`](super::SpatialIndex).
#[derive(Clone, Debug, PartialEq)]
pub struct SpatialIndexConfig {
  /// Region covered by the root cell. Items outside stay at the root.
  pub world_bounds: DAabb3,

  /// Quad-tree plane or oct-tree.
  pub split_mode: SplitMode,

  /// A leaf splits once it holds more than this many items.
  pub min_nodes_before_split: usize,

  /// Cells at this level or deeper never create extended children.
  /// 0 disables extended cells entirely.
  pub max_level_for_extended_cells: u32,

  /// Cells at this level never split.
  pub max_depth: u32,
}

impl SpatialIndexConfig {
  /// Default tuning over a 2 km cube centred on the origin.
  pub const DEFAULT: Self = Self {
    world_bounds: DAabb3 {
      min: DVec3::splat(-1024.0),
      max: DVec3::splat(1024.0),
    },
    split_mode: SplitMode::Quad(Plane::XZ),
    min_nodes_before_split: DEFAULT_MIN_NODES_BEFORE_SPLIT,
    max_level_for_extended_cells: DEFAULT_MAX_LEVEL_FOR_EXTENDED_CELLS,
    max_depth: DEFAULT_MAX_DEPTH,
  };

  /// Default tuning for the given world region.
  pub fn with_bounds(world_bounds: DAabb3) -> Self {
    Self {
      world_bounds,
      ..Self::DEFAULT
    }
  }

  /// Reject settings the index cannot honour.
  pub fn validate(&self) -> Result<()> {
    if self.min_nodes_before_split == 0 {
      return Err(SceneError::InvalidConfig("min_nodes_before_split must be >= 1"));
    }
    let size = self.world_bounds.size();
    if !(size.is_finite() && size.cmpge(DVec3::ZERO).all()) {
      return Err(SceneError::InvalidConfig("world_bounds must be finite with min <= max"));
    }
    Ok(())
  }
}

impl Default for SpatialIndexConfig {
  fn default() -> Self {
    Self::DEFAULT
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_config_is_valid() {
    let config = SpatialIndexConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.split_mode, SplitMode::Quad(Plane::XZ));
    assert_eq!(config.min_nodes_before_split, DEFAULT_MIN_NODES_BEFORE_SPLIT);
  }

  #[test]
  fn test_zero_split_threshold_rejected() {
    let config = SpatialIndexConfig {
      min_nodes_before_split: 0,
      ..Default::default()
    };
    assert_eq!(
      config.validate(),
      Err(SceneError::InvalidConfig("min_nodes_before_split must be >= 1"))
    );
  }

  #[test]
  fn test_inverted_world_rejected() {
    let config = SpatialIndexConfig {
      world_bounds: DAabb3 {
        min: DVec3::splat(1.0),
        max: DVec3::splat(-1.0),
      },
      ..Default::default()
    };
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_split_axes() {
    assert_eq!(SplitMode::Quad(Plane::XY).split_axes(), &[0, 1]);
    assert_eq!(SplitMode::Quad(Plane::XZ).split_axes(), &[0, 2]);
    assert_eq!(SplitMode::Quad(Plane::YZ).split_axes(), &[1, 2]);
    assert_eq!(SplitMode::Oct.split_axes(), &[0, 1, 2]);
  }
}
