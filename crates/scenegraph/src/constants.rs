//! Default tunables for the spatial index and LOD nodes.

use std::time::Duration;

/// Items a leaf cell may hold before it splits.
pub const DEFAULT_MIN_NODES_BEFORE_SPLIT: usize = 4;

/// Cells deeper than this never get extended children.
pub const DEFAULT_MAX_LEVEL_FOR_EXTENDED_CELLS: u32 = 4;

/// Hard depth limit for subdivision (root = level 0).
pub const DEFAULT_MAX_DEPTH: u32 = 12;

/// How long prepared LOD content survives while inactive.
pub const DEFAULT_RETENTION_WINDOW: Duration = Duration::from_secs(60);

/// Standard children of a quad-tree cell.
pub const QUAD_CHILDREN: usize = 4;

/// Standard children of an oct-tree cell.
pub const OCT_CHILDREN: usize = 8;

/// Extended children of a quad-tree cell (2 split axes x 2 halves).
pub const QUAD_EXTENDED_CHILDREN: usize = 4;

/// Extended children of an oct-tree cell (3 split axes x 4 quarter rows).
pub const OCT_EXTENDED_CHILDREN: usize = 12;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_extended_counts_match_axes() {
    // Each split axis contributes 2^(axes-1) extended cells
    assert_eq!(QUAD_EXTENDED_CHILDREN, 2 * (QUAD_CHILDREN / 2));
    assert_eq!(OCT_EXTENDED_CHILDREN, 3 * (OCT_CHILDREN / 2));
  }

  #[test]
  fn test_defaults_are_usable() {
    assert!(DEFAULT_MIN_NODES_BEFORE_SPLIT >= 1);
    assert!(DEFAULT_MAX_LEVEL_FOR_EXTENDED_CELLS <= DEFAULT_MAX_DEPTH);
    assert_eq!(DEFAULT_RETENTION_WINDOW.as_secs(), 60);
  }
}
