//! Cell - a region of the spatial index, its items and its children.
//!
//! # Slot layout
//!
//! Standard child slots use one bit per split axis (bit k set = high half
//! along the k-th split axis), giving 4 quadrants or 8 octants.
//!
//! Extended child slots cover two standard slots that are adjacent along a
//! single split axis. Slot `k * 2^(n-1) + rest` spans split axis `k`, and
//! `rest` holds the halves of the remaining split axes in order:
//!
//! ```text
//!  Quad (axes a, b)          extended slot   spans axis   covers
//!  +-----+-----+             0               a            0|1  (b low)
//!  |  2  |  3  |  b high     1               a            2|3  (b high)
//!  +-----+-----+             2               b            0|2  (a low)
//!  |  0  |  1  |  b low      3               b            1|3  (a high)
//!  +-----+-----+
//!   a low a high
//! ```
//!
//! The domination mask of an extended slot has the bits of its two
//! standard slots set.

use glam::DVec3;
use smallvec::SmallVec;

use crate::bounds::DAabb3;
use crate::node::NodeId;

use super::config::SplitMode;

/// Index of a cell inside its owning index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub(crate) u32);

impl CellId {
  pub(crate) const ROOT: CellId = CellId(0);

  #[inline]
  pub(crate) fn index(self) -> usize {
    self.0 as usize
  }
}

/// An item stored directly in a cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellEntry {
  pub id: NodeId,
  pub bounds: DAabb3,
}

/// Where an item goes relative to a cell's split point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Placement {
  /// Fits a single standard child.
  Standard(usize),
  /// Straddles exactly one split axis.
  Extended(usize),
  /// Straddles two or more split axes.
  Here,
}

/// Slot geometry for one split mode.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SlotLayout {
  axes: &'static [usize],
}

impl SlotLayout {
  pub fn new(mode: SplitMode) -> Self {
    Self {
      axes: mode.split_axes(),
    }
  }

  #[inline]
  pub fn standard_count(&self) -> usize {
    1 << self.axes.len()
  }

  #[inline]
  pub fn extended_count(&self) -> usize {
    self.axes.len() << (self.axes.len() - 1)
  }

  /// Region of standard slot `slot` within `parent`.
  pub fn standard_region(&self, parent: &DAabb3, slot: usize) -> DAabb3 {
    let center = parent.center();
    let mut min = parent.min;
    let mut max = parent.max;
    for (k, &axis) in self.axes.iter().enumerate() {
      if slot & (1 << k) == 0 {
        max[axis] = center[axis];
      } else {
        min[axis] = center[axis];
      }
    }
    DAabb3 { min, max }
  }

  /// Region of extended slot `ext`: the union of its two standard slots.
  pub fn extended_region(&self, parent: &DAabb3, ext: usize) -> DAabb3 {
    let (low, high) = self.extended_pair(ext);
    self
      .standard_region(parent, low)
      .union(&self.standard_region(parent, high))
  }

  /// Standard slots covered by extended slot `ext`.
  pub fn extended_pair(&self, ext: usize) -> (usize, usize) {
    let per_axis = 1 << (self.axes.len() - 1);
    let k = ext / per_axis;
    let rest = ext % per_axis;
    // Re-insert a zero bit at position k
    let low_mask = (1 << k) - 1;
    let low = (rest & low_mask) | ((rest & !low_mask) << 1);
    (low, low | (1 << k))
  }

  /// Domination bitmask of extended slot `ext`.
  #[inline]
  pub fn extended_mask(&self, ext: usize) -> u8 {
    let (low, high) = self.extended_pair(ext);
    (1u8 << low) | (1u8 << high)
  }

  /// Decide where `bounds` belongs inside a cell covering `parent`.
  pub fn placement(&self, parent: &DAabb3, bounds: &DAabb3) -> Placement {
    let center: DVec3 = parent.center();
    let mut slot = 0usize;
    let mut straddle: Option<usize> = None;

    for (k, &axis) in self.axes.iter().enumerate() {
      if bounds.max[axis] <= center[axis] {
        continue;
      }
      if bounds.min[axis] >= center[axis] {
        slot |= 1 << k;
        continue;
      }
      if straddle.is_some() {
        return Placement::Here;
      }
      straddle = Some(k);
    }

    match straddle {
      None => Placement::Standard(slot),
      Some(k) => {
        // Drop bit k from the slot to get the halves of the other axes
        let low_mask = (1 << k) - 1;
        let rest = (slot & low_mask) | ((slot >> 1) & !low_mask);
        Placement::Extended((k << (self.axes.len() - 1)) + rest)
      }
    }
  }
}

/// A node of the spatial index.
#[derive(Clone, Debug)]
pub struct Cell {
  pub(crate) bounds: DAabb3,
  pub(crate) level: u32,
  pub(crate) is_extended: bool,
  /// Set once the item count first exceeded the split threshold.
  pub(crate) split: bool,
  pub(crate) items: SmallVec<[CellEntry; 4]>,
  pub(crate) children: SmallVec<[Option<CellId>; 8]>,
  pub(crate) extended_children: SmallVec<[Option<CellId>; 12]>,
}

impl Cell {
  pub(crate) fn new(bounds: DAabb3, level: u32, is_extended: bool) -> Self {
    Self {
      bounds,
      level,
      is_extended,
      split: false,
      items: SmallVec::new(),
      children: SmallVec::new(),
      extended_children: SmallVec::new(),
    }
  }

  pub fn bounds(&self) -> &DAabb3 {
    &self.bounds
  }

  pub fn level(&self) -> u32 {
    self.level
  }

  pub fn is_extended(&self) -> bool {
    self.is_extended
  }

  pub fn items(&self) -> &[CellEntry] {
    &self.items
  }

  /// True iff at least one standard or extended child has been allocated.
  pub fn has_child_cells(&self) -> bool {
    self.children.iter().any(Option::is_some) || self.extended_children.iter().any(Option::is_some)
  }

  pub fn child(&self, slot: usize) -> Option<CellId> {
    self.children.get(slot).copied().flatten()
  }

  pub fn extended_child(&self, ext: usize) -> Option<CellId> {
    self.extended_children.get(ext).copied().flatten()
  }
}

#[cfg(test)]
#[path = "cell_test.rs"]
mod cell_test;
