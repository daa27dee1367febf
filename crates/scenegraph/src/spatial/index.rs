//! SpatialIndex - quad-tree / oct-tree over scene node bounds.
//!
//! Cells live in a flat arena addressed by [`CellId`]; the root is always
//! slot 0. Each item is stored in exactly one cell, the smallest one found
//! that fully contains its bounds:
//!
//! 1. Descend into the standard child that contains the item.
//! 2. Otherwise, above `max_level_for_extended_cells`, descend into the
//!    extended child spanning the two children the item straddles.
//! 3. Otherwise keep the item in the current cell.
//!
//! Leaves split lazily once they hold more than `min_nodes_before_split`
//! items. Children are allocated on first use and never merged back; only
//! [`SpatialIndex::clear`] releases cells.

use std::collections::HashMap;

use crate::bounds::DAabb3;
use crate::error::{Result, SceneError};
use crate::frustum::{Classification, Frustum};
use crate::node::NodeId;

use super::cell::{Cell, CellEntry, CellId, Placement, SlotLayout};
use super::config::SpatialIndexConfig;
use super::cull::CullStats;

/// Spatial index owned by a single [`SpatialGroup`](super::SpatialGroup).
#[derive(Clone, Debug)]
pub struct SpatialIndex {
  config: SpatialIndexConfig,
  layout: SlotLayout,
  cells: Vec<Cell>,
  /// Reverse lookup: item id -> cell holding it.
  locations: HashMap<NodeId, CellId>,
  /// Deepest level allocated so far.
  max_level: u32,
}

impl SpatialIndex {
  pub fn new(config: SpatialIndexConfig) -> Result<Self> {
    config.validate()?;
    let layout = SlotLayout::new(config.split_mode);
    let root = Cell::new(config.world_bounds, 0, false);
    Ok(Self {
      config,
      layout,
      cells: vec![root],
      locations: HashMap::new(),
      max_level: 0,
    })
  }

  pub fn config(&self) -> &SpatialIndexConfig {
    &self.config
  }

  /// Number of items stored.
  pub fn len(&self) -> usize {
    self.locations.len()
  }

  pub fn is_empty(&self) -> bool {
    self.locations.is_empty()
  }

  pub fn contains(&self, id: NodeId) -> bool {
    self.locations.contains_key(&id)
  }

  /// Deepest cell level reached so far.
  pub fn max_level(&self) -> u32 {
    self.max_level
  }

  /// Number of allocated cells, root included.
  pub fn cell_count(&self) -> usize {
    self.cells.len()
  }

  pub fn root(&self) -> CellId {
    CellId::ROOT
  }

  pub fn cell(&self, cell: CellId) -> Option<&Cell> {
    self.cells.get(cell.index())
  }

  /// Cell currently holding `id`.
  pub fn cell_of(&self, id: NodeId) -> Option<CellId> {
    self.locations.get(&id).copied()
  }

  /// Bounds recorded for `id` at insertion or last update.
  pub fn bounds_of(&self, id: NodeId) -> Option<DAabb3> {
    let cell = self.cell_of(id)?;
    self.cells[cell.index()]
      .items
      .iter()
      .find(|entry| entry.id == id)
      .map(|entry| entry.bounds)
  }

  /// Insert an item with its world bounds. Returns the cell it landed in.
  pub fn insert(&mut self, id: NodeId, bounds: DAabb3) -> Result<CellId> {
    if self.locations.contains_key(&id) {
      return Err(SceneError::DuplicateNode(id));
    }
    self.place(CellId::ROOT, CellEntry { id, bounds });
    Ok(self.locations[&id])
  }

  /// Remove an item. Cells are not merged back.
  pub fn remove(&mut self, id: NodeId) -> Result<DAabb3> {
    let cell = self.locations.remove(&id).ok_or(SceneError::UnknownNode(id))?;
    let items = &mut self.cells[cell.index()].items;
    match items.iter().position(|entry| entry.id == id) {
      Some(pos) => Ok(items.swap_remove(pos).bounds),
      None => {
        debug_assert!(false, "location map points at a cell without the item");
        Err(SceneError::UnknownNode(id))
      }
    }
  }

  /// Re-locate an item after its bounds changed.
  ///
  /// Only worth calling when the change could move the item to another
  /// cell; the item is removed and inserted again from the root.
  pub fn update_node_position(&mut self, id: NodeId, bounds: DAabb3) -> Result<CellId> {
    self.remove(id)?;
    self.place(CellId::ROOT, CellEntry { id, bounds });
    Ok(self.locations[&id])
  }

  /// Drop every item and every cell below the root.
  pub fn clear(&mut self) {
    self.cells.truncate(1);
    self.cells[0] = Cell::new(self.config.world_bounds, 0, false);
    self.locations.clear();
    self.max_level = 0;
  }

  /// Walk the tree against a frustum.
  ///
  /// `visit(id, bounds, suppressed)` is called once for every item in a
  /// cell that was not pruned. `suppressed` is true when an ancestor cell
  /// (or the item's own cell) was fully inside, so the item needs no test
  /// of its own. Items lying outside the world region are always visited
  /// with `suppressed == false`.
  #[tracing::instrument(skip_all, name = "spatial::cull")]
  pub fn cull<F>(&self, frustum: &Frustum, mut visit: F) -> CullStats
  where
    F: FnMut(NodeId, &DAabb3, bool),
  {
    let mut stats = CullStats::default();
    self.cull_cell(CellId::ROOT, Some(frustum), &mut visit, &mut stats);
    stats
  }

  /// Visit every item without frustum tests.
  pub fn for_each_item<F>(&self, mut visit: F) -> CullStats
  where
    F: FnMut(NodeId, &DAabb3, bool),
  {
    let mut stats = CullStats::default();
    self.cull_cell(CellId::ROOT, None, &mut visit, &mut stats);
    stats
  }

  /// Returns true when the cell was pruned as outside.
  ///
  /// `frustum` is `None` once culling is suppressed for this branch.
  fn cull_cell<F>(
    &self,
    cell_id: CellId,
    frustum: Option<&Frustum>,
    visit: &mut F,
    stats: &mut CullStats,
  ) -> bool
  where
    F: FnMut(NodeId, &DAabb3, bool),
  {
    let cell = &self.cells[cell_id.index()];

    let frustum = match frustum {
      Some(frustum) => {
        stats.cells_tested += 1;
        match frustum.classify_aabb(&cell.bounds) {
          Classification::Outside => {
            stats.cells_pruned += 1;
            if cell_id == CellId::ROOT {
              self.visit_strays(cell, visit, stats);
            }
            return true;
          }
          Classification::Inside => None,
          Classification::Intersecting => Some(frustum),
        }
      }
      None => {
        stats.cells_suppressed += 1;
        None
      }
    };
    let suppressed = frustum.is_none();

    for entry in &cell.items {
      stats.items_visited += 1;
      let stray = cell_id == CellId::ROOT && !cell.bounds.contains(&entry.bounds);
      visit(entry.id, &entry.bounds, suppressed && !stray);
    }

    // Extended children first: a pruned extended cell prunes the
    // standard children it spans.
    let mut culled_mask = 0u8;
    for (ext, child) in cell.extended_children.iter().enumerate() {
      if let Some(child) = *child {
        if self.cull_cell(child, frustum, visit, stats) {
          culled_mask |= self.layout.extended_mask(ext);
        }
      }
    }

    for (slot, child) in cell.children.iter().enumerate() {
      let Some(child) = *child else {
        continue;
      };
      if culled_mask & (1 << slot) != 0 {
        stats.cells_skipped += 1;
        continue;
      }
      self.cull_cell(child, frustum, visit, stats);
    }

    false
  }

  /// Out-of-world items kept at the root are not covered by its
  /// classification and always get their own test.
  fn visit_strays<F>(&self, root: &Cell, visit: &mut F, stats: &mut CullStats)
  where
    F: FnMut(NodeId, &DAabb3, bool),
  {
    for entry in root.items.iter().filter(|entry| !root.bounds.contains(&entry.bounds)) {
      stats.items_visited += 1;
      visit(entry.id, &entry.bounds, false);
    }
  }

  /// Descend from `start` and store `entry` in the deepest fitting cell.
  fn place(&mut self, start: CellId, entry: CellEntry) {
    let mut current = start;
    loop {
      let cell = &self.cells[current.index()];
      // Out-of-world items can only reach here at the root
      if !cell.split || !cell.bounds.contains(&entry.bounds) {
        break;
      }
      match self.layout.placement(&cell.bounds, &entry.bounds) {
        Placement::Standard(slot) => {
          current = self.child_or_alloc(current, slot, false);
        }
        Placement::Extended(ext) if cell.level < self.config.max_level_for_extended_cells => {
          current = self.child_or_alloc(current, ext, true);
        }
        Placement::Extended(_) | Placement::Here => break,
      }
    }

    self.cells[current.index()].items.push(entry);
    self.locations.insert(entry.id, current);
    self.maybe_split(current);
  }

  /// Split an overfull leaf and push its items down.
  fn maybe_split(&mut self, cell_id: CellId) {
    let cell = &mut self.cells[cell_id.index()];
    if cell.split
      || cell.items.len() <= self.config.min_nodes_before_split
      || cell.level >= self.config.max_depth
    {
      return;
    }

    cell.split = true;
    cell.children.resize(self.layout.standard_count(), None);
    if cell.level < self.config.max_level_for_extended_cells {
      cell.extended_children.resize(self.layout.extended_count(), None);
    }
    let items = std::mem::take(&mut cell.items);
    tracing::debug!(
      cell = cell_id.0,
      level = cell.level,
      items = items.len(),
      "splitting cell"
    );

    for entry in items {
      self.place(cell_id, entry);
    }
  }

  /// Return the child in `slot`, allocating it on first use.
  fn child_or_alloc(&mut self, parent: CellId, slot: usize, extended: bool) -> CellId {
    let cell = &self.cells[parent.index()];
    let existing = if extended {
      cell.extended_child(slot)
    } else {
      cell.child(slot)
    };
    if let Some(child) = existing {
      return child;
    }

    let bounds = if extended {
      self.layout.extended_region(&cell.bounds, slot)
    } else {
      self.layout.standard_region(&cell.bounds, slot)
    };
    let level = cell.level + 1;
    let child = CellId(self.cells.len() as u32);
    self.cells.push(Cell::new(bounds, level, extended));
    self.max_level = self.max_level.max(level);

    let cell = &mut self.cells[parent.index()];
    if extended {
      cell.extended_children[slot] = Some(child);
    } else {
      cell.children[slot] = Some(child);
    }
    child
  }
}

#[cfg(test)]
#[path = "index_test.rs"]
mod index_test;
