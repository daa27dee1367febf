//! Per-frame culling context and render-bin output.

use glam::DVec3;

use crate::bounds::DAabb3;
use crate::frustum::Frustum;
use crate::node::{NodeId, NodeKind};

/// State supplied by the renderer for one cull pass.
#[derive(Clone, Debug)]
pub struct CullContext {
  pub frustum: Frustum,
  /// World-space eye position.
  pub view_position: DVec3,
  /// Renderer capability bits, passed through to the bin untouched.
  pub capabilities: u32,
  /// Frame time in microseconds.
  pub frame_time_us: u64,
  /// Shadow passes only collect shapes.
  pub is_shadow_pass: bool,
}

impl CullContext {
  pub fn new(frustum: Frustum, view_position: DVec3) -> Self {
    Self {
      frustum,
      view_position,
      capabilities: 0,
      frame_time_us: 0,
      is_shadow_pass: false,
    }
  }

  pub fn shadow_pass(mut self) -> Self {
    self.is_shadow_pass = true;
    self
  }
}

/// One visible node handed to the renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderAtom {
  pub node: NodeId,
  pub kind: NodeKind,
  pub world_bounds: DAabb3,
  /// Distance from the view position to the bounds center.
  pub view_distance: f64,
}

/// Sink for visible nodes.
pub trait RenderBinProvider {
  fn add_atom(&mut self, atom: RenderAtom, context: &CullContext);
}

/// Collects atoms in emission order.
#[derive(Clone, Debug, Default)]
pub struct RenderBin {
  atoms: Vec<RenderAtom>,
}

impl RenderBin {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn atoms(&self) -> &[RenderAtom] {
    &self.atoms
  }

  pub fn len(&self) -> usize {
    self.atoms.len()
  }

  pub fn is_empty(&self) -> bool {
    self.atoms.is_empty()
  }

  pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
    self.atoms.iter().map(|atom| atom.node)
  }

  /// Sort front to back by view distance.
  pub fn sort_front_to_back(&mut self) {
    self
      .atoms
      .sort_by(|a, b| a.view_distance.total_cmp(&b.view_distance));
  }

  pub fn clear(&mut self) {
    self.atoms.clear();
  }
}

impl RenderBinProvider for RenderBin {
  fn add_atom(&mut self, atom: RenderAtom, _context: &CullContext) {
    self.atoms.push(atom);
  }
}

/// Counters from one cull pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CullStats {
  /// Cells classified against the frustum.
  pub cells_tested: usize,
  /// Cells classified outside (subtree skipped).
  pub cells_pruned: usize,
  /// Cells visited without a test below a fully inside ancestor.
  pub cells_suppressed: usize,
  /// Standard cells skipped because a pruned extended sibling covered them.
  pub cells_skipped: usize,
  /// Items handed to the visitor.
  pub items_visited: usize,
  /// Items that reached the render bin.
  pub items_emitted: usize,
}

impl CullStats {
  /// Cells touched in any way.
  #[inline]
  pub fn cells_visited(&self) -> usize {
    self.cells_tested + self.cells_suppressed
  }
}
