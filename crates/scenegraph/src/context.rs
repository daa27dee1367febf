//! SceneContext - explicit per-scene state.
//!
//! Holds the node id generator and the render options that would otherwise
//! be process-wide singletons. Pass it to whatever builds nodes.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::bounds::DAabb3;
use crate::lod::LodConfig;
use crate::node::{NodeId, NodeKind, SceneNode};
use crate::spatial::SpatialIndexConfig;

/// Render options shared by everything built from one context.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderOptions {
  /// Defaults for new spatial groups.
  pub spatial: SpatialIndexConfig,
  /// Defaults for new LOD switches.
  pub lod: LodConfig,
  /// When false, spatial groups emit every child without frustum tests.
  pub frustum_culling_enabled: bool,
}

impl Default for RenderOptions {
  fn default() -> Self {
    Self {
      spatial: SpatialIndexConfig::default(),
      lod: LodConfig::default(),
      frustum_culling_enabled: true,
    }
  }
}

/// Per-scene context.
#[derive(Debug)]
pub struct SceneContext {
  next_node_id: AtomicU64,
  options: RenderOptions,
}

impl SceneContext {
  pub fn new(options: RenderOptions) -> Self {
    Self {
      next_node_id: AtomicU64::new(1),
      options,
    }
  }

  /// Issue a new id, unique within this context.
  pub fn next_node_id(&self) -> NodeId {
    NodeId(self.next_node_id.fetch_add(1, Ordering::Relaxed))
  }

  /// Build a node with a freshly issued id.
  pub fn create_node(&self, kind: NodeKind, local_bounds: DAabb3) -> SceneNode {
    SceneNode::new(self.next_node_id(), kind, local_bounds)
  }

  pub fn options(&self) -> &RenderOptions {
    &self.options
  }

  pub fn options_mut(&mut self) -> &mut RenderOptions {
    &mut self.options
  }
}

impl Default for SceneContext {
  fn default() -> Self {
    Self::new(RenderOptions::default())
  }
}
