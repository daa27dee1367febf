//! SpatialGroup - container node whose children are mirrored into a
//! spatial index for frustum culling.

use std::collections::HashMap;

use glam::DAffine3;

use crate::bounds::DAabb3;
use crate::context::SceneContext;
use crate::error::{Result, SceneError};
use crate::frustum::Classification;
use crate::node::{HasBounds, NodeId, NodeKind, SceneNode, Transformable};

use super::config::SpatialIndexConfig;
use super::cull::{CullContext, CullStats, RenderAtom, RenderBinProvider};
use super::index::SpatialIndex;

/// Group node backed by a [`SpatialIndex`].
///
/// Every child add, remove and move goes through the index. The index is
/// never exposed mutably, so it cannot drift from the child set.
#[derive(Clone, Debug)]
pub struct SpatialGroup {
  id: NodeId,
  children: HashMap<NodeId, SceneNode>,
  index: SpatialIndex,
  frustum_culling_enabled: bool,
}

impl SpatialGroup {
  /// Create a group using the context's default options.
  pub fn new(context: &SceneContext) -> Result<Self> {
    let options = context.options();
    let mut group = Self::with_config(context.next_node_id(), options.spatial.clone())?;
    group.frustum_culling_enabled = options.frustum_culling_enabled;
    Ok(group)
  }

  pub fn with_config(id: NodeId, config: SpatialIndexConfig) -> Result<Self> {
    Ok(Self {
      id,
      children: HashMap::new(),
      index: SpatialIndex::new(config)?,
      frustum_culling_enabled: true,
    })
  }

  pub fn id(&self) -> NodeId {
    self.id
  }

  pub fn index(&self) -> &SpatialIndex {
    &self.index
  }

  pub fn len(&self) -> usize {
    self.children.len()
  }

  pub fn is_empty(&self) -> bool {
    self.children.is_empty()
  }

  pub fn child(&self, id: NodeId) -> Option<&SceneNode> {
    self.children.get(&id)
  }

  pub fn children(&self) -> impl Iterator<Item = &SceneNode> {
    self.children.values()
  }

  pub fn set_frustum_culling_enabled(&mut self, enabled: bool) {
    self.frustum_culling_enabled = enabled;
  }

  pub fn add_child(&mut self, node: SceneNode) -> Result<()> {
    let id = node.id();
    if self.children.contains_key(&id) {
      return Err(SceneError::DuplicateNode(id));
    }
    self.index.insert(id, node.world_bounds())?;
    self.children.insert(id, node);
    Ok(())
  }

  pub fn remove_child(&mut self, id: NodeId) -> Result<SceneNode> {
    let node = self.children.remove(&id).ok_or(SceneError::UnknownNode(id))?;
    self.index.remove(id)?;
    Ok(node)
  }

  /// Move a child and re-locate it in the index.
  pub fn set_child_transform(&mut self, id: NodeId, transform: DAffine3) -> Result<()> {
    self.update_child(id, |node| node.set_transform(transform))
  }

  /// Resize a child and re-locate it in the index.
  pub fn set_child_local_bounds(&mut self, id: NodeId, bounds: DAabb3) -> Result<()> {
    self.update_child(id, |node| node.set_local_bounds(bounds))
  }

  /// Apply an arbitrary edit to a child, then re-locate it if its world
  /// bounds changed.
  pub fn update_child<F>(&mut self, id: NodeId, edit: F) -> Result<()>
  where
    F: FnOnce(&mut SceneNode),
  {
    let node = self.children.get_mut(&id).ok_or(SceneError::UnknownNode(id))?;
    let before = node.world_bounds();
    edit(node);
    let after = node.world_bounds();
    if before != after {
      self.index.update_node_position(id, after)?;
    }
    Ok(())
  }

  /// Remove every child.
  pub fn clear(&mut self) {
    self.children.clear();
    self.index.clear();
  }

  /// Per-frame cull entry point.
  ///
  /// Walks the index against `context.frustum` and emits every surviving
  /// child to `bin`. Children under a fully inside cell are emitted as is;
  /// the rest get their own bounds test.
  #[tracing::instrument(skip_all, name = "spatial_group::cull", fields(group = self.id.raw()))]
  pub fn cull_special_node(
    &self,
    context: &CullContext,
    bin: &mut dyn RenderBinProvider,
  ) -> CullStats {
    let mut emitted = 0;
    let mut emit = |id: NodeId, bounds: &DAabb3, suppressed: bool| {
      if self.frustum_culling_enabled
        && !suppressed
        && context.frustum.classify_aabb(bounds) == Classification::Outside
      {
        return;
      }
      let Some(node) = self.children.get(&id) else {
        return;
      };
      if context.is_shadow_pass && node.kind() != NodeKind::Shape {
        return;
      }
      bin.add_atom(
        RenderAtom {
          node: id,
          kind: node.kind(),
          world_bounds: *bounds,
          view_distance: context.view_position.distance(bounds.center()),
        },
        context,
      );
      emitted += 1;
    };

    let mut stats = if self.frustum_culling_enabled {
      self.index.cull(&context.frustum, &mut emit)
    } else {
      self.index.for_each_item(&mut emit)
    };
    stats.items_emitted = emitted;
    tracing::trace!(
      tested = stats.cells_tested,
      pruned = stats.cells_pruned,
      skipped = stats.cells_skipped,
      emitted = stats.items_emitted,
      "cull pass"
    );
    stats
  }
}

#[cfg(test)]
#[path = "group_test.rs"]
mod group_test;
