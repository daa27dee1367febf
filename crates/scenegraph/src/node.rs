//! Scene node model.
//!
//! Nodes are a flat tagged variant (`NodeKind`) plus a few capability
//! traits. Consumers check capabilities instead of walking a class
//! hierarchy.

use std::fmt;
use std::sync::Arc;

use glam::{DAffine3, DVec3};

use crate::bounds::DAabb3;
use crate::lod::{LodChild, Preparable};

/// Opaque node identifier, issued by a [`SceneContext`](crate::SceneContext).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct NodeId(pub(crate) u64);

impl NodeId {
  /// Get the raw ID value.
  pub fn raw(&self) -> u64 {
    self.0
  }
}

/// Anything with world-space bounds.
pub trait HasBounds {
  fn world_bounds(&self) -> DAabb3;
}

/// Anything placed by an affine transform.
pub trait Transformable {
  fn transform(&self) -> DAffine3;

  fn set_transform(&mut self, transform: DAffine3);

  /// Translation part of the transform, used for view distance.
  fn world_translation(&self) -> DVec3 {
    self.transform().translation
  }
}

/// Nodes that select one of several children.
pub trait Switchable {
  /// Index of the selected child, `None` when nothing is shown.
  fn which_child(&self) -> Option<usize>;
}

/// Concrete node kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
  Shape,
  Light,
  Sound,
  Group,
}

/// A leaf-level scene node as stored by a [`SpatialGroup`](crate::SpatialGroup).
#[derive(Clone)]
pub struct SceneNode {
  id: NodeId,
  kind: NodeKind,
  name: String,
  local_bounds: DAabb3,
  transform: DAffine3,
  content: Option<Arc<dyn Preparable>>,
}

impl SceneNode {
  pub fn new(id: NodeId, kind: NodeKind, local_bounds: DAabb3) -> Self {
    Self {
      id,
      kind,
      name: String::new(),
      local_bounds,
      transform: DAffine3::IDENTITY,
      content: None,
    }
  }

  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.name = name.into();
    self
  }

  pub fn with_transform(mut self, transform: DAffine3) -> Self {
    self.transform = transform;
    self
  }

  /// Attach content that needs preparation before it can be shown.
  pub fn with_content(mut self, content: Arc<dyn Preparable>) -> Self {
    self.content = Some(content);
    self
  }

  pub fn id(&self) -> NodeId {
    self.id
  }

  pub fn kind(&self) -> NodeKind {
    self.kind
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn local_bounds(&self) -> DAabb3 {
    self.local_bounds
  }

  pub fn set_local_bounds(&mut self, bounds: DAabb3) {
    self.local_bounds = bounds;
  }

  pub fn content(&self) -> Option<&Arc<dyn Preparable>> {
    self.content.as_ref()
  }
}

impl HasBounds for SceneNode {
  fn world_bounds(&self) -> DAabb3 {
    self.local_bounds.transformed(&self.transform)
  }
}

impl Transformable for SceneNode {
  fn transform(&self) -> DAffine3 {
    self.transform
  }

  fn set_transform(&mut self, transform: DAffine3) {
    self.transform = transform;
  }
}

impl LodChild for SceneNode {
  fn preparable(&self) -> Option<Arc<dyn Preparable>> {
    self.content.clone()
  }
}

impl fmt::Debug for SceneNode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SceneNode")
      .field("id", &self.id)
      .field("kind", &self.kind)
      .field("name", &self.name)
      .field("local_bounds", &self.local_bounds)
      .field("has_content", &self.content.is_some())
      .finish()
  }
}
