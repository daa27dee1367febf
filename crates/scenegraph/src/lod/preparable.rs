//! Capability contract for content that is expensive to get ready.

use std::sync::Arc;

use crate::error::PrepareError;

/// Content that must be prepared before it can be shown.
///
/// Thread contract: `prepare` and `release_resources` run on a background
/// worker; `activate` and `deactivate` only ever run on the thread that
/// drives LOD updates. Implementations use interior mutability.
pub trait Preparable: Send + Sync {
  /// True once prepared and activated, until deactivated.
  fn is_ready(&self) -> bool;

  /// Expensive setup. Runs off the render thread.
  fn prepare(&self) -> Result<(), PrepareError>;

  /// Cheap finalization after `prepare` succeeded.
  fn activate(&self);

  /// Cheap teardown before `release_resources`.
  fn deactivate(&self);

  /// Expensive teardown. Runs off the render thread.
  fn release_resources(&self) -> Result<(), PrepareError>;
}

/// Capability query for LOD children.
pub trait LodChild {
  /// Preparable content carried by this child, if any.
  fn preparable(&self) -> Option<Arc<dyn Preparable>> {
    None
  }
}

impl LodChild for Arc<dyn Preparable> {
  fn preparable(&self) -> Option<Arc<dyn Preparable>> {
    Some(Arc::clone(self))
  }
}

impl<T: LodChild> LodChild for Option<T> {
  fn preparable(&self) -> Option<Arc<dyn Preparable>> {
    self.as_ref().and_then(LodChild::preparable)
  }
}
