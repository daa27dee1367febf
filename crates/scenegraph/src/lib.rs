//! Engine-agnostic scene graph core.
//!
//! Two per-frame services for a retained-mode renderer:
//!
//! - **Spatial culling**: [`SpatialGroup`] mirrors its children into a
//!   quad-tree or oct-tree [`SpatialIndex`] and emits the children that
//!   survive the view [`Frustum`] into a render bin.
//! - **Distance LOD**: [`LodSwitch`] picks one child per view distance band
//!   and prepares heavy content on a background [`JobQueue`];
//!   [`LodShape`] picks a named level and reports it synchronously.
//!
//! All per-scene state (node ids, render options) lives in a
//! [`SceneContext`] passed explicitly to whatever builds nodes.

pub mod bounds;
pub mod constants;
pub mod context;
pub mod error;
pub mod frustum;
pub mod lod;
pub mod node;
pub mod spatial;
pub mod worker;

// Re-exports for convenience
pub use bounds::DAabb3;
pub use context::{RenderOptions, SceneContext};
pub use error::{PrepareError, Result, SceneError};
pub use frustum::{Classification, Frustum};
pub use lod::{
  Band, BandStep, BandTable, LodChangeHandler, LodChild, LodConfig, LodShape, LodSwitch,
  LodSwitchEvent, Preparable, ShapeLevels,
};
pub use node::{HasBounds, NodeId, NodeKind, SceneNode, Switchable, Transformable};
pub use spatial::{
  Cell, CellEntry, CellId, CullContext, CullStats, Plane, RenderAtom, RenderBin, RenderBinProvider,
  SpatialGroup, SpatialIndex, SpatialIndexConfig, SplitMode,
};
pub use worker::{
  submit_with_completion, BackgroundWorker, InlineQueue, Job, JobOutcome, JobQueue, RayonQueue,
};
