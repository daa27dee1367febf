//! Spatial culling: a quad-tree / oct-tree index over scene nodes and the
//! group node that owns it.
//!
//! # Extended cells
//!
//! Besides its 4 (quad) or 8 (oct) standard children, a cell can have
//! extended children, each spanning two standard children adjacent along
//! one split axis. Items straddling exactly one split plane land there
//! instead of sticking to the parent. During culling, an extended child
//! classified outside also rules out the two standard children it spans.
//!
//! # Module Structure
//!
//! - [`config`]: `SpatialIndexConfig` - world region and split thresholds
//! - [`cell`]: `Cell` - region, items, children, slot geometry
//! - [`index`]: `SpatialIndex` - insert/remove/update and recursive cull
//! - [`cull`]: `CullContext`, render bin sink, `CullStats`
//! - [`group`]: `SpatialGroup` - scene container mirroring children into
//!   the index

pub mod cell;
pub mod config;
pub mod cull;
pub mod group;
pub mod index;

// Re-exports
pub use cell::{Cell, CellEntry, CellId};
pub use config::{Plane, SpatialIndexConfig, SplitMode};
pub use cull::{CullContext, CullStats, RenderAtom, RenderBin, RenderBinProvider};
pub use group::SpatialGroup;
pub use index::SpatialIndex;
