//! Distance-based level of detail.
//!
//! Two node flavours share one band table ([`BandTable`]): ascending,
//! non-overlapping `[min, max]` view distance ranges.
//!
//! - [`LodSwitch`]: each band owns a child. Children with [`Preparable`]
//!   content are prepared on a background [`JobQueue`](crate::JobQueue)
//!   before they are shown, and released again after sitting unused for
//!   the retention window.
//! - [`LodShape`]: each band is a name. Changes are reported synchronously
//!   to a [`LodChangeHandler`], e.g. [`ShapeLevels`] swapping geometry and
//!   appearance.
//!
//! Both re-evaluate from the current band outward, so the usual one band
//! step per frame costs a single comparison.

use std::time::Duration;

use crate::constants::DEFAULT_RETENTION_WINDOW;

pub mod bands;
pub mod preparable;
pub mod shape;
pub mod switch;

// Re-exports
pub use bands::{Band, BandStep, BandTable};
pub use preparable::{LodChild, Preparable};
pub use shape::{LodChangeHandler, LodShape, ShapeLevels};
pub use switch::{LodSwitch, LodSwitchEvent};

/// Tuning for [`LodSwitch`].
#[derive(Clone, Debug, PartialEq)]
pub struct LodConfig {
  /// Prepared content of an inactive band is released once it has been
  /// inactive for longer than this.
  pub retention_window: Duration,
}

impl LodConfig {
  pub const DEFAULT: Self = Self {
    retention_window: DEFAULT_RETENTION_WINDOW,
  };

  pub fn with_retention_window(retention_window: Duration) -> Self {
    Self { retention_window }
  }
}

impl Default for LodConfig {
  fn default() -> Self {
    Self::DEFAULT
  }
}
