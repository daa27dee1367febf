//! LodSwitch - distance-driven child selection with background preparation.
//!
//! # Per-frame update
//!
//! ```text
//! preparation in flight? ──yes──► poll it: activate, or report failure
//!          │ no
//! first update? ──yes──► select the farthest band
//!          │ no
//! no current band? ──► full scan after a miss, band 0 otherwise
//!          │
//! distance left the current band? ──► scan outward: select or miss
//! ```
//!
//! Selecting a band whose content is not ready dispatches `prepare()` to
//! the job queue and keeps showing the current band. The next updates only
//! poll the completion channel; once it reports success, `activate()` runs
//! on the updating thread and the band becomes current. At most one
//! preparation is in flight per switch.
//!
//! Every update then releases prepared content of bands that have been
//! inactive for longer than the retention window. The farthest band and
//! eternal bands are never released.

use std::fmt;
use std::sync::Arc;

use crossbeam_channel::{Receiver, TryRecvError};
use glam::{DAffine3, DVec3};
use web_time::Instant;

use crate::context::SceneContext;
use crate::error::{PrepareError, Result, SceneError};
use crate::node::{Switchable, Transformable};
use crate::worker::{submit_with_completion, JobOutcome, JobQueue};

use super::bands::{BandStep, BandTable};
use super::preparable::LodChild;
use super::LodConfig;

/// What a single update did.
#[derive(Clone, Debug, PartialEq)]
pub enum LodSwitchEvent {
  Unchanged,
  /// Switched to a band whose content needed no preparation.
  Selected { from: Option<usize>, to: usize },
  /// Preparation of `index` was dispatched; the current band stays.
  PreparationStarted { index: usize },
  /// A finished preparation was activated and its band is now current.
  Activated { from: Option<usize>, to: usize },
  /// Preparation of `index` failed; the current band stays.
  PreparationFailed { index: usize, error: PrepareError },
  /// No band contains the view distance any more.
  Cleared { from: usize },
}

struct LodEntry<T> {
  child: T,
  /// When this band last stopped being current.
  last_active: Option<Instant>,
  eternal: bool,
}

impl<T> LodEntry<T> {
  fn new(child: T) -> Self {
    Self {
      child,
      last_active: None,
      eternal: false,
    }
  }
}

struct PendingChange {
  index: usize,
  done: Receiver<JobOutcome>,
}

/// Switch node showing the child whose band contains the view distance.
pub struct LodSwitch<T> {
  bands: BandTable<LodEntry<T>>,
  current: Option<usize>,
  pending: Option<PendingChange>,
  initialized: bool,
  /// `current` is `None` because the distance fell outside every band.
  missed: bool,
  transform: DAffine3,
  queue: Arc<dyn JobQueue>,
  config: LodConfig,
  evictions: usize,
}

impl<T: LodChild> LodSwitch<T> {
  pub fn new(queue: Arc<dyn JobQueue>) -> Self {
    Self::with_config(queue, LodConfig::default())
  }

  pub fn with_config(queue: Arc<dyn JobQueue>, config: LodConfig) -> Self {
    Self {
      bands: BandTable::new(),
      current: None,
      pending: None,
      initialized: false,
      missed: false,
      transform: DAffine3::IDENTITY,
      queue,
      config,
      evictions: 0,
    }
  }

  /// Create a switch using the context's LOD options.
  pub fn from_context(context: &SceneContext, queue: Arc<dyn JobQueue>) -> Self {
    Self::with_config(queue, context.options().lod.clone())
  }

  pub fn config(&self) -> &LodConfig {
    &self.config
  }

  pub fn set_config(&mut self, config: LodConfig) {
    self.config = config;
  }

  pub fn band_count(&self) -> usize {
    self.bands.len()
  }

  /// `(min, max, child)` of band `index`.
  pub fn band(&self, index: usize) -> Option<(f64, f64, &T)> {
    self
      .bands
      .get(index)
      .map(|band| (band.min, band.max, &band.item.child))
  }

  pub fn child(&self, index: usize) -> Option<&T> {
    self.bands.get(index).map(|band| &band.item.child)
  }

  /// Child of the current band.
  pub fn current_child(&self) -> Option<&T> {
    self.current.and_then(|index| self.child(index))
  }

  /// Band whose preparation is in flight.
  pub fn pending_change(&self) -> Option<usize> {
    self.pending.as_ref().map(|pending| pending.index)
  }

  pub fn is_pending(&self) -> bool {
    self.pending.is_some()
  }

  /// When band `index` last stopped being current, if it is waiting for
  /// release.
  pub fn last_active(&self, index: usize) -> Option<Instant> {
    self.bands.get(index).and_then(|band| band.item.last_active)
  }

  /// Releases dispatched since creation.
  pub fn eviction_count(&self) -> usize {
    self.evictions
  }

  /// Eternal bands keep their prepared content forever.
  pub fn set_eternal(&mut self, index: usize, eternal: bool) -> Result<()> {
    let len = self.bands.len();
    let entry = self
      .bands
      .item_mut(index)
      .ok_or(SceneError::BandIndexOutOfRange { index, len })?;
    entry.eternal = eternal;
    if eternal {
      entry.last_active = None;
    }
    Ok(())
  }

  pub fn set_world_translation(&mut self, translation: DVec3) {
    self.transform.translation = translation;
  }

  /// Add a band at its sorted position and return that position.
  pub fn add_lod_item(&mut self, child: T, min: f64, max: f64) -> Result<usize> {
    let index = self.bands.insert(LodEntry::new(child), min, max)?;
    if let Some(current) = self.current.as_mut() {
      if *current >= index {
        *current += 1;
      }
    }
    if let Some(pending) = self.pending.as_mut() {
      if pending.index >= index {
        pending.index += 1;
      }
    }
    Ok(index)
  }

  /// Replace band `index`. Returns the previous child.
  ///
  /// A preparation in flight for the old child is abandoned. If the band
  /// is current and the new child is not ready, the band is selected again
  /// through preparation on the next update.
  pub fn set_lod_item(&mut self, index: usize, child: T, min: f64, max: f64) -> Result<T> {
    let mut entry = LodEntry::new(child);
    entry.eternal = self.bands.get(index).is_some_and(|band| band.item.eternal);
    let old = self.bands.set(index, entry, min, max)?;

    if self.pending_change() == Some(index) {
      tracing::debug!(index, "abandoning preparation of replaced LOD band");
      self.pending = None;
      if self.current.is_none() {
        self.missed = true;
      }
    }

    if self.current == Some(index) {
      let ready = self
        .child(index)
        .and_then(|child| child.preparable())
        .map_or(true, |content| content.is_ready());
      if !ready {
        self.current = None;
        self.missed = true;
      }
    }

    Ok(old.child)
  }

  /// Remove band `index`. Returns its child.
  ///
  /// Removing the current band leaves nothing selected; the next update
  /// selects band 0.
  pub fn remove_lod_item(&mut self, index: usize) -> Result<T> {
    let removed = self.bands.remove(index)?;

    match self.current {
      Some(current) if current == index => {
        self.current = None;
        self.missed = false;
      }
      Some(current) if current > index => self.current = Some(current - 1),
      _ => {}
    }

    match self.pending_change() {
      Some(pending) if pending == index => {
        tracing::debug!(index, "abandoning preparation of removed LOD band");
        self.pending = None;
      }
      Some(_) => {
        if let Some(pending) = self.pending.as_mut() {
          if pending.index > index {
            pending.index -= 1;
          }
        }
      }
      None => {}
    }

    Ok(removed.item.child)
  }

  /// Per-frame update against the current clock.
  pub fn update_which_child(&mut self, view_position: DVec3) -> LodSwitchEvent {
    self.update_which_child_at(view_position, Instant::now())
  }

  /// Per-frame update with an explicit timestamp.
  #[tracing::instrument(skip_all, name = "lod_switch::update")]
  pub fn update_which_child_at(&mut self, view_position: DVec3, now: Instant) -> LodSwitchEvent {
    let event = if self.bands.is_empty() {
      self.pending = None;
      match self.current.take() {
        Some(from) => LodSwitchEvent::Cleared { from },
        None => LodSwitchEvent::Unchanged,
      }
    } else if self.pending.is_some() {
      self.poll_pending(now)
    } else if !self.initialized {
      self.initialized = true;
      // Start from the least detailed band
      let farthest = self.bands.len() - 1;
      self.select(farthest, now)
    } else {
      let distance = view_position.distance(self.world_translation());
      match self.current {
        None if self.missed => match self.bands.find(distance) {
          Some(index) => self.select(index, now),
          None => LodSwitchEvent::Unchanged,
        },
        None => self.select(0, now),
        Some(current) => match self.bands.step(current, distance) {
          BandStep::Stay => LodSwitchEvent::Unchanged,
          BandStep::Move(index) => self.select(index, now),
          BandStep::Miss => {
            self.make_current(None, now);
            self.missed = true;
            tracing::debug!(from = current, distance, "no LOD band for view distance");
            LodSwitchEvent::Cleared { from: current }
          }
        },
      }
    };

    self.evict_expired(now);
    event
  }

  /// Make `index` current, going through preparation if its content is
  /// not ready.
  fn select(&mut self, index: usize, now: Instant) -> LodSwitchEvent {
    let from = self.current;
    if from == Some(index) {
      return LodSwitchEvent::Unchanged;
    }

    match self.child(index).and_then(|child| child.preparable()) {
      Some(content) if !content.is_ready() => {
        let done = submit_with_completion(&*self.queue, move || content.prepare());
        self.pending = Some(PendingChange { index, done });
        tracing::debug!(index, "LOD preparation started");
        LodSwitchEvent::PreparationStarted { index }
      }
      _ => {
        self.make_current(Some(index), now);
        tracing::debug!(?from, to = index, "LOD band selected");
        LodSwitchEvent::Selected { from, to: index }
      }
    }
  }

  fn poll_pending(&mut self, now: Instant) -> LodSwitchEvent {
    let Some(pending) = &self.pending else {
      return LodSwitchEvent::Unchanged;
    };
    let outcome = match pending.done.try_recv() {
      Ok(outcome) => outcome,
      Err(TryRecvError::Empty) => return LodSwitchEvent::Unchanged,
      Err(TryRecvError::Disconnected) => Err(PrepareError::Failed(
        "preparation job was dropped".to_owned(),
      )),
    };
    let index = pending.index;
    self.pending = None;

    match outcome {
      Ok(()) => {
        if let Some(content) = self.child(index).and_then(|child| child.preparable()) {
          content.activate();
        }
        let from = self.current;
        self.make_current(Some(index), now);
        tracing::debug!(?from, to = index, "LOD band activated");
        LodSwitchEvent::Activated { from, to: index }
      }
      Err(error) => {
        tracing::warn!(index, %error, "LOD preparation failed");
        LodSwitchEvent::PreparationFailed { index, error }
      }
    }
  }

  /// Switch the current band, stamping the one being left.
  fn make_current(&mut self, new: Option<usize>, now: Instant) {
    let old = self.current;
    if old == new {
      return;
    }
    if let Some(entry) = old.and_then(|old| self.bands.item_mut(old)) {
      if !entry.eternal {
        entry.last_active = Some(now);
      }
    }
    self.current = new;
    if new.is_some() {
      self.missed = false;
    }
  }

  /// Deactivate and release content that has been inactive for longer
  /// than the retention window. Returns the number of releases dispatched.
  fn evict_expired(&mut self, now: Instant) -> usize {
    let Some(farthest) = self.bands.last_index() else {
      return 0;
    };
    let window = self.config.retention_window;
    let pending = self.pending_change();
    let mut evicted = 0;

    for index in 0..farthest {
      if Some(index) == self.current || Some(index) == pending {
        continue;
      }
      let Some(entry) = self.bands.item_mut(index) else {
        continue;
      };
      let Some(since) = entry.last_active else {
        continue;
      };
      if entry.eternal || now.saturating_duration_since(since) <= window {
        continue;
      }
      entry.last_active = None;

      let Some(content) = entry.child.preparable() else {
        continue;
      };
      if !content.is_ready() {
        continue;
      }

      content.deactivate();
      self.queue.enqueue(Box::new(move || {
        if let Err(error) = content.release_resources() {
          tracing::warn!(%error, "releasing LOD content failed");
        }
      }));
      tracing::debug!(index, "LOD content released after retention window");
      evicted += 1;
    }

    self.evictions += evicted;
    evicted
  }
}

impl<T> Switchable for LodSwitch<T> {
  fn which_child(&self) -> Option<usize> {
    self.current
  }
}

impl<T> Transformable for LodSwitch<T> {
  fn transform(&self) -> DAffine3 {
    self.transform
  }

  fn set_transform(&mut self, transform: DAffine3) {
    self.transform = transform;
  }
}

impl<T> fmt::Debug for LodSwitch<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("LodSwitch")
      .field("bands", &self.bands.len())
      .field("current", &self.current)
      .field("pending", &self.pending.as_ref().map(|pending| pending.index))
      .field("config", &self.config)
      .finish()
  }
}

#[cfg(test)]
#[path = "switch_test.rs"]
mod switch_test;
