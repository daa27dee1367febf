//! LodShape - a shape whose representation is picked by view distance.
//!
//! Bands carry a name instead of a child. Every change is reported
//! synchronously to a [`LodChangeHandler`]; there is no preparation step
//! and nothing is released, so the first activation goes straight to the
//! nearest band.

use std::collections::HashMap;
use std::fmt;

use glam::{DAffine3, DVec3};

use crate::error::Result;
use crate::node::{Switchable, Transformable};

use super::bands::{BandStep, BandTable};

/// Receives every level change of a [`LodShape`].
pub trait LodChangeHandler {
  /// `name` is the name of the new band, `None` when nothing is shown.
  fn on_lod_changed(&mut self, old: Option<usize>, new: Option<usize>, name: Option<&str>);
}

/// Shape with named distance bands.
pub struct LodShape<H> {
  bands: BandTable<String>,
  current: Option<usize>,
  /// `current` is `None` because the distance fell outside every band.
  missed: bool,
  transform: DAffine3,
  handler: H,
}

impl<H: LodChangeHandler> LodShape<H> {
  pub fn new(handler: H) -> Self {
    Self {
      bands: BandTable::new(),
      current: None,
      missed: false,
      transform: DAffine3::IDENTITY,
      handler,
    }
  }

  pub fn handler(&self) -> &H {
    &self.handler
  }

  pub fn handler_mut(&mut self) -> &mut H {
    &mut self.handler
  }

  pub fn band_count(&self) -> usize {
    self.bands.len()
  }

  /// `(min, max, name)` of band `index`.
  pub fn band(&self, index: usize) -> Option<(f64, f64, &str)> {
    self
      .bands
      .get(index)
      .map(|band| (band.min, band.max, band.item.as_str()))
  }

  pub fn current_lod(&self) -> Option<usize> {
    self.current
  }

  pub fn current_name(&self) -> Option<&str> {
    self
      .current
      .and_then(|index| self.bands.get(index))
      .map(|band| band.item.as_str())
  }

  pub fn set_world_translation(&mut self, translation: DVec3) {
    self.transform.translation = translation;
  }

  pub fn add_lod(&mut self, name: impl Into<String>, min: f64, max: f64) -> Result<usize> {
    let index = self.bands.insert(name.into(), min, max)?;
    if let Some(current) = self.current.as_mut() {
      if *current >= index {
        *current += 1;
      }
    }
    Ok(index)
  }

  /// Replace band `index`. Renaming the current band is reported to the
  /// handler right away. Returns the previous name.
  pub fn set_lod(&mut self, index: usize, name: impl Into<String>, min: f64, max: f64) -> Result<String> {
    let old = self.bands.set(index, name.into(), min, max)?;
    if self.current == Some(index) {
      self.change_to(Some(index));
    }
    Ok(old)
  }

  /// Remove band `index`. Removing the current band is reported to the
  /// handler right away and the next update selects band 0.
  pub fn remove_lod(&mut self, index: usize) -> Result<String> {
    let removed = self.bands.remove(index)?;
    match self.current {
      Some(current) if current == index => {
        self.missed = false;
        self.change_to(None);
      }
      Some(current) if current > index => self.current = Some(current - 1),
      _ => {}
    }
    Ok(removed.item)
  }

  /// Per-frame update. Returns true when the level changed.
  #[tracing::instrument(skip_all, name = "lod_shape::update")]
  pub fn update_lod(&mut self, view_position: DVec3) -> bool {
    if self.bands.is_empty() {
      if self.current.is_some() {
        self.change_to(None);
        return true;
      }
      return false;
    }

    let distance = view_position.distance(self.world_translation());
    let next = match self.current {
      None if self.missed => match self.bands.find(distance) {
        Some(index) => Some(index),
        None => return false,
      },
      None => Some(0),
      Some(current) => match self.bands.step(current, distance) {
        BandStep::Stay => return false,
        BandStep::Move(index) => Some(index),
        BandStep::Miss => {
          self.missed = true;
          None
        }
      },
    };

    self.change_to(next);
    true
  }

  fn change_to(&mut self, new: Option<usize>) {
    let old = self.current;
    self.current = new;
    if new.is_some() {
      self.missed = false;
    }
    let name = new
      .and_then(|index| self.bands.get(index))
      .map(|band| band.item.as_str());
    tracing::debug!(?old, ?new, name, "LOD shape level changed");
    self.handler.on_lod_changed(old, new, name);
  }
}

impl<H> Switchable for LodShape<H> {
  fn which_child(&self) -> Option<usize> {
    self.current
  }
}

impl<H> Transformable for LodShape<H> {
  fn transform(&self) -> DAffine3 {
    self.transform
  }

  fn set_transform(&mut self, transform: DAffine3) {
    self.transform = transform;
  }
}

impl<H: fmt::Debug> fmt::Debug for LodShape<H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("LodShape")
      .field("bands", &self.bands)
      .field("current", &self.current)
      .field("handler", &self.handler)
      .finish()
  }
}

/// Handler that swaps a geometry and an appearance by level name.
///
/// Levels are looked up by band name, so band edits on the shape never
/// desynchronize the payloads. An unknown name shows nothing.
#[derive(Clone, Debug)]
pub struct ShapeLevels<G, A> {
  levels: HashMap<String, (G, A)>,
  geometry: Option<G>,
  appearance: Option<A>,
  changes: usize,
}

impl<G: Clone, A: Clone> Default for ShapeLevels<G, A> {
  fn default() -> Self {
    Self {
      levels: HashMap::new(),
      geometry: None,
      appearance: None,
      changes: 0,
    }
  }
}

impl<G: Clone, A: Clone> ShapeLevels<G, A> {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register the payload shown for band `name`.
  pub fn insert_level(&mut self, name: impl Into<String>, geometry: G, appearance: A) -> Option<(G, A)> {
    self.levels.insert(name.into(), (geometry, appearance))
  }

  pub fn remove_level(&mut self, name: &str) -> Option<(G, A)> {
    self.levels.remove(name)
  }

  /// Geometry currently shown.
  pub fn geometry(&self) -> Option<&G> {
    self.geometry.as_ref()
  }

  /// Appearance currently shown.
  pub fn appearance(&self) -> Option<&A> {
    self.appearance.as_ref()
  }

  /// Level changes received so far.
  pub fn change_count(&self) -> usize {
    self.changes
  }
}

impl<G: Clone, A: Clone> LodChangeHandler for ShapeLevels<G, A> {
  fn on_lod_changed(&mut self, _old: Option<usize>, _new: Option<usize>, name: Option<&str>) {
    let level = name.and_then(|name| self.levels.get(name));
    self.geometry = level.map(|(geometry, _)| geometry.clone());
    self.appearance = level.map(|(_, appearance)| appearance.clone());
    self.changes += 1;
  }
}

#[cfg(test)]
#[path = "shape_test.rs"]
mod shape_test;
