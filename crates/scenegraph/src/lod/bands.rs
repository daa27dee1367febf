//! BandTable - ascending, non-overlapping view distance bands.
//!
//! Bands are kept sorted by `min`. Containment is inclusive on both ends
//! and neighbours may share a boundary value; two bands overlap only when
//! their intervals intersect strictly. Every mutation validates first and
//! leaves the table untouched on error.

use crate::error::{Result, SceneError};

/// One `[min, max]` distance range and its payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Band<T> {
  pub min: f64,
  pub max: f64,
  pub item: T,
}

impl<T> Band<T> {
  #[inline]
  pub fn contains(&self, distance: f64) -> bool {
    self.min <= distance && distance <= self.max
  }

  #[inline]
  fn overlaps(&self, min: f64, max: f64) -> bool {
    self.min < max && min < self.max
  }
}

/// Result of re-evaluating the current band for a new distance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BandStep {
  /// Distance still inside the current band.
  Stay,
  /// Nearest band in the direction of travel that contains the distance.
  Move(usize),
  /// No band in the direction of travel contains the distance.
  Miss,
}

/// Sorted band table shared by [`LodSwitch`](super::LodSwitch) and
/// [`LodShape`](super::LodShape).
#[derive(Clone, Debug, PartialEq)]
pub struct BandTable<T> {
  bands: Vec<Band<T>>,
}

impl<T> Default for BandTable<T> {
  fn default() -> Self {
    Self { bands: Vec::new() }
  }
}

impl<T> BandTable<T> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.bands.len()
  }

  pub fn is_empty(&self) -> bool {
    self.bands.is_empty()
  }

  pub fn get(&self, index: usize) -> Option<&Band<T>> {
    self.bands.get(index)
  }

  /// Mutable access to a payload. Ranges can only change through
  /// [`set`](Self::set).
  pub fn item_mut(&mut self, index: usize) -> Option<&mut T> {
    self.bands.get_mut(index).map(|band| &mut band.item)
  }

  pub fn iter(&self) -> impl Iterator<Item = &Band<T>> {
    self.bands.iter()
  }

  /// Index of the farthest band.
  pub fn last_index(&self) -> Option<usize> {
    self.bands.len().checked_sub(1)
  }

  /// Insert a band at its sorted position and return that position.
  pub fn insert(&mut self, item: T, min: f64, max: f64) -> Result<usize> {
    check_range(min, max)?;
    self.check_overlap(min, max, None)?;
    // A zero-width band sorts before a band starting at the same value
    let index = self
      .bands
      .partition_point(|band| band.min < min || (band.min == min && band.max <= max));
    self.bands.insert(index, Band { min, max, item });
    Ok(index)
  }

  /// Replace the band at `index` in place. The new range must keep the
  /// band at the same sorted position. Returns the previous payload.
  pub fn set(&mut self, index: usize, item: T, min: f64, max: f64) -> Result<T> {
    self.check_index(index)?;
    check_range(min, max)?;
    self.check_overlap(min, max, Some(index))?;

    let after_prev = index == 0 || self.bands[index - 1].min <= min;
    let before_next = self.bands.get(index + 1).map_or(true, |next| min <= next.min);
    if !(after_prev && before_next) {
      return Err(SceneError::MisplacedBand { index, min, max });
    }

    let old = std::mem::replace(&mut self.bands[index], Band { min, max, item });
    Ok(old.item)
  }

  /// Remove the band at `index`, shifting later bands down by one.
  pub fn remove(&mut self, index: usize) -> Result<Band<T>> {
    self.check_index(index)?;
    Ok(self.bands.remove(index))
  }

  /// Full linear scan: first band containing `distance`.
  pub fn find(&self, distance: f64) -> Option<usize> {
    self.bands.iter().position(|band| band.contains(distance))
  }

  /// Re-evaluate `current` for a new distance, scanning outward from it.
  ///
  /// The scan runs to the end of the table in the direction of travel, so
  /// a jump across several bands lands where a full scan would, except on
  /// a shared boundary where the current band wins.
  pub fn step(&self, current: usize, distance: f64) -> BandStep {
    let Some(band) = self.bands.get(current) else {
      return BandStep::Miss;
    };

    let found = if distance < band.min {
      (0..current).rev().find(|&i| self.bands[i].contains(distance))
    } else if distance > band.max {
      (current + 1..self.bands.len()).find(|&i| self.bands[i].contains(distance))
    } else {
      return BandStep::Stay;
    };

    found.map_or(BandStep::Miss, BandStep::Move)
  }

  fn check_index(&self, index: usize) -> Result<()> {
    if index >= self.bands.len() {
      return Err(SceneError::BandIndexOutOfRange {
        index,
        len: self.bands.len(),
      });
    }
    Ok(())
  }

  fn check_overlap(&self, min: f64, max: f64, skip: Option<usize>) -> Result<()> {
    let neighbor = self
      .bands
      .iter()
      .enumerate()
      .filter(|&(i, _)| Some(i) != skip)
      .map(|(_, band)| band)
      .find(|band| band.overlaps(min, max));

    match neighbor {
      Some(band) => Err(SceneError::OverlappingBand {
        min,
        max,
        neighbor_min: band.min,
        neighbor_max: band.max,
      }),
      None => Ok(()),
    }
  }
}

// NaN fails the comparison too
fn check_range(min: f64, max: f64) -> Result<()> {
  if !(min <= max) {
    return Err(SceneError::InvalidBand { min, max });
  }
  Ok(())
}

#[cfg(test)]
#[path = "bands_test.rs"]
mod bands_test;
