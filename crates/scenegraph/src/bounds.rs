//! Axis-aligned bounding box with double precision for huge worlds.

use glam::{DAffine3, DVec3};

/// Double-precision axis-aligned bounding box.
///
/// Used for scene node bounds and for the regions covered by spatial index
/// cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DAabb3 {
  /// Minimum corner (inclusive).
  pub min: DVec3,
  /// Maximum corner (inclusive).
  pub max: DVec3,
}

impl DAabb3 {
  /// Create a new AABB from min and max corners.
  ///
  /// # Panics
  /// Debug-asserts that min <= max on all axes.
  pub fn new(min: DVec3, max: DVec3) -> Self {
    debug_assert!(
      min.x <= max.x && min.y <= max.y && min.z <= max.z,
      "AABB min must be <= max on all axes"
    );
    Self { min, max }
  }

  /// Create a new AABB from center and half-extents.
  pub fn from_center_half_extents(center: DVec3, half_extents: DVec3) -> Self {
    Self {
      min: center - half_extents,
      max: center + half_extents,
    }
  }

  /// Degenerate box around a single point.
  pub fn from_point(point: DVec3) -> Self {
    Self {
      min: point,
      max: point,
    }
  }

  /// Check if this AABB overlaps with another.
  ///
  /// Two AABBs overlap if they share any interior or boundary points.
  #[inline]
  pub fn overlaps(&self, other: &DAabb3) -> bool {
    self.min.x <= other.max.x
      && self.max.x >= other.min.x
      && self.min.y <= other.max.y
      && self.max.y >= other.min.y
      && self.min.z <= other.max.z
      && self.max.z >= other.min.z
  }

  /// Check if this AABB contains a point.
  #[inline]
  pub fn contains_point(&self, point: DVec3) -> bool {
    point.x >= self.min.x
      && point.x <= self.max.x
      && point.y >= self.min.y
      && point.y <= self.max.y
      && point.z >= self.min.z
      && point.z <= self.max.z
  }

  /// Check if `other` lies entirely inside this AABB (boundaries included).
  #[inline]
  pub fn contains(&self, other: &DAabb3) -> bool {
    other.min.cmpge(self.min).all() && other.max.cmple(self.max).all()
  }

  /// Smallest AABB enclosing both boxes.
  #[inline]
  pub fn union(&self, other: &DAabb3) -> DAabb3 {
    DAabb3 {
      min: self.min.min(other.min),
      max: self.max.max(other.max),
    }
  }

  /// Get the size of the AABB (max - min).
  #[inline]
  pub fn size(&self) -> DVec3 {
    self.max - self.min
  }

  /// Get the center of the AABB.
  #[inline]
  pub fn center(&self) -> DVec3 {
    (self.min + self.max) * 0.5
  }

  /// Half of the size along each axis.
  #[inline]
  pub fn half_extents(&self) -> DVec3 {
    self.size() * 0.5
  }

  /// Bounds of this box after applying an affine transform.
  ///
  /// The result encloses all 8 transformed corners, so rotated boxes grow.
  pub fn transformed(&self, transform: &DAffine3) -> DAabb3 {
    let mut min = DVec3::splat(f64::INFINITY);
    let mut max = DVec3::splat(f64::NEG_INFINITY);
    for corner in 0..8u8 {
      let local = DVec3::new(
        if corner & 1 == 0 { self.min.x } else { self.max.x },
        if corner & 2 == 0 { self.min.y } else { self.max.y },
        if corner & 4 == 0 { self.min.z } else { self.max.z },
      );
      let world = transform.transform_point3(local);
      min = min.min(world);
      max = max.max(world);
    }
    DAabb3 { min, max }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_new() {
    let aabb = DAabb3::new(DVec3::new(-1.0, -2.0, -3.0), DVec3::new(1.0, 2.0, 3.0));
    assert_eq!(aabb.min, DVec3::new(-1.0, -2.0, -3.0));
    assert_eq!(aabb.max, DVec3::new(1.0, 2.0, 3.0));
  }

  #[test]
  fn test_from_center_half_extents() {
    let aabb = DAabb3::from_center_half_extents(DVec3::ZERO, DVec3::splat(10.0));
    assert_eq!(aabb.min, DVec3::splat(-10.0));
    assert_eq!(aabb.max, DVec3::splat(10.0));
    assert_eq!(aabb.half_extents(), DVec3::splat(10.0));
  }

  #[test]
  fn test_overlaps_touching() {
    // Touching at boundary should count as overlapping
    let a = DAabb3::new(DVec3::ZERO, DVec3::splat(10.0));
    let b = DAabb3::new(DVec3::splat(10.0), DVec3::splat(20.0));
    assert!(a.overlaps(&b));
    assert!(b.overlaps(&a));
  }

  #[test]
  fn test_overlaps_false() {
    let a = DAabb3::new(DVec3::ZERO, DVec3::splat(10.0));
    let b = DAabb3::new(DVec3::splat(11.0), DVec3::splat(20.0));
    assert!(!a.overlaps(&b));
  }

  #[test]
  fn test_contains_box() {
    let outer = DAabb3::new(DVec3::ZERO, DVec3::splat(10.0));
    assert!(outer.contains(&DAabb3::new(DVec3::splat(1.0), DVec3::splat(9.0))));
    assert!(outer.contains(&outer), "a box contains itself");
    assert!(!outer.contains(&DAabb3::new(DVec3::splat(5.0), DVec3::splat(11.0))));
    assert!(outer.contains_point(DVec3::splat(10.0)));
  }

  #[test]
  fn test_union() {
    let a = DAabb3::new(DVec3::ZERO, DVec3::ONE);
    let b = DAabb3::new(DVec3::splat(-2.0), DVec3::splat(0.5));
    let u = a.union(&b);
    assert_eq!(u.min, DVec3::splat(-2.0));
    assert_eq!(u.max, DVec3::ONE);
  }

  #[test]
  fn test_transformed_translation() {
    let aabb = DAabb3::new(DVec3::splat(-1.0), DVec3::splat(1.0));
    let moved = aabb.transformed(&DAffine3::from_translation(DVec3::new(10.0, 0.0, -5.0)));
    assert_eq!(moved.min, DVec3::new(9.0, -1.0, -6.0));
    assert_eq!(moved.max, DVec3::new(11.0, 1.0, -4.0));
  }

  #[test]
  fn test_transformed_rotation_grows() {
    let aabb = DAabb3::new(DVec3::new(-1.0, -1.0, -1.0), DVec3::new(1.0, 1.0, 1.0));
    let rotated = aabb.transformed(&DAffine3::from_rotation_y(std::f64::consts::FRAC_PI_4));
    let expected = 2.0_f64.sqrt();
    assert!((rotated.max.x - expected).abs() < 1e-9);
    assert!((rotated.max.y - 1.0).abs() < 1e-9);
  }
}
