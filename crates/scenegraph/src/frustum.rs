//! View frustum and box classification.
//!
//! Planes are stored as `(normal, d)` with the normal pointing into the
//! frustum, so a point `p` is inside a plane when `normal.dot(p) + d >= 0`.

use glam::{DMat4, DVec3, DVec4};

use crate::bounds::DAabb3;

/// Result of classifying a box against a frustum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Classification {
  /// Entirely inside all planes.
  Inside,
  /// Straddles at least one plane.
  Intersecting,
  /// Entirely behind at least one plane.
  Outside,
}

/// Six-plane view frustum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frustum {
  /// Left, right, bottom, top, near, far.
  planes: [DVec4; 6],
}

impl Frustum {
  /// Build from raw planes. Each plane is normalized.
  pub fn from_planes(planes: [DVec4; 6]) -> Self {
    Self {
      planes: planes.map(normalize_plane),
    }
  }

  /// Extract planes from a view-projection matrix (Gribb/Hartmann).
  ///
  /// Assumes glam's `[0, 1]` clip depth convention (`perspective_rh`,
  /// `orthographic_rh`).
  pub fn from_view_projection(view_projection: &DMat4) -> Self {
    let r0 = view_projection.row(0);
    let r1 = view_projection.row(1);
    let r2 = view_projection.row(2);
    let r3 = view_projection.row(3);
    Self::from_planes([r3 + r0, r3 - r0, r3 + r1, r3 - r1, r2, r3 - r2])
  }

  /// Axis-aligned box frustum. Handy for top-down and test views.
  pub fn from_aabb(aabb: &DAabb3) -> Self {
    Self::from_planes([
      DVec4::new(1.0, 0.0, 0.0, -aabb.min.x),
      DVec4::new(-1.0, 0.0, 0.0, aabb.max.x),
      DVec4::new(0.0, 1.0, 0.0, -aabb.min.y),
      DVec4::new(0.0, -1.0, 0.0, aabb.max.y),
      DVec4::new(0.0, 0.0, 1.0, -aabb.min.z),
      DVec4::new(0.0, 0.0, -1.0, aabb.max.z),
    ])
  }

  /// The normalized planes.
  pub fn planes(&self) -> &[DVec4; 6] {
    &self.planes
  }

  /// Classify an AABB using the positive/negative vertex test.
  pub fn classify_aabb(&self, aabb: &DAabb3) -> Classification {
    let mut result = Classification::Inside;
    for plane in &self.planes {
      let normal = plane.truncate();
      // Corner farthest along the normal
      let positive = DVec3::select(normal.cmpge(DVec3::ZERO), aabb.max, aabb.min);
      if normal.dot(positive) + plane.w < 0.0 {
        return Classification::Outside;
      }
      let negative = DVec3::select(normal.cmpge(DVec3::ZERO), aabb.min, aabb.max);
      if normal.dot(negative) + plane.w < 0.0 {
        result = Classification::Intersecting;
      }
    }
    result
  }

  /// Check if a point lies inside all planes.
  pub fn contains_point(&self, point: DVec3) -> bool {
    self
      .planes
      .iter()
      .all(|plane| plane.truncate().dot(point) + plane.w >= 0.0)
  }
}

fn normalize_plane(plane: DVec4) -> DVec4 {
  let length = plane.truncate().length();
  if length > 0.0 {
    plane / length
  } else {
    plane
  }
}
