use glam::{DAffine3, DVec3};

use super::*;
use crate::error::SceneError;

type Call = (Option<usize>, Option<usize>, Option<String>);

#[derive(Debug, Default)]
struct Recorder {
  calls: Vec<Call>,
}

impl LodChangeHandler for Recorder {
  fn on_lod_changed(&mut self, old: Option<usize>, new: Option<usize>, name: Option<&str>) {
    self.calls.push((old, new, name.map(str::to_owned)));
  }
}

fn call(old: Option<usize>, new: Option<usize>, name: Option<&str>) -> Call {
  (old, new, name.map(str::to_owned))
}

fn at(distance: f64) -> DVec3 {
  DVec3::new(0.0, 0.0, distance)
}

/// `near [0,10]`, `mid [10,30]`, `far [30,100]`
fn shape() -> LodShape<Recorder> {
  let mut shape = LodShape::new(Recorder::default());
  shape.add_lod("far", 30.0, 100.0).unwrap();
  shape.add_lod("near", 0.0, 10.0).unwrap();
  shape.add_lod("mid", 10.0, 30.0).unwrap();
  shape
}

#[test]
fn test_first_activation_selects_nearest_band() {
  let mut shape = shape();
  assert!(shape.update_lod(at(50.0)));
  assert_eq!(shape.current_lod(), Some(0));
  assert_eq!(shape.current_name(), Some("near"));
  assert_eq!(shape.handler().calls, vec![call(None, Some(0), Some("near"))]);

  // Then follows the distance, across several bands at once
  assert!(shape.update_lod(at(50.0)));
  assert_eq!(shape.current_name(), Some("far"));
  assert_eq!(shape.handler().calls[1], call(Some(0), Some(2), Some("far")));
}

#[test]
fn test_stay_does_not_call_handler() {
  let mut shape = shape();
  shape.update_lod(at(5.0));
  assert!(!shape.update_lod(at(6.0)));
  assert!(!shape.update_lod(at(9.9)));
  assert_eq!(shape.handler().calls.len(), 1);
  assert_eq!(shape.which_child(), Some(0));
}

#[test]
fn test_miss_then_full_scan() {
  let mut shape = shape();
  shape.update_lod(at(5.0));
  shape.update_lod(at(50.0));

  assert!(shape.update_lod(at(500.0)));
  assert_eq!(shape.current_lod(), None);
  assert_eq!(shape.handler().calls.last(), Some(&call(Some(2), None, None)));

  // Still beyond every band
  assert!(!shape.update_lod(at(400.0)));
  assert!(shape.update_lod(at(20.0)));
  assert_eq!(shape.current_name(), Some("mid"));
}

#[test]
fn test_empty_shape_never_calls_handler() {
  let mut shape = LodShape::new(Recorder::default());
  assert!(!shape.update_lod(at(5.0)));
  assert!(shape.handler().calls.is_empty());
}

#[test]
fn test_removing_current_band_clears_and_restarts_at_zero() {
  let mut shape = shape();
  shape.update_lod(at(5.0));
  shape.update_lod(at(20.0));
  assert_eq!(shape.current_lod(), Some(1));

  assert_eq!(shape.remove_lod(1), Ok("mid".to_owned()));
  assert_eq!(shape.current_lod(), None);
  assert_eq!(shape.handler().calls.last(), Some(&call(Some(1), None, None)));

  assert!(shape.update_lod(at(20.0)));
  assert_eq!(shape.current_lod(), Some(0));

  assert!(matches!(
    shape.remove_lod(5),
    Err(SceneError::BandIndexOutOfRange { index: 5, len: 2 })
  ));
}

#[test]
fn test_edits_keep_current_band() {
  let mut shape = shape();
  shape.update_lod(at(5.0));
  shape.update_lod(at(50.0));
  assert_eq!(shape.current_lod(), Some(2));

  assert_eq!(shape.add_lod("closest", -5.0, 0.0), Ok(0));
  assert_eq!(shape.current_lod(), Some(3));
  assert_eq!(shape.current_name(), Some("far"));

  shape.remove_lod(0).unwrap();
  assert_eq!(shape.current_name(), Some("far"));

  assert!(shape.add_lod("bad", 25.0, 40.0).is_err());
  assert_eq!(shape.band_count(), 3);
}

#[test]
fn test_renaming_current_band_notifies() {
  let mut shape = shape();
  shape.update_lod(at(5.0));
  assert_eq!(shape.set_lod(0, "near-hd", 0.0, 10.0), Ok("near".to_owned()));
  assert_eq!(shape.handler().calls.last(), Some(&call(Some(0), Some(0), Some("near-hd"))));
  assert_eq!(shape.band(0), Some((0.0, 10.0, "near-hd")));

  // Renaming another band is silent
  let calls = shape.handler().calls.len();
  shape.set_lod(2, "far-lo", 30.0, 100.0).unwrap();
  assert_eq!(shape.handler().calls.len(), calls);
}

#[test]
fn test_distance_uses_transform() {
  let mut shape = shape();
  shape.set_transform(DAffine3::from_translation(DVec3::new(0.0, 0.0, 100.0)));
  shape.update_lod(DVec3::ZERO);
  shape.update_lod(DVec3::ZERO);
  assert_eq!(shape.current_name(), Some("far"));
  shape.update_lod(DVec3::new(0.0, 0.0, 95.0));
  assert_eq!(shape.current_name(), Some("near"));
}

#[test]
fn test_shape_levels_swap_geometry_and_appearance() {
  let mut levels: ShapeLevels<&str, &str> = ShapeLevels::new();
  levels.insert_level("near", "hi-poly", "detailed");
  levels.insert_level("far", "lo-poly", "flat");

  let mut shape = LodShape::new(levels);
  shape.add_lod("near", 0.0, 10.0).unwrap();
  shape.add_lod("mid", 10.0, 30.0).unwrap();
  shape.add_lod("far", 30.0, 100.0).unwrap();

  shape.update_lod(at(2.0));
  assert_eq!(shape.handler().geometry(), Some(&"hi-poly"));
  assert_eq!(shape.handler().appearance(), Some(&"detailed"));

  shape.update_lod(at(80.0));
  assert_eq!(shape.handler().geometry(), Some(&"lo-poly"));
  assert_eq!(shape.handler().appearance(), Some(&"flat"));

  // No payload registered for "mid"
  shape.update_lod(at(20.0));
  assert_eq!(shape.handler().geometry(), None);
  assert_eq!(shape.handler().change_count(), 3);

  shape.handler_mut().insert_level("mid", "mid-poly", "plain");
  shape.set_lod(1, "mid", 10.0, 30.0).unwrap();
  assert_eq!(shape.handler().geometry(), Some(&"mid-poly"));
}
