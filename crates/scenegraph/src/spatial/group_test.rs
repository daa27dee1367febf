use glam::{DAffine3, DVec3};

use super::*;
use crate::context::{RenderOptions, SceneContext};
use crate::frustum::Frustum;
use crate::spatial::{Plane, RenderBin, SplitMode};

fn config() -> SpatialIndexConfig {
  SpatialIndexConfig {
    world_bounds: DAabb3::new(DVec3::splat(-10.0), DVec3::splat(10.0)),
    split_mode: SplitMode::Quad(Plane::XZ),
    min_nodes_before_split: 1,
    max_level_for_extended_cells: 4,
    max_depth: 8,
  }
}

/// Unit box centered on the origin, placed by its transform.
fn unit_box() -> DAabb3 {
  DAabb3::from_center_half_extents(DVec3::ZERO, DVec3::splat(0.5))
}

fn node_at(id: u64, kind: NodeKind, x: f64, z: f64) -> SceneNode {
  SceneNode::new(NodeId(id), kind, unit_box())
    .with_transform(DAffine3::from_translation(DVec3::new(x, 0.0, z)))
}

fn low_quadrant_view() -> CullContext {
  CullContext::new(
    Frustum::from_aabb(&DAabb3::new(
      DVec3::new(-10.0, -10.0, -10.0),
      DVec3::new(-1.0, 10.0, -1.0),
    )),
    DVec3::new(-5.0, 0.0, -5.0),
  )
}

fn emitted(bin: &RenderBin) -> Vec<NodeId> {
  let mut ids: Vec<NodeId> = bin.node_ids().collect();
  ids.sort();
  ids
}

#[test]
fn test_new_uses_context_options() {
  let mut options = RenderOptions::default();
  options.spatial = config();
  options.frustum_culling_enabled = false;
  let context = SceneContext::new(options);

  let group = SpatialGroup::new(&context).unwrap();
  assert_eq!(group.index().config(), &config());
  assert!(group.is_empty());

  // Culling disabled: children outside the view still come through
  let mut group = group;
  group.add_child(node_at(1, NodeKind::Shape, 5.0, 5.0)).unwrap();
  let mut bin = RenderBin::new();
  group.cull_special_node(&low_quadrant_view(), &mut bin);
  assert_eq!(emitted(&bin), vec![NodeId(1)]);
}

#[test]
fn test_add_and_remove_keep_index_in_sync() {
  let mut group = SpatialGroup::with_config(NodeId(100), config()).unwrap();
  group.add_child(node_at(1, NodeKind::Shape, -5.0, -5.0)).unwrap();
  group.add_child(node_at(2, NodeKind::Light, 5.0, 5.0)).unwrap();
  assert_eq!(group.len(), 2);
  assert_eq!(group.index().len(), 2);

  assert_eq!(
    group.add_child(node_at(1, NodeKind::Shape, 0.0, 0.0)),
    Err(SceneError::DuplicateNode(NodeId(1)))
  );

  let removed = group.remove_child(NodeId(2)).unwrap();
  assert_eq!(removed.kind(), NodeKind::Light);
  assert!(!group.index().contains(NodeId(2)));
  assert_eq!(group.index().len(), 1);

  assert!(matches!(
    group.remove_child(NodeId(2)),
    Err(SceneError::UnknownNode(_))
  ));
}

#[test]
fn test_transform_relocates_child() {
  let mut group = SpatialGroup::with_config(NodeId(100), config()).unwrap();
  group.add_child(node_at(1, NodeKind::Shape, -5.0, -5.0)).unwrap();
  group.add_child(node_at(2, NodeKind::Shape, 5.0, 5.0)).unwrap();

  let view = low_quadrant_view();
  let mut bin = RenderBin::new();
  group.cull_special_node(&view, &mut bin);
  assert_eq!(emitted(&bin), vec![NodeId(1)]);

  group
    .set_child_transform(NodeId(2), DAffine3::from_translation(DVec3::new(-6.0, 0.0, -4.0)))
    .unwrap();
  let moved = group.child(NodeId(2)).unwrap().world_bounds();
  assert_eq!(group.index().bounds_of(NodeId(2)), Some(moved));

  bin.clear();
  group.cull_special_node(&view, &mut bin);
  assert_eq!(emitted(&bin), vec![NodeId(1), NodeId(2)]);

  assert!(matches!(
    group.set_child_transform(NodeId(9), DAffine3::IDENTITY),
    Err(SceneError::UnknownNode(_))
  ));
}

#[test]
fn test_local_bounds_change_relocates_child() {
  let mut group = SpatialGroup::with_config(NodeId(100), config()).unwrap();
  group.add_child(node_at(1, NodeKind::Shape, -5.0, -5.0)).unwrap();
  group.add_child(node_at(2, NodeKind::Shape, 5.0, 5.0)).unwrap();
  let before = group.index().cell_of(NodeId(1));

  // Grown past the split planes, so it moves up to the root
  group
    .set_child_local_bounds(NodeId(1), DAabb3::from_center_half_extents(DVec3::ZERO, DVec3::splat(6.0)))
    .unwrap();
  assert_ne!(group.index().cell_of(NodeId(1)), before);
  assert_eq!(group.index().cell_of(NodeId(1)), Some(group.index().root()));
}

#[test]
fn test_edit_without_bounds_change_keeps_cell() {
  let mut group = SpatialGroup::with_config(NodeId(100), config()).unwrap();
  group.add_child(node_at(1, NodeKind::Shape, -5.0, -5.0)).unwrap();
  group.add_child(node_at(2, NodeKind::Shape, 5.0, 5.0)).unwrap();
  let before = group.index().cell_of(NodeId(1));

  group
    .update_child(NodeId(1), |node| {
      *node = node.clone().with_name("renamed");
    })
    .unwrap();
  assert_eq!(group.child(NodeId(1)).unwrap().name(), "renamed");
  assert_eq!(group.index().cell_of(NodeId(1)), before);
}

#[test]
fn test_shadow_pass_emits_shapes_only() {
  let mut group = SpatialGroup::with_config(NodeId(100), config()).unwrap();
  group.add_child(node_at(1, NodeKind::Shape, -5.0, -5.0)).unwrap();
  group.add_child(node_at(2, NodeKind::Light, -4.0, -6.0)).unwrap();
  group.add_child(node_at(3, NodeKind::Sound, -6.0, -4.0)).unwrap();

  let mut bin = RenderBin::new();
  group.cull_special_node(&low_quadrant_view(), &mut bin);
  assert_eq!(emitted(&bin), vec![NodeId(1), NodeId(2), NodeId(3)]);

  bin.clear();
  let stats = group.cull_special_node(&low_quadrant_view().shadow_pass(), &mut bin);
  assert_eq!(emitted(&bin), vec![NodeId(1)]);
  assert_eq!(stats.items_emitted, 1);
}

#[test]
fn test_atoms_carry_view_distance() {
  let mut group = SpatialGroup::with_config(NodeId(100), config()).unwrap();
  group.add_child(node_at(1, NodeKind::Shape, -2.0, -5.0)).unwrap();
  group.add_child(node_at(2, NodeKind::Shape, -8.0, -5.0)).unwrap();

  let mut bin = RenderBin::new();
  group.cull_special_node(&low_quadrant_view(), &mut bin);
  bin.sort_front_to_back();

  let atoms = bin.atoms();
  assert_eq!(atoms.len(), 2);
  assert!((atoms[0].view_distance - 3.0).abs() < 1e-9);
  assert!((atoms[1].view_distance - 3.0).abs() < 1e-9);
  assert_eq!(atoms[0].kind, NodeKind::Shape);
}

#[test]
fn test_clear_empties_group_and_index() {
  let mut group = SpatialGroup::with_config(NodeId(100), config()).unwrap();
  for i in 0..6 {
    group.add_child(node_at(i, NodeKind::Shape, -8.0 + 3.0 * i as f64, 2.0)).unwrap();
  }
  group.clear();
  assert!(group.is_empty());
  assert!(group.index().is_empty());
  assert_eq!(group.index().cell_count(), 1);
}
