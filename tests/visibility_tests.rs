//! Visibility Tests
//!
//! Tests for:
//! - Determinism of `calculate_visibility`
//! - Distance cull boundary (inclusive)
//! - Layer masks
//! - Frustum sphere-then-box testing
//! - OR-ing visibility across the views of a group
//! - Visible light gathering and per-renderable light lists

use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Affine3A, Mat4, Vec3};
use slotmap::SlotMap;

use sable::renderer::core::RenderTargetHandle;
use sable::renderer::graph::NodeRegistry;
use sable::renderer::scene::RendererScene;
use sable::renderer::settings::RendererSettings;
use sable::renderer::visibility::{
    CullInfo, RenderableVisibility, RendererViewGroup, ViewCullData, calculate_visibility,
};
use sable::scene::{
    BoundingBox, BoundingSphere, Bounds, Camera, CameraKey, ConvexVolume, Light, LightKey,
    LightType, MaterialId, MeshId, PipelineId, Renderable, RenderableElement, RenderableKey,
};

const EPSILON: f32 = 1e-3;

// ============================================================================
// Helpers
// ============================================================================

/// Camera at the origin looking down -Z with a 90° field of view.
fn forward_view(cull_distance: f32) -> ViewCullData {
    let proj = Mat4::perspective_rh(FRAC_PI_2, 1.0, 0.1, 10_000.0);
    ViewCullData {
        origin: Vec3::ZERO,
        frustum: ConvexVolume::from_matrix(proj),
        layers: u64::MAX,
        cull_distance,
    }
}

fn sphere_at(center: Vec3, radius: f32) -> CullInfo {
    CullInfo::new(Bounds::from_sphere(BoundingSphere::new(center, radius)), 1, 1.0)
}

fn visible(infos: &[CullInfo], view: &ViewCullData) -> Vec<bool> {
    let mut out = vec![false; infos.len()];
    calculate_visibility(infos, view, &mut out);
    out
}

fn cube_renderable(center: Vec3) -> Renderable {
    let mut renderable = Renderable::new(
        vec![RenderableElement::new(MeshId(0), 0, MaterialId(1), PipelineId(1))],
        Bounds::from_box(BoundingBox::new(Vec3::splat(-0.5), Vec3::splat(0.5))),
    );
    renderable.world_transform = Affine3A::from_translation(center);
    renderable
}

struct Keys {
    cameras: SlotMap<CameraKey, ()>,
    renderables: SlotMap<RenderableKey, ()>,
    lights: SlotMap<LightKey, ()>,
}

impl Keys {
    fn new() -> Self {
        Self {
            cameras: SlotMap::with_key(),
            renderables: SlotMap::with_key(),
            lights: SlotMap::with_key(),
        }
    }
}

fn camera(rotation_y: f32) -> Camera {
    let mut camera = Camera::new_perspective(90.0, 1.0, 0.1, 1000.0, RenderTargetHandle::from_raw(1));
    camera.world_transform = Affine3A::from_rotation_y(rotation_y);
    camera
}

// ============================================================================
// calculate_visibility
// ============================================================================

#[test]
fn visibility_is_deterministic() {
    let infos: Vec<CullInfo> = (0..64)
        .map(|i| {
            let angle = i as f32 * 0.37;
            sphere_at(Vec3::new(angle.cos() * 30.0, angle.sin() * 5.0, -(i as f32)), 1.0)
        })
        .collect();
    let view = forward_view(50.0);

    let first = visible(&infos, &view);
    for _ in 0..5 {
        assert_eq!(visible(&infos, &view), first);
    }
    assert!(first.iter().any(|v| *v));
    assert!(first.iter().any(|v| !*v));
}

#[test]
fn object_exactly_at_cull_distance_is_visible() {
    let infos = [sphere_at(Vec3::new(0.0, 0.0, -100.0), 0.0)];
    assert_eq!(visible(&infos, &forward_view(100.0)), vec![true]);
}

#[test]
fn distance_boundary_inside_and_outside() {
    let radius = 2.0;
    let boundary = 100.0 + radius;
    let infos = [
        sphere_at(Vec3::new(0.0, 0.0, -(boundary - EPSILON * 10.0)), radius),
        sphere_at(Vec3::new(0.0, 0.0, -(boundary + EPSILON * 10.0)), radius),
    ];

    assert_eq!(visible(&infos, &forward_view(100.0)), vec![true, false]);
}

#[test]
fn cull_distance_factor_scales_base_distance() {
    let mut near_factor = sphere_at(Vec3::new(0.0, 0.0, -150.0), 0.0);
    near_factor.cull_distance_factor = 2.0;
    let plain = sphere_at(Vec3::new(0.0, 0.0, -150.0), 0.0);

    assert_eq!(visible(&[near_factor, plain], &forward_view(100.0)), vec![true, false]);
}

#[test]
fn infinite_cull_distance_disables_distance_test() {
    let infos = [sphere_at(Vec3::new(0.0, 0.0, -9_000.0), 1.0)];
    assert_eq!(visible(&infos, &forward_view(f32::INFINITY)), vec![true]);
}

#[test]
fn disjoint_layers_are_never_visible() {
    let mut info = sphere_at(Vec3::new(0.0, 0.0, -10.0), 1.0);
    info.layer = 0b0100;
    let mut view = forward_view(f32::INFINITY);
    view.layers = 0b0011;

    assert_eq!(visible(&[info], &view), vec![false]);

    view.layers = 0b0110;
    assert_eq!(visible(&[info], &view), vec![true]);
}

#[test]
fn objects_behind_camera_are_culled() {
    let infos = [sphere_at(Vec3::new(0.0, 0.0, 10.0), 1.0)];
    assert_eq!(visible(&infos, &forward_view(f32::INFINITY)), vec![false]);
}

#[test]
fn sphere_pass_box_fail_is_culled() {
    // Sphere reaches across the left frustum plane, the flat box does not.
    let center = Vec3::new(-11.5, 0.0, -10.0);
    let info = CullInfo::new(
        Bounds::new(
            BoundingBox::from_center_extents(center, Vec3::new(0.05, 0.05, 0.05)),
            BoundingSphere::new(center, 2.0),
        ),
        1,
        1.0,
    );
    let view = forward_view(f32::INFINITY);

    assert!(view.frustum.intersects_sphere(&info.bounds.sphere));
    assert_eq!(visible(&[info], &view), vec![false]);
}

// ============================================================================
// View Groups
// ============================================================================

#[test]
fn group_visibility_is_or_across_views() {
    let mut keys = Keys::new();
    let registry = NodeRegistry::with_builtin_nodes();
    let mut scene = RendererScene::new(&RendererSettings::default());

    scene.register_camera(keys.cameras.insert(()), &camera(0.0), &registry);
    scene.register_camera(keys.cameras.insert(()), &camera(PI), &registry);

    let front = keys.renderables.insert(());
    let back = keys.renderables.insert(());
    let side = keys.renderables.insert(());
    scene.register_renderable(front, &cube_renderable(Vec3::new(0.0, 0.0, -10.0)));
    scene.register_renderable(back, &cube_renderable(Vec3::new(0.0, 0.0, 10.0)));
    scene.register_renderable(side, &cube_renderable(Vec3::new(0.0, 500.0, 0.0)));

    let mut group = RendererViewGroup::new();
    group.set_views([0, 1]);
    let (info, views) = scene.split_mut();
    group.determine_visibility(info, views);

    let vis = group.visibility();
    let index = |key| info.renderable_index(key).unwrap();
    assert!(vis.renderables[index(front)].contains(RenderableVisibility::VISIBLE));
    assert!(vis.renderables[index(back)].contains(RenderableVisibility::VISIBLE));
    assert!(!vis.renderables[index(side)].contains(RenderableVisibility::VISIBLE));

    // Each view queues only what it sees itself.
    assert_eq!(views[0].data().opaque_queue().len(), 1);
    assert_eq!(views[1].data().opaque_queue().len(), 1);
    assert_eq!(views[0].data().opaque_queue().elements()[0].renderable, index(front));
    assert_eq!(views[1].data().opaque_queue().elements()[0].renderable, index(back));
}

#[test]
fn views_outside_the_group_do_not_contribute() {
    let mut keys = Keys::new();
    let registry = NodeRegistry::with_builtin_nodes();
    let mut scene = RendererScene::new(&RendererSettings::default());

    scene.register_camera(keys.cameras.insert(()), &camera(0.0), &registry);
    scene.register_camera(keys.cameras.insert(()), &camera(PI), &registry);
    let back = keys.renderables.insert(());
    scene.register_renderable(back, &cube_renderable(Vec3::new(0.0, 0.0, 10.0)));

    let mut group = RendererViewGroup::new();
    group.set_views([0]);
    let (info, views) = scene.split_mut();
    group.determine_visibility(info, views);

    assert_eq!(group.visibility().visible_renderable_count(), 0);
}

#[test]
fn lights_are_gathered_per_visible_renderable() {
    let mut keys = Keys::new();
    let registry = NodeRegistry::with_builtin_nodes();
    let mut scene = RendererScene::new(&RendererSettings::default());
    scene.register_camera(keys.cameras.insert(()), &camera(0.0), &registry);

    let near = keys.renderables.insert(());
    let far = keys.renderables.insert(());
    scene.register_renderable(near, &cube_renderable(Vec3::new(0.0, 0.0, -10.0)));
    scene.register_renderable(far, &cube_renderable(Vec3::new(0.0, 0.0, -200.0)));

    scene.register_light(keys.lights.insert(()), &Light::new_directional(Vec3::ONE, 1.0, Vec3::NEG_Y));
    scene.register_light(
        keys.lights.insert(()),
        &Light::new_radial(Vec3::ONE, 1.0, Vec3::new(0.0, 0.0, -12.0), 5.0),
    );
    // Behind the camera, never visible.
    scene.register_light(
        keys.lights.insert(()),
        &Light::new_radial(Vec3::ONE, 1.0, Vec3::new(0.0, 0.0, 50.0), 5.0),
    );
    scene.register_light(
        keys.lights.insert(()),
        &Light::new_spot(Vec3::ONE, 1.0, Vec3::new(0.0, 5.0, -200.0), Vec3::NEG_Y, 10.0, 0.3, 0.5),
    );

    let mut group = RendererViewGroup::new();
    group.set_views([0]);
    let (info, views) = scene.split_mut();
    group.determine_visibility(info, views);

    let lights = group.lights();
    assert_eq!(lights.count(LightType::Directional), 1);
    assert_eq!(lights.count(LightType::Radial), 1);
    assert_eq!(lights.count(LightType::Spot), 1);
    assert_eq!(lights.len(), 3);

    // Directional (0) reaches everything; the radial light (1) only the near
    // cube; the spot light (2) only the far one.
    let near_index = info.renderable_index(near).unwrap();
    let far_index = info.renderable_index(far).unwrap();
    assert_eq!(lights.renderable_lights(near_index), &[0, 1]);
    assert_eq!(lights.renderable_lights(far_index), &[0, 2]);
}

#[test]
fn hidden_layers_follow_camera_mask() {
    let mut keys = Keys::new();
    let registry = NodeRegistry::with_builtin_nodes();
    let mut scene = RendererScene::new(&RendererSettings::default());

    let mut cam = camera(0.0);
    cam.layers = 0b01;
    scene.register_camera(keys.cameras.insert(()), &cam, &registry);

    let mut other_layer = cube_renderable(Vec3::new(0.0, 0.0, -10.0));
    other_layer.layer = 0b10;
    scene.register_renderable(keys.renderables.insert(()), &other_layer);

    let mut group = RendererViewGroup::new();
    group.set_views([0]);
    let (info, views) = scene.split_mut();
    group.determine_visibility(info, views);

    assert_eq!(group.visibility().visible_renderable_count(), 0);
    assert!(views[0].data().opaque_queue().is_empty());
}
