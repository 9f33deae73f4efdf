//! Camera and Frustum Tests
//!
//! Tests for:
//! - Perspective/Orthographic projection matrix generation
//! - View matrix as the inverse of the world transform
//! - Frustum plane extraction (Gribb-Hartmann)
//! - Frustum-sphere intersection
//! - Frustum-AABB intersection
//! - Arbitrary convex volumes
//! - View description extraction from a camera

use glam::{Affine3A, Mat4, Vec3, Vec4};

use sable::renderer::core::{ClearFlags, RenderTargetHandle};
use sable::renderer::view::RendererViewDesc;
use sable::scene::{BoundingBox, BoundingSphere, Camera, ConvexVolume, ProjectionType};

const EPSILON: f32 = 1e-4;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn target() -> RenderTargetHandle {
    RenderTargetHandle::from_raw(1)
}

// ============================================================================
// Projection Matrix Tests
// ============================================================================

#[test]
fn perspective_near_maps_to_0_far_maps_to_1() {
    let cam = Camera::new_perspective(60.0, 1.0, 0.1, 100.0, target());
    let proj = cam.projection_matrix();

    let near = proj * Vec4::new(0.0, 0.0, -0.1, 1.0);
    let far = proj * Vec4::new(0.0, 0.0, -100.0, 1.0);

    assert!(approx(near.z / near.w, 0.0), "near plane maps to {}", near.z / near.w);
    assert!(approx(far.z / far.w, 1.0), "far plane maps to {}", far.z / far.w);
}

#[test]
fn perspective_aspect_ratio_affects_fov() {
    let wide = Camera::new_perspective(60.0, 2.0, 0.1, 100.0, target());
    let square = Camera::new_perspective(60.0, 1.0, 0.1, 100.0, target());

    assert_ne!(
        wide.projection_matrix().x_axis.x,
        square.projection_matrix().x_axis.x,
        "Different aspect ratios should produce different X scaling"
    );
}

#[test]
fn orthographic_uses_size_and_aspect() {
    let cam = Camera::new_orthographic(5.0, 2.0, 0.1, 100.0, target());
    assert_eq!(cam.projection_type, ProjectionType::Orthographic);

    let proj = cam.projection_matrix();
    let edge = proj * Vec4::new(10.0, 5.0, -1.0, 1.0);
    assert!(approx(edge.x, 1.0));
    assert!(approx(edge.y, 1.0));
}

// ============================================================================
// View Matrix Tests
// ============================================================================

#[test]
fn position_follows_world_translation() {
    let mut cam = Camera::new_perspective(60.0, 1.0, 0.1, 100.0, target());
    cam.world_transform = Affine3A::from_translation(Vec3::new(0.0, 5.0, 10.0));

    let position = cam.position();
    assert!(approx(position.x, 0.0));
    assert!(approx(position.y, 5.0));
    assert!(approx(position.z, 10.0));
}

#[test]
fn view_matrix_is_inverse_of_world() {
    let mut cam = Camera::new_perspective(60.0, 1.0, 0.1, 100.0, target());
    let world = Affine3A::from_translation(Vec3::new(1.0, 2.0, 3.0));
    cam.world_transform = world;

    let product = Mat4::from(world) * cam.view_matrix();
    for i in 0..4 {
        for j in 0..4 {
            assert!(
                approx(product.col(i)[j], Mat4::IDENTITY.col(i)[j]),
                "World * View should be identity at [{i}][{j}]: {}",
                product.col(i)[j]
            );
        }
    }
}

#[test]
fn forward_is_local_negative_z() {
    let mut cam = Camera::new_perspective(60.0, 1.0, 0.1, 100.0, target());
    assert!(cam.forward().abs_diff_eq(Vec3::NEG_Z, EPSILON));

    cam.world_transform = Affine3A::from_rotation_y(std::f32::consts::FRAC_PI_2);
    assert!(cam.forward().abs_diff_eq(Vec3::NEG_X, EPSILON));
}

// ============================================================================
// Frustum Extraction and Intersection Tests
// ============================================================================

fn make_test_frustum() -> ConvexVolume {
    let cam = Camera::new_perspective(60.0, 1.0, 0.1, 100.0, target());
    cam.world_frustum()
}

#[test]
fn frustum_sphere_inside() {
    let frustum = make_test_frustum();
    assert!(frustum.intersects_sphere(&BoundingSphere::new(Vec3::new(0.0, 0.0, -5.0), 1.0)));
}

#[test]
fn frustum_sphere_outside_left() {
    let frustum = make_test_frustum();
    assert!(!frustum.intersects_sphere(&BoundingSphere::new(Vec3::new(-1000.0, 0.0, -5.0), 1.0)));
}

#[test]
fn frustum_sphere_outside_behind() {
    let frustum = make_test_frustum();
    assert!(!frustum.intersects_sphere(&BoundingSphere::new(Vec3::new(0.0, 0.0, 10.0), 1.0)));
}

#[test]
fn frustum_sphere_beyond_far_plane() {
    let frustum = make_test_frustum();
    assert!(!frustum.intersects_sphere(&BoundingSphere::new(Vec3::new(0.0, 0.0, -200.0), 1.0)));
}

#[test]
fn frustum_sphere_straddling_boundary() {
    let frustum = make_test_frustum();
    assert!(frustum.intersects_sphere(&BoundingSphere::new(Vec3::new(0.0, 0.0, -5.0), 100.0)));
}

#[test]
fn frustum_aabb_inside() {
    let frustum = make_test_frustum();
    let aabb = BoundingBox::new(Vec3::new(-0.5, -0.5, -6.0), Vec3::new(0.5, 0.5, -4.0));
    assert!(frustum.intersects_box(&aabb));
}

#[test]
fn frustum_aabb_outside() {
    let frustum = make_test_frustum();
    let aabb = BoundingBox::new(Vec3::new(-1000.0, -1000.0, -52.0), Vec3::new(-999.0, -999.0, -51.0));
    assert!(!frustum.intersects_box(&aabb));
}

#[test]
fn frustum_aabb_behind_camera() {
    let frustum = make_test_frustum();
    let aabb = BoundingBox::new(Vec3::new(-1.0, -1.0, 5.0), Vec3::new(1.0, 1.0, 10.0));
    assert!(!frustum.intersects_box(&aabb));
}

#[test]
fn translated_camera_moves_frustum() {
    let mut cam = Camera::new_perspective(60.0, 1.0, 0.1, 100.0, target());
    cam.world_transform = Affine3A::from_translation(Vec3::new(500.0, 0.0, 0.0));
    let frustum = cam.world_frustum();

    assert!(frustum.contains_point(Vec3::new(500.0, 0.0, -10.0)));
    assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, -10.0)));
}

// ============================================================================
// Convex Volumes
// ============================================================================

#[test]
fn custom_volume_normalizes_planes() {
    // Half-space x >= 1, written with a non-unit normal.
    let volume = ConvexVolume::new([Vec4::new(2.0, 0.0, 0.0, -2.0)]);

    assert_eq!(volume.plane_count(), 1);
    assert!(approx(volume.plane(0).x, 1.0));
    assert!(approx(volume.plane(0).w, -1.0));
    assert!(volume.contains_point(Vec3::new(1.5, 0.0, 0.0)));
    assert!(!volume.contains_point(Vec3::new(0.5, 0.0, 0.0)));
}

#[test]
fn empty_volume_contains_everything() {
    let volume = ConvexVolume::default();
    assert!(volume.contains_point(Vec3::splat(1.0e6)));
    assert!(volume.intersects_sphere(&BoundingSphere::new(Vec3::ZERO, 0.0)));
}

// ============================================================================
// View Description Extraction
// ============================================================================

#[test]
fn view_desc_copies_camera_state() {
    let mut cam = Camera::new_perspective(60.0, 1.0, 0.5, 50.0, target());
    cam.world_transform = Affine3A::from_translation(Vec3::new(0.0, 2.0, 0.0));
    cam.priority = 3;
    cam.layers = 0b101;

    let desc = RendererViewDesc::from_camera(&cam, Vec4::ONE);

    assert!(approx(desc.near, 0.5));
    assert!(approx(desc.far, 50.0));
    assert!(desc.origin.abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), EPSILON));
    assert!(desc.direction.abs_diff_eq(Vec3::NEG_Z, EPSILON));
    assert_eq!(desc.priority, 3);
    assert_eq!(desc.layers, 0b101);
    assert_eq!(desc.target, target());
    assert!(desc.view_proj().abs_diff_eq(cam.view_projection_matrix(), EPSILON));
}

#[test]
fn view_desc_falls_back_to_scene_clear_color() {
    let mut cam = Camera::new_perspective(60.0, 1.0, 0.1, 100.0, target());
    cam.clear_color = Vec4::new(1.0, 0.0, 0.0, 1.0);

    let scene_color = Vec4::new(0.2, 0.3, 0.4, 1.0);
    assert_eq!(RendererViewDesc::from_camera(&cam, scene_color).clear_color, cam.clear_color);

    cam.clear_flags = ClearFlags::DEPTH;
    assert_eq!(RendererViewDesc::from_camera(&cam, scene_color).clear_color, scene_color);
}
