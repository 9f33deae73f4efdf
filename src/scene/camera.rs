use std::borrow::Cow;

use glam::{Affine3A, Mat4, Vec3, Vec4};
use smallvec::SmallVec;

use crate::renderer::core::api::{ClearFlags, Rect2, RenderTargetHandle};
use crate::scene::bounds::{BoundingBox, BoundingSphere};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionType {
    Perspective,
    Orthographic,
}

/// Scene camera component.
///
/// Owned by the game-side [`Scene`](crate::scene::Scene); the renderer only
/// reads it when notified through `Renderer::notify_camera_*`.
#[derive(Debug, Clone)]
pub struct Camera {
    pub name: Cow<'static, str>,

    // === Projection ===
    pub projection_type: ProjectionType,
    /// Vertical field of view, in radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub ortho_size: f32,

    pub world_transform: Affine3A,

    // === Output ===
    pub target: RenderTargetHandle,
    /// Normalized viewport rectangle within the target.
    pub viewport: Rect2,
    /// Cameras on the same target render in descending priority.
    pub priority: i32,
    pub clear_flags: ClearFlags,
    pub clear_color: Vec4,
    pub clear_depth: f32,
    pub clear_stencil: u32,

    /// Only objects whose layer intersects this mask are rendered.
    pub layers: u64,
    /// Render only when explicitly asked to redraw.
    pub on_demand: bool,
}

impl Camera {
    #[must_use]
    pub fn new_perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32, target: RenderTargetHandle) -> Self {
        Self {
            name: Cow::Borrowed("Camera"),
            projection_type: ProjectionType::Perspective,
            fov: fov_degrees.to_radians(),
            aspect,
            near,
            far,
            ortho_size: 10.0,
            world_transform: Affine3A::IDENTITY,
            target,
            viewport: Rect2::FULL,
            priority: 0,
            clear_flags: ClearFlags::all(),
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            clear_depth: 1.0,
            clear_stencil: 0,
            layers: u64::MAX,
            on_demand: false,
        }
    }

    #[must_use]
    pub fn new_orthographic(size: f32, aspect: f32, near: f32, far: f32, target: RenderTargetHandle) -> Self {
        Self {
            projection_type: ProjectionType::Orthographic,
            ortho_size: size,
            ..Self::new_perspective(60.0, aspect, near, far, target)
        }
    }

    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection_type {
            ProjectionType::Perspective => Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far),
            ProjectionType::Orthographic => {
                let w = self.ortho_size * self.aspect;
                let h = self.ortho_size;
                Mat4::orthographic_rh(-w, w, -h, h, self.near, self.far)
            }
        }
    }

    /// View matrix = inverse of the world transform.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from(self.world_transform).inverse()
    }

    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    #[must_use]
    pub fn position(&self) -> Vec3 {
        Vec3::from(self.world_transform.translation)
    }

    /// Cameras look down their local -Z.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.world_transform.transform_vector3(Vec3::NEG_Z).normalize_or_zero()
    }

    #[must_use]
    pub fn world_frustum(&self) -> ConvexVolume {
        ConvexVolume::from_matrix(self.view_projection_matrix())
    }
}

/// Convex volume bounded by half-spaces.
///
/// Each plane is stored as `(nx, ny, nz, d)` with the normal pointing into the
/// volume, so a point `p` is inside a plane when `n·p + d >= 0`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvexVolume {
    planes: SmallVec<[Vec4; 6]>,
}

impl ConvexVolume {
    /// Builds a volume from explicit planes. Normals are normalized.
    #[must_use]
    pub fn new(planes: impl IntoIterator<Item = Vec4>) -> Self {
        Self {
            planes: planes.into_iter().map(normalize_plane).collect(),
        }
    }

    /// Extracts the six frustum planes from a view-projection matrix
    /// (Gribb-Hartmann, depth range `[0, 1]`).
    ///
    /// Plane order: Left, Right, Bottom, Top, Near, Far.
    #[must_use]
    pub fn from_matrix(m: Mat4) -> Self {
        let rows = [m.row(0), m.row(1), m.row(2), m.row(3)];

        Self::new([
            rows[3] + rows[0],
            rows[3] - rows[0],
            rows[3] + rows[1],
            rows[3] - rows[1],
            rows[2],
            rows[3] - rows[2],
        ])
    }

    #[must_use]
    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    /// Returns plane `index`. Out-of-range indices are a caller bug.
    #[must_use]
    pub fn plane(&self, index: usize) -> Vec4 {
        assert!(
            index < self.planes.len(),
            "plane index {index} out of range ({} planes)",
            self.planes.len()
        );
        self.planes[index]
    }

    #[must_use]
    pub fn planes(&self) -> &[Vec4] {
        &self.planes
    }

    #[must_use]
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|p| signed_distance(*p, point) >= 0.0)
    }

    #[must_use]
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.planes
            .iter()
            .all(|p| signed_distance(*p, sphere.center) >= -sphere.radius)
    }

    /// Positive-vertex test: the box is rejected as soon as its corner furthest
    /// along a plane normal lies outside that plane.
    #[must_use]
    pub fn intersects_box(&self, aabb: &BoundingBox) -> bool {
        self.planes.iter().all(|p| {
            let positive = Vec3::new(
                if p.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if p.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if p.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            signed_distance(*p, positive) >= 0.0
        })
    }
}

#[inline]
fn signed_distance(plane: Vec4, point: Vec3) -> f32 {
    plane.x * point.x + plane.y * point.y + plane.z * point.z + plane.w
}

fn normalize_plane(plane: Vec4) -> Vec4 {
    let length = Vec3::new(plane.x, plane.y, plane.z).length();
    if length > 0.0 { plane / length } else { plane }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "out of range")]
    fn plane_index_out_of_range_panics() {
        let volume = ConvexVolume::from_matrix(Mat4::IDENTITY);
        let _ = volume.plane(6);
    }

    #[test]
    fn frustum_has_six_normalized_planes() {
        let proj = Mat4::perspective_rh(60.0_f32.to_radians(), 1.0, 0.1, 100.0);
        let volume = ConvexVolume::from_matrix(proj);
        assert_eq!(volume.plane_count(), 6);
        for plane in volume.planes() {
            assert!((plane.truncate().length() - 1.0).abs() < 1e-4);
        }
    }
}
