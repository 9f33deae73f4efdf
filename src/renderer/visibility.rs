//! Visibility
//!
//! Per-view culling of renderables, lights and decals against cached
//! world-space bounds. An object is visible from a view when, in order:
//!
//! 1. its layer intersects the view's layer mask,
//! 2. its bounding sphere center lies within
//!    `cull_distance_factor * base_cull_distance + radius` of the view origin
//!    (an object exactly at that distance is still visible),
//! 3. the frustum intersects its bounding sphere, and then its bounding box.
//!
//! A [`RendererViewGroup`] runs this for each of its views and ORs the
//! results, so an object visible from any view of the group is kept.

use bitflags::bitflags;
use glam::Vec3;

use crate::renderer::light_data::VisibleLightData;
use crate::renderer::scene::SceneInfo;
use crate::renderer::view::RendererView;
use crate::scene::{Bounds, ConvexVolume};

/// Cached culling inputs of one object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CullInfo {
    pub bounds: Bounds,
    pub layer: u64,
    pub cull_distance_factor: f32,
}

impl CullInfo {
    #[must_use]
    pub fn new(bounds: Bounds, layer: u64, cull_distance_factor: f32) -> Self {
        Self {
            bounds,
            layer,
            cull_distance_factor,
        }
    }

    /// Culled by frustum only. Used for lights.
    #[must_use]
    pub fn unlayered(bounds: Bounds) -> Self {
        Self::new(bounds, u64::MAX, f32::INFINITY)
    }
}

/// View-side culling inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewCullData {
    pub origin: Vec3,
    pub frustum: ConvexVolume,
    pub layers: u64,
    /// Base cull distance. `f32::INFINITY` disables distance culling.
    pub cull_distance: f32,
}

/// Whether `info` is visible from `view`.
#[must_use]
pub fn is_visible(info: &CullInfo, view: &ViewCullData) -> bool {
    if info.layer & view.layers == 0 {
        return false;
    }

    let sphere = &info.bounds.sphere;
    let distance_sq = (sphere.center - view.origin).length_squared();
    let max_distance = info.cull_distance_factor * view.cull_distance + sphere.radius;
    if distance_sq > max_distance * max_distance {
        return false;
    }

    view.frustum.intersects_sphere(sphere) && view.frustum.intersects_box(&info.bounds.aabb)
}

/// Marks every object visible from `view` in `visibility`.
///
/// Entries already set are left set, so the same slice can accumulate the
/// results of several views.
pub fn calculate_visibility(cull_infos: &[CullInfo], view: &ViewCullData, visibility: &mut [bool]) {
    debug_assert_eq!(cull_infos.len(), visibility.len());
    for (info, visible) in cull_infos.iter().zip(visibility.iter_mut()) {
        if !*visible && is_visible(info, view) {
            *visible = true;
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RenderableVisibility: u8 {
        const VISIBLE = 1 << 0;
        /// Drawn through a merged batch.
        const INSTANCED = 1 << 1;
    }
}

/// Visibility of every scene object across a view group. Rebuilt each frame.
#[derive(Debug, Clone, Default)]
pub struct VisibilityInfo {
    pub renderables: Vec<RenderableVisibility>,
    pub radial_lights: Vec<bool>,
    pub spot_lights: Vec<bool>,
    pub decals: Vec<bool>,
}

impl VisibilityInfo {
    /// Resizes to the scene's object counts with everything hidden.
    pub fn reset(&mut self, scene: &SceneInfo) {
        reset_to(&mut self.renderables, scene.renderable_count(), RenderableVisibility::empty());
        reset_to(&mut self.radial_lights, scene.radial_light_cull_infos().len(), false);
        reset_to(&mut self.spot_lights, scene.spot_light_cull_infos().len(), false);
        reset_to(&mut self.decals, scene.decal_cull_infos().len(), false);
    }

    #[inline]
    #[must_use]
    pub fn is_renderable_visible(&self, index: usize) -> bool {
        self.renderables
            .get(index)
            .is_some_and(|v| v.contains(RenderableVisibility::VISIBLE))
    }

    #[must_use]
    pub fn visible_renderable_count(&self) -> usize {
        self.renderables
            .iter()
            .filter(|v| v.contains(RenderableVisibility::VISIBLE))
            .count()
    }
}

fn reset_to<T: Copy>(values: &mut Vec<T>, len: usize, value: T) {
    values.clear();
    values.resize(len, value);
}

/// Views rendered together this frame, usually all views of one render
/// target, with their shared visibility and light data.
#[derive(Default)]
pub struct RendererViewGroup {
    views: Vec<usize>,
    visibility: VisibilityInfo,
    lights: VisibleLightData,
}

impl RendererViewGroup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the group's views as indices into the view array later passed to
    /// [`determine_visibility`](Self::determine_visibility).
    pub fn set_views(&mut self, views: impl IntoIterator<Item = usize>) {
        self.views.clear();
        self.views.extend(views);
    }

    #[must_use]
    pub fn views(&self) -> &[usize] {
        &self.views
    }

    #[must_use]
    pub fn visibility(&self) -> &VisibilityInfo {
        &self.visibility
    }

    #[must_use]
    pub fn lights(&self) -> &VisibleLightData {
        &self.lights
    }

    pub fn lights_mut(&mut self) -> &mut VisibleLightData {
        &mut self.lights
    }

    /// Culls the scene for every view in the group, gathers visible lights
    /// and their per-renderable influence lists, and fills each view's
    /// render queues.
    pub fn determine_visibility(&mut self, scene: &SceneInfo, views: &mut [RendererView]) {
        self.visibility.reset(scene);

        for &index in &self.views {
            if let Some(view) = views.get_mut(index) {
                view.data_mut().determine_visibility(scene, &mut self.visibility);
            }
        }

        self.lights.update(scene, &self.visibility);
        self.lights.update_renderable_lights(scene, &self.visibility);

        for &index in &self.views {
            if let Some(view) = views.get_mut(index) {
                view.data_mut().queue_render_elements(scene);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{BoundingBox, BoundingSphere};
    use glam::Mat4;

    fn view_at_origin(cull_distance: f32) -> ViewCullData {
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 1000.0);
        ViewCullData {
            origin: Vec3::ZERO,
            frustum: ConvexVolume::from_matrix(proj),
            layers: u64::MAX,
            cull_distance,
        }
    }

    fn point_object(center: Vec3) -> CullInfo {
        CullInfo::new(
            Bounds::new(BoundingBox::new(center, center), BoundingSphere::new(center, 0.0)),
            1,
            1.0,
        )
    }

    #[test]
    fn box_test_rejects_sphere_false_positive() {
        // Sphere pokes into the frustum but the thin box beside it does not.
        let center = Vec3::new(-12.0, 0.0, -10.0);
        let info = CullInfo::new(
            Bounds::new(
                BoundingBox::from_center_extents(center, Vec3::new(0.1, 0.1, 0.1)),
                BoundingSphere::new(center, 3.0),
            ),
            1,
            1.0,
        );
        let view = view_at_origin(f32::INFINITY);
        assert!(view.frustum.intersects_sphere(&info.bounds.sphere));
        assert!(!is_visible(&info, &view));
    }

    #[test]
    fn accumulates_without_clearing() {
        let infos = [point_object(Vec3::new(0.0, 0.0, 10.0))];
        let mut visibility = [true];
        calculate_visibility(&infos, &view_at_origin(f32::INFINITY), &mut visibility);
        assert!(visibility[0], "entries set by an earlier view stay set");
    }
}
