//! Renderer Views
//!
//! A view is one camera rendering into one render target viewport.
//!
//! - [`RendererViewDesc`]: immutable per-frame description built from a camera
//! - [`ViewData`]: the state nodes read while rendering (settings, GPU
//!   parameters, render queues, redraw counters)
//! - [`RendererView`]: a [`ViewData`] plus the compositor that renders it
//!
//! The per-view parameter buffer is uploaded lazily in
//! [`ViewData::begin_frame`]: only when the description changed or the
//! render target was resized since the last upload.

use std::rc::Rc;

use glam::{Mat4, Vec3, Vec4};

use crate::renderer::core::{
    BufferDesc, BufferHandle, ClearFlags, Conventions, PerCameraParams, Rect2, RenderApi,
    RenderTargetHandle,
};
use crate::renderer::graph::compositor::{CompositorError, RenderCompositor};
use crate::renderer::graph::node::{FrameContext, FrameInfo};
use crate::renderer::graph::passes::FinalResolveNode;
use crate::renderer::graph::registry::NodeRegistry;
use crate::renderer::graph::transient_pool::GpuResourcePool;
use crate::renderer::graph::CompositorNodeType;
use crate::renderer::light_data::VisibleLightData;
use crate::renderer::render_queue::RenderQueue;
use crate::renderer::scene::SceneInfo;
use crate::renderer::settings::RenderSettings;
use crate::renderer::visibility::{
    RenderableVisibility, ViewCullData, VisibilityInfo, calculate_visibility,
};
use crate::scene::{Camera, CameraKey, ConvexVolume, ProjectionType};

/// Seconds an on-demand view keeps redrawing while auto exposure adapts.
const AUTO_EXPOSURE_REDRAW_SECONDS: f32 = 4.0;

/// Everything the renderer needs to know about a view for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererViewDesc {
    pub view: Mat4,
    pub proj: Mat4,
    /// World-space position.
    pub origin: Vec3,
    /// World-space forward direction.
    pub direction: Vec3,
    pub near: f32,
    pub far: f32,
    pub projection_type: ProjectionType,
    /// Only objects whose layer intersects this mask are visible.
    pub layers: u64,

    // === Target ===
    pub target: RenderTargetHandle,
    /// Normalized rectangle within the target.
    pub viewport: Rect2,
    pub clear_flags: ClearFlags,
    pub clear_color: Vec4,
    pub clear_depth: f32,
    pub clear_stencil: u32,
    pub priority: i32,

    /// Render only after [`ViewData::notify_needs_redraw`].
    pub on_demand: bool,
}

impl Default for RendererViewDesc {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
            origin: Vec3::ZERO,
            direction: Vec3::NEG_Z,
            near: 0.1,
            far: 1000.0,
            projection_type: ProjectionType::Perspective,
            layers: u64::MAX,
            target: RenderTargetHandle::from_raw(0),
            viewport: Rect2::FULL,
            clear_flags: ClearFlags::all(),
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            clear_depth: 1.0,
            clear_stencil: 0,
            priority: 0,
            on_demand: false,
        }
    }
}

impl RendererViewDesc {
    /// Describes `camera`. `scene_clear_color` is used when the camera does
    /// not clear color itself.
    #[must_use]
    pub fn from_camera(camera: &Camera, scene_clear_color: Vec4) -> Self {
        let clear_color = if camera.clear_flags.contains(ClearFlags::COLOR) {
            camera.clear_color
        } else {
            scene_clear_color
        };

        Self {
            view: camera.view_matrix(),
            proj: camera.projection_matrix(),
            origin: camera.position(),
            direction: camera.forward(),
            near: camera.near,
            far: camera.far,
            projection_type: camera.projection_type,
            layers: camera.layers,
            target: camera.target,
            viewport: camera.viewport,
            clear_flags: camera.clear_flags,
            clear_color,
            clear_depth: camera.clear_depth,
            clear_stencil: camera.clear_stencil,
            priority: camera.priority,
            on_demand: camera.on_demand,
        }
    }

    #[inline]
    #[must_use]
    pub fn view_proj(&self) -> Mat4 {
        self.proj * self.view
    }
}

/// Per-view state read by compositor nodes.
pub struct ViewData {
    desc: RendererViewDesc,
    settings: Rc<RenderSettings>,

    params: PerCameraParams,
    param_buffer: Option<BufferHandle>,
    params_dirty: bool,
    target_size: (u32, u32),
    prev_view_proj: Mat4,

    visible_renderables: Vec<bool>,
    opaque: RenderQueue,
    transparent: RenderQueue,

    redraw_frames: u32,
    redraw_seconds: f32,
}

impl ViewData {
    #[must_use]
    pub fn new(desc: RendererViewDesc, settings: Rc<RenderSettings>) -> Self {
        let prev_view_proj = desc.view_proj();
        Self {
            opaque: RenderQueue::opaque(settings.state_reduction),
            transparent: RenderQueue::transparent(),
            desc,
            settings,
            params: PerCameraParams::default(),
            param_buffer: None,
            params_dirty: true,
            target_size: (0, 0),
            prev_view_proj,
            visible_renderables: Vec::new(),
            redraw_frames: 0,
            redraw_seconds: 0.0,
        }
    }

    #[inline]
    #[must_use]
    pub fn desc(&self) -> &RendererViewDesc {
        &self.desc
    }

    /// Replaces the description, keeping the previous view-projection for
    /// motion vectors.
    pub fn set_desc(&mut self, desc: RendererViewDesc) {
        self.prev_view_proj = self.desc.view_proj();
        self.desc = desc;
        self.params_dirty = true;
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Rc<RenderSettings>) {
        self.opaque.set_state_reduction(settings.state_reduction);
        self.settings = settings;
    }

    /// Size of the view's viewport in pixels, as of the last
    /// [`begin_frame`](Self::begin_frame).
    #[must_use]
    pub fn pixel_size(&self) -> (u32, u32) {
        let rect = self.desc.viewport.to_pixels(self.target_size.0, self.target_size.1);
        (rect.width, rect.height)
    }

    #[inline]
    #[must_use]
    pub fn param_buffer(&self) -> Option<BufferHandle> {
        self.param_buffer
    }

    #[inline]
    #[must_use]
    pub fn params(&self) -> &PerCameraParams {
        &self.params
    }

    #[inline]
    #[must_use]
    pub fn opaque_queue(&self) -> &RenderQueue {
        &self.opaque
    }

    #[inline]
    #[must_use]
    pub fn transparent_queue(&self) -> &RenderQueue {
        &self.transparent
    }

    /// Renderables this view saw in its last visibility pass.
    #[must_use]
    pub fn visible_renderables(&self) -> &[bool] {
        &self.visible_renderables
    }

    #[must_use]
    pub fn cull_data(&self) -> ViewCullData {
        ViewCullData {
            origin: self.desc.origin,
            frustum: ConvexVolume::from_matrix(self.desc.view_proj()),
            layers: self.desc.layers,
            cull_distance: self.settings.cull_distance,
        }
    }

    // === Visibility ===

    /// Culls the scene against this view and ORs the result into the
    /// group-wide `visibility`.
    pub fn determine_visibility(&mut self, scene: &SceneInfo, visibility: &mut VisibilityInfo) {
        let cull = self.cull_data();

        self.visible_renderables.clear();
        self.visible_renderables.resize(scene.renderable_count(), false);
        calculate_visibility(scene.renderable_cull_infos(), &cull, &mut self.visible_renderables);

        for (index, (group, &visible)) in visibility
            .renderables
            .iter_mut()
            .zip(&self.visible_renderables)
            .enumerate()
        {
            if !visible {
                continue;
            }
            group.insert(RenderableVisibility::VISIBLE);
            if scene.renderable_at(index).is_some_and(|r| r.is_batch()) {
                group.insert(RenderableVisibility::INSTANCED);
            }
        }

        calculate_visibility(scene.radial_light_cull_infos(), &cull, &mut visibility.radial_lights);
        calculate_visibility(scene.spot_light_cull_infos(), &cull, &mut visibility.spot_lights);
        calculate_visibility(scene.decal_cull_infos(), &cull, &mut visibility.decals);
    }

    /// Fills and sorts the render queues with every element of the
    /// renderables this view sees.
    pub fn queue_render_elements(&mut self, scene: &SceneInfo) {
        self.opaque.clear();
        self.transparent.clear();

        for (index, _) in self
            .visible_renderables
            .iter()
            .enumerate()
            .filter(|(_, visible)| **visible)
        {
            let Some(renderable) = scene.renderable_at(index) else {
                continue;
            };
            let distance_sq = (renderable.bounds().sphere.center - self.desc.origin).length_squared();

            for (element_index, element) in renderable.renderable().elements.iter().enumerate() {
                let queue = if element.is_transparent() {
                    &mut self.transparent
                } else {
                    &mut self.opaque
                };
                queue.add(element, index, element_index, distance_sq);
            }
        }

        self.opaque.sort();
        self.transparent.sort();
    }

    // === On-demand redraw ===

    /// Requests a redraw of an on-demand view. Temporal effects keep the
    /// view drawing long enough to converge.
    pub fn notify_needs_redraw(&mut self) {
        let mut frames = 1;
        if self.settings.temporal_aa.enabled {
            frames = frames.max(self.settings.temporal_aa.sample_count);
        }
        self.redraw_frames = self.redraw_frames.max(frames);

        if self.settings.tonemapping.enable_auto_exposure {
            self.redraw_seconds = self.redraw_seconds.max(AUTO_EXPOSURE_REDRAW_SECONDS);
        }
    }

    #[must_use]
    pub fn should_draw(&self) -> bool {
        !self.desc.on_demand || self.redraw_frames > 0 || self.redraw_seconds > 0.0
    }

    // === Frame ===

    /// Refreshes the GPU parameters when the description changed or the
    /// render target was resized.
    pub fn begin_frame(&mut self, api: &mut dyn RenderApi) {
        let size = api.render_target_size(self.desc.target);
        if size != self.target_size {
            self.target_size = size;
            self.params_dirty = true;
        }

        let buffer = match self.param_buffer {
            Some(buffer) => buffer,
            None => {
                let buffer = api.create_buffer(&BufferDesc::uniform::<PerCameraParams>());
                self.param_buffer = Some(buffer);
                self.params_dirty = true;
                buffer
            }
        };

        if self.params_dirty {
            self.params = self.compute_params(api.conventions());
            api.write_buffer(buffer, bytemuck::bytes_of(&self.params));
            self.params_dirty = false;
        }
    }

    /// Advances redraw counters after the view rendered and catches the
    /// previous view-projection up with the current one.
    pub fn end_frame(&mut self, delta_time: f32) {
        self.redraw_frames = self.redraw_frames.saturating_sub(1);
        self.redraw_seconds = (self.redraw_seconds - delta_time).max(0.0);

        let view_proj = self.desc.view_proj();
        if self.prev_view_proj != view_proj {
            self.prev_view_proj = view_proj;
            self.params_dirty = true;
        }
    }

    fn compute_params(&self, conventions: Conventions) -> PerCameraParams {
        let desc = &self.desc;
        let view_proj = desc.view_proj();
        let viewport = desc.viewport;
        let rect = viewport.to_pixels(self.target_size.0, self.target_size.1);

        let half_w = viewport.width * 0.5;
        let half_h = viewport.height * 0.5;
        let clip_to_uv = Vec4::new(
            half_w,
            half_h * conventions.ndc_to_uv_y_sign(),
            viewport.x + half_w,
            viewport.y + half_h,
        );

        // view_z = x / (device_z + y)
        let device_z_to_view_z =
            Vec4::new(-desc.proj.w_axis.z, desc.proj.z_axis.z, desc.near, desc.far);

        let m = |m: Mat4| conventions.convert_matrix(m);
        PerCameraParams {
            view: m(desc.view),
            proj: m(desc.proj),
            view_proj: m(view_proj),
            inv_proj: m(desc.proj.inverse()),
            inv_view_proj: m(view_proj.inverse()),
            prev_view_proj: m(self.prev_view_proj),
            view_origin: desc.origin.extend(1.0),
            view_dir: desc.direction.extend(0.0),
            clip_to_uv,
            device_z_to_view_z,
            viewport_rect: Vec4::new(
                rect.x as f32,
                rect.y as f32,
                rect.width as f32,
                rect.height as f32,
            ),
        }
    }

    /// Frees the parameter buffer.
    pub fn destroy(&mut self, api: &mut dyn RenderApi) {
        if let Some(buffer) = self.param_buffer.take() {
            api.destroy_buffer(buffer);
        }
        self.params_dirty = true;
    }
}

/// A camera's view together with the compositor that renders it.
pub struct RendererView {
    camera: CameraKey,
    data: ViewData,
    compositor: RenderCompositor,
}

impl RendererView {
    /// Final node every view graph resolves to.
    pub const FINAL_NODE: &'static str = FinalResolveNode::ID;

    /// Creates the view and builds its compositor. A failed build is logged
    /// and leaves the view rendering nothing until its settings change.
    #[must_use]
    pub fn new(
        camera: CameraKey,
        desc: RendererViewDesc,
        settings: Rc<RenderSettings>,
        registry: &NodeRegistry,
    ) -> Self {
        let mut view = Self {
            camera,
            data: ViewData::new(desc, settings),
            compositor: RenderCompositor::new(),
        };
        if view.rebuild(registry).is_err() {
            log::warn!("View for camera {camera:?} has no valid compositor");
        }
        view.data.notify_needs_redraw();
        view
    }

    #[inline]
    #[must_use]
    pub fn camera(&self) -> CameraKey {
        self.camera
    }

    #[inline]
    #[must_use]
    pub fn data(&self) -> &ViewData {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut ViewData {
        &mut self.data
    }

    #[inline]
    #[must_use]
    pub fn compositor(&self) -> &RenderCompositor {
        &self.compositor
    }

    /// Applies new settings and rebuilds the compositor, since settings
    /// decide which nodes the graph contains.
    pub fn set_render_settings(
        &mut self,
        settings: Rc<RenderSettings>,
        registry: &NodeRegistry,
    ) -> Result<(), CompositorError> {
        self.data.set_settings(settings);
        let result = self.rebuild(registry);
        self.data.notify_needs_redraw();
        result
    }

    fn rebuild(&mut self, registry: &NodeRegistry) -> Result<(), CompositorError> {
        self.compositor.build(&self.data, registry, Self::FINAL_NODE)
    }

    /// Renders one frame of this view.
    pub fn render(
        &mut self,
        scene: &SceneInfo,
        visibility: &VisibilityInfo,
        lights: &VisibleLightData,
        pool: &mut GpuResourcePool,
        api: &mut dyn RenderApi,
        frame: FrameInfo,
    ) {
        self.data.begin_frame(api);

        let mut ctx = FrameContext {
            view: &self.data,
            scene,
            visibility,
            lights,
            pool,
            api,
            frame,
        };
        self.compositor.execute(&mut ctx);

        self.data.end_frame(frame.delta_time);
    }

    /// Releases the view's GPU resources and node instances.
    pub fn destroy(&mut self, api: &mut dyn RenderApi) {
        self.compositor.clear();
        self.data.destroy(api);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::core::NullRenderApi;
    use crate::renderer::settings::TemporalAaSettings;

    fn on_demand_data(settings: RenderSettings) -> ViewData {
        ViewData::new(
            RendererViewDesc {
                on_demand: true,
                ..RendererViewDesc::default()
            },
            Rc::new(settings),
        )
    }

    #[test]
    fn temporal_aa_extends_redraw() {
        let mut data = on_demand_data(RenderSettings {
            temporal_aa: TemporalAaSettings {
                enabled: true,
                sample_count: 3,
            },
            ..RenderSettings::default()
        });
        data.notify_needs_redraw();
        for _ in 0..3 {
            assert!(data.should_draw());
            data.end_frame(0.016);
        }
        assert!(!data.should_draw());
    }

    #[test]
    fn params_upload_only_when_dirty_or_resized() {
        let mut api = NullRenderApi::new();
        let target = api.create_window_target(320, 240);
        let mut data = ViewData::new(
            RendererViewDesc {
                target,
                ..RendererViewDesc::default()
            },
            Rc::new(RenderSettings::default()),
        );

        data.begin_frame(&mut api);
        data.begin_frame(&mut api);
        let writes = |api: &NullRenderApi| {
            api.commands()
                .iter()
                .filter(|c| matches!(c, crate::renderer::core::ApiCommand::WriteBuffer { .. }))
                .count()
        };
        assert_eq!(writes(&api), 1);
        assert_eq!(data.pixel_size(), (320, 240));

        api.resize_target(target, 640, 480);
        data.begin_frame(&mut api);
        assert_eq!(writes(&api), 2);
        assert_eq!(data.params().viewport_rect, Vec4::new(0.0, 0.0, 640.0, 480.0));
    }

    #[test]
    fn previous_view_proj_settles_once_camera_stops() {
        let mut api = NullRenderApi::new();
        let target = api.create_window_target(320, 240);
        let desc = RendererViewDesc {
            target,
            ..RendererViewDesc::default()
        };
        let mut data = ViewData::new(desc.clone(), Rc::new(RenderSettings::default()));
        data.begin_frame(&mut api);
        data.end_frame(0.016);

        let moved_view = desc.view * Mat4::from_translation(Vec3::new(-2.0, 0.0, 0.0));
        data.set_desc(RendererViewDesc {
            view: moved_view,
            ..desc
        });

        // The frame after the move still carries the old matrix for motion vectors.
        data.begin_frame(&mut api);
        assert_ne!(data.params().prev_view_proj, data.params().view_proj);
        data.end_frame(0.016);

        // With the camera at rest the two converge on the next frame.
        data.begin_frame(&mut api);
        assert_eq!(data.params().prev_view_proj, data.params().view_proj);
        data.end_frame(0.016);
    }
}
