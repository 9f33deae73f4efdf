//! Rendering System
//!
//! The renderer core drives an immediate-mode [`RenderApi`] device through a
//! per-view frame graph:
//!
//! - [`core`]: device contract, resource descriptors, GPU parameter blocks
//! - [`graph`]: compositor, node registry, transient resource pool, built-in nodes
//! - [`scene`]: renderer-side copy of the scene, kept current by `notify_*` calls
//! - [`view`] / [`visibility`]: per-camera views, culling and render queues
//! - [`light_data`]: visible lights and per-renderable light lists
//! - [`settings`]: per-view render settings and renderer configuration
//!
//! # Frame Flow
//!
//! [`Renderer::render_all`] runs once per frame:
//!
//! 1. Upload per-frame globals and dirty per-object parameters
//! 2. For each render target, highest priority first:
//!    a. Collect the target's views that should draw this frame
//!    b. Cull the scene for the group and fill the views' render queues
//!    c. Upload the group's visible lights
//!    d. Execute each view's compositor, highest camera priority first
//!    e. Present the target
//! 3. Advance the resource pool, pruning long-unused transient resources

pub mod batching;
pub mod core;
pub mod graph;
pub mod light_data;
pub mod render_queue;
pub mod scene;
pub mod settings;
pub mod view;
pub mod visibility;

use smallvec::SmallVec;

use crate::errors::Result;
use crate::scene::{
    Camera, CameraKey, Decal, DecalKey, Light, LightKey, Renderable, RenderableKey,
};

pub use self::batching::{ElementConcatBatcher, GeometryBatcher};
pub use self::core::{NullRenderApi, RenderApi};
pub use self::graph::{GpuResourcePool, NodeRegistry, RenderCompositor};
pub use self::scene::{RendererScene, SceneInfo, Skybox};
pub use self::settings::{RenderSettings, RendererSettings};
pub use self::view::{RendererView, RendererViewDesc, ViewData};
pub use self::visibility::{RendererViewGroup, VisibilityInfo};

use self::core::RenderTargetHandle;
use self::graph::FrameInfo;

/// Top-level renderer owning the device, the node registry, the scene copy
/// and the transient resource pool.
pub struct Renderer<A: RenderApi> {
    api: A,
    settings: RendererSettings,
    registry: NodeRegistry,
    scene: RendererScene,
    pool: GpuResourcePool,
    group: RendererViewGroup,
    frame_index: u64,
}

impl<A: RenderApi> Renderer<A> {
    /// Creates a renderer with the built-in forward renderer nodes.
    pub fn new(api: A, settings: RendererSettings) -> Self {
        Self::with_registry(api, settings, NodeRegistry::with_builtin_nodes())
    }

    /// Creates a renderer resolving view graphs against `registry`.
    pub fn with_registry(api: A, settings: RendererSettings, registry: NodeRegistry) -> Self {
        log::info!(
            "Renderer initialized with {} node types, pool prune age {}",
            registry.len(),
            settings.pool_prune_age
        );
        Self {
            api,
            scene: RendererScene::new(&settings),
            pool: GpuResourcePool::with_prune_age(settings.pool_prune_age),
            registry,
            settings,
            group: RendererViewGroup::new(),
            frame_index: 0,
        }
    }

    // === Accessors ===

    #[inline]
    pub fn api(&self) -> &A {
        &self.api
    }

    #[inline]
    pub fn api_mut(&mut self) -> &mut A {
        &mut self.api
    }

    #[inline]
    pub fn pool(&self) -> &GpuResourcePool {
        &self.pool
    }

    #[inline]
    pub fn scene(&self) -> &RendererScene {
        &self.scene
    }

    #[inline]
    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    #[inline]
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    // === Scene notifications ===

    pub fn notify_camera_added(&mut self, key: CameraKey, camera: &Camera) {
        self.scene.register_camera(key, camera, &self.registry);
    }

    pub fn notify_camera_updated(&mut self, key: CameraKey, camera: &Camera) {
        self.scene.update_camera(key, camera);
    }

    pub fn notify_camera_removed(&mut self, key: CameraKey) {
        self.scene.unregister_camera(key, &mut self.api);
    }

    pub fn notify_light_added(&mut self, key: LightKey, light: &Light) {
        self.scene.register_light(key, light);
    }

    pub fn notify_light_updated(&mut self, key: LightKey, light: &Light) {
        self.scene.update_light(key, light);
    }

    pub fn notify_light_removed(&mut self, key: LightKey) {
        self.scene.unregister_light(key);
    }

    pub fn notify_renderable_added(&mut self, key: RenderableKey, renderable: &Renderable) {
        self.scene.register_renderable(key, renderable);
    }

    pub fn notify_renderable_updated(&mut self, key: RenderableKey, renderable: &Renderable) {
        self.scene.update_renderable(key, renderable, &mut self.api);
    }

    pub fn notify_renderable_removed(&mut self, key: RenderableKey) {
        self.scene.unregister_renderable(key, &mut self.api);
    }

    pub fn notify_decal_added(&mut self, key: DecalKey, decal: &Decal) {
        self.scene.register_decal(key, decal);
    }

    pub fn notify_decal_updated(&mut self, key: DecalKey, decal: &Decal) {
        self.scene.update_decal(key, decal);
    }

    pub fn notify_decal_removed(&mut self, key: DecalKey) {
        self.scene.unregister_decal(key);
    }

    /// Asks an on-demand camera to render again.
    pub fn notify_needs_redraw(&mut self, camera: CameraKey) {
        self.scene.notify_needs_redraw(camera);
    }

    // === Configuration ===

    /// Replaces the settings of `camera`'s view and rebuilds its compositor.
    pub fn set_render_settings(&mut self, camera: CameraKey, settings: RenderSettings) -> Result<()> {
        self.scene.set_render_settings(camera, settings, &self.registry)
    }

    pub fn set_skybox(&mut self, skybox: Option<Skybox>) {
        self.scene.set_skybox(skybox);
    }

    pub fn set_render_target_priority(&mut self, target: RenderTargetHandle, priority: i32) {
        self.scene.set_render_target_priority(target, priority);
    }

    pub fn batch_renderables(&mut self, batcher: &mut dyn GeometryBatcher) -> usize {
        self.scene.batch_renderables(batcher, &mut self.api)
    }

    pub fn destroy_batched_renderables(&mut self) {
        self.scene.destroy_batched_renderables(&mut self.api);
    }

    // === Frame ===

    /// Renders every view that should draw this frame.
    pub fn render_all(&mut self, time: f32, delta_time: f32) {
        let frame = FrameInfo {
            time,
            delta_time,
            frame_index: self.frame_index,
        };

        let info = self.scene.info_mut();
        info.update_per_frame(&mut self.api, frame);
        info.prepare_renderables(&mut self.api);

        let targets: SmallVec<[(RenderTargetHandle, SmallVec<[usize; 4]>); 4]> = self
            .scene
            .render_targets()
            .iter()
            .map(|data| {
                let views = data
                    .cameras
                    .iter()
                    .filter_map(|&camera| self.scene.view_position(camera))
                    .filter(|&i| self.scene.views()[i].data().should_draw())
                    .collect();
                (data.target, views)
            })
            .collect();

        for (target, views) in targets {
            if views.is_empty() {
                continue;
            }
            self.group.set_views(views);

            let (info, views) = self.scene.split_mut();
            self.group.determine_visibility(info, views);
            self.group.lights_mut().upload(&mut self.api, &mut self.pool);

            for &i in self.group.views() {
                views[i].render(
                    info,
                    self.group.visibility(),
                    self.group.lights(),
                    &mut self.pool,
                    &mut self.api,
                    frame,
                );
            }

            self.group.lights_mut().release();
            self.api.swap_buffers(target);
        }

        self.pool.update(&mut self.api);
        self.frame_index += 1;
    }

    /// Releases every GPU resource the renderer created. The renderer is
    /// empty afterwards.
    pub fn destroy(&mut self) {
        self.group.lights_mut().release();
        self.scene.destroy(&mut self.api);
        self.pool.clear(&mut self.api);
        log::info!("Renderer destroyed");
    }
}
