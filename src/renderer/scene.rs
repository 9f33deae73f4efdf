//! Renderer Scene
//!
//! The renderer's own copy of the scene, kept in sync through the
//! `notify_*` calls of [`Renderer`](crate::renderer::Renderer).
//!
//! - [`SceneInfo`]: dense arrays of renderables, lights and decals with
//!   cached world bounds and cull inputs, read by visibility and nodes
//! - [`RendererScene`]: applies register/update/unregister events to the
//!   [`SceneInfo`] and owns one [`RendererView`] per camera
//!
//! Objects are addressed by the slotmap keys of the game-side
//! [`Scene`](crate::scene::Scene) and stored densely; unregistering
//! swap-removes, so array indices are only stable within a frame.

use std::hash::Hash;
use std::rc::Rc;

use glam::{Mat4, Vec4};
use rustc_hash::FxHashMap;

use crate::errors::{Result, SableError};
use crate::renderer::batching::{BatchRecord, GeometryBatcher};
use crate::renderer::core::{
    BufferDesc, BufferHandle, PerFrameParams, PerObjectParams, RenderApi, RenderTargetHandle,
    TextureHandle,
};
use crate::renderer::graph::node::FrameInfo;
use crate::renderer::graph::registry::NodeRegistry;
use crate::renderer::settings::{RenderSettings, RendererSettings};
use crate::renderer::view::{RendererView, RendererViewDesc};
use crate::renderer::visibility::CullInfo;
use crate::scene::{
    Bounds, Camera, CameraKey, Decal, DecalKey, Light, LightKey, LightType, Renderable,
    RenderableKey,
};

// ─── Dense storage ──────────────────────────────────────────────────────────

/// Keyed dense array with swap-remove and parallel cull inputs.
#[derive(Debug)]
struct DenseList<K, T> {
    keys: Vec<K>,
    items: Vec<T>,
    cull_infos: Vec<CullInfo>,
    index: FxHashMap<K, usize>,
}

impl<K: Copy + Eq + Hash, T> DenseList<K, T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: Vec::with_capacity(capacity),
            items: Vec::with_capacity(capacity),
            cull_infos: Vec::with_capacity(capacity),
            index: FxHashMap::default(),
        }
    }

    /// Inserts or replaces the entry for `key`, returning its index.
    fn insert(&mut self, key: K, item: T, cull: CullInfo) -> usize {
        if let Some(&i) = self.index.get(&key) {
            self.items[i] = item;
            self.cull_infos[i] = cull;
            return i;
        }
        let i = self.items.len();
        self.keys.push(key);
        self.items.push(item);
        self.cull_infos.push(cull);
        self.index.insert(key, i);
        i
    }

    fn position(&self, key: &K) -> Option<usize> {
        self.index.get(key).copied()
    }

    fn remove(&mut self, key: &K) -> Option<T> {
        let i = self.index.remove(key)?;
        self.keys.swap_remove(i);
        self.cull_infos.swap_remove(i);
        let item = self.items.swap_remove(i);
        if let Some(&moved) = self.keys.get(i) {
            self.index.insert(moved, i);
        }
        Some(item)
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn clear(&mut self) {
        self.keys.clear();
        self.items.clear();
        self.cull_infos.clear();
        self.index.clear();
    }
}

// ─── Scene objects ──────────────────────────────────────────────────────────

/// Identifies a renderable: either a scene object or a merged batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderableId {
    Scene(RenderableKey),
    Batch(u32),
}

/// Renderer-side state of one renderable.
#[derive(Debug)]
pub struct RendererRenderable {
    id: RenderableId,
    renderable: Renderable,
    bounds: Bounds,
    prev_world: Mat4,
    per_object_buffer: Option<BufferHandle>,
    dirty: bool,
    hidden: bool,
}

impl RendererRenderable {
    fn new(id: RenderableId, renderable: Renderable) -> Self {
        Self {
            id,
            bounds: renderable.world_bounds(),
            prev_world: Mat4::from(renderable.world_transform),
            renderable,
            per_object_buffer: None,
            dirty: true,
            hidden: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> RenderableId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn renderable(&self) -> &Renderable {
        &self.renderable
    }

    /// Cached world-space bounds.
    #[inline]
    #[must_use]
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    #[inline]
    #[must_use]
    pub fn per_object_buffer(&self) -> Option<BufferHandle> {
        self.per_object_buffer
    }

    #[inline]
    #[must_use]
    pub fn is_batch(&self) -> bool {
        matches!(self.id, RenderableId::Batch(_))
    }

    /// Hidden renderables are replaced by a batch and never visible.
    #[inline]
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn cull_info(&self) -> CullInfo {
        let layer = if self.hidden { 0 } else { self.renderable.layer };
        CullInfo::new(self.bounds, layer, self.renderable.cull_distance_factor)
    }

    fn set_renderable(&mut self, renderable: Renderable) {
        self.prev_world = Mat4::from(self.renderable.world_transform);
        self.bounds = renderable.world_bounds();
        self.renderable = renderable;
        self.dirty = true;
    }

    /// Uploads per-object parameters when dirty. Stays dirty one extra frame
    /// after a move so the previous transform catches up.
    fn upload(&mut self, api: &mut dyn RenderApi) {
        if !self.dirty && self.per_object_buffer.is_some() {
            return;
        }
        let buffer = *self
            .per_object_buffer
            .get_or_insert_with(|| api.create_buffer(&BufferDesc::uniform::<PerObjectParams>()));

        let world = Mat4::from(self.renderable.world_transform);
        let params = PerObjectParams::new(world, self.prev_world, self.renderable.layer);
        api.write_buffer(buffer, bytemuck::bytes_of(&params));

        self.dirty = self.prev_world != world;
        self.prev_world = world;
    }

    fn destroy(&mut self, api: &mut dyn RenderApi) {
        if let Some(buffer) = self.per_object_buffer.take() {
            api.destroy_buffer(buffer);
        }
    }
}

#[derive(Debug, Clone)]
pub struct RendererDecal {
    decal: Decal,
    bounds: Bounds,
}

impl RendererDecal {
    fn new(decal: Decal) -> Self {
        Self {
            bounds: decal.world_bounds(),
            decal,
        }
    }

    #[inline]
    #[must_use]
    pub fn decal(&self) -> &Decal {
        &self.decal
    }

    #[inline]
    #[must_use]
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    fn cull_info(&self) -> CullInfo {
        CullInfo::new(self.bounds, self.decal.layer, 1.0)
    }
}

/// Scene-wide sky drawn by the skybox node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Skybox {
    pub texture: TextureHandle,
    pub brightness: f32,
}

/// A render target and the cameras rendering into it, highest priority
/// first.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTargetData {
    pub target: RenderTargetHandle,
    pub priority: i32,
    pub cameras: Vec<CameraKey>,
}

// ─── SceneInfo ──────────────────────────────────────────────────────────────

/// Everything visibility and compositor nodes read about the scene.
pub struct SceneInfo {
    renderables: DenseList<RenderableId, RendererRenderable>,
    directional_lights: DenseList<LightKey, Light>,
    radial_lights: DenseList<LightKey, Light>,
    spot_lights: DenseList<LightKey, Light>,
    light_types: FxHashMap<LightKey, LightType>,
    decals: DenseList<DecalKey, RendererDecal>,
    skybox: Option<Skybox>,
    per_frame_buffer: Option<BufferHandle>,
    batches: Vec<BatchRecord>,
}

impl SceneInfo {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            renderables: DenseList::with_capacity(capacity),
            directional_lights: DenseList::with_capacity(4),
            radial_lights: DenseList::with_capacity(capacity),
            spot_lights: DenseList::with_capacity(capacity),
            light_types: FxHashMap::default(),
            decals: DenseList::with_capacity(capacity),
            skybox: None,
            per_frame_buffer: None,
            batches: Vec::new(),
        }
    }

    // === Renderables ===

    #[inline]
    #[must_use]
    pub fn renderable_count(&self) -> usize {
        self.renderables.len()
    }

    #[inline]
    #[must_use]
    pub fn renderable_at(&self, index: usize) -> Option<&RendererRenderable> {
        self.renderables.items.get(index)
    }

    #[inline]
    #[must_use]
    pub fn renderables(&self) -> &[RendererRenderable] {
        &self.renderables.items
    }

    #[must_use]
    pub fn renderable_index(&self, key: RenderableKey) -> Option<usize> {
        self.renderables.position(&RenderableId::Scene(key))
    }

    #[inline]
    #[must_use]
    pub fn renderable_cull_infos(&self) -> &[CullInfo] {
        &self.renderables.cull_infos
    }

    // === Lights ===

    #[inline]
    #[must_use]
    pub fn directional_lights(&self) -> &[Light] {
        &self.directional_lights.items
    }

    #[inline]
    #[must_use]
    pub fn radial_lights(&self) -> &[Light] {
        &self.radial_lights.items
    }

    #[inline]
    #[must_use]
    pub fn spot_lights(&self) -> &[Light] {
        &self.spot_lights.items
    }

    #[inline]
    #[must_use]
    pub fn radial_light_cull_infos(&self) -> &[CullInfo] {
        &self.radial_lights.cull_infos
    }

    #[inline]
    #[must_use]
    pub fn spot_light_cull_infos(&self) -> &[CullInfo] {
        &self.spot_lights.cull_infos
    }

    // === Decals ===

    #[inline]
    #[must_use]
    pub fn decals(&self) -> &[RendererDecal] {
        &self.decals.items
    }

    #[inline]
    #[must_use]
    pub fn decal_cull_infos(&self) -> &[CullInfo] {
        &self.decals.cull_infos
    }

    // === Globals ===

    #[inline]
    #[must_use]
    pub fn skybox(&self) -> Option<&Skybox> {
        self.skybox.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn per_frame_buffer(&self) -> Option<BufferHandle> {
        self.per_frame_buffer
    }

    #[inline]
    #[must_use]
    pub fn is_batched(&self) -> bool {
        !self.batches.is_empty()
    }

    fn lights_of(&mut self, ty: LightType) -> &mut DenseList<LightKey, Light> {
        match ty {
            LightType::Directional => &mut self.directional_lights,
            LightType::Radial => &mut self.radial_lights,
            LightType::Spot => &mut self.spot_lights,
        }
    }

    fn insert_renderable(&mut self, entry: RendererRenderable) -> usize {
        let cull = entry.cull_info();
        self.renderables.insert(entry.id, entry, cull)
    }

    fn set_hidden(&mut self, id: RenderableId, hidden: bool) {
        if let Some(i) = self.renderables.position(&id) {
            let entry = &mut self.renderables.items[i];
            entry.hidden = hidden;
            self.renderables.cull_infos[i] = entry.cull_info();
        }
    }

    /// Merges static renderables sharing a material and layer.
    ///
    /// Groups with a single member are left alone. Originals of a merged
    /// group are hidden, not removed, so
    /// [`destroy_batched_renderables`](Self::destroy_batched_renderables)
    /// can restore them. Existing batches are destroyed first.
    pub fn batch_renderables(&mut self, batcher: &mut dyn GeometryBatcher, api: &mut dyn RenderApi) -> usize {
        self.destroy_batched_renderables(api);

        let mut groups: FxHashMap<(u32, u64), Vec<RenderableKey>> = FxHashMap::default();
        for entry in &self.renderables.items {
            let RenderableId::Scene(key) = entry.id else { continue };
            let Some(first) = entry.renderable.elements.first() else { continue };
            if entry.renderable.is_static && !entry.hidden {
                groups
                    .entry((first.material.0, entry.renderable.layer))
                    .or_default()
                    .push(key);
            }
        }

        let mut group_keys: Vec<_> = groups.keys().copied().collect();
        group_keys.sort_unstable();

        for group_key in group_keys {
            let Some(members) = groups.remove(&group_key) else { continue };
            if members.len() < 2 {
                continue;
            }

            let sources: Vec<&Renderable> = members
                .iter()
                .filter_map(|key| self.renderable_index(*key))
                .map(|i| &self.renderables.items[i].renderable)
                .collect();
            let Some(merged) = batcher.merge(&sources) else {
                continue;
            };

            let id = RenderableId::Batch(self.batches.len() as u32);
            for key in &members {
                self.set_hidden(RenderableId::Scene(*key), true);
            }
            self.insert_renderable(RendererRenderable::new(id, merged));
            self.batches.push(BatchRecord { id, members });
        }

        log::debug!("Batched renderables into {} batches", self.batches.len());
        self.batches.len()
    }

    /// Removes every batch and restores the renderables it replaced.
    pub fn destroy_batched_renderables(&mut self, api: &mut dyn RenderApi) {
        for record in std::mem::take(&mut self.batches) {
            if let Some(mut batch) = self.renderables.remove(&record.id) {
                batch.destroy(api);
            }
            for key in record.members {
                self.set_hidden(RenderableId::Scene(key), false);
            }
        }
    }

    fn is_batch_member(&self, key: RenderableKey) -> bool {
        self.batches.iter().any(|b| b.members.contains(&key))
    }

    /// Writes per-frame globals. Called once per frame.
    pub fn update_per_frame(&mut self, api: &mut dyn RenderApi, frame: FrameInfo) {
        let buffer = *self
            .per_frame_buffer
            .get_or_insert_with(|| api.create_buffer(&BufferDesc::uniform::<PerFrameParams>()));
        let params = PerFrameParams {
            time: frame.time,
            delta_time: frame.delta_time,
            frame_index: frame.frame_index as u32,
            _pad: 0,
        };
        api.write_buffer(buffer, bytemuck::bytes_of(&params));
    }

    /// Uploads per-object parameters of dirty renderables.
    pub fn prepare_renderables(&mut self, api: &mut dyn RenderApi) {
        for entry in &mut self.renderables.items {
            if !entry.hidden {
                entry.upload(api);
            }
        }
    }

    /// Frees every GPU buffer the scene created.
    pub fn destroy(&mut self, api: &mut dyn RenderApi) {
        self.batches.clear();
        for entry in &mut self.renderables.items {
            entry.destroy(api);
        }
        self.renderables.clear();
        if let Some(buffer) = self.per_frame_buffer.take() {
            api.destroy_buffer(buffer);
        }
    }
}

// ─── RendererScene ──────────────────────────────────────────────────────────

/// Applies scene change notifications and owns the per-camera views.
pub struct RendererScene {
    info: SceneInfo,
    views: Vec<RendererView>,
    view_index: FxHashMap<CameraKey, usize>,
    render_targets: Vec<RenderTargetData>,
    target_priorities: FxHashMap<RenderTargetHandle, i32>,
    default_settings: Rc<RenderSettings>,
    clear_color: Vec4,
}

impl RendererScene {
    #[must_use]
    pub fn new(settings: &RendererSettings) -> Self {
        Self {
            info: SceneInfo::new(settings.initial_capacity),
            views: Vec::new(),
            view_index: FxHashMap::default(),
            render_targets: Vec::new(),
            target_priorities: FxHashMap::default(),
            default_settings: Rc::new(settings.default_settings.clone()),
            clear_color: settings.clear_color,
        }
    }

    #[inline]
    #[must_use]
    pub fn info(&self) -> &SceneInfo {
        &self.info
    }

    #[inline]
    pub fn info_mut(&mut self) -> &mut SceneInfo {
        &mut self.info
    }

    #[inline]
    #[must_use]
    pub fn views(&self) -> &[RendererView] {
        &self.views
    }

    /// Scene data and views borrowed together for rendering.
    pub fn split_mut(&mut self) -> (&mut SceneInfo, &mut [RendererView]) {
        (&mut self.info, &mut self.views)
    }

    #[must_use]
    pub fn view(&self, camera: CameraKey) -> Option<&RendererView> {
        self.view_index.get(&camera).map(|&i| &self.views[i])
    }

    #[must_use]
    pub fn view_position(&self, camera: CameraKey) -> Option<usize> {
        self.view_index.get(&camera).copied()
    }

    /// Render targets in rendering order.
    #[inline]
    #[must_use]
    pub fn render_targets(&self) -> &[RenderTargetData] {
        &self.render_targets
    }

    // === Cameras ===

    pub fn register_camera(&mut self, key: CameraKey, camera: &Camera, registry: &NodeRegistry) {
        if self.view_index.contains_key(&key) {
            log::warn!("Camera {key:?} registered twice; updating instead");
            self.update_camera(key, camera);
            return;
        }
        let desc = RendererViewDesc::from_camera(camera, self.clear_color);
        let view = RendererView::new(key, desc, Rc::clone(&self.default_settings), registry);
        self.view_index.insert(key, self.views.len());
        self.views.push(view);
        log::debug!("Created view for camera {key:?}");
        self.rebuild_render_targets();
    }

    pub fn update_camera(&mut self, key: CameraKey, camera: &Camera) {
        let Some(&i) = self.view_index.get(&key) else {
            log::warn!("Update for unregistered camera {key:?}");
            return;
        };
        let desc = RendererViewDesc::from_camera(camera, self.clear_color);
        let retarget = {
            let current = self.views[i].data().desc();
            current.target != desc.target || current.priority != desc.priority
        };
        self.views[i].data_mut().set_desc(desc);
        if retarget {
            self.rebuild_render_targets();
        }
    }

    pub fn unregister_camera(&mut self, key: CameraKey, api: &mut dyn RenderApi) {
        let Some(i) = self.view_index.remove(&key) else {
            log::warn!("Removal of unregistered camera {key:?}");
            return;
        };
        let mut view = self.views.swap_remove(i);
        view.destroy(api);
        if let Some(moved) = self.views.get(i) {
            self.view_index.insert(moved.camera(), i);
        }
        log::debug!("Removed view for camera {key:?}");
        self.rebuild_render_targets();
    }

    /// Replaces a view's settings and rebuilds its compositor. Invalid
    /// settings are rejected and the view keeps its current ones.
    pub fn set_render_settings(
        &mut self,
        camera: CameraKey,
        settings: RenderSettings,
        registry: &NodeRegistry,
    ) -> Result<()> {
        let i = *self
            .view_index
            .get(&camera)
            .ok_or(SableError::UnknownCamera { camera })?;
        settings.validate()?;
        log::debug!("Rebuilding compositor for camera {camera:?} with new settings");
        self.views[i].set_render_settings(Rc::new(settings), registry)?;
        Ok(())
    }

    /// Requests a redraw of an on-demand camera.
    pub fn notify_needs_redraw(&mut self, camera: CameraKey) {
        if let Some(&i) = self.view_index.get(&camera) {
            self.views[i].data_mut().notify_needs_redraw();
        }
    }

    pub fn set_render_target_priority(&mut self, target: RenderTargetHandle, priority: i32) {
        self.target_priorities.insert(target, priority);
        self.rebuild_render_targets();
    }

    fn rebuild_render_targets(&mut self) {
        let mut targets: Vec<RenderTargetData> = Vec::new();
        for view in &self.views {
            let target = view.data().desc().target;
            match targets.iter_mut().find(|t| t.target == target) {
                Some(data) => data.cameras.push(view.camera()),
                None => targets.push(RenderTargetData {
                    target,
                    priority: self.target_priorities.get(&target).copied().unwrap_or(0),
                    cameras: vec![view.camera()],
                }),
            }
        }

        let camera_priority = |key: &CameraKey| {
            self.view_index
                .get(key)
                .map_or(0, |&i| self.views[i].data().desc().priority)
        };
        for data in &mut targets {
            data.cameras.sort_by_key(|key| std::cmp::Reverse(camera_priority(key)));
        }
        targets.sort_by_key(|t| std::cmp::Reverse(t.priority));

        self.render_targets = targets;
    }

    // === Lights ===

    pub fn register_light(&mut self, key: LightKey, light: &Light) {
        let ty = light.light_type();
        if let Some(old) = self.info.light_types.insert(key, ty)
            && old != ty
        {
            self.info.lights_of(old).remove(&key);
        }
        let cull = CullInfo::unlayered(light.bounds());
        self.info.lights_of(ty).insert(key, light.clone(), cull);
    }

    /// Light type changes move the light between lists.
    pub fn update_light(&mut self, key: LightKey, light: &Light) {
        if !self.info.light_types.contains_key(&key) {
            log::warn!("Update for unregistered light {key:?}");
            return;
        }
        self.register_light(key, light);
    }

    pub fn unregister_light(&mut self, key: LightKey) {
        match self.info.light_types.remove(&key) {
            Some(ty) => {
                self.info.lights_of(ty).remove(&key);
            }
            None => log::warn!("Removal of unregistered light {key:?}"),
        }
    }

    // === Renderables ===

    pub fn register_renderable(&mut self, key: RenderableKey, renderable: &Renderable) {
        let id = RenderableId::Scene(key);
        if let Some(i) = self.info.renderables.position(&id) {
            log::warn!("Renderable {key:?} registered twice; updating instead");
            self.set_renderable_at(i, renderable);
            return;
        }
        self.info
            .insert_renderable(RendererRenderable::new(id, renderable.clone()));
    }

    /// Changing a batched renderable destroys all batches first.
    pub fn update_renderable(&mut self, key: RenderableKey, renderable: &Renderable, api: &mut dyn RenderApi) {
        if self.info.is_batch_member(key) {
            self.info.destroy_batched_renderables(api);
        }
        match self.info.renderable_index(key) {
            Some(i) => self.set_renderable_at(i, renderable),
            None => log::warn!("Update for unregistered renderable {key:?}"),
        }
    }

    fn set_renderable_at(&mut self, i: usize, renderable: &Renderable) {
        let entry = &mut self.info.renderables.items[i];
        entry.set_renderable(renderable.clone());
        self.info.renderables.cull_infos[i] = entry.cull_info();
    }

    pub fn unregister_renderable(&mut self, key: RenderableKey, api: &mut dyn RenderApi) {
        if self.info.is_batch_member(key) {
            self.info.destroy_batched_renderables(api);
        }
        match self.info.renderables.remove(&RenderableId::Scene(key)) {
            Some(mut entry) => entry.destroy(api),
            None => log::warn!("Removal of unregistered renderable {key:?}"),
        }
    }

    // === Decals ===

    pub fn register_decal(&mut self, key: DecalKey, decal: &Decal) {
        let entry = RendererDecal::new(decal.clone());
        let cull = entry.cull_info();
        self.info.decals.insert(key, entry, cull);
    }

    pub fn update_decal(&mut self, key: DecalKey, decal: &Decal) {
        if self.info.decals.position(&key).is_none() {
            log::warn!("Update for unregistered decal {key:?}");
            return;
        }
        self.register_decal(key, decal);
    }

    pub fn unregister_decal(&mut self, key: DecalKey) {
        if self.info.decals.remove(&key).is_none() {
            log::warn!("Removal of unregistered decal {key:?}");
        }
    }

    // === Globals ===

    pub fn set_skybox(&mut self, skybox: Option<Skybox>) {
        self.info.skybox = skybox;
    }

    pub fn batch_renderables(&mut self, batcher: &mut dyn GeometryBatcher, api: &mut dyn RenderApi) -> usize {
        self.info.batch_renderables(batcher, api)
    }

    pub fn destroy_batched_renderables(&mut self, api: &mut dyn RenderApi) {
        self.info.destroy_batched_renderables(api);
    }

    /// Destroys every view and scene GPU resource.
    pub fn destroy(&mut self, api: &mut dyn RenderApi) {
        for view in &mut self.views {
            view.destroy(api);
        }
        self.views.clear();
        self.view_index.clear();
        self.render_targets.clear();
        self.info.destroy(api);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{BoundingBox, MaterialId, MeshId, PipelineId, RenderableElement};
    use glam::{Affine3A, Vec3};
    use slotmap::SlotMap;

    fn unit_renderable() -> Renderable {
        Renderable::new(
            vec![RenderableElement::new(MeshId(0), 0, MaterialId(1), PipelineId(1))],
            Bounds::from_box(BoundingBox::new(Vec3::splat(-0.5), Vec3::splat(0.5))),
        )
    }

    #[test]
    fn swap_remove_keeps_index_consistent() {
        let mut keys: SlotMap<RenderableKey, ()> = SlotMap::with_key();
        let (a, b, c) = (keys.insert(()), keys.insert(()), keys.insert(()));
        let mut scene = RendererScene::new(&RendererSettings::default());
        let mut api = crate::renderer::core::NullRenderApi::new();

        for key in [a, b, c] {
            scene.register_renderable(key, &unit_renderable());
        }
        scene.unregister_renderable(a, &mut api);

        assert_eq!(scene.info().renderable_count(), 2);
        let c_index = scene.info().renderable_index(c).unwrap();
        assert_eq!(scene.info().renderables()[c_index].id(), RenderableId::Scene(c));
        assert!(scene.info().renderable_index(a).is_none());
    }

    #[test]
    fn moved_renderable_uploads_twice() {
        let mut keys: SlotMap<RenderableKey, ()> = SlotMap::with_key();
        let key = keys.insert(());
        let mut scene = RendererScene::new(&RendererSettings::default());
        let mut api = crate::renderer::core::NullRenderApi::new();

        scene.register_renderable(key, &unit_renderable());
        scene.info_mut().prepare_renderables(&mut api);
        api.clear_commands();

        let mut moved = unit_renderable();
        moved.world_transform = Affine3A::from_translation(Vec3::X);
        scene.update_renderable(key, &moved, &mut api);

        scene.info_mut().prepare_renderables(&mut api);
        scene.info_mut().prepare_renderables(&mut api);
        scene.info_mut().prepare_renderables(&mut api);
        let writes = api
            .commands()
            .iter()
            .filter(|c| matches!(c, crate::renderer::core::ApiCommand::WriteBuffer { .. }))
            .count();
        assert_eq!(writes, 2, "one upload for the move, one for prev_world to settle");
    }

    #[test]
    fn light_type_change_moves_between_lists() {
        let mut keys: SlotMap<LightKey, ()> = SlotMap::with_key();
        let key = keys.insert(());
        let mut scene = RendererScene::new(&RendererSettings::default());

        scene.register_light(key, &Light::new_radial(Vec3::ONE, 1.0, Vec3::ZERO, 5.0));
        assert_eq!(scene.info().radial_lights().len(), 1);

        scene.update_light(key, &Light::new_directional(Vec3::ONE, 1.0, Vec3::NEG_Y));
        assert!(scene.info().radial_lights().is_empty());
        assert_eq!(scene.info().directional_lights().len(), 1);
    }

    #[test]
    fn updates_for_unregistered_objects_are_ignored() {
        let mut lights: SlotMap<LightKey, ()> = SlotMap::with_key();
        let mut renderables: SlotMap<RenderableKey, ()> = SlotMap::with_key();
        let mut scene = RendererScene::new(&RendererSettings::default());
        let mut api = crate::renderer::core::NullRenderApi::new();

        scene.update_light(lights.insert(()), &Light::new_radial(Vec3::ONE, 1.0, Vec3::ZERO, 5.0));
        scene.update_renderable(renderables.insert(()), &unit_renderable(), &mut api);
        scene.unregister_renderable(renderables.insert(()), &mut api);

        assert!(scene.info().radial_lights().is_empty());
        assert_eq!(scene.info().renderable_count(), 0);
    }
}
