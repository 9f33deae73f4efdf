//! Headless device
//!
//! [`NullRenderApi`] implements [`RenderApi`] without a GPU. It tracks live
//! resources and records every command, which makes it the device of choice
//! for tests, tools, and headless frame stepping.

use glam::Vec4;
use rustc_hash::FxHashMap;

use super::api::{
    ClearFlags, Conventions, Rect2, RenderApi, RenderTargetHandle, TextureHandle, BufferHandle,
};
use super::resources::{BufferDesc, TextureDesc};
use crate::scene::renderable::{MaterialId, MeshId, PipelineId};

/// A recorded device call.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCommand {
    WriteBuffer { buffer: BufferHandle, len: usize },
    SetRenderTarget { color: RenderTargetHandle, depth: Option<RenderTargetHandle> },
    SetViewport(Rect2),
    Clear { flags: ClearFlags, color: Vec4 },
    BindEffect(String),
    BindMaterial { pipeline: PipelineId, material: MaterialId },
    BindTextures(Vec<TextureHandle>),
    BindBuffer { slot: u32, buffer: BufferHandle },
    SetParameters { slot: u32, len: usize },
    Draw { vertex_count: u32, instance_count: u32 },
    DrawMesh { mesh: MeshId, sub_mesh: u32, instance_count: u32 },
    SwapBuffers(RenderTargetHandle),
}

struct TargetInfo {
    size: (u32, u32),
    /// `None` for window targets.
    texture: Option<TextureHandle>,
}

/// Recording device with no GPU behind it.
pub struct NullRenderApi {
    conventions: Conventions,
    next_id: u32,
    textures: FxHashMap<TextureHandle, TextureDesc>,
    buffers: FxHashMap<BufferHandle, BufferDesc>,
    targets: FxHashMap<RenderTargetHandle, TargetInfo>,
    commands: Vec<ApiCommand>,
    textures_created: usize,
    buffers_created: usize,
}

impl Default for NullRenderApi {
    fn default() -> Self {
        Self::new()
    }
}

impl NullRenderApi {
    #[must_use]
    pub fn new() -> Self {
        Self::with_conventions(Conventions::default())
    }

    #[must_use]
    pub fn with_conventions(conventions: Conventions) -> Self {
        Self {
            conventions,
            next_id: 1,
            textures: FxHashMap::default(),
            buffers: FxHashMap::default(),
            targets: FxHashMap::default(),
            commands: Vec::new(),
            textures_created: 0,
            buffers_created: 0,
        }
    }

    fn next_raw(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Creates a window-like target of the given size.
    pub fn create_window_target(&mut self, width: u32, height: u32) -> RenderTargetHandle {
        let handle = RenderTargetHandle::from_raw(self.next_raw());
        self.targets.insert(
            handle,
            TargetInfo {
                size: (width, height),
                texture: None,
            },
        );
        handle
    }

    /// Simulates a window resize.
    pub fn resize_target(&mut self, target: RenderTargetHandle, width: u32, height: u32) {
        match self.targets.get_mut(&target) {
            Some(info) => info.size = (width, height),
            None => log::warn!("resize_target: unknown render target {target:?}"),
        }
    }

    #[must_use]
    pub fn live_texture_count(&self) -> usize {
        self.textures.len()
    }

    #[must_use]
    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Total textures ever created, including destroyed ones.
    #[must_use]
    pub fn textures_created(&self) -> usize {
        self.textures_created
    }

    #[must_use]
    pub fn buffers_created(&self) -> usize {
        self.buffers_created
    }

    #[must_use]
    pub fn texture_desc(&self, texture: TextureHandle) -> Option<&TextureDesc> {
        self.textures.get(&texture)
    }

    #[must_use]
    pub fn is_texture_alive(&self, texture: TextureHandle) -> bool {
        self.textures.contains_key(&texture)
    }

    #[must_use]
    pub fn commands(&self) -> &[ApiCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<ApiCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Number of draw calls of either kind recorded so far.
    #[must_use]
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, ApiCommand::Draw { .. } | ApiCommand::DrawMesh { .. }))
            .count()
    }

    /// Effect names bound so far, in order.
    #[must_use]
    pub fn bound_effects(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                ApiCommand::BindEffect(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl RenderApi for NullRenderApi {
    fn conventions(&self) -> Conventions {
        self.conventions
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> TextureHandle {
        let handle = TextureHandle::from_raw(self.next_raw());
        self.textures.insert(handle, *desc);
        self.textures_created += 1;
        handle
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        if self.textures.remove(&texture).is_none() {
            log::warn!("destroy_texture: unknown texture {texture:?}");
        }
    }

    fn create_render_target(&mut self, texture: TextureHandle, _depth_stencil: bool) -> RenderTargetHandle {
        let size = self
            .textures
            .get(&texture)
            .map_or((0, 0), |desc| (desc.width, desc.height));
        let handle = RenderTargetHandle::from_raw(self.next_raw());
        self.targets.insert(
            handle,
            TargetInfo {
                size,
                texture: Some(texture),
            },
        );
        handle
    }

    fn destroy_render_target(&mut self, target: RenderTargetHandle) {
        if self.targets.remove(&target).is_none() {
            log::warn!("destroy_render_target: unknown render target {target:?}");
        }
    }

    fn render_target_size(&self, target: RenderTargetHandle) -> (u32, u32) {
        match self.targets.get(&target) {
            Some(TargetInfo { texture: Some(texture), size }) => self
                .textures
                .get(texture)
                .map_or(*size, |desc| (desc.width, desc.height)),
            Some(info) => info.size,
            None => (0, 0),
        }
    }

    fn create_buffer(&mut self, desc: &BufferDesc) -> BufferHandle {
        let handle = BufferHandle::from_raw(self.next_raw());
        self.buffers.insert(handle, *desc);
        self.buffers_created += 1;
        handle
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        if self.buffers.remove(&buffer).is_none() {
            log::warn!("destroy_buffer: unknown buffer {buffer:?}");
        }
    }

    fn write_buffer(&mut self, buffer: BufferHandle, data: &[u8]) {
        self.commands.push(ApiCommand::WriteBuffer {
            buffer,
            len: data.len(),
        });
    }

    fn set_render_target(&mut self, color: RenderTargetHandle, depth: Option<RenderTargetHandle>) {
        self.commands.push(ApiCommand::SetRenderTarget { color, depth });
    }

    fn set_viewport(&mut self, viewport: Rect2) {
        self.commands.push(ApiCommand::SetViewport(viewport));
    }

    fn clear_viewport(&mut self, flags: ClearFlags, color: Vec4, _depth: f32, _stencil: u32) {
        self.commands.push(ApiCommand::Clear { flags, color });
    }

    fn bind_effect(&mut self, name: &str) {
        self.commands.push(ApiCommand::BindEffect(name.to_owned()));
    }

    fn bind_material(&mut self, pipeline: PipelineId, material: MaterialId) {
        self.commands.push(ApiCommand::BindMaterial { pipeline, material });
    }

    fn bind_textures(&mut self, textures: &[TextureHandle]) {
        self.commands.push(ApiCommand::BindTextures(textures.to_vec()));
    }

    fn bind_buffer(&mut self, slot: u32, buffer: BufferHandle) {
        self.commands.push(ApiCommand::BindBuffer { slot, buffer });
    }

    fn set_parameters(&mut self, slot: u32, data: &[u8]) {
        self.commands.push(ApiCommand::SetParameters { slot, len: data.len() });
    }

    fn draw(&mut self, vertex_count: u32, instance_count: u32) {
        self.commands.push(ApiCommand::Draw {
            vertex_count,
            instance_count,
        });
    }

    fn draw_mesh(&mut self, mesh: MeshId, sub_mesh: u32, instance_count: u32) {
        self.commands.push(ApiCommand::DrawMesh {
            mesh,
            sub_mesh,
            instance_count,
        });
    }

    fn swap_buffers(&mut self, target: RenderTargetHandle) {
        self.commands.push(ApiCommand::SwapBuffers(target));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::core::resources::TextureUsage;

    #[test]
    fn texture_target_reports_texture_size() {
        let mut api = NullRenderApi::new();
        let tex = api.create_texture(&TextureDesc::create_2d(
            wgpu::TextureFormat::Rgba8Unorm,
            128,
            64,
            TextureUsage::RENDER_TARGET,
        ));
        let rt = api.create_render_target(tex, false);
        assert_eq!(api.render_target_size(rt), (128, 64));
    }

    #[test]
    fn window_target_resizes() {
        let mut api = NullRenderApi::new();
        let window = api.create_window_target(800, 600);
        api.resize_target(window, 1024, 768);
        assert_eq!(api.render_target_size(window), (1024, 768));
    }

    #[test]
    fn destroy_tracks_live_count() {
        let mut api = NullRenderApi::new();
        let desc = TextureDesc::create_2d(wgpu::TextureFormat::Rgba8Unorm, 4, 4, TextureUsage::SHADER_READ);
        let a = api.create_texture(&desc);
        let _b = api.create_texture(&desc);
        api.destroy_texture(a);
        assert_eq!(api.live_texture_count(), 1);
        assert_eq!(api.textures_created(), 2);
    }
}
