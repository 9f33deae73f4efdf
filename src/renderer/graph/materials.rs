//! Full-screen effects
//!
//! Leaf "node bodies": each binds a named effect pipeline, its input
//! textures and a parameter block, then draws one full-screen triangle into
//! the given target. The compositor never looks inside.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec4};

use crate::renderer::core::{Rect2, RenderApi, RenderTargetHandle, TextureHandle, slots};

/// A named full-screen pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FullscreenEffect {
    name: &'static str,
}

impl FullscreenEffect {
    pub const BLIT: Self = Self::new("blit");
    pub const BLIT_DEPTH: Self = Self::new("blit_depth");
    pub const SKYBOX: Self = Self::new("skybox");
    pub const BLOOM_DOWNSAMPLE: Self = Self::new("bloom_downsample");
    pub const BLOOM_UPSAMPLE: Self = Self::new("bloom_upsample");
    pub const MOTION_BLUR: Self = Self::new("motion_blur");
    pub const TONEMAPPING: Self = Self::new("tonemapping");
    pub const FXAA: Self = Self::new("fxaa");

    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Draws into `target` restricted to `viewport`.
    pub fn execute<P: Pod>(
        &self,
        api: &mut dyn RenderApi,
        target: RenderTargetHandle,
        viewport: Rect2,
        inputs: &[TextureHandle],
        params: &P,
    ) {
        self.execute_with_depth(api, target, None, viewport, inputs, params);
    }

    /// Like [`execute`](Self::execute), with a depth attachment bound for testing.
    pub fn execute_with_depth<P: Pod>(
        &self,
        api: &mut dyn RenderApi,
        target: RenderTargetHandle,
        depth: Option<RenderTargetHandle>,
        viewport: Rect2,
        inputs: &[TextureHandle],
        params: &P,
    ) {
        api.set_render_target(target, depth);
        api.set_viewport(viewport);
        api.bind_effect(self.name);
        if !inputs.is_empty() {
            api.bind_textures(inputs);
        }
        api.set_parameters(slots::EFFECT, bytemuck::bytes_of(params));
        api.draw(3, 1);
    }
}

// ─── Parameter blocks ─────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct BlitParams {
    /// Samples to resolve when the source is multisampled.
    pub sample_count: u32,
    pub _pad: [u32; 3],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SkyboxParams {
    pub brightness: f32,
    pub _pad: [f32; 3],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct BloomParams {
    /// Size of one source texel in UV units.
    pub texel_size: Vec2,
    pub threshold: f32,
    pub intensity: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MotionBlurParams {
    pub inv_view_proj: Mat4,
    pub prev_view_proj: Mat4,
    pub sample_count: u32,
    pub shutter_fraction: f32,
    pub _pad: [u32; 2],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TonemappingParams {
    pub exposure_scale: f32,
    pub gamma: f32,
    pub bloom_intensity: f32,
    /// Non-zero when a bloom texture is bound as the second input.
    pub has_bloom: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct FxaaParams {
    /// xy = 1 / size, zw = size in pixels.
    pub inv_texture_size: Vec4,
}

impl FxaaParams {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let (w, h) = (width.max(1) as f32, height.max(1) as f32);
        Self {
            inv_texture_size: Vec4::new(1.0 / w, 1.0 / h, w, h),
        }
    }
}
