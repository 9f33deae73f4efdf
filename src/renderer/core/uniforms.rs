//! GPU parameter blocks
//!
//! `#[repr(C)]` blocks uploaded through [`RenderApi::write_buffer`](super::RenderApi::write_buffer)
//! or [`RenderApi::set_parameters`](super::RenderApi::set_parameters).
//! Layouts are std140-compatible: every member is 16-byte aligned or padded.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

/// Per-frame globals, bound at [`slots::PER_FRAME`](super::api::slots::PER_FRAME).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PerFrameParams {
    pub time: f32,
    pub delta_time: f32,
    pub frame_index: u32,
    pub _pad: u32,
}

/// Per-view parameters, bound at [`slots::PER_CAMERA`](super::api::slots::PER_CAMERA).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PerCameraParams {
    pub view: Mat4,
    pub proj: Mat4,
    pub view_proj: Mat4,
    pub inv_proj: Mat4,
    pub inv_view_proj: Mat4,
    pub prev_view_proj: Mat4,
    /// xyz = world origin
    pub view_origin: Vec4,
    /// xyz = world forward
    pub view_dir: Vec4,
    /// xy = scale, zw = offset mapping clip space to UV.
    pub clip_to_uv: Vec4,
    /// xy = device Z to view Z coefficients, z = near, w = far.
    pub device_z_to_view_z: Vec4,
    /// Viewport in pixels: x, y, width, height.
    pub viewport_rect: Vec4,
}

impl Default for PerCameraParams {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
            view_proj: Mat4::IDENTITY,
            inv_proj: Mat4::IDENTITY,
            inv_view_proj: Mat4::IDENTITY,
            prev_view_proj: Mat4::IDENTITY,
            view_origin: Vec4::ZERO,
            view_dir: Vec4::new(0.0, 0.0, -1.0, 0.0),
            clip_to_uv: Vec4::new(0.5, -0.5, 0.5, 0.5),
            device_z_to_view_z: Vec4::ZERO,
            viewport_rect: Vec4::ZERO,
        }
    }
}

/// Per-renderable parameters, bound at [`slots::PER_OBJECT`](super::api::slots::PER_OBJECT).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PerObjectParams {
    pub world: Mat4,
    pub inv_transpose_world: Mat4,
    pub prev_world: Mat4,
    /// x = low 32 layer bits, y = high 32 layer bits.
    pub layer: [u32; 4],
}

impl PerObjectParams {
    #[must_use]
    pub fn new(world: Mat4, prev_world: Mat4, layer: u64) -> Self {
        Self {
            world,
            inv_transpose_world: world.inverse().transpose(),
            prev_world,
            layer: [layer as u32, (layer >> 32) as u32, 0, 0],
        }
    }
}

/// GPU-side light description.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct LightData {
    /// xyz = position, w = range
    pub position_range: Vec4,
    /// xyz = direction, w = light type
    pub direction_type: Vec4,
    /// rgb = color, a = intensity
    pub color_intensity: Vec4,
    /// x = cos(inner), y = cos(outer), zw unused
    pub spot_angles: Vec4,
}
