//! Device Contract
//!
//! [`RenderApi`] is the immediate-mode graphics device the renderer core
//! drives: resource creation, stateful binding calls, draws and buffer swaps.
//! Concrete backends translate these into their own command recording.
//!
//! All calls happen on the render thread; implementations need not be `Sync`.

use bitflags::bitflags;
use glam::{Mat4, Vec4};

use crate::renderer::core::resources::{BufferDesc, TextureDesc};
use crate::scene::renderable::{MaterialId, MeshId, PipelineId};

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            #[must_use]
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            #[inline]
            #[must_use]
            pub const fn raw(self) -> u32 {
                self.0
            }
        }
    };
}

define_handle!(
    /// Device texture.
    TextureHandle
);
define_handle!(
    /// Device buffer.
    BufferHandle
);
define_handle!(
    /// Something that can be rendered into: a window surface or a view onto a texture.
    RenderTargetHandle
);

/// Well-known parameter and buffer binding slots.
pub mod slots {
    pub const PER_FRAME: u32 = 0;
    pub const PER_CAMERA: u32 = 1;
    pub const PER_OBJECT: u32 = 2;
    pub const LIGHTS: u32 = 3;
    pub const EFFECT: u32 = 4;
    /// Indices into the light buffer influencing the current object.
    pub const LIGHT_INDICES: u32 = 5;
}

/// Rectangle. Normalized `[0, 1]` when describing a viewport within a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect2 {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect2 {
    pub const FULL: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Converts a normalized rect into whole pixels of a `width x height` target.
    #[must_use]
    pub fn to_pixels(&self, width: u32, height: u32) -> PixelRect {
        let (w, h) = (width as f32, height as f32);
        PixelRect {
            x: (self.x * w).round() as u32,
            y: (self.y * h).round() as u32,
            width: ((self.width * w).round() as u32).max(1),
            height: ((self.height * h).round() as u32).max(1),
        }
    }
}

/// Viewport in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u8 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixOrder {
    ColumnMajor,
    RowMajor,
}

/// Backend conventions the renderer normalizes against when building
/// screen-space parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conventions {
    /// Direction texture V grows in.
    pub uv_y_axis: Axis,
    /// Direction NDC Y grows in.
    pub ndc_y_axis: Axis,
    pub matrix_order: MatrixOrder,
}

impl Default for Conventions {
    /// WebGPU / Vulkan-with-flipped-viewport layout.
    fn default() -> Self {
        Self {
            uv_y_axis: Axis::Down,
            ndc_y_axis: Axis::Up,
            matrix_order: MatrixOrder::ColumnMajor,
        }
    }
}

impl Conventions {
    /// `1.0` when NDC and UV Y agree, `-1.0` when one must be flipped into the other.
    #[inline]
    #[must_use]
    pub fn ndc_to_uv_y_sign(&self) -> f32 {
        if self.uv_y_axis == self.ndc_y_axis { 1.0 } else { -1.0 }
    }

    /// Lays out a matrix the way the backend expects to read it.
    #[inline]
    #[must_use]
    pub fn convert_matrix(&self, m: Mat4) -> Mat4 {
        match self.matrix_order {
            MatrixOrder::ColumnMajor => m,
            MatrixOrder::RowMajor => m.transpose(),
        }
    }
}

/// Immediate-mode graphics device.
pub trait RenderApi {
    fn conventions(&self) -> Conventions {
        Conventions::default()
    }

    // ── Resources ──────────────────────────────────────────────────────────

    fn create_texture(&mut self, desc: &TextureDesc) -> TextureHandle;

    fn destroy_texture(&mut self, texture: TextureHandle);

    /// Creates an attachable view of `texture`.
    fn create_render_target(&mut self, texture: TextureHandle, depth_stencil: bool) -> RenderTargetHandle;

    fn destroy_render_target(&mut self, target: RenderTargetHandle);

    /// Current size of a render target in pixels.
    fn render_target_size(&self, target: RenderTargetHandle) -> (u32, u32);

    fn create_buffer(&mut self, desc: &BufferDesc) -> BufferHandle;

    fn destroy_buffer(&mut self, buffer: BufferHandle);

    fn write_buffer(&mut self, buffer: BufferHandle, data: &[u8]);

    // ── Commands ───────────────────────────────────────────────────────────

    fn set_render_target(&mut self, color: RenderTargetHandle, depth: Option<RenderTargetHandle>);

    /// Viewport in normalized coordinates of the bound target.
    fn set_viewport(&mut self, viewport: Rect2);

    fn clear_viewport(&mut self, flags: ClearFlags, color: Vec4, depth: f32, stencil: u32);

    /// Binds a named full-screen effect pipeline.
    fn bind_effect(&mut self, name: &str);

    /// Binds the pipeline and parameters of a scene material.
    fn bind_material(&mut self, pipeline: PipelineId, material: MaterialId);

    fn bind_textures(&mut self, textures: &[TextureHandle]);

    fn bind_buffer(&mut self, slot: u32, buffer: BufferHandle);

    /// Uploads a small inline parameter block to `slot`.
    fn set_parameters(&mut self, slot: u32, data: &[u8]);

    /// Non-indexed draw with no vertex input (full-screen passes).
    fn draw(&mut self, vertex_count: u32, instance_count: u32);

    fn draw_mesh(&mut self, mesh: MeshId, sub_mesh: u32, instance_count: u32);

    /// Presents a window target.
    fn swap_buffers(&mut self, target: RenderTargetHandle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_conventions_flip_y() {
        assert!((Conventions::default().ndc_to_uv_y_sign() + 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn row_major_transposes() {
        let conventions = Conventions {
            matrix_order: MatrixOrder::RowMajor,
            ..Conventions::default()
        };
        let m = Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(conventions.convert_matrix(m), m.transpose());
    }

    #[test]
    fn normalized_rect_to_pixels() {
        let rect = Rect2::new(0.5, 0.0, 0.5, 1.0).to_pixels(800, 600);
        assert_eq!(rect, PixelRect { x: 400, y: 0, width: 400, height: 600 });
    }
}
