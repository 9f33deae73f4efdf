//! Built-in compositor nodes
//!
//! The forward renderer's frame graph:
//!
//! ```text
//! SceneColor ─▶ ForwardPass ─▶ Skybox ─┬─▶ Bloom ──────┐
//!                                      ├─▶ MotionBlur ─┤
//!                                      └───────────────┴─▶ Tonemapping ─▶ Fxaa ─▶ FinalResolve
//! ```
//!
//! Bloom, MotionBlur and Fxaa only join the graph when enabled in the view's
//! settings; FinalResolve picks its source from the output channel.

mod bloom;
mod final_resolve;
mod forward;
mod fxaa;
mod motion_blur;
mod scene_color;
mod skybox;
mod tone_mapping;

pub use bloom::BloomNode;
pub use final_resolve::FinalResolveNode;
pub use forward::ForwardPassNode;
pub use fxaa::FxaaNode;
pub use motion_blur::MotionBlurNode;
pub use scene_color::SceneColorNode;
pub use skybox::SkyboxNode;
pub use tone_mapping::TonemappingNode;

use crate::renderer::core::{TextureDesc, TextureUsage};

/// LDR format of post-tonemapping intermediates.
pub const LDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Sampled color attachment.
fn color_target(format: wgpu::TextureFormat, width: u32, height: u32) -> TextureDesc {
    TextureDesc::create_2d(
        format,
        width.max(1),
        height.max(1),
        TextureUsage::RENDER_TARGET | TextureUsage::SHADER_READ,
    )
}
