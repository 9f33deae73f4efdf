//! Device layer
//!
//! - [`RenderApi`]: the immediate-mode graphics device the core drives
//! - [`NullRenderApi`]: headless recording implementation
//! - Resource descriptors and GPU parameter blocks

pub mod api;
pub mod null_api;
pub mod resources;
pub mod uniforms;

pub use api::{
    Axis, BufferHandle, ClearFlags, Conventions, MatrixOrder, PixelRect, Rect2, RenderApi,
    RenderTargetHandle, TextureHandle, slots,
};
pub use null_api::{ApiCommand, NullRenderApi};
pub use resources::{
    BufferDesc, BufferFormat, BufferType, BufferUsage, TextureDesc, TextureType, TextureUsage,
};
pub use uniforms::{LightData, PerCameraParams, PerFrameParams, PerObjectParams};
