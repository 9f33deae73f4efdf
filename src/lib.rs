#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod errors;
pub mod renderer;
pub mod scene;

pub use errors::{Result, SableError, SettingsError};
pub use renderer::core::{NullRenderApi, RenderApi};
pub use renderer::graph::{CompositorError, GpuResourcePool, NodeRegistry, RenderCompositor};
pub use renderer::settings::{RenderSettings, RendererSettings};
pub use renderer::{Renderer, Skybox};
pub use scene::{Camera, Decal, Light, Renderable, RenderableElement, Scene};
