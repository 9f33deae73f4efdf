//! Scene components
//!
//! Game-side owners of the objects the renderer draws:
//! - Scene: slotmap-backed component store issuing stable keys
//! - Camera / ConvexVolume: viewpoints and their culling volumes
//! - Light, Renderable, Decal: drawable and lighting components
//! - Bounds: bounding box + sphere pairs used for culling
//!
//! The renderer never owns these objects. It is notified of changes through
//! `Renderer::notify_*_added/updated/removed` and keeps its own copies keyed by
//! the slotmap keys defined here.

pub mod bounds;
pub mod camera;
pub mod decal;
pub mod light;
pub mod renderable;
pub mod scene;

pub use bounds::{BoundingBox, BoundingSphere, Bounds};
pub use camera::{Camera, ConvexVolume, ProjectionType};
pub use decal::Decal;
pub use light::{Light, LightKind, LightType};
pub use renderable::{MaterialId, MeshId, PipelineId, Renderable, RenderableElement, ShaderFlags};
pub use scene::Scene;

use slotmap::new_key_type;

new_key_type! {
    pub struct CameraKey;
    pub struct LightKey;
    pub struct RenderableKey;
    pub struct DecalKey;
}
