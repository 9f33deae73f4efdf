use bitflags::bitflags;
use glam::Affine3A;

use crate::scene::bounds::Bounds;

/// Handle to mesh geometry owned by the asset layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub u32);

/// Handle to a material instance owned by the asset layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u32);

/// Compiled pipeline (shader variant + fixed-function state) a material renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipelineId(pub u16);

bitflags! {
    /// Per-shader flags that decide how an element is queued.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderFlags: u8 {
        /// Rendered in the transparent queue, back to front.
        const TRANSPARENT = 1 << 0;
        const DOUBLE_SIDED = 1 << 1;
        /// Excluded from shadow passes.
        const NO_SHADOW = 1 << 2;
    }
}

/// One drawable sub-mesh of a renderable.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderableElement {
    pub mesh: MeshId,
    pub sub_mesh: u32,
    pub material: MaterialId,
    pub pipeline: PipelineId,
    pub shader_flags: ShaderFlags,
}

impl RenderableElement {
    #[must_use]
    pub fn new(mesh: MeshId, sub_mesh: u32, material: MaterialId, pipeline: PipelineId) -> Self {
        Self {
            mesh,
            sub_mesh,
            material,
            pipeline,
            shader_flags: ShaderFlags::empty(),
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: ShaderFlags) -> Self {
        self.shader_flags = flags;
        self
    }

    #[inline]
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        self.shader_flags.contains(ShaderFlags::TRANSPARENT)
    }
}

/// Scene renderable component: a mesh instance with one element per sub-mesh.
#[derive(Debug, Clone)]
pub struct Renderable {
    pub elements: Vec<RenderableElement>,
    /// Object-space bounds.
    pub local_bounds: Bounds,
    pub world_transform: Affine3A,
    pub layer: u64,
    /// Scales the view's base cull distance for this object.
    pub cull_distance_factor: f32,
    /// Static renderables are eligible for batching.
    pub is_static: bool,
}

impl Renderable {
    #[must_use]
    pub fn new(elements: Vec<RenderableElement>, local_bounds: Bounds) -> Self {
        Self {
            elements,
            local_bounds,
            world_transform: Affine3A::IDENTITY,
            layer: 1,
            cull_distance_factor: 1.0,
            is_static: false,
        }
    }

    #[must_use]
    pub fn world_bounds(&self) -> Bounds {
        self.local_bounds.transform(&self.world_transform)
    }
}
