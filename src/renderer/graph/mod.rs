//! Frame graph
//!
//! - [`RenderCompositor`]: resolves and executes a view's node graph
//! - [`NodeRegistry`] / [`NodeType`]: node kinds available to builds
//! - [`CompositorNode`]: per-instance node behaviour
//! - [`GpuResourcePool`]: transient textures and buffers shared by nodes
//! - [`passes`]: the built-in forward renderer nodes
//! - [`materials`]: full-screen effects the nodes draw with

pub mod compositor;
pub mod materials;
pub mod node;
pub mod passes;
pub mod registry;
pub mod transient_pool;

pub use compositor::{CompositorError, RenderCompositor};
pub use node::{
    CompositorNode, CompositorNodeType, FrameContext, FrameInfo, NodeDependencies, NodeInputs,
    NodeType,
};
pub use registry::NodeRegistry;
pub use transient_pool::{GpuResourcePool, PooledRenderTexture, PooledStorageBuffer};
