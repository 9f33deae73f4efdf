//! Compositor Nodes
//!
//! A node is one unit of per-frame rendering work with declared
//! dependencies. The compositor owns node instances; a node only sees its
//! dependencies through [`NodeInputs`] while it renders.
//!
//! Two traits split the concerns:
//! - [`CompositorNode`]: the per-instance capability set (`render`, `clear`,
//!   `output`), used as a trait object.
//! - [`CompositorNodeType`]: static metadata of a node kind (id,
//!   dependency function, factory), erased into a [`NodeType`] when the kind
//!   is registered.

use std::any::Any;
use std::rc::Rc;

use smallvec::SmallVec;

use super::transient_pool::{GpuResourcePool, PooledRenderTexture};
use crate::renderer::core::RenderApi;
use crate::renderer::light_data::VisibleLightData;
use crate::renderer::scene::SceneInfo;
use crate::renderer::view::ViewData;
use crate::renderer::visibility::VisibilityInfo;

/// Dependency list returned by a node kind for a particular view.
pub type NodeDependencies = SmallVec<[&'static str; 4]>;

/// Timing of the frame being rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInfo {
    /// Seconds since the renderer started.
    pub time: f32,
    pub delta_time: f32,
    pub frame_index: u64,
}

/// Everything a node may touch while rendering one view.
pub struct FrameContext<'a> {
    pub view: &'a ViewData,
    pub scene: &'a SceneInfo,
    pub visibility: &'a VisibilityInfo,
    pub lights: &'a VisibleLightData,
    pub pool: &'a mut GpuResourcePool,
    pub api: &'a mut dyn RenderApi,
    pub frame: FrameInfo,
}

/// Resolved dependency nodes, in the order the node kind declared them.
pub struct NodeInputs<'a> {
    nodes: SmallVec<[&'a dyn CompositorNode; 4]>,
}

impl<'a> NodeInputs<'a> {
    #[must_use]
    pub fn new(nodes: SmallVec<[&'a dyn CompositorNode; 4]>) -> Self {
        Self { nodes }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&'a dyn CompositorNode> {
        self.nodes.get(index).copied()
    }

    /// The input at `index`, downcast to its concrete kind.
    #[must_use]
    pub fn node<T: CompositorNode>(&self, index: usize) -> Option<&'a T> {
        self.get(index).and_then(|n| n.as_any().downcast_ref::<T>())
    }

    /// The first input of kind `T`, wherever it was declared.
    #[must_use]
    pub fn find<T: CompositorNode>(&self) -> Option<&'a T> {
        self.nodes.iter().copied().find_map(|n| n.as_any().downcast_ref::<T>())
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a dyn CompositorNode> + '_ {
        self.nodes.iter().copied()
    }
}

/// Per-instance node behaviour.
pub trait CompositorNode: Any {
    /// Issues this node's GPU work. Called once per frame, after all inputs
    /// have rendered.
    fn render(&mut self, ctx: &mut FrameContext<'_>, inputs: &NodeInputs<'_>);

    /// Releases transient resources. Called once no later node needs this
    /// node's output, and at teardown.
    fn clear(&mut self);

    /// The texture downstream nodes read by default.
    fn output(&self) -> Option<&Rc<PooledRenderTexture>> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// Static description of a node kind.
pub trait CompositorNodeType: CompositorNode + Sized {
    /// Unique identifier used in dependency lists.
    const ID: &'static str;

    /// Ids of the nodes this kind reads from, given the view's settings.
    fn dependencies(view: &ViewData) -> NodeDependencies;

    fn create() -> Self;
}

type DependencyFn = dyn Fn(&ViewData) -> NodeDependencies;
type CreateFn = dyn Fn() -> Box<dyn CompositorNode>;

/// Type-erased node kind stored in the [`NodeRegistry`](super::NodeRegistry).
pub struct NodeType {
    id: &'static str,
    dependencies: Box<DependencyFn>,
    create: Box<CreateFn>,
}

impl NodeType {
    pub fn new(
        id: &'static str,
        dependencies: impl Fn(&ViewData) -> NodeDependencies + 'static,
        create: impl Fn() -> Box<dyn CompositorNode> + 'static,
    ) -> Self {
        Self {
            id,
            dependencies: Box::new(dependencies),
            create: Box::new(create),
        }
    }

    #[must_use]
    pub fn of<T: CompositorNodeType>() -> Self {
        Self::new(T::ID, T::dependencies, || Box::new(T::create()))
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> &'static str {
        self.id
    }

    #[must_use]
    pub fn dependencies(&self, view: &ViewData) -> NodeDependencies {
        (self.dependencies)(view)
    }

    #[must_use]
    pub fn create(&self) -> Box<dyn CompositorNode> {
        (self.create)()
    }
}

impl std::fmt::Debug for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeType").field("id", &self.id).finish_non_exhaustive()
    }
}
