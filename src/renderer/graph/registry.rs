//! Node-type registry
//!
//! Maps node ids to their [`NodeType`]. The renderer creates one at start-up
//! with the built-in kinds and hands it by reference to every compositor
//! build; tests create isolated registries of their own.

use rustc_hash::FxHashMap;

use super::compositor::CompositorError;
use super::node::{CompositorNodeType, NodeType};
use super::passes::{
    BloomNode, FinalResolveNode, ForwardPassNode, FxaaNode, MotionBlurNode, SceneColorNode,
    SkyboxNode, TonemappingNode,
};

#[derive(Debug, Default)]
pub struct NodeRegistry {
    types: FxHashMap<&'static str, NodeType>,
}

impl NodeRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the forward renderer's node kinds.
    #[must_use]
    pub fn with_builtin_nodes() -> Self {
        let mut registry = Self::new();
        for ty in [
            NodeType::of::<SceneColorNode>(),
            NodeType::of::<ForwardPassNode>(),
            NodeType::of::<SkyboxNode>(),
            NodeType::of::<BloomNode>(),
            NodeType::of::<MotionBlurNode>(),
            NodeType::of::<TonemappingNode>(),
            NodeType::of::<FxaaNode>(),
            NodeType::of::<FinalResolveNode>(),
        ] {
            let id = ty.id();
            let registered = registry.register_type(ty);
            debug_assert!(registered.is_ok(), "built-in node id \"{id}\" registered twice");
        }
        registry
    }

    /// Registers a static node kind.
    pub fn register<T: CompositorNodeType>(&mut self) -> Result<(), CompositorError> {
        self.register_type(NodeType::of::<T>())
    }

    /// Registers an erased node kind.
    ///
    /// A second registration under the same id is a programming error: it is
    /// logged and skipped, leaving the first registration in place.
    pub fn register_type(&mut self, ty: NodeType) -> Result<(), CompositorError> {
        let id = ty.id();
        if self.types.contains_key(id) {
            log::error!("Compositor node type \"{id}\" is already registered");
            return Err(CompositorError::DuplicateNodeType { id: id.to_owned() });
        }
        self.types.insert(id, ty);
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&NodeType> {
        self.types.get(id)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.types.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.types.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::SmallVec;

    use crate::renderer::graph::node::{CompositorNode, FrameContext, NodeInputs};

    struct Empty;

    impl CompositorNode for Empty {
        fn render(&mut self, _ctx: &mut FrameContext<'_>, _inputs: &NodeInputs<'_>) {}
        fn clear(&mut self) {}
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    fn empty_type(id: &'static str) -> NodeType {
        NodeType::new(id, |_| SmallVec::new(), || Box::new(Empty))
    }

    #[test]
    fn duplicate_registration_keeps_first() {
        let mut registry = NodeRegistry::new();
        assert!(registry.register_type(empty_type("A")).is_ok());
        let err = registry.register_type(empty_type("A")).unwrap_err();
        assert!(matches!(err, CompositorError::DuplicateNodeType { ref id } if id == "A"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn builtin_nodes_are_registered() {
        let registry = NodeRegistry::with_builtin_nodes();
        for id in [
            "SceneColor",
            "ForwardPass",
            "Skybox",
            "Bloom",
            "MotionBlur",
            "Tonemapping",
            "Fxaa",
            "FinalResolve",
        ] {
            assert!(registry.contains(id), "missing built-in node {id}");
        }
    }
}
