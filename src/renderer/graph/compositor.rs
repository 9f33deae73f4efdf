//! Render Compositor
//!
//! Resolves the node graph that produces a view's final output, then replays
//! it every frame.
//!
//! # Build
//!
//! Starting at the requested final node, dependencies are registered depth
//! first with an explicit stack and three-colour marking:
//!
//! ```text
//!   unvisited ──push──▶ in progress ──all deps done──▶ done(index)
//!                          ▲    │
//!                          └────┘ dep still in progress ⇒ cycle
//! ```
//!
//! A node is appended to the ordered list once all its dependencies are
//! done, so list order is a topological order. Every dependency's
//! `last_use` is raised to the index of the newest node consuming it.
//!
//! # Execute
//!
//! Nodes render in list order. After each node renders, every active node
//! whose `last_use` is at or before the current index is cleared, returning
//! its pooled resources for reuse later in the same frame. The last node
//! is always cleared at the end.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use thiserror::Error;

use super::node::{CompositorNode, FrameContext, NodeDependencies, NodeInputs, NodeType};
use super::registry::NodeRegistry;
use crate::renderer::view::ViewData;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompositorError {
    #[error("Unknown compositor node type \"{id}\"")]
    UnknownNodeType { id: String },

    #[error("Cyclic dependency detected at compositor node \"{id}\"")]
    CyclicDependency { id: String },

    #[error("Compositor node type \"{id}\" is already registered")]
    DuplicateNodeType { id: String },

    #[error("Compositor has not been built")]
    NotBuilt,
}

struct NodeInfo {
    id: &'static str,
    node: Box<dyn CompositorNode>,
    /// Indices of resolved dependencies, in declaration order.
    inputs: SmallVec<[usize; 4]>,
    /// Index of the last node consuming this one. `None` for the final node.
    last_use: Option<usize>,
}

#[derive(Clone, Copy)]
enum Mark {
    InProgress,
    Done(usize),
}

struct PendingNode<'r> {
    ty: &'r NodeType,
    dependencies: NodeDependencies,
    next: usize,
}

/// Frame graph of one view.
#[derive(Default)]
pub struct RenderCompositor {
    nodes: Vec<NodeInfo>,
    is_valid: bool,
}

impl RenderCompositor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the graph ending in `final_node` for `view`.
    ///
    /// On failure the graph is discarded, the compositor becomes invalid,
    /// and [`execute`](Self::execute) is a no-op until a later build succeeds.
    pub fn build(
        &mut self,
        view: &ViewData,
        registry: &NodeRegistry,
        final_node: &str,
    ) -> Result<(), CompositorError> {
        self.clear();

        match Self::resolve(view, registry, final_node) {
            Ok(nodes) => {
                log::debug!(
                    "Compositor built: {}",
                    nodes.iter().map(|n| n.id).collect::<Vec<_>>().join(" → ")
                );
                self.nodes = nodes;
                self.is_valid = true;
                Ok(())
            }
            Err(err) => {
                log::error!("Failed to build compositor for \"{final_node}\": {err}");
                Err(err)
            }
        }
    }

    fn resolve(
        view: &ViewData,
        registry: &NodeRegistry,
        final_node: &str,
    ) -> Result<Vec<NodeInfo>, CompositorError> {
        let mut nodes: Vec<NodeInfo> = Vec::new();
        let mut marks: FxHashMap<&'static str, Mark> = FxHashMap::default();
        let mut stack: Vec<PendingNode<'_>> = Vec::new();

        let root = registry
            .get(final_node)
            .ok_or_else(|| CompositorError::UnknownNodeType {
                id: final_node.to_owned(),
            })?;
        marks.insert(root.id(), Mark::InProgress);
        stack.push(PendingNode {
            ty: root,
            dependencies: root.dependencies(view),
            next: 0,
        });

        while let Some(top) = stack.last_mut() {
            if let Some(&dep) = top.dependencies.get(top.next) {
                top.next += 1;
                match marks.get(dep) {
                    Some(Mark::Done(_)) => {}
                    Some(Mark::InProgress) => {
                        return Err(CompositorError::CyclicDependency { id: dep.to_owned() });
                    }
                    None => {
                        let ty = registry
                            .get(dep)
                            .ok_or_else(|| CompositorError::UnknownNodeType { id: dep.to_owned() })?;
                        marks.insert(ty.id(), Mark::InProgress);
                        stack.push(PendingNode {
                            ty,
                            dependencies: ty.dependencies(view),
                            next: 0,
                        });
                    }
                }
                continue;
            }

            let Some(done) = stack.pop() else { break };
            let index = nodes.len();
            let inputs: SmallVec<[usize; 4]> = done
                .dependencies
                .iter()
                .filter_map(|dep| match marks.get(dep) {
                    Some(Mark::Done(i)) => Some(*i),
                    _ => None,
                })
                .collect();

            for &input in &inputs {
                let last_use = &mut nodes[input].last_use;
                *last_use = Some(last_use.map_or(index, |l| l.max(index)));
            }

            nodes.push(NodeInfo {
                id: done.ty.id(),
                node: done.ty.create(),
                inputs,
                last_use: None,
            });
            marks.insert(done.ty.id(), Mark::Done(index));
        }

        Ok(nodes)
    }

    /// Renders every node in order. No-op when the graph is invalid.
    pub fn execute(&mut self, ctx: &mut FrameContext<'_>) {
        if !self.is_valid {
            return;
        }

        let mut active: SmallVec<[usize; 8]> = SmallVec::new();
        for i in 0..self.nodes.len() {
            {
                let (before, rest) = self.nodes.split_at_mut(i);
                let current = &mut rest[0];
                let inputs = NodeInputs::new(
                    current
                        .inputs
                        .iter()
                        .map(|&j| before[j].node.as_ref())
                        .collect(),
                );
                current.node.render(ctx, &inputs);
            }

            active.push(i);
            let nodes = &mut self.nodes;
            active.retain(|j| match nodes[*j].last_use {
                Some(last) if last <= i => {
                    nodes[*j].node.clear();
                    false
                }
                _ => true,
            });
        }

        if let Some(last) = self.nodes.last_mut() {
            last.node.clear();
        }
    }

    /// Destroys all node instances and marks the graph invalid.
    pub fn clear(&mut self) {
        for info in &mut self.nodes {
            info.node.clear();
        }
        self.nodes.clear();
        self.is_valid = false;
    }

    // ── Introspection ──────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Node ids in execution order.
    #[must_use]
    pub fn node_ids(&self) -> Vec<&'static str> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    /// Index of the last consumer of `id`. `None` if `id` is unknown or is
    /// the final node.
    #[must_use]
    pub fn last_use(&self, id: &str) -> Option<usize> {
        self.nodes.iter().find(|n| n.id == id).and_then(|n| n.last_use)
    }

    /// Ids of the resolved inputs of `id`.
    #[must_use]
    pub fn inputs_of(&self, id: &str) -> Option<Vec<&'static str>> {
        let info = self.nodes.iter().find(|n| n.id == id)?;
        Some(info.inputs.iter().map(|&i| self.nodes[i].id).collect())
    }

    /// Downcasts the live instance of `id`.
    #[must_use]
    pub fn node<T: CompositorNode>(&self, id: &str) -> Option<&T> {
        self.nodes
            .iter()
            .find(|n| n.id == id)
            .and_then(|n| n.node.as_any().downcast_ref::<T>())
    }

    /// Fails with [`CompositorError::NotBuilt`] unless the last build succeeded.
    pub fn ensure_valid(&self) -> Result<(), CompositorError> {
        if self.is_valid { Ok(()) } else { Err(CompositorError::NotBuilt) }
    }
}

impl Drop for RenderCompositor {
    fn drop(&mut self) {
        self.clear();
    }
}
