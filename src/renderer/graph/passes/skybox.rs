use std::any::Any;

use crate::renderer::core::Rect2;
use crate::renderer::graph::materials::{FullscreenEffect, SkyboxParams};
use crate::renderer::graph::node::{
    CompositorNode, CompositorNodeType, FrameContext, NodeDependencies, NodeInputs,
};
use crate::renderer::view::ViewData;

use super::{ForwardPassNode, SceneColorNode};

/// Draws the scene skybox behind already rendered geometry. A no-op when
/// the scene has no skybox or the view disables it.
#[derive(Default)]
pub struct SkyboxNode;

impl CompositorNodeType for SkyboxNode {
    const ID: &'static str = "Skybox";

    fn dependencies(_view: &ViewData) -> NodeDependencies {
        NodeDependencies::from_slice(&[SceneColorNode::ID, ForwardPassNode::ID])
    }

    fn create() -> Self {
        Self
    }
}

impl CompositorNode for SkyboxNode {
    fn render(&mut self, ctx: &mut FrameContext<'_>, inputs: &NodeInputs<'_>) {
        if !ctx.view.settings().enable_skybox {
            return;
        }
        let Some(skybox) = ctx.scene.skybox() else {
            return;
        };
        let Some(scene_color) = inputs.node::<SceneColorNode>(0) else {
            return;
        };
        let Some(color_rt) = scene_color.color().and_then(|t| t.render_target()) else {
            return;
        };
        let depth_rt = scene_color.depth().and_then(|t| t.render_target());

        FullscreenEffect::SKYBOX.execute_with_depth(
            ctx.api,
            color_rt,
            depth_rt,
            Rect2::FULL,
            &[skybox.texture],
            &SkyboxParams {
                brightness: skybox.brightness,
                ..SkyboxParams::default()
            },
        );
    }

    fn clear(&mut self) {}

    fn as_any(&self) -> &dyn Any {
        self
    }
}
