use std::any::Any;
use std::rc::Rc;

use crate::renderer::core::Rect2;
use crate::renderer::graph::materials::{FullscreenEffect, MotionBlurParams};
use crate::renderer::graph::node::{
    CompositorNode, CompositorNodeType, FrameContext, NodeDependencies, NodeInputs,
};
use crate::renderer::graph::transient_pool::PooledRenderTexture;
use crate::renderer::view::ViewData;

use super::{SceneColorNode, SkyboxNode, color_target};

/// Camera motion blur reconstructed from scene depth and the previous
/// frame's view-projection.
#[derive(Default)]
pub struct MotionBlurNode {
    output: Option<Rc<PooledRenderTexture>>,
}

impl CompositorNodeType for MotionBlurNode {
    const ID: &'static str = "MotionBlur";

    fn dependencies(_view: &ViewData) -> NodeDependencies {
        NodeDependencies::from_slice(&[SceneColorNode::ID, SkyboxNode::ID])
    }

    fn create() -> Self {
        Self::default()
    }
}

impl CompositorNode for MotionBlurNode {
    fn render(&mut self, ctx: &mut FrameContext<'_>, inputs: &NodeInputs<'_>) {
        let Some(scene_color) = inputs.node::<SceneColorNode>(0) else {
            return;
        };
        let (Some(color), Some(depth)) = (scene_color.color(), scene_color.depth()) else {
            return;
        };

        let settings = ctx.view.settings();
        let desc = color_target(color.desc().format, color.desc().width, color.desc().height);
        let output = ctx.pool.get_texture(ctx.api, &desc);

        if let Some(rt) = output.render_target() {
            let params = ctx.view.params();
            FullscreenEffect::MOTION_BLUR.execute(
                ctx.api,
                rt,
                Rect2::FULL,
                &[color.texture(), depth.texture()],
                &MotionBlurParams {
                    inv_view_proj: params.inv_view_proj,
                    prev_view_proj: params.prev_view_proj,
                    sample_count: settings.motion_blur.quality.sample_count(),
                    shutter_fraction: settings.motion_blur.shutter_fraction,
                    _pad: [0; 2],
                },
            );
        }

        self.output = Some(output);
    }

    fn clear(&mut self) {
        self.output = None;
    }

    fn output(&self) -> Option<&Rc<PooledRenderTexture>> {
        self.output.as_ref()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
