use std::any::Any;
use std::rc::Rc;

use crate::renderer::core::Rect2;
use crate::renderer::graph::materials::{FullscreenEffect, FxaaParams};
use crate::renderer::graph::node::{
    CompositorNode, CompositorNodeType, FrameContext, NodeDependencies, NodeInputs,
};
use crate::renderer::graph::transient_pool::PooledRenderTexture;
use crate::renderer::view::ViewData;

use super::{LDR_FORMAT, TonemappingNode, color_target};

/// Fast approximate anti-aliasing over the tonemapped image.
#[derive(Default)]
pub struct FxaaNode {
    output: Option<Rc<PooledRenderTexture>>,
}

impl CompositorNodeType for FxaaNode {
    const ID: &'static str = "Fxaa";

    fn dependencies(_view: &ViewData) -> NodeDependencies {
        NodeDependencies::from_slice(&[TonemappingNode::ID])
    }

    fn create() -> Self {
        Self::default()
    }
}

impl CompositorNode for FxaaNode {
    fn render(&mut self, ctx: &mut FrameContext<'_>, inputs: &NodeInputs<'_>) {
        let Some(source) = inputs.get(0).and_then(|n| n.output()) else {
            return;
        };
        let (width, height) = (source.desc().width, source.desc().height);
        let output = ctx.pool.get_texture(ctx.api, &color_target(LDR_FORMAT, width, height));

        if let Some(rt) = output.render_target() {
            FullscreenEffect::FXAA.execute(
                ctx.api,
                rt,
                Rect2::FULL,
                &[source.texture()],
                &FxaaParams::new(width, height),
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
