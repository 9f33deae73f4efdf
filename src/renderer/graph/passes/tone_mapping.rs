//! Tone Mapping
//!
//! Maps HDR scene color (motion blurred when that node is active) into the
//! LDR intermediate, compositing bloom when present. With tone mapping
//! disabled the source is copied through unchanged.

use std::any::Any;
use std::rc::Rc;

use crate::renderer::core::{Rect2, TextureHandle};
use crate::renderer::graph::materials::{BlitParams, FullscreenEffect, TonemappingParams};
use crate::renderer::graph::node::{
    CompositorNode, CompositorNodeType, FrameContext, NodeDependencies, NodeInputs,
};
use crate::renderer::graph::transient_pool::PooledRenderTexture;
use crate::renderer::view::ViewData;

use super::{BloomNode, LDR_FORMAT, MotionBlurNode, SceneColorNode, SkyboxNode, color_target};

#[derive(Default)]
pub struct TonemappingNode {
    output: Option<Rc<PooledRenderTexture>>,
}

impl CompositorNodeType for TonemappingNode {
    const ID: &'static str = "Tonemapping";

    fn dependencies(view: &ViewData) -> NodeDependencies {
        let settings = view.settings();
        let mut deps = NodeDependencies::from_slice(&[SceneColorNode::ID, SkyboxNode::ID]);
        if settings.motion_blur_active() {
            deps.push(MotionBlurNode::ID);
        }
        if settings.bloom_active() {
            deps.push(BloomNode::ID);
        }
        deps
    }

    fn create() -> Self {
        Self::default()
    }
}

impl CompositorNode for TonemappingNode {
    fn render(&mut self, ctx: &mut FrameContext<'_>, inputs: &NodeInputs<'_>) {
        let source = inputs
            .find::<MotionBlurNode>()
            .and_then(|n| n.output())
            .or_else(|| inputs.find::<SceneColorNode>().and_then(SceneColorNode::color));
        let Some(source) = source else {
            log::warn!("Tonemapping: no scene color to read from");
            return;
        };
        let bloom = inputs.find::<BloomNode>().and_then(|n| n.output());

        let (width, height) = (source.desc().width, source.desc().height);
        let output = ctx.pool.get_texture(ctx.api, &color_target(LDR_FORMAT, width, height));
        let Some(rt) = output.render_target() else {
            return;
        };

        let settings = ctx.view.settings();
        if settings.tonemapping.enabled {
            let mut textures: smallvec::SmallVec<[TextureHandle; 2]> = smallvec::smallvec![source.texture()];
            if let Some(bloom) = bloom {
                textures.push(bloom.texture());
            }
            FullscreenEffect::TONEMAPPING.execute(
                ctx.api,
                rt,
                Rect2::FULL,
                &textures,
                &TonemappingParams {
                    exposure_scale: settings.tonemapping.exposure_scale.exp2(),
                    gamma: settings.tonemapping.gamma,
                    bloom_intensity: settings.bloom.intensity,
                    has_bloom: u32::from(bloom.is_some()),
                },
            );
        } else {
            FullscreenEffect::BLIT.execute(
                ctx.api,
                rt,
                Rect2::FULL,
                &[source.texture()],
                &BlitParams {
                    sample_count: source.desc().num_samples,
                    ..BlitParams::default()
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
