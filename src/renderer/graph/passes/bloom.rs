//! Bloom
//!
//! Progressive down/up-sample chain over the scene color:
//!
//! ```text
//! scene ─down─▶ ½ ─down─▶ ¼ ─down─▶ ⅛
//!               ▲         │         │
//!               └───up────┴───up────┘
//! ```
//!
//! Level 0 (half resolution) is the node output read by tonemapping. The
//! smaller levels go back to the pool as soon as the chain is resolved.

use std::any::Any;
use std::rc::Rc;

use glam::Vec2;

use crate::renderer::core::Rect2;
use crate::renderer::graph::materials::{BloomParams, FullscreenEffect};
use crate::renderer::graph::node::{
    CompositorNode, CompositorNodeType, FrameContext, NodeDependencies, NodeInputs,
};
use crate::renderer::graph::transient_pool::PooledRenderTexture;
use crate::renderer::view::ViewData;

use super::{SceneColorNode, SkyboxNode, color_target};

const BLOOM_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
const MAX_STEPS: u32 = 8;

#[derive(Default)]
pub struct BloomNode {
    output: Option<Rc<PooledRenderTexture>>,
}

impl CompositorNodeType for BloomNode {
    const ID: &'static str = "Bloom";

    fn dependencies(_view: &ViewData) -> NodeDependencies {
        NodeDependencies::from_slice(&[SceneColorNode::ID, SkyboxNode::ID])
    }

    fn create() -> Self {
        Self::default()
    }
}

impl CompositorNode for BloomNode {
    fn render(&mut self, ctx: &mut FrameContext<'_>, inputs: &NodeInputs<'_>) {
        let Some(source) = inputs.node::<SceneColorNode>(0).and_then(SceneColorNode::color) else {
            return;
        };
        let bloom = &ctx.view.settings().bloom;
        let steps = bloom.quality.clamp(1, MAX_STEPS);
        let (width, height) = (source.desc().width, source.desc().height);

        let mut chain: Vec<Rc<PooledRenderTexture>> = Vec::with_capacity(steps as usize);
        for level in 1..=steps {
            let desc = color_target(BLOOM_FORMAT, width >> level, height >> level);
            chain.push(ctx.pool.get_texture(ctx.api, &desc));
        }

        let mut src = Rc::clone(source);
        for dst in &chain {
            if let Some(rt) = dst.render_target() {
                FullscreenEffect::BLOOM_DOWNSAMPLE.execute(
                    ctx.api,
                    rt,
                    Rect2::FULL,
                    &[src.texture()],
                    &bloom_params(&src, bloom.threshold, bloom.intensity),
                );
            }
            src = Rc::clone(dst);
        }

        for pair in chain.windows(2).rev() {
            let (dst, src) = (&pair[0], &pair[1]);
            if let Some(rt) = dst.render_target() {
                FullscreenEffect::BLOOM_UPSAMPLE.execute(
                    ctx.api,
                    rt,
                    Rect2::FULL,
                    &[src.texture()],
                    &bloom_params(src, bloom.threshold, bloom.intensity),
                );
            }
        }

        self.output = chain.into_iter().next();
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

fn bloom_params(source: &PooledRenderTexture, threshold: f32, intensity: f32) -> BloomParams {
    let desc = source.desc();
    BloomParams {
        texel_size: Vec2::new(1.0 / desc.width.max(1) as f32, 1.0 / desc.height.max(1) as f32),
        threshold,
        intensity,
    }
}
