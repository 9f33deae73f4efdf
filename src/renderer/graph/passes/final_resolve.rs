//! Final Resolve
//!
//! Copies the selected intermediate into the view's own render target and
//! viewport. The output channel decides which node it depends on:
//!
//! | Channel      | Source                                   |
//! |--------------|------------------------------------------|
//! | `Final`      | Fxaa, or Tonemapping when FXAA is off    |
//! | `SceneColor` | SceneColor color                         |
//! | `SceneDepth` | SceneColor depth                         |
//! | `Bloom`      | Bloom, or `Final` when bloom is disabled |

use std::any::Any;

use crate::renderer::core::{ClearFlags, RenderApi};
use crate::renderer::graph::materials::{BlitParams, FullscreenEffect};
use crate::renderer::graph::node::{
    CompositorNode, CompositorNodeType, FrameContext, NodeDependencies, NodeInputs,
};
use crate::renderer::settings::{OutputChannel, RenderSettings};
use crate::renderer::view::ViewData;

use super::{BloomNode, FxaaNode, SceneColorNode, TonemappingNode};

#[derive(Default)]
pub struct FinalResolveNode;

impl FinalResolveNode {
    fn final_source(settings: &RenderSettings) -> &'static str {
        if settings.enable_fxaa {
            FxaaNode::ID
        } else {
            TonemappingNode::ID
        }
    }
}

impl CompositorNodeType for FinalResolveNode {
    const ID: &'static str = "FinalResolve";

    fn dependencies(view: &ViewData) -> NodeDependencies {
        let settings = view.settings();
        let source = match settings.output_channel {
            OutputChannel::Final => Self::final_source(settings),
            OutputChannel::SceneColor | OutputChannel::SceneDepth => SceneColorNode::ID,
            OutputChannel::Bloom if settings.bloom_active() => BloomNode::ID,
            OutputChannel::Bloom => Self::final_source(settings),
        };
        NodeDependencies::from_slice(&[source])
    }

    fn create() -> Self {
        Self
    }
}

impl CompositorNode for FinalResolveNode {
    fn render(&mut self, ctx: &mut FrameContext<'_>, inputs: &NodeInputs<'_>) {
        let Some(input) = inputs.get(0) else {
            return;
        };

        let (source, effect) = match ctx.view.settings().output_channel {
            OutputChannel::SceneDepth => (
                inputs.node::<SceneColorNode>(0).and_then(SceneColorNode::depth),
                FullscreenEffect::BLIT_DEPTH,
            ),
            _ => (input.output(), FullscreenEffect::BLIT),
        };
        let Some(source) = source else {
            log::warn!("FinalResolve: selected input produced no texture");
            return;
        };

        let desc = ctx.view.desc();
        let api: &mut dyn RenderApi = ctx.api;
        if !desc.clear_flags.is_empty() {
            api.set_render_target(desc.target, None);
            api.set_viewport(desc.viewport);
            api.clear_viewport(
                desc.clear_flags & !ClearFlags::DEPTH,
                desc.clear_color,
                desc.clear_depth,
                desc.clear_stencil,
            );
        }

        effect.execute(
            api,
            desc.target,
            desc.viewport,
            &[source.texture()],
            &BlitParams {
                sample_count: source.desc().num_samples,
                ..BlitParams::default()
            },
        );
    }

    fn clear(&mut self) {}

    fn as_any(&self) -> &dyn Any {
        self
    }
}
