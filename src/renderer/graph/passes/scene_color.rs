use std::any::Any;
use std::rc::Rc;

use super::color_target;
use crate::renderer::core::{TextureDesc, TextureUsage};
use crate::renderer::graph::node::{
    CompositorNode, CompositorNodeType, FrameContext, NodeDependencies, NodeInputs,
};
use crate::renderer::graph::transient_pool::PooledRenderTexture;
use crate::renderer::view::ViewData;

pub const SCENE_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Allocates the view-sized scene color and depth targets every other
/// scene node draws into.
#[derive(Default)]
pub struct SceneColorNode {
    color: Option<Rc<PooledRenderTexture>>,
    depth: Option<Rc<PooledRenderTexture>>,
}

impl SceneColorNode {
    #[must_use]
    pub fn color(&self) -> Option<&Rc<PooledRenderTexture>> {
        self.color.as_ref()
    }

    #[must_use]
    pub fn depth(&self) -> Option<&Rc<PooledRenderTexture>> {
        self.depth.as_ref()
    }
}

impl CompositorNodeType for SceneColorNode {
    const ID: &'static str = "SceneColor";

    fn dependencies(_view: &ViewData) -> NodeDependencies {
        NodeDependencies::new()
    }

    fn create() -> Self {
        Self::default()
    }
}

impl CompositorNode for SceneColorNode {
    fn render(&mut self, ctx: &mut FrameContext<'_>, _inputs: &NodeInputs<'_>) {
        let (width, height) = ctx.view.pixel_size();
        let settings = ctx.view.settings();

        let color_desc =
            color_target(settings.scene_color_format(), width, height).with_samples(settings.msaa_samples);
        let depth_desc = TextureDesc::create_2d(
            SCENE_DEPTH_FORMAT,
            width.max(1),
            height.max(1),
            TextureUsage::DEPTH_STENCIL | TextureUsage::SHADER_READ,
        )
        .with_samples(settings.msaa_samples);

        self.color = Some(ctx.pool.get_texture(ctx.api, &color_desc));
        self.depth = Some(ctx.pool.get_texture(ctx.api, &depth_desc));
    }

    fn clear(&mut self) {
        self.color = None;
        self.depth = None;
    }

    fn output(&self) -> Option<&Rc<PooledRenderTexture>> {
        self.color.as_ref()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
