//! Forward Scene Pass
//!
//! Draws the view's render queues into the scene color target:
//!
//! 1. Clear color, depth and stencil with the camera's clear values.
//! 2. Opaque queue, in the order the view sorted it.
//! 3. Visible decals within their maximum distance.
//! 4. Transparent queue, back to front.
//!
//! Material binds are skipped when consecutive elements share pipeline and
//! material, which is where the opaque queue's state-reduction sort pays off.

use std::any::Any;

use crate::renderer::core::{ClearFlags, Rect2, RenderApi, slots};
use crate::renderer::graph::node::{
    CompositorNode, CompositorNodeType, FrameContext, NodeDependencies, NodeInputs,
};
use crate::renderer::render_queue::RenderQueue;
use crate::renderer::view::ViewData;
use crate::scene::{MaterialId, PipelineId};

use super::SceneColorNode;

/// Vertices of the unit cube a decal is projected from.
const DECAL_BOX_VERTICES: u32 = 36;

#[derive(Default)]
pub struct ForwardPassNode;

impl CompositorNodeType for ForwardPassNode {
    const ID: &'static str = "ForwardPass";

    fn dependencies(_view: &ViewData) -> NodeDependencies {
        NodeDependencies::from_slice(&[SceneColorNode::ID])
    }

    fn create() -> Self {
        Self
    }
}

impl CompositorNode for ForwardPassNode {
    fn render(&mut self, ctx: &mut FrameContext<'_>, inputs: &NodeInputs<'_>) {
        let Some(scene_color) = inputs.node::<SceneColorNode>(0) else {
            log::warn!("ForwardPass: missing SceneColor input");
            return;
        };
        let Some(color_rt) = scene_color.color().and_then(|t| t.render_target()) else {
            return;
        };
        let depth_rt = scene_color.depth().and_then(|t| t.render_target());

        let desc = ctx.view.desc();
        ctx.api.set_render_target(color_rt, depth_rt);
        ctx.api.set_viewport(Rect2::FULL);
        ctx.api.clear_viewport(
            ClearFlags::all(),
            desc.clear_color,
            desc.clear_depth,
            desc.clear_stencil,
        );

        if let Some(buffer) = ctx.scene.per_frame_buffer() {
            ctx.api.bind_buffer(slots::PER_FRAME, buffer);
        }
        if let Some(buffer) = ctx.view.param_buffer() {
            ctx.api.bind_buffer(slots::PER_CAMERA, buffer);
        }
        let lighting = ctx.view.settings().enable_lighting;
        if lighting && let Some(buffer) = ctx.lights.buffer() {
            ctx.api.bind_buffer(slots::LIGHTS, buffer);
        }

        let view = ctx.view;
        let mut state = None;
        draw_queue(ctx, view.opaque_queue(), lighting, &mut state);
        draw_decals(ctx, &mut state);
        draw_queue(ctx, view.transparent_queue(), lighting, &mut state);
    }

    fn clear(&mut self) {}

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn bind_state(
    api: &mut dyn RenderApi,
    state: &mut Option<(PipelineId, MaterialId)>,
    pipeline: PipelineId,
    material: MaterialId,
) {
    if *state != Some((pipeline, material)) {
        api.bind_material(pipeline, material);
        *state = Some((pipeline, material));
    }
}

fn draw_queue(
    ctx: &mut FrameContext<'_>,
    queue: &RenderQueue,
    lighting: bool,
    state: &mut Option<(PipelineId, MaterialId)>,
) {
    for element in queue.elements() {
        let Some(renderable) = ctx.scene.renderable_at(element.renderable) else {
            continue;
        };

        bind_state(ctx.api, state, element.pipeline, element.material);
        if let Some(buffer) = renderable.per_object_buffer() {
            ctx.api.bind_buffer(slots::PER_OBJECT, buffer);
        }
        if lighting {
            ctx.api.set_parameters(
                slots::LIGHT_INDICES,
                bytemuck::cast_slice(ctx.lights.renderable_lights(element.renderable)),
            );
        }
        ctx.api.draw_mesh(element.mesh, element.sub_mesh, 1);
    }
}

fn draw_decals(ctx: &mut FrameContext<'_>, state: &mut Option<(PipelineId, MaterialId)>) {
    let origin = ctx.view.desc().origin;
    for (index, decal) in ctx.scene.decals().iter().enumerate() {
        if !ctx.visibility.decals.get(index).copied().unwrap_or(false) {
            continue;
        }
        let distance = (decal.bounds().sphere.center - origin).length() - decal.bounds().sphere.radius;
        if distance > decal.decal().max_distance {
            continue;
        }

        bind_state(ctx.api, state, decal.decal().pipeline, decal.decal().material);
        let world = glam::Mat4::from(decal.decal().world_transform);
        ctx.api.set_parameters(slots::PER_OBJECT, bytemuck::bytes_of(&world));
        ctx.api.draw(DECAL_BOX_VERTICES, 1);
    }
}
