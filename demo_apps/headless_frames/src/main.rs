//! Headless Frames
//!
//! Builds a small procedural scene, renders it for a number of frames on the
//! recording device and logs what each frame submitted.
//!
//! ```text
//! headless_frames [FRAMES] [SETTINGS.json]
//! ```

use std::path::Path;

use anyhow::Context;
use glam::{Affine3A, Quat, Vec3, Vec4};
use sable::renderer::core::{ApiCommand, NullRenderApi};
use sable::renderer::ElementConcatBatcher;
use sable::scene::{
    BoundingBox, Bounds, Camera, Decal, Light, MaterialId, MeshId, PipelineId, Renderable,
    RenderableElement, Scene, ShaderFlags,
};
use sable::{RenderSettings, Renderer, RendererSettings};

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;
const GRID: i32 = 12;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let frames: u32 = match args.next() {
        Some(arg) => arg.parse().with_context(|| format!("invalid frame count '{arg}'"))?,
        None => 8,
    };
    let settings = match args.next() {
        Some(path) => load_settings(Path::new(&path))?,
        None => RenderSettings::default(),
    };

    let mut api = NullRenderApi::new();
    let target = api.create_window_target(WIDTH, HEIGHT);
    let mut renderer = Renderer::new(
        api,
        RendererSettings {
            clear_color: Vec4::new(0.05, 0.05, 0.08, 1.0),
            ..RendererSettings::default()
        },
    );
    let mut scene = Scene::new();

    // Camera
    let mut camera = Camera::new_perspective(55.0, WIDTH as f32 / HEIGHT as f32, 0.1, 200.0, target);
    camera.world_transform = Affine3A::from_rotation_translation(
        Quat::from_rotation_x(-0.35),
        Vec3::new(0.0, 8.0, 18.0),
    );
    let camera_key = scene.add_camera(camera.clone());
    renderer.notify_camera_added(camera_key, &camera);
    renderer.set_render_settings(camera_key, settings)?;

    // Lights
    for light in [
        Light::new_directional(Vec3::new(1.0, 0.95, 0.9), 3.0, Vec3::new(-0.3, -1.0, -0.2)),
        Light::new_radial(Vec3::new(1.0, 0.4, 0.2), 40.0, Vec3::new(-4.0, 2.0, 0.0), 8.0),
        Light::new_spot(Vec3::ONE, 80.0, Vec3::new(4.0, 6.0, -4.0), Vec3::NEG_Y, 12.0, 0.3, 0.5),
    ] {
        let key = scene.add_light(light.clone());
        renderer.notify_light_added(key, &light);
    }

    // Static floor tiles and a few dynamic, partly transparent objects
    let tile_bounds = Bounds::from_box(BoundingBox::new(Vec3::new(-1.0, -0.1, -1.0), Vec3::new(1.0, 0.0, 1.0)));
    for x in -GRID / 2..GRID / 2 {
        for z in -GRID / 2..GRID / 2 {
            let mut tile = Renderable::new(
                vec![RenderableElement::new(MeshId(0), 0, MaterialId(1), PipelineId(1))],
                tile_bounds,
            );
            tile.local_bounds = tile_bounds.transform(&Affine3A::from_translation(Vec3::new(
                x as f32 * 2.0,
                0.0,
                z as f32 * 2.0,
            )));
            tile.is_static = true;
            let key = scene.add_renderable(tile.clone());
            renderer.notify_renderable_added(key, &tile);
        }
    }

    let mut dynamic = Vec::new();
    for i in 0..6_u32 {
        let mut element = RenderableElement::new(MeshId(1), 0, MaterialId(10 + i % 3), PipelineId(2));
        if i % 2 == 1 {
            element = element.with_flags(ShaderFlags::TRANSPARENT);
        }
        let renderable = Renderable::new(
            vec![element],
            Bounds::from_box(BoundingBox::new(Vec3::splat(-0.5), Vec3::splat(0.5))),
        );
        let key = scene.add_renderable(renderable.clone());
        renderer.notify_renderable_added(key, &renderable);
        dynamic.push(key);
    }

    let decal = Decal::new(MaterialId(50), PipelineId(3), glam::Vec2::splat(2.0), 40.0);
    let decal_key = scene.add_decal(decal.clone());
    renderer.notify_decal_added(decal_key, &decal);

    let batches = renderer.batch_renderables(&mut ElementConcatBatcher);
    log::info!("Merged static geometry into {batches} batches");

    let delta = 1.0 / 60.0;
    for frame in 0..frames {
        let time = frame as f32 * delta;

        for (i, key) in dynamic.iter().enumerate() {
            let angle = time + i as f32 * std::f32::consts::TAU / dynamic.len() as f32;
            if let Some(renderable) = scene.renderable_mut(*key) {
                renderable.world_transform =
                    Affine3A::from_translation(Vec3::new(angle.cos() * 5.0, 1.0, angle.sin() * 5.0));
                let renderable = renderable.clone();
                renderer.notify_renderable_updated(*key, &renderable);
            }
        }

        renderer.render_all(time, delta);
        report(frame, &renderer.api_mut().take_commands());
    }

    log::info!(
        "Pool holds {} textures and {} buffers after {frames} frames",
        renderer.pool().texture_count(),
        renderer.pool().buffer_count()
    );
    renderer.destroy();
    Ok(())
}

fn load_settings(path: &Path) -> anyhow::Result<RenderSettings> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read settings from {}", path.display()))?;
    let settings = RenderSettings::from_json(&json)
        .with_context(|| format!("invalid render settings in {}", path.display()))?;
    Ok(settings)
}

fn report(frame: u32, commands: &[ApiCommand]) {
    let mut draws = 0;
    let mut material_binds = 0;
    let mut effects = Vec::new();
    for command in commands {
        match command {
            ApiCommand::Draw { .. } | ApiCommand::DrawMesh { .. } => draws += 1,
            ApiCommand::BindMaterial { .. } => material_binds += 1,
            ApiCommand::BindEffect(name) => effects.push(name.as_str()),
            _ => {}
        }
    }
    log::info!(
        "frame {frame}: {} commands, {draws} draws, {material_binds} material binds, effects [{}]",
        commands.len(),
        effects.join(", ")
    );
}
