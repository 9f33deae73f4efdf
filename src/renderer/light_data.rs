//! Visible Light Data
//!
//! Collects the lights visible from a view group into a GPU `LightData`
//! array ordered directional, then radial, then spot, and computes the
//! list of lights influencing every visible renderable.

use std::rc::Rc;

use glam::Vec4;
use smallvec::SmallVec;

use crate::renderer::core::{BufferDesc, BufferHandle, BufferUsage, LightData, RenderApi};
use crate::renderer::graph::transient_pool::{GpuResourcePool, PooledStorageBuffer};
use crate::renderer::scene::SceneInfo;
use crate::renderer::visibility::VisibilityInfo;
use crate::scene::{Bounds, BoundingSphere, Light, LightKind, LightType};

/// Indices into the visible light array.
pub type LightIndices = SmallVec<[u32; 8]>;

const MIN_BUFFER_CAPACITY: u32 = 16;

#[derive(Default)]
pub struct VisibleLightData {
    lights: Vec<LightData>,
    /// Influence spheres, parallel to `lights`.
    spheres: Vec<BoundingSphere>,
    num_directional: usize,
    num_radial: usize,
    num_spot: usize,
    /// Per-renderable lists, indexed like the scene's renderables. Empty for
    /// renderables not visible this frame.
    renderable_lights: Vec<LightIndices>,
    buffer: Option<Rc<PooledStorageBuffer>>,
}

impl VisibleLightData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the visible light array. Directional lights are always
    /// included; radial and spot lights only when marked visible.
    pub fn update(&mut self, scene: &SceneInfo, visibility: &VisibilityInfo) {
        self.lights.clear();
        self.spheres.clear();

        for light in scene.directional_lights() {
            self.push(light);
        }
        self.num_directional = self.lights.len();

        for (light, _) in scene
            .radial_lights()
            .iter()
            .zip(&visibility.radial_lights)
            .filter(|(_, visible)| **visible)
        {
            self.push(light);
        }
        self.num_radial = self.lights.len() - self.num_directional;

        for (light, _) in scene
            .spot_lights()
            .iter()
            .zip(&visibility.spot_lights)
            .filter(|(_, visible)| **visible)
        {
            self.push(light);
        }
        self.num_spot = self.lights.len() - self.num_directional - self.num_radial;
    }

    fn push(&mut self, light: &Light) {
        self.lights.push(light_data(light));
        self.spheres.push(light.bounds().sphere);
    }

    /// Visible lights whose influence sphere intersects `bounds`.
    #[must_use]
    pub fn gather_influencing_lights(&self, bounds: &Bounds) -> LightIndices {
        self.spheres
            .iter()
            .enumerate()
            .filter(|(_, sphere)| sphere.intersects_sphere(&bounds.sphere))
            .map(|(i, _)| i as u32)
            .collect()
    }

    /// Recomputes the light lists of every visible renderable.
    pub fn update_renderable_lights(&mut self, scene: &SceneInfo, visibility: &VisibilityInfo) {
        let count = scene.renderable_count();
        self.renderable_lights.resize_with(count, LightIndices::new);
        self.renderable_lights.truncate(count);

        for index in 0..count {
            let lights = if visibility.is_renderable_visible(index) {
                scene
                    .renderable_at(index)
                    .map(|r| self.gather_influencing_lights(r.bounds()))
                    .unwrap_or_default()
            } else {
                LightIndices::new()
            };
            self.renderable_lights[index] = lights;
        }
    }

    /// Light indices influencing the renderable at `index`.
    #[must_use]
    pub fn renderable_lights(&self, index: usize) -> &[u32] {
        self.renderable_lights
            .get(index)
            .map(|l| l.as_slice())
            .unwrap_or(&[])
    }

    /// Uploads the light array into a pooled structured buffer.
    ///
    /// Capacity rounds up to a power of two so the buffer is reused while
    /// the light count fluctuates.
    pub fn upload(&mut self, api: &mut dyn RenderApi, pool: &mut GpuResourcePool) {
        let capacity = (self.lights.len() as u32)
            .max(MIN_BUFFER_CAPACITY)
            .next_power_of_two();

        let reuse = self
            .buffer
            .as_ref()
            .is_some_and(|b| b.desc().element_count == capacity);
        if !reuse {
            self.buffer = None;
            let desc = BufferDesc::structured(
                std::mem::size_of::<LightData>() as u32,
                capacity,
                BufferUsage::DYNAMIC,
            );
            self.buffer = Some(pool.get_buffer(api, &desc));
        }

        if let Some(buffer) = &self.buffer
            && !self.lights.is_empty()
        {
            api.write_buffer(buffer.buffer(), bytemuck::cast_slice(&self.lights));
        }
    }

    /// Returns the pooled buffer to the pool.
    pub fn release(&mut self) {
        self.buffer = None;
    }

    #[must_use]
    pub fn buffer(&self) -> Option<BufferHandle> {
        self.buffer.as_ref().map(|b| b.buffer())
    }

    #[must_use]
    pub fn lights(&self) -> &[LightData] {
        &self.lights
    }

    #[must_use]
    pub fn count(&self, ty: LightType) -> usize {
        match ty {
            LightType::Directional => self.num_directional,
            LightType::Radial => self.num_radial,
            LightType::Spot => self.num_spot,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lights.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }
}

fn light_data(light: &Light) -> LightData {
    let type_id = match light.light_type() {
        LightType::Directional => 0.0,
        LightType::Radial => 1.0,
        LightType::Spot => 2.0,
    };
    let spot_angles = match &light.kind {
        LightKind::Spot(spot) => Vec4::new(spot.inner_cone.cos(), spot.outer_cone.cos(), 0.0, 0.0),
        _ => Vec4::ZERO,
    };
    let range = match light.kind {
        LightKind::Directional => 0.0,
        _ => light.range(),
    };

    LightData {
        position_range: light.position.extend(range),
        direction_type: light.direction.extend(type_id),
        color_intensity: light.color.extend(light.intensity),
        spot_angles,
    }
}
