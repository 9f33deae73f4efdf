use slotmap::SlotMap;

use super::{Camera, CameraKey, Decal, DecalKey, Light, LightKey, Renderable, RenderableKey};

/// Component store for scene objects.
///
/// Issues the keys the renderer uses to refer back to objects it does not own.
#[derive(Default)]
pub struct Scene {
    cameras: SlotMap<CameraKey, Camera>,
    lights: SlotMap<LightKey, Light>,
    renderables: SlotMap<RenderableKey, Renderable>,
    decals: SlotMap<DecalKey, Decal>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cameras: SlotMap::with_key(),
            lights: SlotMap::with_key(),
            renderables: SlotMap::with_key(),
            decals: SlotMap::with_key(),
        }
    }

    // ── Cameras ─────────────────────────────────────────────────────────────

    pub fn add_camera(&mut self, camera: Camera) -> CameraKey {
        self.cameras.insert(camera)
    }

    #[must_use]
    pub fn camera(&self, key: CameraKey) -> Option<&Camera> {
        self.cameras.get(key)
    }

    pub fn camera_mut(&mut self, key: CameraKey) -> Option<&mut Camera> {
        self.cameras.get_mut(key)
    }

    pub fn remove_camera(&mut self, key: CameraKey) -> Option<Camera> {
        self.cameras.remove(key)
    }

    pub fn cameras(&self) -> impl Iterator<Item = (CameraKey, &Camera)> {
        self.cameras.iter()
    }

    // ── Lights ──────────────────────────────────────────────────────────────

    pub fn add_light(&mut self, light: Light) -> LightKey {
        self.lights.insert(light)
    }

    #[must_use]
    pub fn light(&self, key: LightKey) -> Option<&Light> {
        self.lights.get(key)
    }

    pub fn light_mut(&mut self, key: LightKey) -> Option<&mut Light> {
        self.lights.get_mut(key)
    }

    pub fn remove_light(&mut self, key: LightKey) -> Option<Light> {
        self.lights.remove(key)
    }

    pub fn lights(&self) -> impl Iterator<Item = (LightKey, &Light)> {
        self.lights.iter()
    }

    // ── Renderables ─────────────────────────────────────────────────────────

    pub fn add_renderable(&mut self, renderable: Renderable) -> RenderableKey {
        self.renderables.insert(renderable)
    }

    #[must_use]
    pub fn renderable(&self, key: RenderableKey) -> Option<&Renderable> {
        self.renderables.get(key)
    }

    pub fn renderable_mut(&mut self, key: RenderableKey) -> Option<&mut Renderable> {
        self.renderables.get_mut(key)
    }

    pub fn remove_renderable(&mut self, key: RenderableKey) -> Option<Renderable> {
        self.renderables.remove(key)
    }

    pub fn renderables(&self) -> impl Iterator<Item = (RenderableKey, &Renderable)> {
        self.renderables.iter()
    }

    // ── Decals ──────────────────────────────────────────────────────────────

    pub fn add_decal(&mut self, decal: Decal) -> DecalKey {
        self.decals.insert(decal)
    }

    #[must_use]
    pub fn decal(&self, key: DecalKey) -> Option<&Decal> {
        self.decals.get(key)
    }

    pub fn decal_mut(&mut self, key: DecalKey) -> Option<&mut Decal> {
        self.decals.get_mut(key)
    }

    pub fn remove_decal(&mut self, key: DecalKey) -> Option<Decal> {
        self.decals.remove(key)
    }

    pub fn decals(&self) -> impl Iterator<Item = (DecalKey, &Decal)> {
        self.decals.iter()
    }
}
