use glam::{Affine3A, Vec2, Vec3};

use crate::scene::bounds::{BoundingBox, Bounds};
use crate::scene::renderable::{MaterialId, PipelineId};

/// Projected decal component.
///
/// The decal projects along its local -Z over `max_distance`, covering a
/// `size` rectangle in its local XY plane.
#[derive(Debug, Clone)]
pub struct Decal {
    pub material: MaterialId,
    pub pipeline: PipelineId,
    pub world_transform: Affine3A,
    pub size: Vec2,
    pub max_distance: f32,
    /// Layer of the decal itself, tested against camera layers.
    pub layer: u64,
    /// Layers of surfaces the decal projects onto.
    pub layer_mask: u32,
}

impl Decal {
    #[must_use]
    pub fn new(material: MaterialId, pipeline: PipelineId, size: Vec2, max_distance: f32) -> Self {
        Self {
            material,
            pipeline,
            world_transform: Affine3A::IDENTITY,
            size,
            max_distance,
            layer: 1,
            layer_mask: u32::MAX,
        }
    }

    #[must_use]
    pub fn local_bounds(&self) -> Bounds {
        let half = Vec3::new(self.size.x * 0.5, self.size.y * 0.5, self.max_distance * 0.5);
        Bounds::from_box(BoundingBox::from_center_extents(
            Vec3::new(0.0, 0.0, -self.max_distance * 0.5),
            half,
        ))
    }

    #[must_use]
    pub fn world_bounds(&self) -> Bounds {
        self.local_bounds().transform(&self.world_transform)
    }
}
