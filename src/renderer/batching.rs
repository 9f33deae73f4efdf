//! Static geometry batching
//!
//! [`SceneInfo::batch_renderables`](crate::renderer::scene::SceneInfo::batch_renderables)
//! groups static renderables and hands each group to a [`GeometryBatcher`],
//! which decides how the group is merged into one renderable.

use glam::Affine3A;

use crate::renderer::scene::RenderableId;
use crate::scene::{Renderable, RenderableKey};

/// Merges a group of renderables into one.
pub trait GeometryBatcher {
    /// Returns the merged renderable, or `None` to leave the group unbatched.
    fn merge(&mut self, sources: &[&Renderable]) -> Option<Renderable>;
}

/// Concatenates the elements of renderables that share a world transform,
/// typically static geometry already baked into world space. Groups with
/// differing transforms are left unbatched.
#[derive(Debug, Default, Clone, Copy)]
pub struct ElementConcatBatcher;

impl GeometryBatcher for ElementConcatBatcher {
    fn merge(&mut self, sources: &[&Renderable]) -> Option<Renderable> {
        let (first, rest) = sources.split_first()?;
        if rest.iter().any(|r| r.world_transform != first.world_transform) {
            return None;
        }

        let local_bounds = rest
            .iter()
            .fold(first.local_bounds, |acc, r| acc.union(&r.local_bounds));
        let elements = sources
            .iter()
            .flat_map(|r| r.elements.iter().cloned())
            .collect();

        Some(Renderable {
            elements,
            local_bounds,
            world_transform: first.world_transform,
            layer: first.layer,
            cull_distance_factor: sources
                .iter()
                .map(|r| r.cull_distance_factor)
                .fold(0.0, f32::max),
            is_static: true,
        })
    }
}

/// A live batch and the scene renderables it replaces.
#[derive(Debug, Clone)]
pub(crate) struct BatchRecord {
    pub id: RenderableId,
    pub members: Vec<RenderableKey>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{BoundingBox, Bounds, MaterialId, MeshId, PipelineId, RenderableElement};
    use glam::Vec3;

    fn renderable(min: Vec3, max: Vec3) -> Renderable {
        let element = RenderableElement::new(MeshId(1), 0, MaterialId(1), PipelineId(1));
        Renderable::new(vec![element], Bounds::from_box(BoundingBox::new(min, max)))
    }

    #[test]
    fn concat_unions_bounds() {
        let a = renderable(Vec3::new(-6.0, -1.0, -1.0), Vec3::new(-4.0, 1.0, 1.0));
        let b = renderable(Vec3::new(4.0, -1.0, -1.0), Vec3::new(6.0, 1.0, 1.0));

        let merged = ElementConcatBatcher.merge(&[&a, &b]).unwrap();
        assert_eq!(merged.elements.len(), 2);
        assert_eq!(merged.local_bounds.aabb.min, Vec3::new(-6.0, -1.0, -1.0));
        assert_eq!(merged.local_bounds.aabb.max, Vec3::new(6.0, 1.0, 1.0));
    }

    #[test]
    fn differing_transforms_are_not_merged() {
        let a = renderable(Vec3::splat(-1.0), Vec3::splat(1.0));
        let mut b = a.clone();
        b.world_transform = Affine3A::from_translation(Vec3::X);
        assert!(ElementConcatBatcher.merge(&[&a, &b]).is_none());
    }
}
