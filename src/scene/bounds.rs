//! Bounding volumes used for culling.

use glam::{Affine3A, Vec3};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn from_center_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    #[must_use]
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Transforms all eight corners and re-fits an axis-aligned box around them.
    #[must_use]
    pub fn transform(&self, matrix: &Affine3A) -> Self {
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];

        let mut new_min = Vec3::splat(f32::INFINITY);
        let mut new_max = Vec3::splat(f32::NEG_INFINITY);

        for point in corners {
            let transformed = matrix.transform_point3(point);
            new_min = new_min.min(transformed);
            new_max = new_max.max(transformed);
        }

        Self {
            min: new_min,
            max: new_max,
        }
    }
}

/// Bounding sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    #[must_use]
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    #[must_use]
    pub fn intersects_sphere(&self, other: &BoundingSphere) -> bool {
        let reach = self.radius + other.radius;
        self.center.distance_squared(other.center) <= reach * reach
    }
}

/// Paired box + sphere, the sphere enclosing the box.
///
/// Culling tests the sphere first and only falls back to the box when the
/// sphere passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub aabb: BoundingBox,
    pub sphere: BoundingSphere,
}

impl Bounds {
    #[must_use]
    pub fn new(aabb: BoundingBox, sphere: BoundingSphere) -> Self {
        Self { aabb, sphere }
    }

    /// Builds bounds from a box, deriving the enclosing sphere.
    #[must_use]
    pub fn from_box(aabb: BoundingBox) -> Self {
        let center = aabb.center();
        let radius = (aabb.max - center).length();
        Self {
            aabb,
            sphere: BoundingSphere { center, radius },
        }
    }

    /// Builds bounds from a sphere, deriving the enclosing box.
    #[must_use]
    pub fn from_sphere(sphere: BoundingSphere) -> Self {
        Self {
            aabb: BoundingBox::from_center_extents(sphere.center, Vec3::splat(sphere.radius)),
            sphere,
        }
    }

    /// Moves the bounds into world space.
    #[must_use]
    pub fn transform(&self, matrix: &Affine3A) -> Self {
        Self::from_box(self.aabb.transform(matrix))
    }

    #[must_use]
    pub fn union(&self, other: &Bounds) -> Self {
        Self::from_box(self.aabb.union(&other.aabb))
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::from_box(BoundingBox::from_center_extents(Vec3::ZERO, Vec3::splat(0.5)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_encloses_box_corners() {
        let bounds = Bounds::from_box(BoundingBox::new(Vec3::splat(-1.0), Vec3::splat(1.0)));
        assert!((bounds.sphere.radius - 3.0_f32.sqrt()).abs() < 1e-5);
        assert_eq!(bounds.sphere.center, Vec3::ZERO);
    }

    #[test]
    fn transform_translates_box() {
        let bounds = Bounds::default();
        let moved = bounds.transform(&Affine3A::from_translation(Vec3::new(10.0, 0.0, 0.0)));
        assert!((moved.aabb.center().x - 10.0).abs() < 1e-5);
    }

    #[test]
    fn touching_spheres_intersect() {
        let a = BoundingSphere::new(Vec3::ZERO, 1.0);
        let b = BoundingSphere::new(Vec3::new(2.0, 0.0, 0.0), 1.0);
        let c = BoundingSphere::new(Vec3::new(2.1, 0.0, 0.0), 1.0);
        assert!(a.intersects_sphere(&b));
        assert!(!a.intersects_sphere(&c));
    }
}
