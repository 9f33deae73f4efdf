use glam::Vec3;

use crate::scene::bounds::{Bounds, BoundingSphere};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightType {
    Directional,
    Radial,
    Spot,
}

#[derive(Debug, Clone)]
pub struct RadialLight {
    pub range: f32,
}

#[derive(Debug, Clone)]
pub struct SpotLight {
    pub range: f32,
    /// Inner cone half-angle, radians.
    pub inner_cone: f32,
    /// Outer cone half-angle, radians.
    pub outer_cone: f32,
}

#[derive(Debug, Clone)]
pub enum LightKind {
    Directional,
    Radial(RadialLight),
    Spot(SpotLight),
}

/// Scene light component.
#[derive(Debug, Clone)]
pub struct Light {
    pub color: Vec3,
    /// Luminous intensity: candela for radial/spot, lux for directional.
    pub intensity: f32,
    pub kind: LightKind,
    pub position: Vec3,
    /// Unit direction the light points at (directional and spot).
    pub direction: Vec3,
    pub cast_shadows: bool,
}

impl Light {
    #[must_use]
    pub fn new_directional(color: Vec3, intensity: f32, direction: Vec3) -> Self {
        Self {
            color,
            intensity,
            kind: LightKind::Directional,
            position: Vec3::ZERO,
            direction: direction.normalize_or_zero(),
            cast_shadows: false,
        }
    }

    #[must_use]
    pub fn new_radial(color: Vec3, intensity: f32, position: Vec3, range: f32) -> Self {
        Self {
            color,
            intensity,
            kind: LightKind::Radial(RadialLight { range }),
            position,
            direction: Vec3::NEG_Z,
            cast_shadows: false,
        }
    }

    #[must_use]
    pub fn new_spot(
        color: Vec3,
        intensity: f32,
        position: Vec3,
        direction: Vec3,
        range: f32,
        inner_cone: f32,
        outer_cone: f32,
    ) -> Self {
        Self {
            color,
            intensity,
            kind: LightKind::Spot(SpotLight {
                range,
                inner_cone,
                outer_cone,
            }),
            position,
            direction: direction.normalize_or_zero(),
            cast_shadows: false,
        }
    }

    #[must_use]
    pub fn light_type(&self) -> LightType {
        match self.kind {
            LightKind::Directional => LightType::Directional,
            LightKind::Radial(_) => LightType::Radial,
            LightKind::Spot(_) => LightType::Spot,
        }
    }

    #[must_use]
    pub fn range(&self) -> f32 {
        match &self.kind {
            LightKind::Directional => f32::INFINITY,
            LightKind::Radial(r) => r.range,
            LightKind::Spot(s) => s.range,
        }
    }

    /// World-space influence bounds.
    ///
    /// Spot lights use the tightest sphere around their cone. Directional
    /// lights have unbounded influence.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        let sphere = match &self.kind {
            LightKind::Directional => BoundingSphere::new(self.position, f32::INFINITY),
            LightKind::Radial(r) => BoundingSphere::new(self.position, r.range),
            LightKind::Spot(s) => {
                let angle = s.outer_cone;
                if angle > std::f32::consts::FRAC_PI_4 {
                    BoundingSphere::new(
                        self.position + self.direction * (angle.cos() * s.range),
                        angle.sin() * s.range,
                    )
                } else {
                    let radius = s.range / (2.0 * angle.cos());
                    BoundingSphere::new(self.position + self.direction * radius, radius)
                }
            }
        };
        Bounds::from_sphere(sphere)
    }
}
