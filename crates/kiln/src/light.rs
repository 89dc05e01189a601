//! # Lights — Directional and Point
//!
//! Lights are drawn, not looped over in a shader. Each one is a draw call in
//! the lighting pass that adds its contribution to the lighting buffer:
//!
//! ```text
//! Directional ─► full-screen triangle, every pixel
//! Point       ─► sphere volume scaled to 2 × range (radius = range),
//!                only pixels the volume covers
//! ```
//!
//! Both evaluate
//!
//! ```text
//! ambient + diffuse · max(N·L, 0) · attenuation
//! attenuation = 1                          (directional)
//!             = saturate(1 − d / range)²   (point)
//! ```
//!
//! `Light::contribution` (test builds only) is the CPU version of the same
//! formula; `render/shaders/lighting.wgsl` must agree with it.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::render::states::DrawStage;
use crate::render::vertex::{LightUniform, LIGHT_KIND_DIRECTIONAL, LIGHT_KIND_POINT};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalLight {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    /// Direction the light travels (towards the scene).
    pub direction: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            ambient: Vec3::ZERO,
            diffuse: Vec3::ONE,
            direction: Vec3::NEG_Y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointLight {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub position: Vec3,
    pub range: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            ambient: Vec3::ZERO,
            diffuse: Vec3::ONE,
            position: Vec3::ZERO,
            range: 10.0,
        }
    }
}

impl PointLight {
    /// World matrix of the light volume. The base sphere has radius 0.5,
    /// so scaling by `2 × range` makes the volume exactly as large as the
    /// falloff.
    pub fn volume_world(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(2.0 * self.range), Quat::IDENTITY, self.position)
    }

    pub fn attenuation(&self, distance: f32) -> f32 {
        if self.range <= 0.0 {
            return 0.0;
        }
        (1.0 - distance / self.range).clamp(0.0, 1.0).powi(2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Directional(DirectionalLight),
    Point(PointLight),
}

impl Light {
    pub fn ambient(&self) -> Vec3 {
        match self {
            Light::Directional(l) => l.ambient,
            Light::Point(l) => l.ambient,
        }
    }

    pub fn diffuse(&self) -> Vec3 {
        match self {
            Light::Directional(l) => l.diffuse,
            Light::Point(l) => l.diffuse,
        }
    }

    /// Pipeline used to draw this light.
    pub fn stage(&self) -> DrawStage {
        match self {
            Light::Directional(_) => DrawStage::DirectionalLight,
            Light::Point(_) => DrawStage::PointLight,
        }
    }

    /// Per-draw shader parameters.
    pub fn uniform(&self) -> LightUniform {
        let (world, position_range, kind) = match self {
            Light::Directional(l) => (
                Mat4::IDENTITY,
                l.direction.normalize_or(Vec3::NEG_Y).extend(0.0),
                LIGHT_KIND_DIRECTIONAL,
            ),
            Light::Point(l) => (l.volume_world(), l.position.extend(l.range), LIGHT_KIND_POINT),
        };
        LightUniform {
            world: world.to_cols_array_2d(),
            ambient: self.ambient().extend(1.0).to_array(),
            diffuse: self.diffuse().extend(1.0).to_array(),
            position_range: position_range.to_array(),
            kind,
            _pad: [0; 3],
        }
    }

    /// Light added to a surface point with world normal `normal`.
    #[cfg(test)]
    pub fn contribution(&self, normal: Vec3, position: Vec3) -> Vec3 {
        let (to_light, attenuation) = match self {
            Light::Directional(l) => (-l.direction.normalize_or(Vec3::NEG_Y), 1.0),
            Light::Point(l) => {
                let offset = l.position - position;
                (offset.normalize_or_zero(), l.attenuation(offset.length()))
            }
        };
        let n_dot_l = normal.normalize_or_zero().dot(to_light).max(0.0);
        self.ambient() + self.diffuse() * n_dot_l * attenuation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> PointLight {
        PointLight {
            ambient: Vec3::splat(0.1),
            diffuse: Vec3::new(0.4, 0.4, 1.0),
            position: Vec3::new(-1.0, 0.0, -1.0),
            range: 10.0,
        }
    }

    #[test]
    fn volume_is_scaled_to_twice_the_range() {
        let world = point().volume_world();
        let (scale, rotation, translation) = world.to_scale_rotation_translation();
        assert!((scale - Vec3::splat(20.0)).length() < 1e-5);
        assert!(rotation.abs_diff_eq(Quat::IDENTITY, 1e-6));
        assert_eq!(translation, Vec3::new(-1.0, 0.0, -1.0));
        // Unit-sphere surface point (radius 0.5) lands exactly at range.
        let edge = world.transform_point3(Vec3::new(0.5, 0.0, 0.0));
        assert!(((edge - translation).length() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn attenuation_falls_to_zero_at_range() {
        let l = point();
        assert_eq!(l.attenuation(0.0), 1.0);
        assert!((l.attenuation(5.0) - 0.25).abs() < 1e-6);
        assert_eq!(l.attenuation(10.0), 0.0);
        assert_eq!(l.attenuation(25.0), 0.0);
    }

    #[test]
    fn point_uniform_packs_position_and_range() {
        let u = Light::Point(point()).uniform();
        assert_eq!(u.kind, LIGHT_KIND_POINT);
        assert_eq!(u.position_range, [-1.0, 0.0, -1.0, 10.0]);
        assert_eq!(u.ambient, [0.1, 0.1, 0.1, 1.0]);
        assert_eq!(Mat4::from_cols_array_2d(&u.world), point().volume_world());
    }

    #[test]
    fn directional_uniform_normalizes_direction() {
        let u = Light::Directional(DirectionalLight {
            direction: Vec3::new(1.0, -1.0, 1.0),
            ..Default::default()
        })
        .uniform();
        assert_eq!(u.kind, LIGHT_KIND_DIRECTIONAL);
        let d = Vec3::new(u.position_range[0], u.position_range[1], u.position_range[2]);
        assert!((d.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn surface_facing_away_gets_only_ambient() {
        let light = Light::Directional(DirectionalLight {
            ambient: Vec3::splat(0.2),
            diffuse: Vec3::ONE,
            direction: Vec3::NEG_Y,
        });
        let lit = light.contribution(Vec3::Y, Vec3::ZERO);
        assert!((lit - Vec3::splat(1.2)).length() < 1e-6, "got {lit:?}");
        assert_eq!(light.contribution(Vec3::NEG_Y, Vec3::ZERO), Vec3::splat(0.2));
    }

    #[test]
    fn point_contribution_is_attenuated() {
        let light = Light::Point(PointLight {
            ambient: Vec3::ZERO,
            diffuse: Vec3::ONE,
            position: Vec3::new(0.0, 5.0, 0.0),
            range: 10.0,
        });
        let c = light.contribution(Vec3::Y, Vec3::ZERO);
        assert!((c - Vec3::splat(0.25)).length() < 1e-6, "got {c:?}");
    }

    #[test]
    fn stages_match_light_kind() {
        assert_eq!(Light::Point(point()).stage(), DrawStage::PointLight);
        assert_eq!(Light::Directional(DirectionalLight::default()).stage(), DrawStage::DirectionalLight);
    }
}
