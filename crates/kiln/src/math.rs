//! Math types and glam re-exports.
//!
//! We re-export [glam](https://docs.rs/glam) types so users don't need to
//! depend on it directly. [`Transform`] is the position / rotation / scale
//! shared by entities, lights and the emitter gizmos.

pub use glam::{EulerRot, Mat4, Quat, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Position, Euler rotation (radians) and scale.
///
/// The rotation vector holds pitch (x), yaw (y) and roll (z). They are
/// applied roll first, then pitch, then yaw.
///
/// The world matrix is rebuilt on every call to [`Transform::matrix`]; there
/// is no cached copy to invalidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    /// Identity transform (origin, no rotation, uniform scale of 1).
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    /// Create a transform at the given position.
    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            ..Self::IDENTITY
        }
    }

    /// Return a copy with a per-axis scale applied.
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Return a copy with the given Euler rotation.
    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Orientation as a quaternion (yaw · pitch · roll).
    pub fn orientation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.rotation.y, self.rotation.x, self.rotation.z)
    }

    /// World matrix: scale, then rotate, then translate.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.orientation(), self.position)
    }

    /// Inverse-transpose of the world matrix, for transforming normals.
    pub fn normal_matrix(&self) -> Mat4 {
        self.matrix().inverse().transpose()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn identity_matrix() {
        assert_eq!(Transform::IDENTITY.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn scale_applies_before_rotation_and_translation() {
        let t = Transform::from_xyz(10.0, 0.0, 0.0)
            .with_scale(Vec3::new(2.0, 1.0, 1.0))
            .with_rotation(Vec3::new(0.0, FRAC_PI_2, 0.0));
        // (1,0,0) → scale (2,0,0) → yaw 90° (0,0,-2) → translate (10,0,-2)
        let p = t.matrix().transform_point3(Vec3::X);
        assert!(approx(p, Vec3::new(10.0, 0.0, -2.0)), "got {p:?}");
    }

    #[test]
    fn roll_applies_before_yaw() {
        let t = Transform::IDENTITY.with_rotation(Vec3::new(0.0, FRAC_PI_2, FRAC_PI_2));
        // roll 90° takes +X to +Y; yaw leaves +Y alone
        let p = t.matrix().transform_vector3(Vec3::X);
        assert!(approx(p, Vec3::Y), "got {p:?}");
    }

    #[test]
    fn normal_matrix_keeps_normals_perpendicular_under_nonuniform_scale() {
        let t = Transform::IDENTITY.with_scale(Vec3::new(25.0, 1.0, 25.0));
        let n = t.normal_matrix().transform_vector3(Vec3::Y).normalize();
        assert!(approx(n, Vec3::Y), "got {n:?}");
    }

    #[test]
    fn deserializes_partial_json() {
        let t: Transform = serde_json::from_str(r#"{ "position": [0.0, -1.0, 0.0] }"#).unwrap();
        assert_eq!(t.position, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(t.scale, Vec3::ONE);
    }
}
