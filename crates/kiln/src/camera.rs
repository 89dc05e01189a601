//! # Camera — Free-Fly View and Projection
//!
//! The camera stores two accumulated angles instead of an orientation:
//!
//! ```text
//!   x_rotation (pitch)  += mouse dy · sensitivity   clamped to ±(π/2 − ε)
//!   y_rotation (yaw)    -= mouse dx · sensitivity   wrapped to (−π, π]
//!
//!   direction = Quat(yaw, pitch, 0) · (0, 0, 1)
//! ```
//!
//! `direction` is rebuilt from scratch each update rather than rotated in
//! place. Small rotations applied frame after frame would accumulate rounding
//! error and the forward vector would slowly drift off unit length.
//!
//! Matrices are right-handed (`look_to_rh`, `perspective_rh`) with wgpu's
//! `0..1` depth range. Looking down +Z in a right-handed frame puts +X on the
//! left of the screen, so "right" is `direction × up`.
//!
//! ## Comparison
//!
//! - **Bevy**: `Transform` + `Projection` components, controllers are
//!   separate plugins.
//! - **three.js**: `PerspectiveCamera` + `PointerLockControls`; same
//!   yaw/pitch accumulation idea.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::input::CameraInput;

/// Pitch stops this far short of straight up/down so the view basis stays
/// well defined.
const PITCH_MARGIN: f32 = 0.01;

/// Camera settings. Defaults match the demo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    /// World units per second.
    pub move_speed: f32,
    /// Radians per pixel of mouse movement.
    pub mouse_sensitivity: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, -5.0),
            fov_y: 0.25 * PI,
            near: 0.1,
            far: 100.0,
            move_speed: 2.0,
            mouse_sensitivity: 0.002,
        }
    }
}

pub struct Camera {
    position: Vec3,
    direction: Vec3,
    x_rotation: f32,
    y_rotation: f32,
    view: Mat4,
    projection: Mat4,
    config: CameraConfig,
}

impl Camera {
    /// Canonical forward vector the Euler angles rotate.
    pub const FORWARD: Vec3 = Vec3::Z;

    pub fn new(config: CameraConfig, aspect: f32) -> Self {
        let mut camera = Self {
            position: config.position,
            direction: Self::FORWARD,
            x_rotation: 0.0,
            y_rotation: 0.0,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            config,
        };
        camera.set_aspect(aspect);
        camera.rebuild_view();
        camera
    }

    /// Apply one frame of input: look, then move, then rebuild the view.
    pub fn update(&mut self, dt: f32, input: &CameraInput) {
        self.mouse_rotate(input.mouse_delta.x, input.mouse_delta.y);

        self.direction = Quat::from_euler(EulerRot::YXZ, self.y_rotation, self.x_rotation, 0.0)
            * Self::FORWARD;

        let step = self.config.move_speed * dt;
        let right = self.right();
        if input.forward {
            self.position += self.direction * step;
        }
        if input.back {
            self.position -= self.direction * step;
        }
        if input.right {
            self.position += right * step;
        }
        if input.left {
            self.position -= right * step;
        }
        if input.up {
            self.position += Vec3::Y * step;
        }
        if input.down {
            self.position -= Vec3::Y * step;
        }

        self.rebuild_view();
    }

    /// Accumulate a mouse delta (pixels) into the Euler angles.
    pub fn mouse_rotate(&mut self, dx: f32, dy: f32) {
        let s = self.config.mouse_sensitivity;
        let limit = FRAC_PI_2 - PITCH_MARGIN;
        self.x_rotation = (self.x_rotation + dy * s).clamp(-limit, limit);
        self.y_rotation = wrap_angle(self.y_rotation - dx * s);
    }

    /// Rebuild the projection for a new window size. Zero-sized windows
    /// (minimized) keep the previous projection.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.set_aspect(width as f32 / height as f32);
        }
    }

    fn set_aspect(&mut self, aspect: f32) {
        self.projection =
            Mat4::perspective_rh(self.config.fov_y, aspect.max(1e-3), self.config.near, self.config.far);
    }

    fn rebuild_view(&mut self) {
        self.view = Mat4::look_to_rh(self.position, self.direction, Vec3::Y);
    }

    /// Horizontal right vector for the current direction.
    fn right(&self) -> Vec3 {
        self.direction.cross(Vec3::Y).normalize_or_zero()
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// View with the translation removed, for geometry that sits at
    /// infinity (the skybox).
    pub fn sky_view(&self) -> Mat4 {
        Mat4::look_to_rh(Vec3::ZERO, self.direction, Vec3::Y)
    }

    pub fn sky_view_projection(&self) -> Mat4 {
        self.projection * self.sky_view()
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }
}

/// Wrap an angle into `(-π, π]`.
fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn camera() -> Camera {
        Camera::new(CameraConfig::default(), 16.0 / 9.0)
    }

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn starts_behind_origin_looking_down_z() {
        let cam = camera();
        assert_eq!(cam.position(), Vec3::new(0.0, 0.0, -5.0));
        assert_eq!(cam.direction(), Vec3::Z);
    }

    #[test]
    fn view_moves_eye_to_origin() {
        let cam = camera();
        let eye = cam.view().transform_point3(cam.position());
        assert!(approx(eye, Vec3::ZERO), "eye in view space: {eye:?}");
    }

    #[test]
    fn forward_moves_along_direction_at_speed() {
        let mut cam = camera();
        let input = CameraInput {
            forward: true,
            ..Default::default()
        };
        cam.update(0.5, &input);
        assert!(approx(cam.position(), Vec3::new(0.0, 0.0, -4.0)), "{:?}", cam.position());
    }

    #[test]
    fn strafe_is_perpendicular_to_direction() {
        let mut cam = camera();
        cam.update(0.0, &CameraInput {
            mouse_delta: Vec2::new(200.0, 0.0),
            ..Default::default()
        });
        let before = cam.position();
        cam.update(1.0, &CameraInput {
            right: true,
            ..Default::default()
        });
        let moved = cam.position() - before;
        assert!((moved.length() - 2.0).abs() < 1e-4);
        assert!(moved.dot(cam.direction()).abs() < 1e-4);
        assert!(moved.y.abs() < 1e-6);
    }

    #[test]
    fn up_and_down_follow_world_y() {
        let mut cam = camera();
        cam.update(0.25, &CameraInput {
            up: true,
            ..Default::default()
        });
        assert!(approx(cam.position(), Vec3::new(0.0, 0.5, -5.0)));
        cam.update(0.25, &CameraInput {
            down: true,
            ..Default::default()
        });
        assert!(approx(cam.position(), Vec3::new(0.0, 0.0, -5.0)));
    }

    #[test]
    fn mouse_right_turns_right() {
        let mut cam = camera();
        cam.update(0.0, &CameraInput {
            mouse_delta: Vec2::new(100.0, 0.0),
            ..Default::default()
        });
        // Facing +Z in a right-handed frame, screen right is -X.
        assert!(cam.direction().x < 0.0);
    }

    #[test]
    fn direction_does_not_drift() {
        let mut cam = camera();
        for _ in 0..1000 {
            cam.update(0.016, &CameraInput {
                mouse_delta: Vec2::new(37.0, 11.0),
                ..Default::default()
            });
            cam.update(0.016, &CameraInput {
                mouse_delta: Vec2::new(-37.0, -11.0),
                ..Default::default()
            });
        }
        assert!(approx(cam.direction(), Vec3::Z), "drifted to {:?}", cam.direction());
        assert!((cam.direction().length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut cam = camera();
        cam.update(0.0, &CameraInput {
            mouse_delta: Vec2::new(0.0, 1.0e6),
            ..Default::default()
        });
        assert!(cam.direction().y > -1.0);
        assert!(cam.direction().y < -0.99);
        assert!(cam.view().is_finite());
    }

    #[test]
    fn yaw_wraps() {
        assert!((wrap_angle(3.0 * PI) - PI).abs() < 1e-5);
        assert!((wrap_angle(-0.5) + 0.5).abs() < 1e-6);
    }

    #[test]
    fn resize_rebuilds_projection_for_new_aspect() {
        let mut cam = camera();
        cam.resize(1000, 500);
        let expected = Mat4::perspective_rh(0.25 * PI, 2.0, 0.1, 100.0);
        assert!(cam.projection().abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn zero_sized_resize_is_ignored() {
        let mut cam = camera();
        let before = cam.projection();
        cam.resize(0, 720);
        assert_eq!(cam.projection(), before);
    }

    #[test]
    fn sky_view_has_no_translation() {
        let mut cam = camera();
        cam.update(1.0, &CameraInput {
            forward: true,
            up: true,
            ..Default::default()
        });
        assert_eq!(cam.sky_view().w_axis.truncate(), Vec3::ZERO);
    }
}
