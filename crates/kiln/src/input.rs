//! Keyboard and mouse input state.
//!
//! The [`Input`] resource tracks which keys/buttons are currently pressed,
//! just pressed this frame, or just released this frame. It is fed by the
//! window event handler.
//!
//! Simulation code never reads [`Input`] directly. Once per frame the app
//! folds it into a [`CameraInput`] snapshot, so the camera can be driven from
//! tests without a window.

use std::collections::HashSet;
use std::hash::Hash;

use glam::Vec2;
pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;

/// Tracks the state of a set of inputs (keys or mouse buttons).
///
/// - `pressed`: currently held down
/// - `just_pressed`: pressed this frame (not held last frame)
/// - `just_released`: released this frame
pub struct Input<T: Eq + Hash + Copy> {
    pressed: HashSet<T>,
    just_pressed: HashSet<T>,
    just_released: HashSet<T>,
}

impl<T: Eq + Hash + Copy> Input<T> {
    pub fn new() -> Self {
        Self {
            pressed: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
        }
    }

    /// Returns `true` if the input is currently held down.
    pub fn pressed(&self, input: T) -> bool {
        self.pressed.contains(&input)
    }

    /// Returns `true` if the input was pressed this frame.
    pub fn just_pressed(&self, input: T) -> bool {
        self.just_pressed.contains(&input)
    }

    /// Returns `true` if the input was released this frame.
    pub fn just_released(&self, input: T) -> bool {
        self.just_released.contains(&input)
    }

    /// Call when an input is pressed (from event handler).
    pub(crate) fn press(&mut self, input: T) {
        if self.pressed.insert(input) {
            self.just_pressed.insert(input);
        }
    }

    /// Call when an input is released (from event handler).
    pub(crate) fn release(&mut self, input: T) {
        if self.pressed.remove(&input) {
            self.just_released.insert(input);
        }
    }

    /// Clear per-frame state. Called at the end of each frame.
    pub(crate) fn clear_just(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

impl<T: Eq + Hash + Copy> Default for Input<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulates cursor movement between frames.
///
/// The first cursor event only records a position; deltas start with the
/// second one, so the camera doesn't jump when the cursor enters the window.
#[derive(Debug, Default, Clone, Copy)]
pub struct MouseMotion {
    last: Option<Vec2>,
    delta: Vec2,
}

impl MouseMotion {
    pub fn cursor_moved(&mut self, position: Vec2) {
        if let Some(last) = self.last {
            self.delta += position - last;
        }
        self.last = Some(position);
    }

    /// Forget the last position (cursor left the window).
    pub fn cursor_left(&mut self) {
        self.last = None;
    }

    /// Movement since the previous call.
    pub fn take_delta(&mut self) -> Vec2 {
        std::mem::take(&mut self.delta)
    }
}

/// Per-frame input snapshot consumed by [`Camera::update`](crate::camera::Camera::update).
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct CameraInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    /// Cursor movement in pixels since the last frame.
    pub mouse_delta: Vec2,
}

impl CameraInput {
    /// W/S forward and back, A/D strafe, Space up, X down.
    pub fn from_keys(keys: &Input<KeyCode>, mouse_delta: Vec2) -> Self {
        Self {
            forward: keys.pressed(KeyCode::KeyW),
            back: keys.pressed(KeyCode::KeyS),
            left: keys.pressed(KeyCode::KeyA),
            right: keys.pressed(KeyCode::KeyD),
            up: keys.pressed(KeyCode::Space),
            down: keys.pressed(KeyCode::KeyX),
            mouse_delta,
        }
    }
}
