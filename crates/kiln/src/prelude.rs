//! Convenience re-exports — `use kiln::prelude::*` for the common items.

pub use crate::app::{run, App};
pub use crate::camera::{Camera, CameraConfig};
pub use crate::config::{EntityDesc, KilnConfig, Orbit, PointLightDesc, RenderConfig, SceneConfig, WindowConfig};
pub use crate::error::{KilnError, Result};
pub use crate::input::{CameraInput, Input, KeyCode, MouseButton};
pub use crate::light::{DirectionalLight, Light, PointLight};
pub use crate::logging::{init_logging, LoggingConfig};
pub use crate::material::{Material, MaterialDesc};
pub use crate::math::{Mat4, Quat, Transform, Vec2, Vec3, Vec4};
pub use crate::particles::{Emitter, EmitterConfig};
pub use crate::render::frame::{FrameStats, Pass};
pub use crate::render::mesh::{MeshHandle, MeshSource};
pub use crate::scene::{Entity, Scene};
pub use crate::time::Time;
