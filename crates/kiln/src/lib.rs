//! # Kiln — Deferred Renderer With a Particle Emitter
//!
//! A small 3D demo: lit meshes through a G-buffer, a skybox, CPU-simulated
//! billboard particles and light icons, driven by a JSON scene config.
//!
//! Start with `use kiln::prelude::*`, load a [`KilnConfig`](config::KilnConfig)
//! and hand it to [`run`].

pub mod app;
pub mod asset;
pub mod camera;
pub mod config;
pub mod error;
pub mod icons;
pub mod input;
pub mod light;
pub mod logging;
pub mod material;
pub mod math;
pub mod particles;
pub mod prelude;
pub mod render;
pub mod scene;
pub mod time;

#[cfg(feature = "diagnostics")]
pub mod diag;

pub use app::run;
