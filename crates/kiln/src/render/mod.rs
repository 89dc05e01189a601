//! GPU side: device setup, resources and the deferred frame.
//!
//! [`frame`], [`states`], [`shapes`] and [`vertex`] are plain data and
//! testable without a device. Everything else talks to wgpu.

pub mod deferred;
pub mod frame;
#[cfg(feature = "gltf")]
pub mod gltf;
pub mod gpu;
pub mod mesh;
pub mod shader;
pub mod shapes;
pub mod states;
pub mod targets;
pub mod texture;
pub mod uniform;
pub mod vertex;

pub use deferred::DeferredRenderer;
pub use gpu::GpuContext;
