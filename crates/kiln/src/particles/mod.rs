//! # Particles — Ring-Buffer Emitters
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Emitter                                                  │
//! │   particles: [Particle; max]      ← simulation state      │
//! │   ring: AliveRing                 ← which slots are alive │
//! │   vertices: [ParticleVertex; 4·max] ← CPU staging         │
//! │   indices:  [u32; 6·max]            ← built once          │
//! │   gpu: QuadBuffers                ← created on 1st frame  │
//! └──────────────────────────────────────────────────────────┘
//!
//! Per frame:  update(dt)  →  prepare_gpu()  →  draw(pass)
//!             simulate       repack + upload    1 or 2 draw_indexed
//! ```
//!
//! The simulation never touches wgpu, so everything except the upload and
//! the draw is unit-tested without a device.

pub mod emitter;
pub mod gpu;
pub mod ring;
pub mod vertex;

pub use emitter::{Emitter, EmitterConfig, Particle};
pub use ring::AliveRing;
pub use vertex::ParticleVertex;
