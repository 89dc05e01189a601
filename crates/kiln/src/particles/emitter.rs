//! # Emitter — Particle Simulation
//!
//! An [`Emitter`] owns a fixed pool of particles, spawns them in bursts and
//! ages them out. Nothing is allocated after construction: the pool, the
//! vertex staging array and the index data are sized once from
//! `max_particles`.
//!
//! ## Per-Frame Flow
//!
//! ```text
//! update(dt)
//!   │
//!   ├─ 1. Age ─── walk the alive ring oldest → newest
//!   │     age += dt
//!   │     age ≥ lifetime ? retire_front : recompute from closed form
//!   │
//!   └─ 2. Emit ─── catch-up
//!         if window open && time_since_emit ≥ seconds_per_burst:
//!             bursts = whole periods in time_since_emit
//!             time_since_emit %= seconds_per_burst
//!             fire min(bursts, enough to fill the ring) bursts
//! ```
//!
//! ## Closed-Form Motion
//!
//! Positions are never integrated step by step. Each particle remembers where
//! it started and how fast it was launched, and its position is evaluated
//! directly from its age:
//!
//! ```text
//! position = start + velocity · age + ½ · acceleration · age²
//! ```
//!
//! The result does not depend on the frame rate and cannot drift. Color and
//! size are linear in `age / lifetime`; rotation is the only quantity that
//! accumulates.
//!
//! ## Catch-Up Bursts
//!
//! A slow frame may cover several burst periods, and every period that
//! elapsed fires its burst. Over `T` seconds exactly
//! `floor(T × bursts_per_second)` bursts fire however `dt` was chunked.
//! Bursts beyond what fills the ring are skipped rather than refused one
//! spawn at a time, so a frame after a long stall costs at most one ring.
//!
//! ## Comparison
//!
//! - **Unity**: `ParticleSystem` integrates velocity each frame and supports
//!   curves for every property. Far more flexible, not drift-free.
//! - **three.js (`Points`)**: no simulation at all; users update positions.

use std::ops::Range;

use glam::{Vec3, Vec4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::gpu::QuadBuffers;
use super::ring::AliveRing;
use super::vertex::{quad_indices, quad_staging, ParticleVertex};
use crate::render::texture::TextureHandle;

/// Construction parameters for an [`Emitter`].
///
/// Defaults describe the demo's red-orange fountain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    pub max_particles: usize,
    /// Must be positive. A non-positive rate disables emission.
    pub bursts_per_second: f32,
    pub particles_per_burst: u32,
    /// Length of the emission window in seconds. `None` (or `0`) emits
    /// forever; a negative window never opens.
    pub emit_time: Option<f32>,
    pub lifetime: f32,
    pub start_size: f32,
    pub end_size: f32,
    pub rotation_min: f32,
    pub rotation_max: f32,
    pub rotational_velocity_min: f32,
    pub rotational_velocity_max: f32,
    pub start_color: Vec4,
    pub end_color: Vec4,
    pub velocity_min: Vec3,
    pub velocity_max: Vec3,
    pub acceleration: Vec3,
    pub position: Vec3,
    /// Image used for every particle quad. Missing → soft procedural dot.
    pub texture: Option<String>,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        use std::f32::consts::PI;
        Self {
            max_particles: 1000,
            bursts_per_second: 20.0,
            particles_per_burst: 5,
            emit_time: None,
            lifetime: 2.0,
            start_size: 2.0,
            end_size: 0.2,
            rotation_min: -PI,
            rotation_max: PI,
            rotational_velocity_min: -PI,
            rotational_velocity_max: PI,
            start_color: Vec4::new(1.0, 0.1, 0.1, 1.0),
            end_color: Vec4::new(1.0, 0.6, 0.1, 0.0),
            velocity_min: Vec3::new(-2.0, 5.0, -2.0),
            velocity_max: Vec3::new(2.0, 10.0, 2.0),
            acceleration: Vec3::new(0.0, -9.0, 0.0),
            position: Vec3::new(3.0, 0.0, 0.0),
            texture: None,
        }
    }
}

/// One live (or recyclable) particle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Particle {
    pub position: Vec3,
    pub color: Vec4,
    pub start_position: Vec3,
    pub start_velocity: Vec3,
    pub size: f32,
    pub rotation: f32,
    pub rotational_velocity: f32,
    /// Seconds since spawn.
    pub age: f32,
}

/// A fixed-capacity particle emitter.
pub struct Emitter {
    config: EmitterConfig,
    seconds_per_burst: f32,
    particles: Vec<Particle>,
    ring: AliveRing,
    vertices: Vec<ParticleVertex>,
    indices: Vec<u32>,
    time_since_emit: f32,
    total_time_since_emit: f32,
    spawned: u64,
    position: Vec3,
    texture: TextureHandle,
    rng: StdRng,
    gpu: Option<QuadBuffers>,
}

impl Emitter {
    /// Create an emitter seeded from OS entropy.
    pub fn new(config: EmitterConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Create an emitter with a deterministic random sequence.
    pub fn with_seed(config: EmitterConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: EmitterConfig, rng: StdRng) -> Self {
        let seconds_per_burst = if config.bursts_per_second > 0.0 {
            1.0 / config.bursts_per_second
        } else {
            log::warn!(
                "Emitter bursts_per_second is {} (must be > 0); emission disabled",
                config.bursts_per_second
            );
            f32::INFINITY
        };

        let max = config.max_particles;
        let dead = Particle {
            age: config.lifetime,
            ..Particle::default()
        };

        Self {
            seconds_per_burst,
            particles: vec![dead; max],
            ring: AliveRing::new(max),
            vertices: quad_staging(max),
            indices: quad_indices(max),
            time_since_emit: 0.0,
            total_time_since_emit: 0.0,
            spawned: 0,
            position: config.position,
            texture: TextureHandle::PARTICLE,
            rng,
            gpu: None,
            config,
        }
    }

    // ── Simulation ──────────────────────────────────────────────────────

    /// Advance the simulation by `dt` seconds: age, retire, then emit.
    pub fn update(&mut self, dt: f32) {
        if !dt.is_finite() || dt < 0.0 {
            return;
        }

        let lifetime = self.config.lifetime;
        let start_size = self.config.start_size;
        let end_size = self.config.end_size;
        let start_color = self.config.start_color;
        let end_color = self.config.end_color;
        let acceleration = self.config.acceleration;

        for slot in self.ring.slots() {
            let p = &mut self.particles[slot];
            p.age += dt;

            if p.age >= lifetime {
                debug_assert_eq!(slot, self.ring.first_alive(), "particles must die oldest first");
                self.ring.retire_front();
                continue;
            }

            let age_percent = p.age / lifetime;
            p.rotation += dt * p.rotational_velocity;
            p.color = start_color.lerp(end_color, age_percent);
            p.size = start_size + age_percent * (end_size - start_size);
            p.position = kinematic_position(p.start_position, p.start_velocity, acceleration, p.age);
        }

        self.total_time_since_emit += dt;
        self.time_since_emit += dt;

        if self.window_open() && self.time_since_emit >= self.seconds_per_burst {
            let spb = self.seconds_per_burst;
            let remainder = self.time_since_emit % spb;
            let bursts = ((self.time_since_emit - remainder) / spb).round() as u64;
            self.time_since_emit = remainder;

            // Nothing dies while emitting, so bursts past one full ring are refused.
            let per_burst = self.config.particles_per_burst as usize;
            let fill = self.config.max_particles.div_ceil(per_burst.max(1)) as u64;
            for _ in 0..bursts.min(fill) {
                for _ in 0..per_burst {
                    self.spawn_particle();
                }
            }
        }
    }

    /// Restart the emission window. Living particles are left alone.
    pub fn reset(&mut self) {
        self.time_since_emit = 0.0;
        self.total_time_since_emit = 0.0;
    }

    /// Move the spawn point. Particles already in flight keep their own
    /// start positions.
    pub fn move_to(&mut self, position: Vec3) {
        self.position = position;
    }

    fn window_open(&self) -> bool {
        match self.config.emit_time {
            None => true,
            Some(limit) if limit == 0.0 => true,
            Some(limit) => self.total_time_since_emit < limit,
        }
    }

    /// Write a fresh particle into `first_dead`. Silently dropped when full.
    fn spawn_particle(&mut self) {
        let Some(slot) = self.ring.claim() else {
            return;
        };

        let c = &self.config;
        let rng = &mut self.rng;
        let velocity = Vec3::new(
            random_between(rng, c.velocity_min.x, c.velocity_max.x),
            random_between(rng, c.velocity_min.y, c.velocity_max.y),
            random_between(rng, c.velocity_min.z, c.velocity_max.z),
        );

        self.particles[slot] = Particle {
            position: self.position,
            color: c.start_color,
            start_position: self.position,
            start_velocity: velocity,
            size: c.start_size,
            rotation: random_between(rng, c.rotation_min, c.rotation_max),
            rotational_velocity: random_between(
                rng,
                c.rotational_velocity_min,
                c.rotational_velocity_max,
            ),
            age: 0.0,
        };
        self.spawned += 1;
    }

    // ── Vertex data ─────────────────────────────────────────────────────

    /// Copy every alive particle into its four staging corners. UVs are
    /// left untouched.
    pub fn repack_vertices(&mut self) {
        for slot in self.ring.slots() {
            let p = &self.particles[slot];
            let first = slot * 4;
            for corner in &mut self.vertices[first..first + 4] {
                corner.position = p.position.to_array();
                corner.color = p.color.to_array();
                corner.size = p.size;
                corner.rotation = p.rotation;
            }
        }
    }

    /// Index ranges to draw this frame: one when the alive region is
    /// contiguous, two when it wraps, none when empty.
    pub fn draw_ranges(&self) -> [Option<Range<u32>>; 2] {
        self.ring.index_ranges(6)
    }

    // ── GPU ─────────────────────────────────────────────────────────────

    /// Repack, creating the GPU buffers on first use, and stream the whole
    /// staging array to the vertex buffer.
    pub fn prepare_gpu(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        self.repack_vertices();
        let buffers = self
            .gpu
            .get_or_insert_with(|| QuadBuffers::new(device, &self.vertices, &self.indices));
        buffers.upload(queue, &self.vertices);
    }

    /// Issue this emitter's indexed draws. Returns the number of draw calls.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) -> u32 {
        match &self.gpu {
            Some(buffers) => buffers.draw(pass, self.draw_ranges()),
            None => 0,
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn max_particles(&self) -> usize {
        self.config.max_particles
    }

    pub fn living(&self) -> usize {
        self.ring.living()
    }

    pub fn ring(&self) -> &AliveRing {
        &self.ring
    }

    /// Total particles spawned since construction (refused spawns excluded).
    pub fn spawned_total(&self) -> u64 {
        self.spawned
    }

    /// Alive particles, oldest first.
    pub fn alive(&self) -> impl Iterator<Item = &Particle> {
        self.ring.slots().map(|slot| &self.particles[slot])
    }

    pub fn vertices(&self) -> &[ParticleVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    pub fn set_texture(&mut self, texture: TextureHandle) {
        self.texture = texture;
    }
}

/// `start + velocity·t + ½·acceleration·t²`.
pub fn kinematic_position(start: Vec3, velocity: Vec3, acceleration: Vec3, t: f32) -> Vec3 {
    start + velocity * t + 0.5 * acceleration * t * t
}

/// Uniform sample in `[min, max]`. Tolerates `min > max`.
fn random_between(rng: &mut StdRng, min: f32, max: f32) -> f32 {
    min + rng.random::<f32>() * (max - min)
}
