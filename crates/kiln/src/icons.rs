//! # Icons — Light Gizmo Overlay
//!
//! A fixed-capacity batch of camera-facing quads drawn on top of the frame
//! (alpha blend, no depth test) so light positions stay visible. It is the
//! emitter's GPU path without the simulation: same [`ParticleVertex`]
//! layout, same staging array with fixed corner UVs, same [`QuadBuffers`].
//! Icons never die, so the live region is always `0..len` and one
//! `draw_indexed` covers it.

use std::ops::Range;

use glam::{Vec3, Vec4};

use crate::particles::gpu::QuadBuffers;
use crate::particles::vertex::{quad_indices, quad_staging, ParticleVertex};
use crate::render::texture::TextureHandle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Icon {
    pub position: Vec3,
    pub size: f32,
    pub color: Vec4,
}

pub struct IconBatch {
    capacity: usize,
    icons: Vec<Icon>,
    vertices: Vec<ParticleVertex>,
    indices: Vec<u32>,
    texture: TextureHandle,
    gpu: Option<QuadBuffers>,
}

impl IconBatch {
    pub fn new(capacity: usize, texture: TextureHandle) -> Self {
        Self {
            capacity,
            icons: Vec::with_capacity(capacity),
            vertices: quad_staging(capacity),
            indices: quad_indices(capacity),
            texture,
            gpu: None,
        }
    }

    /// Add an icon. Returns its index, or `None` when the batch is full.
    pub fn add(&mut self, icon: Icon) -> Option<usize> {
        if self.icons.len() >= self.capacity {
            return None;
        }
        self.icons.push(icon);
        Some(self.icons.len() - 1)
    }

    /// Size-1 icon tinted with the light's diffuse color.
    pub fn register_light(&mut self, position: Vec3, diffuse: Vec3) -> Option<usize> {
        self.add(Icon {
            position,
            size: 1.0,
            color: diffuse.extend(1.0),
        })
    }

    /// Move icon `index`. Out-of-range indices are ignored.
    pub fn set_position(&mut self, index: usize, position: Vec3) {
        if let Some(icon) = self.icons.get_mut(index) {
            icon.position = position;
        }
    }

    pub fn icons(&self) -> &[Icon] {
        &self.icons
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    pub fn vertices(&self) -> &[ParticleVertex] {
        &self.vertices
    }

    /// Write every icon into its four staging corners.
    pub fn repack_vertices(&mut self) {
        for (i, icon) in self.icons.iter().enumerate() {
            for corner in &mut self.vertices[i * 4..i * 4 + 4] {
                corner.position = icon.position.to_array();
                corner.color = icon.color.to_array();
                corner.size = icon.size;
                corner.rotation = 0.0;
            }
        }
    }

    pub fn draw_range(&self) -> Option<Range<u32>> {
        (!self.icons.is_empty()).then(|| 0..self.icons.len() as u32 * 6)
    }

    pub fn prepare_gpu(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        if self.capacity == 0 {
            return;
        }
        self.repack_vertices();
        let buffers = self
            .gpu
            .get_or_insert_with(|| QuadBuffers::new(device, &self.vertices, &self.indices));
        buffers.upload(queue, &self.vertices);
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) -> u32 {
        match &self.gpu {
            Some(buffers) => buffers.draw(pass, [self.draw_range(), None]),
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_beyond_capacity_is_dropped() {
        let mut batch = IconBatch::new(2, TextureHandle::PARTICLE);
        assert_eq!(batch.register_light(Vec3::ZERO, Vec3::ONE), Some(0));
        assert_eq!(batch.register_light(Vec3::X, Vec3::ONE), Some(1));
        assert_eq!(batch.register_light(Vec3::Y, Vec3::ONE), None);
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn draw_range_covers_registered_icons() {
        let mut batch = IconBatch::new(8, TextureHandle::PARTICLE);
        assert_eq!(batch.draw_range(), None);
        batch.register_light(Vec3::ZERO, Vec3::ONE);
        batch.register_light(Vec3::ONE, Vec3::ONE);
        assert_eq!(batch.draw_range(), Some(0..12));
    }

    #[test]
    fn set_position_moves_icon_into_vertices() {
        let mut batch = IconBatch::new(4, TextureHandle::PARTICLE);
        batch.register_light(Vec3::ZERO, Vec3::new(1.0, 0.2, 0.2));
        batch.set_position(0, Vec3::new(5.0, 1.0, 0.0));
        batch.set_position(7, Vec3::ONE);
        batch.repack_vertices();
        for v in &batch.vertices()[0..4] {
            assert_eq!(v.position, [5.0, 1.0, 0.0]);
            assert_eq!(v.size, 1.0);
            assert_eq!(v.color, [1.0, 0.2, 0.2, 1.0]);
        }
        assert_eq!(batch.vertices()[4].size, 0.0, "unused slots stay zeroed");
    }
}
