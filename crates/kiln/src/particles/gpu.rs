//! GPU side of a quad batch: one dynamic vertex buffer, one static index buffer.
//!
//! The vertex buffer is rewritten whole every frame with `Queue::write_buffer`.
//! wgpu stages the bytes and never reads the old contents back, which is the
//! same contract as a discard-on-map dynamic buffer. The index buffer is
//! filled at creation and never touched again.

use std::ops::Range;

use wgpu::util::DeviceExt;

use super::vertex::ParticleVertex;

/// Vertex and index buffers for a fixed number of billboard quads. Owned by
/// an [`Emitter`](super::Emitter) or an [`IconBatch`](crate::icons::IconBatch).
pub struct QuadBuffers {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
}

impl QuadBuffers {
    pub fn new(device: &wgpu::Device, vertices: &[ParticleVertex], indices: &[u32]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("particle vertex buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("particle index buffer"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
        }
    }

    /// Overwrite the whole vertex buffer with the staging array.
    pub fn upload(&self, queue: &wgpu::Queue, vertices: &[ParticleVertex]) {
        if vertices.is_empty() {
            return;
        }
        queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(vertices));
    }

    /// Bind both buffers and issue one indexed draw per range.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, ranges: [Option<Range<u32>>; 2]) -> u32 {
        let mut draws = 0;
        for range in ranges.into_iter().flatten() {
            if draws == 0 {
                pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            }
            pass.draw_indexed(range, 0, 0..1);
            draws += 1;
        }
        draws
    }
}
