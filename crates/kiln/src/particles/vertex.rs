//! # Particle Vertex — One Quad Corner
//!
//! Every particle is a camera-facing quad, but the CPU never computes the
//! corners. All four vertices of a quad carry the *same* center, size, color
//! and rotation. Only the UV differs, and the vertex shader turns the UV into
//! a corner offset:
//!
//! ```text
//!   uv (0,0) ──── (1,0)        offset = (uv * 2 - 1) * (1, -1)
//!     │             │          offset = rotate(offset, rotation)
//!     │   center    │          view_pos += offset * size * 0.5
//!     │             │
//!   uv (0,1) ──── (1,1)
//! ```
//!
//! ## Memory Layout
//!
//! ```text
//! ParticleVertex (44 bytes)
//! ┌────────────┬──────────┬────────────┬────────┬──────────┐
//! │ position   │ uv       │ color      │ size   │ rotation │
//! │ [f32; 3]   │ [f32; 2] │ [f32; 4]   │ f32    │ f32      │
//! │ offset 0   │ offset 12│ offset 20  │ off 36 │ off 40   │
//! │ location 0 │ loc 1    │ loc 2      │ loc 3  │ loc 4    │
//! └────────────┴──────────┴────────────┴────────┴──────────┘
//! ```
//!
//! UVs are written once when the staging array is allocated and never touched
//! again; the per-frame repack only overwrites the other four fields.

use bytemuck::{Pod, Zeroable};

/// Corner UVs in quad order. Index pattern `0,1,2, 0,2,3` makes two
/// triangles out of them.
pub const QUAD_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

/// Index offsets of the two triangles inside one quad.
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ParticleVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 4],
    pub size: f32,
    pub rotation: f32,
}

impl ParticleVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<ParticleVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position: vec3<f32>
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv: vec2<f32>
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
            // color: vec4<f32>
            wgpu::VertexAttribute {
                offset: 20,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x4,
            },
            // size: f32
            wgpu::VertexAttribute {
                offset: 36,
                shader_location: 3,
                format: wgpu::VertexFormat::Float32,
            },
            // rotation: f32
            wgpu::VertexAttribute {
                offset: 40,
                shader_location: 4,
                format: wgpu::VertexFormat::Float32,
            },
        ],
    };
}

/// Staging array for `quads` quads with the corner UVs already in place.
pub fn quad_staging(quads: usize) -> Vec<ParticleVertex> {
    (0..quads * 4)
        .map(|i| ParticleVertex {
            uv: QUAD_UVS[i % 4],
            ..ParticleVertex::zeroed()
        })
        .collect()
}

/// Index data for `quads` quads: `4i, 4i+1, 4i+2, 4i, 4i+2, 4i+3`.
pub fn quad_indices(quads: usize) -> Vec<u32> {
    let mut indices = Vec::with_capacity(quads * 6);
    for quad in 0..quads as u32 {
        let base = quad * 4;
        indices.extend(QUAD_INDICES.iter().map(|i| base + i));
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_44_bytes() {
        assert_eq!(std::mem::size_of::<ParticleVertex>(), 44);
    }

    #[test]
    fn staging_has_fixed_corner_uvs() {
        let staging = quad_staging(3);
        assert_eq!(staging.len(), 12);
        for (i, v) in staging.iter().enumerate() {
            assert_eq!(v.uv, QUAD_UVS[i % 4], "vertex {i} has the wrong corner uv");
        }
    }

    #[test]
    fn indices_describe_two_triangles_per_quad() {
        let indices = quad_indices(2);
        assert_eq!(indices, vec![0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7]);
    }

    #[test]
    fn zero_quads_is_empty() {
        assert!(quad_staging(0).is_empty());
        assert!(quad_indices(0).is_empty());
    }
}
