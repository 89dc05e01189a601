//! # Vertex and Uniform Layouts
//!
//! ## Mesh Vertex
//!
//! ```text
//! MeshVertex (48 bytes)
//! ┌────────────┬────────────┬──────────┬──────────────┐
//! │ position   │ normal     │ uv       │ tangent      │
//! │ [f32; 3]   │ [f32; 3]   │ [f32; 2] │ [f32; 4]     │
//! │ offset 0   │ offset 12  │ offset 24│ offset 32    │
//! │ location 0 │ location 1 │ loc 2    │ location 3   │
//! └────────────┴────────────┴──────────┴──────────────┘
//! ```
//!
//! The tangent's `w` holds the bitangent sign (`±1`), as in glTF, so the
//! geometry shader can rebuild the TBN basis for normal mapping.
//!
//! ## Uniforms
//!
//! ```text
//! Group 0 — Camera (per frame)       view, proj, view_proj, inverse, sky
//! Group 1 — Material (per material)  tint + uv scale, albedo, normal map
//! Group 2 — Model (per entity)       dynamic offset into one buffer
//!
//! Lighting pass:
//! Group 0 — Camera
//! Group 1 — G-buffer inputs          normal + scene depth
//! Group 2 — Light (per light)        dynamic offset into one buffer
//! ```
//!
//! Every struct here is `#[repr(C)]` + `Pod` and padded by hand to WGSL's
//! 16-byte uniform alignment.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub tangent: [f32; 4],
}

impl MeshVertex {
    /// Vertex with a placeholder tangent, filled in later by
    /// [`compute_tangents`](super::shapes::compute_tangents).
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
            tangent: [1.0, 0.0, 0.0, 1.0],
        }
    }

    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
            wgpu::VertexAttribute {
                offset: 32,
                shader_location: 3,
                format: wgpu::VertexFormat::Float32x4,
            },
        ],
    };
}

/// Per-frame camera data shared by every pass.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    /// Clip space back to world space, for position reconstruction.
    pub inv_view_proj: [[f32; 4]; 4],
    /// View-projection with the translation stripped (skybox).
    pub sky_view_proj: [[f32; 4]; 4],
    pub position: [f32; 3],
    pub _pad0: f32,
    pub screen_size: [f32; 2],
    pub _pad1: [f32; 2],
}

impl CameraUniform {
    pub fn new(view: Mat4, proj: Mat4, sky_view_proj: Mat4, position: Vec3, size: (u32, u32)) -> Self {
        let view_proj = proj * view;
        Self {
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            view_proj: view_proj.to_cols_array_2d(),
            inv_view_proj: view_proj.inverse().to_cols_array_2d(),
            sky_view_proj: sky_view_proj.to_cols_array_2d(),
            position: position.to_array(),
            _pad0: 0.0,
            screen_size: [size.0 as f32, size.1 as f32],
            _pad1: [0.0; 2],
        }
    }
}

/// Per-entity transform, written at an aligned dynamic offset.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
}

/// Per-material shader parameters.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MaterialUniform {
    pub tint: [f32; 4],
    pub uv_scale: [f32; 2],
    pub _pad: [f32; 2],
}

pub const LIGHT_KIND_DIRECTIONAL: u32 = 0;
pub const LIGHT_KIND_POINT: u32 = 1;

/// Per-light data for one lighting draw.
///
/// `position_range` holds the point light position and range; for a
/// directional light `xyz` is the (normalized) direction the light travels
/// and `w` is unused.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightUniform {
    pub world: [[f32; 4]; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub position_range: [f32; 4],
    pub kind: u32,
    pub _pad: [u32; 3],
}
