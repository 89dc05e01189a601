//! Materials: an albedo texture, a normal map, a tint and a UV scale.
//!
//! The scene config describes materials with file paths
//! ([`MaterialDesc`]); at setup they are resolved to texture handles
//! ([`Material`]) and then to one bind group each ([`GpuMaterial`]).
//! Nothing about a material changes after setup.

use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};
use wgpu::util::DeviceExt;

use crate::render::texture::{ColorSpace, TextureHandle, TextureStore};
use crate::render::vertex::MaterialUniform;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialDesc {
    /// Image file or `builtin:` name. Missing → checker.
    pub albedo: Option<String>,
    /// Tangent-space normal map. Missing → flat.
    pub normal_map: Option<String>,
    pub tint: Vec4,
    pub uv_scale: Vec2,
}

impl Default for MaterialDesc {
    fn default() -> Self {
        Self {
            albedo: None,
            normal_map: None,
            tint: Vec4::ONE,
            uv_scale: Vec2::ONE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub albedo: TextureHandle,
    pub normal: TextureHandle,
    pub tint: Vec4,
    pub uv_scale: Vec2,
}

impl Material {
    pub fn resolve(desc: &MaterialDesc, device: &wgpu::Device, queue: &wgpu::Queue, textures: &mut TextureStore) -> Self {
        Self {
            albedo: textures.load_or(device, queue, desc.albedo.as_deref(), ColorSpace::Srgb, TextureHandle::CHECKER),
            normal: textures.load_or(
                device,
                queue,
                desc.normal_map.as_deref(),
                ColorSpace::Linear,
                TextureHandle::FLAT_NORMAL,
            ),
            tint: desc.tint,
            uv_scale: desc.uv_scale,
        }
    }

    pub fn uniform(&self) -> MaterialUniform {
        MaterialUniform {
            tint: self.tint.to_array(),
            uv_scale: self.uv_scale.to_array(),
            _pad: [0.0; 2],
        }
    }
}

/// Uniform (0), albedo (1), normal map (2), sampler (3).
pub fn material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let texture = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    };

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("material layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            texture(1),
            texture(2),
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

/// GPU side of a [`Material`].
pub struct GpuMaterial {
    pub bind_group: wgpu::BindGroup,
    _buffer: wgpu::Buffer,
}

impl GpuMaterial {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, material: &Material, textures: &TextureStore) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("material uniform"),
            contents: bytemuck::bytes_of(&material.uniform()),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("material bind group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&textures.get(material.albedo).view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&textures.get(material.normal).view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(textures.sampler()),
                },
            ],
        });
        Self {
            bind_group,
            _buffer: buffer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_carries_tint_and_uv_scale() {
        let m = Material {
            albedo: TextureHandle::CHECKER,
            normal: TextureHandle::FLAT_NORMAL,
            tint: Vec4::new(0.5, 0.6, 0.7, 1.0),
            uv_scale: Vec2::new(25.0, 25.0),
        };
        let u = m.uniform();
        assert_eq!(u.tint, [0.5, 0.6, 0.7, 1.0]);
        assert_eq!(u.uv_scale, [25.0, 25.0]);
    }

    #[test]
    fn desc_defaults_to_untinted_unit_scale() {
        let d: MaterialDesc = serde_json::from_str(r#"{ "albedo": "builtin:checker" }"#).unwrap();
        assert_eq!(d.albedo.as_deref(), Some("builtin:checker"));
        assert_eq!(d.tint, Vec4::ONE);
        assert_eq!(d.uv_scale, Vec2::ONE);
        assert!(d.normal_map.is_none());
    }
}
