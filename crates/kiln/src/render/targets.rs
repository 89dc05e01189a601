//! # Render Targets — The G-Buffer
//!
//! ```text
//!              written by          read by
//! color      ─ Geometry          ─ Combine
//! normal     ─ Geometry          ─ Lighting
//! lighting   ─ Lighting (add)    ─ Combine
//! depth      ─ Geometry          ─ Lighting, tested by Combine/Skybox/Particles
//! light_depth  (cleared only)    ─ tested by Lighting
//! ```
//!
//! Everything is sized to the surface and rebuilt on resize, together with
//! the two input bind groups that expose targets to later passes.

pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
pub const NORMAL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const LIGHTING_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub struct GBuffer {
    pub color: wgpu::TextureView,
    pub normal: wgpu::TextureView,
    pub lighting: wgpu::TextureView,
    pub depth: wgpu::TextureView,
    pub light_depth: wgpu::TextureView,
    /// normal (0) + depth (1), for the lighting pass.
    pub lighting_inputs: wgpu::BindGroup,
    /// color (0) + lighting (1), for the combine pass.
    pub combine_inputs: wgpu::BindGroup,
    pub size: (u32, u32),
}

impl GBuffer {
    pub fn new(
        device: &wgpu::Device,
        size: (u32, u32),
        lighting_layout: &wgpu::BindGroupLayout,
        combine_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let color = create_target(device, "gbuffer color", size, COLOR_FORMAT);
        let normal = create_target(device, "gbuffer normal", size, NORMAL_FORMAT);
        let lighting = create_target(device, "gbuffer lighting", size, LIGHTING_FORMAT);
        let depth = create_target(device, "scene depth", size, DEPTH_FORMAT);
        let light_depth = create_target(device, "lighting depth", size, DEPTH_FORMAT);

        let lighting_inputs = two_view_bind_group(device, "lighting inputs", lighting_layout, &normal, &depth);
        let combine_inputs = two_view_bind_group(device, "combine inputs", combine_layout, &color, &lighting);

        Self {
            color,
            normal,
            lighting,
            depth,
            light_depth,
            lighting_inputs,
            combine_inputs,
            size,
        }
    }

    /// Rebuild every target if the size changed. Zero sizes are ignored.
    pub fn resize_if_needed(
        &mut self,
        device: &wgpu::Device,
        size: (u32, u32),
        lighting_layout: &wgpu::BindGroupLayout,
        combine_layout: &wgpu::BindGroupLayout,
    ) -> bool {
        if size == self.size || size.0 == 0 || size.1 == 0 {
            return false;
        }
        *self = Self::new(device, size, lighting_layout, combine_layout);
        true
    }
}

/// Layout for the lighting pass inputs: unfilterable normal + depth,
/// read with `textureLoad`.
pub fn lighting_inputs_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("lighting inputs layout"),
        entries: &[
            texture_entry(0, wgpu::TextureSampleType::Float { filterable: false }),
            texture_entry(1, wgpu::TextureSampleType::Depth),
        ],
    })
}

/// Layout for the combine pass inputs: color + lighting, read with
/// `textureLoad`.
pub fn combine_inputs_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("combine inputs layout"),
        entries: &[
            texture_entry(0, wgpu::TextureSampleType::Float { filterable: false }),
            texture_entry(1, wgpu::TextureSampleType::Float { filterable: false }),
        ],
    })
}

fn texture_entry(binding: u32, sample_type: wgpu::TextureSampleType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type,
        },
        count: None,
    }
}

fn create_target(device: &wgpu::Device, label: &str, size: (u32, u32), format: wgpu::TextureFormat) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: size.0.max(1),
            height: size.1.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn two_view_bind_group(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    first: &wgpu::TextureView,
    second: &wgpu::TextureView,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(first),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(second),
            },
        ],
    })
}
