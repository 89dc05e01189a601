//! # Dynamic Uniform Buffers
//!
//! Per-entity and per-light data live in one buffer each, one record per
//! draw at an aligned stride:
//!
//! ```text
//! offset 0        stride         2·stride
//! ┌──────────────┬──────────────┬──────────────┬─ ─ ─
//! │ record 0 pad │ record 1 pad │ record 2 pad │
//! └──────────────┴──────────────┴──────────────┴─ ─ ─
//! ```
//!
//! The stride is the record size rounded up to
//! `min_uniform_buffer_offset_alignment` (usually 256). A draw binds the
//! shared bind group with the byte offset of its record. The buffer grows to
//! the next power of two when a frame needs more records, and never shrinks.

use std::marker::PhantomData;

use bytemuck::Pod;

/// Round `value` up to the next multiple of `align` (a power of two).
pub fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

/// Copy `items` into a byte vector, one per `stride` bytes.
pub fn pack_aligned<T: Pod>(items: &[T], stride: usize) -> Vec<u8> {
    let mut data = vec![0u8; stride * items.len()];
    for (i, item) in items.iter().enumerate() {
        let bytes = bytemuck::bytes_of(item);
        data[i * stride..i * stride + bytes.len()].copy_from_slice(bytes);
    }
    data
}

/// Layout with one dynamic-offset uniform at binding 0.
pub fn dynamic_uniform_layout<T>(
    device: &wgpu::Device,
    label: &str,
    visibility: wgpu::ShaderStages,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<T>() as u64),
            },
            count: None,
        }],
    })
}

pub struct DynamicUniform<T> {
    label: &'static str,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    capacity: usize,
    stride: usize,
    _record: PhantomData<T>,
}

impl<T: Pod> DynamicUniform<T> {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &'static str, capacity: usize) -> Self {
        let align = device.limits().min_uniform_buffer_offset_alignment as usize;
        let stride = align_up(std::mem::size_of::<T>(), align);
        let capacity = capacity.max(1);
        let (buffer, bind_group) = create_buffer::<T>(device, layout, label, stride, capacity);
        Self {
            label,
            buffer,
            bind_group,
            capacity,
            stride,
            _record: PhantomData,
        }
    }

    /// Write `items` starting at record 0, growing the buffer first if
    /// needed. The bind group is replaced when the buffer grows.
    pub fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, layout: &wgpu::BindGroupLayout, items: &[T]) {
        if items.is_empty() {
            return;
        }
        if items.len() > self.capacity {
            let capacity = items.len().next_power_of_two();
            let (buffer, bind_group) = create_buffer::<T>(device, layout, self.label, self.stride, capacity);
            log::debug!("{} grown to {capacity} records", self.label);
            self.buffer = buffer;
            self.bind_group = bind_group;
            self.capacity = capacity;
        }
        queue.write_buffer(&self.buffer, 0, &pack_aligned(items, self.stride));
    }

    /// Dynamic offset of record `index`.
    pub fn offset(&self, index: usize) -> u32 {
        (index * self.stride) as u32
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

fn create_buffer<T>(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    label: &str,
    stride: usize,
    capacity: usize,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: (stride * capacity) as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: wgpu::BufferSize::new(std::mem::size_of::<T>() as u64),
            }),
        }],
    });
    (buffer, bind_group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::vertex::{LightUniform, ModelUniform};

    #[test]
    fn align_up_rounds_to_multiples() {
        assert_eq!(align_up(0, 256), 0);
        assert_eq!(align_up(1, 256), 256);
        assert_eq!(align_up(128, 256), 256);
        assert_eq!(align_up(256, 256), 256);
        assert_eq!(align_up(257, 256), 512);
        assert_eq!(align_up(48, 16), 48);
    }

    #[test]
    fn packed_records_start_on_stride_boundaries() {
        let records = [[1.0f32; 4], [2.0; 4], [3.0; 4]];
        let data = pack_aligned(&records, 256);
        assert_eq!(data.len(), 768);
        for (i, record) in records.iter().enumerate() {
            let start = i * 256;
            let back: [f32; 4] = bytemuck::pod_read_unaligned(&data[start..start + 16]);
            assert_eq!(&back, record);
            assert!(data[start + 16..start + 256].iter().all(|b| *b == 0), "padding stays zero");
        }
    }

    #[test]
    fn uniform_records_fit_one_default_stride() {
        assert!(std::mem::size_of::<ModelUniform>() <= 256);
        assert!(std::mem::size_of::<LightUniform>() <= 256);
    }
}
