//! # Texture — Image Data for Materials, Particles and the Sky
//!
//! Handle-based store, like the mesh store. Four entries are reserved and
//! generated procedurally, so every lookup has something to bind even when
//! no image files exist:
//!
//! | Handle        | Contents                          | Color space |
//! |---------------|-----------------------------------|-------------|
//! | `WHITE`       | 1x1 white                         | sRGB        |
//! | `FLAT_NORMAL` | 1x1 `(0.5, 0.5, 1.0)`             | linear      |
//! | `CHECKER`     | 64x64 gray checkerboard           | sRGB        |
//! | `PARTICLE`    | 64x64 soft radial dot             | sRGB        |
//!
//! Each entry keeps a view plus a ready-made single-texture bind group
//! (texture + shared sampler). Particles and icons bind that group directly;
//! materials combine two views into their own group instead.
//!
//! Normal maps hold vectors, not colors, so they are uploaded as
//! `Rgba8Unorm` rather than `Rgba8UnormSrgb`.
//!
//! ## Comparison
//!
//! - **Bevy**: `AssetServer` with typed `Handle<Image>` and async loading.
//! - **Our approach**: synchronous, index-based, with path deduplication and
//!   procedural fallbacks.

use std::collections::HashMap;
use std::path::Path;

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};
use wgpu::util::DeviceExt;

use crate::error::{KilnError, Result};

/// Handle to a texture in the [`TextureStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub(crate) usize);

impl TextureHandle {
    pub const WHITE: Self = Self(0);
    pub const FLAT_NORMAL: Self = Self(1);
    pub const CHECKER: Self = Self(2);
    pub const PARTICLE: Self = Self(3);

    /// Prefix that names a reserved texture instead of a file, e.g.
    /// `"builtin:checker"`.
    pub const BUILTIN_PREFIX: &'static str = "builtin:";

    /// Reserved handle for a `builtin:` name.
    pub fn builtin(name: &str) -> Option<Self> {
        match name.strip_prefix(Self::BUILTIN_PREFIX)? {
            "white" => Some(Self::WHITE),
            "flat_normal" => Some(Self::FLAT_NORMAL),
            "checker" => Some(Self::CHECKER),
            "particle" => Some(Self::PARTICLE),
            _ => None,
        }
    }
}

/// How texel values are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    /// Colors authored in sRGB (albedo, particles, icons, sky).
    Srgb,
    /// Raw data (normal maps).
    Linear,
}

impl ColorSpace {
    pub fn format(self) -> wgpu::TextureFormat {
        match self {
            ColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            ColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

pub struct TextureEntry {
    pub view: wgpu::TextureView,
    /// Texture at binding 0, sampler at binding 1.
    pub bind_group: wgpu::BindGroup,
    pub width: u32,
    pub height: u32,
}

pub struct TextureStore {
    entries: Vec<TextureEntry>,
    path_cache: HashMap<(String, ColorSpace), TextureHandle>,
    sampler: wgpu::Sampler,
    layout: wgpu::BindGroupLayout,
}

impl TextureStore {
    /// Create the store with the four reserved procedural textures.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("texture sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let layout = single_texture_layout(device);

        let mut store = Self {
            entries: Vec::new(),
            path_cache: HashMap::new(),
            sampler,
            layout,
        };

        store.upload_rgba8(device, queue, "white 1x1", 1, 1, &[255, 255, 255, 255], ColorSpace::Srgb);
        store.upload_rgba8(device, queue, "flat normal 1x1", 1, 1, &FLAT_NORMAL_RGBA, ColorSpace::Linear);
        store.upload_rgba8(device, queue, "checker", 64, 64, &checker_rgba(64, 8), ColorSpace::Srgb);
        store.upload_rgba8(device, queue, "particle dot", 64, 64, &particle_dot_rgba(64), ColorSpace::Srgb);
        debug_assert_eq!(store.entries.len(), 4);

        store
    }

    /// Upload raw RGBA8 data.
    pub fn upload_rgba8(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        width: u32,
        height: u32,
        data: &[u8],
        space: ColorSpace,
    ) -> TextureHandle {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: space.format(),
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let handle = TextureHandle(self.entries.len());
        self.entries.push(TextureEntry {
            view,
            bind_group,
            width,
            height,
        });
        handle
    }

    /// Decode an image file and upload it. Repeated paths return the cached
    /// handle.
    pub fn load(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, path: &str, space: ColorSpace) -> Result<TextureHandle> {
        let key = (path.to_owned(), space);
        if let Some(&handle) = self.path_cache.get(&key) {
            return Ok(handle);
        }

        let (width, height, data) = decode_rgba8(Path::new(path))?;
        let handle = self.upload_rgba8(device, queue, path, width, height, &data, space);
        self.path_cache.insert(key, handle);
        log::info!("Loaded texture '{path}' ({width}x{height})");
        Ok(handle)
    }

    /// [`load`](Self::load) a texture if a path is given, falling back to a
    /// reserved handle when there is none or it fails.
    pub fn load_or(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: Option<&str>,
        space: ColorSpace,
        fallback: TextureHandle,
    ) -> TextureHandle {
        let Some(path) = path else {
            return fallback;
        };
        if let Some(handle) = TextureHandle::builtin(path) {
            return handle;
        }
        self.load(device, queue, path, space).unwrap_or_else(|e| {
            log::warn!("{e}; using procedural fallback");
            fallback
        })
    }

    pub fn get(&self, handle: TextureHandle) -> &TextureEntry {
        &self.entries[handle.0]
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// Layout of every entry's single-texture bind group.
    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }
}

/// Texture at binding 0 + filtering sampler at binding 1, fragment stage.
pub fn single_texture_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("single texture layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

fn decode_rgba8(path: &Path) -> Result<(u32, u32, Vec<u8>)> {
    let img = image::open(path)
        .map_err(|source| KilnError::Texture {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    let (width, height) = img.dimensions();
    Ok((width, height, img.into_raw()))
}

// ── Procedural textures ─────────────────────────────────────────────────

/// Tangent-space "straight up" normal.
pub const FLAT_NORMAL_RGBA: [u8; 4] = [128, 128, 255, 255];

/// Square checkerboard with `cells` cells per side.
pub fn checker_rgba(size: u32, cells: u32) -> Vec<u8> {
    let cell = (size / cells.max(1)).max(1);
    let mut data = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let light = ((x / cell) + (y / cell)) % 2 == 0;
            let v = if light { 200 } else { 90 };
            data.extend_from_slice(&[v, v, v, 255]);
        }
    }
    data
}

/// White dot whose brightness and alpha fall off as `(1 - r)²` from the
/// center to the inscribed circle.
pub fn particle_dot_rgba(size: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity((size * size * 4) as usize);
    let half = size as f32 * 0.5;
    for y in 0..size {
        for x in 0..size {
            let dx = (x as f32 + 0.5 - half) / half;
            let dy = (y as f32 + 0.5 - half) / half;
            let r = (dx * dx + dy * dy).sqrt();
            let falloff = (1.0 - r).clamp(0.0, 1.0).powi(2);
            let v = (falloff * 255.0).round() as u8;
            data.extend_from_slice(&[v, v, v, v]);
        }
    }
    data
}

// ── Cube maps ───────────────────────────────────────────────────────────

/// Colors of the procedural sky.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyGradient {
    pub zenith: Vec3,
    pub horizon: Vec3,
    pub ground: Vec3,
}

impl Default for SkyGradient {
    fn default() -> Self {
        Self {
            zenith: Vec3::new(0.10, 0.22, 0.55),
            horizon: Vec3::new(0.70, 0.78, 0.90),
            ground: Vec3::new(0.20, 0.18, 0.16),
        }
    }
}

/// World direction through texel `(s, t)` (both in `0..1`) of cube face
/// `face`, in the +X, -X, +Y, -Y, +Z, -Z layer order wgpu uses.
pub fn cube_face_direction(face: usize, s: f32, t: f32) -> Vec3 {
    let (u, v) = (2.0 * s - 1.0, 2.0 * t - 1.0);
    let dir = match face {
        0 => Vec3::new(1.0, -v, -u),
        1 => Vec3::new(-1.0, -v, u),
        2 => Vec3::new(u, 1.0, v),
        3 => Vec3::new(u, -1.0, -v),
        4 => Vec3::new(u, -v, 1.0),
        _ => Vec3::new(-u, -v, -1.0),
    };
    dir.normalize()
}

/// Six RGBA8 faces of a vertical gradient sky.
pub fn procedural_sky(size: u32, gradient: &SkyGradient) -> Vec<Vec<u8>> {
    (0..6)
        .map(|face| {
            let mut data = Vec::with_capacity((size * size * 4) as usize);
            for y in 0..size {
                for x in 0..size {
                    let s = (x as f32 + 0.5) / size as f32;
                    let t = (y as f32 + 0.5) / size as f32;
                    let height = cube_face_direction(face, s, t).y;
                    let c = if height >= 0.0 {
                        gradient.horizon.lerp(gradient.zenith, height)
                    } else {
                        gradient.horizon.lerp(gradient.ground, (-height * 4.0).min(1.0))
                    };
                    let rgba = (Vec4::from((c, 1.0)) * 255.0).round();
                    data.extend_from_slice(&[rgba.x as u8, rgba.y as u8, rgba.z as u8, 255]);
                }
            }
            data
        })
        .collect()
}

/// Decode six same-sized square face images (+X, -X, +Y, -Y, +Z, -Z).
pub fn load_cube_faces(paths: &[String; 6]) -> Result<(u32, Vec<Vec<u8>>)> {
    let mut size = None;
    let mut faces = Vec::with_capacity(6);
    for path in paths {
        let path = Path::new(path);
        let (w, h, data) = decode_rgba8(path)?;
        let expected = *size.get_or_insert((w, w));
        if (w, h) != expected {
            return Err(KilnError::CubemapFaceSize {
                path: path.to_path_buf(),
                expected,
                actual: (w, h),
            });
        }
        faces.push(data);
    }
    Ok((size.map_or(1, |(w, _)| w), faces))
}

/// Upload six faces as a cube texture and return a cube view.
pub fn create_cubemap(device: &wgpu::Device, queue: &wgpu::Queue, size: u32, faces: &[Vec<u8>]) -> wgpu::TextureView {
    let data: Vec<u8> = faces.concat();
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some("skybox cubemap"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: ColorSpace::Srgb.format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &data,
    );
    texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("skybox cube view"),
        dimension: Some(wgpu::TextureViewDimension::Cube),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texel(data: &[u8], size: u32, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * size + x) * 4) as usize;
        [data[i], data[i + 1], data[i + 2], data[i + 3]]
    }

    #[test]
    fn builtin_names_resolve_to_reserved_handles() {
        assert_eq!(TextureHandle::builtin("builtin:checker"), Some(TextureHandle::CHECKER));
        assert_eq!(TextureHandle::builtin("builtin:particle"), Some(TextureHandle::PARTICLE));
        assert_eq!(TextureHandle::builtin("builtin:nope"), None);
        assert_eq!(TextureHandle::builtin("assets/checker.png"), None);
    }

    #[test]
    fn checker_alternates_cells() {
        let data = checker_rgba(8, 2);
        assert_eq!(data.len(), 8 * 8 * 4);
        assert_eq!(texel(&data, 8, 0, 0), [200, 200, 200, 255]);
        assert_eq!(texel(&data, 8, 4, 0), [90, 90, 90, 255]);
        assert_eq!(texel(&data, 8, 4, 4), [200, 200, 200, 255]);
    }

    #[test]
    fn particle_dot_is_bright_in_the_middle_and_clear_at_the_corners() {
        let data = particle_dot_rgba(32);
        let center = texel(&data, 32, 16, 16);
        let corner = texel(&data, 32, 0, 0);
        assert!(center[3] > 200, "center alpha {}", center[3]);
        assert_eq!(corner, [0, 0, 0, 0]);
    }

    #[test]
    fn cube_face_centers_point_along_axes() {
        let axes = [Vec3::X, -Vec3::X, Vec3::Y, -Vec3::Y, Vec3::Z, -Vec3::Z];
        for (face, axis) in axes.iter().enumerate() {
            let d = cube_face_direction(face, 0.5, 0.5);
            assert!((d - *axis).length() < 1e-6, "face {face} center is {d:?}");
        }
    }

    #[test]
    fn side_faces_have_up_at_the_top_row() {
        for face in [0, 1, 4, 5] {
            assert!(cube_face_direction(face, 0.5, 0.0).y > 0.0, "face {face}");
        }
    }

    #[test]
    fn procedural_sky_is_blue_above_and_dark_below() {
        let gradient = SkyGradient::default();
        let faces = procedural_sky(4, &gradient);
        assert_eq!(faces.len(), 6);
        let top = texel(&faces[2], 4, 2, 2);
        let bottom = texel(&faces[3], 4, 2, 2);
        assert!(top[2] > top[0], "zenith should be blue: {top:?}");
        assert!(bottom[2] < top[2]);
    }
}
