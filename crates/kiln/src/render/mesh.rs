//! # Mesh — GPU Mesh Storage
//!
//! Users hold a [`MeshHandle`], a plain index into the [`MeshStore`]. The
//! store uploads the built-in shapes when it is created:
//!
//! | Handle | Shape    | Used by                          |
//! |--------|----------|----------------------------------|
//! | 0      | Cube     | entities                         |
//! | 1      | Plane    | entities                         |
//! | 2      | Sphere   | entities, light volumes, skybox  |
//! | 3      | Cylinder | entities                         |
//! | 4      | Cone     | entities                         |
//! | 5      | Torus    | entities                         |
//!
//! Meshes loaded from glTF files are appended after the built-ins.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use wgpu::util::DeviceExt;

use super::shapes;
use super::vertex::MeshVertex;

/// Handle to a mesh in the [`MeshStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub(crate) usize);

impl MeshHandle {
    pub const CUBE: Self = Self(0);
    pub const PLANE: Self = Self(1);
    pub const SPHERE: Self = Self(2);
    pub const CYLINDER: Self = Self(3);
    pub const CONE: Self = Self(4);
    pub const TORUS: Self = Self(5);
}

/// Where an entity's mesh comes from, as written in the scene config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshSource {
    Cube,
    Plane,
    Sphere,
    Cylinder,
    Cone,
    Torus,
    /// A `.gltf`/`.glb` file; every primitive is merged into one mesh.
    Gltf(String),
}

impl MeshSource {
    /// Handle of the matching built-in shape, if any.
    pub fn builtin(&self) -> Option<MeshHandle> {
        match self {
            MeshSource::Cube => Some(MeshHandle::CUBE),
            MeshSource::Plane => Some(MeshHandle::PLANE),
            MeshSource::Sphere => Some(MeshHandle::SPHERE),
            MeshSource::Cylinder => Some(MeshHandle::CYLINDER),
            MeshSource::Cone => Some(MeshHandle::CONE),
            MeshSource::Torus => Some(MeshHandle::TORUS),
            MeshSource::Gltf(_) => None,
        }
    }
}

/// A mesh uploaded to GPU buffers.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    /// Bind the buffers and draw the whole mesh.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// All uploaded meshes, built-ins first.
pub struct MeshStore {
    meshes: Vec<GpuMesh>,
    path_cache: HashMap<String, MeshHandle>,
}

impl MeshStore {
    pub fn new(device: &wgpu::Device) -> Self {
        let mut store = Self {
            meshes: Vec::new(),
            path_cache: HashMap::new(),
        };

        let builtins: [(&str, shapes::MeshData); 6] = [
            ("cube", shapes::cube()),
            ("plane", shapes::plane()),
            ("sphere", shapes::sphere(32, 16)),
            ("cylinder", shapes::cylinder(0.5, 0.5, 32)),
            ("cone", shapes::cone(0.5, 0.5, 32)),
            ("torus", shapes::torus(0.35, 0.15, 48, 24)),
        ];
        for (label, (vertices, indices)) in builtins {
            store.upload(device, label, &vertices, &indices);
        }

        store
    }

    /// Upload mesh data and return its handle.
    pub fn upload(&mut self, device: &wgpu::Device, label: &str, vertices: &[MeshVertex], indices: &[u32]) -> MeshHandle {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} vertex buffer")),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} index buffer")),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let handle = MeshHandle(self.meshes.len());
        self.meshes.push(GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        });
        handle
    }

    /// Resolve a config mesh source. Files that fail to load fall back to
    /// the cube with a warning.
    pub fn resolve(&mut self, device: &wgpu::Device, source: &MeshSource) -> MeshHandle {
        match source {
            MeshSource::Gltf(path) => {
                if let Some(&handle) = self.path_cache.get(path) {
                    return handle;
                }
                match load_file(Path::new(path)) {
                    Ok((vertices, indices)) => {
                        let handle = self.upload(device, path, &vertices, &indices);
                        log::info!("Loaded mesh '{path}' ({} vertices)", vertices.len());
                        self.path_cache.insert(path.clone(), handle);
                        handle
                    }
                    Err(e) => {
                        log::warn!("{e}; using cube");
                        MeshHandle::CUBE
                    }
                }
            }
            builtin => builtin.builtin().unwrap_or(MeshHandle::CUBE),
        }
    }

    pub fn get(&self, handle: MeshHandle) -> &GpuMesh {
        &self.meshes[handle.0]
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

#[cfg(feature = "gltf")]
fn load_file(path: &Path) -> crate::error::Result<shapes::MeshData> {
    super::gltf::load_mesh(path)
}

#[cfg(not(feature = "gltf"))]
fn load_file(path: &Path) -> crate::error::Result<shapes::MeshData> {
    Err(crate::error::KilnError::Mesh {
        path: path.to_path_buf(),
        reason: "built without the `gltf` feature".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_sources_map_to_fixed_handles() {
        assert_eq!(MeshSource::Sphere.builtin(), Some(MeshHandle::SPHERE));
        assert_eq!(MeshSource::Torus.builtin(), Some(MeshHandle::TORUS));
        assert_eq!(MeshSource::Gltf("a.glb".into()).builtin(), None);
    }

    #[test]
    fn mesh_source_json_forms() {
        let cube: MeshSource = serde_json::from_str(r#""cube""#).unwrap();
        assert_eq!(cube, MeshSource::Cube);
        let file: MeshSource = serde_json::from_str(r#"{ "gltf": "assets/ship.glb" }"#).unwrap();
        assert_eq!(file, MeshSource::Gltf("assets/ship.glb".into()));
    }
}
