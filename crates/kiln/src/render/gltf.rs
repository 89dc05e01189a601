//! # glTF — Loading Entity Meshes From Files
//!
//! Only geometry is read. Every primitive of every mesh in the document is
//! appended into one vertex/index list so an entity can reference the whole
//! file with a single [`MeshHandle`](super::mesh::MeshHandle). Materials come
//! from the scene config, not from the file.
//!
//! Missing attributes are filled in: normals default to +Y, UVs to `(0,0)`,
//! and tangents are computed from UVs when the file has none.

use std::path::Path;

use super::shapes::{compute_tangents, MeshData};
use super::vertex::MeshVertex;
use crate::error::{KilnError, Result};

/// Load and merge all mesh primitives from a `.gltf` or `.glb` file.
pub fn load_mesh(path: &Path) -> Result<MeshData> {
    let mesh_error = |reason: String| KilnError::Mesh {
        path: path.to_path_buf(),
        reason,
    };

    let (document, buffers, _images) = gltf::import(path).map_err(|e| mesh_error(e.to_string()))?;

    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let mut any_missing_tangents = false;

    for mesh in document.meshes() {
        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let Some(positions) = reader.read_positions() else {
                return Err(mesh_error("primitive has no POSITION attribute".into()));
            };
            let positions: Vec<[f32; 3]> = positions.collect();

            let normals: Vec<[f32; 3]> = reader
                .read_normals()
                .map(|iter| iter.collect())
                .unwrap_or_else(|| vec![[0.0, 1.0, 0.0]; positions.len()]);
            let uvs: Vec<[f32; 2]> = reader
                .read_tex_coords(0)
                .map(|iter| iter.into_f32().collect())
                .unwrap_or_else(|| vec![[0.0, 0.0]; positions.len()]);
            let tangents: Option<Vec<[f32; 4]>> = reader.read_tangents().map(|iter| iter.collect());
            any_missing_tangents |= tangents.is_none();

            let primitive_vertices: Vec<MeshVertex> = positions
                .iter()
                .enumerate()
                .map(|(i, &position)| {
                    let mut v = MeshVertex::new(position, normals[i], uvs[i]);
                    if let Some(t) = &tangents {
                        v.tangent = t[i];
                    }
                    v
                })
                .collect();

            // Unindexed primitives draw their vertices in order.
            let primitive_indices: Vec<u32> = match reader.read_indices() {
                Some(iter) => iter.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };

            append_primitive(&mut vertices, &mut indices, primitive_vertices, &primitive_indices);
        }
    }

    if vertices.is_empty() {
        return Err(mesh_error("file contains no mesh primitives".into()));
    }
    if any_missing_tangents {
        compute_tangents(&mut vertices, &indices);
    }

    Ok((vertices, indices))
}

/// Append one primitive, rebasing its indices past the existing vertices.
fn append_primitive(vertices: &mut Vec<MeshVertex>, indices: &mut Vec<u32>, new_vertices: Vec<MeshVertex>, new_indices: &[u32]) {
    let base = vertices.len() as u32;
    vertices.extend(new_vertices);
    indices.extend(new_indices.iter().map(|i| base + i));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appended_primitive_indices_are_rebased() {
        let (tri_v, tri_i) = crate::render::shapes::plane();
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        append_primitive(&mut vertices, &mut indices, tri_v.clone(), &tri_i);
        append_primitive(&mut vertices, &mut indices, tri_v, &tri_i);
        assert_eq!(vertices.len(), 8);
        assert_eq!(&indices[6..], &[4, 5, 6, 4, 6, 7]);
    }

    #[test]
    fn missing_file_is_a_mesh_error() {
        let err = load_mesh(Path::new("does/not/exist.glb")).unwrap_err();
        assert!(matches!(err, KilnError::Mesh { .. }), "got {err:?}");
    }
}
