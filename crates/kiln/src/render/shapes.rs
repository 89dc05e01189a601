//! # Shapes — Built-In Mesh Generators
//!
//! Cube, plane, UV sphere, cylinder, cone and torus, generated on the CPU at
//! startup and uploaded through [`MeshStore`](super::mesh::MeshStore).
//!
//! ## Winding
//!
//! Every triangle is counter-clockwise when seen from outside, which is what
//! `FrontFace::Ccw` + back-face culling expects. The skybox and the point
//! light volumes reuse the sphere with *front*-face culling so they render
//! from the inside.
//!
//! ## Tangents
//!
//! Generators only fill position, normal and UV. [`compute_tangents`] then
//! derives a per-vertex tangent from the UV gradient of each triangle:
//!
//! ```text
//!   e1 = p1 - p0, e2 = p2 - p0       (edges)
//!   d1 = uv1 - uv0, d2 = uv2 - uv0   (uv deltas)
//!   T = (e1·d2.y - e2·d1.y) / det    B = (e2·d1.x - e1·d2.x) / det
//! ```
//!
//! The per-vertex sums are Gram-Schmidt orthogonalised against the normal;
//! `w` records whether `N × T` points along or against `B`.
//!
//! ## Comparison
//!
//! - **Bevy**: `Mesh::generate_tangents` uses mikktspace. Ours is the simple
//!   accumulate-and-orthogonalise variant, good enough for procedural shapes.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

use super::vertex::MeshVertex;

/// Vertex and index data for one mesh.
pub type MeshData = (Vec<MeshVertex>, Vec<u32>);

/// Unit cube centered at the origin: 24 vertices (4 per face), 36 indices.
pub fn cube() -> MeshData {
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    // (normal, u axis, v axis); u × v = normal keeps the quads CCW.
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ];
    let corners = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];
    let uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

    for (normal, u_dir, v_dir) in faces {
        let base = vertices.len() as u32;
        let (n, u, v) = (Vec3::from(normal), Vec3::from(u_dir), Vec3::from(v_dir));
        for (corner, uv) in corners.iter().zip(uvs) {
            let p = (n + u * corner[0] + v * corner[1]) * 0.5;
            vertices.push(MeshVertex::new(p.to_array(), normal, uv));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    compute_tangents(&mut vertices, &indices);
    (vertices, indices)
}

/// Unit plane on XZ facing +Y.
pub fn plane() -> MeshData {
    let h = 0.5;
    let up = [0.0, 1.0, 0.0];
    let mut vertices = vec![
        MeshVertex::new([-h, 0.0, h], up, [0.0, 0.0]),
        MeshVertex::new([h, 0.0, h], up, [1.0, 0.0]),
        MeshVertex::new([h, 0.0, -h], up, [1.0, 1.0]),
        MeshVertex::new([-h, 0.0, -h], up, [0.0, 1.0]),
    ];
    let indices = vec![0, 1, 2, 0, 2, 3];
    compute_tangents(&mut vertices, &indices);
    (vertices, indices)
}

/// UV sphere of radius 0.5. U runs around the equator, V from the north
/// pole (0) to the south pole (1).
pub fn sphere(segments: u32, rings: u32) -> MeshData {
    let segments = segments.max(3);
    let rings = rings.max(2);
    let mut vertices = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);
    let mut indices = Vec::with_capacity((rings * segments * 6) as usize);

    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let phi = v * PI;
        for seg in 0..=segments {
            let u = seg as f32 / segments as f32;
            let theta = u * TAU;
            let n = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
            vertices.push(MeshVertex::new((n * 0.5).to_array(), n.to_array(), [u, v]));
        }
    }

    for ring in 0..rings {
        for seg in 0..segments {
            let current = ring * (segments + 1) + seg;
            let below = current + segments + 1;
            indices.extend_from_slice(&[current, current + 1, below]);
            indices.extend_from_slice(&[current + 1, below + 1, below]);
        }
    }

    compute_tangents(&mut vertices, &indices);
    (vertices, indices)
}

/// Y-aligned cylinder: smooth side plus two flat caps.
pub fn cylinder(radius: f32, half_height: f32, segments: u32) -> MeshData {
    let seg = segments.max(3);
    let mut vertices = Vec::with_capacity((4 * (seg + 1)) as usize);
    let mut indices = Vec::with_capacity((seg * 12) as usize);

    for i in 0..=seg {
        let u = i as f32 / seg as f32;
        let (sin, cos) = (u * TAU).sin_cos();
        let normal = [cos, 0.0, sin];
        vertices.push(MeshVertex::new([cos * radius, half_height, sin * radius], normal, [u, 0.0]));
        vertices.push(MeshVertex::new([cos * radius, -half_height, sin * radius], normal, [u, 1.0]));
    }
    for i in 0..seg {
        let top0 = i * 2;
        let (bot0, top1, bot1) = (top0 + 1, top0 + 2, top0 + 3);
        indices.extend_from_slice(&[top0, bot1, bot0, top0, top1, bot1]);
    }

    push_cap(&mut vertices, &mut indices, radius, half_height, seg, true);
    push_cap(&mut vertices, &mut indices, radius, -half_height, seg, false);

    compute_tangents(&mut vertices, &indices);
    (vertices, indices)
}

/// Y-aligned cone with its apex at `+half_height` and a flat base.
pub fn cone(radius: f32, half_height: f32, segments: u32) -> MeshData {
    let seg = segments.max(3);
    let height = 2.0 * half_height;
    let slope_normal = |theta: f32| {
        let (sin, cos) = theta.sin_cos();
        Vec3::new(cos * height, radius, sin * height).normalize_or_zero().to_array()
    };

    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for i in 0..=seg {
        let u = i as f32 / seg as f32;
        let theta = u * TAU;
        let (sin, cos) = theta.sin_cos();
        vertices.push(MeshVertex::new(
            [cos * radius, -half_height, sin * radius],
            slope_normal(theta),
            [u, 1.0],
        ));
    }
    // One apex per segment so each side triangle gets its own normal there.
    for i in 0..seg {
        let u = (i as f32 + 0.5) / seg as f32;
        let apex = vertices.len() as u32;
        vertices.push(MeshVertex::new([0.0, half_height, 0.0], slope_normal(u * TAU), [u, 0.0]));
        indices.extend_from_slice(&[apex, i + 1, i]);
    }

    push_cap(&mut vertices, &mut indices, radius, -half_height, seg, false);

    compute_tangents(&mut vertices, &indices);
    (vertices, indices)
}

/// Torus in the XZ plane. `major` is the ring radius, `minor` the tube
/// radius.
pub fn torus(major: f32, minor: f32, segments: u32, sides: u32) -> MeshData {
    let segments = segments.max(3);
    let sides = sides.max(3);
    let mut vertices = Vec::with_capacity(((segments + 1) * (sides + 1)) as usize);
    let mut indices = Vec::with_capacity((segments * sides * 6) as usize);

    for i in 0..=segments {
        let u = i as f32 / segments as f32;
        let (sin_t, cos_t) = (u * TAU).sin_cos();
        for j in 0..=sides {
            let v = j as f32 / sides as f32;
            let (sin_p, cos_p) = (v * TAU).sin_cos();
            let normal = Vec3::new(cos_p * cos_t, sin_p, cos_p * sin_t);
            let ring = major + minor * cos_p;
            let position = Vec3::new(ring * cos_t, minor * sin_p, ring * sin_t);
            vertices.push(MeshVertex::new(position.to_array(), normal.to_array(), [u, v]));
        }
    }

    let stride = sides + 1;
    for i in 0..segments {
        for j in 0..sides {
            let a = i * stride + j;
            let b = a + stride;
            indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
        }
    }

    compute_tangents(&mut vertices, &indices);
    (vertices, indices)
}

/// Flat disc at height `y`, facing +Y when `up`, -Y otherwise.
fn push_cap(vertices: &mut Vec<MeshVertex>, indices: &mut Vec<u32>, radius: f32, y: f32, seg: u32, up: bool) {
    let normal = if up { [0.0, 1.0, 0.0] } else { [0.0, -1.0, 0.0] };
    let center = vertices.len() as u32;
    vertices.push(MeshVertex::new([0.0, y, 0.0], normal, [0.5, 0.5]));
    for i in 0..seg {
        let (sin, cos) = (i as f32 / seg as f32 * TAU).sin_cos();
        vertices.push(MeshVertex::new(
            [cos * radius, y, sin * radius],
            normal,
            [0.5 + cos * 0.5, 0.5 + sin * 0.5],
        ));
    }
    for i in 0..seg {
        let curr = center + 1 + i;
        let next = center + 1 + (i + 1) % seg;
        if up {
            indices.extend_from_slice(&[center, next, curr]);
        } else {
            indices.extend_from_slice(&[center, curr, next]);
        }
    }
}

/// Fill in `tangent` for every vertex from the triangles' UV gradients.
pub fn compute_tangents(vertices: &mut [MeshVertex], indices: &[u32]) {
    let mut tangents = vec![Vec3::ZERO; vertices.len()];
    let mut bitangents = vec![Vec3::ZERO; vertices.len()];

    for tri in indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (p0, p1, p2) = (
            Vec3::from(vertices[i0].position),
            Vec3::from(vertices[i1].position),
            Vec3::from(vertices[i2].position),
        );
        let (uv0, uv1, uv2) = (
            Vec2::from(vertices[i0].uv),
            Vec2::from(vertices[i1].uv),
            Vec2::from(vertices[i2].uv),
        );
        let (e1, e2) = (p1 - p0, p2 - p0);
        let (d1, d2) = (uv1 - uv0, uv2 - uv0);
        let det = d1.x * d2.y - d2.x * d1.y;
        if det.abs() < f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let t = (e1 * d2.y - e2 * d1.y) * r;
        let b = (e2 * d1.x - e1 * d2.x) * r;
        for i in [i0, i1, i2] {
            tangents[i] += t;
            bitangents[i] += b;
        }
    }

    for (i, vertex) in vertices.iter_mut().enumerate() {
        let n = Vec3::from(vertex.normal).normalize_or_zero();
        let t = (tangents[i] - n * n.dot(tangents[i])).normalize_or_zero();
        let t = if t == Vec3::ZERO { n.any_orthonormal_vector() } else { t };
        let w = if n.cross(t).dot(bitangents[i]) < 0.0 { -1.0 } else { 1.0 };
        vertex.tangent = [t.x, t.y, t.z, w];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_shapes() -> Vec<(&'static str, MeshData)> {
        vec![
            ("cube", cube()),
            ("plane", plane()),
            ("sphere", sphere(32, 16)),
            ("cylinder", cylinder(0.5, 0.5, 24)),
            ("cone", cone(0.5, 0.5, 24)),
            ("torus", torus(0.35, 0.15, 24, 12)),
        ]
    }

    #[test]
    fn cube_has_correct_counts() {
        let (verts, idxs) = cube();
        assert_eq!(verts.len(), 24, "cube should have 24 vertices (4 per face)");
        assert_eq!(idxs.len(), 36, "cube should have 36 indices (6 per face)");
    }

    #[test]
    fn sphere_has_correct_counts() {
        let (verts, idxs) = sphere(32, 16);
        assert_eq!(verts.len(), 17 * 33);
        assert_eq!(idxs.len(), 16 * 32 * 6);
    }

    #[test]
    fn sphere_radius_is_half() {
        let (verts, _) = sphere(16, 8);
        for v in &verts {
            let r = Vec3::from(v.position).length();
            assert!((r - 0.5).abs() < 1e-5, "vertex at radius {r}");
        }
    }

    #[test]
    fn indices_in_range() {
        for (name, (verts, idxs)) in all_shapes() {
            assert_eq!(idxs.len() % 3, 0, "{name} index count not a multiple of 3");
            for &idx in &idxs {
                assert!((idx as usize) < verts.len(), "{name}: index {idx} out of range");
            }
        }
    }

    #[test]
    fn normals_are_unit_length() {
        for (name, (verts, _)) in all_shapes() {
            for v in &verts {
                let len = Vec3::from(v.normal).length();
                assert!((len - 1.0).abs() < 1e-5, "{name}: normal length {len}");
            }
        }
    }

    #[test]
    fn triangles_wind_counter_clockwise_from_outside() {
        for (name, (verts, idxs)) in all_shapes() {
            for tri in idxs.chunks_exact(3) {
                let p: Vec<Vec3> = tri.iter().map(|&i| Vec3::from(verts[i as usize].position)).collect();
                let face = (p[1] - p[0]).cross(p[2] - p[0]);
                if face.length() < 1e-7 {
                    continue; // collapsed triangle at a pole
                }
                let outward: Vec3 = tri.iter().map(|&i| Vec3::from(verts[i as usize].normal)).sum();
                assert!(
                    face.dot(outward) > 0.0,
                    "{name}: triangle {tri:?} faces inward"
                );
            }
        }
    }

    #[test]
    fn tangents_are_unit_and_perpendicular_to_normals() {
        for (name, (verts, _)) in all_shapes() {
            for v in &verts {
                let t = Vec3::new(v.tangent[0], v.tangent[1], v.tangent[2]);
                let n = Vec3::from(v.normal);
                assert!((t.length() - 1.0).abs() < 1e-4, "{name}: tangent length {}", t.length());
                assert!(t.dot(n).abs() < 1e-4, "{name}: tangent not perpendicular");
                assert!(v.tangent[3] == 1.0 || v.tangent[3] == -1.0);
            }
        }
    }

    #[test]
    fn plane_tangent_follows_u() {
        let (verts, _) = plane();
        for v in &verts {
            assert!((Vec3::new(v.tangent[0], v.tangent[1], v.tangent[2]) - Vec3::X).length() < 1e-5);
        }
    }

    #[test]
    fn cone_apex_is_on_top() {
        let (verts, _) = cone(0.5, 0.5, 8);
        let top = verts.iter().map(|v| v.position[1]).fold(f32::MIN, f32::max);
        assert_eq!(top, 0.5);
    }
}
