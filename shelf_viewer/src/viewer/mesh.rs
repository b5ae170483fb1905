//! Unit box geometry for the shelf. Every face carries texture coordinates
//! into the composite cover atlas so one texture dresses the whole case.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use shelf_core::{CoverAtlas, UvRect};

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

pub struct MeshPrimitive {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u16>,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct MeshInstance {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl MeshInstance {
    pub fn new(model: Mat4, color: [f32; 4]) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            color,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct MeshUniforms {
    pub view_projection: [[f32; 4]; 4],
}

pub fn view_projection_uniform(matrix: Mat4) -> MeshUniforms {
    MeshUniforms {
        view_projection: matrix.to_cols_array_2d(),
    }
}

/// Which atlas region a face samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FaceSlice {
    Front,
    Back,
    Spine,
}

struct Face {
    normal: [f32; 3],
    /// Corners counter-clockwise seen from outside, starting bottom-left.
    corners: [[f32; 3]; 4],
    slice: FaceSlice,
    /// Spine strips on the top and bottom run sideways.
    rotated: bool,
}

const FACES: [Face; 6] = [
    Face {
        normal: [0.0, 0.0, 1.0],
        corners: [
            [-0.5, -0.5, 0.5],
            [0.5, -0.5, 0.5],
            [0.5, 0.5, 0.5],
            [-0.5, 0.5, 0.5],
        ],
        slice: FaceSlice::Front,
        rotated: false,
    },
    Face {
        normal: [0.0, 0.0, -1.0],
        corners: [
            [0.5, -0.5, -0.5],
            [-0.5, -0.5, -0.5],
            [-0.5, 0.5, -0.5],
            [0.5, 0.5, -0.5],
        ],
        slice: FaceSlice::Back,
        rotated: false,
    },
    Face {
        normal: [-1.0, 0.0, 0.0],
        corners: [
            [-0.5, -0.5, -0.5],
            [-0.5, -0.5, 0.5],
            [-0.5, 0.5, 0.5],
            [-0.5, 0.5, -0.5],
        ],
        slice: FaceSlice::Spine,
        rotated: false,
    },
    Face {
        normal: [1.0, 0.0, 0.0],
        corners: [
            [0.5, -0.5, 0.5],
            [0.5, -0.5, -0.5],
            [0.5, 0.5, -0.5],
            [0.5, 0.5, 0.5],
        ],
        slice: FaceSlice::Spine,
        rotated: false,
    },
    Face {
        normal: [0.0, 1.0, 0.0],
        corners: [
            [-0.5, 0.5, 0.5],
            [0.5, 0.5, 0.5],
            [0.5, 0.5, -0.5],
            [-0.5, 0.5, -0.5],
        ],
        slice: FaceSlice::Spine,
        rotated: true,
    },
    Face {
        normal: [0.0, -1.0, 0.0],
        corners: [
            [-0.5, -0.5, -0.5],
            [0.5, -0.5, -0.5],
            [0.5, -0.5, 0.5],
            [-0.5, -0.5, 0.5],
        ],
        slice: FaceSlice::Spine,
        rotated: true,
    },
];

fn face_uvs(rect: UvRect, rotated: bool) -> [[f32; 2]; 4] {
    // Image v grows downward, so the bottom edge of a face maps to v1.
    let upright = [
        [rect.u0, rect.v1],
        [rect.u1, rect.v1],
        [rect.u1, rect.v0],
        [rect.u0, rect.v0],
    ];
    if rotated {
        [upright[1], upright[2], upright[3], upright[0]]
    } else {
        upright
    }
}

/// Unit cube (`[-0.5, 0.5]^3`) textured from `atlas`.
pub fn build_cover_box(atlas: &CoverAtlas) -> MeshPrimitive {
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for face in &FACES {
        let slice = match face.slice {
            FaceSlice::Front => &atlas.front,
            FaceSlice::Back => &atlas.back,
            FaceSlice::Spine => &atlas.spine,
        };
        let uvs = face_uvs(atlas.uv(slice), face.rotated);
        let base = vertices.len() as u16;
        for (corner, uv) in face.corners.iter().zip(uvs) {
            vertices.push(MeshVertex {
                position: *corner,
                normal: face.normal,
                uv,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    MeshPrimitive { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn box_has_six_quads() {
        let mesh = build_cover_box(&CoverAtlas::default());
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        assert!(mesh.indices.iter().all(|index| (*index as usize) < 24));
    }

    #[test]
    fn front_face_samples_front_slice() {
        let atlas = CoverAtlas::default();
        let mesh = build_cover_box(&atlas);
        let front = atlas.uv(&atlas.front);
        for vertex in mesh.vertices.iter().filter(|v| v.normal == [0.0, 0.0, 1.0]) {
            assert!(vertex.uv[0] >= front.u0 - 1e-6 && vertex.uv[0] <= front.u1 + 1e-6);
        }
        let top_left = mesh
            .vertices
            .iter()
            .find(|v| v.normal == [0.0, 0.0, 1.0] && v.position == [-0.5, 0.5, 0.5])
            .expect("front top-left corner");
        assert_eq!(top_left.uv, [front.u0, front.v0]);
    }

    #[test]
    fn triangles_wind_outward() {
        let mesh = build_cover_box(&CoverAtlas::default());
        for tri in mesh.indices.chunks_exact(3) {
            let a = Vec3::from(mesh.vertices[tri[0] as usize].position);
            let b = Vec3::from(mesh.vertices[tri[1] as usize].position);
            let c = Vec3::from(mesh.vertices[tri[2] as usize].position);
            let normal = Vec3::from(mesh.vertices[tri[0] as usize].normal);
            assert!((b - a).cross(c - a).dot(normal) > 0.0);
        }
    }
}
