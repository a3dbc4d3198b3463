//! # Primitive Shape Generation
//!
//! Box geometry is built face by face from the face normal and two tangent
//! axes, so every face gets its own four vertices, outward normals and a
//! full 0..1 UV square.

use super::{GeometryData, Topology};

/// Face description: outward normal, U axis, V axis.
const BOX_FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
    ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
];

/// Generate a box of the given size centred at the origin.
pub fn generate_box(width: f32, height: f32, depth: f32) -> GeometryData {
    let half = [width * 0.5, height * 0.5, depth * 0.5];
    let mut data = GeometryData::new(Topology::Triangles);

    for (normal, u_axis, v_axis) in BOX_FACES {
        let base = data.vertices.len() as u32;
        for (u, v) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let mut position = [0.0f32; 3];
            for i in 0..3 {
                position[i] = (normal[i] + u * u_axis[i] + v * v_axis[i]) * half[i];
            }
            data.vertices.push(position);
            data.normals.push(normal);
            data.tex_coords.push([(u + 1.0) * 0.5, (v + 1.0) * 0.5]);
        }
        data.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    data
}

/// Generate axis helper lines of length `size`: red X, green Y, blue Z.
pub fn generate_axes(size: f32) -> GeometryData {
    let mut data = GeometryData::new(Topology::Lines);
    let axes = [
        ([size, 0.0, 0.0], [1.0, 0.0, 0.0]),
        ([0.0, size, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, size], [0.0, 0.0, 1.0]),
    ];

    for (tip, color) in axes {
        let base = data.vertices.len() as u32;
        data.vertices.push([0.0, 0.0, 0.0]);
        data.vertices.push(tip);
        data.colors.push(color);
        data.colors.push(color);
        data.indices.extend_from_slice(&[base, base + 1]);
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_generation() {
        let cube = generate_box(1.0, 1.0, 1.0);
        assert_eq!(cube.vertex_count(), 24); // 6 faces * 4 vertices
        assert_eq!(cube.indices.len(), 36); // 6 faces * 2 triangles * 3 indices
        assert_eq!(cube.triangle_count(), 12);
        assert_eq!(cube.normals.len(), cube.tex_coords.len());
    }

    #[test]
    fn test_box_respects_dimensions() {
        let slab = generate_box(1.5, 0.5, 0.5);
        let (min, max) = slab.bounds().unwrap();
        assert_eq!(min, [-0.75, -0.25, -0.25]);
        assert_eq!(max, [0.75, 0.25, 0.25]);
    }

    #[test]
    fn test_box_faces_wind_outward() {
        let cube = generate_box(2.0, 2.0, 2.0);
        for tri in cube.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| cube.vertices[i as usize]);
            let e1 = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
            let e2 = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
            let cross = [
                e1[1] * e2[2] - e1[2] * e2[1],
                e1[2] * e2[0] - e1[0] * e2[2],
                e1[0] * e2[1] - e1[1] * e2[0],
            ];
            let n = cube.normals[tri[0] as usize];
            assert!(cross[0] * n[0] + cross[1] * n[1] + cross[2] * n[2] > 0.0);
        }
    }

    #[test]
    fn test_axes_generation() {
        let axes = generate_axes(2.0);
        assert_eq!(axes.topology, Topology::Lines);
        assert_eq!(axes.vertex_count(), 6);
        assert_eq!(axes.triangle_count(), 0);
        assert_eq!(axes.vertices[3], [0.0, 2.0, 0.0]);
        assert_eq!(axes.colors[5], [0.0, 0.0, 1.0]);
    }
}
