//! # Procedural Geometry
//!
//! Geometry descriptors handed to the renderer sink as part of mesh nodes.
//! The core never uploads them anywhere; it only builds and carries them.
//!
//! ## Supported Primitives
//!
//! - **Box**: axis-aligned box with per-face normals and UVs
//! - **Axes**: three coloured line segments along +X, +Y and +Z
//!
//! ## Usage
//!
//! ```rust
//! use thistle::gfx::geometry::{generate_axes, generate_box};
//!
//! let cube = generate_box(1.0, 1.0, 1.0);
//! assert_eq!(cube.triangle_count(), 12);
//!
//! let axes = generate_axes(2.0);
//! assert_eq!(axes.vertex_count(), 6);
//! ```

pub mod primitives;

pub use primitives::*;

/// How consecutive indices are grouped into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Topology {
    #[default]
    Triangles,
    Lines,
}

/// Generated geometry data ready for a renderer to upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Texture coordinates (u, v)
    pub tex_coords: Vec<[f32; 2]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Optional per-vertex colours (r, g, b)
    pub colors: Vec<[f32; 3]>,
    /// Primitive indices (counter-clockwise winding for triangles)
    pub indices: Vec<u32>,
    pub topology: Topology,
}

impl GeometryData {
    pub fn new(topology: Topology) -> Self {
        Self {
            topology,
            ..Default::default()
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles, or zero for line geometry.
    pub fn triangle_count(&self) -> usize {
        match self.topology {
            Topology::Triangles => self.indices.len() / 3,
            Topology::Lines => 0,
        }
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` when empty.
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = *self.vertices.first()?;
        Some(self.vertices.iter().skip(1).fold((first, first), |(mut min, mut max), v| {
            for i in 0..3 {
                min[i] = min[i].min(v[i]);
                max[i] = max[i].max(v[i]);
            }
            (min, max)
        }))
    }
}
