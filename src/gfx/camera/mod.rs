//! Cameras, their projections and the interactive orbit controller.

pub mod camera;
pub mod camera_utils;
pub mod orbit_controller;

// Re-export main types
pub use camera::{Camera, Projection};
pub use camera_utils::{CameraUniform, OPENGL_TO_WGPU_MATRIX};
pub use orbit_controller::{DragState, OrbitBounds, OrbitController, OrbitTarget, Spherical};
