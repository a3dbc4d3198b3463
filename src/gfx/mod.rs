//! # Graphics Module
//!
//! Renderer-independent scene data for the thistle core.
//!
//! - **Camera System** ([`camera`]) - perspective and orthographic cameras plus a damped orbit controller
//! - **Geometry** ([`geometry`]) - CPU-side mesh data and primitive generators
//! - **Resource Management** ([`resources`]) - materials, textures and the asynchronous loader
//! - **Scene Management** ([`scene`]) - node hierarchy and world transforms
//!
//! Nothing here talks to a GPU. A [`RenderSink`](crate::scheduler::RenderSink)
//! receives the graph and camera every tick and draws them however it likes.

pub mod camera;
pub mod geometry;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::{Camera, OrbitController};
pub use scene::{Scene, SceneGraph};
