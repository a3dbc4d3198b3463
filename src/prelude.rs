//! # Thistle Prelude
//!
//! Commonly used types in one import.
//!
//! ```rust
//! use thistle::prelude::*;
//!
//! let mut graph = SceneGraph::new();
//! let cube = graph.add_to_root(TransformNode::mesh(
//!     "cube",
//!     std::rc::Rc::new(generate_box(1.0, 1.0, 1.0)),
//!     BasicMaterial::from_hex("cube", 0x44aa88),
//! ));
//! graph.compute_world_transforms();
//! assert_eq!(graph.world_position(cube), Some(Vector3::new(0.0, 0.0, 0.0)));
//! ```

// Re-export core application types
pub use crate::app::ThistleApp;
pub use crate::config::{AppConfig, CameraConfig, LoaderConfig, OrbitConfig};
pub use crate::error::{CameraError, LoadError, LoadErrorKind, SceneError};
pub use crate::init_logging;

// Re-export graphics and scene types
pub use crate::gfx::camera::{Camera, OrbitController, OrbitTarget, Projection};
pub use crate::gfx::geometry::{generate_axes, generate_box, GeometryData};
pub use crate::gfx::resources::{BasicMaterial, LoadCallbacks, LoadStatus, LoadingManager, Texture};
pub use crate::gfx::scene::{Euler, EulerOrder, NodeId, NodeKind, Scene, SceneGraph, Transform, TransformNode};

// Re-export the frame loop
pub use crate::input::InputEvent;
pub use crate::scheduler::{FrameHost, FrameScheduler, FrameTime, RenderSink};

// Re-export performance monitoring
pub use crate::performance::{FrameMetrics, FrameStats};

// Re-export common external dependencies
pub use cgmath::{Deg, InnerSpace, Rad, Vector3, Zero};
