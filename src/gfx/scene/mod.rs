//! # Scene Management Module
//!
//! A retained-mode scene: an arena-backed graph of [`TransformNode`]s, the
//! active camera and the texture loader, bundled in [`Scene`].
//!
//! ## Usage
//!
//! ```no_run
//! use thistle::gfx::scene::{SceneGraph, TransformNode, Transform};
//!
//! let mut graph = SceneGraph::new();
//! let pivot = graph.add_to_root(TransformNode::group("pivot"));
//! graph
//!     .add(pivot, TransformNode::axes("axes", 1.0).with_transform(Transform::from_position(2.0, 0.0, 0.0)))
//!     .unwrap();
//!
//! // World matrices are only valid after an explicit pass.
//! graph.compute_world_transforms();
//! ```

pub mod graph;
pub mod node;
pub mod scene;
pub mod transform;

// Re-export main types
pub use graph::{SceneGraph, Traverse};
pub use node::{NodeId, NodeKind, TransformNode};
pub use scene::{Scene, SceneStatistics};
pub use transform::{look_rotation, Euler, EulerOrder, Transform};
