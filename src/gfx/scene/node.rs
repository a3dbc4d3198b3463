use std::{fmt, rc::Rc};

use cgmath::{Matrix4, SquareMatrix, Vector3};

use crate::gfx::{geometry::GeometryData, resources::material::BasicMaterial};

use super::transform::Transform;

/// Generational index of a node inside a [`SceneGraph`](super::SceneGraph).
///
/// Ids of removed nodes never alias newer nodes: the slot generation is bumped
/// on removal, so a stale id simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}v{}", self.index, self.generation)
    }
}

/// What a node draws, if anything.
#[derive(Clone)]
pub enum NodeKind {
    /// Pure transform container.
    Group,
    /// Geometry drawn with a material.
    Mesh {
        geometry: Rc<GeometryData>,
        material: BasicMaterial,
    },
    /// Axis lines of the given length: red +X, green +Y, blue +Z.
    Axes { size: f32 },
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Group => write!(f, "Group"),
            NodeKind::Mesh { geometry, material } => f
                .debug_struct("Mesh")
                .field("vertices", &geometry.vertex_count())
                .field("material", &material.name)
                .finish(),
            NodeKind::Axes { size } => f.debug_struct("Axes").field("size", size).finish(),
        }
    }
}

/// A positioned, rotated and scaled entity in the scene graph.
///
/// `transform` and `visible` are plain fields so tools such as a debug panel
/// can edit them in place. Hierarchy links are owned by the graph.
#[derive(Debug, Clone)]
pub struct TransformNode {
    pub name: String,
    pub kind: NodeKind,
    pub transform: Transform,
    pub visible: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) world: Matrix4<f32>,
}

impl TransformNode {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            transform: Transform::identity(),
            visible: true,
            parent: None,
            children: Vec::new(),
            world: Matrix4::identity(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn mesh(name: impl Into<String>, geometry: Rc<GeometryData>, material: BasicMaterial) -> Self {
        Self::new(name, NodeKind::Mesh { geometry, material })
    }

    pub fn axes(name: impl Into<String>, size: f32) -> Self {
        Self::new(name, NodeKind::Axes { size })
    }

    /// Builder: replace the local transform.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// World matrix as of the last `compute_world_transforms` pass.
    pub fn world_matrix(&self) -> Matrix4<f32> {
        self.world
    }

    pub fn world_position(&self) -> Vector3<f32> {
        self.world.w.truncate()
    }

    pub fn material(&self) -> Option<&BasicMaterial> {
        match &self.kind {
            NodeKind::Mesh { material, .. } => Some(material),
            _ => None,
        }
    }

    pub fn material_mut(&mut self) -> Option<&mut BasicMaterial> {
        match &mut self.kind {
            NodeKind::Mesh { material, .. } => Some(material),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::generate_box;

    #[test]
    fn test_new_node_is_unrooted_identity() {
        let node = TransformNode::group("cubes");
        assert!(node.parent().is_none());
        assert!(node.children().is_empty());
        assert!(node.visible);
        assert_eq!(node.world_matrix(), Matrix4::identity());
        assert!(node.material().is_none());
    }

    #[test]
    fn test_mesh_exposes_material() {
        let mut node = TransformNode::mesh(
            "box",
            Rc::new(generate_box(1.0, 1.0, 1.0)),
            BasicMaterial::from_hex("red", 0xff0000),
        );
        node.material_mut().unwrap().wireframe = true;
        assert!(node.material().unwrap().wireframe);
        assert_eq!(format!("{:?}", node.kind).starts_with("Mesh"), true);
    }
}
