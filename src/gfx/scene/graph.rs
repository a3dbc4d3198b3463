//! Arena-backed scene graph.
//!
//! Nodes live in a slot vector indexed by [`NodeId`]. Parent links are plain
//! ids, so detaching never leaves a dangling reference behind.

use cgmath::{Matrix4, SquareMatrix, Vector3};

use crate::error::SceneError;

use super::node::{NodeId, TransformNode};

struct Slot {
    generation: u32,
    node: Option<TransformNode>,
}

/// Owns every node reachable from its root, plus any detached subtrees that
/// have not been removed yet.
pub struct SceneGraph {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    live: usize,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Creates a graph with a single `Group` root named "Scene".
    pub fn new() -> Self {
        let mut graph = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            live: 0,
        };
        graph.root = graph.create(TransformNode::group("Scene"));
        graph
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, detached subtrees included.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Stores a node without attaching it anywhere.
    pub fn create(&mut self, mut node: TransformNode) -> NodeId {
        node.parent = None;
        node.children.clear();
        self.live += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }

        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    /// Creates a node and attaches it under `parent` in one step.
    pub fn add(&mut self, parent: NodeId, node: TransformNode) -> Result<NodeId, SceneError> {
        if !self.contains(parent) {
            return Err(SceneError::UnknownNode(parent));
        }
        let id = self.create(node);
        self.attach(parent, id)?;
        Ok(id)
    }

    /// Creates a node directly under the root.
    pub fn add_to_root(&mut self, node: TransformNode) -> NodeId {
        let id = self.create(node);
        let root = self.root;
        // A fresh node has no parent and cannot be an ancestor of the root.
        if let Some(root_node) = self.get_mut(root) {
            root_node.children.push(id);
        }
        if let Some(child) = self.get_mut(id) {
            child.parent = Some(root);
        }
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&TransformNode> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut TransformNode> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    pub fn node(&self, id: NodeId) -> Result<&TransformNode, SceneError> {
        self.get(id).ok_or(SceneError::UnknownNode(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut TransformNode, SceneError> {
        self.get_mut(id).ok_or(SceneError::UnknownNode(id))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    /// True when `ancestor` is `node` itself or sits above it.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.parent(id);
        }
        false
    }

    /// True when the node hangs off the root.
    pub fn is_rooted(&self, id: NodeId) -> bool {
        self.contains(id) && self.is_ancestor(self.root, id)
    }

    /// Appends `child` to the children of `parent`.
    ///
    /// Rejects cycles and nodes that already have a parent. The graph is left
    /// unchanged on error.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        if !self.contains(parent) {
            return Err(SceneError::UnknownNode(parent));
        }
        let existing = self.node(child)?.parent;
        if child == self.root {
            return Err(SceneError::RootImmovable);
        }
        if self.is_ancestor(child, parent) {
            return Err(SceneError::Cycle { parent, child });
        }
        if let Some(existing) = existing {
            return Err(SceneError::DuplicateParent { child, existing });
        }

        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        log::trace!("attached {child} under {parent}");
        Ok(())
    }

    /// Unroots `node` and its subtree. The nodes stay in the arena and can be
    /// attached again. Detaching an already unrooted node is a no-op.
    pub fn detach(&mut self, node: NodeId) -> Result<(), SceneError> {
        if node == self.root {
            return Err(SceneError::RootImmovable);
        }
        let Some(parent) = self.node(node)?.parent else {
            return Ok(());
        };

        if let Some(parent_node) = self.get_mut(parent) {
            parent_node.children.retain(|&c| c != node);
        }
        self.node_mut(node)?.parent = None;
        log::trace!("detached {node} from {parent}");
        Ok(())
    }

    /// Detaches `node` and destroys it together with its whole subtree.
    ///
    /// Returns the number of nodes destroyed.
    pub fn remove(&mut self, node: NodeId) -> Result<usize, SceneError> {
        self.detach(node)?;

        let doomed: Vec<NodeId> = self.traverse(node).collect();
        for id in &doomed {
            let slot = &mut self.slots[id.index as usize];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index);
        }
        self.live -= doomed.len();
        log::debug!("removed {} node(s) starting at {node}", doomed.len());
        Ok(doomed.len())
    }

    /// Pre-order iterator over `start` and its descendants, in child order.
    pub fn traverse(&self, start: NodeId) -> Traverse<'_> {
        let stack = if self.contains(start) {
            vec![start]
        } else {
            Vec::new()
        };
        Traverse { graph: self, stack }
    }

    /// First node reachable from the root with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.traverse(self.root)
            .find(|&id| self.get(id).is_some_and(|node| node.name == name))
    }

    /// Recomputes the world matrix of every node reachable from the root.
    ///
    /// Parents are always visited before their children, so each world matrix
    /// is `parent_world * local`. Detached subtrees keep whatever they held
    /// before. Returns the number of nodes updated.
    pub fn compute_world_transforms(&mut self) -> usize {
        let mut visited = 0;
        let mut stack: Vec<(NodeId, Matrix4<f32>)> = vec![(self.root, Matrix4::identity())];

        while let Some((id, parent_world)) = stack.pop() {
            let Some(node) = self.get_mut(id) else {
                continue;
            };
            let world = parent_world * node.transform.matrix();
            node.world = world;
            visited += 1;

            // Reverse so the first child is popped first.
            for &child in node.children.iter().rev() {
                stack.push((child, world));
            }
        }

        visited
    }

    pub fn world_matrix(&self, id: NodeId) -> Option<Matrix4<f32>> {
        self.get(id).map(|node| node.world)
    }

    pub fn world_position(&self, id: NodeId) -> Option<Vector3<f32>> {
        self.get(id).map(|node| node.world_position())
    }

    /// Iterates all live nodes reachable from the root, with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &TransformNode)> + '_ {
        self.traverse(self.root)
            .filter_map(move |id| self.get(id).map(|node| (id, node)))
    }
}

/// Pre-order traversal returned by [`SceneGraph::traverse`].
pub struct Traverse<'a> {
    graph: &'a SceneGraph,
    stack: Vec<NodeId>,
}

impl Iterator for Traverse<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.graph.children(id).iter().rev().copied());
        Some(id)
    }
}
