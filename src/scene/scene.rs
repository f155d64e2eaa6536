use glam::Affine3A;
use slotmap::SlotMap;

use crate::scene::node::Node;
use crate::scene::NodeHandle;

/// Node container and hierarchy.
///
/// `Scene` is a pure data layer: it owns the node arena and the root list,
/// and propagates world matrices on demand. Animation controllers write node
/// local transforms; the host decides when to run
/// [`Scene::update_world_transforms`].
#[derive(Debug, Default)]
pub struct Scene {
    pub nodes: SlotMap<NodeHandle, Node>,
    pub root_nodes: Vec<NodeHandle>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node as a scene root.
    pub fn add_node(&mut self, node: Node) -> NodeHandle {
        let handle = self.nodes.insert(node);
        self.root_nodes.push(handle);
        handle
    }

    /// Adds a node as a child of `parent`.
    pub fn add_child(&mut self, parent: NodeHandle, node: Node) -> NodeHandle {
        let handle = self.nodes.insert(node);

        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.push(handle);
        } else {
            log::error!("Parent node not found during attach!");
        }
        if let Some(child_node) = self.nodes.get_mut(handle) {
            child_node.parent = Some(parent);
        }

        handle
    }

    #[inline]
    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    #[inline]
    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    /// Finds a node by name in the subtree rooted at `from` (inclusive,
    /// depth-first).
    #[must_use]
    pub fn find_by_name(&self, from: NodeHandle, name: &str) -> Option<NodeHandle> {
        let node = self.nodes.get(from)?;
        if node.name == name {
            return Some(from);
        }
        for &child in &node.children {
            if let Some(found) = self.find_by_name(child, name) {
                return Some(found);
            }
        }
        None
    }

    /// Finds a direct child of `parent` by name.
    #[must_use]
    pub fn find_child(&self, parent: NodeHandle, name: &str) -> Option<NodeHandle> {
        let node = self.nodes.get(parent)?;
        node.children
            .iter()
            .copied()
            .find(|&child| self.nodes.get(child).is_some_and(|n| n.name == name))
    }

    /// Rebuilds local matrices where needed and propagates world matrices
    /// root-to-leaf.
    pub fn update_world_transforms(&mut self) {
        let mut stack: Vec<(NodeHandle, Affine3A)> = self
            .root_nodes
            .iter()
            .map(|&handle| (handle, Affine3A::IDENTITY))
            .collect();

        while let Some((handle, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(handle) else {
                continue;
            };
            node.transform.update_local_matrix();
            let world = parent_world * node.transform.local_matrix;
            node.transform.set_world_matrix(world);

            for &child in &node.children {
                stack.push((child, world));
            }
        }
    }
}
