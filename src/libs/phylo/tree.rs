use super::node::{Node, NodeId};

/// Arena-backed phylogenetic tree.
///
/// Neighbor-joining produces an unrooted tree; the stored root is only an
/// anchor for traversal, not a statement about ancestry.
#[derive(Debug, Default, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Tree {
    /// Create a new empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new unconnected node to the tree. Returns the new node's ID.
    pub fn add_node(&mut self) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node::new(id));
        id
    }

    /// Add a leaf carrying a segment enumeration index and a display name.
    pub fn add_leaf(&mut self, index: usize, name: impl Into<String>) -> NodeId {
        let id = self.add_node();
        let node = &mut self.nodes[id];
        node.leaf = Some(index);
        node.name = Some(name.into());
        id
    }

    /// Get number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get_root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Set a node as the anchor of the tree.
    pub fn set_root(&mut self, id: NodeId) {
        if id < self.nodes.len() {
            self.root = Some(id);
        }
    }

    /// Attach `child_id` under `parent_id`.
    pub fn add_child(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<(), String> {
        if parent_id >= self.nodes.len() || child_id >= self.nodes.len() {
            return Err(format!("invalid node id {} or {}", parent_id, child_id));
        }
        if self.nodes[child_id].parent.is_some() {
            return Err(format!("node {} already has a parent", child_id));
        }
        self.nodes[child_id].parent = Some(parent_id);
        self.nodes[parent_id].children.push(child_id);
        Ok(())
    }

    /// Post-order traversal starting at `start`. Iterative, so deep trees
    /// don't blow the stack.
    pub fn postorder(&self, start: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![(start, false)];
        while let Some((id, visited)) = stack.pop() {
            if visited {
                out.push(id);
            } else {
                stack.push((id, true));
                for &child in self.nodes[id].children.iter().rev() {
                    stack.push((child, false));
                }
            }
        }
        out
    }

    /// All leaf node IDs, in traversal order from the anchor.
    pub fn leaves(&self) -> Vec<NodeId> {
        match self.root {
            Some(root) => self
                .postorder(root)
                .into_iter()
                .filter(|&id| self.nodes[id].leaf.is_some())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.leaf.is_some()).count()
    }

    /// Number of edges (every non-anchor node contributes its parent edge).
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.parent.is_some()).count()
    }

    /// Serialize to a Newick string.
    pub fn to_newick(&self) -> String {
        let mut out = String::new();
        if let Some(root) = self.root {
            self.fmt_newick(root, &mut out);
        }
        out.push(';');
        out
    }

    fn fmt_newick(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id];
        if !node.children.is_empty() {
            out.push('(');
            for (i, &child) in node.children.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                self.fmt_newick(child, out);
            }
            out.push(')');
        }
        if let Some(name) = &node.name {
            out.push_str(name);
        }
        if let Some(length) = node.length {
            out.push_str(&format!(":{}", length));
        }
    }
}
