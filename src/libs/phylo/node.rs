/// NodeId is an index into the Tree's node vector.
/// It is lightweight (Copy) and safe (no pointers).
pub type NodeId = usize;

#[derive(Debug, Clone)]
pub struct Node {
    /// Unique identifier for the node (index in the arena)
    pub id: NodeId,

    /// Parent node ID (None for the anchor node)
    pub parent: Option<NodeId>,

    /// List of child node IDs
    pub children: Vec<NodeId>,

    // --- Payload ---
    /// For leaves: the segment enumeration index `0..degree-1`.
    /// Internal join nodes carry None.
    pub leaf: Option<usize>,

    /// Display label used for Newick output (e.g., a thread name)
    pub name: Option<String>,

    /// Branch length to parent
    pub length: Option<f64>,

    /// Clade support value, if any; consulted by the partitioner's
    /// `min_clade_support` gate.
    pub support: Option<f64>,
}

impl Node {
    /// Create a new empty node with a specific ID
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            parent: None,
            children: Vec::new(),
            leaf: None,
            name: None,
            length: None,
            support: None,
        }
    }

    /// Check if the node is a leaf (no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
