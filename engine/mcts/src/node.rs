//! Search tree node representation.
//!
//! Each node stands for the position reached by playing a move from its
//! parent. Statistics are stored from the perspective of the player who made
//! that move, so a parent picks the child with the highest `Q` directly.

/// Index into the node arena. Using a newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_some(self) -> bool {
        !self.is_none()
    }

    /// Arena slot of this id.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node in the search tree.
#[derive(Debug, Clone)]
pub struct SearchNode<M> {
    /// Parent node index (NONE for root)
    pub parent: NodeId,

    /// Children as (move, NodeId) pairs, kept sorted by move.
    /// Empty until the node is expanded.
    pub children: Vec<(M, NodeId)>,

    /// Number of times this node has been visited.
    pub visit_count: u32,

    /// Sum of values backed up through this node.
    /// Q = total_value / visit_count
    pub total_value: f32,

    /// Prior probability assigned by the evaluator when the parent was
    /// expanded. The root keeps 1.0 and never reads it.
    pub prior: f32,
}

impl<M> SearchNode<M> {
    /// Create a new root node.
    pub fn new_root() -> Self {
        Self::new_child(NodeId::NONE, 1.0)
    }

    /// Create a new, unvisited child node.
    pub fn new_child(parent: NodeId, prior: f32) -> Self {
        Self {
            parent,
            children: Vec::new(),
            visit_count: 0,
            total_value: 0.0,
            prior,
        }
    }

    /// Calculate mean value Q = total_value / visit_count.
    /// Returns 0.0 if never visited.
    #[inline]
    pub fn mean_value(&self) -> f32 {
        if self.visit_count == 0 {
            0.0
        } else {
            self.total_value / self.visit_count as f32
        }
    }

    /// Record one backed-up value.
    #[inline]
    pub fn update(&mut self, leaf_value: f32) {
        self.visit_count += 1;
        self.total_value += leaf_value;
    }

    /// PUCT score used by the parent during selection.
    /// `Q + c_puct * P * sqrt(N_parent) / (1 + N)`
    ///
    /// Takes pre-computed `sqrt(N_parent)` to avoid redundant sqrt calls
    /// when comparing siblings.
    #[inline]
    pub fn puct_score(&self, parent_visits_sqrt: f32, c_puct: f32) -> f32 {
        let u = c_puct * self.prior * parent_visits_sqrt / (1.0 + self.visit_count as f32);
        self.mean_value() + u
    }

    /// True until the node has been expanded.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
