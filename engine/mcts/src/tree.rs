//! Search tree with arena allocation.
//!
//! Nodes are stored in a contiguous Vec and referenced by NodeId indices.
//! Children of every node are kept in ascending move order, which is the
//! canonical order used to break ties.

use std::collections::VecDeque;

use crate::node::{NodeId, SearchNode};

/// Search tree with arena-based node storage.
#[derive(Debug, Clone)]
pub struct SearchTree<M> {
    /// Arena storing all nodes
    nodes: Vec<SearchNode<M>>,

    /// Root node index (always 0; promotion compacts the arena)
    root: NodeId,
}

impl<M: Copy + Ord> Default for SearchTree<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Copy + Ord> SearchTree<M> {
    /// Create a tree holding a single, unvisited root.
    pub fn new() -> Self {
        Self {
            nodes: vec![SearchNode::new_root()],
            root: NodeId(0),
        }
    }

    /// Get the root node ID.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a reference to a node by ID.
    #[inline]
    pub fn get(&self, id: NodeId) -> &SearchNode<M> {
        &self.nodes[id.index()]
    }

    /// Get a mutable reference to a node by ID.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut SearchNode<M> {
        &mut self.nodes[id.index()]
    }

    /// Allocate a new node and return its ID.
    fn allocate(&mut self, node: SearchNode<M>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Get the total number of nodes in the tree.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get the arena slice for read access.
    #[inline]
    pub fn arena(&self) -> &[SearchNode<M>] {
        &self.nodes
    }

    /// Child of `node_id` reached by `mv`, if it has been expanded.
    pub fn child(&self, node_id: NodeId, mv: M) -> Option<NodeId> {
        let children = &self.get(node_id).children;
        children
            .binary_search_by(|(m, _)| m.cmp(&mv))
            .ok()
            .map(|i| children[i].1)
    }

    /// Add a child for every move not already present, with its prior.
    /// Existing children are left untouched. Returns the number of
    /// children added.
    pub fn expand(&mut self, node_id: NodeId, priors: &[(M, f32)]) -> usize {
        let mut added = 0;
        for &(mv, prior) in priors {
            let slot = match self
                .get(node_id)
                .children
                .binary_search_by(|(m, _)| m.cmp(&mv))
            {
                Ok(_) => continue,
                Err(slot) => slot,
            };
            let child_id = self.allocate(SearchNode::new_child(node_id, prior));
            self.get_mut(node_id).children.insert(slot, (mv, child_id));
            added += 1;
        }
        added
    }

    /// Select the child maximizing the PUCT score.
    /// Ties go to the first child in move order.
    pub fn select_child(&self, node_id: NodeId, c_puct: f32) -> Option<(M, NodeId)> {
        let node = self.get(node_id);
        // Pre-compute sqrt once instead of per-child comparison
        let parent_visits_sqrt = (node.visit_count as f32).sqrt();

        let mut best: Option<(M, NodeId, f32)> = None;
        for &(mv, id) in &node.children {
            let score = self.get(id).puct_score(parent_visits_sqrt, c_puct);
            if best.map_or(true, |(_, _, best_score)| score > best_score) {
                best = Some((mv, id, score));
            }
        }
        best.map(|(mv, id, _)| (mv, id))
    }

    /// Back up a value from `node_id` to the root.
    /// The value is negated at each level (the other player's perspective).
    pub fn update_recursive(&mut self, node_id: NodeId, leaf_value: f32) {
        let mut current_id = node_id;
        let mut current_value = leaf_value;

        while current_id.is_some() {
            let node = self.get_mut(current_id);
            node.update(current_value);

            current_value = -current_value;
            current_id = node.parent;
        }
    }

    /// Most visited root child as (move, visit_count).
    /// Ties go to the first child in move order; None if the root has no
    /// children.
    pub fn best_move(&self) -> Option<(M, u32)> {
        let mut best: Option<(M, u32)> = None;
        for &(mv, id) in &self.get(self.root).children {
            let visits = self.get(id).visit_count;
            if best.map_or(true, |(_, most)| visits > most) {
                best = Some((mv, visits));
            }
        }
        best
    }

    /// Visit counts of the root children, in move order.
    pub fn root_visits(&self) -> Vec<(M, u32)> {
        self.get(self.root)
            .children
            .iter()
            .map(|&(mv, id)| (mv, self.get(id).visit_count))
            .collect()
    }

    /// Temperature-scaled visit distribution over the root children.
    ///
    /// `p ∝ N^(1/temperature)`, computed as a softmax over
    /// `ln(N + 1e-10) / temperature`. A temperature below 1e-6 puts all
    /// mass on the most visited move.
    pub fn root_policy(&self, temperature: f32) -> Vec<(M, f32)> {
        let visits = self.root_visits();
        if visits.is_empty() {
            return Vec::new();
        }

        if temperature < 1e-6 {
            let best = self.best_move().map(|(mv, _)| mv);
            return visits
                .into_iter()
                .map(|(mv, _)| (mv, if Some(mv) == best { 1.0 } else { 0.0 }))
                .collect();
        }

        let logits: Vec<f64> = visits
            .iter()
            .map(|&(_, n)| (f64::from(n) + 1e-10).ln() / f64::from(temperature))
            .collect();
        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
        let total: f64 = exps.iter().sum();

        visits
            .into_iter()
            .zip(exps)
            .map(|((mv, _), e)| (mv, (e / total) as f32))
            .collect()
    }

    /// Make the root child reached by `mv` the new root, keeping its subtree
    /// and statistics and dropping everything else. If `mv` was never
    /// expanded the tree is reset. Returns whether a subtree was kept.
    pub fn retain_subtree(&mut self, mv: M) -> bool {
        let Some(new_root) = self.child(self.root, mv) else {
            self.reset();
            return false;
        };

        let mut nodes: Vec<SearchNode<M>> = Vec::new();
        let mut queue: VecDeque<(NodeId, NodeId, Option<M>)> = VecDeque::new();
        queue.push_back((new_root, NodeId::NONE, None));

        // Breadth-first copy keeps each child list in move order.
        while let Some((old_id, new_parent, via)) = queue.pop_front() {
            let new_id = NodeId(nodes.len() as u32);
            let old = self.get(old_id);
            nodes.push(SearchNode {
                parent: new_parent,
                children: Vec::with_capacity(old.children.len()),
                visit_count: old.visit_count,
                total_value: old.total_value,
                prior: if new_parent.is_none() { 1.0 } else { old.prior },
            });
            if let Some(via) = via {
                nodes[new_parent.index()].children.push((via, new_id));
            }
            for &(child_mv, child_id) in &old.children {
                queue.push_back((child_id, new_id, Some(child_mv)));
            }
        }

        self.nodes = nodes;
        self.root = NodeId(0);
        true
    }

    /// Discard everything and start again from an unvisited root.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.nodes.push(SearchNode::new_root());
        self.root = NodeId(0);
    }

    /// Get statistics about the tree for debugging.
    pub fn stats(&self) -> TreeStats {
        let root = self.get(self.root);
        TreeStats {
            total_nodes: self.nodes.len(),
            root_visits: root.visit_count,
            root_value: root.mean_value(),
            max_depth: self.compute_max_depth(self.root, 0),
        }
    }

    fn compute_max_depth(&self, node_id: NodeId, current_depth: u32) -> u32 {
        let node = self.get(node_id);
        if node.children.is_empty() {
            return current_depth;
        }

        node.children
            .iter()
            .map(|(_, id)| self.compute_max_depth(*id, current_depth + 1))
            .max()
            .unwrap_or(current_depth)
    }
}

/// Statistics about a search tree.
#[derive(Debug, Clone)]
pub struct TreeStats {
    pub total_nodes: usize,
    pub root_visits: u32,
    pub root_value: f32,
    pub max_depth: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tree() {
        let tree: SearchTree<usize> = SearchTree::new();

        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.root(), NodeId(0));
        assert!(tree.get(tree.root()).is_root());
        assert!(tree.get(tree.root()).is_leaf());
    }

    #[test]
    fn test_expand_sorts_children() {
        let mut tree = SearchTree::new();
        let added = tree.expand(tree.root(), &[(5, 0.2), (1, 0.5), (3, 0.3)]);

        assert_eq!(added, 3);
        assert_eq!(tree.node_count(), 4);
        let moves: Vec<usize> = tree
            .get(tree.root())
            .children
            .iter()
            .map(|(mv, _)| *mv)
            .collect();
        assert_eq!(moves, vec![1, 3, 5]);

        let child = tree.child(tree.root(), 1).unwrap();
        assert_eq!(tree.get(child).parent, tree.root());
        assert!((tree.get(child).prior - 0.5).abs() < 1e-6);
        assert!(tree.child(tree.root(), 2).is_none());
    }

    #[test]
    fn test_expand_is_idempotent_for_existing_moves() {
        let mut tree = SearchTree::new();
        tree.expand(tree.root(), &[(0, 0.5), (1, 0.5)]);
        let first = tree.child(tree.root(), 0).unwrap();
        tree.update_recursive(first, 1.0);

        // Overlapping expansion: 0 and 1 exist, 2 is new
        let added = tree.expand(tree.root(), &[(0, 0.9), (1, 0.05), (2, 0.05)]);
        assert_eq!(added, 1);
        assert_eq!(tree.get(tree.root()).children.len(), 3);

        let kept = tree.get(first);
        assert_eq!(tree.child(tree.root(), 0), Some(first));
        assert!((kept.prior - 0.5).abs() < 1e-6);
        assert_eq!(kept.visit_count, 1);
    }

    #[test]
    fn test_update_recursive_alternates_sign() {
        let mut tree = SearchTree::new();

        // Chain: root -> child -> grandchild
        tree.expand(tree.root(), &[(0, 1.0)]);
        let child_id = tree.child(tree.root(), 0).unwrap();
        tree.expand(child_id, &[(1, 1.0)]);
        let grandchild_id = tree.child(child_id, 1).unwrap();

        tree.update_recursive(grandchild_id, 1.0);

        assert_eq!(tree.get(grandchild_id).visit_count, 1);
        assert_eq!(tree.get(child_id).visit_count, 1);
        assert_eq!(tree.get(tree.root()).visit_count, 1);

        assert!((tree.get(grandchild_id).total_value - 1.0).abs() < 1e-6);
        assert!((tree.get(child_id).total_value - (-1.0)).abs() < 1e-6);
        assert!((tree.get(tree.root()).total_value - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_select_child_prefers_prior_when_unvisited() {
        let mut tree = SearchTree::new();
        tree.expand(tree.root(), &[(0, 0.3), (1, 0.7)]);
        tree.get_mut(tree.root()).visit_count = 1;

        let (mv, id) = tree.select_child(tree.root(), 1.0).unwrap();
        assert_eq!(mv, 1);
        assert_eq!(Some(id), tree.child(tree.root(), 1));
    }

    #[test]
    fn test_select_child_ties_go_to_first_move() {
        let mut tree = SearchTree::new();
        tree.expand(tree.root(), &[(4, 0.25), (2, 0.25), (7, 0.25), (3, 0.25)]);

        // Unvisited root: every score is exactly 0
        let (mv, _) = tree.select_child(tree.root(), 5.0).unwrap();
        assert_eq!(mv, 2);

        tree.get_mut(tree.root()).visit_count = 4;
        let (mv, _) = tree.select_child(tree.root(), 5.0).unwrap();
        assert_eq!(mv, 2);
    }

    #[test]
    fn test_select_child_uses_q_from_mover_perspective() {
        let mut tree = SearchTree::new();
        tree.expand(tree.root(), &[(0, 0.5), (1, 0.5)]);
        let a = tree.child(tree.root(), 0).unwrap();
        let b = tree.child(tree.root(), 1).unwrap();
        tree.update_recursive(a, -1.0);
        tree.update_recursive(b, 1.0);

        let (mv, _) = tree.select_child(tree.root(), 0.1).unwrap();
        assert_eq!(mv, 1);
    }

    #[test]
    fn test_select_child_on_leaf() {
        let tree: SearchTree<usize> = SearchTree::new();
        assert!(tree.select_child(tree.root(), 1.0).is_none());
        assert!(tree.best_move().is_none());
        assert!(tree.root_policy(1.0).is_empty());
    }

    #[test]
    fn test_best_move_ties_go_to_first_move() {
        let mut tree = SearchTree::new();
        tree.expand(tree.root(), &[(0, 0.5), (1, 0.5), (2, 0.5)]);
        for mv in [1, 2] {
            let id = tree.child(tree.root(), mv).unwrap();
            tree.get_mut(id).visit_count = 10;
        }
        assert_eq!(tree.best_move(), Some((1, 10)));
    }

    #[test]
    fn test_root_policy() {
        let mut tree = SearchTree::new();
        tree.expand(tree.root(), &[(0, 0.5), (1, 0.5)]);
        let c1 = tree.child(tree.root(), 0).unwrap();
        let c2 = tree.child(tree.root(), 1).unwrap();
        tree.get_mut(c1).visit_count = 30;
        tree.get_mut(c2).visit_count = 70;

        // Temperature 1.0: proportional to visits
        let policy = tree.root_policy(1.0);
        assert_eq!(policy.len(), 2);
        assert!((policy[0].1 - 0.3).abs() < 1e-5);
        assert!((policy[1].1 - 0.7).abs() < 1e-5);

        // Temperature 0.5: squares the visit counts
        let sharp = tree.root_policy(0.5);
        let expected = 4900.0 / (900.0 + 4900.0);
        assert!((sharp[1].1 - expected).abs() < 1e-4);

        // Small temperature converges to the argmax
        let cold = tree.root_policy(1e-3);
        assert!(cold[1].1 > 0.999);

        // Temperature 0.0: exact one-hot
        let greedy = tree.root_policy(0.0);
        assert_eq!(greedy, vec![(0, 0.0), (1, 1.0)]);
    }

    #[test]
    fn test_root_policy_unvisited_children_is_uniform() {
        let mut tree = SearchTree::new();
        tree.expand(tree.root(), &[(0, 0.9), (1, 0.1)]);
        let policy = tree.root_policy(1.0);
        assert!((policy[0].1 - 0.5).abs() < 1e-6);
        assert!((policy[1].1 - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_retain_subtree_keeps_statistics() {
        let mut tree = SearchTree::new();
        tree.expand(tree.root(), &[(0, 0.4), (1, 0.6)]);
        let keep = tree.child(tree.root(), 1).unwrap();
        tree.expand(keep, &[(3, 0.5), (2, 0.5)]);
        let grandchild = tree.child(keep, 3).unwrap();
        tree.update_recursive(grandchild, 1.0);
        tree.update_recursive(keep, 0.5);
        let drop = tree.child(tree.root(), 0).unwrap();
        tree.update_recursive(drop, -0.5);

        let before = tree.get(keep).clone();
        let grandchild_before = tree.get(grandchild).clone();

        assert!(tree.retain_subtree(1));

        assert_eq!(tree.node_count(), 3);
        let root = tree.get(tree.root());
        assert!(root.is_root());
        assert_eq!(root.visit_count, before.visit_count);
        assert!((root.total_value - before.total_value).abs() < 1e-6);

        let moves: Vec<usize> = root.children.iter().map(|(mv, _)| *mv).collect();
        assert_eq!(moves, vec![2, 3]);
        let new_grandchild = tree.child(tree.root(), 3).unwrap();
        assert_eq!(tree.get(new_grandchild).parent, tree.root());
        assert_eq!(
            tree.get(new_grandchild).visit_count,
            grandchild_before.visit_count
        );
    }

    #[test]
    fn test_retain_subtree_unknown_move_resets() {
        let mut tree = SearchTree::new();
        tree.expand(tree.root(), &[(0, 1.0)]);
        tree.update_recursive(tree.root(), 1.0);

        assert!(!tree.retain_subtree(5));
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.get(tree.root()).visit_count, 0);
        assert!(tree.get(tree.root()).is_leaf());
    }

    #[test]
    fn test_tree_stats() {
        let mut tree = SearchTree::new();
        tree.expand(tree.root(), &[(0, 0.5), (1, 0.5)]);
        let child = tree.child(tree.root(), 0).unwrap();
        tree.expand(child, &[(1, 1.0)]);

        let stats = tree.stats();
        assert_eq!(stats.total_nodes, 4);
        assert_eq!(stats.max_depth, 2);
        assert_eq!(stats.root_visits, 0);
    }
}
