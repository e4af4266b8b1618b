//! Depth Limiter
//!
//! Copies a subtree of the forest out into an owned [`CallTree`], cutting it
//! at a maximum depth relative to the chosen root. The forest itself is never
//! touched, so the same forest can serve any number of requests.

use crate::domain::forest::{CallForest, NodeId};
use crate::domain::line::CallRecord;

/// Owned, possibly depth-bounded copy of a forest subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallTree {
    pub record: CallRecord,
    /// Depth in the forest, not relative to the tree root.
    pub depth: usize,
    /// Callees exist in the input but were cut by the depth bound.
    /// Never inferred from `children` being empty.
    pub truncated: bool,
    pub children: Vec<CallTree>,
}

impl CallTree {
    pub fn name(&self) -> &str {
        &self.record.name
    }

    /// Calls nothing, as opposed to having its calls cut off.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty() && !self.truncated
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(CallTree::node_count).sum::<usize>()
    }

    /// Levels below the root; 0 for a single node.
    pub fn height(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.height() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Nodes in preorder, which is input order.
    pub fn preorder(&self) -> Vec<&CallTree> {
        let mut out = Vec::with_capacity(self.node_count());
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }
}

/// Copy the subtree at `root`, keeping at most `max_depth` levels below it.
/// `None` keeps everything.
pub fn limit_depth(forest: &CallForest, root: NodeId, max_depth: Option<usize>) -> CallTree {
    let node = forest.node(root);

    if max_depth == Some(0) {
        return CallTree {
            record: node.record.clone(),
            depth: node.depth,
            truncated: !node.children.is_empty(),
            children: Vec::new(),
        };
    }

    let remaining = max_depth.map(|k| k - 1);
    CallTree {
        record: node.record.clone(),
        depth: node.depth,
        truncated: false,
        children: node
            .children
            .iter()
            .map(|&child| limit_depth(forest, child, remaining))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAIN: &str = "\
main()
    helper():
        leaf()
    other():
";

    fn forest() -> CallForest {
        CallForest::parse(CHAIN).unwrap().forest
    }

    #[test]
    fn test_zero_depth_is_single_node() {
        let forest = forest();
        let tree = limit_depth(&forest, forest.roots()[0], Some(0));
        assert!(tree.children.is_empty());
        assert!(tree.truncated);
        assert!(!tree.is_leaf());
    }

    #[test]
    fn test_cut_marks_only_nodes_with_callees() {
        let forest = forest();
        let tree = limit_depth(&forest, forest.roots()[0], Some(1));
        assert_eq!(tree.children.len(), 2);
        assert!(tree.children[0].truncated);
        // `other:` has no callees in the input, so it stays a true leaf.
        assert!(tree.children[1].is_leaf());
        assert_eq!(tree.height(), 1);
    }

    #[test]
    fn test_unbounded_copies_everything() {
        let forest = forest();
        let tree = limit_depth(&forest, forest.roots()[0], None);
        assert_eq!(tree.node_count(), forest.len());
        assert_eq!(tree.height(), 2);
        let order: Vec<&str> = tree.preorder().iter().map(|t| t.name()).collect();
        assert_eq!(order, vec!["main", "helper", "leaf", "other"]);
    }

    #[test]
    fn test_depth_is_absolute() {
        let forest = forest();
        let helper = forest.node(forest.roots()[0]).children[0];
        let tree = limit_depth(&forest, helper, None);
        assert_eq!(tree.depth, 1);
        assert_eq!(tree.children[0].depth, 2);
    }
}
