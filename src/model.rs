use std::hash::Hash;

/// Minimal tree contract used for traversal.
///
/// A proper tree is expected (not a DAG):
/// - no cycles (DFS traversal is used directly);
/// - each node has exactly one parent;
/// - identifiers are stable while the tree is alive.
pub trait TreeModel {
    /// Node identifier type.
    type Id: Copy + Eq + Hash;

    /// Returns the root node (or `None` if the tree is empty).
    fn root(&self) -> Option<Self::Id>;
    /// Returns the node's children in insertion order.
    fn children(&self, id: Self::Id) -> &[Self::Id];
    /// Returns `true` if the node exists in the model.
    fn contains(&self, id: Self::Id) -> bool;
    /// Returns an approximate size hint (not required to be exact).
    fn size_hint(&self) -> usize {
        0
    }

    /// Calls `visit` for each direct child of `id`.
    fn visit_children<F>(&self, id: Self::Id, mut visit: F)
    where
        F: FnMut(Self::Id),
    {
        for child in self.children(id).iter().copied() {
            visit(child);
        }
    }

    /// Pre-order walk of the subtree rooted at `id`, including `id` itself.
    ///
    /// Returning `false` from `visit` skips that node's descendants.
    fn walk<F>(&self, id: Self::Id, mut visit: F)
    where
        F: FnMut(Self::Id) -> bool,
    {
        let mut stack = Vec::with_capacity(self.size_hint().max(1));
        stack.push(id);
        while let Some(node) = stack.pop() {
            if !visit(node) {
                continue;
            }
            // Reverse so the first child is visited first.
            stack.extend(self.children(node).iter().rev().copied());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestTree {
        children: Vec<Vec<usize>>,
    }

    impl TreeModel for TestTree {
        type Id = usize;

        fn root(&self) -> Option<Self::Id> {
            Some(0)
        }

        fn children(&self, id: Self::Id) -> &[Self::Id] {
            &self.children[id]
        }

        fn contains(&self, id: Self::Id) -> bool {
            id < self.children.len()
        }
    }

    fn tree() -> TestTree {
        TestTree {
            children: vec![
                vec![1, 2], // 0
                vec![3, 4], // 1
                vec![],     // 2
                vec![],     // 3
                vec![],     // 4
            ],
        }
    }

    #[test]
    fn walk_is_pre_order() {
        let tree = tree();
        let mut order = Vec::new();
        tree.walk(0, |id| {
            order.push(id);
            true
        });
        assert_eq!(order, vec![0, 1, 3, 4, 2]);
    }

    #[test]
    fn walk_can_prune_subtrees() {
        let tree = tree();
        let mut order = Vec::new();
        tree.walk(0, |id| {
            order.push(id);
            id != 1
        });
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn visit_children_is_shallow() {
        let tree = tree();
        let mut seen = Vec::new();
        tree.visit_children(0, |id| seen.push(id));
        assert_eq!(seen, vec![1, 2]);
    }
}
