use ratatui::widgets::TableState;
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::action::{TreeAction, TreeEvent};
use crate::expansion::{LabelPath, collect_expanded_paths, restore_expanded_paths};
use crate::model::TreeModel;
use crate::style::TreeScrollPolicy;
use crate::tree::{IntentionTree, NodeId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "keymap")]
use crate::keymap::TreeKeyBindings;

/// A visible node row with metadata used for rendering and navigation.
#[derive(Clone, Debug)]
pub struct VisibleNode {
    pub(crate) id: NodeId,
    pub(crate) level: u16,
    pub(crate) parent: Option<NodeId>,
    pub(crate) has_children: bool,
    pub(crate) is_tail_stack: SmallVec<[bool; 8]>,
}

/// View state of an [`IntentionTree`]: expanded categories, selection and the
/// visible-row cache.
///
/// The hidden root is always expanded; its children are the top rows.
pub struct IntentionTreeState {
    list_state: TableState,
    expanded: FxHashSet<NodeId>,
    // Cached visible rows to avoid recomputing DFS every render.
    visible_nodes: Vec<VisibleNode>,
    // Fast lookup from node id to visible row index.
    visible_index: FxHashMap<NodeId, usize>,
    // Marks whether visible_nodes must be rebuilt.
    dirty: bool,
    draw_lines: bool,
    #[cfg(feature = "keymap")]
    keymap: TreeKeyBindings,
}

/// Snapshot of view state, keyed by labels so it survives rebuilds.
///
/// With the `serde` feature enabled, this type derives `Serialize`/`Deserialize`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntentionTreeSnapshot {
    /// Expanded categories as label paths.
    pub expanded: Vec<LabelPath>,
    /// Label path of the selected node.
    pub selected: Option<LabelPath>,
    /// Scroll offset within the visible list.
    pub offset: usize,
    /// Whether guide lines were enabled.
    pub draw_lines: bool,
}

impl Default for IntentionTreeState {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentionTreeState {
    /// Creates a new empty state with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a state with preallocated capacity for the given number of nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            list_state: TableState::default(),
            expanded: FxHashSet::with_capacity_and_hasher(capacity, FxBuildHasher),
            visible_nodes: Vec::with_capacity(capacity),
            visible_index: FxHashMap::with_capacity_and_hasher(capacity, FxBuildHasher),
            dirty: true,
            draw_lines: true,
            #[cfg(feature = "keymap")]
            keymap: TreeKeyBindings::new(),
        }
    }

    #[cfg(feature = "keymap")]
    /// Returns the key binding set.
    pub const fn keymap(&self) -> &TreeKeyBindings {
        &self.keymap
    }

    #[cfg(feature = "keymap")]
    /// Returns a mutable reference to the key binding set.
    pub const fn keymap_mut(&mut self) -> &mut TreeKeyBindings {
        &mut self.keymap
    }

    pub(crate) const fn list_state(&self) -> &TableState {
        &self.list_state
    }

    pub(crate) const fn list_state_mut(&mut self) -> &mut TableState {
        &mut self.list_state
    }

    pub(crate) fn visible_nodes(&self) -> &[VisibleNode] {
        &self.visible_nodes
    }

    fn visible_index_of(&self, id: NodeId) -> Option<usize> {
        self.visible_index.get(&id).copied()
    }

    /// Returns whether a category is expanded.
    pub fn is_expanded(&self, id: NodeId) -> bool {
        id == NodeId::ROOT || self.expanded.contains(&id)
    }

    pub(crate) fn expanded_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.expanded.iter().copied()
    }

    /// Captures a snapshot of the current state for persistence or restore.
    pub fn snapshot(&self, tree: &IntentionTree) -> IntentionTreeSnapshot {
        IntentionTreeSnapshot {
            expanded: collect_expanded_paths(self, tree),
            selected: self.selected_id().map(|id| tree.path_labels(id)),
            offset: self.list_state.offset(),
            draw_lines: self.draw_lines,
        }
    }

    /// Restores state from a snapshot; paths missing from `tree` are skipped.
    pub fn restore(&mut self, tree: &IntentionTree, snapshot: &IntentionTreeSnapshot) {
        self.expanded.clear();
        restore_expanded_paths(self, tree, &snapshot.expanded);
        self.draw_lines = snapshot.draw_lines;
        *self.list_state.offset_mut() = snapshot.offset;
        self.dirty = true;
        self.ensure_visible_nodes(tree);

        let selected = snapshot
            .selected
            .as_ref()
            .and_then(|path| Self::find_labelled(tree, path));
        match selected {
            Some(id) => {
                self.select_by_id(tree, id);
            }
            None => self.list_state.select(None),
        }
    }

    // Category paths resolve directly; leaves are looked up under their category.
    pub(crate) fn find_labelled(tree: &IntentionTree, path: &[String]) -> Option<NodeId> {
        if let Some(id) = tree.find_by_labels(path) {
            return Some(id);
        }
        let (leaf, parents) = path.split_last()?;
        let parent = tree.find_by_labels(parents)?;
        tree.children(parent)
            .iter()
            .copied()
            .find(|&child| tree.intention(child).is_some() && tree.text(child) == leaf)
    }

    /// Returns whether guide lines are drawn.
    #[inline]
    pub const fn draw_lines(&self) -> bool {
        self.draw_lines
    }

    /// Enables or disables drawing of guide lines.
    pub const fn set_draw_lines(&mut self, draw: bool) {
        self.draw_lines = draw;
    }

    /// Forgets all expansion and selection, for a freshly built tree.
    pub fn reload(&mut self) {
        self.expanded.clear();
        self.visible_nodes.clear();
        self.visible_index.clear();
        self.list_state.select(None);
        *self.list_state.offset_mut() = 0;
        self.dirty = true;
    }

    /// Selects the first visible row.
    pub const fn select_first(&mut self) {
        self.list_state.select_first();
    }

    /// Selects the last visible row.
    pub const fn select_last(&mut self) {
        self.list_state.select_last();
    }

    /// Moves selection to the previous visible row.
    pub fn select_prev(&mut self) {
        if self.visible_nodes.is_empty() {
            self.list_state.select(None);
            return;
        }
        let selected = self.list_state.selected().unwrap_or(0);
        self.list_state.select(Some(selected.saturating_sub(1)));
    }

    /// Moves selection to the next visible row.
    pub fn select_next(&mut self) {
        if self.visible_nodes.is_empty() {
            self.list_state.select(None);
            return;
        }
        let selected = self.list_state.selected().unwrap_or(0);
        let new_selected = (selected + 1).min(self.visible_nodes.len().saturating_sub(1));
        self.list_state.select(Some(new_selected));
    }

    /// Adjusts scroll offset so the selection is within the viewport.
    pub fn ensure_selection_visible(&mut self, viewport_height: usize) {
        self.clamp_selection();
        let Some(selected) = self.list_state.selected() else {
            return;
        };
        let viewport_height = viewport_height.max(1);
        let offset = self.list_state.offset();
        if selected < offset {
            *self.list_state.offset_mut() = selected;
        } else if selected >= offset + viewport_height {
            *self.list_state.offset_mut() = selected + 1 - viewport_height;
        }
    }

    /// Adjusts selection visibility according to the provided scroll policy.
    pub fn ensure_selection_visible_with_policy(
        &mut self,
        viewport_height: usize,
        policy: TreeScrollPolicy,
    ) {
        match policy {
            TreeScrollPolicy::KeepInView => self.ensure_selection_visible(viewport_height),
            TreeScrollPolicy::CenterOnSelect => {
                self.ensure_selection_visible_centered(viewport_height);
            }
        }
    }

    fn ensure_selection_visible_centered(&mut self, viewport_height: usize) {
        self.clamp_selection();
        let Some(selected) = self.list_state.selected() else {
            return;
        };
        let viewport_height = viewport_height.max(1);
        let total = self.visible_nodes.len();
        if total <= viewport_height {
            *self.list_state.offset_mut() = 0;
            return;
        }

        let half = viewport_height / 2;
        let max_offset = total.saturating_sub(viewport_height);
        *self.list_state.offset_mut() = selected.saturating_sub(half).min(max_offset);
    }

    /// Returns the id of the currently selected node, if any.
    pub fn selected_id(&self) -> Option<NodeId> {
        self.list_state
            .selected()
            .and_then(|idx| self.visible_nodes.get(idx).map(|node| node.id))
    }

    /// Returns the row index of the selection, if any.
    pub fn selected_row(&self) -> Option<usize> {
        self.list_state.selected()
    }

    /// Returns the number of visible nodes in the current view.
    pub const fn visible_len(&self) -> usize {
        self.visible_nodes.len()
    }

    /// Returns the ids of the visible rows, top to bottom.
    pub fn visible_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.visible_nodes.iter().map(|node| node.id)
    }

    /// Expands the tree to the node and selects it if present.
    pub fn select_by_id(&mut self, tree: &IntentionTree, id: NodeId) -> bool {
        let _ = self.expand_to(tree, id);
        self.ensure_visible_nodes(tree);
        if let Some(idx) = self.visible_index_of(id) {
            self.list_state.select(Some(idx));
            true
        } else {
            false
        }
    }

    /// Expands every ancestor of the node so it becomes visible.
    pub fn expand_to(&mut self, tree: &IntentionTree, id: NodeId) -> bool {
        if !tree.contains(id) {
            return false;
        }
        let mut current = tree.parent(id);
        while let Some(node) = current {
            if node != NodeId::ROOT {
                self.expanded.insert(node);
            }
            current = tree.parent(node);
        }
        self.dirty = true;
        true
    }

    /// Expands all categories.
    pub fn expand_all(&mut self, tree: &IntentionTree) {
        self.expanded.clear();
        let extra = tree.size_hint().saturating_sub(self.expanded.capacity());
        if extra > 0 {
            self.expanded.reserve(extra);
        }
        tree.walk(NodeId::ROOT, |node| {
            if node != NodeId::ROOT && !tree.children(node).is_empty() {
                self.expanded.insert(node);
            }
            true
        });
        self.dirty = true;
    }

    /// Collapses all categories; top-level rows stay visible.
    pub fn collapse_all(&mut self) {
        self.expanded.clear();
        self.dirty = true;
    }

    /// Ensures the visible node list is up to date (if marked dirty).
    pub fn ensure_visible_nodes(&mut self, tree: &IntentionTree) {
        if !self.dirty {
            return;
        }
        self.update_visible_nodes(tree);
    }

    /// Handles a tree action and returns the resulting event.
    ///
    /// Actions that need the panel (`ToggleCheck`, `FocusFilter`) and custom
    /// actions are forwarded as [`TreeEvent::Action`].
    pub fn handle_action<C>(&mut self, tree: &IntentionTree, action: TreeAction<C>) -> TreeEvent<C> {
        self.ensure_visible_nodes(tree);

        if matches!(
            &action,
            TreeAction::Custom(_) | TreeAction::FocusFilter | TreeAction::ToggleCheck
        ) {
            return TreeEvent::Action(action);
        }

        if self.visible_nodes.is_empty() {
            return TreeEvent::Unhandled;
        }

        match action {
            TreeAction::SelectPrev => {
                self.select_prev();
                TreeEvent::Handled
            }
            TreeAction::SelectNext => {
                self.select_next();
                TreeEvent::Handled
            }
            TreeAction::SelectParent => {
                self.select_parent();
                TreeEvent::Handled
            }
            TreeAction::SelectChild => {
                self.select_child_with_descendants(tree);
                TreeEvent::Handled
            }
            TreeAction::ToggleRecursive => {
                if let Some(selected_idx) = self.list_state.selected()
                    && let Some(node) = self.visible_nodes.get(selected_idx)
                    && node.has_children
                {
                    let id = node.id;
                    let should_expand = !self.expanded.contains(&id);
                    self.set_expanded_recursive(tree, id, should_expand);
                    self.dirty = true;
                    return TreeEvent::Handled;
                }
                TreeEvent::Unhandled
            }
            TreeAction::ToggleNode => {
                if let Some(selected_idx) = self.list_state.selected()
                    && let Some(node) = self.visible_nodes.get(selected_idx)
                    && node.has_children
                {
                    self.toggle(node.id);
                    return TreeEvent::Handled;
                }
                TreeEvent::Unhandled
            }
            TreeAction::ExpandAll => {
                self.expand_all(tree);
                TreeEvent::Handled
            }
            TreeAction::CollapseAll => {
                self.collapse_all();
                TreeEvent::Handled
            }
            TreeAction::ToggleGuides => {
                self.draw_lines = !self.draw_lines;
                TreeEvent::Handled
            }
            TreeAction::SelectFirst => {
                self.select_first();
                TreeEvent::Handled
            }
            TreeAction::SelectLast => {
                self.select_last();
                TreeEvent::Handled
            }
            TreeAction::ToggleCheck | TreeAction::FocusFilter | TreeAction::Custom(_) => {
                TreeEvent::Action(action)
            }
        }
    }

    /// Toggles expansion state for the given node.
    pub fn toggle(&mut self, id: NodeId) {
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
        self.dirty = true;
    }

    /// Sets expansion state for the given node.
    pub fn set_expanded(&mut self, id: NodeId, expand: bool) {
        if expand {
            self.expanded.insert(id);
        } else {
            self.expanded.remove(&id);
        }
        self.dirty = true;
    }

    fn update_visible_nodes(&mut self, tree: &IntentionTree) {
        self.visible_nodes.clear();
        self.visible_index.clear();
        let hint = tree.size_hint();
        self.visible_nodes
            .reserve(hint.saturating_sub(self.visible_nodes.capacity()));

        let mut is_tail_stack: SmallVec<[bool; 8]> = SmallVec::new();
        let top = tree.children(NodeId::ROOT);
        for (i, child) in top.iter().copied().enumerate() {
            is_tail_stack.push(i + 1 == top.len());
            self.build_visible_nodes(tree, child, 1, None, &mut is_tail_stack);
            is_tail_stack.pop();
        }
        self.dirty = false;
        self.clamp_selection();
    }

    fn build_visible_nodes(
        &mut self,
        tree: &IntentionTree,
        id: NodeId,
        level: u16,
        parent: Option<NodeId>,
        is_tail_stack: &mut SmallVec<[bool; 8]>,
    ) {
        let children = tree.children(id);
        let has_children = !children.is_empty();
        let idx = self.visible_nodes.len();
        self.visible_nodes.push(VisibleNode {
            id,
            level,
            parent,
            has_children,
            is_tail_stack: is_tail_stack.clone(),
        });
        self.visible_index.insert(id, idx);

        if !has_children || !self.expanded.contains(&id) {
            return;
        }

        for (i, child) in children.iter().copied().enumerate() {
            is_tail_stack.push(i + 1 == children.len());
            self.build_visible_nodes(tree, child, level + 1, Some(id), is_tail_stack);
            is_tail_stack.pop();
        }
    }

    const fn clamp_selection(&mut self) {
        if self.visible_nodes.is_empty() {
            self.list_state.select(None);
            return;
        }

        if let Some(selected) = self.list_state.selected()
            && selected >= self.visible_nodes.len()
        {
            self.list_state
                .select(Some(self.visible_nodes.len().saturating_sub(1)));
        }
    }

    fn select_parent(&mut self) {
        let Some(parent_id) = self
            .list_state
            .selected()
            .and_then(|idx| self.visible_nodes.get(idx))
            .and_then(|node| node.parent)
        else {
            return;
        };

        if let Some(parent_idx) = self.visible_index_of(parent_id) {
            self.list_state.select(Some(parent_idx));
        }
    }

    fn select_child_with_descendants(&mut self, tree: &IntentionTree) {
        let Some(mut selected_idx) = self.list_state.selected() else {
            return;
        };
        let Some(selected_node) = self.visible_nodes.get(selected_idx) else {
            return;
        };
        let id = selected_node.id;
        let mut level = selected_node.level;

        if selected_node.has_children {
            if self.expanded.insert(id) {
                self.update_visible_nodes(tree);

                let Some(current_idx) = self.visible_index_of(id) else {
                    return;
                };
                selected_idx = current_idx;
                level = self.visible_nodes[current_idx].level;
                self.list_state.select(Some(current_idx));
            }

            // Prefer children that themselves have descendants.
            for idx in selected_idx + 1..self.visible_nodes.len() {
                let candidate = &self.visible_nodes[idx];
                if candidate.level <= level {
                    break;
                }
                if candidate.level == level + 1 && candidate.has_children {
                    self.list_state.select(Some(idx));
                    return;
                }
            }
        }

        // Fallback: the next row in the subtree (intentions included).
        if let Some(next) = self.visible_nodes.get(selected_idx + 1)
            && next.level > level
        {
            self.list_state.select(Some(selected_idx + 1));
        }
    }

    fn set_expanded_recursive(&mut self, tree: &IntentionTree, id: NodeId, expand: bool) {
        tree.walk(id, |node| {
            if tree.children(node).is_empty() {
                return false;
            }
            if expand {
                self.expanded.insert(node);
            } else {
                self.expanded.remove(&node);
            }
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::IntentionMeta;

    // Rows: A, A/B, A/B/x, A/y, C, C/z
    fn sample() -> IntentionTree {
        IntentionTree::from_sorted(&[
            IntentionMeta::new(["A", "B"], "x"),
            IntentionMeta::new(["A"], "y"),
            IntentionMeta::new(["C"], "z"),
        ])
    }

    fn texts(state: &IntentionTreeState, tree: &IntentionTree) -> Vec<String> {
        state
            .visible_ids()
            .map(|id| tree.text(id).to_owned())
            .collect()
    }

    #[test]
    fn collapsed_tree_shows_top_rows_only() {
        let tree = sample();
        let mut state = IntentionTreeState::new();
        state.ensure_visible_nodes(&tree);

        assert_eq!(texts(&state, &tree), vec!["A", "C"]);
        let levels: Vec<_> = state.visible_nodes().iter().map(|n| n.level).collect();
        assert_eq!(levels, vec![1, 1]);
    }

    #[test]
    fn expand_all_shows_every_row_in_order() {
        let tree = sample();
        let mut state = IntentionTreeState::new();
        state.expand_all(&tree);
        state.ensure_visible_nodes(&tree);

        assert_eq!(texts(&state, &tree), vec!["A", "B", "x", "y", "C", "z"]);
        let levels: Vec<_> = state.visible_nodes().iter().map(|n| n.level).collect();
        assert_eq!(levels, vec![1, 2, 3, 2, 1, 2]);
    }

    #[test]
    fn select_by_id_expands_ancestors() {
        let tree = sample();
        let mut state = IntentionTreeState::new();
        let x = tree.find_intention("x").unwrap();

        assert!(state.select_by_id(&tree, x));

        assert_eq!(state.selected_id(), Some(x));
        assert_eq!(texts(&state, &tree), vec!["A", "B", "x", "y", "C"]);
    }

    #[test]
    fn select_child_descends_and_parent_returns() {
        let tree = sample();
        let mut state = IntentionTreeState::new();
        state.ensure_visible_nodes(&tree);
        state.select_first();

        assert_eq!(state.handle_action::<()>(&tree, TreeAction::SelectChild), TreeEvent::Handled);
        assert_eq!(state.selected_id().map(|id| tree.text(id)), Some("B"));

        state.handle_action::<()>(&tree, TreeAction::SelectParent);
        assert_eq!(state.selected_id().map(|id| tree.text(id)), Some("A"));
    }

    #[test]
    fn toggle_check_is_forwarded() {
        let tree = sample();
        let mut state = IntentionTreeState::new();
        assert_eq!(
            state.handle_action::<()>(&tree, TreeAction::ToggleCheck),
            TreeEvent::Action(TreeAction::ToggleCheck)
        );
    }

    #[test]
    fn toggle_recursive_collapses_subtree() {
        let tree = sample();
        let mut state = IntentionTreeState::new();
        state.ensure_visible_nodes(&tree);
        state.select_first();

        state.handle_action::<()>(&tree, TreeAction::ToggleRecursive);
        assert!(state.is_expanded(tree.find_by_labels(&["A", "B"]).unwrap()));

        state.handle_action::<()>(&tree, TreeAction::ToggleRecursive);
        state.ensure_visible_nodes(&tree);
        assert_eq!(texts(&state, &tree), vec!["A", "C"]);
    }

    #[test]
    fn empty_tree_clears_selection() {
        let tree = IntentionTree::new();
        let mut state = IntentionTreeState::new();
        state.list_state.select(Some(0));
        state.ensure_visible_nodes(&tree);

        assert_eq!(state.selected_id(), None);
        assert_eq!(
            state.handle_action::<()>(&tree, TreeAction::SelectNext),
            TreeEvent::Unhandled
        );
    }

    #[test]
    fn snapshot_restores_onto_rebuilt_tree() {
        let tree = sample();
        let mut state = IntentionTreeState::new();
        let y = tree.find_intention("y").unwrap();
        state.select_by_id(&tree, y);

        let snapshot = state.snapshot(&tree);
        assert_eq!(snapshot.selected, Some(vec!["A".to_owned(), "y".to_owned()]));

        let rebuilt = IntentionTree::from_sorted(&[
            IntentionMeta::new(["0"], "first"),
            IntentionMeta::new(["A"], "y"),
        ]);
        let mut restored = IntentionTreeState::new();
        restored.restore(&rebuilt, &snapshot);

        assert_eq!(restored.selected_id(), rebuilt.find_intention("y"));
    }
}
