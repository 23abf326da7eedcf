use crate::state::IntentionTreeState;
use crate::tree::IntentionTree;

/// Expanded node recorded by its labels, so it can be found again after a rebuild.
pub type LabelPath = Vec<String>;

/// Collects the label paths of every expanded node.
pub fn collect_expanded_paths(state: &IntentionTreeState, tree: &IntentionTree) -> Vec<LabelPath> {
    let mut paths: Vec<LabelPath> = state
        .expanded_ids()
        .filter(|&id| tree.is_category(id))
        .map(|id| tree.path_labels(id))
        .collect();
    // Parents before children keeps restore order deterministic.
    paths.sort();
    paths
}

/// Re-expands every recorded path that still resolves in `tree`.
///
/// Returns how many paths were restored.
pub fn restore_expanded_paths(
    state: &mut IntentionTreeState,
    tree: &IntentionTree,
    paths: &[LabelPath],
) -> usize {
    let mut restored = 0;
    for path in paths {
        if let Some(id) = tree.find_by_labels(path.as_slice()) {
            state.set_expanded(id, true);
            restored += 1;
        }
    }
    restored
}

/// Remembers which categories were expanded and which node was selected before
/// filtering started, so the user's layout comes back once the filter is cleared.
#[derive(Clone, Debug, Default)]
pub struct ExpansionMonitor {
    frozen: Option<FrozenLayout>,
}

#[derive(Clone, Debug)]
struct FrozenLayout {
    expanded: Vec<LabelPath>,
    selected: Option<LabelPath>,
}

impl ExpansionMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    /// Records the current expansion and selection; later changes are ignored
    /// until [`restore`](Self::restore).
    pub fn freeze(&mut self, state: &IntentionTreeState, tree: &IntentionTree) {
        if self.frozen.is_none() {
            self.frozen = Some(FrozenLayout {
                expanded: collect_expanded_paths(state, tree),
                selected: state.selected_id().map(|id| tree.path_labels(id)),
            });
        }
    }

    /// Re-applies the recorded layout to `tree` and unfreezes.
    ///
    /// A recorded selection that no longer resolves leaves the current selection
    /// alone. Does nothing when not frozen.
    pub fn restore(&mut self, state: &mut IntentionTreeState, tree: &IntentionTree) {
        let Some(layout) = self.frozen.take() else {
            return;
        };
        restore_expanded_paths(state, tree, &layout.expanded);
        if let Some(id) = layout
            .selected
            .as_deref()
            .and_then(|path| IntentionTreeState::find_labelled(tree, path))
        {
            state.select_by_id(tree, id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::IntentionMeta;

    fn tree(items: Vec<IntentionMeta>) -> IntentionTree {
        IntentionTree::from_sorted(&items)
    }

    #[test]
    fn paths_survive_rebuild() {
        let before = tree(vec![
            IntentionMeta::new(["A", "B"], "x"),
            IntentionMeta::new(["C"], "y"),
        ]);
        let mut state = IntentionTreeState::new();
        let b = before.find_by_labels(&["A", "B"]).unwrap();
        state.expand_to(&before, b);
        state.set_expanded(b, true);

        let paths = collect_expanded_paths(&state, &before);
        assert_eq!(paths, vec![vec!["A".to_owned()], vec!["A".to_owned(), "B".to_owned()]]);

        // Same labels, different ids.
        let after = tree(vec![
            IntentionMeta::new(["0"], "z"),
            IntentionMeta::new(["A", "B"], "x"),
        ]);
        let mut fresh = IntentionTreeState::new();
        let restored = restore_expanded_paths(&mut fresh, &after, &paths);

        assert_eq!(restored, 2);
        assert!(fresh.is_expanded(after.find_by_labels(&["A", "B"]).unwrap()));
        assert!(!fresh.is_expanded(after.find_by_labels(&["0"]).unwrap()));
    }

    #[test]
    fn monitor_restores_frozen_layout_once() {
        let t = tree(vec![IntentionMeta::new(["A"], "x"), IntentionMeta::new(["C"], "y")]);
        let mut state = IntentionTreeState::new();
        let a = t.find_by_labels(&["A"]).unwrap();
        state.set_expanded(a, true);

        let mut monitor = ExpansionMonitor::new();
        monitor.freeze(&state, &t);
        assert!(monitor.is_frozen());

        state.expand_all(&t);
        // A second freeze keeps the first snapshot.
        monitor.freeze(&state, &t);
        state.collapse_all();

        monitor.restore(&mut state, &t);
        assert!(!monitor.is_frozen());
        assert!(state.is_expanded(a));
        assert!(!state.is_expanded(t.find_by_labels(&["C"]).unwrap()));
    }

    #[test]
    fn monitor_reselects_frozen_selection_after_rebuild() {
        let items = vec![
            IntentionMeta::new(["A"], "x"),
            IntentionMeta::new(["C"], "y"),
        ];
        let before = tree(items.clone());
        let mut state = IntentionTreeState::new();
        state.select_by_id(&before, before.find_intention("y").unwrap());

        let mut monitor = ExpansionMonitor::new();
        monitor.freeze(&state, &before);

        let after = tree(items);
        state.reload();
        state.ensure_visible_nodes(&after);
        state.select_first();
        monitor.restore(&mut state, &after);

        assert_eq!(state.selected_id(), after.find_intention("y"));
        assert!(state.is_expanded(after.find_by_labels(&["C"]).unwrap()));
        assert!(!state.is_expanded(after.find_by_labels(&["A"]).unwrap()));
    }
}
