use log::{debug, trace};
use rustc_hash::{FxBuildHasher, FxHashMap};

use crate::model::TreeModel;
use crate::settings::{IntentionMeta, IntentionSettings};
use crate::tree::{IntentionTree, NodeId};

/// Last known check state per intention.
///
/// Survives tree rebuilds so edits made under one filter are kept when the
/// filter changes. Cleared only by [`load`](Self::load).
#[derive(Clone, Debug, Default)]
pub struct CheckStateMap {
    states: FxHashMap<IntentionMeta, bool>,
}

impl CheckStateMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded intentions.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns `true` if nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Returns the recorded state for an intention.
    pub fn get(&self, intention: &IntentionMeta) -> Option<bool> {
        self.states.get(intention).copied()
    }

    /// Records a state for an intention.
    pub fn insert(&mut self, intention: IntentionMeta, checked: bool) {
        self.states.insert(intention, checked);
    }

    /// Replaces the map with the settings source's current flags.
    pub fn load<S: IntentionSettings + ?Sized>(&mut self, settings: &S) -> Vec<IntentionMeta> {
        let intentions = settings.intentions();
        self.states.clear();
        self.states.reserve(intentions.len());
        for meta in &intentions {
            self.states.insert(meta.clone(), settings.is_enabled(meta));
        }
        debug!("loaded {} intention states", self.states.len());
        intentions
    }

    /// Records every leaf's current flag.
    pub fn capture(&mut self, tree: &IntentionTree) {
        tree.walk(NodeId::ROOT, |id| {
            if let Some(meta) = tree.intention(id) {
                self.states.insert(meta.clone(), tree.is_checked(id));
            }
            true
        });
    }

    /// Sets every leaf from the map (missing entries become `false`) and every
    /// category to the OR of its children. Returns the root's resulting flag.
    pub fn reconcile(&self, tree: &mut IntentionTree) -> bool {
        self.reconcile_node(tree, NodeId::ROOT)
    }

    fn reconcile_node(&self, tree: &mut IntentionTree, id: NodeId) -> bool {
        if let Some(meta) = tree.intention(id) {
            let checked = self.get(meta) == Some(true);
            tree.set_flag(id, checked);
            return checked;
        }

        let mut checked = false;
        for idx in 0..tree.children(id).len() {
            let child = tree.children(id)[idx];
            // No short-circuit: every descendant must be reconciled.
            checked |= self.reconcile_node(tree, child);
        }
        tree.set_flag(id, checked);
        checked
    }
}

impl FromIterator<(IntentionMeta, bool)> for CheckStateMap {
    fn from_iter<I: IntoIterator<Item = (IntentionMeta, bool)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut states =
            FxHashMap::with_capacity_and_hasher(iter.size_hint().0, FxBuildHasher);
        states.extend(iter);
        Self { states }
    }
}

/// Writes every leaf's flag to the settings source, once per leaf.
pub fn apply<S: IntentionSettings + ?Sized>(tree: &IntentionTree, settings: &mut S) {
    let mut written = 0usize;
    tree.walk(NodeId::ROOT, |id| {
        if let Some(meta) = tree.intention(id) {
            let checked = tree.is_checked(id);
            trace!("apply {:?} / {} = {checked}", meta.category, meta.family);
            settings.set_enabled(meta, checked);
            written += 1;
        }
        true
    });
    debug!("applied {written} intention states");
}

/// Returns `true` if any leaf differs from the settings source.
pub fn is_modified<S: IntentionSettings + ?Sized>(tree: &IntentionTree, settings: &S) -> bool {
    let mut modified = false;
    tree.walk(NodeId::ROOT, |id| {
        if modified {
            return false;
        }
        if let Some(meta) = tree.intention(id) {
            modified = settings.is_enabled(meta) != tree.is_checked(id);
        }
        true
    });
    modified
}
