use crate::model::TreeModel;
use crate::settings::IntentionMeta;

/// Identifier of a node within one [`IntentionTree`] build.
///
/// Ids are indices into the tree's arena and are not stable across rebuilds; use
/// label paths ([`IntentionTree::path_labels`]) to carry positions over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The hidden root of every tree.
    pub const ROOT: Self = Self(0);

    /// Returns the arena index.
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Payload of a tree node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// The hidden root.
    Root,
    /// A grouping label.
    Category(String),
    /// A leaf wrapping one intention.
    Intention(IntentionMeta),
}

#[derive(Clone, Debug)]
struct CheckedNode {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    checked: bool,
}

impl CheckedNode {
    const fn new(kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            checked: false,
        }
    }
}

/// Arena-backed tree of category and intention nodes with check flags.
#[derive(Clone, Debug)]
pub struct IntentionTree {
    nodes: Vec<CheckedNode>,
}

impl Default for IntentionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentionTree {
    /// Creates a tree holding only the hidden root.
    pub fn new() -> Self {
        Self {
            nodes: vec![CheckedNode::new(NodeKind::Root, None)],
        }
    }

    /// Builds a tree from intentions sorted by category path, then family.
    ///
    /// Category nodes are created on demand and reused by exact label; leaves keep
    /// input order within their category. An empty category path attaches the
    /// leaf to the root.
    pub fn from_sorted(intentions: &[IntentionMeta]) -> Self {
        let mut tree = Self::new();
        for meta in intentions {
            let mut node = NodeId::ROOT;
            for label in &meta.category {
                node = match tree.find_child(node, label) {
                    Some(child) => child,
                    None => tree.push_child(node, NodeKind::Category(label.clone())),
                };
            }
            tree.push_child(node, NodeKind::Intention(meta.clone()));
        }
        tree
    }

    fn push_child(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(CheckedNode::new(kind, Some(parent)));
        self.nodes[parent.0].children.push(id);
        id
    }

    fn node(&self, id: NodeId) -> Option<&CheckedNode> {
        self.nodes.get(id.0)
    }

    /// Total number of nodes, the hidden root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree holds no category or intention.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Returns the payload of a node.
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|node| &node.kind)
    }

    /// Returns the intention wrapped by a leaf.
    pub fn intention(&self, id: NodeId) -> Option<&IntentionMeta> {
        match self.kind(id) {
            Some(NodeKind::Intention(meta)) => Some(meta),
            _ => None,
        }
    }

    /// Returns `true` for category nodes.
    pub fn is_category(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Category(_)))
    }

    /// Returns the parent of a node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.parent)
    }

    /// Display text: the category label or the intention family.
    pub fn text(&self, id: NodeId) -> &str {
        match self.kind(id) {
            Some(NodeKind::Category(label)) => label,
            Some(NodeKind::Intention(meta)) => &meta.family,
            Some(NodeKind::Root) | None => "",
        }
    }

    /// Returns the check flag of a node (`false` for unknown ids).
    pub fn is_checked(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|node| node.checked)
    }

    pub(crate) fn set_flag(&mut self, id: NodeId, checked: bool) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.checked = checked;
        }
    }

    /// Finds a direct category child by exact label.
    pub fn find_child(&self, parent: NodeId, label: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&child| matches!(self.kind(child), Some(NodeKind::Category(l)) if l == label))
    }

    /// Finds the first intention (pre-order) whose family equals `family`.
    pub fn find_intention(&self, family: &str) -> Option<NodeId> {
        let mut found = None;
        self.walk(NodeId::ROOT, |id| {
            if found.is_some() {
                return false;
            }
            if let Some(meta) = self.intention(id)
                && meta.family == family
            {
                found = Some(id);
            }
            true
        });
        found
    }

    /// Labels from the first level below the root down to `id`.
    pub fn path_labels(&self, id: NodeId) -> Vec<String> {
        let mut labels = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            if node == NodeId::ROOT {
                break;
            }
            labels.push(self.text(node).to_owned());
            current = self.parent(node);
        }
        labels.reverse();
        labels
    }

    /// Resolves a category label path produced by [`path_labels`](Self::path_labels).
    pub fn find_by_labels<S: AsRef<str>>(&self, labels: &[S]) -> Option<NodeId> {
        labels.iter().try_fold(NodeId::ROOT, |node, label| {
            self.find_child(node, label.as_ref())
        })
    }

    /// Sets a node's flag, pushing it to every descendant and recomputing ancestors.
    pub fn set_checked(&mut self, id: NodeId, checked: bool) {
        if self.node(id).is_none() {
            return;
        }
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            self.nodes[node.0].checked = checked;
            stack.extend(self.nodes[node.0].children.iter().copied());
        }
        self.refresh_ancestors(id);
    }

    /// Flips a node's flag; see [`set_checked`](Self::set_checked).
    pub fn toggle_checked(&mut self, id: NodeId) {
        let checked = self.is_checked(id);
        self.set_checked(id, !checked);
    }

    // A category is checked iff any child is checked.
    fn refresh_ancestors(&mut self, id: NodeId) {
        let mut current = self.parent(id);
        while let Some(node) = current {
            let any = self.nodes[node.0]
                .children
                .iter()
                .any(|child| self.nodes[child.0].checked);
            self.nodes[node.0].checked = any;
            current = self.nodes[node.0].parent;
        }
    }
}

impl TreeModel for IntentionTree {
    type Id = NodeId;

    fn root(&self) -> Option<Self::Id> {
        Some(NodeId::ROOT)
    }

    fn children(&self, id: Self::Id) -> &[Self::Id] {
        self.node(id).map_or(&[], |node| node.children.as_slice())
    }

    fn contains(&self, id: Self::Id) -> bool {
        id.0 < self.nodes.len()
    }

    fn size_hint(&self) -> usize {
        self.nodes.len()
    }
}
