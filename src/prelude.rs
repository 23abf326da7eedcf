pub use crate::{
    CheckStateMap, IdleSignal, IntentionMeta, IntentionPanel, IntentionPanelHost,
    IntentionPanelView, IntentionSettings, IntentionTree, IntentionTreeState, IntentionTreeStyle,
    IntentionTreeView, MemorySettings, NoPendingWork, NodeId, NodeKind, PanelConfig, PanelFocus,
    PendingWork, Selection, SubstringFilter, TreeAction, TreeEvent, TreeGlyphs, TreeModel,
    TreeScrollPolicy,
};

#[cfg(feature = "keymap")]
pub use crate::{KeymapProfile, TreeKeyBindings};
