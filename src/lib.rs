//! Filterable checkbox tree for browsing and toggling intention settings in ratatui.
//!
//! Intentions (automated code-fix suggestions) are grouped by their category path
//! into a tree of category and intention nodes. A category is checked when any
//! intention below it is checked. Check states survive filtering and are written
//! back to an [`IntentionSettings`] source on [`IntentionPanel::apply`].
//!
//! Feature flags:
//! - `keymap`: crossterm-based key bindings and `IntentionPanel::handle_key`.
//! - `serde`: serde support for `IntentionMeta`, `PanelConfig`, `FilterInput` and `IntentionTreeSnapshot`.

mod action;
mod config;
mod context;
mod error;
mod expansion;
mod filter;
mod glyphs;
#[cfg(feature = "keymap")]
mod keymap;
mod model;
mod panel;
mod pending;
pub mod prelude;
mod settings;
mod state;
mod style;
mod sync;
mod tree;
mod widget;

pub use action::{TreeAction, TreeEvent};
pub use config::PanelConfig;
pub use context::TreeRowContext;
pub use error::{BoxError, Error, Result};
pub use expansion::{ExpansionMonitor, LabelPath, collect_expanded_paths, restore_expanded_paths};
pub use filter::{FilterInput, match_ranges, matches_all_words};
pub use glyphs::{LabelStyles, TreeGlyphs, intention_label_line};
#[cfg(feature = "keymap")]
pub use keymap::{KeymapProfile, TreeKeyBindings};
pub use model::TreeModel;
pub use panel::{IntentionPanel, IntentionPanelHost, PanelFocus, Selection, SubstringFilter};
pub use pending::{IdleSignal, NoPendingWork, PendingWork, RequestGuard};
pub use settings::{
    IntentionMeta, IntentionSettings, MemorySettings, compare_intentions, copy_and_sort,
};
pub use state::{IntentionTreeSnapshot, IntentionTreeState};
pub use style::{IntentionTreeStyle, TreeScrollPolicy};
pub use sync::{CheckStateMap, apply, is_modified};
pub use tree::{IntentionTree, NodeId, NodeKind};
pub use widget::{IntentionPanelView, IntentionTreeView};
