use log::debug;

use crate::action::{TreeAction, TreeEvent};
use crate::config::PanelConfig;
use crate::error::{BoxError, Error, Result};
use crate::expansion::{ExpansionMonitor, collect_expanded_paths, restore_expanded_paths};
use crate::filter::{FilterInput, matches_all_words};
use crate::glyphs::TreeGlyphs;
use crate::pending::PendingWork;
use crate::settings::{IntentionMeta, IntentionSettings, copy_and_sort};
use crate::state::IntentionTreeState;
use crate::sync::{self, CheckStateMap};
use crate::tree::{IntentionTree, NodeId, NodeKind};

#[cfg(feature = "keymap")]
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What the user selected in the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection<'a> {
    Category(&'a str),
    Intention(&'a IntentionMeta),
}

/// Collaborator supplied by the embedding application.
pub trait IntentionPanelHost {
    /// Returns the intentions matching `filter`.
    ///
    /// `force` asks for a fresh query even if the text did not change. Errors
    /// propagate out of the filter call that triggered the query.
    fn filter_model(&mut self, filter: &str, force: bool) -> Result<Vec<IntentionMeta>, BoxError>;

    /// Called when the selected node changes.
    fn selection_changed(&mut self, _selection: Selection<'_>) {}
}

/// Host that filters a fixed list: every whitespace-separated word of the filter
/// must occur (ASCII case-insensitive) in the family or the category labels.
#[derive(Clone, Debug, Default)]
pub struct SubstringFilter {
    intentions: Vec<IntentionMeta>,
    last: Option<(String, Vec<IntentionMeta>)>,
}

impl SubstringFilter {
    pub fn new(intentions: Vec<IntentionMeta>) -> Self {
        Self {
            intentions,
            last: None,
        }
    }

    /// Replaces the searchable list and drops the cached result.
    pub fn set_intentions(&mut self, intentions: Vec<IntentionMeta>) {
        self.intentions = intentions;
        self.last = None;
    }

    fn matches(meta: &IntentionMeta, filter: &str) -> bool {
        let mut haystack = meta.category.join(" ");
        haystack.push(' ');
        haystack.push_str(&meta.family);
        matches_all_words(&haystack, filter)
    }
}

impl IntentionPanelHost for SubstringFilter {
    fn filter_model(&mut self, filter: &str, force: bool) -> Result<Vec<IntentionMeta>, BoxError> {
        if !force
            && let Some((text, result)) = &self.last
            && text == filter
        {
            return Ok(result.clone());
        }
        let result: Vec<_> = self
            .intentions
            .iter()
            .filter(|meta| Self::matches(meta, filter))
            .cloned()
            .collect();
        self.last = Some((filter.to_owned(), result.clone()));
        Ok(result)
    }
}

/// Which part of the panel receives keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PanelFocus {
    Filter,
    #[default]
    Tree,
}

/// The intention settings panel: tree, check states, filter field and view state.
pub struct IntentionPanel<H> {
    host: H,
    config: PanelConfig,
    tree: IntentionTree,
    checks: CheckStateMap,
    view: IntentionTreeState,
    filter: FilterInput,
    monitor: ExpansionMonitor,
    focus: PanelFocus,
    last_selected: Option<NodeId>,
}

impl<H: IntentionPanelHost> IntentionPanel<H> {
    pub fn new(host: H) -> Self {
        Self::with_config(host, PanelConfig::default())
    }

    pub fn with_config(host: H, config: PanelConfig) -> Self {
        let mut view = IntentionTreeState::new();
        view.set_draw_lines(config.draw_lines);
        Self {
            host,
            filter: FilterInput::new(config.filter_history_size),
            config,
            tree: IntentionTree::new(),
            checks: CheckStateMap::new(),
            view,
            monitor: ExpansionMonitor::new(),
            focus: PanelFocus::default(),
            last_selected: None,
        }
    }

    pub const fn host(&self) -> &H {
        &self.host
    }

    pub const fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub const fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub const fn tree(&self) -> &IntentionTree {
        &self.tree
    }

    pub const fn view(&self) -> &IntentionTreeState {
        &self.view
    }

    pub const fn view_mut(&mut self) -> &mut IntentionTreeState {
        &mut self.view
    }

    pub const fn check_states(&self) -> &CheckStateMap {
        &self.checks
    }

    pub const fn focus(&self) -> PanelFocus {
        self.focus
    }

    pub const fn set_focus(&mut self, focus: PanelFocus) {
        self.focus = focus;
    }

    pub fn filter_text(&self) -> &str {
        self.filter.text()
    }

    pub const fn filter_input(&self) -> &FilterInput {
        &self.filter
    }

    /// Loads a previously saved filter history, most recent first.
    pub fn set_filter_history<I, S>(&mut self, entries: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter.set_history(entries);
    }

    /// Glyph set selected by the configuration.
    pub const fn glyphs(&self) -> TreeGlyphs<'static> {
        if self.config.ascii_glyphs {
            TreeGlyphs::ascii()
        } else {
            TreeGlyphs::unicode()
        }
    }

    pub(crate) fn render_parts(
        &mut self,
    ) -> (&IntentionTree, &mut IntentionTreeState, &FilterInput, PanelFocus) {
        (&self.tree, &mut self.view, &self.filter, self.focus)
    }

    /// Reloads everything from the settings source.
    ///
    /// Waits for `pending` to report no active requests first, then replaces the
    /// check-state map and rebuilds the tree. Edits not yet applied are lost.
    pub fn reset<S, P>(&mut self, settings: &S, pending: &P) -> Result<()>
    where
        S: IntentionSettings + ?Sized,
        P: PendingWork + ?Sized,
    {
        pending.wait_until_idle(self.config.pending_poll_interval, self.config.pending_timeout)?;
        let intentions = self.checks.load(settings);
        self.rebuild(&copy_and_sort(&intentions));
        Ok(())
    }

    /// Shows only `intentions`, keeping the check states recorded so far.
    pub fn filter(&mut self, intentions: &[IntentionMeta]) {
        self.checks.capture(&self.tree);
        self.rebuild(&copy_and_sort(intentions));
    }

    /// Writes the current check states to the settings source.
    pub fn apply<S: IntentionSettings + ?Sized>(&self, settings: &mut S) {
        sync::apply(&self.tree, settings);
    }

    /// Returns `true` if any visible intention differs from the settings source.
    pub fn is_modified<S: IntentionSettings + ?Sized>(&self, settings: &S) -> bool {
        sync::is_modified(&self.tree, settings)
    }

    /// Selects the first intention with the given family; unknown names are ignored.
    pub fn select_intention(&mut self, family: &str) -> bool {
        let Some(id) = self.tree.find_intention(family) else {
            return false;
        };
        let selected = self.view.select_by_id(&self.tree, id);
        self.notify_selection();
        selected
    }

    /// Flips the check flag of the selected node.
    pub fn toggle_selected(&mut self) -> bool {
        let Some(id) = self.view.selected_id() else {
            return false;
        };
        self.tree.toggle_checked(id);
        true
    }

    /// Replaces the filter text and commits it.
    pub fn set_filter(&mut self, text: impl Into<String>) -> Result<()> {
        self.filter.set_text(text);
        self.commit_filter()
    }

    /// Applies the filter text as an explicit commit (Enter in the filter field).
    ///
    /// Expansion is carried over the reload, the first row is selected, focus
    /// moves to the tree and the text is remembered in history.
    pub fn commit_filter(&mut self) -> Result<()> {
        let text = self.filter.text().to_owned();
        self.freeze_for(&text);
        let intentions = self.query(&text)?;
        self.filter(&intentions);

        let expanded = collect_expanded_paths(&self.view, &self.tree);
        self.view.reload();
        restore_expanded_paths(&mut self.view, &self.tree, &expanded);
        self.view.ensure_visible_nodes(&self.tree);
        if self.view.visible_len() > 0 {
            self.view.select_first();
        }
        self.focus = PanelFocus::Tree;
        self.filter.remember();

        self.view.expand_all(&self.tree);
        self.finish_filter(&text);
        Ok(())
    }

    /// Applies the filter text while it is being typed.
    ///
    /// Unlike [`commit_filter`](Self::commit_filter), expansion is not carried
    /// over the reload; everything is expanded.
    pub fn online_filter(&mut self) -> Result<()> {
        let text = self.filter.text().to_owned();
        self.freeze_for(&text);
        let intentions = self.query(&text)?;
        self.filter(&intentions);
        self.view.expand_all(&self.tree);
        self.finish_filter(&text);
        Ok(())
    }

    /// Handles a tree action, including the ones the view forwards.
    pub fn handle_action<C>(&mut self, action: TreeAction<C>) -> TreeEvent<C> {
        let event = match self.view.handle_action(&self.tree, action) {
            TreeEvent::Action(TreeAction::ToggleCheck) => {
                if self.toggle_selected() {
                    TreeEvent::Handled
                } else {
                    TreeEvent::Unhandled
                }
            }
            TreeEvent::Action(TreeAction::FocusFilter) => {
                self.focus = PanelFocus::Filter;
                TreeEvent::Handled
            }
            other => other,
        };
        self.view.ensure_visible_nodes(&self.tree);
        self.notify_selection();
        event
    }

    #[cfg(feature = "keymap")]
    /// Routes a key event to the filter field or the tree, depending on focus.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<TreeEvent<()>> {
        match self.focus {
            PanelFocus::Tree => {
                let Some(action) = self.view.keymap().resolve(key) else {
                    return Ok(TreeEvent::Unhandled);
                };
                Ok(self.handle_action(action))
            }
            PanelFocus::Filter => self.handle_filter_key(key),
        }
    }

    #[cfg(feature = "keymap")]
    fn handle_filter_key(&mut self, key: KeyEvent) -> Result<TreeEvent<()>> {
        let handled = match key.code {
            KeyCode::Enter => {
                self.commit_filter()?;
                true
            }
            KeyCode::Tab => {
                self.focus = PanelFocus::Tree;
                true
            }
            KeyCode::Down => {
                if self.filter.history_next() {
                    self.online_filter()?;
                } else {
                    self.focus = PanelFocus::Tree;
                }
                true
            }
            KeyCode::Up => {
                let moved = self.filter.history_prev();
                if moved {
                    self.online_filter()?;
                }
                moved
            }
            KeyCode::Esc => {
                if self.filter.is_empty() {
                    self.focus = PanelFocus::Tree;
                } else {
                    self.filter.clear();
                    self.online_filter()?;
                }
                true
            }
            KeyCode::Backspace => {
                let changed = self.filter.backspace();
                if changed {
                    self.online_filter()?;
                }
                changed
            }
            KeyCode::Char(ch)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.filter.push(ch);
                self.online_filter()?;
                true
            }
            _ => false,
        };
        Ok(if handled {
            TreeEvent::Handled
        } else {
            TreeEvent::Unhandled
        })
    }

    fn freeze_for(&mut self, text: &str) {
        if !text.is_empty() && !self.monitor.is_frozen() {
            self.monitor.freeze(&self.view, &self.tree);
        }
    }

    fn query(&mut self, text: &str) -> Result<Vec<IntentionMeta>> {
        let intentions = self.host.filter_model(text, true).map_err(Error::Filter)?;
        debug!("filter {text:?} matched {} intentions", intentions.len());
        Ok(intentions)
    }

    // An empty filter collapses everything, then brings back the layout from
    // before filtering started.
    fn finish_filter(&mut self, text: &str) {
        if text.is_empty() {
            self.view.collapse_all();
            self.monitor.restore(&mut self.view, &self.tree);
        }
        self.view.ensure_visible_nodes(&self.tree);
        self.notify_selection();
    }

    fn rebuild(&mut self, sorted: &[IntentionMeta]) {
        let mut tree = IntentionTree::from_sorted(sorted);
        self.checks.reconcile(&mut tree);
        self.tree = tree;
        debug!(
            "rebuilt intention tree: {} intentions, {} nodes",
            sorted.len(),
            self.tree.len()
        );

        self.view.reload();
        self.view.expand_all(&self.tree);
        self.view.ensure_visible_nodes(&self.tree);
        if self.view.visible_len() > 0 {
            self.view.select_first();
        }
        // Ids from the previous tree are meaningless now.
        self.last_selected = None;
        self.notify_selection();
    }

    fn notify_selection(&mut self) {
        let current = self.view.selected_id();
        if current == self.last_selected {
            return;
        }
        self.last_selected = current;
        let selection = match current.and_then(|id| self.tree.kind(id)) {
            Some(NodeKind::Category(label)) => Selection::Category(label),
            Some(NodeKind::Intention(meta)) => Selection::Intention(meta),
            Some(NodeKind::Root) | None => return,
        };
        self.host.selection_changed(selection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pending::{IdleSignal, NoPendingWork};
    use crate::settings::MemorySettings;
    use std::time::Duration;

    fn metas() -> Vec<IntentionMeta> {
        vec![
            IntentionMeta::new(["Rust", "Style"], "Use let-else"),
            IntentionMeta::new(["Rust", "Style"], "Inline format args"),
            IntentionMeta::new(["Rust"], "Add derive"),
            IntentionMeta::new(["Go"], "Add error check"),
        ]
    }

    fn settings() -> MemorySettings {
        let mut settings = MemorySettings::new();
        for (idx, meta) in metas().into_iter().enumerate() {
            settings.insert(meta, idx == 0);
        }
        settings
    }

    /// Substring host that also records selection notifications.
    #[derive(Default)]
    struct Recorder {
        inner: SubstringFilter,
        selections: Vec<String>,
        fail: bool,
    }

    impl IntentionPanelHost for Recorder {
        fn filter_model(
            &mut self,
            filter: &str,
            force: bool,
        ) -> Result<Vec<IntentionMeta>, BoxError> {
            if self.fail {
                return Err("index unavailable".into());
            }
            self.inner.filter_model(filter, force)
        }

        fn selection_changed(&mut self, selection: Selection<'_>) {
            let text = match selection {
                Selection::Category(label) => format!("category:{label}"),
                Selection::Intention(meta) => format!("intention:{}", meta.family),
            };
            self.selections.push(text);
        }
    }

    fn panel() -> (IntentionPanel<Recorder>, MemorySettings) {
        let settings = settings();
        let host = Recorder {
            inner: SubstringFilter::new(metas()),
            ..Recorder::default()
        };
        let mut panel = IntentionPanel::new(host);
        panel.reset(&settings, &NoPendingWork).unwrap();
        (panel, settings)
    }

    fn visible_texts<H: IntentionPanelHost>(panel: &IntentionPanel<H>) -> Vec<&str> {
        panel
            .view()
            .visible_ids()
            .map(|id| panel.tree().text(id))
            .collect()
    }

    #[test]
    fn reset_builds_expanded_tree_and_selects_first_row() {
        let (panel, _) = panel();

        assert_eq!(
            visible_texts(&panel),
            vec![
                "Go",
                "Add error check",
                "Rust",
                "Add derive",
                "Style",
                "Inline format args",
                "Use let-else",
            ]
        );
        assert_eq!(panel.view().selected_row(), Some(0));
        assert_eq!(panel.host().selections, vec!["category:Go"]);
    }

    #[test]
    fn reset_reconciles_checks_from_settings() {
        let (panel, settings) = panel();
        let tree = panel.tree();

        assert!(tree.is_checked(tree.find_intention("Use let-else").unwrap()));
        assert!(tree.is_checked(tree.find_by_labels(&["Rust"]).unwrap()));
        assert!(!tree.is_checked(tree.find_by_labels(&["Go"]).unwrap()));
        assert!(!panel.is_modified(&settings));
    }

    #[test]
    fn toggle_marks_panel_modified_until_applied() {
        let (mut panel, mut settings) = panel();
        assert!(panel.select_intention("Add error check"));

        assert_eq!(panel.handle_action::<()>(TreeAction::ToggleCheck), TreeEvent::Handled);
        assert!(panel.is_modified(&settings));

        panel.apply(&mut settings);
        assert!(!panel.is_modified(&settings));
        assert!(settings.is_enabled(&metas()[3]));
    }

    #[test]
    fn filter_rebuild_preserves_unapplied_edits() {
        let (mut panel, _) = panel();
        panel.select_intention("Add derive");
        panel.toggle_selected();

        panel.set_filter("go").unwrap();
        assert_eq!(visible_texts(&panel), vec!["Go", "Add error check"]);

        panel.set_filter("").unwrap();
        let tree = panel.tree();
        assert!(tree.is_checked(tree.find_intention("Add derive").unwrap()));
        assert!(tree.is_checked(tree.find_intention("Use let-else").unwrap()));
    }

    #[test]
    fn commit_filter_moves_focus_and_records_history() {
        let (mut panel, _) = panel();
        panel.set_focus(PanelFocus::Filter);

        panel.set_filter("style").unwrap();

        assert_eq!(panel.focus(), PanelFocus::Tree);
        assert_eq!(panel.filter_input().history().collect::<Vec<_>>(), vec!["style"]);
        assert_eq!(panel.view().selected_row(), Some(0));
        assert_eq!(
            visible_texts(&panel),
            vec!["Rust", "Style", "Inline format args", "Use let-else"]
        );
    }

    #[test]
    fn clearing_filter_collapses_and_restores_prior_layout() {
        let (mut panel, _) = panel();
        panel.handle_action::<()>(TreeAction::CollapseAll);
        let rust = panel.tree().find_by_labels(&["Rust"]).unwrap();
        panel.view_mut().set_expanded(rust, true);

        panel.set_filter("let").unwrap();
        assert_eq!(panel.filter_text(), "let");
        panel.set_filter("").unwrap();

        assert_eq!(
            visible_texts(&panel),
            vec!["Go", "Rust", "Add derive", "Style"]
        );
    }

    #[test]
    fn online_filter_expands_matches() {
        let (mut panel, _) = panel();
        panel.handle_action::<()>(TreeAction::CollapseAll);

        panel.filter.set_text("derive");
        panel.online_filter().unwrap();

        assert_eq!(visible_texts(&panel), vec!["Rust", "Add derive"]);
        // Online filtering does not touch history or focus.
        assert_eq!(panel.filter_input().history().count(), 0);
    }

    #[test]
    fn clearing_online_filter_restores_prior_layout() {
        let (mut panel, _) = panel();
        panel.handle_action::<()>(TreeAction::CollapseAll);
        let rust = panel.tree().find_by_labels(&["Rust"]).unwrap();
        panel.view_mut().set_expanded(rust, true);
        panel.select_intention("Add derive");

        panel.filter.set_text("let");
        panel.online_filter().unwrap();
        assert!(panel.monitor.is_frozen());
        assert_eq!(
            visible_texts(&panel),
            vec!["Rust", "Style", "Use let-else"]
        );

        panel.filter.clear();
        panel.online_filter().unwrap();

        assert!(!panel.monitor.is_frozen());
        assert_eq!(
            visible_texts(&panel),
            vec!["Go", "Rust", "Add derive", "Style"]
        );
        let selected = panel.view().selected_id().unwrap();
        assert_eq!(panel.tree().text(selected), "Add derive");
    }

    #[test]
    fn saved_history_feeds_history_navigation() {
        let (mut panel, _) = panel();
        panel.set_filter_history(["style", "go"]);

        assert_eq!(
            panel.filter_input().history().collect::<Vec<_>>(),
            vec!["style", "go"]
        );
        panel.set_filter("derive").unwrap();
        assert_eq!(
            panel.filter_input().history().collect::<Vec<_>>(),
            vec!["derive", "style", "go"]
        );
    }

    #[test]
    fn failing_filter_leaves_tree_untouched() {
        let (mut panel, _) = panel();
        let before = panel.tree().len();
        panel.host_mut().fail = true;

        let err = panel.set_filter("go").unwrap_err();

        assert!(matches!(err, Error::Filter(_)));
        assert_eq!(panel.tree().len(), before);
    }

    #[test]
    fn select_unknown_intention_is_ignored() {
        let (mut panel, _) = panel();
        let selected = panel.view().selected_row();

        assert!(!panel.select_intention("missing"));
        assert_eq!(panel.view().selected_row(), selected);
    }

    #[test]
    fn selection_changes_are_reported_once() {
        let (mut panel, _) = panel();
        panel.handle_action::<()>(TreeAction::SelectNext);
        panel.handle_action::<()>(TreeAction::ToggleGuides);

        assert_eq!(
            panel.host().selections,
            vec!["category:Go", "intention:Add error check"]
        );
    }

    #[test]
    fn reset_times_out_on_stuck_requests() {
        let signal = IdleSignal::new();
        let _busy = signal.begin();
        let config = PanelConfig::default().pending_timeout(Some(Duration::from_millis(5)));
        let mut panel = IntentionPanel::with_config(SubstringFilter::default(), config);

        let err = panel.reset(&settings(), &signal).unwrap_err();

        assert!(matches!(err, Error::PendingTimeout(_)));
        assert!(panel.tree().is_empty());
    }

    #[test]
    fn focus_filter_action_switches_focus() {
        let (mut panel, _) = panel();
        assert_eq!(
            panel.handle_action::<()>(TreeAction::FocusFilter),
            TreeEvent::Handled
        );
        assert_eq!(panel.focus(), PanelFocus::Filter);
    }

    #[test]
    fn substring_filter_matches_category_labels() {
        let mut host = SubstringFilter::new(metas());
        let found = host.filter_model("rust style", true).unwrap();
        let names: Vec<_> = found.iter().map(|m| m.family.as_str()).collect();
        assert_eq!(names, vec!["Use let-else", "Inline format args"]);
        assert_eq!(host.filter_model("", false).unwrap().len(), 4);
    }

    #[cfg(feature = "keymap")]
    #[test]
    fn typing_in_filter_field_filters_online() {
        let (mut panel, _) = panel();
        panel.set_focus(PanelFocus::Filter);

        for ch in "err".chars() {
            let key = KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE);
            assert_eq!(panel.handle_key(key).unwrap(), TreeEvent::Handled);
        }
        assert_eq!(visible_texts(&panel), vec!["Go", "Add error check"]);

        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        panel.handle_key(enter).unwrap();
        assert_eq!(panel.focus(), PanelFocus::Tree);

        let space = KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE);
        panel.handle_key(space).unwrap();
        let tree = panel.tree();
        assert!(tree.is_checked(tree.find_intention("Add error check").unwrap()));
    }

    #[cfg(feature = "keymap")]
    #[test]
    fn escape_in_filter_field_restores_prior_layout() {
        let (mut panel, _) = panel();
        panel.handle_action::<()>(TreeAction::CollapseAll);
        panel.set_focus(PanelFocus::Filter);

        for ch in "go".chars() {
            panel
                .handle_key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE))
                .unwrap();
        }
        assert_eq!(visible_texts(&panel), vec!["Go", "Add error check"]);

        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(panel.handle_key(esc).unwrap(), TreeEvent::Handled);

        assert_eq!(panel.filter_text(), "");
        assert!(!panel.monitor.is_frozen());
        assert_eq!(visible_texts(&panel), vec!["Go", "Rust"]);
        assert_eq!(panel.focus(), PanelFocus::Filter);
    }
}
