use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::Borders;

/// Scroll policy applied when the selected row changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeScrollPolicy {
    KeepInView,
    CenterOnSelect,
}

/// Visual settings for the tree and the surrounding panel.
#[derive(Clone)]
pub struct IntentionTreeStyle<'a> {
    pub title: Option<Line<'a>>,
    pub block_style: Style,
    pub border_style: Style,
    pub highlight_style: Style,
    pub line_style: Style,
    /// Category rows (rendered bold by default).
    pub category_style: Style,
    /// Intention rows.
    pub intention_style: Style,
    /// Fragments of a row matching the filter text.
    pub match_style: Style,
    /// Filter field and toolbar row.
    pub filter_style: Style,
    /// Filter field while it has focus.
    pub filter_focus_style: Style,
    pub highlight_symbol: &'a str,
    pub borders: Borders,
    pub virtualize_rows: bool,
    pub scroll_policy: TreeScrollPolicy,
}

impl Default for IntentionTreeStyle<'_> {
    fn default() -> Self {
        Self {
            title: None,
            block_style: Style::default(),
            border_style: Style::default(),
            highlight_style: Style::default().add_modifier(Modifier::REVERSED),
            line_style: Style::default(),
            category_style: Style::default().add_modifier(Modifier::BOLD),
            intention_style: Style::default(),
            match_style: Style::default().add_modifier(Modifier::UNDERLINED),
            filter_style: Style::default(),
            filter_focus_style: Style::default().add_modifier(Modifier::BOLD),
            highlight_symbol: ">> ",
            borders: Borders::ALL,
            virtualize_rows: false,
            scroll_policy: TreeScrollPolicy::KeepInView,
        }
    }
}
