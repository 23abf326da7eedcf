use ratatui::style::Style;

/// Per-row data handed to label rendering.
#[derive(Clone, Copy)]
pub struct TreeRowContext<'a> {
    pub level: u16,
    pub is_tail_stack: &'a [bool],
    pub is_expanded: bool,
    pub has_children: bool,
    pub is_category: bool,
    pub is_checked: bool,
    pub draw_lines: bool,
    pub line_style: Style,
}
