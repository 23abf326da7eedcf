use ratatui::style::Style;
use ratatui::text::{Line, Span};

use crate::context::TreeRowContext;
use crate::filter::match_ranges;

#[derive(Clone, Copy)]
pub struct TreeGlyphs<'a> {
    pub indent: &'a str,
    pub branch_last: &'a str,
    pub branch: &'a str,
    pub vert: &'a str,
    pub empty: &'a str,
    pub leaf: &'a str,
    pub expanded: &'a str,
    pub collapsed: &'a str,
    pub checked: &'a str,
    pub unchecked: &'a str,
}

impl TreeGlyphs<'static> {
    pub const fn unicode() -> Self {
        Self {
            indent: "   ",
            branch_last: "└──",
            branch: "├──",
            vert: "│  ",
            empty: "   ",
            leaf: " ",
            expanded: "▼",
            collapsed: "▶",
            checked: "☑",
            unchecked: "☐",
        }
    }

    pub const fn ascii() -> Self {
        Self {
            indent: "   ",
            branch_last: "`--",
            branch: "|--",
            vert: "|  ",
            empty: "   ",
            leaf: " ",
            expanded: "v",
            collapsed: ">",
            checked: "[x]",
            unchecked: "[ ]",
        }
    }
}

/// Row styles used by [`intention_label_line`].
#[derive(Clone, Copy, Debug, Default)]
pub struct LabelStyles {
    pub category: Style,
    pub intention: Style,
    pub matched: Style,
}

/// Builds one tree row: guides, expander, checkbox and the node text with the
/// fragments matching `filter` highlighted.
///
/// Rows below the hidden root start at level 1.
pub fn intention_label_line<'a>(
    ctx: &TreeRowContext<'_>,
    text: &'a str,
    filter: &str,
    glyphs: &TreeGlyphs<'a>,
    styles: LabelStyles,
) -> Line<'a> {
    let mut spans: Vec<Span<'a>> = Vec::with_capacity(ctx.is_tail_stack.len() + 8);

    if ctx.draw_lines {
        let last_level = (ctx.level as usize).saturating_sub(1);
        for (l, is_last) in ctx.is_tail_stack.iter().copied().enumerate() {
            let part = if l == last_level {
                if is_last {
                    glyphs.branch_last
                } else {
                    glyphs.branch
                }
            } else if is_last {
                glyphs.indent
            } else {
                glyphs.vert
            };
            spans.push(Span::styled(part, ctx.line_style));
        }
    } else {
        for _ in 1..ctx.level {
            spans.push(Span::raw(glyphs.empty));
        }
    }

    let expander = if ctx.has_children {
        if ctx.is_expanded {
            glyphs.expanded
        } else {
            glyphs.collapsed
        }
    } else {
        glyphs.leaf
    };
    spans.push(Span::raw(expander));
    spans.push(Span::raw(" "));

    spans.push(Span::raw(if ctx.is_checked {
        glyphs.checked
    } else {
        glyphs.unchecked
    }));
    spans.push(Span::raw(" "));

    let base = if ctx.is_category {
        styles.category
    } else {
        styles.intention
    };
    let matched = base.patch(styles.matched);
    let mut cursor = 0;
    for range in match_ranges(text, filter) {
        if range.start > cursor {
            spans.push(Span::styled(&text[cursor..range.start], base));
        }
        spans.push(Span::styled(&text[range.start..range.end], matched));
        cursor = range.end;
    }
    if cursor < text.len() || text.is_empty() {
        spans.push(Span::styled(&text[cursor..], base));
    }

    Line::from(spans)
}
