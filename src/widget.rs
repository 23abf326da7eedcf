use std::marker::PhantomData;

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::prelude::Buffer;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Cell, Paragraph, Row, Scrollbar, ScrollbarOrientation, ScrollbarState,
    StatefulWidget, Table, TableState, Widget,
};

use crate::context::TreeRowContext;
use crate::glyphs::{LabelStyles, TreeGlyphs, intention_label_line};
use crate::panel::{IntentionPanel, IntentionPanelHost, PanelFocus};
use crate::state::{IntentionTreeState, VisibleNode};
use crate::style::IntentionTreeStyle;
use crate::tree::IntentionTree;

/// Checkbox tree widget (table + stateful).
pub struct IntentionTreeView<'a> {
    tree: &'a IntentionTree,
    style: IntentionTreeStyle<'a>,
    glyphs: TreeGlyphs<'a>,
    filter: &'a str,
}

impl<'a> IntentionTreeView<'a> {
    pub const fn new(tree: &'a IntentionTree, style: IntentionTreeStyle<'a>) -> Self {
        Self {
            tree,
            style,
            glyphs: TreeGlyphs::unicode(),
            filter: "",
        }
    }

    pub const fn glyphs(mut self, glyphs: TreeGlyphs<'a>) -> Self {
        self.glyphs = glyphs;
        self
    }

    /// Highlights fragments of row text matching `filter`.
    pub const fn filter(mut self, filter: &'a str) -> Self {
        self.filter = filter;
        self
    }

    const fn label_styles(&self) -> LabelStyles {
        LabelStyles {
            category: self.style.category_style,
            intention: self.style.intention_style,
            matched: self.style.match_style,
        }
    }

    #[inline]
    fn build_rows(&self, nodes: &[VisibleNode], state: &IntentionTreeState) -> Vec<Row<'a>> {
        let styles = self.label_styles();
        let mut rows = Vec::with_capacity(nodes.len());
        for node in nodes {
            let ctx = TreeRowContext {
                level: node.level,
                is_tail_stack: node.is_tail_stack.as_slice(),
                is_expanded: state.is_expanded(node.id),
                has_children: node.has_children,
                is_category: self.tree.is_category(node.id),
                is_checked: self.tree.is_checked(node.id),
                draw_lines: state.draw_lines(),
                line_style: self.style.line_style,
            };
            let line = intention_label_line(
                &ctx,
                self.tree.text(node.id),
                self.filter,
                &self.glyphs,
                styles,
            );
            rows.push(Row::new([Cell::from(line)]));
        }
        rows
    }

    #[inline]
    fn build_table(&self, rows: Vec<Row<'a>>, block: Block<'a>) -> Table<'a> {
        Table::new(rows, [Constraint::Fill(1)])
            .style(self.style.block_style)
            .block(block)
            .row_highlight_style(self.style.highlight_style)
            .highlight_symbol(self.style.highlight_symbol)
    }

    #[inline]
    fn render_scrollbar(
        area: Rect,
        buf: &mut Buffer,
        state: &IntentionTreeState,
        inner_height: usize,
        scroll_rows: usize,
    ) {
        let scroll_len = scroll_rows.saturating_add(1);
        let position = state
            .list_state()
            .offset()
            .min(scroll_len.saturating_sub(1));
        let mut scrollbar_state = ScrollbarState::new(scroll_len)
            .position(position)
            .viewport_content_length(inner_height);
        Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .render(area, buf, &mut scrollbar_state);
    }
}

impl StatefulWidget for IntentionTreeView<'_> {
    type State = IntentionTreeState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        state.ensure_visible_nodes(self.tree);

        let mut block = Block::default().borders(self.style.borders);
        if let Some(title) = self.style.title.clone() {
            block = block.title(title);
        }
        block = block
            .style(self.style.block_style)
            .border_style(self.style.border_style);

        let inner_height = block.inner(area).height as usize;
        state.ensure_selection_visible_with_policy(inner_height, self.style.scroll_policy);

        let total_rows = state.visible_nodes().len();
        let (range_start, range_end) = if self.style.virtualize_rows {
            let start = state.list_state().offset().min(total_rows);
            let end = (start + inner_height).min(total_rows);
            (start, end)
        } else {
            (0, total_rows)
        };

        let rows = self.build_rows(&state.visible_nodes()[range_start..range_end], state);
        let scroll_rows = total_rows.saturating_sub(inner_height);

        // Virtualized rendering draws a window of rows, so the table gets a
        // shifted copy of the selection.
        let mut local_state = if self.style.virtualize_rows {
            Some(*state.list_state())
        } else {
            None
        };
        let table_state: &mut TableState = local_state.as_mut().map_or_else(
            || state.list_state_mut(),
            |state_ref| {
                *state_ref.offset_mut() = 0;
                if let Some(selected) = state_ref.selected() {
                    if selected < range_start || selected >= range_end {
                        state_ref.select(None);
                    } else {
                        state_ref.select(Some(selected - range_start));
                    }
                }
                state_ref
            },
        );

        if scroll_rows > 0 {
            let table_area = Rect {
                width: area.width.saturating_sub(1),
                ..area
            };
            let scrollbar_area = Rect {
                x: area.x + area.width.saturating_sub(1),
                y: area.y,
                width: 1,
                height: area.height,
            };
            let mut table_borders = self.style.borders;
            table_borders.remove(Borders::RIGHT);
            let table = self.build_table(rows, block.borders(table_borders));
            StatefulWidget::render(table, table_area, buf, table_state);
            Self::render_scrollbar(scrollbar_area, buf, state, inner_height, scroll_rows);
        } else {
            let table = self.build_table(rows, block);
            StatefulWidget::render(table, area, buf, table_state);
        }
    }
}

/// The whole panel: toolbar and filter field on top, checkbox tree below.
pub struct IntentionPanelView<'a, H> {
    style: IntentionTreeStyle<'a>,
    _host: PhantomData<fn(&H)>,
}

impl<'a, H> IntentionPanelView<'a, H> {
    pub const fn new(style: IntentionTreeStyle<'a>) -> Self {
        Self {
            style,
            _host: PhantomData,
        }
    }
}

impl<H: IntentionPanelHost> StatefulWidget for IntentionPanelView<'_, H> {
    type State = IntentionPanel<H>;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let [toolbar_area, tree_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(area);

        let glyphs = state.glyphs();
        let (tree, view, filter, focus) = state.render_parts();

        let focused = focus == PanelFocus::Filter;
        let field_style = if focused {
            self.style.filter_focus_style
        } else {
            self.style.filter_style
        };
        let mut spans = vec![
            Span::styled("[+]", self.style.filter_style),
            Span::styled("[-]", self.style.filter_style),
            Span::styled(" Filter: ", self.style.filter_style),
            Span::styled(filter.text(), field_style),
        ];
        if focused {
            spans.push(Span::styled("_", field_style));
        }
        Paragraph::new(Line::from(spans))
            .style(self.style.filter_style)
            .render(toolbar_area, buf);

        IntentionTreeView::new(tree, self.style)
            .glyphs(glyphs)
            .filter(filter.text())
            .render(tree_area, buf, view);
    }
}
