// Interactive demo: browse and toggle intentions in the terminal.
//
// Tree: arrows / hjkl move, Space toggles, Enter expands, +/- expand or collapse
// all, / or Tab focuses the filter, `a` applies, `q` quits.
// Filter: type to filter, Enter commits, Esc clears, Up/Down walk history.
use std::io;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::{DefaultTerminal, Frame};

use tui_intentiontree::{
    BoxError, IdleSignal, IntentionMeta, IntentionPanel, IntentionPanelHost, IntentionPanelView,
    IntentionSettings, IntentionTreeStyle, MemorySettings, PanelFocus, Selection, SubstringFilter,
};

// Host that filters through `SubstringFilter` and remembers the last selection.
struct DemoHost {
    search: SubstringFilter,
    selected: String,
}

impl IntentionPanelHost for DemoHost {
    fn filter_model(&mut self, filter: &str, force: bool) -> Result<Vec<IntentionMeta>, BoxError> {
        self.search.filter_model(filter, force)
    }

    fn selection_changed(&mut self, selection: Selection<'_>) {
        self.selected = match selection {
            Selection::Category(label) => format!("category {label}"),
            Selection::Intention(meta) => format!("{} ({})", meta.family, meta.category.join(" / ")),
        };
    }
}

fn sample_settings() -> MemorySettings {
    MemorySettings::new()
        .with(IntentionMeta::new(["Rust"], "Add #[derive]"), true)
        .with(IntentionMeta::new(["Rust"], "Convert to raw string"), false)
        .with(IntentionMeta::new(["Rust", "Control flow"], "Replace if-let with let-else"), true)
        .with(IntentionMeta::new(["Rust", "Control flow"], "Invert if condition"), false)
        .with(IntentionMeta::new(["Rust", "Style"], "Inline format args"), true)
        .with(IntentionMeta::new(["Rust", "Style"], "Remove redundant clone"), true)
        .with(IntentionMeta::new(["Rust", "Imports"], "Merge imports"), false)
        .with(IntentionMeta::new(["TOML"], "Sort dependencies"), false)
        .with(IntentionMeta::new(["Markdown"], "Create table of contents"), false)
        .with(IntentionMeta::new(["Markdown", "Links"], "Convert to reference link"), false)
}

fn style() -> IntentionTreeStyle<'static> {
    let mut style = IntentionTreeStyle::default();
    style.block_style = Style::default()
        .fg(Color::Rgb(221, 227, 235))
        .bg(Color::Rgb(24, 28, 36));
    style.border_style = Style::default().fg(Color::Rgb(92, 110, 140));
    style.line_style = Style::default().fg(Color::Rgb(86, 98, 120));
    style.category_style = Style::default()
        .fg(Color::Rgb(229, 201, 133))
        .add_modifier(Modifier::BOLD);
    style.match_style = Style::default()
        .fg(Color::Rgb(136, 192, 208))
        .add_modifier(Modifier::UNDERLINED);
    style.highlight_style = Style::default()
        .fg(Color::Rgb(255, 255, 255))
        .bg(Color::Rgb(52, 66, 96))
        .add_modifier(Modifier::BOLD);
    style.filter_focus_style = Style::default()
        .fg(Color::Rgb(255, 255, 255))
        .add_modifier(Modifier::BOLD);
    style
}

fn render(
    frame: &mut Frame,
    panel: &mut IntentionPanel<DemoHost>,
    settings: &MemorySettings,
    style: &IntentionTreeStyle<'_>,
) {
    let mut style = style.clone();
    let dirty = if panel.is_modified(settings) { " *" } else { "" };
    style.title = Some(Line::from(format!(
        " Intentions{dirty} | {} ",
        panel.host().selected
    )));
    frame.render_stateful_widget(IntentionPanelView::new(style), frame.area(), panel);
}

fn run_app(
    mut terminal: DefaultTerminal,
    mut panel: IntentionPanel<DemoHost>,
    mut settings: MemorySettings,
) -> io::Result<()> {
    let style = style();

    loop {
        terminal.draw(|frame| render(frame, &mut panel, &settings, &style))?;

        if !event::poll(Duration::from_millis(200))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        if panel.focus() == PanelFocus::Tree {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Char('a') => {
                    panel.apply(&mut settings);
                    continue;
                }
                _ => {}
            }
        }
        panel.handle_key(key).map_err(io::Error::other)?;
    }

    Ok(())
}

fn main() -> io::Result<()> {
    let settings = sample_settings();
    let host = DemoHost {
        search: SubstringFilter::new(settings.intentions()),
        selected: String::new(),
    };
    let mut panel = IntentionPanel::new(host);

    // Simulate the host still indexing intentions when the panel opens.
    let pending = IdleSignal::new();
    thread::scope(|scope| {
        let request = pending.begin();
        scope.spawn(move || {
            thread::sleep(Duration::from_millis(150));
            drop(request);
        });
        panel.reset(&settings, &pending)
    })
    .map_err(io::Error::other)?;

    let terminal = ratatui::init();
    let result = run_app(terminal, panel, settings);
    ratatui::restore();
    result
}
